//! Header names and protocol constants for x402 over HTTP.

/// Header carrying the base64-encoded payment authorization on a retried
/// request.
pub const PAYMENT_AUTHORIZATION_HEADER: &str = "X-Payment-Authorization";

/// Marker header on 402 responses signalling that payment is required.
pub const PAYMENT_REQUIRED_HEADER: &str = "X-Payment-Required";

/// Header naming the protocol on 402 responses.
pub const PAYMENT_PROTOCOL_HEADER: &str = "X-Payment-Protocol";

/// Header carrying the offered amount on 402 responses, for clients that
/// inspect price without parsing the body.
pub const PAYMENT_AMOUNT_HEADER: &str = "X-Payment-Amount";

/// Header carrying the asset address on 402 responses.
pub const PAYMENT_ASSET_HEADER: &str = "X-Payment-Asset";

/// Protocol identifier carried in [`PAYMENT_PROTOCOL_HEADER`].
pub const PAYMENT_PROTOCOL_NAME: &str = "x402";

/// The HTTP status code that triggers the payment flow.
pub const HTTP_STATUS_PAYMENT_REQUIRED: u16 = 402;
