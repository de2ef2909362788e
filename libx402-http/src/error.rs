//! Error type for HTTP-level payment operations.

use libx402::X402Error;

/// Errors raised by the paying HTTP clients.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ClientError {
    /// A payment-protocol failure from the core engine.
    #[error(transparent)]
    Payment(#[from] X402Error),

    /// Transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The original request body is a stream and cannot be cloned for the
    /// paid retry.
    #[error("request cannot be cloned for the paid retry")]
    RequestNotCloneable,
}

impl ClientError {
    /// Returns the payment error, if this is one.
    #[must_use]
    pub const fn as_payment(&self) -> Option<&X402Error> {
        match self {
            Self::Payment(e) => Some(e),
            Self::Http(_) | Self::RequestNotCloneable => None,
        }
    }
}
