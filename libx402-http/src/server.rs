//! Framework-neutral rendering of server responses.
//!
//! The verification logic lives in
//! [`libx402::verify::PaymentGate`]; this module turns its outcomes into
//! status, headers, and a JSON body that any HTTP framework can emit.

use http::{HeaderMap, HeaderValue, StatusCode};
use libx402::{PaymentDenied, PaymentOffer};

use crate::constants::{
    PAYMENT_AMOUNT_HEADER, PAYMENT_ASSET_HEADER, PAYMENT_PROTOCOL_HEADER, PAYMENT_PROTOCOL_NAME,
    PAYMENT_REQUIRED_HEADER,
};

/// Status, headers, and JSON body of a protocol response.
#[derive(Debug, Clone)]
pub struct ResponseParts {
    /// HTTP status to respond with.
    pub status: StatusCode,
    /// Protocol headers to attach.
    pub headers: HeaderMap,
    /// JSON body.
    pub body: serde_json::Value,
}

/// Renders a 402 challenge carrying `offer`.
///
/// The body is the offer itself; the `X-Payment-*` headers advertise the
/// protocol and price so clients can inspect the challenge without
/// parsing JSON.
#[must_use]
pub fn payment_required_parts(offer: &PaymentOffer) -> ResponseParts {
    let mut headers = HeaderMap::new();
    insert_ascii(&mut headers, PAYMENT_REQUIRED_HEADER, "true");
    insert_ascii(&mut headers, PAYMENT_PROTOCOL_HEADER, PAYMENT_PROTOCOL_NAME);
    insert_ascii(
        &mut headers,
        PAYMENT_AMOUNT_HEADER,
        &offer.max_amount.to_string(),
    );
    insert_ascii(&mut headers, PAYMENT_ASSET_HEADER, &offer.asset_address);

    ResponseParts {
        status: StatusCode::PAYMENT_REQUIRED,
        headers,
        body: serde_json::to_value(offer).expect("offer serialization failed"),
    }
}

/// Renders a [`PaymentDenied`] verification outcome.
#[must_use]
pub fn denial_parts(denied: &PaymentDenied) -> ResponseParts {
    if let PaymentDenied::Challenge { offer } = denied {
        return payment_required_parts(offer);
    }
    ResponseParts {
        status: StatusCode::from_u16(denied.status()).expect("denial statuses are valid"),
        headers: HeaderMap::new(),
        body: denied.body(),
    }
}

fn insert_ascii(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libx402::testing::sample_offer;

    #[test]
    fn challenge_carries_protocol_headers_and_offer_body() {
        let offer = sample_offer();
        let parts = payment_required_parts(&offer);
        assert_eq!(parts.status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(parts.headers.get(PAYMENT_REQUIRED_HEADER).unwrap(), "true");
        assert_eq!(parts.headers.get(PAYMENT_PROTOCOL_HEADER).unwrap(), "x402");
        assert_eq!(parts.headers.get(PAYMENT_AMOUNT_HEADER).unwrap(), "0.10");
        assert_eq!(parts.body["payment_id"], offer.payment_id);
    }

    #[test]
    fn denials_render_their_status_and_body() {
        let denied = PaymentDenied::Malformed {
            reason: "bad base64".into(),
        };
        let parts = denial_parts(&denied);
        assert_eq!(parts.status, StatusCode::BAD_REQUEST);
        assert_eq!(parts.body["error"], "Invalid payment authorization");
        assert!(parts.headers.is_empty());
    }

    #[test]
    fn challenge_denial_renders_like_a_challenge() {
        let denied = PaymentDenied::Challenge {
            offer: Box::new(sample_offer()),
        };
        let parts = denial_parts(&denied);
        assert_eq!(parts.status, StatusCode::PAYMENT_REQUIRED);
        assert!(parts.headers.contains_key(PAYMENT_PROTOCOL_HEADER));
    }
}
