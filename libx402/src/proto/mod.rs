//! Wire types for x402 payment messages.
//!
//! Two records cross the wire:
//!
//! - [`PaymentOffer`] (server → client): the payment terms carried as the
//!   JSON body of a 402 response.
//! - [`PaymentAuthorization`] (client → server): proof of payment carried
//!   as a base64-encoded JSON token in the `X-Payment-Authorization`
//!   request header, since headers must be single-line ASCII-safe values.
//!
//! Decoding fails closed: a missing required field, wrong type, malformed
//! timestamp, or non-positive amount is an
//! [`InvalidPaymentRequest`](X402Error::InvalidPaymentRequest) error, never
//! a silently defaulted value.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::config::X402Config;
use crate::error::X402Error;

pub mod encoding;
pub mod timestamp;

/// Entropy, in bytes, behind each offer `nonce`.
const NONCE_BYTES: usize = 32;

/// Entropy, in bytes, behind each `payment_id`.
const PAYMENT_ID_BYTES: usize = 16;

/// Payment terms a resource server attaches to a 402 response.
///
/// An offer is issued fresh for every denied request and never reused
/// across resources. It becomes inert once consumed, expired, or
/// superseded by a newer offer for the same resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOffer {
    /// Ceiling on the amount to pay, in human-readable token units.
    /// The payer may settle for less if the verifier requires less.
    pub max_amount: Amount,
    /// Token standard of the asset (e.g. `"SPL"`).
    pub asset_type: String,
    /// Address identifying the fungible token (e.g. a mint address).
    pub asset_address: String,
    /// Destination account for the funds.
    pub payment_address: String,
    /// Ledger/environment the offer targets (e.g. `"solana-devnet"`).
    pub network: String,
    /// Absolute UTC instant after which the offer is invalid.
    #[serde(with = "timestamp")]
    pub expires_at: DateTime<Utc>,
    /// High-entropy value unique per offer, for servers that track
    /// issued offers.
    pub nonce: String,
    /// Unique identifier correlating this offer with its eventual
    /// authorization. A verifier must not accept two authorizations
    /// bearing the same id unless it explicitly wants idempotent replay.
    pub payment_id: String,
    /// Logical resource path the offer protects.
    pub resource: String,
    /// Optional human-readable text; no semantic effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PaymentOffer {
    /// Issues a fresh offer from the server's payment terms.
    ///
    /// Generates a random `nonce` and `payment_id` and stamps
    /// `expires_at = now + config.expires_in_secs`. `amount` defaults to
    /// the configured default amount.
    #[must_use]
    pub fn issue(
        config: &X402Config,
        resource: &str,
        amount: Option<Amount>,
        description: Option<&str>,
    ) -> Self {
        Self {
            max_amount: amount.unwrap_or(config.default_amount),
            asset_type: config.asset_type.clone(),
            asset_address: config.asset_address.clone(),
            payment_address: config.payment_address.clone(),
            network: config.network.clone(),
            expires_at: Utc::now()
                + Duration::seconds(i64::try_from(config.expires_in_secs).unwrap_or(i64::MAX)),
            nonce: encoding::random_token(NONCE_BYTES),
            payment_id: encoding::random_token(PAYMENT_ID_BYTES),
            resource: resource.to_owned(),
            description: description.map(str::to_owned),
        }
    }

    /// Parses an offer from the JSON body of a 402 response.
    ///
    /// # Errors
    ///
    /// Returns [`X402Error::InvalidPaymentRequest`] if the body is not
    /// valid JSON, a required field is missing or mistyped, the timestamp
    /// is malformed, or the offer fails [`validate`](Self::validate).
    pub fn from_json(body: &[u8]) -> Result<Self, X402Error> {
        let offer: Self =
            serde_json::from_slice(body).map_err(|e| X402Error::InvalidPaymentRequest {
                reason: format!("failed to parse payment offer: {e}"),
            })?;
        offer.validate()?;
        Ok(offer)
    }

    /// Serializes the offer to the JSON body representation.
    ///
    /// # Errors
    ///
    /// Returns [`X402Error::InvalidPaymentRequest`] if serialization fails,
    /// which only happens for non-string map keys and similar pathologies.
    pub fn to_json(&self) -> Result<String, X402Error> {
        serde_json::to_string(self).map_err(|e| X402Error::InvalidPaymentRequest {
            reason: format!("failed to serialize payment offer: {e}"),
        })
    }

    /// Structural validity checks beyond what serde enforces.
    ///
    /// # Errors
    ///
    /// Returns [`X402Error::InvalidPaymentRequest`] if `max_amount` is not
    /// strictly positive or an identifying field is empty.
    pub fn validate(&self) -> Result<(), X402Error> {
        if !self.max_amount.is_positive() {
            return Err(X402Error::InvalidPaymentRequest {
                reason: format!("max_amount must be positive, got {}", self.max_amount),
            });
        }
        for (name, value) in [
            ("payment_id", &self.payment_id),
            ("payment_address", &self.payment_address),
            ("asset_address", &self.asset_address),
        ] {
            if value.is_empty() {
                return Err(X402Error::InvalidPaymentRequest {
                    reason: format!("{name} must not be empty"),
                });
            }
        }
        Ok(())
    }

    /// Whether the offer's validity window has passed, against the system
    /// clock.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether the offer is expired at `now`.
    ///
    /// The boundary is exclusive: an offer is expired only strictly after
    /// `expires_at`; at the exact expiry instant it is still valid.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Proof of payment a client attaches when retrying a denied request.
///
/// Created once per successful transfer and single-use from the verifier's
/// perspective for a given `payment_id`. It carries no expiration of its
/// own; its validity window is inherited from the originating offer up to
/// the moment of verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAuthorization {
    /// `payment_id` of the offer being satisfied.
    pub payment_id: String,
    /// Amount actually transferred; must cover the verifier's required
    /// amount but need not reach the offer's `max_amount` ceiling.
    pub actual_amount: Amount,
    /// Destination the funds were sent to; must equal the offer's value.
    pub payment_address: String,
    /// Token that was transferred; must equal the offer's value.
    pub asset_address: String,
    /// Ledger the transfer happened on; must equal the offer's value.
    pub network: String,
    /// Client-side creation instant, informational.
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Ledger-specific proof binding the payer to the transfer.
    pub signature: String,
    /// Payer's identity on the ledger.
    pub public_key: String,
    /// On-chain transaction reference, present once broadcast; required
    /// for on-chain verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}

impl PaymentAuthorization {
    /// Encodes the authorization for the `X-Payment-Authorization` header:
    /// base64 over the JSON serialization.
    ///
    /// # Errors
    ///
    /// Returns [`X402Error::InvalidPaymentRequest`] if JSON serialization
    /// fails.
    pub fn to_header_value(&self) -> Result<String, X402Error> {
        let json = serde_json::to_vec(self).map_err(|e| X402Error::InvalidPaymentRequest {
            reason: format!("failed to serialize payment authorization: {e}"),
        })?;
        Ok(encoding::encode(json))
    }

    /// Decodes an authorization from an `X-Payment-Authorization` header
    /// value.
    ///
    /// # Errors
    ///
    /// Returns [`X402Error::InvalidPaymentRequest`] on invalid base64,
    /// invalid JSON, or a missing/mistyped field.
    pub fn from_header_value(header_value: &str) -> Result<Self, X402Error> {
        let bytes =
            encoding::decode(header_value).map_err(|e| X402Error::InvalidPaymentRequest {
                reason: format!("payment authorization header is not valid base64: {e}"),
            })?;
        serde_json::from_slice(&bytes).map_err(|e| X402Error::InvalidPaymentRequest {
            reason: format!("failed to parse payment authorization: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{authorization_for, sample_offer};
    use chrono::TimeZone;

    #[test]
    fn offer_json_round_trip() {
        let offer = sample_offer();
        let json = offer.to_json().unwrap();
        let back = PaymentOffer::from_json(json.as_bytes()).unwrap();
        assert_eq!(back, offer);
    }

    #[test]
    fn offer_decode_rejects_missing_field() {
        let mut value: serde_json::Value =
            serde_json::from_str(&sample_offer().to_json().unwrap()).unwrap();
        value.as_object_mut().unwrap().remove("payment_address");
        let err = PaymentOffer::from_json(value.to_string().as_bytes()).unwrap_err();
        assert_eq!(err.code(), "INVALID_PAYMENT_REQUEST");
    }

    #[test]
    fn offer_decode_rejects_malformed_timestamp() {
        let mut value: serde_json::Value =
            serde_json::from_str(&sample_offer().to_json().unwrap()).unwrap();
        value["expires_at"] = serde_json::json!("soon");
        assert!(PaymentOffer::from_json(value.to_string().as_bytes()).is_err());
    }

    #[test]
    fn offer_decode_accepts_naive_utc_timestamp() {
        let mut value: serde_json::Value =
            serde_json::from_str(&sample_offer().to_json().unwrap()).unwrap();
        value["expires_at"] = serde_json::json!("2030-06-01T12:00:00");
        let offer = PaymentOffer::from_json(value.to_string().as_bytes()).unwrap();
        assert_eq!(
            offer.expires_at,
            Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn offer_decode_rejects_non_positive_amount() {
        let mut value: serde_json::Value =
            serde_json::from_str(&sample_offer().to_json().unwrap()).unwrap();
        value["max_amount"] = serde_json::json!("0");
        assert!(PaymentOffer::from_json(value.to_string().as_bytes()).is_err());
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let offer = sample_offer();
        assert!(!offer.is_expired_at(offer.expires_at));
        assert!(offer.is_expired_at(offer.expires_at + Duration::nanoseconds(1)));
        assert!(!offer.is_expired_at(offer.expires_at - Duration::seconds(1)));
    }

    #[test]
    fn past_offer_reports_expired() {
        let mut offer = sample_offer();
        offer.expires_at = Utc::now() - Duration::seconds(60);
        assert!(offer.is_expired());
    }

    #[test]
    fn authorization_header_round_trip() {
        let auth = authorization_for(&sample_offer());
        let header = auth.to_header_value().unwrap();
        assert!(header.is_ascii());
        let back = PaymentAuthorization::from_header_value(&header).unwrap();
        assert_eq!(back, auth);
    }

    #[test]
    fn authorization_decode_fails_closed() {
        assert!(PaymentAuthorization::from_header_value("!!!not-base64!!!").is_err());
        let garbage = encoding::encode(b"{\"payment_id\": 42}");
        assert!(PaymentAuthorization::from_header_value(&garbage).is_err());
    }

    #[test]
    fn issued_offers_are_unique() {
        let config = X402Config::new("recipient", "mint");
        let a = PaymentOffer::issue(&config, "/premium-data", None, None);
        let b = PaymentOffer::issue(&config, "/premium-data", None, None);
        assert_ne!(a.payment_id, b.payment_id);
        assert_ne!(a.nonce, b.nonce);
        assert!(!a.is_expired());
        a.validate().unwrap();
    }
}
