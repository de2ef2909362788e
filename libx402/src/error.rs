//! Shared error taxonomy for x402 payment operations.
//!
//! Every failure a paying client can hit is a variant of [`X402Error`],
//! carrying a machine-readable [`code`](X402Error::code) alongside the
//! human-readable message. Server-side denials are a separate type
//! ([`crate::verify::PaymentDenied`]) because they map to HTTP responses
//! rather than caller-facing errors.

use crate::amount::Amount;
use crate::proto::PaymentOffer;

/// Errors raised by the client-side payment engine.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum X402Error {
    /// An offer or authorization failed to decode or validate structurally.
    /// Never retried.
    #[error("invalid payment request: {reason}")]
    InvalidPaymentRequest {
        /// What failed to parse or validate.
        reason: String,
    },

    /// A valid 402 challenge was received but automatic payment is
    /// disabled. Carries the parsed offer so the caller can decide.
    #[error("payment of {} {} required for {}", offer.max_amount, offer.asset_address, offer.resource)]
    PaymentRequired {
        /// The offer parsed from the 402 response.
        offer: Box<PaymentOffer>,
    },

    /// The offer's validity window has passed. Not retried.
    #[error("payment offer for {} expired at {}", offer.resource, offer.expires_at)]
    PaymentExpired {
        /// The expired offer.
        offer: Box<PaymentOffer>,
    },

    /// Advisory balance below the amount to pay. No transfer was attempted.
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        /// Amount the payment requires.
        required: Amount,
        /// Balance reported by the ledger.
        available: Amount,
    },

    /// The ledger rejected building, signing, or broadcasting the
    /// transfer. Terminal for the fetch attempt: the engine never
    /// re-broadcasts, since a blind retry risks paying twice.
    #[error("failed to broadcast transaction: {reason}")]
    TransactionBroadcastFailed {
        /// Underlying ledger failure.
        reason: String,
    },

    /// The server rejected the payment after it appeared to succeed.
    #[error("payment verification failed: {reason}")]
    PaymentVerificationFailed {
        /// Reason reported by the server, if any.
        reason: String,
    },

    /// A payment amount exceeds a configured ceiling or the offer's own
    /// maximum. Raised before any ledger interaction.
    #[error("payment amount {amount} exceeds limit {limit}")]
    AmountAboveLimit {
        /// The amount that was about to be paid.
        amount: Amount,
        /// The ceiling it violated.
        limit: Amount,
    },

    /// The request target is not allowed (loopback or private address
    /// without the local override, or a disallowed scheme). Raised before
    /// any I/O.
    #[error("disallowed request target: {reason}")]
    DisallowedTarget {
        /// Why the target was rejected.
        reason: String,
    },

    /// The ledger could not answer a query (balance lookup). No funds
    /// moved; the caller may retry.
    #[error("ledger unavailable: {reason}")]
    LedgerUnavailable {
        /// Underlying ledger failure.
        reason: String,
    },
}

impl X402Error {
    /// Machine-readable error code, stable across releases.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidPaymentRequest { .. } => "INVALID_PAYMENT_REQUEST",
            Self::PaymentRequired { .. } => "PAYMENT_REQUIRED",
            Self::PaymentExpired { .. } => "PAYMENT_EXPIRED",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::TransactionBroadcastFailed { .. } => "TRANSACTION_BROADCAST_FAILED",
            Self::PaymentVerificationFailed { .. } => "PAYMENT_VERIFICATION_FAILED",
            Self::AmountAboveLimit { .. } => "AMOUNT_ABOVE_LIMIT",
            Self::DisallowedTarget { .. } => "DISALLOWED_TARGET",
            Self::LedgerUnavailable { .. } => "LEDGER_UNAVAILABLE",
        }
    }

    /// Whether retrying the whole operation can reasonably succeed.
    ///
    /// `true` means the condition is transient or fixable by the caller
    /// (fund the wallet, request a fresh offer). The engine itself never
    /// retries automatically beyond the single paid retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::PaymentRequired { .. }
            | Self::PaymentExpired { .. }
            | Self::TransactionBroadcastFailed { .. }
            | Self::PaymentVerificationFailed { .. }
            | Self::LedgerUnavailable { .. } => true,
            Self::InvalidPaymentRequest { .. }
            | Self::InsufficientFunds { .. }
            | Self::AmountAboveLimit { .. }
            | Self::DisallowedTarget { .. } => false,
        }
    }

    /// Returns the offer attached to [`PaymentRequired`](Self::PaymentRequired)
    /// or [`PaymentExpired`](Self::PaymentExpired) variants.
    #[must_use]
    pub fn offer(&self) -> Option<&PaymentOffer> {
        match self {
            Self::PaymentRequired { offer } | Self::PaymentExpired { offer } => Some(offer),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_offer;

    #[test]
    fn codes_are_stable() {
        let err = X402Error::InsufficientFunds {
            required: "0.10".parse().unwrap(),
            available: "0.01".parse().unwrap(),
        };
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");
        assert!(!err.is_retryable());

        let err = X402Error::TransactionBroadcastFailed {
            reason: "rpc timeout".into(),
        };
        assert_eq!(err.code(), "TRANSACTION_BROADCAST_FAILED");
        assert!(err.is_retryable());
    }

    #[test]
    fn payment_required_carries_the_offer() {
        let offer = sample_offer();
        let err = X402Error::PaymentRequired {
            offer: Box::new(offer.clone()),
        };
        assert_eq!(err.offer().unwrap().payment_id, offer.payment_id);
        assert_eq!(err.code(), "PAYMENT_REQUIRED");
    }

    #[test]
    fn display_names_the_failure() {
        let err = X402Error::DisallowedTarget {
            reason: "loopback address".into(),
        };
        assert!(err.to_string().contains("loopback"));
    }
}
