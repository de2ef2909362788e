//! Server-side payment verification.
//!
//! [`PaymentGate`] is the framework-agnostic verifier a resource server
//! wraps its protected handlers with: issue a [`PaymentOffer`] challenge
//! when no authorization accompanies the request, and check an incoming
//! `X-Payment-Authorization` value against the server's payment terms
//! otherwise. Denials come back as [`PaymentDenied`], which knows its HTTP
//! status and JSON body so any transport layer can render it.
//!
//! Checks run in a fixed order and stop at the first failure: presence,
//! decodability, amount, destination, asset, network, on-chain
//! settlement, and finally replay. Replay consumption is last so that a
//! payment rejected for any other reason never burns its `payment_id`.

use std::sync::Arc;

use serde_json::json;

use crate::amount::Amount;
use crate::config::X402Config;
use crate::ledger::LedgerClient;
use crate::proto::{PaymentAuthorization, PaymentOffer};
use crate::replay::ReplayGuard;

/// Why a request was denied access to a paid resource.
///
/// Each variant maps to the HTTP response the transport should send;
/// [`status`](Self::status) and [`body`](Self::body) produce it.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PaymentDenied {
    /// No authorization accompanied the request; pay per the enclosed
    /// offer and retry. Rendered as 402 with the offer as the body.
    #[error("payment required for {}", offer.resource)]
    Challenge {
        /// Fresh offer the client should satisfy.
        offer: Box<PaymentOffer>,
    },

    /// The authorization header could not be decoded. Rendered as 400.
    #[error("malformed payment authorization: {reason}")]
    Malformed {
        /// What failed to decode.
        reason: String,
    },

    /// The paid amount is below what the resource requires. Rendered
    /// as 403.
    #[error("insufficient payment: required {required}, provided {provided}")]
    InsufficientPayment {
        /// Amount the resource requires.
        required: Amount,
        /// Amount the authorization claims was paid.
        provided: Amount,
    },

    /// Funds went to the wrong destination. Rendered as 403.
    #[error("payment address mismatch")]
    AddressMismatch {
        /// Destination the server expects.
        expected: String,
        /// Destination the authorization names.
        provided: String,
    },

    /// The wrong token was transferred. Rendered as 403.
    #[error("asset mismatch")]
    AssetMismatch {
        /// Asset the server expects.
        expected: String,
        /// Asset the authorization names.
        provided: String,
    },

    /// The transfer happened on the wrong network. Rendered as 403.
    #[error("network mismatch")]
    NetworkMismatch {
        /// Network the server expects.
        expected: String,
        /// Network the authorization names.
        provided: String,
    },

    /// This `payment_id` was already accepted once. Rendered as 403.
    #[error("payment {payment_id} already used")]
    Replayed {
        /// The consumed id.
        payment_id: String,
    },

    /// On-chain verification did not confirm the transfer. The response
    /// body is deliberately opaque; the detail is logged server-side only.
    /// Rendered as 403.
    #[error("payment verification failed")]
    VerificationFailed,
}

impl PaymentDenied {
    /// HTTP status code the denial should be rendered with.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Challenge { .. } => 402,
            Self::Malformed { .. } => 400,
            Self::InsufficientPayment { .. }
            | Self::AddressMismatch { .. }
            | Self::AssetMismatch { .. }
            | Self::NetworkMismatch { .. }
            | Self::Replayed { .. }
            | Self::VerificationFailed => 403,
        }
    }

    /// JSON body the denial should be rendered with.
    ///
    /// A [`Challenge`](Self::Challenge) body is the offer itself so
    /// clients can pay it; every other denial is a structured error
    /// object.
    #[must_use]
    pub fn body(&self) -> serde_json::Value {
        match self {
            Self::Challenge { offer } => {
                serde_json::to_value(offer).expect("offer serialization failed")
            }
            Self::Malformed { reason } => json!({
                "error": "Invalid payment authorization",
                "detail": reason,
            }),
            Self::InsufficientPayment { required, provided } => json!({
                "error": "Insufficient payment",
                "required": required.to_string(),
                "provided": provided.to_string(),
            }),
            Self::AddressMismatch { .. } => json!({ "error": "Payment address mismatch" }),
            Self::AssetMismatch { .. } => json!({ "error": "Asset mismatch" }),
            Self::NetworkMismatch { .. } => json!({ "error": "Network mismatch" }),
            Self::Replayed { .. } => json!({ "error": "Payment already used" }),
            Self::VerificationFailed => json!({ "error": "Payment verification failed" }),
        }
    }
}

/// Framework-agnostic verifier for paid resources.
pub struct PaymentGate {
    config: X402Config,
    replay: Option<Arc<dyn ReplayGuard>>,
}

impl std::fmt::Debug for PaymentGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentGate")
            .field("config", &self.config)
            .field("replay", &self.replay.as_ref().map(|_| "ReplayGuard"))
            .finish()
    }
}

impl PaymentGate {
    /// Creates a gate enforcing the given payment terms. Verification is
    /// stateless until a replay guard is attached.
    #[must_use]
    pub const fn new(config: X402Config) -> Self {
        Self {
            config,
            replay: None,
        }
    }

    /// Attaches a replay guard; each `payment_id` is then accepted at
    /// most once.
    #[must_use]
    pub fn with_replay_guard(mut self, guard: Arc<dyn ReplayGuard>) -> Self {
        self.replay = Some(guard);
        self
    }

    /// The payment terms this gate enforces.
    #[must_use]
    pub const fn config(&self) -> &X402Config {
        &self.config
    }

    /// Issues a fresh challenge offer for `resource`.
    ///
    /// `amount` overrides the configured default amount; `description` is
    /// informational text surfaced to the payer.
    #[must_use]
    pub fn challenge(
        &self,
        resource: &str,
        amount: Option<Amount>,
        description: Option<&str>,
    ) -> PaymentOffer {
        PaymentOffer::issue(&self.config, resource, amount, description)
    }

    /// Verifies the `X-Payment-Authorization` header value for a request
    /// to `resource` requiring `required_amount`.
    ///
    /// `ledger` supplies on-chain confirmation; passing `None`, disabling
    /// `verify_on_chain` in the configuration, or an authorization without
    /// a `transaction_hash` skips that step.
    ///
    /// # Errors
    ///
    /// Returns the [`PaymentDenied`] describing the HTTP response to send:
    /// [`Challenge`](PaymentDenied::Challenge) with a fresh offer when the
    /// header is absent, [`Malformed`](PaymentDenied::Malformed) when it
    /// does not decode, and a 403-class denial when any payment term is
    /// unmet.
    pub async fn verify(
        &self,
        resource: &str,
        required_amount: &Amount,
        header: Option<&str>,
        ledger: Option<&dyn LedgerClient>,
    ) -> Result<PaymentAuthorization, PaymentDenied> {
        let Some(header) = header else {
            return Err(PaymentDenied::Challenge {
                offer: Box::new(self.challenge(resource, Some(*required_amount), None)),
            });
        };

        let auth =
            PaymentAuthorization::from_header_value(header).map_err(|e| PaymentDenied::Malformed {
                reason: e.to_string(),
            })?;

        if auth.actual_amount < *required_amount {
            return Err(PaymentDenied::InsufficientPayment {
                required: *required_amount,
                provided: auth.actual_amount,
            });
        }
        if auth.payment_address != self.config.payment_address {
            return Err(PaymentDenied::AddressMismatch {
                expected: self.config.payment_address.clone(),
                provided: auth.payment_address,
            });
        }
        if auth.asset_address != self.config.asset_address {
            return Err(PaymentDenied::AssetMismatch {
                expected: self.config.asset_address.clone(),
                provided: auth.asset_address,
            });
        }
        if auth.network != self.config.network {
            return Err(PaymentDenied::NetworkMismatch {
                expected: self.config.network.clone(),
                provided: auth.network,
            });
        }

        if self.config.verify_on_chain
            && let (Some(ledger), Some(tx_hash)) = (ledger, auth.transaction_hash.as_deref())
        {
            match ledger
                .verify_transfer(
                    tx_hash,
                    &self.config.payment_address,
                    &auth.actual_amount,
                    &self.config.asset_address,
                )
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(
                        payment_id = %auth.payment_id,
                        transaction_hash = %tx_hash,
                        "on-chain verification rejected transfer"
                    );
                    return Err(PaymentDenied::VerificationFailed);
                }
                Err(e) => {
                    tracing::warn!(
                        payment_id = %auth.payment_id,
                        transaction_hash = %tx_hash,
                        error = %e,
                        "on-chain verification could not inspect transfer"
                    );
                    return Err(PaymentDenied::VerificationFailed);
                }
            }
        }

        // Consume last: a payment denied above keeps its id usable for a
        // corrected retry.
        if let Some(guard) = &self.replay
            && !guard.consume(&auth.payment_id)
        {
            return Err(PaymentDenied::Replayed {
                payment_id: auth.payment_id,
            });
        }

        Ok(auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::MemoryReplayGuard;
    use crate::testing::{MockLedger, authorization_for, sample_offer};

    fn gate() -> PaymentGate {
        PaymentGate::new(
            X402Config::new("mock_recipient", "mock_usdc_mint").with_verify_on_chain(false),
        )
    }

    fn required() -> Amount {
        "0.10".parse().unwrap()
    }

    #[tokio::test]
    async fn missing_header_yields_a_challenge() {
        let err = gate()
            .verify("/premium-data", &required(), None, None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), 402);
        let PaymentDenied::Challenge { offer } = err else {
            panic!("expected challenge, got {err:?}");
        };
        assert_eq!(offer.resource, "/premium-data");
        assert_eq!(offer.max_amount, required());
    }

    #[tokio::test]
    async fn undecodable_header_is_malformed() {
        let err = gate()
            .verify("/premium-data", &required(), Some("!!garbage!!"), None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(matches!(err, PaymentDenied::Malformed { .. }));
    }

    #[tokio::test]
    async fn exact_and_overpaid_amounts_are_accepted() {
        let gate = gate();
        let offer = sample_offer();

        let auth = authorization_for(&offer);
        let header = auth.to_header_value().unwrap();
        let accepted = gate
            .verify("/premium-data", &required(), Some(&header), None)
            .await
            .unwrap();
        assert_eq!(accepted.payment_id, auth.payment_id);

        let mut overpaid = authorization_for(&offer);
        overpaid.actual_amount = "0.25".parse().unwrap();
        let header = overpaid.to_header_value().unwrap();
        gate.verify("/premium-data", &required(), Some(&header), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn underpayment_is_rejected_decimal_exact() {
        let mut auth = authorization_for(&sample_offer());
        auth.actual_amount = "0.099999".parse().unwrap();
        let header = auth.to_header_value().unwrap();
        let err = gate()
            .verify("/premium-data", &required(), Some(&header), None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), 403);
        let body = err.body();
        assert_eq!(body["error"], "Insufficient payment");
        assert_eq!(body["required"], "0.10");
        assert_eq!(body["provided"], "0.099999");
    }

    #[tokio::test]
    async fn mismatched_terms_are_rejected() {
        let gate = gate();

        let mut auth = authorization_for(&sample_offer());
        auth.payment_address = "attacker".into();
        let header = auth.to_header_value().unwrap();
        let err = gate
            .verify("/premium-data", &required(), Some(&header), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentDenied::AddressMismatch { .. }));

        let mut auth = authorization_for(&sample_offer());
        auth.asset_address = "other_mint".into();
        let header = auth.to_header_value().unwrap();
        let err = gate
            .verify("/premium-data", &required(), Some(&header), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentDenied::AssetMismatch { .. }));

        let mut auth = authorization_for(&sample_offer());
        auth.network = "solana-mainnet".into();
        let header = auth.to_header_value().unwrap();
        let err = gate
            .verify("/premium-data", &required(), Some(&header), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentDenied::NetworkMismatch { .. }));
        assert_eq!(err.status(), 403);
    }

    #[tokio::test]
    async fn onchain_rejection_is_opaque() {
        let gate = PaymentGate::new(X402Config::new("mock_recipient", "mock_usdc_mint"));
        let ledger = MockLedger::new();
        ledger.refuse_verification();

        let auth = authorization_for(&sample_offer());
        let header = auth.to_header_value().unwrap();
        let err = gate
            .verify("/premium-data", &required(), Some(&header), Some(&ledger))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentDenied::VerificationFailed));
        assert_eq!(err.status(), 403);
        assert_eq!(err.body(), serde_json::json!({ "error": "Payment verification failed" }));
    }

    #[tokio::test]
    async fn onchain_confirmation_accepts() {
        let gate = PaymentGate::new(X402Config::new("mock_recipient", "mock_usdc_mint"));
        let ledger = MockLedger::new();

        let auth = authorization_for(&sample_offer());
        let header = auth.to_header_value().unwrap();
        gate.verify("/premium-data", &required(), Some(&header), Some(&ledger))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn replayed_payment_id_is_rejected_once_consumed() {
        let gate = gate().with_replay_guard(Arc::new(MemoryReplayGuard::new()));
        let auth = authorization_for(&sample_offer());
        let header = auth.to_header_value().unwrap();

        gate.verify("/premium-data", &required(), Some(&header), None)
            .await
            .unwrap();
        let err = gate
            .verify("/premium-data", &required(), Some(&header), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentDenied::Replayed { .. }));
        assert_eq!(err.status(), 403);
    }

    #[tokio::test]
    async fn denied_payment_does_not_consume_its_id() {
        let gate = gate().with_replay_guard(Arc::new(MemoryReplayGuard::new()));
        let offer = sample_offer();

        let mut underpaid = authorization_for(&offer);
        underpaid.actual_amount = "0.01".parse().unwrap();
        let header = underpaid.to_header_value().unwrap();
        gate.verify("/premium-data", &required(), Some(&header), None)
            .await
            .unwrap_err();

        // The corrected retry with the same payment_id still succeeds.
        let corrected = authorization_for(&offer);
        let header = corrected.to_header_value().unwrap();
        gate.verify("/premium-data", &required(), Some(&header), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn challenge_body_is_the_offer() {
        let offer = sample_offer();
        let denied = PaymentDenied::Challenge {
            offer: Box::new(offer.clone()),
        };
        let body = denied.body();
        assert_eq!(body["payment_id"], offer.payment_id);
        assert_eq!(body["max_amount"], "0.10");
    }
}
