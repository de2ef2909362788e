//! Paying HTTP clients.
//!
//! Three levels of integration:
//!
//! - [`X402Client`]: manual control. Send requests, detect 402s, parse
//!   offers, and create payments as separate steps.
//! - [`X402AutoClient`](auto::X402AutoClient): the pay-and-retry state
//!   machine as a single `fetch` call.
//! - [`X402PaymentMiddleware`](middleware::X402PaymentMiddleware): the
//!   same state machine as `reqwest-middleware` middleware, transparent
//!   to existing `reqwest` call sites.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use libx402::{Amount, LedgerClient, PaymentAuthorization, PaymentOffer, X402Error};
use reqwest::Response;

use crate::constants::{HTTP_STATUS_PAYMENT_REQUIRED, PAYMENT_AUTHORIZATION_HEADER};
use crate::error::ClientError;
use crate::validate;

pub mod auto;
pub mod middleware;

/// HTTP methods the payment flow supports.
///
/// The set is closed: a paid retry resends the request verbatim, which is
/// only sound for methods whose body semantics the client fully controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// PUT request.
    Put,
    /// DELETE request.
    Delete,
}

impl HttpMethod {
    /// The corresponding `reqwest` method.
    #[must_use]
    pub const fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

/// HTTP client with manual payment control.
///
/// Every outgoing request target is validated against the
/// [`validate`](crate::validate) rules before any I/O.
pub struct X402Client {
    http: reqwest::Client,
    ledger: Arc<dyn LedgerClient>,
    allow_local: bool,
}

impl fmt::Debug for X402Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X402Client")
            .field("allow_local", &self.allow_local)
            .finish_non_exhaustive()
    }
}

impl X402Client {
    /// Creates a client paying from `ledger` with a default `reqwest`
    /// client.
    #[must_use]
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            http: reqwest::Client::new(),
            ledger,
            allow_local: false,
        }
    }

    /// Uses a preconfigured `reqwest` client (proxies, timeouts, TLS).
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Permits loopback and private request targets, for local
    /// development against servers on this machine.
    #[must_use]
    pub const fn allow_local_targets(mut self, allow: bool) -> Self {
        self.allow_local = allow;
        self
    }

    /// The ledger this client pays from.
    #[must_use]
    pub fn ledger(&self) -> &Arc<dyn LedgerClient> {
        &self.ledger
    }

    /// Sends one request, optionally attaching a payment authorization.
    ///
    /// Does not react to the response status; callers inspect it with
    /// [`payment_required`](Self::payment_required) and decide.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Payment`] with
    /// [`X402Error::DisallowedTarget`] before any I/O if the target fails
    /// validation, or [`ClientError::Http`] on transport failure.
    pub async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&serde_json::Value>,
        payment: Option<&PaymentAuthorization>,
    ) -> Result<Response, ClientError> {
        let url = validate::parse_and_validate(url, self.allow_local)?;

        let mut req = self.http.request(method.as_reqwest(), url);
        if let Some(body) = body {
            req = req.json(body);
        }
        if let Some(payment) = payment {
            req = req.header(PAYMENT_AUTHORIZATION_HEADER, payment.to_header_value()?);
        }
        Ok(req.send().await?)
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get(
        &self,
        url: &str,
        payment: Option<&PaymentAuthorization>,
    ) -> Result<Response, ClientError> {
        self.request(HttpMethod::Get, url, None, payment).await
    }

    /// Sends a POST request with an optional JSON body.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn post(
        &self,
        url: &str,
        body: Option<&serde_json::Value>,
        payment: Option<&PaymentAuthorization>,
    ) -> Result<Response, ClientError> {
        self.request(HttpMethod::Post, url, body, payment).await
    }

    /// Sends a PUT request with an optional JSON body.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn put(
        &self,
        url: &str,
        body: Option<&serde_json::Value>,
        payment: Option<&PaymentAuthorization>,
    ) -> Result<Response, ClientError> {
        self.request(HttpMethod::Put, url, body, payment).await
    }

    /// Sends a DELETE request.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn delete(
        &self,
        url: &str,
        payment: Option<&PaymentAuthorization>,
    ) -> Result<Response, ClientError> {
        self.request(HttpMethod::Delete, url, None, payment).await
    }

    /// Whether the response is a 402 payment challenge.
    #[must_use]
    pub fn payment_required(response: &Response) -> bool {
        response.status().as_u16() == HTTP_STATUS_PAYMENT_REQUIRED
    }

    /// Parses the payment offer from a 402 response body.
    ///
    /// # Errors
    ///
    /// Returns [`X402Error::InvalidPaymentRequest`] if the body is missing,
    /// unreadable, or not a valid offer.
    pub async fn parse_offer(response: Response) -> Result<PaymentOffer, X402Error> {
        let body = response
            .bytes()
            .await
            .map_err(|e| X402Error::InvalidPaymentRequest {
                reason: format!("failed to read 402 response body: {e}"),
            })?;
        PaymentOffer::from_json(&body)
    }

    /// Pays an offer on the ledger and builds the authorization for the
    /// retry.
    ///
    /// `amount` overrides the paid amount; it must not exceed the offer's
    /// `max_amount`. The sequence is: expiry gate, amount gate, advisory
    /// balance gate, then build, sign, and broadcast. No funds move unless
    /// every gate passes.
    ///
    /// # Errors
    ///
    /// - [`X402Error::PaymentExpired`] if the offer's window has passed.
    /// - [`X402Error::AmountAboveLimit`] if `amount` exceeds the offer's
    ///   maximum.
    /// - [`X402Error::LedgerUnavailable`] if the balance lookup fails.
    /// - [`X402Error::InsufficientFunds`] if the balance is short.
    /// - [`X402Error::TransactionBroadcastFailed`] if the ledger rejects
    ///   the transfer.
    pub async fn create_payment(
        &self,
        offer: &PaymentOffer,
        amount: Option<Amount>,
    ) -> Result<PaymentAuthorization, X402Error> {
        if offer.is_expired() {
            return Err(X402Error::PaymentExpired {
                offer: Box::new(offer.clone()),
            });
        }

        let amount = amount.unwrap_or(offer.max_amount);
        enforce_ceiling(amount, offer.max_amount)?;

        let payer = self.ledger.payer_address().to_owned();
        let balance = self
            .ledger
            .get_balance(&payer, &offer.asset_address)
            .await
            .map_err(|e| X402Error::LedgerUnavailable {
                reason: e.to_string(),
            })?;
        if balance < amount {
            return Err(X402Error::InsufficientFunds {
                required: amount,
                available: balance,
            });
        }

        let transfer = self
            .ledger
            .build_transfer(&offer.payment_address, &offer.asset_address, &amount, &payer)
            .await
            .map_err(|e| X402Error::TransactionBroadcastFailed {
                reason: e.to_string(),
            })?;
        let tx = self
            .ledger
            .sign_and_broadcast(transfer)
            .await
            .map_err(|e| X402Error::TransactionBroadcastFailed {
                reason: e.to_string(),
            })?;

        tracing::debug!(
            payment_id = %offer.payment_id,
            transaction_hash = %tx.hash,
            %amount,
            "payment broadcast"
        );

        Ok(PaymentAuthorization {
            payment_id: offer.payment_id.clone(),
            actual_amount: amount,
            payment_address: offer.payment_address.clone(),
            asset_address: offer.asset_address.clone(),
            network: offer.network.clone(),
            timestamp: Utc::now(),
            signature: tx.signature,
            public_key: payer,
            transaction_hash: Some(tx.hash),
        })
    }
}

/// Rejects `amount` when it exceeds `limit`.
pub(crate) fn enforce_ceiling(amount: Amount, limit: Amount) -> Result<(), X402Error> {
    if amount > limit {
        return Err(X402Error::AmountAboveLimit { amount, limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libx402::testing::MockLedger;

    #[test]
    fn method_maps_to_reqwest() {
        assert_eq!(HttpMethod::Get.as_reqwest(), reqwest::Method::GET);
        assert_eq!(HttpMethod::Delete.as_reqwest(), reqwest::Method::DELETE);
        assert_eq!(HttpMethod::Post.to_string(), "POST");
    }

    #[test]
    fn ceiling_is_inclusive() {
        let limit: Amount = "0.10".parse().unwrap();
        enforce_ceiling("0.10".parse().unwrap(), limit).unwrap();
        enforce_ceiling("0.05".parse().unwrap(), limit).unwrap();
        let err = enforce_ceiling("0.11".parse().unwrap(), limit).unwrap_err();
        assert_eq!(err.code(), "AMOUNT_ABOVE_LIMIT");
    }

    #[tokio::test]
    async fn disallowed_target_fails_before_io() {
        let client = X402Client::new(Arc::new(MockLedger::new()));
        let err = client.get("http://127.0.0.1:1/never-hit", None).await.unwrap_err();
        let ClientError::Payment(err) = err else {
            panic!("expected payment error, got {err:?}");
        };
        assert_eq!(err.code(), "DISALLOWED_TARGET");
    }
}
