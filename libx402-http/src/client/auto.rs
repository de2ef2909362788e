//! Automatic pay-and-retry client.

use std::sync::Arc;

use libx402::{Amount, LedgerClient, X402Error};
use reqwest::Response;

use super::{HttpMethod, X402Client, enforce_ceiling};
use crate::error::ClientError;

/// Client that settles 402 challenges automatically.
///
/// `fetch` runs the full state machine: send, and on a 402, parse the
/// offer, pay it, and retry exactly once with the authorization attached.
/// Whatever the retry returns, including a second 402, is handed back
/// verbatim; the engine never pays twice for one call.
#[derive(Debug)]
pub struct X402AutoClient {
    client: X402Client,
    auto_retry: bool,
    max_payment: Option<Amount>,
}

impl X402AutoClient {
    /// Creates an auto-paying client over `ledger`.
    #[must_use]
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            client: X402Client::new(ledger),
            auto_retry: true,
            max_payment: None,
        }
    }

    /// Wraps an existing manual client.
    #[must_use]
    pub const fn from_client(client: X402Client) -> Self {
        Self {
            client,
            auto_retry: true,
            max_payment: None,
        }
    }

    /// Enables or disables automatic payment. When disabled, a 402
    /// surfaces as [`X402Error::PaymentRequired`] carrying the parsed
    /// offer so the caller can decide.
    #[must_use]
    pub const fn auto_retry(mut self, enabled: bool) -> Self {
        self.auto_retry = enabled;
        self
    }

    /// Caps the amount this client will ever pay for a single request.
    /// Offers above the cap fail with [`X402Error::AmountAboveLimit`]
    /// before any ledger interaction.
    #[must_use]
    pub const fn max_payment(mut self, ceiling: Amount) -> Self {
        self.max_payment = Some(ceiling);
        self
    }

    /// Permits loopback and private request targets.
    #[must_use]
    pub fn allow_local_targets(mut self, allow: bool) -> Self {
        self.client = self.client.allow_local_targets(allow);
        self
    }

    /// The underlying manual client.
    #[must_use]
    pub const fn client(&self) -> &X402Client {
        &self.client
    }

    /// Fetches `url`, paying one 402 challenge if one arrives.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Payment`] when a gate stops the payment
    /// (expiry, ceiling, balance) or the ledger fails, and
    /// [`ClientError::Http`] on transport failure. With `auto_retry`
    /// disabled, a 402 yields [`X402Error::PaymentRequired`] with the
    /// offer attached.
    pub async fn fetch(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Response, ClientError> {
        let response = self.client.request(method, url, body, None).await?;
        if !X402Client::payment_required(&response) {
            return Ok(response);
        }

        let offer = X402Client::parse_offer(response).await?;
        tracing::debug!(
            resource = %offer.resource,
            amount = %offer.max_amount,
            "received payment challenge"
        );

        if !self.auto_retry {
            return Err(X402Error::PaymentRequired {
                offer: Box::new(offer),
            }
            .into());
        }

        // The ceiling gate runs before any ledger interaction.
        if let Some(ceiling) = self.max_payment {
            enforce_ceiling(offer.max_amount, ceiling).map_err(ClientError::Payment)?;
        }

        let payment = self.client.create_payment(&offer, None).await?;
        self.client.request(method, url, body, Some(&payment)).await
    }

    /// GET with automatic payment.
    ///
    /// # Errors
    ///
    /// See [`fetch`](Self::fetch).
    pub async fn get(&self, url: &str) -> Result<Response, ClientError> {
        self.fetch(HttpMethod::Get, url, None).await
    }

    /// POST with automatic payment.
    ///
    /// # Errors
    ///
    /// See [`fetch`](Self::fetch).
    pub async fn post(
        &self,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Response, ClientError> {
        self.fetch(HttpMethod::Post, url, body).await
    }
}
