//! Payment handling as `reqwest-middleware` middleware.
//!
//! Attaching [`X402PaymentMiddleware`] to a
//! [`reqwest_middleware::ClientWithMiddleware`] makes 402 handling
//! transparent: existing call sites keep using the plain `reqwest` API
//! and paid retries happen underneath them.

use std::sync::Arc;

use http::Extensions;
use libx402::{Amount, LedgerClient};
use reqwest::{Request, Response, StatusCode};
use reqwest_middleware as rqm;

use super::{X402Client, enforce_ceiling};
use crate::constants::PAYMENT_AUTHORIZATION_HEADER;
use crate::error::ClientError;
use crate::validate;

/// Middleware that settles one 402 challenge per request.
pub struct X402PaymentMiddleware {
    client: X402Client,
    max_payment: Option<Amount>,
    allow_local: bool,
}

impl std::fmt::Debug for X402PaymentMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X402PaymentMiddleware")
            .field("max_payment", &self.max_payment)
            .field("allow_local", &self.allow_local)
            .finish_non_exhaustive()
    }
}

impl X402PaymentMiddleware {
    /// Creates middleware paying from `ledger`.
    #[must_use]
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            client: X402Client::new(ledger),
            max_payment: None,
            allow_local: false,
        }
    }

    /// Caps the amount paid for any single request.
    #[must_use]
    pub const fn max_payment(mut self, ceiling: Amount) -> Self {
        self.max_payment = Some(ceiling);
        self
    }

    /// Permits loopback and private request targets.
    #[must_use]
    pub const fn allow_local_targets(mut self, allow: bool) -> Self {
        self.allow_local = allow;
        self
    }

    async fn pay_challenge(&self, res: Response) -> Result<String, ClientError> {
        let offer = X402Client::parse_offer(res).await?;
        if let Some(ceiling) = self.max_payment {
            enforce_ceiling(offer.max_amount, ceiling).map_err(ClientError::Payment)?;
        }
        let payment = self.client.create_payment(&offer, None).await?;
        Ok(payment.to_header_value()?)
    }
}

#[async_trait::async_trait]
impl rqm::Middleware for X402PaymentMiddleware {
    /// Runs the request, and on a 402 pays the challenge and retries once
    /// with the authorization header attached. The retry's response is
    /// returned verbatim, even if it is another 402.
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: rqm::Next<'_>,
    ) -> rqm::Result<Response> {
        validate::validate_target(req.url(), self.allow_local)
            .map_err(|e| rqm::Error::Middleware(ClientError::from(e).into()))?;

        let retry_req = req.try_clone();
        let res = next.clone().run(req, extensions).await?;

        if res.status() != StatusCode::PAYMENT_REQUIRED {
            return Ok(res);
        }

        let header = self
            .pay_challenge(res)
            .await
            .map_err(|e| rqm::Error::Middleware(e.into()))?;

        let mut retry = retry_req.ok_or_else(|| {
            rqm::Error::Middleware(ClientError::RequestNotCloneable.into())
        })?;
        // Base64 output is always a valid header value.
        retry.headers_mut().insert(
            PAYMENT_AUTHORIZATION_HEADER,
            header.parse().expect("base64 is a valid header value"),
        );

        next.run(retry, extensions).await
    }
}
