//! Core engine for the x402 payment-over-HTTP protocol.
//!
//! This crate implements the challenge-response handshake layered on HTTP
//! status 402: a resource server advertises a [`PaymentOffer`] with a price
//! and destination, a client settles it on a ledger and retries with a
//! [`PaymentAuthorization`], and the server verifies the authorization
//! before serving the protected resource.
//!
//! The engine is transport- and ledger-agnostic. HTTP plumbing lives in the
//! companion `libx402-http` crate; blockchain specifics live behind the
//! [`LedgerClient`](ledger::LedgerClient) contract.
//!
//! # Modules
//!
//! - [`amount`] - Exact-decimal payment amounts
//! - [`config`] - Payment terms supplied by the resource server operator
//! - [`error`] - Shared client-side error taxonomy
//! - [`ledger`] - Abstract ledger capability the engine depends on
//! - [`proto`] - Offer and authorization wire types
//! - [`replay`] - Consumed-payment-id tracking for replay rejection
//! - [`testing`] - Mock ledger and fixtures for tests
//! - [`verify`] - Server-side verification of inbound authorizations

pub mod amount;
pub mod config;
pub mod error;
pub mod ledger;
pub mod proto;
pub mod replay;
pub mod testing;
pub mod verify;

pub use amount::Amount;
pub use config::X402Config;
pub use error::X402Error;
pub use ledger::{LedgerClient, LedgerError, TransactionRef, UnsignedTransfer};
pub use proto::{PaymentAuthorization, PaymentOffer};
pub use verify::{PaymentDenied, PaymentGate};
