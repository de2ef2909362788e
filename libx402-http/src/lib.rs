//! HTTP transport layer for the x402 payment protocol.
//!
//! Pairs with the `libx402` core engine: this crate owns everything that
//! touches HTTP, from header constants and request-target validation to
//! paying clients and server response rendering.
//!
//! # Modules
//!
//! - [`constants`] - Header names and protocol constants
//! - [`validate`] - Request-target validation for paying clients
//! - [`client`] - Manual, automatic, and middleware paying clients
//! - [`server`] - Framework-neutral response rendering
//! - [`error`] - HTTP-level client errors

pub mod client;
pub mod constants;
pub mod error;
pub mod server;
pub mod validate;

pub use client::auto::X402AutoClient;
pub use client::middleware::X402PaymentMiddleware;
pub use client::{HttpMethod, X402Client};
pub use error::ClientError;
pub use server::{ResponseParts, denial_parts, payment_required_parts};
