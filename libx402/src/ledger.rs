//! Abstract ledger capability the payment engine depends on.
//!
//! The engine never talks to a blockchain directly. Everything it needs —
//! balance lookup, transfer construction, sign-and-broadcast, and
//! post-hoc verification — is expressed through the [`LedgerClient`]
//! contract, implemented by chain-specific crates outside this core.

use async_trait::async_trait;

use crate::amount::Amount;

/// Errors surfaced by a ledger client implementation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LedgerError {
    /// The RPC endpoint could not be reached or returned a malformed
    /// response.
    #[error("ledger rpc error: {0}")]
    Rpc(String),
    /// The ledger rejected the transaction (simulation failure, invalid
    /// account, insufficient fee balance, and so on).
    #[error("transaction rejected: {0}")]
    Rejected(String),
    /// A referenced transaction does not exist on the ledger.
    #[error("transaction not found: {0}")]
    NotFound(String),
}

/// A transfer constructed but not yet signed or broadcast.
///
/// The engine treats the chain-specific `payload` as opaque; only the
/// ledger client that built it knows how to sign and submit it.
#[derive(Debug, Clone)]
pub struct UnsignedTransfer {
    /// Destination account.
    pub destination: String,
    /// Token being transferred.
    pub asset_address: String,
    /// Amount in human-readable token units.
    pub amount: Amount,
    /// Paying account.
    pub payer: String,
    /// Chain-specific transaction data, opaque to the engine.
    pub payload: serde_json::Value,
}

/// Reference to a broadcast transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRef {
    /// On-chain transaction hash.
    pub hash: String,
    /// Payer's signature over the transaction. On ledgers where the
    /// signature doubles as the transaction id (Solana), this equals
    /// `hash`.
    pub signature: String,
}

/// Capability contract for a specific blockchain.
///
/// Implementations own their RPC connections and signing keys and must
/// release both deterministically on drop; the engine never holds key
/// material. Implementations holding raw keys should zero them on drop.
///
/// All four operations may fail; the engine maps failures into its own
/// taxonomy (`TRANSACTION_BROADCAST_FAILED` for build/sign/broadcast,
/// `LEDGER_UNAVAILABLE` for queries).
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Returns `owner`'s balance of `asset` in human-readable token units.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the balance cannot be determined. A
    /// missing token account is a zero balance, not an error.
    async fn get_balance(&self, owner: &str, asset: &str) -> Result<Amount, LedgerError>;

    /// Constructs an unsigned transfer of `amount` of `asset` from
    /// `payer` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the transfer cannot be constructed.
    async fn build_transfer(
        &self,
        destination: &str,
        asset: &str,
        amount: &Amount,
        payer: &str,
    ) -> Result<UnsignedTransfer, LedgerError>;

    /// Signs the transfer with the client's own key and broadcasts it,
    /// waiting for the ledger to accept it.
    ///
    /// Callers must treat cancellation of this future after submission as
    /// "payment may have succeeded": an in-flight broadcast cannot be
    /// aborted once the transfer is on-chain.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if signing or broadcasting fails.
    async fn sign_and_broadcast(
        &self,
        transfer: UnsignedTransfer,
    ) -> Result<TransactionRef, LedgerError>;

    /// Confirms that `transaction_hash` exists, succeeded, and matches the
    /// expected destination, amount, and asset.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the transaction cannot be inspected.
    async fn verify_transfer(
        &self,
        transaction_hash: &str,
        expected_destination: &str,
        expected_amount: &Amount,
        expected_asset: &str,
    ) -> Result<bool, LedgerError>;

    /// The account this client pays from, reported as the authorization's
    /// `public_key`.
    fn payer_address(&self) -> &str;
}
