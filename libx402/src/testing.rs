//! Mock ledger and fixtures for testing payment flows without a
//! blockchain.
//!
//! [`MockLedger`] implements [`LedgerClient`] entirely in memory and
//! records every broadcast, which lets tests assert that safety gates
//! (payment ceiling, advisory balance) really do prevent funds from
//! moving.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::amount::Amount;
use crate::ledger::{LedgerClient, LedgerError, TransactionRef, UnsignedTransfer};
use crate::proto::{PaymentAuthorization, PaymentOffer, encoding};

/// In-memory [`LedgerClient`] with configurable balance and failure
/// injection.
#[derive(Debug)]
pub struct MockLedger {
    payer: String,
    balance: Mutex<Amount>,
    fail_broadcast: AtomicBool,
    refuse_verification: AtomicBool,
    broadcasts: Mutex<Vec<TransactionRef>>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedger {
    /// Creates a mock ledger with a payer identity and a balance of 100
    /// tokens.
    #[must_use]
    pub fn new() -> Self {
        Self {
            payer: "mock_payer_pubkey".to_owned(),
            balance: Mutex::new("100".parse().expect("valid amount")),
            fail_broadcast: AtomicBool::new(false),
            refuse_verification: AtomicBool::new(false),
            broadcasts: Mutex::new(Vec::new()),
        }
    }

    /// Overrides the reported balance.
    pub fn set_balance(&self, balance: Amount) {
        *self.balance.lock().expect("balance lock") = balance;
    }

    /// Makes every build/sign/broadcast call fail.
    pub fn fail_broadcast(&self) {
        self.fail_broadcast.store(true, Ordering::SeqCst);
    }

    /// Makes [`LedgerClient::verify_transfer`] report `false`.
    pub fn refuse_verification(&self) {
        self.refuse_verification.store(true, Ordering::SeqCst);
    }

    /// Number of transfers broadcast so far.
    #[must_use]
    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.lock().expect("broadcasts lock").len()
    }

    /// References of every broadcast transfer, in order.
    #[must_use]
    pub fn broadcasts(&self) -> Vec<TransactionRef> {
        self.broadcasts.lock().expect("broadcasts lock").clone()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn get_balance(&self, _owner: &str, _asset: &str) -> Result<Amount, LedgerError> {
        Ok(*self.balance.lock().expect("balance lock"))
    }

    async fn build_transfer(
        &self,
        destination: &str,
        asset: &str,
        amount: &Amount,
        payer: &str,
    ) -> Result<UnsignedTransfer, LedgerError> {
        if self.fail_broadcast.load(Ordering::SeqCst) {
            return Err(LedgerError::Rejected("mock transfer build failed".into()));
        }
        Ok(UnsignedTransfer {
            destination: destination.to_owned(),
            asset_address: asset.to_owned(),
            amount: *amount,
            payer: payer.to_owned(),
            payload: serde_json::json!({ "mock": true }),
        })
    }

    async fn sign_and_broadcast(
        &self,
        transfer: UnsignedTransfer,
    ) -> Result<TransactionRef, LedgerError> {
        if self.fail_broadcast.load(Ordering::SeqCst) {
            return Err(LedgerError::Rejected("mock broadcast failed".into()));
        }
        let hash = format!("mock_tx_{}", encoding::random_token(24));
        let tx = TransactionRef {
            signature: hash.clone(),
            hash,
        };
        let mut debit = self.balance.lock().expect("balance lock");
        *debit = (debit.as_decimal() - transfer.amount.as_decimal()).into();
        self.broadcasts
            .lock()
            .expect("broadcasts lock")
            .push(tx.clone());
        Ok(tx)
    }

    async fn verify_transfer(
        &self,
        transaction_hash: &str,
        _expected_destination: &str,
        _expected_amount: &Amount,
        _expected_asset: &str,
    ) -> Result<bool, LedgerError> {
        if self.refuse_verification.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let known = self
            .broadcasts
            .lock()
            .expect("broadcasts lock")
            .iter()
            .any(|tx| tx.hash == transaction_hash);
        // Hashes the mock never issued are treated as externally settled.
        Ok(known || transaction_hash.starts_with("mock_tx_"))
    }

    fn payer_address(&self) -> &str {
        &self.payer
    }
}

/// A valid offer for `/api/data`, expiring five minutes from now.
#[must_use]
pub fn sample_offer() -> PaymentOffer {
    PaymentOffer {
        max_amount: "0.10".parse().expect("valid amount"),
        asset_type: "SPL".to_owned(),
        asset_address: "mock_usdc_mint".to_owned(),
        payment_address: "mock_recipient".to_owned(),
        network: "solana-devnet".to_owned(),
        expires_at: Utc::now() + Duration::seconds(300),
        nonce: encoding::random_token(32),
        payment_id: encoding::random_token(16),
        resource: "/api/data".to_owned(),
        description: Some("Mock payment offer".to_owned()),
    }
}

/// An authorization that satisfies `offer` in full, with a mock
/// transaction hash.
#[must_use]
pub fn authorization_for(offer: &PaymentOffer) -> PaymentAuthorization {
    PaymentAuthorization {
        payment_id: offer.payment_id.clone(),
        actual_amount: offer.max_amount,
        payment_address: offer.payment_address.clone(),
        asset_address: offer.asset_address.clone(),
        network: offer.network.clone(),
        timestamp: Utc::now(),
        signature: "mock_signature".to_owned(),
        public_key: "mock_payer_pubkey".to_owned(),
        transaction_hash: Some(format!("mock_tx_{}", encoding::random_token(24))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_ledger_records_broadcasts_and_debits() {
        let ledger = MockLedger::new();
        let amount: Amount = "0.10".parse().unwrap();
        let transfer = ledger
            .build_transfer("recipient", "mint", &amount, ledger.payer_address())
            .await
            .unwrap();
        let tx = ledger.sign_and_broadcast(transfer).await.unwrap();

        assert_eq!(ledger.broadcast_count(), 1);
        assert_eq!(ledger.broadcasts()[0], tx);
        let balance = ledger.get_balance("", "").await.unwrap();
        assert_eq!(balance, "99.90".parse().unwrap());
        assert!(
            ledger
                .verify_transfer(&tx.hash, "recipient", &amount, "mint")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn failure_injection_rejects_broadcast() {
        let ledger = MockLedger::new();
        ledger.fail_broadcast();
        let amount: Amount = "0.10".parse().unwrap();
        let err = ledger
            .build_transfer("recipient", "mint", &amount, ledger.payer_address())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Rejected(_)));
        assert_eq!(ledger.broadcast_count(), 0);
    }
}
