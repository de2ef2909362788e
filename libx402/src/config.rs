//! Payment terms configuration for resource servers and clients.
//!
//! Configuration is an explicit value handed to constructors
//! ([`PaymentGate::new`](crate::verify::PaymentGate::new), ledger client
//! builders), not a process-wide singleton, so there is no initialization
//! ordering to get wrong and concurrent readers need no locking.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;

/// Default token standard for issued offers.
const DEFAULT_ASSET_TYPE: &str = "SPL";

/// Default ledger environment.
const DEFAULT_NETWORK: &str = "solana-devnet";

/// Default amount charged when a resource does not name its own price.
const DEFAULT_AMOUNT: &str = "0.01";

/// Default offer validity window, in seconds.
const DEFAULT_EXPIRES_IN_SECS: u64 = 300;

/// Payment terms supplied once at process start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct X402Config {
    /// Destination account for funds.
    pub payment_address: String,
    /// Address of the token accepted as payment.
    pub asset_address: String,
    /// Token standard of the asset (e.g. `"SPL"`).
    #[serde(default = "default_asset_type")]
    pub asset_type: String,
    /// Ledger environment offers target (e.g. `"solana-devnet"`).
    #[serde(default = "default_network")]
    pub network: String,
    /// RPC endpoint for on-chain verification; falls back to the
    /// network's well-known endpoint when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
    /// Amount charged when the caller does not specify one.
    #[serde(default = "default_amount")]
    pub default_amount: Amount,
    /// Validity window stamped on issued offers, in seconds.
    #[serde(default = "default_expires_in")]
    pub expires_in_secs: u64,
    /// Whether verification should confirm the transfer on-chain when an
    /// authorization carries a transaction hash.
    #[serde(default = "default_true")]
    pub verify_on_chain: bool,
}

fn default_asset_type() -> String {
    DEFAULT_ASSET_TYPE.to_owned()
}

fn default_network() -> String {
    DEFAULT_NETWORK.to_owned()
}

fn default_amount() -> Amount {
    DEFAULT_AMOUNT.parse().expect("default amount is valid")
}

const fn default_expires_in() -> u64 {
    DEFAULT_EXPIRES_IN_SECS
}

const fn default_true() -> bool {
    true
}

impl X402Config {
    /// Creates a configuration with the given destination and asset and
    /// defaults for everything else.
    #[must_use]
    pub fn new(payment_address: impl Into<String>, asset_address: impl Into<String>) -> Self {
        Self {
            payment_address: payment_address.into(),
            asset_address: asset_address.into(),
            asset_type: default_asset_type(),
            network: default_network(),
            rpc_url: None,
            default_amount: default_amount(),
            expires_in_secs: DEFAULT_EXPIRES_IN_SECS,
            verify_on_chain: true,
        }
    }

    /// Sets the target network.
    #[must_use]
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    /// Sets an explicit RPC endpoint.
    #[must_use]
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = Some(rpc_url.into());
        self
    }

    /// Sets the default charged amount.
    #[must_use]
    pub const fn with_default_amount(mut self, amount: Amount) -> Self {
        self.default_amount = amount;
        self
    }

    /// Sets the offer validity window.
    #[must_use]
    pub const fn with_expires_in_secs(mut self, secs: u64) -> Self {
        self.expires_in_secs = secs;
        self
    }

    /// Enables or disables on-chain verification.
    #[must_use]
    pub const fn with_verify_on_chain(mut self, verify: bool) -> Self {
        self.verify_on_chain = verify;
        self
    }

    /// Returns the RPC endpoint, falling back to the network's well-known
    /// public endpoint.
    #[must_use]
    pub fn rpc_url(&self) -> &str {
        if let Some(url) = &self.rpc_url {
            return url;
        }
        match self.network.as_str() {
            "solana-mainnet" => "https://api.mainnet-beta.solana.com",
            "solana-testnet" => "https://api.testnet.solana.com",
            _ => "https://api.devnet.solana.com",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = X402Config::new("recipient", "mint");
        assert_eq!(config.asset_type, "SPL");
        assert_eq!(config.network, "solana-devnet");
        assert_eq!(config.default_amount.to_string(), "0.01");
        assert_eq!(config.expires_in_secs, 300);
        assert!(config.verify_on_chain);
    }

    #[test]
    fn rpc_url_falls_back_per_network() {
        let config = X402Config::new("recipient", "mint").with_network("solana-mainnet");
        assert_eq!(config.rpc_url(), "https://api.mainnet-beta.solana.com");

        let config = config.with_rpc_url("http://127.0.0.1:8899");
        assert_eq!(config.rpc_url(), "http://127.0.0.1:8899");
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: X402Config = serde_json::from_str(
            r#"{"payment_address": "recipient", "asset_address": "mint"}"#,
        )
        .unwrap();
        assert_eq!(config.network, "solana-devnet");
        assert!(config.verify_on_chain);
    }
}
