//! Chain
//!
//! Identifiers and contract boundaries used by checkout. The payment token and the marketplace
//! are external contracts; implementations submit a transaction and resolve once it is mined.

use std::fmt;

use async_trait::async_trait;
use mockall::automock;
use serde::Deserialize;
use thiserror::Error;

use crate::amounts::ScaledAmount;

pub mod simulated;

/// An account or contract address, kept as the provider formats it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wrap an address string.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The address text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against another address ignoring hex letter case.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }

    /// Shortened form for display, e.g. `0x1234...7890`.
    ///
    /// Addresses of ten characters or fewer are returned unchanged.
    pub fn short(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();

        if chars.len() <= 10 {
            return self.0.clone();
        }

        let head: String = chars.iter().take(6).collect();
        let tail: String = chars.iter().skip(chars.len() - 4).collect();

        format!("{head}...{tail}")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Hex chain identifier reported by the wallet (e.g. `0xaa36a7`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainId(String);

impl ChainId {
    /// Wrap a chain id string.
    pub fn new(chain_id: impl Into<String>) -> Self {
        Self(chain_id.into())
    }

    /// The chain id text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct TransactionHash(String);

impl TransactionHash {
    /// Wrap a transaction hash string.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// The hash text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Confirmation of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    /// Hash of the confirmed transaction.
    pub transaction_hash: TransactionHash,

    /// Block the transaction was included in.
    pub block_number: u64,
}

/// Contract call failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractError {
    /// The user declined to sign the transaction.
    #[error("transaction rejected by user")]
    Rejected,

    /// The transaction was mined but reverted.
    #[error("transaction reverted: {0}")]
    Reverted(String),

    /// The transaction could not be submitted or confirmed.
    #[error("network error: {0}")]
    Network(String),
}

/// The stablecoin used for payment.
#[automock]
#[async_trait]
pub trait PaymentToken: Send + Sync {
    /// Allow `spender` to transfer up to `amount` from the connected account.
    ///
    /// Resolves once the approval transaction is confirmed.
    async fn approve(
        &self,
        spender: &Address,
        amount: ScaledAmount,
    ) -> Result<TransactionReceipt, ContractError>;
}

/// The marketplace contract that takes payment and records orders.
#[automock]
#[async_trait]
pub trait Marketplace: Send + Sync {
    /// Place an order for `amount`, carrying free-text shipping details.
    ///
    /// Resolves once the order transaction is confirmed.
    async fn place_order(
        &self,
        shipping_details: &str,
        amount: ScaledAmount,
    ) -> Result<TransactionReceipt, ContractError>;
}
