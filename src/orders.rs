//! Orders

use std::fmt;

use jiff::Timestamp;
use serde::Deserialize;

use crate::{
    cart::CartItem,
    chain::{Address, TransactionHash},
    pricing::Price,
};

/// Order fulfilment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Paid, not yet handled by the seller
    Pending,

    /// Being prepared
    Processing,

    /// Handed to the carrier
    Shipped,

    /// Received by the buyer
    Delivered,

    /// Cancelled before delivery
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        })
    }
}

/// A past purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Order identifier
    pub id: String,

    /// Buyer wallet address
    pub buyer: Address,

    /// Purchased lines, with product snapshots
    pub items: Vec<CartItem>,

    /// Amount paid
    pub total: Price,

    /// Fulfilment status
    pub status: OrderStatus,

    /// Order placement transaction
    pub transaction_hash: TransactionHash,

    /// When the order was placed
    pub created_at: Timestamp,

    /// Last status change
    pub updated_at: Timestamp,
}

impl Order {
    /// Total number of units across all lines.
    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}
