//! Users

use crate::chain::Address;

/// Marketplace user profile.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Wallet address
    pub address: Address,

    /// Display name
    pub name: String,

    /// Profile text
    pub bio: String,

    /// Avatar image reference, empty when unset
    pub avatar: String,

    /// Rating in `[0, 5]`
    pub rating: f64,

    /// Whether the user lists products
    pub is_seller: bool,
}

impl User {
    /// Profile shown for an address with no catalog entry.
    ///
    /// Named after the first six characters of the address, e.g. `User 0x9999`.
    pub fn placeholder(address: &Address) -> Self {
        let prefix: String = address.as_str().chars().take(6).collect();

        Self {
            address: address.clone(),
            name: format!("User {prefix}"),
            bio: String::new(),
            avatar: String::new(),
            rating: 0.0,
            is_seller: false,
        }
    }
}
