//! Products

use std::{borrow::Borrow, fmt};

use jiff::Timestamp;
use slotmap::new_key_type;

use crate::{chain::Address, pricing::Price, tags::TagSet};

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Catalog product identifier, e.g. `prod-001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductId(String);

impl ProductId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ProductId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Seller summary shown alongside a product.
#[derive(Debug, Clone, PartialEq)]
pub struct Seller {
    /// Seller wallet address
    pub address: Address,

    /// Seller display name
    pub name: String,

    /// Seller rating in `[0, 5]`
    pub rating: f64,
}

/// Product
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Product identifier
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Product description
    pub description: String,

    /// Product price
    pub price: Price,

    /// Image references, the first one is the primary image
    pub images: Vec<String>,

    /// Seller summary
    pub seller: Seller,

    /// Product category
    pub category: String,

    /// Product tags
    pub tags: TagSet,

    /// Units available; zero means the product cannot be bought
    pub stock: u32,

    /// When the product was listed
    pub created_at: Timestamp,
}

impl Product {
    /// Create a product with the given id, name and price.
    ///
    /// Remaining fields start empty, with one unit in stock and an anonymous seller.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Price) -> Self {
        Self {
            id: ProductId::new(id),
            name: name.into(),
            description: String::new(),
            price,
            images: Vec::new(),
            seller: Seller {
                address: Address::new(""),
                name: String::new(),
                rating: 0.0,
            },
            category: String::new(),
            tags: TagSet::default(),
            stock: 1,
            created_at: Timestamp::UNIX_EPOCH,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the tags.
    #[must_use]
    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    /// Set the stock count.
    #[must_use]
    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    /// Set the seller summary.
    #[must_use]
    pub fn with_seller(mut self, seller: Seller) -> Self {
        self.seller = seller;
        self
    }

    /// Set the listing timestamp.
    #[must_use]
    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self
    }

    /// Set the image references.
    #[must_use]
    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    /// Whether the product can be added to a cart.
    pub fn is_purchasable(&self) -> bool {
        self.stock > 0
    }

    /// The primary image, if any.
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Whether name, description, category or any tag contains `needle`, ignoring case.
    ///
    /// `needle` must already be lowercase.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.category.to_lowercase().contains(needle)
            || self.tags.any_contains_lowercase(needle)
    }
}
