//! Cart
//!
//! Session-scoped shopping cart. Quantities are clamped into `[1, stock]` rather than rejected;
//! every mutation reports what it actually applied through [`CartUpdate`].

use std::sync::Arc;

use rusty_money::iso::Currency;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    pricing::{self, Price, PricingError},
    products::Product,
};

/// Cart shared between the storefront and the delayed clear after checkout.
pub type SharedCart = Arc<Mutex<Cart>>;

/// Errors related to cart mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// The product is priced in a different currency to the cart (product id, product currency, cart currency).
    #[error("Product {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(String, &'static str, &'static str),
}

/// Outcome of a cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartUpdate {
    /// The line now holds `quantity` units; `clamped` when that differs from the request.
    Set {
        /// Quantity stored on the line
        quantity: u32,

        /// Whether the request was clamped to fit stock
        clamped: bool,
    },

    /// The line was removed.
    Removed,

    /// Nothing changed: unknown product, or a product with no stock.
    Unchanged,
}

/// A product snapshot and the quantity wanted.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    /// Product as it was when first added
    pub product: Product,

    /// Units wanted, `1..=product.stock`
    pub quantity: u32,
}

impl CartItem {
    /// Price of this line.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the line total does not fit in minor units.
    pub fn line_total(&self) -> Result<Price, PricingError> {
        pricing::line_total(&self.product.price, self.quantity)
    }
}

/// Cart
#[derive(Debug, Clone)]
pub struct Cart {
    items: Vec<CartItem>,
    currency: &'static Currency,
}

impl Cart {
    /// Create an empty cart priced in `currency`.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            items: Vec::new(),
            currency,
        }
    }

    /// Wrap the cart for sharing across tasks.
    pub fn shared(self) -> SharedCart {
        Arc::new(Mutex::new(self))
    }

    /// Add `quantity` units of `product`.
    ///
    /// An existing line is incremented, capped at the product's stock. A new line is inserted with
    /// the quantity clamped into `[1, stock]`. Products with no stock are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] if the product is not priced in the cart currency.
    pub fn add_to_cart(
        &mut self,
        product: &Product,
        quantity: u32,
    ) -> Result<CartUpdate, CartError> {
        let product_currency = product.price.currency();

        if product_currency != self.currency {
            return Err(CartError::CurrencyMismatch(
                product.id.to_string(),
                product_currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        if !product.is_purchasable() {
            debug!(product = %product.id, "ignoring add of out of stock product");

            return Ok(CartUpdate::Unchanged);
        }

        let update = if let Some(item) = self.item_mut(product.id.as_str()) {
            let requested = item.quantity.saturating_add(quantity);
            let applied = requested.min(product.stock);

            item.quantity = applied;

            CartUpdate::Set {
                quantity: applied,
                clamped: applied != requested,
            }
        } else {
            let applied = quantity.clamp(1, product.stock);

            self.items.push(CartItem {
                product: product.clone(),
                quantity: applied,
            });

            CartUpdate::Set {
                quantity: applied,
                clamped: applied != quantity,
            }
        };

        debug!(product = %product.id, ?update, "added to cart");

        Ok(update)
    }

    /// Set the quantity of an existing line.
    ///
    /// Zero or negative quantities remove the line. Other values are clamped into
    /// `[1, stock]` of the stored snapshot. Unknown products are ignored.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CartUpdate {
        if quantity <= 0 {
            return if self.remove_from_cart(product_id) {
                CartUpdate::Removed
            } else {
                CartUpdate::Unchanged
            };
        }

        let Some(item) = self.item_mut(product_id) else {
            return CartUpdate::Unchanged;
        };

        let stock = item.product.stock.max(1);
        let applied = u32::try_from(quantity).unwrap_or(u32::MAX).min(stock);

        item.quantity = applied;

        let update = CartUpdate::Set {
            quantity: applied,
            clamped: i64::from(applied) != quantity,
        };

        debug!(product = product_id, ?update, "updated cart quantity");

        update
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove_from_cart(&mut self, product_id: &str) -> bool {
        let before = self.items.len();

        self.items
            .retain(|item| item.product.id.as_str() != product_id);

        let removed = self.items.len() != before;

        if removed {
            debug!(product = product_id, "removed from cart");
        }

        removed
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        debug!(lines = self.items.len(), "clearing cart");

        self.items.clear();
    }

    /// Sum of quantities across all lines.
    pub fn cart_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of `price * quantity` across all lines, zero when empty.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if a line total overflows.
    pub fn total_price(&self) -> Result<Price, PricingError> {
        let lines = self
            .items
            .iter()
            .map(CartItem::line_total)
            .collect::<Result<Vec<_>, _>>()?;

        pricing::sum(lines, self.currency)
    }

    /// Lines in the order they were first added.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Iterate over the lines.
    pub fn iter(&self) -> impl Iterator<Item = &CartItem> {
        self.items.iter()
    }

    /// Look up a line by product id.
    pub fn get(&self, product_id: &str) -> Option<&CartItem> {
        self.items
            .iter()
            .find(|item| item.product.id.as_str() == product_id)
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Currency of the cart.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    fn item_mut(&mut self, product_id: &str) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|item| item.product.id.as_str() == product_id)
    }
}
