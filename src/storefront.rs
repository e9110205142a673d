//! Storefront
//!
//! Application context tying the catalog, the session cart, the wallet session and checkout
//! together. Built once at start up and torn down with [`Storefront::shutdown`].

use std::sync::Arc;

use tracing::debug;

use crate::{
    cart::{Cart, CartError, CartUpdate, SharedCart},
    catalog::Catalog,
    chain::{Marketplace, PaymentToken, TransactionHash, simulated::SimulatedChain},
    checkout::{CheckoutError, CheckoutSettings, CheckoutWorkflow, OrderQuote, ShippingAddress},
    wallet::{WalletProvider, WalletSession},
};

/// Storefront
#[derive(Debug)]
pub struct Storefront {
    /// Product catalog
    pub catalog: Catalog,

    /// Session cart
    pub cart: SharedCart,

    /// Wallet connection
    pub wallet: WalletSession,

    /// Checkout state
    pub checkout: CheckoutWorkflow,
}

impl Storefront {
    /// Assemble a storefront with an empty cart and subscribe to wallet notifications.
    pub fn new(catalog: Catalog, mut wallet: WalletSession, checkout: CheckoutWorkflow) -> Self {
        let cart = Cart::new(catalog.currency()).shared();

        wallet.subscribe();

        Self {
            catalog,
            cart,
            wallet,
            checkout,
        }
    }

    /// Storefront where the wallet, token and marketplace are all backed by `chain`.
    pub fn simulated(
        catalog: Catalog,
        chain: Arc<SimulatedChain>,
        settings: CheckoutSettings,
    ) -> Self {
        let provider: Arc<dyn WalletProvider> = chain.clone();
        let token: Arc<dyn PaymentToken> = chain.clone();
        let marketplace: Arc<dyn Marketplace> = chain;

        let wallet = WalletSession::new(provider);
        let checkout = CheckoutWorkflow::new(token, marketplace, settings);

        Self::new(catalog, wallet, checkout)
    }

    /// Add a catalog product to the cart. Returns `None` if no product has that id.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the product cannot be added to the cart.
    pub async fn add_to_cart(
        &self,
        product_id: &str,
        quantity: u32,
    ) -> Result<Option<CartUpdate>, CartError> {
        let Some(product) = self.catalog.product(product_id) else {
            debug!(product = product_id, "unknown product");

            return Ok(None);
        };

        self.cart
            .lock()
            .await
            .add_to_cart(product, quantity)
            .map(Some)
    }

    /// Set a cart line's quantity.
    pub async fn update_quantity(&self, product_id: &str, quantity: i64) -> CartUpdate {
        self.cart.lock().await.update_quantity(product_id, quantity)
    }

    /// Remove a cart line.
    pub async fn remove_from_cart(&self, product_id: &str) -> bool {
        self.cart.lock().await.remove_from_cart(product_id)
    }

    /// Units in the cart, for the header badge.
    pub async fn cart_count(&self) -> u64 {
        self.cart.lock().await.cart_count()
    }

    /// Price the current cart with the service fee.
    ///
    /// # Errors
    ///
    /// See [`CheckoutWorkflow::quote`].
    pub async fn quote(&self) -> Result<OrderQuote, CheckoutError> {
        let cart = self.cart.lock().await;

        self.checkout.quote(&cart)
    }

    /// Apply pending wallet notifications, then check out with the connected account.
    ///
    /// # Errors
    ///
    /// See [`CheckoutWorkflow::submit`].
    pub async fn checkout(
        &mut self,
        shipping: &ShippingAddress,
    ) -> Result<TransactionHash, CheckoutError> {
        self.wallet.sync().await;

        self.checkout
            .submit(self.wallet.account(), &self.cart, shipping)
            .await
    }

    /// Stop listening to the wallet and cancel any scheduled cart clear.
    pub fn shutdown(mut self) {
        self.wallet.unsubscribe();
        self.checkout.reset();

        debug!("storefront shut down");
    }
}
