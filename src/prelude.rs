//! Bazaar prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    amounts::{AmountError, ScaledAmount, TOKEN_DECIMALS},
    cart::{Cart, CartError, CartItem, CartUpdate, SharedCart},
    catalog::{
        BrowseFilter, Catalog, CatalogError, FEATURED_PRODUCTS, RELATED_PRODUCTS, SortKey,
    },
    chain::{
        Address, ChainId, ContractError, Marketplace, PaymentToken, TransactionHash,
        TransactionReceipt, simulated::SimulatedChain,
    },
    checkout::{
        CheckoutError, CheckoutFailure, CheckoutSettings, CheckoutStatus, CheckoutWorkflow,
        FailedStep, OrderQuote, ShippingAddress,
    },
    orders::{Order, OrderStatus},
    pricing::{Price, PricingError},
    products::{Product, ProductId, ProductKey, Seller},
    render::RenderError,
    reviews::Review,
    storefront::Storefront,
    tags::TagSet,
    users::User,
    wallet::{WalletError, WalletEvent, WalletProvider, WalletSession},
};
