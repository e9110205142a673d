//! Bazaar
//!
//! Bazaar is the storefront core of a stablecoin marketplace: a static product catalog with
//! search, filtering and sorting, a session-scoped cart, and a checkout workflow that pays for
//! the cart through a payment token approval followed by a marketplace order.
//!
//! Wallets and contracts are reached through the async traits in [`wallet`] and [`chain`];
//! [`chain::simulated::SimulatedChain`] provides an in-memory implementation of all of them.

pub mod amounts;
pub mod cart;
pub mod catalog;
pub mod chain;
pub mod checkout;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod render;
pub mod reviews;
pub mod storefront;
pub mod tags;
pub mod users;
pub mod wallet;
