use bazaar::{
    cart::CartError,
    catalog::CatalogError,
    checkout::CheckoutError,
    render::RenderError,
    wallet::WalletError,
};
use clap::{Parser, Subcommand};
use thiserror::Error;

pub(crate) mod config;
pub(crate) mod observability;

mod browse;
mod checkout;
mod profile;

use config::{CatalogConfig, LoggingConfig};

#[derive(Debug, Parser)]
#[command(name = "bazaar", about = "Bazaar marketplace CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(flatten)]
    catalog: CatalogConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Featured products and categories
    Home,

    /// Search, filter and sort the catalog
    Products(browse::ProductsArgs),

    /// Show a product with its reviews
    Product(browse::ProductArgs),

    /// Show a user's profile, listings and orders
    Profile(profile::ProfileArgs),

    /// Fill a cart, print it as an order summary and pay for it with the simulated wallet
    Checkout(checkout::CheckoutArgs),
}

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("Product not found: {0}")]
    UnknownProduct(String),

    #[error("failed to write output")]
    Output,
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), CliError> {
        let catalog = self.catalog.load()?;

        match self.command {
            Commands::Home => browse::home(&catalog),
            Commands::Products(args) => browse::products(&catalog, args),
            Commands::Product(args) => browse::product(&catalog, &args),
            Commands::Profile(args) => profile::run(&catalog, &args),
            Commands::Checkout(args) => checkout::run(catalog, args).await,
        }
    }
}
