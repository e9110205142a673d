//! CLI Configuration

use std::{path::PathBuf, time::Duration};

use bazaar::{
    amounts::{ScaledAmount, TOKEN_DECIMALS},
    catalog::{Catalog, CatalogError},
    chain::{Address, ChainId, simulated::SimulatedChain},
    checkout::CheckoutSettings,
};
use clap::Args;
use rust_decimal::Decimal;
use rusty_money::Money;

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub(crate) struct LoggingConfig {
    /// Log level or filter directives (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub(crate) log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub(crate) log_format: LogFormat,
}

/// Catalog source.
#[derive(Debug, Args)]
pub(crate) struct CatalogConfig {
    /// Catalog YAML file; the bundled demo catalog is used when omitted
    #[arg(long, env = "BAZAAR_CATALOG", global = true)]
    pub(crate) catalog: Option<PathBuf>,
}

impl CatalogConfig {
    pub(crate) fn load(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog {
            Some(path) => Catalog::from_path(path),
            None => Catalog::demo(),
        }
    }
}

/// Simulated wallet and contracts.
#[derive(Debug, Args)]
pub(crate) struct ChainConfig {
    /// Wallet account used for checkout
    #[arg(
        long,
        env = "BAZAAR_ACCOUNT",
        default_value = "0x4567890123456789012345678901234567890123"
    )]
    pub(crate) account: String,

    /// Chain id reported by the wallet
    #[arg(long, env = "BAZAAR_CHAIN_ID", default_value = "0xaa36a7")]
    pub(crate) chain_id: String,

    /// Marketplace contract address
    #[arg(
        long,
        env = "BAZAAR_MARKETPLACE_CONTRACT",
        default_value = "0x9f8F72aA9304c8B593d555F12eF6589cC3A579A2"
    )]
    pub(crate) marketplace_contract: String,

    /// Native balance of the account in wei
    #[arg(long, env = "BAZAAR_WEI_BALANCE", default_value_t = 1_000_000_000_000_000_000)]
    pub(crate) wei_balance: u128,

    /// Payment token balance of the account, in whole tokens
    #[arg(long, env = "BAZAAR_TOKEN_BALANCE", default_value_t = 1_000)]
    pub(crate) token_balance: u128,

    /// Decline the first signing request
    #[arg(long, default_value_t = false)]
    pub(crate) reject: bool,
}

impl ChainConfig {
    pub(crate) async fn build(&self, token_decimals: u32) -> SimulatedChain {
        let chain = SimulatedChain::new(
            Address::new(self.account.as_str()),
            ChainId::new(self.chain_id.as_str()),
            Address::new(self.marketplace_contract.as_str()),
            self.wei_balance,
            ScaledAmount::from_units(self.token_balance, token_decimals),
        );

        if self.reject {
            chain.reject_next_request().await;
        }

        chain
    }
}

/// Checkout pricing and timing.
#[derive(Debug, Args)]
pub(crate) struct CheckoutConfig {
    /// Service fee added to every order, in the catalog currency
    #[arg(long, env = "BAZAAR_SERVICE_FEE", default_value = "2.50")]
    pub(crate) service_fee: Decimal,

    /// Delay before the cart is emptied after a successful order, in milliseconds
    #[arg(long, env = "BAZAAR_CLEAR_DELAY_MS", default_value_t = 3_000)]
    pub(crate) clear_delay_ms: u64,

    /// Decimals of the payment token
    #[arg(long, env = "BAZAAR_TOKEN_DECIMALS", default_value_t = TOKEN_DECIMALS)]
    pub(crate) token_decimals: u32,
}

impl CheckoutConfig {
    pub(crate) fn settings(&self, catalog: &Catalog, marketplace: Address) -> CheckoutSettings {
        CheckoutSettings::new(catalog.currency(), marketplace)
            .with_service_fee(Money::from_decimal(self.service_fee, catalog.currency()))
            .with_token_decimals(self.token_decimals)
            .with_clear_delay(Duration::from_millis(self.clear_delay_ms))
    }
}
