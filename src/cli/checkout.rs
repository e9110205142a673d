use std::{
    io::{self, Write},
    sync::Arc,
    time::Instant,
};

use bazaar::{
    cart::CartUpdate,
    catalog::Catalog,
    checkout::ShippingAddress,
    render,
    storefront::Storefront,
};
use clap::Args;
use humanize_duration::{Truncate, prelude::DurationExt};
use tracing::warn;

use super::{
    CliError,
    config::{ChainConfig, CheckoutConfig},
};

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Product and quantity as `id:quantity`; the quantity defaults to 1. Repeatable.
    #[arg(long = "item", required = true, value_parser = parse_cart_line)]
    items: Vec<CartLine>,

    #[command(flatten)]
    shipping: ShippingArgs,

    #[command(flatten)]
    chain: ChainConfig,

    #[command(flatten)]
    checkout: CheckoutConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CartLine {
    product_id: String,
    quantity: u32,
}

fn parse_cart_line(value: &str) -> Result<CartLine, String> {
    let (product_id, quantity) = match value.split_once(':') {
        Some((product_id, quantity)) => (
            product_id,
            quantity
                .parse()
                .map_err(|error| format!("invalid quantity `{quantity}`: {error}"))?,
        ),
        None => (value, 1),
    };

    if product_id.trim().is_empty() {
        return Err("missing product id".to_string());
    }

    Ok(CartLine {
        product_id: product_id.trim().to_string(),
        quantity,
    })
}

/// Blank fields are reported by checkout, not by argument parsing.
#[derive(Debug, Args)]
struct ShippingArgs {
    /// Recipient name
    #[arg(long, default_value = "")]
    full_name: String,

    /// Contact number
    #[arg(long, default_value = "")]
    phone_number: String,

    /// Street and house number
    #[arg(long, default_value = "")]
    street_address: String,

    /// City or town
    #[arg(long, default_value = "")]
    city: String,

    /// Parish
    #[arg(long, default_value = "")]
    parish: String,

    /// Division
    #[arg(long, default_value = "")]
    division: String,

    /// Region code
    #[arg(long, default_value = "")]
    region: String,
}

impl From<ShippingArgs> for ShippingAddress {
    fn from(args: ShippingArgs) -> Self {
        Self {
            full_name: args.full_name,
            phone_number: args.phone_number,
            street_address: args.street_address,
            city: args.city,
            parish: args.parish,
            division: args.division,
            region: args.region,
        }
    }
}

pub(crate) async fn run(catalog: Catalog, args: CheckoutArgs) -> Result<(), CliError> {
    let chain = Arc::new(args.chain.build(args.checkout.token_decimals).await);
    let settings = args
        .checkout
        .settings(&catalog, chain.marketplace().clone());

    let mut storefront = Storefront::simulated(catalog, chain, settings);
    let mut out = io::stdout();

    let account = storefront.wallet.connect().await?;

    writeln!(out, "Connected {}", account.short()).map_err(|_err| CliError::Output)?;

    for line in &args.items {
        match storefront
            .add_to_cart(&line.product_id, line.quantity)
            .await?
        {
            None => return Err(CliError::UnknownProduct(line.product_id.clone())),
            Some(CartUpdate::Unchanged) => {
                writeln!(out, "{} is out of stock", line.product_id)
                    .map_err(|_err| CliError::Output)?;
            }
            Some(CartUpdate::Set {
                quantity,
                clamped: true,
            }) => {
                writeln!(out, "Only {quantity} of {} available", line.product_id)
                    .map_err(|_err| CliError::Output)?;
            }
            Some(_) => {}
        }
    }

    let quote = storefront.quote().await?;

    render::write_order_summary(&mut out, &*storefront.cart.lock().await, &quote)?;

    let shipping = ShippingAddress::from(args.shipping);
    let started_at = Instant::now();

    let hash = storefront.checkout(&shipping).await?;

    writeln!(
        out,
        "Payment successful! Transaction: {hash} ({})",
        started_at.elapsed().human(Truncate::Nano)
    )
    .map_err(|_err| CliError::Output)?;

    if let Some(clear) = storefront.checkout.take_pending_clear()
        && let Err(error) = clear.await
    {
        warn!(%error, "cart clear did not run");
    }

    writeln!(out, "Cart items: {}", storefront.cart_count().await)
        .map_err(|_err| CliError::Output)?;

    storefront.shutdown();

    Ok(())
}
