//! Render
//!
//! Terminal tables for product listings, product details, profiles and the order summary.

use std::{io, ops::Range};

use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::Cart,
    checkout::OrderQuote,
    orders::Order,
    pricing::PricingError,
    products::Product,
    reviews::Review,
    users::User,
};

/// Errors that can occur when rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A line total could not be calculated.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Write a product listing table.
///
/// # Errors
///
/// Returns [`RenderError::IO`] if the output cannot be written.
pub fn write_products(out: &mut impl io::Write, products: &[&Product]) -> Result<(), RenderError> {
    if products.is_empty() {
        return writeln!(out, "No products found.").map_err(|_err| RenderError::IO);
    }

    let mut builder = Builder::default();

    builder.push_record(["ID", "Name", "Category", "Price", "Stock", "Seller"]);

    for product in products {
        builder.push_record([
            product.id.to_string(),
            product.name.clone(),
            product.category.clone(),
            product.price.to_string(),
            stock_label(product),
            format!("{} ({:.1})", product.seller.name, product.seller.rating),
        ]);
    }

    write_table(out, builder, Some(3..5))
}

/// Write a product's details and reviews.
///
/// # Errors
///
/// Returns [`RenderError::IO`] if the output cannot be written.
pub fn write_product_detail(
    out: &mut impl io::Write,
    product: &Product,
    reviews: &[&Review],
    average_rating: f64,
) -> Result<(), RenderError> {
    let mut builder = Builder::default();

    builder.push_record(["Field", "Value"]);
    builder.push_record(["ID".to_string(), product.id.to_string()]);
    builder.push_record(["Name".to_string(), product.name.clone()]);
    builder.push_record(["Price".to_string(), product.price.to_string()]);
    builder.push_record(["Category".to_string(), product.category.clone()]);
    builder.push_record(["Tags".to_string(), product.tags.to_strs().join(", ")]);
    builder.push_record(["Stock".to_string(), stock_label(product)]);
    builder.push_record([
        "Seller".to_string(),
        format!(
            "{} {} ({:.1})",
            product.seller.name,
            product.seller.address.short(),
            product.seller.rating
        ),
    ]);
    builder.push_record([
        "Rating".to_string(),
        format!("{average_rating:.1} from {} reviews", reviews.len()),
    ]);
    builder.push_record([
        "Image".to_string(),
        product.primary_image().unwrap_or_default().to_string(),
    ]);

    write_table(out, builder, None)?;

    writeln!(out, "{}\n", product.description).map_err(|_err| RenderError::IO)?;

    for review in reviews {
        writeln!(
            out,
            "  {} {}  {}\n  {}\n",
            "*".repeat(usize::from(review.rating)),
            review.reviewer.short(),
            review.created_at.strftime("%Y-%m-%d"),
            review.comment
        )
        .map_err(|_err| RenderError::IO)?;
    }

    Ok(())
}

/// Write a user profile with listed products, and past orders when `orders` is given.
///
/// # Errors
///
/// Returns [`RenderError::IO`] if the output cannot be written.
pub fn write_profile(
    out: &mut impl io::Write,
    user: &User,
    listed: &[&Product],
    orders: Option<&[&Order]>,
) -> Result<(), RenderError> {
    writeln!(
        out,
        "\n{} ({})\n{}\nRating: {:.1}",
        user.name,
        user.address.short(),
        user.bio,
        user.rating
    )
    .map_err(|_err| RenderError::IO)?;

    if user.is_seller {
        writeln!(out, "\nListed products:").map_err(|_err| RenderError::IO)?;
        write_products(out, listed)?;
    }

    let Some(orders) = orders else {
        return Ok(());
    };

    writeln!(out, "\nOrders:").map_err(|_err| RenderError::IO)?;

    if orders.is_empty() {
        return writeln!(out, "No orders yet.").map_err(|_err| RenderError::IO);
    }

    let mut builder = Builder::default();

    builder.push_record(["Order", "Items", "Total", "Status", "Placed", "Transaction"]);

    for order in orders {
        builder.push_record([
            order.id.clone(),
            order.unit_count().to_string(),
            order.total.to_string(),
            order.status.to_string(),
            order.created_at.strftime("%Y-%m-%d").to_string(),
            order.transaction_hash.to_string(),
        ]);
    }

    write_table(out, builder, Some(1..3))
}

/// Write the cart lines and the amounts to be charged.
///
/// # Errors
///
/// Returns a [`RenderError`] if a line total cannot be calculated or the output cannot be
/// written.
pub fn write_order_summary(
    out: &mut impl io::Write,
    cart: &Cart,
    quote: &OrderQuote,
) -> Result<(), RenderError> {
    let mut builder = Builder::default();

    builder.push_record(["Item", "Quantity", "Price", "Total"]);

    for item in cart.iter() {
        builder.push_record([
            item.product.name.clone(),
            item.quantity.to_string(),
            item.product.price.to_string(),
            item.line_total()?.to_string(),
        ]);
    }

    write_table(out, builder, Some(1..4))?;

    let lines = [
        ("Subtotal:", quote.subtotal.to_string()),
        ("Service fee:", quote.service_fee.to_string()),
        ("Total:", quote.total.to_string()),
    ];

    let value_width = lines
        .iter()
        .map(|(_, value)| value.len())
        .max()
        .unwrap_or_default();

    for (label, value) in lines {
        writeln!(out, "{label:>14}  {value:>value_width$}").map_err(|_err| RenderError::IO)?;
    }

    writeln!(out).map_err(|_err| RenderError::IO)
}

fn stock_label(product: &Product) -> String {
    if product.is_purchasable() {
        product.stock.to_string()
    } else {
        "Out of stock".to_string()
    }
}

fn write_table(
    out: &mut impl io::Write,
    builder: Builder,
    right_aligned: Option<Range<usize>>,
) -> Result<(), RenderError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);

    if let Some(columns) = right_aligned {
        table.modify(Columns::new(columns), Alignment::right());
    }

    writeln!(out, "\n{table}").map_err(|_err| RenderError::IO)
}
