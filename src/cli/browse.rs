use std::io::{self, Write};

use bazaar::{
    catalog::{BrowseFilter, Catalog, FEATURED_PRODUCTS, RELATED_PRODUCTS, SortKey},
    render,
};
use clap::Args;
use rust_decimal::Decimal;

use super::CliError;

#[derive(Debug, Args)]
pub(crate) struct ProductsArgs {
    /// Text to look for in names, descriptions, categories and tags
    #[arg(long, short)]
    query: Option<String>,

    /// Exact category
    #[arg(long)]
    category: Option<String>,

    /// Lowest price to include
    #[arg(long)]
    min_price: Option<Decimal>,

    /// Highest price to include
    #[arg(long)]
    max_price: Option<Decimal>,

    /// Result ordering
    #[arg(long, value_enum, default_value_t = SortKey::Newest)]
    sort: SortKey,
}

impl ProductsArgs {
    fn into_filter(self) -> BrowseFilter {
        BrowseFilter {
            query: self.query.unwrap_or_default(),
            category: self.category,
            min_price: self.min_price,
            max_price: self.max_price,
            sort: self.sort,
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct ProductArgs {
    /// Product id, e.g. prod-001
    id: String,
}

pub(crate) fn home(catalog: &Catalog) -> Result<(), CliError> {
    let mut out = io::stdout().lock();

    writeln!(out, "Featured products").map_err(|_err| CliError::Output)?;
    render::write_products(&mut out, &catalog.featured(FEATURED_PRODUCTS))?;

    writeln!(out, "Categories: {}", catalog.categories().join(", "))
        .map_err(|_err| CliError::Output)
}

pub(crate) fn products(catalog: &Catalog, args: ProductsArgs) -> Result<(), CliError> {
    let filter = args.into_filter();
    let products = catalog.browse(&filter);

    let mut out = io::stdout().lock();

    render::write_products(&mut out, &products)?;

    writeln!(out, "{} products, sorted by {}", products.len(), filter.sort)
        .map_err(|_err| CliError::Output)
}

pub(crate) fn product(catalog: &Catalog, args: &ProductArgs) -> Result<(), CliError> {
    let mut out = io::stdout().lock();

    let Some(product) = catalog.product(&args.id) else {
        return writeln!(
            out,
            "Product not found\nThe product you're looking for doesn't exist."
        )
        .map_err(|_err| CliError::Output);
    };

    let reviews = catalog.reviews_for(product.id.as_str());

    render::write_product_detail(
        &mut out,
        product,
        &reviews,
        catalog.average_rating(product.id.as_str()),
    )?;

    let related = catalog.related(product, RELATED_PRODUCTS);

    if related.is_empty() {
        return Ok(());
    }

    writeln!(out, "Related products").map_err(|_err| CliError::Output)?;
    render::write_products(&mut out, &related)?;

    Ok(())
}
