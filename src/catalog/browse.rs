//! Browse
//!
//! Filtering and sorting of the product list. Recomputed from scratch for every query.

use std::{cmp::Ordering, fmt, str::FromStr};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{pricing, products::Product};

/// Product list ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    /// Most recently listed first.
    #[default]
    Newest,

    /// Cheapest first.
    PriceLowHigh,

    /// Most expensive first.
    PriceHighLow,

    /// Highest rated seller first.
    Popularity,
}

impl SortKey {
    /// The key as written on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceLowHigh => "price-low-high",
            Self::PriceHighLow => "price-high-low",
            Self::Popularity => "popularity",
        }
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Newest => b.created_at.cmp(&a.created_at),
            Self::PriceLowHigh => pricing::amount(&a.price).cmp(&pricing::amount(&b.price)),
            Self::PriceHighLow => pricing::amount(&b.price).cmp(&pricing::amount(&a.price)),
            Self::Popularity => b.seller.rating.total_cmp(&a.seller.rating),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised sort key.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown sort key: {0}")]
pub struct UnknownSortKey(String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "price-low-high" => Ok(Self::PriceLowHigh),
            "price-high-low" => Ok(Self::PriceHighLow),
            "popularity" => Ok(Self::Popularity),
            other => Err(UnknownSortKey(other.to_string())),
        }
    }
}

/// Browse criteria. Every unset or empty field lets all products through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseFilter {
    /// Free-text search
    pub query: String,

    /// Exact category
    pub category: Option<String>,

    /// Inclusive lower price bound
    pub min_price: Option<Decimal>,

    /// Inclusive upper price bound
    pub max_price: Option<Decimal>,

    /// Result ordering
    pub sort: SortKey,
}

impl BrowseFilter {
    /// Search for `query` in name, description, category and tags.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Only products in `category`.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Only products priced at least `min`.
    #[must_use]
    pub fn with_min_price(mut self, min: Decimal) -> Self {
        self.min_price = Some(min);
        self
    }

    /// Only products priced at most `max`.
    #[must_use]
    pub fn with_max_price(mut self, max: Decimal) -> Self {
        self.max_price = Some(max);
        self
    }

    /// Order results by `sort`.
    #[must_use]
    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    /// Whether `product` passes every filter.
    pub fn matches(&self, product: &Product) -> bool {
        let query = self.query.to_lowercase();

        self.matches_with(product, &query)
    }

    fn matches_with(&self, product: &Product, query: &str) -> bool {
        let price = pricing::amount(&product.price);

        (query.is_empty() || product.matches_lowercase(query))
            && self
                .category
                .as_deref()
                .is_none_or(|category| category.is_empty() || product.category == category)
            && self.min_price.is_none_or(|min| price >= min)
            && self.max_price.is_none_or(|max| price <= max)
    }
}

/// Filter then sort `products`. Ties keep their input order.
pub fn browse<'a, I>(products: I, filter: &BrowseFilter) -> Vec<&'a Product>
where
    I: IntoIterator<Item = &'a Product>,
{
    let query = filter.query.to_lowercase();

    let mut matched: Vec<&Product> = products
        .into_iter()
        .filter(|product| filter.matches_with(product, &query))
        .collect();

    matched.sort_by(|a, b| filter.sort.compare(a, b));

    matched
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use crate::{chain::Address, products::Seller, tags::TagSet};

    use super::*;

    fn product(id: &str, minor: i64, listed: i64, rating: f64) -> TestResult<Product> {
        Ok(Product::new(id, id, Money::from_minor(minor, USD))
            .with_created_at(Timestamp::from_second(listed)?)
            .with_seller(Seller {
                address: Address::new("0x1"),
                name: "seller".to_string(),
                rating,
            }))
    }

    fn ids(products: &[&Product]) -> Vec<String> {
        products.iter().map(|product| product.id.to_string()).collect()
    }

    #[test]
    fn min_price_is_inclusive_and_sorts_low_to_high() -> TestResult {
        let products = [
            product("flex", 12_005, 3, 4.8)?,
            product("print", 24_000, 2, 4.9)?,
            product("skirt", 9_899, 1, 4.7)?,
        ];

        let filter = BrowseFilter::default()
            .with_min_price(Decimal::new(100, 0))
            .with_sort(SortKey::PriceLowHigh);

        assert_eq!(ids(&browse(&products, &filter)), vec!["flex", "print"]);

        let filter = BrowseFilter::default()
            .with_min_price(Decimal::new(9_899, 2))
            .with_max_price(Decimal::new(12_005, 2));

        assert_eq!(ids(&browse(&products, &filter)), vec!["flex", "skirt"]);

        Ok(())
    }

    #[test]
    fn sort_orders() -> TestResult {
        let products = [
            product("a", 300, 1, 4.5)?,
            product("b", 100, 3, 4.9)?,
            product("c", 200, 2, 4.7)?,
        ];

        let sorted = |sort| ids(&browse(&products, &BrowseFilter::default().with_sort(sort)));

        assert_eq!(sorted(SortKey::Newest), vec!["b", "c", "a"]);
        assert_eq!(sorted(SortKey::PriceLowHigh), vec!["b", "c", "a"]);
        assert_eq!(sorted(SortKey::PriceHighLow), vec!["a", "c", "b"]);
        assert_eq!(sorted(SortKey::Popularity), vec!["b", "c", "a"]);

        Ok(())
    }

    #[test]
    fn sort_is_stable_for_ties() -> TestResult {
        let products = [
            product("first", 100, 1, 4.0)?,
            product("second", 100, 1, 4.0)?,
        ];

        for sort in [
            SortKey::Newest,
            SortKey::PriceLowHigh,
            SortKey::PriceHighLow,
            SortKey::Popularity,
        ] {
            let filter = BrowseFilter::default().with_sort(sort);

            assert_eq!(ids(&browse(&products, &filter)), vec!["first", "second"]);
        }

        Ok(())
    }

    #[test]
    fn query_matches_tags_case_insensitively() -> TestResult {
        let products = [
            product("tagged", 100, 1, 4.0)?.with_tags(TagSet::from_strs(&["Wallet"])),
            product("hardware", 100, 2, 4.0)?.with_tags(TagSet::from_strs(&["hardware"])),
        ];

        let filter = BrowseFilter::default().with_query("WALLET");

        assert_eq!(ids(&browse(&products, &filter)), vec!["tagged"]);

        Ok(())
    }

    #[test]
    fn whitespace_query_is_a_substring_filter() -> TestResult {
        let products = [
            product("two words", 100, 1, 4.0)?,
            product("single", 100, 2, 4.0)?,
        ];

        let filter = BrowseFilter::default().with_query(" ");

        assert_eq!(ids(&browse(&products, &filter)), vec!["two words"]);
        let [_, single] = &products;

        assert!(!filter.matches(single));

        Ok(())
    }

    #[test]
    fn category_is_exact() -> TestResult {
        let products = [
            product("a", 100, 1, 4.0)?.with_category("Digital Art"),
            product("b", 100, 2, 4.0)?.with_category("Art"),
        ];

        let filter = BrowseFilter::default().with_category("Art");

        assert_eq!(ids(&browse(&products, &filter)), vec!["b"]);

        Ok(())
    }

    #[test]
    fn empty_filter_passes_everything() -> TestResult {
        let products = [product("a", 100, 1, 4.0)?, product("b", 100, 2, 4.0)?];

        let filter = BrowseFilter::default().with_category("");

        assert_eq!(browse(&products, &filter).len(), 2);
        assert!(products.iter().all(|product| filter.matches(product)));

        Ok(())
    }

    #[test]
    fn sort_key_parses_cli_names() -> TestResult {
        assert_eq!("price-high-low".parse::<SortKey>()?, SortKey::PriceHighLow);
        assert_eq!(SortKey::Popularity.to_string(), "popularity");
        assert!("cheapest".parse::<SortKey>().is_err());

        Ok(())
    }
}
