//! Catalog Fixtures
//!
//! YAML shapes for the catalog file and their conversion into domain types.

use jiff::Timestamp;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{Money, iso};
use serde::Deserialize;

use crate::{
    catalog::CatalogError,
    chain::{Address, TransactionHash},
    orders::OrderStatus,
    pricing::Price,
    products::{Product, ProductId, Seller},
    reviews::Review,
    tags::TagSet,
    users::User,
};

/// Whole catalog file
#[derive(Debug, Deserialize)]
pub struct CatalogFixture {
    /// Marketplace users
    #[serde(default)]
    pub users: Vec<UserFixture>,

    /// Products, in display order
    pub products: Vec<ProductFixture>,

    /// Product reviews
    #[serde(default)]
    pub reviews: Vec<ReviewFixture>,

    /// Past orders
    #[serde(default)]
    pub orders: Vec<OrderFixture>,
}

/// User Fixture
#[derive(Debug, Deserialize)]
pub struct UserFixture {
    /// Wallet address
    pub address: Address,

    /// Display name
    pub name: String,

    /// Profile text
    #[serde(default)]
    pub bio: String,

    /// Avatar reference
    #[serde(default)]
    pub avatar: String,

    /// Rating in `[0, 5]`
    pub rating: f64,

    /// Whether the user lists products
    #[serde(default)]
    pub seller: bool,
}

impl TryFrom<UserFixture> for User {
    type Error = CatalogError;

    fn try_from(fixture: UserFixture) -> Result<Self, Self::Error> {
        check_rating(fixture.address.as_str(), fixture.rating)?;

        Ok(User {
            address: fixture.address,
            name: fixture.name,
            bio: fixture.bio,
            avatar: fixture.avatar,
            rating: fixture.rating,
            is_seller: fixture.seller,
        })
    }
}

/// Seller summary embedded in a product
#[derive(Debug, Deserialize)]
pub struct SellerFixture {
    /// Seller wallet address
    pub address: Address,

    /// Seller display name
    pub name: String,

    /// Seller rating
    pub rating: f64,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product id (e.g., "prod-001")
    pub id: String,

    /// Product name
    pub name: String,

    /// Product description
    #[serde(default)]
    pub description: String,

    /// Product price (e.g., "120.05 USD")
    pub price: String,

    /// Image references
    #[serde(default)]
    pub images: Vec<String>,

    /// Seller summary
    pub seller: SellerFixture,

    /// Product category
    pub category: String,

    /// Product tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Units in stock
    pub stock: u32,

    /// Listing timestamp (RFC 3339)
    pub created_at: Timestamp,
}

impl TryFrom<ProductFixture> for Product {
    type Error = CatalogError;

    fn try_from(fixture: ProductFixture) -> Result<Self, Self::Error> {
        let price = parse_price(&fixture.price)?;

        if fixture.images.is_empty() {
            return Err(CatalogError::MissingImages(fixture.id));
        }

        check_rating(&fixture.id, fixture.seller.rating)?;

        Ok(Product {
            id: ProductId::new(fixture.id),
            name: fixture.name,
            description: fixture.description,
            price,
            images: fixture.images,
            seller: Seller {
                address: fixture.seller.address,
                name: fixture.seller.name,
                rating: fixture.seller.rating,
            },
            category: fixture.category,
            tags: fixture.tags.into_iter().collect::<TagSet>(),
            stock: fixture.stock,
            created_at: fixture.created_at,
        })
    }
}

/// Review Fixture
#[derive(Debug, Deserialize)]
pub struct ReviewFixture {
    /// Review id
    pub id: String,

    /// Reviewed product id
    pub product: String,

    /// Reviewer address
    pub reviewer: Address,

    /// Star rating, `1..=5`
    pub rating: u8,

    /// Review text
    #[serde(default)]
    pub comment: String,

    /// When the review was written
    pub created_at: Timestamp,
}

impl TryFrom<ReviewFixture> for Review {
    type Error = CatalogError;

    fn try_from(fixture: ReviewFixture) -> Result<Self, Self::Error> {
        if !(1..=5).contains(&fixture.rating) {
            return Err(CatalogError::InvalidRating(
                fixture.id,
                f64::from(fixture.rating),
            ));
        }

        Ok(Review {
            id: fixture.id,
            product: ProductId::new(fixture.product),
            reviewer: fixture.reviewer,
            rating: fixture.rating,
            comment: fixture.comment,
            created_at: fixture.created_at,
        })
    }
}

/// Order line in a fixture, referencing a product by id
#[derive(Debug, Deserialize)]
pub struct OrderLineFixture {
    /// Product id
    pub product: String,

    /// Units bought
    pub quantity: u32,
}

/// Order Fixture
///
/// Lines reference products, so conversion happens in the catalog once products are loaded.
#[derive(Debug, Deserialize)]
pub struct OrderFixture {
    /// Order id
    pub id: String,

    /// Buyer address
    pub buyer: Address,

    /// Purchased lines
    pub items: Vec<OrderLineFixture>,

    /// Amount paid (e.g., "195.97 USD")
    pub total: String,

    /// Fulfilment status
    pub status: OrderStatus,

    /// Order placement transaction
    pub tx_hash: TransactionHash,

    /// When the order was placed
    pub created_at: Timestamp,

    /// Last status change
    pub updated_at: Timestamp,
}

/// Parse a price string (e.g., "120.05 USD") into money in that currency.
///
/// The amount may carry at most as many fractional digits as the currency has minor units.
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY", if the amount is
/// negative or too precise for the currency, or if the currency code is not recognized.
pub fn parse_price(s: &str) -> Result<Price, CatalogError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CatalogError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let currency =
        iso::find(code).ok_or_else(|| CatalogError::UnknownCurrency(code.to_string()))?;

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| CatalogError::InvalidPrice(s.to_string()))?
        .normalize();

    if amount.is_sign_negative() || amount.scale() > currency.exponent {
        return Err(CatalogError::InvalidPrice(s.to_string()));
    }

    let minor_units = amount
        .checked_mul(Decimal::from(10_i64.pow(currency.exponent)))
        .and_then(|value| value.to_i64())
        .ok_or_else(|| CatalogError::InvalidPrice(s.to_string()))?;

    Ok(Money::from_minor(minor_units, currency))
}

fn check_rating(owner: &str, rating: f64) -> Result<(), CatalogError> {
    if (0.0..=5.0).contains(&rating) {
        Ok(())
    } else {
        Err(CatalogError::InvalidRating(owner.to_string(), rating))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, JPY, USD};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_price_uses_currency_exponent() -> TestResult {
        assert_eq!(parse_price("120.05 USD")?, Money::from_minor(12_005, USD));
        assert_eq!(parse_price("240 USD")?, Money::from_minor(24_000, USD));
        assert_eq!(parse_price("1500 JPY")?, Money::from_minor(1_500, JPY));
        assert_eq!(parse_price("2.50 GBP")?, Money::from_minor(250, GBP));

        Ok(())
    }

    #[test]
    fn parse_price_rejects_invalid_format() {
        assert!(matches!(
            parse_price("120.05USD"),
            Err(CatalogError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price("1 USD extra"),
            Err(CatalogError::InvalidPrice(_))
        ));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("2.99 ABC");

        assert!(matches!(result, Err(CatalogError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn parse_price_rejects_negative_and_sub_minor_amounts() {
        assert!(matches!(
            parse_price("-1.00 USD"),
            Err(CatalogError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price("1.005 USD"),
            Err(CatalogError::InvalidPrice(_))
        ));
    }

    #[test]
    fn product_fixture_requires_an_image() -> TestResult {
        let fixture: ProductFixture = serde_norway::from_str(
            r#"
id: prod-x
name: Bare
price: 1 USD
seller: { address: "0x1", name: S, rating: 4 }
category: Misc
stock: 1
created_at: "2024-01-01T00:00:00Z"
"#,
        )?;

        let result = Product::try_from(fixture);

        assert!(matches!(result, Err(CatalogError::MissingImages(id)) if id == "prod-x"));

        Ok(())
    }

    #[test]
    fn review_fixture_rating_must_be_one_to_five() -> TestResult {
        let fixture: ReviewFixture = serde_norway::from_str(
            r#"
id: rev-x
product: prod-001
reviewer: "0x1"
rating: 0
created_at: "2024-01-01T00:00:00Z"
"#,
        )?;

        assert!(matches!(
            Review::try_from(fixture),
            Err(CatalogError::InvalidRating(id, _)) if id == "rev-x"
        ));

        Ok(())
    }
}
