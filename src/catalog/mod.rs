//! Catalog
//!
//! Read-only store of products, users, reviews and past orders loaded from a YAML fixture.

use std::{borrow::Cow, fs, path::Path};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use slotmap::SlotMap;
use thiserror::Error;
use tracing::debug;

use crate::{
    cart::CartItem,
    catalog::fixtures::{CatalogFixture, OrderFixture, parse_price},
    chain::Address,
    orders::Order,
    products::{Product, ProductKey},
    reviews::{self, Review},
    users::User,
};

pub mod browse;
pub mod fixtures;

pub use browse::{BrowseFilter, SortKey, browse};

/// Number of products shown on the home page.
pub const FEATURED_PRODUCTS: usize = 8;

/// Number of related products shown under a product.
pub const RELATED_PRODUCTS: usize = 4;

const DEMO_CATALOG: &str = include_str!("../../fixtures/catalog.yml");

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading the catalog file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency mismatch between catalog entries
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Rating outside its allowed range
    #[error("Invalid rating for {0}: {1}")]
    InvalidRating(String, f64),

    /// Product without any image
    #[error("Product {0} has no images")]
    MissingImages(String),

    /// Two products share an id
    #[error("Duplicate product id: {0}")]
    DuplicateProduct(String),

    /// A review or order references an unknown product
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The fixture lists no products
    #[error("No products in catalog; currency unknown")]
    NoProducts,
}

/// Catalog
#[derive(Debug)]
pub struct Catalog {
    products: SlotMap<ProductKey, Product>,
    product_order: Vec<ProductKey>,
    product_keys: FxHashMap<String, ProductKey>,
    users: Vec<User>,
    reviews: Vec<Review>,
    orders: Vec<Order>,
    currency: &'static Currency,
}

impl Catalog {
    /// Load the bundled demo catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the bundled fixture is invalid.
    pub fn demo() -> Result<Self, CatalogError> {
        Self::from_yaml(DEMO_CATALOG)
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the file cannot be read or is invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;

        debug!(path = %path.display(), "loading catalog");

        Self::from_yaml(&contents)
    }

    /// Parse a catalog from YAML text.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the YAML cannot be parsed, a price or rating is invalid,
    /// prices use more than one currency, a product id repeats, or a review or order references
    /// an unknown product.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let fixture: CatalogFixture = serde_norway::from_str(yaml)?;

        let mut products = SlotMap::with_key();
        let mut product_order = Vec::with_capacity(fixture.products.len());
        let mut product_keys = FxHashMap::default();
        let mut currency: Option<&'static Currency> = None;

        for product_fixture in fixture.products {
            let product = Product::try_from(product_fixture)?;
            let product_currency = product.price.currency();

            match currency {
                Some(existing) if existing != product_currency => {
                    return Err(CatalogError::CurrencyMismatch(
                        existing.iso_alpha_code.to_string(),
                        product_currency.iso_alpha_code.to_string(),
                    ));
                }
                Some(_) => {}
                None => currency = Some(product_currency),
            }

            if product_keys.contains_key(product.id.as_str()) {
                return Err(CatalogError::DuplicateProduct(product.id.to_string()));
            }

            let id = product.id.to_string();
            let key = products.insert(product);

            product_order.push(key);
            product_keys.insert(id, key);
        }

        let currency = currency.ok_or(CatalogError::NoProducts)?;

        let users = fixture
            .users
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let reviews = fixture
            .reviews
            .into_iter()
            .map(Review::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut catalog = Self {
            products,
            product_order,
            product_keys,
            users,
            reviews,
            orders: Vec::new(),
            currency,
        };

        if let Some(review) = catalog
            .reviews
            .iter()
            .find(|review| catalog.product(review.product.as_str()).is_none())
        {
            return Err(CatalogError::ProductNotFound(review.product.to_string()));
        }

        let orders = fixture
            .orders
            .into_iter()
            .map(|order| catalog.order_from_fixture(order))
            .collect::<Result<Vec<_>, _>>()?;

        catalog.orders = orders;

        debug!(
            products = catalog.product_order.len(),
            users = catalog.users.len(),
            reviews = catalog.reviews.len(),
            orders = catalog.orders.len(),
            currency = currency.iso_alpha_code,
            "catalog loaded"
        );

        Ok(catalog)
    }

    fn order_from_fixture(&self, fixture: OrderFixture) -> Result<Order, CatalogError> {
        let total = parse_price(&fixture.total)?;

        if total.currency() != self.currency {
            return Err(CatalogError::CurrencyMismatch(
                self.currency.iso_alpha_code.to_string(),
                total.currency().iso_alpha_code.to_string(),
            ));
        }

        let items = fixture
            .items
            .into_iter()
            .map(|line| {
                self.product(&line.product)
                    .map(|product| CartItem {
                        product: product.clone(),
                        quantity: line.quantity,
                    })
                    .ok_or(CatalogError::ProductNotFound(line.product))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Order {
            id: fixture.id,
            buyer: fixture.buyer,
            items,
            total,
            status: fixture.status,
            transaction_hash: fixture.tx_hash,
            created_at: fixture.created_at,
            updated_at: fixture.updated_at,
        })
    }

    /// Products in catalog order.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.product_order
            .iter()
            .filter_map(|key| self.products.get(*key))
    }

    /// Look up a product by id.
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.product_keys
            .get(id)
            .and_then(|key| self.products.get(*key))
    }

    /// The first `count` products in catalog order.
    pub fn featured(&self, count: usize) -> Vec<&Product> {
        self.products().take(count).collect()
    }

    /// Up to `count` other products in the same category as `product`, in catalog order.
    pub fn related(&self, product: &Product, count: usize) -> Vec<&Product> {
        self.products()
            .filter(|other| other.category == product.category && other.id != product.id)
            .take(count)
            .collect()
    }

    /// Distinct categories in the order they first appear.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();

        for product in self.products() {
            if !categories.contains(&product.category.as_str()) {
                categories.push(&product.category);
            }
        }

        categories
    }

    /// Filter and sort the catalog.
    pub fn browse(&self, filter: &BrowseFilter) -> Vec<&Product> {
        browse(self.products(), filter)
    }

    /// Reviews of a product, in fixture order.
    pub fn reviews_for(&self, product_id: &str) -> Vec<&Review> {
        self.reviews
            .iter()
            .filter(|review| review.product.as_str() == product_id)
            .collect()
    }

    /// Mean review rating for a product, zero when it has no reviews.
    pub fn average_rating(&self, product_id: &str) -> f64 {
        reviews::average_rating(self.reviews_for(product_id))
    }

    /// All users.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Look up a user by address, ignoring hex letter case.
    pub fn user(&self, address: &str) -> Option<&User> {
        self.users.iter().find(|user| user.address.matches(address))
    }

    /// The user at `address`, or a placeholder profile when the address is unknown.
    pub fn profile(&self, address: &Address) -> Cow<'_, User> {
        self.user(address.as_str())
            .map_or_else(|| Cow::Owned(User::placeholder(address)), Cow::Borrowed)
    }

    /// Products listed by `address`. Empty unless the address belongs to a seller.
    pub fn products_by_seller(&self, address: &str) -> Vec<&Product> {
        if !self.user(address).is_some_and(|user| user.is_seller) {
            return Vec::new();
        }

        self.products()
            .filter(|product| product.seller.address.matches(address))
            .collect()
    }

    /// Orders placed by `address`.
    pub fn orders_by_buyer(&self, address: &str) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|order| order.buyer.matches(address))
            .collect()
    }

    /// Orders placed by `address`, only when `viewer` is that same account.
    pub fn purchases_visible_to(
        &self,
        address: &Address,
        viewer: Option<&Address>,
    ) -> Option<Vec<&Order>> {
        viewer
            .is_some_and(|viewer| viewer.matches(address.as_str()))
            .then(|| self.orders_by_buyer(address.as_str()))
    }

        /// Number of products.
    pub fn len(&self) -> usize {
        self.product_order.len()
    }

    /// Check if the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.product_order.is_empty()
    }

    /// Currency every catalog price is expressed in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rusty_money::{Money, iso::USD};
    use tempfile::NamedTempFile;
    use testresult::TestResult;

    use super::*;

    const SMALL: &str = r#"
users:
  - address: "0xAAAA000000000000000000000000000000000001"
    name: Maker
    rating: 4.5
    seller: true
  - address: "0xbbbb000000000000000000000000000000000002"
    name: Buyer
    rating: 3
products:
  - id: p1
    name: Mug
    price: 12.50 USD
    images: [mug.png]
    seller: { address: "0xaaaa000000000000000000000000000000000001", name: Maker, rating: 4.5 }
    category: Kitchen
    tags: [ceramic]
    stock: 4
    created_at: "2024-01-01T00:00:00Z"
  - id: p2
    name: Poster
    price: 30 USD
    images: [poster.png]
    seller: { address: "0xaaaa000000000000000000000000000000000001", name: Maker, rating: 4.5 }
    category: Art
    stock: 0
    created_at: "2024-02-01T00:00:00Z"
  - id: p3
    name: Bowl
    price: 8 USD
    images: [bowl.png]
    seller: { address: "0xaaaa000000000000000000000000000000000001", name: Maker, rating: 4.5 }
    category: Kitchen
    stock: 2
    created_at: "2024-03-01T00:00:00Z"
reviews:
  - id: r1
    product: p1
    reviewer: "0xbbbb000000000000000000000000000000000002"
    rating: 5
    created_at: "2024-01-05T00:00:00Z"
  - id: r2
    product: p1
    reviewer: "0xbbbb000000000000000000000000000000000002"
    rating: 2
    created_at: "2024-01-06T00:00:00Z"
orders:
  - id: o1
    buyer: "0xBBBB000000000000000000000000000000000002"
    items:
      - { product: p1, quantity: 2 }
    total: 27.50 USD
    status: shipped
    tx_hash: "0x01"
    created_at: "2024-01-02T00:00:00Z"
    updated_at: "2024-01-03T00:00:00Z"
"#;

    #[test]
    fn loads_products_in_order() -> TestResult {
        let catalog = Catalog::from_yaml(SMALL)?;

        let ids: Vec<&str> = catalog.products().map(|product| product.id.as_str()).collect();

        assert_eq!(ids, vec!["p1", "p2", "p3"]);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.currency(), USD);
        assert_eq!(
            catalog.product("p1").map(|product| product.price),
            Some(Money::from_minor(1_250, USD))
        );
        assert!(catalog.product("missing").is_none());

        Ok(())
    }

    #[test]
    fn categories_are_distinct_in_first_seen_order() -> TestResult {
        let catalog = Catalog::from_yaml(SMALL)?;

        assert_eq!(catalog.categories(), vec!["Kitchen", "Art"]);

        Ok(())
    }

    #[test]
    fn featured_takes_leading_products() -> TestResult {
        let catalog = Catalog::from_yaml(SMALL)?;

        assert_eq!(catalog.featured(2).len(), 2);
        assert_eq!(catalog.featured(FEATURED_PRODUCTS).len(), 3);

        Ok(())
    }

    #[test]
    fn purchases_are_only_visible_to_their_buyer() -> TestResult {
        let catalog = Catalog::from_yaml(SMALL)?;
        let buyer = Address::new("0xbbbb000000000000000000000000000000000002");
        let shouting_buyer = Address::new("0xBBBB000000000000000000000000000000000002");
        let maker = Address::new("0xaaaa000000000000000000000000000000000001");

        let own = catalog
            .purchases_visible_to(&buyer, Some(&shouting_buyer))
            .ok_or("buyer should see own orders")?;

        assert_eq!(own.len(), 1);
        assert_eq!(catalog.purchases_visible_to(&buyer, Some(&maker)), None);
        assert_eq!(catalog.purchases_visible_to(&buyer, None), None);

        Ok(())
    }

    #[test]
    fn related_excludes_the_product_itself() -> TestResult {
        let catalog = Catalog::from_yaml(SMALL)?;
        let mug = catalog.product("p1").ok_or("missing p1")?;
        let poster = catalog.product("p2").ok_or("missing p2")?;

        let related: Vec<&str> = catalog
            .related(mug, RELATED_PRODUCTS)
            .into_iter()
            .map(|product| product.id.as_str())
            .collect();

        assert_eq!(related, vec!["p3"]);
        assert!(catalog.related(poster, RELATED_PRODUCTS).is_empty());

        Ok(())
    }

    #[test]
    fn related_is_capped_in_catalog_order() -> TestResult {
        let products: String = (1..=6)
            .map(|n| {
                format!(
                    "  - {{ id: k{n}, name: Item {n}, price: 1 USD, images: [k.png], \
                     seller: {{ address: \"0x1\", name: Maker, rating: 4 }}, \
                     category: Kitchen, stock: 1, created_at: \"2024-01-0{n}T00:00:00Z\" }}\n"
                )
            })
            .collect();
        let catalog = Catalog::from_yaml(&format!("products:\n{products}"))?;
        let third = catalog.product("k3").ok_or("missing k3")?;

        let related: Vec<&str> = catalog
            .related(third, RELATED_PRODUCTS)
            .into_iter()
            .map(|product| product.id.as_str())
            .collect();

        assert_eq!(related, vec!["k1", "k2", "k4", "k5"]);

        Ok(())
    }

    #[test]
    fn average_rating_over_reviews() -> TestResult {
        let catalog = Catalog::from_yaml(SMALL)?;

        assert!((catalog.average_rating("p1") - 3.5).abs() < f64::EPSILON);
        assert!(catalog.average_rating("p3").abs() < f64::EPSILON);
        assert_eq!(catalog.reviews_for("p1").len(), 2);

        Ok(())
    }

    #[test]
    fn seller_products_and_buyer_orders_ignore_case() -> TestResult {
        let catalog = Catalog::from_yaml(SMALL)?;

        let listed = catalog.products_by_seller("0xaaaa000000000000000000000000000000000001");
        assert_eq!(listed.len(), 3);

        let buyer = "0xbbbb000000000000000000000000000000000002";
        assert!(catalog.products_by_seller(buyer).is_empty());

        let orders = catalog.orders_by_buyer(buyer);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders.first().map(|order| order.unit_count()), Some(2));

        Ok(())
    }

    #[test]
    fn profile_falls_back_to_placeholder() -> TestResult {
        let catalog = Catalog::from_yaml(SMALL)?;

        let known = catalog.profile(&Address::new("0xaaaa000000000000000000000000000000000001"));
        assert_eq!(known.name, "Maker");

        let unknown = catalog.profile(&Address::new("0x9999000000000000000000000000000000000000"));
        assert_eq!(unknown.name, "User 0x9999");

        Ok(())
    }

    #[test]
    fn rejects_mixed_currencies() {
        let yaml = SMALL.replacen("8 USD", "8 GBP", 1);

        let result = Catalog::from_yaml(&yaml);

        assert!(matches!(
            result,
            Err(CatalogError::CurrencyMismatch(expected, found)) if expected == "USD" && found == "GBP"
        ));
    }

    #[test]
    fn rejects_duplicate_product_ids() {
        let yaml = SMALL.replacen("id: p3", "id: p1", 1);

        assert!(matches!(
            Catalog::from_yaml(&yaml),
            Err(CatalogError::DuplicateProduct(id)) if id == "p1"
        ));
    }

    #[test]
    fn rejects_reviews_of_unknown_products() {
        let yaml = SMALL.replacen("product: p1", "product: p9", 1);

        assert!(matches!(
            Catalog::from_yaml(&yaml),
            Err(CatalogError::ProductNotFound(id)) if id == "p9"
        ));
    }

    #[test]
    fn rejects_out_of_range_seller_rating() {
        let yaml = SMALL.replacen("name: Maker, rating: 4.5", "name: Maker, rating: 7", 1);

        assert!(matches!(
            Catalog::from_yaml(&yaml),
            Err(CatalogError::InvalidRating(id, _)) if id == "p1"
        ));
    }

    #[test]
    fn rejects_empty_product_list() {
        assert!(matches!(
            Catalog::from_yaml("products: []"),
            Err(CatalogError::NoProducts)
        ));
    }

    #[test]
    fn loads_from_path() -> TestResult {
        let mut file = NamedTempFile::new()?;
        file.write_all(SMALL.as_bytes())?;

        let catalog = Catalog::from_path(file.path())?;

        assert_eq!(catalog.len(), 3);

        Ok(())
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = Catalog::from_path("/definitely/not/here/catalog.yml");

        assert!(matches!(result, Err(CatalogError::Io(_))));
    }

    #[test]
    fn demo_catalog_loads() -> TestResult {
        let catalog = Catalog::demo()?;

        assert_eq!(catalog.len(), 12);
        assert_eq!(catalog.featured(FEATURED_PRODUCTS).len(), 8);

        Ok(())
    }
}
