use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;
use super::page::PageRequest;
use super::validation::{is_http_url, is_sku, Validator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    Books,
    Clothing,
    Food,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Electronics,
        Category::Books,
        Category::Clothing,
        Category::Food,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Books => "Books",
            Category::Clothing => "Clothing",
            Category::Food => "Food",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| DomainError::Internal(format!("unknown category '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductStatus {
    Inactive,
    InStock,
    OutOfStock,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub category: Category,
    pub sku: String,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn status(&self) -> ProductStatus {
        if !self.is_active {
            ProductStatus::Inactive
        } else if self.stock_quantity > 0 {
            ProductStatus::InStock
        } else {
            ProductStatus::OutOfStock
        }
    }

    /// Inactive products are never available, whatever their stock.
    pub fn is_available(&self, quantity: i32) -> bool {
        self.is_active && self.stock_quantity >= quantity
    }

    /// A product with nothing left in stock is taken off sale.
    pub fn enforce_stock_rule(&mut self) {
        if self.stock_quantity == 0 {
            self.is_active = false;
        }
    }

    /// Applies a validated patch, bumping the version.
    ///
    /// When the patch carries an expected version that no longer matches, the
    /// product is left untouched and a conflict is returned.
    pub fn apply(&mut self, patch: ProductPatch, now: DateTime<Utc>) -> Result<(), DomainError> {
        if let Some(expected) = patch.expected_version {
            if expected != self.version {
                return Err(DomainError::Conflict(format!(
                    "Product {} was modified concurrently (expected version {}, found {})",
                    self.id, expected, self.version
                )));
            }
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(sku) = patch.sku {
            self.sku = sku;
        }
        if let Some(stock) = patch.stock_quantity {
            self.stock_quantity = stock;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = Some(image_url);
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
        self.enforce_stock_rule();
        self.version += 1;
        self.updated_at = now;
        Ok(())
    }

    /// Takes `quantity` units out of stock.
    pub fn reserve(&mut self, quantity: i32, now: DateTime<Utc>) -> Result<(), DomainError> {
        if quantity < 1 {
            return Err(DomainError::invalid_field(
                "quantity",
                "Quantity must be a positive integer",
            ));
        }
        if !self.is_available(quantity) {
            return Err(DomainError::Conflict(format!(
                "Insufficient stock for product {}: requested {}, available {}",
                self.id, quantity, self.stock_quantity
            )));
        }
        self.stock_quantity -= quantity;
        self.enforce_stock_rule();
        self.version += 1;
        self.updated_at = now;
        Ok(())
    }
}

/// Raw product fields as received from a caller, before validation.
#[derive(Debug, Clone, Default)]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub stock_quantity: Option<i64>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
    pub version: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub category: Category,
    pub sku: String,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
}

impl NewProduct {
    pub fn into_product(self, id: Uuid, now: DateTime<Utc>) -> Product {
        let mut product = Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            sku: self.sku,
            stock_quantity: self.stock_quantity,
            image_url: self.image_url,
            is_active: self.is_active,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        product.enforce_stock_rule();
        product
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub category: Option<Category>,
    pub sku: Option<String>,
    pub stock_quantity: Option<i32>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
    pub expected_version: Option<i32>,
}

impl ProductInput {
    /// Validates a full product for creation; every required field must be present.
    pub fn into_new(self) -> Result<NewProduct, DomainError> {
        let mut v = Validator::new();

        let name = required(&mut v, self.name, "name", "Product name is required");
        let description = required(
            &mut v,
            self.description,
            "description",
            "Product description is required",
        );
        let sku = required(&mut v, self.sku, "sku", "SKU is required");
        let category = match self.category {
            Some(c) => check_category(&mut v, &c),
            None => {
                v.push("category", "Category is required");
                None
            }
        };
        let price = match self.price {
            Some(p) => Some(p),
            None => {
                v.push("price", "Price is required");
                None
            }
        };
        let stock = match self.stock_quantity {
            Some(s) => check_stock(&mut v, s),
            None => {
                v.push("stockQuantity", "Stock quantity is required");
                None
            }
        };

        check_common(
            &mut v,
            name.as_deref(),
            description.as_deref(),
            price.as_ref(),
            sku.as_deref(),
            self.image_url.as_deref(),
        );
        v.finish()?;

        match (name, description, price, category, sku, stock) {
            (Some(name), Some(description), Some(price), Some(category), Some(sku), Some(stock)) => {
                Ok(NewProduct {
                    name,
                    description,
                    price,
                    category,
                    sku,
                    stock_quantity: stock,
                    image_url: self.image_url.map(|u| u.trim().to_string()),
                    is_active: self.is_active.unwrap_or(true),
                })
            }
            _ => Err(DomainError::Internal(
                "product validation passed with missing fields".to_string(),
            )),
        }
    }

    /// Validates a partial update; only supplied fields are checked.
    pub fn into_patch(self) -> Result<ProductPatch, DomainError> {
        let mut v = Validator::new();
        let name = self.name.map(|n| n.trim().to_string());
        let description = self.description.map(|d| d.trim().to_string());
        let sku = self.sku.map(|s| s.trim().to_string());
        // a supplied field may not be blanked out
        for (value, field, message) in [
            (&name, "name", "Product name is required"),
            (&description, "description", "Product description is required"),
            (&sku, "sku", "SKU is required"),
        ] {
            if value.as_deref() == Some("") {
                v.push(field, message);
            }
        }
        let category = self
            .category
            .as_deref()
            .and_then(|c| check_category(&mut v, c));
        let stock = self.stock_quantity.and_then(|s| check_stock(&mut v, s));

        check_common(
            &mut v,
            name.as_deref(),
            description.as_deref(),
            self.price.as_ref(),
            sku.as_deref(),
            self.image_url.as_deref(),
        );
        v.finish()?;

        Ok(ProductPatch {
            name,
            description,
            price: self.price,
            category,
            sku,
            stock_quantity: stock,
            image_url: self.image_url.map(|u| u.trim().to_string()),
            is_active: self.is_active,
            expected_version: self.version,
        })
    }
}

fn required(v: &mut Validator, value: Option<String>, field: &str, message: &str) -> Option<String> {
    match value.map(|s| s.trim().to_string()) {
        Some(s) if !s.is_empty() => Some(s),
        _ => {
            v.push(field, message);
            None
        }
    }
}

fn check_category(v: &mut Validator, raw: &str) -> Option<Category> {
    match raw.parse::<Category>() {
        Ok(c) => Some(c),
        Err(_) => {
            v.push("category", "Invalid category");
            None
        }
    }
}

fn check_stock(v: &mut Validator, raw: i64) -> Option<i32> {
    match i32::try_from(raw) {
        Ok(s) if s >= 0 => Some(s),
        _ => {
            v.push("stockQuantity", "Stock quantity must be a positive integer");
            None
        }
    }
}

const MAX_SKU_LENGTH: usize = 64;

fn check_common(
    v: &mut Validator,
    name: Option<&str>,
    description: Option<&str>,
    price: Option<&BigDecimal>,
    sku: Option<&str>,
    image_url: Option<&str>,
) {
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        v.text_length(
            name,
            "name",
            2,
            100,
            "Product name must be between 2 and 100 characters",
        );
    }
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        v.text_length(
            description,
            "description",
            10,
            1000,
            "Description must be between 10 and 1000 characters",
        );
    }
    if let Some(price) = price {
        v.amount(price, "price", "Price must be a positive number");
    }
    if let Some(sku) = sku.filter(|s| !s.is_empty()) {
        v.check(
            is_sku(sku),
            "sku",
            "SKU must contain only letters, numbers, and hyphens",
        )
        .max_length(sku, "sku", MAX_SKU_LENGTH, "SKU must be at most 64 characters");
    }
    if let Some(url) = image_url.map(str::trim).filter(|u| !u.is_empty()) {
        v.check(is_http_url(url), "imageUrl", "Image URL must be a valid URL");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSortField {
    #[default]
    CreatedAt,
    Price,
    Name,
    StockQuantity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query-string shape accepted by the product listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQueryParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub include_inactive: Option<bool>,
}

/// Typed product listing filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    pub page: PageRequest,
    pub category: Option<Category>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub sort_by: ProductSortField,
    pub order: SortOrder,
    pub include_inactive: bool,
}

impl ProductQuery {
    pub fn parse(params: ProductQueryParams) -> Result<Self, DomainError> {
        let mut v = Validator::new();
        let page = PageRequest::checked(params.page, params.limit, &mut v);

        let category = params
            .category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .and_then(|c| check_category(&mut v, c));

        if let Some(min) = &params.min_price {
            v.non_negative(min, "minPrice", "Minimum price must be a positive number");
        }
        if let Some(max) = &params.max_price {
            v.non_negative(max, "maxPrice", "Maximum price must be a positive number");
            if let Some(min) = &params.min_price {
                v.check(
                    max > min,
                    "maxPrice",
                    "Maximum price must be greater than minimum price",
                );
            }
        }

        let sort_by = match params.sort_by.as_deref() {
            None | Some("createdAt") => ProductSortField::CreatedAt,
            Some("price") => ProductSortField::Price,
            Some("name") => ProductSortField::Name,
            Some("stockQuantity") => ProductSortField::StockQuantity,
            Some(_) => {
                v.push(
                    "sortBy",
                    "Sort field must be one of createdAt, price, name, stockQuantity",
                );
                ProductSortField::CreatedAt
            }
        };
        let order = match params.order.as_deref() {
            None | Some("desc") => SortOrder::Desc,
            Some("asc") => SortOrder::Asc,
            Some(_) => {
                v.push("order", "Order must be asc or desc");
                SortOrder::Desc
            }
        };

        v.finish()?;
        Ok(Self {
            page,
            category,
            min_price: params.min_price,
            max_price: params.max_price,
            sort_by,
            order,
            include_inactive: params.include_inactive.unwrap_or(false),
        })
    }

    /// In-process equivalent of the storage filter.
    pub fn matches(&self, product: &Product) -> bool {
        (self.include_inactive || product.is_active)
            && self.category.map_or(true, |c| product.category == c)
            && self.min_price.as_ref().map_or(true, |min| product.price >= *min)
            && self.max_price.as_ref().map_or(true, |max| product.price <= *max)
    }
}

/// Case-insensitive substring match over name, description and category.
pub fn matches_search(product: &Product, term: &str) -> bool {
    let needle = term.to_lowercase();
    product.is_active
        && (product.name.to_lowercase().contains(&needle)
            || product.description.to_lowercase().contains(&needle)
            || product.category.as_str().to_lowercase().contains(&needle))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub available: bool,
    pub stock_quantity: i32,
    pub requested_quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub category: String,
    pub total_products: i64,
    pub avg_price: Option<BigDecimal>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub total_stock: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(stock: i32) -> Product {
        ProductInput {
            name: Some("Wireless Mouse".into()),
            description: Some("Ergonomic two-button mouse".into()),
            price: Some(BigDecimal::from(25)),
            category: Some("Electronics".into()),
            sku: Some("ELEC-MOUSE-1".into()),
            stock_quantity: Some(stock as i64),
            ..Default::default()
        }
        .into_new()
        .unwrap()
        .into_product(Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn status_is_derived_from_activity_and_stock() {
        let mut p = sample(3);
        assert_eq!(p.status(), ProductStatus::InStock);
        p.stock_quantity = 0;
        assert_eq!(p.status(), ProductStatus::OutOfStock);
        p.is_active = false;
        assert_eq!(p.status(), ProductStatus::Inactive);
    }

    #[test]
    fn creating_with_zero_stock_deactivates() {
        let p = sample(0);
        assert!(!p.is_active);
        assert_eq!(p.status(), ProductStatus::Inactive);
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let err = ProductInput::default().into_new().unwrap_err();
        let DomainError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        for f in ["name", "description", "sku", "category", "price", "stockQuantity"] {
            assert!(fields.contains(&f), "missing {f} in {fields:?}");
        }
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = ProductInput {
            name: Some("X".into()),
            description: Some("short".into()),
            price: Some(BigDecimal::from(-1)),
            category: Some("Toys".into()),
            sku: Some("BAD SKU".into()),
            stock_quantity: Some(-4),
            image_url: Some("ftp://nope".into()),
            ..Default::default()
        }
        .into_new()
        .unwrap_err();
        let DomainError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 7);
    }

    #[test]
    fn patch_rejects_blanked_required_fields() {
        let err = ProductInput {
            name: Some("   ".into()),
            description: Some(String::new()),
            sku: Some(" ".into()),
            ..Default::default()
        }
        .into_patch()
        .unwrap_err();
        let DomainError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "description", "sku"]);
        assert_eq!(errors[0].message, "Product name is required");
    }

    #[test]
    fn price_and_sku_must_fit_storage() {
        let err = ProductInput {
            price: Some("9.999".parse().unwrap()),
            sku: Some("A".repeat(65)),
            ..Default::default()
        }
        .into_patch()
        .unwrap_err();
        let DomainError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["price", "sku"]);
    }

    #[test]
    fn patch_bumps_version_and_applies_stock_rule() {
        let mut p = sample(5);
        let patch = ProductInput {
            stock_quantity: Some(0),
            version: Some(0),
            ..Default::default()
        }
        .into_patch()
        .unwrap();
        p.apply(patch, Utc::now()).unwrap();
        assert_eq!(p.version, 1);
        assert!(!p.is_active);
    }

    #[test]
    fn stale_version_is_a_conflict() {
        let mut p = sample(5);
        let before = p.clone();
        let patch = ProductPatch {
            name: Some("Renamed".into()),
            expected_version: Some(7),
            ..Default::default()
        };
        assert!(matches!(p.apply(patch, Utc::now()), Err(DomainError::Conflict(_))));
        assert_eq!(p, before);
    }

    #[test]
    fn reserve_decrements_and_refuses_oversell() {
        let mut p = sample(2);
        p.reserve(2, Utc::now()).unwrap();
        assert_eq!(p.stock_quantity, 0);
        assert!(!p.is_active);
        assert!(matches!(p.reserve(1, Utc::now()), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn availability_requires_active_product() {
        let mut p = sample(10);
        assert!(p.is_available(10));
        assert!(!p.is_available(11));
        p.is_active = false;
        assert!(!p.is_available(1));
    }

    #[test]
    fn query_rejects_inverted_price_range() {
        let err = ProductQuery::parse(ProductQueryParams {
            min_price: Some(BigDecimal::from(50)),
            max_price: Some(BigDecimal::from(10)),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn query_defaults_sort_newest_first() {
        let q = ProductQuery::parse(ProductQueryParams::default()).unwrap();
        assert_eq!(q.sort_by, ProductSortField::CreatedAt);
        assert_eq!(q.order, SortOrder::Desc);
        assert!(!q.include_inactive);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let p = sample(1);
        assert!(matches_search(&p, "MOUSE"));
        assert!(matches_search(&p, "ergonomic"));
        assert!(matches_search(&p, "electro"));
        assert!(!matches_search(&p, "keyboard"));
    }
}
