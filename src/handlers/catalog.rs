use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::product::{
    Availability, CategoryStats, Product, ProductInput, ProductQuery, ProductQueryParams,
    ProductStatus,
};
use crate::domain::validation::{parse_id, Validator};
use crate::errors::AppError;
use crate::AppState;

use super::blocking;

// ── Request / response DTOs ──────────────────────────────────────────────────

/// Product fields. All are required on create; on update only the supplied
/// ones are validated and applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Decimal price as a string, e.g. "19.99"
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "19.99")]
    pub price: Option<BigDecimal>,
    /// One of Electronics, Books, Clothing, Food, Other
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// Version the caller last read; a mismatch is rejected with 409.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
}

impl From<ProductRequest> for ProductInput {
    fn from(r: ProductRequest) -> Self {
        ProductInput {
            name: r.name,
            description: r.description,
            price: r.price,
            category: r.category,
            sku: r.sku,
            stock_quantity: r.stock_quantity,
            image_url: r.image_url,
            is_active: r.is_active,
            version: r.version,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[schema(value_type = String, example = "19.99")]
    pub price: BigDecimal,
    pub category: String,
    pub sku: String,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
    /// inactive, in-stock or out-of-stock
    #[schema(value_type = String, example = "in-stock")]
    pub status: ProductStatus,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        let status = p.status();
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            category: p.category.as_str().to_string(),
            sku: p.sku,
            stock_quantity: p.stock_quantity,
            image_url: p.image_url,
            is_active: p.is_active,
            status,
            version: p.version,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsResponse {
    pub products: Vec<ProductResponse>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total_products: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityParams {
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub available: bool,
    pub stock_quantity: i32,
    pub requested_quantity: i32,
}

impl From<Availability> for AvailabilityResponse {
    fn from(a: Availability) -> Self {
        Self {
            available: a.available,
            stock_quantity: a.stock_quantity,
            requested_quantity: a.requested_quantity,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatsResponse {
    pub category: String,
    pub total_products: i64,
    #[schema(value_type = Option<String>)]
    pub avg_price: Option<BigDecimal>,
    #[schema(value_type = Option<String>)]
    pub min_price: Option<BigDecimal>,
    #[schema(value_type = Option<String>)]
    pub max_price: Option<BigDecimal>,
    pub total_stock: i64,
}

impl From<CategoryStats> for CategoryStatsResponse {
    fn from(s: CategoryStats) -> Self {
        Self {
            category: s.category,
            total_products: s.total_products,
            avg_price: s.avg_price,
            min_price: s.min_price,
            max_price: s.max_price,
            total_stock: s.total_stock,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateEntry {
    pub id: String,
    #[serde(flatten)]
    pub fields: ProductRequest,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkUpdateRequest {
    pub updates: Option<Vec<BulkUpdateEntry>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkUpdateResult {
    pub id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReserveRequest {
    pub quantity: Option<i64>,
}

fn product_id(raw: &str) -> Result<Uuid, DomainError> {
    parse_id(raw, "id", "Invalid product ID")
}

fn positive_quantity(raw: Option<i64>, field: &str, required: &str) -> Result<i32, DomainError> {
    let Some(raw) = raw else {
        return Err(DomainError::invalid_field(field, required));
    };
    match i32::try_from(raw) {
        Ok(q) if q >= 1 => Ok(q),
        _ => Err(DomainError::invalid_field(
            field,
            "Quantity must be a positive integer",
        )),
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /catalog/products
///
/// Filtered, sorted, paginated product listing. Inactive products are only
/// included when `includeInactive=true`.
#[utoipa::path(
    get,
    path = "/catalog/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 10, max 100)"),
        ("category" = Option<String>, Query, description = "Category filter"),
        ("minPrice" = Option<String>, Query, description = "Minimum price"),
        ("maxPrice" = Option<String>, Query, description = "Maximum price, must exceed minPrice"),
        ("sortBy" = Option<String>, Query, description = "createdAt, price, name or stockQuantity"),
        ("order" = Option<String>, Query, description = "asc or desc (default desc)"),
        ("includeInactive" = Option<bool>, Query, description = "Include inactive products"),
    ),
    responses(
        (status = 200, description = "Page of products", body = ListProductsResponse),
        (status = 400, description = "Invalid query"),
    ),
    tag = "catalog"
)]
pub async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<ProductQueryParams>,
) -> Result<HttpResponse, AppError> {
    let query = ProductQuery::parse(query.into_inner())?;
    let page = query.page;

    let result = blocking(&state, move |s| s.catalog.list_products(&query)).await?;

    Ok(HttpResponse::Ok().json(ListProductsResponse {
        total_pages: page.total_pages(result.total),
        current_page: page.page,
        total_products: result.total,
        products: result.items.into_iter().map(ProductResponse::from).collect(),
    }))
}

/// GET /catalog/products/{id}
#[utoipa::path(
    get,
    path = "/catalog/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = product_id(&path)?;
    let product = blocking(&state, move |s| s.catalog.get_product(id)).await?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// POST /catalog/products
#[utoipa::path(
    post,
    path = "/catalog/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Validation failed or duplicate sku"),
    ),
    tag = "catalog"
)]
pub async fn create_product(
    state: web::Data<AppState>,
    body: web::Json<ProductRequest>,
) -> Result<HttpResponse, AppError> {
    let input = ProductInput::from(body.into_inner());
    let product = blocking(&state, move |s| s.catalog.create_product(input)).await?;
    Ok(HttpResponse::Created().json(ProductResponse::from(product)))
}

/// PUT /catalog/products/{id}
///
/// Partial update. Sending `version` makes the write conditional on it.
#[utoipa::path(
    put,
    path = "/catalog/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Version mismatch"),
    ),
    tag = "catalog"
)]
pub async fn update_product(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ProductRequest>,
) -> Result<HttpResponse, AppError> {
    let id = product_id(&path)?;
    let input = ProductInput::from(body.into_inner());
    let product = blocking(&state, move |s| s.catalog.update_product(id, input)).await?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// DELETE /catalog/products/{id}
#[utoipa::path(
    delete,
    path = "/catalog/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn delete_product(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = product_id(&path)?;
    blocking(&state, move |s| s.catalog.delete_product(id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /catalog/search
#[utoipa::path(
    get,
    path = "/catalog/search",
    params(("q" = String, Query, description = "Case-insensitive search term")),
    responses(
        (status = 200, description = "Matching active products", body = [ProductResponse]),
        (status = 400, description = "Missing search term"),
    ),
    tag = "catalog"
)]
pub async fn search_products(
    state: web::Data<AppState>,
    query: web::Query<SearchParams>,
) -> Result<HttpResponse, AppError> {
    let term = query.into_inner().q;
    let products = blocking(&state, move |s| s.catalog.search_products(term.as_deref())).await?;
    Ok(HttpResponse::Ok().json(
        products
            .into_iter()
            .map(ProductResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// GET /catalog/check-availability
#[utoipa::path(
    get,
    path = "/catalog/check-availability",
    params(
        ("productId" = Uuid, Query, description = "Product UUID"),
        ("quantity" = i64, Query, description = "Requested quantity (at least 1)"),
    ),
    responses(
        (status = 200, description = "Availability", body = AvailabilityResponse),
        (status = 400, description = "Missing or invalid parameters"),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn check_availability(
    state: web::Data<AppState>,
    query: web::Query<AvailabilityParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let mut v = Validator::new();
    let id = match params.product_id.as_deref().map(str::trim) {
        None | Some("") => {
            v.push("productId", "Product ID is required");
            None
        }
        Some(raw) => match parse_id(raw, "productId", "Invalid product ID") {
            Ok(id) => Some(id),
            Err(_) => {
                v.push("productId", "Invalid product ID");
                None
            }
        },
    };
    let quantity = match positive_quantity(params.quantity, "quantity", "Quantity is required") {
        Ok(q) => Some(q),
        Err(DomainError::Validation(errors)) => {
            for e in errors {
                v.push(e.field, e.message);
            }
            None
        }
        Err(e) => return Err(e.into()),
    };
    v.finish()?;
    let (Some(id), Some(quantity)) = (id, quantity) else {
        return Err(AppError::Internal(
            "availability validation passed with missing values".to_string(),
        ));
    };

    let availability =
        blocking(&state, move |s| s.catalog.check_availability(id, quantity)).await?;
    Ok(HttpResponse::Ok().json(AvailabilityResponse::from(availability)))
}

/// GET /catalog/stats
///
/// Per-category product statistics, largest category first.
#[utoipa::path(
    get,
    path = "/catalog/stats",
    responses((status = 200, description = "Category statistics", body = [CategoryStatsResponse])),
    tag = "catalog"
)]
pub async fn product_stats(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let stats = blocking(&state, |s| s.catalog.product_stats()).await?;
    Ok(HttpResponse::Ok().json(
        stats
            .into_iter()
            .map(CategoryStatsResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// POST /catalog/bulk-update
///
/// Applies each update independently and reports per-entry success.
#[utoipa::path(
    post,
    path = "/catalog/bulk-update",
    request_body = BulkUpdateRequest,
    responses(
        (status = 200, description = "Per-entry results", body = [BulkUpdateResult]),
        (status = 400, description = "Updates missing"),
    ),
    tag = "catalog"
)]
pub async fn bulk_update(
    state: web::Data<AppState>,
    body: web::Json<BulkUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    let Some(updates) = body.into_inner().updates else {
        return Err(AppError::invalid_field("updates", "Updates must be an array"));
    };
    let updates: Vec<(String, ProductInput)> = updates
        .into_iter()
        .map(|u| (u.id, ProductInput::from(u.fields)))
        .collect();

    let outcomes = blocking(&state, move |s| Ok(s.catalog.bulk_update(updates))).await?;

    let results: Vec<BulkUpdateResult> = outcomes
        .into_iter()
        .map(|o| match o.result {
            Ok(product) => BulkUpdateResult {
                id: o.id,
                success: true,
                product: Some(ProductResponse::from(product)),
                error: None,
            },
            Err(e) => BulkUpdateResult {
                id: o.id,
                success: false,
                product: None,
                error: Some(match e {
                    DomainError::Internal(_) => "Internal server error".to_string(),
                    other => other.to_string(),
                }),
            },
        })
        .collect();
    Ok(HttpResponse::Ok().json(results))
}

/// POST /catalog/products/{id}/reserve
///
/// Takes stock out of a product atomically with respect to other writers.
#[utoipa::path(
    post,
    path = "/catalog/products/{id}/reserve",
    params(("id" = Uuid, Path, description = "Product UUID")),
    request_body = ReserveRequest,
    responses(
        (status = 200, description = "Stock reserved", body = ProductResponse),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Insufficient stock or concurrent modification"),
    ),
    tag = "catalog"
)]
pub async fn reserve_stock(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ReserveRequest>,
) -> Result<HttpResponse, AppError> {
    let id = product_id(&path)?;
    let quantity = positive_quantity(body.quantity, "quantity", "Quantity is required")?;
    let product = blocking(&state, move |s| s.catalog.reserve_stock(id, quantity)).await?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}
