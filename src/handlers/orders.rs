use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{
    parse_status, AddressInput, DailySummary, DateRange, Order, OrderInput, OrderItemInput,
    OrderQuery, OrderQueryParams, OrderStatus, PaymentMethod, RefundStatus, StatusStats,
};
use crate::domain::page::{PageRequest, Paged};
use crate::domain::validation::{parse_id, Validator};
use crate::errors::AppError;
use crate::AppState;

use super::blocking;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    /// Decimal price captured when the item was added, e.g. "9.99"
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "9.99")]
    pub price: Option<BigDecimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "10")]
    pub discount_percent: Option<BigDecimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItemRequest>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<AddressRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "42.17")]
    pub total_amount: Option<BigDecimal>,
    /// CREDIT_CARD, DEBIT_CARD, PAYPAL or CASH
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

impl From<CreateOrderRequest> for OrderInput {
    fn from(r: CreateOrderRequest) -> Self {
        OrderInput {
            user_id: r.user_id,
            items: r.items.map(|items| {
                items
                    .into_iter()
                    .map(|i| OrderItemInput {
                        product_id: i.product_id,
                        name: i.name,
                        quantity: i.quantity,
                        price: i.price,
                        discount_percent: i.discount_percent,
                    })
                    .collect()
            }),
            shipping_address: r.shipping_address.map(|a| AddressInput {
                street: a.street,
                city: a.city,
                state: a.state,
                zip_code: a.zip_code,
            }),
            total_amount: r.total_amount,
            payment_method: r.payment_method,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    #[schema(value_type = String, example = "9.99")]
    pub price: BigDecimal,
    #[schema(value_type = String, example = "0")]
    pub discount_percent: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<OrderItemResponse>,
    pub shipping_address: AddressResponse,
    #[schema(value_type = String, example = "42.17")]
    pub total_amount: BigDecimal,
    #[schema(value_type = String, example = "CREDIT_CARD")]
    pub payment_method: PaymentMethod,
    #[schema(value_type = String, example = "PENDING")]
    pub status: OrderStatus,
    #[schema(value_type = String, example = "PENDING")]
    pub refund_status: RefundStatus,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            user_id: o.user_id,
            items: o
                .items
                .into_iter()
                .map(|i| OrderItemResponse {
                    product_id: i.product_id,
                    name: i.name,
                    quantity: i.quantity,
                    price: i.price,
                    discount_percent: i.discount_percent,
                })
                .collect(),
            shipping_address: AddressResponse {
                street: o.shipping_address.street,
                city: o.shipping_address.city,
                state: o.shipping_address.state,
                zip_code: o.shipping_address.zip_code,
            },
            total_amount: o.total_amount,
            payment_method: o.payment_method,
            status: o.status,
            refund_status: o.refund_status,
            cancelled_at: o.cancelled_at,
            refunded_at: o.refunded_at,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderResponse>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total_orders: i64,
}

impl ListOrdersResponse {
    fn new(page: PageRequest, result: Paged<Order>) -> Self {
        Self {
            total_pages: page.total_pages(result.total),
            current_page: page.page,
            total_orders: result.total,
            orders: result.items.into_iter().map(OrderResponse::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// PENDING, PROCESSING, SHIPPED, DELIVERED, CANCELLED or RETURNED
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusStatsResponse {
    pub status: String,
    pub count: i64,
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
    #[schema(value_type = String)]
    pub avg_order_value: BigDecimal,
}

impl From<StatusStats> for StatusStatsResponse {
    fn from(s: StatusStats) -> Self {
        Self {
            status: s.status,
            count: s.count,
            total_amount: s.total_amount,
            avg_order_value: s.avg_order_value,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryResponse {
    pub date: NaiveDate,
    pub order_count: i64,
    #[schema(value_type = String)]
    pub total_revenue: BigDecimal,
    #[schema(value_type = String)]
    pub average_order_value: BigDecimal,
}

impl From<DailySummary> for DailySummaryResponse {
    fn from(d: DailySummary) -> Self {
        Self {
            date: d.date,
            order_count: d.order_count,
            total_revenue: d.total_revenue,
            average_order_value: d.average_order_value,
        }
    }
}

fn order_id(raw: &str) -> Result<Uuid, AppError> {
    Ok(parse_id(raw, "id", "Invalid order ID")?)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Validates the payload and stores the order with its items in one
/// transaction.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = OrderResponse),
        (status = 400, description = "Validation failed"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let input = OrderInput::from(body.into_inner());
    let order = blocking(&state, move |s| s.orders.create_order(input)).await?;
    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Paginated order listing, newest first.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 10, max 100)"),
        ("status" = Option<String>, Query, description = "Status filter"),
        ("userId" = Option<Uuid>, Query, description = "User filter"),
        ("startDate" = Option<String>, Query, description = "Created at or after (RFC 3339 or YYYY-MM-DD)"),
        ("endDate" = Option<String>, Query, description = "Created at or before, must follow startDate"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 400, description = "Invalid query"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<OrderQueryParams>,
) -> Result<HttpResponse, AppError> {
    let query = OrderQuery::parse(query.into_inner())?;
    let page = query.page;
    let result = blocking(&state, move |s| s.orders.list_orders(&query)).await?;
    Ok(HttpResponse::Ok().json(ListOrdersResponse::new(page, result)))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = order_id(&path)?;
    let order = blocking(&state, move |s| s.orders.get_order(id)).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PUT /orders/{id}/status
///
/// Any listed status may follow any other.
#[utoipa::path(
    put,
    path = "/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Invalid status"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let id = order_id(&path)?;
    let status = parse_status(body.status.as_deref(), "status")?;
    let order = blocking(&state, move |s| s.orders.update_status(id, status)).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// DELETE /orders/{id}/cancel
#[utoipa::path(
    delete,
    path = "/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order cancelled", body = OrderResponse),
        (status = 400, description = "Order already delivered"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = order_id(&path)?;
    let order = blocking(&state, move |s| s.orders.cancel_order(id)).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// POST /orders/{id}/refund
#[utoipa::path(
    post,
    path = "/orders/{id}/refund",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Refund completed", body = OrderResponse),
        (status = 400, description = "Order not refundable"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn process_refund(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = order_id(&path)?;
    let order = blocking(&state, move |s| s.orders.process_refund(id)).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /orders/stats
///
/// Order count and revenue per status, largest group first.
#[utoipa::path(
    get,
    path = "/orders/stats",
    responses((status = 200, description = "Per-status statistics", body = [StatusStatsResponse])),
    tag = "orders"
)]
pub async fn order_stats(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let stats = blocking(&state, |s| s.orders.order_stats()).await?;
    Ok(HttpResponse::Ok().json(
        stats
            .into_iter()
            .map(StatusStatsResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// GET /users/{userId}/orders
#[utoipa::path(
    get,
    path = "/users/{userId}/orders",
    params(
        ("userId" = Uuid, Path, description = "User UUID"),
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 10, max 100)"),
    ),
    responses(
        (status = 200, description = "The user's orders, newest first", body = ListOrdersResponse),
        (status = 400, description = "Malformed user id or paging"),
    ),
    tag = "orders"
)]
pub async fn user_orders(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_id(&path, "userId", "Invalid user ID")?;
    let params = query.into_inner();
    let mut v = Validator::new();
    let page = PageRequest::checked(params.page, params.limit, &mut v);
    v.finish()?;

    let query = OrderQuery::for_user(user_id, page);
    let result = blocking(&state, move |s| s.orders.list_orders(&query)).await?;
    Ok(HttpResponse::Ok().json(ListOrdersResponse::new(page, result)))
}

/// GET /orders/daily-summary
///
/// Order count and revenue per UTC day between two required dates.
#[utoipa::path(
    get,
    path = "/orders/daily-summary",
    params(
        ("startDate" = String, Query, description = "Range start (RFC 3339 or YYYY-MM-DD)"),
        ("endDate" = String, Query, description = "Range end, must follow startDate"),
    ),
    responses(
        (status = 200, description = "One entry per day with orders", body = [DailySummaryResponse]),
        (status = 400, description = "Missing or invalid dates"),
    ),
    tag = "orders"
)]
pub async fn daily_summary(
    state: web::Data<AppState>,
    query: web::Query<DailySummaryParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let range = DateRange::parse_required(params.start_date.as_deref(), params.end_date.as_deref())?;
    let summary = blocking(&state, move |s| s.orders.daily_summary(range)).await?;
    Ok(HttpResponse::Ok().json(
        summary
            .into_iter()
            .map(DailySummaryResponse::from)
            .collect::<Vec<_>>(),
    ))
}
