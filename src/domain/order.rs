use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode, Zero};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;
use super::page::PageRequest;
use super::validation::{has_cents_precision, is_zip_code, Validator};

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(DomainError::Internal(format!(
                        concat!("unknown ", stringify!($name), " '{}'"),
                        other
                    ))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

string_enum!(OrderStatus {
    Pending => "PENDING",
    Processing => "PROCESSING",
    Shipped => "SHIPPED",
    Delivered => "DELIVERED",
    Cancelled => "CANCELLED",
    Returned => "RETURNED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    Pending,
    Completed,
    Failed,
}

string_enum!(RefundStatus {
    Pending => "PENDING",
    Completed => "COMPLETED",
    Failed => "FAILED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
    Cash,
}

string_enum!(PaymentMethod {
    CreditCard => "CREDIT_CARD",
    DebitCard => "DEBIT_CARD",
    Paypal => "PAYPAL",
    Cash => "CASH",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub price: BigDecimal,
    pub discount_percent: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub total_amount: BigDecimal,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub refund_status: RefundStatus,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sets a new status. Any enumerated status is accepted from any other;
    /// there is no transition graph.
    pub fn set_status(&mut self, status: OrderStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status == OrderStatus::Delivered {
            return Err(DomainError::InvalidState(
                "Cannot cancel delivered order".to_string(),
            ));
        }
        self.status = OrderStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn refund(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !matches!(self.status, OrderStatus::Cancelled | OrderStatus::Returned) {
            return Err(DomainError::InvalidState(
                "Only cancelled or returned orders can be refunded".to_string(),
            ));
        }
        if self.refund_status == RefundStatus::Completed {
            return Err(DomainError::InvalidState(
                "Order already refunded".to_string(),
            ));
        }
        self.refund_status = RefundStatus::Completed;
        self.refunded_at = Some(now);
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderItemInput {
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<BigDecimal>,
    pub discount_percent: Option<BigDecimal>,
}

#[derive(Debug, Clone, Default)]
pub struct AddressInput {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

/// Raw order creation payload, before validation.
#[derive(Debug, Clone, Default)]
pub struct OrderInput {
    pub user_id: Option<String>,
    pub items: Option<Vec<OrderItemInput>>,
    pub shipping_address: Option<AddressInput>,
    pub total_amount: Option<BigDecimal>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub total_amount: BigDecimal,
    pub payment_method: PaymentMethod,
}

impl NewOrder {
    pub fn into_order(self, id: Uuid, now: DateTime<Utc>) -> Order {
        Order {
            id,
            user_id: self.user_id,
            items: self.items,
            shipping_address: self.shipping_address,
            total_amount: self.total_amount,
            payment_method: self.payment_method,
            status: OrderStatus::Pending,
            refund_status: RefundStatus::Pending,
            cancelled_at: None,
            refunded_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl OrderInput {
    pub fn into_new(self) -> Result<NewOrder, DomainError> {
        let mut v = Validator::new();

        let user_id = match self.user_id.as_deref().map(str::trim) {
            None | Some("") => {
                v.push("userId", "User ID is required");
                None
            }
            Some(raw) => uuid_field(&mut v, raw, "userId", "Invalid user ID"),
        };

        let items = match self.items {
            Some(items) if !items.is_empty() => items
                .into_iter()
                .enumerate()
                .filter_map(|(i, item)| check_item(&mut v, i, item))
                .collect(),
            _ => {
                v.push("items", "Order must contain at least one item");
                Vec::new()
            }
        };

        let address = match self.shipping_address {
            Some(a) => check_address(&mut v, a),
            None => {
                v.push("shippingAddress", "Shipping address is required");
                None
            }
        };

        match &self.total_amount {
            Some(total) => {
                v.amount(total, "totalAmount", "Total amount must be a positive number");
            }
            None => {
                v.push("totalAmount", "Total amount is required");
            }
        }

        let payment_method = match self.payment_method.as_deref().map(str::trim) {
            None | Some("") => {
                v.push("paymentMethod", "Payment method is required");
                None
            }
            Some(raw) => match raw.parse::<PaymentMethod>() {
                Ok(m) => Some(m),
                Err(_) => {
                    v.push("paymentMethod", "Invalid payment method");
                    None
                }
            },
        };

        v.finish()?;

        match (user_id, address, self.total_amount, payment_method) {
            (Some(user_id), Some(shipping_address), Some(total_amount), Some(payment_method)) => {
                Ok(NewOrder {
                    user_id,
                    items,
                    shipping_address,
                    total_amount,
                    payment_method,
                })
            }
            _ => Err(DomainError::Internal(
                "order validation passed with missing fields".to_string(),
            )),
        }
    }
}

fn uuid_field(v: &mut Validator, raw: &str, field: &str, message: &str) -> Option<Uuid> {
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            v.push(field, message);
            None
        }
    }
}

/// Width of the name-like order columns.
const MAX_NAME_LENGTH: usize = 100;

fn check_item(v: &mut Validator, index: usize, item: OrderItemInput) -> Option<OrderItem> {
    let field = |name: &str| format!("items[{index}].{name}");

    let product_id = match item.product_id.as_deref().map(str::trim) {
        None | Some("") => {
            v.push(field("productId"), "Product ID is required");
            None
        }
        Some(raw) => uuid_field(v, raw, &field("productId"), "Invalid product ID"),
    };
    let quantity = match item.quantity {
        None => {
            v.push(field("quantity"), "Quantity is required");
            None
        }
        Some(q) => match i32::try_from(q) {
            Ok(q) if q >= 1 => Some(q),
            _ => {
                v.push(field("quantity"), "Quantity must be at least 1");
                None
            }
        },
    };
    let price = match item.price {
        None => {
            v.push(field("price"), "Price is required");
            None
        }
        Some(p) => {
            let before = v.len();
            v.amount(&p, &field("price"), "Price must be a positive number");
            (v.len() == before).then_some(p)
        }
    };
    let discount = item.discount_percent.unwrap_or_else(BigDecimal::zero);
    let discount_ok = discount >= BigDecimal::zero()
        && discount <= BigDecimal::from(100)
        && has_cents_precision(&discount);
    v.check(
        discount_ok,
        &field("discountPercent"),
        "Discount must be between 0 and 100",
    );
    let name = item.name.map(|n| n.trim().to_string()).unwrap_or_default();
    let name_ok = name.chars().count() <= MAX_NAME_LENGTH;
    v.check(
        name_ok,
        &field("name"),
        "Item name must be at most 100 characters",
    );

    match (product_id, quantity, price) {
        (Some(product_id), Some(quantity), Some(price)) if discount_ok && name_ok => Some(OrderItem {
            product_id,
            name,
            quantity,
            price,
            discount_percent: discount,
        }),
        _ => None,
    }
}

fn check_address(v: &mut Validator, a: AddressInput) -> Option<ShippingAddress> {
    let mut part = |value: Option<String>, field: &str, label: &str, max: usize| {
        match value.map(|s| s.trim().to_string()) {
            Some(s) if s.chars().count() > max => {
                v.push(
                    format!("shippingAddress.{field}"),
                    format!("{label} must be at most {max} characters"),
                );
                None
            }
            Some(s) if !s.is_empty() => Some(s),
            _ => {
                v.push(format!("shippingAddress.{field}"), format!("{label} is required"));
                None
            }
        }
    };
    let street = part(a.street, "street", "Street", 255);
    let city = part(a.city, "city", "City", MAX_NAME_LENGTH);
    let state = part(a.state, "state", "State", MAX_NAME_LENGTH);
    let zip_code = part(a.zip_code, "zipCode", "Zip code", 10);

    let zip_code = match zip_code {
        Some(zip) if is_zip_code(&zip) => Some(zip),
        Some(_) => {
            v.push("shippingAddress.zipCode", "Invalid zip code format");
            None
        }
        None => None,
    };

    Some(ShippingAddress {
        street: street?,
        city: city?,
        state: state?,
        zip_code: zip_code?,
    })
}

/// Parses a status supplied by a caller, reporting bad values against `field`.
pub fn parse_status(raw: Option<&str>, field: &str) -> Result<OrderStatus, DomainError> {
    match raw.map(str::trim) {
        None | Some("") => Err(DomainError::invalid_field(field, "Status is required")),
        Some(s) => s
            .parse()
            .map_err(|_| DomainError::invalid_field(field, "Invalid order status")),
    }
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Query-string shape accepted by the order listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQueryParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub user_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderQuery {
    pub page: PageRequest,
    pub status: Option<OrderStatus>,
    pub user_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl OrderQuery {
    pub fn parse(params: OrderQueryParams) -> Result<Self, DomainError> {
        let mut v = Validator::new();
        let page = PageRequest::checked(params.page, params.limit, &mut v);

        let status = match params.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<OrderStatus>() {
                Ok(s) => Some(s),
                Err(_) => {
                    v.push("status", "Invalid order status");
                    None
                }
            },
        };
        let user_id = match params.user_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => uuid_field(&mut v, raw, "userId", "Invalid user ID"),
        };
        let (start_date, end_date) = check_range(
            &mut v,
            params.start_date.as_deref(),
            params.end_date.as_deref(),
        );

        v.finish()?;
        Ok(Self {
            page,
            status,
            user_id,
            start_date,
            end_date,
        })
    }

    pub fn for_user(user_id: Uuid, page: PageRequest) -> Self {
        Self {
            page,
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    /// In-process equivalent of the storage filter.
    pub fn matches(&self, order: &Order) -> bool {
        self.status.map_or(true, |s| order.status == s)
            && self.user_id.map_or(true, |u| order.user_id == u)
            && self.start_date.map_or(true, |d| order.created_at >= d)
            && self.end_date.map_or(true, |d| order.created_at <= d)
    }
}

fn check_range(
    v: &mut Validator,
    start: Option<&str>,
    end: Option<&str>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let mut date = |raw: Option<&str>, field: &str, message: &str| match raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        None => None,
        Some(s) => {
            let parsed = parse_date(s);
            if parsed.is_none() {
                v.push(field, message);
            }
            parsed
        }
    };
    let start = date(start, "startDate", "Invalid start date format");
    let end = date(end, "endDate", "Invalid end date format");
    if let (Some(s), Some(e)) = (start, end) {
        v.check(e > s, "endDate", "End date must be after start date");
    }
    (start, end)
}

/// A closed date range where both ends are mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn parse_required(start: Option<&str>, end: Option<&str>) -> Result<Self, DomainError> {
        let mut v = Validator::new();
        let blank = |s: Option<&str>| s.map_or(true, |s| s.trim().is_empty());
        v.check(!blank(start), "startDate", "Start date is required");
        v.check(!blank(end), "endDate", "End date is required");
        let (start, end) = check_range(&mut v, start, end);
        v.finish()?;
        match (start, end) {
            (Some(start), Some(end)) => Ok(Self { start, end }),
            _ => Err(DomainError::Internal(
                "date range validation passed with missing bounds".to_string(),
            )),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusStats {
    pub status: String,
    pub count: i64,
    pub total_amount: BigDecimal,
    pub avg_order_value: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub order_count: i64,
    pub total_revenue: BigDecimal,
    pub average_order_value: BigDecimal,
}

pub fn to_cents(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}

fn average(total: &BigDecimal, count: i64) -> BigDecimal {
    if count == 0 {
        BigDecimal::zero()
    } else {
        to_cents(&(total.clone() / BigDecimal::from(count)))
    }
}

impl StatusStats {
    pub fn new(status: String, count: i64, total_amount: BigDecimal) -> Self {
        let avg_order_value = average(&total_amount, count);
        Self {
            status,
            count,
            total_amount,
            avg_order_value,
        }
    }
}

/// Groups orders by status, largest group first.
pub fn summarize_by_status<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Vec<StatusStats> {
    let mut groups: BTreeMap<&'static str, (i64, BigDecimal)> = BTreeMap::new();
    for order in orders {
        let entry = groups
            .entry(order.status.as_str())
            .or_insert_with(|| (0, BigDecimal::zero()));
        entry.0 += 1;
        entry.1 += &order.total_amount;
    }
    let mut stats: Vec<StatusStats> = groups
        .into_iter()
        .map(|(status, (count, total))| StatusStats::new(status.to_string(), count, total))
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

/// Groups `(created_at, total_amount)` pairs by UTC calendar day, oldest first.
pub fn summarize_daily(
    rows: impl IntoIterator<Item = (DateTime<Utc>, BigDecimal)>,
) -> Vec<DailySummary> {
    let mut days: BTreeMap<NaiveDate, (i64, BigDecimal)> = BTreeMap::new();
    for (at, amount) in rows {
        let entry = days
            .entry(at.date_naive())
            .or_insert_with(|| (0, BigDecimal::zero()));
        entry.0 += 1;
        entry.1 += amount;
    }
    days.into_iter()
        .map(|(date, (order_count, total_revenue))| DailySummary {
            date,
            order_count,
            average_order_value: average(&total_revenue, order_count),
            total_revenue,
        })
        .collect()
}
