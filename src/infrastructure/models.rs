use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderItem, ShippingAddress};
use crate::domain::product::Product;
use crate::schema::{order_items, orders, products};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable, AsChangeset)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub category: String,
    pub sku: String,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            description: p.description.clone(),
            price: p.price.clone(),
            category: p.category.as_str().to_string(),
            sku: p.sku.clone(),
            stock_quantity: p.stock_quantity,
            image_url: p.image_url.clone(),
            is_active: p.is_active,
            version: p.version,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            category: row.category.parse()?,
            sku: row.sku,
            stock_quantity: row.stock_quantity,
            image_url: row.image_url,
            is_active: row.is_active,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub total_amount: BigDecimal,
    pub payment_method: String,
    pub status: String,
    pub refund_status: String,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderRow {
    fn from(o: &Order) -> Self {
        Self {
            id: o.id,
            user_id: o.user_id,
            street: o.shipping_address.street.clone(),
            city: o.shipping_address.city.clone(),
            state: o.shipping_address.state.clone(),
            zip_code: o.shipping_address.zip_code.clone(),
            total_amount: o.total_amount.clone(),
            payment_method: o.payment_method.as_str().to_string(),
            status: o.status.as_str().to_string(),
            refund_status: o.refund_status.as_str().to_string(),
            cancelled_at: o.cancelled_at,
            refunded_at: o.refunded_at,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

/// The mutable part of an order; everything else is fixed at creation.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = orders)]
#[diesel(treat_none_as_null = true)]
pub struct OrderProgressChangeset {
    pub status: String,
    pub refund_status: String,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderProgressChangeset {
    fn from(o: &Order) -> Self {
        Self {
            status: o.status.as_str().to_string(),
            refund_status: o.refund_status.as_str().to_string(),
            cancelled_at: o.cancelled_at,
            refunded_at: o.refunded_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub price: BigDecimal,
    pub discount_percent: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub price: BigDecimal,
    pub discount_percent: BigDecimal,
}

impl NewOrderItemRow {
    pub fn new(order_id: Uuid, position: i32, item: &OrderItem) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            position,
            product_id: item.product_id,
            name: item.name.clone(),
            quantity: item.quantity,
            price: item.price.clone(),
            discount_percent: item.discount_percent.clone(),
        }
    }
}

impl OrderRow {
    pub fn into_order(self, items: Vec<OrderItemRow>) -> Result<Order, DomainError> {
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            items: items
                .into_iter()
                .map(|i| OrderItem {
                    product_id: i.product_id,
                    name: i.name,
                    quantity: i.quantity,
                    price: i.price,
                    discount_percent: i.discount_percent,
                })
                .collect(),
            shipping_address: ShippingAddress {
                street: self.street,
                city: self.city,
                state: self.state,
                zip_code: self.zip_code,
            },
            total_amount: self.total_amount,
            payment_method: self.payment_method.parse()?,
            status: self.status.parse()?,
            refund_status: self.refund_status.parse()?,
            cancelled_at: self.cancelled_at,
            refunded_at: self.refunded_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
