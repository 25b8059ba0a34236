use std::sync::Arc;

use uuid::Uuid;

use super::errors::DomainError;
use super::order::{DailySummary, DateRange, NewOrder, Order, OrderQuery, StatusStats};
use super::page::Paged;
use super::product::{CategoryStats, NewProduct, Product, ProductQuery};

pub trait ProductRepository: Send + Sync + 'static {
    fn create(&self, product: NewProduct) -> Result<Product, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    fn list(&self, query: &ProductQuery) -> Result<Paged<Product>, DomainError>;
    fn search(&self, term: &str) -> Result<Vec<Product>, DomainError>;
    /// Writes `product` only if the stored row still has `expected_version`.
    /// Returns false when another writer got there first.
    fn save_if_version(&self, product: &Product, expected_version: i32) -> Result<bool, DomainError>;
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
    fn stats(&self) -> Result<Vec<CategoryStats>, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    fn create(&self, order: NewOrder) -> Result<Order, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
    fn list(&self, query: &OrderQuery) -> Result<Paged<Order>, DomainError>;
    /// Persists status, refund and timestamp fields of an existing order.
    fn save(&self, order: &Order) -> Result<(), DomainError>;
    fn stats(&self) -> Result<Vec<StatusStats>, DomainError>;
    fn daily_summary(&self, range: DateRange) -> Result<Vec<DailySummary>, DomainError>;
}

impl<T: ProductRepository + ?Sized> ProductRepository for Arc<T> {
    fn create(&self, product: NewProduct) -> Result<Product, DomainError> {
        (**self).create(product)
    }
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        (**self).find_by_id(id)
    }
    fn list(&self, query: &ProductQuery) -> Result<Paged<Product>, DomainError> {
        (**self).list(query)
    }
    fn search(&self, term: &str) -> Result<Vec<Product>, DomainError> {
        (**self).search(term)
    }
    fn save_if_version(&self, product: &Product, expected_version: i32) -> Result<bool, DomainError> {
        (**self).save_if_version(product, expected_version)
    }
    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        (**self).delete(id)
    }
    fn stats(&self) -> Result<Vec<CategoryStats>, DomainError> {
        (**self).stats()
    }
}

impl<T: OrderRepository + ?Sized> OrderRepository for Arc<T> {
    fn create(&self, order: NewOrder) -> Result<Order, DomainError> {
        (**self).create(order)
    }
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        (**self).find_by_id(id)
    }
    fn list(&self, query: &OrderQuery) -> Result<Paged<Order>, DomainError> {
        (**self).list(query)
    }
    fn save(&self, order: &Order) -> Result<(), DomainError> {
        (**self).save(order)
    }
    fn stats(&self) -> Result<Vec<StatusStats>, DomainError> {
        (**self).stats()
    }
    fn daily_summary(&self, range: DateRange) -> Result<Vec<DailySummary>, DomainError> {
        (**self).daily_summary(range)
    }
}
