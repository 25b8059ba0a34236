//! Process-local repositories, used by tests and for running the service
//! without Postgres.

use std::cmp::Ordering;
use std::sync::{Mutex, MutexGuard};

use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    summarize_by_status, summarize_daily, to_cents, DailySummary, DateRange, NewOrder, Order, OrderQuery,
    StatusStats,
};
use crate::domain::page::Paged;
use crate::domain::ports::{OrderRepository, ProductRepository};
use crate::domain::product::{
    matches_search, CategoryStats, NewProduct, Product, ProductQuery, ProductSortField, SortOrder,
};

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, DomainError> {
    m.lock()
        .map_err(|_| DomainError::Internal("repository lock poisoned".to_string()))
}

fn page_of<T: Clone>(items: &[T], offset: i64, limit: i64) -> Vec<T> {
    items
        .iter()
        .skip(usize::try_from(offset).unwrap_or(0))
        .take(usize::try_from(limit).unwrap_or(0))
        .cloned()
        .collect()
}

#[derive(Debug, Default)]
pub struct MemoryProductRepository {
    products: Mutex<Vec<Product>>,
}

impl MemoryProductRepository {
    fn duplicate_sku(products: &[Product], sku: &str, except: Option<Uuid>) -> bool {
        products
            .iter()
            .any(|p| p.sku == sku && Some(p.id) != except)
    }
}

fn compare(a: &Product, b: &Product, field: ProductSortField) -> Ordering {
    match field {
        ProductSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        ProductSortField::Price => a.price.cmp(&b.price),
        ProductSortField::Name => a.name.cmp(&b.name),
        ProductSortField::StockQuantity => a.stock_quantity.cmp(&b.stock_quantity),
    }
}

impl ProductRepository for MemoryProductRepository {
    fn create(&self, product: NewProduct) -> Result<Product, DomainError> {
        let mut products = lock(&self.products)?;
        if Self::duplicate_sku(&products, &product.sku, None) {
            return Err(DomainError::Duplicate(
                "Duplicate field value: sku. Please use another value.".to_string(),
            ));
        }
        let product = product.into_product(Uuid::new_v4(), Utc::now());
        products.push(product.clone());
        Ok(product)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        Ok(lock(&self.products)?.iter().find(|p| p.id == id).cloned())
    }

    fn list(&self, query: &ProductQuery) -> Result<Paged<Product>, DomainError> {
        let products = lock(&self.products)?;
        let mut matching: Vec<Product> = products
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            let ord = compare(a, b, query.sort_by);
            match query.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        Ok(Paged {
            total: matching.len() as i64,
            items: page_of(&matching, query.page.offset(), query.page.limit),
        })
    }

    fn search(&self, term: &str) -> Result<Vec<Product>, DomainError> {
        Ok(lock(&self.products)?
            .iter()
            .filter(|p| matches_search(p, term))
            .cloned()
            .collect())
    }

    fn save_if_version(&self, product: &Product, expected_version: i32) -> Result<bool, DomainError> {
        let mut products = lock(&self.products)?;
        if Self::duplicate_sku(&products, &product.sku, Some(product.id)) {
            return Err(DomainError::Duplicate(
                "Duplicate field value: sku. Please use another value.".to_string(),
            ));
        }
        match products.iter_mut().find(|p| p.id == product.id) {
            Some(stored) if stored.version == expected_version => {
                *stored = product.clone();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(DomainError::NotFound("Product")),
        }
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut products = lock(&self.products)?;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() != before)
    }

    fn stats(&self) -> Result<Vec<CategoryStats>, DomainError> {
        let products = lock(&self.products)?;
        let mut stats: Vec<CategoryStats> = Vec::new();
        for p in products.iter() {
            let category = p.category.as_str();
            let idx = match stats.iter().position(|s| s.category == category) {
                Some(idx) => idx,
                None => {
                    stats.push(CategoryStats {
                        category: category.to_string(),
                        total_products: 0,
                        avg_price: None,
                        min_price: None,
                        max_price: None,
                        total_stock: 0,
                    });
                    stats.len() - 1
                }
            };
            let s = &mut stats[idx];
            s.total_products += 1;
            s.total_stock += i64::from(p.stock_quantity);
            // avg_price holds the running sum until the final pass below
            s.avg_price = Some(s.avg_price.take().unwrap_or_default() + &p.price);
            s.min_price = Some(match s.min_price.take() {
                Some(m) if m <= p.price => m,
                _ => p.price.clone(),
            });
            s.max_price = Some(match s.max_price.take() {
                Some(m) if m >= p.price => m,
                _ => p.price.clone(),
            });
        }
        for s in stats.iter_mut() {
            let count = BigDecimal::from(s.total_products);
            s.avg_price = s.avg_price.take().map(|sum| to_cents(&(sum / count)));
        }
        stats.sort_by(|a, b| b.total_products.cmp(&a.total_products));
        Ok(stats)
    }
}

#[derive(Debug, Default)]
pub struct MemoryOrderRepository {
    orders: Mutex<Vec<Order>>,
}

impl OrderRepository for MemoryOrderRepository {
    fn create(&self, order: NewOrder) -> Result<Order, DomainError> {
        let order = order.into_order(Uuid::new_v4(), Utc::now());
        lock(&self.orders)?.push(order.clone());
        Ok(order)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(lock(&self.orders)?.iter().find(|o| o.id == id).cloned())
    }

    fn list(&self, query: &OrderQuery) -> Result<Paged<Order>, DomainError> {
        let orders = lock(&self.orders)?;
        // newest first; insertion order breaks timestamp ties
        let mut matching: Vec<Order> = orders
            .iter()
            .rev()
            .filter(|o| query.matches(o))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Paged {
            total: matching.len() as i64,
            items: page_of(&matching, query.page.offset(), query.page.limit),
        })
    }

    fn save(&self, order: &Order) -> Result<(), DomainError> {
        let mut orders = lock(&self.orders)?;
        match orders.iter_mut().find(|o| o.id == order.id) {
            Some(stored) => {
                *stored = order.clone();
                Ok(())
            }
            None => Err(DomainError::NotFound("Order")),
        }
    }

    fn stats(&self) -> Result<Vec<StatusStats>, DomainError> {
        Ok(summarize_by_status(lock(&self.orders)?.iter()))
    }

    fn daily_summary(&self, range: DateRange) -> Result<Vec<DailySummary>, DomainError> {
        let orders = lock(&self.orders)?;
        Ok(summarize_daily(
            orders
                .iter()
                .filter(|o| range.contains(o.created_at))
                .map(|o| (o.created_at, o.total_amount.clone())),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::{Category, ProductQueryParams};

    fn new_product(sku: &str, price: i32, category: Category) -> NewProduct {
        NewProduct {
            name: format!("Item {sku}"),
            description: "Plain description text".to_string(),
            price: BigDecimal::from(price),
            category,
            sku: sku.to_string(),
            stock_quantity: 5,
            image_url: None,
            is_active: true,
        }
    }

    #[test]
    fn list_sorts_and_pages() {
        let repo = MemoryProductRepository::default();
        for (i, price) in [30, 10, 20].into_iter().enumerate() {
            repo.create(new_product(&format!("SKU-{i}"), price, Category::Other))
                .unwrap();
        }
        let query = ProductQuery::parse(ProductQueryParams {
            sort_by: Some("price".into()),
            order: Some("asc".into()),
            limit: Some(2),
            ..Default::default()
        })
        .unwrap();
        let page = repo.list(&query).unwrap();
        assert_eq!(page.total, 3);
        let prices: Vec<_> = page.items.iter().map(|p| p.price.clone()).collect();
        assert_eq!(prices, vec![BigDecimal::from(10), BigDecimal::from(20)]);
    }

    #[test]
    fn save_if_version_refuses_stale_writes() {
        let repo = MemoryProductRepository::default();
        let mut p = repo
            .create(new_product("SKU-A", 5, Category::Food))
            .unwrap();
        p.version = 1;
        assert!(repo.save_if_version(&p, 0).unwrap());
        p.version = 2;
        assert!(!repo.save_if_version(&p, 0).unwrap());
    }

    #[test]
    fn stats_group_by_category() {
        let repo = MemoryProductRepository::default();
        repo.create(new_product("A", 10, Category::Books)).unwrap();
        repo.create(new_product("B", 20, Category::Books)).unwrap();
        repo.create(new_product("C", 7, Category::Food)).unwrap();
        let stats = repo.stats().unwrap();
        assert_eq!(stats[0].category, "Books");
        assert_eq!(stats[0].total_products, 2);
        assert_eq!(stats[0].avg_price, Some(BigDecimal::from(15)));
        assert_eq!(stats[0].min_price, Some(BigDecimal::from(10)));
        assert_eq!(stats[0].max_price, Some(BigDecimal::from(20)));
        assert_eq!(stats[0].total_stock, 10);
    }
}
