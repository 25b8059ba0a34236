use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    DailySummary, DateRange, Order, OrderInput, OrderQuery, OrderStatus, StatusStats,
};
use crate::domain::page::Paged;
use crate::domain::ports::OrderRepository;

pub struct OrderService<R> {
    repo: R,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_order(&self, input: OrderInput) -> Result<Order, DomainError> {
        let order = self.repo.create(input.into_new()?)?;
        log::info!("Created new order: {}", order.id);
        Ok(order)
    }

    pub fn get_order(&self, id: Uuid) -> Result<Order, DomainError> {
        match self.repo.find_by_id(id)? {
            Some(order) => Ok(order),
            None => {
                log::warn!("Order not found with id: {id}");
                Err(DomainError::NotFound("Order"))
            }
        }
    }

    pub fn list_orders(&self, query: &OrderQuery) -> Result<Paged<Order>, DomainError> {
        let page = self.repo.list(query)?;
        log::info!("Retrieved {} orders", page.items.len());
        Ok(page)
    }

    pub fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, DomainError> {
        let mut order = self.get_order(id)?;
        order.set_status(status, Utc::now());
        self.repo.save(&order)?;
        log::info!("Updated order status: {id} to {status}");
        Ok(order)
    }

    pub fn cancel_order(&self, id: Uuid) -> Result<Order, DomainError> {
        let mut order = self.get_order(id)?;
        if let Err(e) = order.cancel(Utc::now()) {
            log::warn!("Cannot cancel order {id}: {e}");
            return Err(e);
        }
        self.repo.save(&order)?;
        log::info!("Cancelled order: {id}");
        Ok(order)
    }

    pub fn process_refund(&self, id: Uuid) -> Result<Order, DomainError> {
        let mut order = self.get_order(id)?;
        if let Err(e) = order.refund(Utc::now()) {
            log::warn!("Refund rejected for order {id} (status {}): {e}", order.status);
            return Err(e);
        }
        self.repo.save(&order)?;
        log::info!("Processed refund for order: {id}");
        Ok(order)
    }

    pub fn order_stats(&self) -> Result<Vec<StatusStats>, DomainError> {
        let stats = self.repo.stats()?;
        log::info!("Retrieved order statistics");
        Ok(stats)
    }

    pub fn daily_summary(&self, range: DateRange) -> Result<Vec<DailySummary>, DomainError> {
        let summary = self.repo.daily_summary(range)?;
        log::info!("Retrieved daily order summary");
        Ok(summary)
    }
}
