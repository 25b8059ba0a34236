use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::page::Paged;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{
    Availability, CategoryStats, Product, ProductInput, ProductQuery,
};

/// Outcome of one entry of a bulk update.
#[derive(Debug)]
pub struct BulkUpdateOutcome {
    pub id: String,
    pub result: Result<Product, DomainError>,
}

pub struct CatalogService<R> {
    repo: R,
}

impl<R: ProductRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_products(&self, query: &ProductQuery) -> Result<Paged<Product>, DomainError> {
        let page = self.repo.list(query)?;
        log::info!("Retrieved {} products", page.items.len());
        Ok(page)
    }

    pub fn get_product(&self, id: Uuid) -> Result<Product, DomainError> {
        match self.repo.find_by_id(id)? {
            Some(product) => Ok(product),
            None => {
                log::warn!("Product not found with id: {id}");
                Err(DomainError::NotFound("Product"))
            }
        }
    }

    pub fn create_product(&self, input: ProductInput) -> Result<Product, DomainError> {
        let product = self.repo.create(input.into_new()?)?;
        log::info!("Created new product: {}", product.id);
        Ok(product)
    }

    /// Applies a partial update with a version compare-and-swap.
    pub fn update_product(&self, id: Uuid, input: ProductInput) -> Result<Product, DomainError> {
        let patch = input.into_patch()?;
        let mut product = self.get_product(id)?;
        let loaded_version = product.version;
        product.apply(patch, Utc::now())?;
        self.store(&product, loaded_version)?;
        log::info!("Updated product: {id}");
        Ok(product)
    }

    pub fn delete_product(&self, id: Uuid) -> Result<(), DomainError> {
        if self.repo.delete(id)? {
            log::info!("Deleted product: {id}");
            Ok(())
        } else {
            log::warn!("Product not found for deletion with id: {id}");
            Err(DomainError::NotFound("Product"))
        }
    }

    pub fn search_products(&self, term: Option<&str>) -> Result<Vec<Product>, DomainError> {
        let term = match term.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Err(DomainError::invalid_field("q", "Search query is required")),
        };
        let products = self.repo.search(term)?;
        log::info!("Search query \"{term}\" returned {} results", products.len());
        Ok(products)
    }

    pub fn check_availability(&self, id: Uuid, quantity: i32) -> Result<Availability, DomainError> {
        if quantity < 1 {
            return Err(DomainError::invalid_field(
                "quantity",
                "Quantity must be a positive integer",
            ));
        }
        let product = self.get_product(id)?;
        Ok(Availability {
            available: product.is_available(quantity),
            stock_quantity: product.stock_quantity,
            requested_quantity: quantity,
        })
    }

    /// Takes stock out of a product. Fails with a conflict when stock is short
    /// or another writer changed the product in between.
    pub fn reserve_stock(&self, id: Uuid, quantity: i32) -> Result<Product, DomainError> {
        let mut product = self.get_product(id)?;
        let loaded_version = product.version;
        product.reserve(quantity, Utc::now())?;
        self.store(&product, loaded_version)?;
        log::info!(
            "Reserved {quantity} units of product {id}, {} left",
            product.stock_quantity
        );
        Ok(product)
    }

    pub fn product_stats(&self) -> Result<Vec<CategoryStats>, DomainError> {
        let stats = self.repo.stats()?;
        log::info!("Retrieved product statistics");
        Ok(stats)
    }

    /// Applies each update independently; a failing entry does not stop the rest.
    pub fn bulk_update(&self, updates: Vec<(String, ProductInput)>) -> Vec<BulkUpdateOutcome> {
        let outcomes: Vec<BulkUpdateOutcome> = updates
            .into_iter()
            .map(|(raw_id, input)| {
                let result = crate::domain::validation::parse_id(
                    &raw_id,
                    "id",
                    "Invalid product ID in updates",
                )
                .and_then(|id| self.update_product(id, input));
                BulkUpdateOutcome { id: raw_id, result }
            })
            .collect();
        log::info!(
            "Bulk updated {} products",
            outcomes.iter().filter(|o| o.result.is_ok()).count()
        );
        outcomes
    }

    fn store(&self, product: &Product, loaded_version: i32) -> Result<(), DomainError> {
        if self.repo.save_if_version(product, loaded_version)? {
            Ok(())
        } else {
            log::warn!("Lost update race on product {}", product.id);
            Err(DomainError::Conflict(format!(
                "Product {} was modified concurrently, retry the request",
                product.id
            )))
        }
    }
}
