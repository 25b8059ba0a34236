use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::dsl::{avg, count_star, exists, max, min, sum};
use diesel::pg::Pg;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::to_cents;
use crate::domain::page::Paged;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{
    CategoryStats, NewProduct, Product, ProductQuery, ProductSortField, SortOrder,
};
use crate::schema::products;

use super::models::ProductRow;

pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn filtered(query: &ProductQuery) -> products::BoxedQuery<'static, Pg> {
    let mut q = products::table.into_boxed();
    if !query.include_inactive {
        q = q.filter(products::is_active.eq(true));
    }
    if let Some(category) = query.category {
        q = q.filter(products::category.eq(category.as_str()));
    }
    if let Some(min_price) = &query.min_price {
        q = q.filter(products::price.ge(min_price.clone()));
    }
    if let Some(max_price) = &query.max_price {
        q = q.filter(products::price.le(max_price.clone()));
    }
    q
}

fn sorted(
    q: products::BoxedQuery<'static, Pg>,
    field: ProductSortField,
    order: SortOrder,
) -> products::BoxedQuery<'static, Pg> {
    let q = match (field, order) {
        (ProductSortField::CreatedAt, SortOrder::Asc) => q.order(products::created_at.asc()),
        (ProductSortField::CreatedAt, SortOrder::Desc) => q.order(products::created_at.desc()),
        (ProductSortField::Price, SortOrder::Asc) => q.order(products::price.asc()),
        (ProductSortField::Price, SortOrder::Desc) => q.order(products::price.desc()),
        (ProductSortField::Name, SortOrder::Asc) => q.order(products::name.asc()),
        (ProductSortField::Name, SortOrder::Desc) => q.order(products::name.desc()),
        (ProductSortField::StockQuantity, SortOrder::Asc) => q.order(products::stock_quantity.asc()),
        (ProductSortField::StockQuantity, SortOrder::Desc) => {
            q.order(products::stock_quantity.desc())
        }
    };
    // stable pages when the sort key ties
    q.then_order_by(products::id.asc())
}

/// Escapes LIKE metacharacters so the term matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn to_domain(rows: Vec<ProductRow>) -> Result<Vec<Product>, DomainError> {
    rows.into_iter().map(Product::try_from).collect()
}

type CategoryAggregate = (
    String,
    i64,
    Option<BigDecimal>,
    Option<BigDecimal>,
    Option<BigDecimal>,
    Option<i64>,
);

impl ProductRepository for DieselProductRepository {
    fn create(&self, product: NewProduct) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;
        let product = product.into_product(Uuid::new_v4(), Utc::now());
        let row = diesel::insert_into(products::table)
            .values(&ProductRow::from(&product))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)?;
        Product::try_from(row)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Product::try_from)
            .transpose()
    }

    fn list(&self, query: &ProductQuery) -> Result<Paged<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = filtered(query).count().get_result(conn)?;

            let rows = sorted(filtered(query), query.sort_by, query.order)
                .select(ProductRow::as_select())
                .limit(query.page.limit)
                .offset(query.page.offset())
                .load(conn)?;

            Ok(Paged {
                items: to_domain(rows)?,
                total,
            })
        })
    }

    fn search(&self, term: &str) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let pattern = like_pattern(term);
        let rows = products::table
            .filter(products::is_active.eq(true))
            .filter(
                products::name
                    .ilike(pattern.clone())
                    .or(products::description.ilike(pattern.clone()))
                    .or(products::category.ilike(pattern)),
            )
            .order(products::name.asc())
            .select(ProductRow::as_select())
            .load(&mut conn)?;
        to_domain(rows)
    }

    fn save_if_version(&self, product: &Product, expected_version: i32) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let updated = diesel::update(
            products::table
                .filter(products::id.eq(product.id))
                .filter(products::version.eq(expected_version)),
        )
        .set(&ProductRow::from(product))
        .execute(&mut conn)?;
        if updated > 0 {
            return Ok(true);
        }

        let still_there: bool =
            diesel::select(exists(products::table.find(product.id))).get_result(&mut conn)?;
        if still_there {
            Ok(false)
        } else {
            Err(DomainError::NotFound("Product"))
        }
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(products::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn stats(&self) -> Result<Vec<CategoryStats>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows: Vec<CategoryAggregate> = products::table
            .group_by(products::category)
            .select((
                products::category,
                count_star(),
                avg(products::price),
                min(products::price),
                max(products::price),
                sum(products::stock_quantity),
            ))
            .load(&mut conn)?;

        let mut stats: Vec<CategoryStats> = rows
            .into_iter()
            .map(
                |(category, total_products, avg_price, min_price, max_price, total_stock)| {
                    CategoryStats {
                        category,
                        total_products,
                        avg_price: avg_price.as_ref().map(to_cents),
                        min_price,
                        max_price,
                        total_stock: total_stock.unwrap_or(0),
                    }
                },
            )
            .collect();
        stats.sort_by(|a, b| b.total_products.cmp(&a.total_products));
        Ok(stats)
    }
}
