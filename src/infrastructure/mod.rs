pub mod memory;
pub mod models;
pub mod order_repo;
pub mod product_repo;

use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::domain::errors::DomainError;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<DieselError> for DomainError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                let field = match info.constraint_name() {
                    Some(c) if c.contains("sku") => "sku",
                    _ => info.column_name().unwrap_or("value"),
                };
                DomainError::Duplicate(format!(
                    "Duplicate field value: {field}. Please use another value."
                ))
            }
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}
