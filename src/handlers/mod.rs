pub mod catalog;
pub mod orders;

use actix_web::{error, web, HttpRequest};
use utoipa::OpenApi;

use crate::domain::errors::{DomainError, FieldError};
use crate::errors::AppError;
use crate::AppState;

/// Runs a blocking service call on actix's thread pool.
pub(crate) async fn blocking<T, F>(state: &web::Data<AppState>, f: F) -> Result<T, AppError>
where
    F: FnOnce(&AppState) -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    Ok(web::block(move || f(&state)).await??)
}

/// Malformed JSON bodies get the same 400 shape as field validation failures.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: error::JsonPayloadError, _req: &HttpRequest| {
        log::warn!("Rejected request body: {err}");
        AppError::Validation(vec![FieldError::new("body", err.to_string())]).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: error::QueryPayloadError, _req: &HttpRequest| {
        log::warn!("Rejected query string: {err}");
        AppError::Validation(vec![FieldError::new("query", err.to_string())]).into()
    })
}

#[derive(OpenApi)]
#[openapi(
    paths(
        catalog::list_products,
        catalog::get_product,
        catalog::create_product,
        catalog::update_product,
        catalog::delete_product,
        catalog::search_products,
        catalog::check_availability,
        catalog::product_stats,
        catalog::bulk_update,
        catalog::reserve_stock,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::update_order_status,
        orders::cancel_order,
        orders::process_refund,
        orders::order_stats,
        orders::user_orders,
        orders::daily_summary,
    ),
    tags(
        (name = "catalog", description = "Product catalog"),
        (name = "orders", description = "Order lifecycle")
    )
)]
pub struct ApiDoc;

/// Registers every route. Shared by the server and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(
            web::scope("/catalog")
                .route("/products", web::get().to(catalog::list_products))
                .route("/products", web::post().to(catalog::create_product))
                .route("/products/{id}", web::get().to(catalog::get_product))
                .route("/products/{id}", web::put().to(catalog::update_product))
                .route("/products/{id}", web::delete().to(catalog::delete_product))
                .route("/products/{id}/reserve", web::post().to(catalog::reserve_stock))
                .route("/search", web::get().to(catalog::search_products))
                .route("/stats", web::get().to(catalog::product_stats))
                .route("/bulk-update", web::post().to(catalog::bulk_update))
                .route(
                    "/check-availability",
                    web::get().to(catalog::check_availability),
                ),
        )
        .service(
            web::scope("/orders")
                .route("", web::post().to(orders::create_order))
                .route("", web::get().to(orders::list_orders))
                // fixed segments before `{id}`
                .route("/stats", web::get().to(orders::order_stats))
                .route("/daily-summary", web::get().to(orders::daily_summary))
                .route("/{id}", web::get().to(orders::get_order))
                .route("/{id}/status", web::put().to(orders::update_order_status))
                .route("/{id}/cancel", web::delete().to(orders::cancel_order))
                .route("/{id}/refund", web::post().to(orders::process_refund)),
        )
        .route("/users/{userId}/orders", web::get().to(orders::user_orders));
}
