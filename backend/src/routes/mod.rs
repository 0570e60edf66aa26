//! Route definitions for the roastery inventory API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/catalog", get(handlers::get_catalog))
        .route("/warehouses", get(handlers::list_warehouses))
        // Green bags
        .route("/intake", post(handlers::register_bags))
        .route("/stock/main", get(handlers::get_main_stock))
        .route("/transfers/roastery", post(handlers::transfer_to_roastery))
        .route("/stock/roastery", get(handlers::get_roastery_stock))
        // Roasting
        .nest("/roasting", roasting_routes())
        // Branches
        .nest("/dispatch", dispatch_routes())
        .route("/reports/branch-stock", get(handlers::get_branch_stock_report))
}

/// Roasting batch routes
fn roasting_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_batches).post(handlers::record_roast))
        .route("/preview", post(handlers::preview_roast))
        .route("/:id", get(handlers::get_batch))
}

/// Branch dispatch routes
fn dispatch_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::dispatch_to_branch))
        .route("/available", get(handlers::list_available))
}
