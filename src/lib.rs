//! Order and stock ledger backend for field sales teams: atomic order
//! capture, per-salesperson stock with an append-only movement ledger, and a
//! promotion-aware pricing path.

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    catalog::ProductCatalogService, orders::OrderService, promotions::PromotionService,
    stock::StockLedgerService,
};

/// Service instances shared across handlers.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<ProductCatalogService>,
    pub promotions: Arc<PromotionService>,
    pub stock: Arc<StockLedgerService>,
    pub orders: Arc<OrderService>,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: Arc<AppConfig>,
    pub event_sender: Arc<EventSender>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: Arc<AppConfig>, event_sender: Arc<EventSender>) -> Self {
        let services = AppServices {
            catalog: Arc::new(ProductCatalogService::new(db.clone())),
            promotions: Arc::new(PromotionService::new(db.clone())),
            stock: Arc::new(StockLedgerService::new(db.clone(), event_sender.clone())),
            orders: Arc::new(OrderService::new(
                db.clone(),
                event_sender.clone(),
                config.default_currency.clone(),
            )),
        };
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

/// Common query parameters for list endpoints.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

/// Standard response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, query: &ListQuery) -> Self {
        let limit = query.limit.max(1);
        Self {
            items,
            total,
            page: query.page,
            limit: query.limit,
            total_pages: total.div_ceil(limit),
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match db::health_check(&state.db).await {
        Ok(()) => "up",
        Err(_) => "down",
    };
    Json(json!({
        "status": if database == "up" { "ok" } else { "degraded" },
        "database": database,
    }))
}

/// Builds the full route tree with tracing, CORS, and timeout layers.
pub fn app_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/products", get(handlers::products::list_skus))
        .route("/products/:id", get(handlers::products::get_sku))
        .route(
            "/products/code/:code",
            get(handlers::products::get_sku_by_code),
        )
        .route(
            "/products/:id/promotions",
            get(handlers::products::get_sku_promotions),
        )
        .route("/products/:id/price", get(handlers::products::quote_price))
        .route("/stock/grant", post(handlers::stock::grant_stock))
        .route("/stock/remove", post(handlers::stock::remove_stock))
        .route("/stock/remove-all", post(handlers::stock::remove_all_stock))
        .route("/stock/:salesperson_id", get(handlers::stock::get_stock))
        .route(
            "/stock/:salesperson_id/movements",
            get(handlers::stock::list_movements),
        )
        .route(
            "/stock/:salesperson_id/:product_id",
            get(handlers::stock::get_stock_level),
        )
        .route(
            "/orders",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route("/orders/:id", get(handlers::orders::get_order))
        .route(
            "/visits/:visit_id/orders",
            get(handlers::orders::orders_for_visit),
        );

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}
