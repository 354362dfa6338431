use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    entities::{product, promotion},
    errors::ServiceError,
    services::promotions::PricedLine,
    ApiResponse, AppState, ListQuery, PaginatedResponse,
};

pub async fn list_skus(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<product::Model>>>, ServiceError> {
    let (items, total) = state
        .services
        .catalog
        .list_skus(query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, &query,
    ))))
}

pub async fn get_sku(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<product::Model>>, ServiceError> {
    let sku = state.services.catalog.get_sku(id).await?;
    Ok(Json(ApiResponse::success(sku)))
}

pub async fn get_sku_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<product::Model>>, ServiceError> {
    let sku = state.services.catalog.get_sku_by_code(&code).await?;
    Ok(Json(ApiResponse::success(sku)))
}

pub async fn get_sku_promotions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<promotion::Model>>>, ServiceError> {
    let promotions = state
        .services
        .promotions
        .active_promotions_for(id, Utc::now())
        .await?;
    Ok(Json(ApiResponse::success(promotions)))
}

#[derive(Debug, Deserialize)]
pub struct PriceQuoteQuery {
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

/// Best current unit price for a SKU at a given quantity, promotions applied.
pub async fn quote_price(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PriceQuoteQuery>,
) -> Result<Json<ApiResponse<PricedLine>>, ServiceError> {
    if query.quantity < 1 {
        return Err(ServiceError::InvalidQuantity {
            product_id: id,
            quantity: query.quantity,
        });
    }
    let sku = state.services.catalog.get_sku(id).await?;
    let unit_price: Decimal = sku.unit_price;
    let priced = state
        .services
        .promotions
        .price_for(id, unit_price, query.quantity, Utc::now())
        .await?;
    Ok(Json(ApiResponse::success(priced)))
}
