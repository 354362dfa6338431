use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::{stock_movement, vendor_stock},
    errors::ServiceError,
    services::stock::GrantItem,
    ApiResponse, AppState, PaginatedResponse,
};

#[derive(Debug, Deserialize)]
pub struct GrantItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct GrantStockRequest {
    pub salesperson_id: Uuid,
    pub items: Vec<GrantItemRequest>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveStockRequest {
    pub salesperson_id: Uuid,
    pub product_id: Uuid,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveAllStockRequest {
    pub salesperson_id: Uuid,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MovementQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub product_id: Option<Uuid>,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

#[derive(Debug, Serialize)]
pub struct StockLevelResponse {
    pub salesperson_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

pub async fn get_stock(
    State(state): State<AppState>,
    Path(salesperson_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<vendor_stock::Model>>>, ServiceError> {
    let rows = state
        .services
        .stock
        .stock_for_salesperson(salesperson_id)
        .await?;
    Ok(Json(ApiResponse::success(rows)))
}

pub async fn get_stock_level(
    State(state): State<AppState>,
    Path((salesperson_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<StockLevelResponse>>, ServiceError> {
    let quantity = state
        .services
        .stock
        .get_quantity(salesperson_id, product_id)
        .await?;
    Ok(Json(ApiResponse::success(StockLevelResponse {
        salesperson_id,
        product_id,
        quantity,
    })))
}

pub async fn list_movements(
    State(state): State<AppState>,
    Path(salesperson_id): Path<Uuid>,
    Query(query): Query<MovementQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<stock_movement::Model>>>, ServiceError> {
    let (items, total) = state
        .services
        .stock
        .movement_history(salesperson_id, query.product_id, query.page, query.limit)
        .await?;
    let limit = query.limit.max(1);
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page: query.page,
        limit: query.limit,
        total_pages: total.div_ceil(limit),
    })))
}

pub async fn grant_stock(
    State(state): State<AppState>,
    Json(request): Json<GrantStockRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<stock_movement::Model>>>), ServiceError> {
    let items = request
        .items
        .into_iter()
        .map(|i| GrantItem {
            product_id: i.product_id,
            quantity: i.quantity,
        })
        .collect();
    let movements = state
        .services
        .stock
        .grant(request.salesperson_id, items, request.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(movements))))
}

pub async fn remove_stock(
    State(state): State<AppState>,
    Json(request): Json<RemoveStockRequest>,
) -> Result<(StatusCode, Json<ApiResponse<stock_movement::Model>>), ServiceError> {
    let movement = state
        .services
        .stock
        .remove(request.salesperson_id, request.product_id, request.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(movement))))
}

pub async fn remove_all_stock(
    State(state): State<AppState>,
    Json(request): Json<RemoveAllStockRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<stock_movement::Model>>>), ServiceError> {
    let movements = state
        .services
        .stock
        .remove_all(request.salesperson_id, request.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(movements))))
}
