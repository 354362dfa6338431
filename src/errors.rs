use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One deficient line in a batch stock check. Batch operations report every
/// shortage, not just the first, so the caller can correct all of them in one
/// round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockShortage {
    pub product_id: Uuid,
    pub sku_code: Option<String>,
    pub requested: i32,
    pub available: i32,
}

impl std::fmt::Display for StockShortage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.sku_code {
            Some(code) => write!(
                f,
                "{} (requested {}, available {})",
                code, self.requested, self.available
            ),
            None => write!(
                f,
                "{} (requested {}, available {})",
                self.product_id, self.requested, self.available
            ),
        }
    }
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_shortages(shortages: &[StockShortage]) -> String {
    shortages
        .iter()
        .map(StockShortage::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid quantity {quantity} for SKU {product_id}")]
    InvalidQuantity { product_id: Uuid, quantity: i32 },

    #[error("Salesperson {0} not found")]
    SalespersonNotFound(Uuid),

    #[error("Actor {0} is not an active salesperson")]
    NotASalesperson(Uuid),

    #[error("Outlet {0} not found")]
    OutletNotFound(Uuid),

    #[error("Visit {0} not found")]
    VisitNotFound(Uuid),

    #[error("SKUs not found: {}", join_ids(.0))]
    SkusNotFound(Vec<Uuid>),

    #[error("Insufficient stock: {}", join_shortages(.0))]
    InsufficientStock(Vec<StockShortage>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) | Self::EventError(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotFound(_)
            | Self::SalespersonNotFound(_)
            | Self::OutletNotFound(_)
            | Self::VisitNotFound(_)
            | Self::SkusNotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::InvalidQuantity { .. } => StatusCode::BAD_REQUEST,
            Self::NotASalesperson(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InsufficientStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Message suitable for HTTP responses. Internal errors return generic
    /// text to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::EventError(_) | Self::InternalError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Structured payload for batch errors, so callers get machine-readable
    /// per-item detail alongside the message.
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::InsufficientStock(shortages) => serde_json::to_value(shortages).ok(),
            Self::SkusNotFound(ids) => serde_json::to_value(ids).ok(),
            _ => None,
        }
    }
}

/// Standardized JSON error envelope returned by every handler.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub timestamp: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: self.details(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_lists_every_shortage() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let err = ServiceError::InsufficientStock(vec![
            StockShortage {
                product_id: a,
                sku_code: Some("X".to_string()),
                requested: 5,
                available: 2,
            },
            StockShortage {
                product_id: b,
                sku_code: None,
                requested: 1,
                available: 0,
            },
        ]);

        let msg = err.to_string();
        assert!(msg.contains("X (requested 5, available 2)"));
        assert!(msg.contains(&b.to_string()));
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn missing_skus_are_all_reported() {
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        let err = ServiceError::SkusNotFound(ids.clone());
        let msg = err.to_string();
        for id in &ids {
            assert!(msg.contains(&id.to_string()));
        }
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
