use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sellable unit (SKU). Price and tax rate are snapshotted onto order lines
/// at order time; editing a product never rewrites existing orders.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub code: String,

    pub name: String,

    /// Unit price excluding tax.
    pub unit_price: Decimal,

    /// Tax rate as a percentage (18 means 18%).
    pub vat_rate: Decimal,

    /// Hierarchy placement, used for promotion scoping.
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub pack_format_id: Option<Uuid>,

    pub is_active: bool,
    pub is_saleable: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::vendor_stock::Entity")]
    VendorStock,
    #[sea_orm(has_many = "super::order_line::Entity")]
    OrderLines,
}

impl Related<super::vendor_stock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VendorStock.def()
    }
}

impl Related<super::order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
