use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum PromotionStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum PromotionType {
    /// `discount_value` is a percentage of the unit price.
    #[sea_orm(string_value = "percentage")]
    Percentage,
    /// `discount_value` is an absolute amount off the unit price.
    #[sea_orm(string_value = "fixed_amount")]
    FixedAmount,
    /// Every full `min_quantity` block earns `discount_value` free units.
    #[sea_orm(string_value = "buy_x_get_y")]
    BuyXGetY,
}

/// Hierarchy level a scoped promotion applies to. Promotions without a scope
/// level target an explicit SKU set via `promotion_products`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ScopeLevel {
    #[sea_orm(string_value = "category")]
    Category,
    #[sea_orm(string_value = "brand")]
    Brand,
    #[sea_orm(string_value = "pack_format")]
    PackFormat,
}

/// Time-bounded discount rule. Read-only from the ledger's perspective.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "promotions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub promotion_type: PromotionType,
    pub discount_value: Decimal,
    pub min_quantity: Option<i32>,
    pub max_discount: Option<Decimal>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: PromotionStatus,
    pub scope_level: Option<ScopeLevel>,
    pub scope_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::promotion_product::Entity")]
    PromotionProducts,
}

impl Related<super::promotion_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PromotionProducts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
