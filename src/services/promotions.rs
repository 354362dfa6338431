use crate::{
    db::DbPool,
    entities::{
        product::{self, Entity as Product},
        promotion::{self, Entity as Promotion, PromotionStatus, PromotionType, ScopeLevel},
        promotion_product,
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, JoinType, QueryFilter, QuerySelect,
    RelationTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Result of best-price evaluation for one line. `discount_amount` is per
/// unit; the line totals themselves stay `unit_price * qty` with the discount
/// tracked as metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub final_unit_price: Decimal,
    pub discount_amount: Decimal,
    pub applied_promotion_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct PromotionService {
    db: Arc<DbPool>,
}

impl PromotionService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// All promotions applicable to a SKU at an instant: active status,
    /// validity window containing `at`, and the SKU matched either by an
    /// explicit mapping or by the promotion's hierarchy scope. Ordered by
    /// descending discount value.
    #[instrument(skip(self))]
    pub async fn active_promotions_for(
        &self,
        product_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Vec<promotion::Model>, ServiceError> {
        let sku = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        promotions_for_sku(&*self.db, &sku, at).await
    }

    /// Best price for a SKU at an instant: evaluates every applicable
    /// promotion and picks the lowest final unit price. Returns the original
    /// price with no promotion id when nothing qualifies.
    #[instrument(skip(self))]
    pub async fn price_for(
        &self,
        product_id: Uuid,
        unit_price: Decimal,
        quantity: i32,
        at: DateTime<Utc>,
    ) -> Result<PricedLine, ServiceError> {
        let promotions = self.active_promotions_for(product_id, at).await?;
        Ok(best_price(&promotions, unit_price, quantity))
    }
}

/// Connection-generic promotion lookup so order creation can run it inside
/// its own transaction against a consistent snapshot.
pub(crate) async fn promotions_for_sku<C: ConnectionTrait>(
    conn: &C,
    sku: &product::Model,
    at: DateTime<Utc>,
) -> Result<Vec<promotion::Model>, ServiceError> {
    let window = Condition::all()
        .add(promotion::Column::Status.eq(PromotionStatus::Active))
        .add(promotion::Column::StartDate.lte(at))
        .add(promotion::Column::EndDate.gte(at));

    // Promotions naming this SKU explicitly.
    let mapped = Promotion::find()
        .filter(window.clone())
        .join(
            JoinType::InnerJoin,
            promotion::Relation::PromotionProducts.def(),
        )
        .filter(promotion_product::Column::ProductId.eq(sku.id))
        .all(conn)
        .await?;

    // Promotions scoped to a hierarchy level containing this SKU.
    let mut scope_cond = Condition::any();
    let mut has_scope = false;
    for (level, id) in [
        (ScopeLevel::Category, sku.category_id),
        (ScopeLevel::Brand, sku.brand_id),
        (ScopeLevel::PackFormat, sku.pack_format_id),
    ] {
        if let Some(id) = id {
            scope_cond = scope_cond.add(
                Condition::all()
                    .add(promotion::Column::ScopeLevel.eq(level))
                    .add(promotion::Column::ScopeId.eq(id)),
            );
            has_scope = true;
        }
    }

    let scoped = if has_scope {
        Promotion::find()
            .filter(window)
            .filter(scope_cond)
            .all(conn)
            .await?
    } else {
        Vec::new()
    };

    let mut by_id: HashMap<Uuid, promotion::Model> = HashMap::new();
    for promo in mapped.into_iter().chain(scoped) {
        by_id.insert(promo.id, promo);
    }

    let mut promotions: Vec<promotion::Model> = by_id.into_values().collect();
    promotions.sort_by(|a, b| b.discount_value.cmp(&a.discount_value));

    debug!(sku_code = %sku.code, count = promotions.len(), "Resolved active promotions");
    Ok(promotions)
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Per-unit discount a single promotion yields, or `None` when the promotion
/// does not qualify for this quantity. The discount is clamped to the unit
/// price so the final price can never go negative.
pub(crate) fn unit_discount(
    promo: &promotion::Model,
    unit_price: Decimal,
    quantity: i32,
) -> Option<Decimal> {
    if let Some(min) = promo.min_quantity {
        if quantity < min {
            return None;
        }
    }

    let raw = match promo.promotion_type {
        PromotionType::Percentage => {
            let discount = round_money(unit_price * promo.discount_value / Decimal::from(100));
            match promo.max_discount {
                Some(cap) => discount.min(cap),
                None => discount,
            }
        }
        PromotionType::FixedAmount => promo.discount_value,
        PromotionType::BuyXGetY => {
            // min_quantity is the block size, discount_value the free units
            // per full block; the freebie value is spread per purchased unit.
            let block = promo.min_quantity.filter(|b| *b > 0)?;
            let blocks = Decimal::from(quantity / block);
            let free_value = blocks * promo.discount_value * unit_price;
            round_money(free_value / Decimal::from(quantity))
        }
    };

    Some(raw.clamp(Decimal::ZERO, unit_price))
}

/// Picks the promotion yielding the lowest final unit price; ties break on
/// the lowest promotion id so the result is deterministic.
pub(crate) fn best_price(
    promotions: &[promotion::Model],
    unit_price: Decimal,
    quantity: i32,
) -> PricedLine {
    let mut candidates: Vec<(Decimal, Uuid, Decimal)> = promotions
        .iter()
        .filter_map(|p| {
            unit_discount(p, unit_price, quantity).map(|d| (unit_price - d, p.id, d))
        })
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    match candidates.first() {
        Some((final_price, promo_id, discount)) if *discount > Decimal::ZERO => PricedLine {
            final_unit_price: *final_price,
            discount_amount: *discount,
            applied_promotion_id: Some(*promo_id),
        },
        _ => PricedLine {
            final_unit_price: unit_price,
            discount_amount: Decimal::ZERO,
            applied_promotion_id: None,
        },
    }
}
