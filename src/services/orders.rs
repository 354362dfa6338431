use crate::{
    db::DbPool,
    entities::{
        order::{self, Entity as Order, OrderStatus},
        order_line::{self, Entity as OrderLine},
        outlet::Entity as Outlet,
        payment::{self, Entity as Payment},
        product,
        promotion,
        visit::Entity as Visit,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        catalog::resolve_saleable_skus,
        ensure_active_salesperson,
        promotions::{best_price, promotions_for_sku},
        stock::{check_availability, debit_for_order, DebitLine, LowStockNotice},
    },
};
use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// One requested line. Price fields are optional overrides for callers that
/// pre-resolved pricing (offline devices sync with the price they showed);
/// absent, the catalog snapshot and the promotion engine decide.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub vat_rate: Option<Decimal>,
    pub promotion_id: Option<Uuid>,
    pub discount_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderPaymentRequest {
    pub amount: Decimal,
    #[validate(length(min = 1, message = "payment method is required"))]
    pub method: String,
    pub transaction_ref: Option<String>,
    pub paid_at: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub outlet_id: Uuid,
    pub salesperson_id: Uuid,
    pub visit_id: Option<Uuid>,
    #[validate(length(min = 1, message = "order must have at least one line"))]
    pub lines: Vec<CreateOrderLineRequest>,
    #[validate]
    pub payments: Vec<CreateOrderPaymentRequest>,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

/// Fully materialized order as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: order::Model,
    pub lines: Vec<order_line::Model>,
    pub payments: Vec<payment::Model>,
}

/// Query filter for order listings. Every field is optional and ANDed in.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub salesperson_id: Option<Uuid>,
    pub outlet_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub from: Option<chrono::DateTime<Utc>>,
    pub to: Option<chrono::DateTime<Utc>>,
}

/// Priced snapshot of one order line before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PricedOrderLine {
    pub product_id: Uuid,
    pub sku_code: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub vat_rate: Decimal,
    pub line_total_excl_tax: Decimal,
    pub line_total_incl_tax: Decimal,
    pub promotion_id: Option<Uuid>,
    pub original_unit_price: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct OrderTotals {
    pub excl_tax: Decimal,
    pub incl_tax: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
}

/// Order capture and query service. Creation runs as a single transaction
/// covering pricing, order rows, and the stock debit.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    default_currency: String,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, default_currency: String) -> Self {
        Self {
            db,
            event_sender,
            default_currency,
        }
    }

    /// Creates an order atomically: actor and reference checks, batch SKU
    /// resolution, promotion pricing, order and line inserts, stock debit,
    /// and payment records all commit together or not at all.
    #[instrument(skip(self, request), fields(salesperson_id = %request.salesperson_id, outlet_id = %request.outlet_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderDetails, ServiceError> {
        for line in &request.lines {
            if line.quantity <= 0 {
                return Err(ServiceError::InvalidQuantity {
                    product_id: line.product_id,
                    quantity: line.quantity,
                });
            }
        }
        request.validate()?;
        for p in &request.payments {
            if p.amount <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "payment amount must be positive".to_string(),
                ));
            }
        }

        let currency = request
            .currency
            .clone()
            .unwrap_or_else(|| self.default_currency.clone());

        let (details, low_stock, line_count) = self
            .db
            .transaction::<_, (OrderDetails, Vec<LowStockNotice>, usize), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        ensure_active_salesperson(txn, request.salesperson_id).await?;

                        Outlet::find_by_id(request.outlet_id)
                            .one(txn)
                            .await?
                            .ok_or(ServiceError::OutletNotFound(request.outlet_id))?;

                        if let Some(visit_id) = request.visit_id {
                            let visit = Visit::find_by_id(visit_id)
                                .one(txn)
                                .await?
                                .ok_or(ServiceError::VisitNotFound(visit_id))?;
                            if visit.outlet_id != request.outlet_id {
                                return Err(ServiceError::ValidationError(format!(
                                    "Visit {} does not belong to outlet {}",
                                    visit_id, request.outlet_id
                                )));
                            }
                        }

                        let product_ids: Vec<Uuid> =
                            request.lines.iter().map(|l| l.product_id).collect();
                        let skus = resolve_saleable_skus(txn, &product_ids).await?;

                        let debit_lines: Vec<DebitLine> = request
                            .lines
                            .iter()
                            .map(|l| DebitLine {
                                product_id: l.product_id,
                                sku_code: skus.get(&l.product_id).map(|s| s.code.clone()),
                                quantity: l.quantity,
                            })
                            .collect();
                        check_availability(txn, request.salesperson_id, &debit_lines).await?;

                        let now = Utc::now();
                        let mut priced = Vec::with_capacity(request.lines.len());
                        for line in &request.lines {
                            // resolve_saleable_skus guarantees every id is present.
                            let sku = skus.get(&line.product_id).ok_or_else(|| {
                                ServiceError::InternalError(format!(
                                    "SKU {} missing after resolution",
                                    line.product_id
                                ))
                            })?;
                            let priced_line = match line.unit_price {
                                Some(unit_price) => override_line(sku, line, unit_price),
                                None => {
                                    let promotions = promotions_for_sku(txn, sku, now).await?;
                                    price_line(sku, line.quantity, &promotions)
                                }
                            };
                            priced.push(priced_line);
                        }
                        let totals = order_totals(&priced);

                        let order_id = Uuid::new_v4();
                        let order_model = order::ActiveModel {
                            id: Set(order_id),
                            order_number: Set(generate_order_number()),
                            outlet_id: Set(request.outlet_id),
                            salesperson_id: Set(request.salesperson_id),
                            visit_id: Set(request.visit_id),
                            status: Set(OrderStatus::Confirmed),
                            currency: Set(currency),
                            total_excl_tax: Set(totals.excl_tax),
                            total_incl_tax: Set(totals.incl_tax),
                            tax_total: Set(totals.tax),
                            discount_total: Set(totals.discount),
                            notes: Set(request.notes.clone()),
                            created_at: Set(now),
                            updated_at: Set(None),
                            version: Set(1),
                        }
                        .insert(txn)
                        .await?;

                        let mut line_models = Vec::with_capacity(priced.len());
                        for line in &priced {
                            let model = order_line::ActiveModel {
                                id: Set(Uuid::new_v4()),
                                order_id: Set(order_id),
                                product_id: Set(line.product_id),
                                sku_code: Set(line.sku_code.clone()),
                                quantity: Set(line.quantity),
                                unit_price: Set(line.unit_price),
                                vat_rate: Set(line.vat_rate),
                                line_total_excl_tax: Set(line.line_total_excl_tax),
                                line_total_incl_tax: Set(line.line_total_incl_tax),
                                promotion_id: Set(line.promotion_id),
                                original_unit_price: Set(line.original_unit_price),
                                discount_amount: Set(line.discount_amount),
                                created_at: Set(now),
                            }
                            .insert(txn)
                            .await?;
                            line_models.push(model);
                        }

                        // Re-validates sufficiency on the same transactional
                        // read, closing the gap with the pre-check above.
                        let debit = debit_for_order(
                            txn,
                            request.salesperson_id,
                            order_id,
                            &debit_lines,
                        )
                        .await?;

                        let mut payment_models = Vec::with_capacity(request.payments.len());
                        for p in &request.payments {
                            let model = payment::ActiveModel {
                                id: Set(Uuid::new_v4()),
                                order_id: Set(order_id),
                                amount: Set(p.amount),
                                method: Set(p.method.clone()),
                                transaction_ref: Set(p.transaction_ref.clone()),
                                paid_at: Set(p.paid_at.unwrap_or(now)),
                                created_at: Set(now),
                            }
                            .insert(txn)
                            .await?;
                            payment_models.push(model);
                        }

                        let line_count = line_models.len();
                        Ok((
                            OrderDetails {
                                order: order_model,
                                lines: line_models,
                                payments: payment_models,
                            },
                            debit.low_stock,
                            line_count,
                        ))
                    })
                },
            )
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db) => ServiceError::DatabaseError(db),
                TransactionError::Transaction(service) => service,
            })?;

        info!(
            order_id = %details.order.id,
            order_number = %details.order.order_number,
            total_incl_tax = %details.order.total_incl_tax,
            "Order created"
        );

        self.event_sender
            .send_logged(Event::OrderCreated(details.order.id))
            .await;
        self.event_sender
            .send_logged(Event::StockDebited {
                salesperson_id: details.order.salesperson_id,
                order_id: details.order.id,
                line_count,
            })
            .await;
        for notice in low_stock {
            self.event_sender
                .send_logged(Event::LowStock {
                    salesperson_id: details.order.salesperson_id,
                    product_id: notice.product_id,
                    quantity: notice.quantity,
                    threshold: notice.threshold,
                })
                .await;
        }

        Ok(details)
    }

    /// Fetches one order with its lines and payments.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderDetails, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let lines = OrderLine::find()
            .filter(order_line::Column::OrderId.eq(order_id))
            .order_by_asc(order_line::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let payments = Payment::find()
            .filter(payment::Column::OrderId.eq(order_id))
            .order_by_asc(payment::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(OrderDetails {
            order,
            lines,
            payments,
        })
    }

    /// Paginated order listing, newest first, narrowed by the filter.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        filter: OrderFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let mut query = Order::find().order_by_desc(order::Column::CreatedAt);

        if let Some(salesperson_id) = filter.salesperson_id {
            query = query.filter(order::Column::SalespersonId.eq(salesperson_id));
        }
        if let Some(outlet_id) = filter.outlet_id {
            query = query.filter(order::Column::OutletId.eq(outlet_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status));
        }
        if let Some(from) = filter.from {
            query = query.filter(order::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(order::Column::CreatedAt.lte(to));
        }

        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((orders, total))
    }

    /// All orders captured during one visit, oldest first.
    #[instrument(skip(self))]
    pub async fn orders_for_visit(
        &self,
        visit_id: Uuid,
    ) -> Result<Vec<order::Model>, ServiceError> {
        Visit::find_by_id(visit_id)
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::VisitNotFound(visit_id))?;

        let orders = Order::find()
            .filter(order::Column::VisitId.eq(visit_id))
            .order_by_asc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(orders)
    }
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn generate_order_number() -> String {
    format!("SO-{}", Uuid::new_v4().as_simple())
}

/// Prices one line: best promotion price per unit, then per-line totals
/// rounded to 2 decimal places. Tax is applied to the rounded net total.
pub(crate) fn price_line(
    sku: &product::Model,
    quantity: i32,
    promotions: &[promotion::Model],
) -> PricedOrderLine {
    let priced = best_price(promotions, sku.unit_price, quantity);

    let line_excl = round_money(priced.final_unit_price * Decimal::from(quantity));
    let line_incl = round_money(line_excl * (Decimal::ONE + sku.vat_rate / Decimal::from(100)));

    let (promotion_id, original_unit_price, discount_amount) =
        match priced.applied_promotion_id {
            Some(id) => (
                Some(id),
                Some(sku.unit_price),
                Some(priced.discount_amount),
            ),
            None => (None, None, None),
        };

    PricedOrderLine {
        product_id: sku.id,
        sku_code: sku.code.clone(),
        quantity,
        unit_price: priced.final_unit_price,
        vat_rate: sku.vat_rate,
        line_total_excl_tax: line_excl,
        line_total_incl_tax: line_incl,
        promotion_id,
        original_unit_price,
        discount_amount,
    }
}

/// Snapshot for a line whose price the caller pre-resolved. The supplied
/// discount is metadata only; line totals come straight from the supplied
/// unit price.
pub(crate) fn override_line(
    sku: &product::Model,
    line: &CreateOrderLineRequest,
    unit_price: Decimal,
) -> PricedOrderLine {
    let vat_rate = line.vat_rate.unwrap_or(sku.vat_rate);
    let line_excl = round_money(unit_price * Decimal::from(line.quantity));
    let line_incl = round_money(line_excl * (Decimal::ONE + vat_rate / Decimal::from(100)));

    let discounted = line.promotion_id.is_some() || line.discount_amount.is_some();
    PricedOrderLine {
        product_id: sku.id,
        sku_code: sku.code.clone(),
        quantity: line.quantity,
        unit_price,
        vat_rate,
        line_total_excl_tax: line_excl,
        line_total_incl_tax: line_incl,
        promotion_id: line.promotion_id,
        original_unit_price: discounted.then_some(sku.unit_price),
        discount_amount: line.discount_amount,
    }
}

/// Order totals are sums of the already-rounded line totals, never a
/// re-rounding of a grand sum.
pub(crate) fn order_totals(lines: &[PricedOrderLine]) -> OrderTotals {
    let mut totals = OrderTotals::default();
    for line in lines {
        totals.excl_tax += line.line_total_excl_tax;
        totals.incl_tax += line.line_total_incl_tax;
        totals.tax += line.line_total_incl_tax - line.line_total_excl_tax;
        totals.discount += round_money(
            line.discount_amount.unwrap_or(Decimal::ZERO) * Decimal::from(line.quantity),
        );
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::promotion::{PromotionStatus, PromotionType};
    use rust_decimal_macros::dec;

    fn sku(unit_price: Decimal, vat_rate: Decimal) -> product::Model {
        product::Model {
            id: Uuid::new_v4(),
            code: "SKU-001".to_string(),
            name: "Test product".to_string(),
            unit_price,
            vat_rate,
            category_id: None,
            brand_id: None,
            pack_format_id: None,
            is_active: true,
            is_saleable: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn percentage_promo(value: Decimal) -> promotion::Model {
        promotion::Model {
            id: Uuid::new_v4(),
            name: "test".to_string(),
            promotion_type: PromotionType::Percentage,
            discount_value: value,
            min_quantity: None,
            max_discount: None,
            start_date: Utc::now() - chrono::Duration::days(1),
            end_date: Utc::now() + chrono::Duration::days(1),
            status: PromotionStatus::Active,
            scope_level: None,
            scope_id: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn line_totals_apply_vat_to_rounded_net() {
        let line = price_line(&sku(dec!(1000), dec!(18)), 10, &[]);
        assert_eq!(line.line_total_excl_tax, dec!(10000));
        assert_eq!(line.line_total_incl_tax, dec!(11800));
        assert_eq!(line.promotion_id, None);
    }

    #[test]
    fn order_totals_sum_rounded_line_totals() {
        // 3 * 3.33 = 9.99 net, 11.79 gross at 18% (rounded per line).
        let a = price_line(&sku(dec!(3.33), dec!(18)), 3, &[]);
        let b = price_line(&sku(dec!(1000), dec!(18)), 10, &[]);
        let totals = order_totals(&[a, b]);
        assert_eq!(totals.excl_tax, dec!(10009.99));
        assert_eq!(totals.incl_tax, dec!(11811.79));
        assert_eq!(totals.tax, dec!(1801.80));
    }

    #[test]
    fn caller_override_wins_over_catalog_price() {
        let sku = sku(dec!(1000), dec!(18));
        let request = CreateOrderLineRequest {
            product_id: sku.id,
            quantity: 4,
            unit_price: Some(dec!(950)),
            vat_rate: None,
            promotion_id: None,
            discount_amount: Some(dec!(50)),
        };
        let line = override_line(&sku, &request, dec!(950));
        assert_eq!(line.unit_price, dec!(950));
        assert_eq!(line.vat_rate, dec!(18));
        assert_eq!(line.line_total_excl_tax, dec!(3800));
        assert_eq!(line.original_unit_price, Some(dec!(1000)));
        assert_eq!(line.discount_amount, Some(dec!(50)));
    }

    #[test]
    fn discounted_line_keeps_original_price_snapshot() {
        let sku = sku(dec!(200), dec!(18));
        let promo = percentage_promo(dec!(10));
        let line = price_line(&sku, 2, &[promo.clone()]);
        assert_eq!(line.unit_price, dec!(180));
        assert_eq!(line.original_unit_price, Some(dec!(200)));
        assert_eq!(line.discount_amount, Some(dec!(20)));
        assert_eq!(line.promotion_id, Some(promo.id));
        assert_eq!(line.line_total_excl_tax, dec!(360));

        let totals = order_totals(&[line]);
        assert_eq!(totals.discount, dec!(40));
    }
}
