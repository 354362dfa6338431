use crate::{
    db::DbPool,
    entities::{
        product::{self, Entity as Product},
        stock_movement::{self, Entity as StockMovement, MovementType},
        vendor_stock::{self, Entity as VendorStock},
    },
    errors::{ServiceError, StockShortage},
    events::{Event, EventSender},
    services::ensure_active_salesperson,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionError, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// One SKU/quantity pair in a grant batch.
#[derive(Debug, Clone)]
pub struct GrantItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// One line of an order debit. The SKU code travels along so shortage errors
/// can name the SKU without another lookup.
#[derive(Debug, Clone)]
pub struct DebitLine {
    pub product_id: Uuid,
    pub sku_code: Option<String>,
    pub quantity: i32,
}

/// Stock level that crossed its threshold during a debit. Reported to the
/// caller so the event can be emitted after the transaction commits.
#[derive(Debug, Clone)]
pub struct LowStockNotice {
    pub product_id: Uuid,
    pub quantity: i32,
    pub threshold: i32,
}

/// Result of a committed debit: the appended movements plus any thresholds
/// crossed on the way down.
#[derive(Debug, Default)]
pub struct DebitOutcome {
    pub movements: Vec<stock_movement::Model>,
    pub low_stock: Vec<LowStockNotice>,
}

/// Per-salesperson stock ledger. Every quantity change happens inside a
/// transaction and appends exactly one movement row per affected SKU.
#[derive(Clone)]
pub struct StockLedgerService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl StockLedgerService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Current on-hand quantity, zero when the salesperson has never held
    /// the SKU.
    #[instrument(skip(self))]
    pub async fn get_quantity(
        &self,
        salesperson_id: Uuid,
        product_id: Uuid,
    ) -> Result<i32, ServiceError> {
        let row = VendorStock::find()
            .filter(vendor_stock::Column::SalespersonId.eq(salesperson_id))
            .filter(vendor_stock::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?;
        Ok(row.map(|r| r.quantity).unwrap_or(0))
    }

    /// All stock rows held by one salesperson.
    #[instrument(skip(self))]
    pub async fn stock_for_salesperson(
        &self,
        salesperson_id: Uuid,
    ) -> Result<Vec<vendor_stock::Model>, ServiceError> {
        ensure_active_salesperson(&*self.db, salesperson_id).await?;
        let rows = VendorStock::find()
            .filter(vendor_stock::Column::SalespersonId.eq(salesperson_id))
            .all(&*self.db)
            .await?;
        Ok(rows)
    }

    /// Paginated movement ledger for one salesperson, newest first,
    /// optionally narrowed to a single SKU.
    #[instrument(skip(self))]
    pub async fn movement_history(
        &self,
        salesperson_id: Uuid,
        product_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_movement::Model>, u64), ServiceError> {
        let mut query = StockMovement::find()
            .filter(stock_movement::Column::SalespersonId.eq(salesperson_id))
            .order_by_desc(stock_movement::Column::CreatedAt);
        if let Some(product_id) = product_id {
            query = query.filter(stock_movement::Column::ProductId.eq(product_id));
        }

        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let movements = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((movements, total))
    }

    /// Adds stock to a salesperson's holdings, creating rows on first grant.
    /// The whole batch commits in one transaction; every unknown SKU is
    /// reported at once.
    #[instrument(skip(self, items))]
    pub async fn grant(
        &self,
        salesperson_id: Uuid,
        items: Vec<GrantItem>,
        reason: Option<String>,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::ValidationError(
                "grant requires at least one item".to_string(),
            ));
        }
        for item in &items {
            if item.quantity <= 0 {
                return Err(ServiceError::InvalidQuantity {
                    product_id: item.product_id,
                    quantity: item.quantity,
                });
            }
        }

        let granted: Vec<(Uuid, i32)> = items
            .iter()
            .map(|i| (i.product_id, i.quantity))
            .collect();

        let movements = self
            .db
            .transaction::<_, Vec<stock_movement::Model>, ServiceError>(move |txn| {
                Box::pin(async move {
                    ensure_active_salesperson(txn, salesperson_id).await?;

                    let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
                    let known: Vec<Uuid> = Product::find()
                        .filter(product::Column::Id.is_in(ids.iter().copied()))
                        .filter(product::Column::IsActive.eq(true))
                        .all(txn)
                        .await?
                        .into_iter()
                        .map(|p| p.id)
                        .collect();
                    let mut missing: Vec<Uuid> = ids
                        .iter()
                        .filter(|id| !known.contains(id))
                        .copied()
                        .collect();
                    if !missing.is_empty() {
                        missing.sort();
                        missing.dedup();
                        return Err(ServiceError::SkusNotFound(missing));
                    }

                    let mut movements = Vec::with_capacity(items.len());
                    for item in &items {
                        let before =
                            apply_delta(txn, salesperson_id, item.product_id, item.quantity)
                                .await?;
                        let movement = record_movement(
                            txn,
                            salesperson_id,
                            item.product_id,
                            MovementType::Grant,
                            item.quantity,
                            before,
                            None,
                            reason.clone(),
                        )
                        .await?;
                        movements.push(movement);
                    }

                    info!(
                        salesperson_id = %salesperson_id,
                        items = movements.len(),
                        "Stock granted"
                    );
                    Ok(movements)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db) => ServiceError::DatabaseError(db),
                TransactionError::Transaction(service) => service,
            })?;

        for (product_id, quantity) in granted {
            self.event_sender
                .send_logged(Event::StockGranted {
                    salesperson_id,
                    product_id,
                    quantity,
                })
                .await;
        }

        Ok(movements)
    }

    /// Zeroes one SKU's holdings (stock handed back to the depot). Fails
    /// with `NotFound` when nothing is held.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        salesperson_id: Uuid,
        product_id: Uuid,
        reason: Option<String>,
    ) -> Result<stock_movement::Model, ServiceError> {
        let movement = self
            .db
            .transaction::<_, stock_movement::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    ensure_active_salesperson(txn, salesperson_id).await?;

                    let held = VendorStock::find()
                        .filter(vendor_stock::Column::SalespersonId.eq(salesperson_id))
                        .filter(vendor_stock::Column::ProductId.eq(product_id))
                        .one(txn)
                        .await?
                        .map(|r| r.quantity)
                        .unwrap_or(0);
                    if held <= 0 {
                        return Err(ServiceError::NotFound(format!(
                            "Salesperson {} holds no stock of product {}",
                            salesperson_id, product_id
                        )));
                    }

                    let before = apply_delta(txn, salesperson_id, product_id, -held).await?;
                    info!(
                        salesperson_id = %salesperson_id,
                        product_id = %product_id,
                        quantity = held,
                        "Stock removed"
                    );
                    record_movement(
                        txn,
                        salesperson_id,
                        product_id,
                        MovementType::Removal,
                        -held,
                        before,
                        None,
                        reason,
                    )
                    .await
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db) => ServiceError::DatabaseError(db),
                TransactionError::Transaction(service) => service,
            })?;

        self.event_sender
            .send_logged(Event::StockRemoved {
                salesperson_id,
                product_id,
                quantity: -movement.quantity_delta,
            })
            .await;

        Ok(movement)
    }

    /// Zeroes every non-zero SKU the salesperson holds in one transaction,
    /// one removal movement per affected SKU. Empty holdings yield an empty
    /// batch, not an error.
    #[instrument(skip(self))]
    pub async fn remove_all(
        &self,
        salesperson_id: Uuid,
        reason: Option<String>,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        let movements = self
            .db
            .transaction::<_, Vec<stock_movement::Model>, ServiceError>(move |txn| {
                Box::pin(async move {
                    ensure_active_salesperson(txn, salesperson_id).await?;

                    let rows = VendorStock::find()
                        .filter(vendor_stock::Column::SalespersonId.eq(salesperson_id))
                        .filter(vendor_stock::Column::Quantity.gt(0))
                        .all(txn)
                        .await?;

                    let mut movements = Vec::with_capacity(rows.len());
                    for row in rows {
                        let before =
                            apply_delta(txn, salesperson_id, row.product_id, -row.quantity)
                                .await?;
                        let movement = record_movement(
                            txn,
                            salesperson_id,
                            row.product_id,
                            MovementType::Removal,
                            -row.quantity,
                            before,
                            None,
                            reason.clone(),
                        )
                        .await?;
                        movements.push(movement);
                    }

                    info!(
                        salesperson_id = %salesperson_id,
                        skus = movements.len(),
                        "All stock removed"
                    );
                    Ok(movements)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db) => ServiceError::DatabaseError(db),
                TransactionError::Transaction(service) => service,
            })?;

        for movement in &movements {
            self.event_sender
                .send_logged(Event::StockRemoved {
                    salesperson_id,
                    product_id: movement.product_id,
                    quantity: -movement.quantity_delta,
                })
                .await;
        }

        Ok(movements)
    }

    /// Standalone debit for callers outside the order path: opens its own
    /// transaction around the batch debit.
    #[instrument(skip(self, lines))]
    pub async fn reserve_and_debit(
        &self,
        salesperson_id: Uuid,
        order_id: Uuid,
        lines: Vec<DebitLine>,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        let outcome = self
            .db
            .transaction::<_, DebitOutcome, ServiceError>(move |txn| {
                Box::pin(async move {
                    ensure_active_salesperson(txn, salesperson_id).await?;
                    debit_for_order(txn, salesperson_id, order_id, &lines).await
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db) => ServiceError::DatabaseError(db),
                TransactionError::Transaction(service) => service,
            })?;

        self.event_sender
            .send_logged(Event::StockDebited {
                salesperson_id,
                order_id,
                line_count: outcome.movements.len(),
            })
            .await;
        for notice in &outcome.low_stock {
            self.event_sender
                .send_logged(Event::LowStock {
                    salesperson_id,
                    product_id: notice.product_id,
                    quantity: notice.quantity,
                    threshold: notice.threshold,
                })
                .await;
        }

        Ok(outcome.movements)
    }
}

/// Adjusts one vendor stock row by `delta`, creating the row when absent.
/// Returns the quantity before the change. The caller decides whether the
/// resulting level is legal.
async fn apply_delta<C: ConnectionTrait>(
    conn: &C,
    salesperson_id: Uuid,
    product_id: Uuid,
    delta: i32,
) -> Result<i32, ServiceError> {
    let now = Utc::now();
    let existing = VendorStock::find()
        .filter(vendor_stock::Column::SalespersonId.eq(salesperson_id))
        .filter(vendor_stock::Column::ProductId.eq(product_id))
        .one(conn)
        .await?;

    match existing {
        Some(row) => {
            let before = row.quantity;
            let mut active: vendor_stock::ActiveModel = row.into();
            active.quantity = Set(before + delta);
            active.updated_at = Set(Some(now));
            active.update(conn).await?;
            Ok(before)
        }
        None => {
            vendor_stock::ActiveModel {
                id: Set(Uuid::new_v4()),
                salesperson_id: Set(salesperson_id),
                product_id: Set(product_id),
                quantity: Set(delta),
                low_stock_threshold: Set(None),
                created_at: Set(now),
                updated_at: Set(None),
            }
            .insert(conn)
            .await?;
            Ok(0)
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn record_movement<C: ConnectionTrait>(
    conn: &C,
    salesperson_id: Uuid,
    product_id: Uuid,
    movement_type: MovementType,
    delta: i32,
    before: i32,
    order_id: Option<Uuid>,
    reason: Option<String>,
) -> Result<stock_movement::Model, ServiceError> {
    let movement = stock_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        salesperson_id: Set(salesperson_id),
        product_id: Set(product_id),
        movement_type: Set(movement_type),
        quantity_delta: Set(delta),
        quantity_before: Set(before),
        quantity_after: Set(before + delta),
        order_id: Set(order_id),
        reason: Set(reason),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?;
    Ok(movement)
}

/// Compares every requested line against the salesperson's current on-hand
/// quantities. Repeated lines for the same SKU are summed before the
/// comparison so they cannot each pass individually. A shortage on any SKU
/// reports every shortage at once.
pub(crate) async fn check_availability<C: ConnectionTrait>(
    conn: &C,
    salesperson_id: Uuid,
    lines: &[DebitLine],
) -> Result<(), ServiceError> {
    let mut requested: Vec<(Uuid, Option<String>, i32)> = Vec::new();
    for line in lines {
        match requested.iter_mut().find(|(id, _, _)| *id == line.product_id) {
            Some((_, _, total)) => *total += line.quantity,
            None => requested.push((line.product_id, line.sku_code.clone(), line.quantity)),
        }
    }

    let mut shortages = Vec::new();
    for (product_id, sku_code, total) in requested {
        let held = VendorStock::find()
            .filter(vendor_stock::Column::SalespersonId.eq(salesperson_id))
            .filter(vendor_stock::Column::ProductId.eq(product_id))
            .one(conn)
            .await?
            .map(|r| r.quantity)
            .unwrap_or(0);

        if held < total {
            shortages.push(StockShortage {
                product_id,
                sku_code,
                requested: total,
                available: held,
            });
        }
    }
    if shortages.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::InsufficientStock(shortages))
    }
}

/// Debits stock for every line of an order inside the caller's transaction.
/// Availability is re-checked against the transactional read so the whole
/// batch fails together and leaves nothing changed.
pub(crate) async fn debit_for_order<C: ConnectionTrait>(
    conn: &C,
    salesperson_id: Uuid,
    order_id: Uuid,
    lines: &[DebitLine],
) -> Result<DebitOutcome, ServiceError> {
    for line in lines {
        if line.quantity <= 0 {
            return Err(ServiceError::InvalidQuantity {
                product_id: line.product_id,
                quantity: line.quantity,
            });
        }
    }
    check_availability(conn, salesperson_id, lines).await?;

    let mut outcome = DebitOutcome::default();
    for line in lines {
        let before = apply_delta(conn, salesperson_id, line.product_id, -line.quantity).await?;
        let after = before - line.quantity;

        let threshold = VendorStock::find()
            .filter(vendor_stock::Column::SalespersonId.eq(salesperson_id))
            .filter(vendor_stock::Column::ProductId.eq(line.product_id))
            .one(conn)
            .await?
            .and_then(|r| r.low_stock_threshold);

        if let Some(threshold) = threshold {
            if after <= threshold {
                outcome.low_stock.push(LowStockNotice {
                    product_id: line.product_id,
                    quantity: after,
                    threshold,
                });
            }
        }

        let movement = record_movement(
            conn,
            salesperson_id,
            line.product_id,
            MovementType::Sale,
            -line.quantity,
            before,
            Some(order_id),
            None,
        )
        .await?;
        outcome.movements.push(movement);
    }

    Ok(outcome)
}
