use crate::{
    db::DbPool,
    entities::product::{self, Entity as Product},
    errors::ServiceError,
};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Read-only access to the product catalog. The ledger consumes SKU data but
/// never mutates it; catalog maintenance lives in an external component.
#[derive(Clone)]
pub struct ProductCatalogService {
    db: Arc<DbPool>,
}

impl ProductCatalogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get_sku(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn get_sku_by_code(&self, code: &str) -> Result<product::Model, ServiceError> {
        Product::find()
            .filter(product::Column::Code.eq(code))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product with code {} not found", code)))
    }

    /// Lists active SKUs, newest first.
    #[instrument(skip(self))]
    pub async fn list_skus(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let paginator = Product::find()
            .filter(product::Column::IsActive.eq(true))
            .order_by_asc(product::Column::Code)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((products, total))
    }
}

/// Batch SKU resolution used inside the order transaction. Only active,
/// saleable SKUs qualify; every unresolvable id is reported, not just the
/// first, so the caller can fix the whole order in one round-trip.
pub(crate) async fn resolve_saleable_skus<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, product::Model>, ServiceError> {
    let found: HashMap<Uuid, product::Model> = Product::find()
        .filter(product::Column::Id.is_in(ids.iter().copied()))
        .filter(product::Column::IsActive.eq(true))
        .filter(product::Column::IsSaleable.eq(true))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut missing: Vec<Uuid> = ids
        .iter()
        .filter(|id| !found.contains_key(id))
        .copied()
        .collect();

    if !missing.is_empty() {
        missing.sort();
        missing.dedup();
        return Err(ServiceError::SkusNotFound(missing));
    }

    Ok(found)
}
