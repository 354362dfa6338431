//! Business services for the order and stock ledger.

pub mod catalog;
pub mod orders;
pub mod promotions;
pub mod stock;

use crate::{
    entities::salesperson::{self, Entity as Salesperson, Role},
    errors::ServiceError,
};
use sea_orm::{ConnectionTrait, EntityTrait};
use uuid::Uuid;

/// Shared actor gate: every entry point that touches vendor stock requires an
/// existing, active holder of the salesperson role.
pub(crate) async fn ensure_active_salesperson<C: ConnectionTrait>(
    conn: &C,
    salesperson_id: Uuid,
) -> Result<salesperson::Model, ServiceError> {
    let actor = Salesperson::find_by_id(salesperson_id)
        .one(conn)
        .await?
        .ok_or(ServiceError::SalespersonNotFound(salesperson_id))?;

    if !actor.is_active || actor.role != Role::Salesperson {
        return Err(ServiceError::NotASalesperson(salesperson_id));
    }

    Ok(actor)
}
