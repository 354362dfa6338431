//! HTTP handlers. Thin adapters over the services: extract, validate,
//! delegate, wrap in the standard response envelope.

pub mod orders;
pub mod products;
pub mod stock;
