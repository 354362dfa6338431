//! SeaORM entity definitions for the order and stock ledger.

pub mod order;
pub mod order_line;
pub mod outlet;
pub mod payment;
pub mod product;
pub mod promotion;
pub mod promotion_product;
pub mod salesperson;
pub mod stock_movement;
pub mod vendor_stock;
pub mod visit;
