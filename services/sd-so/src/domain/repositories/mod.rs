//! 仓储接口

mod customer_repository;
mod order_repository;
mod shipping_zone_repository;

pub use customer_repository::*;
pub use order_repository::*;
pub use shipping_zone_repository::*;
