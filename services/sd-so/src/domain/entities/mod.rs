//! 实体与聚合根

mod customer;
mod line_item;
mod order;
mod shipping_zone;

pub use customer::*;
pub use line_item::*;
pub use order::*;
pub use shipping_zone::*;
