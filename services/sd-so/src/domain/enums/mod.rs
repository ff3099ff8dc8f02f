//! 枚举类型

mod customer_type;
mod order_channel;
mod order_status;
mod rate_type;
mod vat_treatment;

pub use customer_type::*;
pub use order_channel::*;
pub use order_status::*;
pub use rate_type::*;
pub use vat_treatment::*;
