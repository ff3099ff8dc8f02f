//! sd-so - 销售订单服务库
//!
//! 订单计价（增值税分类、运费解析、折扣与合计）以及订单明细对账

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::PricingError;
