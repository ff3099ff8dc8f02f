//! 计价领域服务
//!
//! 纯函数、同步、无共享可变状态，可在任意并发请求中直接调用。
//! 外部调用（税号核验、持久化）必须在进入这些服务之前完成

mod pricing_engine;
mod reconciliation;
mod shipping_resolver;
mod vat_classifier;
mod vat_verifier;

pub use pricing_engine::*;
pub use reconciliation::*;
pub use shipping_resolver::*;
pub use vat_classifier::*;
pub use vat_verifier::*;
