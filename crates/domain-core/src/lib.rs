//! domain-core - 跨 context 的领域核心类型
//!
//! 货币、金额舍入和聚合根 trait

mod entity;
mod money;

pub use entity::*;
pub use money::*;

pub use sillon_common::{AuditInfo, TenantId, UserId};
