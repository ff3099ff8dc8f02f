//! 领域层
//!
//! 实体、值对象、枚举、计价服务与仓储接口

pub mod entities;
pub mod enums;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use enums::*;
pub use repositories::*;
pub use services::*;
pub use value_objects::*;
