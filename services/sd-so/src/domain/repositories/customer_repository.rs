//! 客户仓储接口

use async_trait::async_trait;
use sillon_common::TenantId;
use sillon_errors::AppResult;

use crate::domain::entities::Customer;
use crate::domain::value_objects::CustomerId;

/// 客户仓储接口
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// 根据 ID 查找客户
    async fn find_by_id(
        &self,
        id: &CustomerId,
        tenant_id: &TenantId,
    ) -> AppResult<Option<Customer>>;
}
