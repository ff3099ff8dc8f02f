//! 运费区域仓储接口

use async_trait::async_trait;
use sillon_common::TenantId;
use sillon_errors::AppResult;

use crate::domain::entities::ShippingZone;

/// 运费区域仓储接口
#[async_trait]
pub trait ShippingZoneRepository: Send + Sync {
    /// 按操作员维护的顺序返回区域及其费率
    async fn list_with_rates(&self, tenant_id: &TenantId) -> AppResult<Vec<ShippingZone>>;
}
