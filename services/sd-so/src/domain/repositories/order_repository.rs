//! 订单仓储接口

use async_trait::async_trait;
use sillon_common::TenantId;
use sillon_errors::AppResult;

use crate::domain::entities::Order;
use crate::domain::services::ReconciliationPlan;
use crate::domain::value_objects::OrderId;

/// 订单仓储接口
///
/// 写操作都是事务性的：要么全部生效，要么保持原状
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 根据 ID 查找订单（含明细）
    async fn find_by_id(&self, id: &OrderId, tenant_id: &TenantId) -> AppResult<Option<Order>>;

    /// 保存新订单及其明细
    async fn create(&self, order: &Order) -> AppResult<()>;

    /// 应用对账结果：删除、更新、插入明细并写入新的价格明细
    ///
    /// `order` 是生成对账结果时读取的快照；存储中的版本号已变化时整体失败
    async fn apply_item_changes(&self, order: &Order, plan: &ReconciliationPlan) -> AppResult<()>;
}
