//! Order commands

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sillon_common::{TenantId, UserId};
use sillon_errors::{AppError, AppResult};

use crate::domain::entities::{LineItemInput, ShippingSelection};
use crate::domain::enums::OrderChannel;
use crate::domain::services::EditedLine;
use crate::domain::value_objects::{CustomerId, OrderId, OrderItemId};

/// 计价命令
#[derive(Debug, Clone)]
pub struct QuoteOrderCommand {
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub lines: Vec<LineItemInput>,
    /// 收货国家，缺省为客户国家
    pub shipping_country: Option<String>,
    pub shipping: ShippingSelection,
    pub order_level_discount: Decimal,
    /// 币种，缺省为配置的默认币种
    pub currency: Option<String>,
}

impl QuoteOrderCommand {
    pub fn validate(&self) -> AppResult<()> {
        if self.lines.is_empty() {
            return Err(AppError::validation("an order needs at least one line"));
        }
        Ok(())
    }
}

/// 下单命令
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub quote: QuoteOrderCommand,
    pub user_id: Option<UserId>,
    pub channel: OrderChannel,
    pub order_date: NaiveDate,
}

/// 编辑界面提交的一行
///
/// 标记由界面维护，进入领域层前转换为 [`EditedLine`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditedLineInput {
    #[serde(default)]
    pub id: Option<OrderItemId>,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_deleted: bool,
    /// 行内容；已有行未修改时可省略
    #[serde(default)]
    pub line: Option<LineItemInput>,
}

impl EditedLineInput {
    /// 转换为领域变体
    ///
    /// 新增后又删除的行直接丢弃，返回 `None`
    pub fn into_edited_line(self) -> AppResult<Option<EditedLine>> {
        match (self.is_new, self.is_deleted, self.id) {
            (true, true, _) => Ok(None),
            (true, false, _) => {
                let line = self
                    .line
                    .ok_or_else(|| AppError::validation("a new line needs its content"))?;
                Ok(Some(EditedLine::Created(line.validate()?)))
            }
            (false, true, Some(id)) => Ok(Some(EditedLine::Deleted(id))),
            (false, false, Some(id)) => match self.line {
                Some(line) => Ok(Some(EditedLine::Updated {
                    id,
                    line: line.validate()?,
                })),
                None => Ok(Some(EditedLine::Unchanged(id))),
            },
            (false, _, None) => Err(AppError::validation(
                "an existing line must carry its item id",
            )),
        }
    }
}

/// 修改订单明细命令
#[derive(Debug, Clone)]
pub struct EditOrderItemsCommand {
    pub tenant_id: TenantId,
    pub user_id: Option<UserId>,
    pub order_id: OrderId,
    pub lines: Vec<EditedLineInput>,
}
