//! 订单聚合根

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sillon_common::{AuditInfo, TenantId, UserId};
use sillon_domain_core::{AggregateRoot, Currency, Entity};
use sillon_errors::{AppError, AppResult};

use super::{LineItem, ShippingSelection};
use crate::domain::enums::{OrderChannel, OrderStatus};
use crate::domain::services::ReconciliationPlan;
use crate::domain::value_objects::{CustomerId, OrderId, OrderItemId, PriceBreakdown, ProductId};
use crate::error::PricingError;

/// 订单明细
///
/// 下单时订单行的快照，之后只能通过明细对账修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    id: OrderItemId,
    product_id: Option<ProductId>,
    title: String,
    unit_price: Decimal,
    quantity: u32,
    weight_kg: Option<Decimal>,
    position: i32,
}

impl OrderItem {
    pub fn from_line(id: OrderItemId, line: &LineItem, position: i32) -> Self {
        Self {
            id,
            product_id: line.product_id().cloned(),
            title: line.title().to_string(),
            unit_price: line.unit_price(),
            quantity: line.quantity(),
            weight_kg: line.weight_kg(),
            position,
        }
    }

    /// 从数据库加载
    pub fn from_parts(
        id: OrderItemId,
        product_id: Option<ProductId>,
        title: String,
        unit_price: Decimal,
        quantity: u32,
        weight_kg: Option<Decimal>,
        position: i32,
    ) -> Self {
        Self {
            id,
            product_id,
            title,
            unit_price,
            quantity,
            weight_kg,
            position,
        }
    }

    pub fn id(&self) -> &OrderItemId {
        &self.id
    }

    pub fn product_id(&self) -> Option<&ProductId> {
        self.product_id.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn weight_kg(&self) -> Option<Decimal> {
        self.weight_kg
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    /// 还原为订单行
    ///
    /// 明细写入前已校验过，这里重新走一遍校验以防数据库里有脏数据
    pub fn to_line_item(&self) -> Result<LineItem, PricingError> {
        LineItem::new(
            self.product_id.clone(),
            self.title.clone(),
            self.unit_price,
            self.quantity,
            self.weight_kg,
        )
    }

    /// 与给定订单行内容是否一致
    pub fn same_content(&self, line: &LineItem) -> bool {
        self.product_id.as_ref() == line.product_id()
            && self.title == line.title()
            && self.unit_price == line.unit_price()
            && self.quantity == line.quantity()
            && self.weight_kg == line.weight_kg()
    }

    fn overwrite(&mut self, line: &LineItem) {
        self.product_id = line.product_id().cloned();
        self.title = line.title().to_string();
        self.unit_price = line.unit_price();
        self.quantity = line.quantity();
        self.weight_kg = line.weight_kg();
    }
}

/// 订单抬头
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHeader {
    pub customer_id: CustomerId,
    pub channel: OrderChannel,
    pub currency: Currency,
    /// 收货国家（原样保存，计价时再规范化）
    pub shipping_country: String,
    pub shipping: ShippingSelection,
    /// 订单级固定折扣
    pub order_level_discount: Decimal,
    pub order_date: NaiveDate,
    pub payment_terms_days: u32,
}

/// 订单聚合根
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    tenant_id: TenantId,
    header: OrderHeader,
    status: OrderStatus,
    /// 付款到期日 = 下单日 + 账期
    due_date: NaiveDate,
    /// 最近一次计价结果，单据直接读取
    breakdown: PriceBreakdown,
    items: Vec<OrderItem>,
    /// 乐观锁版本号，每次明细对账 +1
    version: i32,
    audit_info: AuditInfo,
}

impl Order {
    /// 创建新订单，明细按输入顺序编号
    pub fn new(
        tenant_id: TenantId,
        header: OrderHeader,
        lines: &[LineItem],
        breakdown: PriceBreakdown,
        created_by: Option<UserId>,
    ) -> Self {
        let items = lines
            .iter()
            .zip(1..)
            .map(|(line, position)| OrderItem::from_line(OrderItemId::new(), line, position))
            .collect();
        let due_date = due_date(header.order_date, header.payment_terms_days);

        Self {
            id: OrderId::new(),
            tenant_id,
            header,
            status: OrderStatus::Draft,
            due_date,
            breakdown,
            items,
            version: 1,
            audit_info: AuditInfo::new(created_by),
        }
    }

    /// 从数据库加载
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: OrderId,
        tenant_id: TenantId,
        header: OrderHeader,
        status: OrderStatus,
        due_date: NaiveDate,
        breakdown: PriceBreakdown,
        mut items: Vec<OrderItem>,
        version: i32,
        audit_info: AuditInfo,
    ) -> Self {
        items.sort_by_key(|item| item.position);
        Self {
            id,
            tenant_id,
            header,
            status,
            due_date,
            breakdown,
            items,
            version,
            audit_info,
        }
    }

    // ========== Getters ==========

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn header(&self) -> &OrderHeader {
        &self.header
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.header.customer_id
    }

    pub fn channel(&self) -> OrderChannel {
        self.header.channel
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn breakdown(&self) -> &PriceBreakdown {
        &self.breakdown
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn item(&self, id: &OrderItemId) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.id == *id)
    }

    /// 新明细使用的下一个序号
    pub fn next_position(&self) -> i32 {
        self.items.iter().map(|i| i.position).max().unwrap_or(0) + 1
    }

    // ========== 业务方法 ==========

    pub fn is_editable(&self) -> bool {
        self.status.is_editable()
    }

    pub fn ensure_editable(&self) -> AppResult<()> {
        if !self.is_editable() {
            return Err(AppError::failed_precondition(format!(
                "order {} is {} and its items can no longer be edited",
                self.id,
                self.status.as_str()
            )));
        }
        Ok(())
    }

    /// 状态流转
    pub fn transition_to(&mut self, next: OrderStatus, user: Option<UserId>) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::failed_precondition(format!(
                "cannot move order {} from {} to {}",
                self.id,
                self.status.as_str(),
                next.as_str()
            )));
        }
        self.status = next;
        self.audit_info.touch(user);
        Ok(())
    }

    /// 应用对账结果（仓储事务提交成功后调用）
    pub fn apply_reconciliation(&mut self, plan: &ReconciliationPlan, user: Option<UserId>) {
        self.items.retain(|item| !plan.to_delete.contains(&item.id));

        for update in &plan.to_update {
            if let Some(item) = self.items.iter_mut().find(|i| i.id == update.id) {
                item.overwrite(&update.line);
            }
        }

        for insert in &plan.to_create {
            self.items.push(insert.to_order_item());
        }
        self.items.sort_by_key(|item| item.position);

        self.breakdown = plan.new_breakdown.clone();
        self.version += 1;
        self.audit_info.touch(user);
    }
}

fn due_date(order_date: NaiveDate, payment_terms_days: u32) -> NaiveDate {
    order_date
        .checked_add_days(Days::new(u64::from(payment_terms_days)))
        .unwrap_or(order_date)
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for Order {
    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enums::VatTreatment;
    use rust_decimal_macros::dec;

    fn breakdown() -> PriceBreakdown {
        PriceBreakdown {
            subtotal_gross: dec!(40.00),
            discount_amount: dec!(0.00),
            subtotal_net: dec!(40.00),
            vat_rate_percent: dec!(20),
            vat_amount: dec!(8.00),
            vat_label: "TVA 20%".to_string(),
            vat_treatment: VatTreatment::Domestic,
            shipping_amount: dec!(6.50),
            shipping_is_free: false,
            shipping_zone_name: "Colissimo".to_string(),
            total: dec!(54.50),
            currency: Currency::eur(),
            warnings: Vec::new(),
        }
    }

    fn header(terms: u32) -> OrderHeader {
        OrderHeader {
            customer_id: CustomerId::new(),
            channel: OrderChannel::Manual,
            currency: Currency::eur(),
            shipping_country: "FR".to_string(),
            shipping: ShippingSelection::Zones,
            order_level_discount: Decimal::ZERO,
            order_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            payment_terms_days: terms,
        }
    }

    fn lines() -> Vec<LineItem> {
        vec![
            LineItem::new(None, "A Love Supreme", dec!(25), 1, Some(dec!(0.3))).unwrap(),
            LineItem::new(None, "Mingus Ah Um", dec!(15), 1, None).unwrap(),
        ]
    }

    #[test]
    fn test_new_order_positions_and_due_date() {
        let order = Order::new(TenantId::new(), header(30), &lines(), breakdown(), None);

        assert_eq!(order.status(), OrderStatus::Draft);
        assert_eq!(order.items().len(), 2);
        assert_eq!(order.items()[0].position(), 1);
        assert_eq!(order.items()[1].position(), 2);
        assert_eq!(order.next_position(), 3);
        assert_eq!(order.due_date(), NaiveDate::from_ymd_opt(2026, 2, 14).unwrap());
    }

    #[test]
    fn test_immediate_payment() {
        let order = Order::new(TenantId::new(), header(0), &lines(), breakdown(), None);
        assert_eq!(order.due_date(), order.header().order_date);
    }

    #[test]
    fn test_editability_follows_status() {
        let mut order = Order::new(TenantId::new(), header(0), &lines(), breakdown(), None);
        assert!(order.ensure_editable().is_ok());

        order.transition_to(OrderStatus::Confirmed, None).unwrap();
        assert!(order.ensure_editable().is_ok());

        order.transition_to(OrderStatus::Shipped, None).unwrap();
        assert!(order.ensure_editable().is_err());
        assert!(order.transition_to(OrderStatus::Draft, None).is_err());
    }

    #[test]
    fn test_reconciliation_bumps_version() {
        let mut order = Order::new(TenantId::new(), header(0), &lines(), breakdown(), None);
        assert_eq!(order.version(), 1);

        let plan = ReconciliationPlan {
            to_create: Vec::new(),
            to_update: Vec::new(),
            to_delete: vec![order.items()[1].id().clone()],
            new_breakdown: breakdown(),
        };
        order.apply_reconciliation(&plan, None);

        assert_eq!(order.version(), 2);
        assert_eq!(order.items().len(), 1);
    }

    #[test]
    fn test_item_roundtrips_to_line() {
        let order = Order::new(TenantId::new(), header(0), &lines(), breakdown(), None);
        let item = &order.items()[0];
        let line = item.to_line_item().unwrap();
        assert!(item.same_content(&line));
        assert_eq!(line.title(), "A Love Supreme");
    }
}
