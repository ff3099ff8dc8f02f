//! 订单明细对账
//!
//! 比较修改后的订单行与已保存的明细，得出新增、更新、删除指令，
//! 并对保留下来的明细重新计价

use std::collections::HashSet;

use serde::Serialize;

use super::{PricingContext, PricingEngine};
use crate::domain::entities::{LineItem, OrderItem};
use crate::domain::value_objects::{OrderItemId, PriceBreakdown};
use crate::error::PricingError;

/// 修改后的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditedLine {
    /// 新增
    Created(LineItem),
    /// 修改已有明细
    Updated { id: OrderItemId, line: LineItem },
    /// 删除已有明细
    Deleted(OrderItemId),
    /// 保持不变
    Unchanged(OrderItemId),
}

impl EditedLine {
    fn existing_id(&self) -> Option<&OrderItemId> {
        match self {
            EditedLine::Created(_) => None,
            EditedLine::Updated { id, .. } | EditedLine::Deleted(id) | EditedLine::Unchanged(id) => {
                Some(id)
            }
        }
    }
}

/// 待插入的明细
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemInsert {
    pub id: OrderItemId,
    pub position: i32,
    pub line: LineItem,
}

impl OrderItemInsert {
    pub fn to_order_item(&self) -> OrderItem {
        OrderItem::from_line(self.id.clone(), &self.line, self.position)
    }
}

/// 待更新的明细
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemUpdate {
    pub id: OrderItemId,
    pub line: LineItem,
}

/// 对账结果
///
/// 明细变更与 `new_breakdown` 必须在同一事务中写入
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationPlan {
    pub to_create: Vec<OrderItemInsert>,
    pub to_update: Vec<OrderItemUpdate>,
    pub to_delete: Vec<OrderItemId>,
    pub new_breakdown: PriceBreakdown,
}

impl ReconciliationPlan {
    /// 是否有明细需要写入
    pub fn has_item_changes(&self) -> bool {
        !(self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty())
    }
}

/// 明细对账
pub struct OrderReconciler;

impl OrderReconciler {
    /// 生成对账结果
    ///
    /// 未在修改中提及的已有明细视为不变；内容未变的 `Updated` 不产生写入
    pub fn reconcile(
        engine: &PricingEngine,
        existing: &[OrderItem],
        edited: &[EditedLine],
        ctx: &PricingContext<'_>,
    ) -> Result<ReconciliationPlan, PricingError> {
        let known: HashSet<&OrderItemId> = existing.iter().map(OrderItem::id).collect();
        let mut seen: HashSet<&OrderItemId> = HashSet::new();
        for id in edited.iter().filter_map(EditedLine::existing_id) {
            if !known.contains(id) {
                return Err(PricingError::UnknownOrderItem(id.clone()));
            }
            if !seen.insert(id) {
                return Err(PricingError::DuplicateOrderItem(id.clone()));
            }
        }

        let mut next_position = existing.iter().map(OrderItem::position).max().unwrap_or(0) + 1;
        let mut to_create = Vec::new();
        let mut to_update = Vec::new();
        let mut to_delete = Vec::new();

        for line in edited {
            match line {
                EditedLine::Created(line) => {
                    to_create.push(OrderItemInsert {
                        id: OrderItemId::new(),
                        position: next_position,
                        line: line.clone(),
                    });
                    next_position += 1;
                }
                EditedLine::Updated { id, line } => {
                    let changed = existing
                        .iter()
                        .find(|item| item.id() == id)
                        .is_some_and(|item| !item.same_content(line));
                    if changed {
                        to_update.push(OrderItemUpdate {
                            id: id.clone(),
                            line: line.clone(),
                        });
                    }
                }
                EditedLine::Deleted(id) => to_delete.push(id.clone()),
                EditedLine::Unchanged(_) => {}
            }
        }

        // 保留的明细：原顺序中未删除的（已应用修改），再接上新增的
        let mut surviving = Vec::with_capacity(existing.len() + to_create.len());
        let mut ordered: Vec<&OrderItem> = existing.iter().collect();
        ordered.sort_by_key(|item| item.position());
        for item in ordered {
            if to_delete.contains(item.id()) {
                continue;
            }
            let edited_line = edited.iter().find_map(|line| match line {
                EditedLine::Updated { id, line } if id == item.id() => Some(line.clone()),
                _ => None,
            });
            match edited_line {
                Some(line) => surviving.push(line),
                None => surviving.push(item.to_line_item()?),
            }
        }
        surviving.extend(to_create.iter().map(|insert| insert.line.clone()));

        let new_breakdown = engine.price(&surviving, ctx)?;

        Ok(ReconciliationPlan {
            to_create,
            to_update,
            to_delete,
            new_breakdown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Customer, ShippingRate, ShippingZone};
    use crate::domain::enums::CustomerType;
    use crate::domain::value_objects::PricingSettings;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use sillon_common::TenantId;
    use sillon_domain_core::Currency;

    fn line(title: &str, price: Decimal, quantity: u32) -> LineItem {
        LineItem::new(None, title, price, quantity, Some(dec!(0.3))).unwrap()
    }

    fn existing() -> Vec<OrderItem> {
        vec![
            OrderItem::from_line(OrderItemId::new(), &line("A", dec!(20), 1), 1),
            OrderItem::from_line(OrderItemId::new(), &line("B", dec!(15), 2), 2),
        ]
    }

    fn setup() -> (PricingEngine, Customer, Vec<ShippingZone>) {
        let customer = Customer::new(TenantId::new(), "Client", "FR", CustomerType::Particulier);
        let zones = vec![ShippingZone::new(
            "World",
            &["*"],
            ShippingRate::flat(dec!(6.50)).with_free_above(dec!(100)),
        )];
        (PricingEngine::new(PricingSettings::default()), customer, zones)
    }

    #[test]
    fn test_round_trip() {
        let (engine, customer, zones) = setup();
        let ctx = PricingContext::new(&customer, &zones, Currency::eur());
        let items = existing();
        let a = items[0].id().clone();
        let b = items[1].id().clone();

        let a_updated = line("A", dec!(20), 3);
        let c = line("C", dec!(30), 1);
        let edited = vec![
            EditedLine::Updated {
                id: a.clone(),
                line: a_updated.clone(),
            },
            EditedLine::Deleted(b.clone()),
            EditedLine::Created(c.clone()),
        ];

        let plan = OrderReconciler::reconcile(&engine, &items, &edited, &ctx).unwrap();

        assert_eq!(plan.to_create.len(), 1);
        assert_eq!(plan.to_create[0].line, c);
        assert_eq!(plan.to_create[0].position, 3);
        assert_eq!(plan.to_update.len(), 1);
        assert_eq!(plan.to_update[0].id, a);
        assert_eq!(plan.to_delete, vec![b]);

        let fresh = engine.price(&[a_updated, c], &ctx).unwrap();
        assert_eq!(plan.new_breakdown, fresh);
        assert_eq!(plan.new_breakdown.subtotal_net, dec!(90.00));
    }

    #[test]
    fn test_noop_update_is_not_written() {
        let (engine, customer, zones) = setup();
        let ctx = PricingContext::new(&customer, &zones, Currency::eur());
        let items = existing();

        let edited = vec![EditedLine::Updated {
            id: items[0].id().clone(),
            line: line("A", dec!(20), 1),
        }];
        let plan = OrderReconciler::reconcile(&engine, &items, &edited, &ctx).unwrap();

        assert!(!plan.has_item_changes());
        assert_eq!(plan.new_breakdown.subtotal_net, dec!(50.00));
    }

    #[test]
    fn test_unmentioned_items_survive() {
        let (engine, customer, zones) = setup();
        let ctx = PricingContext::new(&customer, &zones, Currency::eur());
        let items = existing();

        let edited = vec![EditedLine::Unchanged(items[0].id().clone())];
        let plan = OrderReconciler::reconcile(&engine, &items, &edited, &ctx).unwrap();
        assert_eq!(plan.new_breakdown.subtotal_gross, dec!(50.00));
    }

    #[test]
    fn test_unknown_and_duplicate_ids() {
        let (engine, customer, zones) = setup();
        let ctx = PricingContext::new(&customer, &zones, Currency::eur());
        let items = existing();

        let stranger = OrderItemId::new();
        let err = OrderReconciler::reconcile(
            &engine,
            &items,
            &[EditedLine::Deleted(stranger.clone())],
            &ctx,
        )
        .unwrap_err();
        assert_eq!(err, PricingError::UnknownOrderItem(stranger));

        let a = items[0].id().clone();
        let err = OrderReconciler::reconcile(
            &engine,
            &items,
            &[EditedLine::Deleted(a.clone()), EditedLine::Unchanged(a.clone())],
            &ctx,
        )
        .unwrap_err();
        assert_eq!(err, PricingError::DuplicateOrderItem(a));
    }

    #[test]
    fn test_delete_everything() {
        let (engine, customer, zones) = setup();
        let ctx = PricingContext::new(&customer, &zones, Currency::eur());
        let items = existing();

        let edited: Vec<EditedLine> = items
            .iter()
            .map(|item| EditedLine::Deleted(item.id().clone()))
            .collect();
        let plan = OrderReconciler::reconcile(&engine, &items, &edited, &ctx).unwrap();

        assert_eq!(plan.to_delete.len(), 2);
        assert_eq!(plan.new_breakdown.subtotal_gross, dec!(0.00));
        assert_eq!(plan.new_breakdown.total, dec!(6.50));
    }
}
