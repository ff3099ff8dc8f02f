//! Order handler
//!
//! 负责外部调用（仓储、税号核验），计价本身交给领域服务

use std::sync::Arc;

use sillon_common::TenantId;
use sillon_errors::{AppError, AppResult};
use tracing::{info, warn};

use crate::domain::entities::{
    Customer, LineItem, Order, OrderHeader, ShippingSelection, ShippingZone, validate_zones,
};
use crate::domain::enums::OrderChannel;
use crate::domain::repositories::{CustomerRepository, OrderRepository, ShippingZoneRepository};
use crate::domain::services::{OrderReconciler, PricingContext, PricingEngine, VatVerifier};
use crate::domain::value_objects::{CustomerId, PriceBreakdown, PricingSettings};
use crate::error::PricingError;
use crate::infrastructure::observability::{
    record_minimum_order_rejected, record_order_created, record_quote, record_reconciliation,
    record_zone_not_found,
};

use super::commands::*;
use super::quote::{resolve_currency, validate_lines};
use super::vat_verification::{VatStatus, VatVerificationPolicy};

/// 已计价的订单草稿
struct PricedDraft {
    customer: Customer,
    lines: Vec<LineItem>,
    shipping_country: String,
    breakdown: PriceBreakdown,
}

pub struct OrderHandler {
    order_repo: Arc<dyn OrderRepository>,
    zone_repo: Arc<dyn ShippingZoneRepository>,
    customer_repo: Arc<dyn CustomerRepository>,
    vat_verifier: Option<Arc<dyn VatVerifier>>,
    vat_policy: VatVerificationPolicy,
    engine: PricingEngine,
}

impl OrderHandler {
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        zone_repo: Arc<dyn ShippingZoneRepository>,
        customer_repo: Arc<dyn CustomerRepository>,
        settings: PricingSettings,
        vat_policy: VatVerificationPolicy,
    ) -> Self {
        Self {
            order_repo,
            zone_repo,
            customer_repo,
            vat_verifier: None,
            vat_policy,
            engine: PricingEngine::new(settings),
        }
    }

    /// 接入外部税号核验服务；未接入时所有税号按未核验处理
    pub fn with_vat_verifier(mut self, verifier: Arc<dyn VatVerifier>) -> Self {
        self.vat_verifier = Some(verifier);
        self
    }

    pub fn settings(&self) -> &PricingSettings {
        self.engine.settings()
    }

    // ========== 计价 ==========

    /// 计价（不落库）
    pub async fn quote(&self, cmd: &QuoteOrderCommand) -> AppResult<PriceBreakdown> {
        let draft = self.price_draft(cmd, "quote").await?;
        Ok(draft.breakdown)
    }

    // ========== 下单 ==========

    /// 创建订单
    ///
    /// Pro 门户订单须为专业客户且达到最低起订金额
    pub async fn create_order(&self, cmd: CreateOrderCommand) -> AppResult<Order> {
        info!(
            tenant_id = %cmd.quote.tenant_id,
            customer_id = %cmd.quote.customer_id,
            channel = cmd.channel.as_str(),
            "Creating order"
        );

        let draft = self.price_draft(&cmd.quote, cmd.channel.as_str()).await?;

        if cmd.channel == OrderChannel::ProPortal {
            if !draft.customer.customer_type.is_professional() {
                return Err(AppError::forbidden(
                    "only professional customers can order through the Pro portal",
                ));
            }
            if self.engine.below_minimum_order(&draft.breakdown) {
                record_minimum_order_rejected();
                return Err(AppError::failed_precondition(format!(
                    "minimum order amount is {} {} (excluding VAT), current subtotal is {}",
                    self.settings().minimum_pro_order_amount,
                    draft.breakdown.currency,
                    draft.breakdown.subtotal_net
                )));
            }
        }

        let header = OrderHeader {
            customer_id: draft.customer.id.clone(),
            channel: cmd.channel,
            currency: draft.breakdown.currency.clone(),
            shipping_country: draft.shipping_country,
            shipping: cmd.quote.shipping.clone(),
            order_level_discount: cmd.quote.order_level_discount,
            order_date: cmd.order_date,
            payment_terms_days: draft.customer.payment_terms_days(),
        };
        let order = Order::new(
            cmd.quote.tenant_id.clone(),
            header,
            &draft.lines,
            draft.breakdown,
            cmd.user_id,
        );

        self.order_repo.create(&order).await?;
        record_order_created(cmd.channel.as_str());

        info!(
            order_id = %order.id(),
            total = %order.breakdown().total,
            items = order.items().len(),
            "Order created"
        );
        Ok(order)
    }

    // ========== 修改明细 ==========

    /// 修改订单明细并重新计价
    ///
    /// 沿用订单上保存的税率与运费来源；明细变更与新的合计在同一事务中写入
    pub async fn edit_order_items(&self, cmd: EditOrderItemsCommand) -> AppResult<Order> {
        info!(
            tenant_id = %cmd.tenant_id,
            order_id = %cmd.order_id,
            lines = cmd.lines.len(),
            "Editing order items"
        );

        let mut order = self
            .order_repo
            .find_by_id(&cmd.order_id, &cmd.tenant_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("order {} not found", cmd.order_id)))?;
        order.ensure_editable()?;

        let customer = self.load_customer(order.customer_id(), &cmd.tenant_id).await?;

        let edited = cmd
            .lines
            .into_iter()
            .map(EditedLineInput::into_edited_line)
            .collect::<AppResult<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        let header = order.header().clone();
        let zones = self.zones_for(&cmd.tenant_id, &header.shipping).await?;
        let ctx = PricingContext::new(&customer, &zones, header.currency.clone())
            .with_shipping_country(&header.shipping_country)
            .with_order_level_discount(header.order_level_discount)
            .with_vat_override(order.breakdown().vat_override());

        let plan = OrderReconciler::reconcile(&self.engine, order.items(), &edited, &ctx)
            .map_err(|e| self.pricing_failure(e, &header.shipping_country))?;

        if !plan.has_item_changes() && plan.new_breakdown == *order.breakdown() {
            info!(order_id = %order.id(), "Order items unchanged, nothing to write");
            return Ok(order);
        }

        if let Err(e) = self
            .order_repo
            .apply_item_changes(&order, &plan)
            .await
        {
            record_reconciliation(false, 0, 0, 0);
            warn!(order_id = %order.id(), error = %e, "Order item reconciliation rolled back");
            return Err(e);
        }

        record_reconciliation(
            true,
            plan.to_create.len(),
            plan.to_update.len(),
            plan.to_delete.len(),
        );
        order.apply_reconciliation(&plan, cmd.user_id);

        info!(
            order_id = %order.id(),
            created = plan.to_create.len(),
            updated = plan.to_update.len(),
            deleted = plan.to_delete.len(),
            total = %order.breakdown().total,
            "Order items reconciled"
        );
        Ok(order)
    }

    // ========== 内部方法 ==========

    async fn price_draft(&self, cmd: &QuoteOrderCommand, channel: &str) -> AppResult<PricedDraft> {
        cmd.validate()?;
        let lines = validate_lines(cmd.lines.clone())?;
        let customer = self.load_customer(&cmd.customer_id, &cmd.tenant_id).await?;
        let zones = self.zones_for(&cmd.tenant_id, &cmd.shipping).await?;
        let currency = resolve_currency(cmd.currency.as_deref(), self.settings())?;
        let shipping_country = cmd
            .shipping_country
            .clone()
            .unwrap_or_else(|| customer.country.clone());

        let vat_status = self.verify_vat(&customer).await;

        let ctx = PricingContext::new(&customer, &zones, currency)
            .with_shipping_country(&shipping_country)
            .with_order_level_discount(cmd.order_level_discount)
            .with_vat_validated(vat_status.is_validated());

        let mut breakdown = self
            .engine
            .price(&lines, &ctx)
            .map_err(|e| self.pricing_failure(e, &shipping_country))?;
        breakdown.warnings.extend(vat_status.warning());

        for warning in &breakdown.warnings {
            warn!(customer_id = %customer.id, ?warning, "Priced with degraded input");
        }
        record_quote(channel, &breakdown);

        Ok(PricedDraft {
            customer,
            lines,
            shipping_country,
            breakdown,
        })
    }

    async fn load_customer(
        &self,
        id: &CustomerId,
        tenant_id: &TenantId,
    ) -> AppResult<Customer> {
        self.customer_repo
            .find_by_id(id, tenant_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("customer {} not found", id)))
    }

    /// 本次计价使用的区域表，配置有误时拒绝计价
    async fn zones_for(
        &self,
        tenant_id: &TenantId,
        selection: &ShippingSelection,
    ) -> AppResult<Vec<ShippingZone>> {
        let configured = if selection.requires_zone_table() {
            self.zone_repo.list_with_rates(tenant_id).await?
        } else {
            Vec::new()
        };
        let zones = selection.zones(&configured);
        validate_zones(&zones)?;
        Ok(zones)
    }

    async fn verify_vat(&self, customer: &Customer) -> VatStatus {
        let Some(vat_number) =
            VatVerificationPolicy::candidate(customer, &self.settings().seller_country)
        else {
            return VatStatus::NotApplicable;
        };

        match &self.vat_verifier {
            Some(verifier) => self.vat_policy.verify(verifier.as_ref(), &vat_number).await,
            None => VatStatus::Unavailable {
                reason: "no VAT verification service configured".to_string(),
            },
        }
    }

    fn pricing_failure(&self, err: PricingError, destination: &str) -> AppError {
        if let PricingError::ZoneNotFound { .. } = err {
            record_zone_not_found(destination);
            warn!(destination, "No shipping zone matches destination");
        }
        err.into()
    }
}
