//! 测试用的内存仓储与税号核验桩

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sd_so::application::{OrderHandler, VatVerificationPolicy};
use sd_so::PricingError;
use sd_so::domain::{
    Customer, CustomerId, CustomerRepository, CustomerType, LineItemInput, Order, OrderId, OrderRepository,
    PricingSettings, RateType, ReconciliationPlan, ShippingRate, ShippingZone,
    ShippingZoneRepository, VatNumber, VatVerification, VatVerifier,
};
use sillon_common::{RetryConfig, TenantId};
use sillon_errors::{AppError, AppResult};
use tokio::sync::RwLock;

// ============================================================================
// 仓储
// ============================================================================

#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: RwLock<HashMap<CustomerId, Customer>>,
}

impl InMemoryCustomerRepository {
    pub async fn insert(&self, customer: Customer) {
        self.customers
            .write()
            .await
            .insert(customer.id.clone(), customer);
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn find_by_id(
        &self,
        id: &CustomerId,
        tenant_id: &TenantId,
    ) -> AppResult<Option<Customer>> {
        Ok(self
            .customers
            .read()
            .await
            .get(id)
            .filter(|c| c.tenant_id == *tenant_id)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryShippingZoneRepository {
    zones: RwLock<HashMap<TenantId, Vec<ShippingZone>>>,
}

impl InMemoryShippingZoneRepository {
    pub async fn set(&self, tenant_id: &TenantId, zones: Vec<ShippingZone>) {
        self.zones.write().await.insert(tenant_id.clone(), zones);
    }
}

#[async_trait]
impl ShippingZoneRepository for InMemoryShippingZoneRepository {
    async fn list_with_rates(&self, tenant_id: &TenantId) -> AppResult<Vec<ShippingZone>> {
        Ok(self
            .zones
            .read()
            .await
            .get(tenant_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<OrderId, Order>>,
    fail_next_apply: AtomicBool,
    apply_calls: AtomicU32,
}

impl InMemoryOrderRepository {
    pub async fn get(&self, id: &OrderId) -> Option<Order> {
        self.orders.read().await.get(id).cloned()
    }

    /// 直接写入（绕过创建校验），用于准备已发货等状态
    pub async fn put(&self, order: Order) {
        self.orders.write().await.insert(order.id().clone(), order);
    }

    /// 下一次明细写入模拟事务失败
    pub fn fail_next_apply(&self) {
        self.fail_next_apply.store(true, Ordering::SeqCst);
    }

    pub fn apply_calls(&self) -> u32 {
        self.apply_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, id: &OrderId, tenant_id: &TenantId) -> AppResult<Option<Order>> {
        Ok(self
            .orders
            .read()
            .await
            .get(id)
            .filter(|o| o.tenant_id() == tenant_id)
            .cloned())
    }

    async fn create(&self, order: &Order) -> AppResult<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(order.id()) {
            return Err(AppError::conflict("order already exists"));
        }
        orders.insert(order.id().clone(), order.clone());
        Ok(())
    }

    async fn apply_item_changes(&self, snapshot: &Order, plan: &ReconciliationPlan) -> AppResult<()> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_apply.swap(false, Ordering::SeqCst) {
            return Err(PricingError::ReconciliationTransactionFailed(
                "simulated constraint violation".to_string(),
            )
            .into());
        }

        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(snapshot.id())
            .filter(|o| o.tenant_id() == snapshot.tenant_id())
            .ok_or_else(|| AppError::not_found("order not found"))?;
        if order.version() != snapshot.version() {
            return Err(PricingError::ReconciliationTransactionFailed(format!(
                "order was modified concurrently (expected version {}, found {})",
                snapshot.version(),
                order.version()
            ))
            .into());
        }
        order.apply_reconciliation(plan, None);
        Ok(())
    }
}

// ============================================================================
// 税号核验桩
// ============================================================================

pub enum VerifierBehaviour {
    Valid,
    Invalid,
    Slow(Duration),
    Failing,
}

pub struct MockVatVerifier {
    behaviour: VerifierBehaviour,
    calls: AtomicU32,
}

impl MockVatVerifier {
    pub fn new(behaviour: VerifierBehaviour) -> Self {
        Self {
            behaviour,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VatVerifier for MockVatVerifier {
    async fn verify(&self, vat_number: &VatNumber) -> Result<VatVerification, PricingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            VerifierBehaviour::Valid => Ok(VatVerification {
                valid: true,
                name: Some(format!("Registered {}", vat_number.prefix())),
            }),
            VerifierBehaviour::Invalid => Ok(VatVerification {
                valid: false,
                name: None,
            }),
            VerifierBehaviour::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(VatVerification {
                    valid: true,
                    name: None,
                })
            }
            VerifierBehaviour::Failing => Err(PricingError::VatVerificationUnavailable(
                "connection refused".to_string(),
            )),
        }
    }
}

// ============================================================================
// 场景
// ============================================================================

pub struct Fixture {
    pub tenant_id: TenantId,
    pub customers: Arc<InMemoryCustomerRepository>,
    pub zones: Arc<InMemoryShippingZoneRepository>,
    pub orders: Arc<InMemoryOrderRepository>,
}

impl Fixture {
    pub async fn new() -> Self {
        let fixture = Self {
            tenant_id: TenantId::new(),
            customers: Arc::new(InMemoryCustomerRepository::default()),
            zones: Arc::new(InMemoryShippingZoneRepository::default()),
            orders: Arc::new(InMemoryOrderRepository::default()),
        };
        fixture.zones.set(&fixture.tenant_id, standard_zones()).await;
        fixture
    }

    pub async fn customer(&self, country: &str, customer_type: CustomerType) -> Customer {
        let customer = Customer::new(self.tenant_id.clone(), "Client", country, customer_type);
        self.customers.insert(customer.clone()).await;
        customer
    }

    pub async fn add_customer(&self, customer: Customer) -> Customer {
        self.customers.insert(customer.clone()).await;
        customer
    }

    pub fn handler(&self) -> OrderHandler {
        OrderHandler::new(
            self.orders.clone(),
            self.zones.clone(),
            self.customers.clone(),
            PricingSettings::default(),
            fast_policy(),
        )
    }
}

/// 测试用核验策略：超时 50ms，最多两次尝试
pub fn fast_policy() -> VatVerificationPolicy {
    VatVerificationPolicy::new(
        Duration::from_millis(50),
        RetryConfig::new(2, Duration::from_millis(5), Duration::from_millis(10)),
    )
}

/// France / EU / World 三个区域
pub fn standard_zones() -> Vec<ShippingZone> {
    vec![
        ShippingZone::new(
            "France",
            &["FR"],
            ShippingRate::flat(dec!(6.50)).with_free_above(dec!(50)),
        ),
        ShippingZone::new(
            "EU",
            &["DE", "BE", "IT", "ES", "NL"],
            ShippingRate {
                rate_type: RateType::Combined,
                base_price: dec!(5),
                per_kg_price: Some(dec!(2)),
                per_item_price: Some(dec!(1)),
                free_above: None,
            },
        ),
        ShippingZone::new(
            "World",
            &["*"],
            ShippingRate {
                rate_type: RateType::PerWeight,
                base_price: dec!(15),
                per_kg_price: Some(dec!(4)),
                per_item_price: None,
                free_above: Some(dec!(500)),
            },
        ),
    ]
}

/// 单价 20.00 的唱片若干张，每张 0.25kg
pub fn records(count: u32) -> Vec<LineItemInput> {
    (1..=count)
        .map(|n| LineItemInput {
            product_id: None,
            title: format!("LP {n}"),
            unit_price: dec!(20),
            quantity: 1,
            weight_kg: Some(dec!(0.25)),
        })
        .collect()
}

pub fn line(title: &str, unit_price: Decimal, quantity: i64) -> LineItemInput {
    LineItemInput {
        product_id: None,
        title: title.to_string(),
        unit_price,
        quantity,
        weight_kg: Some(dec!(0.25)),
    }
}
