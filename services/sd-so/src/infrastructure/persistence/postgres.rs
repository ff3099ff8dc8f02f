//! PostgreSQL repository implementation

use async_trait::async_trait;
use sillon_adapter_postgres::{IsolationLevel, TransactionManager};
use sillon_common::TenantId;
use sillon_domain_core::AggregateRoot;
use sillon_errors::{AppError, AppResult};
use sqlx::{PgConnection, PgPool};
use tracing::warn;
use uuid::Uuid;

use crate::domain::entities::{Customer, LineItem, Order, ShippingSelection, ShippingZone};
use crate::domain::repositories::{CustomerRepository, OrderRepository, ShippingZoneRepository};
use crate::domain::services::ReconciliationPlan;
use crate::domain::value_objects::{CustomerId, OrderId, PriceBreakdown};
use crate::error::PricingError;

use super::converters::{customer_from_row, order_from_rows, shipping_zone_from_row};
use super::rows::{CustomerRow, OrderItemRow, OrderRow, ShippingZoneRow};

// ============================================================================
// CustomerRepository 实现
// ============================================================================

pub struct PostgresCustomerRepository {
    pool: PgPool,
}

impl PostgresCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
    async fn find_by_id(
        &self,
        id: &CustomerId,
        tenant_id: &TenantId,
    ) -> AppResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT id, tenant_id, name, email, country, vat_number, customer_type,
                   discount_rate, payment_terms_days
            FROM customers
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(id.0)
        .bind(tenant_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load customer: {}", e)))?;

        row.map(customer_from_row).transpose()
    }
}

// ============================================================================
// ShippingZoneRepository 实现
// ============================================================================

pub struct PostgresShippingZoneRepository {
    pool: PgPool,
}

impl PostgresShippingZoneRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShippingZoneRepository for PostgresShippingZoneRepository {
    async fn list_with_rates(&self, tenant_id: &TenantId) -> AppResult<Vec<ShippingZone>> {
        let rows = sqlx::query_as::<_, ShippingZoneRow>(
            r#"
            SELECT z.id, z.name, z.countries,
                   r.rate_type, r.base_price, r.per_kg_price, r.per_item_price, r.free_above
            FROM shipping_zones z
            JOIN shipping_rates r ON r.zone_id = z.id
            WHERE z.tenant_id = $1
            ORDER BY z.position ASC
            "#,
        )
        .bind(tenant_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load shipping zones: {}", e)))?;

        rows.into_iter().map(shipping_zone_from_row).collect()
    }
}

// ============================================================================
// OrderRepository 实现
// ============================================================================

pub struct PostgresOrderRepository {
    transactions: TransactionManager,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            transactions: TransactionManager::new(pool),
        }
    }

    async fn insert_order(conn: &mut PgConnection, order: &Order) -> Result<(), sqlx::Error> {
        let header = order.header();
        let breakdown = order.breakdown();
        let (method_name, method_price) = match &header.shipping {
            ShippingSelection::Method(method) => (Some(method.name.as_str()), Some(method.price)),
            ShippingSelection::Zones => (None, None),
        };
        let audit = order.audit_info();

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, tenant_id, customer_id, channel, status, currency,
                shipping_country, shipping_method_name, shipping_method_price,
                order_level_discount, order_date, payment_terms_days, due_date,
                subtotal_gross, discount_amount, subtotal, vat_rate_percent, vat_label,
                vat_treatment, tax_amount, shipping_amount, shipping_is_free,
                shipping_zone_name, total, version, created_at, created_by, updated_at, updated_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                      $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29)
            "#,
        )
        .bind(order.id().0)
        .bind(order.tenant_id().0)
        .bind(header.customer_id.0)
        .bind(header.channel.as_str())
        .bind(order.status().as_str())
        .bind(header.currency.code())
        .bind(&header.shipping_country)
        .bind(method_name)
        .bind(method_price)
        .bind(header.order_level_discount)
        .bind(header.order_date)
        .bind(i32::try_from(header.payment_terms_days).unwrap_or(i32::MAX))
        .bind(order.due_date())
        .bind(breakdown.subtotal_gross)
        .bind(breakdown.discount_amount)
        .bind(breakdown.subtotal_net)
        .bind(breakdown.vat_rate_percent)
        .bind(&breakdown.vat_label)
        .bind(breakdown.vat_treatment.as_str())
        .bind(breakdown.vat_amount)
        .bind(breakdown.shipping_amount)
        .bind(breakdown.shipping_is_free)
        .bind(&breakdown.shipping_zone_name)
        .bind(breakdown.total)
        .bind(order.version())
        .bind(audit.created_at)
        .bind(audit.created_by.as_ref().map(|u| u.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.as_ref().map(|u| u.0))
        .execute(&mut *conn)
        .await?;

        for item in order.items() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, title, unit_price, quantity, weight_kg, position
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(item.id().0)
            .bind(order.id().0)
            .bind(item.product_id().map(|p| p.0))
            .bind(item.title())
            .bind(item.unit_price())
            .bind(quantity_column(item.quantity()))
            .bind(item.weight_kg())
            .bind(item.position())
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// 锁定订单行并确认版本号仍是读取时的值
    async fn lock_order_version(
        conn: &mut PgConnection,
        order: &Order,
    ) -> Result<(), ItemChangeError> {
        let current: Option<i32> = sqlx::query_scalar(
            "SELECT version FROM orders WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(order.id().0)
        .bind(order.tenant_id().0)
        .fetch_optional(&mut *conn)
        .await?;

        match current {
            Some(version) if version == order.version() => Ok(()),
            Some(version) => Err(ItemChangeError::Stale {
                expected: order.version(),
                found: version,
            }),
            None => Err(ItemChangeError::Sql(sqlx::Error::RowNotFound)),
        }
    }

    async fn write_item_changes(
        conn: &mut PgConnection,
        order_id: &OrderId,
        tenant_id: &TenantId,
        plan: &ReconciliationPlan,
    ) -> Result<(), sqlx::Error> {
        if !plan.to_delete.is_empty() {
            let ids: Vec<Uuid> = plan.to_delete.iter().map(|id| id.0).collect();
            sqlx::query("DELETE FROM order_items WHERE order_id = $1 AND id = ANY($2)")
                .bind(order_id.0)
                .bind(ids)
                .execute(&mut *conn)
                .await?;
        }

        for update in &plan.to_update {
            let result = sqlx::query(
                r#"
                UPDATE order_items
                SET product_id = $3, title = $4, unit_price = $5, quantity = $6, weight_kg = $7
                WHERE id = $1 AND order_id = $2
                "#,
            )
            .bind(update.id.0)
            .bind(order_id.0)
            .bind_line(&update.line)
            .execute(&mut *conn)
            .await?;
            ensure_one_row(result.rows_affected())?;
        }

        for insert in &plan.to_create {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, title, unit_price, quantity, weight_kg, position
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(insert.id.0)
            .bind(order_id.0)
            .bind_line(&insert.line)
            .bind(insert.position)
            .execute(&mut *conn)
            .await?;
        }

        let result = update_totals(conn, order_id, tenant_id, &plan.new_breakdown).await?;
        ensure_one_row(result)?;

        Ok(())
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn find_by_id(&self, id: &OrderId, tenant_id: &TenantId) -> AppResult<Option<Order>> {
        let pool = self.transactions.pool();

        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, tenant_id, customer_id, channel, status, currency,
                   shipping_country, shipping_method_name, shipping_method_price,
                   order_level_discount, order_date, payment_terms_days, due_date,
                   subtotal_gross, discount_amount, subtotal, vat_rate_percent, vat_label,
                   vat_treatment, tax_amount, shipping_amount, shipping_is_free,
                   shipping_zone_name, total, version, created_at, created_by, updated_at, updated_by
            FROM orders
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(id.0)
        .bind(tenant_id.0)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load order: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT id, product_id, title, unit_price, quantity, weight_kg, position
            FROM order_items
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(id.0)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load order items: {}", e)))?;

        order_from_rows(row, items).map(Some)
    }

    async fn create(&self, order: &Order) -> AppResult<()> {
        let mut tx = self.transactions.begin().await?;

        if let Err(e) = Self::insert_order(&mut *tx, order).await {
            warn!(order_id = %order.id(), error = %e, "Order insert failed");
            TransactionManager::rollback(tx).await?;
            return Err(AppError::database(format!("Failed to create order: {}", e)));
        }

        TransactionManager::commit(tx).await
    }

    async fn apply_item_changes(&self, order: &Order, plan: &ReconciliationPlan) -> AppResult<()> {
        let failed =
            |e: String| -> AppError { PricingError::ReconciliationTransactionFailed(e).into() };

        let mut tx = self
            .transactions
            .begin_with(IsolationLevel::RepeatableRead)
            .await
            .map_err(|e| failed(e.to_string()))?;

        // 行锁 + 版本号：读取之后被他人改过的订单不能再按旧快照写入
        let written = match Self::lock_order_version(&mut *tx, order).await {
            Ok(()) => Self::write_item_changes(&mut *tx, order.id(), order.tenant_id(), plan)
                .await
                .map_err(ItemChangeError::Sql),
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            warn!(order_id = %order.id(), error = %e, "Order item changes failed");
            // 回滚失败时连接被丢弃，事务同样不会提交
            let _ = TransactionManager::rollback(tx).await;
            return Err(failed(e.to_string()));
        }

        TransactionManager::commit(tx)
            .await
            .map_err(|e| failed(e.to_string()))
    }
}

/// 明细写入失败的原因
#[derive(Debug, thiserror::Error)]
enum ItemChangeError {
    #[error("order was modified concurrently (expected version {expected}, found {found})")]
    Stale { expected: i32, found: i32 },

    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

// ============================================================================
// 辅助函数
// ============================================================================

fn quantity_column(quantity: u32) -> i32 {
    i32::try_from(quantity).unwrap_or(i32::MAX)
}

fn ensure_one_row(rows_affected: u64) -> Result<(), sqlx::Error> {
    if rows_affected == 1 {
        Ok(())
    } else {
        Err(sqlx::Error::RowNotFound)
    }
}

async fn update_totals(
    conn: &mut PgConnection,
    order_id: &OrderId,
    tenant_id: &TenantId,
    breakdown: &PriceBreakdown,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET subtotal_gross = $3, discount_amount = $4, subtotal = $5,
            vat_rate_percent = $6, vat_label = $7, vat_treatment = $8, tax_amount = $9,
            shipping_amount = $10, shipping_is_free = $11, shipping_zone_name = $12,
            total = $13, version = version + 1, updated_at = NOW()
        WHERE id = $1 AND tenant_id = $2
        "#,
    )
    .bind(order_id.0)
    .bind(tenant_id.0)
    .bind(breakdown.subtotal_gross)
    .bind(breakdown.discount_amount)
    .bind(breakdown.subtotal_net)
    .bind(breakdown.vat_rate_percent)
    .bind(&breakdown.vat_label)
    .bind(breakdown.vat_treatment.as_str())
    .bind(breakdown.vat_amount)
    .bind(breakdown.shipping_amount)
    .bind(breakdown.shipping_is_free)
    .bind(&breakdown.shipping_zone_name)
    .bind(breakdown.total)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// 按固定顺序绑定订单行的五个字段
trait BindLine<'q> {
    fn bind_line(self, line: &'q LineItem) -> Self;
}

impl<'q> BindLine<'q> for sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    fn bind_line(self, line: &'q LineItem) -> Self {
        self.bind(line.product_id().map(|p| p.0))
            .bind(line.title())
            .bind(line.unit_price())
            .bind(quantity_column(line.quantity()))
            .bind(line.weight_kg())
    }
}
