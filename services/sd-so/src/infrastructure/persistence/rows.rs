//! 数据库行映射结构

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// 客户数据库行
#[derive(Debug, FromRow)]
pub struct CustomerRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub country: String,
    pub vat_number: Option<String>,
    pub customer_type: String,
    pub discount_rate: Option<Decimal>,
    pub payment_terms_days: Option<i32>,
}

/// 运费区域（连同费率）数据库行
#[derive(Debug, FromRow)]
pub struct ShippingZoneRow {
    pub id: Uuid,
    pub name: String,
    pub countries: Vec<String>,
    pub rate_type: String,
    pub base_price: Decimal,
    pub per_kg_price: Option<Decimal>,
    pub per_item_price: Option<Decimal>,
    pub free_above: Option<Decimal>,
}

/// 订单数据库行
#[derive(Debug, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub channel: String,
    pub status: String,
    pub currency: String,
    pub shipping_country: String,
    pub shipping_method_name: Option<String>,
    pub shipping_method_price: Option<Decimal>,
    pub order_level_discount: Decimal,
    pub order_date: NaiveDate,
    pub payment_terms_days: i32,
    pub due_date: NaiveDate,
    pub subtotal_gross: Decimal,
    pub discount_amount: Decimal,
    pub subtotal: Decimal,
    pub vat_rate_percent: Decimal,
    pub vat_label: String,
    pub vat_treatment: String,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    pub shipping_is_free: bool,
    pub shipping_zone_name: String,
    pub total: Decimal,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// 订单明细数据库行
#[derive(Debug, FromRow)]
pub struct OrderItemRow {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub weight_kg: Option<Decimal>,
    pub position: i32,
}
