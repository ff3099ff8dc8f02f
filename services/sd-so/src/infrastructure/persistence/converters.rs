//! 数据库行到领域对象的转换

use std::str::FromStr;

use sillon_common::{AuditInfo, TenantId, UserId};
use sillon_domain_core::Currency;
use sillon_errors::{AppError, AppResult};

use crate::domain::entities::{
    Customer, Order, OrderHeader, OrderItem, ShippingMethod, ShippingRate, ShippingSelection,
    ShippingZone,
};
use crate::domain::enums::{CustomerType, OrderChannel, OrderStatus, RateType, VatTreatment};
use crate::domain::value_objects::{
    CustomerId, OrderId, OrderItemId, PriceBreakdown, ProductId, ShippingZoneId,
};

use super::rows::{CustomerRow, OrderItemRow, OrderRow, ShippingZoneRow};

fn parse_column<T: FromStr<Err = String>>(column: &str, value: &str) -> AppResult<T> {
    value
        .parse()
        .map_err(|e| AppError::internal(format!("corrupted column {}: {}", column, e)))
}

fn non_negative(column: &str, value: i32) -> AppResult<u32> {
    u32::try_from(value)
        .map_err(|_| AppError::internal(format!("corrupted column {}: {}", column, value)))
}

pub fn customer_from_row(row: CustomerRow) -> AppResult<Customer> {
    Ok(Customer {
        id: CustomerId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        name: row.name,
        email: row.email,
        country: row.country,
        vat_number: row.vat_number,
        customer_type: parse_column::<CustomerType>("customer_type", &row.customer_type)?,
        discount_rate: row.discount_rate,
        payment_terms_days: row
            .payment_terms_days
            .map(|days| non_negative("payment_terms_days", days))
            .transpose()?,
    })
}

pub fn shipping_zone_from_row(row: ShippingZoneRow) -> AppResult<ShippingZone> {
    Ok(ShippingZone {
        id: ShippingZoneId::from_uuid(row.id),
        name: row.name,
        countries: row.countries,
        rate: ShippingRate {
            rate_type: parse_column::<RateType>("rate_type", &row.rate_type)?,
            base_price: row.base_price,
            per_kg_price: row.per_kg_price,
            per_item_price: row.per_item_price,
            free_above: row.free_above,
        },
    })
}

pub fn order_item_from_row(row: OrderItemRow) -> AppResult<OrderItem> {
    Ok(OrderItem::from_parts(
        OrderItemId::from_uuid(row.id),
        row.product_id.map(ProductId::from_uuid),
        row.title,
        row.unit_price,
        non_negative("quantity", row.quantity)?,
        row.weight_kg,
        row.position,
    ))
}

pub fn order_from_rows(row: OrderRow, items: Vec<OrderItemRow>) -> AppResult<Order> {
    let currency = Currency::new(&row.currency)
        .map_err(|e| AppError::internal(format!("corrupted column currency: {}", e)))?;

    let shipping = match (row.shipping_method_name, row.shipping_method_price) {
        (Some(name), Some(price)) => ShippingSelection::Method(ShippingMethod::new(name, price)),
        _ => ShippingSelection::Zones,
    };

    let header = OrderHeader {
        customer_id: CustomerId::from_uuid(row.customer_id),
        channel: parse_column::<OrderChannel>("channel", &row.channel)?,
        currency: currency.clone(),
        shipping_country: row.shipping_country,
        shipping,
        order_level_discount: row.order_level_discount,
        order_date: row.order_date,
        payment_terms_days: non_negative("payment_terms_days", row.payment_terms_days)?,
    };

    let breakdown = PriceBreakdown {
        subtotal_gross: row.subtotal_gross,
        discount_amount: row.discount_amount,
        subtotal_net: row.subtotal,
        vat_rate_percent: row.vat_rate_percent,
        vat_amount: row.tax_amount,
        vat_label: row.vat_label,
        vat_treatment: parse_column::<VatTreatment>("vat_treatment", &row.vat_treatment)?,
        shipping_amount: row.shipping_amount,
        shipping_is_free: row.shipping_is_free,
        shipping_zone_name: row.shipping_zone_name,
        total: row.total,
        currency,
        warnings: Vec::new(),
    };

    let items = items
        .into_iter()
        .map(order_item_from_row)
        .collect::<AppResult<Vec<_>>>()?;

    let audit_info = AuditInfo {
        created_at: row.created_at,
        created_by: row.created_by.map(UserId::from_uuid),
        updated_at: row.updated_at,
        updated_by: row.updated_by.map(UserId::from_uuid),
    };

    Ok(Order::from_parts(
        OrderId::from_uuid(row.id),
        TenantId::from_uuid(row.tenant_id),
        header,
        parse_column::<OrderStatus>("status", &row.status)?,
        row.due_date,
        breakdown,
        items,
        row.version,
        audit_info,
    ))
}
