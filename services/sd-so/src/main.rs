//! sd-so-quote - 报价命令行工具
//!
//! `sd-so-quote <request.json | ->` 读取计价请求并输出价格明细 JSON；
//! `sd-so-quote migrate` 对配置的数据库执行迁移

use std::io::Read;

use sd_so::application::QuoteRequest;
use sd_so::domain::{PricingEngine, PricingSettings};
use sd_so::infrastructure::persistence::migrations;
use sillon_adapter_postgres::{MigrationRunner, PostgresConfig, create_pool};
use sillon_config::AppConfig;
use tracing::info;

const USAGE: &str = "usage: sd-so-quote <request.json | -> | sd-so-quote migrate";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load("config")?;
    sillon_telemetry::init_from_config(&config.telemetry);

    match std::env::args().nth(1).as_deref() {
        Some("migrate") => migrate(&config).await,
        Some(source) => quote(&config, source),
        None => Err(USAGE.into()),
    }
}

fn quote(config: &AppConfig, source: &str) -> Result<(), Box<dyn std::error::Error>> {
    let settings = PricingSettings::try_from(&config.pricing)?;
    let engine = PricingEngine::new(settings);

    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(source)?
    };
    let request: QuoteRequest = serde_json::from_str(&raw)?;

    let breakdown = request.price(&engine)?;
    let totals = breakdown.document_totals();
    info!(
        subtotal = %totals.subtotal,
        tax = %totals.tax_amount,
        total = %totals.total,
        zone = %breakdown.shipping_zone_name,
        vat = %breakdown.vat_label,
        "Quote computed"
    );

    println!("{}", serde_json::to_string_pretty(&breakdown)?);
    Ok(())
}

async fn migrate(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let database = config
        .database
        .as_ref()
        .ok_or("database is not configured (set SILLON_DATABASE__URL)")?;
    let pool = create_pool(&PostgresConfig::from(database)).await?;

    let report = MigrationRunner::new(pool).run(&migrations()).await?;
    info!(
        applied = ?report.applied,
        skipped = report.skipped.len(),
        "Migrations finished"
    );
    Ok(())
}
