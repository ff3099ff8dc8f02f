//! 数据库迁移
//!
//! 迁移按版本顺序在各自的事务中执行，并记录在 `_migrations` 表中

use sillon_errors::{AppError, AppResult};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::TransactionManager;

const MIGRATION_TABLE: &str = "_migrations";

/// 迁移定义
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub name: String,
    pub up_sql: String,
    pub checksum: String,
}

impl Migration {
    pub fn new(version: i64, name: impl Into<String>, up_sql: impl Into<String>) -> Self {
        let up_sql = up_sql.into();
        let checksum = checksum(&up_sql);
        Self {
            version,
            name: name.into(),
            up_sql,
            checksum,
        }
    }
}

/// FNV-1a 64 位校验和，跨编译器版本稳定
fn checksum(sql: &str) -> String {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let hash = sql
        .bytes()
        .fold(OFFSET, |acc, b| (acc ^ u64::from(b)).wrapping_mul(PRIME));
    format!("{:016x}", hash)
}

/// 迁移结果
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    pub applied: Vec<i64>,
    pub skipped: Vec<i64>,
}

/// 迁移执行器
pub struct MigrationRunner {
    transactions: TransactionManager,
}

impl MigrationRunner {
    pub fn new(pool: PgPool) -> Self {
        Self {
            transactions: TransactionManager::new(pool),
        }
    }

    /// 应用所有未执行的迁移
    ///
    /// 已执行迁移的 SQL 被修改时报错，不会静默跳过
    pub async fn run(&self, migrations: &[Migration]) -> AppResult<MigrationReport> {
        self.init().await?;

        let applied: Vec<(i64, String)> = sqlx::query_as(&format!(
            "SELECT version, checksum FROM {MIGRATION_TABLE} ORDER BY version"
        ))
        .fetch_all(self.transactions.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to read migrations: {}", e)))?;

        let mut sorted: Vec<&Migration> = migrations.iter().collect();
        sorted.sort_by_key(|m| m.version);

        let mut report = MigrationReport::default();
        for migration in sorted {
            match applied.iter().find(|(version, _)| *version == migration.version) {
                Some((_, recorded)) if *recorded != migration.checksum => {
                    return Err(AppError::internal(format!(
                        "Migration {} ({}) was modified after being applied",
                        migration.version, migration.name
                    )));
                }
                Some(_) => report.skipped.push(migration.version),
                None => {
                    self.apply(migration).await?;
                    report.applied.push(migration.version);
                }
            }
        }

        if report.applied.is_empty() {
            info!("Database schema is up to date");
        }
        Ok(report)
    }

    async fn init(&self) -> AppResult<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {MIGRATION_TABLE} (
                version BIGINT PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                checksum VARCHAR(64) NOT NULL
            )
            "#
        ))
        .execute(self.transactions.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create migration table: {}", e)))?;
        Ok(())
    }

    async fn apply(&self, migration: &Migration) -> AppResult<()> {
        let mut tx = self.transactions.begin().await?;

        if let Err(e) = sqlx::raw_sql(&migration.up_sql).execute(&mut *tx).await {
            warn!(version = migration.version, error = %e, "Migration failed");
            TransactionManager::rollback(tx).await?;
            return Err(AppError::database(format!(
                "Failed to apply migration {}: {}",
                migration.version, e
            )));
        }

        sqlx::query(&format!(
            "INSERT INTO {MIGRATION_TABLE} (version, name, checksum) VALUES ($1, $2, $3)"
        ))
        .bind(migration.version)
        .bind(&migration.name)
        .bind(&migration.checksum)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to record migration: {}", e)))?;

        TransactionManager::commit(tx).await?;

        info!(
            version = migration.version,
            name = %migration.name,
            "Migration applied"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_stable() {
        let a = Migration::new(1, "init", "CREATE TABLE t (id INT);");
        let b = Migration::new(1, "init", "CREATE TABLE t (id INT);");
        let c = Migration::new(1, "init", "CREATE TABLE t (id BIGINT);");

        assert_eq!(a.checksum, b.checksum);
        assert_ne!(a.checksum, c.checksum);
        assert_eq!(a.checksum.len(), 16);
        // FNV-1a 空串
        assert_eq!(checksum(""), "cbf29ce484222325");
    }
}
