//! # Settings Repository
//!
//! Key/value settings (cafe name, currency, receipt text, UI preferences).

use std::collections::BTreeMap;

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use cafe_core::DEFAULT_SETTINGS;

/// Repository for the `settings` table.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Returns every setting. `NULL` values read as empty strings.
    pub async fn get_all(&self) -> DbResult<BTreeMap<String, String>> {
        let rows: Vec<(String, Option<String>)> =
            sqlx::query_as("SELECT key, value FROM settings ORDER BY key")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(key, value)| (key, value.unwrap_or_default()))
            .collect())
    }

    /// Returns one setting.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<Option<String>> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(value.map(Option::unwrap_or_default))
    }

    /// Upserts every pair in one transaction.
    pub async fn set_many(&self, values: &BTreeMap<String, String>) -> DbResult<()> {
        debug!(count = values.len(), "Saving settings");

        let mut tx = self.pool.begin().await?;
        for (key, value) in values {
            sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)")
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(count = values.len(), "Settings saved");
        Ok(())
    }

    /// Deletes all settings and writes the defaults back.
    pub async fn reset(&self) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM settings").execute(&mut *tx).await?;
        for (key, value) in DEFAULT_SETTINGS {
            sqlx::query("INSERT INTO settings (key, value) VALUES (?1, ?2)")
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!("Settings reset to defaults");
        Ok(())
    }

    /// Writes defaults for keys that don't exist yet. Returns how many were added.
    pub async fn seed_defaults(&self) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;

        let mut added = 0;
        for (key, value) in DEFAULT_SETTINGS {
            added += sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)")
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        if added > 0 {
            info!(added, "Default settings seeded");
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_seed_defaults_is_idempotent() {
        let db = db().await;
        let settings = db.settings();

        assert_eq!(settings.seed_defaults().await.unwrap(), DEFAULT_SETTINGS.len() as u64);
        assert_eq!(settings.seed_defaults().await.unwrap(), 0);
        assert_eq!(settings.get_all().await.unwrap().len(), DEFAULT_SETTINGS.len());
    }

    #[tokio::test]
    async fn test_seed_keeps_existing_values() {
        let db = db().await;
        let settings = db.settings();

        let mut values = BTreeMap::new();
        values.insert("cafe_name".to_string(), "Blue Door".to_string());
        settings.set_many(&values).await.unwrap();
        settings.seed_defaults().await.unwrap();

        assert_eq!(settings.get("cafe_name").await.unwrap().as_deref(), Some("Blue Door"));
    }

    #[tokio::test]
    async fn test_set_many_and_reset() {
        let db = db().await;
        let settings = db.settings();
        settings.seed_defaults().await.unwrap();

        let mut values = BTreeMap::new();
        values.insert("currency_symbol".to_string(), "USD".to_string());
        values.insert("custom_key".to_string(), "x".to_string());
        settings.set_many(&values).await.unwrap();

        let all = settings.get_all().await.unwrap();
        assert_eq!(all["currency_symbol"], "USD");
        assert_eq!(all["custom_key"], "x");

        settings.reset().await.unwrap();
        let all = settings.get_all().await.unwrap();
        assert_eq!(all["currency_symbol"], "EGP");
        assert!(!all.contains_key("custom_key"));
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let db = db().await;
        assert!(db.settings().get("nope").await.unwrap().is_none());
    }
}
