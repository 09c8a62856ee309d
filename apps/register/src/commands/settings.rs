//! # Settings Commands
//!
//! The register's key/value settings (cafe name, currency, receipt texts).

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::info;

use crate::error::ApiError;
use crate::state::DbState;

pub async fn get(db: &DbState) -> Result<BTreeMap<String, String>, ApiError> {
    Ok(db.inner().settings().get_all().await?)
}

/// Upserts the given keys; keys not mentioned are left alone.
///
/// Values may be strings, numbers or booleans; booleans are stored as
/// `1`/`0`, and `null` as an empty string.
pub async fn set(
    db: &DbState,
    values: BTreeMap<String, Value>,
) -> Result<BTreeMap<String, String>, ApiError> {
    let mut settings = BTreeMap::new();
    for (key, value) in values {
        let key = key.trim().to_string();
        if key.is_empty() {
            return Err(ApiError::validation("Setting keys must not be empty"));
        }

        let value = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => String::from(if b { "1" } else { "0" }),
            Value::Null => String::new(),
            _ => {
                return Err(ApiError::validation(format!(
                    "Setting '{}' must be a plain value",
                    key
                )))
            }
        };
        settings.insert(key, value);
    }

    db.inner().settings().set_many(&settings).await?;
    info!(keys = settings.len(), "Settings saved");

    get(db).await
}

/// Restores the default settings.
pub async fn reset(db: &DbState) -> Result<BTreeMap<String, String>, ApiError> {
    db.inner().settings().reset().await?;
    get(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use cafe_db::{Database, DbConfig};
    use serde_json::json;

    async fn db() -> DbState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.settings().seed_defaults().await.unwrap();
        DbState::new(db)
    }

    #[tokio::test]
    async fn test_set_and_reset() {
        let db = db().await;

        let values: BTreeMap<String, Value> = serde_json::from_value(json!({
            "cafe_name": "Bean There",
            "tax_rate": 14,
            "auto_print": true
        }))
        .unwrap();
        let saved = set(&db, values).await.unwrap();
        assert_eq!(saved["cafe_name"], "Bean There");
        assert_eq!(saved["tax_rate"], "14");
        assert_eq!(saved["auto_print"], "1");
        assert_eq!(saved["currency_symbol"], "EGP");

        let restored = reset(&db).await.unwrap();
        assert_eq!(restored["cafe_name"], "Corner Cafe");
        assert_eq!(restored["auto_print"], "0");
    }

    #[tokio::test]
    async fn test_rejects_nested_values() {
        let db = db().await;
        let values: BTreeMap<String, Value> =
            serde_json::from_value(json!({"theme": {"dark": true}})).unwrap();
        assert!(set(&db, values).await.is_err());
        assert_eq!(get(&db).await.unwrap()["theme"], "light");
    }
}
