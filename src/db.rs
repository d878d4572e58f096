//! Collection database connection.
//!
//! A collection is one SQLite database file under the configured persist
//! directory; collection identity is `(persist_dir, collection)`.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::IndexConfig;
use crate::error::{AssistantError, Result};

/// Path of the collection's database file.
pub fn collection_path(config: &IndexConfig) -> PathBuf {
    config
        .persist_dir
        .join(format!("{}.sqlite3", config.collection))
}

/// Open the collection database, creating it when asked to.
///
/// With `create_if_missing = false` an absent database file is an
/// [`AssistantError::IndexNotFound`], so query paths can report a missing
/// knowledge base instead of silently creating an empty one.
pub async fn connect(config: &IndexConfig, create_if_missing: bool) -> Result<SqlitePool> {
    let db_path = collection_path(config);

    if !create_if_missing && !db_path.exists() {
        return Err(AssistantError::IndexNotFound(config.collection.clone()));
    }

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
        .map_err(AssistantError::Index)?
        .create_if_missing(create_if_missing)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_path_layout() {
        let config = IndexConfig {
            persist_dir: PathBuf::from("/tmp/store"),
            collection: "docs".to_string(),
        };
        assert_eq!(
            collection_path(&config),
            PathBuf::from("/tmp/store/docs.sqlite3")
        );
    }

    #[tokio::test]
    async fn test_missing_collection_is_not_found() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = IndexConfig {
            persist_dir: tmp.path().to_path_buf(),
            collection: "never_ingested".to_string(),
        };
        let err = connect(&config, false).await.unwrap_err();
        assert!(matches!(err, AssistantError::IndexNotFound(_)));
    }
}
