//! SQLite database - schema definitions and connection management
//!
//! This file contains:
//! - Database struct definition
//! - Connection management (new, init)
//! - Schema creation, migrations and seed rows
//!
//! All table operations live in the tables/ subdirectory.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::Mutex;

/// Models registered on first start: (name, api_url, api_key_var, provider, model_name)
const INITIAL_MODELS: &[(&str, &str, &str, &str, &str)] = &[
    (
        "DeepSeek",
        "https://api.deepseek.com/v1/chat/completions",
        "DEEPSEEK_API_KEY",
        "deepseek",
        "deepseek-chat",
    ),
    ("GigaChat", "", "GIGACHAT", "gigachat", "GigaChat"),
    (
        "Yandex GPT",
        "",
        "YANDEX_OAUTH_TOKEN",
        "yandex",
        "yandexgpt/latest",
    ),
    (
        "OpenRouter",
        "https://openrouter.ai/api/v1/chat/completions",
        "OPENROUTER_API_KEY",
        "openrouter",
        "openrouter/auto",
    ),
];

/// Main database wrapper, connection guarded by a Mutex
pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Create a new database connection and initialize schema
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let conn = Connection::open(database_url)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// Initialize all database tables, run migrations and seed models
    fn init(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS prompts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                prompt TEXT NOT NULL,
                tags TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS models (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                api_url TEXT NOT NULL,
                api_key_var TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                provider TEXT,
                model_name TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                prompt_id INTEGER NOT NULL,
                model_id INTEGER NOT NULL,
                response TEXT NOT NULL,
                saved_at TEXT NOT NULL,
                FOREIGN KEY (prompt_id) REFERENCES prompts (id) ON DELETE CASCADE,
                FOREIGN KEY (model_id) REFERENCES models (id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT
            )",
            [],
        )?;

        // Migration: early databases had no provider/model_name columns
        for (column, ddl) in [
            ("provider", "ALTER TABLE models ADD COLUMN provider TEXT"),
            ("model_name", "ALTER TABLE models ADD COLUMN model_name TEXT"),
        ] {
            let has_column: bool = conn
                .query_row(
                    "SELECT COUNT(*) FROM pragma_table_info('models') WHERE name = ?1",
                    [column],
                    |row| row.get::<_, i64>(0),
                )
                .map(|c| c > 0)
                .unwrap_or(false);

            if !has_column {
                log::info!("[DB] Adding models.{} column", column);
                conn.execute(ddl, [])?;
            }
        }

        let model_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM models", [], |row| row.get(0))?;

        if model_count == 0 {
            log::info!("[DB] Seeding {} default models", INITIAL_MODELS.len());
            let mut stmt = conn.prepare(
                "INSERT INTO models (name, api_url, api_key_var, is_active, provider, model_name)
                 VALUES (?1, ?2, ?3, 1, ?4, ?5)",
            )?;
            for (name, api_url, key_var, provider, model_name) in INITIAL_MODELS {
                stmt.execute([name, api_url, key_var, provider, model_name])?;
            }
        }

        Ok(())
    }
}

/// Parse a stored timestamp; accepts RFC 3339 and the legacy `YYYY-MM-DD HH:MM:SS` form
pub(crate) fn parse_timestamp(column: usize, raw: &str) -> SqliteResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_database_seeds_models() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("chatlist.db");
        let db = Database::new(path.to_str().unwrap()).unwrap();

        let models = db.list_models().unwrap();
        assert_eq!(models.len(), INITIAL_MODELS.len());
        assert!(models.iter().any(|m| m.provider == "gigachat"));
    }

    #[test]
    fn test_reopen_does_not_reseed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chatlist.db");
        let path = path.to_str().unwrap();

        {
            let db = Database::new(path).unwrap();
            let first = db.list_models().unwrap()[0].id;
            assert!(db.delete_model(first).unwrap());
        }

        let db = Database::new(path).unwrap();
        assert_eq!(db.list_models().unwrap().len(), INITIAL_MODELS.len() - 1);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp(0, "2025-01-02T03:04:05+00:00").unwrap();
        let legacy = parse_timestamp(0, "2025-01-02 03:04:05").unwrap();
        assert_eq!(rfc, legacy);
        assert!(parse_timestamp(0, "yesterday").is_err());
    }
}
