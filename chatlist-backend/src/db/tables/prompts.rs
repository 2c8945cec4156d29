//! Prompt history database operations

use chrono::Utc;
use rusqlite::{params, Result as SqliteResult, Row};

use crate::db::parse_timestamp;
use crate::models::PromptRecord;
use super::super::Database;

fn prompt_from_row(row: &Row<'_>) -> SqliteResult<PromptRecord> {
    let created_at: String = row.get(1)?;
    Ok(PromptRecord {
        id: row.get(0)?,
        created_at: parse_timestamp(1, &created_at)?,
        text: row.get(2)?,
        tags: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
    })
}

impl Database {
    /// Store a submitted prompt
    pub fn save_prompt(&self, text: &str, tags: &str) -> SqliteResult<PromptRecord> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO prompts (created_at, prompt, tags) VALUES (?1, ?2, ?3)",
            params![now.to_rfc3339(), text, tags],
        )?;

        Ok(PromptRecord {
            id: conn.last_insert_rowid(),
            created_at: now,
            text: text.to_string(),
            tags: tags.to_string(),
        })
    }

    /// Get a prompt by id
    pub fn get_prompt(&self, id: i64) -> SqliteResult<Option<PromptRecord>> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT id, created_at, prompt, tags FROM prompts WHERE id = ?1",
            [id],
            prompt_from_row,
        );

        match result {
            Ok(prompt) => Ok(Some(prompt)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// List all prompts, newest first
    pub fn list_prompts(&self) -> SqliteResult<Vec<PromptRecord>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, created_at, prompt, tags FROM prompts ORDER BY created_at DESC, id DESC",
        )?;

        let prompts = stmt
            .query_map([], prompt_from_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(prompts)
    }

    /// Search prompts by text or tags (substring match), newest first
    pub fn search_prompts(&self, query: &str) -> SqliteResult<Vec<PromptRecord>> {
        let conn = self.conn.lock().unwrap();
        let pattern = format!("%{}%", escape_like(query));

        let mut stmt = conn.prepare(
            "SELECT id, created_at, prompt, tags FROM prompts
             WHERE prompt LIKE ?1 ESCAPE '\\' OR tags LIKE ?1 ESCAPE '\\'
             ORDER BY created_at DESC, id DESC",
        )?;

        let prompts = stmt
            .query_map([&pattern], prompt_from_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(prompts)
    }

    /// Delete a prompt together with its saved results
    pub fn delete_prompt(&self, id: i64) -> SqliteResult<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM results WHERE prompt_id = ?1", [id])?;
        let rows_affected = tx.execute("DELETE FROM prompts WHERE id = ?1", [id])?;

        tx.commit()?;
        Ok(rows_affected > 0)
    }
}

/// Make `%`, `_` and `\` in user input match literally under `ESCAPE '\'`
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
