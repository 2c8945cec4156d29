//! Saved response database operations

use chrono::Utc;
use rusqlite::{params, Result as SqliteResult};

use crate::db::parse_timestamp;
use crate::models::{ResultRecord, SavedResult};
use super::super::Database;

impl Database {
    /// Keep the responses the user selected; all rows are written or none are
    pub fn save_results(
        &self,
        prompt_id: i64,
        selected: &[(i64, &str)],
    ) -> SqliteResult<Vec<ResultRecord>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let now = Utc::now();
        let mut saved = Vec::with_capacity(selected.len());

        {
            let mut stmt = tx.prepare(
                "INSERT INTO results (prompt_id, model_id, response, saved_at) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for &(model_id, response_text) in selected {
                stmt.execute(params![prompt_id, model_id, response_text, now.to_rfc3339()])?;
                saved.push(ResultRecord {
                    id: tx.last_insert_rowid(),
                    prompt_id,
                    model_id,
                    response_text: response_text.to_string(),
                    saved_at: now,
                });
            }
        }

        tx.commit()?;
        Ok(saved)
    }

    /// Saved responses for a prompt, oldest first
    pub fn get_results_by_prompt(&self, prompt_id: i64) -> SqliteResult<Vec<SavedResult>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT m.name, r.response, r.saved_at
             FROM results r
             JOIN models m ON r.model_id = m.id
             WHERE r.prompt_id = ?1
             ORDER BY r.saved_at, r.id",
        )?;

        let results = stmt
            .query_map([prompt_id], |row| {
                let saved_at: String = row.get(2)?;
                Ok(SavedResult {
                    model_name: row.get(0)?,
                    response_text: row.get(1)?,
                    saved_at: parse_timestamp(2, &saved_at)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(results)
    }
}
