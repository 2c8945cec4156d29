//! Model registry database operations

use rusqlite::{params, Connection, Result as SqliteResult, Row};

use crate::models::{ModelRecord, NewModel, UpdateModelRequest};
use super::super::Database;

const MODEL_COLUMNS: &str = "id, name, api_url, api_key_var, is_active, provider, model_name";

fn model_from_row(row: &Row<'_>) -> SqliteResult<ModelRecord> {
    let is_active: i64 = row.get(4)?;
    Ok(ModelRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        api_url: row.get(2)?,
        credential_ref: row.get(3)?,
        is_active: is_active != 0,
        provider: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        model_name: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
    })
}

fn select_model(conn: &Connection, id: i64) -> SqliteResult<Option<ModelRecord>> {
    let result = conn.query_row(
        &format!("SELECT {} FROM models WHERE id = ?1", MODEL_COLUMNS),
        [id],
        model_from_row,
    );

    match result {
        Ok(model) => Ok(Some(model)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

impl Database {
    /// List every registered model, ordered by name
    pub fn list_models(&self) -> SqliteResult<Vec<ModelRecord>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM models ORDER BY name",
            MODEL_COLUMNS
        ))?;

        let models = stmt
            .query_map([], model_from_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(models)
    }

    /// List models eligible for dispatch, in registry order
    pub fn list_active_models(&self) -> SqliteResult<Vec<ModelRecord>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM models WHERE is_active = 1 ORDER BY name",
            MODEL_COLUMNS
        ))?;

        let models = stmt
            .query_map([], model_from_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(models)
    }

    /// Get a model by id
    pub fn get_model(&self, id: i64) -> SqliteResult<Option<ModelRecord>> {
        let conn = self.conn.lock().unwrap();
        select_model(&conn, id)
    }

    /// Register a new model. Fails with a constraint violation if the name is taken.
    pub fn create_model(&self, model: &NewModel) -> SqliteResult<ModelRecord> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO models (name, api_url, api_key_var, is_active, provider, model_name)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                model.name.trim(),
                model.api_url.trim(),
                model.credential_ref.trim(),
                if model.is_active { 1 } else { 0 },
                model.provider.trim(),
                model.model_name.trim(),
            ],
        )?;
        let id = conn.last_insert_rowid();

        select_model(&conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    /// Update the given fields of a model; returns None if it does not exist
    pub fn update_model(
        &self,
        id: i64,
        update: &UpdateModelRequest,
    ) -> SqliteResult<Option<ModelRecord>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let Some(current) = select_model(&tx, id)? else {
            return Ok(None);
        };

        let name = update.name.as_deref().map(str::trim).unwrap_or(current.name.as_str());
        let api_url = update.api_url.as_deref().map(str::trim).unwrap_or(current.api_url.as_str());
        let credential_ref = update
            .credential_ref
            .as_deref()
            .map(str::trim)
            .unwrap_or(current.credential_ref.as_str());
        let is_active = update.is_active.unwrap_or(current.is_active);
        let provider = update.provider.as_deref().map(str::trim).unwrap_or(current.provider.as_str());
        let model_name = update
            .model_name
            .as_deref()
            .map(str::trim)
            .unwrap_or(current.model_name.as_str());

        tx.execute(
            "UPDATE models SET name = ?1, api_url = ?2, api_key_var = ?3, is_active = ?4,
                provider = ?5, model_name = ?6 WHERE id = ?7",
            params![
                name,
                api_url,
                credential_ref,
                if is_active { 1 } else { 0 },
                provider,
                model_name,
                id
            ],
        )?;

        let updated = select_model(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    /// Enable or disable a model for dispatch
    pub fn set_model_active(&self, id: i64, is_active: bool) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn.execute(
            "UPDATE models SET is_active = ?1 WHERE id = ?2",
            params![if is_active { 1 } else { 0 }, id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete a model. Fails with a constraint violation while saved results reference it.
    pub fn delete_model(&self, id: i64) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn.execute("DELETE FROM models WHERE id = ?1", [id])?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_db() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path().join("models.db").to_str().unwrap()).unwrap();
        (dir, db)
    }

    fn new_model(name: &str) -> NewModel {
        NewModel {
            name: name.to_string(),
            api_url: "https://api.example.com/v1/chat/completions".to_string(),
            credential_ref: "EXAMPLE_API_KEY".to_string(),
            is_active: true,
            provider: "openai-compatible".to_string(),
            model_name: "example-1".to_string(),
        }
    }

    #[test]
    fn test_create_and_get_model() {
        let (_dir, db) = test_db();
        let created = db.create_model(&new_model("Example")).unwrap();

        let fetched = db.get_model(created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.credential_ref, "EXAMPLE_API_KEY");
        assert!(db.get_model(created.id + 1000).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let (_dir, db) = test_db();
        db.create_model(&new_model("Twin")).unwrap();

        let err = db.create_model(&new_model("Twin")).unwrap_err();
        assert_eq!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::ConstraintViolation)
        );
    }

    #[test]
    fn test_active_filter_and_order() {
        let (_dir, db) = test_db();
        let zeta = db.create_model(&new_model("Zeta")).unwrap();
        db.create_model(&new_model("Alpha")).unwrap();
        db.set_model_active(zeta.id, false).unwrap();

        let active: Vec<String> = db
            .list_active_models()
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();

        assert!(active.contains(&"Alpha".to_string()));
        assert!(!active.contains(&"Zeta".to_string()));
        let mut sorted = active.clone();
        sorted.sort();
        assert_eq!(active, sorted);
    }

    #[test]
    fn test_partial_update() {
        let (_dir, db) = test_db();
        let created = db.create_model(&new_model("Editable")).unwrap();

        let updated = db
            .update_model(
                created.id,
                &UpdateModelRequest {
                    model_name: Some("  example-2 ".to_string()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.model_name, "example-2");
        assert_eq!(updated.name, "Editable");
        assert_eq!(updated.api_url, created.api_url);
        assert!(db.update_model(9999, &UpdateModelRequest::default()).unwrap().is_none());
    }

    #[test]
    fn test_concurrent_updates_of_different_fields_all_persist() {
        let (_dir, db) = test_db();
        let created = db.create_model(&new_model("Shared")).unwrap();

        let updates = [
            UpdateModelRequest {
                api_url: Some("https://mirror.example.com/v1/chat/completions".to_string()),
                ..Default::default()
            },
            UpdateModelRequest {
                credential_ref: Some("MIRROR_API_KEY".to_string()),
                ..Default::default()
            },
            UpdateModelRequest {
                is_active: Some(false),
                ..Default::default()
            },
            UpdateModelRequest {
                model_name: Some("example-3".to_string()),
                ..Default::default()
            },
        ];

        for _ in 0..25 {
            std::thread::scope(|scope| {
                for update in &updates {
                    let db = &db;
                    scope.spawn(move || db.update_model(created.id, update).unwrap().unwrap());
                }
            });

            let model = db.get_model(created.id).unwrap().unwrap();
            assert_eq!(model.api_url, "https://mirror.example.com/v1/chat/completions");
            assert_eq!(model.credential_ref, "MIRROR_API_KEY");
            assert!(!model.is_active);
            assert_eq!(model.model_name, "example-3");
            assert_eq!(model.name, "Shared");

            // Reset so the next round starts from the original values
            db.update_model(
                created.id,
                &UpdateModelRequest {
                    api_url: Some(created.api_url.clone()),
                    credential_ref: Some(created.credential_ref.clone()),
                    is_active: Some(true),
                    model_name: Some(created.model_name.clone()),
                    ..Default::default()
                },
            )
            .unwrap();
        }
    }
}
