pub mod health;
pub mod models;
pub mod prompts;
pub mod settings;

use rusqlite::ErrorCode;

/// UNIQUE / FOREIGN KEY failures are client errors (409), not server faults
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::ai::test_support::test_context;
    use crate::ai::Dispatcher;
    use crate::db::Database;
    use crate::AppState;

    /// App state over a fresh seeded database; upstream calls go to `base`
    pub(crate) fn test_state(secrets: &[(&str, &str)], base: &str) -> (TempDir, AppState) {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("api.db");
        let db = Database::new(db_path.to_str().unwrap()).unwrap();
        let state = AppState {
            db: Arc::new(db),
            dispatcher: Arc::new(Dispatcher::new(Arc::new(test_context(secrets, base)))),
        };
        (dir, state)
    }
}
