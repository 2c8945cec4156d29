//! Concurrent fan-out of one prompt to many models
//!
//! Every model gets its own task. Results are joined back in the order the
//! models were given, so position `i` of the output always belongs to
//! `models[i]` regardless of which provider answered first. Failures never
//! escape as errors: each one is folded into that model's `Outcome`.

use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinError;

use super::{ProviderAdapter, ProviderContext};
use crate::models::{ModelRecord, Outcome};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("no models selected")]
    NoModels,
    #[error("model '{0}' is not active")]
    InactiveModel(String),
}

/// Prompt text that is non-empty after trimming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn new(text: &str) -> Result<Self, DispatchError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DispatchError::EmptyPrompt);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchEntry {
    pub model: ModelRecord,
    pub outcome: Outcome,
    pub elapsed_ms: u64,
}

pub struct Dispatcher {
    ctx: Arc<ProviderContext>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<ProviderContext>) -> Self {
        Self { ctx }
    }

    /// Send `prompt` to every model concurrently; one entry per model, in input order
    pub async fn dispatch(
        &self,
        prompt: &Prompt,
        models: &[ModelRecord],
    ) -> Result<Vec<DispatchEntry>, DispatchError> {
        if models.is_empty() {
            return Err(DispatchError::NoModels);
        }
        if let Some(inactive) = models.iter().find(|m| !m.is_active) {
            return Err(DispatchError::InactiveModel(inactive.name.clone()));
        }

        log::info!(
            "[DISPATCH] Sending prompt ({} chars) to {} model(s)",
            prompt.as_str().chars().count(),
            models.len()
        );

        let handles: Vec<_> = models
            .iter()
            .cloned()
            .map(|model| {
                let ctx = Arc::clone(&self.ctx);
                let text = prompt.as_str().to_string();
                tokio::spawn(async move {
                    let adapter = ProviderAdapter::for_model(&model);
                    let started = Instant::now();
                    let outcome = adapter.send(&ctx, &model, &text).await;
                    (outcome, started.elapsed().as_millis() as u64)
                })
            })
            .collect();

        let entries = settle_all(models, join_all(handles).await);

        let succeeded = entries.iter().filter(|e| e.outcome.is_success()).count();
        log::info!(
            "[DISPATCH] Completed: {}/{} succeeded",
            succeeded,
            entries.len()
        );

        Ok(entries)
    }
}

type TaskResult = Result<(Outcome, u64), JoinError>;

/// Pair joined task results back with their models, position by position
fn settle_all(models: &[ModelRecord], joined: Vec<TaskResult>) -> Vec<DispatchEntry> {
    models
        .iter()
        .cloned()
        .zip(joined)
        .map(|(model, result)| settle(model, result))
        .collect()
}

fn settle(model: ModelRecord, result: TaskResult) -> DispatchEntry {
    match result {
        Ok((outcome, elapsed_ms)) => {
            log::debug!(
                "[DISPATCH] {} -> {} in {}ms",
                model.name,
                outcome.kind(),
                elapsed_ms
            );
            DispatchEntry {
                model,
                outcome,
                elapsed_ms,
            }
        }
        Err(e) => {
            log::error!("[DISPATCH] Task for {} failed: {}", model.name, e);
            DispatchEntry {
                model,
                outcome: Outcome::UnknownError(format!("provider task failed: {}", e)),
                elapsed_ms: 0,
            }
        }
    }
}
