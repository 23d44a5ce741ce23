use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::WorkerConfig;
use crate::events::EventSink;
use crate::payload::JobPayload;

/// A todo item as the handlers see it.
#[derive(Clone, Debug)]
pub struct TodoItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub owner_id: String,
    pub status: String,
}

/// Input for creating a derived todo item.
#[derive(Clone, Debug)]
pub struct NewTodoItem {
    pub title: String,
    pub description: String,
    pub owner_id: String,
    pub status: String,
}

/// Backing data store for todo items, injected into the handlers at
/// startup. Shared across concurrent handler invocations; treat it as a
/// bounded pool, not an exclusive resource.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn find_todo(&self, id: &str) -> anyhow::Result<Option<TodoItem>>;
    async fn create_todo(&self, item: NewTodoItem) -> anyhow::Result<TodoItem>;
}

/// Result of a translation call.
#[derive(Clone, Debug)]
pub struct Translation {
    pub text: String,
    pub detected_language: String,
}

/// External translation service. Rate-limited in production; shared
/// across concurrent handlers like the todo store.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_language`, detecting the source
    /// language.
    async fn translate(&self, text: &str, target_language: &str) -> anyhow::Result<Translation>;
}

/// The closed set of job-type handlers plus their injected collaborators.
///
/// Dispatch is an exhaustive match over [`JobPayload`]; adding a job
/// type is a compile-checked change. Handlers signal failure by
/// returning an error and must not swallow errors they want surfaced.
/// They must also be safely re-runnable: delivery is at-least-once, and
/// a redelivered message runs the same handler again (the translate
/// handler creates a fresh derived item per run; duplicates under
/// redelivery are accepted, see DESIGN.md).
pub struct JobHandlers {
    todos: Arc<dyn TodoStore>,
    translator: Arc<dyn Translator>,
    events: Arc<dyn EventSink>,
    example_delay: Duration,
}

impl std::fmt::Debug for JobHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandlers")
            .field("example_delay", &self.example_delay)
            .finish()
    }
}

impl JobHandlers {
    pub fn new(
        todos: Arc<dyn TodoStore>,
        translator: Arc<dyn Translator>,
        events: Arc<dyn EventSink>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            todos,
            translator,
            events,
            example_delay: Duration::from_millis(config.example_job_delay_ms),
        }
    }

    /// Run the handler for one payload to completion.
    pub async fn dispatch(&self, payload: JobPayload) -> anyhow::Result<()> {
        match payload {
            JobPayload::Example {} => self.example().await,
            JobPayload::Translate {
                todo_item_id,
                owner_id,
            } => self.translate(&todo_item_id, &owner_id).await,
        }
    }

    /// Sample job: something that takes a long time and does nothing.
    async fn example(&self) -> anyhow::Result<()> {
        info!("example job started");
        tokio::time::sleep(self.example_delay).await;
        info!("example job processed");
        Ok(())
    }

    /// Translate a todo item's title and create a derived item.
    ///
    /// A missing todo item is not a failure: the job completes without
    /// creating anything. Event publish is best-effort and never fails
    /// the job.
    async fn translate(&self, todo_item_id: &str, owner_id: &str) -> anyhow::Result<()> {
        let Some(todo) = self.todos.find_todo(todo_item_id).await? else {
            info!(todo_item_id, "todo item not found, nothing to translate");
            return Ok(());
        };

        let translation = self.translator.translate(&todo.title, "ja").await?;

        let derived = self
            .todos
            .create_todo(NewTodoItem {
                title: translation.text,
                description: format!(
                    "Translated from: {} (detected language: {})",
                    todo.title, translation.detected_language
                ),
                owner_id: owner_id.to_string(),
                status: todo.status,
            })
            .await?;
        info!(derived_id = %derived.id, "created translated todo item");

        let channel = format!("{owner_id}/jobs");
        if let Err(err) = self
            .events
            .send_event(&channel, serde_json::json!({"type": "completed"}))
            .await
        {
            warn!(%channel, "completion event publish failed: {err:#}");
        }

        Ok(())
    }
}
