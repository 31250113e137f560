use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::info;

use crate::domain::{
    CompletionEvent, EnergyCategory, MoodEntry, Priority, Task, ValidationError,
};
use crate::storage::{CompletionLog, MoodStore, StorageError, TaskStore};

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("{0} (the change may not survive a restart)")]
    Storage(#[from] StorageError),
}

pub fn add_task(
    store: &mut TaskStore,
    name: &str,
    category: EnergyCategory,
    priority: Priority,
    duration: u32,
    now: NaiveDateTime,
) -> Result<Task, ActionError> {
    let task = Task::new(name, category, priority, duration, now)?;
    store.append(task.clone())?;
    info!(id = %task.id, name = %task.name, "task added");
    Ok(task)
}

/// Logs a completion for the task and drops it from the task list. Both
/// changes are applied in memory before either file is written.
pub fn complete_task(
    tasks: &mut TaskStore,
    log: &mut CompletionLog,
    id: &str,
    now: NaiveDateTime,
) -> Result<Task, ActionError> {
    let task = tasks
        .get(id)
        .cloned()
        .ok_or_else(|| ActionError::NotFound(id.to_string()))?;

    let logged = log.append(CompletionEvent::new(task.name.clone(), now));
    let removed = tasks.remove(id);
    logged?;
    removed?;

    info!(id = %task.id, name = %task.name, "task completed");
    Ok(task)
}

pub fn delete_task(tasks: &mut TaskStore, id: &str) -> Result<Task, ActionError> {
    let task = tasks
        .remove(id)?
        .ok_or_else(|| ActionError::NotFound(id.to_string()))?;
    info!(id = %task.id, name = %task.name, "task deleted");
    Ok(task)
}

pub fn log_mood(
    store: &mut MoodStore,
    mood: u8,
    note: Option<String>,
    now: NaiveDateTime,
) -> Result<MoodEntry, ActionError> {
    let entry = MoodEntry::new(mood, note, now)?;
    store.append(entry.clone())?;
    info!(mood, "mood logged");
    Ok(entry)
}
