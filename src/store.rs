use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::task::{StatusFilter, Task, TaskPatch};

/// The store as shared by request handlers. One writer at a time.
pub type SharedStore = Arc<Mutex<TaskStore>>;

/// Authoritative, insertion-ordered task collection.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    last_id: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with the two demo tasks the app has always shipped with.
    pub fn with_samples() -> Self {
        let now = Utc::now();
        let mut done = Task::new("2", "Build a task manager", now);
        done.completed = true;
        Self {
            tasks: vec![Task::new("1", "Learn React", now), done],
            last_id: 2,
        }
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn list(&self, filter: StatusFilter) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|task| task.matches(filter))
            .cloned()
            .collect()
    }

    pub fn create(&mut self, title: &str) -> Result<Task, StoreError> {
        self.create_at(title, Utc::now())
    }

    pub fn create_at(&mut self, title: &str, now: DateTime<Utc>) -> Result<Task, StoreError> {
        if title.trim().is_empty() {
            return Err(StoreError::BlankTitle);
        }
        let task = Task::new(self.next_id(now), title, now);
        self.tasks.push(task.clone());
        Ok(task)
    }

    pub fn update(&mut self, id: &str, patch: &TaskPatch) -> Result<Task, StoreError> {
        if patch.has_blank_title() {
            return Err(StoreError::BlankTitle);
        }
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        task.apply(patch);
        Ok(task.clone())
    }

    /// Removes the task and hands it back.
    pub fn delete(&mut self, id: &str) -> Result<Task, StoreError> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(self.tasks.remove(index))
    }

    // Millisecond timestamp, bumped past the last issued id so two creates in
    // the same millisecond (or a clock step backwards) never collide.
    fn next_id(&mut self, now: DateTime<Utc>) -> String {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        self.last_id = millis.max(self.last_id + 1);
        self.last_id.to_string()
    }
}
