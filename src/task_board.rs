//! Client-side mirror of the server's task list.
//!
//! Every mutation is applied to the mirror first and tracked under a
//! [`Ticket`] until the server answers. A ticket ends either `Committed`,
//! with the server's record folded into the mirror, or `RolledBack`, with the
//! mirror reset to a server view.
//!
//! Two lists are kept: `tasks`, what the user sees, and `confirmed`, the last
//! known server state (latest fetch plus every committed action). A rollback
//! with no fresh server view falls back to `confirmed`.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{ClientError, Ticket};
use crate::task::{StatusFilter, Task, TaskPatch, PLACEHOLDER_PREFIX};

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch tasks. Using local storage data.";

/// How many resolved tickets keep answering [`TaskBoard::phase`].
pub const RESOLVED_HISTORY: usize = 64;

/// The request a ticket is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create { temp_id: String, title: String },
    Update { id: String, patch: TaskPatch },
    Delete { id: String },
}

/// Successful server answer to a [`Mutation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Created(Task),
    Updated(Task),
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPhase {
    Pending,
    Committed,
    RolledBack,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

#[derive(Debug, Default)]
pub struct TaskBoard {
    tasks: Vec<Task>,
    confirmed: Vec<Task>,
    pending: BTreeMap<Ticket, Mutation>,
    resolved: BTreeMap<Ticket, ActionPhase>,
    next_ticket: u64,
    pub filter: StatusFilter,
    pub selected_task: usize,
    pub error: Option<String>,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn confirmed(&self) -> &[Task] {
        &self.confirmed
    }

    /// Seeds the board from the local cache, before any server contact.
    pub fn load_cached(&mut self, tasks: Vec<Task>) {
        self.confirmed = tasks.clone();
        self.tasks = tasks;
        self.clamp_selection();
    }

    /// Takes a full server listing as the new truth, dropping optimistic state.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.load_cached(tasks);
        self.error = None;
    }

    pub fn fetch_failed(&mut self) {
        self.error = Some(FETCH_FAILED_MESSAGE.to_string());
    }

    pub fn begin_create(&mut self, title: &str) -> Result<Ticket, ClientError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ClientError::BlankTitle);
        }
        let temp_id = format!("{PLACEHOLDER_PREFIX}{}", Uuid::new_v4());
        self.tasks.push(Task::new(temp_id.clone(), title, Utc::now()));
        Ok(self.track(Mutation::Create {
            temp_id,
            title: title.to_string(),
        }))
    }

    pub fn begin_update(&mut self, id: &str, patch: TaskPatch) -> Result<Ticket, ClientError> {
        if patch.has_blank_title() {
            return Err(ClientError::BlankTitle);
        }
        let task = self.synced_task_mut(id)?;
        task.apply(&patch);
        Ok(self.track(Mutation::Update {
            id: id.to_string(),
            patch,
        }))
    }

    pub fn begin_toggle(&mut self, id: &str) -> Result<Ticket, ClientError> {
        let completed = self.synced_task_mut(id)?.completed;
        self.begin_update(id, TaskPatch::completed(!completed))
    }

    pub fn begin_delete(&mut self, id: &str) -> Result<Ticket, ClientError> {
        self.synced_task_mut(id)?;
        self.tasks.retain(|task| task.id != id);
        self.clamp_selection();
        Ok(self.track(Mutation::Delete { id: id.to_string() }))
    }

    pub fn mutation(&self, ticket: Ticket) -> Option<&Mutation> {
        self.pending.get(&ticket)
    }

    /// `None` for unknown tickets and for resolved ones older than the last
    /// [`RESOLVED_HISTORY`].
    pub fn phase(&self, ticket: Ticket) -> Option<ActionPhase> {
        if self.pending.contains_key(&ticket) {
            return Some(ActionPhase::Pending);
        }
        self.resolved.get(&ticket).copied()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Folds the server's answer into both lists.
    ///
    /// The answer wins over whatever the mirror holds for that id; an update
    /// for an id that is gone by now changes nothing.
    pub fn commit(
        &mut self,
        ticket: Ticket,
        confirmation: Confirmation,
    ) -> Result<(), ClientError> {
        let mutation = self
            .pending
            .get(&ticket)
            .ok_or(ClientError::NotPending(ticket))?;

        match (mutation, confirmation) {
            (Mutation::Create { temp_id, .. }, Confirmation::Created(task)) => {
                // A rollback may already have dropped the placeholder, or
                // fetched the real record.
                match self
                    .tasks
                    .iter()
                    .position(|existing| existing.id == *temp_id || existing.id == task.id)
                {
                    Some(index) => self.tasks[index] = task.clone(),
                    None => self.tasks.push(task.clone()),
                }
                self.tasks.retain(|existing| existing.id != *temp_id);
                upsert(&mut self.confirmed, task);
            }
            (Mutation::Update { .. }, Confirmation::Updated(task)) => {
                replace(&mut self.tasks, task.clone());
                replace(&mut self.confirmed, task);
            }
            (Mutation::Delete { id }, Confirmation::Deleted) => {
                let id = id.clone();
                self.tasks.retain(|task| task.id != id);
                self.confirmed.retain(|task| task.id != id);
            }
            _ => return Err(ClientError::MismatchedConfirmation(ticket)),
        }

        self.finish(ticket, ActionPhase::Committed);
        self.clamp_selection();
        Ok(())
    }

    /// Discards optimistic state after a failed request: the mirror becomes
    /// `server_view` when a re-fetch worked, the last known server state
    /// otherwise.
    pub fn roll_back(
        &mut self,
        ticket: Ticket,
        server_view: Option<Vec<Task>>,
    ) -> Result<(), ClientError> {
        if !self.pending.contains_key(&ticket) {
            return Err(ClientError::NotPending(ticket));
        }
        match server_view {
            Some(tasks) => self.replace_all(tasks),
            None => {
                self.tasks = self.confirmed.clone();
                self.clamp_selection();
            }
        }
        self.finish(ticket, ActionPhase::RolledBack);
        Ok(())
    }

    pub fn get_tasks_by_status(&self, filter: StatusFilter) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.matches(filter))
            .collect()
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.get_tasks_by_status(self.filter)
    }

    pub fn selected(&self) -> Option<&Task> {
        self.visible_tasks().get(self.selected_task).copied()
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
        self.selected_task = 0;
    }

    pub fn select_previous(&mut self) {
        self.selected_task = self.selected_task.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if self.selected_task + 1 < self.visible_tasks().len() {
            self.selected_task += 1;
        }
    }

    pub fn stats(&self) -> TaskStats {
        let completed = self.tasks.iter().filter(|task| task.completed).count();
        TaskStats {
            total: self.tasks.len(),
            active: self.tasks.len() - completed,
            completed,
        }
    }

    fn synced_task_mut(&mut self, id: &str) -> Result<&mut Task, ClientError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| ClientError::UnknownTask(id.to_string()))?;
        if task.is_placeholder() {
            return Err(ClientError::Unsynced(id.to_string()));
        }
        Ok(task)
    }

    fn track(&mut self, mutation: Mutation) -> Ticket {
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        self.pending.insert(ticket, mutation);
        ticket
    }

    fn finish(&mut self, ticket: Ticket, phase: ActionPhase) {
        self.pending.remove(&ticket);
        self.resolved.insert(ticket, phase);
        while self.resolved.len() > RESOLVED_HISTORY {
            self.resolved.pop_first();
        }
    }

    fn clamp_selection(&mut self) {
        let visible = self.visible_tasks().len();
        self.selected_task = self.selected_task.min(visible.saturating_sub(1));
    }
}

fn replace(tasks: &mut [Task], task: Task) {
    if let Some(existing) = tasks.iter_mut().find(|existing| existing.id == task.id) {
        *existing = task;
    }
}

fn upsert(tasks: &mut Vec<Task>, task: Task) {
    match tasks.iter_mut().find(|existing| existing.id == task.id) {
        Some(existing) => *existing = task,
        None => tasks.push(task),
    }
}
