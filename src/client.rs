//! Talks to the task API and keeps a [`TaskBoard`] reconciled with it.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::cache::LocalCache;
use crate::error::{ClientError, Ticket};
use crate::task::{StatusFilter, Task, TaskPatch};
use crate::task_board::{ActionPhase, Confirmation, Mutation, TaskBoard};

/// The four operations of the task API.
#[allow(async_fn_in_trait)]
pub trait TaskApi {
    async fn list(&self, filter: StatusFilter) -> Result<Vec<Task>, ClientError>;
    async fn create(&self, title: &str) -> Result<Task, ClientError>;
    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task, ClientError>;
    async fn delete(&self, id: &str) -> Result<(), ClientError>;
}

#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTaskApi {
    /// `base_url` is the API root, e.g. `http://localhost:5001/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn tasks_url(&self) -> String {
        format!("{}/tasks", self.base_url)
    }

    fn task_url(&self, id: &str) -> String {
        format!("{}/tasks/{id}", self.base_url)
    }
}

async fn check(response: Response, id: Option<&str>) -> Result<Response, ClientError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(id.unwrap_or_default().to_string()));
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

async fn decode<T: DeserializeOwned>(
    response: Response,
    id: Option<&str>,
) -> Result<T, ClientError> {
    Ok(check(response, id).await?.json().await?)
}

impl TaskApi for HttpTaskApi {
    async fn list(&self, filter: StatusFilter) -> Result<Vec<Task>, ClientError> {
        let mut request = self.http.get(self.tasks_url());
        if let Some(status) = filter.as_query() {
            request = request.query(&[("status", status)]);
        }
        decode(request.send().await?, None).await
    }

    async fn create(&self, title: &str) -> Result<Task, ClientError> {
        let response = self
            .http
            .post(self.tasks_url())
            .json(&json!({ "title": title }))
            .send()
            .await?;
        decode(response, None).await
    }

    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task, ClientError> {
        let response = self.http.put(self.task_url(id)).json(patch).send().await?;
        decode(response, Some(id)).await
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let response = self.http.delete(self.task_url(id)).send().await?;
        check(response, Some(id)).await?;
        Ok(())
    }
}

/// A board, the API it mirrors, and the cache it is saved to.
pub struct TaskClient<A> {
    api: A,
    board: TaskBoard,
    cache: LocalCache,
}

impl<A: TaskApi> TaskClient<A> {
    pub fn new(api: A, cache: LocalCache) -> Self {
        Self {
            api,
            board: TaskBoard::new(),
            cache,
        }
    }

    pub fn board(&self) -> &TaskBoard {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut TaskBoard {
        &mut self.board
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Shows cached tasks, if any, then replaces them with a server listing.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        if let Some(tasks) = self.cache.load() {
            tracing::debug!(count = tasks.len(), "Loaded cached tasks");
            self.board.load_cached(tasks);
        }
        self.refresh().await
    }

    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        match self.api.list(StatusFilter::All).await {
            Ok(tasks) => {
                tracing::debug!(count = tasks.len(), "Fetched tasks");
                self.board.replace_all(tasks);
                self.persist();
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, "Error fetching tasks");
                self.board.fetch_failed();
                Err(error)
            }
        }
    }

    pub fn add_task(&mut self, title: &str) -> Result<Ticket, ClientError> {
        let ticket = self.board.begin_create(title)?;
        self.persist();
        Ok(ticket)
    }

    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<Ticket, ClientError> {
        let ticket = self.board.begin_update(id, patch)?;
        self.persist();
        Ok(ticket)
    }

    pub fn toggle_complete(&mut self, id: &str) -> Result<Ticket, ClientError> {
        let ticket = self.board.begin_toggle(id)?;
        self.persist();
        Ok(ticket)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Ticket, ClientError> {
        let ticket = self.board.begin_delete(id)?;
        self.persist();
        Ok(ticket)
    }

    /// Sends the request behind `ticket` and commits or rolls back with the
    /// outcome.
    pub async fn settle(&mut self, ticket: Ticket) -> Result<ActionPhase, ClientError> {
        let mutation = self
            .board
            .mutation(ticket)
            .cloned()
            .ok_or(ClientError::NotPending(ticket))?;

        let outcome = match &mutation {
            Mutation::Create { title, .. } => {
                self.api.create(title).await.map(Confirmation::Created)
            }
            Mutation::Update { id, patch } => {
                self.api.update(id, patch).await.map(Confirmation::Updated)
            }
            Mutation::Delete { id } => self.api.delete(id).await.map(|()| Confirmation::Deleted),
        };

        let phase = match outcome {
            Ok(confirmation) => {
                tracing::debug!(%ticket, ?mutation, "Server confirmed action");
                self.board.commit(ticket, confirmation)?;
                ActionPhase::Committed
            }
            Err(error) => {
                tracing::warn!(%ticket, ?mutation, %error, "Action failed, re-fetching tasks");
                let listing = match self.api.list(StatusFilter::All).await {
                    Ok(tasks) => Some(tasks),
                    Err(error) => {
                        tracing::warn!(%error, "Re-fetch failed, reverting to last known tasks");
                        self.board.fetch_failed();
                        None
                    }
                };
                self.board.roll_back(ticket, listing)?;
                ActionPhase::RolledBack
            }
        };
        self.persist();
        Ok(phase)
    }

    fn persist(&self) {
        self.cache.save(self.board.tasks());
    }
}
