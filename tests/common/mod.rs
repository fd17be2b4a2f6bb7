//! Shared helpers for the integration tests.
//!
//! Each test file is its own crate, so helpers unused by one file would warn.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use tasktrack::client::TaskApi;
use tasktrack::error::{ClientError, StoreError};
use tasktrack::store::{SharedStore, TaskStore};
use tasktrack::task::{StatusFilter, Task, TaskPatch};

/// `TaskApi` served straight from a `TaskStore`, with a switch that makes
/// every call fail as if the network were down.
#[derive(Clone)]
pub struct InMemoryApi {
    pub store: SharedStore,
    online: Arc<AtomicBool>,
}

impl InMemoryApi {
    pub fn new(store: TaskStore) -> Self {
        Self {
            store: store.into_shared(),
            online: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn reachable(&self) -> Result<(), ClientError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ClientError::Rejected {
                status: 503,
                message: "offline".to_string(),
            })
        }
    }

    pub async fn server_tasks(&self) -> Vec<Task> {
        self.store.lock().await.list(StatusFilter::All)
    }
}

fn to_client_error(error: StoreError) -> ClientError {
    match error {
        StoreError::NotFound(id) => ClientError::NotFound(id),
        StoreError::BlankTitle => ClientError::Rejected {
            status: 400,
            message: error.to_string(),
        },
    }
}

impl TaskApi for InMemoryApi {
    async fn list(&self, filter: StatusFilter) -> Result<Vec<Task>, ClientError> {
        self.reachable()?;
        Ok(self.store.lock().await.list(filter))
    }

    async fn create(&self, title: &str) -> Result<Task, ClientError> {
        self.reachable()?;
        self.store.lock().await.create(title).map_err(to_client_error)
    }

    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task, ClientError> {
        self.reachable()?;
        self.store.lock().await.update(id, patch).map_err(to_client_error)
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.reachable()?;
        self.store
            .lock()
            .await
            .delete(id)
            .map(|_| ())
            .map_err(to_client_error)
    }
}

/// Sends one request through the router and returns status and JSON body.
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
