//! The reqwest client against the real server on a loopback port.

use tokio::net::TcpListener;

use tasktrack::api::{router, AppState};
use tasktrack::cache::LocalCache;
use tasktrack::client::{HttpTaskApi, TaskApi, TaskClient};
use tasktrack::error::ClientError;
use tasktrack::store::TaskStore;
use tasktrack::task::{StatusFilter, TaskPatch};
use tasktrack::task_board::ActionPhase;

async fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let application = router(AppState::new(TaskStore::with_samples().into_shared()));
    tokio::spawn(async move {
        axum::serve(listener, application).await.unwrap();
    });
    format!("http://{address}/api")
}

#[tokio::test]
async fn buy_milk_scenario_over_http() {
    let api = HttpTaskApi::new(spawn_server().await);

    let created = api.create("Buy milk").await.unwrap();
    assert_eq!(created.title, "Buy milk");
    assert!(!created.completed);

    let updated = api.update(&created.id, &TaskPatch::completed(true)).await.unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);

    let completed = api.list(StatusFilter::Completed).await.unwrap();
    assert!(completed.iter().any(|task| task.id == created.id));
    assert!(completed.iter().all(|task| task.completed));

    api.delete(&created.id).await.unwrap();
    let all = api.list(StatusFilter::All).await.unwrap();
    assert!(all.iter().all(|task| task.id != created.id));

    let again = api.delete(&created.id).await;
    assert!(matches!(again, Err(ClientError::NotFound(id)) if id == created.id));
}

#[tokio::test]
async fn blank_title_is_rejected_with_400() {
    let api = HttpTaskApi::new(spawn_server().await);

    let result = api.create("  ").await;

    assert!(matches!(result, Err(ClientError::Rejected { status: 400, .. })));
}

#[tokio::test]
async fn client_reconciles_against_real_server() {
    let dir = tempfile::tempdir().unwrap();
    let api = HttpTaskApi::new(spawn_server().await);
    let mut client = TaskClient::new(api, LocalCache::new(dir.path().join("tasks.json")));
    client.start().await.unwrap();

    let ticket = client.add_task("Buy milk").unwrap();
    assert_eq!(client.settle(ticket).await.unwrap(), ActionPhase::Committed);

    let server = client.api().list(StatusFilter::All).await.unwrap();
    assert_eq!(client.board().tasks(), server.as_slice());
}

#[tokio::test]
async fn unreachable_server_is_a_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    let api = HttpTaskApi::new(format!("http://{address}/api"));

    let result = api.list(StatusFilter::All).await;

    assert!(matches!(result, Err(ClientError::Network(_))));
}
