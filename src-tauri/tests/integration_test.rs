//! Integration tests for Projetei
//!
//! These tests drive the full application state against a mock HTTP
//! backend, covering:
//! - Checklist-gated moves on the Kanban board
//! - Rollback when the backend rejects a move
//! - Overlapping actions on one task against a slow backend
//! - Header search and the dashboard filter
//! - Project creation and deletion with bookmarks

use projetei::api::TaskStatus;
use projetei::app::AppState;
use projetei::config::ClientConfig;
use projetei::error::AppError;
use projetei::events::{drain, ToastLevel, UiEvent};
use projetei::services::{DragEnd, FilterMode, SearchOutcome, TransitionError, TransitionOutcome};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Serves the given responses in order, repeating the last one
struct Sequence {
    responses: Vec<ResponseTemplate>,
    served: AtomicUsize,
}

impl Sequence {
    fn new(responses: Vec<ResponseTemplate>) -> Self {
        Self {
            responses,
            served: AtomicUsize::new(0),
        }
    }
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let index = self.served.fetch_add(1, Ordering::SeqCst);
        self.responses[index.min(self.responses.len() - 1)].clone()
    }
}

/// Helper to create application state pointed at a mock backend
async fn create_test_app() -> (AppState, MockServer, TempDir) {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    let config = ClientConfig {
        api_base_url: format!("{}/api", server.uri()),
        data_dir: temp_dir.path().to_path_buf(),
        ..ClientConfig::default()
    };
    let state = AppState::initialize(config).unwrap();

    (state, server, temp_dir)
}

fn checklist_task(status: &str, checked: [bool; 2]) -> Value {
    json!({
        "id": 1,
        "title": "Publish landing page",
        "description": null,
        "dueDate": "2025-06-01",
        "priority": "HIGH",
        "status": status,
        "checklist": [
            {"id": 10, "text": "Copy reviewed", "isChecked": checked[0]},
            {"id": 11, "text": "Assets uploaded", "completed": checked[1]}
        ],
        "comments": null
    })
}

fn abc_project(task: Value) -> Value {
    json!({
        "id": 1,
        "code": "ABC123",
        "name": "Launch",
        "description": "Spring launch",
        "dueDate": null,
        "tasks": [task]
    })
}

fn status_requests(requests: &[Request]) -> usize {
    requests
        .iter()
        .filter(|r| r.url.path() == "/api/tasks/1/status")
        .count()
}

fn toasts(events: &[UiEvent]) -> Vec<(String, ToastLevel)> {
    events
        .iter()
        .filter_map(|e| match e {
            UiEvent::Toast { message, level } => Some((message.clone(), *level)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_done_requires_complete_checklist_end_to_end() {
    let (state, server, _temp) = create_test_app().await;

    Mock::given(method("GET"))
        .and(path("/api/projects/by-code/ABC123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(abc_project(checklist_task("TODO", [false, false]))),
        )
        .mount(&server)
        .await;

    for id in [10, 11] {
        Mock::given(method("PATCH"))
            .and(path(format!("/api/checklist-items/{}", id)))
            .and(body_json(json!({"checked": true})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": id, "text": "item", "checked": true})),
            )
            .mount(&server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/api/tasks/1"))
        .respond_with(Sequence::new(vec![
            ResponseTemplate::new(200).set_body_json(checklist_task("TODO", [true, false])),
            ResponseTemplate::new(200).set_body_json(checklist_task("TODO", [true, true])),
            ResponseTemplate::new(200).set_body_json(checklist_task("DONE", [true, true])),
        ]))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/tasks/1/status"))
        .and(body_json(json!({"status": "DONE"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(checklist_task("DONE", [true, true])))
        .mount(&server)
        .await;

    let board = state.board.clone();
    board.load("ABC123").await.unwrap();
    let mut rx = state.events.subscribe();

    // Incomplete checklist: rejected, nothing sent
    let outcome = board
        .handle_drag_end(DragEnd::onto_column(1, TaskStatus::Done))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        TransitionOutcome::Rejected(TransitionError::ChecklistIncomplete { done: 0, total: 2 })
    );
    assert_eq!(board.task(1).await.unwrap().status, TaskStatus::Todo);
    assert_eq!(status_requests(&server.received_requests().await.unwrap()), 0);

    let rejected = toasts(&drain(&mut rx));
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].1, ToastLevel::Error);

    // Check both items, then retry
    board.toggle_checklist_item(1, 10).await.unwrap();
    let task = board.toggle_checklist_item(1, 11).await.unwrap();
    assert!(task.checklist_progress().is_complete());

    let outcome = board
        .handle_drag_end(DragEnd::onto_column(1, TaskStatus::Done))
        .await
        .unwrap();
    assert!(matches!(outcome, TransitionOutcome::Applied(ref t) if t.status == TaskStatus::Done));
    assert_eq!(board.task(1).await.unwrap().status, TaskStatus::Done);
    assert_eq!(status_requests(&server.received_requests().await.unwrap()), 1);

    let columns = board.columns().await.unwrap();
    assert!(columns.todo.is_empty());
    assert_eq!(columns.done.len(), 1);
}

#[tokio::test]
async fn test_rejected_move_reloads_snapshot() {
    let (state, server, _temp) = create_test_app().await;

    let plain_task = json!({
        "id": 1,
        "title": "Draft copy",
        "status": "TODO",
        "priority": null,
        "checklist": []
    });

    Mock::given(method("GET"))
        .and(path("/api/projects/by-code/ABC123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(abc_project(plain_task)))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/tasks/1/status"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "database unavailable"})))
        .mount(&server)
        .await;

    state.board.load("ABC123").await.unwrap();
    let mut rx = state.events.subscribe();

    let err = state
        .board
        .move_task(1, TaskStatus::Doing)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "HTTP 500 - database unavailable");

    // The optimistic DOING was discarded by the reload
    assert_eq!(state.board.task(1).await.unwrap().status, TaskStatus::Todo);

    let requests = server.received_requests().await.unwrap();
    let loads = requests
        .iter()
        .filter(|r| r.url.path() == "/api/projects/by-code/ABC123")
        .count();
    assert_eq!(loads, 2);

    let toasts = toasts(&drain(&mut rx));
    assert!(toasts
        .iter()
        .any(|(message, level)| *level == ToastLevel::Error && message.contains("Could not move")));
}

fn json_bodies(requests: &[Request], method_name: &str, request_path: &str) -> Vec<Value> {
    requests
        .iter()
        .filter(|r| r.method.as_str() == method_name && r.url.path() == request_path)
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn test_overlapping_toggles_send_alternating_flags() {
    let (state, server, _temp) = create_test_app().await;

    Mock::given(method("GET"))
        .and(path("/api/projects/by-code/ABC123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(abc_project(checklist_task("TODO", [false, false]))),
        )
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/checklist-items/10"))
        .respond_with(Sequence::new(vec![
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 10, "text": "Copy reviewed", "checked": true}))
                .set_delay(Duration::from_millis(100)),
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 10, "text": "Copy reviewed", "checked": false}))
                .set_delay(Duration::from_millis(100)),
        ]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/tasks/1"))
        .respond_with(Sequence::new(vec![
            ResponseTemplate::new(200).set_body_json(checklist_task("TODO", [true, false])),
            ResponseTemplate::new(200).set_body_json(checklist_task("TODO", [false, false])),
        ]))
        .mount(&server)
        .await;

    let board = state.board.clone();
    board.load("ABC123").await.unwrap();

    let (first, second) = tokio::join!(
        board.toggle_checklist_item(1, 10),
        board.toggle_checklist_item(1, 10)
    );
    assert!(first.unwrap().checklist[0].checked);
    assert!(!second.unwrap().checklist[0].checked);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        json_bodies(&requests, "PATCH", "/api/checklist-items/10"),
        vec![json!({"checked": true}), json!({"checked": false})]
    );
    assert!(!board.task(1).await.unwrap().checklist[0].checked);
}

#[tokio::test]
async fn test_overlapping_moves_wait_for_reconcile() {
    let (state, server, _temp) = create_test_app().await;

    let plain_task = |status: &str| {
        json!({"id": 1, "title": "Draft copy", "status": status, "checklist": []})
    };

    Mock::given(method("GET"))
        .and(path("/api/projects/by-code/ABC123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(abc_project(plain_task("TODO"))))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/tasks/1/status"))
        .respond_with(Sequence::new(vec![
            ResponseTemplate::new(200)
                .set_body_json(plain_task("DOING"))
                .set_delay(Duration::from_millis(100)),
            ResponseTemplate::new(200)
                .set_body_json(plain_task("DONE"))
                .set_delay(Duration::from_millis(100)),
        ]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/tasks/1"))
        .respond_with(Sequence::new(vec![
            ResponseTemplate::new(200).set_body_json(plain_task("DOING")),
            ResponseTemplate::new(200).set_body_json(plain_task("DONE")),
        ]))
        .mount(&server)
        .await;

    let board = state.board.clone();
    board.load("ABC123").await.unwrap();

    let (first, second) = tokio::join!(
        board.move_task(1, TaskStatus::Doing),
        board.move_task(1, TaskStatus::Done)
    );
    assert!(matches!(first.unwrap(), TransitionOutcome::Applied(ref t) if t.status == TaskStatus::Doing));
    assert!(matches!(second.unwrap(), TransitionOutcome::Applied(ref t) if t.status == TaskStatus::Done));

    // Each move is persisted and re-fetched before the next one starts
    let requests = server.received_requests().await.unwrap();
    let order: Vec<String> = requests
        .iter()
        .filter(|r| r.url.path().starts_with("/api/tasks/1"))
        .map(|r| format!("{} {}", r.method, r.url.path()))
        .collect();
    assert_eq!(
        order,
        vec![
            "PATCH /api/tasks/1/status",
            "GET /api/tasks/1",
            "PATCH /api/tasks/1/status",
            "GET /api/tasks/1",
        ]
    );
    assert_eq!(
        json_bodies(&requests, "PATCH", "/api/tasks/1/status"),
        vec![json!({"status": "DOING"}), json!({"status": "DONE"})]
    );
    assert_eq!(board.task(1).await.unwrap().status, TaskStatus::Done);
}

#[tokio::test]
async fn test_missing_board_project_leaves_no_snapshot() {
    let (state, server, _temp) = create_test_app().await;

    Mock::given(method("GET"))
        .and(path("/api/projects/by-code/NOPE42"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Project not found"})))
        .mount(&server)
        .await;

    let err = state.board.load("NOPE42").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(state.board.snapshot().await.is_none());
}

#[tokio::test]
async fn test_name_search_not_found_notifies_once() {
    let (state, server, _temp) = create_test_app().await;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "code": "ABC123", "name": "Launch", "tasks": []},
            {"id": 2, "code": "DEF456", "name": "Mobile app", "tasks": null}
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/projects/by-code/Website"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Project not found"})))
        .mount(&server)
        .await;

    let dashboard = state.dashboard.clone();
    let outcome = dashboard.submit_search("projetaidev").await.unwrap();
    assert!(matches!(outcome, SearchOutcome::DevMode(_)));

    dashboard.load_projects().await.unwrap();
    dashboard.set_filter(FilterMode::All).await;
    assert_eq!(dashboard.visible().await.len(), 2);

    let mut rx = state.events.subscribe();

    let outcome = dashboard.submit_search("Website").await.unwrap();
    assert_eq!(outcome, SearchOutcome::Name { matches: 0 });
    assert!(dashboard.visible().await.is_empty());

    let not_found = |events: &[UiEvent]| {
        toasts(events)
            .into_iter()
            .filter(|(message, _)| message.contains("Website"))
            .count()
    };
    assert_eq!(not_found(&drain(&mut rx)), 1);

    dashboard.submit_search("Website").await.unwrap();
    assert!(dashboard.visible().await.is_empty());
    assert_eq!(not_found(&drain(&mut rx)), 0);
}

#[tokio::test]
async fn test_created_project_shows_under_my_projects() {
    let (state, server, _temp) = create_test_app().await;

    Mock::given(method("POST"))
        .and(path("/api/projects"))
        .and(body_json(json!({"name": "Website"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 7, "code": "WEB777", "name": "Website", "tasks": []
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "code": "ABC123", "name": "Launch"},
            {"id": 7, "code": "WEB777", "name": "Website"},
            {"id": 9, "code": "XYZ999", "name": "Internal tools"}
        ])))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/projects/7"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let created = state
        .projects
        .create_project(" Website ", None, None)
        .await
        .unwrap();
    assert_eq!(created.code, "WEB777");
    assert!(state.bookmarks.contains(&created));

    // Dev mode is off, so only bookmarked projects are visible
    state.dashboard.load_projects().await.unwrap();
    state.dashboard.set_filter(FilterMode::All).await;
    let visible = state.dashboard.visible().await;
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].code, "WEB777");

    state
        .projects
        .delete_project(created.id, Some(&created.code))
        .await
        .unwrap();
    assert!(state.bookmarks.list().is_empty());
    assert!(state.dashboard.visible().await.is_empty());
}

#[tokio::test]
async fn test_bookmarks_survive_restart() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let config = ClientConfig {
        api_base_url: format!("{}/api", server.uri()),
        data_dir: temp_dir.path().to_path_buf(),
        ..ClientConfig::default()
    };

    let first = AppState::initialize(config.clone()).unwrap();
    let record = projetei::services::BookmarkRecord {
        code: "ABC123".to_string(),
        id: "1".to_string(),
        name: "Launch".to_string(),
    };
    assert!(first.bookmarks.add_record(record.clone()).unwrap());
    first.shutdown();

    let second = AppState::initialize(config).unwrap();
    assert_eq!(second.bookmarks.list(), vec![record]);
}

#[tokio::test]
async fn test_invalid_api_url_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config = ClientConfig {
        api_base_url: "not a url".to_string(),
        data_dir: temp_dir.path().to_path_buf(),
        ..ClientConfig::default()
    };

    assert!(matches!(
        AppState::initialize(config),
        Err(AppError::InvalidInput(_))
    ));
}
