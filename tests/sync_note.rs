// Sync routine: fetch -> map -> render -> replace.
use async_trait::async_trait;
use clicknote::client::{ApiError, ApiResult, ClickUpClient, TaskSource};
use clicknote::model::{DateZone, PriorityColumn, RowOptions, Task, map_rows, render_table};
use clicknote::sync::{SyncError, SyncOutcome, Syncer, render_list};
use clicknote::vault::{MemoryVault, Note, NoteStore, StoreError, StoreResult};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const LIST: &str = "900123456789";
const NOTE: &str = "ClickUp Sprint [900123456789].md";

fn task(id: &str, name: &str, assignees: &[&str]) -> Task {
    let assignees: Vec<_> = assignees.iter().map(|u| json!({"username": u})).collect();
    serde_json::from_value(json!({
        "id": id,
        "name": name,
        "status": {"status": "open"},
        "date_created": "1700000000000",
        "creator": {"username": "alice"},
        "assignees": assignees,
        "priority": null
    }))
    .unwrap()
}

fn legacy_utc() -> RowOptions {
    RowOptions {
        priority: PriorityColumn::Legacy,
        zone: DateZone::Utc,
    }
}

struct StubSource {
    result: ApiResult<Vec<Task>>,
    calls: AtomicUsize,
}

impl StubSource {
    fn ok(tasks: Vec<Task>) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(tasks),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            result: Err(ApiError::Remote {
                endpoint: "/list/900123456789/task".to_string(),
                message: "connection refused".to_string(),
            }),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TaskSource for StubSource {
    async fn get_tasks(&self, _list_id: &str) -> ApiResult<Vec<Task>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Counts mutations and can fail the next create.
#[derive(Default)]
struct RecordingStore {
    inner: MemoryVault,
    deletes: AtomicUsize,
    creates: AtomicUsize,
    fail_next_create: AtomicBool,
}

impl RecordingStore {
    fn with_note(path: &str, content: &str) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryVault::with_notes([(path, content)]),
            ..Self::default()
        })
    }

    fn mutations(&self) -> usize {
        self.deletes.load(Ordering::SeqCst) + self.creates.load(Ordering::SeqCst)
    }
}

impl NoteStore for RecordingStore {
    fn list_notes(&self) -> StoreResult<Vec<Note>> {
        self.inner.list_notes()
    }

    fn read_note(&self, path: &str) -> StoreResult<String> {
        self.inner.read_note(path)
    }

    fn delete_note(&self, path: &str) -> StoreResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_note(path)
    }

    fn create_note(&self, path: &str, content: &str) -> StoreResult<Note> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(StoreError::io(path, "disk full"));
        }
        self.inner.create_note(path, content)
    }
}

#[test]
fn test_scenario_single_task_row() {
    let rows = map_rows(&[task("1", "Fix bug", &["bob"])], legacy_utc());

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.id, "1");
    assert_eq!(row.order, 1);
    assert_eq!(row.name, "Fix bug");
    assert_eq!(row.status, "open");
    assert_eq!(row.date_created, "11/14/2023, 10:13:20 PM");
    assert_eq!(row.creator, "alice");
    assert_eq!(row.assignees, vec!["bob"]);
    assert_eq!(row.priority, vec!["Low", "Medium", "High", "Critical"]);
}

#[test]
fn test_derived_priority_uses_record() {
    let mut urgent = task("1", "Fix bug", &[]);
    urgent.priority = serde_json::from_value(json!({"id": "1", "priority": "urgent"})).unwrap();
    let plain = task("2", "Docs", &[]);

    let rows = map_rows(&[urgent, plain], RowOptions::default());
    assert_eq!(rows[0].priority, vec!["Urgent"]);
    assert!(rows[1].priority.is_empty());
}

#[test]
fn test_rows_follow_fetch_order() {
    let tasks: Vec<Task> = (0..5)
        .map(|i| task(&format!("t{}", i), &format!("Task {}", i), &[]))
        .collect();
    let rows = map_rows(&tasks, legacy_utc());

    let orders: Vec<usize> = rows.iter().map(|r| r.order).collect();
    assert_eq!(orders, vec![1, 2, 3, 4, 5]);
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["t0", "t1", "t2", "t3", "t4"]);

    let table = render_table(&rows);
    assert_eq!(table.lines().count(), 2 + 5);
}

#[test]
fn test_two_tasks_render_two_rows() {
    let table = render_list(
        &[task("1", "Fix bug", &["bob"]), task("2", "Ship", &[])],
        legacy_utc(),
    );
    let data: Vec<&str> = table.lines().skip(2).collect();
    assert_eq!(data.len(), 2);
    let second_order = data[1].split('|').nth(2).unwrap().trim();
    assert_eq!(second_order, "2");
}

#[test]
fn test_empty_list_renders_header_only() {
    let table = render_list(&[], RowOptions::default());
    assert_eq!(table.lines().count(), 2);
    assert!(table.starts_with("| id "));
}

#[test]
fn test_rendering_is_deterministic() {
    let tasks = vec![task("1", "Fix | pipe", &["bob", "carol"]), task("2", "x\ny", &[])];
    assert_eq!(
        render_list(&tasks, legacy_utc()),
        render_list(&tasks, legacy_utc())
    );
}

#[tokio::test]
async fn test_sync_replaces_note_with_table() {
    let store = RecordingStore::with_note(NOTE, "stale content");
    let source = StubSource::ok(vec![task("1", "Fix bug", &["bob"]), task("2", "Ship", &[])]);
    let syncer = Syncer::new(source.clone(), store.clone(), "ClickUp", legacy_utc());

    let outcome = syncer.sync_list(LIST).await.unwrap();

    assert_eq!(
        outcome,
        SyncOutcome::Updated {
            path: NOTE.to_string(),
            rows: 2
        }
    );
    let body = store.read_note(NOTE).unwrap();
    assert!(!body.contains("stale content"));
    assert_eq!(body, render_list(&source.result.clone().unwrap(), legacy_utc()));
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_scenario_record_without_user_ids_syncs() {
    let mut server = Server::new_async().await;
    let _tasks = server
        .mock("GET", "/list/900123456789/task")
        .match_query(Matcher::Any)
        .with_body(
            r#"{"tasks":[{"id":"1","name":"Fix bug","status":{"status":"open"},"date_created":"1700000000000","creator":{"username":"alice"},"assignees":[{"username":"bob"}]}]}"#,
        )
        .create_async()
        .await;

    let client = Arc::new(ClickUpClient::new(&server.url(), "pk", 5).unwrap());
    let store = Arc::new(MemoryVault::with_notes([(NOTE, "old")]));
    let syncer = Syncer::new(client, store.clone(), "ClickUp", legacy_utc());

    let outcome = syncer.sync_list(LIST).await.unwrap();

    assert_eq!(
        outcome,
        SyncOutcome::Updated {
            path: NOTE.to_string(),
            rows: 1
        }
    );
    let body = store.read_note(NOTE).unwrap();
    let row = body.lines().nth(2).unwrap();
    for cell in ["Fix bug", "open", "11/14/2023, 10:13:20 PM", "alice", "bob"] {
        assert!(row.contains(cell), "{} missing from {}", cell, row);
    }
    assert!(row.contains("Low, Medium, High, Critical"));
}

#[tokio::test]
async fn test_missing_note_is_a_soft_noop() {
    let store = RecordingStore::with_note("ClickUp Other [1].md", "keep");
    let source = StubSource::ok(vec![task("1", "Fix bug", &[])]);
    let syncer = Syncer::new(source.clone(), store.clone(), "ClickUp", legacy_utc());

    let outcome = syncer.sync_list(LIST).await.unwrap();

    assert_eq!(outcome, SyncOutcome::NoteNotFound);
    assert_eq!(store.mutations(), 0);
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.read_note("ClickUp Other [1].md").unwrap(), "keep");
}

#[tokio::test]
async fn test_fetch_failure_leaves_note_untouched() {
    let store = RecordingStore::with_note(NOTE, "previous table");
    let syncer = Syncer::new(StubSource::failing(), store.clone(), "ClickUp", legacy_utc());

    let err = syncer.sync_list(LIST).await.unwrap_err();

    assert!(matches!(err, SyncError::Remote(ApiError::Remote { .. })));
    assert_eq!(store.mutations(), 0);
    assert_eq!(store.read_note(NOTE).unwrap(), "previous table");
}

#[tokio::test]
async fn test_failed_create_restores_previous_content() {
    let store = RecordingStore::with_note(NOTE, "previous table");
    store.fail_next_create.store(true, Ordering::SeqCst);
    let source = StubSource::ok(vec![task("1", "Fix bug", &[])]);
    let syncer = Syncer::new(source, store.clone(), "ClickUp", legacy_utc());

    let err = syncer.sync_list(LIST).await.unwrap_err();

    assert!(matches!(err, SyncError::Store(StoreError::Io { .. })));
    assert_eq!(store.read_note(NOTE).unwrap(), "previous table");
}

#[tokio::test]
async fn test_first_of_several_matching_notes_is_used() {
    let store = Arc::new(MemoryVault::with_notes([
        ("ClickUp b [900123456789].md", "b"),
        ("ClickUp a [900123456789].md", "a"),
    ]));
    let syncer = Syncer::new(
        StubSource::ok(vec![]),
        store.clone(),
        "ClickUp",
        legacy_utc(),
    );

    let outcome = syncer.sync_list(LIST).await.unwrap();

    assert_eq!(
        outcome,
        SyncOutcome::Updated {
            path: "ClickUp a [900123456789].md".to_string(),
            rows: 0
        }
    );
    assert_eq!(store.read_note("ClickUp b [900123456789].md").unwrap(), "b");
}

/// Tracks how many fetches run at the same time.
struct SlowSource {
    active: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl TaskSource for SlowSource {
    async fn get_tasks(&self, _list_id: &str) -> ApiResult<Vec<Task>> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(vec![])
    }
}

fn slow_setup() -> (Arc<SlowSource>, Syncer) {
    let source = Arc::new(SlowSource {
        active: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let store = Arc::new(MemoryVault::with_notes([
        ("ClickUp [1].md", ""),
        ("ClickUp [2].md", ""),
    ]));
    let syncer = Syncer::new(source.clone(), store, "ClickUp", RowOptions::default());
    (source, syncer)
}

#[tokio::test]
async fn test_syncs_of_one_list_are_serialized() {
    let (source, syncer) = slow_setup();

    let (a, b) = tokio::join!(syncer.sync_list("1"), syncer.sync_list("1"));

    assert!(a.is_ok() && b.is_ok());
    assert_eq!(source.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_different_lists_sync_concurrently() {
    let (source, syncer) = slow_setup();

    let (a, b) = tokio::join!(syncer.sync_list("1"), syncer.sync_list("2"));

    assert!(a.is_ok() && b.is_ok());
    assert_eq!(source.peak.load(Ordering::SeqCst), 2);
}
