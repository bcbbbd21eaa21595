//! Event routing integration tests
//! Run with: cargo test --test events_test

use std::sync::{Arc, Mutex, Once};

use botbase::application::errors::HandlerError;
use botbase::domain::entities::{ClientEvent, EventData, READY};
use botbase::domain::traits::Bot;
use botbase::infrastructure::adapters::ConsoleAdapter;
use botbase::infrastructure::config::{EventExecution, HandlerConfig};
use botbase::{EventHandler, HandlerTable};
use tempfile::TempDir;

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

type Log = Arc<Mutex<Vec<String>>>;

fn recording_table(log: &Log, tags: &[&str]) -> HandlerTable {
    let mut table = HandlerTable::new();
    for tag in tags {
        let (log, tag) = (log.clone(), tag.to_string());
        table = table.event(tag.clone(), move |_ctx| {
            let (log, tag) = (log.clone(), tag.clone());
            async move {
                log.lock().unwrap().push(tag.clone());
                if tag == "boom" {
                    return Err(HandlerError::ExecutionFailed("listener exploded".into()));
                }
                Ok(())
            }
        });
    }
    table
}

fn events_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn event_handler(dir: &TempDir, adapter: &Arc<ConsoleAdapter>, table: HandlerTable, execution: EventExecution) -> EventHandler {
    ensure_init();
    let config = HandlerConfig {
        events_dir: dir.path().to_path_buf(),
        suppress_warnings: true,
        event_execution: execution,
        ..HandlerConfig::default()
    };
    let bot: Arc<dyn Bot> = adapter.clone();
    EventHandler::new(config, bot, Arc::new(table)).unwrap()
}

fn ready(adapter: &ConsoleAdapter) -> ClientEvent {
    ClientEvent::Ready(adapter.bot_info())
}

#[tokio::test]
async fn test_listeners_run_in_run_order() {
    let log: Log = Arc::default();
    let table = recording_table(&log, &["five", "one", "unordered", "two"]);
    let dir = events_dir(&[
        ("a.yaml", "kind: event\ncategory: ready\nrun-order: 5\nhandler: five\n"),
        ("b.yaml", "kind: event\ncategory: ready\nrun-order: 1\nhandler: one\n"),
        ("c.yaml", "kind: event\ncategory: ready\nhandler: unordered\n"),
        ("d.yaml", "kind: event\ncategory: ready\nrun-order: 2\nhandler: two\n"),
    ]);
    let adapter = Arc::new(ConsoleAdapter::new());
    let handler = event_handler(&dir, &adapter, table, EventExecution::Sequential);

    handler.set_events(adapter.as_ref()).await;
    assert_eq!(adapter.subscriber_count(READY), 1);
    assert_eq!(handler.get_event_category(READY).unwrap().len(), 4);

    adapter.emit(ready(&adapter)).await;
    assert_eq!(*log.lock().unwrap(), vec!["one", "two", "five", "unordered"]);
}

#[tokio::test]
async fn test_failing_listener_does_not_stop_others() {
    let log: Log = Arc::default();
    let table = recording_table(&log, &["boom", "after"]);
    let dir = events_dir(&[
        ("a.yaml", "kind: event\ncategory: ready\nrun-order: 1\nhandler: boom\n"),
        ("b.yaml", "kind: event\ncategory: ready\nrun-order: 2\nhandler: after\n"),
    ]);
    let adapter = Arc::new(ConsoleAdapter::new());
    let handler = event_handler(&dir, &adapter, table, EventExecution::Sequential);
    handler.set_events(adapter.as_ref()).await;

    let outcome = handler.dispatch(ready(&adapter)).await;

    assert_eq!(outcome.ran, 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].0, 0);
    assert_eq!(*log.lock().unwrap(), vec!["boom", "after"]);
}

#[tokio::test]
async fn test_concurrent_execution_runs_all() {
    let log: Log = Arc::default();
    let table = recording_table(&log, &["boom", "after"]);
    let dir = events_dir(&[
        ("a.yaml", "kind: event\ncategory: ready\nhandler: boom\n"),
        ("b.yaml", "kind: event\ncategory: ready\nhandler: after\n"),
    ]);
    let adapter = Arc::new(ConsoleAdapter::new());
    let handler = event_handler(&dir, &adapter, table, EventExecution::Concurrent);
    handler.set_events(adapter.as_ref()).await;

    let outcome = handler.dispatch(ready(&adapter)).await;

    assert_eq!(outcome.ran, 2);
    assert_eq!(outcome.succeeded(), 1);
    assert_eq!(log.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_set_events_is_idempotent_and_clearable() {
    let log: Log = Arc::default();
    let table = recording_table(&log, &["one", "two"]);
    let dir = events_dir(&[
        ("a.yaml", "kind: event\ncategory: ready\nhandler: one\n"),
        ("b.yaml", "kind: event\ncategory: custom\nhandler: two\n"),
    ]);
    let adapter = Arc::new(ConsoleAdapter::new());
    let handler = event_handler(&dir, &adapter, table, EventExecution::Sequential);

    handler.set_events(adapter.as_ref()).await;
    handler.set_events(adapter.as_ref()).await;
    assert_eq!(adapter.subscriber_count(READY), 1);
    assert_eq!(adapter.subscriber_count("custom"), 1);
    assert_eq!(handler.get_events().len(), 2);

    adapter.emit(ready(&adapter)).await;
    assert_eq!(*log.lock().unwrap(), vec!["one"]);

    handler.clear_events(adapter.as_ref());
    assert_eq!(adapter.subscriber_count(READY), 0);
    assert_eq!(adapter.subscriber_count("custom"), 0);
    assert!(handler.get_events().is_empty());

    adapter.emit(ready(&adapter)).await;
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_add_listeners_in_code() {
    let log: Log = Arc::default();
    let adapter = Arc::new(ConsoleAdapter::new());
    let dir = events_dir(&[]);
    let handler = event_handler(&dir, &adapter, HandlerTable::new(), EventExecution::Sequential);

    let (first, second) = (log.clone(), log.clone());
    let listeners = vec![
        EventData::new("custom")
            .handler(move |_ctx| {
                let log = first.clone();
                async move {
                    log.lock().unwrap().push("late".to_string());
                    Ok(())
                }
            })
            .build()
            .unwrap(),
        EventData::new("custom")
            .run_order(0)
            .handler(move |_ctx| {
                let log = second.clone();
                async move {
                    log.lock().unwrap().push("early".to_string());
                    Ok(())
                }
            })
            .build()
            .unwrap(),
    ];
    handler.add_listeners(adapter.as_ref(), listeners);
    assert_eq!(adapter.subscriber_count("custom"), 1);

    adapter.emit(ClientEvent::custom("custom", serde_json::json!({ "n": 1 }))).await;
    assert_eq!(*log.lock().unwrap(), vec!["early", "late"]);
}

#[tokio::test]
async fn test_unknown_category_dispatch() {
    let adapter = Arc::new(ConsoleAdapter::new());
    let dir = events_dir(&[]);
    let handler = event_handler(&dir, &adapter, HandlerTable::new(), EventExecution::Sequential);
    handler.set_events(adapter.as_ref()).await;

    let outcome = handler.dispatch(ClientEvent::custom("nothing", serde_json::Value::Null)).await;
    assert_eq!(outcome.ran, 0);
}
