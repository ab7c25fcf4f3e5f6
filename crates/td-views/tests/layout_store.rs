use std::sync::Arc;

use parking_lot::Mutex;
use td_core::events::{LayoutChanged, WidgetAdded};
use td_core::EventBus;
use td_data::ChartKind;
use td_views::{Dashboard, JsonFileLayoutStore, LayoutStore};

#[test]
fn test_layout_restored_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layout.json");

    let mut dashboard = Dashboard::new(12, Box::new(JsonFileLayoutStore::new(&path)));
    let id = dashboard.add_widget(ChartKind::Radar);
    dashboard.resize_widget(&id, 5, 6).unwrap();
    assert!(path.exists());

    let restored = Dashboard::new(12, Box::new(JsonFileLayoutStore::new(&path)));
    assert_eq!(restored.widgets(), dashboard.widgets());
    let radar = restored.widget(&id).unwrap();
    assert_eq!((radar.rect.w, radar.rect.h), (5, 6));
}

#[test]
fn test_missing_file_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileLayoutStore::new(dir.path().join("absent.json"));
    assert!(store.load().unwrap().is_none());
}

#[test]
fn test_malformed_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layout.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = JsonFileLayoutStore::new(&path);
    assert!(store.load().is_err());
    let dashboard = Dashboard::new(12, Box::new(store));
    assert_eq!(dashboard.widgets().len(), 4);
}

#[test]
fn test_mutations_publish_events() {
    let bus = Arc::new(EventBus::new());
    let added = Arc::new(Mutex::new(Vec::new()));
    let layout_changes = Arc::new(Mutex::new(0usize));

    let sink = added.clone();
    bus.subscribe(move |event: &WidgetAdded| sink.lock().push(event.kind.clone()));
    let counter = layout_changes.clone();
    bus.subscribe(move |_: &LayoutChanged| *counter.lock() += 1);

    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileLayoutStore::new(dir.path().join("l.json"));
    let mut dashboard = Dashboard::new(12, Box::new(store)).with_event_bus(bus);
    dashboard.add_widget(ChartKind::Text);
    dashboard.delete_widget("enrollmentLine").unwrap();

    assert_eq!(*added.lock(), vec!["Text".to_string()]);
    assert_eq!(*layout_changes.lock(), 2);
}
