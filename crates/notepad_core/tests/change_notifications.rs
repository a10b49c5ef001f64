use notepad_core::{
    fields, open_store, ChangeObserver, FieldValues, Predicate, ReadQuery, SqliteContentService,
    StoreConfig, StoreError,
};
use std::sync::{Arc, Mutex};

fn store() -> SqliteContentService {
    open_store(&StoreConfig::default()).unwrap()
}

fn recorder() -> (Arc<Mutex<Vec<String>>>, Arc<dyn ChangeObserver>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let observer = move |path: &str| sink.lock().unwrap().push(path.to_string());
    (seen, Arc::new(observer))
}

#[test]
fn collection_subscriber_hears_create_then_record_update() {
    let store = store();
    let (seen, observer) = recorder();
    store.subscribe("/notes", observer).unwrap();

    let path = store
        .create("/notes", &FieldValues::new().with(fields::BODY, "draft"))
        .unwrap();
    store
        .update(&path, &FieldValues::new().with(fields::BODY, "final"), None)
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["/notes".to_string(), path]);
}

#[test]
fn record_subscriber_ignores_siblings_and_collection_creates() {
    let store = store();
    let first = store.create("/todos", &FieldValues::new()).unwrap();
    let second = store.create("/todos", &FieldValues::new()).unwrap();

    let (seen, observer) = recorder();
    store.subscribe(&first, observer).unwrap();

    store.create("/todos", &FieldValues::new()).unwrap();
    store.delete(&second, None).unwrap();
    store.delete(&first, None).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![first]);
}

#[test]
fn aggregate_view_subscriber_hears_every_note_mutation() {
    let store = store();
    let (seen, observer) = recorder();
    store.subscribe("/notes/aggregate", observer).unwrap();

    let path = store
        .create("/notes", &FieldValues::new().with(fields::TITLE, "Folder entry"))
        .unwrap();
    store
        .update(&path, &FieldValues::new().with(fields::TITLE, "Renamed"), None)
        .unwrap();
    store.delete(&path, None).unwrap();
    store.create("/todos", &FieldValues::new()).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["/notes".to_string(), path.clone(), path]
    );
}

#[test]
fn bulk_mutations_notify_the_collection_once_even_without_matches() {
    let store = store();
    let (seen, observer) = recorder();
    store.subscribe("/todos", observer).unwrap();

    let none = Predicate::field_equals(fields::TEXT, "missing");
    assert_eq!(
        store
            .update("/todos", &FieldValues::new().with(fields::COMPLETED, true), Some(&none))
            .unwrap(),
        0
    );
    assert_eq!(store.delete("/todos", Some(&none)).unwrap(), 0);

    assert_eq!(*seen.lock().unwrap(), vec!["/todos", "/todos"]);
}

#[test]
fn failed_mutations_and_reads_do_not_notify() {
    let store = store();
    let (seen, observer) = recorder();
    store.subscribe("/notes", observer).unwrap();

    store.read("/notes", &ReadQuery::all()).unwrap();
    store
        .create("/notes", &FieldValues::new().with("color", "#000000"))
        .unwrap_err();
    store.delete("/notes/aggregate", None).unwrap_err();

    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn observer_can_read_committed_state_during_delivery() {
    let store = Arc::new(store());
    let counts = Arc::new(Mutex::new(Vec::new()));

    let reader = Arc::downgrade(&store);
    let sink = Arc::clone(&counts);
    store
        .subscribe(
            "/notes",
            Arc::new(move |_: &str| {
                if let Some(store) = reader.upgrade() {
                    let rows = store.read("/notes", &ReadQuery::all()).unwrap();
                    sink.lock().unwrap().push(rows.len());
                }
            }),
        )
        .unwrap();

    store.create("/notes", &FieldValues::new()).unwrap();
    store.create("/notes", &FieldValues::new()).unwrap();
    store.delete("/notes", None).unwrap();

    assert_eq!(*counts.lock().unwrap(), vec![1, 2, 0]);
}

#[test]
fn subscribe_validates_paths_and_unsubscribe_stops_delivery() {
    let store = store();
    let (seen, observer) = recorder();

    assert!(matches!(
        store.subscribe("/nope", Arc::clone(&observer)),
        Err(StoreError::UnknownResource(_))
    ));

    let id = store.subscribe("/todos", observer).unwrap();
    store.create("/todos", &FieldValues::new()).unwrap();
    assert!(store.unsubscribe(id));
    store.create("/todos", &FieldValues::new()).unwrap();

    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(store.hub().subscription_count(), 0);
}
