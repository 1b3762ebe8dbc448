//! Integration tests for `todo_core`.

use tempfile::TempDir;
use todo_core::storage::{BlobStore, SqliteBlobStore};
use todo_core::todo::{Priority, SequentialIdGenerator, ServiceConfig, Snapshot, TodoService};
use todo_core::VERSION;

#[test]
fn test_version_exists() {
    assert!(!VERSION.is_empty());
}

fn sqlite_service(dir: &TempDir) -> TodoService {
    let store = SqliteBlobStore::new(dir.path().join("todos.sqlite3")).unwrap();
    TodoService::with_parts(
        Box::new(store),
        Box::new(SequentialIdGenerator::new()),
        ServiceConfig::default(),
    )
}

#[test]
fn test_lifecycle_against_sqlite() {
    let dir = TempDir::new().unwrap();
    let mut service = sqlite_service(&dir);

    let first = service.add("Buy milk").unwrap();
    service.add_with_priority("Call bank", Priority::High).unwrap();
    assert_eq!(service.stats().total, 2);

    service.toggle(first.id()).unwrap();
    let stats = service.stats();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.pending, 1);

    service.clear_completed().unwrap();
    let remaining = service.all();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].text(), "Call bank");

    // The collection survives a fresh service over the same database.
    drop(service);
    let reloaded = sqlite_service(&dir);
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.all()[0].text(), "Call bank");
}

#[test]
fn test_backup_and_restore_against_sqlite() {
    let dir = TempDir::new().unwrap();
    let mut service = sqlite_service(&dir);

    service.add("one").unwrap();
    service.add("two").unwrap();
    service.backup().unwrap();

    let ids: Vec<String> = service.all().iter().map(|t| t.id().to_string()).collect();
    service.remove_many(&ids).unwrap();
    assert!(service.is_empty());

    assert!(service.restore_from_backup());
    assert_eq!(service.len(), 2);
}

#[test]
fn test_export_import_round_trip_preserves_items() {
    let dir = TempDir::new().unwrap();
    let mut source = sqlite_service(&dir);
    source.add("carry me over").unwrap();
    source.add_with_priority("and me", Priority::Critical).unwrap();

    let snapshot: Snapshot = source.export();
    let json = serde_json::to_string(&snapshot).unwrap();

    let target_dir = TempDir::new().unwrap();
    let mut target = sqlite_service(&target_dir);
    assert_eq!(target.import(&json).unwrap(), 2);

    let originals = source.all();
    let imported = target.all();
    assert_eq!(imported.len(), originals.len());
    for (original, copy) in originals.iter().zip(&imported) {
        assert_eq!(copy.id(), original.id());
        assert_eq!(copy.text(), original.text());
        assert_eq!(copy.created_at(), original.created_at());
        assert_eq!(copy.updated_at(), original.updated_at());
    }
}

#[test]
fn test_blob_store_trait_object() {
    let dir = TempDir::new().unwrap();
    let store: Box<dyn BlobStore> =
        Box::new(SqliteBlobStore::new(dir.path().join("kv.sqlite3")).unwrap());
    store.write("k", "v").unwrap();
    assert_eq!(store.read("k").unwrap().as_deref(), Some("v"));
}
