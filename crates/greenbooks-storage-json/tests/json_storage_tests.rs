use greenbooks_config::Config;
use greenbooks_core::{AccountService, BooksStorage};
use greenbooks_domain::Books;
use greenbooks_storage_json::{JsonBooksStorage, StoragePaths};
use tempfile::tempdir;

fn storage_in(dir: &std::path::Path) -> JsonBooksStorage {
    let paths = StoragePaths {
        books_root: dir.join("books"),
        backup_root: dir.join("backups"),
    };
    JsonBooksStorage::new(paths).expect("create storage")
}

fn seeded_books(name: &str) -> Books {
    let mut books = Books::new(name);
    AccountService::seed_default_chart(&mut books).unwrap();
    books
}

#[test]
fn save_and_load_round_trips_a_snapshot() {
    let dir = tempdir().expect("tempdir");
    let storage = storage_in(dir.path());

    let books = seeded_books("Riverside Parks");
    storage.save_books("riverside", &books).expect("save");

    let loaded = storage.load_books("riverside").expect("load");
    assert_eq!(loaded.name, "Riverside Parks");
    assert_eq!(loaded.accounts.len(), books.accounts.len());
    assert!(storage.books_path("riverside").exists());
    assert_eq!(storage.list_books().unwrap(), vec!["riverside".to_string()]);
}

#[test]
fn backups_can_be_listed_and_restored() {
    let dir = tempdir().expect("tempdir");
    let storage = storage_in(dir.path());

    let books = seeded_books("Backup Target");
    storage.save_books("target", &books).expect("save");
    let info = storage
        .backup_books("target", &books, Some("before migration"))
        .expect("backup");
    assert!(info.id.contains("before-migration"));

    let backups = storage.list_backups("target").expect("list");
    assert!(backups.iter().any(|entry| entry.id == info.id));

    storage.delete_books("target").expect("delete");
    assert!(storage.list_books().unwrap().is_empty());

    let restored = storage.restore_backup(&info).expect("restore");
    assert_eq!(restored.name, "Backup Target");
    assert_eq!(storage.list_books().unwrap(), vec!["target".to_string()]);
}

#[test]
fn retention_prunes_the_oldest_backups() {
    let dir = tempdir().expect("tempdir");
    let paths = StoragePaths {
        books_root: dir.path().join("books"),
        backup_root: dir.path().join("backups"),
    };
    let storage = JsonBooksStorage::with_retention(paths, 2).expect("create storage");

    let books = seeded_books("Pruned");
    for note in ["one", "two", "three"] {
        storage
            .backup_books("pruned", &books, Some(note))
            .expect("backup");
    }
    let backups = storage.list_backups("pruned").expect("list");
    assert!(backups.len() <= 2, "retention must cap stored backups");
}

#[test]
fn metadata_lists_stored_snapshots() {
    let dir = tempdir().expect("tempdir");
    let storage = storage_in(dir.path());

    storage
        .save_books("alpha", &seeded_books("Alpha Parks"))
        .unwrap();
    storage
        .save_books("beta", &seeded_books("Beta Parks"))
        .unwrap();

    let metadata = storage.list_books_metadata().expect("metadata");
    assert_eq!(metadata.len(), 2);
    assert_eq!(metadata[0].name, "Alpha Parks");
    assert_eq!(metadata[0].account_count, 19);
    assert_eq!(metadata[1].slug, "beta");
}

#[test]
fn storage_roots_can_come_from_the_config() {
    let dir = tempdir().expect("tempdir");
    let mut config = Config::default();
    config.data_root = Some(dir.path().join("data"));
    config.backup_root = Some(dir.path().join("backups"));
    config.backup_retention = 3;

    let paths = StoragePaths {
        books_root: config.resolve_data_root(),
        backup_root: config.resolve_backup_root(),
    };
    let storage =
        JsonBooksStorage::with_retention(paths, config.backup_retention).expect("create storage");
    storage
        .save_books("configured", &seeded_books("Configured"))
        .expect("save");
    assert!(dir.path().join("data").join("configured.json").exists());
}
