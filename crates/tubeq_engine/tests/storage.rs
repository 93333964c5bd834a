use std::fs;

use tempfile::TempDir;
use tubeq_engine::{origin_scope, OriginStorage};

#[test]
fn missing_key_reads_as_none() {
    let temp = TempDir::new().unwrap();
    let storage = OriginStorage::for_origin(temp.path(), "http://127.0.0.1:5000");
    assert_eq!(storage.read("theme").unwrap(), None);
    assert!(!storage.remove("theme").unwrap());
}

#[test]
fn write_creates_scope_dir_and_replaces_value() {
    let temp = TempDir::new().unwrap();
    let storage = OriginStorage::for_origin(temp.path(), "http://127.0.0.1:5000");
    assert_eq!(
        storage.dir(),
        temp.path().join(origin_scope("http://127.0.0.1:5000"))
    );

    let first = storage.write("theme", "dark").unwrap();
    assert_eq!(fs::read_to_string(&first).unwrap(), "dark");
    let second = storage.write("theme", "light").unwrap();
    assert_eq!(first, second);
    assert_eq!(storage.read("theme").unwrap().as_deref(), Some("light"));

    assert!(storage.remove("theme").unwrap());
    assert_eq!(storage.read("theme").unwrap(), None);
}

#[test]
fn origins_do_not_share_values() {
    let temp = TempDir::new().unwrap();
    let local = OriginStorage::for_origin(temp.path(), "http://127.0.0.1:5000");
    let remote = OriginStorage::for_origin(temp.path(), "https://tubes.example.org");

    local.write("ytmp3_history_v1.json", "[]").unwrap();
    assert_eq!(remote.read("ytmp3_history_v1.json").unwrap(), None);
}

#[test]
fn write_fails_when_scope_path_is_a_file() {
    let temp = TempDir::new().unwrap();
    let blocked = temp.path().join("blocked");
    fs::write(&blocked, "x").unwrap();

    let storage = OriginStorage::new(blocked.clone());
    assert!(storage.write("theme", "dark").is_err());
    assert_eq!(fs::read_to_string(&blocked).unwrap(), "x");
}
