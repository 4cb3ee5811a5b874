use sitegen_core::files::VirtualFile;
use sitegen_core::site::GenerationConfig;
use sitegen_core::storage::{ProjectStore, validate_project_id};
use sitegen_core::version::{Trigger, VersionStatus};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

fn store() -> (TempDir, ProjectStore) {
    let tmp = TempDir::new().unwrap();
    let store = ProjectStore::new(tmp.path());
    (tmp, store)
}

#[test]
fn test_version_numbers_increase() {
    let (_tmp, store) = store();
    let v1 = store.create_version("acme", Trigger::Create, None).unwrap();
    let v2 = store.create_version("acme", Trigger::Edit, Some(1)).unwrap();
    assert_eq!(v1.version_number, 1);
    assert_eq!(v2.version_number, 2);
    assert_eq!(v2.parent_version, Some(1));
    assert_eq!(store.list_version_numbers("acme").unwrap(), vec![1, 2]);
    assert!(store.list_version_numbers("other").unwrap().is_empty());
}

#[test]
fn test_concurrent_creates_get_distinct_numbers() {
    let (_tmp, store) = store();
    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store
                    .create_version("acme", Trigger::Create, None)
                    .unwrap()
                    .version_number
            })
        })
        .collect();
    let mut numbers: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    numbers.sort_unstable();
    assert_eq!(numbers, (1..=8).collect::<Vec<u32>>());
    assert_eq!(store.list_versions("acme").unwrap().len(), 8);
}

#[test]
fn test_upsert_replaces_same_path() {
    let (_tmp, store) = store();
    store.create_version("acme", Trigger::Create, None).unwrap();
    store
        .upsert_file("acme", 1, VirtualFile::new("src/components/Hero.tsx", "v1"))
        .unwrap();
    store
        .upsert_file("acme", 1, VirtualFile::new("./src/components/Hero.tsx", "v2"))
        .unwrap();
    store
        .upsert_file("acme", 1, VirtualFile::new("src/app/page.tsx", "page"))
        .unwrap();

    let files = store.load_files("acme", 1).unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].content, "v2");
}

#[test]
fn test_terminal_version_is_immutable() {
    let (_tmp, store) = store();
    store.create_version("acme", Trigger::Create, None).unwrap();
    store
        .replace_files("acme", 1, &[VirtualFile::new("src/app/page.tsx", "x")])
        .unwrap();
    let done = store
        .update_status("acme", 1, VersionStatus::Complete, None)
        .unwrap();
    assert_eq!(done.file_count, 1);
    assert!(done.completed_at.is_some());

    assert!(
        store
            .upsert_file("acme", 1, VirtualFile::new("src/app/page.tsx", "y"))
            .is_err()
    );
    assert!(
        store
            .update_status("acme", 1, VersionStatus::Error, Some("late".into()))
            .is_err()
    );
}

#[test]
fn test_latest_complete_skips_failed() {
    let (_tmp, store) = store();
    store.create_version("acme", Trigger::Create, None).unwrap();
    store
        .update_status("acme", 1, VersionStatus::Complete, None)
        .unwrap();
    store.create_version("acme", Trigger::Edit, Some(1)).unwrap();
    store
        .update_status("acme", 2, VersionStatus::Error, Some("boom".into()))
        .unwrap();

    let latest = store.latest_version("acme").unwrap().unwrap();
    assert_eq!(latest.version_number, 2);
    assert_eq!(latest.error.as_deref(), Some("boom"));

    let complete = store.latest_complete_version("acme").unwrap().unwrap();
    assert_eq!(complete.version_number, 1);
}

#[test]
fn test_config_roundtrip() {
    let (_tmp, store) = store();
    assert!(store.load_config("acme").unwrap().is_none());
    let config = GenerationConfig {
        business_name: "Acme".to_string(),
        description: "Widgets".to_string(),
        ..GenerationConfig::default()
    };
    store.save_config("acme", &config).unwrap();
    assert_eq!(store.load_config("acme").unwrap(), Some(config));
}

#[test]
fn test_rejects_path_traversal() {
    assert!(validate_project_id("../etc").is_err());
    assert!(validate_project_id("").is_err());
    assert!(validate_project_id("my_site-2").is_ok());

    let (_tmp, store) = store();
    assert!(store.create_version("a/b", Trigger::Create, None).is_err());
}
