use std::fs;
use std::path::PathBuf;

use matchdesk::prefs::{JsonFileBackend, MemoryBackend, Preferences, PrefsBackend};

fn temp_prefs_path(tag: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("matchdesk-test-{}-{tag}", std::process::id()))
        .join("prefs.json")
}

#[test]
fn toggling_twice_restores_the_original_state() {
    let mut prefs = Preferences::default();
    assert!(!prefs.is_liked("a"));

    assert!(prefs.toggle_like("a"));
    assert!(prefs.is_liked("a"));
    assert!(!prefs.toggle_like("a"));
    assert!(!prefs.is_liked("a"));

    assert!(prefs.toggle_save("a"));
    assert!(!prefs.toggle_save("a"));
    assert!(!prefs.is_saved("a"));
}

#[test]
fn liked_and_saved_are_independent_sets() {
    let mut prefs = Preferences::default();
    prefs.toggle_like("a");
    assert!(prefs.is_liked("a"));
    assert!(!prefs.is_saved("a"));

    prefs.toggle_save("b");
    assert!(prefs.is_saved("b"));
    assert!(!prefs.is_liked("b"));
}

#[test]
fn memory_backend_round_trips() {
    let backend = MemoryBackend::default();
    let mut prefs = backend.load();
    prefs.toggle_like("x");
    backend.persist(&prefs).expect("memory persist is infallible");
    assert!(backend.load().is_liked("x"));
}

#[test]
fn json_backend_round_trips() {
    let path = temp_prefs_path("roundtrip");
    let _ = fs::remove_dir_all(path.parent().unwrap());

    let backend = JsonFileBackend::at(path.clone());
    let mut prefs = backend.load();
    assert_eq!(prefs, Preferences::default());

    prefs.toggle_like("66f0a1");
    prefs.toggle_save("66f0a2");
    backend.persist(&prefs).expect("persist should succeed");

    // A fresh backend at the same path sees the same sets.
    let reloaded = JsonFileBackend::at(path.clone()).load();
    assert!(reloaded.is_liked("66f0a1"));
    assert!(!reloaded.is_liked("66f0a2"));
    assert!(reloaded.is_saved("66f0a2"));

    let _ = fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn json_backend_uses_the_original_key_names() {
    let path = temp_prefs_path("keys");
    let _ = fs::remove_dir_all(path.parent().unwrap());

    let backend = JsonFileBackend::at(path.clone());
    let mut prefs = Preferences::default();
    prefs.toggle_like("a");
    prefs.toggle_save("b");
    backend.persist(&prefs).expect("persist should succeed");

    let raw = fs::read_to_string(&path).expect("file should exist");
    assert!(raw.contains("likedAnalyses"));
    assert!(raw.contains("savedAnalyses"));

    let _ = fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn unreadable_or_corrupt_files_load_as_empty() {
    let path = temp_prefs_path("corrupt");
    let _ = fs::remove_dir_all(path.parent().unwrap());
    fs::create_dir_all(path.parent().unwrap()).unwrap();

    // Missing file.
    assert_eq!(JsonFileBackend::at(path.clone()).load(), Preferences::default());

    // Corrupt file.
    fs::write(&path, "{not json").unwrap();
    assert_eq!(JsonFileBackend::at(path.clone()).load(), Preferences::default());

    // Future version.
    fs::write(&path, r#"{"version":99,"likedAnalyses":["a"],"savedAnalyses":[]}"#).unwrap();
    assert_eq!(JsonFileBackend::at(path.clone()).load(), Preferences::default());

    let _ = fs::remove_dir_all(path.parent().unwrap());
}
