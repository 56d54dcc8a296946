//! Tests for the agent output cache.

use cvx_cache::{AgentCache, AgentOutput, DEFAULT_CACHE_DIR, JsonObject, cache_key};
use cvx_error::{CvxErrorKind, StorageErrorKind};
use serde_json::json;
use std::collections::HashSet;
use tempfile::TempDir;

fn object(value: serde_json::Value) -> JsonObject {
    value.as_object().cloned().unwrap()
}

fn sample_key() -> String {
    cache_key(
        42,
        "Job posting text",
        r#"{"name":"John","email":"john@example.com"}"#,
        r#"{"sender":"John"}"#,
        "{}",
        "gemini-2.5-flash",
    )
}

#[test]
fn test_key_is_deterministic_lowercase_hex() {
    let key1 = sample_key();
    let key2 = sample_key();

    assert_eq!(key1, key2);
    assert_eq!(key1.len(), 64);
    assert!(key1.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn test_every_input_changes_the_key() {
    let base = ("Job posting", r#"{"name":"John"}"#, r#"{"sender":"John"}"#, "{}", "gemini-2.5-flash");

    let keys = [
        cache_key(42, base.0, base.1, base.2, base.3, base.4),
        cache_key(43, base.0, base.1, base.2, base.3, base.4),
        cache_key(42, "Different job", base.1, base.2, base.3, base.4),
        cache_key(42, base.0, r#"{"name":"Jane"}"#, base.2, base.3, base.4),
        cache_key(42, base.0, base.1, r#"{"sender":"Jane"}"#, base.3, base.4),
        cache_key(42, base.0, base.1, base.2, r#"{"type":"object"}"#, base.4),
        cache_key(42, base.0, base.1, base.2, base.3, "claude-haiku-4-5-20251001"),
    ];

    let unique: HashSet<_> = keys.iter().collect();
    assert_eq!(unique.len(), keys.len());
}

#[test]
fn test_swapping_fields_changes_the_key() {
    let a = cache_key(1, "posting", "cv", "letter", "schema", "model");
    let b = cache_key(1, "cv", "posting", "letter", "schema", "model");
    let c = cache_key(1, "posting", "cv", "letter", "model", "schema");

    assert_ne!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_field_boundaries_are_not_encoded() {
    // The key format concatenates without delimiters.
    assert_eq!(
        cache_key(1, "AB", "C", "", "", ""),
        cache_key(1, "A", "BC", "", "", "")
    );
}

#[tokio::test]
async fn test_write_then_read_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let cache = AgentCache::new(temp_dir.path().join(".cvx/cache/agent"));
    let key = sample_key();

    let cv = object(json!({
        "name": "John",
        "experience": [{"company": "Acme", "years": 3}],
        "skills": ["rust", "go"]
    }));
    let letter = object(json!({"sender": "John", "body": "Dear hiring manager"}));

    assert!(!cache.exists(&key).await);

    cache.write(&key, &cv, &letter).await.unwrap();

    assert!(cache.exists(&key).await);
    let output = cache.read(&key).await.unwrap();
    assert_eq!(output.cv(), &cv);
    assert_eq!(output.letter(), &letter);
}

#[tokio::test]
async fn test_write_creates_missing_directories() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("deeply/nested/cache");
    let cache = AgentCache::new(&dir);

    cache
        .write(&sample_key(), &JsonObject::new(), &JsonObject::new())
        .await
        .unwrap();

    assert!(dir.is_dir());
    assert!(cache.path_for(&sample_key()).is_file());
}

#[tokio::test]
async fn test_write_overwrites_existing_entry() {
    let temp_dir = TempDir::new().unwrap();
    let cache = AgentCache::new(temp_dir.path());
    let key = sample_key();

    cache
        .write(&key, &object(json!({"v": 1})), &object(json!({"v": 1})))
        .await
        .unwrap();
    cache
        .write(&key, &object(json!({"v": 2})), &object(json!({"v": 2})))
        .await
        .unwrap();

    let output = cache.read(&key).await.unwrap();
    assert_eq!(output.cv()["v"], json!(2));

    // No temp files left behind.
    let entries: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn test_entry_is_indented_json_with_two_fields() {
    let temp_dir = TempDir::new().unwrap();
    let cache = AgentCache::new(temp_dir.path());
    let key = sample_key();

    cache
        .write(&key, &object(json!({"name": "John"})), &object(json!({"sender": "John"})))
        .await
        .unwrap();

    let text = std::fs::read_to_string(cache.path_for(&key)).unwrap();
    assert!(text.contains("\n  \"cv\": {"));

    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let fields: HashSet<_> = value.as_object().unwrap().keys().cloned().collect();
    assert_eq!(fields, HashSet::from(["cv".to_string(), "letter".to_string()]));
}

#[tokio::test]
async fn test_missing_entry_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let cache = AgentCache::new(temp_dir.path());

    let err = cache.read(&sample_key()).await.unwrap_err();
    match err.kind() {
        CvxErrorKind::Storage(e) => assert!(e.is_not_found()),
        other => panic!("expected storage error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_corrupt_entry_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let cache = AgentCache::new(temp_dir.path());
    let key = sample_key();

    std::fs::write(cache.path_for(&key), b"{not json").unwrap();

    assert!(cache.exists(&key).await);
    let err = cache.read(&key).await.unwrap_err();
    match err.kind() {
        CvxErrorKind::Storage(e) => assert!(matches!(e.kind, StorageErrorKind::Corrupt(_))),
        other => panic!("expected storage error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_write_into_unwritable_location_fails() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("file");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let cache = AgentCache::new(blocker.join("cache"));
    let err = cache
        .write(&sample_key(), &JsonObject::new(), &JsonObject::new())
        .await
        .unwrap_err();
    match err.kind() {
        CvxErrorKind::Storage(e) => {
            assert!(matches!(e.kind, StorageErrorKind::DirectoryCreation(_)))
        }
        other => panic!("expected storage error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_write_leaves_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let cache = AgentCache::new(temp_dir.path());
    let key = sample_key();

    // A non-empty directory where the entry belongs makes the final rename fail.
    std::fs::create_dir_all(cache.path_for(&key).join("occupied")).unwrap();

    let err = cache
        .write(&key, &JsonObject::new(), &JsonObject::new())
        .await
        .unwrap_err();
    match err.kind() {
        CvxErrorKind::Storage(e) => assert!(matches!(e.kind, StorageErrorKind::FileWrite(_))),
        other => panic!("expected storage error, got {:?}", other),
    }

    let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left behind: {:?}", leftovers);
}

// The only test in this file that changes the working directory. Every other
// test uses absolute paths, so running alongside them is safe.
#[tokio::test]
async fn test_free_functions_follow_current_dir() {
    let original = std::env::current_dir().unwrap();
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let key = sample_key();
    let cv = object(json!({"name": "John"}));
    let letter = object(json!({"sender": "John"}));

    std::env::set_current_dir(first.path()).unwrap();
    cvx_cache::write(&key, &cv, &letter).await.unwrap();

    let expected = first
        .path()
        .join(DEFAULT_CACHE_DIR)
        .join(format!("{}.json", key));
    assert!(expected.is_file());
    assert!(cvx_cache::exists(&key).await);
    let output = cvx_cache::read(&key).await.unwrap();
    assert_eq!(output.cv(), &cv);
    assert_eq!(output.letter(), &letter);

    std::env::set_current_dir(second.path()).unwrap();
    let exists_elsewhere = cvx_cache::exists(&key).await;
    let read_elsewhere = cvx_cache::read(&key).await;
    std::env::set_current_dir(original).unwrap();

    assert!(!exists_elsewhere);
    match read_elsewhere.unwrap_err().kind() {
        CvxErrorKind::Storage(e) => assert!(e.is_not_found()),
        other => panic!("expected storage error, got {:?}", other),
    }
}

#[test]
fn test_agent_output_parts() {
    let output = AgentOutput::new(object(json!({"a": 1})), object(json!({"b": 2})));
    let (cv, letter) = output.into_parts();
    assert_eq!(cv["a"], json!(1));
    assert_eq!(letter["b"], json!(2));
}
