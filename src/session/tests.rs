//! Tests for the session module

use super::*;
use crate::models::{User, UserRole};
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

fn student() -> User {
    User {
        id: 42,
        email: "sam@example.edu".to_string(),
        first_name: "Sam".to_string(),
        last_name: "Rivera".to_string(),
        role: UserRole::Student,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_session_store_new() {
    let store = SessionStore::new("/tmp/jobtrack-session.json");
    assert!(!store.is_in_memory());
    assert_eq!(
        store.path().to_str().unwrap(),
        "/tmp/jobtrack-session.json"
    );
}

#[test]
fn test_session_store_in_memory() {
    let store = SessionStore::in_memory();
    assert!(store.is_in_memory());
}

#[test]
fn test_default_path_ends_with_app_dir() {
    if let Ok(path) = SessionStore::default_path() {
        assert!(path.ends_with("jobtrack/session.json"));
    }
}

// ============================================================================
// Token Tests
// ============================================================================

#[tokio::test]
async fn test_set_and_get_token() {
    let store = SessionStore::in_memory();
    assert!(store.token().await.is_none());

    store.set("tok-1", Some(student())).await.unwrap();

    assert_eq!(store.token().await, Some("tok-1".to_string()));
    assert_eq!(store.user().await.unwrap().email, "sam@example.edu");
    assert!(store.session().await.is_authenticated());
}

#[tokio::test]
async fn test_clear_is_idempotent() {
    let store = SessionStore::in_memory();
    store.set("tok-1", Some(student())).await.unwrap();

    store.clear().await.unwrap();
    store.clear().await.unwrap();

    assert!(store.token().await.is_none());
    assert!(store.user().await.is_none());
}

#[tokio::test]
async fn test_clone_shares_session() {
    let store = SessionStore::in_memory();
    let clone = store.clone();

    store.set("shared", None).await.unwrap();
    assert_eq!(clone.token().await, Some("shared".to_string()));

    clone.clear().await.unwrap();
    assert!(store.token().await.is_none());
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");

    let store = SessionStore::new(&path);
    store.set("persisted", Some(student())).await.unwrap();
    assert!(path.exists());

    let reloaded = SessionStore::from_file(&path).unwrap();
    assert_eq!(reloaded.token().await, Some("persisted".to_string()));
    assert_eq!(reloaded.user().await.unwrap().id, 42);

    let lazy = SessionStore::new(&path);
    assert!(lazy.token().await.is_none());
    lazy.load().await.unwrap();
    assert_eq!(lazy.token().await, Some("persisted".to_string()));
}

#[tokio::test]
async fn test_save_creates_parent_dirs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("session.json");

    let store = SessionStore::new(&path);
    store.set("tok", None).await.unwrap();

    assert!(path.exists());
    let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("session.json")]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_all_succeed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = SessionStore::new(&path);
    store.set("initial", None).await.unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.save().await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let reloaded = SessionStore::from_file(&path).unwrap();
    assert_eq!(reloaded.token().await, Some("initial".to_string()));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_session_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    SessionStore::new(&path).set("secret", None).await.unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[tokio::test]
async fn test_clear_removes_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");

    let store = SessionStore::new(&path);
    store.set("tok", Some(student())).await.unwrap();
    assert!(path.exists());

    store.clear().await.unwrap();
    assert!(!path.exists());

    // second clear with the file already gone
    store.clear().await.unwrap();
}

#[tokio::test]
async fn test_load_nonexistent_file() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("missing.json"));

    store.load().await.unwrap();
    assert!(store.token().await.is_none());
}

#[tokio::test]
async fn test_load_empty_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "").unwrap();

    let store = SessionStore::from_file(&path).unwrap();
    assert!(store.token().await.is_none());
}

#[tokio::test]
async fn test_load_invalid_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "not json {").unwrap();

    let result = SessionStore::from_file(&path);
    assert!(matches!(result, Err(crate::Error::Session { .. })));

    let store = SessionStore::new(&path);
    assert!(store.load().await.is_err());
}

#[tokio::test]
async fn test_save_in_memory_noop() {
    let store = SessionStore::with_session(Session::with_token("mem", None));
    store.save().await.unwrap();
    assert_eq!(store.token().await, Some("mem".to_string()));
}

// ============================================================================
// Provider Tests
// ============================================================================

#[tokio::test]
async fn test_store_as_provider() {
    let store = SessionStore::in_memory();
    store.set("via-provider", None).await.unwrap();

    let provider: Arc<dyn SessionProvider> = Arc::new(store.clone());
    assert_eq!(provider.token().await, Some("via-provider".to_string()));

    provider.invalidate().await.unwrap();
    assert!(store.token().await.is_none());
}

#[tokio::test]
async fn test_static_token_provider() {
    let provider = StaticToken::new("fixed");
    assert_eq!(provider.token().await, Some("fixed".to_string()));

    provider.invalidate().await.unwrap();
    provider.invalidate().await.unwrap();
    assert!(provider.token().await.is_none());

    assert!(StaticToken::anonymous().token().await.is_none());
}

#[test]
fn test_closure_redirect() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let hook = move |path: &str| {
        assert_eq!(path, "/login");
        counter.fetch_add(1, Ordering::SeqCst);
    };

    hook.redirect_to_login("/login");
    LogRedirect.redirect_to_login("/login");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
