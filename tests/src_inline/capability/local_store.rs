use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("qc_insight_store_{}_{}", std::process::id(), id));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[tokio::test]
async fn test_put_then_get_creates_directories() {
    let store = LocalObjectStore::new(make_temp_dir());
    store
        .put("artifacts", "run1/artifacts/x.csv", b"a,b\n".to_vec(), "text/csv")
        .await
        .unwrap();
    let bytes = store.get("artifacts", "run1/artifacts/x.csv").await.unwrap();
    assert_eq!(bytes, b"a,b\n");
    assert!(store.root().join("artifacts/run1/artifacts/x.csv").is_file());
}

#[tokio::test]
async fn test_missing_object_is_not_found() {
    let store = LocalObjectStore::new(make_temp_dir());
    let err = store.get("reports", "nope.json").await.unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_rejects_escaping_keys() {
    let store = LocalObjectStore::new("/tmp/qc");
    assert!(store.object_path("reports", "../etc/passwd").is_err());
    assert!(store.object_path("reports", "/abs/key").is_err());
    assert!(store.object_path("..", "k").is_err());
    assert!(store.object_path("reports", "run/a.json").is_ok());
}

#[tokio::test]
async fn test_sign_yields_file_url_with_expiry() {
    let root = make_temp_dir();
    let store = LocalObjectStore::new(&root);
    let url = store
        .sign("reports", "run1/plot.png", Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(url.scheme(), "file");
    assert!(url.path().ends_with("/reports/run1/plot.png"));
    let expires = url
        .query_pairs()
        .find(|(k, _)| k == "expires")
        .map(|(_, v)| v.parse::<u64>().unwrap())
        .unwrap();
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    assert!(expires >= now + 59);
}
