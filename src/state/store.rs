//! Atomic JSON document persistence.
//!
//! Every document the bot keeps on disk goes through [`load`] and [`save`].
//! A save writes the full document to a uniquely named sibling file, flushes
//! it, and renames it over the destination, so readers only ever observe the
//! previous document or the new one. Concurrent savers of the same path are
//! last-writer-wins; callers that need more serialize above this layer.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{BotError, CorruptReason, Result};

/// Load and parse a JSON document.
///
/// Absent, empty and unparsable files fail with [`BotError::CorruptState`].
/// Other I/O failures fail with [`BotError::StateLoad`].
pub async fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(corrupt(path, CorruptReason::Missing));
        }
        Err(e) => {
            return Err(BotError::StateLoad {
                path: path.display().to_string(),
                source: e,
            });
        }
    };

    if content.trim().is_empty() {
        return Err(corrupt(path, CorruptReason::Empty));
    }

    serde_json::from_str(&content)
        .map_err(|e| corrupt(path, CorruptReason::Malformed(e.to_string())))
}

/// Load a document, substituting `T::default()` when it is unusable
pub async fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    match load(path).await {
        Ok(value) => Ok(value),
        Err(BotError::CorruptState { path, reason }) => {
            match reason {
                CorruptReason::Missing => debug!("{} not found, using default", path),
                reason => warn!("Ignoring unusable state in {}: {}", path, reason),
            }
            Ok(T::default())
        }
        Err(e) => Err(e),
    }
}

/// Serialize `value` and atomically replace the document at `path`
pub async fn save<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    let save_error = |source: std::io::Error| BotError::StateSave {
        path: path.display().to_string(),
        source,
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(dir).await.map_err(save_error)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("state");
    let temp_path = dir.join(format!(
        ".{}.{}.tmp",
        file_name,
        uuid::Uuid::new_v4().simple()
    ));

    if let Err(e) = write_synced(&temp_path, content.as_bytes()).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(save_error(e));
    }

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(save_error(e));
    }

    Ok(())
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

fn corrupt(path: &Path, reason: CorruptReason) -> BotError {
    BotError::CorruptState {
        path: path.display().to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Doc {
        name: String,
        values: Vec<u32>,
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let doc = Doc {
            name: "queue".to_string(),
            values: vec![1, 2, 3],
        };

        save(&path, &doc).await.unwrap();
        let loaded: Doc = load(&path).await.unwrap();
        assert_eq!(loaded, doc);
    }

    #[tokio::test]
    async fn test_unusable_documents_are_corrupt_state() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        match load::<Doc>(&missing).await {
            Err(BotError::CorruptState { reason, .. }) => assert_eq!(reason, CorruptReason::Missing),
            other => panic!("unexpected result: {:?}", other),
        }

        let empty = dir.path().join("empty.json");
        tokio::fs::write(&empty, "  \n").await.unwrap();
        match load::<Doc>(&empty).await {
            Err(BotError::CorruptState { reason, .. }) => assert_eq!(reason, CorruptReason::Empty),
            other => panic!("unexpected result: {:?}", other),
        }

        let garbage = dir.path().join("garbage.json");
        tokio::fs::write(&garbage, "{\"name\": \"trunc").await.unwrap();
        match load::<Doc>(&garbage).await {
            Err(BotError::CorruptState { reason, .. }) => {
                assert!(matches!(reason, CorruptReason::Malformed(_)))
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let fallback: Doc = load_or_default(&garbage).await.unwrap();
        assert_eq!(fallback, Doc::default());
    }

    #[tokio::test]
    async fn test_interrupted_write_leaves_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let original = Doc {
            name: "before".to_string(),
            values: vec![7],
        };
        save(&path, &original).await.unwrap();

        // A crash between write and rename leaves only a partial sibling behind.
        let partial = dir.path().join(".doc.json.deadbeef.tmp");
        tokio::fs::write(&partial, "{\"name\": \"after\", \"val").await.unwrap();

        let loaded: Doc = load(&path).await.unwrap();
        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        for i in 0..5 {
            save(&path, &Doc { name: format!("v{}", i), values: vec![i] })
                .await
                .unwrap();
        }

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["doc.json".to_string()]);
    }

    #[tokio::test]
    async fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data").join("doc.json");
        save(&path, &Doc::default()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_save_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        tokio::fs::write(&blocker, "not a directory").await.unwrap();

        let path = blocker.join("doc.json");
        let result = save(&path, &Doc::default()).await;
        assert!(matches!(result, Err(BotError::StateSave { .. })));
    }

    #[tokio::test]
    async fn test_readers_never_observe_partial_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let big = |n: u32| Doc {
            name: format!("gen-{}", n),
            values: (0..20_000).map(|v| v + n).collect(),
        };
        save(&path, &big(0)).await.unwrap();

        let writer_path = path.clone();
        let writer = tokio::spawn(async move {
            for n in 1..30 {
                save(&writer_path, &big(n)).await.unwrap();
            }
        });

        for _ in 0..60 {
            let doc: Doc = load(&path).await.unwrap();
            assert_eq!(doc.values.len(), 20_000);
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
    }
}
