//! File store abstraction for cvsync.
//!
//! A store holds one text file per record collection and exposes
//! fetch/write with optimistic-concurrency version tokens. The token is an
//! opaque content hash supplied by the store; a write must carry the token
//! from the most recent fetch and fails with a conflict when it is stale.
//! Every write creates a new revision labeled with a commit message, which
//! is the system's only audit trail.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{Result, SyncError};

/// A collection file as seen at load time: path, raw UTF-8 content and the
/// version token identifying this exact revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    pub path: String,
    pub content: String,
    pub version_token: String,
}

/// Version token for file content (hex SHA-256).
pub fn content_token(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Remote file store interface.
///
/// All store backends must implement this trait. Content is UTF-8 text;
/// whatever transport encoding a backend needs is invisible to callers.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Fetch a file and its current version token.
    async fn fetch(&self, path: &str) -> Result<FileSnapshot>;

    /// Write new content, creating a revision labeled with `message`.
    ///
    /// `expected_token` must match the store's current token for `path`;
    /// the check is atomic on the store side. An empty token means
    /// "create a new file" and conflicts if the file already exists.
    async fn write(
        &self,
        path: &str,
        content: &str,
        message: &str,
        expected_token: &str,
    ) -> Result<()>;
}

/// One committed revision in the in-memory store's history.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub path: String,
    pub message: String,
    pub token: String,
    pub timestamp: i64,
}

/// In-memory file store.
///
/// Backs the controller tests and offline use. The token check runs inside
/// the write lock, mirroring the server-side atomicity of the real store.
#[derive(Clone, Default)]
pub struct MemoryFileStore {
    files: Arc<RwLock<HashMap<String, String>>>,
    history: Arc<RwLock<Vec<CommitRecord>>>,
}

impl MemoryFileStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a file in place without creating a history entry. Test/setup
    /// helper; also usable to simulate a concurrent writer.
    pub async fn seed(&self, path: &str, content: &str) {
        let mut files = self.files.write().await;
        files.insert(path.to_string(), content.to_string());
    }

    /// Current content of a file, if present.
    pub async fn content_of(&self, path: &str) -> Option<String> {
        let files = self.files.read().await;
        files.get(path).cloned()
    }

    /// Commit history, oldest first.
    pub async fn history(&self) -> Vec<CommitRecord> {
        self.history.read().await.clone()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn fetch(&self, path: &str) -> Result<FileSnapshot> {
        let files = self.files.read().await;
        let content = files
            .get(path)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(path.to_string()))?;
        let version_token = content_token(&content);
        Ok(FileSnapshot {
            path: path.to_string(),
            content,
            version_token,
        })
    }

    async fn write(
        &self,
        path: &str,
        content: &str,
        message: &str,
        expected_token: &str,
    ) -> Result<()> {
        let mut files = self.files.write().await;

        match files.get(path) {
            Some(current) => {
                let current_token = content_token(current);
                if expected_token.is_empty() {
                    return Err(SyncError::conflict(
                        path,
                        "file already exists; fetch it to obtain a version token",
                    ));
                }
                if current_token != expected_token {
                    return Err(SyncError::conflict(
                        path,
                        format!(
                            "expected token {} but current is {}",
                            expected_token, current_token
                        ),
                    ));
                }
            }
            None => {
                if !expected_token.is_empty() {
                    return Err(SyncError::NotFound(path.to_string()));
                }
            }
        }

        files.insert(path.to_string(), content.to_string());
        let token = content_token(content);
        drop(files);

        let mut history = self.history.write().await;
        history.push(CommitRecord {
            path: path.to_string(),
            message: message.to_string(),
            token,
            timestamp: chrono::Utc::now().timestamp(),
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_missing_file() {
        let store = MemoryFileStore::new();
        let result = store.fetch("data/publications.ts").await;
        assert!(matches!(result, Err(SyncError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_write_then_fetch() {
        let store = MemoryFileStore::new();
        store
            .write("data/awards.ts", "export const awards = [];\n", "Create awards", "")
            .await
            .unwrap();

        let snapshot = store.fetch("data/awards.ts").await.unwrap();
        assert_eq!(snapshot.content, "export const awards = [];\n");
        assert_eq!(snapshot.version_token, content_token(&snapshot.content));

        let history = store.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].message, "Create awards");
    }

    #[tokio::test]
    async fn test_stale_token_rejected() {
        let store = MemoryFileStore::new();
        store.seed("data/x.ts", "v1").await;
        let snapshot = store.fetch("data/x.ts").await.unwrap();

        // Concurrent writer changes the file after our fetch.
        store.seed("data/x.ts", "v2").await;

        let result = store
            .write("data/x.ts", "v3", "msg", &snapshot.version_token)
            .await;
        assert!(matches!(result, Err(SyncError::Conflict { .. })));
        // The write must not have been applied.
        assert_eq!(store.content_of("data/x.ts").await.unwrap(), "v2");
    }

    #[tokio::test]
    async fn test_create_over_existing_conflicts() {
        let store = MemoryFileStore::new();
        store.seed("data/x.ts", "v1").await;
        let result = store.write("data/x.ts", "v2", "msg", "").await;
        assert!(matches!(result, Err(SyncError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_token_is_content_hash() {
        let store = MemoryFileStore::new();
        store.seed("data/a.ts", "same").await;
        store.seed("data/b.ts", "same").await;
        let a = store.fetch("data/a.ts").await.unwrap();
        let b = store.fetch("data/b.ts").await.unwrap();
        assert_eq!(a.version_token, b.version_token);
    }
}
