//! Optimistic sync controller.
//!
//! Orchestrates load (fetch + decode), local mutation, and save (encode +
//! token-guarded write) for one collection per edit session. Mutations touch
//! only the in-memory sequence; nothing goes over the network until `save`.
//! Each mutation is summarized into the commit message, which is the only
//! audit trail the system keeps.
//!
//! The version token from load is consumed by exactly one successful save;
//! after that the caller must reload before writing again. On a conflict the
//! write was not applied and the only recovery is reload-and-reapply; the
//! controller never merges.

use tracing::{debug, info};

use crate::codec;
use crate::error::{Result, SyncError};
use crate::record::CvRecord;
use crate::store::{FileSnapshot, FileStore};

/// Load/save orchestrator over a file store.
pub struct SyncController<S: FileStore> {
    store: S,
}

impl<S: FileStore> SyncController<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch and decode one collection, starting an edit session.
    pub async fn load<T: CvRecord>(&self) -> Result<EditSession<T>> {
        let path = T::file_path();
        let snapshot = self.store.fetch(&path).await?;
        let records = codec::decode(&path, &snapshot.content)?;
        debug!(
            collection = T::COLLECTION,
            count = records.len(),
            token = %snapshot.version_token,
            "loaded collection"
        );
        Ok(EditSession {
            records,
            snapshot,
            changes: Vec::new(),
            saved: false,
        })
    }

    /// Start a session for a collection whose file does not exist yet.
    /// Saving emits a fresh minimal declaration (the codec's fallback) and
    /// creates the file.
    pub fn new_collection<T: CvRecord>(&self) -> EditSession<T> {
        EditSession {
            records: Vec::new(),
            snapshot: FileSnapshot {
                path: T::file_path(),
                content: String::new(),
                version_token: String::new(),
            },
            changes: Vec::new(),
            saved: false,
        }
    }

    /// Encode the session's records and write them with the session's
    /// version token. On success the token is consumed; on a conflict or
    /// transient failure the session stays usable (a conflict requires a
    /// fresh `load`, a transient failure may be retried identically).
    pub async fn save<T: CvRecord>(&self, session: &mut EditSession<T>) -> Result<()> {
        if session.saved {
            return Err(SyncError::conflict(
                &session.snapshot.path,
                "version token already consumed; reload before saving again",
            ));
        }

        let path = session.snapshot.path.clone();
        let original = if session.snapshot.content.is_empty() {
            None
        } else {
            Some(session.snapshot.content.as_str())
        };
        let content = codec::encode(&path, &session.records, original, T::TYPE_NAME, T::VARIABLE)?;
        let message = session.commit_message();

        self.store
            .write(&path, &content, &message, &session.snapshot.version_token)
            .await?;

        session.saved = true;
        info!(collection = T::COLLECTION, %message, "saved collection");
        Ok(())
    }
}

/// One collection held in memory between a load and a save.
///
/// Position is the only record identity; removing record `i` shifts every
/// following record for the rest of the session.
pub struct EditSession<T: CvRecord> {
    records: Vec<T>,
    snapshot: FileSnapshot,
    changes: Vec<String>,
    saved: bool,
}

impl<T: CvRecord> EditSession<T> {
    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn version_token(&self) -> &str {
        &self.snapshot.version_token
    }

    pub fn is_dirty(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Append a record. Validated before it enters the session, so a bad
    /// record is rejected before any network call.
    pub fn add(&mut self, record: T) -> Result<()> {
        record.validate()?;
        self.changes
            .push(format!("Added {}: {}", T::NOUN, record.summary()));
        self.records.push(record);
        Ok(())
    }

    /// Replace the record at `index`.
    pub fn update(&mut self, index: usize, record: T) -> Result<()> {
        record.validate()?;
        if index >= self.records.len() {
            return Err(self.bad_index(index));
        }
        self.changes
            .push(format!("Updated {}: {}", T::NOUN, record.summary()));
        self.records[index] = record;
        Ok(())
    }

    /// Remove and return the record at `index`. Following records shift
    /// down by one.
    pub fn remove(&mut self, index: usize) -> Result<T> {
        if index >= self.records.len() {
            return Err(self.bad_index(index));
        }
        let record = self.records.remove(index);
        self.changes
            .push(format!("Deleted {}: {}", T::NOUN, record.summary()));
        Ok(record)
    }

    /// Human-readable summary of this session's mutations.
    pub fn commit_message(&self) -> String {
        if self.changes.is_empty() {
            format!("Update {}", T::COLLECTION)
        } else {
            self.changes.join("; ")
        }
    }

    fn bad_index(&self, index: usize) -> SyncError {
        SyncError::Validation(format!(
            "index {} out of bounds for {} {} records",
            index,
            self.records.len(),
            T::COLLECTION
        ))
    }
}
