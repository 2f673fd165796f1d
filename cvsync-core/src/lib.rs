//! cvsync Core Library
//!
//! Core functionality for cvsync including:
//! - Error taxonomy shared by store, codec and controller
//! - Record model for the CV collections (publications, awards, ...)
//! - Record codec (TypeScript data file <-> typed records)
//! - File store abstraction (GitHub contents API, in-memory store)
//! - Optimistic sync controller with version-token guard
//! - Injected configuration

pub mod codec;
pub mod config;
pub mod error;
pub mod github;
pub mod record;
pub mod store;
pub mod sync;

#[cfg(test)]
mod codec_tests;

pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use github::GitHubStore;
pub use record::{
    Award, CvRecord, Evaluation, Presentation, Publication, ResearchProject, Supervision,
};
pub use store::{content_token, FileSnapshot, FileStore, MemoryFileStore};
pub use sync::{EditSession, SyncController};
