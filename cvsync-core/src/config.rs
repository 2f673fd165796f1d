//! Injected configuration for cvsync.
//!
//! The core never reads the environment or filesystem on its own; callers
//! build a `SyncConfig` (from env vars, a JSON file, or directly) and hand
//! it in. The admin password is carried for the presentation layer only and
//! is never used by the core.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, SyncError};

/// Environment variable names understood by `SyncConfig::from_env`.
pub const ENV_GITHUB_TOKEN: &str = "CVSYNC_GITHUB_TOKEN";
pub const ENV_GITHUB_OWNER: &str = "CVSYNC_GITHUB_OWNER";
pub const ENV_GITHUB_REPO: &str = "CVSYNC_GITHUB_REPO";
pub const ENV_GITHUB_BRANCH: &str = "CVSYNC_GITHUB_BRANCH";
pub const ENV_ADMIN_PASSWORD: &str = "CVSYNC_ADMIN_PASSWORD";

fn default_branch() -> String {
    "main".to_string()
}

/// Configuration for the store client and the CLI gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Bearer credential for the contents API.
    pub github_token: String,
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Target branch.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Plaintext gate password for the presentation layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            github_token: String::new(),
            owner: String::new(),
            repo: String::new(),
            branch: default_branch(),
            admin_password: None,
        }
    }
}

impl SyncConfig {
    /// Build a config from `CVSYNC_*` environment variables. Missing values
    /// stay empty here; `require_store_fields` rejects them before any
    /// network call.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        let branch = var(ENV_GITHUB_BRANCH);
        Self {
            github_token: var(ENV_GITHUB_TOKEN),
            owner: var(ENV_GITHUB_OWNER),
            repo: var(ENV_GITHUB_REPO),
            branch: if branch.is_empty() {
                default_branch()
            } else {
                branch
            },
            admin_password: std::env::var(ENV_ADMIN_PASSWORD).ok().filter(|p| !p.is_empty()),
        }
    }

    /// Load config from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            SyncError::NotFound(format!("config file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&data).map_err(|e| {
            SyncError::parse(&path.display().to_string(), format!("invalid config JSON: {}", e), String::new())
        })
    }

    /// Save config to a JSON file (write-then-rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp_path = path.with_extension("tmp");
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| SyncError::Transient(format!("failed to serialize config: {}", e)))?;
        fs::write(&tmp_path, &data)
            .and_then(|_| fs::rename(&tmp_path, path))
            .map_err(|e| SyncError::Transient(format!("failed to write config: {}", e)))?;
        Ok(())
    }

    /// Check that the store credential and repository coordinates are set.
    pub fn require_store_fields(&self) -> Result<()> {
        if self.github_token.is_empty() {
            return Err(SyncError::Auth("github token not configured".to_string()));
        }
        if self.owner.is_empty() || self.repo.is_empty() {
            return Err(SyncError::Auth(
                "repository owner/name not configured".to_string(),
            ));
        }
        Ok(())
    }
}
