//! GitHub-backed file store using the repository contents API.
//!
//! Files are addressed by repository-relative path plus branch; the blob
//! `sha` returned by the API is the opaque version token. Content travels
//! base64-encoded on the wire, which callers never see. The server performs
//! the token check atomically on write (`sha` in the PUT body), so no
//! client-side compare-and-swap is attempted.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::store::{FileSnapshot, FileStore};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const RAW_BASE: &str = "https://raw.githubusercontent.com";
const USER_AGENT: &str = "cvsync";

/// File store backed by the GitHub contents API.
pub struct GitHubStore {
    api_base: String,
    owner: String,
    repo: String,
    branch: String,
    token: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

impl GitHubStore {
    /// Create a store from injected configuration. Fails fast when the
    /// credential or repository coordinates are missing.
    pub fn new(config: &SyncConfig) -> Result<Self> {
        config.require_store_fields()?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| SyncError::Transient(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_base: DEFAULT_API_BASE.to_string(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            token: config.github_token.clone(),
            http,
        })
    }

    /// Override the API base URL (test servers, GitHub Enterprise).
    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    /// Public URL of a file on the configured branch.
    fn raw_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            RAW_BASE, self.owner, self.repo, self.branch, path
        )
    }

    /// Upload a binary asset (image, PDF, certificate scan) and return its
    /// public raw URL, the form the records' link fields hold. Create-only:
    /// no version token is involved, and uploading over an existing path is
    /// a Conflict.
    pub async fn upload_asset(&self, path: &str, data: &[u8], message: &str) -> Result<String> {
        let url = self.contents_url(path);
        debug!(path, branch = %self.branch, bytes = data.len(), "uploading asset via contents API");

        let body = UpdateRequest {
            message,
            content: BASE64.encode(data),
            branch: &self.branch,
            sha: None,
        };

        let resp = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Transient(format!("PUT {} failed: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, path, &body, true));
        }

        Ok(self.raw_url(path))
    }
}

#[async_trait]
impl FileStore for GitHubStore {
    async fn fetch(&self, path: &str) -> Result<FileSnapshot> {
        let url = self.contents_url(path);
        debug!(path, branch = %self.branch, "fetching file from contents API");

        let resp = self
            .http
            .get(&url)
            .query(&[("ref", self.branch.as_str())])
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| SyncError::Transient(format!("GET {} failed: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, path, &body, false));
        }

        let contents: ContentsResponse = resp
            .json()
            .await
            .map_err(|e| SyncError::Transient(format!("invalid contents response: {}", e)))?;

        let content = decode_content(path, &contents.content)?;
        Ok(FileSnapshot {
            path: path.to_string(),
            content,
            version_token: contents.sha,
        })
    }

    async fn write(
        &self,
        path: &str,
        content: &str,
        message: &str,
        expected_token: &str,
    ) -> Result<()> {
        let url = self.contents_url(path);
        debug!(path, branch = %self.branch, message, "writing file via contents API");

        let body = UpdateRequest {
            message,
            content: BASE64.encode(content.as_bytes()),
            branch: &self.branch,
            sha: if expected_token.is_empty() {
                None
            } else {
                Some(expected_token)
            },
        };

        let resp = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Transient(format!("PUT {} failed: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, path, &body, true));
        }

        Ok(())
    }
}

/// Map an HTTP status to the error taxonomy. `is_write` distinguishes the
/// PUT path, where 409/422 signal a stale `sha` rather than a bad request.
fn classify_status(status: StatusCode, path: &str, body: &str, is_write: bool) -> SyncError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::Auth(format!(
            "store rejected credentials ({}): {}",
            status,
            summarize(body)
        )),
        StatusCode::NOT_FOUND => SyncError::NotFound(path.to_string()),
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY if is_write => {
            SyncError::conflict(path, format!("store rejected stale token ({})", status))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            SyncError::Transient(format!("rate limited ({})", status))
        }
        s if s.is_server_error() => {
            SyncError::Transient(format!("store failure ({}): {}", s, summarize(body)))
        }
        s => SyncError::Transient(format!("unexpected status {}: {}", s, summarize(body))),
    }
}

/// Decode the base64 content field, which GitHub returns with embedded
/// newlines.
fn decode_content(path: &str, encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| SyncError::Transient(format!("invalid base64 in contents response: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|_| SyncError::parse(path, "file content is not valid UTF-8", String::new()))
}

fn summarize(body: &str) -> String {
    body.chars().take(120).collect()
}
