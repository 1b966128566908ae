//! Modrinth API client implementation
//!
//! Provides production (Live) and test (Mock) implementations of the registry
//! lookups the update engine needs: project info, version listings, version
//! lookup by file hash, and verified file downloads.
//!
//! Lookups never turn a non-200 status into an error: a miss is `Ok(None)`
//! or an empty listing. Only transport, decode and filesystem failures
//! surface as `ModrinthError`, and the caller decides what to do with them.

use crate::modpack::hashing::StreamingHasher;
use crate::primitives::SideRequirement;
use chrono::{DateTime, Utc};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};

/// Public Modrinth API v2 endpoint
pub const DEFAULT_API_URL: &str = "https://api.modrinth.com/v2";

/// Modrinth API errors
#[derive(Debug, Error)]
pub enum ModrinthError {
    #[error("HTTP request failed: {source}")]
    RequestFailed {
        #[from]
        source: reqwest::Error,
    },

    #[error("JSON parsing failed: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },

    #[error("Download of {url} failed with status {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Hash mismatch for {url}: expected {expected}, got {actual}")]
    HashMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("Mock failure: {message}")]
    MockFailure { message: String },
}

/// Registry connection settings passed to the client constructor
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub base_url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

/// Project information (`GET /project/{id}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default = "unknown_side")]
    pub client_side: SideRequirement,
    #[serde(default = "unknown_side")]
    pub server_side: SideRequirement,
}

fn unknown_side() -> SideRequirement {
    SideRequirement::Unknown
}

/// File hashes reported for a distributable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHashes {
    pub sha1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha512: Option<String>,
}

/// Version file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionFile {
    pub hashes: FileHashes,
    pub url: String,
    pub filename: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub size: u64,
}

/// Version information (`GET /project/{id}/version`, `GET /version_file/{hash}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    pub id: String,
    pub project_id: String,
    #[serde(default)]
    pub name: String,
    pub version_number: String,
    #[serde(default)]
    pub changelog: Option<String>,
    #[serde(default)]
    pub game_versions: Vec<String>,
    #[serde(default)]
    pub loaders: Vec<String>,
    pub date_published: DateTime<Utc>,
    #[serde(default)]
    pub files: Vec<VersionFile>,
}

impl Version {
    /// The file flagged primary, else the first file
    pub fn primary_file(&self) -> Option<&VersionFile> {
        self.files
            .iter()
            .find(|file| file.primary)
            .or_else(|| self.files.first())
    }

    /// Whether the version declares the given loader tag (case-insensitive)
    pub fn declares_loader(&self, tag: &str) -> bool {
        self.loaders
            .iter()
            .any(|loader| loader.eq_ignore_ascii_case(tag))
    }

    /// Declares Fabric without also declaring Quilt
    pub fn is_fabric_only(&self) -> bool {
        self.declares_loader("fabric") && !self.declares_loader("quilt")
    }
}

/// Trait for Modrinth API operations
pub trait ModrinthClient {
    /// Look up a project by id or slug
    ///
    /// # Returns
    /// `None` when the registry answers with anything but 200
    fn get_project(
        &self,
        project_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Project>, ModrinthError>> + Send;

    /// List a project's versions, pre-filtered server-side
    ///
    /// The registry's filtering is loose; callers still apply their own
    /// compatibility rules to the result.
    ///
    /// # Arguments
    /// * `project_id` - Project ID or slug
    /// * `game_version` - Target Minecraft version
    /// * `loaders` - Registry loader tags to accept
    fn list_versions(
        &self,
        project_id: &str,
        game_version: &str,
        loaders: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Version>, ModrinthError>> + Send;

    /// Find the version a file belongs to from its SHA-1
    fn get_version_by_hash(
        &self,
        sha1: &str,
    ) -> impl std::future::Future<Output = Result<Option<Version>, ModrinthError>> + Send;

    /// Download a file to `dest`, verifying hashes when provided
    ///
    /// # Returns
    /// Number of bytes written
    fn download_file(
        &self,
        url: &str,
        dest: &Path,
        expected_hashes: Option<&FileHashes>,
    ) -> impl std::future::Future<Output = Result<u64, ModrinthError>> + Send;
}

/// Live Modrinth API client (production)
pub struct LiveModrinthClient {
    client: Client,
    base_url: String,
}

impl LiveModrinthClient {
    pub fn new(client: Client, config: RegistryConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Registry base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a JSON document, mapping any non-200 status to `None`
    async fn get_json<T>(&self, url: &str) -> Result<Option<T>, ModrinthError>
    where
        T: serde::de::DeserializeOwned,
    {
        trace!(url, "GET");
        let response = self.client.get(url).send().await?;

        if response.status() != StatusCode::OK {
            debug!(url, status = response.status().as_u16(), "Registry miss");
            return Ok(None);
        }

        let body = response.bytes().await?;
        Ok(Some(serde_json::from_slice(&body)?))
    }
}

/// Encode a list as the JSON-array query value the registry expects
fn json_array_param(values: &[String]) -> Result<String, ModrinthError> {
    let json = serde_json::to_string(values)?;
    Ok(utf8_percent_encode(&json, NON_ALPHANUMERIC).to_string())
}

impl ModrinthClient for LiveModrinthClient {
    async fn get_project(&self, project_id: &str) -> Result<Option<Project>, ModrinthError> {
        let url = format!(
            "{}/project/{}",
            self.base_url,
            utf8_percent_encode(project_id, NON_ALPHANUMERIC)
        );
        self.get_json(&url).await
    }

    async fn list_versions(
        &self,
        project_id: &str,
        game_version: &str,
        loaders: &[String],
    ) -> Result<Vec<Version>, ModrinthError> {
        let url = format!(
            "{}/project/{}/version?game_versions={}&loaders={}",
            self.base_url,
            utf8_percent_encode(project_id, NON_ALPHANUMERIC),
            json_array_param(&[game_version.to_string()])?,
            json_array_param(loaders)?,
        );

        Ok(self.get_json(&url).await?.unwrap_or_default())
    }

    async fn get_version_by_hash(&self, sha1: &str) -> Result<Option<Version>, ModrinthError> {
        let url = format!(
            "{}/version_file/{}?algorithm=sha1",
            self.base_url,
            utf8_percent_encode(sha1, NON_ALPHANUMERIC)
        );
        self.get_json(&url).await
    }

    async fn download_file(
        &self,
        url: &str,
        dest: &Path,
        expected_hashes: Option<&FileHashes>,
    ) -> Result<u64, ModrinthError> {
        // Direct download without the API base (CDN)
        let mut response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ModrinthError::DownloadFailed {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let write_error = |source| ModrinthError::WriteFailed {
            path: dest.display().to_string(),
            source,
        };

        let mut file = tokio::fs::File::create(dest).await.map_err(write_error)?;
        let mut hasher = StreamingHasher::new();
        let mut written = 0u64;

        while let Some(chunk) = response.chunk().await? {
            hasher.update(&chunk);
            file.write_all(&chunk).await.map_err(write_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_error)?;
        file.sync_all().await.map_err(write_error)?;
        drop(file);

        if let Some(expected) = expected_hashes {
            if let Err(err) = hasher.verify(url, expected) {
                let _ = tokio::fs::remove_file(dest).await;
                return Err(err);
            }
        }

        debug!(url, bytes = written, "Downloaded file");
        Ok(written)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockModrinthClient;

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Mock Modrinth API client (testing)
    ///
    /// Unknown projects and hashes behave like registry misses. Version
    /// listings ignore the filter parameters so tests can feed in versions
    /// the engine must reject on its own.
    #[derive(Clone, Default)]
    pub struct MockModrinthClient {
        projects: Arc<Mutex<HashMap<String, Result<Project, String>>>>,
        versions: Arc<Mutex<HashMap<String, Result<Vec<Version>, String>>>>,
        hashes: Arc<Mutex<HashMap<String, Result<Version, String>>>>,
        downloads: Arc<Mutex<HashMap<String, Result<Vec<u8>, String>>>>,
        download_log: Arc<Mutex<Vec<String>>>,
    }

    impl MockModrinthClient {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a project, keyed by both id and slug
        pub async fn with_project(self, project: Project) -> Self {
            {
                let mut projects = self.projects.lock().await;
                projects.insert(project.slug.clone(), Ok(project.clone()));
                projects.insert(project.id.clone(), Ok(project));
            }
            self
        }

        /// Make a project lookup fail at the transport level
        pub async fn with_project_error(self, project_id: &str, message: &str) -> Self {
            self.projects
                .lock()
                .await
                .insert(project_id.to_string(), Err(message.to_string()));
            self
        }

        pub async fn with_versions(self, project_id: &str, versions: Vec<Version>) -> Self {
            self.versions
                .lock()
                .await
                .insert(project_id.to_string(), Ok(versions));
            self
        }

        pub async fn with_versions_error(self, project_id: &str, message: &str) -> Self {
            self.versions
                .lock()
                .await
                .insert(project_id.to_string(), Err(message.to_string()));
            self
        }

        pub async fn with_hash(self, sha1: &str, version: Version) -> Self {
            self.hashes.lock().await.insert(sha1.to_string(), Ok(version));
            self
        }

        /// Make a hash lookup fail at the transport level
        pub async fn with_hash_error(self, sha1: &str, message: &str) -> Self {
            self.hashes
                .lock()
                .await
                .insert(sha1.to_string(), Err(message.to_string()));
            self
        }

        pub async fn with_download(self, url: &str, result: Result<Vec<u8>, String>) -> Self {
            self.downloads.lock().await.insert(url.to_string(), result);
            self
        }

        /// URLs passed to `download_file`, in call order
        pub async fn downloaded_urls(&self) -> Vec<String> {
            self.download_log.lock().await.clone()
        }
    }

    impl ModrinthClient for MockModrinthClient {
        async fn get_project(&self, project_id: &str) -> Result<Option<Project>, ModrinthError> {
            match self.projects.lock().await.get(project_id) {
                Some(Ok(project)) => Ok(Some(project.clone())),
                Some(Err(message)) => Err(ModrinthError::MockFailure {
                    message: message.clone(),
                }),
                None => Ok(None),
            }
        }

        async fn list_versions(
            &self,
            project_id: &str,
            _game_version: &str,
            _loaders: &[String],
        ) -> Result<Vec<Version>, ModrinthError> {
            match self.versions.lock().await.get(project_id) {
                Some(Ok(versions)) => Ok(versions.clone()),
                Some(Err(message)) => Err(ModrinthError::MockFailure {
                    message: message.clone(),
                }),
                None => Ok(Vec::new()),
            }
        }

        async fn get_version_by_hash(&self, sha1: &str) -> Result<Option<Version>, ModrinthError> {
            match self.hashes.lock().await.get(sha1) {
                Some(Ok(version)) => Ok(Some(version.clone())),
                Some(Err(message)) => Err(ModrinthError::MockFailure {
                    message: message.clone(),
                }),
                None => Ok(None),
            }
        }

        async fn download_file(
            &self,
            url: &str,
            dest: &Path,
            _expected_hashes: Option<&FileHashes>,
        ) -> Result<u64, ModrinthError> {
            self.download_log.lock().await.push(url.to_string());

            let bytes = match self.downloads.lock().await.get(url) {
                Some(Ok(bytes)) => bytes.clone(),
                Some(Err(message)) => {
                    return Err(ModrinthError::MockFailure {
                        message: message.clone(),
                    });
                }
                None => {
                    return Err(ModrinthError::DownloadFailed {
                        url: url.to_string(),
                        status: 404,
                    });
                }
            };

            tokio::fs::write(dest, &bytes)
                .await
                .map_err(|source| ModrinthError::WriteFailed {
                    path: dest.display().to_string(),
                    source,
                })?;
            Ok(bytes.len() as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    include!("modrinth.test.rs");
}
