use super::archive::{ArchiveError, extract_mrpack};
use crate::primitives::{LoaderFamily, SideEnv};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info};

/// Manifest file names, in lookup priority order
pub const INDEX_FILE_NAMES: [&str; 2] = ["modrinth.index.json", "index.json"];

const DEFAULT_PACK_NAME: &str = "modpack";

/// Manifest loading errors; all of them abort a run before any mod is touched
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Modpack path does not exist: {path}")]
    PathNotFound { path: String },

    #[error("modrinth.index.json or index.json not found in {dir}")]
    IndexNotFound { dir: String },

    #[error("Failed to read manifest {path}: {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse manifest {path}: {source}")]
    ParseFailed {
        path: String,
        source: serde_json::Error,
    },

    #[error("Manifest {path} does not declare dependencies.minecraft")]
    MissingMinecraftVersion { path: String },

    #[error("Failed to unpack modpack archive: {source}")]
    Archive {
        #[from]
        source: ArchiveError,
    },

    #[error("Failed to create extraction directory: {source}")]
    TempDirFailed { source: std::io::Error },
}

/// Hashes as declared in a manifest entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestHashes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha512: Option<String>,
}

/// A single mod as declared in the manifest's `files` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModEntry {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub downloads: Vec<String>,
    #[serde(default)]
    pub hashes: ManifestHashes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<SideEnv>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl ModEntry {
    /// Final component of `path`, used as the live file name under `mods/`
    pub fn file_name(&self) -> Option<&str> {
        self.path
            .rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty())
    }

    /// Name to show in progress output and reports
    pub fn display_name(&self) -> &str {
        self.file_name().unwrap_or(&self.path)
    }

    pub fn sha1(&self) -> Option<&str> {
        self.hashes.sha1.as_deref().filter(|hash| !hash.is_empty())
    }

    pub fn first_download(&self) -> Option<&str> {
        self.downloads.first().map(String::as_str)
    }
}

/// The manifest document (`modrinth.index.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModpackManifest {
    #[serde(default)]
    pub format_version: Option<u32>,
    #[serde(default)]
    pub game: Option<String>,
    #[serde(default)]
    pub version_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub files: Vec<ModEntry>,
}

impl ModpackManifest {
    pub fn minecraft_version(&self) -> Option<&str> {
        self.dependencies
            .get("minecraft")
            .map(String::as_str)
            .filter(|version| !version.is_empty())
    }

    /// Every dependency key other than `minecraft`, as declared
    pub fn loader_identifiers(&self) -> Vec<String> {
        self.dependencies
            .keys()
            .filter(|key| key.as_str() != "minecraft")
            .cloned()
            .collect()
    }

    /// Manifest name made safe for output file names
    pub fn pack_name(&self) -> String {
        let name = self
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_PACK_NAME);

        name.replace(' ', "_").replace(['[', ']'], "")
    }
}

/// A loaded modpack: parsed manifest plus where it came from
///
/// When loaded from a `.mrpack`, the extraction directory lives as long as
/// this value and is removed on drop.
#[derive(Debug)]
pub struct Modpack {
    pub manifest: ModpackManifest,
    pub index_path: PathBuf,
    pub minecraft_version: String,
    pub loaders: Vec<LoaderFamily>,
    extracted: Option<TempDir>,
}

impl Modpack {
    /// Load from a modpack directory or a `.mrpack` file
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::PathNotFound {
                path: path.display().to_string(),
            });
        }

        if path.is_dir() {
            return Self::from_dir(path, None);
        }

        let extracted =
            TempDir::new().map_err(|source| ManifestError::TempDirFailed { source })?;
        info!(archive = %path.display(), "Extracting modpack archive");
        extract_mrpack(path, extracted.path())?;

        let root = extracted.path().to_path_buf();
        Self::from_dir(&root, Some(extracted))
    }

    fn from_dir(dir: &Path, extracted: Option<TempDir>) -> Result<Self, ManifestError> {
        let index_path = find_index(dir).ok_or_else(|| ManifestError::IndexNotFound {
            dir: dir.display().to_string(),
        })?;
        debug!(index = %index_path.display(), "Found modpack manifest");

        let manifest = read_manifest(&index_path)?;
        let minecraft_version = manifest
            .minecraft_version()
            .ok_or_else(|| ManifestError::MissingMinecraftVersion {
                path: index_path.display().to_string(),
            })?
            .to_string();
        let loaders = manifest
            .loader_identifiers()
            .iter()
            .map(|id| LoaderFamily::parse(id))
            .collect();

        Ok(Self {
            manifest,
            index_path,
            minecraft_version,
            loaders,
            extracted,
        })
    }

    pub fn entries(&self) -> &[ModEntry] {
        &self.manifest.files
    }

    pub fn pack_name(&self) -> String {
        self.manifest.pack_name()
    }

    /// Whether the manifest came out of a temporary extraction
    pub fn is_extracted(&self) -> bool {
        self.extracted.is_some()
    }
}

/// Parse a manifest file
pub fn read_manifest(path: &Path) -> Result<ModpackManifest, ManifestError> {
    let contents = std::fs::read(path).map_err(|source| ManifestError::ReadFailed {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_slice(&contents).map_err(|source| ManifestError::ParseFailed {
        path: path.display().to_string(),
        source,
    })
}

/// Locate the manifest: root first, then a recursive search per file name
pub fn find_index(dir: &Path) -> Option<PathBuf> {
    for name in INDEX_FILE_NAMES {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    INDEX_FILE_NAMES
        .iter()
        .find_map(|name| find_recursive(dir, name))
}

fn find_recursive(dir: &Path, name: &str) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .collect();
    entries.sort();

    if let Some(found) = entries
        .iter()
        .find(|path| path.is_file() && path.file_name().is_some_and(|n| n == name))
    {
        return Some(found.clone());
    }

    entries
        .iter()
        .filter(|path| path.is_dir())
        .find_map(|sub| find_recursive(sub, name))
}

#[cfg(test)]
mod tests {
    include!("manifest.test.rs");
}
