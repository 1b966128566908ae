//! Modpack and registry-record builders

use anyhow::Result;
use mrupdate_lib::Modpack;
use mrupdate_lib::engine::RunOptions;
use serde_json::{Value, json};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// A manifest `files` entry
pub fn mod_entry(path: &str, download: Option<&str>, sha1: Option<&str>) -> Value {
    let mut hashes = serde_json::Map::new();
    if let Some(sha1) = sha1 {
        hashes.insert("sha1".to_string(), json!(sha1));
    }

    json!({
        "path": path,
        "downloads": download.into_iter().collect::<Vec<_>>(),
        "hashes": hashes,
    })
}

/// A modpack directory plus the working directory holding `mods/`
pub struct PackFixture {
    pack: TempDir,
    workdir: TempDir,
}

impl PackFixture {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pack: TempDir::new()?,
            workdir: TempDir::new()?,
        })
    }

    /// Manifest JSON for the given Minecraft version and loader dependencies
    pub fn manifest(minecraft: &str, loaders: &[(&str, &str)], files: Vec<Value>) -> Value {
        let mut dependencies = serde_json::Map::new();
        dependencies.insert("minecraft".to_string(), json!(minecraft));
        for (loader, version) in loaders {
            dependencies.insert(loader.to_string(), json!(version));
        }

        json!({
            "formatVersion": 1,
            "game": "minecraft",
            "versionId": "1.0.0",
            "name": "E2E Pack",
            "dependencies": dependencies,
            "files": files,
        })
    }

    /// Write `modrinth.index.json` into the pack directory and load it
    pub fn write(&self, manifest: &Value) -> Result<Modpack> {
        fs::write(
            self.pack.path().join("modrinth.index.json"),
            serde_json::to_vec_pretty(manifest)?,
        )?;
        Ok(Modpack::load(self.pack.path())?)
    }

    /// Zip the manifest (under `prefix/`) into a `.mrpack` and return its path
    pub fn write_mrpack(&self, manifest: &Value, prefix: &str) -> Result<PathBuf> {
        let path = self.pack.path().join("input.mrpack");
        let mut writer = zip::ZipWriter::new(fs::File::create(&path)?);
        let name = if prefix.is_empty() {
            "modrinth.index.json".to_string()
        } else {
            format!("{}/modrinth.index.json", prefix)
        };
        writer.start_file(name, SimpleFileOptions::default())?;
        writer.write_all(&serde_json::to_vec(manifest)?)?;
        writer.finish()?;
        Ok(path)
    }

    pub fn pack_dir(&self) -> &Path {
        self.pack.path()
    }

    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    pub fn mods_dir(&self) -> PathBuf {
        self.workdir.path().join("mods")
    }

    pub fn live(&self, file_name: &str) -> PathBuf {
        self.mods_dir().join(file_name)
    }

    /// Put a file into the live mods directory
    pub fn install(&self, file_name: &str, contents: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(self.mods_dir())?;
        let path = self.live(file_name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Files currently in `mods/old_mods`
    pub fn backups(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.mods_dir().join("old_mods"))
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn run_options(&self, dry_run: bool) -> RunOptions {
        RunOptions {
            workdir: self.workdir.path().to_path_buf(),
            dry_run,
        }
    }
}

/// A registry version record
#[derive(Debug, Clone)]
pub struct VersionFixture {
    pub id: String,
    pub project_id: String,
    pub version_number: String,
    pub game_versions: Vec<String>,
    pub loaders: Vec<String>,
    pub date_published: String,
    pub file_url: String,
    pub filename: String,
    pub sha1: String,
}

impl VersionFixture {
    pub fn new(project_id: &str, version_number: &str) -> Self {
        Self {
            id: format!("{}-{}", project_id, version_number),
            project_id: project_id.to_string(),
            version_number: version_number.to_string(),
            game_versions: vec!["1.21.4".to_string()],
            loaders: vec!["fabric".to_string()],
            date_published: "2025-01-01T00:00:00Z".to_string(),
            file_url: String::new(),
            filename: format!("{}-{}.jar", project_id, version_number),
            sha1: String::new(),
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn loaders(mut self, loaders: &[&str]) -> Self {
        self.loaders = loaders.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn game_versions(mut self, versions: &[&str]) -> Self {
        self.game_versions = versions.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn published(mut self, timestamp: &str) -> Self {
        self.date_published = timestamp.to_string();
        self
    }

    /// Point the primary file at `url` whose contents hash to `sha1`
    pub fn file(mut self, url: &str, filename: &str, sha1: &str) -> Self {
        self.file_url = url.to_string();
        self.filename = filename.to_string();
        self.sha1 = sha1.to_string();
        self
    }

    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "project_id": self.project_id,
            "name": format!("{} {}", self.project_id, self.version_number),
            "version_number": self.version_number,
            "game_versions": self.game_versions,
            "loaders": self.loaders,
            "date_published": self.date_published,
            "files": [{
                "hashes": {"sha1": self.sha1},
                "url": self.file_url,
                "filename": self.filename,
                "primary": true,
                "size": 0
            }]
        })
    }
}
