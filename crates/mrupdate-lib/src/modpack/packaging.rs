//! `.mrpack` generation from a finished update run

use super::hashing;
use super::manifest::{ManifestHashes, ModEntry, ModpackManifest};
use crate::engine::{ModOutcome, ResolutionOutcome, UpdateReport};
use crate::primitives::{GenerationMode, SideEnv, SideRequirement};
use chrono::Local;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

pub const INDEX_FILE: &str = "modrinth.index.json";
pub const OVERRIDES_DIR: &str = "overrides";

/// Top-level files picked up from the invocation directory
pub const EXTRA_FILES: [&str; 2] = ["icon.png", "README.md"];

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: String,
        source: io::Error,
    },

    #[error("Failed to write archive: {source}")]
    Zip {
        #[from]
        source: zip::result::ZipError,
    },

    #[error("Failed to serialize modrinth.index.json: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

fn io_error(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> PackageError {
    let path = path.display().to_string();
    move |source| PackageError::Io {
        action,
        path,
        source,
    }
}

/// Where packaging reads from and writes to
#[derive(Debug, Clone)]
pub struct PackageOptions {
    pub mode: GenerationMode,
    pub pack_name: String,
    pub output_dir: PathBuf,
    /// Copied under `overrides/` when it exists
    pub overrides_dir: PathBuf,
    /// Directory searched for `icon.png` and `README.md`
    pub extras_dir: PathBuf,
    /// Live mods directory, for hashing files the manifest gave no hash for
    pub mods_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MrpackFile {
    pub path: String,
    pub hashes: ManifestHashes,
    pub env: SideEnv,
    pub downloads: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MrpackIndex {
    pub format_version: u32,
    pub game: String,
    pub version_id: String,
    pub name: String,
    pub summary: String,
    pub dependencies: BTreeMap<String, String>,
    pub files: Vec<MrpackFile>,
}

/// What went into one archive
#[derive(Debug, Clone, Default)]
pub struct PackageSummary {
    pub path: PathBuf,
    pub included: usize,
    pub skipped_server_unsupported: usize,
    pub skipped_no_hash: usize,
    pub overrides_copied: bool,
    pub extras: Vec<String>,
}

/// `<pack>.mrpack` for client, `<pack>-server.mrpack` for server
pub fn output_file_name(pack_name: &str, mode: GenerationMode) -> String {
    match mode {
        GenerationMode::Client => format!("{}.mrpack", pack_name),
        GenerationMode::Server => format!("{}-server.mrpack", pack_name),
    }
}

/// Build the index for one generation mode
pub fn build_index(
    manifest: &ModpackManifest,
    report: &UpdateReport,
    options: &PackageOptions,
) -> (MrpackIndex, PackageSummary) {
    let mut summary = PackageSummary::default();
    let env = SideEnv::for_mode(options.mode);
    let mut files = Vec::new();

    for item in &report.outcomes {
        if options.mode == GenerationMode::Server && is_server_unsupported(item) {
            debug!(file = item.entry.display_name(), "Skipping server-unsupported mod");
            summary.skipped_server_unsupported += 1;
            continue;
        }

        let Some(source) = packaged_source(item, &options.mods_dir) else {
            continue;
        };

        let Some(sha1) = source.sha1 else {
            warn!(file = %source.file_name, "No hash available, leaving mod out of the pack");
            summary.skipped_no_hash += 1;
            continue;
        };

        files.push(MrpackFile {
            path: format!("mods/{}", source.file_name),
            hashes: ManifestHashes {
                sha1: Some(sha1),
                sha512: source.sha512,
            },
            env,
            downloads: vec![source.url],
            file_size: source.size,
        });
    }
    summary.included = files.len();

    let base_name = manifest
        .name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| options.pack_name.clone());
    let name = match options.mode {
        GenerationMode::Client => base_name.clone(),
        GenerationMode::Server => format!("{} (Server)", base_name),
    };

    let index = MrpackIndex {
        format_version: 1,
        game: "minecraft".to_string(),
        version_id: manifest
            .version_id
            .clone()
            .unwrap_or_else(|| format!("v{}", Local::now().format("%Y.%m.%d"))),
        name,
        summary: format!(
            "{} {} modpack generated by mrupdate",
            base_name, options.mode
        ),
        dependencies: manifest.dependencies.clone(),
        files,
    };

    (index, summary)
}

fn is_server_unsupported(item: &ModOutcome) -> bool {
    match &item.outcome {
        ResolutionOutcome::Updated { project, .. }
        | ResolutionOutcome::UpToDate { project, .. } => {
            project.server_side == SideRequirement::Unsupported
        }
        _ => false,
    }
}

struct PackagedSource {
    file_name: String,
    url: String,
    sha1: Option<String>,
    sha512: Option<String>,
    size: Option<u64>,
}

/// Download source and hashes for an outcome that belongs in the pack
fn packaged_source(item: &ModOutcome, mods_dir: &Path) -> Option<PackagedSource> {
    let entry = &item.entry;

    match &item.outcome {
        ResolutionOutcome::Updated { chosen_file, .. } => Some(PackagedSource {
            file_name: entry
                .file_name()
                .unwrap_or(chosen_file.filename.as_str())
                .to_string(),
            url: chosen_file.url.clone(),
            sha1: Some(chosen_file.hashes.sha1.clone()),
            sha512: chosen_file.hashes.sha512.clone(),
            size: (chosen_file.size > 0).then_some(chosen_file.size),
        }),

        ResolutionOutcome::UpToDate {
            installed_file: Some(installed),
            ..
        } => Some(PackagedSource {
            file_name: entry
                .file_name()
                .unwrap_or(installed.filename.as_str())
                .to_string(),
            url: installed.url.clone(),
            sha1: Some(installed.hashes.sha1.clone()),
            sha512: installed.hashes.sha512.clone(),
            size: (installed.size > 0).then_some(installed.size),
        }),

        // Without a matching registry file, `mods/` holds what the manifest points at
        ResolutionOutcome::UpToDate { resolved_file, .. } => {
            let file_name = entry
                .file_name()
                .map(str::to_string)
                .or_else(|| resolved_file.as_ref().map(|f| f.filename.clone()))?;
            let url = entry
                .first_download()
                .map(str::to_string)
                .or_else(|| resolved_file.as_ref().map(|f| f.url.clone()));
            let Some(url) = url else {
                warn!(file = %file_name, "No download URL, leaving mod out of the pack");
                return None;
            };

            let sha1 = entry
                .sha1()
                .map(str::to_string)
                .or_else(|| resolved_file.as_ref().map(|f| f.hashes.sha1.clone()))
                .or_else(|| live_sha1(mods_dir, &file_name));

            Some(PackagedSource {
                sha512: manifest_sha512(entry, &sha1),
                size: entry.file_size,
                file_name,
                url,
                sha1,
            })
        }

        _ => None,
    }
}

/// The manifest's SHA-512 only describes the manifest's file
fn manifest_sha512(entry: &ModEntry, sha1: &Option<String>) -> Option<String> {
    match (entry.sha1(), sha1) {
        (Some(declared), Some(used)) if declared == used => entry.hashes.sha512.clone(),
        _ => None,
    }
}

fn live_sha1(mods_dir: &Path, file_name: &str) -> Option<String> {
    let path = mods_dir.join(file_name);
    path.is_file()
        .then(|| hashing::sha1_file(&path).ok())
        .flatten()
}

/// Build and write one `.mrpack`
pub fn write_mrpack(
    manifest: &ModpackManifest,
    report: &UpdateReport,
    options: &PackageOptions,
) -> Result<PackageSummary, PackageError> {
    let (index, mut summary) = build_index(manifest, report, options);

    fs::create_dir_all(&options.output_dir).map_err(io_error("create", &options.output_dir))?;
    let output = options
        .output_dir
        .join(output_file_name(&options.pack_name, options.mode));
    let partial = output.with_extension("mrpack.partial");

    let file = File::create(&partial).map_err(io_error("create", &partial))?;
    let mut writer = zip::ZipWriter::new(file);
    let file_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.start_file(INDEX_FILE, file_options)?;
    writer
        .write_all(&serde_json::to_vec_pretty(&index)?)
        .map_err(io_error("write", &partial))?;

    if options.overrides_dir.is_dir() {
        add_tree(&mut writer, &options.overrides_dir, OVERRIDES_DIR, file_options)?;
        summary.overrides_copied = true;
        info!(path = %options.overrides_dir.display(), "Copied overrides folder");
    }

    for name in EXTRA_FILES {
        let path = options.extras_dir.join(name);
        if path.is_file() {
            writer.start_file(name, file_options)?;
            let contents = fs::read(&path).map_err(io_error("read", &path))?;
            writer
                .write_all(&contents)
                .map_err(io_error("write", &partial))?;
            summary.extras.push(name.to_string());
        }
    }

    writer.finish()?;
    fs::rename(&partial, &output).map_err(io_error("move", &output))?;

    info!(
        path = %output.display(),
        mode = %options.mode,
        mods = summary.included,
        "Wrote modpack archive"
    );
    summary.path = output;
    Ok(summary)
}

fn add_tree(
    writer: &mut zip::ZipWriter<File>,
    dir: &Path,
    prefix: &str,
    file_options: SimpleFileOptions,
) -> Result<(), PackageError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_error("read", dir))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .collect();
    entries.sort();

    for path in entries {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let archive_name = format!("{}/{}", prefix, name);

        if path.is_dir() {
            add_tree(writer, &path, &archive_name, file_options)?;
        } else {
            writer.start_file(archive_name.as_str(), file_options)?;
            let mut source = File::open(&path).map_err(io_error("read", &path))?;
            io::copy(&mut source, writer).map_err(io_error("copy", &path))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    include!("packaging.test.rs");
}
