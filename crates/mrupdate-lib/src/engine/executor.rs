//! File-side of an update: stage, verify, back up, swap

use crate::api::{FileHashes, ModrinthClient, ModrinthError, VersionFile};
use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Download staging area, kept inside `mods/` so the final move is a rename
pub const STAGING_DIR: &str = ".mrupdate-staging";

/// Where superseded mod files are moved
pub const BACKUP_DIR: &str = "old_mods";

#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("Failed to download {url}: {source}")]
    Download { url: String, source: ModrinthError },

    #[error("Version {version} has no files")]
    NoFiles { version: String },

    #[error("Failed to {action} {path}: {source}")]
    Filesystem {
        action: &'static str,
        path: String,
        source: io::Error,
    },

    #[error("Failed to place {path}: {source} (previous file {})", restore_note(.restored))]
    PlaceFailed {
        path: String,
        source: io::Error,
        restored: bool,
    },
}

fn restore_note(restored: &bool) -> &'static str {
    if *restored { "restored" } else { "not restored" }
}

fn fs_error(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> ExecuteError {
    let path = path.display().to_string();
    move |source| ExecuteError::Filesystem {
        action,
        path,
        source,
    }
}

/// Layout of the live mods directory
#[derive(Debug, Clone)]
pub struct ModsDir {
    live: PathBuf,
    staging: PathBuf,
    backups: PathBuf,
}

impl ModsDir {
    /// `<workdir>/mods`, without touching the filesystem
    pub fn new(workdir: &Path) -> Self {
        let live = workdir.join("mods");
        Self {
            staging: live.join(STAGING_DIR),
            backups: live.join(BACKUP_DIR),
            live,
        }
    }

    /// `<workdir>/mods`, created if absent
    pub fn prepare(workdir: &Path) -> Result<Self, ExecuteError> {
        let mods = Self::new(workdir);
        if !mods.live.is_dir() {
            info!(path = %mods.live.display(), "Creating mods directory");
            fs::create_dir_all(&mods.live).map_err(fs_error("create", &mods.live))?;
        }
        Ok(mods)
    }

    pub fn path(&self) -> &Path {
        &self.live
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn live_path(&self, file_name: &str) -> PathBuf {
        self.live.join(file_name)
    }

    /// Remove whatever a run left in staging
    pub fn cleanup_staging(&self) {
        if self.staging.exists() {
            if let Err(err) = fs::remove_dir_all(&self.staging) {
                warn!(
                    path = %self.staging.display(),
                    error = %err,
                    "Failed to clean staging directory"
                );
            }
        }
    }
}

/// Backup file name: `<stem>_<stamp>[-n].<ext>`
pub fn backup_name(file_name: &str, stamp: &str, attempt: u32) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let suffix = if attempt == 0 {
        String::new()
    } else {
        format!("-{}", attempt)
    };

    match path.extension() {
        Some(ext) => format!("{}_{}{}.{}", stem, stamp, suffix, ext.to_string_lossy()),
        None => format!("{}_{}{}", stem, stamp, suffix),
    }
}

/// Move a file, renaming when possible and copying across filesystems
///
/// The cross-filesystem path copies to a temporary name beside `dst`,
/// checks the size, renames into place, and only then removes `src`.
pub fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            debug!(
                from = %src.display(),
                to = %dst.display(),
                "Rename crossed filesystems, copying"
            );
            copy_then_remove(src, dst)
        }
        Err(err) => Err(err),
    }
}

fn copy_then_remove(src: &Path, dst: &Path) -> io::Result<()> {
    let file_name = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let partial = dst.with_file_name(format!(".{}.partial", file_name));

    let copied = fs::copy(src, &partial)?;
    let expected = fs::metadata(src)?.len();
    if copied != expected {
        let _ = fs::remove_file(&partial);
        return Err(io::Error::other(format!(
            "incomplete copy of {}: {} of {} bytes",
            src.display(),
            copied,
            expected
        )));
    }
    fs::File::open(&partial)?.sync_all()?;

    if let Err(err) = fs::rename(&partial, dst) {
        let _ = fs::remove_file(&partial);
        return Err(err);
    }
    fs::remove_file(src)
}

/// Performs downloads and swaps for one run
pub struct Executor<'a, C> {
    client: &'a C,
    mods: &'a ModsDir,
    run_stamp: String,
}

impl<'a, C: ModrinthClient> Executor<'a, C> {
    pub fn new(client: &'a C, mods: &'a ModsDir) -> Self {
        Self {
            client,
            mods,
            run_stamp: Local::now().format("%Y%m%d_%H%M%S").to_string(),
        }
    }

    /// Download `file` and put it at `mods/<live_name>`, backing up what was there
    pub async fn install_update(
        &self,
        live_name: &str,
        file: &VersionFile,
    ) -> Result<PathBuf, ExecuteError> {
        let staged = self.stage(&file.url, live_name, Some(&file.hashes)).await?;
        let live = self.mods.live_path(live_name);

        if !live.exists() {
            self.place(&staged, &live)?;
            return Ok(live);
        }

        let backup = match self.backup(&live) {
            Ok(backup) => backup,
            Err(err) => {
                let _ = fs::remove_file(&staged);
                return Err(err);
            }
        };

        if let Err(source) = move_file(&staged, &live) {
            let restored = move_file(&backup, &live).is_ok();
            let _ = fs::remove_file(&staged);
            return Err(ExecuteError::PlaceFailed {
                path: live.display().to_string(),
                source,
                restored,
            });
        }

        info!(
            file = live_name,
            backup = %backup.display(),
            "Replaced mod file"
        );
        Ok(live)
    }

    /// Download a declared-but-absent file into `mods/<live_name>`
    pub async fn restore_missing(
        &self,
        live_name: &str,
        url: &str,
        expected: Option<&FileHashes>,
    ) -> Result<PathBuf, ExecuteError> {
        let staged = self.stage(url, live_name, expected).await?;
        let live = self.mods.live_path(live_name);
        self.place(&staged, &live)?;
        info!(file = live_name, "Downloaded missing mod file");
        Ok(live)
    }

    async fn stage(
        &self,
        url: &str,
        name: &str,
        expected: Option<&FileHashes>,
    ) -> Result<PathBuf, ExecuteError> {
        fs::create_dir_all(&self.mods.staging).map_err(fs_error("create", &self.mods.staging))?;
        let staged = self.mods.staging.join(name);

        match self.client.download_file(url, &staged, expected).await {
            Ok(bytes) => {
                debug!(url, bytes, staged = %staged.display(), "Staged download");
                Ok(staged)
            }
            Err(source) => {
                let _ = fs::remove_file(&staged);
                Err(ExecuteError::Download {
                    url: url.to_string(),
                    source,
                })
            }
        }
    }

    fn place(&self, staged: &Path, live: &Path) -> Result<(), ExecuteError> {
        move_file(staged, live).map_err(|source| {
            let _ = fs::remove_file(staged);
            ExecuteError::PlaceFailed {
                path: live.display().to_string(),
                source,
                restored: false,
            }
        })
    }

    /// Move a live file into the backup directory under a free name
    pub fn backup(&self, live: &Path) -> Result<PathBuf, ExecuteError> {
        let backups = &self.mods.backups;
        fs::create_dir_all(backups).map_err(fs_error("create", backups))?;

        let file_name = live
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut attempt = 0;
        let target = loop {
            let candidate = backups.join(backup_name(&file_name, &self.run_stamp, attempt));
            if !candidate.exists() {
                break candidate;
            }
            attempt += 1;
        };

        move_file(live, &target).map_err(fs_error("back up", live))?;
        debug!(from = %live.display(), to = %target.display(), "Backed up mod file");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    include!("executor.test.rs");
}
