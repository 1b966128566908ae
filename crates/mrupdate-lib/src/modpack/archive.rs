use std::fs::{self, File};
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to open archive {path}: {source}")]
    OpenFailed { path: String, source: io::Error },

    #[error("Invalid zip archive: {source}")]
    InvalidArchive {
        #[from]
        source: zip::result::ZipError,
    },

    #[error("Failed to extract archive entry: {source}")]
    ExtractFailed {
        #[from]
        source: io::Error,
    },
}

/// Extract a `.mrpack` (zip) into `destination`
///
/// Entries whose names would escape `destination` are skipped.
pub fn extract_mrpack(archive_path: &Path, destination: &Path) -> Result<usize, ArchiveError> {
    let file = File::open(archive_path).map_err(|source| ArchiveError::OpenFailed {
        path: archive_path.display().to_string(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut extracted = 0;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;

        let Some(relative) = entry.enclosed_name() else {
            warn!(name = entry.name(), "Skipping unsafe archive entry");
            continue;
        };
        let output_path = destination.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&output_path)?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&output_path)?;
        io::copy(&mut entry, &mut outfile)?;
        extracted += 1;
    }

    debug!(
        archive = %archive_path.display(),
        files = extracted,
        "Extracted modpack archive"
    );
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    include!("archive.test.rs");
}
