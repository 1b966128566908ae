//! # Modpack
//!
//! Reading modpacks in and writing `.mrpack` archives out.
//!
//! - [`manifest`] - manifest types and loading (directory or `.mrpack`)
//! - [`archive`] - zip-slip safe `.mrpack` extraction
//! - [`hashing`] - SHA-1/SHA-512 helpers
//! - [`packaging`] - `.mrpack` generation from an update report

pub mod archive;
pub mod hashing;
pub mod manifest;
pub mod packaging;

pub use archive::{ArchiveError, extract_mrpack};
pub use manifest::{
    INDEX_FILE_NAMES, ManifestError, ManifestHashes, ModEntry, Modpack, ModpackManifest,
    find_index, read_manifest,
};
pub use packaging::{
    MrpackFile, MrpackIndex, PackageError, PackageOptions, PackageSummary, build_index,
    output_file_name, write_mrpack,
};
