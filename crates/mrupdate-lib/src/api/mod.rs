//! # API Module
//!
//! Registry access for update resolution.
//!
//! ## Modules
//!
//! - [`modrinth`] - Project, version and hash lookups plus verified downloads

pub mod modrinth;

pub use modrinth::{
    DEFAULT_API_URL, FileHashes, LiveModrinthClient, ModrinthClient, ModrinthError, Project,
    RegistryConfig, Version, VersionFile,
};

#[cfg(any(test, feature = "test-utils"))]
pub use modrinth::MockModrinthClient;
