//! Hermetic end-to-end test support
//!
//! Packs are written into temporary directories and the registry is a
//! `mockito` server speaking the Modrinth v2 routes the live client uses.

pub mod fixtures;
pub mod registry;

pub use fixtures::{PackFixture, VersionFixture, mod_entry};
pub use registry::RegistryFixture;
