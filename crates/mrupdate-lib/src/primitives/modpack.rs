use serde::{Deserialize, Serialize};
use std::fmt;

/// Mod-loading runtimes the registry tags versions with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LoaderFamily {
    Fabric,
    Quilt,
    Forge,
    NeoForge,
    /// Anything else, lower-cased verbatim
    Other(String),
}

impl LoaderFamily {
    /// Classify a loader identifier as it appears in a manifest's
    /// `dependencies` map or in a registry version's `loaders` list.
    ///
    /// Manifest keys carry a `-loader` suffix (`fabric-loader`,
    /// `quilt-loader`); registry tags do not. Both map to the same family.
    pub fn parse(identifier: &str) -> Self {
        let lowered = identifier.trim().to_lowercase();
        let bare = lowered.strip_suffix("-loader").unwrap_or(&lowered);

        match bare {
            "fabric" => Self::Fabric,
            "quilt" => Self::Quilt,
            "forge" => Self::Forge,
            "neoforge" => Self::NeoForge,
            _ => Self::Other(lowered),
        }
    }

    /// The registry tag for this family
    pub fn tag(&self) -> &str {
        match self {
            Self::Fabric => "fabric",
            Self::Quilt => "quilt",
            Self::Forge => "forge",
            Self::NeoForge => "neoforge",
            Self::Other(name) => name,
        }
    }

    pub fn is_quilt(&self) -> bool {
        matches!(self, Self::Quilt)
    }
}

impl fmt::Display for LoaderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Which side an output `.mrpack` is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    Client,
    Server,
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationMode::Client => write!(f, "client"),
            GenerationMode::Server => write!(f, "server"),
        }
    }
}

/// Per-side requirement of a file in a modpack manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideRequirement {
    Required,
    Optional,
    Unsupported,
    /// Registry projects may report `unknown`; never written to manifests
    #[serde(other)]
    Unknown,
}

/// Client/server requirement pair (`env` in the manifest format)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideEnv {
    pub client: SideRequirement,
    pub server: SideRequirement,
}

impl SideEnv {
    /// The `env` block written for files in a generated pack
    pub fn for_mode(mode: GenerationMode) -> Self {
        match mode {
            GenerationMode::Client => Self {
                client: SideRequirement::Required,
                server: SideRequirement::Unsupported,
            },
            GenerationMode::Server => Self {
                client: SideRequirement::Unsupported,
                server: SideRequirement::Required,
            },
        }
    }
}
