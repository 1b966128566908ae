//! Loader and Minecraft version compatibility predicates

use crate::api::Version;
use crate::primitives::LoaderFamily;
use std::collections::BTreeSet;

/// Registry loader tags usable by a modpack's declared loaders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibleLoaders {
    tags: BTreeSet<String>,
}

impl CompatibleLoaders {
    /// Quilt also accepts Fabric; every other family is strict
    pub fn from_families(families: &[LoaderFamily]) -> Self {
        let mut tags = BTreeSet::new();

        for family in families {
            match family {
                LoaderFamily::Quilt => {
                    tags.insert(LoaderFamily::Quilt.tag().to_string());
                    tags.insert(LoaderFamily::Fabric.tag().to_string());
                }
                other => {
                    tags.insert(other.tag().to_string());
                }
            }
        }

        Self { tags }
    }

    pub fn from_identifiers<S: AsRef<str>>(identifiers: &[S]) -> Self {
        let families: Vec<LoaderFamily> = identifiers
            .iter()
            .map(|id| LoaderFamily::parse(id.as_ref()))
            .collect();
        Self::from_families(&families)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(&tag.to_lowercase())
    }

    /// Whether any declared loader of a candidate is in the set
    pub fn accepts<S: AsRef<str>>(&self, candidate_loaders: &[S]) -> bool {
        candidate_loaders
            .iter()
            .any(|loader| self.contains(loader.as_ref()))
    }

    /// Tags in stable order, for the registry pre-filter
    pub fn tags(&self) -> Vec<String> {
        self.tags.iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

fn parse_numeric(version: &str) -> Option<Vec<u64>> {
    version
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

/// Same `major.minor` is compatible; anything unparsable needs an exact match
pub fn minecraft_version_compatible(target: &str, candidate: &str) -> bool {
    if target == candidate {
        return true;
    }

    match (parse_numeric(target), parse_numeric(candidate)) {
        (Some(t), Some(c)) if t.len() >= 2 && c.len() >= 2 => t[0] == c[0] && t[1] == c[1],
        _ => false,
    }
}

/// A candidate is usable when both predicates hold
pub fn is_usable(version: &Version, target_minecraft: &str, loaders: &CompatibleLoaders) -> bool {
    let minecraft_ok = version
        .game_versions
        .iter()
        .any(|declared| minecraft_version_compatible(target_minecraft, declared));

    minecraft_ok && loaders.accepts(&version.loaders)
}

#[cfg(test)]
mod tests {
    include!("compat.test.rs");
}
