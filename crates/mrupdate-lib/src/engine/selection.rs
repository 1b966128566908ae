//! Pure version selection: ordering, Quilt preference, and the final pick

use crate::api::Version;

/// Why a candidate was picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    /// Nothing is installed, so the newest candidate is taken
    NotInstalled,
    /// The installed version is the newest candidate
    AlreadyLatest,
    /// The installed version is listed but something newer exists
    NewerAvailable,
    /// The installed version is not among the candidates
    InstalledNotListed,
    /// A Quilt build of the installed Fabric-only version number
    QuiltExactMatch,
}

/// Which candidates remain after the Quilt preference pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consideration {
    All,
    QuiltOnly,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub version: Version,
    pub is_newer: bool,
    pub reason: SelectionReason,
}

/// Newest first; equal timestamps keep registry order
pub fn sort_newest_first(versions: &mut [Version]) {
    versions.sort_by(|a, b| b.date_published.cmp(&a.date_published));
}

/// Index of a Quilt-tagged candidate with the installed Fabric-only version number
pub fn quilt_exact_match(usable: &[Version], current: &Version) -> Option<usize> {
    if !current.is_fabric_only() {
        return None;
    }

    usable.iter().position(|candidate| {
        candidate.declares_loader("quilt") && candidate.version_number == current.version_number
    })
}

/// Restrict to Quilt builds when the newest one is at least as new as anything usable
pub fn consideration(usable: &[Version]) -> Consideration {
    let newest_quilt = usable.iter().find(|v| v.declares_loader("quilt"));

    match (newest_quilt, usable.first()) {
        (Some(quilt), Some(newest)) if quilt.date_published >= newest.date_published => {
            Consideration::QuiltOnly
        }
        _ => Consideration::All,
    }
}

/// Position-based pick over an already ordered candidate list
pub fn select_from(candidates: &[Version], current_version: Option<&str>) -> Option<Selection> {
    let newest = candidates.first()?.clone();

    let Some(current) = current_version.filter(|v| !v.is_empty()) else {
        return Some(Selection {
            version: newest,
            is_newer: true,
            reason: SelectionReason::NotInstalled,
        });
    };

    let (is_newer, reason) = match candidates.iter().position(|v| v.version_number == current) {
        Some(0) => (false, SelectionReason::AlreadyLatest),
        Some(_) => (true, SelectionReason::NewerAvailable),
        None => (true, SelectionReason::InstalledNotListed),
    };

    Some(Selection {
        version: newest,
        is_newer,
        reason,
    })
}

/// Full selection over usable candidates sorted newest first
///
/// `current` is the installed version record when it could be identified.
pub fn choose(
    usable: &[Version],
    pack_has_quilt: bool,
    current: Option<&Version>,
) -> Option<Selection> {
    if usable.is_empty() {
        return None;
    }

    if !pack_has_quilt {
        return select_from(usable, current.map(|v| v.version_number.as_str()));
    }

    if let Some(index) = current.and_then(|current| quilt_exact_match(usable, current)) {
        return Some(Selection {
            version: usable[index].clone(),
            is_newer: true,
            reason: SelectionReason::QuiltExactMatch,
        });
    }

    let current_number = current.map(|v| v.version_number.as_str());
    match consideration(usable) {
        Consideration::QuiltOnly => {
            let quilt: Vec<Version> = usable
                .iter()
                .filter(|v| v.declares_loader("quilt"))
                .cloned()
                .collect();
            select_from(&quilt, current_number)
        }
        Consideration::All => select_from(usable, current_number),
    }
}

#[cfg(test)]
mod tests {
    include!("selection.test.rs");
}
