//! Source resolution — turns a locator into the candidate values a
//! property can be drawn from.

use thiserror::Error;

use super::storage::{EntryKind, Storage, StorageError};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source '{0}' is neither a document nor a folder")]
    InvalidSourcePath(String),
    #[error("source '{locator}' could not be read: {source}")]
    Unreadable {
        locator: String,
        #[source]
        source: StorageError,
    },
}

impl SourceError {
    pub fn locator(&self) -> &str {
        match self {
            Self::InvalidSourcePath(locator) => locator,
            Self::Unreadable { locator, .. } => locator,
        }
    }
}

/// Resolve a locator into candidates.
///
/// - a document yields its trimmed, non-empty lines in order;
/// - a folder yields the base names of the items below it, in the order
///   the storage enumerates them;
/// - a bare locator that matches nothing is retried once with the storage's
///   implicit suffix.
pub fn resolve<S: Storage + ?Sized>(storage: &S, locator: &str) -> Result<Vec<String>, SourceError> {
    let locator = locator.trim();
    if locator.is_empty() {
        return Err(SourceError::InvalidSourcePath(String::new()));
    }

    let (target, kind) = locate(storage, locator)
        .ok_or_else(|| SourceError::InvalidSourcePath(locator.to_string()))?;

    let listed = match kind {
        EntryKind::Document => storage.list_lines(&target).map(clean_lines),
        EntryKind::Container => storage.list_names(&target),
    };
    listed.map_err(|source| SourceError::Unreadable {
        locator: target,
        source,
    })
}

fn locate<S: Storage + ?Sized>(storage: &S, locator: &str) -> Option<(String, EntryKind)> {
    if let Some(kind) = storage.entry(locator) {
        return Some((locator.to_string(), kind));
    }
    let suffix = storage.implicit_suffix();
    if suffix.is_empty() || locator.ends_with(suffix) {
        return None;
    }
    let retried = format!("{}{}", locator, suffix);
    storage.entry(&retried).map(|kind| (retried, kind))
}

fn clean_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::MemoryStorage;

    fn storage() -> MemoryStorage {
        MemoryStorage::new()
            .with_document("Tables/jobs.md", "  Smith \n\n\tBaker\n   \nFarmer")
            .with_document("Races/Elf.md", "")
            .with_document("Races/Orc.md", "")
            .with_document("Tables/blank.md", "\n  \n")
            .with_folder("Empty")
    }

    #[test]
    fn document_lines_trimmed_and_filtered() {
        let lines = resolve(&storage(), "Tables/jobs.md").unwrap();
        assert_eq!(lines, vec!["Smith", "Baker", "Farmer"]);
    }

    #[test]
    fn folder_yields_base_names() {
        let names = resolve(&storage(), "Races").unwrap();
        assert_eq!(names, vec!["Elf", "Orc"]);
    }

    #[test]
    fn bare_name_retried_with_suffix() {
        let lines = resolve(&storage(), "Tables/jobs").unwrap();
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn suffixed_locator_not_retried() {
        let err = resolve(&storage(), "Tables/missing.md").unwrap_err();
        assert!(matches!(err, SourceError::InvalidSourcePath(l) if l == "Tables/missing.md"));
    }

    #[test]
    fn unknown_locator_is_invalid() {
        assert!(matches!(
            resolve(&storage(), "Nowhere"),
            Err(SourceError::InvalidSourcePath(_))
        ));
    }

    #[test]
    fn blank_locator_is_invalid() {
        assert!(matches!(
            resolve(&storage(), "   "),
            Err(SourceError::InvalidSourcePath(_))
        ));
    }

    #[test]
    fn empty_sources_give_no_candidates() {
        assert!(resolve(&storage(), "Tables/blank").unwrap().is_empty());
        assert!(resolve(&storage(), "Empty").unwrap().is_empty());
    }
}
