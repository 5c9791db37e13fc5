//! Storage collaborators — where candidate lists are read from and
//! generated documents are written to.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Suffix appended to bare locators when the first lookup misses.
pub const DEFAULT_SUFFIX: &str = ".md";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("nothing found at '{0}'")]
    NotFound(String),
    #[error("'{0}' already exists")]
    AlreadyExists(String),
    #[error("'{0}' is not a valid locator")]
    InvalidLocator(String),
    #[error("IO error at '{locator}': {source}")]
    Io {
        locator: String,
        #[source]
        source: io::Error,
    },
}

/// What a locator points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A single list-like document.
    Document,
    /// A folder of named items.
    Container,
}

/// The storage the generator reads sources from and writes NPCs to.
pub trait Storage {
    fn entry(&self, locator: &str) -> Option<EntryKind>;

    fn exists(&self, locator: &str) -> bool {
        self.entry(locator).is_some()
    }

    /// Raw lines of a document, in document order.
    fn list_lines(&self, locator: &str) -> Result<Vec<String>, StorageError>;

    /// Base names of the items in a container.
    fn list_names(&self, locator: &str) -> Result<Vec<String>, StorageError>;

    /// Persist a new document; returns the locator it was stored under.
    fn create_document(&self, locator: &str, content: &str) -> Result<String, StorageError>;

    /// Suffix bare locators are retried with.
    fn implicit_suffix(&self) -> &str {
        DEFAULT_SUFFIX
    }
}

/// Normalize a `/`-separated locator: trims surrounding whitespace and
/// slashes, collapses empty segments. Returns `None` for parent references.
pub fn normalize_locator(locator: &str) -> Option<String> {
    let mut segments = Vec::new();
    for segment in locator.trim().split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s => segments.push(s),
        }
    }
    Some(segments.join("/"))
}

/// Join a folder locator and a document name.
pub fn join_locator(folder: &str, name: &str) -> String {
    match normalize_locator(folder) {
        Some(folder) if !folder.is_empty() => format!("{}/{}", folder, name),
        _ => name.to_string(),
    }
}

/// A markdown vault on disk. Locators are relative to the vault root.
#[derive(Debug, Clone)]
pub struct VaultStorage {
    root: PathBuf,
}

impl VaultStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, locator: &str) -> Result<PathBuf, StorageError> {
        let normalized = normalize_locator(locator)
            .ok_or_else(|| StorageError::InvalidLocator(locator.to_string()))?;
        let mut path = self.root.clone();
        for segment in normalized.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        Ok(path)
    }
}

fn io_err(locator: &str) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        locator: locator.to_string(),
        source,
    }
}

/// Collect file stems below `dir`, depth first, skipping hidden entries.
fn collect_names(dir: &Path, out: &mut Vec<String>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_name = entry.file_name();
        if file_name.to_string_lossy().starts_with('.') {
            continue;
        }
        if path.is_dir() {
            collect_names(&path, out)?;
        } else if let Some(stem) = path.file_stem() {
            out.push(stem.to_string_lossy().to_string());
        }
    }
    Ok(())
}

/// Write a freshly created document. On failure the file at `path` is
/// removed again, so no partial document is left behind.
fn fill_new_document<W: Write>(path: &Path, mut file: W, content: &str) -> io::Result<()> {
    let written = file
        .write_all(content.as_bytes())
        .and_then(|_| file.flush());
    if let Err(e) = written {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path) {
            warn!(path = %path.display(), "failed removing partial document: {}", cleanup);
        }
        return Err(e);
    }
    Ok(())
}

impl Storage for VaultStorage {
    fn entry(&self, locator: &str) -> Option<EntryKind> {
        let path = self.path_for(locator).ok()?;
        if path.is_file() {
            Some(EntryKind::Document)
        } else if path.is_dir() {
            Some(EntryKind::Container)
        } else {
            None
        }
    }

    fn list_lines(&self, locator: &str) -> Result<Vec<String>, StorageError> {
        let path = self.path_for(locator)?;
        let contents = fs::read_to_string(&path).map_err(io_err(locator))?;
        Ok(contents.lines().map(str::to_string).collect())
    }

    fn list_names(&self, locator: &str) -> Result<Vec<String>, StorageError> {
        let path = self.path_for(locator)?;
        if !path.is_dir() {
            return Err(StorageError::NotFound(locator.to_string()));
        }
        let mut names = Vec::new();
        collect_names(&path, &mut names).map_err(io_err(locator))?;
        Ok(names)
    }

    fn create_document(&self, locator: &str, content: &str) -> Result<String, StorageError> {
        let normalized = normalize_locator(locator)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| StorageError::InvalidLocator(locator.to_string()))?;
        let path = self.path_for(&normalized)?;
        if path.exists() {
            return Err(StorageError::AlreadyExists(normalized));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err(locator))?;
        }
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .and_then(|file| fill_new_document(&path, file, content))
            .map_err(|source| match source.kind() {
                io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(normalized.clone()),
                _ => StorageError::Io {
                    locator: normalized.clone(),
                    source,
                },
            })?;
        Ok(normalized)
    }
}

/// In-memory storage. Folders exist implicitly when a document lives
/// below them or when added explicitly.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    documents: RefCell<BTreeMap<String, String>>,
    folders: RefCell<BTreeSet<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a document.
    pub fn with_document(self, locator: &str, content: &str) -> Self {
        self.insert_document(locator, content);
        self
    }

    pub fn with_folder(self, locator: &str) -> Self {
        if let Some(folder) = normalize_locator(locator) {
            self.folders.borrow_mut().insert(folder);
        }
        self
    }

    pub fn insert_document(&self, locator: &str, content: &str) {
        if let Some(locator) = normalize_locator(locator) {
            self.documents
                .borrow_mut()
                .insert(locator, content.to_string());
        }
    }

    pub fn document(&self, locator: &str) -> Option<String> {
        let locator = normalize_locator(locator)?;
        self.documents.borrow().get(&locator).cloned()
    }

    pub fn document_count(&self) -> usize {
        self.documents.borrow().len()
    }

    fn is_folder(&self, locator: &str) -> bool {
        if locator.is_empty() || self.folders.borrow().contains(locator) {
            return true;
        }
        let prefix = format!("{}/", locator);
        self.documents.borrow().keys().any(|k| k.starts_with(&prefix))
            || self.folders.borrow().iter().any(|k| k.starts_with(&prefix))
    }
}

impl Storage for MemoryStorage {
    fn entry(&self, locator: &str) -> Option<EntryKind> {
        let locator = normalize_locator(locator)?;
        if self.documents.borrow().contains_key(&locator) {
            Some(EntryKind::Document)
        } else if self.is_folder(&locator) {
            Some(EntryKind::Container)
        } else {
            None
        }
    }

    fn list_lines(&self, locator: &str) -> Result<Vec<String>, StorageError> {
        self.document(locator)
            .map(|content| content.lines().map(str::to_string).collect())
            .ok_or_else(|| StorageError::NotFound(locator.to_string()))
    }

    fn list_names(&self, locator: &str) -> Result<Vec<String>, StorageError> {
        let folder = normalize_locator(locator)
            .ok_or_else(|| StorageError::InvalidLocator(locator.to_string()))?;
        if !self.is_folder(&folder) {
            return Err(StorageError::NotFound(locator.to_string()));
        }
        let prefix = if folder.is_empty() {
            String::new()
        } else {
            format!("{}/", folder)
        };
        let names = self
            .documents
            .borrow()
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .map(|rest| {
                let file = rest.rsplit('/').next().unwrap_or(rest);
                Path::new(file)
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| file.to_string())
            })
            .collect();
        Ok(names)
    }

    fn create_document(&self, locator: &str, content: &str) -> Result<String, StorageError> {
        let locator = normalize_locator(locator)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| StorageError::InvalidLocator(locator.to_string()))?;
        let mut documents = self.documents.borrow_mut();
        if documents.contains_key(&locator) {
            return Err(StorageError::AlreadyExists(locator));
        }
        documents.insert(locator.clone(), content.to_string());
        Ok(locator)
    }
}
