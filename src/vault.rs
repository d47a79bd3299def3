// File: ./src/vault.rs
//! Note storage: the `NoteStore` seam plus a directory-backed vault and an
//! in-memory store.
//!
//! Note paths are vault-relative and always use `/` separators.
use crate::storage::LocalStorage;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

pub const DEFAULT_NOTE_PREFIX: &str = "ClickUp";
const NOTE_EXTENSION: &str = "md";
const VAULT_LOCK_NAME: &str = ".clicknote";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("note not found: {0}")]
    NotFound(String),

    #[error("note already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid note path: {0}")]
    InvalidPath(String),

    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
}

impl StoreError {
    pub fn io(path: &str, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Note {
    pub path: String,
}

/// Whole-file access to notes.
pub trait NoteStore: Send + Sync {
    /// Every note, sorted by path.
    fn list_notes(&self) -> StoreResult<Vec<Note>>;

    fn read_note(&self, path: &str) -> StoreResult<String>;

    fn delete_note(&self, path: &str) -> StoreResult<()>;

    /// Fails with [`StoreError::AlreadyExists`] if the path is taken.
    fn create_note(&self, path: &str, content: &str) -> StoreResult<Note>;

    /// Replaces the content of an existing note.
    ///
    /// The default goes through delete and create. If the create fails the
    /// previous content is written back before the error is returned, so the
    /// note is never left missing. Stores that can overwrite atomically
    /// should override this.
    fn replace(&self, path: &str, content: &str) -> StoreResult<()> {
        let previous = self.read_note(path)?;
        self.delete_note(path)?;
        if let Err(e) = self.create_note(path, content) {
            log::error!("Rewriting {} failed ({}); restoring previous content", path, e);
            if let Err(restore_err) = self.create_note(path, &previous) {
                log::error!("Restoring {} failed: {}", path, restore_err);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Appends `text` to the end of an existing note.
    fn append(&self, path: &str, text: &str) -> StoreResult<()> {
        let mut content = self.read_note(path)?;
        content.push_str(text);
        self.replace(path, &content)
    }
}

/// Notes belonging to `list_id`: the path starts with `prefix` and contains
/// `[list_id]`.
pub fn find_list_notes(
    store: &dyn NoteStore,
    prefix: &str,
    list_id: &str,
) -> StoreResult<Vec<Note>> {
    let marker = format!("[{}]", list_id);
    let mut notes: Vec<Note> = store
        .list_notes()?
        .into_iter()
        .filter(|n| n.path.starts_with(prefix) && n.path.contains(&marker))
        .collect();
    notes.sort();
    Ok(notes)
}

/// Path for a freshly tracked list: `ClickUp Sprint 12 [9001].md`.
pub fn list_note_path(prefix: &str, name: Option<&str>, list_id: &str) -> String {
    let clean: String = name
        .unwrap_or_default()
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '[' | ']' | '#' | '^' | '|'))
        .collect();
    let clean = clean.split_whitespace().collect::<Vec<_>>().join(" ");
    if clean.is_empty() {
        format!("{} [{}].{}", prefix, list_id, NOTE_EXTENSION)
    } else {
        format!("{} {} [{}].{}", prefix, clean, list_id, NOTE_EXTENSION)
    }
}

fn validate_path(path: &str) -> StoreResult<()> {
    if path.trim().is_empty() {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    let escapes = Path::new(path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if escapes {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}

// --- Directory-backed vault ---

#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    /// Opens the vault at `root`, creating the directory when missing.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root).map_err(|e| StoreError::io(&root.to_string_lossy(), e))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> StoreResult<PathBuf> {
        validate_path(path)?;
        Ok(self.root.join(path))
    }

    fn lock_anchor(&self) -> PathBuf {
        self.root.join(VAULT_LOCK_NAME)
    }

    fn walk(&self, dir: &Path, prefix: &str, out: &mut Vec<Note>) -> StoreResult<()> {
        let entries = fs::read_dir(dir).map_err(|e| StoreError::io(prefix, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(prefix, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            // Skips `.obsidian`, `.git`, temp and lock files.
            if name.starts_with('.') {
                continue;
            }
            let rel = if prefix.is_empty() {
                name
            } else {
                format!("{}/{}", prefix, name)
            };
            let file_type = entry.file_type().map_err(|e| StoreError::io(&rel, e))?;
            if file_type.is_dir() {
                self.walk(&entry.path(), &rel, out)?;
            } else if file_type.is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some(NOTE_EXTENSION)
            {
                out.push(Note { path: rel });
            }
        }
        Ok(())
    }
}

impl NoteStore for FsVault {
    fn list_notes(&self) -> StoreResult<Vec<Note>> {
        let mut notes = Vec::new();
        self.walk(&self.root, "", &mut notes)?;
        notes.sort();
        Ok(notes)
    }

    fn read_note(&self, path: &str) -> StoreResult<String> {
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        fs::read_to_string(&full).map_err(|e| StoreError::io(path, e))
    }

    fn delete_note(&self, path: &str) -> StoreResult<()> {
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        LocalStorage::with_lock(&self.lock_anchor(), || Ok(fs::remove_file(&full)?))
            .map_err(|e| StoreError::io(path, e))
    }

    fn create_note(&self, path: &str, content: &str) -> StoreResult<Note> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(path, e))?;
        }
        let opened = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full);
        let mut file = match opened {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(path.to_string()));
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };
        file.write_all(content.as_bytes())
            .map_err(|e| StoreError::io(path, e))?;
        log::debug!("Created note {}", path);
        Ok(Note {
            path: path.to_string(),
        })
    }

    /// Temp file plus rename: the note is never absent.
    fn replace(&self, path: &str, content: &str) -> StoreResult<()> {
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        LocalStorage::with_lock(&self.lock_anchor(), || {
            LocalStorage::atomic_write(&full, content)
        })
        .map_err(|e| StoreError::io(path, e))
    }

    fn append(&self, path: &str, text: &str) -> StoreResult<()> {
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        LocalStorage::with_lock(&self.lock_anchor(), || {
            let mut content = fs::read_to_string(&full)?;
            content.push_str(text);
            LocalStorage::atomic_write(&full, content)
        })
        .map_err(|e| StoreError::io(path, e))
    }
}

// --- In-memory store ---

/// Map-backed store using the trait's default `replace`.
#[derive(Debug, Default)]
pub struct MemoryVault {
    notes: Mutex<BTreeMap<String, String>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notes<I, P, C>(notes: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let map = notes
            .into_iter()
            .map(|(p, c)| (p.into(), c.into()))
            .collect();
        Self {
            notes: Mutex::new(map),
        }
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned map is still consistent: every write is a single insert/remove.
        self.notes.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl NoteStore for MemoryVault {
    fn list_notes(&self) -> StoreResult<Vec<Note>> {
        Ok(self
            .guard()
            .keys()
            .map(|p| Note { path: p.clone() })
            .collect())
    }

    fn read_note(&self, path: &str) -> StoreResult<String> {
        self.guard()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn delete_note(&self, path: &str) -> StoreResult<()> {
        self.guard()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn create_note(&self, path: &str, content: &str) -> StoreResult<Note> {
        validate_path(path)?;
        let mut notes = self.guard();
        if notes.contains_key(path) {
            return Err(StoreError::AlreadyExists(path.to_string()));
        }
        notes.insert(path.to_string(), content.to_string());
        Ok(Note {
            path: path.to_string(),
        })
    }
}
