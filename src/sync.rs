// File: ./src/sync.rs
//! Regenerates a list note from the current remote tasks.
//!
//! fetch -> map -> render -> replace. The note is only written once the
//! fetch and render have succeeded, and the write is a single replace.
use crate::client::{ApiError, TaskSource};
use crate::model::{RowOptions, Task, map_rows, render_table};
use crate::vault::{NoteStore, StoreError, find_list_notes};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("fetching tasks failed: {0}")]
    Remote(#[from] ApiError),

    #[error("updating the note failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No note is tracking the list; nothing was fetched or written.
    NoteNotFound,
    Updated { path: String, rows: usize },
}

/// Table body for a set of tasks.
pub fn render_list(tasks: &[Task], opts: RowOptions) -> String {
    render_table(&map_rows(tasks, opts))
}

pub struct Syncer {
    source: Arc<dyn TaskSource>,
    store: Arc<dyn NoteStore>,
    prefix: String,
    opts: RowOptions,
    // One async mutex per list id, so two syncs of a list never interleave.
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Syncer {
    pub fn new(
        source: Arc<dyn TaskSource>,
        store: Arc<dyn NoteStore>,
        prefix: impl Into<String>,
        opts: RowOptions,
    ) -> Self {
        Self {
            source,
            store,
            prefix: prefix.into(),
            opts,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    fn list_lock(&self, list_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
        map.entry(list_id.to_string()).or_default().clone()
    }

    /// Rewrites the note tracking `list_id` with the list's current tasks.
    ///
    /// A missing note is not an error. A failed fetch leaves the note as it
    /// was.
    pub async fn sync_list(&self, list_id: &str) -> Result<SyncOutcome, SyncError> {
        let lock = self.list_lock(list_id);
        let guard = lock.lock().await;
        let result = self.sync_locked(list_id).await;
        drop(guard);
        self.release_lock(list_id, lock);
        result
    }

    // Drops the map entry once no other sync of the list holds or awaits it.
    fn release_lock(&self, list_id: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut map = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
        // One reference in the map, one held here.
        if Arc::strong_count(&lock) == 2 {
            map.remove(list_id);
        }
    }

    async fn sync_locked(&self, list_id: &str) -> Result<SyncOutcome, SyncError> {
        let notes = find_list_notes(self.store.as_ref(), &self.prefix, list_id)?;
        let Some(note) = notes.first() else {
            log::warn!(
                "No note matching '{}*[{}]*' found, nothing to sync",
                self.prefix,
                list_id
            );
            return Ok(SyncOutcome::NoteNotFound);
        };
        if notes.len() > 1 {
            let others: Vec<&str> = notes.iter().skip(1).map(|n| n.path.as_str()).collect();
            log::warn!(
                "Several notes track list {}; updating '{}' and ignoring {:?}",
                list_id,
                note.path,
                others
            );
        }

        let tasks = self.source.get_tasks(list_id).await.inspect_err(|e| {
            log::error!("Sync of list {} aborted: {}", list_id, e);
        })?;

        let table = render_list(&tasks, self.opts);
        self.store.replace(&note.path, &table)?;

        log::info!(
            "Synced {} task(s) from list {} into '{}'",
            tasks.len(),
            list_id,
            note.path
        );
        Ok(SyncOutcome::Updated {
            path: note.path.clone(),
            rows: tasks.len(),
        })
    }
}
