use std::collections::BTreeMap;

use crate::view_model::{AppViewModel, LastSubmitStats, StatusLine};

/// Stable identity of an item across runs (origin-row index).
pub type ItemKey = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    /// Stop requested; the in-flight item still finishes.
    Stopping,
}

/// One unit of work queued for the batch. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedItem {
    /// Absent for plain-list input; such items cannot be resumed over.
    pub key: Option<ItemKey>,
    pub url: String,
}

/// Completed item as persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedItemSnapshot {
    pub key: ItemKey,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    input: String,
    session: SessionState,
    queued: Vec<QueuedItem>,
    /// Items confirmed uploaded, keyed by identity. Survives across batches.
    completed: BTreeMap<ItemKey, String>,
    succeeded: usize,
    failed: usize,
    stopped_early: bool,
    status: Option<StatusLine>,
    last_submit: Option<LastSubmitStats>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            session: self.session,
            queued_count: self.queued.len(),
            completed_count: self.completed.len(),
            succeeded: self.succeeded,
            failed: self.failed,
            stopped_early: self.stopped_early,
            status: self.status.clone(),
            last_submit: self.last_submit.clone(),
            dirty: self.dirty,
        }
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Returns and clears the dirty flag; the render loop draws on `true`.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Snapshot of confirmed items for persistence.
    pub fn completed_items_snapshot(&self) -> Vec<CompletedItemSnapshot> {
        self.completed
            .iter()
            .map(|(key, url)| CompletedItemSnapshot {
                key: *key,
                url: url.clone(),
            })
            .collect()
    }

    pub(crate) fn set_input(&mut self, text: String) {
        self.input = text;
    }

    pub(crate) fn set_status(&mut self, text: String, is_error: bool) {
        self.status = Some(StatusLine { text, is_error });
        self.dirty = true;
    }

    pub(crate) fn set_last_submit_stats(&mut self, enqueued: usize, skipped: usize) {
        self.last_submit = Some(LastSubmitStats { enqueued, skipped });
        self.dirty = true;
    }

    /// True when the given item is already known completed, either by key or
    /// by normalized URL (covers re-pasted lists without stable keys).
    pub(crate) fn is_already_completed(&self, item: &QueuedItem) -> bool {
        if let Some(key) = item.key {
            if self.completed.contains_key(&key) {
                return true;
            }
        }
        let wanted = normalize_url_for_dedupe(&item.url);
        self.completed
            .values()
            .any(|url| normalize_url_for_dedupe(url) == wanted)
    }

    pub(crate) fn start_batch(&mut self, items: Vec<QueuedItem>) {
        self.session = SessionState::Running;
        self.queued = items;
        self.succeeded = 0;
        self.failed = 0;
        self.stopped_early = false;
        self.dirty = true;
    }

    pub(crate) fn request_stop(&mut self) {
        self.session = SessionState::Stopping;
        self.dirty = true;
    }

    pub(crate) fn record_item_success(&mut self, key: ItemKey) {
        if let Some(item) = self
            .queued
            .iter()
            .find(|item| item.key == Some(key))
        {
            self.completed.insert(key, item.url.clone());
            self.dirty = true;
        }
    }

    pub(crate) fn finish_batch(&mut self, succeeded: usize, failed: usize, stopped_early: bool) {
        self.session = SessionState::Idle;
        self.queued.clear();
        self.succeeded = succeeded;
        self.failed = failed;
        self.stopped_early = stopped_early;
        self.dirty = true;
    }

    pub(crate) fn restore_completed(&mut self, snapshot: Vec<CompletedItemSnapshot>) {
        for item in snapshot {
            self.completed.insert(item.key, item.url);
        }
        self.dirty = true;
    }
}

/// Canonical form of a URL for duplicate detection across runs: fragment
/// dropped, host lowercased, trailing slash trimmed. Unparseable input is
/// compared as trimmed text.
pub fn normalize_url_for_dedupe(raw: &str) -> String {
    let trimmed = raw.trim();
    match url::Url::parse(trimmed) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            let text = parsed.to_string();
            text.trim_end_matches('/').to_string()
        }
        Err(_) => trimmed.trim_end_matches('/').to_string(),
    }
}
