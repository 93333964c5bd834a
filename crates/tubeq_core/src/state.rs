use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::history::HistoryLog;
use crate::job::IdentityScheme;
use crate::queue::QueueStore;
use crate::sanitize::normalize_url_for_dedupe;
use crate::view_model::{AppViewModel, HistoryRowView, JobRowView, SubmitStats};

/// Lifecycle of the progress poll loop. At most one loop runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollerState {
    #[default]
    Idle,
    Polling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Parses a stored preference; anything unrecognised is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    input: String,
    queue: QueueStore,
    history: HistoryLog,
    poller: PollerState,
    /// A progress fetch has been issued and not answered. Outlives the loop
    /// that issued it, so a restarted loop waits for it.
    fetch_in_flight: bool,
    /// Links submitted under the task-id scheme whose task ids are not known yet.
    pending: BTreeMap<u64, Vec<String>>,
    next_batch_id: u64,
    validation_error: Option<ValidationError>,
    banner: Option<String>,
    theme: Theme,
    last_submit_stats: Option<SubmitStats>,
    dirty: bool,
}

impl AppState {
    pub fn new(scheme: IdentityScheme) -> Self {
        Self {
            queue: QueueStore::new(scheme),
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            input: self.input.clone(),
            rows: self.queue.all().iter().map(JobRowView::from_record).collect(),
            show_empty_placeholder: self.queue.is_empty(),
            history: self
                .history
                .list()
                .iter()
                .map(HistoryRowView::from_entry)
                .collect(),
            validation_error: self.validation_error.map(|err| err.to_string()),
            banner: self.banner.clone(),
            theme: self.theme,
            polling: self.is_polling(),
            last_submit_stats: self.last_submit_stats.clone(),
            dirty: self.dirty,
        }
    }

    pub fn queue(&self) -> &QueueStore {
        &self.queue
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn poller(&self) -> PollerState {
        self.poller
    }

    pub fn is_polling(&self) -> bool {
        self.poller == PollerState::Polling
    }

    pub fn is_fetch_in_flight(&self) -> bool {
        self.fetch_in_flight
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Returns whether a redraw is due and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn queue_mut(&mut self) -> &mut QueueStore {
        &mut self.queue
    }

    pub(crate) fn history_mut(&mut self) -> &mut HistoryLog {
        &mut self.history
    }

    pub(crate) fn set_poller(&mut self, poller: PollerState) {
        if self.poller != poller {
            self.poller = poller;
            self.dirty = true;
        }
    }

    pub(crate) fn begin_fetch(&mut self) {
        self.fetch_in_flight = true;
    }

    /// Marks the outstanding progress fetch, if any, as finished.
    pub(crate) fn finish_fetch(&mut self) {
        self.fetch_in_flight = false;
    }

    pub(crate) fn set_input(&mut self, text: String) {
        if self.input != text {
            self.input = text;
            self.dirty = true;
        }
    }

    pub(crate) fn clear_input(&mut self) {
        self.set_input(String::new());
    }

    pub(crate) fn set_validation_error(&mut self, error: Option<ValidationError>) {
        if self.validation_error != error {
            self.validation_error = error;
            self.dirty = true;
        }
    }

    pub(crate) fn set_banner(&mut self, banner: Option<String>) {
        if self.banner != banner {
            self.banner = banner;
            self.dirty = true;
        }
    }

    pub(crate) fn set_theme(&mut self, theme: Theme) {
        if self.theme != theme {
            self.theme = theme;
            self.dirty = true;
        }
    }

    pub(crate) fn set_last_submit_stats(&mut self, enqueued: usize, skipped: usize) {
        self.last_submit_stats = Some(SubmitStats { enqueued, skipped });
        self.dirty = true;
    }

    /// A URL is taken while it is in the queue or awaiting its task id.
    pub(crate) fn is_url_taken(&self, url: &str) -> bool {
        if self.queue.contains_url(url) {
            return true;
        }
        let wanted = normalize_url_for_dedupe(url);
        self.pending
            .values()
            .flatten()
            .any(|pending| normalize_url_for_dedupe(pending) == wanted)
    }

    pub(crate) fn allocate_batch_id(&mut self) -> u64 {
        self.next_batch_id += 1;
        self.next_batch_id
    }

    pub(crate) fn add_pending(&mut self, batch_id: u64, links: Vec<String>) {
        self.pending.insert(batch_id, links);
    }

    pub(crate) fn take_pending(&mut self, batch_id: u64) -> Option<Vec<String>> {
        self.pending.remove(&batch_id)
    }
}
