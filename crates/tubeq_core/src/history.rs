/// Maximum number of entries kept in the history log.
pub const HISTORY_CAPACITY: usize = 10;

/// A completed download remembered across restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub title: String,
    pub filename: String,
    /// Completion time, milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

/// Bounded, newest-first log of completed downloads, unique by filename.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends `entry` unless its filename is already logged.
    /// Returns whether the log changed.
    pub fn record(&mut self, entry: HistoryEntry) -> bool {
        if self.entries.iter().any(|e| e.filename == entry.filename) {
            return false;
        }
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAPACITY);
        true
    }

    pub fn clear(&mut self) -> bool {
        let had_entries = !self.entries.is_empty();
        self.entries.clear();
        had_entries
    }

    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces the log with persisted entries (given newest first),
    /// re-applying the uniqueness and capacity rules.
    pub fn restore(&mut self, entries: Vec<HistoryEntry>) {
        self.entries.clear();
        for entry in entries {
            if self.entries.len() == HISTORY_CAPACITY {
                break;
            }
            if !self.entries.iter().any(|e| e.filename == entry.filename) {
                self.entries.push(entry);
            }
        }
    }
}
