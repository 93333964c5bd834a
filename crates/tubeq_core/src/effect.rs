use crate::history::HistoryEntry;
use crate::job::JobId;
use crate::state::Theme;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send one batch of links to the create-jobs endpoint.
    Submit { batch_id: u64, links: Vec<String> },
    /// Best-effort title lookup for a job.
    ResolveTitle { job_id: JobId, url: String },
    /// Start the periodic poll timer.
    StartPolling,
    /// Cancel the poll timer.
    StopPolling,
    /// Fetch progress once. `keys` are the active queue keys (task ids under
    /// the task-id scheme, URLs otherwise).
    FetchProgress { keys: Vec<String> },
    /// Write the history log to storage, newest first.
    PersistHistory(Vec<HistoryEntry>),
    PersistTheme(Theme),
}
