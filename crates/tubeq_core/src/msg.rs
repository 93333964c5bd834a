use crate::history::HistoryEntry;
use crate::job::JobId;
use crate::queue::ProgressEvent;
use crate::state::Theme;

/// A task id issued by the backend for one submitted link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTask {
    pub task_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User edited the link input.
    InputChanged(String),
    /// User submitted the current link input.
    LinksSubmitted,
    /// Backend accepted a batch. `tasks` is empty when the backend only
    /// acknowledges and reports progress by URL.
    SubmissionAccepted {
        batch_id: u64,
        tasks: Vec<SubmittedTask>,
    },
    /// Network or HTTP failure while creating jobs.
    SubmissionFailed { batch_id: u64, message: String },
    /// Metadata lookup found a title for a job.
    TitleResolved { job_id: JobId, title: String },
    /// Poll timer fired.
    PollTick { tick: u64 },
    /// Progress fetch answered; events are in backend order.
    ProgressReceived {
        events: Vec<ProgressEvent>,
        received_at_ms: i64,
    },
    /// Progress fetch failed; retried on a later tick.
    PollFailed { reason: String },
    /// User asked to retry a failed job.
    RetryClicked { job_id: JobId },
    /// User cleared the queue.
    ClearQueueClicked,
    /// User cleared the download history.
    ClearHistoryClicked,
    ThemeToggled,
    DismissBanner,
    /// Restore the persisted history log.
    RestoreHistory(Vec<HistoryEntry>),
    /// Restore the persisted theme preference.
    RestoreTheme(Theme),
    /// Fallback for placeholder wiring.
    NoOp,
}
