use thiserror::Error;

/// Which backend protocol the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendVariant {
    /// Fire-and-forget submission, one shared event stream keyed by URL.
    #[default]
    EventStream,
    /// Submission returns task ids, progress is fetched per task.
    TaskPoll,
}

impl BackendVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendVariant::EventStream => "event-stream",
            BackendVariant::TaskPoll => "task-poll",
        }
    }
}

/// Backend job phase before it finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Queued,
    Downloading,
    Converting,
}

/// Normalised progress report, independent of the backend variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    Phase {
        key: String,
        phase: Phase,
    },
    Progress {
        key: String,
        percent: f64,
        speed: Option<String>,
        eta: Option<String>,
    },
    Done {
        key: String,
        filename: String,
    },
    Failed {
        key: String,
        message: String,
    },
    AllDone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReceipt {
    pub task_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReceipt {
    /// Task ids issued for the submitted links, in submission order.
    Tasks(Vec<TaskReceipt>),
    /// Accepted without identifiers; progress is reported by URL.
    Acknowledged,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    SubmitCompleted {
        batch_id: u64,
        result: Result<SubmitReceipt, EngineError>,
    },
    TitleResolved {
        job_id: String,
        title: String,
    },
    PollTick {
        tick: u64,
    },
    ProgressFetched {
        result: Result<Vec<ProgressUpdate>, EngineError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("server returned {status}: {message}")]
    HttpStatus { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("engine runtime unavailable: {0}")]
    Runtime(String),
}
