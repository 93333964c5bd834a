use std::fmt;

use tubeq_logging::tubeq_debug;

/// Identifier of a job: a client-generated UUID or a server-issued task id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh client-side identity for an optimistically inserted job.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which field correlates backend events with queue records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityScheme {
    /// Events carry the submitted URL; ids are generated client-side.
    #[default]
    ByUrl,
    /// Events are fetched per server-issued task id.
    ByTaskId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Queued,
    Downloading,
    Converting,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Downloading => 1,
            JobStatus::Converting => 2,
            JobStatus::Completed | JobStatus::Failed => 3,
        }
    }

    /// Status only moves forward; terminal states accept nothing but themselves.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next.rank() > self.rank()
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Queued => "Queued",
            JobStatus::Downloading => "Downloading",
            JobStatus::Converting => "Converting",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
        }
    }
}

/// Transfer figures reported while a job is downloading.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DownloadProgress {
    pub percent: f64,
    pub speed: Option<String>,
    pub eta: Option<String>,
}

/// Partial update of a [`JobRecord`]; unset fields are left alone.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub title: Option<String>,
    pub progress: Option<DownloadProgress>,
    pub filename: Option<String>,
    pub message: Option<String>,
}

impl JobPatch {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn downloading(progress: DownloadProgress) -> Self {
        Self {
            status: Some(JobStatus::Downloading),
            progress: Some(progress),
            ..Self::default()
        }
    }

    pub fn completed(filename: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            filename: Some(filename.into()),
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            message: Some(message.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    id: JobId,
    url: String,
    title: Option<String>,
    status: JobStatus,
    progress: Option<DownloadProgress>,
    filename: Option<String>,
    message: Option<String>,
}

impl JobRecord {
    pub fn new(id: JobId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            title: None,
            status: JobStatus::Queued,
            progress: None,
            filename: None,
            message: None,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress(&self) -> Option<&DownloadProgress> {
        self.progress.as_ref()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Resolved title, or the raw URL while the title is unknown.
    pub fn title_or_url(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }

    /// Applies a patch and reports whether anything changed.
    ///
    /// Phase fields follow the resulting status: progress survives only while
    /// downloading, the filename only when completed, the message only when
    /// failed. A status change the current state does not allow drops the
    /// whole phase part of the patch.
    pub fn apply(&mut self, patch: JobPatch) -> bool {
        let mut changed = false;

        if let Some(title) = patch.title {
            if self.title.as_deref() != Some(title.as_str()) {
                self.title = Some(title);
                changed = true;
            }
        }

        let Some(next) = patch.status else {
            return changed;
        };
        if !self.status.can_transition_to(next) {
            tubeq_debug!(
                "job {} ignoring transition {:?} -> {:?}",
                self.id,
                self.status,
                next
            );
            return changed;
        }
        if self.status != next {
            self.status = next;
            changed = true;
        }

        let progress = match next {
            JobStatus::Downloading => patch.progress.or_else(|| self.progress.clone()),
            _ => None,
        };
        if progress != self.progress {
            self.progress = progress;
            changed = true;
        }

        let filename = match next {
            JobStatus::Completed => patch.filename.or_else(|| self.filename.clone()),
            _ => None,
        };
        if filename != self.filename {
            self.filename = filename;
            changed = true;
        }

        let message = match next {
            JobStatus::Failed => patch.message.or_else(|| self.message.clone()),
            _ => None,
        };
        if message != self.message {
            self.message = message;
            changed = true;
        }

        changed
    }
}
