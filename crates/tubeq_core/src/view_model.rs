use crate::history::HistoryEntry;
use crate::job::{DownloadProgress, JobId, JobRecord, JobStatus};
use crate::sanitize::thumbnail_url;
use crate::state::Theme;

/// Shown in place of a title until the metadata lookup answers.
pub const TITLE_PLACEHOLDER: &str = "Loading title...";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitStats {
    pub enqueued: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub input: String,
    pub rows: Vec<JobRowView>,
    pub show_empty_placeholder: bool,
    pub history: Vec<HistoryRowView>,
    pub validation_error: Option<String>,
    pub banner: Option<String>,
    pub theme: Theme,
    pub polling: bool,
    pub last_submit_stats: Option<SubmitStats>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobRowView {
    pub job_id: JobId,
    pub url: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub status: JobStatus,
    /// Downloading or converting right now.
    pub is_current: bool,
    /// Only while downloading.
    pub progress: Option<DownloadProgress>,
    /// Filename to link for download, once completed.
    pub download: Option<String>,
    /// Failure cause, only for failed jobs.
    pub message: Option<String>,
    pub can_retry: bool,
}

impl JobRowView {
    pub(crate) fn from_record(record: &JobRecord) -> Self {
        let status = record.status();
        Self {
            job_id: record.id().clone(),
            url: record.url().to_owned(),
            title: record.title().unwrap_or(TITLE_PLACEHOLDER).to_owned(),
            thumbnail: thumbnail_url(record.url()),
            status,
            is_current: matches!(status, JobStatus::Downloading | JobStatus::Converting),
            progress: match status {
                JobStatus::Downloading => Some(record.progress().cloned().unwrap_or_default()),
                _ => None,
            },
            download: record.filename().map(ToOwned::to_owned),
            message: match status {
                JobStatus::Failed => record.message().map(ToOwned::to_owned),
                _ => None,
            },
            can_retry: status == JobStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRowView {
    pub title: String,
    pub filename: String,
    pub timestamp_ms: i64,
}

impl HistoryRowView {
    pub(crate) fn from_entry(entry: &HistoryEntry) -> Self {
        Self {
            title: entry.title.clone(),
            filename: entry.filename.clone(),
            timestamp_ms: entry.timestamp_ms,
        }
    }
}
