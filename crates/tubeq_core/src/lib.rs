//! tubeq core: pure queue state machine, reconciliation and view-model helpers.
mod effect;
mod error;
mod history;
mod job;
mod msg;
mod queue;
mod sanitize;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use error::ValidationError;
pub use history::{HistoryEntry, HistoryLog, HISTORY_CAPACITY};
pub use job::{DownloadProgress, IdentityScheme, JobId, JobPatch, JobRecord, JobStatus};
pub use msg::{Msg, SubmittedTask};
pub use queue::{CompletedJob, ProgressEvent, QueueStore, Reconciliation};
pub use sanitize::{
    extract_video_id, is_allowed_link, normalize_url_for_dedupe, sanitize_links, thumbnail_url,
    ALLOWED_HOSTS,
};
pub use state::{AppState, PollerState, Theme};
pub use update::update;
pub use view_model::{AppViewModel, HistoryRowView, JobRowView, SubmitStats, TITLE_PLACEHOLDER};
