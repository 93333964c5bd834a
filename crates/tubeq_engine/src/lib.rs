//! tubeq engine: backend IO, the poll timer and origin-scoped storage.
mod client;
mod engine;
mod poll;
mod progress;
mod storage;
mod submit;
mod title;
mod types;

pub use client::{BackendSettings, SubmitShape};
pub use engine::{EngineHandle, EngineServices, EventSink};
pub use poll::PollTimer;
pub use progress::{EventStreamProgressSource, ProgressSource, TaskProgressSource};
pub use storage::{origin_scope, OriginStorage, PersistError};
pub use submit::{HttpSubmitter, Submitter};
pub use title::{OEmbedTitleResolver, TitleResolver};
pub use types::{
    BackendVariant, EngineError, EngineEvent, Phase, ProgressUpdate, SubmitReceipt, TaskReceipt,
};
