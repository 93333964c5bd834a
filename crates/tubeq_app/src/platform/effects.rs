use std::sync::{mpsc, Arc};

use chrono::Utc;
use tubeq_core::{DownloadProgress, Effect, JobId, JobStatus, Msg, ProgressEvent, SubmittedTask};
use tubeq_engine::{
    BackendSettings, EngineError, EngineEvent, EngineHandle, EventSink, OriginStorage, Phase,
    ProgressUpdate, SubmitReceipt,
};
use tubeq_logging::{tubeq_debug, tubeq_info, tubeq_warn};

use super::app::AppEvent;
use super::persistence;

pub struct EffectRunner {
    engine: EngineHandle,
    storage: OriginStorage,
}

impl EffectRunner {
    pub fn new(
        settings: &BackendSettings,
        storage: OriginStorage,
        events: mpsc::Sender<AppEvent>,
    ) -> anyhow::Result<Self> {
        let sink = Arc::new(MsgSink { events });
        let engine = EngineHandle::new(settings, sink)?;
        Ok(Self { engine, storage })
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Submit { batch_id, links } => {
                    tubeq_info!("Submit batch_id={} links={}", batch_id, links.len());
                    self.engine.submit(batch_id, links);
                }
                Effect::ResolveTitle { job_id, url } => {
                    self.engine.resolve_title(job_id.as_str(), url);
                }
                Effect::StartPolling => self.engine.start_polling(),
                Effect::StopPolling => self.engine.stop_polling(),
                Effect::FetchProgress { keys } => self.engine.fetch_progress(keys),
                Effect::PersistHistory(entries) => {
                    persistence::save_history(&self.storage, &entries);
                }
                Effect::PersistTheme(theme) => persistence::save_theme(&self.storage, theme),
            }
        }
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

struct MsgSink {
    events: mpsc::Sender<AppEvent>,
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        let msg = map_event(event, Utc::now().timestamp_millis());
        let _ = self.events.send(AppEvent::Msg(msg));
    }
}

pub(crate) fn map_event(event: EngineEvent, now_ms: i64) -> Msg {
    match event {
        EngineEvent::SubmitCompleted { batch_id, result } => match result {
            Ok(SubmitReceipt::Acknowledged) => Msg::SubmissionAccepted {
                batch_id,
                tasks: Vec::new(),
            },
            Ok(SubmitReceipt::Tasks(receipts)) => Msg::SubmissionAccepted {
                batch_id,
                tasks: receipts
                    .into_iter()
                    .map(|receipt| SubmittedTask {
                        task_id: receipt.task_id,
                        url: receipt.url,
                    })
                    .collect(),
            },
            Err(err) => Msg::SubmissionFailed {
                batch_id,
                message: submission_message(&err),
            },
        },
        EngineEvent::TitleResolved { job_id, title } => Msg::TitleResolved {
            job_id: JobId::new(job_id),
            title,
        },
        EngineEvent::PollTick { tick } => {
            tubeq_debug!("Poll tick {}", tick);
            Msg::PollTick { tick }
        }
        EngineEvent::ProgressFetched { result } => match result {
            Ok(updates) => Msg::ProgressReceived {
                events: updates.into_iter().map(map_update).collect(),
                received_at_ms: now_ms,
            },
            Err(err) => {
                tubeq_warn!("Progress poll failed: {}", err);
                Msg::PollFailed {
                    reason: err.to_string(),
                }
            }
        },
    }
}

fn map_update(update: ProgressUpdate) -> ProgressEvent {
    match update {
        ProgressUpdate::Phase { key, phase } => ProgressEvent::Status {
            key,
            status: match phase {
                Phase::Queued => JobStatus::Queued,
                Phase::Downloading => JobStatus::Downloading,
                Phase::Converting => JobStatus::Converting,
            },
        },
        ProgressUpdate::Progress {
            key,
            percent,
            speed,
            eta,
        } => ProgressEvent::Progress {
            key,
            progress: DownloadProgress {
                percent,
                speed,
                eta,
            },
        },
        ProgressUpdate::Done { key, filename } => ProgressEvent::Done { key, filename },
        ProgressUpdate::Failed { key, message } => ProgressEvent::Error { key, message },
        ProgressUpdate::AllDone => ProgressEvent::AllDone,
    }
}

fn submission_message(err: &EngineError) -> String {
    match err {
        EngineError::HttpStatus { message, .. } => format!("Server error: {message}"),
        _ => "Server error: failed to start download process.".to_string(),
    }
}
