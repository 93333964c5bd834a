use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use tubeq_logging::{tubeq_debug, tubeq_info, tubeq_warn};

use crate::client::BackendSettings;
use crate::poll::PollTimer;
use crate::progress::{EventStreamProgressSource, ProgressSource, TaskProgressSource};
use crate::submit::{HttpSubmitter, Submitter};
use crate::title::{OEmbedTitleResolver, TitleResolver};
use crate::{BackendVariant, EngineError, EngineEvent};

/// Receives engine results. Called from runtime worker threads.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// The IO services the engine drives. Swapped for fakes in tests.
#[derive(Clone)]
pub struct EngineServices {
    pub submitter: Arc<dyn Submitter>,
    pub progress: Arc<dyn ProgressSource>,
    pub titles: Arc<dyn TitleResolver>,
}

impl EngineServices {
    /// HTTP services for the configured backend variant.
    pub fn http(settings: &BackendSettings) -> Result<Self, EngineError> {
        let progress: Arc<dyn ProgressSource> = match settings.variant {
            BackendVariant::EventStream => {
                Arc::new(EventStreamProgressSource::new(settings.clone())?)
            }
            BackendVariant::TaskPoll => Arc::new(TaskProgressSource::new(settings.clone())?),
        };
        Ok(Self {
            submitter: Arc::new(HttpSubmitter::new(settings.clone())?),
            progress,
            titles: Arc::new(OEmbedTitleResolver::new(settings)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum EngineCommand {
    Submit { batch_id: u64, links: Vec<String> },
    ResolveTitle { job_id: String, url: String },
    StartPolling,
    StopPolling,
    FetchProgress { keys: Vec<String> },
    Shutdown,
}

/// Cheap to clone; the engine thread exits when every handle is dropped or
/// `shutdown` is called.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(settings: &BackendSettings, sink: Arc<dyn EventSink>) -> Result<Self, EngineError> {
        let services = EngineServices::http(settings)?;
        Self::with_services(settings.poll_interval, services, sink)
    }

    pub fn with_services(
        poll_interval: Duration,
        services: EngineServices,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|err| EngineError::Runtime(err.to_string()))?;
        let (cmd_tx, cmd_rx) = mpsc::channel();

        thread::Builder::new()
            .name("tubeq-engine".to_string())
            .spawn(move || {
                let mut timer = PollTimer::new(poll_interval);
                while let Ok(command) = cmd_rx.recv() {
                    if command == EngineCommand::Shutdown {
                        break;
                    }
                    handle_command(&runtime, &mut timer, &services, &sink, command);
                }
                timer.stop();
                runtime.shutdown_background();
                tubeq_info!("Engine thread stopped");
            })
            .map_err(|err| EngineError::Runtime(err.to_string()))?;

        Ok(Self { cmd_tx })
    }

    pub fn submit(&self, batch_id: u64, links: Vec<String>) {
        self.send(EngineCommand::Submit { batch_id, links });
    }

    pub fn resolve_title(&self, job_id: impl Into<String>, url: impl Into<String>) {
        self.send(EngineCommand::ResolveTitle {
            job_id: job_id.into(),
            url: url.into(),
        });
    }

    pub fn start_polling(&self) {
        self.send(EngineCommand::StartPolling);
    }

    pub fn stop_polling(&self) {
        self.send(EngineCommand::StopPolling);
    }

    pub fn fetch_progress(&self, keys: Vec<String>) {
        self.send(EngineCommand::FetchProgress { keys });
    }

    pub fn shutdown(&self) {
        self.send(EngineCommand::Shutdown);
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            tubeq_warn!("Engine thread is gone; command dropped");
        }
    }
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    timer: &mut PollTimer,
    services: &EngineServices,
    sink: &Arc<dyn EventSink>,
    command: EngineCommand,
) {
    match command {
        EngineCommand::Submit { batch_id, links } => {
            let submitter = services.submitter.clone();
            let sink = sink.clone();
            runtime.spawn(async move {
                let result = submitter.submit(&links).await;
                if let Err(err) = &result {
                    tubeq_warn!("Batch {} submission failed: {}", batch_id, err);
                }
                sink.emit(EngineEvent::SubmitCompleted { batch_id, result });
            });
        }
        EngineCommand::ResolveTitle { job_id, url } => {
            let titles = services.titles.clone();
            let sink = sink.clone();
            runtime.spawn(async move {
                match titles.resolve(&url).await {
                    Ok(title) => sink.emit(EngineEvent::TitleResolved { job_id, title }),
                    Err(err) => tubeq_debug!("No title for {}: {}", url, err),
                }
            });
        }
        EngineCommand::StartPolling => {
            let sink = sink.clone();
            if timer.start(runtime.handle(), move |tick| {
                sink.emit(EngineEvent::PollTick { tick })
            }) {
                tubeq_info!("Poll loop started");
            } else {
                tubeq_debug!("Poll loop already running");
            }
        }
        EngineCommand::StopPolling => {
            if timer.stop() {
                tubeq_info!("Poll loop stopped");
            }
        }
        EngineCommand::FetchProgress { keys } => {
            let progress = services.progress.clone();
            let sink = sink.clone();
            runtime.spawn(async move {
                let result = progress.fetch(&keys).await;
                sink.emit(EngineEvent::ProgressFetched { result });
            });
        }
        EngineCommand::Shutdown => {}
    }
}
