use futures_util::future::join_all;
use serde_json::Value;
use tubeq_logging::{tubeq_debug, tubeq_warn};

use crate::client::{build_client, ensure_success, map_reqwest_error, BackendSettings};
use crate::{EngineError, Phase, ProgressUpdate};

/// Fetches the latest progress for a set of job keys.
#[async_trait::async_trait]
pub trait ProgressSource: Send + Sync {
    async fn fetch(&self, keys: &[String]) -> Result<Vec<ProgressUpdate>, EngineError>;
}

/// One request per task id; keys are task ids.
#[derive(Debug, Clone)]
pub struct TaskProgressSource {
    settings: BackendSettings,
    client: reqwest::Client,
}

impl TaskProgressSource {
    pub fn new(settings: BackendSettings) -> Result<Self, EngineError> {
        let client = build_client(&settings)?;
        Ok(Self { settings, client })
    }

    async fn fetch_one(&self, task_id: &str) -> Result<Value, EngineError> {
        let url = self.settings.task_progress_url(task_id)?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        response
            .json()
            .await
            .map_err(|err| EngineError::Decode(err.to_string()))
    }
}

#[async_trait::async_trait]
impl ProgressSource for TaskProgressSource {
    async fn fetch(&self, keys: &[String]) -> Result<Vec<ProgressUpdate>, EngineError> {
        let results = join_all(keys.iter().map(|key| self.fetch_one(key))).await;

        let mut updates = Vec::new();
        let mut failures = 0;
        let mut last_error = None;
        for (key, result) in keys.iter().zip(results) {
            match result {
                Ok(body) => updates.extend(parse_task_status(key, &body)),
                Err(err) => {
                    tubeq_warn!("Progress lookup for task {} failed: {}", key, err);
                    failures += 1;
                    last_error = Some(err);
                }
            }
        }

        // One unreachable task is skipped; every lookup failing is a poll failure.
        match last_error {
            Some(err) if failures == keys.len() => Err(err),
            _ => Ok(updates),
        }
    }
}

/// Normalises one `{"status": ..., "progress": ..., "filename": ...}` record.
pub(crate) fn parse_task_status(task_id: &str, body: &Value) -> Option<ProgressUpdate> {
    let status = body.get("status").and_then(Value::as_str)?.trim();
    let key = task_id.to_string();
    let lowered = status.to_ascii_lowercase();

    if lowered.starts_with("error") {
        let message = status
            .split_once(':')
            .map(|(_, rest)| rest.trim())
            .filter(|rest| !rest.is_empty())
            .unwrap_or(status);
        return Some(ProgressUpdate::Failed {
            key,
            message: message.to_string(),
        });
    }

    match lowered.as_str() {
        "queued" | "starting" => Some(ProgressUpdate::Phase {
            key,
            phase: Phase::Queued,
        }),
        "downloading" => Some(ProgressUpdate::Progress {
            key,
            percent: body.get("progress").map(parse_percent).unwrap_or(0.0),
            speed: None,
            eta: None,
        }),
        "processing" | "converting" => Some(ProgressUpdate::Phase {
            key,
            phase: Phase::Converting,
        }),
        "finished" => {
            let filename = body.get("filename").and_then(Value::as_str)?;
            Some(ProgressUpdate::Done {
                key,
                filename: filename.to_string(),
            })
        }
        _ => {
            tubeq_debug!("Ignoring status {:?} for task {}", status, task_id);
            None
        }
    }
}

/// Shared stream drained on every request; keys are urls.
#[derive(Debug, Clone)]
pub struct EventStreamProgressSource {
    settings: BackendSettings,
    client: reqwest::Client,
}

impl EventStreamProgressSource {
    pub fn new(settings: BackendSettings) -> Result<Self, EngineError> {
        let client = build_client(&settings)?;
        Ok(Self { settings, client })
    }
}

#[async_trait::async_trait]
impl ProgressSource for EventStreamProgressSource {
    async fn fetch(&self, _keys: &[String]) -> Result<Vec<ProgressUpdate>, EngineError> {
        let url = self.settings.endpoint(&self.settings.progress_path)?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|err| EngineError::Decode(err.to_string()))?;
        parse_event_batch(&body)
    }
}

/// Parses the drained message array. Unknown or malformed items are skipped
/// so one bad message does not lose the rest of the batch.
pub(crate) fn parse_event_batch(body: &Value) -> Result<Vec<ProgressUpdate>, EngineError> {
    let items = body
        .as_array()
        .ok_or_else(|| EngineError::Decode("expected a JSON array of events".to_string()))?;
    Ok(items.iter().filter_map(parse_event).collect())
}

fn parse_event(item: &Value) -> Option<ProgressUpdate> {
    let kind = item.get("type").and_then(Value::as_str)?;
    if kind == "all_done" {
        return Some(ProgressUpdate::AllDone);
    }
    let key = item.get("url").and_then(Value::as_str)?.to_string();
    let text = |field: &str| {
        item.get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };

    match kind {
        "status" => {
            let label = text("status")?.to_ascii_lowercase();
            let phase = match label.as_str() {
                "queued" => Phase::Queued,
                "downloading" => Phase::Downloading,
                "converting" => Phase::Converting,
                "failed" => {
                    return Some(ProgressUpdate::Failed {
                        key,
                        message: text("message").unwrap_or_else(|| "Download failed".to_string()),
                    })
                }
                // Completion needs a filename, which only the `done` event carries.
                "completed" => {
                    tubeq_debug!("Status completed for {} before its done event, skipped", key);
                    return None;
                }
                other => {
                    tubeq_debug!("Skipping unknown status {:?} for {}", other, key);
                    return None;
                }
            };
            Some(ProgressUpdate::Phase { key, phase })
        }
        "progress" => Some(ProgressUpdate::Progress {
            key,
            percent: item.get("percent").map(parse_percent).unwrap_or(0.0),
            speed: text("speed"),
            eta: text("eta"),
        }),
        "done" => Some(ProgressUpdate::Done {
            key,
            filename: text("filename")?,
        }),
        "error" => Some(ProgressUpdate::Failed {
            key,
            message: text("message").unwrap_or_else(|| "Download failed".to_string()),
        }),
        other => {
            tubeq_debug!("Skipping unknown event type {:?}", other);
            None
        }
    }
}

/// Accepts `42`, `42.5`, `"42%"` or `" 13.8%"`; anything else reads as 0.
pub(crate) fn parse_percent(value: &Value) -> f64 {
    let percent = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
            cleaned.parse().unwrap_or(0.0)
        }
        _ => 0.0,
    };
    percent.clamp(0.0, 100.0)
}
