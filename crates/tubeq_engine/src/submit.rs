use std::collections::BTreeMap;

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use tubeq_logging::{tubeq_debug, tubeq_info};

use crate::client::{build_client, ensure_success, map_reqwest_error, BackendSettings, SubmitShape};
use crate::{EngineError, SubmitReceipt, TaskReceipt};

#[async_trait::async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, links: &[String]) -> Result<SubmitReceipt, EngineError>;
}

#[derive(Debug, Clone)]
pub struct HttpSubmitter {
    settings: BackendSettings,
    client: reqwest::Client,
}

impl HttpSubmitter {
    pub fn new(settings: BackendSettings) -> Result<Self, EngineError> {
        let client = build_client(&settings)?;
        Ok(Self { settings, client })
    }
}

#[derive(Debug, Deserialize)]
struct TaskMapResponse {
    #[serde(default)]
    tasks: BTreeMap<String, TaskEntry>,
}

#[derive(Debug, Deserialize)]
struct TaskEntry {
    url: String,
}

#[async_trait::async_trait]
impl Submitter for HttpSubmitter {
    async fn submit(&self, links: &[String]) -> Result<SubmitReceipt, EngineError> {
        let url = self.settings.endpoint(&self.settings.submit_path)?;
        tubeq_info!("Submitting {} link(s) to {}", links.len(), url);

        let request = match self.settings.submit_shape {
            SubmitShape::JsonTasks => self.client.post(url).json(&json!({ "links": links })),
            SubmitShape::FormAck => {
                let body = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("links", &links.join("\n"))
                    .finish();
                self.client
                    .post(url)
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(body)
            }
        };

        let response = request.send().await.map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;

        match self.settings.submit_shape {
            SubmitShape::FormAck => Ok(SubmitReceipt::Acknowledged),
            SubmitShape::JsonTasks => {
                let body: TaskMapResponse = response
                    .json()
                    .await
                    .map_err(|err| EngineError::Decode(err.to_string()))?;
                let receipts = order_by_links(body.tasks, links);
                tubeq_debug!("Backend issued {} task id(s)", receipts.len());
                Ok(SubmitReceipt::Tasks(receipts))
            }
        }
    }
}

/// JSON objects carry no order; receipts follow the submitted links, then
/// any task whose url was not among them.
fn order_by_links(tasks: BTreeMap<String, TaskEntry>, links: &[String]) -> Vec<TaskReceipt> {
    let mut receipts: Vec<TaskReceipt> = tasks
        .into_iter()
        .map(|(task_id, entry)| TaskReceipt {
            task_id,
            url: entry.url,
        })
        .collect();
    receipts.sort_by_key(|receipt| {
        links
            .iter()
            .position(|link| *link == receipt.url)
            .unwrap_or(links.len())
    });
    receipts
}
