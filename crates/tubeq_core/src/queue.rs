use tubeq_logging::{tubeq_debug, tubeq_trace};

use crate::job::{DownloadProgress, IdentityScheme, JobId, JobPatch, JobRecord, JobStatus};
use crate::sanitize::normalize_url_for_dedupe;

/// One backend-reported change, correlated to a job by its queue key.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Status { key: String, status: JobStatus },
    Progress { key: String, progress: DownloadProgress },
    Done { key: String, filename: String },
    Error { key: String, message: String },
    /// The backend has nothing left to report for the current batch.
    AllDone,
}

/// A job that reached `Completed` while applying a batch of events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedJob {
    pub job_id: JobId,
    pub title: String,
    pub filename: String,
}

/// Summary of one [`QueueStore::apply_events`] call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reconciliation {
    pub changed: bool,
    pub completed: Vec<CompletedJob>,
    pub all_done: bool,
    /// Events whose key matched no record.
    pub unmatched: usize,
}

/// Ordered collection of the jobs in the active queue.
///
/// Records are keyed by URL or by task id depending on the identity scheme.
/// Updates never insert: a patch or event for an unknown key is dropped, so a
/// late event cannot bring back a removed job.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueueStore {
    scheme: IdentityScheme,
    records: Vec<JobRecord>,
}

impl QueueStore {
    pub fn new(scheme: IdentityScheme) -> Self {
        Self {
            scheme,
            records: Vec::new(),
        }
    }

    pub fn scheme(&self) -> IdentityScheme {
        self.scheme
    }

    pub fn key_of<'a>(&self, record: &'a JobRecord) -> &'a str {
        match self.scheme {
            IdentityScheme::ByUrl => record.url(),
            IdentityScheme::ByTaskId => record.id().as_str(),
        }
    }

    /// Appends a record at the end of the queue. Refused when its id or its
    /// URL is already present.
    pub fn append(&mut self, record: JobRecord) -> bool {
        if self.find_by_id(record.id()).is_some() || self.contains_url(record.url()) {
            tubeq_debug!("queue refused duplicate job {} ({})", record.id(), record.url());
            return false;
        }
        self.records.push(record);
        true
    }

    /// Patches the record with the given key and reports whether it changed.
    /// Never inserts: an unknown key changes nothing.
    pub fn upsert_by_key(&mut self, key: &str, patch: JobPatch) -> bool {
        match self.find_by_key_mut(key) {
            Some(record) => record.apply(patch),
            None => false,
        }
    }

    pub fn patch_by_id(&mut self, id: &JobId, patch: JobPatch) -> bool {
        match self.records.iter_mut().find(|r| r.id() == id) {
            Some(record) => record.apply(patch),
            None => false,
        }
    }

    pub fn remove(&mut self, id: &JobId) -> Option<JobRecord> {
        let index = self.records.iter().position(|r| r.id() == id)?;
        Some(self.records.remove(index))
    }

    pub fn find_by_key(&self, key: &str) -> Option<&JobRecord> {
        self.records.iter().find(|r| self.key_of(r) == key)
    }

    fn find_by_key_mut(&mut self, key: &str) -> Option<&mut JobRecord> {
        let scheme = self.scheme;
        self.records.iter_mut().find(|r| match scheme {
            IdentityScheme::ByUrl => r.url() == key,
            IdentityScheme::ByTaskId => r.id().as_str() == key,
        })
    }

    pub fn find_by_id(&self, id: &JobId) -> Option<&JobRecord> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn contains_url(&self, url: &str) -> bool {
        let wanted = normalize_url_for_dedupe(url);
        self.records
            .iter()
            .any(|r| normalize_url_for_dedupe(r.url()) == wanted)
    }

    pub fn all(&self) -> &[JobRecord] {
        &self.records
    }

    /// Keys of non-terminal records, in queue order.
    pub fn active_keys(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.is_active())
            .map(|r| self.key_of(r).to_owned())
            .collect()
    }

    pub fn has_active(&self) -> bool {
        self.records.iter().any(JobRecord::is_active)
    }

    /// Removes every record; returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.records.len();
        self.records.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Applies a batch of events in order; a later event for the same key
    /// overrides an earlier one.
    pub fn apply_events(&mut self, events: Vec<ProgressEvent>) -> Reconciliation {
        let mut outcome = Reconciliation::default();

        for event in events {
            let (key, patch) = match event {
                ProgressEvent::AllDone => {
                    outcome.all_done = true;
                    continue;
                }
                ProgressEvent::Status { key, status } => (key, JobPatch::status(status)),
                ProgressEvent::Progress { key, progress } => (key, JobPatch::downloading(progress)),
                ProgressEvent::Done { key, filename } => (key, JobPatch::completed(filename)),
                ProgressEvent::Error { key, message } => (key, JobPatch::failed(message)),
            };

            let Some(before) = self.find_by_key(&key).map(JobRecord::status) else {
                tubeq_trace!("dropping event for unknown job key {}", key);
                outcome.unmatched += 1;
                continue;
            };

            outcome.changed |= self.upsert_by_key(&key, patch);

            if before == JobStatus::Completed {
                continue;
            }
            let finished = self
                .find_by_key(&key)
                .filter(|record| record.status() == JobStatus::Completed)
                .and_then(|record| {
                    record.filename().map(|filename| CompletedJob {
                        job_id: record.id().clone(),
                        title: record.title_or_url().to_owned(),
                        filename: filename.to_owned(),
                    })
                });
            outcome.completed.extend(finished);
        }

        outcome
    }
}
