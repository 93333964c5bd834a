use tubeq_logging::{tubeq_debug, tubeq_info, tubeq_trace, tubeq_warn};

use crate::history::HistoryEntry;
use crate::job::{IdentityScheme, JobId, JobPatch, JobRecord, JobStatus};
use crate::sanitize::sanitize_links;
use crate::{AppState, Effect, Msg, PollerState, SubmittedTask, ValidationError};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::LinksSubmitted => {
            let links = sanitize_links(state.input());
            let effects = submit_links(&mut state, links, true);
            if !effects.is_empty() {
                state.clear_input();
            }
            effects
        }
        Msg::SubmissionAccepted { batch_id, tasks } => {
            accept_submission(&mut state, batch_id, tasks)
        }
        Msg::SubmissionFailed { batch_id, message } => {
            let dropped = state.take_pending(batch_id).map_or(0, |links| links.len());
            tubeq_warn!(
                "submission batch {} failed ({} pending links dropped): {}",
                batch_id,
                dropped,
                message
            );
            state.set_banner(Some(message));
            Vec::new()
        }
        Msg::TitleResolved { job_id, title } => {
            if state.queue_mut().patch_by_id(&job_id, JobPatch::title(title)) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::PollTick { tick } => poll_tick(&mut state, tick),
        Msg::ProgressReceived {
            events,
            received_at_ms,
        } => apply_progress(&mut state, events, received_at_ms),
        Msg::PollFailed { reason } => {
            tubeq_debug!("progress fetch failed, retrying next tick: {}", reason);
            state.finish_fetch();
            Vec::new()
        }
        Msg::RetryClicked { job_id } => retry(&mut state, &job_id),
        Msg::ClearQueueClicked => {
            let removed = state.queue_mut().clear();
            if removed > 0 {
                tubeq_info!("cleared {} jobs from the queue", removed);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ClearHistoryClicked => {
            if state.history_mut().clear() {
                state.mark_dirty();
                vec![Effect::PersistHistory(Vec::new())]
            } else {
                Vec::new()
            }
        }
        Msg::ThemeToggled => {
            let theme = state.theme().toggled();
            state.set_theme(theme);
            vec![Effect::PersistTheme(theme)]
        }
        Msg::DismissBanner => {
            state.set_banner(None);
            state.set_validation_error(None);
            Vec::new()
        }
        Msg::RestoreHistory(entries) => {
            state.history_mut().restore(entries);
            state.mark_dirty();
            Vec::new()
        }
        Msg::RestoreTheme(theme) => {
            state.set_theme(theme);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Enqueues the links that are not already taken and emits the submission.
///
/// With `report_errors` unset (retries) an empty or fully rejected batch
/// is dropped silently.
fn submit_links(state: &mut AppState, links: Vec<String>, report_errors: bool) -> Vec<Effect> {
    if links.is_empty() {
        if report_errors {
            state.set_validation_error(Some(ValidationError::NoValidLinks));
        }
        return Vec::new();
    }

    let (accepted, rejected): (Vec<String>, Vec<String>) =
        links.into_iter().partition(|url| !state.is_url_taken(url));
    state.set_last_submit_stats(accepted.len(), rejected.len());

    if accepted.is_empty() {
        if report_errors {
            state.set_validation_error(Some(ValidationError::AlreadyQueued));
        }
        return Vec::new();
    }

    state.set_validation_error(None);
    state.set_banner(None);

    let accepted_count = accepted.len();
    let batch_id = state.allocate_batch_id();
    let mut effects = Vec::with_capacity(accepted.len() + 1);
    effects.push(Effect::Submit {
        batch_id,
        links: accepted.clone(),
    });

    match state.queue().scheme() {
        IdentityScheme::ByUrl => {
            for url in accepted {
                let job_id = JobId::generate();
                if state
                    .queue_mut()
                    .append(JobRecord::new(job_id.clone(), url.clone()))
                {
                    effects.push(Effect::ResolveTitle { job_id, url });
                }
            }
            state.mark_dirty();
        }
        IdentityScheme::ByTaskId => {
            state.add_pending(batch_id, accepted);
        }
    }

    tubeq_info!("submitting batch {} with {} links", batch_id, accepted_count);
    effects
}

fn accept_submission(
    state: &mut AppState,
    batch_id: u64,
    tasks: Vec<SubmittedTask>,
) -> Vec<Effect> {
    state.take_pending(batch_id);
    let mut effects = Vec::new();

    match state.queue().scheme() {
        IdentityScheme::ByTaskId => {
            for task in tasks {
                let job_id = JobId::new(task.task_id);
                if state.queue().find_by_id(&job_id).is_some() {
                    continue;
                }
                if state
                    .queue_mut()
                    .append(JobRecord::new(job_id.clone(), task.url.clone()))
                {
                    effects.push(Effect::ResolveTitle {
                        job_id,
                        url: task.url,
                    });
                }
            }
            state.mark_dirty();
        }
        IdentityScheme::ByUrl => {
            if !tasks.is_empty() {
                tubeq_debug!(
                    "ignoring {} task ids for batch {}: jobs are keyed by url",
                    tasks.len(),
                    batch_id
                );
            }
        }
    }

    effects.extend(start_polling_if_needed(state));
    effects
}

fn start_polling_if_needed(state: &mut AppState) -> Option<Effect> {
    if state.is_polling() || !state.queue().has_active() {
        return None;
    }
    tubeq_info!("poll loop starting");
    state.set_poller(PollerState::Polling);
    Some(Effect::StartPolling)
}

fn stop_polling(state: &mut AppState) -> Vec<Effect> {
    state.set_poller(PollerState::Idle);
    vec![Effect::StopPolling]
}

fn poll_tick(state: &mut AppState, tick: u64) -> Vec<Effect> {
    match state.poller() {
        PollerState::Idle => {
            tubeq_trace!("tick {} after poll loop stopped, ignored", tick);
            Vec::new()
        }
        PollerState::Polling if !state.queue().has_active() => {
            tubeq_info!("tick {}: no active jobs, poll loop stopping", tick);
            stop_polling(state)
        }
        PollerState::Polling if state.is_fetch_in_flight() => {
            tubeq_debug!("tick {}: previous fetch still running, skipped", tick);
            Vec::new()
        }
        PollerState::Polling => {
            state.begin_fetch();
            let keys = state.queue().active_keys();
            tubeq_trace!("tick {}: fetching progress for {} jobs", tick, keys.len());
            vec![Effect::FetchProgress { keys }]
        }
    }
}

fn apply_progress(
    state: &mut AppState,
    events: Vec<crate::ProgressEvent>,
    received_at_ms: i64,
) -> Vec<Effect> {
    state.finish_fetch();
    if events.is_empty() {
        return Vec::new();
    }

    let outcome = state.queue_mut().apply_events(events);
    if outcome.changed {
        state.mark_dirty();
    }

    let mut effects = Vec::new();
    let mut history_changed = false;
    for done in outcome.completed {
        tubeq_info!("job {} completed as {}", done.job_id, done.filename);
        history_changed |= state.history_mut().record(HistoryEntry {
            title: done.title,
            filename: done.filename,
            timestamp_ms: received_at_ms,
        });
    }
    if history_changed {
        state.mark_dirty();
        effects.push(Effect::PersistHistory(state.history().list().to_vec()));
    }

    if outcome.all_done && state.is_polling() {
        tubeq_info!("backend reported all jobs done, poll loop stopping");
        effects.extend(stop_polling(state));
    }
    effects
}

fn retry(state: &mut AppState, job_id: &JobId) -> Vec<Effect> {
    let Some(record) = state.queue().find_by_id(job_id) else {
        return Vec::new();
    };
    if record.status() != JobStatus::Failed {
        tubeq_debug!("retry ignored for job {} in state {:?}", job_id, record.status());
        return Vec::new();
    }

    let Some(record) = state.queue_mut().remove(job_id) else {
        return Vec::new();
    };
    state.mark_dirty();
    tubeq_info!("retrying {} as a new job", record.url());
    submit_links(state, vec![record.url().to_owned()], false)
}
