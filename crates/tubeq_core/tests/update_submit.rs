use std::sync::Once;

use pretty_assertions::assert_eq;
use tubeq_core::{
    update, AppState, Effect, IdentityScheme, JobId, JobStatus, Msg, ProgressEvent, SubmittedTask,
    TITLE_PLACEHOLDER,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tubeq_logging::initialize_for_tests);
}

fn submit_links(state: AppState, input: &str) -> (AppState, Vec<Effect>) {
    let (state, _) = update(state, Msg::InputChanged(input.to_string()));
    update(state, Msg::LinksSubmitted)
}

fn batch_of(effects: &[Effect]) -> (u64, Vec<String>) {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::Submit { batch_id, links } => Some((*batch_id, links.clone())),
            _ => None,
        })
        .expect("submit effect")
}

#[test]
fn url_scheme_inserts_optimistically_and_submits() {
    init_logging();
    let state = AppState::new(IdentityScheme::ByUrl);

    let (mut state, effects) = submit_links(state, "https://youtu.be/abc123\n");
    let view = state.view();

    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].status, JobStatus::Queued);
    assert_eq!(view.rows[0].title, TITLE_PLACEHOLDER);
    assert_eq!(view.input, "");
    assert!(!view.show_empty_placeholder);
    assert!(state.consume_dirty());

    let (_, links) = batch_of(&effects);
    assert_eq!(links, vec!["https://youtu.be/abc123".to_string()]);
    assert!(matches!(
        &effects[1],
        Effect::ResolveTitle { job_id, url }
            if *job_id == view.rows[0].job_id && url == "https://youtu.be/abc123"
    ));
    // Polling waits for the backend to acknowledge the batch.
    assert!(!effects.contains(&Effect::StartPolling));
}

#[test]
fn same_url_twice_in_one_batch_creates_one_record() {
    init_logging();
    let state = AppState::new(IdentityScheme::ByUrl);

    let (state, effects) = submit_links(
        state,
        "https://youtu.be/abc123, https://youtu.be/abc123\nhttps://youtu.be/abc123/",
    );

    assert_eq!(state.queue().len(), 1);
    assert_eq!(batch_of(&effects).1.len(), 1);
}

#[test]
fn invalid_input_reports_validation_error() {
    init_logging();
    let state = AppState::new(IdentityScheme::ByUrl);

    let (state, effects) = submit_links(state, "https://example.com/watch?v=1\nhello");

    assert!(effects.is_empty());
    assert!(state.queue().is_empty());
    let view = state.view();
    assert_eq!(
        view.validation_error.as_deref(),
        Some("Please paste at least one valid YouTube link.")
    );
    // Input is kept so the user can fix it.
    assert_eq!(view.input, "https://example.com/watch?v=1\nhello");
    assert!(view.show_empty_placeholder);
}

#[test]
fn fully_duplicate_batch_reports_already_queued() {
    init_logging();
    let state = AppState::new(IdentityScheme::ByUrl);
    let (state, _) = submit_links(state, "https://youtu.be/a\nhttps://youtu.be/b");

    let (state, effects) = submit_links(state, "https://youtu.be/b\nhttps://youtu.be/a");

    assert!(effects.is_empty());
    assert_eq!(state.queue().len(), 2);
    let view = state.view();
    assert_eq!(
        view.validation_error.as_deref(),
        Some("These links are already in the queue.")
    );
    assert_eq!(view.last_submit_stats.as_ref().unwrap().enqueued, 0);
    assert_eq!(view.last_submit_stats.as_ref().unwrap().skipped, 2);
}

#[test]
fn partially_duplicate_batch_submits_only_new_links() {
    init_logging();
    let state = AppState::new(IdentityScheme::ByUrl);
    let (state, _) = submit_links(state, "https://youtu.be/a");

    let (state, effects) = submit_links(state, "https://youtu.be/a\nhttps://youtu.be/c");

    assert_eq!(batch_of(&effects).1, vec!["https://youtu.be/c".to_string()]);
    let view = state.view();
    assert_eq!(view.validation_error, None);
    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.last_submit_stats.as_ref().unwrap().enqueued, 1);
    assert_eq!(view.last_submit_stats.as_ref().unwrap().skipped, 1);
}

#[test]
fn acknowledgement_starts_a_single_poll_loop() {
    init_logging();
    let state = AppState::new(IdentityScheme::ByUrl);
    let (state, effects) = submit_links(state, "https://youtu.be/a");
    let (first_batch, _) = batch_of(&effects);

    let (state, effects) = update(
        state,
        Msg::SubmissionAccepted {
            batch_id: first_batch,
            tasks: Vec::new(),
        },
    );
    assert_eq!(effects, vec![Effect::StartPolling]);
    assert!(state.view().polling);

    let (state, effects) = submit_links(state, "https://youtu.be/b");
    let (second_batch, _) = batch_of(&effects);
    let (_state, effects) = update(
        state,
        Msg::SubmissionAccepted {
            batch_id: second_batch,
            tasks: Vec::new(),
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn submission_failure_shows_banner_and_keeps_optimistic_records() {
    init_logging();
    let state = AppState::new(IdentityScheme::ByUrl);
    let (state, effects) = submit_links(state, "https://youtu.be/a");
    let (batch_id, _) = batch_of(&effects);

    let (state, effects) = update(
        state,
        Msg::SubmissionFailed {
            batch_id,
            message: "Server error: failed to start download process.".into(),
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(
        view.banner.as_deref(),
        Some("Server error: failed to start download process.")
    );
    assert_eq!(view.rows.len(), 1);
    assert!(!view.polling);

    let (state, _) = update(state, Msg::DismissBanner);
    assert_eq!(state.view().banner, None);
}

#[test]
fn task_scheme_creates_records_from_returned_ids() {
    init_logging();
    let state = AppState::new(IdentityScheme::ByTaskId);
    let (state, effects) = submit_links(state, "https://youtu.be/a\nhttps://youtu.be/b");
    let (batch_id, links) = batch_of(&effects);
    assert_eq!(links.len(), 2);
    assert_eq!(effects.len(), 1);
    assert!(state.queue().is_empty());

    // While the ids are pending the same links are still rejected.
    let (state, effects) = submit_links(state, "https://youtu.be/a");
    assert!(effects.is_empty());

    let (state, effects) = update(
        state,
        Msg::SubmissionAccepted {
            batch_id,
            tasks: vec![
                SubmittedTask {
                    task_id: "t-1".into(),
                    url: "https://youtu.be/a".into(),
                },
                SubmittedTask {
                    task_id: "t-2".into(),
                    url: "https://youtu.be/b".into(),
                },
            ],
        },
    );

    let ids: Vec<_> = state.view().rows.iter().map(|r| r.job_id.clone()).collect();
    assert_eq!(ids, vec![JobId::new("t-1"), JobId::new("t-2")]);
    assert_eq!(
        effects,
        vec![
            Effect::ResolveTitle {
                job_id: JobId::new("t-1"),
                url: "https://youtu.be/a".into(),
            },
            Effect::ResolveTitle {
                job_id: JobId::new("t-2"),
                url: "https://youtu.be/b".into(),
            },
            Effect::StartPolling,
        ]
    );
}

#[test]
fn title_resolution_is_independent_of_status() {
    init_logging();
    let state = AppState::new(IdentityScheme::ByUrl);
    let (state, _) = submit_links(state, "https://youtu.be/a");
    let job_id = state.view().rows[0].job_id.clone();

    let (state, _) = update(
        state,
        Msg::ProgressReceived {
            events: vec![ProgressEvent::Error {
                key: "https://youtu.be/a".into(),
                message: "blocked".into(),
            }],
            received_at_ms: 1,
        },
    );
    let (state, _) = update(
        state,
        Msg::TitleResolved {
            job_id,
            title: "Never Gonna".into(),
        },
    );

    let row = &state.view().rows[0];
    assert_eq!(row.title, "Never Gonna");
    assert_eq!(row.status, JobStatus::Failed);
    assert_eq!(row.message.as_deref(), Some("blocked"));
}

#[test]
fn late_title_for_removed_job_is_dropped() {
    init_logging();
    let state = AppState::new(IdentityScheme::ByUrl);
    let (state, _) = submit_links(state, "https://youtu.be/a");
    let job_id = state.view().rows[0].job_id.clone();

    let (state, _) = update(state, Msg::ClearQueueClicked);
    let (state, _) = update(
        state,
        Msg::TitleResolved {
            job_id,
            title: "Gone".into(),
        },
    );

    assert!(state.queue().is_empty());
    assert!(state.view().show_empty_placeholder);
}

#[test]
fn resubmitting_after_clear_creates_a_new_job() {
    init_logging();
    let state = AppState::new(IdentityScheme::ByUrl);
    let (state, _) = submit_links(state, "https://youtu.be/abc123");
    let first_id = state.view().rows[0].job_id.clone();
    let (state, _) = update(
        state,
        Msg::ProgressReceived {
            events: vec![ProgressEvent::Done {
                key: "https://youtu.be/abc123".into(),
                filename: "abc123.mp3".into(),
            }],
            received_at_ms: 10,
        },
    );
    assert_eq!(state.view().rows[0].status, JobStatus::Completed);

    let (state, _) = update(state, Msg::ClearQueueClicked);
    let (state, effects) = submit_links(state, "https://youtu.be/abc123");

    let view = state.view();
    assert_eq!(view.rows.len(), 1);
    assert_ne!(view.rows[0].job_id, first_id);
    assert_eq!(view.rows[0].status, JobStatus::Queued);
    assert_eq!(view.rows[0].download, None);
    assert_eq!(batch_of(&effects).1, vec!["https://youtu.be/abc123".to_string()]);
}

#[test]
fn retry_replaces_failed_job_with_fresh_one() {
    init_logging();
    let state = AppState::new(IdentityScheme::ByUrl);
    let (state, _) = submit_links(state, "https://youtu.be/a\nhttps://youtu.be/b");
    let failed_id = state.view().rows[0].job_id.clone();
    let (state, _) = update(
        state,
        Msg::ProgressReceived {
            events: vec![ProgressEvent::Error {
                key: "https://youtu.be/a".into(),
                message: "blocked".into(),
            }],
            received_at_ms: 1,
        },
    );
    assert!(state.view().rows[0].can_retry);
    assert!(!state.view().rows[1].can_retry);

    let (state, effects) = update(
        state,
        Msg::RetryClicked {
            job_id: failed_id.clone(),
        },
    );

    let view = state.view();
    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.rows[0].url, "https://youtu.be/b");
    assert_eq!(view.rows[1].url, "https://youtu.be/a");
    assert_ne!(view.rows[1].job_id, failed_id);
    assert_eq!(view.rows[1].status, JobStatus::Queued);
    assert_eq!(view.rows[1].message, None);
    assert_eq!(batch_of(&effects).1, vec!["https://youtu.be/a".to_string()]);
}

#[test]
fn retry_is_ignored_for_jobs_that_did_not_fail() {
    init_logging();
    let state = AppState::new(IdentityScheme::ByUrl);
    let (state, _) = submit_links(state, "https://youtu.be/a");
    let job_id = state.view().rows[0].job_id.clone();

    let (state, effects) = update(state, Msg::RetryClicked { job_id: job_id.clone() });

    assert!(effects.is_empty());
    assert_eq!(state.view().rows[0].job_id, job_id);
}
