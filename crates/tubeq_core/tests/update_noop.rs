use tubeq_core::{update, AppState, IdentityScheme, Msg};

#[test]
fn update_is_noop() {
    let state = AppState::new(IdentityScheme::ByUrl);
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn stale_tick_while_idle_is_noop() {
    let state = AppState::new(IdentityScheme::ByTaskId);
    let (next, effects) = update(state.clone(), Msg::PollTick { tick: 9 });

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
