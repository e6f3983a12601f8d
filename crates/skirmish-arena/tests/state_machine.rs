//! Integration test: arena state machine scenarios.
//!
//! Drives arenas built from the recording fixtures through full
//! lifecycles and checks the exact hook order for each tick.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use skirmish_arena::{Arena, TickError, TickOutcome};
use skirmish_core::{Lifecycle, LifecycleError, Phase, StateKey};
use skirmish_test_utils::fixtures::{
    Alpha, Ended, FailingState, Lobby, Playing, RecordingArena, RecordingUnit, Requesting,
    Scoreboard,
};
use skirmish_test_utils::CallLog;
use skirmish_unit::{FeatureUnit, UnitConfig};

fn ready(blueprint: RecordingArena) -> Arena {
    let arena = Arena::new(UnitConfig::new("arena"), blueprint).unwrap();
    arena.init().unwrap();
    arena.post_init().unwrap();
    arena
}

fn key<S: 'static>() -> StateKey {
    StateKey::of::<S>()
}

// ── Scenarios ──────────────────────────────────────────────────────

#[test]
fn lobby_playing_ended() {
    let log = CallLog::new();
    let arena = ready(RecordingArena::standard(&log));
    assert_eq!(log.take(), ["on_init:arena", "on_post_init:arena"]);

    assert_eq!(arena.tick().unwrap(), TickOutcome::Idle);
    assert!(log.take().is_empty());

    arena.set_next_state::<Lobby>();
    assert_eq!(
        arena.tick().unwrap(),
        TickOutcome::Transitioned {
            from: None,
            to: key::<Lobby>()
        }
    );
    assert_eq!(log.take(), ["guard:none->Lobby", "start:Lobby"]);
    assert_eq!(arena.current_state(), Some(key::<Lobby>()));
    assert_eq!(arena.next_state(), None);

    for _ in 0..3 {
        assert_eq!(
            arena.tick().unwrap(),
            TickOutcome::Updated {
                state: key::<Lobby>()
            }
        );
    }
    assert_eq!(log.take(), ["update:Lobby"; 3]);

    arena.set_next_state::<Playing>();
    arena.tick().unwrap();
    assert_eq!(
        log.take(),
        ["guard:Lobby->Playing", "end:Lobby", "start:Playing"]
    );
    arena.tick().unwrap();
    assert_eq!(log.take(), ["update:Playing"]);

    arena.set_next_state::<Ended>();
    let outcome = arena.tick().unwrap();
    assert_eq!(outcome.to_string(), "Playing -> Ended");
    assert_eq!(
        log.take(),
        ["guard:Playing->Ended", "end:Playing", "start:Ended"]
    );
    assert!(arena.is_in::<Ended>());

    arena.clear().unwrap();
    assert_eq!(log.take(), ["on_clear:arena"]);
    assert_eq!(arena.lifecycle(), Lifecycle::Cleared);
}

#[test]
fn rejected_request_is_retried_every_tick() {
    let log = CallLog::new();
    let refusals = Arc::new(AtomicUsize::new(2));
    let guard = {
        let refusals = Arc::clone(&refusals);
        move |_: &Arena, _: Option<StateKey>, to: StateKey| {
            to != StateKey::of::<Playing>()
                || refusals
                    .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
                    .is_err()
        }
    };
    let arena = ready(RecordingArena::standard(&log).guard(guard));
    arena.set_next_state::<Lobby>();
    arena.tick().unwrap();
    log.take();

    arena.set_next_state::<Playing>();
    for _ in 0..2 {
        assert_eq!(
            arena.tick().unwrap(),
            TickOutcome::Rejected {
                pending: key::<Playing>(),
                updated: Some(key::<Lobby>())
            }
        );
        assert_eq!(arena.current_state(), Some(key::<Lobby>()));
        assert_eq!(arena.next_state(), Some(key::<Playing>()));
    }
    assert_eq!(
        log.take(),
        [
            "guard:Lobby->Playing",
            "update:Lobby",
            "guard:Lobby->Playing",
            "update:Lobby",
        ]
    );

    assert!(arena.tick().unwrap().is_transition());
    assert_eq!(
        log.take(),
        ["guard:Lobby->Playing", "end:Lobby", "start:Playing"]
    );
}

#[test]
fn guard_can_drop_the_request() {
    let log = CallLog::new();
    let arena = ready(
        RecordingArena::standard(&log).guard(|arena: &Arena, from, _to| {
            if from.is_some() {
                arena.clear_next_state();
                return false;
            }
            true
        }),
    );
    arena.set_next_state::<Lobby>();
    arena.tick().unwrap();
    arena.set_next_state::<Ended>();
    log.take();

    assert!(matches!(
        arena.tick().unwrap(),
        TickOutcome::Rejected { .. }
    ));
    assert_eq!(arena.next_state(), None);
    assert_eq!(
        arena.tick().unwrap(),
        TickOutcome::Updated {
            state: key::<Lobby>()
        }
    );
    assert_eq!(
        log.take(),
        ["guard:Lobby->Ended", "update:Lobby", "update:Lobby"]
    );
}

#[test]
fn guard_can_redirect_the_request() {
    let log = CallLog::new();
    let arena = ready(
        RecordingArena::standard(&log).guard(|arena: &Arena, _from, to| {
            if to == StateKey::of::<Ended>() {
                arena.set_next_state::<Playing>();
                return false;
            }
            true
        }),
    );
    arena.set_next_state::<Lobby>();
    arena.tick().unwrap();
    arena.set_next_state::<Ended>();
    arena.tick().unwrap();
    log.take();

    assert_eq!(
        arena.tick().unwrap(),
        TickOutcome::Transitioned {
            from: Some(key::<Lobby>()),
            to: key::<Playing>()
        }
    );
    assert_eq!(
        log.take(),
        ["guard:Lobby->Playing", "end:Lobby", "start:Playing"]
    );
}

#[test]
fn accepted_transition_drops_request_made_by_guard() {
    let log = CallLog::new();
    let arena = ready(
        RecordingArena::standard(&log).guard(|arena: &Arena, _from, to| {
            if to == StateKey::of::<Playing>() {
                arena.set_next_state::<Ended>();
            }
            true
        }),
    );
    arena.set_next_state::<Lobby>();
    arena.tick().unwrap();
    arena.set_next_state::<Playing>();
    log.take();

    assert_eq!(
        arena.tick().unwrap(),
        TickOutcome::Transitioned {
            from: Some(key::<Lobby>()),
            to: key::<Playing>()
        }
    );
    assert_eq!(arena.current_state(), Some(key::<Playing>()));
    assert_eq!(arena.next_state(), None);

    assert_eq!(
        arena.tick().unwrap(),
        TickOutcome::Updated {
            state: key::<Playing>()
        }
    );
    assert_eq!(
        log.take(),
        ["guard:Lobby->Playing", "end:Lobby", "start:Playing", "update:Playing"]
    );
}

#[test]
fn reentering_current_state_restarts_it() {
    let log = CallLog::new();
    let arena = ready(RecordingArena::standard(&log));
    arena.set_next_state::<Lobby>();
    arena.tick().unwrap();
    log.take();

    arena.set_next_state::<Lobby>();
    assert_eq!(
        arena.tick().unwrap(),
        TickOutcome::Transitioned {
            from: Some(key::<Lobby>()),
            to: key::<Lobby>()
        }
    );
    assert_eq!(log.take(), ["guard:Lobby->Lobby", "end:Lobby", "start:Lobby"]);
}

#[test]
fn request_from_update_takes_effect_next_tick() {
    let log = CallLog::new();
    let arena = ready(
        RecordingArena::new(&log)
            .state(Requesting::<Ended>::new(&log))
            .state(Ended::new(&log)),
    );
    arena.set_next_state::<Requesting<Ended>>();
    arena.tick().unwrap();
    log.take();

    assert_eq!(
        arena.tick().unwrap(),
        TickOutcome::Updated {
            state: key::<Requesting<Ended>>()
        }
    );
    assert_eq!(arena.next_state(), Some(key::<Ended>()));
    assert!(arena.tick().unwrap().is_transition());
    assert_eq!(
        log.take(),
        [
            "update:Requesting",
            "guard:Requesting->Ended",
            "start:Ended",
        ]
    );
    assert!(arena.is_in::<Ended>());
}

#[test]
fn request_from_another_thread_is_picked_up() {
    let log = CallLog::new();
    let arena = Arc::new(ready(RecordingArena::standard(&log)));

    let setter = {
        let arena = Arc::clone(&arena);
        thread::spawn(move || arena.set_next_state::<Playing>())
    };
    setter.join().unwrap();

    assert_eq!(arena.next_state(), Some(key::<Playing>()));
    assert!(arena.tick().unwrap().is_transition());
    assert!(arena.is_in::<Playing>());
    assert_eq!(arena.status().transitions, 1);
}

// ── Features ───────────────────────────────────────────────────────

#[test]
fn states_reach_parent_features_through_arena() {
    let log = CallLog::new();
    let lobby_unit = Arc::new(
        FeatureUnit::new(
            UnitConfig::new("lobby-server"),
            RecordingUnit::new("server", &log).with(Scoreboard::default()),
        )
        .unwrap(),
    );
    let arena = Arena::new(
        UnitConfig::new("arena").parent(Arc::clone(&lobby_unit)),
        RecordingArena::standard(&log).feature(Alpha::new(&log)),
    )
    .unwrap();
    arena.init().unwrap();
    arena.post_init().unwrap();
    assert!(log.before("on_init:server", "init:Alpha"));
    assert!(log.before("init:Alpha", "on_init:arena"));

    arena.feature::<Scoreboard>().unwrap().add(3);
    assert_eq!(
        lobby_unit.local_feature::<Scoreboard>().unwrap().points(),
        3
    );
    assert!(arena.local_feature::<Scoreboard>().is_none());
    assert_eq!(arena.feature_keys().len(), 1);
    assert_eq!(
        arena.state_keys(),
        [key::<Lobby>(), key::<Playing>(), key::<Ended>()]
    );

    arena.clear().unwrap();
    assert!(log.before("on_clear:arena", "clear:Alpha"));
    assert!(log.before("clear:Alpha", "on_clear:server"));
    assert_eq!(lobby_unit.lifecycle(), Lifecycle::Cleared);
}

#[test]
fn validity_is_delegated_to_blueprint() {
    let log = CallLog::new();
    let blueprint = Arc::new(RecordingArena::standard(&log));
    let arena = Arena::from_shared(UnitConfig::new("arena"), blueprint.clone()).unwrap();
    assert!(arena.is_valid());
    blueprint.set_valid(false);
    assert!(!arena.is_valid());
}

// ── Failures ───────────────────────────────────────────────────────

#[test]
fn failing_update_aborts_tick() {
    let log = CallLog::new();
    let arena = ready(
        RecordingArena::standard(&log).state(FailingState::new(&log, Phase::Update)),
    );
    arena.set_next_state::<FailingState>();
    arena.tick().unwrap();

    let err = arena.tick().unwrap_err();
    assert!(matches!(
        err,
        TickError::Hook {
            phase: Phase::Update,
            ..
        }
    ));
    assert!(arena.is_in::<FailingState>());
}

#[test]
fn failing_end_skips_start_but_commits_transition() {
    let log = CallLog::new();
    let arena = ready(
        RecordingArena::standard(&log).state(FailingState::new(&log, Phase::End)),
    );
    arena.set_next_state::<FailingState>();
    arena.tick().unwrap();
    arena.set_next_state::<Lobby>();
    log.take();

    let err = arena.tick().unwrap_err();
    assert!(matches!(
        err,
        TickError::Hook {
            phase: Phase::End,
            ..
        }
    ));
    assert_eq!(log.take(), ["guard:FailingState->Lobby", "end:FailingState"]);
    assert!(arena.is_in::<Lobby>());
    assert_eq!(arena.next_state(), None);
}

#[test]
fn failing_guard_leaves_request_pending() {
    let log = CallLog::new();
    let arena = ready(RecordingArena::standard(&log).failing(Phase::StateChange));
    arena.set_next_state::<Lobby>();

    let err = arena.tick().unwrap_err();
    assert!(matches!(
        err,
        TickError::Hook {
            phase: Phase::StateChange,
            ..
        }
    ));
    assert_eq!(arena.current_state(), None);
    assert_eq!(arena.next_state(), Some(key::<Lobby>()));
}

#[test]
fn failing_arena_init_faults_and_drops_states() {
    let log = CallLog::new();
    let arena = Arena::new(
        UnitConfig::new("arena"),
        RecordingArena::standard(&log)
            .feature(Alpha::new(&log))
            .failing(Phase::Init),
    )
    .unwrap();

    let err = arena.init().unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Hook {
            phase: Phase::Init,
            ..
        }
    ));
    assert_eq!(arena.lifecycle(), Lifecycle::Faulted);
    assert!(arena.game_state::<Lobby>().is_none());
    assert!(arena.local_feature::<Alpha>().is_none());
}

#[test]
fn duplicate_state_is_rejected_at_init() {
    let log = CallLog::new();
    let arena = Arena::new(
        UnitConfig::new("arena"),
        RecordingArena::standard(&log).state(Lobby::new(&log)),
    )
    .unwrap();
    let err = arena.init().unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::DuplicateState { state, .. } if state == StateKey::of::<Lobby>()
    ));
}
