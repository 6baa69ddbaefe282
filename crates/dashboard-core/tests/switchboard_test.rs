#![allow(clippy::unwrap_used)]
// Integration tests for `RepositorySwitchboard` over a scripted controller.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use pretty_assertions::assert_eq;

use common::{Harness, SignIn, TestFactory, factories, slow_policy};
use dashboard_core::{
    BackoffPolicy, CoreError, Domain, Mode, NewTodo, Phase, RepositorySwitchboard,
};

fn switchboard(h: &Harness) -> (RepositorySwitchboard, Arc<TestFactory>) {
    let factory = Arc::new(TestFactory::new());
    let board = RepositorySwitchboard::new(h.controller.clone(), factories(&factory));
    (board, factory)
}

fn all_modes(board: &RepositorySwitchboard) -> Vec<Mode> {
    vec![
        board.todos().unwrap().mode(),
        board.weather().unwrap().mode(),
        board.news().unwrap().mode(),
        board.feeds().unwrap().mode(),
        board.streams().unwrap().mode(),
    ]
}

// ── Initialization ──────────────────────────────────────────────────

#[tokio::test]
async fn test_accessors_before_initialize() {
    let h = Harness::new(BackoffPolicy::fast());
    let (board, _) = switchboard(&h);

    assert_eq!(board.mode(), None);
    assert!(matches!(board.todos(), Err(CoreError::NotInitialized)));
    assert!(matches!(board.streams(), Err(CoreError::NotInitialized)));
    assert!(board.domain_status().is_err());
}

#[tokio::test]
async fn test_never_reached_remote_starts_local() {
    let h = Harness::new(BackoffPolicy::fast());
    let (board, _) = switchboard(&h);

    assert_eq!(board.initialize().await.unwrap(), Mode::Local);
    assert_eq!(all_modes(&board), vec![Mode::Local; 5]);
}

#[tokio::test]
async fn test_successful_bootstrap_starts_live() {
    let h = Harness::new(BackoffPolicy::fast());
    let (board, _) = switchboard(&h);
    assert!(h.controller.run().await.is_ready());

    assert_eq!(board.initialize().await.unwrap(), Mode::Live);
    assert_eq!(all_modes(&board), vec![Mode::Live; 5]);
    assert!(board.domain_status().unwrap().iter().all(|d| d.available));
}

#[tokio::test]
async fn test_offline_after_bootstrap_starts_local() {
    let h = Harness::new(BackoffPolicy::fast());
    let (board, _) = switchboard(&h);
    assert!(h.controller.run().await.is_ready());

    h.probe.set_online(false);
    h.monitor.refresh().await.unwrap();

    assert_eq!(board.initialize().await.unwrap(), Mode::Local);
}

#[tokio::test]
async fn test_offline_without_local_fallback_stays_live() {
    let mut config = common::config(BackoffPolicy::fast());
    config.local_fallback = false;
    let h = Harness::with(config, common::FakeProbe::online(), Vec::new());
    let (board, _) = switchboard(&h);
    assert!(h.controller.run().await.is_ready());

    h.probe.set_online(false);
    h.monitor.refresh().await.unwrap();

    assert_eq!(board.initialize().await.unwrap(), Mode::Live);
}

#[tokio::test]
async fn test_degraded_auth_gates_only_todo() {
    let h = Harness::new(BackoffPolicy::fast());
    h.remote.set_sign_in(SignIn::Disabled);
    let (board, _) = switchboard(&h);
    assert!(h.controller.run().await.is_ready());
    assert_eq!(board.initialize().await.unwrap(), Mode::Live);

    let err = board.todos().err().unwrap();
    assert!(matches!(
        err,
        CoreError::AuthenticationRequired {
            domain: Domain::Todo
        }
    ));
    assert_eq!(err.to_string(), "The todo repository requires authentication");
    assert_eq!(board.weather().unwrap().mode(), Mode::Live);

    let status = board.domain_status().unwrap();
    let todo = status.iter().find(|d| d.domain == Domain::Todo).unwrap();
    assert!(!todo.available);
    assert_eq!(todo.reason.as_deref(), Some("authentication required"));
    assert_eq!(status.iter().filter(|d| d.available).count(), 4);
}

// ── Switching ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_switch_to_local_twice_rebuilds_once() {
    let h = Harness::new(BackoffPolicy::fast());
    let (board, factory) = switchboard(&h);
    assert!(h.controller.run().await.is_ready());
    board.initialize().await.unwrap();
    let mut modes = board.subscribe_mode();
    let builds = factory.builds();

    assert!(board.switch_to_local().await.unwrap());
    assert!(!board.switch_to_local().await.unwrap());

    assert_eq!(factory.builds(), builds + 1);
    assert_eq!(all_modes(&board), vec![Mode::Local; 5]);
    assert!(modes.has_changed().unwrap());
    assert_eq!(*modes.borrow_and_update(), Some(Mode::Local));
    assert!(!modes.has_changed().unwrap());
}

#[tokio::test]
async fn test_failed_construction_keeps_prior_mode() {
    let h = Harness::new(BackoffPolicy::fast());
    let (board, factory) = switchboard(&h);
    assert!(h.controller.run().await.is_ready());
    board.initialize().await.unwrap();

    factory.fail_local.store(true, Ordering::SeqCst);
    let err = board.switch_to_local().await.unwrap_err();

    assert!(matches!(err, CoreError::SwitchFailed { .. }));
    assert_eq!(board.mode(), Some(Mode::Live));
    assert_eq!(all_modes(&board), vec![Mode::Live; 5]);
}

#[tokio::test(start_paused = true)]
async fn test_switch_to_live_failure_stays_local() {
    let h = Harness::new(BackoffPolicy::fast().with_max_attempts(1).unwrap());
    let (board, _) = switchboard(&h);
    board.initialize().await.unwrap();

    h.remote.set_ping_ok(false);
    let err = board.switch_to_live().await.unwrap_err();

    assert!(matches!(err, CoreError::Bootstrap(_)));
    assert_eq!(board.mode(), Some(Mode::Local));
}

#[tokio::test]
async fn test_switch_to_live_reruns_bootstrap() {
    let h = Harness::new(BackoffPolicy::fast());
    let (board, _) = switchboard(&h);
    assert_eq!(board.initialize().await.unwrap(), Mode::Local);
    assert_eq!(h.remote.init_calls(), 0);

    board.switch_to_live().await.unwrap();

    assert_eq!(h.remote.init_calls(), 1);
    assert_eq!(all_modes(&board), vec![Mode::Live; 5]);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_switches_serialize() {
    let h = Harness::with(
        common::config(slow_policy(3)),
        common::FakeProbe::offline(),
        Vec::new(),
    );
    let (board, _) = switchboard(&h);
    assert_eq!(board.initialize().await.unwrap(), Mode::Local);
    let mut rx = h.controller.statuses();

    let live_board = board.clone();
    let live = tokio::spawn(async move { live_board.switch_to_live().await });
    while rx.recv().await.unwrap().phase != Phase::Retrying {}

    let local_board = board.clone();
    let local = tokio::spawn(async move { local_board.switch_to_local().await });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(!local.is_finished(), "switch_to_local must wait for the live switch");
    assert_eq!(board.mode(), Some(Mode::Local));

    h.probe.set_online(true);
    live.await.unwrap().unwrap();
    // Ran after the live commit, so it had a real flip to make.
    assert!(local.await.unwrap().unwrap());

    assert_eq!(board.mode(), Some(Mode::Local));
    assert_eq!(*board.subscribe_mode().borrow(), Some(Mode::Local));
    assert_eq!(all_modes(&board), vec![Mode::Local; 5]);
}

#[tokio::test]
async fn test_local_edits_survive_mode_round_trip() {
    let h = Harness::new(BackoffPolicy::fast());
    let (board, _) = switchboard(&h);
    board.initialize().await.unwrap();

    let created = board
        .todos()
        .unwrap()
        .create(NewTodo::titled("Fix bike light"))
        .await
        .unwrap();

    board.switch_to_live().await.unwrap();
    board.switch_to_local().await.unwrap();

    let todos = board.todos().unwrap().list().await.unwrap();
    assert!(todos.iter().any(|t| t.id == created.id));
}

// ── Automatic failover ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_auto_failover_follows_connectivity() {
    let h = Harness::new(BackoffPolicy::fast());
    let (board, _) = switchboard(&h);
    assert!(h.controller.run().await.is_ready());
    board.initialize().await.unwrap();
    board.start_auto_failover();
    let mut modes = board.subscribe_mode();

    h.probe.set_online(false);
    h.monitor.refresh().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), modes.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(board.mode(), Some(Mode::Local));

    h.probe.set_online(true);
    h.monitor.refresh().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), modes.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(board.mode(), Some(Mode::Live));

    board.shutdown();
    assert!(!h.monitor.is_running());
}

#[tokio::test]
async fn test_dropping_switchboard_ends_failover() {
    let h = Harness::new(BackoffPolicy::fast());
    assert!(h.controller.run().await.is_ready());
    let (board, _) = switchboard(&h);
    board.initialize().await.unwrap();
    board.start_auto_failover();
    let monitor = h.monitor.clone();
    assert!(monitor.is_running());

    drop(board);
    drop(h);
    assert!(!monitor.is_running());
}
