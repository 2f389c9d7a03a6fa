//! Session lifecycle tests against mock system collaborators.
//!
//! These tests drive the controller end to end on a paused tokio clock:
//! - Full two-minute session
//! - Paused start
//! - Degraded session without input interception
//! - Interrupt and external teardown
//! - Crash recovery

use std::time::Duration;

use chrono::Local;

use fitblock::interceptor::{InterceptorError, MockInputInterceptor};
use fitblock::notification::MockNotifier;
use fitblock::presenter::{CountdownPresenter, RecordingSurface};
use fitblock::session::{SessionController, SessionError, SessionOutcome};
use fitblock::shortcuts::MockShortcutGuard;
use fitblock::store::StateStore;
use fitblock::types::{SessionPhase, SessionStats};
use fitblock::BLOCK_DURATION_SECS;

// ============================================================================
// Test Helpers
// ============================================================================

type TestController =
    SessionController<MockShortcutGuard, MockInputInterceptor, MockNotifier, RecordingSurface>;

/// Creates a controller with the default block duration and returns a
/// handle onto its surface recording.
fn create_controller(dir: &tempfile::TempDir) -> (TestController, RecordingSurface) {
    let surface = RecordingSurface::new();
    let controller = SessionController::new(
        MockShortcutGuard::new(),
        MockInputInterceptor::new(),
        MockNotifier::new(),
        CountdownPresenter::new(surface.clone()),
        StateStore::new(dir.path().join("state.json")),
    );
    (controller, surface)
}

/// Asserts every shortcut disable was paired with an enable.
fn assert_shortcuts_balanced(controller: &TestController) {
    assert_eq!(
        controller.shortcut_guard().disable_call_count(),
        controller.shortcut_guard().enable_call_count()
    );
}

// ============================================================================
// Full session
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_two_minute_session_finishes_by_125s() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, surface) = create_controller(&dir);
    assert_eq!(controller.duration(), Duration::from_secs(BLOCK_DURATION_SECS));

    let (report, (mid, late)) = tokio::join!(controller.start(), async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        let mid = controller.status();
        tokio::time::sleep(Duration::from_secs(65)).await;
        (mid, controller.status())
    });

    let report = report.unwrap();
    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert_eq!(report.session_number, 1);

    assert_eq!(mid.phase, SessionPhase::Active);
    assert_eq!(mid.remaining_seconds, Some(60));
    assert_eq!(late.phase, SessionPhase::Idle);
    assert_eq!(late.remaining_seconds, None);

    let rendered = surface.rendered_remaining();
    assert_eq!(rendered.first(), Some(&120));
    assert_eq!(rendered.last(), Some(&0));

    let recording = surface.recording();
    assert_eq!(recording.shown, 1);
    assert_eq!(recording.hidden, 1);

    assert_eq!(controller.interceptor().release_count(), 1);
    assert_eq!(controller.shortcut_guard().enable_call_count(), 1);
    assert_shortcuts_balanced(&controller);
    assert_eq!(controller.stats().sessions_completed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_session_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, _) = create_controller(&dir);

    controller.start().await.unwrap();

    let stored = controller.store().read().unwrap().unwrap();
    assert_eq!(stored.sessions_completed, 1);
    assert!(stored.current_session_started_at.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_consecutive_sessions_are_numbered() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, _) = create_controller(&dir);
    let controller = controller.with_duration(Duration::from_secs(3));

    let first = controller.start().await.unwrap();
    let second = controller.start().await.unwrap();

    assert_eq!(first.session_number, 1);
    assert_eq!(second.session_number, 2);
    assert_eq!(controller.shortcut_guard().disable_call_count(), 2);
    assert_shortcuts_balanced(&controller);
}

// ============================================================================
// Gating and degradation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_start_while_paused() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, surface) = create_controller(&dir);
    controller.pause().unwrap();

    let result = controller.start().await;

    assert_eq!(result.unwrap_err(), SessionError::Paused);
    assert_eq!(controller.interceptor().install_call_count(), 0);
    assert_eq!(controller.shortcut_guard().disable_call_count(), 0);
    assert_eq!(surface.recording().shown, 0);
    assert!(controller.stats().current_session_started_at.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_permission_denied_still_completes() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, surface) = create_controller(&dir);
    controller
        .interceptor()
        .set_failure(Some(InterceptorError::PermissionDenied));

    let report = controller.start().await.unwrap();

    assert!(report.degraded);
    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert_eq!(controller.stats().sessions_completed, 1);
    assert_eq!(surface.rendered_remaining().last(), Some(&0));
    assert_shortcuts_balanced(&controller);
}

#[tokio::test(start_paused = true)]
async fn test_shortcut_failures_do_not_block_session() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, _) = create_controller(&dir);
    let controller = controller.with_duration(Duration::from_secs(3));
    controller.shortcut_guard().set_should_fail_disable(true);
    controller.shortcut_guard().set_should_fail_enable(true);

    let report = controller.start().await.unwrap();

    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert_shortcuts_balanced(&controller);
    assert_eq!(controller.phase(), SessionPhase::Idle);
}

// ============================================================================
// Interruption
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_interrupt_mid_session() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, surface) = create_controller(&dir);

    let (report, _) = tokio::join!(controller.start(), async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        controller.interrupt();
    });

    let report = report.unwrap();
    assert_eq!(report.outcome, SessionOutcome::Interrupted);
    assert_eq!(controller.stats().sessions_completed, 1);
    assert_eq!(surface.recording().hidden, 1);
    assert!(!surface.rendered_remaining().contains(&0));
    assert_eq!(controller.interceptor().release_count(), 1);
    assert_shortcuts_balanced(&controller);
}

#[tokio::test(start_paused = true)]
async fn test_double_teardown_equals_single() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, _) = create_controller(&dir);

    let (report, results) = tokio::join!(controller.start(), async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        controller.interrupt();
        let (a, b) = tokio::join!(controller.teardown(), controller.teardown());
        (a, b, controller.teardown().await)
    });

    assert_eq!(report.unwrap().outcome, SessionOutcome::Interrupted);
    // Exactly one of the concurrent callers does the work
    assert!(results.0 ^ results.1);
    assert!(!results.2);

    assert_eq!(controller.stats().sessions_completed, 1);
    assert_eq!(controller.shortcut_guard().enable_call_count(), 1);
    assert_eq!(controller.interceptor().release_count(), 1);
    assert_shortcuts_balanced(&controller);
}

#[tokio::test(start_paused = true)]
async fn test_pause_during_session_does_not_interrupt() {
    let dir = tempfile::tempdir().unwrap();
    let (controller, _) = create_controller(&dir);

    let (report, pause) = tokio::join!(controller.start(), async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        controller.pause()
    });

    assert_eq!(pause, Err(SessionError::NotIdle(SessionPhase::Active)));
    assert_eq!(report.unwrap().outcome, SessionOutcome::Completed);
    assert!(!controller.stats().paused);
}

// ============================================================================
// Recovery
// ============================================================================

#[tokio::test]
async fn test_recovery_after_crash() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    let mut stats = SessionStats::fresh(Local::now());
    stats.sessions_completed = 2;
    stats.begin_session(Local::now());
    store.save(&stats).unwrap();

    let (controller, _) = create_controller(&dir);
    assert!(controller.status().stats.current_session_started_at.is_some());

    assert!(controller.recover_interrupted_session().await);
    assert!(!controller.recover_interrupted_session().await);

    assert_eq!(controller.shortcut_guard().enable_call_count(), 1);
    assert_eq!(controller.stats().sessions_completed, 2);
    assert!(controller.can_start().is_ok());
}

#[tokio::test]
async fn test_corrupt_state_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("state.json"), "[1, 2").unwrap();

    let (controller, _) = create_controller(&dir);

    assert_eq!(controller.stats().sessions_completed, 0);
    assert!(!controller.stats().paused);
}
