//! End-to-end detection scenarios: a scripted location provider drives a
//! session through permission, position fix, classification, and the
//! presentation window.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use summitcert::{
    run_detection, AccuracyHint, Coordinate, DetectionSession, GeolocationProvider, LocationError,
    OutcomeKind, PeakCatalog, PeakProximityClassifier, PermissionStatus, SessionConfig,
    SessionStatus,
};

/// Plays back a fixed permission answer and a queue of fix results.
struct ScriptedProvider {
    permission: PermissionStatus,
    fixes: VecDeque<Result<Coordinate, LocationError>>,
    fix_requests: usize,
}

impl ScriptedProvider {
    fn granted(fixes: Vec<Result<Coordinate, LocationError>>) -> Self {
        Self {
            permission: PermissionStatus::Granted,
            fixes: fixes.into(),
            fix_requests: 0,
        }
    }
}

impl GeolocationProvider for ScriptedProvider {
    fn request_permission(&mut self) -> PermissionStatus {
        self.permission
    }

    fn current_position(
        &mut self,
        _accuracy: AccuracyHint,
        timeout: Duration,
    ) -> Result<Coordinate, LocationError> {
        self.fix_requests += 1;
        self.fixes
            .pop_front()
            .unwrap_or(Err(LocationError::Timeout(timeout)))
    }
}

#[test]
fn summit_detection_end_to_end() {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();

    // The shipped sample catalog; Longs Peak is id 1.
    let catalog = PeakCatalog::load_from_file("data/peaks.json").expect("sample catalog loads");
    let classifier = PeakProximityClassifier::default();
    let mut session = DetectionSession::new(SessionConfig::default());
    // A fix a few meters off the Longs Peak catalog position.
    let mut provider =
        ScriptedProvider::granted(vec![Ok(Coordinate::new(40.25493, -105.61603))]);

    let t0 = Instant::now();
    run_detection(&mut session, &mut provider, &catalog, &classifier, t0).expect("trigger starts");

    // Classification is done, but the presentation window gates visibility.
    assert_eq!(session.poll(t0 + Duration::from_secs(4)), SessionStatus::Running);
    assert!(session.outcome().is_none());

    assert_eq!(
        session.poll(t0 + Duration::from_secs(8)),
        SessionStatus::Resolved
    );
    let outcome = session.take_outcome().expect("outcome consumed once");
    assert_eq!(outcome.kind, OutcomeKind::Summited);
    let nearest = outcome.nearest.expect("peak attached");
    assert_eq!(nearest.peak.name, "Longs Peak");
    assert!(nearest.distance_m < 50.0);

    // Consumption resets the session for the next attempt.
    assert_eq!(session.status(), SessionStatus::Idle);
}

#[test]
fn climbing_outcome_carries_distance() {
    let catalog = PeakCatalog::load_from_file("data/peaks.json").unwrap();
    let classifier = PeakProximityClassifier::default();
    let mut session = DetectionSession::new(SessionConfig::default());
    // ~300 m north of Longs Peak.
    let mut provider = ScriptedProvider::granted(vec![Ok(Coordinate::new(40.2576, -105.616))]);

    let t0 = Instant::now();
    run_detection(&mut session, &mut provider, &catalog, &classifier, t0);
    session.poll(t0 + Duration::from_secs(8));

    let outcome = session.take_outcome().unwrap();
    assert_eq!(outcome.kind, OutcomeKind::Climbing);
    let nearest = outcome.nearest.unwrap();
    assert!(
        nearest.distance_m > 50.0 && nearest.distance_m <= 500.0,
        "distance {} out of the climbing band",
        nearest.distance_m
    );
}

#[test]
fn far_from_any_peak_is_no_mountain() {
    let catalog = PeakCatalog::load_from_file("data/peaks.json").unwrap();
    let classifier = PeakProximityClassifier::default();
    let mut session = DetectionSession::new(SessionConfig::default());
    // Downtown Denver: no catalog peak within the bounding box.
    let mut provider = ScriptedProvider::granted(vec![Ok(Coordinate::new(39.7392, -104.9903))]);

    let t0 = Instant::now();
    run_detection(&mut session, &mut provider, &catalog, &classifier, t0);
    session.poll(t0 + Duration::from_secs(8));

    let outcome = session.take_outcome().unwrap();
    assert_eq!(outcome.kind, OutcomeKind::NoMountain);
    assert!(outcome.nearest.is_none());
}

#[test]
fn unavailable_catalog_classifies_as_no_mountain() {
    let catalog = PeakCatalog::load_or_empty("data/definitely-not-here.json");
    let classifier = PeakProximityClassifier::default();
    let mut session = DetectionSession::new(SessionConfig::default());
    let mut provider = ScriptedProvider::granted(vec![Ok(Coordinate::new(40.2549, -105.616))]);

    let t0 = Instant::now();
    run_detection(&mut session, &mut provider, &catalog, &classifier, t0);
    session.poll(t0 + Duration::from_secs(8));

    let outcome = session.take_outcome().unwrap();
    assert_eq!(outcome.kind, OutcomeKind::NoMountain);
    assert!(outcome.nearest.is_none());
}

#[test]
fn permission_denied_returns_to_idle_and_retries_cleanly() {
    let catalog = PeakCatalog::load_from_file("data/peaks.json").unwrap();
    let classifier = PeakProximityClassifier::default();
    let mut session = DetectionSession::new(SessionConfig::default());

    let mut denied = ScriptedProvider {
        permission: PermissionStatus::Denied,
        fixes: VecDeque::new(),
        fix_requests: 0,
    };

    let t0 = Instant::now();
    run_detection(&mut session, &mut denied, &catalog, &classifier, t0);
    assert_eq!(session.status(), SessionStatus::Idle);
    assert_eq!(session.last_error(), Some(&LocationError::PermissionDenied));
    assert_eq!(denied.fix_requests, 0, "no fix requested without permission");

    // Retry with permission granted: the aborted attempt left no residue.
    let mut granted = ScriptedProvider::granted(vec![Ok(Coordinate::new(40.25493, -105.61603))]);
    let t1 = t0 + Duration::from_secs(2);
    run_detection(&mut session, &mut granted, &catalog, &classifier, t1);
    assert!(session.last_error().is_none());
    session.poll(t1 + Duration::from_secs(8));
    assert_eq!(session.take_outcome().unwrap().kind, OutcomeKind::Summited);
}

#[test]
fn fix_timeout_is_an_error_state_not_an_outcome() {
    let catalog = PeakCatalog::load_from_file("data/peaks.json").unwrap();
    let classifier = PeakProximityClassifier::default();
    let mut session = DetectionSession::new(SessionConfig::default());
    let mut provider = ScriptedProvider::granted(vec![Err(LocationError::Timeout(
        Duration::from_secs(10),
    ))]);

    let t0 = Instant::now();
    run_detection(&mut session, &mut provider, &catalog, &classifier, t0);

    assert_eq!(session.status(), SessionStatus::Idle);
    assert!(matches!(
        session.last_error(),
        Some(LocationError::Timeout(_))
    ));
    // No outcome ever surfaces for the failed attempt.
    assert_eq!(session.poll(t0 + Duration::from_secs(20)), SessionStatus::Idle);
    assert!(session.take_outcome().is_none());
}

#[test]
fn second_trigger_while_running_is_dropped() {
    let catalog = PeakCatalog::load_from_file("data/peaks.json").unwrap();
    let classifier = PeakProximityClassifier::default();
    let mut session = DetectionSession::new(SessionConfig::default());
    let mut provider = ScriptedProvider::granted(vec![
        Ok(Coordinate::new(40.25493, -105.61603)),
        Ok(Coordinate::new(39.7392, -104.9903)),
    ]);

    let t0 = Instant::now();
    run_detection(&mut session, &mut provider, &catalog, &classifier, t0);
    // Second tap mid-window: dropped, no second fix request.
    assert!(run_detection(
        &mut session,
        &mut provider,
        &catalog,
        &classifier,
        t0 + Duration::from_secs(1)
    )
    .is_none());
    assert_eq!(provider.fix_requests, 1);

    // The first attempt's outcome is untouched.
    session.poll(t0 + Duration::from_secs(8));
    assert_eq!(session.take_outcome().unwrap().kind, OutcomeKind::Summited);
}

#[test]
fn cancelling_mid_window_discards_the_outcome() {
    let catalog = PeakCatalog::load_from_file("data/peaks.json").unwrap();
    let classifier = PeakProximityClassifier::default();
    let mut session = DetectionSession::new(SessionConfig::default());
    let mut provider = ScriptedProvider::granted(vec![Ok(Coordinate::new(40.25493, -105.61603))]);

    let t0 = Instant::now();
    run_detection(&mut session, &mut provider, &catalog, &classifier, t0);
    // User dismisses the screen three seconds in.
    session.cancel();

    assert_eq!(session.poll(t0 + Duration::from_secs(30)), SessionStatus::Idle);
    assert!(session.outcome().is_none());
    assert!(session.take_outcome().is_none());
}
