//! The detection session state machine.
//!
//! One session coordinates one classification attempt with the paced
//! presentation window: `Idle → Running → Resolved → Idle`. The position
//! fix is usually fast, so the computed outcome is held back until the
//! window (default 8 s) has elapsed; whichever of {window, fix} finishes
//! last determines when the outcome becomes visible, but it is the window
//! timer, not the fetch, that gates visibility.
//!
//! Time is passed in explicitly (`Instant`), never read from a global
//! clock, so the machine can be driven deterministically in tests.
//!
//! Cancellation is cooperative. Every trigger mints an `AttemptToken`; an
//! in-flight continuation finishing after the session was cancelled or
//! reset presents a stale token and its result is discarded rather than
//! applied.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::catalog::PeakCatalog;
use crate::classifier::{ClassificationOutcome, PeakProximityClassifier};
use crate::location::{AccuracyHint, GeolocationProvider, LocationError, PermissionStatus};

// ── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Minimum time the outcome is withheld after triggering. Default 8 s.
    pub presentation_window: Duration,
    /// Budget for the position fix. Default 10 s.
    pub fix_timeout: Duration,
    /// Accuracy requested for the detection fix.
    pub fix_accuracy: AccuracyHint,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            presentation_window: Duration::from_secs(8),
            fix_timeout: Duration::from_secs(10),
            fix_accuracy: AccuracyHint::Highest,
        }
    }
}

// ── State machine ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Running,
    Resolved,
}

/// Proof that a completion belongs to the current attempt. Stale tokens
/// (from a cancelled or superseded attempt) are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptToken(u64);

#[derive(Debug)]
pub struct DetectionSession {
    config: SessionConfig,
    status: SessionStatus,
    attempt: u64,
    started_at: Option<Instant>,
    pending: Option<ClassificationOutcome>,
    error: Option<LocationError>,
}

impl DetectionSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            status: SessionStatus::Idle,
            attempt: 0,
            started_at: None,
            pending: None,
            error: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Start an attempt. Returns the attempt's token, or `None` if the
    /// session is not idle: concurrent triggers are dropped, never queued.
    pub fn trigger(&mut self, now: Instant) -> Option<AttemptToken> {
        if self.status != SessionStatus::Idle {
            debug!("detection trigger ignored: session is {:?}", self.status);
            return None;
        }
        self.attempt += 1;
        self.status = SessionStatus::Running;
        self.started_at = Some(now);
        self.pending = None;
        self.error = None;
        Some(AttemptToken(self.attempt))
    }

    fn token_is_current(&self, token: AttemptToken) -> bool {
        token.0 == self.attempt
    }

    /// Store the computed outcome for the attempt. The outcome stays
    /// hidden until the presentation window elapses.
    ///
    /// Returns `false` (result discarded) for a stale token or when the
    /// session is no longer running.
    pub fn complete(&mut self, token: AttemptToken, outcome: ClassificationOutcome) -> bool {
        if self.status != SessionStatus::Running || !self.token_is_current(token) {
            debug!("discarding classification outcome for stale attempt");
            return false;
        }
        self.pending = Some(outcome);
        true
    }

    /// Abort the attempt with a retryable error, returning to idle.
    ///
    /// Distinct from a `NoMountain` outcome: no outcome is produced, and
    /// the aborted attempt leaves no side effects behind.
    pub fn fail(&mut self, token: AttemptToken, error: LocationError) -> bool {
        if self.status != SessionStatus::Running || !self.token_is_current(token) {
            return false;
        }
        warn!("detection attempt failed: {error}");
        self.reset();
        self.error = Some(error);
        true
    }

    /// Advance the machine. Flips `Running → Resolved` once the
    /// presentation window has elapsed *and* an outcome is pending.
    pub fn poll(&mut self, now: Instant) -> SessionStatus {
        if self.status == SessionStatus::Running && self.pending.is_some() {
            let elapsed_window = self
                .started_at
                .map(|t| now.duration_since(t) >= self.config.presentation_window)
                .unwrap_or(false);
            if elapsed_window {
                self.status = SessionStatus::Resolved;
            }
        }
        self.status
    }

    /// The resolved outcome, if any. Present only while `Resolved`.
    pub fn outcome(&self) -> Option<&ClassificationOutcome> {
        match self.status {
            SessionStatus::Resolved => self.pending.as_ref(),
            _ => None,
        }
    }

    /// Consume the resolved outcome and reset to idle. The outcome is
    /// surfaced exactly once.
    pub fn take_outcome(&mut self) -> Option<ClassificationOutcome> {
        if self.status != SessionStatus::Resolved {
            return None;
        }
        let outcome = self.pending.take();
        self.reset();
        outcome
    }

    /// Dismiss the session from any state. Pending work is discarded and
    /// in-flight continuations become stale.
    pub fn cancel(&mut self) {
        self.reset();
        self.error = None;
    }

    /// The error from the last failed attempt, cleared on the next trigger.
    pub fn last_error(&self) -> Option<&LocationError> {
        self.error.as_ref()
    }

    fn reset(&mut self) {
        // Bumping the attempt invalidates any token still in flight.
        self.attempt += 1;
        self.status = SessionStatus::Idle;
        self.started_at = None;
        self.pending = None;
    }
}

// ── Attempt coordinator ─────────────────────────────────────────────────────

/// Run one detection attempt: permission → position fix → classification.
///
/// This is the cooperative single-threaded flow; the caller keeps polling
/// the session afterwards until the presentation window lets the outcome
/// through. Returns the attempt token, or `None` when the trigger was
/// dropped because a session was already running.
pub fn run_detection(
    session: &mut DetectionSession,
    provider: &mut dyn GeolocationProvider,
    catalog: &PeakCatalog,
    classifier: &PeakProximityClassifier,
    now: Instant,
) -> Option<AttemptToken> {
    let token = session.trigger(now)?;

    if provider.request_permission() == PermissionStatus::Denied {
        session.fail(token, LocationError::PermissionDenied);
        return Some(token);
    }

    let accuracy = session.config.fix_accuracy;
    let timeout = session.config.fix_timeout;
    match provider.current_position(accuracy, timeout) {
        Ok(fix) => {
            let outcome = classifier.classify(catalog, &fix);
            session.complete(token, outcome);
        }
        Err(err) => {
            session.fail(token, err);
        }
    }
    Some(token)
}
