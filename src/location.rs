//! The geolocation boundary.
//!
//! Position fixes come from a platform service that can be denied, time
//! out, or simply fail. `GeolocationProvider` is the seam the detection
//! session and certificate composer talk to; tests script it with fakes.

use std::time::Duration;

use thiserror::Error;

use crate::geo::Coordinate;

/// Result of a permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Requested fix quality. Maps onto the platform's accuracy classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyHint {
    /// Fastest fix the platform will hand out.
    Coarse,
    /// Highest accuracy; used for detection.
    Highest,
    /// Navigation-grade; used when resolving certificate context.
    BestForNavigation,
}

/// Why a position fix could not be produced.
///
/// All of these are recoverable: the session returns to idle and the
/// attempt can be retried without side effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("no position fix within {0:?}")]
    Timeout(Duration),
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

/// Platform location service.
///
/// `current_position` blocks (cooperatively) up to `timeout` for a fix.
/// Implementations report altitude when the device provides one; callers
/// must tolerate its absence.
pub trait GeolocationProvider {
    fn request_permission(&mut self) -> PermissionStatus;

    fn current_position(
        &mut self,
        accuracy: AccuracyHint,
        timeout: Duration,
    ) -> Result<Coordinate, LocationError>;
}
