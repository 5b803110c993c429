//! # summitcert
//!
//! Core logic for a summit-tracking app: classify a live GPS position
//! against a catalog of known peaks, and turn a summit moment (photo,
//! coordinates, device altitude) into a rendered, shareable certificate.
//!
//! Platform surfaces (location service, share sheet, media gallery) sit
//! behind traits so the pipeline runs the same everywhere, including under
//! test with scripted fakes.
//!
//! ## Detection flow
//!
//! 1. Load the [`PeakCatalog`] once at startup (an unavailable catalog
//!    degrades to zero candidates, never an error).
//! 2. Trigger a [`DetectionSession`]; [`run_detection`] requests a
//!    position fix and classifies it with [`PeakProximityClassifier`]:
//!    within 50 m of the nearest peak is summited, within 500 m climbing,
//!    otherwise no mountain.
//! 3. Keep polling the session; the outcome stays hidden until the 8 s
//!    presentation window has elapsed, then is consumed exactly once.
//!
//! ## Certificate flow
//!
//! 1. [`CertificateComposer::compose`] assembles the record from the
//!    matched peak, captured photo, and detection fix.
//! 2. [`CertificateComposer::resolve_context`] takes a second, independent
//!    fix for the device altitude (meters → feet; default 0 when
//!    unavailable).
//! 3. [`certificate::render`] rasterizes the fixed template into a PNG
//!    artifact, debounced behind a [`certificate::render::RenderScheduler`].
//! 4. [`certificate::export::ExportController`] shares or saves the
//!    artifact, each operation guarded against re-entrant taps.
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Instant;
//! use summitcert::{
//!     run_detection, DetectionSession, PeakCatalog, PeakProximityClassifier,
//!     SessionConfig, SessionStatus,
//! };
//! # struct DeviceLocation;
//! # impl summitcert::GeolocationProvider for DeviceLocation {
//! #     fn request_permission(&mut self) -> summitcert::PermissionStatus {
//! #         summitcert::PermissionStatus::Granted
//! #     }
//! #     fn current_position(
//! #         &mut self,
//! #         _: summitcert::AccuracyHint,
//! #         _: std::time::Duration,
//! #     ) -> Result<summitcert::Coordinate, summitcert::LocationError> {
//! #         Ok(summitcert::Coordinate::new(40.2549, -105.6160))
//! #     }
//! # }
//!
//! let catalog = PeakCatalog::load_or_empty("data/peaks.json");
//! let classifier = PeakProximityClassifier::default();
//! let mut session = DetectionSession::new(SessionConfig::default());
//! let mut provider = DeviceLocation;
//!
//! run_detection(&mut session, &mut provider, &catalog, &classifier, Instant::now());
//! loop {
//!     if session.poll(Instant::now()) == SessionStatus::Resolved {
//!         let outcome = session.take_outcome().unwrap();
//!         println!("{:?}", outcome.kind);
//!         break;
//!     }
//! }
//! ```

pub mod catalog;
pub mod certificate;
pub mod classifier;
pub mod geo;
pub mod location;
pub mod peak;
pub mod session;

pub use catalog::PeakCatalog;
pub use certificate::{
    meters_to_feet, Certificate, CertificateComposer, ComposerConfig, ContextResolution,
};
pub use classifier::{
    ClassificationOutcome, NearestPeak, OutcomeKind, PeakProximityClassifier, ProximityConfig,
};
pub use geo::{haversine_m, BoundingBox, Coordinate, EARTH_RADIUS_M};
pub use location::{AccuracyHint, GeolocationProvider, LocationError, PermissionStatus};
pub use peak::Peak;
pub use session::{run_detection, AttemptToken, DetectionSession, SessionConfig, SessionStatus};
