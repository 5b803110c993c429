//! Certificate composition.
//!
//! After a summited/climbing outcome and a photo capture, a `Certificate`
//! record is assembled from the matched peak, the capture timestamp, and
//! the detection coordinates. A second, independent position fix then
//! resolves the display context: the device altitude, converted to feet.
//! Rendering and export live in the submodules.

pub mod export;
pub mod render;

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::geo::Coordinate;
use crate::location::{AccuracyHint, GeolocationProvider, LocationError, PermissionStatus};
use crate::peak::Peak;

use export::ShareMetadata;

/// Meters to feet.
pub const FEET_PER_METER: f64 = 3.28084;

/// Convert a device altitude in meters to whole feet.
pub fn meters_to_feet(meters: f64) -> i32 {
    (meters * FEET_PER_METER).round() as i32
}

/// A summit certificate, derived per session and never persisted.
///
/// `artifact_uri` is filled in by the renderer once the context has
/// resolved; it is recomputed (not appended) if the coordinate or photo
/// change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Certificate {
    pub holder_name: String,
    pub peak_name: String,
    /// Display elevation from the catalog record, e.g. "14,158 ft".
    pub peak_elevation: String,
    pub summit_date: DateTime<Utc>,
    /// The detection fix. Context resolution contributes altitude only;
    /// the displayed coordinates stay pinned to where detection happened.
    pub coordinate: Coordinate,
    /// Device altitude in feet, or 0 when no altitude was available.
    pub elevation_feet: i32,
    pub photo_uri: PathBuf,
    pub artifact_uri: Option<PathBuf>,
}

impl Certificate {
    /// Date as printed on the certificate, `DD/MM/YYYY`.
    pub fn formatted_date(&self) -> String {
        self.summit_date.format("%d/%m/%Y").to_string()
    }

    /// The elevation-and-coordinates line, e.g.
    /// `3281 ft  |  40.0000, -105.0000`.
    pub fn details_line(&self) -> String {
        format!(
            "{} ft  |  {:.4}, {:.4}",
            self.elevation_feet, self.coordinate.latitude, self.coordinate.longitude
        )
    }
}

/// How the certificate's elevation was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextResolution {
    /// Fresh fix included a device altitude.
    GpsAltitude,
    /// Fell back to the default elevation of 0. Carries the reason when
    /// the fix itself failed (permission, timeout, unavailable); `None`
    /// when the fix succeeded but reported no altitude.
    Fallback(Option<LocationError>),
}

#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Name printed in the "certifies that" section.
    pub holder_name: String,
    /// Budget for the context fix.
    pub context_fix_timeout: Duration,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            holder_name: "SUMMITER".to_string(),
            context_fix_timeout: Duration::from_secs(10),
        }
    }
}

/// Assembles certificate records and resolves their display context.
#[derive(Debug, Clone, Default)]
pub struct CertificateComposer {
    pub config: ComposerConfig,
}

impl CertificateComposer {
    pub fn new(config: ComposerConfig) -> Self {
        Self { config }
    }

    /// Assemble a certificate from the matched peak, the captured photo,
    /// and the detection fix. Elevation starts at the default 0 until
    /// [`resolve_context`](Self::resolve_context) runs.
    pub fn compose(
        &self,
        peak: &Peak,
        photo_uri: PathBuf,
        detection_fix: Coordinate,
        captured_at: DateTime<Utc>,
    ) -> Certificate {
        Certificate {
            holder_name: self.config.holder_name.clone(),
            peak_name: peak.name.clone(),
            peak_elevation: peak.elevation.clone(),
            summit_date: captured_at,
            coordinate: detection_fix,
            elevation_feet: 0,
            photo_uri,
            artifact_uri: None,
        }
    }

    /// Fetch a fresh fix and fill in the device elevation.
    ///
    /// Never fails across the pipeline boundary: permission denial, fix
    /// errors, and missing altitude all fall back to an elevation of 0 and
    /// the certificate flow continues.
    pub fn resolve_context(
        &self,
        certificate: &mut Certificate,
        provider: &mut dyn GeolocationProvider,
    ) -> ContextResolution {
        if provider.request_permission() == PermissionStatus::Denied {
            certificate.elevation_feet = 0;
            return ContextResolution::Fallback(Some(LocationError::PermissionDenied));
        }

        match provider.current_position(
            AccuracyHint::BestForNavigation,
            self.config.context_fix_timeout,
        ) {
            Ok(fix) => match fix.altitude_m {
                Some(altitude_m) => {
                    certificate.elevation_feet = meters_to_feet(altitude_m);
                    debug!(
                        "context resolved: altitude {altitude_m:.1} m -> {} ft",
                        certificate.elevation_feet
                    );
                    ContextResolution::GpsAltitude
                }
                None => {
                    certificate.elevation_feet = 0;
                    ContextResolution::Fallback(None)
                }
            },
            Err(err) => {
                certificate.elevation_feet = 0;
                ContextResolution::Fallback(Some(err))
            }
        }
    }

    /// Platform share-sheet metadata for the certificate.
    pub fn share_metadata(&self, certificate: &Certificate) -> ShareMetadata {
        ShareMetadata {
            title: format!("{} Summit Certificate", certificate.peak_name),
            message: format!(
                "I successfully reached the summit of {} ({})!",
                certificate.peak_name, certificate.peak_elevation
            ),
        }
    }
}
