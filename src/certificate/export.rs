//! Export of the rendered certificate artifact.
//!
//! Share and save are independent, mutually-exclusive-by-intent
//! operations against the platform (`ExportGateway`). Each is guarded by
//! its own in-flight flag: a second request while one is pending is a
//! no-op, and the flag is released on every path (success, gateway
//! failure, user cancellation) so a failed attempt never blocks a retry.
//! Errors are reported as values; nothing throws across the pipeline
//! boundary.

use std::path::Path;

use thiserror::Error;
use tracing::warn;

use crate::location::PermissionStatus;

use super::Certificate;

/// Album the platform save targets.
pub const ALBUM_NAME: &str = "Summit Certificates";

/// Identifier of a saved media asset, as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetId(pub String);

/// Share-sheet result: the user either completed or dismissed the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Completed,
    Cancelled,
}

/// Metadata attached to the platform share sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareMetadata {
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("storage permission denied")]
    PermissionDenied,
    #[error("certificate has no rendered artifact to export")]
    MissingArtifact,
    #[error("platform export failed: {0}")]
    Gateway(String),
}

/// Platform share/save surface.
pub trait ExportGateway {
    fn request_storage_permission(&mut self) -> PermissionStatus;

    /// Persist the artifact into the given album, returning the created
    /// asset's id.
    fn save(&mut self, artifact: &Path, album: &str) -> Result<AssetId, ExportError>;

    /// Open the platform share sheet for the artifact.
    fn share(
        &mut self,
        artifact: &Path,
        metadata: &ShareMetadata,
    ) -> Result<ShareOutcome, ExportError>;
}

// ── In-flight guards ────────────────────────────────────────────────────────

/// Proof that a share operation was begun. Consumed by `finish_share`.
#[derive(Debug)]
#[must_use = "finish_share must consume the ticket to release the guard"]
pub struct ShareTicket(());

/// Proof that a save operation was begun. Consumed by `finish_save`.
#[derive(Debug)]
#[must_use = "finish_save must consume the ticket to release the guard"]
pub struct SaveTicket(());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareResult {
    Shared,
    Cancelled,
    /// Another share is pending; nothing was initiated.
    InFlight,
    Failed(ExportError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveResult {
    Saved(AssetId),
    /// Another save is pending; nothing was initiated.
    InFlight,
    Failed(ExportError),
}

/// Serializes share and save against themselves.
///
/// The two-phase `begin_*`/`finish_*` surface models the asynchronous
/// platform call; the `share`/`save` wrappers drive a whole synchronous
/// round and always release the guard.
#[derive(Debug, Default)]
pub struct ExportController {
    sharing: bool,
    saving: bool,
}

impl ExportController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_sharing(&self) -> bool {
        self.sharing
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Claim the share guard. `None` while a share is already pending.
    pub fn begin_share(&mut self) -> Option<ShareTicket> {
        if self.sharing {
            return None;
        }
        self.sharing = true;
        Some(ShareTicket(()))
    }

    pub fn finish_share(&mut self, _ticket: ShareTicket) {
        self.sharing = false;
    }

    /// Claim the save guard. `None` while a save is already pending.
    pub fn begin_save(&mut self) -> Option<SaveTicket> {
        if self.saving {
            return None;
        }
        self.saving = true;
        Some(SaveTicket(()))
    }

    pub fn finish_save(&mut self, _ticket: SaveTicket) {
        self.saving = false;
    }

    /// Share the rendered artifact through the platform sheet.
    pub fn share(
        &mut self,
        gateway: &mut dyn ExportGateway,
        certificate: &Certificate,
        metadata: &ShareMetadata,
    ) -> ShareResult {
        let Some(ticket) = self.begin_share() else {
            return ShareResult::InFlight;
        };
        let result = perform_share(gateway, certificate, metadata);
        self.finish_share(ticket);
        match result {
            Ok(ShareOutcome::Completed) => ShareResult::Shared,
            Ok(ShareOutcome::Cancelled) => ShareResult::Cancelled,
            Err(err) => {
                warn!("certificate share failed: {err}");
                ShareResult::Failed(err)
            }
        }
    }

    /// Save the rendered artifact to the platform gallery.
    pub fn save(&mut self, gateway: &mut dyn ExportGateway, certificate: &Certificate) -> SaveResult {
        let Some(ticket) = self.begin_save() else {
            return SaveResult::InFlight;
        };
        let result = perform_save(gateway, certificate);
        self.finish_save(ticket);
        match result {
            Ok(asset) => SaveResult::Saved(asset),
            Err(err) => {
                warn!("certificate save failed: {err}");
                SaveResult::Failed(err)
            }
        }
    }
}

fn perform_share(
    gateway: &mut dyn ExportGateway,
    certificate: &Certificate,
    metadata: &ShareMetadata,
) -> Result<ShareOutcome, ExportError> {
    let artifact = certificate
        .artifact_uri
        .as_deref()
        .ok_or(ExportError::MissingArtifact)?;
    gateway.share(artifact, metadata)
}

fn perform_save(
    gateway: &mut dyn ExportGateway,
    certificate: &Certificate,
) -> Result<AssetId, ExportError> {
    let artifact = certificate
        .artifact_uri
        .as_deref()
        .ok_or(ExportError::MissingArtifact)?;
    if gateway.request_storage_permission() == PermissionStatus::Denied {
        return Err(ExportError::PermissionDenied);
    }
    gateway.save(artifact, ALBUM_NAME)
}
