//! The session aggregate: map image, grid, fog, markers and the transient
//! interaction state that never reaches the durable store.

use base64::Engine as _;
use fogmap_common::models::{CellPos, ImageSize, Marker, Mode, PendingMarker, Phase, Rect};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    fog::{FogState, GridDims, MAX_DIM},
    geometry::{pixel_to_cell, pixel_to_percent},
    markers::MarkerStore,
};

/// A request that makes no sense in the current state. These are never
/// surfaced to the user; the request is dropped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("declared type {0:?} is not an image")]
    NotAnImage(String),
    #[error("image upload is empty")]
    EmptyImage,
    #[error("no image has finished loading")]
    ImageNotReady,
    #[error("image size {0}x{1} is not usable")]
    InvalidImageSize(u32, u32),
    #[error("click is outside the map")]
    OutsideMap,
    #[error("no marker position is waiting to be saved")]
    NoPendingMarker,
    #[error("marker {0} does not exist")]
    UnknownMarker(u64),
    #[error("no delete is waiting for confirmation")]
    NoPendingDelete,
    #[error("no marker ids are left to issue")]
    MarkerIdsExhausted,
}

/// Media type of a declared content type, if it names an image.
pub fn image_mime(content_type: &str) -> Option<String> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    (mime.starts_with("image/") && mime.len() > "image/".len()).then_some(mime)
}

/// Encodes an uploaded file as the opaque image reference stored in the session.
pub fn encode_image(content_type: &str, bytes: &[u8]) -> Result<String, UsageError> {
    let mime =
        image_mime(content_type).ok_or_else(|| UsageError::NotAnImage(content_type.to_string()))?;
    if bytes.is_empty() {
        return Err(UsageError::EmptyImage);
    }
    Ok(format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    ))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    /// Reveal mode; number of newly revealed cells.
    Revealed(usize),
    /// Check mode; a marker position now waits for the dialog.
    Pending(PendingMarker),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    image_ref: Option<String>,
    dims: GridDims,
    fog: FogState,
    markers: MarkerStore,
    mode: Mode,
    radius: u32,
    pending_marker: Option<PendingMarker>,
    pending_delete: Option<u64>,
    image_size: Option<ImageSize>,
}

impl SessionState {
    /// Builds a session from durable parts. Transient state starts fresh.
    pub fn from_parts(
        image_ref: Option<String>,
        dims: GridDims,
        fog: FogState,
        markers: MarkerStore,
    ) -> Self {
        Self {
            image_ref,
            dims,
            fog,
            markers,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        match (&self.image_ref, self.image_size) {
            (None, _) => Phase::Empty,
            (Some(_), None) => Phase::Loading,
            (Some(_), Some(_)) => Phase::Active,
        }
    }

    /// Replaces the map. The old fog no longer means anything for a new
    /// image, so revealed cells are cleared; markers are kept.
    pub fn load_image(&mut self, image_ref: String) {
        info!(
            "Loading new map image ({} bytes encoded), clearing {} revealed cells",
            image_ref.len(),
            self.fog.revealed().len()
        );
        self.fog.reset_all();
        self.image_ref = Some(image_ref);
        self.image_size = None;
        self.pending_marker = None;
        self.pending_delete = None;
    }

    /// Completion of the image decode; the only way into `Phase::Active`.
    pub fn image_loaded(&mut self, size: ImageSize) -> Result<(), UsageError> {
        if self.image_ref.is_none() {
            return Err(UsageError::ImageNotReady);
        }
        if size.width == 0 || size.height == 0 {
            return Err(UsageError::InvalidImageSize(size.width, size.height));
        }
        debug!("Image decoded at {}x{}", size.width, size.height);
        self.image_size = Some(size);
        Ok(())
    }

    /// Changes the grid size. Revealed cells outside the new bounds are kept
    /// but not rendered, and come back if the grid grows again.
    pub fn set_dims(&mut self, dims: GridDims) -> bool {
        if self.dims == dims {
            return false;
        }
        info!(
            "Grid changed from {}x{} to {}x{}",
            self.dims.cols(),
            self.dims.rows(),
            dims.cols(),
            dims.rows()
        );
        self.dims = dims;
        true
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn set_radius(&mut self, radius: i64) {
        self.radius = radius.clamp(0, i64::from(MAX_DIM)) as u32;
    }

    pub fn set_view_all(&mut self, enabled: bool) {
        self.fog.set_view_all(enabled);
    }

    /// Routes a map click according to the current mode.
    pub fn click(&mut self, px: f64, py: f64, rect: &Rect) -> Result<ClickOutcome, UsageError> {
        if self.phase() != Phase::Active {
            return Err(UsageError::ImageNotReady);
        }
        match self.mode {
            Mode::Reveal => {
                let (i, j) = pixel_to_cell(px, py, rect, self.dims.cols(), self.dims.rows())
                    .filter(|&(i, j)| self.dims.contains(i, j))
                    .ok_or(UsageError::OutsideMap)?;
                let added = self.fog.reveal_radius(i, j, self.radius, self.dims);
                debug!("Revealed {} new cells around ({}, {})", added, i, j);
                Ok(ClickOutcome::Revealed(added))
            }
            Mode::Check => {
                let (x, y) = pixel_to_percent(px, py, rect).ok_or(UsageError::OutsideMap)?;
                let pending = PendingMarker { x, y };
                self.pending_marker = Some(pending);
                Ok(ClickOutcome::Pending(pending))
            }
        }
    }

    /// Turns the pending position into a marker; called when the dialog is saved.
    pub fn save_pending_marker(&mut self, name: &str, check: &str) -> Result<Marker, UsageError> {
        let pending = self
            .pending_marker
            .take()
            .ok_or(UsageError::NoPendingMarker)?;
        let Some(marker) = self.markers.add(pending.x, pending.y, name, check) else {
            self.pending_marker = Some(pending);
            return Err(UsageError::MarkerIdsExhausted);
        };
        info!(
            "Placed marker {} {:?} at ({:.1}%, {:.1}%)",
            marker.id, marker.name, marker.x, marker.y
        );
        Ok(marker)
    }

    /// Drops the pending position; returns whether there was one.
    pub fn cancel_pending_marker(&mut self) -> bool {
        self.pending_marker.take().is_some()
    }

    /// First half of a delete: remember which marker awaits confirmation.
    pub fn request_delete(&mut self, id: u64) -> Result<(), UsageError> {
        if self.markers.get(id).is_none() {
            return Err(UsageError::UnknownMarker(id));
        }
        self.pending_delete = Some(id);
        Ok(())
    }

    /// Second half of a delete. Returns `Some(id)` when a marker was removed.
    pub fn resolve_delete(&mut self, approved: bool) -> Result<Option<u64>, UsageError> {
        let id = self
            .pending_delete
            .take()
            .ok_or(UsageError::NoPendingDelete)?;
        if approved && self.markers.remove(id) {
            info!("Deleted marker {}", id);
            Ok(Some(id))
        } else {
            Ok(None)
        }
    }

    /// Back to an empty session. The grid size and interaction settings survive.
    pub fn reset(&mut self) {
        info!("Resetting session");
        self.image_ref = None;
        self.image_size = None;
        self.fog.reset_all();
        self.markers = MarkerStore::default();
        self.pending_marker = None;
        self.pending_delete = None;
    }

    pub fn image_ref(&self) -> Option<&str> {
        self.image_ref.as_deref()
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn fog(&self) -> &FogState {
        &self.fog
    }

    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn pending_marker(&self) -> Option<PendingMarker> {
        self.pending_marker
    }

    pub fn pending_delete(&self) -> Option<u64> {
        self.pending_delete
    }

    pub fn is_visible(&self, pos: &CellPos) -> bool {
        self.fog.is_visible(pos)
    }
}
