use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{CellPos, CellRect, Marker, Mode, PendingMarker, Phase, Rect};

/// Input events routed from the front end into the session.
#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "action")]
pub enum ClientMessage {
    /// Click at client pixel `(x, y)` with the map's rendered bounding box.
    #[serde(rename = "click")]
    Click { x: f64, y: f64, rect: Rect },
    /// The browser finished decoding the current image.
    #[serde(rename = "image_loaded")]
    ImageLoaded { width: u32, height: u32 },
    /// Raw grid inputs; anything unparsable falls back to the defaults.
    #[serde(rename = "set_grid")]
    SetGrid { cols: Value, rows: Value },
    #[serde(rename = "set_mode")]
    SetMode { mode: Mode },
    #[serde(rename = "set_radius")]
    SetRadius { radius: i64 },
    #[serde(rename = "set_view_all")]
    SetViewAll { enabled: bool },
    #[serde(rename = "save_marker")]
    SaveMarker {
        #[serde(default)]
        name: String,
        #[serde(default)]
        check: String,
    },
    #[serde(rename = "cancel_marker")]
    CancelMarker,
    #[serde(rename = "request_delete")]
    RequestDelete { id: u64 },
    #[serde(rename = "resolve_delete")]
    ResolveDelete { approved: bool },
    #[serde(rename = "reset")]
    Reset,
    #[serde(rename = "roll")]
    Roll { count: i64, sides: i64 },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CellView {
    pub pos: CellPos,
    pub rect: CellRect,
    pub visible: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MarkerView {
    /// 1-based position in creation order, as shown to the user.
    pub index: usize,
    #[serde(flatten)]
    pub marker: Marker,
}

/// A delete waiting on the confirmation collaborator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PendingDelete {
    pub id: u64,
    pub index: usize,
    pub name: String,
}

/// Everything a front end needs to draw the session; rebuilt from scratch on every change.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub phase: Phase,
    pub image_ref: Option<String>,
    pub cols: u32,
    pub rows: u32,
    pub mode: Mode,
    pub radius: u32,
    pub view_all: bool,
    pub revealed_count: usize,
    pub cells: Vec<CellView>,
    pub markers: Vec<MarkerView>,
    pub pending_marker: Option<PendingMarker>,
    pub pending_delete: Option<PendingDelete>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "view")]
    View { view: SessionView },
    #[serde(rename = "dice")]
    Dice {
        count: u32,
        sides: u32,
        rolls: Vec<u32>,
        total: u32,
    },
}
