//! Conversion between the session and its durable record.
//!
//! Loading is deliberately forgiving: the record may have been edited by hand
//! or written by an older version. Every field is checked on its own, a field
//! that fails the check keeps its default and never spoils the others.

use std::collections::{BTreeMap, HashSet};

use fogmap_common::models::{CellPos, Marker};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::{
    fog::{DEFAULT_COLS, DEFAULT_ROWS, FogState, GridDims, MAX_DIM},
    markers::{DEFAULT_MARKER_NAME, MarkerStore},
    session::SessionState,
    store::{KeyValueStore, StoreError},
};

/// Key the whole session lives under.
pub const SESSION_KEY: &str = "fogmap.session.v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub image_ref: Option<String>,
    pub cols: u32,
    pub rows: u32,
    pub revealed: BTreeMap<String, bool>,
    pub markers: Vec<Marker>,
    pub next_marker_id: u64,
}

/// Durable part of the session only; mode, radius, view-all and pending
/// dialogs are left out.
pub fn serialize(session: &SessionState) -> SessionRecord {
    SessionRecord {
        image_ref: session.image_ref().map(str::to_string),
        cols: session.dims().cols(),
        rows: session.dims().rows(),
        revealed: session
            .fog()
            .revealed()
            .iter()
            .map(|pos| (pos.key(), true))
            .collect(),
        markers: session.markers().list().to_vec(),
        next_marker_id: session.markers().next_id(),
    }
}

pub fn deserialize(value: &Value) -> SessionState {
    let Some(obj) = value.as_object() else {
        warn!("Stored session is not an object, starting fresh");
        return SessionState::default();
    };

    let image_ref = match obj.get("imageRef") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.starts_with("data:image/") => Some(s.clone()),
        Some(other) => {
            reject("imageRef", other);
            None
        }
    };

    let dims = GridDims::new(
        integer_field(obj, "cols").unwrap_or(i64::from(DEFAULT_COLS)),
        integer_field(obj, "rows").unwrap_or(i64::from(DEFAULT_ROWS)),
    );

    let fog = match obj.get("revealed") {
        None => FogState::default(),
        Some(Value::Object(cells)) => FogState::with_revealed(parse_revealed(cells)),
        Some(other) => {
            reject("revealed", other);
            FogState::default()
        }
    };

    let markers = match obj.get("markers") {
        None => Vec::new(),
        Some(Value::Array(entries)) => parse_markers(entries),
        Some(other) => {
            reject("markers", other);
            Vec::new()
        }
    };

    let next_id = integer_field(obj, "nextMarkerId")
        .filter(|&id| id > 0)
        .map_or(1, |id| id as u64);

    SessionState::from_parts(image_ref, dims, fog, MarkerStore::from_parts(markers, next_id))
}

fn reject(field: &str, value: &Value) {
    warn!("Ignoring stored {}: unexpected value {}", field, truncate(value));
}

fn truncate(value: &Value) -> String {
    let mut text = value.to_string();
    if text.len() > 64 {
        let cut = (0..=64).rev().find(|&i| text.is_char_boundary(i)).unwrap_or(0);
        text.truncate(cut);
        text.push('…');
    }
    text
}

fn integer_field(obj: &Map<String, Value>, field: &str) -> Option<i64> {
    let value = obj.get(field)?;
    let parsed = value.as_i64();
    if parsed.is_none() {
        reject(field, value);
    }
    parsed
}

fn parse_revealed(cells: &Map<String, Value>) -> Vec<CellPos> {
    let mut skipped = 0;
    let revealed: Vec<CellPos> = cells
        .iter()
        .filter_map(|(key, flag)| {
            let pos = key
                .parse::<CellPos>()
                .ok()
                .filter(|pos| pos.i < MAX_DIM && pos.j < MAX_DIM && flag == &Value::Bool(true));
            if pos.is_none() {
                skipped += 1;
            }
            pos
        })
        .collect();
    if skipped > 0 {
        warn!("Skipped {} malformed revealed cells", skipped);
    }
    revealed
}

fn parse_markers(entries: &[Value]) -> Vec<Marker> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter_map(|entry| {
            let marker = parse_marker(entry).filter(|m| seen.insert(m.id));
            if marker.is_none() {
                reject("marker", entry);
            }
            marker
        })
        .collect()
}

fn parse_marker(entry: &Value) -> Option<Marker> {
    let obj = entry.as_object()?;
    let id = obj.get("id")?.as_u64().filter(|&id| id > 0 && id < u64::MAX)?;
    let x = obj.get("x")?.as_f64().filter(|x| x.is_finite())?;
    let y = obj.get("y")?.as_f64().filter(|y| y.is_finite())?;
    let name = obj.get("name")?.as_str()?.trim();
    let check = obj.get("check").and_then(Value::as_str).unwrap_or_default();
    Some(Marker {
        id,
        x: x.clamp(0.0, 100.0),
        y: y.clamp(0.0, 100.0),
        name: if name.is_empty() {
            DEFAULT_MARKER_NAME.to_string()
        } else {
            name.to_string()
        },
        check: check.trim().to_string(),
    })
}

/// Parses a raw stored string; anything unreadable yields a fresh session.
pub fn parse_record(raw: &str) -> SessionState {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => deserialize(&value),
        Err(e) => {
            warn!("Stored session is not valid JSON ({}), starting fresh", e);
            SessionState::default()
        }
    }
}

#[instrument(level = "trace", skip(store))]
pub fn load(store: &dyn KeyValueStore) -> SessionState {
    match store.get(SESSION_KEY) {
        Ok(Some(raw)) => {
            let session = parse_record(&raw);
            info!(
                "Restored session: {}x{} grid, {} revealed cells, {} markers, image {}",
                session.dims().cols(),
                session.dims().rows(),
                session.fog().revealed().len(),
                session.markers().list().len(),
                if session.image_ref().is_some() { "present" } else { "absent" }
            );
            session
        }
        Ok(None) => {
            info!("No saved session, starting fresh");
            SessionState::default()
        }
        Err(e) => {
            warn!("Could not read saved session: {}", e);
            SessionState::default()
        }
    }
}

#[instrument(level = "trace", skip(store, session))]
pub fn save(store: &mut dyn KeyValueStore, session: &SessionState) -> Result<(), StoreError> {
    let raw = serde_json::to_string(&serialize(session))?;
    store.set(SESSION_KEY, &raw)?;
    debug!("Saved session ({} bytes)", raw.len());
    Ok(())
}
