//! Property tests for the grid, fog and persistence laws.
//!
//! 1. Cell keys are unique over the largest grid.
//! 2. A point inside a cell's rectangle maps back to that cell.
//! 3. Radius 0 reveals exactly one cell; any reveal is idempotent.
//! 4. Revealed cells stay visible whatever the view-all switch does.
//! 5. Marker ids strictly increase and are never reused.
//! 6. Saving and loading reproduces the durable session.
//! 7. Loading a tampered record never panics and keeps the id counter ahead.

use std::collections::HashSet;

use fogmap_common::models::{CellPos, Rect};
use fogmap_server::{
    fog::{FogState, GridDims, MAX_DIM, MIN_DIM},
    geometry::{cell_rect, pixel_to_cell},
    markers::MarkerStore,
    persistence::{deserialize, parse_record, serialize},
    session::SessionState,
};
use proptest::prelude::*;
use serde_json::{Value, json};

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_dims() -> impl Strategy<Value = GridDims> {
    (MIN_DIM..=MAX_DIM, MIN_DIM..=MAX_DIM).prop_map(|(c, r)| GridDims::new(c.into(), r.into()))
}

fn arb_cell() -> impl Strategy<Value = CellPos> {
    (0..MAX_DIM, 0..MAX_DIM).prop_map(|(i, j)| CellPos::new(i, j))
}

#[derive(Debug, Clone)]
enum MarkerOp {
    Add { x: f64, y: f64, name: String, check: String },
    Remove(usize),
}

fn arb_marker_op() -> impl Strategy<Value = MarkerOp> {
    prop_oneof![
        3 => (0.0..=100.0f64, 0.0..=100.0f64, "[A-Za-z ]{0,12}", "[A-Za-z0-9 ]{0,12}")
            .prop_map(|(x, y, name, check)| MarkerOp::Add { x, y, name, check }),
        1 => (0usize..8).prop_map(MarkerOp::Remove),
    ]
}

fn arb_session() -> impl Strategy<Value = SessionState> {
    (
        prop::option::of("[A-Za-z0-9+/]{4,32}"),
        arb_dims(),
        prop::collection::vec(arb_cell(), 0..40),
        prop::collection::vec(arb_marker_op(), 0..20),
    )
        .prop_map(|(image, dims, cells, ops)| {
            let mut markers = MarkerStore::default();
            for op in ops {
                match op {
                    MarkerOp::Add { x, y, name, check } => {
                        markers.add(x, y, &name, &check);
                    }
                    MarkerOp::Remove(nth) => {
                        if let Some(id) = markers.list().get(nth).map(|m| m.id) {
                            markers.remove(id);
                        }
                    }
                }
            }
            SessionState::from_parts(
                image.map(|b64| format!("data:image/png;base64,{b64}")),
                dims,
                FogState::with_revealed(cells),
                markers,
            )
        })
}

/// Any JSON scalar a hand-edited record might hold in a numeric field.
fn arb_loose_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        prop_oneof![Just(u64::MAX), Just(u64::MAX - 1), 1u64..64].prop_map(Value::from),
        any::<f64>().prop_map(Value::from),
        "[a-z0-9 ]{0,8}".prop_map(Value::from),
        Just(Value::Null),
    ]
}

fn arb_stored_marker() -> impl Strategy<Value = Value> {
    (
        arb_loose_scalar(),
        arb_loose_scalar(),
        arb_loose_scalar(),
        prop_oneof![".{0,10}".prop_map(Value::from), Just(Value::Null)],
    )
        .prop_map(|(id, x, y, name)| json!({ "id": id, "x": x, "y": y, "name": name }))
}

fn arb_stored_record() -> impl Strategy<Value = Value> {
    (
        arb_loose_scalar(),
        arb_loose_scalar(),
        arb_loose_scalar(),
        prop::collection::vec(arb_stored_marker(), 0..8),
        prop::collection::btree_map("[0-9,x-]{0,6}", any::<bool>(), 0..8),
    )
        .prop_map(|(cols, rows, next, markers, revealed)| {
            json!({
                "cols": cols,
                "rows": rows,
                "nextMarkerId": next,
                "markers": markers,
                "revealed": revealed,
            })
        })
}

// ── Geometry ──────────────────────────────────────────────────────────

#[test]
fn cell_keys_are_unique() {
    let keys: HashSet<String> = GridDims::new(MAX_DIM.into(), MAX_DIM.into())
        .cells()
        .map(|pos| pos.key())
        .collect();
    assert_eq!(keys.len(), (MAX_DIM * MAX_DIM) as usize);
}

proptest! {
    #[test]
    fn point_inside_cell_maps_back(
        dims in arb_dims(),
        ci in 0u32..MAX_DIM,
        cj in 0u32..MAX_DIM,
        fx in 0.05f64..0.95,
        fy in 0.05f64..0.95,
        left in -500.0f64..500.0,
        top in -500.0f64..500.0,
        width in 50.0f64..4000.0,
        height in 50.0f64..4000.0,
    ) {
        let i = ci % dims.cols();
        let j = cj % dims.rows();
        let rect = Rect { left, top, width, height };
        let cell = cell_rect(i, j, dims.cols(), dims.rows());
        let px = left + (cell.left_pct + fx * cell.width_pct) / 100.0 * width;
        let py = top + (cell.top_pct + fy * cell.height_pct) / 100.0 * height;

        prop_assert_eq!(
            pixel_to_cell(px, py, &rect, dims.cols(), dims.rows()),
            Some((i64::from(i), i64::from(j)))
        );
    }

    // ── Fog ──────────────────────────────────────────────────────────

    #[test]
    fn radius_zero_reveals_one_cell(dims in arb_dims(), ci in 0u32..MAX_DIM, cj in 0u32..MAX_DIM) {
        let (i, j) = (ci % dims.cols(), cj % dims.rows());
        let mut fog = FogState::default();
        prop_assert_eq!(fog.reveal_radius(i.into(), j.into(), 0, dims), 1);
        prop_assert_eq!(fog.revealed().len(), 1);
        prop_assert!(fog.is_revealed(&CellPos::new(i, j)));
    }

    #[test]
    fn reveal_is_idempotent_and_square(
        dims in arb_dims(),
        ci in 0u32..MAX_DIM,
        cj in 0u32..MAX_DIM,
        radius in 0u32..6,
    ) {
        let (i, j) = (i64::from(ci % dims.cols()), i64::from(cj % dims.rows()));
        let mut fog = FogState::default();
        fog.reveal_radius(i, j, radius, dims);
        let once = fog.clone();
        prop_assert_eq!(fog.reveal_radius(i, j, radius, dims), 0);
        prop_assert_eq!(&fog, &once);

        let r = i64::from(radius);
        for pos in dims.cells() {
            let inside = (i64::from(pos.i) - i).abs() <= r && (i64::from(pos.j) - j).abs() <= r;
            prop_assert_eq!(fog.is_revealed(&pos), inside);
        }
    }

    #[test]
    fn revealed_cells_stay_visible(
        dims in arb_dims(),
        steps in prop::collection::vec((0u32..MAX_DIM, 0u32..MAX_DIM, 0u32..3, any::<bool>()), 1..30),
    ) {
        let mut fog = FogState::default();
        let mut seen: Vec<CellPos> = Vec::new();
        for (ci, cj, radius, view_all) in steps {
            let (i, j) = (ci % dims.cols(), cj % dims.rows());
            fog.reveal_radius(i.into(), j.into(), radius, dims);
            fog.set_view_all(view_all);
            seen.extend(fog.revealed().iter().copied());
            for pos in &seen {
                prop_assert!(fog.is_visible(pos));
            }
        }
    }

    // ── Markers ─────────────────────────────────────────────────────

    #[test]
    fn marker_ids_never_repeat(ops in prop::collection::vec(arb_marker_op(), 1..40)) {
        let mut store = MarkerStore::default();
        let mut issued: Vec<u64> = Vec::new();
        for op in ops {
            match op {
                MarkerOp::Add { x, y, name, check } => {
                    let marker = store.add(x, y, &name, &check).unwrap();
                    if let Some(&last) = issued.last() {
                        prop_assert!(marker.id > last);
                    }
                    prop_assert!(!marker.name.trim().is_empty());
                    issued.push(marker.id);
                }
                MarkerOp::Remove(nth) => {
                    if let Some(id) = store.list().get(nth).map(|m| m.id) {
                        prop_assert!(store.remove(id));
                        prop_assert!(!store.remove(id));
                    }
                }
            }
        }
    }

    // ── Persistence ─────────────────────────────────────────────────

    #[test]
    fn save_then_load_round_trips(session in arb_session()) {
        let raw = serde_json::to_string(&serialize(&session)).unwrap();
        prop_assert_eq!(parse_record(&raw), session);
    }

    #[test]
    fn loading_never_panics(raw in ".{0,200}") {
        let _ = parse_record(&raw);
    }

    #[test]
    fn tampered_records_load_with_counter_ahead(record in arb_stored_record()) {
        let session = deserialize(&record);
        prop_assert_eq!(&parse_record(&record.to_string()), &session);

        let markers = session.markers();
        for marker in markers.list() {
            prop_assert!(markers.next_id() > marker.id);
        }
        let dims = session.dims();
        prop_assert!((MIN_DIM..=MAX_DIM).contains(&dims.cols()));
        prop_assert!((MIN_DIM..=MAX_DIM).contains(&dims.rows()));
    }
}
