use std::collections::BTreeSet;

use fogmap_common::models::CellPos;
use serde_json::Value;
use tracing::debug;

pub const MIN_DIM: u32 = 4;
pub const MAX_DIM: u32 = 24;
pub const DEFAULT_COLS: u32 = 8;
pub const DEFAULT_ROWS: u32 = 6;

/// Grid size, always within `[MIN_DIM, MAX_DIM]` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDims {
    cols: u32,
    rows: u32,
}

impl Default for GridDims {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
        }
    }
}

impl GridDims {
    pub fn new(cols: i64, rows: i64) -> Self {
        Self {
            cols: clamp_dimension(cols),
            rows: clamp_dimension(rows),
        }
    }

    /// Builds dimensions from raw user input, substituting the defaults for anything unparsable.
    pub fn from_input(cols: &Value, rows: &Value) -> Self {
        Self::new(
            parse_dimension(cols, DEFAULT_COLS),
            parse_dimension(rows, DEFAULT_ROWS),
        )
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn contains(&self, i: i64, j: i64) -> bool {
        (0..i64::from(self.cols)).contains(&i) && (0..i64::from(self.rows)).contains(&j)
    }

    pub fn cells(&self) -> impl Iterator<Item = CellPos> + '_ {
        (0..self.rows).flat_map(move |j| (0..self.cols).map(move |i| CellPos::new(i, j)))
    }
}

pub fn clamp_dimension(value: i64) -> u32 {
    value.clamp(i64::from(MIN_DIM), i64::from(MAX_DIM)) as u32
}

/// Reads a dimension the way a number input would: integers, floats
/// (truncated) and numeric strings are accepted, everything else is `default`.
pub fn parse_dimension(value: &Value, default: u32) -> i64 {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        debug!("Unparsable grid dimension {}, using {}", value, default);
        i64::from(default)
    })
}

/// Revealed cells plus the game master's transient view-all switch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FogState {
    revealed: BTreeSet<CellPos>,
    view_all: bool,
}

impl FogState {
    pub fn with_revealed(revealed: impl IntoIterator<Item = CellPos>) -> Self {
        Self {
            revealed: revealed.into_iter().collect(),
            view_all: false,
        }
    }

    /// Reveals the square neighbourhood of `(ci, cj)` clipped to the grid and
    /// returns how many cells were newly revealed.
    ///
    /// The neighbourhood is Chebyshev: radius 1 is a 3x3 block, radius 0 the
    /// clicked cell alone.
    pub fn reveal_radius(&mut self, ci: i64, cj: i64, radius: u32, dims: GridDims) -> usize {
        let r = i64::from(radius);
        let mut added = 0;
        let rows = cj.saturating_sub(r).max(0)..=cj.saturating_add(r).min(i64::from(dims.rows()) - 1);
        let cols = ci.saturating_sub(r).max(0)..=ci.saturating_add(r).min(i64::from(dims.cols()) - 1);
        for j in rows {
            for i in cols.clone() {
                if self.revealed.insert(CellPos::new(i as u32, j as u32)) {
                    added += 1;
                }
            }
        }
        added
    }

    pub fn is_visible(&self, pos: &CellPos) -> bool {
        self.view_all || self.revealed.contains(pos)
    }

    pub fn is_revealed(&self, pos: &CellPos) -> bool {
        self.revealed.contains(pos)
    }

    pub fn set_view_all(&mut self, enabled: bool) {
        self.view_all = enabled;
    }

    pub fn view_all(&self) -> bool {
        self.view_all
    }

    pub fn revealed(&self) -> &BTreeSet<CellPos> {
        &self.revealed
    }

    pub fn reset_all(&mut self) {
        self.revealed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn cells(list: &[(u32, u32)]) -> BTreeSet<CellPos> {
        list.iter().map(|&(i, j)| CellPos::new(i, j)).collect()
    }

    #[test]
    fn dimensions_are_clamped() {
        assert_eq!(GridDims::new(2, 30), GridDims { cols: 4, rows: 24 });
        assert_eq!(GridDims::new(-5, 0), GridDims { cols: 4, rows: 4 });
    }

    #[test]
    fn dimension_input_falls_back_to_defaults() {
        let dims = GridDims::from_input(&json!("nine"), &json!(null));
        assert_eq!((dims.cols(), dims.rows()), (8, 6));

        let dims = GridDims::from_input(&json!(" 12 "), &json!(7.9));
        assert_eq!((dims.cols(), dims.rows()), (12, 7));

        let dims = GridDims::from_input(&json!("100"), &json!([3]));
        assert_eq!((dims.cols(), dims.rows()), (24, 6));
    }

    #[test]
    fn radius_one_reveals_three_by_three() {
        let mut fog = FogState::default();
        let added = fog.reveal_radius(3, 2, 1, GridDims::default());
        assert_eq!(added, 9);
        assert_eq!(
            fog.revealed(),
            &cells(&[
                (2, 1),
                (3, 1),
                (4, 1),
                (2, 2),
                (3, 2),
                (4, 2),
                (2, 3),
                (3, 3),
                (4, 3)
            ])
        );
    }

    #[test]
    fn reveal_is_clipped_at_edges() {
        let mut fog = FogState::default();
        assert_eq!(fog.reveal_radius(0, 0, 1, GridDims::default()), 4);
        assert_eq!(fog.revealed(), &cells(&[(0, 0), (1, 0), (0, 1), (1, 1)]));

        let mut fog = FogState::default();
        assert_eq!(fog.reveal_radius(7, 5, 2, GridDims::default()), 9);
        assert!(fog.revealed().iter().all(|p| p.i >= 5 && p.j >= 3));
    }

    #[test]
    fn radius_zero_reveals_one_cell() {
        let mut fog = FogState::default();
        assert_eq!(fog.reveal_radius(5, 4, 0, GridDims::default()), 1);
        assert_eq!(fog.revealed(), &cells(&[(5, 4)]));
    }

    #[test]
    fn reveal_is_idempotent() {
        let mut fog = FogState::default();
        fog.reveal_radius(3, 2, 1, GridDims::default());
        let once = fog.clone();
        assert_eq!(fog.reveal_radius(3, 2, 1, GridDims::default()), 0);
        assert_eq!(fog, once);
    }

    #[test]
    fn far_off_grid_centres_reveal_nothing() {
        let mut fog = FogState::default();
        let dims = GridDims::default();
        assert_eq!(fog.reveal_radius(i64::MAX, 2, MAX_DIM, dims), 0);
        assert_eq!(fog.reveal_radius(3, i64::MIN, MAX_DIM, dims), 0);
        assert_eq!(fog.reveal_radius(i64::MIN, i64::MAX, 1, dims), 0);
        assert!(fog.revealed().is_empty());
    }

    #[test]
    fn view_all_does_not_touch_revealed() {
        let mut fog = FogState::default();
        fog.reveal_radius(1, 1, 0, GridDims::default());
        fog.set_view_all(true);
        assert!(fog.is_visible(&CellPos::new(6, 5)));
        assert_eq!(fog.revealed().len(), 1);

        fog.set_view_all(false);
        assert!(!fog.is_visible(&CellPos::new(6, 5)));
        assert!(fog.is_visible(&CellPos::new(1, 1)));
    }

    #[test]
    fn reset_hides_everything() {
        let mut fog = FogState::default();
        fog.reveal_radius(3, 3, 3, GridDims::default());
        fog.reset_all();
        assert!(fog.revealed().is_empty());
    }
}
