//! Coordinate math between client pixels, grid cells and overlay percentages.
//!
//! Overlay placement is percentage based, so a resized image only needs a
//! re-render, never a state change.

use fogmap_common::models::{CellRect, Rect};

/// Maps a client pixel to the (column, row) it falls in.
///
/// Points outside `rect` produce indices outside the grid (possibly negative);
/// callers bounds-check before mutating anything. Returns `None` for a
/// degenerate rect, which would otherwise divide by zero.
pub fn pixel_to_cell(px: f64, py: f64, rect: &Rect, cols: u32, rows: u32) -> Option<(i64, i64)> {
    if !(rect.width > 0.0 && rect.height > 0.0) {
        return None;
    }
    let i = ((px - rect.left) / rect.width * f64::from(cols)).floor();
    let j = ((py - rect.top) / rect.height * f64::from(rows)).floor();
    if !i.is_finite() || !j.is_finite() {
        return None;
    }
    Some((i as i64, j as i64))
}

/// Converts a client pixel into a position in percent of the map, clamped to `[0, 100]`.
pub fn pixel_to_percent(px: f64, py: f64, rect: &Rect) -> Option<(f64, f64)> {
    if !(rect.width > 0.0 && rect.height > 0.0) {
        return None;
    }
    let x = (px - rect.left) / rect.width * 100.0;
    let y = (py - rect.top) / rect.height * 100.0;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some((x.clamp(0.0, 100.0), y.clamp(0.0, 100.0)))
}

pub fn cell_rect(i: u32, j: u32, cols: u32, rows: u32) -> CellRect {
    let cols = f64::from(cols);
    let rows = f64::from(rows);
    CellRect {
        left_pct: f64::from(i) / cols * 100.0,
        top_pct: f64::from(j) / rows * 100.0,
        width_pct: 100.0 / cols,
        height_pct: 100.0 / rows,
    }
}
