use std::{fmt, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Serialize};

/// Grid coordinates of a single cell: `i` is the column, `j` the row.
///
/// The textual form `"i,j"` is the cell key used in the durable record.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPos {
    pub i: u32,
    pub j: u32,
}

impl CellPos {
    pub fn new(i: u32, j: u32) -> Self {
        Self { i, j }
    }

    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.i, self.j)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCellKeyError {
    Malformed,
    Index(ParseIntError),
}

impl fmt::Display for ParseCellKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCellKeyError::Malformed => write!(f, "cell key must look like \"i,j\""),
            ParseCellKeyError::Index(e) => write!(f, "invalid cell index: {e}"),
        }
    }
}

impl std::error::Error for ParseCellKeyError {}

impl FromStr for CellPos {
    type Err = ParseCellKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (i, j) = s
            .split_once(',')
            .ok_or(ParseCellKeyError::Malformed)?;
        // u32::from_str accepts a leading '+', which would give one cell two keys.
        if i.starts_with('+') || j.starts_with('+') {
            return Err(ParseCellKeyError::Malformed);
        }
        Ok(Self {
            i: i.parse().map_err(ParseCellKeyError::Index)?,
            j: j.parse().map_err(ParseCellKeyError::Index)?,
        })
    }
}

/// Rendered bounding box of the map image, in client pixels.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Placement of an overlay cell as percentages of the map container.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CellRect {
    pub left_pct: f64,
    pub top_pct: f64,
    pub width_pct: f64,
    pub height_pct: f64,
}

impl CellRect {
    /// Whether a percentage point falls inside this cell (half-open on the far edges).
    pub fn contains(&self, x_pct: f64, y_pct: f64) -> bool {
        x_pct >= self.left_pct
            && x_pct < self.left_pct + self.width_pct
            && y_pct >= self.top_pct
            && y_pct < self.top_pct + self.height_pct
    }
}

/// A point annotation placed by the game master.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Marker {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub name: String,
    pub check: String,
}

/// Marker position waiting for the name/check dialog to be confirmed.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct PendingMarker {
    pub x: f64,
    pub y: f64,
}

/// What a click on the map does.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    #[serde(rename = "reveal")]
    Reveal,
    #[serde(rename = "check")]
    Check,
}

/// Intrinsic pixel size of the decoded map image.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No image; the placeholder is shown.
    #[serde(rename = "empty")]
    Empty,
    /// Image chosen but not decoded yet; nothing grid-related may be drawn.
    #[serde(rename = "loading")]
    Loading,
    #[serde(rename = "active")]
    Active,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cell_key_parses_back() {
        let pos = CellPos::new(12, 3);
        assert_eq!(pos.key(), "12,3");
        assert_eq!("12,3".parse::<CellPos>(), Ok(pos));
    }

    #[test]
    fn malformed_cell_keys_are_rejected() {
        for key in ["", "3", "3;4", "a,1", "1,", "-1,2", "+1,2", "1, 2"] {
            assert!(key.parse::<CellPos>().is_err(), "{key:?} should not parse");
        }
    }

    #[test]
    fn mode_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Mode::Check).unwrap(), "\"check\"");
        assert_eq!(
            serde_json::from_str::<Mode>("\"reveal\"").unwrap(),
            Mode::Reveal
        );
    }
}
