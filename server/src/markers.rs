use fogmap_common::models::Marker;
use tracing::{debug, warn};

pub const DEFAULT_MARKER_NAME: &str = "Check";

/// Markers in creation order, plus the id counter that is never rewound.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStore {
    markers: Vec<Marker>,
    next_id: u64,
}

impl Default for MarkerStore {
    fn default() -> Self {
        Self {
            markers: Vec::new(),
            next_id: 1,
        }
    }
}

impl MarkerStore {
    /// Rebuilds a store from already validated parts. The counter is raised
    /// past every existing id so restored ids are never issued again. A
    /// marker holding `u64::MAX` leaves the counter exhausted.
    pub fn from_parts(markers: Vec<Marker>, next_id: u64) -> Self {
        let floor = markers
            .iter()
            .map(|m| m.id.saturating_add(1))
            .max()
            .unwrap_or(1);
        Self {
            markers,
            next_id: next_id.max(floor),
        }
    }

    /// Appends a marker under the next id, or returns `None` once the counter
    /// has no successor left to hand out.
    pub fn add(&mut self, x: f64, y: f64, name: &str, check: &str) -> Option<Marker> {
        let Some(next_id) = self.next_id.checked_add(1) else {
            warn!("Marker id counter exhausted at {}", self.next_id);
            return None;
        };
        let name = name.trim();
        let marker = Marker {
            id: self.next_id,
            x: x.clamp(0.0, 100.0),
            y: y.clamp(0.0, 100.0),
            name: if name.is_empty() {
                DEFAULT_MARKER_NAME.to_string()
            } else {
                name.to_string()
            },
            check: check.trim().to_string(),
        };
        self.next_id = next_id;
        self.markers.push(marker.clone());
        Some(marker)
    }

    /// Removes the marker with `id`; returns whether anything was removed.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.markers.len();
        self.markers.retain(|m| m.id != id);
        let removed = self.markers.len() != before;
        if !removed {
            debug!("Marker {} already gone, nothing to remove", id);
        }
        removed
    }

    pub fn get(&self, id: u64) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    /// 1-based display index of a marker.
    pub fn index_of(&self, id: u64) -> Option<usize> {
        self.markers.iter().position(|m| m.id == id).map(|p| p + 1)
    }

    pub fn list(&self) -> &[Marker] {
        &self.markers
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_list_remove() {
        let mut store = MarkerStore::default();
        let marker = store.add(50.0, 50.0, "Trap", "DC 15 Dex").unwrap();
        assert_eq!(marker.id, 1);
        assert_eq!(store.list(), &[marker]);

        assert!(store.remove(1));
        assert!(store.list().is_empty());
        assert!(!store.remove(1));
        assert!(store.list().is_empty());
    }

    #[test]
    fn ids_are_never_reused() {
        let mut store = MarkerStore::default();
        store.add(1.0, 1.0, "a", "");
        let second = store.add(2.0, 2.0, "b", "").unwrap();
        store.remove(second.id);
        let third = store.add(3.0, 3.0, "c", "").unwrap();
        assert_eq!(third.id, 3);
    }

    #[test]
    fn blank_name_gets_placeholder() {
        let mut store = MarkerStore::default();
        let marker = store.add(10.0, 20.0, "   ", "").unwrap();
        assert_eq!(marker.name, DEFAULT_MARKER_NAME);
        assert_eq!(marker.check, "");
    }

    #[test]
    fn display_index_follows_creation_order() {
        let mut store = MarkerStore::default();
        for name in ["a", "b", "c"] {
            store.add(0.0, 0.0, name, "");
        }
        store.remove(1);
        assert_eq!(store.index_of(2), Some(1));
        assert_eq!(store.index_of(3), Some(2));
        assert_eq!(store.index_of(1), None);
    }

    #[test]
    fn restored_counter_stays_ahead_of_ids() {
        let mut store = MarkerStore::from_parts(
            vec![Marker {
                id: 9,
                x: 0.0,
                y: 0.0,
                name: "Door".to_string(),
                check: String::new(),
            }],
            2,
        );
        assert_eq!(store.next_id(), 10);
        assert_eq!(store.add(0.0, 0.0, "x", "").map(|m| m.id), Some(10));
    }

    fn marker(id: u64) -> Marker {
        Marker {
            id,
            x: 0.0,
            y: 0.0,
            name: "Door".to_string(),
            check: String::new(),
        }
    }

    #[test]
    fn counter_saturates_instead_of_wrapping() {
        let mut store = MarkerStore::from_parts(vec![marker(u64::MAX)], 1);
        assert_eq!(store.next_id(), u64::MAX);
        assert_eq!(store.add(1.0, 1.0, "late", ""), None);
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn last_id_before_the_ceiling_is_issued() {
        let mut store = MarkerStore::from_parts(vec![marker(u64::MAX - 2)], 1);
        assert_eq!(store.add(1.0, 1.0, "a", "").map(|m| m.id), Some(u64::MAX - 1));
        assert_eq!(store.add(1.0, 1.0, "b", ""), None);
        assert_eq!(store.next_id(), u64::MAX);
    }
}
