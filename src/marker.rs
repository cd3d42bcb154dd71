use crate::coordinate::LatLng;
use chrono::{DateTime, Utc};
use egui::{Pos2, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(u64);

impl MarkerId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Where a marker came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSource {
    Click,
    Satellite,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub position: LatLng,
    pub placed_at: DateTime<Utc>,
    pub source: MarkerSource,
}

/// Append-only list of placed markers plus the one currently selected.
#[derive(Debug, Clone, Default)]
pub struct MarkerStore {
    markers: Vec<Marker>,
    selected: Option<MarkerId>,
    next_id: u64,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a marker stamped with the current time and drops any selection.
    pub fn add_marker(&mut self, position: LatLng, source: MarkerSource) -> MarkerId {
        self.add_marker_at(position, source, Utc::now())
    }

    pub fn add_marker_at(
        &mut self,
        position: LatLng,
        source: MarkerSource,
        placed_at: DateTime<Utc>,
    ) -> MarkerId {
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        self.markers.push(Marker {
            id,
            position,
            placed_at,
            source,
        });
        self.selected = None;
        tracing::debug!(id = id.get(), lat = position.lat, lng = position.lng, "marker added");
        id
    }

    /// Returns false when `id` is not in the store; the selection is left alone then.
    pub fn select(&mut self, id: MarkerId) -> bool {
        if self.get(id).is_some() {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Marker> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        // ids are handed out in push order, so the list is sorted by id
        self.markers
            .binary_search_by_key(&id, |marker| marker.id)
            .ok()
            .map(|index| &self.markers[index])
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Marker drawn closest to `pos`, if any lies within `threshold` pixels.
    pub fn hit_test(
        &self,
        pos: Pos2,
        threshold: f32,
        project: impl Fn(LatLng) -> Pos2,
    ) -> Option<MarkerId> {
        self.markers
            .iter()
            .map(|marker| (marker.id, (project(marker.position) - pos).length()))
            .filter(|(_, distance)| *distance < threshold)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    pub fn visible_in(&self, view_rect: Rect, project: impl Fn(LatLng) -> Pos2) -> Vec<(&Marker, Pos2)> {
        self.markers
            .iter()
            .map(|marker| (marker, project(marker.position)))
            .filter(|(_, pos)| view_rect.expand(20.0).contains(*pos))
            .collect()
    }

    pub fn export_text(&self) -> String {
        self.markers
            .iter()
            .enumerate()
            .map(|(i, marker)| format!("{}. ({})", i + 1, marker.position.display()))
            .collect::<Vec<String>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clicks_append_in_order() {
        let mut store = MarkerStore::new();
        let points: Vec<LatLng> = (0..25)
            .map(|i| LatLng::new(i as f64, -(i as f64) * 2.0))
            .collect();
        for p in &points {
            store.add_marker(*p, MarkerSource::Click);
        }
        assert_eq!(store.len(), 25);
        let placed: Vec<LatLng> = store.markers().iter().map(|m| m.position).collect();
        assert_eq!(placed, points);
    }

    #[test]
    fn ids_are_unique_even_with_identical_timestamps() {
        let mut store = MarkerStore::new();
        let now = Utc::now();
        let a = store.add_marker_at(LatLng::new(1.0, 1.0), MarkerSource::Click, now);
        let b = store.add_marker_at(LatLng::new(1.0, 1.0), MarkerSource::Click, now);
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn selection_follows_select_and_clear() {
        let mut store = MarkerStore::new();
        let id = store.add_marker(LatLng::new(46.831073, -100.773183), MarkerSource::Click);
        assert!(store.selected().is_none());

        assert!(store.select(id));
        assert_eq!(store.selected().map(|m| m.id), Some(id));

        store.clear_selection();
        assert!(store.selected().is_none());
    }

    #[test]
    fn selecting_an_unknown_id_is_refused() {
        let mut store = MarkerStore::new();
        let id = store.add_marker(LatLng::new(0.0, 0.0), MarkerSource::Click);
        assert!(store.select(id));
        assert!(!store.select(MarkerId(99)));
        assert_eq!(store.selected().map(|m| m.id), Some(id));
    }

    #[test]
    fn adding_a_marker_clears_the_selection() {
        let mut store = MarkerStore::new();
        let first = store.add_marker(LatLng::new(0.0, 0.0), MarkerSource::Click);
        store.select(first);
        store.add_marker(LatLng::new(5.0, 5.0), MarkerSource::Satellite);
        assert!(store.selected().is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn hit_test_picks_the_nearest_marker_within_range() {
        let mut store = MarkerStore::new();
        let a = store.add_marker(LatLng::new(0.0, 0.0), MarkerSource::Click);
        let b = store.add_marker(LatLng::new(0.0, 8.0), MarkerSource::Click);
        // identity projection: lng -> x, lat -> y
        let project = |p: LatLng| egui::pos2(p.lng as f32, p.lat as f32);

        assert_eq!(store.hit_test(egui::pos2(1.0, 0.0), 10.0, project), Some(a));
        assert_eq!(store.hit_test(egui::pos2(6.0, 0.0), 10.0, project), Some(b));
        assert_eq!(store.hit_test(egui::pos2(40.0, 40.0), 10.0, project), None);
    }

    #[test]
    fn export_lists_rounded_coordinates() {
        let mut store = MarkerStore::new();
        store.add_marker(LatLng::new(46.831073, -100.773183), MarkerSource::Click);
        store.add_marker(LatLng::new(-12.3456, 45.6789), MarkerSource::Satellite);
        assert_eq!(store.export_text(), "1. (46.83, -100.77)\n2. (-12.35, 45.68)");
    }
}
