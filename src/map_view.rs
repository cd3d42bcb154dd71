use crate::coordinate::{CameraTarget, LatLng};
use crate::marker::{MarkerId, MarkerSource, MarkerStore};

/// Camera commands the map widget accepts once it has loaded.
pub trait MapHandle {
    fn pan_to(&mut self, position: LatLng);
    fn set_zoom(&mut self, zoom: u8);
}

/// Routes user intents to the marker store and to the map widget.
#[derive(Debug, Default)]
pub struct MapViewController {
    loaded: bool,
    pending: Option<CameraTarget>,
}

impl MapViewController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Fires once; flushes a camera move requested before the map was ready.
    pub fn on_load(&mut self, handle: &mut dyn MapHandle) {
        if self.loaded {
            return;
        }
        self.loaded = true;
        tracing::info!("map loaded");
        if let Some(target) = self.pending.take() {
            Self::apply(handle, target);
        }
    }

    pub fn pan_zoom_to(&mut self, handle: &mut dyn MapHandle, target: CameraTarget) {
        if self.loaded {
            Self::apply(handle, target);
        } else {
            tracing::debug!(?target, "map not loaded yet, queueing camera move");
            self.pending = Some(target);
        }
    }

    pub fn on_map_clicked(&mut self, store: &mut MarkerStore, position: LatLng) -> MarkerId {
        store.clear_selection();
        store.add_marker(position, MarkerSource::Click)
    }

    pub fn on_marker_clicked(&mut self, store: &mut MarkerStore, id: MarkerId) {
        store.select(id);
    }

    fn apply(handle: &mut dyn MapHandle, target: CameraTarget) {
        handle.pan_to(target.position);
        handle.set_zoom(target.zoom);
    }
}
