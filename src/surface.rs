use crate::config::AppConfig;
use crate::coordinate::{CameraTarget, LatLng};
use crate::grid::{self, Graticule};
use crate::load::{LoadStatus, TileCheck};
use crate::map_view::MapHandle;
use crate::marker::{MarkerId, MarkerSource, MarkerStore};
use egui::{Color32, Pos2, Stroke, Ui};
use reqwest::blocking::Client;
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Mutex};
use walkers::sources::{Attribution, TileSource};
use walkers::{HttpTiles, Map, MapMemory, Plugin, Projector, TileId};

pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 46.831073,
    lng: -100.773183,
};
pub const DEFAULT_ZOOM: u8 = 13;
pub const MIN_ZOOM: u8 = 2;
pub const MAX_ZOOM: u8 = 19;

const CLICK_THRESHOLD: f32 = 10.0;
const MARKER_RADIUS: f32 = 6.0;
const ATTRIBUTION: &str = "© MapTiler © OpenStreetMap contributors";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    MapClicked(LatLng),
    MarkerClicked(MarkerId),
}

#[derive(Debug, Default)]
pub struct MapResponse {
    pub event: Option<MapEvent>,
    pub hover: Option<LatLng>,
    /// Where each pin on screen was drawn this frame.
    pub pins: Vec<(MarkerId, Pos2)>,
}

impl MapResponse {
    pub fn screen_pos(&self, id: MarkerId) -> Option<Pos2> {
        self.pins.iter().find(|(pin, _)| *pin == id).map(|(_, pos)| *pos)
    }
}

/// Tile source built from the configured URL template. Every URL handed to
/// the downloader is also reported so the first tiles can be checked.
struct ConfiguredTiles {
    config: Arc<AppConfig>,
    requested: Sender<String>,
}

impl TileSource for ConfiguredTiles {
    fn tile_url(&self, tile_id: TileId) -> String {
        let url = self.config.tile_url_for(tile_id.zoom, tile_id.x, tile_id.y);
        let _ = self.requested.send(url.clone());
        url
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: ATTRIBUTION,
            url: "https://www.maptiler.com/copyright/",
            logo_light: None,
            logo_dark: None,
        }
    }
}

/// The slippy map widget: walkers tiles with the graticule and marker pins on top.
pub struct MapSurface {
    tiles: HttpTiles,
    memory: MapMemory,
    home: CameraTarget,
    check: TileCheck,
    pub graticule: Graticule,
}

impl MapSurface {
    // Set up the tile downloader and start at the default view
    pub fn new(ctx: egui::Context, client: Client, config: Arc<AppConfig>) -> Self {
        let (requested_tx, requested_rx) = channel();
        let source = ConfiguredTiles {
            config,
            requested: requested_tx,
        };
        let mut surface = Self {
            tiles: HttpTiles::new(source, ctx.clone()),
            memory: MapMemory::default(),
            home: CameraTarget::new(DEFAULT_CENTER, DEFAULT_ZOOM),
            check: TileCheck::new(ctx, client, requested_rx),
            graticule: Graticule::new(true),
        };
        surface.reset_view();
        surface
    }

    // Current zoom, rounded to a whole level for display
    pub fn zoom(&self) -> u8 {
        self.memory.zoom().round().clamp(0.0, u8::MAX as f64) as u8
    }

    pub fn load_status(&self) -> &LoadStatus {
        self.check.status()
    }

    // Jump back to the starting center and zoom
    pub fn reset_view(&mut self) {
        let home = self.home;
        self.pan_to(home.position);
        self.set_zoom(home.zoom);
    }

    // Draw the map and report what the pointer did on it
    pub fn show(&mut self, ui: &mut Ui, store: &MarkerStore, dark: bool) -> MapResponse {
        self.check.poll();

        let output = Arc::new(Mutex::new(MapResponse::default()));
        let overlay = MapOverlay {
            store: store.clone(),
            show_graticule: self.graticule.is_visible(),
            dark,
            output: output.clone(),
        };

        let map = Map::new(Some(&mut self.tiles), &mut self.memory, self.home.position.to_position())
            .with_plugin(overlay);
        let response = ui.add(map);

        ui.painter().text(
            response.rect.right_bottom() - egui::vec2(4.0, 2.0),
            egui::Align2::RIGHT_BOTTOM,
            ATTRIBUTION,
            egui::FontId::proportional(10.0),
            if dark { Color32::LIGHT_GRAY } else { Color32::DARK_GRAY },
        );

        self.keep_zoom_in_range();

        let response = match output.lock() {
            Ok(mut out) => std::mem::take(&mut *out),
            Err(_) => MapResponse::default(),
        };
        response
    }

    // Pull wheel zoom back inside the supported levels
    fn keep_zoom_in_range(&mut self) {
        let zoom = self.memory.zoom();
        if zoom < MIN_ZOOM as f64 {
            self.set_zoom(MIN_ZOOM);
        } else if zoom > MAX_ZOOM as f64 {
            self.set_zoom(MAX_ZOOM);
        }
    }
}

impl MapHandle for MapSurface {
    // Detach from the home position and center on `position`
    fn pan_to(&mut self, position: LatLng) {
        self.memory.center_at(position.normalized().to_position());
    }

    // Zoom to a whole level inside the supported range
    fn set_zoom(&mut self, zoom: u8) {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if let Err(err) = self.memory.set_zoom(zoom as f64) {
            tracing::warn!(zoom, "map refused zoom level: {err:?}");
        }
    }
}

/// Runs inside the map widget each frame: graticule, pins, hover and click hit test.
struct MapOverlay {
    store: MarkerStore,
    show_graticule: bool,
    dark: bool,
    output: Arc<Mutex<MapResponse>>,
}

impl Plugin for MapOverlay {
    // Draw the overlay and record clicks and hover for the app
    fn run(self: Box<Self>, ui: &mut Ui, response: &egui::Response, projector: &Projector, memory: &MapMemory) {
        let view_rect = response.rect;
        let painter = ui.painter().with_clip_rect(view_rect);
        let project = |position: LatLng| {
            let v = projector.project(position.to_position());
            egui::pos2(v.x, v.y)
        };
        let unproject = |pos: Pos2| LatLng::from_position(projector.unproject(pos.to_vec2())).normalized();

        if self.show_graticule {
            grid::draw(&painter, projector, view_rect, memory.zoom(), self.dark);
        }

        let mut out = MapResponse::default();
        let selected = self.store.selected().map(|marker| marker.id);
        let outline = if self.dark { Color32::WHITE } else { Color32::BLACK };

        for (marker, pos) in self.store.visible_in(view_rect, project) {
            let color = match marker.source {
                MarkerSource::Click => Color32::from_rgb(220, 50, 47),
                MarkerSource::Satellite => Color32::from_rgb(0, 120, 255),
            };
            let radius = if selected == Some(marker.id) {
                MARKER_RADIUS + 3.0
            } else {
                MARKER_RADIUS
            };
            painter.circle_filled(pos, radius, color);
            painter.circle_stroke(pos, radius, Stroke::new(1.5, outline));
            out.pins.push((marker.id, pos));
        }

        out.hover = response.hover_pos().map(unproject);

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                out.event = Some(match self.store.hit_test(pos, CLICK_THRESHOLD, project) {
                    Some(id) => MapEvent::MarkerClicked(id),
                    None => MapEvent::MapClicked(unproject(pos)),
                });
            }
        }

        if let Ok(mut shared) = self.output.lock() {
            *shared = out;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Arc<AppConfig> {
        let vars = [("MAPS_API_KEY", "secret"), ("MAPS_TILE_URL", "https://t/{z}/{x}/{y}.png?k={key}")];
        let config = AppConfig::from_lookup(|name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        });
        Arc::new(config.unwrap())
    }

    #[test]
    fn tile_source_reports_every_url_it_hands_out() {
        let (tx, rx) = channel();
        let source = ConfiguredTiles {
            config: config(),
            requested: tx,
        };
        let url = source.tile_url(TileId { x: 4, y: 5, zoom: 3 });
        assert_eq!(url, "https://t/3/4/5.png?k=secret");
        assert_eq!(rx.try_recv().ok(), Some(url));
    }

    #[test]
    fn response_finds_pins_by_id() {
        let mut store = MarkerStore::new();
        let a = store.add_marker(LatLng::new(1.0, 2.0), MarkerSource::Click);
        let b = store.add_marker(LatLng::new(3.0, 4.0), MarkerSource::Satellite);
        let response = MapResponse {
            pins: vec![(a, egui::pos2(10.0, 20.0))],
            ..Default::default()
        };
        assert_eq!(response.screen_pos(a), Some(egui::pos2(10.0, 20.0)));
        assert_eq!(response.screen_pos(b), None);
    }
}
