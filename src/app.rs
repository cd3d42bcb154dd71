use crate::config::{AppConfig, FALLBACK_GEOLOCATION_URL};
use crate::coordinate::format_degrees;
use crate::error::MapLoadError;
use crate::geolocation::{FixedLocation, IpGeolocation, LocationProvider};
use crate::http;
use crate::jobs::{JobKind, Jobs};
use crate::marker::{Marker, MarkerId, MarkerSource};
use crate::satellite::{HttpSatelliteSource, SatelliteSource};
use crate::session::{Session, StatusLevel};
use crate::load::LoadStatus;
use crate::surface::{MapEvent, MapResponse, MapSurface};
use crate::ui::UiState;
use clipboard::ClipboardContext;
use clipboard::ClipboardProvider;
use egui::{Color32, Context, Ui};
use egui_extras::{Column, TableBuilder};
use std::sync::Arc;

enum MapState {
    Running(MapSurface),
    Failed(MapLoadError),
}

enum ListAction {
    Select(MarkerId),
    Copy(String),
}

pub struct MapPinsApp {
    map: MapState,
    session: Session,
    jobs: Jobs,
    ui_state: UiState,
    clipboard: Option<ClipboardContext>,
    locator: Option<Arc<dyn LocationProvider>>,
    satellite: Option<Arc<dyn SatelliteSource>>,
    show_iss_button: bool,
}

impl MapPinsApp {
    // Build the app from the loaded config; a bad config goes straight to the error screen
    pub fn new(cc: &eframe::CreationContext<'_>, config: Result<AppConfig, MapLoadError>) -> Self {
        let mut style = (*cc.egui_ctx.style()).clone();
        style.spacing.item_spacing = egui::vec2(10.0, 10.0);
        cc.egui_ctx.set_style(style);

        let mut app = Self {
            map: MapState::Failed(MapLoadError::MissingApiKey),
            session: Session::new(),
            jobs: Jobs::new(Some(cc.egui_ctx.clone())),
            ui_state: UiState::default(),
            clipboard: ClipboardProvider::new().ok(),
            locator: None,
            satellite: None,
            show_iss_button: false,
        };

        let config = match config {
            Ok(config) => config,
            Err(err) => {
                tracing::error!("configuration rejected: {err}");
                app.map = MapState::Failed(err);
                return app;
            }
        };

        let client = match http::client() {
            Ok(client) => client,
            Err(err) => {
                tracing::error!("could not build HTTP client: {err}");
                app.map = MapState::Failed(MapLoadError::Unreachable(err.to_string()));
                return app;
            }
        };

        let locator: Arc<dyn LocationProvider> = match config.home {
            Some(home) => Arc::new(FixedLocation(home)),
            None => {
                let mut endpoints = vec![config.geolocation_url.clone()];
                if config.geolocation_url != FALLBACK_GEOLOCATION_URL {
                    endpoints.push(FALLBACK_GEOLOCATION_URL.to_string());
                }
                Arc::new(IpGeolocation::new(client.clone(), endpoints))
            }
        };
        let satellite: Arc<dyn SatelliteSource> =
            Arc::new(HttpSatelliteSource::new(client.clone(), config.iss_url.clone()));

        app.locator = Some(locator);
        app.satellite = Some(satellite);
        app.show_iss_button = config.show_iss_button;
        app.map = MapState::Running(MapSurface::new(cc.egui_ctx.clone(), client, Arc::new(config)));

        app
    }

    // Copy text to the system clipboard
    pub fn copy_to_clipboard(&mut self, text: String) -> bool {
        if let Some(clipboard) = &mut self.clipboard {
            clipboard.set_contents(text).is_ok()
        } else {
            false
        }
    }

    // Start a background location lookup
    fn locate(&mut self) {
        if let Some(locator) = &self.locator {
            tracing::info!("locating");
            self.jobs.spawn_locate(locator.clone());
        }
    }

    // Start a background ISS position fetch
    fn plot_iss(&mut self) {
        if let Some(satellite) = &self.satellite {
            tracing::info!("fetching ISS position");
            self.jobs.spawn_satellite(satellite.clone());
        }
    }

    // Draw the toolbar with the map actions and readouts
    fn draw_top_panel(&mut self, ctx: &Context, zoom: u8) {
        let mut locate = false;
        let mut plot_iss = false;
        let mut reset = false;

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Map Pins");
                ui.separator();

                let locating = self.jobs.is_running(JobKind::Locate);
                let label = if locating { "Locating…" } else { "🏠 Locate" };
                locate = ui.add_enabled(!locating, egui::Button::new(label)).clicked();

                if self.show_iss_button {
                    let fetching = self.jobs.is_running(JobKind::Satellite);
                    let label = if fetching { "Fetching…" } else { "🛰 Plot ISS" };
                    plot_iss = ui.add_enabled(!fetching, egui::Button::new(label)).clicked();
                }

                reset = ui.button("Reset View").clicked();
                ui.toggle_value(&mut self.ui_state.show_marker_list, "Marker List");
                ui.separator();
                ui.label(format!("Zoom: {}", zoom));
                if let Some(cursor) = self.ui_state.cursor_position {
                    ui.separator();
                    ui.label(format!("Cursor: {}", cursor.display()));
                }
            });

            if let Some(status) = &self.session.status {
                match status.level {
                    StatusLevel::Info => ui.label(status.text.as_str()),
                    StatusLevel::Warning => ui.colored_label(Color32::from_rgb(230, 160, 0), status.text.as_str()),
                };
            }
        });

        if locate {
            self.locate();
        }
        if plot_iss {
            self.plot_iss();
        }
        if reset {
            if let MapState::Running(surface) = &mut self.map {
                surface.reset_view();
            }
        }
    }

    // Draw the marker list and display settings
    fn draw_side_panel(&mut self, ctx: &Context) {
        let markers: Vec<Marker> = self.session.store.markers().to_vec();
        let mut action: Option<ListAction> = None;

        egui::SidePanel::right("markers_panel")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.heading("Markers");
                ui.label(format!("{} placed", self.session.store.len()));

                if !markers.is_empty() && ui.button("Copy All Coordinates").clicked() {
                    action = Some(ListAction::Copy(self.session.store.export_text()));
                }

                ui.separator();
                marker_table(ui, &markers, &mut action);
                ui.separator();

                ui.collapsing("Display", |ui| {
                    if ui
                        .checkbox(&mut self.ui_state.show_graticule, "Show Graticule")
                        .changed()
                    {
                        if let MapState::Running(surface) = &mut self.map {
                            surface.graticule.set_visible(self.ui_state.show_graticule);
                        }
                    }
                    ui.checkbox(&mut self.ui_state.dark_mode, "Dark Mode");
                });

                ui.collapsing("Help", |ui| {
                    ui.label("• Click the map to drop a pin");
                    ui.label("• Click a pin to see its coordinates");
                    ui.label("• Drag to pan, scroll to zoom");
                    ui.label("• Locate centers the map on your position");
                    if self.show_iss_button {
                        ui.label("• Plot ISS pins the space station's current position");
                    }
                });
            });

        match action {
            Some(ListAction::Select(id)) => {
                self.session.store.select(id);
            }
            Some(ListAction::Copy(text)) => {
                if !self.copy_to_clipboard(text) {
                    tracing::warn!("clipboard unavailable");
                }
            }
            None => {}
        }
    }

    // Show the selected marker's coordinates next to its pin
    fn draw_popup(&mut self, ctx: &Context, map: &MapResponse) {
        let Some(marker) = self.session.store.selected().cloned() else {
            return;
        };
        // off screen pins get no popup until they scroll back into view
        let Some(pin) = map.screen_pos(marker.id) else {
            return;
        };

        let anchor = pin + egui::vec2(12.0, -12.0);
        let title = match marker.source {
            MarkerSource::Click => "Pin",
            MarkerSource::Satellite => "ISS",
        };
        let mut open = true;
        let mut copy = false;

        egui::Window::new(title)
            .id(egui::Id::new("marker_popup"))
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .fixed_pos(anchor)
            .show(ctx, |ui| {
                ui.label(format!("Latitude: {}", format_degrees(marker.position.lat)));
                ui.label(format!("Longitude: {}", format_degrees(marker.position.lng)));
                ui.label(format!(
                    "Placed: {}",
                    marker.placed_at.with_timezone(&chrono::Local).format("%H:%M:%S")
                ));
                copy = ui.button("Copy").clicked();
            });

        if copy {
            self.copy_to_clipboard(marker.position.display());
        }
        if !open {
            self.session.store.clear_selection();
        }
    }
}

// Table of placed markers with per-row actions
fn marker_table(ui: &mut Ui, markers: &[Marker], action: &mut Option<ListAction>) {
    TableBuilder::new(ui)
        .striped(true)
        .max_scroll_height(300.0)
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("#");
            });
            header.col(|ui| {
                ui.strong("Lat");
            });
            header.col(|ui| {
                ui.strong("Lng");
            });
            header.col(|ui| {
                ui.strong("Time");
            });
            header.col(|_| {});
        })
        .body(|mut body| {
            for (i, marker) in markers.iter().enumerate() {
                body.row(22.0, |mut row| {
                    row.col(|ui| {
                        let index = format!("{}", i + 1);
                        match marker.source {
                            MarkerSource::Click => ui.label(index),
                            MarkerSource::Satellite => ui.label(format!("{index} 🛰")),
                        };
                    });
                    row.col(|ui| {
                        ui.label(format_degrees(marker.position.lat));
                    });
                    row.col(|ui| {
                        ui.label(format_degrees(marker.position.lng));
                    });
                    row.col(|ui| {
                        ui.label(
                            marker
                                .placed_at
                                .with_timezone(&chrono::Local)
                                .format("%H:%M:%S")
                                .to_string(),
                        );
                    });
                    row.col(|ui| {
                        if ui.small_button("Select").clicked() {
                            *action = Some(ListAction::Select(marker.id));
                        }
                        if ui.small_button("Copy").clicked() {
                            *action = Some(ListAction::Copy(marker.position.display()));
                        }
                    });
                });
            }
        });
}

// Centered message that replaces the whole window
fn full_screen_message(ctx: &Context, heading: &str, detail: Option<String>) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 3.0);
            ui.heading(heading);
            if let Some(detail) = detail {
                ui.label(detail);
            }
        });
    });
}

impl eframe::App for MapPinsApp {
    // Redraw the whole window once per frame
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut style = (*ctx.style()).clone();
        if self.ui_state.dark_mode {
            style.visuals = egui::Visuals::dark();
        } else {
            style.visuals = egui::Visuals::light();
        }
        ctx.set_style(style);

        let failed = match &self.map {
            MapState::Running(surface) => match surface.load_status() {
                LoadStatus::Failed(err) => Some(err.clone()),
                _ => None,
            },
            MapState::Failed(_) => None,
        };
        if let Some(err) = failed {
            self.map = MapState::Failed(err);
        }

        let surface = match &mut self.map {
            MapState::Running(surface) => surface,
            MapState::Failed(err) => {
                full_screen_message(ctx, "Error loading map", Some(err.to_string()));
                return;
            }
        };

        for outcome in self.jobs.poll() {
            self.session.apply(outcome, &mut *surface);
        }

        if *surface.load_status() == LoadStatus::Ready && !self.session.controller.is_loaded() {
            self.session.controller.on_load(&mut *surface);
        }

        let zoom = surface.zoom();
        self.draw_top_panel(ctx, zoom);

        let loaded = self.session.controller.is_loaded();
        if loaded && self.ui_state.show_marker_list {
            self.draw_side_panel(ctx);
        }

        let MapState::Running(surface) = &mut self.map else {
            return;
        };
        let mut response = None;
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let shown = surface.show(ui, &self.session.store, self.ui_state.dark_mode);
                if !loaded {
                    // tiles keep coming in underneath; camera moves stay queued until load
                    let rect = ui.max_rect();
                    ui.painter().rect_filled(rect, 0.0, ui.visuals().panel_fill);
                    ui.painter().text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        "Loading Maps",
                        egui::FontId::proportional(24.0),
                        ui.visuals().text_color(),
                    );
                }
                response = Some(shown);
            });

        if !loaded {
            return;
        }

        if let Some(response) = &response {
            self.ui_state.cursor_position = response.hover;
            match response.event {
                Some(MapEvent::MapClicked(position)) => {
                    self.session.controller.on_map_clicked(&mut self.session.store, position);
                }
                Some(MapEvent::MarkerClicked(id)) => {
                    self.session.controller.on_marker_clicked(&mut self.session.store, id);
                }
                None => {}
            }
            self.draw_popup(ctx, response);
        }
    }
}
