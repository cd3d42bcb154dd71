use crate::jobs::JobOutcome;
use crate::map_view::{MapHandle, MapViewController};
use crate::marker::{MarkerSource, MarkerStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Warning,
            text: text.into(),
        }
    }
}

/// Application state that outlives a frame: markers, selection, camera routing.
#[derive(Debug, Default)]
pub struct Session {
    pub store: MarkerStore,
    pub controller: MapViewController,
    pub status: Option<StatusMessage>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a finished background job into state. Failures end up in the status line.
    pub fn apply(&mut self, outcome: JobOutcome, handle: &mut dyn MapHandle) {
        match outcome {
            JobOutcome::Located(Ok(target)) => {
                self.controller.pan_zoom_to(handle, target);
                self.status = Some(StatusMessage::info(format!(
                    "Centered on {}",
                    target.position.display()
                )));
            }
            JobOutcome::Located(Err(err)) => {
                tracing::warn!("locate failed: {err}");
                self.status = Some(StatusMessage::warning(format!(
                    "Could not find your location: {err}"
                )));
            }
            JobOutcome::SatelliteFetched(Ok(position)) => {
                let latlng = position.to_latlng();
                self.store.add_marker(latlng, MarkerSource::Satellite);
                self.status = Some(StatusMessage::info(format!("ISS is over {}", latlng.display())));
            }
            JobOutcome::SatelliteFetched(Err(err)) => {
                tracing::warn!("ISS position fetch failed: {err}");
                self.status = Some(StatusMessage::warning(format!(
                    "Could not fetch the ISS position: {err}"
                )));
            }
        }
    }
}
