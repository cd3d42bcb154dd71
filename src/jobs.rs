use crate::coordinate::CameraTarget;
use crate::error::{GeolocationError, RemoteFetchError};
use crate::geolocation::{self, LocationProvider};
use crate::satellite::{RemotePosition, SatelliteSource};
use std::collections::HashSet;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Locate,
    Satellite,
}

#[derive(Debug)]
pub enum JobOutcome {
    Located(Result<CameraTarget, GeolocationError>),
    SatelliteFetched(Result<RemotePosition, RemoteFetchError>),
}

impl JobOutcome {
    pub fn kind(&self) -> JobKind {
        match self {
            JobOutcome::Located(_) => JobKind::Locate,
            JobOutcome::SatelliteFetched(_) => JobKind::Satellite,
        }
    }
}

/// Runs network lookups off the UI thread. One job of each kind at a time.
pub struct Jobs {
    tx: Sender<JobOutcome>,
    rx: Receiver<JobOutcome>,
    in_flight: HashSet<JobKind>,
    repaint: Option<egui::Context>,
}

impl Jobs {
    pub fn new(repaint: Option<egui::Context>) -> Self {
        let (tx, rx) = channel();
        Self {
            tx,
            rx,
            in_flight: HashSet::new(),
            repaint,
        }
    }

    pub fn is_running(&self, kind: JobKind) -> bool {
        self.in_flight.contains(&kind)
    }

    pub fn spawn_locate(&mut self, provider: Arc<dyn LocationProvider>) -> bool {
        self.spawn(JobKind::Locate, move || {
            JobOutcome::Located(geolocation::locate(provider.as_ref()))
        })
    }

    pub fn spawn_satellite(&mut self, source: Arc<dyn SatelliteSource>) -> bool {
        self.spawn(JobKind::Satellite, move || {
            JobOutcome::SatelliteFetched(source.fetch_position())
        })
    }

    fn spawn(&mut self, kind: JobKind, job: impl FnOnce() -> JobOutcome + Send + 'static) -> bool {
        if !self.in_flight.insert(kind) {
            tracing::debug!(?kind, "job already running");
            return false;
        }

        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("{kind:?}").to_lowercase())
            .spawn(move || {
                // receiver only goes away when the app shuts down
                let _ = tx.send(job());
                if let Some(ctx) = repaint {
                    ctx.request_repaint();
                }
            });

        match spawned {
            Ok(_) => true,
            Err(err) => {
                tracing::error!(?kind, "could not start worker thread: {err}");
                self.in_flight.remove(&kind);
                false
            }
        }
    }

    /// Drain every finished job.
    pub fn poll(&mut self) -> Vec<JobOutcome> {
        let outcomes: Vec<JobOutcome> = self.rx.try_iter().collect();
        for outcome in &outcomes {
            self.in_flight.remove(&outcome.kind());
        }
        outcomes
    }

    #[cfg(test)]
    pub fn wait(&mut self, timeout: std::time::Duration) -> Option<JobOutcome> {
        let outcome = self.rx.recv_timeout(timeout).ok()?;
        self.in_flight.remove(&outcome.kind());
        Some(outcome)
    }
}
