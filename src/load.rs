use crate::error::{MapLoadError, TileError};
use egui::Context;
use reqwest::blocking::Client;
use std::collections::HashSet;
use std::sync::mpsc::{channel, Receiver, Sender};

// Tiles fetched to decide whether the provider works at all
const MAX_CHECKED: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    Ready,
    Failed(MapLoadError),
}

impl LoadStatus {
    /// Status after one tile fetch settles.
    pub fn after_tile<T>(&self, result: &Result<T, TileError>) -> LoadStatus {
        match (self, result) {
            (LoadStatus::Failed(err), _) => LoadStatus::Failed(err.clone()),
            (_, Err(TileError::Status(code))) if matches!(*code, 401 | 403) => {
                LoadStatus::Failed(MapLoadError::Rejected(*code))
            }
            (LoadStatus::Loading, Ok(_)) => LoadStatus::Ready,
            (LoadStatus::Loading, Err(err @ TileError::Http(_))) => {
                LoadStatus::Failed(MapLoadError::Unreachable(err.to_string()))
            }
            (LoadStatus::Loading, Err(err @ TileError::Decode(_))) => {
                LoadStatus::Failed(MapLoadError::Unreachable(err.to_string()))
            }
            (status, _) => status.clone(),
        }
    }
}

/// Counts settled tile fetches until the map is known to be up or down.
#[derive(Debug)]
pub struct LoadTracker {
    status: LoadStatus,
    requested: usize,
    failed: usize,
}

impl Default for LoadTracker {
    fn default() -> Self {
        Self {
            status: LoadStatus::Loading,
            requested: 0,
            failed: 0,
        }
    }
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn wants_more(&self) -> bool {
        self.status == LoadStatus::Loading && self.requested < MAX_CHECKED
    }

    pub fn requested(&mut self) {
        self.requested += 1;
    }

    /// Fold one settled fetch in. Returns true when the status changed.
    pub fn settled<T>(&mut self, result: &Result<T, TileError>) -> bool {
        let mut next = self.status.after_tile(result);
        if let Err(err) = result {
            self.failed += 1;
            // every tile asked for so far came back bad and none loaded
            if next == LoadStatus::Loading && self.failed >= self.requested {
                next = LoadStatus::Failed(MapLoadError::Unreachable(format!(
                    "none of {} tiles loaded, last error: {err}",
                    self.failed
                )));
            }
        }

        if next == self.status {
            return false;
        }
        self.status = next;
        true
    }
}

/// Re-fetches the first few tiles the map asks its provider for and
/// turns the outcome into a [`LoadStatus`].
pub struct TileCheck {
    ctx: Context,
    client: Client,
    requested: Receiver<String>,
    seen: HashSet<String>,
    tx: Sender<Result<(), TileError>>,
    rx: Receiver<Result<(), TileError>>,
    tracker: LoadTracker,
}

impl TileCheck {
    pub fn new(ctx: Context, client: Client, requested: Receiver<String>) -> Self {
        let (tx, rx) = channel();
        Self {
            ctx,
            client,
            requested,
            seen: HashSet::new(),
            tx,
            rx,
            tracker: LoadTracker::new(),
        }
    }

    pub fn status(&self) -> &LoadStatus {
        self.tracker.status()
    }

    pub fn poll(&mut self) {
        while let Ok(url) = self.requested.try_recv() {
            if self.tracker.wants_more() && self.seen.insert(url.clone()) {
                self.spawn(url);
            }
        }

        while let Ok(result) = self.rx.try_recv() {
            if let Err(err) = &result {
                tracing::warn!("tile check failed: {err}");
            }
            if self.tracker.settled(&result) {
                match self.tracker.status() {
                    LoadStatus::Failed(err) => tracing::error!("map failed to load: {err}"),
                    _ => tracing::info!("first map tile arrived"),
                }
            }
        }
    }

    fn spawn(&mut self, url: String) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        let spawned = std::thread::Builder::new()
            .name("tile-check".to_string())
            .spawn(move || {
                let _ = tx.send(check_tile(&client, &url));
                ctx.request_repaint();
            });

        match spawned {
            Ok(_) => self.tracker.requested(),
            Err(err) => tracing::error!("could not start tile check: {err}"),
        }
    }
}

fn check_tile(client: &Client, url: &str) -> Result<(), TileError> {
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(TileError::Status(status.as_u16()));
    }
    let bytes = response.bytes()?;
    image::load_from_memory(&bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html_instead_of_png() -> TileError {
        TileError::Decode(image::load_from_memory(b"<html>not a tile</html>").unwrap_err())
    }

    fn unreachable() -> TileError {
        let client = Client::new();
        TileError::Http(client.get("not a url").send().unwrap_err())
    }

    #[test]
    fn first_good_tile_marks_the_map_ready() {
        let ok: Result<(), TileError> = Ok(());
        assert_eq!(LoadStatus::Loading.after_tile(&ok), LoadStatus::Ready);
        assert_eq!(LoadStatus::Ready.after_tile(&ok), LoadStatus::Ready);
    }

    #[test]
    fn rejected_key_fails_the_load_even_after_ready() {
        let denied: Result<(), TileError> = Err(TileError::Status(403));
        assert_eq!(
            LoadStatus::Ready.after_tile(&denied),
            LoadStatus::Failed(MapLoadError::Rejected(403))
        );
    }

    #[test]
    fn undecodable_first_tile_fails_the_load() {
        let garbage: Result<(), TileError> = Err(html_instead_of_png());
        assert!(matches!(
            LoadStatus::Loading.after_tile(&garbage),
            LoadStatus::Failed(MapLoadError::Unreachable(_))
        ));
        // a bad tile once the map is up only costs that tile
        assert_eq!(LoadStatus::Ready.after_tile(&garbage), LoadStatus::Ready);
    }

    #[test]
    fn transport_error_before_load_fails_it() {
        let down: Result<(), TileError> = Err(unreachable());
        assert!(matches!(
            LoadStatus::Loading.after_tile(&down),
            LoadStatus::Failed(MapLoadError::Unreachable(_))
        ));
        assert_eq!(LoadStatus::Ready.after_tile(&down), LoadStatus::Ready);
    }

    #[test]
    fn one_missing_tile_does_not_fail_the_load() {
        let missing: Result<(), TileError> = Err(TileError::Status(404));
        assert_eq!(LoadStatus::Loading.after_tile(&missing), LoadStatus::Loading);
        assert_eq!(LoadStatus::Ready.after_tile(&missing), LoadStatus::Ready);
    }

    #[test]
    fn failure_is_sticky() {
        let failed = LoadStatus::Failed(MapLoadError::MissingApiKey);
        let ok: Result<(), TileError> = Ok(());
        assert_eq!(failed.after_tile(&ok), failed);
    }

    #[test]
    fn map_fails_once_every_requested_tile_failed() {
        let mut tracker = LoadTracker::new();
        for _ in 0..3 {
            tracker.requested();
        }

        assert!(!tracker.settled::<()>(&Err(TileError::Status(404))));
        assert!(!tracker.settled::<()>(&Err(TileError::Status(500))));
        assert_eq!(*tracker.status(), LoadStatus::Loading);

        assert!(tracker.settled::<()>(&Err(TileError::Status(404))));
        match tracker.status() {
            LoadStatus::Failed(MapLoadError::Unreachable(detail)) => {
                assert!(detail.contains("none of 3 tiles"), "{detail}");
            }
            other => panic!("expected an unreachable map, got {other:?}"),
        }
        assert!(!tracker.wants_more());
    }

    #[test]
    fn one_good_tile_among_failures_is_enough() {
        let mut tracker = LoadTracker::new();
        tracker.requested();
        tracker.requested();

        tracker.settled::<()>(&Err(TileError::Status(500)));
        assert!(tracker.settled(&Ok(())));
        assert_eq!(*tracker.status(), LoadStatus::Ready);

        // later failures leave a ready map alone
        assert!(!tracker.settled::<()>(&Err(TileError::Status(404))));
        assert_eq!(*tracker.status(), LoadStatus::Ready);
    }

    #[test]
    fn tracker_stops_asking_after_a_handful_of_tiles() {
        let mut tracker = LoadTracker::new();
        for _ in 0..MAX_CHECKED {
            assert!(tracker.wants_more());
            tracker.requested();
        }
        assert!(!tracker.wants_more());
    }
}
