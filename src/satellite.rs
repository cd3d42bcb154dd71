use crate::coordinate::LatLng;
use crate::error::RemoteFetchError;
use reqwest::blocking::Client;
use serde::Deserialize;

/// Position as reported by the tracking API. Anything else in the body is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RemotePosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl RemotePosition {
    pub fn to_latlng(self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

pub trait SatelliteSource: Send + Sync {
    fn fetch_position(&self) -> Result<RemotePosition, RemoteFetchError>;
}

pub struct HttpSatelliteSource {
    client: Client,
    url: String,
}

impl HttpSatelliteSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl SatelliteSource for HttpSatelliteSource {
    fn fetch_position(&self) -> Result<RemotePosition, RemoteFetchError> {
        let response = self.client.get(&self.url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteFetchError::Status(status.as_u16()));
        }
        let body = response.text()?;
        let position = parse_position(&body)?;
        tracing::info!(
            lat = position.latitude,
            lng = position.longitude,
            "satellite position fetched"
        );
        Ok(position)
    }
}

pub fn parse_position(body: &str) -> Result<RemotePosition, RemoteFetchError> {
    let position: RemotePosition = serde_json::from_str(body)?;
    if !position.to_latlng().is_valid() {
        return Err(RemoteFetchError::Malformed(format!(
            "coordinates out of range: {}, {}",
            position.latitude, position.longitude
        )));
    }
    Ok(position)
}
