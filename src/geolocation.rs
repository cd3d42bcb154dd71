use crate::coordinate::{CameraTarget, LatLng};
use crate::error::GeolocationError;
use reqwest::blocking::Client;
use serde_json::Value;

pub const LOCATE_ZOOM: u8 = 15;

/// Anything that can say where the user is.
pub trait LocationProvider: Send + Sync {
    fn current_position(&self) -> Result<LatLng, GeolocationError>;
}

/// Resolve the user's position into a camera target.
pub fn locate(provider: &dyn LocationProvider) -> Result<CameraTarget, GeolocationError> {
    let position = provider.current_position()?;
    Ok(CameraTarget::new(position, LOCATE_ZOOM))
}

/// A position pinned in config.
pub struct FixedLocation(pub LatLng);

impl LocationProvider for FixedLocation {
    fn current_position(&self) -> Result<LatLng, GeolocationError> {
        Ok(self.0)
    }
}

/// IP based lookup, trying each endpoint in turn.
pub struct IpGeolocation {
    client: Client,
    endpoints: Vec<String>,
}

impl IpGeolocation {
    pub fn new(client: Client, endpoints: Vec<String>) -> Self {
        Self { client, endpoints }
    }

    fn query(&self, url: &str) -> Result<LatLng, GeolocationError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeolocationError::Status(status.as_u16()));
        }
        let body: Value = response.json()?;
        parse_location(&body)
    }
}

impl LocationProvider for IpGeolocation {
    fn current_position(&self) -> Result<LatLng, GeolocationError> {
        let mut last_error = GeolocationError::Unavailable;
        for url in &self.endpoints {
            match self.query(url) {
                Ok(position) => {
                    tracing::info!(url = %url, lat = position.lat, lng = position.lng, "location found");
                    return Ok(position);
                }
                Err(err) => {
                    tracing::debug!(url = %url, "location lookup failed: {err}");
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }
}

/// Accepts both `latitude`/`longitude` and `lat`/`lon` shaped answers.
pub fn parse_location(body: &Value) -> Result<LatLng, GeolocationError> {
    let field = |names: [&str; 2]| names.iter().find_map(|name| body.get(*name).and_then(Value::as_f64));

    match (field(["latitude", "lat"]), field(["longitude", "lon"])) {
        (Some(lat), Some(lng)) => {
            let position = LatLng::new(lat, lng);
            if position.is_valid() {
                Ok(position)
            } else {
                Err(GeolocationError::Malformed(format!(
                    "coordinates out of range: {lat}, {lng}"
                )))
            }
        }
        _ => Err(GeolocationError::Malformed(
            "missing latitude/longitude".to_string(),
        )),
    }
}
