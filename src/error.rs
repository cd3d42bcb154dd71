use thiserror::Error;

/// Reasons the map surface can refuse to come up. Shown full screen.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MapLoadError {
    #[error("no maps API key configured (set MAPS_API_KEY)")]
    MissingApiKey,
    #[error("tile URL template `{0}` must contain {{z}}, {{x}} and {{y}}")]
    InvalidTileTemplate(String),
    #[error("maps provider rejected the API key (HTTP {0})")]
    Rejected(u16),
    #[error("map tiles could not be loaded: {0}")]
    Unreachable(String),
}

#[derive(Debug, Error)]
pub enum GeolocationError {
    #[error("location is unavailable")]
    Unavailable,
    #[error("location request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("location service answered with HTTP {0}")]
    Status(u16),
    #[error("location response was malformed: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum RemoteFetchError {
    #[error("satellite request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("satellite service answered with HTTP {0}")]
    Status(u16),
    #[error("satellite response was malformed: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for RemoteFetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum TileError {
    #[error("tile request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("tile server answered with HTTP {0}")]
    Status(u16),
    #[error("tile could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
}
