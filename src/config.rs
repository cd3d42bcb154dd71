use crate::coordinate::LatLng;
use crate::error::MapLoadError;

pub const DEFAULT_TILE_URL: &str = "https://api.maptiler.com/maps/streets-v2/256/{z}/{x}/{y}.png?key={key}";
pub const DEFAULT_ISS_URL: &str = "https://api.wheretheiss.at/v1/satellites/25544";
pub const DEFAULT_GEOLOCATION_URL: &str = "https://ipapi.co/json/";
pub const FALLBACK_GEOLOCATION_URL: &str = "http://ip-api.com/json/";

/// Startup settings, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_key: String,
    pub tile_url: String,
    pub iss_url: String,
    pub geolocation_url: String,
    pub home: Option<LatLng>,
    pub show_iss_button: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, MapLoadError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MapLoadError> {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = var("MAPS_API_KEY").ok_or(MapLoadError::MissingApiKey)?;

        let tile_url = var("MAPS_TILE_URL").unwrap_or_else(|| DEFAULT_TILE_URL.to_string());
        if !["{z}", "{x}", "{y}"].iter().all(|p| tile_url.contains(p)) {
            return Err(MapLoadError::InvalidTileTemplate(tile_url));
        }

        let home_lat = var("MAP_PINS_HOME_LAT").and_then(|v| v.parse::<f64>().ok());
        let home_lng = var("MAP_PINS_HOME_LNG").and_then(|v| v.parse::<f64>().ok());
        let home = match (home_lat, home_lng) {
            (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)).filter(LatLng::is_valid),
            _ => None,
        };

        let show_iss_button = var("MAP_PINS_ISS")
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no"))
            .unwrap_or(true);

        Ok(Self {
            api_key,
            tile_url,
            iss_url: var("ISS_API_URL").unwrap_or_else(|| DEFAULT_ISS_URL.to_string()),
            geolocation_url: var("GEOLOCATION_URL")
                .unwrap_or_else(|| DEFAULT_GEOLOCATION_URL.to_string()),
            home,
            show_iss_button,
        })
    }

    pub fn tile_url_for(&self, z: u8, x: u32, y: u32) -> String {
        self.tile_url
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
            .replace("{key}", &self.api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, MapLoadError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn missing_key_is_a_load_error() {
        assert_eq!(config(&[]), Err(MapLoadError::MissingApiKey));
        assert_eq!(config(&[("MAPS_API_KEY", "   ")]), Err(MapLoadError::MissingApiKey));
    }

    #[test]
    fn defaults_fill_in() {
        let config = config(&[("MAPS_API_KEY", "abc")]).unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.iss_url, DEFAULT_ISS_URL);
        assert_eq!(config.geolocation_url, DEFAULT_GEOLOCATION_URL);
        assert_eq!(config.home, None);
        assert!(config.show_iss_button);
    }

    #[test]
    fn tile_template_needs_all_placeholders() {
        let err = config(&[("MAPS_API_KEY", "abc"), ("MAPS_TILE_URL", "https://t/{z}/{x}.png")]);
        assert_eq!(
            err,
            Err(MapLoadError::InvalidTileTemplate("https://t/{z}/{x}.png".into()))
        );
    }

    #[test]
    fn tile_url_substitutes_key_and_coordinates() {
        let config = config(&[
            ("MAPS_API_KEY", "secret"),
            ("MAPS_TILE_URL", "https://t/{z}/{x}/{y}.png?k={key}"),
        ])
        .unwrap();
        assert_eq!(config.tile_url_for(3, 4, 5), "https://t/3/4/5.png?k=secret");
    }

    #[test]
    fn home_needs_both_valid_halves() {
        let partial = config(&[("MAPS_API_KEY", "k"), ("MAP_PINS_HOME_LAT", "10")]).unwrap();
        assert_eq!(partial.home, None);

        let bad = config(&[
            ("MAPS_API_KEY", "k"),
            ("MAP_PINS_HOME_LAT", "100"),
            ("MAP_PINS_HOME_LNG", "5"),
        ])
        .unwrap();
        assert_eq!(bad.home, None);

        let full = config(&[
            ("MAPS_API_KEY", "k"),
            ("MAP_PINS_HOME_LAT", "51.5"),
            ("MAP_PINS_HOME_LNG", "-0.12"),
        ])
        .unwrap();
        assert_eq!(full.home, Some(LatLng::new(51.5, -0.12)));
    }

    #[test]
    fn iss_button_can_be_switched_off() {
        let off = config(&[("MAPS_API_KEY", "k"), ("MAP_PINS_ISS", "false")]).unwrap();
        assert!(!off.show_iss_button);
        let on = config(&[("MAPS_API_KEY", "k"), ("MAP_PINS_ISS", "1")]).unwrap();
        assert!(on.show_iss_button);
    }
}
