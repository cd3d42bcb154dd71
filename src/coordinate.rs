use walkers::Position;

// Web Mercator stops here so the world stays square.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Clamp latitude to the projectable band and wrap longitude into [-180, 180).
    pub fn normalized(&self) -> Self {
        let lat = self.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let lng = (self.lng + 180.0).rem_euclid(360.0) - 180.0;
        Self { lat, lng }
    }

    pub fn from_position(position: Position) -> Self {
        Self::new(position.y(), position.x())
    }

    pub fn to_position(self) -> Position {
        walkers::lat_lon(self.lat, self.lng)
    }

    /// "lat, lng" rounded for display.
    pub fn display(&self) -> String {
        format!("{}, {}", format_degrees(self.lat), format_degrees(self.lng))
    }
}

/// Where the camera should go after a locate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTarget {
    pub position: LatLng,
    pub zoom: u8,
}

impl CameraTarget {
    pub fn new(position: LatLng, zoom: u8) -> Self {
        Self { position, zoom }
    }
}

pub fn format_degrees(value: f64) -> String {
    format!("{:.2}", value)
}
