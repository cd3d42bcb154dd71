use crate::coordinate::{LatLng, MAX_LATITUDE};
use egui::{Color32, Painter, Rect, Stroke};
use walkers::Projector;

// Candidate line spacings in degrees, coarse to fine
const SPACINGS: [f64; 14] = [
    90.0, 45.0, 30.0, 15.0, 10.0, 5.0, 2.0, 1.0, 0.5, 0.25, 0.1, 0.05, 0.01, 0.005,
];
const MIN_GAP_PX: f64 = 90.0;
const TILE_PX: f64 = 256.0;

/// Latitude/longitude lines drawn over the map.
pub struct Graticule {
    visible: bool,
}

impl Graticule {
    pub fn new(visible: bool) -> Self {
        Self { visible }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Finest spacing that still leaves lines at least `MIN_GAP_PX` apart at the equator.
    pub fn spacing_for_zoom(zoom: f64) -> f64 {
        let px_per_degree = TILE_PX * 2f64.powf(zoom) / 360.0;
        SPACINGS
            .iter()
            .copied()
            .filter(|spacing| spacing * px_per_degree >= MIN_GAP_PX)
            .last()
            .unwrap_or(SPACINGS[0])
    }
}

/// Draw the lines for the view in `view_rect`.
pub fn draw(painter: &Painter, projector: &Projector, view_rect: Rect, zoom: f64, dark: bool) {
    let color = if dark {
        Color32::from_rgba_premultiplied(180, 180, 180, 60)
    } else {
        Color32::from_rgba_premultiplied(80, 80, 80, 80)
    };
    let stroke = Stroke::new(1.0, color);
    let spacing = Graticule::spacing_for_zoom(zoom);

    let top_left = LatLng::from_position(projector.unproject(view_rect.left_top().to_vec2()));
    let bottom_right = LatLng::from_position(projector.unproject(view_rect.right_bottom().to_vec2()));
    let center = LatLng::from_position(projector.unproject(view_rect.center().to_vec2()));

    // Meridians; the right edge may sit past the antimeridian
    let mut right = bottom_right.lng;
    if right < top_left.lng {
        right += 360.0;
    }
    for lng in lines(top_left.lng, right, spacing) {
        let x = projector.project(LatLng::new(center.lat, lng).to_position()).x;
        painter.line_segment(
            [egui::pos2(x, view_rect.min.y), egui::pos2(x, view_rect.max.y)],
            stroke,
        );
        let wrapped = LatLng::new(0.0, lng).normalized().lng;
        painter.text(
            egui::pos2(x + 3.0, view_rect.max.y - 4.0),
            egui::Align2::LEFT_BOTTOM,
            label(wrapped, spacing, 'E', 'W'),
            egui::FontId::proportional(11.0),
            color,
        );
    }

    // Parallels
    for lat in lines(bottom_right.lat, top_left.lat, spacing) {
        if lat.abs() > MAX_LATITUDE {
            continue;
        }
        let y = projector.project(LatLng::new(lat, center.lng).to_position()).y;
        painter.line_segment(
            [egui::pos2(view_rect.min.x, y), egui::pos2(view_rect.max.x, y)],
            stroke,
        );
        painter.text(
            egui::pos2(view_rect.min.x + 4.0, y - 2.0),
            egui::Align2::LEFT_BOTTOM,
            label(lat, spacing, 'N', 'S'),
            egui::FontId::proportional(11.0),
            color,
        );
    }
}

/// Multiples of `spacing` covering `from..=to`, each computed from its index.
fn lines(from: f64, to: f64, spacing: f64) -> Vec<f64> {
    let first = (from / spacing).floor() as i64;
    let last = (to / spacing).ceil() as i64;
    (first..=last).map(|k| k as f64 * spacing).collect()
}

fn label(value: f64, spacing: f64, positive: char, negative: char) -> String {
    let decimals = if spacing >= 1.0 {
        0
    } else if spacing >= 0.1 {
        1
    } else if spacing >= 0.01 {
        2
    } else {
        3
    };
    let hemisphere = if value > 0.0 {
        Some(positive)
    } else if value < 0.0 {
        Some(negative)
    } else {
        None
    };
    match hemisphere {
        Some(h) => format!("{:.*}°{}", decimals, value.abs(), h),
        None => format!("{:.*}°", decimals, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing_gets_finer_as_zoom_grows() {
        let mut last = f64::MAX;
        for zoom in 2..=19 {
            let spacing = Graticule::spacing_for_zoom(zoom as f64);
            assert!(spacing <= last, "zoom {zoom} spacing {spacing} > {last}");
            last = spacing;
        }
        assert_eq!(Graticule::spacing_for_zoom(2.0), 45.0);
        assert_eq!(Graticule::spacing_for_zoom(19.0), 0.005);
    }

    #[test]
    fn labels_carry_hemispheres() {
        assert_eq!(label(45.0, 15.0, 'N', 'S'), "45°N");
        assert_eq!(label(-100.5, 0.5, 'E', 'W'), "100.5°W");
        assert_eq!(label(0.0, 10.0, 'E', 'W'), "0°");
    }

    #[test]
    fn equator_is_exactly_zero_at_fine_spacings() {
        // summing 0.1 from -1.0 lands on -1.3e-16, which read "0.0°S"
        let parallels = lines(-1.0, 1.0, 0.1);
        let equator = parallels.iter().copied().find(|lat| lat.abs() < 1e-9);
        assert_eq!(equator, Some(0.0));
        assert_eq!(label(equator.unwrap_or(f64::NAN), 0.1, 'N', 'S'), "0.0°");
    }

    #[test]
    fn lines_cover_the_range() {
        let meridians = lines(-7.0, 22.0, 10.0);
        assert_eq!(meridians, vec![-10.0, 0.0, 10.0, 20.0, 30.0]);
    }
}
