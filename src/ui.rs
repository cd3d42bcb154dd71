use crate::coordinate::LatLng;

pub struct UiState {
    pub dark_mode: bool,
    pub show_graticule: bool,
    pub show_marker_list: bool,

    // Cursor tracking
    pub cursor_position: Option<LatLng>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            dark_mode: false,
            show_graticule: true,
            show_marker_list: true,
            cursor_position: None,
        }
    }
}
