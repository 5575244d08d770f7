//! Zoom and scroll transform between timeline seconds and screen pixels.
//! Purely a rendering concern: nothing here touches clip times.

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineView {
    /// Pixels per second at zoom level 1.0
    pub base_rate: f32,
    pub zoom_level: f32,
    /// Horizontal scroll position in pixels
    pub scroll_x: f32,
}

impl Default for TimelineView {
    fn default() -> Self {
        Self {
            base_rate: 50.0,
            zoom_level: 1.0,
            scroll_x: 0.0,
        }
    }
}

impl TimelineView {
    pub fn pixels_per_second(&self) -> f32 {
        self.base_rate * self.zoom_level
    }

    /// Screen x (relative to the timeline's left edge) of `time`.
    pub fn time_to_x(&self, time: f64) -> f32 {
        time as f32 * self.pixels_per_second() - self.scroll_x
    }

    pub fn x_to_time(&self, x: f32) -> f64 {
        (((x + self.scroll_x) / self.pixels_per_second()) as f64).max(0.0)
    }

    pub fn set_zoom(&mut self, zoom_level: f32) {
        self.zoom_level = zoom_level.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Zooms by `factor`, keeping the time under `anchor_x` in place.
    pub fn zoom_around(&mut self, factor: f32, anchor_x: f32) {
        let anchor_time = self.x_to_time(anchor_x);
        self.set_zoom(self.zoom_level * factor);
        self.scroll_x = (anchor_time as f32 * self.pixels_per_second() - anchor_x).max(0.0);
    }

    pub fn scroll_by(&mut self, dx: f32) {
        self.scroll_x = (self.scroll_x + dx).max(0.0);
    }

    /// Width in pixels needed to show `duration` seconds.
    pub fn content_width(&self, duration: f64) -> f32 {
        duration as f32 * self.pixels_per_second()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixels_per_second_scales_with_zoom() {
        let mut view = TimelineView::default();
        assert_eq!(view.pixels_per_second(), 50.0);
        view.set_zoom(2.0);
        assert_eq!(view.pixels_per_second(), 100.0);
        view.set_zoom(100.0);
        assert_eq!(view.zoom_level, MAX_ZOOM);
        view.set_zoom(0.0);
        assert_eq!(view.zoom_level, MIN_ZOOM);
    }

    #[test]
    fn test_time_and_x_are_inverse() {
        let view = TimelineView {
            base_rate: 40.0,
            zoom_level: 1.5,
            scroll_x: 30.0,
        };
        assert_eq!(view.time_to_x(2.0), 90.0);
        assert_eq!(view.x_to_time(90.0), 2.0);
        assert_eq!(view.x_to_time(-100.0), 0.0);
    }

    #[test]
    fn test_zoom_around_keeps_anchor() {
        let mut view = TimelineView::default();
        view.scroll_x = 100.0;
        let before = view.x_to_time(200.0);
        view.zoom_around(2.0, 200.0);
        let after = view.x_to_time(200.0);
        assert!((before - after).abs() < 1e-4);
    }

    #[test]
    fn test_scroll_stops_at_zero() {
        let mut view = TimelineView::default();
        view.scroll_by(-20.0);
        assert_eq!(view.scroll_x, 0.0);
        view.scroll_by(15.0);
        assert_eq!(view.scroll_x, 15.0);
    }
}
