use serde::Serialize;
use tracing::debug;

/// Visible data range of a viewer, in reference pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewLimits {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ViewLimits {
    /// Limits that show a whole `width` x `height` array.
    pub fn for_extent(width: usize, height: usize) -> Self {
        Self {
            x_min: -0.5,
            x_max: width as f64 - 0.5,
            y_min: -0.5,
            y_max: height as f64 - 0.5,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x_min + self.x_max) / 2.0, (self.y_min + self.y_max) / 2.0)
    }

    /// Corners as (x_min, y_min), (x_min, y_max), (x_max, y_max), (x_max, y_min).
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.x_min, self.y_min),
            (self.x_min, self.y_max),
            (self.x_max, self.y_max),
            (self.x_max, self.y_min),
        ]
    }
}

impl Default for ViewLimits {
    fn default() -> Self {
        Self::for_extent(1, 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerCoords {
    Pixel,
    Sky,
}

/// Named overlay of points drawn on a viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerLayer {
    pub name: String,
    pub coords: MarkerCoords,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tool {
    BlinkOnce,
}

/// Per-viewer display state.
///
/// `layers` holds dataset labels bottom to top; the last entry is what the
/// cursor readout reports.
#[derive(Debug, Clone, Serialize)]
pub struct ViewerState {
    name: String,
    layers: Vec<String>,
    limits: ViewLimits,
    markers: Vec<MarkerLayer>,
    active_tool: Option<Tool>,
}

impl ViewerState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layers: Vec::new(),
            limits: ViewLimits::default(),
            markers: Vec::new(),
            active_tool: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn top_layer(&self) -> Option<&str> {
        self.layers.last().map(String::as_str)
    }

    pub(crate) fn push_layer(&mut self, label: &str) {
        self.layers.retain(|l| l != label);
        self.layers.push(label.to_string());
    }

    /// Bring the next layer to the top, cycling through all of them.
    pub fn blink_once(&mut self) {
        if self.layers.len() > 1 {
            self.layers.rotate_right(1);
            debug!(viewer = %self.name, top = ?self.top_layer(), "Blinked");
        }
    }

    pub fn limits(&self) -> ViewLimits {
        self.limits
    }

    pub fn reset_limits(&mut self, width: usize, height: usize) {
        self.limits = ViewLimits::for_extent(width, height);
    }

    pub fn center_on(&mut self, x: f64, y: f64) {
        let (cx, cy) = self.limits.center();
        let (dx, dy) = (x - cx, y - cy);
        self.limits.x_min += dx;
        self.limits.x_max += dx;
        self.limits.y_min += dy;
        self.limits.y_max += dy;
    }

    /// Zoom around the current centre; `factor > 1` zooms in. Non-positive
    /// or non-finite factors are ignored.
    pub fn zoom(&mut self, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let (cx, cy) = self.limits.center();
        let half_w = (self.limits.x_max - self.limits.x_min) / (2.0 * factor);
        let half_h = (self.limits.y_max - self.limits.y_min) / (2.0 * factor);
        self.limits = ViewLimits {
            x_min: cx - half_w,
            x_max: cx + half_w,
            y_min: cy - half_h,
            y_max: cy + half_h,
        };
    }

    pub fn markers(&self) -> &[MarkerLayer] {
        &self.markers
    }

    /// Add or replace the marker layer called `name`.
    pub fn add_markers(&mut self, name: &str, coords: MarkerCoords, points: Vec<(f64, f64)>) {
        self.markers.retain(|m| m.name != name);
        self.markers.push(MarkerLayer {
            name: name.to_string(),
            coords,
            points,
        });
    }

    pub fn reset_markers(&mut self) {
        self.markers.clear();
    }

    pub fn active_tool(&self) -> Option<Tool> {
        self.active_tool
    }

    pub fn set_active_tool(&mut self, tool: Option<Tool>) {
        self.active_tool = tool;
    }

    /// Invalidate state tied to the old coordinate frame.
    ///
    /// Limits always go back to the reference extent. Pixel markers only
    /// survive when the alignment mode is unchanged.
    pub(crate) fn apply_realignment(&mut self, mode_changed: bool, reference_extent: Option<(usize, usize)>) {
        if let Some((w, h)) = reference_extent {
            self.reset_limits(w, h);
        }
        if mode_changed {
            let before = self.markers.len();
            self.markers.retain(|m| m.coords == MarkerCoords::Sky);
            if self.markers.len() != before {
                debug!(
                    viewer = %self.name,
                    dropped = before - self.markers.len(),
                    "Dropped pixel markers after alignment change"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer_with_layers() -> ViewerState {
        let mut v = ViewerState::new("imviz-0");
        for label in ["a", "b", "c"] {
            v.push_layer(label);
        }
        v
    }

    #[test]
    fn test_blink_cycles_through_layers() {
        let mut v = viewer_with_layers();
        assert_eq!(v.top_layer(), Some("c"));
        v.blink_once();
        assert_eq!(v.top_layer(), Some("b"));
        v.blink_once();
        assert_eq!(v.top_layer(), Some("a"));
        v.blink_once();
        assert_eq!(v.top_layer(), Some("c"));
    }

    #[test]
    fn test_center_and_zoom() {
        let mut v = ViewerState::new("imviz-0");
        v.reset_limits(10, 10);
        v.center_on(5.0, 5.0);
        assert_eq!(v.limits().center(), (5.0, 5.0));
        v.zoom(2.0);
        let l = v.limits();
        assert!((l.x_max - l.x_min - 5.0).abs() < 1e-12);
        assert_eq!(l.center(), (5.0, 5.0));
        v.zoom(0.0);
        assert_eq!(v.limits(), l);
    }

    #[test]
    fn test_realignment_drops_only_pixel_markers() {
        let mut v = ViewerState::new("imviz-0");
        v.add_markers("xy", MarkerCoords::Pixel, vec![(0.0, 0.0), (0.0, 1.0)]);
        v.add_markers("sky", MarkerCoords::Sky, vec![(337.52, -20.83)]);

        v.apply_realignment(false, Some((10, 10)));
        assert_eq!(v.markers().len(), 2);

        v.apply_realignment(true, Some((10, 10)));
        assert_eq!(v.markers().len(), 1);
        assert_eq!(v.markers()[0].name, "sky");
    }

    #[test]
    fn test_push_layer_moves_existing_to_top() {
        let mut v = viewer_with_layers();
        v.push_layer("a");
        assert_eq!(v.layers(), &["b".to_string(), "c".to_string(), "a".to_string()]);
    }
}
