//! Mouse-over coordinate readout.
//!
//! The readout is recomputed from scratch for every event; nothing here is
//! stored between calls.

pub mod format;

use crate::alignment::{AlignmentState, ViewerState};
use crate::config::ReadoutConfig;
use crate::data::Dataset;
use crate::frame::CoordinateFrame;
use crate::link::AlignMode;
use format::{format_dms, format_hms, format_pixel, format_scientific};
use serde::Serialize;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum EventKind {
    MouseMove,
    KeyDown(char),
    Click,
}

/// Mouse or key event delivered to a viewer, positioned in reference pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewerEvent {
    pub kind: EventKind,
    pub x: f64,
    pub y: f64,
}

impl ViewerEvent {
    pub fn mouse_move(x: f64, y: f64) -> Self {
        Self {
            kind: EventKind::MouseMove,
            x,
            y,
        }
    }

    pub fn key_down(key: char, x: f64, y: f64) -> Self {
        Self {
            kind: EventKind::KeyDown(key),
            x,
            y,
        }
    }

    pub fn click(x: f64, y: f64) -> Self {
        Self {
            kind: EventKind::Click,
            x,
            y,
        }
    }
}

/// Three display rows plus a reliability flag for each.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CursorReadout {
    pub pixel_text: String,
    pub world_text: String,
    pub decimal_text: String,
    pub row1_unreliable: bool,
    pub row2_unreliable: bool,
    pub row3_unreliable: bool,
    /// Dataset the readout describes (topmost layer).
    pub dataset: Option<String>,
    pub pixel: Option<(f64, f64)>,
    pub world: Option<(f64, f64)>,
}

impl CursorReadout {
    pub fn as_text(&self) -> (&str, &str, &str) {
        (&self.pixel_text, &self.world_text, &self.decimal_text)
    }
}

/// Everything a readout needs, borrowed from the workspace for one call.
pub struct ReadoutContext<'a> {
    pub viewer: &'a ViewerState,
    pub datasets: &'a [Dataset],
    pub alignment: &'a AlignmentState,
    pub config: &'a ReadoutConfig,
}

impl<'a> ReadoutContext<'a> {
    fn dataset(&self, label: &str) -> Option<&'a Dataset> {
        self.datasets.iter().find(|d| d.label() == label)
    }

    fn reference(&self) -> Option<&'a Dataset> {
        self.alignment
            .links()
            .reference
            .as_deref()
            .and_then(|label| self.dataset(label))
    }

    /// Read coordinates at `(x, y)` in the viewer's reference pixel space.
    pub fn read(&self, x: f64, y: f64) -> CursorReadout {
        let Some(top) = self.viewer.top_layer().and_then(|label| self.dataset(label)) else {
            return CursorReadout::default();
        };
        let links = self.alignment.links();
        let mode = self.alignment.mode();

        let (px, py) = links.reference_to_dataset(self.datasets, top, x, y);
        let pixel_resolved = px.is_finite() && py.is_finite();
        let in_domain = pixel_resolved
            && top
                .frame()
                .map_or(true, |frame| frame.contains_pixel(px, py));

        // In wcs mode a non-reference pixel position is derived through the
        // dataset's own WCS, so it is only as good as that WCS's domain.
        let pixel_via_wcs = links.get(top.label()).is_some_and(|link| link.is_wcs());
        let row1_unreliable = !pixel_resolved || (pixel_via_wcs && !in_domain);

        // Without a celestial reference, wcs mode has no shared sky; the
        // topmost dataset's own frame still describes its pixels.
        let reference_frame = self.reference().and_then(Dataset::celestial_frame);
        let world_frame: Option<(&CoordinateFrame, f64, f64)> = match (mode, reference_frame) {
            (AlignMode::Wcs, Some(frame)) => Some((frame, x, y)),
            _ => top.celestial_frame().map(|frame| (frame, px, py)),
        };
        let world = world_frame.map(|(frame, wx, wy)| frame.pixel_to_world(wx, wy));
        let world_valid = world.is_some_and(|(a, b)| a.is_finite() && b.is_finite());

        let row2_unreliable = world.is_some() && !world_valid;
        let row3_unreliable = !in_domain || (world.is_some() && !world_valid);

        let pixel_text = if row1_unreliable {
            String::new()
        } else {
            self.pixel_text(top, px, py)
        };

        let (world_text, decimal_text) = match world {
            Some((ra, dec)) if world_valid && !row3_unreliable => (
                format!(
                    "World {} {} ({})",
                    format_hms(ra, self.config.sexagesimal_decimals),
                    format_dms(dec, self.config.sexagesimal_decimals),
                    self.config.frame_name
                ),
                format!(
                    "{:.prec$} {:.prec$} (deg)",
                    ra,
                    dec,
                    prec = self.config.decimal_decimals
                ),
            ),
            _ => (String::new(), String::new()),
        };

        trace!(
            dataset = top.label(),
            x,
            y,
            px,
            py,
            row1_unreliable,
            row2_unreliable,
            row3_unreliable,
            "Cursor readout"
        );

        CursorReadout {
            pixel_text,
            world_text,
            decimal_text,
            row1_unreliable,
            row2_unreliable,
            row3_unreliable,
            dataset: Some(top.label().to_string()),
            pixel: pixel_resolved.then_some((px, py)),
            world: world.filter(|_| world_valid),
        }
    }

    fn pixel_text(&self, dataset: &Dataset, px: f64, py: f64) -> String {
        let decimals = self.config.pixel_decimals;
        let mut text = format!(
            "Pixel x={} y={}",
            format_pixel(px, decimals),
            format_pixel(py, decimals)
        );
        if let Some(value) = dataset.value_at(px, py) {
            text.push_str(" Value ");
            text.push_str(&format_scientific(f64::from(value), self.config.value_decimals));
            if let Some(unit) = dataset.unit() {
                text.push(' ');
                text.push_str(unit);
            }
        }
        text
    }
}
