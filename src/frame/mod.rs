//! Per-dataset pixel/world coordinate frames.
//!
//! A frame is either a FITS-style WCS or a gwcs-style transform chain. Both
//! expose the same pixel/world pair and a capability summary used by link
//! selection.

pub mod chain;
pub mod fits;
pub mod sky;

pub use chain::{BoundingBox, TransformChain, TransformStep};
pub use fits::FitsWcs;

use serde::Serialize;
use sky::wrap_delta;

/// Capability summary of a frame over a given footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameCapabilities {
    pub is_celestial: bool,
    pub is_affine: bool,
    pub has_bounding_domain: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateFrame {
    Fits(FitsWcs),
    Chain(TransformChain),
}

impl From<FitsWcs> for CoordinateFrame {
    fn from(wcs: FitsWcs) -> Self {
        Self::Fits(wcs)
    }
}

impl From<TransformChain> for CoordinateFrame {
    fn from(chain: TransformChain) -> Self {
        Self::Chain(chain)
    }
}

impl CoordinateFrame {
    /// Zero-based pixel to world. Celestial frames return `(ra, dec)` degrees.
    pub fn pixel_to_world(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Self::Fits(wcs) => wcs.pixel_to_world(x, y),
            Self::Chain(chain) => chain.pixel_to_world(x, y),
        }
    }

    pub fn world_to_pixel(&self, a: f64, b: f64) -> (f64, f64) {
        match self {
            Self::Fits(wcs) => wcs.world_to_pixel(a, b),
            Self::Chain(chain) => chain.world_to_pixel(a, b),
        }
    }

    pub fn is_celestial(&self) -> bool {
        match self {
            Self::Fits(wcs) => wcs.is_celestial(),
            Self::Chain(chain) => chain.is_celestial(),
        }
    }

    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        match self {
            Self::Fits(_) => None,
            Self::Chain(chain) => chain.bounding_box(),
        }
    }

    /// Whether the transform is defined at this pixel. Frames without a
    /// bounding domain are defined everywhere.
    pub fn contains_pixel(&self, x: f64, y: f64) -> bool {
        self.bounding_box().map_or(true, |bbox| bbox.contains(x, y))
    }

    fn is_analytically_linear(&self) -> bool {
        match self {
            Self::Fits(wcs) => wcs.is_linear(),
            Self::Chain(chain) => chain.is_linear(),
        }
    }

    /// Classify the frame over a `width` x `height` footprint.
    ///
    /// Affinity compares the local Jacobian at the footprint corners against
    /// the Jacobian at its centre, relative to the centre Jacobian's largest entry.
    pub fn classify(&self, width: usize, height: usize, affine_rtol: f64) -> FrameCapabilities {
        let is_affine = self.is_analytically_linear()
            || self.jacobian_is_constant(width, height, affine_rtol);

        FrameCapabilities {
            is_celestial: self.is_celestial(),
            is_affine,
            has_bounding_domain: self.bounding_box().is_some(),
        }
    }

    fn jacobian_is_constant(&self, width: usize, height: usize, rtol: f64) -> bool {
        let x_max = width.saturating_sub(1) as f64;
        let y_max = height.saturating_sub(1) as f64;
        let centre = self.jacobian(x_max / 2.0, y_max / 2.0);
        let scale = centre
            .iter()
            .flatten()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if !scale.is_finite() || scale == 0.0 {
            return false;
        }

        [(0.0, 0.0), (x_max, 0.0), (0.0, y_max), (x_max, y_max)]
            .iter()
            .all(|&(x, y)| {
                let j = self.jacobian(x, y);
                j.iter()
                    .flatten()
                    .zip(centre.iter().flatten())
                    .all(|(a, b)| (a - b).abs() <= rtol * scale)
            })
    }

    /// Central-difference Jacobian of pixel-to-world at `(x, y)`, NaN where undefined.
    fn jacobian(&self, x: f64, y: f64) -> [[f64; 2]; 2] {
        const H: f64 = 0.5;
        let celestial = self.is_celestial();
        let diff = |a: (f64, f64), b: (f64, f64)| {
            let du = if celestial { wrap_delta(a.0, b.0) } else { a.0 - b.0 };
            (du / (2.0 * H), (a.1 - b.1) / (2.0 * H))
        };
        let (dudx, dvdx) = diff(self.pixel_to_world(x + H, y), self.pixel_to_world(x - H, y));
        let (dudy, dvdy) = diff(self.pixel_to_world(x, y + H), self.pixel_to_world(x, y - H));
        [[dudx, dudy], [dvdx, dvdy]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tan_frame() -> CoordinateFrame {
        FitsWcs::from_cdelt(
            ["RA---TAN", "DEC--TAN"],
            [1.0, 1.0],
            [337.5202808, -20.83333306],
            [-0.0002777777778, 0.0002777777778],
            None,
        )
        .unwrap()
        .into()
    }

    #[test]
    fn test_classify_small_tan_footprint_is_affine() {
        let caps = tan_frame().classify(10, 10, 1e-3);
        assert!(caps.is_celestial);
        assert!(caps.is_affine);
        assert!(!caps.has_bounding_domain);
    }

    #[test]
    fn test_classify_wide_tan_footprint_is_not_affine() {
        let wide: CoordinateFrame = FitsWcs::from_cdelt(
            ["RA---TAN", "DEC--TAN"],
            [1.0, 1.0],
            [0.0, 60.0],
            [-0.1, 0.1],
            None,
        )
        .unwrap()
        .into();
        assert!(!wide.classify(400, 400, 1e-3).is_affine);
    }

    #[test]
    fn test_classify_blank_wcs() {
        let caps = CoordinateFrame::from(FitsWcs::blank()).classify(10, 10, 1e-3);
        assert!(!caps.is_celestial);
        assert!(caps.is_affine);
    }

    #[test]
    fn test_bounded_chain_reports_domain() {
        let chain = TransformChain::new(
            vec![
                TransformStep::Scale { sx: 0.0001, sy: 0.0001 },
                TransformStep::Gnomonic { crval: [10.0, 10.0] },
            ],
            Some(BoundingBox::around_extent(8, 8)),
        )
        .unwrap();
        let frame = CoordinateFrame::from(chain);
        let caps = frame.classify(8, 8, 1e-3);
        assert!(caps.has_bounding_domain);
        assert!(caps.is_celestial);
        assert!(frame.contains_pixel(0.0, 0.0));
        assert!(!frame.contains_pixel(-1.0, -1.0));
    }
}
