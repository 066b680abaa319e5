//! Links between each loaded dataset and the reference dataset.
//!
//! A link maps source pixels onto reference pixels. Its kind is chosen once
//! when alignment is computed; evaluation then dispatches on that kind.

pub mod affine;
pub mod selector;

pub use affine::{AffineFit, AffineTransform};
pub use selector::LinkSelector;

use crate::data::Dataset;
use crate::error::AlignError;
use crate::frame::CoordinateFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How datasets are aligned to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignMode {
    #[default]
    Pixels,
    Wcs,
}

impl FromStr for AlignMode {
    type Err = AlignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pixels" => Ok(Self::Pixels),
            "wcs" => Ok(Self::Wcs),
            _ => Err(AlignError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for AlignMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pixels => "pixels",
            Self::Wcs => "wcs",
        })
    }
}

/// What to do with a dataset that cannot be linked by WCS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackScheme {
    /// Link by pixels instead.
    #[default]
    Pixels,
    /// Refuse to link; realignment fails.
    None,
}

impl FromStr for FallbackScheme {
    type Err = AlignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pixels" => Ok(Self::Pixels),
            "none" => Ok(Self::None),
            _ => Err(AlignError::InvalidMode(s.to_string())),
        }
    }
}

/// Arguments of one realignment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkOptions {
    pub mode: AlignMode,
    pub fallback: FallbackScheme,
    pub fast_approximation: bool,
    /// Reference dataset label; the first loaded dataset when `None`.
    pub reference: Option<String>,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            mode: AlignMode::Pixels,
            fallback: FallbackScheme::Pixels,
            fast_approximation: true,
            reference: None,
        }
    }
}

impl LinkOptions {
    pub fn pixels() -> Self {
        Self::default()
    }

    pub fn wcs() -> Self {
        Self {
            mode: AlignMode::Wcs,
            ..Self::default()
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackScheme) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_fast_approximation(mut self, enabled: bool) -> Self {
        self.fast_approximation = enabled;
        self
    }

    pub fn with_reference(mut self, label: impl Into<String>) -> Self {
        self.reference = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum LinkKind {
    Identity,
    Offset { dx: f64, dy: f64 },
    Affine(AffineTransform),
    FullWcs,
}

impl LinkKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Offset { .. } => "offset",
            Self::Affine(_) => "affine",
            Self::FullWcs => "full_wcs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkDescriptor {
    pub source: String,
    pub reference: String,
    pub kind: LinkKind,
    /// Set when WCS linking was requested but the pixel fallback was applied.
    pub pixel_fallback: bool,
}

/// The frames a link needs for exact evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkFrames<'a> {
    pub source: Option<&'a CoordinateFrame>,
    pub reference: Option<&'a CoordinateFrame>,
}

impl LinkDescriptor {
    /// Source pixel to reference pixel.
    pub fn forward(&self, frames: LinkFrames<'_>, x: f64, y: f64) -> (f64, f64) {
        match &self.kind {
            LinkKind::Identity => (x, y),
            LinkKind::Offset { dx, dy } => (x + dx, y + dy),
            LinkKind::Affine(t) => t.apply(x, y),
            LinkKind::FullWcs => match (frames.source, frames.reference) {
                (Some(src), Some(reference)) => {
                    let (a, b) = src.pixel_to_world(x, y);
                    reference.world_to_pixel(a, b)
                }
                _ => (f64::NAN, f64::NAN),
            },
        }
    }

    /// Reference pixel to source pixel.
    pub fn inverse(&self, frames: LinkFrames<'_>, x: f64, y: f64) -> (f64, f64) {
        match &self.kind {
            LinkKind::Identity => (x, y),
            LinkKind::Offset { dx, dy } => (x - dx, y - dy),
            LinkKind::Affine(t) => match t.inverse() {
                Some(inv) => inv.apply(x, y),
                None => (f64::NAN, f64::NAN),
            },
            LinkKind::FullWcs => match (frames.source, frames.reference) {
                (Some(src), Some(reference)) => {
                    let (a, b) = reference.pixel_to_world(x, y);
                    src.world_to_pixel(a, b)
                }
                _ => (f64::NAN, f64::NAN),
            },
        }
    }

    /// Whether the link goes through the datasets' WCS rather than raw pixels.
    pub fn is_wcs(&self) -> bool {
        !matches!(self.kind, LinkKind::Identity)
    }
}

/// Every link computed by one realignment, plus the reference they point at.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LinkSet {
    pub mode: AlignMode,
    pub reference: Option<String>,
    pub links: Vec<LinkDescriptor>,
}

impl LinkSet {
    pub fn empty(mode: AlignMode) -> Self {
        Self {
            mode,
            reference: None,
            links: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkDescriptor> {
        self.links.iter()
    }

    pub fn get(&self, source: &str) -> Option<&LinkDescriptor> {
        self.links.iter().find(|link| link.source == source)
    }

    /// Map a point in the reference's pixel space into `dataset`'s pixels.
    ///
    /// The reference maps to itself; a dataset without a link is treated as
    /// pixel-aligned.
    pub fn reference_to_dataset(&self, datasets: &[Dataset], dataset: &Dataset, x: f64, y: f64) -> (f64, f64) {
        match self.get(dataset.label()) {
            Some(link) => {
                let reference = datasets.iter().find(|d| d.label() == link.reference);
                let frames = LinkFrames {
                    source: dataset.frame(),
                    reference: reference.and_then(Dataset::frame),
                };
                link.inverse(frames, x, y)
            }
            None => (x, y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_mode_parsing() {
        assert_eq!("pixels".parse::<AlignMode>().unwrap(), AlignMode::Pixels);
        assert_eq!("WCS".parse::<AlignMode>().unwrap(), AlignMode::Wcs);
        assert_eq!(
            "foo".parse::<AlignMode>(),
            Err(AlignError::InvalidMode("foo".to_string()))
        );
    }

    #[test]
    fn test_fallback_parsing() {
        assert_eq!("none".parse::<FallbackScheme>().unwrap(), FallbackScheme::None);
        assert_eq!("pixels".parse::<FallbackScheme>().unwrap(), FallbackScheme::Pixels);
        assert!("sky".parse::<FallbackScheme>().is_err());
    }

    #[test]
    fn test_offset_link_roundtrip() {
        let link = LinkDescriptor {
            source: "b".into(),
            reference: "a".into(),
            kind: LinkKind::Offset { dx: -1.0, dy: 0.5 },
            pixel_fallback: false,
        };
        let frames = LinkFrames::default();
        let (rx, ry) = link.forward(frames, 3.0, 4.0);
        assert_eq!((rx, ry), (2.0, 4.5));
        assert_eq!(link.inverse(frames, rx, ry), (3.0, 4.0));
    }

    #[test]
    fn test_full_wcs_without_frames_is_nan() {
        let link = LinkDescriptor {
            source: "b".into(),
            reference: "a".into(),
            kind: LinkKind::FullWcs,
            pixel_fallback: false,
        };
        let (x, y) = link.forward(LinkFrames::default(), 1.0, 1.0);
        assert!(x.is_nan() && y.is_nan());
    }
}
