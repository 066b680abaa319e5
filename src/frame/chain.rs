use super::sky::{apply_2x2, inverse_tan_project, invert_2x2, normalize_ra, tan_project};
use crate::error::{AlignError, AlignResult};

/// Pixel region, inclusive on both ends, inside which a chain is defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

impl BoundingBox {
    pub fn new(x: (f64, f64), y: (f64, f64)) -> Self {
        Self { x, y }
    }

    /// The conventional box around a `width` x `height` array: half a pixel past each edge.
    pub fn around_extent(width: usize, height: usize) -> Self {
        Self {
            x: (-0.5, width as f64 - 0.5),
            y: (-0.5, height as f64 - 0.5),
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x.0 && x <= self.x.1 && y >= self.y.0 && y <= self.y.1
    }
}

/// One step of a pixel-to-world pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformStep {
    Shift { dx: f64, dy: f64 },
    Scale { sx: f64, sy: f64 },
    Rotation { angle_deg: f64 },
    Matrix([[f64; 2]; 2]),
    /// Tangent-plane degrees to sky degrees around `crval`. Only valid as the last step.
    Gnomonic { crval: [f64; 2] },
}

impl TransformStep {
    fn forward(&self, u: f64, v: f64) -> (f64, f64) {
        match self {
            Self::Shift { dx, dy } => (u + dx, v + dy),
            Self::Scale { sx, sy } => (u * sx, v * sy),
            Self::Rotation { angle_deg } => {
                let (s, c) = angle_deg.to_radians().sin_cos();
                (c * u - s * v, s * u + c * v)
            }
            Self::Matrix(m) => apply_2x2(m, u, v),
            Self::Gnomonic { crval } => inverse_tan_project(u, v, *crval),
        }
    }

    fn inverse(&self, u: f64, v: f64) -> (f64, f64) {
        match self {
            Self::Shift { dx, dy } => (u - dx, v - dy),
            Self::Scale { sx, sy } => (u / sx, v / sy),
            Self::Rotation { angle_deg } => {
                let (s, c) = angle_deg.to_radians().sin_cos();
                (c * u + s * v, -s * u + c * v)
            }
            Self::Matrix(m) => match invert_2x2(m) {
                Some(inv) => apply_2x2(&inv, u, v),
                None => (f64::NAN, f64::NAN),
            },
            Self::Gnomonic { crval } => {
                tan_project(normalize_ra(u), v, *crval).unwrap_or((f64::NAN, f64::NAN))
            }
        }
    }

    fn is_linear(&self) -> bool {
        !matches!(self, Self::Gnomonic { .. })
    }
}

/// gwcs-style transform pipeline with an optional bounding box.
///
/// Pixels outside the bounding box evaluate to NaN in both directions;
/// the chain never extrapolates.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformChain {
    steps: Vec<TransformStep>,
    bounding_box: Option<BoundingBox>,
}

impl TransformChain {
    pub fn new(steps: Vec<TransformStep>, bounding_box: Option<BoundingBox>) -> AlignResult<Self> {
        if steps.is_empty() {
            return Err(AlignError::InvalidFrame("transform chain has no steps".into()));
        }
        for (i, step) in steps.iter().enumerate() {
            match step {
                TransformStep::Gnomonic { .. } if i + 1 != steps.len() => {
                    return Err(AlignError::InvalidFrame(
                        "gnomonic projection must be the last step".into(),
                    ));
                }
                TransformStep::Scale { sx, sy } if *sx == 0.0 || *sy == 0.0 => {
                    return Err(AlignError::InvalidFrame("zero scale factor".into()));
                }
                TransformStep::Matrix(m) if invert_2x2(m).is_none() => {
                    return Err(AlignError::InvalidFrame(format!("singular matrix {:?}", m)));
                }
                _ => {}
            }
        }
        Ok(Self {
            steps,
            bounding_box,
        })
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        self.bounding_box.as_ref()
    }

    pub fn is_celestial(&self) -> bool {
        matches!(self.steps.last(), Some(TransformStep::Gnomonic { .. }))
    }

    pub fn is_linear(&self) -> bool {
        self.steps.iter().all(TransformStep::is_linear)
    }

    pub fn pixel_to_world(&self, x: f64, y: f64) -> (f64, f64) {
        if let Some(bbox) = &self.bounding_box {
            if !bbox.contains(x, y) {
                return (f64::NAN, f64::NAN);
            }
        }
        self.steps
            .iter()
            .fold((x, y), |(u, v), step| step.forward(u, v))
    }

    pub fn world_to_pixel(&self, a: f64, b: f64) -> (f64, f64) {
        let (x, y) = self
            .steps
            .iter()
            .rev()
            .fold((a, b), |(u, v), step| step.inverse(u, v));
        match &self.bounding_box {
            Some(bbox) if !bbox.contains(x, y) => (f64::NAN, f64::NAN),
            _ => (x, y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotated_chain() -> TransformChain {
        TransformChain::new(
            vec![
                TransformStep::Shift { dx: -4.5, dy: -4.5 },
                TransformStep::Scale { sx: 0.0001, sy: 0.0001 },
                TransformStep::Rotation { angle_deg: 30.0 },
                TransformStep::Gnomonic { crval: [3.58, -30.39] },
            ],
            Some(BoundingBox::around_extent(10, 10)),
        )
        .unwrap()
    }

    #[test]
    fn test_chain_roundtrip_inside_box() {
        let chain = rotated_chain();
        let (ra, dec) = chain.pixel_to_world(2.0, 8.0);
        let (x, y) = chain.world_to_pixel(ra, dec);
        assert!((x - 2.0).abs() < 1e-6);
        assert!((y - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_outside_box_is_nan() {
        let chain = rotated_chain();
        let (ra, dec) = chain.pixel_to_world(-1.0, -1.0);
        assert!(ra.is_nan() && dec.is_nan());
    }

    #[test]
    fn test_inverse_outside_box_is_nan() {
        let chain = rotated_chain();
        let unbounded = TransformChain::new(chain.steps().to_vec(), None).unwrap();
        let (ra, dec) = unbounded.pixel_to_world(-3.0, -3.0);
        let (x, y) = chain.world_to_pixel(ra, dec);
        assert!(x.is_nan() && y.is_nan());
    }

    #[test]
    fn test_gnomonic_must_be_last() {
        let err = TransformChain::new(
            vec![
                TransformStep::Gnomonic { crval: [0.0, 0.0] },
                TransformStep::Shift { dx: 1.0, dy: 1.0 },
            ],
            None,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_linear_chain_flags() {
        let chain = TransformChain::new(vec![TransformStep::Shift { dx: 1.0, dy: 2.0 }], None).unwrap();
        assert!(chain.is_linear());
        assert!(!chain.is_celestial());
        assert_eq!(chain.pixel_to_world(1.0, 1.0), (2.0, 3.0));
    }
}
