use crate::frame::sky::angular_separation;
use crate::frame::CoordinateFrame;
use serde::Serialize;

/// Geometric shape of a spatial subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Region {
    Circle { center: (f64, f64), radius: f64 },
    Rectangle { min: (f64, f64), max: (f64, f64) },
    Polygon { vertices: Vec<(f64, f64)> },
}

/// Coordinate space a region is expressed in. Sky regions use degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionCoords {
    Pixel,
    Sky,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subset {
    pub label: String,
    pub region: Region,
    pub coords: RegionCoords,
}

impl Region {
    pub fn center(&self) -> (f64, f64) {
        match self {
            Self::Circle { center, .. } => *center,
            Self::Rectangle { min, max } => ((min.0 + max.0) / 2.0, (min.1 + max.1) / 2.0),
            Self::Polygon { vertices } => {
                let n = vertices.len().max(1) as f64;
                let (sx, sy) = vertices
                    .iter()
                    .fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
                (sx / n, sy / n)
            }
        }
    }
}

impl Subset {
    /// Express a pixel subset on the sky through `frame`.
    ///
    /// Sky subsets are returned unchanged. `None` when the frame is not
    /// celestial or any point falls outside its domain. Rectangles become
    /// polygons since the frame may rotate them.
    pub fn to_sky(&self, frame: &CoordinateFrame) -> Option<Subset> {
        if self.coords == RegionCoords::Sky {
            return Some(self.clone());
        }
        if !frame.is_celestial() {
            return None;
        }

        let world = |(x, y): (f64, f64)| {
            let (a, b) = frame.pixel_to_world(x, y);
            (a.is_finite() && b.is_finite()).then_some((a, b))
        };

        let region = match &self.region {
            Region::Circle { center, radius } => {
                let c = world(*center)?;
                let edge = world((center.0 + radius, center.1))?;
                Region::Circle {
                    center: c,
                    radius: angular_separation(c.0, c.1, edge.0, edge.1),
                }
            }
            Region::Rectangle { min, max } => Region::Polygon {
                vertices: [*min, (max.0, min.1), *max, (min.0, max.1)]
                    .into_iter()
                    .map(world)
                    .collect::<Option<Vec<_>>>()?,
            },
            Region::Polygon { vertices } => Region::Polygon {
                vertices: vertices
                    .iter()
                    .copied()
                    .map(world)
                    .collect::<Option<Vec<_>>>()?,
            },
        };

        Some(Subset {
            label: self.label.clone(),
            region,
            coords: RegionCoords::Sky,
        })
    }
}
