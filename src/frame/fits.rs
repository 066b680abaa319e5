use super::sky::{apply_2x2, inverse_tan_project, invert_2x2, normalize_ra, tan_project};
use crate::error::{AlignError, AlignResult};

/// Which half of a longitude/latitude pair an axis type describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkyAxis {
    Longitude,
    Latitude,
}

fn sky_axis(ctype: &str) -> Option<SkyAxis> {
    let head: String = ctype.chars().take(4).collect();
    match head.as_str() {
        "RA--" | "GLON" | "ELON" => Some(SkyAxis::Longitude),
        "DEC-" | "GLAT" | "ELAT" => Some(SkyAxis::Latitude),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Projection {
    Linear,
    Gnomonic,
}

/// FITS-style 2-D WCS: `CRPIX` is 1-based, the CD matrix maps pixel offsets
/// to intermediate world coordinates in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct FitsWcs {
    ctype: [String; 2],
    crpix: [f64; 2],
    crval: [f64; 2],
    cd: [[f64; 2]; 2],
    cd_inv: [[f64; 2]; 2],
    projection: Projection,
    /// Index of the longitude axis; 1 when the header lists latitude first.
    lon_axis: usize,
}

impl FitsWcs {
    pub fn new(
        ctype: [&str; 2],
        crpix: [f64; 2],
        crval: [f64; 2],
        cd: [[f64; 2]; 2],
    ) -> AlignResult<Self> {
        let cd_inv = invert_2x2(&cd)
            .ok_or_else(|| AlignError::InvalidFrame(format!("singular CD matrix {:?}", cd)))?;

        let lon_axis = match (sky_axis(ctype[0]), sky_axis(ctype[1])) {
            (Some(SkyAxis::Longitude), Some(SkyAxis::Latitude)) => Some(0),
            (Some(SkyAxis::Latitude), Some(SkyAxis::Longitude)) => Some(1),
            _ => None,
        };
        let projection = if lon_axis.is_some() {
            let code = |c: &str| c.get(4..).unwrap_or("").trim_start_matches('-').to_string();
            match (code(ctype[0]).as_str(), code(ctype[1]).as_str()) {
                ("TAN", "TAN") => Projection::Gnomonic,
                (a, b) => {
                    return Err(AlignError::InvalidFrame(format!(
                        "unsupported celestial projection {}/{}",
                        a, b
                    )))
                }
            }
        } else {
            Projection::Linear
        };

        Ok(Self {
            ctype: [ctype[0].to_string(), ctype[1].to_string()],
            crpix,
            crval,
            cd,
            cd_inv,
            projection,
            lon_axis: lon_axis.unwrap_or(0),
        })
    }

    /// Build from `CDELT` and an optional `PC` matrix (identity when absent).
    pub fn from_cdelt(
        ctype: [&str; 2],
        crpix: [f64; 2],
        crval: [f64; 2],
        cdelt: [f64; 2],
        pc: Option<[[f64; 2]; 2]>,
    ) -> AlignResult<Self> {
        let pc = pc.unwrap_or([[1.0, 0.0], [0.0, 1.0]]);
        let cd = [
            [cdelt[0] * pc[0][0], cdelt[0] * pc[0][1]],
            [cdelt[1] * pc[1][0], cdelt[1] * pc[1][1]],
        ];
        Self::new(ctype, crpix, crval, cd)
    }

    /// The blank two-axis WCS a FITS reader produces when a header carries no
    /// coordinate keywords: untyped axes, unit scale, world = pixel + 1.
    pub fn blank() -> Self {
        let identity = [[1.0, 0.0], [0.0, 1.0]];
        Self {
            ctype: [String::new(), String::new()],
            crpix: [0.0, 0.0],
            crval: [0.0, 0.0],
            cd: identity,
            cd_inv: identity,
            projection: Projection::Linear,
            lon_axis: 0,
        }
    }

    pub fn ctype(&self) -> [&str; 2] {
        [&self.ctype[0], &self.ctype[1]]
    }

    pub fn crval(&self) -> [f64; 2] {
        self.crval
    }

    pub fn is_celestial(&self) -> bool {
        self.projection == Projection::Gnomonic
    }

    pub fn is_linear(&self) -> bool {
        self.projection == Projection::Linear
    }

    /// Swap an axis-ordered pair into (longitude, latitude) order, or back.
    fn sky_order(&self, pair: (f64, f64)) -> (f64, f64) {
        if self.lon_axis == 1 {
            (pair.1, pair.0)
        } else {
            pair
        }
    }

    /// Reference point as (longitude, latitude).
    fn sky_crval(&self) -> [f64; 2] {
        let (lon, lat) = self.sky_order((self.crval[0], self.crval[1]));
        [lon, lat]
    }

    /// Zero-based pixel to world degrees. Celestial frames return
    /// `(longitude, latitude)` whatever the header's axis order.
    pub fn pixel_to_world(&self, x: f64, y: f64) -> (f64, f64) {
        let dx = x + 1.0 - self.crpix[0];
        let dy = y + 1.0 - self.crpix[1];
        let (u, v) = apply_2x2(&self.cd, dx, dy);
        match self.projection {
            Projection::Linear => (self.crval[0] + u, self.crval[1] + v),
            Projection::Gnomonic => {
                let (xi, eta) = self.sky_order((u, v));
                inverse_tan_project(xi, eta, self.sky_crval())
            }
        }
    }

    /// World degrees to zero-based pixel; NaN when the point cannot be projected.
    pub fn world_to_pixel(&self, a: f64, b: f64) -> (f64, f64) {
        let (u, v) = match self.projection {
            Projection::Linear => (a - self.crval[0], b - self.crval[1]),
            Projection::Gnomonic => match tan_project(normalize_ra(a), b, self.sky_crval()) {
                Some(iwc) => self.sky_order(iwc),
                None => return (f64::NAN, f64::NAN),
            },
        };
        let (dx, dy) = apply_2x2(&self.cd_inv, u, v);
        (dx + self.crpix[0] - 1.0, dy + self.crpix[1] - 1.0)
    }
}
