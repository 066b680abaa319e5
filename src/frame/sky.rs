//! Spherical helpers for the gnomonic (TAN) projection.
//!
//! All public functions take and return degrees; the trigonometry runs in radians.

/// Forward gnomonic projection of `(ra, dec)` onto the tangent plane at `crval`.
///
/// Returns intermediate world coordinates `(xi, eta)` in degrees, or `None`
/// when the point is on or behind the tangent plane.
pub fn tan_project(ra: f64, dec: f64, crval: [f64; 2]) -> Option<(f64, f64)> {
    let (ra, dec) = (ra.to_radians(), dec.to_radians());
    let (ra0, dec0) = (crval[0].to_radians(), crval[1].to_radians());

    let da = ra - ra0;
    let (sin_dec, cos_dec) = dec.sin_cos();
    let (sin_dec0, cos_dec0) = dec0.sin_cos();
    let cos_da = da.cos();

    let denom = sin_dec * sin_dec0 + cos_dec * cos_dec0 * cos_da;
    if denom <= 1e-12 {
        return None;
    }

    let xi = cos_dec * da.sin() / denom;
    let eta = (sin_dec * cos_dec0 - cos_dec * sin_dec0 * cos_da) / denom;
    Some((xi.to_degrees(), eta.to_degrees()))
}

/// Inverse gnomonic projection of tangent-plane `(xi, eta)` degrees at `crval`.
pub fn inverse_tan_project(xi: f64, eta: f64, crval: [f64; 2]) -> (f64, f64) {
    let (xi, eta) = (xi.to_radians(), eta.to_radians());
    let rho_sq = xi * xi + eta * eta;

    if rho_sq < 1e-30 {
        return (normalize_ra(crval[0]), crval[1]);
    }

    let (ra0, dec0) = (crval[0].to_radians(), crval[1].to_radians());
    let (sin_dec0, cos_dec0) = dec0.sin_cos();
    let rho = rho_sq.sqrt();
    let c = rho.atan();
    let (sin_c, cos_c) = c.sin_cos();

    let dec = (cos_c * sin_dec0 + eta * sin_c * cos_dec0 / rho).asin();
    let ra = ra0 + (xi * sin_c).atan2(rho * cos_dec0 * cos_c - eta * sin_dec0 * sin_c);
    (normalize_ra(ra.to_degrees()), dec.to_degrees())
}

/// Wrap a longitude into `[0, 360)`.
pub fn normalize_ra(ra: f64) -> f64 {
    let wrapped = ra.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed longitude difference `a - b` wrapped into `(-180, 180]`.
pub fn wrap_delta(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Great-circle separation in degrees (haversine form).
pub fn angular_separation(ra0: f64, dec0: f64, ra1: f64, dec1: f64) -> f64 {
    let (dec0, dec1) = (dec0.to_radians(), dec1.to_radians());
    let dra = (ra1 - ra0).to_radians();
    let ddec = dec1 - dec0;
    let a = (ddec / 2.0).sin().powi(2) + dec0.cos() * dec1.cos() * (dra / 2.0).sin().powi(2);
    (2.0 * a.sqrt().min(1.0).asin()).to_degrees()
}

/// Invert a 2x2 matrix, `None` when singular.
pub fn invert_2x2(m: &[[f64; 2]; 2]) -> Option<[[f64; 2]; 2]> {
    let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
    if det.abs() < 1e-30 || !det.is_finite() {
        return None;
    }
    let inv_det = 1.0 / det;
    Some([
        [m[1][1] * inv_det, -m[0][1] * inv_det],
        [-m[1][0] * inv_det, m[0][0] * inv_det],
    ])
}

#[inline]
pub fn apply_2x2(m: &[[f64; 2]; 2], u: f64, v: f64) -> (f64, f64) {
    (m[0][0] * u + m[0][1] * v, m[1][0] * u + m[1][1] * v)
}
