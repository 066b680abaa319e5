use ndarray::{Array1, Array2};
use serde::Serialize;

/// 2-D affine map `x' = a*x + b*y + c`, `y' = d*x + e*y + f`, stored row-major.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AffineTransform {
    pub matrix: [[f64; 3]; 2],
}

/// Result of a least-squares affine fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineFit {
    pub transform: AffineTransform,
    /// Largest Euclidean residual over the fitted samples, in destination pixels.
    pub max_residual: f64,
}

impl AffineTransform {
    pub fn identity() -> Self {
        Self::translation(0.0, 0.0)
    }

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self {
            matrix: [[1.0, 0.0, dx], [0.0, 1.0, dy]],
        }
    }

    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let m = &self.matrix;
        (
            m[0][0] * x + m[0][1] * y + m[0][2],
            m[1][0] * x + m[1][1] * y + m[1][2],
        )
    }

    pub fn offset(&self) -> (f64, f64) {
        (self.matrix[0][2], self.matrix[1][2])
    }

    pub fn inverse(&self) -> Option<Self> {
        let m = &self.matrix;
        let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
        if det.abs() < 1e-30 || !det.is_finite() {
            return None;
        }
        let a = m[1][1] / det;
        let b = -m[0][1] / det;
        let d = -m[1][0] / det;
        let e = m[0][0] / det;
        Some(Self {
            matrix: [
                [a, b, -(a * m[0][2] + b * m[1][2])],
                [d, e, -(d * m[0][2] + e * m[1][2])],
            ],
        })
    }

    /// Whether the 2x2 linear part equals the identity, `|m - I| <= atol + rtol * |I|`.
    pub fn is_pure_translation(&self, rtol: f64, atol: f64) -> bool {
        let m = &self.matrix;
        [(m[0][0], 1.0), (m[0][1], 0.0), (m[1][0], 0.0), (m[1][1], 1.0)]
            .iter()
            .all(|&(v, expected): &(f64, f64)| (v - expected).abs() <= atol + rtol * expected.abs())
    }

    /// Least-squares fit mapping `src[i]` onto `dst[i]`.
    ///
    /// Returns `None` with fewer than three pairs or a degenerate (collinear) sample.
    pub fn fit(src: &[(f64, f64)], dst: &[(f64, f64)]) -> Option<AffineFit> {
        let n = src.len().min(dst.len());
        if n < 3 {
            return None;
        }

        let design = Array2::from_shape_fn((n, 3), |(i, j)| match j {
            0 => src[i].0,
            1 => src[i].1,
            _ => 1.0,
        });
        let target_x = Array1::from_iter(dst[..n].iter().map(|p| p.0));
        let target_y = Array1::from_iter(dst[..n].iter().map(|p| p.1));

        let normal = design.t().dot(&design);
        let normal = [
            [normal[[0, 0]], normal[[0, 1]], normal[[0, 2]]],
            [normal[[1, 0]], normal[[1, 1]], normal[[1, 2]]],
            [normal[[2, 0]], normal[[2, 1]], normal[[2, 2]]],
        ];
        let rhs_x = design.t().dot(&target_x);
        let rhs_y = design.t().dot(&target_y);

        let row_x = solve_3x3(&normal, &[rhs_x[0], rhs_x[1], rhs_x[2]])?;
        let row_y = solve_3x3(&normal, &[rhs_y[0], rhs_y[1], rhs_y[2]])?;
        let transform = Self {
            matrix: [row_x, row_y],
        };

        let max_residual = src[..n]
            .iter()
            .zip(&dst[..n])
            .map(|(&(sx, sy), &(dx, dy))| {
                let (fx, fy) = transform.apply(sx, sy);
                (fx - dx).hypot(fy - dy)
            })
            .fold(0.0_f64, f64::max);

        Some(AffineFit {
            transform,
            max_residual,
        })
    }
}

/// Solve `A x = b` by Gaussian elimination with partial pivoting.
fn solve_3x3(a: &[[f64; 3]; 3], b: &[f64; 3]) -> Option<[f64; 3]> {
    let mut m = *a;
    let mut rhs = *b;

    let scale = m.iter().flatten().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return None;
    }
    let eps = scale * 1e-12;

    for col in 0..3 {
        let pivot_row = (col..3)
            .max_by(|&i, &j| m[i][col].abs().total_cmp(&m[j][col].abs()))
            .unwrap_or(col);
        if m[pivot_row][col].abs() < eps {
            return None;
        }
        if pivot_row != col {
            m.swap(col, pivot_row);
            rhs.swap(col, pivot_row);
        }

        let pivot = m[col][col];
        for row in (col + 1)..3 {
            let factor = m[row][col] / pivot;
            for j in col..3 {
                m[row][j] -= factor * m[col][j];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = [0.0_f64; 3];
    for i in (0..3).rev() {
        let mut sum = rhs[i];
        for j in (i + 1)..3 {
            sum -= m[i][j] * x[j];
        }
        x[i] = sum / m[i][i];
    }
    Some(x)
}
