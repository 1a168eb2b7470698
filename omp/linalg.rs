//! Thin helpers over `ndarray-linalg` shared by [`crate::basis`] and [`crate::pair`].

use crate::error::OmpError;
use ndarray::{Array1, Array2, ArrayView1, Zip, s};
use ndarray_linalg::SVD;

/// Full singular value decomposition `A = U · diag(s) · Vᵀ`.
///
/// For an `m×n` matrix `u` is `m×m`, `vt` is `n×n` and `s` holds the
/// `min(m, n)` singular values in descending order.
#[derive(Debug, Clone)]
pub struct Svd {
    pub u: Array2<f64>,
    pub s: Array1<f64>,
    pub vt: Array2<f64>,
}

impl Svd {
    pub fn compute(a: &Array2<f64>) -> Result<Self, OmpError> {
        let (u, s, vt) = a.svd(true, true)?;
        Ok(Self {
            u: u.expect("U was requested from the SVD"),
            s,
            vt: vt.expect("Vᵀ was requested from the SVD"),
        })
    }

    /// Minimum-norm least-squares solution of `A x = rhs`. Singular values below
    /// `max(m, n) · ε · s_max` are treated as zero.
    pub fn pseudo_solve(&self, rhs: ArrayView1<f64>) -> Array1<f64> {
        let k = self.s.len();
        let s_max = self.s.iter().copied().fold(0.0, f64::max);
        let tol = self.u.nrows().max(self.vt.ncols()) as f64 * f64::EPSILON * s_max;

        let projected = self.u.slice(s![.., ..k]).t().dot(&rhs);
        let scaled = Zip::from(&projected)
            .and(&self.s)
            .map_collect(|&p, &sigma| if sigma > tol { p / sigma } else { 0.0 });
        self.vt.slice(s![..k, ..]).t().dot(&scaled)
    }
}

/// 2-norm condition number `s_max / s_min`; infinite when `s_min` is zero.
pub fn condition_number(a: &Array2<f64>) -> Result<f64, OmpError> {
    let (_, singular_values, _) = a.svd(false, false)?;
    let s_max = singular_values.iter().copied().fold(0.0, f64::max);
    let s_min = singular_values.iter().copied().fold(f64::INFINITY, f64::min);
    if s_min > 0.0 {
        Ok(s_max / s_min)
    } else {
        Ok(f64::INFINITY)
    }
}
