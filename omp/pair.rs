//! # Measurement / target basis pairs
//!
//! A [`BasisPair`] couples a measurement basis `Wm` with a target basis `Vn`
//! (`m ≥ n`). The cross-Grammian `G[i, j] = ⟨w_i, v_j⟩` and its SVD give the
//! inf-sup stability constant `beta` and the optimal (PBDW) reconstruction of a
//! function from its `m` measurements.
//!
//! A pair built by [`BasisPair::make_favorable_basis`] is *favorable*: both bases
//! are rotated by the singular vectors, the cross-Grammian is diagonal, and the
//! reconstruction reduces to a division by the singular values.

use crate::basis::Basis;
use crate::error::OmpError;
use crate::linalg::{Svd, condition_number};
use crate::vector::Vector;
use ndarray::{Array1, Array2, ArrayView1, s};
use ndarray_linalg::SolveC;
use std::borrow::Cow;
use std::cell::OnceCell;

/// Everything produced by one optimal reconstruction.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    /// `v* + Wm.reconstruct(w − Wm.dot(v*))`: the target-space estimate corrected
    /// by the measurement residual.
    pub u_star: Vector,
    /// The target-space estimate.
    pub v_star: Vector,
    /// `Wm.reconstruct(w)`, the reconstruction from measurements alone.
    pub w_reconstruction: Vector,
    /// `Wm.reconstruct(Wm.dot(v*))`.
    pub v_star_measured: Vector,
    /// 2-norm condition number of `GᵀG`.
    pub condition: f64,
}

#[derive(Debug, Clone)]
pub struct BasisPair<'a> {
    wm: Cow<'a, Basis>,
    vn: Cow<'a, Basis>,
    cross_grammian: OnceCell<Array2<f64>>,
    svd: OnceCell<Svd>,
    favorable: bool,
}

impl<'a> BasisPair<'a> {
    /// Pairs the measurement basis `wm` with the target basis `vn`. Fails when
    /// `wm` has fewer vectors than `vn`, or when `vn` is empty.
    pub fn new(wm: &'a Basis, vn: &'a Basis) -> Result<Self, OmpError> {
        if vn.n() > wm.n() {
            return Err(OmpError::DimensionMismatch {
                context: "measurement space (must not be smaller than target space)",
                expected: vn.n(),
                found: wm.n(),
            });
        }
        if vn.is_empty() {
            return Err(OmpError::DimensionMismatch {
                context: "target space (must not be empty)",
                expected: 1,
                found: 0,
            });
        }
        Ok(Self {
            wm: Cow::Borrowed(wm),
            vn: Cow::Borrowed(vn),
            cross_grammian: OnceCell::new(),
            svd: OnceCell::new(),
            favorable: false,
        })
    }

    pub fn m(&self) -> usize {
        self.wm.n()
    }

    pub fn n(&self) -> usize {
        self.vn.n()
    }

    pub fn wm(&self) -> &Basis {
        &self.wm
    }

    pub fn vn(&self) -> &Basis {
        &self.vn
    }

    pub fn is_favorable(&self) -> bool {
        self.favorable
    }

    /// The `m×n` cross-Grammian, computed on first access.
    pub fn cross_grammian(&self) -> &Array2<f64> {
        self.cross_grammian
            .get_or_init(|| self.wm.cross_grammian(&self.vn))
    }

    /// Full SVD of the cross-Grammian, computed on first access.
    pub fn svd(&self) -> Result<&Svd, OmpError> {
        if let Some(svd) = self.svd.get() {
            return Ok(svd);
        }
        let svd = Svd::compute(self.cross_grammian())?;
        Ok(self.svd.get_or_init(|| svd))
    }

    /// The inf-sup stability constant: the smallest singular value of the
    /// cross-Grammian.
    pub fn beta(&self) -> Result<f64, OmpError> {
        let sigma = &self.svd()?.s;
        Ok(sigma[sigma.len() - 1])
    }

    /// Rotates `Wm` by `Uᵀ` and `Vn` by `Vᵀ` so that the cross-Grammian of the
    /// returned pair is `diag(S)`. Both bases must be orthonormal. On a pair that
    /// is already favorable this returns a copy of it.
    pub fn make_favorable_basis(&self) -> Result<BasisPair<'a>, OmpError> {
        if self.favorable {
            return Ok(self.clone());
        }
        if !self.wm.is_orthonormal() || !self.vn.is_orthonormal() {
            return Err(OmpError::CapabilityViolation(
                "both Wm and Vn must be orthonormal to calculate the favorable basis",
            ));
        }

        let (m, n) = (self.m(), self.n());
        let svd = self.svd()?;
        let wm = self.wm.ortho_matrix_multiply(svd.u.t())?;
        let vn = self.vn.ortho_matrix_multiply(svd.vt.view())?;

        let mut diagonal = Array2::zeros((m, n));
        for (i, &sigma) in svd.s.iter().enumerate() {
            diagonal[[i, i]] = sigma;
        }

        Ok(BasisPair {
            wm: Cow::Owned(wm),
            vn: Cow::Owned(vn),
            cross_grammian: OnceCell::from(diagonal),
            svd: OnceCell::from(Svd {
                u: Array2::eye(m),
                s: svd.s.clone(),
                vt: Array2::eye(n),
            }),
            favorable: true,
        })
    }

    /// Measures `u` against `Wm` and reconstructs it.
    pub fn measure_and_reconstruct(&self, u: &Vector) -> Result<Reconstruction, OmpError> {
        let w = self.wm.dot(u);
        self.optimal_reconstruction(w.view())
    }

    /// Optimal reconstruction from the measurement coefficients `w`, expressed
    /// against `Wm`.
    ///
    /// The target coefficients solve the normal equations `(GᵀG) c = Gᵀ w`. If they
    /// are singular a warning is logged and `v*` is the zero function. On a
    /// favorable pair `c = w[..n] / S`, with the same zero fallback when the
    /// smallest singular value vanishes.
    pub fn optimal_reconstruction(&self, w: ArrayView1<f64>) -> Result<Reconstruction, OmpError> {
        if w.len() != self.m() {
            return Err(OmpError::DimensionMismatch {
                context: "measurement vector",
                expected: self.m(),
                found: w.len(),
            });
        }

        let (v_star, correction, condition) = if self.favorable {
            self.favorable_estimate(w)?
        } else {
            self.least_squares_estimate(w)?
        };
        log::debug!("Condition number of GᵀG = {condition:.6e}");

        let u_star = &v_star + &self.wm.reconstruct(correction.view())?;
        let w_reconstruction = self.wm.reconstruct(w)?;
        let v_star_measured = self.wm.reconstruct(self.wm.dot(&v_star).view())?;

        Ok(Reconstruction {
            u_star,
            v_star,
            w_reconstruction,
            v_star_measured,
            condition,
        })
    }

    fn least_squares_estimate(
        &self,
        w: ArrayView1<f64>,
    ) -> Result<(Vector, Array1<f64>, f64), OmpError> {
        let g = self.cross_grammian();
        let gtg = g.t().dot(g);
        let rhs = g.t().dot(&w);

        let c = match gtg.solvec(&rhs) {
            Ok(c) => c,
            Err(_) => {
                self.warn_singular();
                Array1::zeros(self.n())
            }
        };

        let v_star = self.vn.reconstruct(c.view())?;
        let correction = &w - &self.wm.dot(&v_star);
        let condition = condition_number(&gtg)?;
        Ok((v_star, correction, condition))
    }

    fn favorable_estimate(
        &self,
        w: ArrayView1<f64>,
    ) -> Result<(Vector, Array1<f64>, f64), OmpError> {
        let n = self.n();
        let sigma = &self.svd()?.s;
        let tol = self.m().max(n) as f64 * f64::EPSILON * sigma[0];

        if sigma[n - 1] <= tol {
            self.warn_singular();
            return Ok((Vector::new(), w.to_owned(), f64::INFINITY));
        }

        let c = &w.slice(s![..n]) / sigma;
        let v_star = self.vn.reconstruct(c.view())?;

        let mut tail = w.to_owned();
        tail.slice_mut(s![..n]).fill(0.0);

        let ratio = sigma[0] / sigma[n - 1];
        Ok((v_star, tail, ratio * ratio))
    }

    fn warn_singular(&self) {
        log::warn!(
            "{} Unstable v* calculation, returning the zero function.",
            OmpError::SingularSystem {
                m: self.m(),
                n: self.n()
            }
        );
    }
}
