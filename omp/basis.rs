//! # Bases of analytic vectors
//!
//! A [`Basis`] owns an ordered list of [`Vector`]s together with the artifacts
//! derived from them: the Grammian, its SVD (only needed when the Grammian is
//! singular) and an orthonormal companion basis. Each artifact lives in its own
//! `OnceCell`, filled on first use through `&self`. The only structural mutation,
//! [`Basis::add_vector`], takes `&mut self` and updates or resets every cell, so a
//! stale cache cannot be observed.

use crate::error::OmpError;
use crate::linalg::Svd;
use crate::vector::Vector;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};
use ndarray_linalg::{Cholesky, Inverse, SolveC, UPLO};
use std::cell::OnceCell;

#[derive(Debug, Clone)]
pub struct Basis {
    vecs: Vec<Vector>,
    /// Set when the Grammian is known to be the identity. Never verified.
    orthonormal: bool,
    grammian: OnceCell<Array2<f64>>,
    grammian_svd: OnceCell<Svd>,
    orthonormal_basis: OnceCell<Box<Basis>>,
}

impl Basis {
    pub fn new(vecs: Vec<Vector>) -> Self {
        Self {
            vecs,
            orthonormal: false,
            grammian: OnceCell::new(),
            grammian_svd: OnceCell::new(),
            orthonormal_basis: OnceCell::new(),
        }
    }

    /// A basis the caller asserts to be orthonormal. Projection becomes a plain
    /// dot product and [`Basis::orthonormalise`] returns the receiver.
    pub fn new_orthonormal(vecs: Vec<Vector>) -> Self {
        Self {
            orthonormal: true,
            ..Self::new(vecs)
        }
    }

    /// Number of vectors.
    pub fn n(&self) -> usize {
        self.vecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vecs.is_empty()
    }

    pub fn is_orthonormal(&self) -> bool {
        self.orthonormal
    }

    pub fn vectors(&self) -> &[Vector] {
        &self.vecs
    }

    /// Appends `vec`. A computed Grammian grows by one row and column (`n` new
    /// inner products); the SVD and the orthonormal companion are dropped. The
    /// orthonormal flag is kept, so callers adding to an orthonormal basis are
    /// responsible for keeping it orthonormal.
    pub fn add_vector(&mut self, vec: Vector) {
        let previous = self.grammian.take();
        self.vecs.push(vec);

        if let Some(g) = previous {
            let n = self.vecs.len();
            let mut grown = Array2::zeros((n, n));
            grown.slice_mut(s![..n - 1, ..n - 1]).assign(&g);
            let last = &self.vecs[n - 1];
            for (i, v) in self.vecs.iter().enumerate() {
                let d = last.dot(v);
                grown[[n - 1, i]] = d;
                grown[[i, n - 1]] = d;
            }
            self.grammian = OnceCell::from(grown);
        }

        self.grammian_svd.take();
        self.orthonormal_basis.take();
    }

    /// The Grammian `G[i, j] = ⟨v_i, v_j⟩`, computed from the lower triangle on
    /// first access.
    pub fn grammian(&self) -> &Array2<f64> {
        self.grammian.get_or_init(|| {
            let n = self.vecs.len();
            let mut g = Array2::zeros((n, n));
            for i in 0..n {
                for j in 0..=i {
                    let d = self.vecs[i].dot(&self.vecs[j]);
                    g[[i, j]] = d;
                    g[[j, i]] = d;
                }
            }
            g
        })
    }

    pub fn has_grammian(&self) -> bool {
        self.grammian.get().is_some()
    }

    /// `⟨v_i, u⟩` for every basis vector.
    pub fn dot(&self, u: &Vector) -> Array1<f64> {
        self.vecs.iter().map(|v| v.dot(u)).collect()
    }

    /// The `n × other.n` matrix of inner products between the two bases.
    pub fn cross_grammian(&self, other: &Basis) -> Array2<f64> {
        Array2::from_shape_fn((self.n(), other.n()), |(i, j)| {
            self.vecs[i].dot(&other.vecs[j])
        })
    }

    /// Best approximation of `u` in the span of this basis.
    ///
    /// Solves `G c = dot(u)` by Cholesky. If `G` is not numerically positive
    /// definite, the SVD pseudo-inverse is used instead and a warning is logged.
    pub fn project(&self, u: &Vector) -> Result<Vector, OmpError> {
        if let Some(ortho) = self.orthonormal_basis.get() {
            return ortho.project(u);
        }
        if self.orthonormal {
            return self.reconstruct(self.dot(u).view());
        }
        if self.vecs.is_empty() {
            return Ok(Vector::new());
        }

        let u_n = self.dot(u);
        let y_n = match self.grammian().solvec(&u_n) {
            Ok(y_n) => y_n,
            Err(_) => {
                log::warn!(
                    "{} Projecting using SVD.",
                    OmpError::RankDeficiency { dimension: self.n() }
                );
                self.grammian_svd()?.pseudo_solve(u_n.view())
            }
        };
        self.reconstruct(y_n.view())
    }

    /// `Σ c_i v_i`.
    pub fn reconstruct(&self, c: ArrayView1<f64>) -> Result<Vector, OmpError> {
        if c.len() != self.vecs.len() {
            return Err(OmpError::DimensionMismatch {
                context: "reconstruction coefficients",
                expected: self.vecs.len(),
                found: c.len(),
            });
        }
        let mut u_p = Vector::new();
        for (v, &c_i) in self.vecs.iter().zip(c.iter()) {
            u_p.axpy(c_i, v);
        }
        Ok(u_p)
    }

    /// The sub-basis of the vectors at `indices`, in that order. A computed
    /// Grammian is carried over as the `indices × indices` block.
    pub fn subspace(&self, indices: &[usize]) -> Result<Basis, OmpError> {
        if let Some(&index) = indices.iter().find(|&&i| i >= self.vecs.len()) {
            return Err(OmpError::IndexOutOfBounds {
                index,
                len: self.vecs.len(),
            });
        }

        let mut sub = Basis::new(indices.iter().map(|&i| self.vecs[i].clone()).collect());
        sub.orthonormal = self.orthonormal;
        if let Some(g) = self.grammian.get() {
            sub.grammian = OnceCell::from(g.select(Axis(0), indices).select(Axis(1), indices));
        }
        Ok(sub)
    }

    /// The sub-basis of the vectors whose `mask` entry is set.
    pub fn subspace_mask(&self, mask: &[bool]) -> Result<Basis, OmpError> {
        if mask.len() != self.vecs.len() {
            return Err(OmpError::DimensionMismatch {
                context: "subspace mask",
                expected: self.vecs.len(),
                found: mask.len(),
            });
        }
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        self.subspace(&indices)
    }

    /// Change of basis: vector `i` of the result is `reconstruct(M[i, :])`. The
    /// result is a plain basis.
    pub fn matrix_multiply(&self, m: ArrayView2<f64>) -> Result<Basis, OmpError> {
        Ok(Basis::new(self.transformed_vectors(m)?))
    }

    /// Like [`Basis::matrix_multiply`] but keeps the orthonormal flag. Only valid
    /// when `M` is orthogonal, which is not checked.
    pub fn ortho_matrix_multiply(&self, m: ArrayView2<f64>) -> Result<Basis, OmpError> {
        let mut basis = Basis::new(self.transformed_vectors(m)?);
        basis.orthonormal = self.orthonormal;
        Ok(basis)
    }

    /// Orthonormal basis of the same span, via `G = RᵀR` (upper Cholesky):
    /// column `i` of `R⁻¹` holds the coefficients of orthonormal vector `i`.
    /// The result is cached and used by later calls to [`Basis::project`].
    pub fn orthonormalise(&self) -> Result<&Basis, OmpError> {
        if self.orthonormal {
            return Ok(self);
        }
        if let Some(ortho) = self.orthonormal_basis.get() {
            return Ok(&**ortho);
        }
        if self.vecs.is_empty() {
            return Ok(&**self
                .orthonormal_basis
                .get_or_init(|| Box::new(Basis::new_orthonormal(Vec::new()))));
        }

        let r = self
            .grammian()
            .cholesky(UPLO::Upper)
            .map_err(|_| OmpError::RankDeficiency { dimension: self.n() })?;
        let r_inv = r.inv()?;

        let ortho_vecs = r_inv
            .columns()
            .into_iter()
            .map(|col| self.reconstruct(col))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(&**self
            .orthonormal_basis
            .get_or_init(|| Box::new(Basis::new_orthonormal(ortho_vecs))))
    }

    fn transformed_vectors(&self, m: ArrayView2<f64>) -> Result<Vec<Vector>, OmpError> {
        let n = self.vecs.len();
        if m.nrows() != n || m.ncols() != n {
            return Err(OmpError::DimensionMismatch {
                context: "change-of-basis matrix (rows and columns)",
                expected: n,
                found: if m.nrows() != n { m.nrows() } else { m.ncols() },
            });
        }
        m.rows().into_iter().map(|row| self.reconstruct(row)).collect()
    }

    fn grammian_svd(&self) -> Result<&Svd, OmpError> {
        if let Some(svd) = self.grammian_svd.get() {
            return Ok(svd);
        }
        let svd = Svd::compute(self.grammian())?;
        Ok(self.grammian_svd.get_or_init(|| svd))
    }
}
