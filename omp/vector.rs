//! # Analytic vectors in H¹₀(0,1)
//!
//! A [`Vector`] is a finite linear combination of closed-form functions. Inner
//! products are computed term by term from exact formulas, so no quadrature is
//! ever involved and sine modes stay exactly orthonormal.

use crate::error::OmpError;
use itertools::{EitherOrBoth, Itertools};
use ndarray::{Array1, ArrayView1, Zip};
use std::f64::consts::{PI, SQRT_2};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// The analytic families a [`Vector`] can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FunctionKind {
    /// φ_k(x) = √2/(πk)·sin(πkx), orthonormal under the H¹ seminorm.
    /// The parameter is the integer frequency `k ≥ 1`.
    Sine,
    /// The normalized Riesz representer of point evaluation at `x₀ ∈ (0,1)`.
    /// The parameter is the evaluation point.
    Delta,
}

impl FunctionKind {
    fn validate(self, param: f64) -> Result<(), OmpError> {
        let valid = match self {
            FunctionKind::Sine => param.is_finite() && param >= 1.0 && param.fract() == 0.0,
            FunctionKind::Delta => param > 0.0 && param < 1.0,
        };
        if valid {
            Ok(())
        } else {
            Err(OmpError::InvalidParameter { kind: self, value: param })
        }
    }
}

/// Terms of a single kind. `params` is strictly increasing.
#[derive(Debug, Clone, PartialEq)]
struct TermList {
    kind: FunctionKind,
    params: Vec<f64>,
    coeffs: Vec<f64>,
}

impl TermList {
    fn empty(kind: FunctionKind) -> Self {
        Self {
            kind,
            params: Vec::new(),
            coeffs: Vec::new(),
        }
    }

    /// Merges `alpha * (params, coeffs)` into this list. Both inputs must be sorted
    /// strictly ascending; the output is as well. Terms that cancel are dropped.
    fn merge_scaled(&mut self, params: &[f64], coeffs: &[f64], alpha: f64) {
        let lhs = self.params.iter().copied().zip(self.coeffs.iter().copied());
        let rhs = params.iter().copied().zip(coeffs.iter().map(|c| alpha * c));

        let (merged_params, merged_coeffs): (Vec<f64>, Vec<f64>) = lhs
            .merge_join_by(rhs, |a, b| a.0.total_cmp(&b.0))
            .map(|pair| match pair {
                EitherOrBoth::Both((p, a), (_, b)) => (p, a + b),
                EitherOrBoth::Left(term) | EitherOrBoth::Right(term) => term,
            })
            .filter(|&(_, c)| c != 0.0)
            .unzip();

        self.params = merged_params;
        self.coeffs = merged_coeffs;
    }
}

/// A finite sum of [`FunctionKind`] terms with real coefficients.
///
/// Arithmetic through the operators always produces a new value. The only
/// in-place mutators are [`Vector::axpy`], `+=` and `-=`.
///
/// Zero coefficients are never stored and term lists are kept in kind order, so
/// `==` and [`Vector::is_empty`] compare the represented functions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vector {
    terms: Vec<TermList>,
}

impl Vector {
    /// The zero function.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a vector from parallel per-kind arrays: `params[i]` and `coeffs[i]`
    /// are the terms of kind `kinds[i]`. Parameters need not be sorted, and
    /// repeated parameters (or repeated kinds) are merged by summing coefficients.
    pub fn from_terms(
        params: &[Vec<f64>],
        coeffs: &[Vec<f64>],
        kinds: &[FunctionKind],
    ) -> Result<Self, OmpError> {
        if params.len() != kinds.len() {
            return Err(OmpError::DimensionMismatch {
                context: "vector parameters per kind",
                expected: kinds.len(),
                found: params.len(),
            });
        }
        if coeffs.len() != kinds.len() {
            return Err(OmpError::DimensionMismatch {
                context: "vector coefficients per kind",
                expected: kinds.len(),
                found: coeffs.len(),
            });
        }

        let mut vector = Vector::new();
        for ((kind_params, kind_coeffs), &kind) in params.iter().zip(coeffs).zip(kinds) {
            if kind_params.len() != kind_coeffs.len() {
                return Err(OmpError::DimensionMismatch {
                    context: "vector coefficients for one kind",
                    expected: kind_params.len(),
                    found: kind_coeffs.len(),
                });
            }
            for &p in kind_params {
                kind.validate(p)?;
            }

            let mut pairs: Vec<(f64, f64)> = kind_params
                .iter()
                .copied()
                .zip(kind_coeffs.iter().copied())
                .collect();
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
            let pairs: Vec<(f64, f64)> = pairs
                .into_iter()
                .coalesce(|a, b| if a.0 == b.0 { Ok((a.0, a.1 + b.1)) } else { Err((a, b)) })
                .collect();
            let (sorted_params, sorted_coeffs): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();

            vector
                .list_mut(kind)
                .merge_scaled(&sorted_params, &sorted_coeffs, 1.0);
        }
        vector.drop_empty_lists();
        Ok(vector)
    }

    /// A single term `coeff · f_kind(param)`.
    pub fn element(kind: FunctionKind, param: f64, coeff: f64) -> Result<Self, OmpError> {
        Self::from_terms(&[vec![param]], &[vec![coeff]], &[kind])
    }

    /// The unit sine mode of frequency `k`.
    pub fn sine(k: u32) -> Result<Self, OmpError> {
        Self::element(FunctionKind::Sine, f64::from(k), 1.0)
    }

    /// The unit evaluation kernel at `x0`.
    pub fn delta(x0: f64) -> Result<Self, OmpError> {
        Self::element(FunctionKind::Delta, x0, 1.0)
    }

    pub fn is_empty(&self) -> bool {
        self.terms.iter().all(|list| list.params.is_empty())
    }

    /// Kinds present in this vector, in [`FunctionKind`] order.
    pub fn kinds(&self) -> impl Iterator<Item = FunctionKind> + '_ {
        self.terms.iter().map(|list| list.kind)
    }

    /// The sorted `(params, coeffs)` of one kind, if present.
    pub fn terms(&self, kind: FunctionKind) -> Option<(&[f64], &[f64])> {
        self.terms
            .iter()
            .find(|list| list.kind == kind)
            .map(|list| (list.params.as_slice(), list.coeffs.as_slice()))
    }

    /// Exact H¹₀ inner product.
    pub fn dot(&self, other: &Vector) -> f64 {
        let mut d = 0.0;
        for lhs in &self.terms {
            for rhs in &other.terms {
                for (&lp, &lc) in lhs.params.iter().zip(&lhs.coeffs) {
                    for (&rp, &rc) in rhs.params.iter().zip(&rhs.coeffs) {
                        d += lc * rc * internal::element_dot(lhs.kind, lp, rhs.kind, rp);
                    }
                }
            }
        }
        d
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Pointwise values at the sample points `x`.
    pub fn evaluate(&self, x: ArrayView1<f64>) -> Array1<f64> {
        let mut values = Array1::zeros(x.len());
        for list in &self.terms {
            for (&p, &c) in list.params.iter().zip(&list.coeffs) {
                Zip::from(&mut values).and(&x).for_each(|v, &xi| {
                    *v += c * match list.kind {
                        FunctionKind::Sine => internal::sin_evaluate(xi, p),
                        FunctionKind::Delta => internal::delta_evaluate(xi, p),
                    };
                });
            }
        }
        values
    }

    /// `self += alpha * other`, merging term lists in place.
    pub fn axpy(&mut self, alpha: f64, other: &Vector) {
        for list in &other.terms {
            self.list_mut(list.kind)
                .merge_scaled(&list.params, &list.coeffs, alpha);
        }
        self.drop_empty_lists();
    }

    fn scaled(&self, alpha: f64) -> Vector {
        if alpha == 0.0 {
            return Vector::new();
        }
        let mut result = self.clone();
        for list in &mut result.terms {
            list.coeffs.iter_mut().for_each(|c| *c *= alpha);
        }
        result
    }

    fn list_mut(&mut self, kind: FunctionKind) -> &mut TermList {
        let idx = match self.terms.binary_search_by_key(&kind, |list| list.kind) {
            Ok(idx) => idx,
            Err(idx) => {
                self.terms.insert(idx, TermList::empty(kind));
                idx
            }
        };
        &mut self.terms[idx]
    }

    fn drop_empty_lists(&mut self) {
        self.terms.retain(|list| !list.params.is_empty());
    }
}

impl Add<&Vector> for &Vector {
    type Output = Vector;

    fn add(self, rhs: &Vector) -> Vector {
        let mut result = self.clone();
        result.axpy(1.0, rhs);
        result
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(mut self, rhs: Vector) -> Vector {
        self.axpy(1.0, &rhs);
        self
    }
}

impl Sub<&Vector> for &Vector {
    type Output = Vector;

    fn sub(self, rhs: &Vector) -> Vector {
        let mut result = self.clone();
        result.axpy(-1.0, rhs);
        result
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(mut self, rhs: Vector) -> Vector {
        self.axpy(-1.0, &rhs);
        self
    }
}

impl AddAssign<&Vector> for Vector {
    fn add_assign(&mut self, rhs: &Vector) {
        self.axpy(1.0, rhs);
    }
}

impl SubAssign<&Vector> for Vector {
    fn sub_assign(&mut self, rhs: &Vector) {
        self.axpy(-1.0, rhs);
    }
}

impl Neg for &Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        self.scaled(-1.0)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        self.scaled(-1.0)
    }
}

impl Mul<f64> for &Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        self.scaled(rhs)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        self.scaled(rhs)
    }
}

impl Mul<&Vector> for f64 {
    type Output = Vector;

    fn mul(self, rhs: &Vector) -> Vector {
        rhs.scaled(self)
    }
}

impl Div<f64> for &Vector {
    type Output = Vector;

    fn div(self, rhs: f64) -> Vector {
        self.scaled(1.0 / rhs)
    }
}

/// Closed-form element evaluations and the kind×kind inner-product table.
mod internal {
    use super::*;

    pub(super) fn sin_evaluate(x: f64, freq: f64) -> f64 {
        (PI * freq * x).sin() * SQRT_2 / (PI * freq)
    }

    /// The normalized Green's function of -u'' on (0,1) with pole at `x0`.
    pub(super) fn delta_evaluate(x: f64, x0: f64) -> f64 {
        let normaliser = 1.0 / (x0 * (1.0 - x0)).sqrt();
        if x <= x0 {
            x * (1.0 - x0) * normaliser
        } else {
            x0 * (1.0 - x) * normaliser
        }
    }

    /// ⟨f_lk(lp), f_rk(rp)⟩ for unit coefficients.
    pub(super) fn element_dot(lk: FunctionKind, lp: f64, rk: FunctionKind, rp: f64) -> f64 {
        match (lk, rk) {
            (FunctionKind::Sine, FunctionKind::Sine) => {
                if lp == rp {
                    1.0
                } else {
                    0.0
                }
            }
            (FunctionKind::Delta, FunctionKind::Sine) => {
                sin_evaluate(lp, rp) / (lp * (1.0 - lp)).sqrt()
            }
            (FunctionKind::Sine, FunctionKind::Delta) => {
                sin_evaluate(rp, lp) / (rp * (1.0 - rp)).sqrt()
            }
            (FunctionKind::Delta, FunctionKind::Delta) => {
                // Ordered so that the product is bitwise symmetric.
                let (lo, hi) = if lp <= rp { (lp, rp) } else { (rp, lp) };
                lo * (1.0 - hi) / ((lo * (1.0 - lo)).sqrt() * (hi * (1.0 - hi)).sqrt())
            }
        }
    }
}
