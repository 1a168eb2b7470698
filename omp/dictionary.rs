//! Factories for the standard target bases and measurement dictionaries.

use crate::basis::Basis;
use crate::error::OmpError;
use crate::vector::{FunctionKind, Vector};
use rand::Rng;
use rand::distributions::Open01;

/// The orthonormal basis of the first `n` sine modes.
pub fn sine_basis(n: u32) -> Basis {
    Basis::new_orthonormal(
        (1..=n)
            .map(|k| Vector::sine(k).expect("sine frequencies start at 1"))
            .collect(),
    )
}

/// Evaluation kernels on the uniform interior grid `i / (n + 1)`, `i = 1..=n`.
pub fn uniform_dictionary(n: usize) -> Vec<Vector> {
    let denominator = n as f64 + 1.0;
    (1..=n)
        .map(|i| Vector::delta(i as f64 / denominator).expect("grid points are interior"))
        .collect()
}

/// Evaluation kernels at `n` uniformly random points of (0,1).
pub fn random_dictionary<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<Vector> {
    (0..n)
        .map(|_| {
            let x: f64 = rng.sample(Open01);
            Vector::delta(x).expect("open-interval samples are interior")
        })
        .collect()
}

/// A plain basis of `n` random evaluation kernels.
///
/// With `bounds = Some((lo, hi))`, `round(n · bound_prop)` points are drawn
/// uniformly in `(lo, hi)` and the rest uniformly in `(0,1) \ (lo, hi)`.
pub fn random_delta_basis<R: Rng + ?Sized>(
    n: usize,
    bounds: Option<(f64, f64)>,
    bound_prop: f64,
    rng: &mut R,
) -> Result<Basis, OmpError> {
    let Some((lo, hi)) = bounds else {
        return Ok(Basis::new(random_dictionary(n, rng)));
    };

    if !(0.0..=1.0).contains(&lo) || hi <= lo || hi > 1.0 {
        return Err(OmpError::InvalidParameter {
            kind: FunctionKind::Delta,
            value: if hi <= lo || hi > 1.0 { hi } else { lo },
        });
    }
    if !(0.0..=1.0).contains(&bound_prop) {
        return Err(OmpError::InvalidParameter {
            kind: FunctionKind::Delta,
            value: bound_prop,
        });
    }

    let inside = ((n as f64) * bound_prop).round() as usize;
    let inside = inside.min(n);
    let width = hi - lo;
    if inside < n && width >= 1.0 {
        // (0,1) \ (0,1) has no room for the outside points.
        return Err(OmpError::InvalidParameter {
            kind: FunctionKind::Delta,
            value: bound_prop,
        });
    }

    let mut points = Vec::with_capacity(n);
    for _ in 0..inside {
        points.push(sample_interior(&mut *rng, |u| lo + width * u));
    }
    for _ in inside..n {
        // Sample the complement as one interval of length 1 - width, then open
        // the gap at `lo`.
        points.push(sample_interior(&mut *rng, |u| {
            let r = (1.0 - width) * u;
            if r < lo { r } else { r + width }
        }));
    }

    let vecs = points
        .into_iter()
        .map(Vector::delta)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Basis::new(vecs))
}

/// Redraws until `map(u)` lands strictly inside (0,1); rounding can push it onto
/// an endpoint.
fn sample_interior<R: Rng + ?Sized>(rng: &mut R, map: impl Fn(f64) -> f64) -> f64 {
    loop {
        let x = map(rng.sample(Open01));
        if x > 0.0 && x < 1.0 {
            return x;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn point(v: &Vector) -> f64 {
        v.terms(FunctionKind::Delta).unwrap().0[0]
    }

    #[test]
    fn test_sine_basis_is_orthonormal() {
        let basis = sine_basis(5);
        assert!(basis.is_orthonormal());
        assert_eq!(basis.grammian(), &ndarray::Array2::<f64>::eye(5));
    }

    #[test]
    fn test_uniform_dictionary_excludes_endpoints() {
        let dic = uniform_dictionary(4);
        let points: Vec<f64> = dic.iter().map(point).collect();
        assert_eq!(points, vec![0.2, 0.4, 0.6, 0.8]);
    }

    #[test]
    fn test_random_dictionary_is_reproducible() {
        let a = random_dictionary(10, &mut StdRng::seed_from_u64(7));
        let b = random_dictionary(10, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(a.iter().map(point).all(|x| x > 0.0 && x < 1.0));
    }

    #[test]
    fn test_bounded_random_basis_respects_proportion() {
        let mut rng = StdRng::seed_from_u64(42);
        let basis = random_delta_basis(20, Some((0.3, 0.5)), 0.75, &mut rng).unwrap();
        assert_eq!(basis.n(), 20);
        let inside = basis
            .vectors()
            .iter()
            .map(point)
            .filter(|&x| x > 0.3 && x < 0.5)
            .count();
        assert_eq!(inside, 15);
    }

    #[test]
    fn test_bounded_random_basis_rejects_bad_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(random_delta_basis(5, Some((0.6, 0.2)), 0.5, &mut rng).is_err());
        assert!(random_delta_basis(5, Some((0.2, 0.6)), 1.5, &mut rng).is_err());
    }

    #[test]
    fn test_full_interval_bounds_need_every_point_inside() {
        let mut rng = StdRng::seed_from_u64(5);
        assert!(matches!(
            random_delta_basis(4, Some((0.0, 1.0)), 0.5, &mut rng).unwrap_err(),
            OmpError::InvalidParameter { kind: FunctionKind::Delta, value } if value == 0.5
        ));

        let basis = random_delta_basis(4, Some((0.0, 1.0)), 1.0, &mut rng).unwrap();
        assert!(basis.vectors().iter().map(point).all(|x| x > 0.0 && x < 1.0));
    }

    #[test]
    fn test_complement_points_stay_interior_next_to_the_edge() {
        // A gap touching 1 leaves the complement at (0, 0.4).
        let mut rng = StdRng::seed_from_u64(9);
        let basis = random_delta_basis(200, Some((0.4, 1.0)), 0.0, &mut rng).unwrap();
        assert!(basis.vectors().iter().map(point).all(|x| x > 0.0 && x < 0.4));
    }
}
