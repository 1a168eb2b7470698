//! # Greedy measurement selection
//!
//! Builds a measurement basis from a dictionary of candidate vectors by the
//! orthogonal greedy algorithm that approximately minimizes the Kolmogorov
//! n-width of the target space `Vn` relative to the dictionary. Each step picks
//! the candidate best aligned with what the current greedy basis still fails to
//! capture of `Vn`.

use crate::basis::Basis;
use crate::error::OmpError;
use crate::vector::Vector;

/// Behavioural switches for [`GreedyBasisConstructor`].
#[derive(Debug, Clone, Copy)]
pub struct GreedyOptions {
    /// Log every step's criterion at info level instead of debug.
    pub verbose: bool,
    /// Remove selected candidates from the dictionary.
    pub remove: bool,
}

impl Default for GreedyOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            remove: true,
        }
    }
}

pub struct GreedyBasisConstructor<'a> {
    m: usize,
    dictionary: Vec<Vector>,
    vn: &'a Basis,
    options: GreedyOptions,
    greedy_basis: Option<Basis>,
}

impl<'a> GreedyBasisConstructor<'a> {
    pub fn new(m: usize, dictionary: Vec<Vector>, vn: &'a Basis, options: GreedyOptions) -> Self {
        Self {
            m,
            dictionary,
            vn,
            options,
            greedy_basis: None,
        }
    }

    /// The remaining candidates. With `remove` set, selected vectors are gone.
    pub fn dictionary(&self) -> &[Vector] {
        &self.dictionary
    }

    pub fn greedy_basis(&self) -> Option<&Basis> {
        self.greedy_basis.as_ref()
    }

    /// Runs the greedy selection for `m` vectors and returns the resulting basis.
    /// A second call returns the basis already built.
    pub fn construct_basis(&mut self) -> Result<&Basis, OmpError> {
        if self.greedy_basis.is_some() {
            log::info!("Greedy basis already computed.");
        } else {
            let basis = self.build()?;
            self.greedy_basis = Some(basis);
        }
        Ok(self
            .greedy_basis
            .as_ref()
            .expect("greedy basis was stored above"))
    }

    fn build(&mut self) -> Result<Basis, OmpError> {
        if self.m == 0 {
            return Ok(Basis::new(Vec::new()));
        }
        let required = if self.options.remove { self.m } else { 1 };
        if self.dictionary.len() < required {
            return Err(OmpError::DimensionMismatch {
                context: "greedy dictionary size",
                expected: required,
                found: self.dictionary.len(),
            });
        }

        if self.options.verbose {
            log::info!(
                "Generating basis from greedy algorithm with dictionary of {} candidates",
                self.dictionary.len()
            );
            log::info!("i \t criterion");
        }

        let n0 = self.initial_choice();
        let mut basis = Basis::new(vec![self.take_candidate(n0)]);
        basis.grammian();

        for i in 1..self.m {
            let (ni, criterion) = self.next_step_choice(&basis)?;
            if self.options.verbose {
                log::info!("{i} : \t {criterion}");
            } else {
                log::debug!("greedy step {i}: candidate {ni}, criterion {criterion:.6e}");
            }
            basis.add_vector(self.take_candidate(ni));
        }

        if self.options.verbose {
            log::info!("Done!");
        }
        Ok(basis)
    }

    /// The candidate maximizing `Σ_φ∈Vn ⟨φ, d⟩²`.
    fn initial_choice(&self) -> usize {
        let scores: Vec<f64> = self
            .dictionary
            .iter()
            .map(|d| self.vn.vectors().iter().map(|phi| phi.dot(d).powi(2)).sum())
            .collect();
        argmax(&scores)
    }

    /// The candidate maximizing `Σ_φ∈Vn ⟨φ − P φ, d⟩²`, with `P` the projection
    /// onto the current greedy basis.
    fn next_step_choice(&self, basis: &Basis) -> Result<(usize, f64), OmpError> {
        let residuals = self
            .vn
            .vectors()
            .iter()
            .map(|phi| -> Result<Vector, OmpError> { Ok(phi - &basis.project(phi)?) })
            .collect::<Result<Vec<Vector>, OmpError>>()?;

        let scores: Vec<f64> = self
            .dictionary
            .iter()
            .map(|d| residuals.iter().map(|r| r.dot(d).powi(2)).sum())
            .collect();
        let ni = argmax(&scores);
        Ok((ni, scores[ni]))
    }

    fn take_candidate(&mut self, index: usize) -> Vector {
        if self.options.remove {
            self.dictionary.remove(index)
        } else {
            self.dictionary[index].clone()
        }
    }
}

/// Index of the largest score; ties resolve to the earliest index.
fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, &score) in scores.iter().enumerate().skip(1) {
        if score > scores[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pair::BasisPair;

    fn deltas(points: &[f64]) -> Vec<Vector> {
        points.iter().map(|&x| Vector::delta(x).unwrap()).collect()
    }

    fn delta_point(v: &Vector) -> f64 {
        v.terms(crate::vector::FunctionKind::Delta).unwrap().0[0]
    }

    #[test]
    fn test_first_choice_aligns_with_single_sine_mode() {
        let vn = Basis::new_orthonormal(vec![Vector::sine(1).unwrap()]);
        let mut greedy = GreedyBasisConstructor::new(
            2,
            deltas(&[0.2, 0.4, 0.6, 0.8]),
            &vn,
            GreedyOptions::default(),
        );
        let basis = greedy.construct_basis().unwrap();
        assert_eq!(basis.n(), 2);

        let first = delta_point(&basis.vectors()[0]);
        assert!(first == 0.4 || first == 0.6, "first pick was {first}");
        assert_eq!(greedy.dictionary().len(), 2);
    }

    #[test]
    fn test_iterative_criterion_sums_over_every_target_mode() {
        let vn = Basis::new_orthonormal(vec![Vector::sine(1).unwrap(), Vector::sine(2).unwrap()]);
        let points = [0.1, 0.2, 0.35, 0.5, 0.6, 0.9];
        let mut greedy =
            GreedyBasisConstructor::new(2, deltas(&points), &vn, GreedyOptions::default());
        let picks: Vec<f64> = greedy
            .construct_basis()
            .unwrap()
            .vectors()
            .iter()
            .map(delta_point)
            .collect();
        assert_eq!(picks, vec![0.35, 0.6]);

        // Scores against the residuals left by the first pick. Counting only the
        // last mode would move the second pick to 0.9.
        let first = Basis::new(deltas(&[0.35]));
        let residuals: Vec<Vector> = vn
            .vectors()
            .iter()
            .map(|phi| phi - &first.project(phi).unwrap())
            .collect();
        let remaining = deltas(&[0.1, 0.2, 0.5, 0.6, 0.9]);
        let summed: Vec<f64> = remaining
            .iter()
            .map(|d| residuals.iter().map(|r| r.dot(d).powi(2)).sum())
            .collect();
        let last_only: Vec<f64> = remaining
            .iter()
            .map(|d| residuals[1].dot(d).powi(2))
            .collect();
        assert_eq!(argmax(&summed), 3);
        assert_eq!(argmax(&last_only), 4);
        assert!(summed[3] - summed[4] > 0.02);
    }

    #[test]
    fn test_construction_is_idempotent() {
        let vn = Basis::new_orthonormal((1..=3).map(|k| Vector::sine(k).unwrap()).collect());
        let points: Vec<f64> = (1..20).map(|i| i as f64 / 20.0).collect();
        let mut greedy =
            GreedyBasisConstructor::new(5, deltas(&points), &vn, GreedyOptions::default());

        let first: Vec<Vector> = greedy.construct_basis().unwrap().vectors().to_vec();
        let remaining = greedy.dictionary().len();
        let second: Vec<Vector> = greedy.construct_basis().unwrap().vectors().to_vec();

        assert_eq!(first, second);
        assert_eq!(remaining, 14);
        assert_eq!(greedy.dictionary().len(), remaining);
    }

    #[test]
    fn test_greedy_selects_distinct_points_and_keeps_grammian_current() {
        let vn = Basis::new_orthonormal((1..=4).map(|k| Vector::sine(k).unwrap()).collect());
        let points: Vec<f64> = (1..40).map(|i| i as f64 / 40.0).collect();
        let mut greedy =
            GreedyBasisConstructor::new(6, deltas(&points), &vn, GreedyOptions::default());
        let basis = greedy.construct_basis().unwrap();

        let mut chosen: Vec<f64> = basis.vectors().iter().map(delta_point).collect();
        chosen.sort_by(f64::total_cmp);
        chosen.dedup();
        assert_eq!(chosen.len(), 6);

        assert!(basis.has_grammian());
        let fresh = Basis::new(basis.vectors().to_vec());
        assert!(basis.grammian().abs_diff_eq(fresh.grammian(), 1e-12));
    }

    #[test]
    fn test_greedy_basis_captures_target_space() {
        // With as many well-placed measurements as modes, every mode is seen.
        let vn = Basis::new_orthonormal((1..=3).map(|k| Vector::sine(k).unwrap()).collect());
        let points: Vec<f64> = (1..50).map(|i| i as f64 / 50.0).collect();
        let mut greedy =
            GreedyBasisConstructor::new(3, deltas(&points), &vn, GreedyOptions::default());
        let basis = greedy.construct_basis().unwrap();

        let ortho = basis.orthonormalise().unwrap();
        let beta = BasisPair::new(ortho, &vn).unwrap().beta().unwrap();
        assert!(beta > 0.5, "beta was {beta}");
    }

    #[test]
    fn test_without_removal_dictionary_is_untouched() {
        let vn = Basis::new_orthonormal(vec![Vector::sine(1).unwrap()]);
        let options = GreedyOptions {
            verbose: true,
            remove: false,
        };
        let mut greedy = GreedyBasisConstructor::new(2, deltas(&[0.25, 0.5, 0.75]), &vn, options);
        let basis = greedy.construct_basis().unwrap();
        assert_eq!(basis.n(), 2);
        assert_eq!(delta_point(&basis.vectors()[0]), 0.5);
        assert_eq!(greedy.dictionary().len(), 3);
    }

    #[test]
    fn test_budget_larger_than_dictionary_is_rejected() {
        let vn = Basis::new_orthonormal(vec![Vector::sine(1).unwrap()]);
        let mut greedy =
            GreedyBasisConstructor::new(3, deltas(&[0.3, 0.6]), &vn, GreedyOptions::default());
        assert!(matches!(
            greedy.construct_basis().unwrap_err(),
            OmpError::DimensionMismatch { expected: 3, found: 2, .. }
        ));
        assert!(greedy.greedy_basis().is_none());
    }

    #[test]
    fn test_zero_budget_gives_empty_basis() {
        let vn = Basis::new_orthonormal(vec![Vector::sine(1).unwrap()]);
        let mut greedy = GreedyBasisConstructor::new(0, Vec::new(), &vn, GreedyOptions::default());
        assert!(greedy.construct_basis().unwrap().is_empty());
    }

    #[test]
    fn test_argmax_prefers_earliest_tie() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), 1);
        assert_eq!(argmax(&[5.0]), 0);
    }
}
