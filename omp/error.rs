use crate::vector::FunctionKind;
use thiserror::Error;

/// The error type shared by every operation of the basis algebra.
///
/// `DimensionMismatch`, `CapabilityViolation`, `InvalidParameter` and
/// `IndexOutOfBounds` are caller errors and are never retried. The two
/// numerical variants are only surfaced where no local recovery exists:
/// `project` and `optimal_reconstruction` fall back and log instead.
#[derive(Error, Debug)]
pub enum OmpError {
    #[error("Dimension mismatch in {context}: expected {expected}, found {found}.")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Operation not supported: {0}")]
    CapabilityViolation(&'static str),

    #[error("Grammian of dimension {dimension} is not positive definite; the basis is linearly dependent.")]
    RankDeficiency { dimension: usize },

    #[error("Normal equations are singular for m={m}, n={n}.")]
    SingularSystem { m: usize, n: usize },

    #[error("Invalid {kind:?} parameter {value}.")]
    InvalidParameter { kind: FunctionKind, value: f64 },

    #[error("Index {index} is out of bounds for a basis of {len} vectors.")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Linear algebra backend failed: {0}")]
    Linalg(#[from] ndarray_linalg::error::LinalgError),
}
