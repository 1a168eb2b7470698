#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]

pub mod basis;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod greedy;
pub mod linalg;
pub mod pair;
pub mod vector;

pub use basis::Basis;
pub use error::OmpError;
pub use greedy::{GreedyBasisConstructor, GreedyOptions};
pub use pair::{BasisPair, Reconstruction};
pub use vector::{FunctionKind, Vector};
