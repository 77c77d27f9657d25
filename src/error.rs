use crate::variables::Family;
use thiserror::Error;

/// Failures of an upward planarity test. An unsatisfiable formula is not an
/// error: it is the answer "not upward planar".
#[derive(Debug, Error)]
pub enum UpSatError {
    /// The input is not a DAG of the expected shape, or the instance was used
    /// out of order.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// The SAT engine could not be run or returned a malformed answer.
    #[error("SAT solver failure: {0}")]
    Solver(String),

    /// A model did not decode into a total, tie-free order or a planar rotation system.
    #[error("embedding extraction failed: {0}")]
    Extraction(String),

    /// A rule referenced a variable that was never allocated.
    #[error("no {family:?} variable allocated for ({i},{j})")]
    MissingVariable { family :Family, i :usize, j :usize },
}
