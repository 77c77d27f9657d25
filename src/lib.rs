//! Upward planarity testing and embedding of directed acyclic graphs by
//! reduction to boolean satisfiability.
//!
//! A graph is encoded into a CNF formula over node order, edge rotation and
//! edge/node side variables, the formula is handed to a SAT engine, and a
//! model is decoded back into a node order and a rotation system. See
//! [`UpSat`] for the entry point.

pub mod graph;
pub mod error;
pub mod sat;
pub mod upsat;

pub(crate) mod index;
pub(crate) mod variables;
pub(crate) mod rules;
pub(crate) mod embed;

pub use crate::graph::{AdjEntry, EdgeRef, Graph, GraphCopy, NodeRef};
pub use crate::error::UpSatError;
pub use crate::sat::{Formula, Model, SatBackend, Varisat};
pub use crate::upsat::{UpSat, UpSatOptions};
pub use crate::embed::Strategy;
pub use crate::variables::Family;
