#![forbid(unsafe_code)]

//! Constraint generation and solving.
//!
//! Resources become graph nodes and connections between them become edges; each carries one
//! integer variable per [`Metric`]. Plugins state local relationships between those variables,
//! the [`Analyzer`] adds flow conservation at every node with inbound edges, and an [`Oracle`]
//! decides whether the resulting program is satisfiable.

mod analyzer;
mod error;
mod metric;
mod oracle;
mod plugin;
mod program;
mod store;

pub use analyzer::{Analyzer, EstimatePolicy, Estimates, Verdict};
pub use error::{AnalyzerError, OracleError, PluginError};
pub use metric::Metric;
#[cfg(feature = "z3")]
pub use oracle::z3_oracle::Z3Oracle;
pub use oracle::{default_oracle, NoSolverOracle, Oracle, SatAnswer};
pub use plugin::AnalyzerPlugin;
pub use program::{Constraint, ConstraintProgram, Relation, Term, Variable};
pub use store::{ConstraintStore, EdgeKey, NodeKey};
