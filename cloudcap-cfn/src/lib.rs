#![forbid(unsafe_code)]

//! CloudFormation template compiler.
//!
//! A template is loaded into a nested value tree, its resource declarations are ordered by the
//! dependencies implied by logical-id references, and each declaration is then materialized in
//! that order into the shared [`cloudcap_aws::World`].

mod document;
mod error;
mod graph;
mod intrinsic;
mod stack;
pub mod resource_types;

pub use document::{contains_scalar, load_file, load_str, CfnValue};
pub use error::TemplateError;
pub use graph::DependencyGraph;
pub use intrinsic::{resolve_intrinsics, SymbolTables};
pub use stack::{deploy_template, Declaration, Stack, StackOptions};
