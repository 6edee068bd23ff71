#![forbid(unsafe_code)]

use miette::Diagnostic;
use thiserror::Error;

/// A plugin refused to contribute constraints.
#[derive(Debug, Error, Diagnostic)]
#[error("plugin `{plugin}`: {message}")]
#[diagnostic(code(cloudcap::analyzer::plugin))]
pub struct PluginError {
    pub plugin: &'static str,
    pub message: String,
}

impl PluginError {
    pub fn new(plugin: &'static str, message: impl Into<String>) -> Self {
        Self {
            plugin,
            message: message.into(),
        }
    }
}

/// The decision procedure failed outright (as opposed to answering `unknown`).
#[derive(Debug, Error, Diagnostic)]
#[error("oracle `{oracle}` failed: {message}")]
#[diagnostic(code(cloudcap::analyzer::oracle))]
pub struct OracleError {
    pub oracle: String,
    pub message: String,
}

#[derive(Debug, Error, Diagnostic)]
pub enum AnalyzerError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Oracle(#[from] OracleError),

    #[error("estimate for `{identifier}` sets {metric} to {value}, which is negative")]
    #[diagnostic(
        code(cloudcap::analyzer::negative_estimate),
        help("request counts are never negative")
    )]
    NegativeEstimate {
        identifier: String,
        metric: String,
        value: i64,
    },
}
