#![forbid(unsafe_code)]

//! Plugins shipped with cloudcap.

use cloudcap_analyzer::AnalyzerPlugin;

mod basic;
mod lambda;
mod sqs;

pub use basic::BasicPlugin;
pub use lambda::LambdaFunctionPlugin;
pub use sqs::SqsQueuePlugin;

/// Every builtin plugin, in the order they should be registered.
pub fn builtin_plugins() -> Vec<Box<dyn AnalyzerPlugin>> {
    vec![
        Box::new(BasicPlugin),
        Box::new(LambdaFunctionPlugin),
        Box::new(SqsQueuePlugin),
    ]
}
