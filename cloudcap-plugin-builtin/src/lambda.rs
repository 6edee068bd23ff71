#![forbid(unsafe_code)]

use cloudcap_analyzer::{AnalyzerPlugin, ConstraintStore, Metric, PluginError};
use cloudcap_aws::{EnvValue, Resource, ResourceType, World};

/// Turns function environment references into edges.
///
/// An environment value naming a registered resource (by ARN, queue URL, or the bare name of a
/// function in the same region and account) creates the edge
/// `referenced -> function`, which then takes part in the function's conservation equation. No
/// bound is placed on the edge itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct LambdaFunctionPlugin;

impl AnalyzerPlugin for LambdaFunctionPlugin {
    fn name(&self) -> &'static str {
        "builtin_aws_lambda_function_plugin"
    }

    fn constrain(&self, world: &World, store: &mut ConstraintStore) -> Result<(), PluginError> {
        for resource in world.resources() {
            let Some(function) = resource.as_function() else {
                continue;
            };
            let arn = resource.arn();
            for (key, value) in &function.environment {
                let identifier = match value {
                    EnvValue::Plain(s) => s,
                    EnvValue::Structured(raw) => {
                        tracing::warn!(
                            function = %arn,
                            "environment variable {key} is not a plain value and is not wired: {raw}"
                        );
                        continue;
                    }
                };
                match resolve_reference(world, resource, identifier) {
                    Some(referenced) => {
                        store.edge(&referenced.arn(), &arn, Metric::Requests);
                    }
                    None => {
                        tracing::debug!(function = %arn, "{key}={identifier} names no resource");
                    }
                }
            }
        }
        Ok(())
    }
}

/// `Ref` on a function yields its bare name, so plain names fall back to a function lookup.
fn resolve_reference<'w>(
    world: &'w World,
    function: &Resource,
    identifier: &str,
) -> Option<&'w Resource> {
    world.lookup(identifier).ok().or_else(|| {
        world.find_by_name(
            ResourceType::LambdaFunction,
            function.region(),
            function.account(),
            identifier,
        )
    })
}
