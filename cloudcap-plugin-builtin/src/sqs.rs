#![forbid(unsafe_code)]

use cloudcap_analyzer::{AnalyzerPlugin, Constraint, ConstraintStore, Metric, PluginError};
use cloudcap_aws::{Resource, ResourceType, World};

/// `edge(queue, function) == node(queue)` for every event source mapping of every queue.
///
/// Each consumer may in the worst case receive the whole inbound volume of the queue, so one
/// queue with several mappings yields one equality per mapping rather than a partition.
#[derive(Clone, Copy, Debug, Default)]
pub struct SqsQueuePlugin;

impl AnalyzerPlugin for SqsQueuePlugin {
    fn name(&self) -> &'static str {
        "builtin_aws_sqs_queue_plugin"
    }

    fn constrain(&self, world: &World, store: &mut ConstraintStore) -> Result<(), PluginError> {
        for queue in world.resources().filter(|r| r.as_queue().is_some()) {
            let queue_arn = queue.arn();
            for mapping in queue.event_source_mappings().unwrap_or_default() {
                let Some(function) = resolve_function(world, queue, &mapping.function_name) else {
                    tracing::warn!(
                        queue = %queue_arn,
                        "event source mapping targets unknown function {}; no constraint added",
                        mapping.function_name
                    );
                    continue;
                };
                let edge = store.edge(&queue_arn, &function.arn(), Metric::Requests);
                let node = store.node(&queue_arn, Metric::Requests);
                store.assert(Constraint::eq(edge, node));
            }
        }
        Ok(())
    }
}

/// A mapping names its function by ARN or by plain name in the queue's region and account.
fn resolve_function<'w>(world: &'w World, queue: &Resource, name: &str) -> Option<&'w Resource> {
    world
        .lookup(name)
        .ok()
        .filter(|r| r.as_function().is_some())
        .or_else(|| {
            world.find_by_name(
                ResourceType::LambdaFunction,
                queue.region(),
                queue.account(),
                name,
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use cloudcap_aws::{Account, EventSourceMapping, Region};

    fn world(function_names: &[&str]) -> World {
        let mut world = World::new();
        let (r, a) = (Region::us_east_1(), Account::new("1"));
        let queue = world.new_queue(r.clone(), a.clone(), "q").expect("q");
        let queue_arn = world.get(queue).expect("q").arn();
        world
            .new_function(r, a, "f", BTreeMap::new())
            .expect("f");
        for name in function_names {
            world
                .add_event_source_mapping(
                    queue_arn.as_str(),
                    EventSourceMapping::new(*name, queue_arn.clone()),
                )
                .expect("mapping");
        }
        world
    }

    #[test]
    fn mappings_resolve_by_name_and_arn() {
        let world = world(&["f", "arn:aws:lambda:us-east-1:1:function:f"]);
        let mut store = ConstraintStore::new();
        SqsQueuePlugin.constrain(&world, &mut store).expect("constrain");
        // Both mappings reach the same function, so they share the edge variable.
        assert_eq!(store.edges().count(), 1);
        assert_eq!(store.program().constraints().len(), 2);
    }

    #[test]
    fn unresolved_targets_add_nothing() {
        let world = world(&["missing"]);
        let mut store = ConstraintStore::new();
        SqsQueuePlugin.constrain(&world, &mut store).expect("constrain");
        assert!(store.program().constraints().is_empty());
        assert_eq!(store.program().variable_count(), 0);
    }
}
