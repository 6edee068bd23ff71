#![forbid(unsafe_code)]

use cloudcap_analyzer::{AnalyzerPlugin, Constraint, ConstraintStore, Metric, PluginError};
use cloudcap_aws::World;

/// `node(r, nrequests) >= 0` for every resource.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicPlugin;

impl AnalyzerPlugin for BasicPlugin {
    fn name(&self) -> &'static str {
        "builtin_basic_plugin"
    }

    fn constrain(&self, world: &World, store: &mut ConstraintStore) -> Result<(), PluginError> {
        for resource in world.resources() {
            let v = store.node(&resource.arn(), Metric::Requests);
            store.assert(Constraint::ge(v, 0i64));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use cloudcap_aws::{Account, Region};

    #[test]
    fn one_bound_per_live_resource() {
        let mut world = World::new();
        let (r, a) = (Region::us_east_1(), Account::new("1"));
        world.new_queue(r.clone(), a.clone(), "q").expect("q");
        world.new_queue(r.clone(), a.clone(), "q").expect("shadowing q");
        world.new_function(r, a, "f", BTreeMap::new()).expect("f");

        let mut store = ConstraintStore::new();
        BasicPlugin.constrain(&world, &mut store).expect("constrain");
        assert_eq!(store.program().constraints().len(), 2);
        assert_eq!(store.program().variable_count(), 2);
    }
}
