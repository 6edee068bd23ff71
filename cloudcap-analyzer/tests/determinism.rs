use std::collections::BTreeMap;

use cloudcap_analyzer::{
    Analyzer, AnalyzerPlugin, ConstraintStore, EstimatePolicy, Metric, PluginError,
};
use cloudcap_aws::{Account, Region, World};
use cloudcap_cfn::{load_str, Stack, StackOptions};
use proptest::prelude::*;

/// Connects every queue to every function, in registration order.
struct Mesh;

impl AnalyzerPlugin for Mesh {
    fn name(&self) -> &'static str {
        "mesh"
    }

    fn constrain(&self, world: &World, store: &mut ConstraintStore) -> Result<(), PluginError> {
        let queues: Vec<_> = world.resources().filter(|r| r.is_event_source()).collect();
        for f in world.resources().filter(|r| r.as_function().is_some()) {
            for q in &queues {
                store.edge(&q.arn(), &f.arn(), Metric::Requests);
            }
        }
        Ok(())
    }
}

fn template(queues: usize, functions: usize) -> String {
    let mut out = String::from("Resources:\n");
    for i in 0..queues {
        out.push_str(&format!(
            "  Queue{i}:\n    Type: AWS::SQS::Queue\n    Properties:\n      QueueName: q{i}\n"
        ));
    }
    for i in 0..functions {
        out.push_str(&format!(
            "  Function{i}:\n    Type: AWS::Lambda::Function\n    Properties:\n      FunctionName: f{i}\n"
        ));
    }
    out
}

fn program_text(yaml: &str) -> String {
    let mut world = World::new();
    let d = world.add_deployment(Region::us_east_1(), Account::new("123456789012"));
    let mut stack = Stack::new(load_str(yaml, "mesh.yaml").expect("load"), "mesh.yaml")
        .expect("stack");
    stack
        .deploy(&mut world, d, &StackOptions::default())
        .expect("deploy");

    let mut analyzer = Analyzer::new(&world);
    analyzer.add_plugin(Mesh);
    analyzer.constrain().expect("constrain");
    let estimates = BTreeMap::from([(
        "Queue0".to_string(),
        BTreeMap::from([("nrequests".to_string(), 7)]),
    )]);
    analyzer
        .add_estimates(&estimates, EstimatePolicy::Exact)
        .expect("estimates");
    analyzer.to_text()
}

proptest! {
    #[test]
    fn program_text_is_reproducible(queues in 1usize..5, functions in 1usize..5) {
        let yaml = template(queues, functions);
        let first = program_text(&yaml);
        prop_assert_eq!(&first, &program_text(&yaml));

        // one conservation equation per function
        prop_assert_eq!(first.matches("(assert (= |").count(), functions + 1);
        let declared = first.matches("(declare-fun").count();
        prop_assert_eq!(declared, functions + queues * functions + 1);
    }
}

#[test]
fn estimates_accept_logical_ids() {
    let text = program_text(&template(1, 1));
    assert!(text.contains("(assert (= |arn:aws:sqs:us-east-1:123456789012:q0.nrequests| 7))"));
}
