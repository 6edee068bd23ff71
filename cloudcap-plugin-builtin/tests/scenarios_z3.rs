#![cfg(feature = "z3")]

use std::collections::BTreeMap;

use cloudcap_analyzer::{Analyzer, EstimatePolicy, Estimates, Verdict, Z3Oracle};
use cloudcap_aws::{Account, Region, World};
use cloudcap_cfn::{load_str, Stack, StackOptions};
use cloudcap_plugin_builtin::builtin_plugins;

const TEMPLATE: &str = r#"
Resources:
  Consumer:
    Type: AWS::Lambda::Function
    Properties:
      FunctionName: consumer
  Jobs:
    Type: AWS::SQS::Queue
    Properties:
      QueueName: jobs
  Wiring:
    Type: AWS::Lambda::EventSourceMapping
    Properties:
      EventSourceArn: !GetAtt Jobs.Arn
      FunctionName: !GetAtt Consumer.Arn
"#;

fn compile() -> World {
    let mut world = World::new();
    let d = world.add_deployment(Region::us_east_1(), Account::new("123456789012"));
    let mut stack = Stack::new(load_str(TEMPLATE, "z3.yaml").expect("load"), "z3.yaml")
        .expect("stack");
    stack
        .deploy(&mut world, d, &StackOptions::default())
        .expect("deploy");
    world
}

fn analyze(world: &World, estimates: Option<Estimates>, policy: EstimatePolicy) -> Verdict {
    let mut analyzer = Analyzer::with_plugins(world, builtin_plugins());
    analyzer.constrain().expect("constrain");
    if let Some(e) = estimates {
        analyzer.add_estimates(&e, policy).expect("estimates");
    }
    analyzer.solve(&mut Z3Oracle::default()).expect("solve")
}

fn estimates(queue: i64, function: i64) -> Estimates {
    BTreeMap::from([
        ("Jobs".to_string(), BTreeMap::from([("nrequests".to_string(), queue)])),
        ("Consumer".to_string(), BTreeMap::from([("nrequests".to_string(), function)])),
    ])
}

#[test]
fn unconstrained_template_passes() {
    let world = compile();
    assert_eq!(analyze(&world, None, EstimatePolicy::Exact), Verdict::Pass);
}

#[test]
fn consumer_below_queue_volume_is_rejected() {
    let world = compile();
    assert_eq!(
        analyze(&world, Some(estimates(10, 5)), EstimatePolicy::Exact),
        Verdict::Reject
    );
}

#[test]
fn matching_volumes_pass() {
    let world = compile();
    assert_eq!(
        analyze(&world, Some(estimates(10, 10)), EstimatePolicy::Exact),
        Verdict::Pass
    );
}

#[test]
fn lower_bounds_leave_room() {
    let world = compile();
    assert_eq!(
        analyze(&world, Some(estimates(10, 5)), EstimatePolicy::AtLeast),
        Verdict::Pass
    );
}
