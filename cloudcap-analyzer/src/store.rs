#![forbid(unsafe_code)]

use std::collections::HashMap;

use cloudcap_aws::Arn;

use crate::{Constraint, ConstraintProgram, Metric, Variable};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub resource: Arn,
    pub metric: Metric,
}

/// A directed connection: `source` sends `metric` to `destination`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub source: Arn,
    pub destination: Arn,
    pub metric: Metric,
}

/// Variable caches plus the program they are declared in.
///
/// Node and edge variables are created on first use and returned unchanged afterwards. Plugins
/// receive the store separately from the analyzer that owns them.
#[derive(Debug, Default)]
pub struct ConstraintStore {
    program: ConstraintProgram,
    nodes: HashMap<NodeKey, Variable>,
    edges: HashMap<EdgeKey, Variable>,
    node_order: Vec<NodeKey>,
    edge_order: Vec<EdgeKey>,
}

impl ConstraintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The variable for `metric` on `resource`, named `{arn}.{metric}`.
    pub fn node(&mut self, resource: &Arn, metric: Metric) -> Variable {
        let key = NodeKey {
            resource: resource.clone(),
            metric,
        };
        if let Some(v) = self.nodes.get(&key) {
            return *v;
        }
        let v = self.program.declare(format!("{resource}.{metric}"));
        self.nodes.insert(key.clone(), v);
        self.node_order.push(key);
        v
    }

    /// The variable for `metric` flowing from `source` to `destination`, named
    /// `{source}.{destination}.{metric}`.
    pub fn edge(&mut self, source: &Arn, destination: &Arn, metric: Metric) -> Variable {
        let key = EdgeKey {
            source: source.clone(),
            destination: destination.clone(),
            metric,
        };
        if let Some(v) = self.edges.get(&key) {
            return *v;
        }
        let v = self
            .program
            .declare(format!("{source}.{destination}.{metric}"));
        self.edges.insert(key.clone(), v);
        self.edge_order.push(key);
        v
    }

    pub fn assert(&mut self, constraint: Constraint) {
        self.program.assert(constraint);
    }

    pub fn program(&self) -> &ConstraintProgram {
        &self.program
    }

    /// Node keys in creation order, with their variables.
    pub fn nodes(&self) -> impl Iterator<Item = (&NodeKey, Variable)> + '_ {
        self.node_order.iter().map(|k| (k, self.nodes[k]))
    }

    /// Edge keys in creation order, with their variables.
    pub fn edges(&self) -> impl Iterator<Item = (&EdgeKey, Variable)> + '_ {
        self.edge_order.iter().map(|k| (k, self.edges[k]))
    }

    #[cfg(test)]
    fn find_node(&self, resource: &Arn, metric: Metric) -> Option<Variable> {
        self.nodes
            .get(&NodeKey {
                resource: resource.clone(),
                metric,
            })
            .copied()
    }

    #[cfg(test)]
    fn find_edge(&self, source: &Arn, destination: &Arn, metric: Metric) -> Option<Variable> {
        self.edges
            .get(&EdgeKey {
                source: source.clone(),
                destination: destination.clone(),
                metric,
            })
            .copied()
    }
}
