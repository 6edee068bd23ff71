#![forbid(unsafe_code)]

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::{contains_scalar, CfnValue};

/// Dependency graph over the logical ids of one template.
///
/// An edge `a -> b` means `b` mentions `a` somewhere in its declaration and therefore has to be
/// compiled after it.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Builds the graph from `(logical id, declaration)` pairs given in document order.
    pub fn build<'a>(declarations: impl IntoIterator<Item = (&'a str, &'a CfnValue)>) -> Self {
        let declarations: Vec<(&str, &CfnValue)> = declarations.into_iter().collect();
        let mut out = Self::default();
        for (logical_id, _) in &declarations {
            let idx = out.graph.add_node(logical_id.to_string());
            out.nodes.insert(logical_id.to_string(), idx);
        }

        for (dependency, _) in &declarations {
            for (dependent, body) in &declarations {
                // A declaration mentioning its own id does not depend on itself.
                if dependency == dependent || !contains_scalar(body, dependency) {
                    continue;
                }
                let (a, b) = (out.nodes[*dependency], out.nodes[*dependent]);
                out.graph.update_edge(a, b, ());
            }
        }

        tracing::debug!(edges = ?out.edges(), "dependency graph");
        out
    }

    /// `(dependency, dependent)` pairs.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (self.graph[a].as_str(), self.graph[b].as_str()))
            .collect()
    }

    #[cfg(test)]
    fn depends_on(&self, dependent: &str, dependency: &str) -> bool {
        match (self.nodes.get(dependency), self.nodes.get(dependent)) {
            (Some(a), Some(b)) => self.graph.contains_edge(*a, *b),
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// A creation order in which every logical id comes after all of its dependencies.
    ///
    /// On a cycle, returns the logical id at which the cycle was detected.
    pub fn creation_order(&self) -> Result<Vec<String>, String> {
        toposort(&self.graph, None)
            .map(|order| order.into_iter().map(|i| self.graph[i].clone()).collect())
            .map_err(|cycle| self.graph[cycle.node_id()].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decls(yaml: &str) -> Vec<(String, CfnValue)> {
        let v: CfnValue = serde_yaml::from_str(yaml).expect("yaml");
        v.as_mapping()
            .expect("mapping")
            .iter()
            .map(|(k, v)| (k.as_str().expect("key").to_string(), v.clone()))
            .collect()
    }

    fn graph(d: &[(String, CfnValue)]) -> DependencyGraph {
        DependencyGraph::build(d.iter().map(|(k, v)| (k.as_str(), v)))
    }

    #[test]
    fn edges_point_from_referenced_to_referencing() {
        let d = decls(
            "Fn:\n  Properties: {Env: {Ref: Queue}}\nQueue:\n  Properties: {QueueName: q}\n",
        );
        let g = graph(&d);
        assert!(g.depends_on("Fn", "Queue"));
        assert!(!g.depends_on("Queue", "Fn"));
        assert_eq!(g.edges(), vec![("Queue", "Fn")]);

        let order = g.creation_order().expect("acyclic");
        assert_eq!(order, vec!["Queue".to_string(), "Fn".to_string()]);
    }

    #[test]
    fn duplicate_mentions_yield_one_edge() {
        let d = decls("A: {x: B, y: [B, {z: B}]}\nB: {}\n");
        assert_eq!(graph(&d).edges().len(), 1);
    }

    #[test]
    fn self_mention_is_not_a_cycle() {
        let d = decls("Queue:\n  Properties: {QueueName: Queue}\n");
        let g = graph(&d);
        assert!(g.edges().is_empty());
        assert_eq!(g.creation_order().expect("acyclic"), vec!["Queue".to_string()]);
    }

    #[test]
    fn mutual_references_are_cyclic() {
        let d = decls("A: {x: {Ref: B}}\nB: {x: {Ref: A}}\n");
        let node = graph(&d).creation_order().expect_err("cycle");
        assert!(node == "A" || node == "B");
    }
}
