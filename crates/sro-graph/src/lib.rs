//! SRO Graph - In-memory knowledge graph
//!
//! Builds a directed multigraph from a Triplet Collection: one node per
//! distinct subject or object string, one edge per triplet labelled with
//! its relation.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sro_core::Triplet;

// ============================================================================
// Knowledge Graph
// ============================================================================

/// Directed graph of entities connected by relations
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    graph: DiGraph<String, String>,
    nodes: HashMap<String, NodeIndex>,
}

/// A node and its total degree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDegree {
    pub node: String,
    pub degree: usize,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from triplets, in collection order
    pub fn from_triplets<'a, I>(triplets: I) -> Self
    where
        I: IntoIterator<Item = &'a Triplet>,
    {
        let mut graph = Self::new();
        for triplet in triplets {
            graph.add_triplet(triplet);
        }
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built knowledge graph"
        );
        graph
    }

    pub fn add_triplet(&mut self, triplet: &Triplet) {
        let subject = self.node(&triplet.subject);
        let object = self.node(&triplet.object);
        self.graph.add_edge(subject, object, triplet.relation.clone());
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.nodes.get(name) {
            return index;
        }
        let index = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), index);
        index
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, node: &str) -> bool {
        self.nodes.contains_key(node)
    }

    /// In-degree plus out-degree; 0 for unknown nodes
    pub fn degree(&self, node: &str) -> usize {
        self.nodes.get(node).map_or(0, |&index| {
            self.graph.edges_directed(index, Direction::Outgoing).count()
                + self.graph.edges_directed(index, Direction::Incoming).count()
        })
    }

    /// Distinct direct successors, in edge insertion order
    pub fn successors(&self, node: &str) -> Vec<&str> {
        let mut successors: Vec<&str> = Vec::new();
        for edge in self.outgoing(node) {
            let target = self.graph[edge.target()].as_str();
            if !successors.contains(&target) {
                successors.push(target);
            }
        }
        successors
    }

    /// Triplets on the node's outgoing edges, in insertion order
    pub fn subgraph(&self, node: &str) -> Vec<Triplet> {
        self.outgoing(node)
            .into_iter()
            .map(|edge| {
                Triplet::new(
                    self.graph[edge.source()].as_str(),
                    edge.weight().as_str(),
                    self.graph[edge.target()].as_str(),
                )
            })
            .collect()
    }

    /// The `n` nodes with the highest degree; ties keep insertion order
    pub fn top_nodes(&self, n: usize) -> Vec<NodeDegree> {
        let mut ranked: Vec<NodeDegree> = self
            .graph
            .node_indices()
            .map(|index| {
                let node = self.graph[index].clone();
                let degree = self.degree(&node);
                NodeDegree { node, degree }
            })
            .collect();
        ranked.sort_by(|a, b| b.degree.cmp(&a.degree));
        ranked.truncate(n);
        ranked
    }

    /// Petgraph lists outgoing edges newest first
    fn outgoing(&self, node: &str) -> Vec<petgraph::graph::EdgeReference<'_, String>> {
        let Some(&index) = self.nodes.get(node) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .collect();
        edges.sort_by_key(|edge| edge.id());
        edges
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn collection() -> Vec<Triplet> {
        vec![
            Triplet::new("bayer", "sell", "aspirin"),
            Triplet::new("bayer", "market", "aspirin"),
            Triplet::new("bayer", "acquire", "monsanto"),
            Triplet::new("monsanto", "produce", "roundup"),
        ]
    }

    #[test]
    fn test_counts() {
        let graph = KnowledgeGraph::from_triplets(&collection());
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert!(graph.contains("roundup"));
        assert!(!graph.contains("leverkusen"));
    }

    #[test]
    fn test_empty_graph() {
        let graph = KnowledgeGraph::from_triplets(&Vec::new());
        assert_eq!(graph.node_count(), 0);
        assert!(graph.top_nodes(3).is_empty());
        assert!(graph.subgraph("bayer").is_empty());
    }

    #[test]
    fn test_degree() {
        let graph = KnowledgeGraph::from_triplets(&collection());
        assert_eq!(graph.degree("bayer"), 3);
        assert_eq!(graph.degree("monsanto"), 2);
        assert_eq!(graph.degree("aspirin"), 2);
        assert_eq!(graph.degree("unknown"), 0);
    }

    #[test]
    fn test_successors_are_distinct_and_ordered() {
        let graph = KnowledgeGraph::from_triplets(&collection());
        assert_eq!(graph.successors("bayer"), vec!["aspirin", "monsanto"]);
        assert!(graph.successors("roundup").is_empty());
    }

    #[test]
    fn test_subgraph_keeps_parallel_edges() {
        let graph = KnowledgeGraph::from_triplets(&collection());
        assert_eq!(graph.subgraph("bayer"), collection()[..3].to_vec());
    }

    #[test]
    fn test_top_nodes() {
        let graph = KnowledgeGraph::from_triplets(&collection());
        let top = graph.top_nodes(2);
        assert_eq!(
            top,
            vec![
                NodeDegree { node: "bayer".into(), degree: 3 },
                NodeDegree { node: "aspirin".into(), degree: 2 },
            ]
        );
    }

    #[test]
    fn test_self_loop_counts_twice() {
        let graph = KnowledgeGraph::from_triplets(&[Triplet::new("a", "r", "a")]);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.degree("a"), 2);
    }
}
