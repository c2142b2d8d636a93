//! Graph view over a node and everything it depends on.
//!
//! Nodes form a DAG through their `Arc` inputs. This module flattens that
//! structure into a petgraph [`DiGraph`], deduplicating nodes shared by
//! several consumers, so executors can evaluate each node once in
//! topological order.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};

use super::types::{Node, NodeId};

/// Error returned when the node graph is not acyclic.
#[derive(Debug, thiserror::Error)]
#[error("cycle detected at node {0}")]
pub struct CycleError(pub NodeId);

pub struct NodeGraph {
  /// Edges point from an input to the node consuming it.
  graph: DiGraph<Node, &'static str>,
  index: HashMap<NodeId, NodeIndex>,
  root: NodeIndex,
}

impl NodeGraph {
  pub fn from_root(root: &Node) -> Self {
    let mut graph = DiGraph::new();
    let mut index = HashMap::new();

    let root_idx = graph.add_node(root.clone());
    index.insert(root.id(), root_idx);

    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
      let consumer = index[&node.id()];
      for input in node.inputs() {
        let input_idx = match index.get(&input.id()) {
          Some(&idx) => idx,
          None => {
            let idx = graph.add_node(input.clone());
            index.insert(input.id(), idx);
            stack.push(input.clone());
            idx
          }
        };
        // A merge may list the same input twice; one edge is enough for ordering.
        if graph.find_edge(input_idx, consumer).is_none() {
          graph.add_edge(input_idx, consumer, "input");
        }
      }
    }

    Self {
      graph,
      index,
      root: root_idx,
    }
  }

  pub fn root(&self) -> &Node {
    &self.graph[self.root]
  }

  /// Number of distinct nodes reachable from the root.
  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }

  pub fn contains(&self, id: NodeId) -> bool {
    self.index.contains_key(&id)
  }

  /// Nodes ordered so every node comes after all of its inputs.
  pub fn topological(&self) -> Result<Vec<Node>, CycleError> {
    let sorted = toposort(&self.graph, None).map_err(|cycle| CycleError(self.graph[cycle.node_id()].id()))?;
    Ok(sorted.into_iter().map(|idx| self.graph[idx].clone()).collect())
  }

  /// Number of distinct nodes consuming `id`.
  pub fn consumer_count(&self, id: NodeId) -> usize {
    self
      .index
      .get(&id)
      .map(|&idx| self.graph.neighbors_directed(idx, Direction::Outgoing).count())
      .unwrap_or(0)
  }

  /// Graphviz rendering, labelled with node ids and annotations.
  pub fn to_dot(&self) -> String {
    format!("{}", Dot::with_config(&self.graph, &[Config::EdgeNoLabel]))
  }
}

impl std::fmt::Debug for NodeGraph {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("NodeGraph")
      .field("root", &self.root().id())
      .field("nodes", &self.len())
      .finish()
  }
}
