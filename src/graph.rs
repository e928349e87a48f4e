//! The Morse graph arena and assembly from upstream tables.
//!
//! A [`MorseGraph`] is an undirected simple graph over integer node ids, with
//! a node-attribute record per id and a distinguished critical-node set. Node
//! ids are external and stable: a simplified graph keeps the ids the original
//! indexer assigned, which is what makes measure networks from the original
//! and simplified graph comparable.
//!
//! Storage is a `BTreeMap` arena plus `BTreeSet` adjacency lists, so node and
//! neighbor iteration is always in ascending id order. That ordering is load
//! bearing: it fixes the canonical support order of the measure network and
//! the tie-breaking of the simplification walk.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::point_index::{index_points, PointIndex};
use crate::tables::{CriticalPoint, SeparatrixCell, SeparatrixPoint};
use crate::{Error, Result};

/// Node attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct MorseNode {
    /// 2D position of the node's first-seen representative sample.
    pub pos: [f64; 2],
    /// Table rows that collapsed into this node.
    pub point_ids: Vec<usize>,
    /// Whether this node is a critical point of the scalar field.
    pub is_critical: bool,
    /// Whether the node lies on the data's bounding box.
    pub on_boundary: bool,
}

/// Undirected simple graph over Morse nodes, plus the critical-node set.
#[derive(Debug, Clone, PartialEq)]
pub struct MorseGraph {
    nodes: BTreeMap<usize, MorseNode>,
    adjacency: BTreeMap<usize, BTreeSet<usize>>,
    critical_nodes: BTreeSet<usize>,
}

impl MorseGraph {
    /// An empty graph with a fixed critical-node set.
    ///
    /// Nodes (including the critical ones) still have to be registered with
    /// [`add_node`](Self::add_node) before edges can reference them.
    pub fn new(critical_nodes: BTreeSet<usize>) -> Self {
        MorseGraph {
            nodes: BTreeMap::new(),
            adjacency: BTreeMap::new(),
            critical_nodes,
        }
    }

    /// Register a node. Re-inserting an id replaces its attributes and keeps
    /// existing edges.
    pub fn add_node(&mut self, id: usize, node: MorseNode) {
        self.nodes.insert(id, node);
        self.adjacency.entry(id).or_default();
    }

    /// Add an undirected edge. Duplicate insertions collapse.
    ///
    /// Both endpoints must already be registered.
    pub fn add_edge(&mut self, u: usize, v: usize) -> Result<()> {
        if !self.nodes.contains_key(&u) || !self.nodes.contains_key(&v) {
            return Err(Error::Domain("edge endpoint is not a registered node"));
        }
        self.adjacency.entry(u).or_default().insert(v);
        self.adjacency.entry(v).or_default().insert(u);
        Ok(())
    }

    pub fn has_node(&self, id: usize) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: usize) -> Option<&MorseNode> {
        self.nodes.get(&id)
    }

    /// Nodes with attributes, ascending by id.
    pub fn nodes(&self) -> impl Iterator<Item = (usize, &MorseNode)> {
        self.nodes.iter().map(|(&id, node)| (id, node))
    }

    /// Node ids, ascending.
    pub fn node_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes.keys().copied()
    }

    /// Neighbors of `id`, ascending by id. Empty for unknown nodes.
    pub fn neighbors(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency.get(&id).into_iter().flatten().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        let degree_sum: usize = self.adjacency.values().map(|adj| adj.len()).sum();
        // A self-loop shows up once in its node's adjacency set, not twice.
        let self_loops = self
            .adjacency
            .iter()
            .filter(|(id, adj)| adj.contains(id))
            .count();
        (degree_sum + self_loops) / 2
    }

    pub fn critical_nodes(&self) -> &BTreeSet<usize> {
        &self.critical_nodes
    }

    pub fn is_critical(&self, id: usize) -> bool {
        self.critical_nodes.contains(&id)
    }

    /// Whether every node is reachable from every other. The empty graph is
    /// not considered connected.
    pub fn is_connected(&self) -> bool {
        let Some(&start) = self.nodes.keys().next() else {
            return false;
        };
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            for n in self.neighbors(id) {
                if seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        seen.len() == self.nodes.len()
    }

    /// Assemble the graph from indexed points and separatrix connectivity.
    ///
    /// Every connectivity pair is translated through the point map and added
    /// as an edge (idempotent if already present). A disconnected result is
    /// an unrecoverable input defect and fails with [`Error::Structural`].
    pub fn assemble(cells: &[SeparatrixCell], index: PointIndex) -> Result<MorseGraph> {
        let mut graph = MorseGraph::new(index.critical_nodes);
        for (id, node) in index.nodes {
            graph.add_node(id, node);
        }

        for (row, cell) in cells.iter().enumerate() {
            let mut node_ids = [0usize; 2];
            for (slot, &point_id) in node_ids.iter_mut().zip(&cell.points) {
                *slot = *index.point_to_node.get(&point_id).ok_or_else(|| {
                    Error::Consistency(format!(
                        "separatrix cell {row} references unknown point {point_id}"
                    ))
                })?;
            }
            graph.add_edge(node_ids[0], node_ids[1])?;
        }

        if !graph.is_connected() {
            return Err(Error::Structural("assembled Morse graph is disconnected"));
        }
        Ok(graph)
    }

    /// Full pipeline from the three upstream tables: index points, then
    /// assemble.
    pub fn from_tables(
        points: &[SeparatrixPoint],
        cells: &[SeparatrixCell],
        critical_points: &[CriticalPoint],
    ) -> Result<MorseGraph> {
        let index = index_points(points, critical_points)?;
        MorseGraph::assemble(cells, index)
    }
}
