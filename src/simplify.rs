//! Length-bounded chain coarsening.
//!
//! Separatrices arrive heavily oversampled: long runs of degree-2 regular
//! nodes between critical points. Simplification rebuilds the graph with only
//! the critical nodes plus enough waypoint nodes to keep every output edge's
//! traversed length under a budget, leaving the critical structure and
//! connectivity exactly intact.
//!
//! The walk is depth-first, launched once from every critical node, with one
//! visited set shared across all launches so each chain is collapsed exactly
//! once. It is implemented with an explicit frame stack rather than
//! recursion: input chains can be tens of thousands of nodes long, and the
//! iterative walker visits neighbors in the same order (ascending id, entry
//! check at call time) as the recursive formulation.

use std::collections::BTreeSet;
use std::str::FromStr;

use crate::graph::MorseGraph;
use crate::{Error, Result};

/// How traversed length is accumulated along a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthMode {
    /// Every traversed edge costs 1.
    Step,
    /// Every traversed edge costs the Euclidean distance between its
    /// endpoints' positions.
    GeoDist,
}

impl FromStr for LengthMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "step" => Ok(LengthMode::Step),
            "geo_dist" => Ok(LengthMode::GeoDist),
            other => Err(Error::UnsupportedMode(format!("length mode {other:?}"))),
        }
    }
}

/// One suspended traversal position: `node`'s neighbors from `cursor` on are
/// still to be processed, with `length` accumulated since `anchor` was last
/// materialized.
struct Frame {
    anchor: usize,
    node: usize,
    length: f64,
    neighbors: Vec<usize>,
    cursor: usize,
}

/// Traversal context: the shared visited set plus the output graph being
/// built. One instance lives for the duration of a single `simplify` call.
struct ChainWalker<'a> {
    graph: &'a MorseGraph,
    out: MorseGraph,
    visited: BTreeSet<usize>,
    min_length: f64,
    mode: LengthMode,
}

impl<'a> ChainWalker<'a> {
    fn new(graph: &'a MorseGraph, min_length: f64, mode: LengthMode) -> Result<Self> {
        let mut out = MorseGraph::new(graph.critical_nodes().clone());
        // Materialize every critical node up front so each one exists as an
        // anchor before any traversal reaches it.
        for &crit in graph.critical_nodes() {
            let node = graph
                .node(crit)
                .ok_or(Error::Invariant("critical-node set names a missing node"))?;
            out.add_node(crit, node.clone());
        }
        Ok(ChainWalker {
            graph,
            out,
            visited: BTreeSet::new(),
            min_length,
            mode,
        })
    }

    fn pos(&self, id: usize) -> Result<[f64; 2]> {
        Ok(self
            .graph
            .node(id)
            .ok_or(Error::Invariant("adjacency references a missing node"))?
            .pos)
    }

    fn step_cost(&self, from: usize, to: usize) -> Result<f64> {
        match self.mode {
            LengthMode::Step => Ok(1.0),
            LengthMode::GeoDist => {
                let (a, b) = (self.pos(from)?, self.pos(to)?);
                let (dx, dy) = (a[0] - b[0], a[1] - b[1]);
                Ok((dx * dx + dy * dy).sqrt())
            }
        }
    }

    /// Copy a node into the output graph if it is not there yet.
    fn materialize(&mut self, id: usize) -> Result<()> {
        if !self.out.has_node(id) {
            let node = self
                .graph
                .node(id)
                .ok_or(Error::Invariant("adjacency references a missing node"))?;
            self.out.add_node(id, node.clone());
        }
        Ok(())
    }

    /// Emulate a traversal call: entry check, mark visited, push a frame.
    ///
    /// Already-visited non-critical nodes are skipped — the chain through
    /// them has been collapsed already.
    fn push_call(&mut self, stack: &mut Vec<Frame>, anchor: usize, node: usize, length: f64) {
        if self.visited.contains(&node) && !self.graph.is_critical(node) {
            return;
        }
        self.visited.insert(node);
        stack.push(Frame {
            anchor,
            node,
            length,
            neighbors: self.graph.neighbors(node).collect(),
            cursor: 0,
        });
    }

    /// Run one independent traversal launched from a critical node.
    fn walk_from(&mut self, crit: usize) -> Result<()> {
        let mut stack: Vec<Frame> = Vec::new();
        self.push_call(&mut stack, crit, crit, 0.0);

        while let Some(frame) = stack.last_mut() {
            if frame.cursor == frame.neighbors.len() {
                stack.pop();
                continue;
            }
            let n = frame.neighbors[frame.cursor];
            frame.cursor += 1;
            let (anchor, node, length) = (frame.anchor, frame.node, frame.length);

            if self.visited.contains(&n) && !self.graph.is_critical(n) {
                continue;
            }

            if self.graph.is_critical(n) {
                // A critical node terminates the segment. Critical nodes may
                // be reached from several directions (this is what closes
                // separatrix cycles through a single critical point), and
                // edge insertion dedupes; only the degenerate loop straight
                // back onto the current anchor is dropped.
                self.materialize(n)?;
                if anchor != n {
                    self.out.add_edge(anchor, n)?;
                }
                continue;
            }

            let new_length = length + self.step_cost(node, n)?;
            if new_length > self.min_length {
                // Budget exceeded: n becomes a waypoint and the traversal
                // restarts from it with a fresh budget.
                self.materialize(n)?;
                self.out.add_edge(anchor, n)?;
                self.push_call(&mut stack, n, n, 0.0);
            } else {
                self.push_call(&mut stack, anchor, n, new_length);
            }
        }
        Ok(())
    }

    /// Check postconditions and hand over the output graph.
    fn finish(self, input: &MorseGraph) -> Result<MorseGraph> {
        if self.out.critical_nodes() != input.critical_nodes() {
            return Err(Error::Invariant(
                "simplification changed the critical-node set",
            ));
        }
        for &crit in input.critical_nodes() {
            if !self.out.has_node(crit) {
                return Err(Error::Invariant(
                    "simplification dropped a critical node",
                ));
            }
        }
        if !self.out.is_connected() {
            return Err(Error::Invariant("simplified graph is disconnected"));
        }
        Ok(self.out)
    }
}

impl MorseGraph {
    /// Coarsen long non-critical chains, keeping critical structure intact.
    ///
    /// Walks every separatrix chain and re-emits it as a sequence of waypoint
    /// nodes spaced so that the traversed length between consecutive output
    /// nodes never exceeds `min_length` (per-edge cost chosen by `mode`).
    /// The input graph is left unmodified; node ids in the output are a
    /// subset of the input's.
    ///
    /// Postconditions are checked, not assumed: the output is connected and
    /// carries exactly the input's critical-node set, otherwise this fails
    /// with [`Error::Invariant`].
    pub fn simplify(&self, min_length: f64, mode: LengthMode) -> Result<MorseGraph> {
        if !min_length.is_finite() || min_length <= 0.0 {
            return Err(Error::Domain("min_length must be positive and finite"));
        }

        let mut walker = ChainWalker::new(self, min_length, mode)?;
        let criticals: Vec<usize> = self.critical_nodes().iter().copied().collect();
        for crit in criticals {
            walker.walk_from(crit)?;
        }
        walker.finish(self)
    }
}
