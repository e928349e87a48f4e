//! Measure-network export.
//!
//! A measure network `(X, W, μ)` is the standard input shape for
//! optimal-transport graph comparison: a canonical support sequence, a
//! pairwise distance matrix over it, and a probability measure. The external
//! transport solver consumes two of these and returns a coupling; none of
//! that lives here.
//!
//! Only hop-count distances (`"path_length"`) are implemented. A geometric
//! analog of `simplify`'s `geo_dist` mode would be a natural extension, but
//! its semantics are not pinned down yet, so any other mode is rejected.

use std::collections::{BTreeMap, VecDeque};

use ndarray::{Array1, Array2};

use crate::graph::MorseGraph;
use crate::{Error, Result};

/// Immutable `(X, W, μ)` snapshot of a [`MorseGraph`].
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureNetwork {
    /// Canonical support: node ids in ascending order.
    pub support: Vec<usize>,
    /// `|X| × |X|` symmetric shortest-path distance matrix, zero diagonal.
    pub distances: Array2<f64>,
    /// Probability measure over the support; non-negative, sums to 1.
    pub measure: Array1<f64>,
}

impl MeasureNetwork {
    pub fn len(&self) -> usize {
        self.support.len()
    }

    pub fn is_empty(&self) -> bool {
        self.support.is_empty()
    }
}

/// BFS hop distances from `source` into `row`, with `index` translating node
/// ids to support positions. Fails if some node is unreachable.
fn bfs_hops(
    graph: &MorseGraph,
    index: &BTreeMap<usize, usize>,
    source: usize,
    row: &mut [f64],
) -> Result<()> {
    let slot_of = |id: usize| {
        index
            .get(&id)
            .copied()
            .ok_or(Error::Invariant("traversal reached a node outside the support"))
    };

    row.fill(f64::INFINITY);
    row[slot_of(source)?] = 0.0;

    let mut queue = VecDeque::from([source]);
    while let Some(id) = queue.pop_front() {
        let next_hops = row[slot_of(id)?] + 1.0;
        for n in graph.neighbors(id) {
            let slot = slot_of(n)?;
            if row[slot].is_infinite() {
                row[slot] = next_hops;
                queue.push_back(n);
            }
        }
    }

    if row.iter().any(|d| d.is_infinite()) {
        return Err(Error::Structural(
            "graph must be connected to export a measure network",
        ));
    }
    Ok(())
}

impl MorseGraph {
    /// Export this graph as a measure network.
    ///
    /// The support is the ascending node-id sequence, `W` holds all-pairs
    /// shortest-path hop counts, and `μ` is uniform. `dist` selects the
    /// distance mode; only `"path_length"` is implemented, anything else
    /// fails with [`Error::UnsupportedMode`] and produces no output.
    pub fn to_measure_network(&self, dist: &str) -> Result<MeasureNetwork> {
        if dist != "path_length" {
            return Err(Error::UnsupportedMode(format!("distance mode {dist:?}")));
        }
        if self.node_count() == 0 {
            return Err(Error::Domain("cannot export an empty graph"));
        }

        let support: Vec<usize> = self.node_ids().collect();
        let n = support.len();
        // Node ids are sparse after simplification; translate them to dense
        // matrix positions through the support sequence.
        let index: BTreeMap<usize, usize> =
            support.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let mut distances = Array2::<f64>::zeros((n, n));
        for (i, &source) in support.iter().enumerate() {
            let mut row = distances.row_mut(i);
            bfs_hops(
                self,
                &index,
                source,
                row.as_slice_mut()
                    .ok_or(Error::Invariant("distance matrix row is not contiguous"))?,
            )?;
        }

        let measure = Array1::<f64>::from_elem(n, 1.0 / n as f64);
        Ok(MeasureNetwork {
            support,
            distances,
            measure,
        })
    }
}
