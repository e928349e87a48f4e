//! Sample deduplication and node-id assignment.
//!
//! Separatrix point tables oversample critical points: every separatrix
//! incident to a critical point carries its own copy of that point, tagged
//! with the same cell id. Indexing collapses those copies into one canonical
//! node per critical cell, assigns stable integer node ids, and flags nodes
//! that sit on the data's bounding box.
//!
//! Node ids are assigned in ascending (x, y) coordinate order, so they are
//! reproducible across runs regardless of upstream row order.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::graph::MorseNode;
use crate::tables::{CriticalPoint, SeparatrixPoint};
use crate::{Error, Result};

/// Axis-aligned bounding box over a set of 2D samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl BoundingBox {
    /// Bounding box of a non-empty point table.
    pub fn of(points: &[SeparatrixPoint]) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::Domain("point table must be non-empty"));
        }
        let mut bb = BoundingBox {
            min: [f64::INFINITY; 2],
            max: [f64::NEG_INFINITY; 2],
        };
        for p in points {
            for axis in 0..2 {
                bb.min[axis] = bb.min[axis].min(p.pos[axis]);
                bb.max[axis] = bb.max[axis].max(p.pos[axis]);
            }
        }
        Ok(bb)
    }

    /// Whether `pos` lies on any edge of the box.
    ///
    /// Exact float comparison is intentional: boundary samples are emitted by
    /// the upstream pipeline with coordinates exactly on the grid extent.
    #[inline]
    pub fn on_edge(&self, pos: [f64; 2]) -> bool {
        pos[0] == self.min[0]
            || pos[0] == self.max[0]
            || pos[1] == self.min[1]
            || pos[1] == self.max[1]
    }
}

/// Output of [`index_points`]: the canonical node arena plus the maps the
/// assembler needs to translate connectivity rows.
#[derive(Debug, Clone)]
pub struct PointIndex {
    /// sample id (table row) → node id.
    pub point_to_node: HashMap<usize, usize>,
    /// node id → node attributes, in id order.
    pub nodes: BTreeMap<usize, MorseNode>,
    /// Node ids of critical points.
    pub critical_nodes: BTreeSet<usize>,
}

/// Deduplicate and index raw point samples into canonical graph nodes.
///
/// - Samples are visited in ascending (x, y) order; ties keep table order.
/// - A critical sample whose cell id was already seen merges into the
///   existing node: its sample id is appended, but the node keeps the
///   position and boundary flag of its first-seen representative.
/// - A critical sample with a *new* cell id must be listed in the
///   critical-point table; otherwise the upstream data is malformed and this
///   fails with [`Error::Consistency`].
///
/// Pure function of its inputs; no side effects beyond the returned maps.
pub fn index_points(
    points: &[SeparatrixPoint],
    critical_points: &[CriticalPoint],
) -> Result<PointIndex> {
    let critical_cells: HashSet<u64> = critical_points.iter().map(|c| c.cell_id).collect();
    let bbox = BoundingBox::of(points)?;

    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        let (pa, pb) = (points[a].pos, points[b].pos);
        pa[0].total_cmp(&pb[0]).then(pa[1].total_cmp(&pb[1]))
    });

    let mut point_to_node = HashMap::with_capacity(points.len());
    let mut nodes = BTreeMap::new();
    let mut critical_nodes = BTreeSet::new();
    // cell id → node id, for critical samples only.
    let mut cell_to_node: HashMap<u64, usize> = HashMap::new();
    let mut next_node = 0usize;

    for sample_id in order {
        let sample = &points[sample_id];
        let is_crit = sample.is_critical_sample();

        if is_crit {
            if let Some(&node_id) = cell_to_node.get(&sample.cell_id) {
                // Another copy of an already-indexed critical point. The
                // first-seen representative stays canonical.
                let node: &mut MorseNode = nodes
                    .get_mut(&node_id)
                    .ok_or(Error::Invariant("cell map references a missing node"))?;
                node.point_ids.push(sample_id);
                point_to_node.insert(sample_id, node_id);
                continue;
            }
            if !critical_cells.contains(&sample.cell_id) {
                return Err(Error::Consistency(format!(
                    "point {sample_id} is critical-flagged but its cell {} is not in the \
                     critical-point table",
                    sample.cell_id
                )));
            }
            cell_to_node.insert(sample.cell_id, next_node);
            critical_nodes.insert(next_node);
        }

        point_to_node.insert(sample_id, next_node);
        nodes.insert(
            next_node,
            MorseNode {
                pos: sample.pos,
                point_ids: vec![sample_id],
                is_critical: is_crit,
                on_boundary: bbox.on_edge(sample.pos),
            },
        );
        next_node += 1;
    }

    Ok(PointIndex {
        point_to_node,
        nodes,
        critical_nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pt(x: f64, y: f64, cell_id: u64, mask: i64) -> SeparatrixPoint {
        SeparatrixPoint {
            pos: [x, y],
            cell_id,
            mask,
        }
    }

    fn crit(cell_id: u64) -> CriticalPoint {
        CriticalPoint { cell_id }
    }

    #[test]
    fn node_ids_follow_coordinate_order_not_row_order() {
        // Rows arrive in reverse coordinate order.
        let points = vec![pt(2.0, 0.0, 2, 1), pt(1.0, 0.0, 1, 1), pt(0.0, 0.0, 0, 1)];
        let index = index_points(&points, &[]).unwrap();

        assert_eq!(index.point_to_node[&2], 0); // x = 0.0
        assert_eq!(index.point_to_node[&1], 1); // x = 1.0
        assert_eq!(index.point_to_node[&0], 2); // x = 2.0
        assert_eq!(index.nodes[&0].pos, [0.0, 0.0]);
    }

    #[test]
    fn second_axis_breaks_first_axis_ties() {
        let points = vec![pt(0.0, 5.0, 0, 1), pt(0.0, -5.0, 1, 1)];
        let index = index_points(&points, &[]).unwrap();
        assert_eq!(index.point_to_node[&1], 0);
        assert_eq!(index.point_to_node[&0], 1);
    }

    #[test]
    fn critical_samples_sharing_a_cell_merge_into_one_node() {
        let points = vec![
            pt(0.0, 0.0, 10, 0),
            pt(0.5, 0.5, 3, 1),
            pt(0.0, 0.0, 10, 0),
            pt(1.0, 1.0, 10, 0), // same critical cell, different coordinate
        ];
        let index = index_points(&points, &[crit(10)]).unwrap();

        let node_id = index.point_to_node[&0];
        assert_eq!(index.point_to_node[&2], node_id);
        assert_eq!(index.point_to_node[&3], node_id);
        assert_ne!(index.point_to_node[&1], node_id);

        // First-seen representative wins: position stays at the origin copy.
        let node = &index.nodes[&node_id];
        assert_eq!(node.pos, [0.0, 0.0]);
        assert_eq!(node.point_ids.len(), 3);
        assert!(node.is_critical);
        assert_eq!(index.critical_nodes, BTreeSet::from([node_id]));
    }

    #[test]
    fn unknown_critical_cell_is_a_consistency_error() {
        let points = vec![pt(0.0, 0.0, 99, 0), pt(1.0, 0.0, 1, 1)];
        let err = index_points(&points, &[crit(10)]).unwrap_err();
        assert!(matches!(err, Error::Consistency(_)), "got {err:?}");
    }

    #[test]
    fn empty_table_is_rejected() {
        assert!(matches!(
            index_points(&[], &[]),
            Err(Error::Domain(_))
        ));
    }

    #[test]
    fn extreme_samples_are_on_boundary_interior_are_not() {
        let points = vec![
            pt(0.0, 0.0, 0, 1),
            pt(2.0, 2.0, 1, 1),
            pt(1.0, 1.0, 2, 1), // interior
            pt(0.0, 1.5, 3, 1), // on min-x edge
        ];
        let index = index_points(&points, &[]).unwrap();
        let node_of = |sample: usize| &index.nodes[&index.point_to_node[&sample]];

        assert!(node_of(0).on_boundary);
        assert!(node_of(1).on_boundary);
        assert!(!node_of(2).on_boundary);
        assert!(node_of(3).on_boundary);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            .. ProptestConfig::default()
        })]
        #[test]
        fn prop_indexing_is_deterministic_and_total(
            n in 1usize..64,
            seed in any::<u64>(),
        ) {
            use rand::{Rng, SeedableRng};
            use rand_chacha::ChaCha8Rng;
            use rand_distr::{Distribution, StandardNormal};

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut points = Vec::with_capacity(n);
            for i in 0..n {
                let x: f64 = StandardNormal.sample(&mut rng);
                let y: f64 = StandardNormal.sample(&mut rng);
                // Roughly a third of the samples are copies of critical cells.
                let is_crit = rng.gen_bool(0.3);
                let cell_id = if is_crit { (i % 5) as u64 } else { 100 + i as u64 };
                points.push(pt(x, y, cell_id, if is_crit { 0 } else { 1 }));
            }
            let crits: Vec<CriticalPoint> = (0u64..5).map(crit).collect();

            let a = index_points(&points, &crits).unwrap();
            let b = index_points(&points, &crits).unwrap();

            // Deterministic.
            prop_assert_eq!(&a.point_to_node, &b.point_to_node);
            prop_assert_eq!(&a.critical_nodes, &b.critical_nodes);

            // Every sample maps to a known node; critical flags agree with
            // the critical-node set both ways.
            prop_assert_eq!(a.point_to_node.len(), n);
            for node_id in a.point_to_node.values() {
                prop_assert!(a.nodes.contains_key(node_id));
            }
            for (id, node) in &a.nodes {
                prop_assert_eq!(node.is_critical, a.critical_nodes.contains(id));
            }

            // Merge law: two critical samples with one cell id share a node.
            for (i, p) in points.iter().enumerate() {
                for (j, q) in points.iter().enumerate().skip(i + 1) {
                    if p.is_critical_sample() && q.is_critical_sample() && p.cell_id == q.cell_id {
                        prop_assert_eq!(a.point_to_node[&i], a.point_to_node[&j]);
                    }
                }
            }
        }
    }
}
