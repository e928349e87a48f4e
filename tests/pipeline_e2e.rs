use std::collections::BTreeSet;

use morsegraph::tables::{parse_critical_points, parse_separatrix_cells, parse_separatrix_points};
use morsegraph::{CriticalPoint, MorseGraph, SeparatrixCell, SeparatrixPoint};

fn pt(x: f64, y: f64, cell_id: u64, mask: i64) -> SeparatrixPoint {
    SeparatrixPoint {
        pos: [x, y],
        cell_id,
        mask,
    }
}

#[test]
fn tables_to_graph_end_to_end() {
    // Two critical cells (10, 20) at the ends of one separatrix sampled by
    // four points; the two interior samples are regular.
    let points = vec![
        pt(0.0, 0.0, 10, 0),
        pt(1.0, 0.5, 1, 1),
        pt(2.0, 0.5, 2, 1),
        pt(3.0, 0.0, 20, 0),
    ];
    let cells = vec![
        SeparatrixCell { points: [0, 1] },
        SeparatrixCell { points: [1, 2] },
        SeparatrixCell { points: [2, 3] },
    ];
    let crits = vec![CriticalPoint { cell_id: 10 }, CriticalPoint { cell_id: 20 }];

    let graph = MorseGraph::from_tables(&points, &cells, &crits).unwrap();

    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.edge_count(), 3);
    assert!(graph.is_connected());
    // Rows are already in ascending (x, y) order, so node ids match rows:
    // the cell-10 sample became node 0 and the cell-20 sample node 3.
    assert_eq!(graph.critical_nodes(), &BTreeSet::from([0, 3]));

    // The bounding box is [0, 3] × [0, 0.5]; the end samples sit on the
    // min-y edge and the interior samples on the max-y edge.
    assert!(graph.nodes().all(|(_, n)| n.on_boundary));
}

#[test]
fn csv_tables_to_measure_network_end_to_end() {
    let points_csv = "\
ttkMaskScalarField,CellId,Points_0,Points_1
0,10,0.0,0.0
1,1,1.0,0.5
1,2,2.0,-0.5
0,20,3.0,0.0
";
    let cells_csv = "\
Point Index 0,Point Index 1
0,1
1,2
2,3
";
    let critical_csv = "CellId\n10\n20\n";

    let points = parse_separatrix_points(points_csv).unwrap();
    let cells = parse_separatrix_cells(cells_csv).unwrap();
    let crits = parse_critical_points(critical_csv).unwrap();

    let graph = MorseGraph::from_tables(&points, &cells, &crits).unwrap();
    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.critical_nodes(), &BTreeSet::from([0, 3]));

    let net = graph.to_measure_network("path_length").unwrap();
    assert_eq!(net.support, vec![0, 1, 2, 3]);
    assert_eq!(net.distances[[0, 3]], 3.0);
    assert_eq!(net.measure.to_vec(), vec![0.25; 4]);

    // The exporter refuses modes it does not implement, with no output.
    assert!(graph.to_measure_network("geodesic").is_err());
}

#[test]
fn duplicated_critical_samples_deduplicate_across_separatrices() {
    // Two separatrices share the critical cell 10: its sample appears twice
    // (rows 0 and 3) and must collapse into one node.
    let points = vec![
        pt(1.0, 1.0, 10, 0),
        pt(0.0, 1.0, 1, 1),
        pt(2.0, 1.0, 2, 1),
        pt(1.0, 1.0, 10, 0),
        pt(0.0, 0.0, 20, 0),
        pt(2.0, 2.0, 30, 0),
    ];
    let cells = vec![
        SeparatrixCell { points: [0, 1] },
        SeparatrixCell { points: [1, 4] },
        SeparatrixCell { points: [3, 2] },
        SeparatrixCell { points: [2, 5] },
    ];
    let crits = vec![
        CriticalPoint { cell_id: 10 },
        CriticalPoint { cell_id: 20 },
        CriticalPoint { cell_id: 30 },
    ];

    let graph = MorseGraph::from_tables(&points, &cells, &crits).unwrap();

    // 6 samples, one duplicate pair: 5 nodes.
    assert_eq!(graph.node_count(), 5);
    assert_eq!(graph.edge_count(), 4);
    assert_eq!(graph.critical_nodes().len(), 3);
    assert!(graph.is_connected());

    // The shared critical node carries both originating sample ids.
    let hub = graph
        .nodes()
        .find(|(_, n)| n.point_ids.len() == 2)
        .map(|(id, _)| id)
        .unwrap();
    assert!(graph.is_critical(hub));
}
