use collection_model::{CollectionGraph, ExplorationId, ModelError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn distinct_ids(max: usize) -> impl Strategy<Value = Vec<ExplorationId>> {
    prop::collection::btree_set("[a-z0-9]{4,12}", 0..max)
        .prop_map(|set| set.into_iter().map(ExplorationId::new).collect())
}

fn build(ids: &[ExplorationId]) -> CollectionGraph {
    let mut graph = CollectionGraph::new();
    for id in ids {
        graph.add_node(id.clone()).unwrap();
    }
    graph
}

proptest! {
    #[test]
    fn prop_add_preserves_call_order(ids in distinct_ids(16)) {
        let graph = build(&ids);
        prop_assert_eq!(graph.len(), ids.len());
        let order: Vec<_> = graph.ids().cloned().collect();
        prop_assert_eq!(order, ids);
    }

    #[test]
    fn prop_duplicate_add_leaves_graph_unchanged(ids in distinct_ids(8), pick in any::<prop::sample::Index>()) {
        prop_assume!(!ids.is_empty());
        let mut graph = build(&ids);
        let before = graph.clone();
        let dup = ids[pick.index(ids.len())].clone();
        prop_assert!(matches!(graph.add_node(dup), Err(ModelError::DuplicateNode(_))));
        prop_assert_eq!(graph, before);
    }

    #[test]
    fn prop_boundary_shifts_are_noops(ids in distinct_ids(10)) {
        prop_assume!(!ids.is_empty());
        let mut graph = build(&ids);
        let before = graph.clone();
        prop_assert!(!graph.shift_left(0).unwrap());
        prop_assert!(!graph.shift_right(ids.len() - 1).unwrap());
        prop_assert_eq!(graph, before);
    }

    #[test]
    fn prop_shift_left_then_right_restores(ids in distinct_ids(10), pick in any::<prop::sample::Index>()) {
        prop_assume!(ids.len() >= 2);
        let position = 1 + pick.index(ids.len() - 1);
        let mut graph = build(&ids);
        let before = graph.clone();
        graph.shift_left(position).unwrap();
        prop_assert_eq!(graph.get(position - 1), before.get(position));
        graph.shift_right(position - 1).unwrap();
        prop_assert_eq!(graph, before);
    }

    #[test]
    fn prop_delete_compacts(ids in distinct_ids(12), pick in any::<prop::sample::Index>()) {
        prop_assume!(!ids.is_empty());
        let position = pick.index(ids.len());
        let mut graph = build(&ids);
        let removed = graph.delete_node(position).unwrap();
        prop_assert_eq!(&removed, &ids[position]);
        prop_assert_eq!(graph.len(), ids.len() - 1);
        for (later, id) in ids.iter().enumerate().skip(position + 1) {
            prop_assert_eq!(graph.position_of(id), Some(later - 1));
        }
    }

    #[test]
    fn prop_out_of_range_delete_is_rejected(ids in distinct_ids(8), extra in 0usize..4) {
        let mut graph = build(&ids);
        let before = graph.clone();
        let position = ids.len() + extra;
        let is_out_of_range = matches!(graph.delete_node(position), Err(ModelError::OutOfRange { .. }));
        prop_assert!(is_out_of_range);
        prop_assert_eq!(graph, before);
    }
}

#[test]
fn nodes_report_dense_positions() {
    let graph = build(&[
        ExplorationId::new("first"),
        ExplorationId::new("second"),
        ExplorationId::new("third"),
    ]);
    let positions: Vec<usize> = graph.nodes().iter().map(|n| n.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
}
