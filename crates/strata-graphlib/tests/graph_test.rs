use strata_graphlib::Graph;

#[test]
fn add_and_remove_nodes_keeps_handles_stable() {
    let mut g: Graph<&str, ()> = Graph::new();
    let a = g.add_node("a");
    let b = g.add_node("b");
    let c = g.add_node("c");

    assert_eq!(g.remove_node(b), Some("b"));
    assert_eq!(g.node_count(), 2);
    assert_eq!(g.node(a), Some(&"a"));
    assert_eq!(g.node(c), Some(&"c"));
    assert_eq!(g.node(b), None);

    let d = g.add_node("d");
    assert_ne!(d, b);
    assert_eq!(g.node_indices().collect::<Vec<_>>(), vec![a, c, d]);
}

#[test]
fn remove_node_drops_incident_edges() {
    let mut g: Graph<(), i32> = Graph::new();
    let a = g.add_node(());
    let b = g.add_node(());
    let c = g.add_node(());
    let ab = g.add_edge(a, b, 1).unwrap();
    let bc = g.add_edge(b, c, 2).unwrap();
    let ac = g.add_edge(a, c, 3).unwrap();

    g.remove_node(b);

    assert_eq!(g.edge_count(), 1);
    assert!(!g.contains_edge(ab));
    assert!(!g.contains_edge(bc));
    assert_eq!(g.edge(ac), Some(&3));
    assert_eq!(g.out_edges(a), &[ac]);
    assert_eq!(g.in_edges(c), &[ac]);
}

#[test]
fn add_edge_requires_both_endpoints() {
    let mut g: Graph<(), ()> = Graph::new();
    let a = g.add_node(());
    let b = g.add_node(());
    g.remove_node(b);

    assert_eq!(g.add_edge(a, b, ()), None);
    assert_eq!(g.edge_count(), 0);
}

#[test]
fn successors_predecessors_and_find_edge() {
    let mut g: Graph<(), &str> = Graph::new();
    let a = g.add_node(());
    let b = g.add_node(());
    let c = g.add_node(());
    g.add_edge(a, b, "ab");
    g.add_edge(a, c, "ac");
    let cb = g.add_edge(c, b, "cb").unwrap();

    assert_eq!(g.successors(a).collect::<Vec<_>>(), vec![b, c]);
    assert_eq!(g.predecessors(b).collect::<Vec<_>>(), vec![a, c]);
    assert_eq!(g.find_edge(c, b), Some(cb));
    assert_eq!(g.find_edge(b, c), None);
    assert_eq!(g.endpoints(cb), Some((c, b)));
}

#[test]
fn remove_edge_updates_adjacency() {
    let mut g: Graph<(), ()> = Graph::new();
    let a = g.add_node(());
    let b = g.add_node(());
    let e = g.add_edge(a, b, ()).unwrap();

    assert_eq!(g.remove_edge(e), Some(()));
    assert_eq!(g.remove_edge(e), None);
    assert!(g.out_edges(a).is_empty());
    assert!(g.in_edges(b).is_empty());
}

#[test]
fn clear_empties_the_graph_without_reusing_handles() {
    let mut g: Graph<u8, ()> = Graph::new();
    let a = g.add_node(1);
    let b = g.add_node(2);
    g.add_edge(a, b, ());

    g.clear();
    assert!(g.is_empty());
    assert_eq!(g.edge_count(), 0);

    let c = g.add_node(3);
    assert_ne!(c, a);
    assert_ne!(c, b);
    assert_eq!(g.node(a), None);
}
