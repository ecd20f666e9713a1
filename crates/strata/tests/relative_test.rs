use strata::model::{ConnectorId, DetachReason, NodeId, PathKind, Size};
use strata::{Error, RelativeLayout};

fn layout_with(nodes: &[&str]) -> RelativeLayout {
    let mut r = RelativeLayout::new();
    for n in nodes {
        r.add_vertex(NodeId::from(*n), n.to_string(), Size::new(100.0, 50.0), 0)
            .unwrap();
    }
    r
}

fn connect(r: &mut RelativeLayout, id: &str, source: &str, target: &str) -> PathKind {
    r.add_path(ConnectorId::from(id), &NodeId::from(source), &NodeId::from(target))
        .unwrap()
}

fn layer_names(r: &RelativeLayout, layer: usize) -> Vec<String> {
    r.layered()
        .layer(layer)
        .iter()
        .filter_map(|v| r.original(*v).map(|o| o.node.to_string()))
        .collect()
}

fn layer_of(r: &RelativeLayout, node: &str) -> Option<usize> {
    r.layer_of_node(&NodeId::from(node))
}

fn path_kind(r: &RelativeLayout, id: &str) -> PathKind {
    r.path(&ConnectorId::from(id)).unwrap().kind
}

#[test]
fn new_vertices_go_to_the_first_layer_in_name_order() {
    let r = layout_with(&["c", "a", "b"]);
    assert_eq!(r.layered().layer_count(), 1);
    assert_eq!(layer_names(&r, 0), vec!["a", "b", "c"]);
}

#[test]
fn equal_names_order_by_descending_priority() {
    let mut r = RelativeLayout::new();
    r.add_vertex("low".into(), "same".into(), Size::new(10.0, 10.0), 1)
        .unwrap();
    r.add_vertex("high".into(), "same".into(), Size::new(10.0, 10.0), 5)
        .unwrap();
    assert_eq!(layer_names(&r, 0), vec!["high", "low"]);
}

#[test]
fn adding_a_path_moves_the_source_below_its_new_primary_parent() {
    let mut r = layout_with(&["A", "B"]);
    let kind = connect(&mut r, "e1", "B", "A");

    assert_eq!(kind, PathKind::Primary);
    assert_eq!(layer_of(&r, "A"), Some(0));
    assert_eq!(layer_of(&r, "B"), Some(1));
    assert_eq!(
        r.primary_parent_of(&"B".into()),
        r.vertex_key(&"A".into())
    );
    let path = r.path(&"e1".into()).unwrap();
    assert!(path.dummies.is_empty());
    assert_eq!(path.edges.len(), 1);
}

#[test]
fn siblings_are_ordered_by_name() {
    let mut r = layout_with(&["A", "C", "B"]);
    connect(&mut r, "e1", "C", "A");
    connect(&mut r, "e2", "B", "A");
    assert_eq!(layer_names(&r, 1), vec!["B", "C"]);
}

#[test]
fn a_lone_child_follows_the_order_of_its_parent() {
    let mut r = layout_with(&["A", "B", "X", "Y"]);
    connect(&mut r, "e1", "X", "B");
    connect(&mut r, "e2", "Y", "A");
    // Y hangs under A, which is left of B, so Y goes left of X despite its name.
    assert_eq!(layer_names(&r, 1), vec!["Y", "X"]);
}

#[test]
fn primary_subtree_moves_with_its_root() {
    let mut r = layout_with(&["A", "B", "C", "R"]);
    connect(&mut r, "cb", "C", "B");
    assert_eq!(layer_of(&r, "C"), Some(1));
    connect(&mut r, "br", "B", "R");
    connect(&mut r, "ra", "R", "A");

    assert_eq!(layer_of(&r, "R"), Some(1));
    assert_eq!(layer_of(&r, "B"), Some(2));
    assert_eq!(layer_of(&r, "C"), Some(3));
}

#[test]
fn secondary_path_spanning_layers_gets_one_dummy_per_layer() {
    let mut r = layout_with(&["A", "B", "C", "D", "P"]);
    connect(&mut r, "ba", "B", "A");
    connect(&mut r, "cb", "C", "B");
    connect(&mut r, "dc", "D", "C");
    let kind = connect(&mut r, "dp", "D", "P");

    assert_eq!(kind, PathKind::Secondary);
    assert_eq!(layer_of(&r, "D"), Some(3));
    assert_eq!(layer_of(&r, "P"), Some(0));
    let path = r.path(&"dp".into()).unwrap();
    assert_eq!(path.dummies.len(), 2);
    assert_eq!(path.edges.len(), 3);
    assert_eq!(r.layered().layer_of(path.dummies[0]), Some(2));
    assert_eq!(r.layered().layer_of(path.dummies[1]), Some(1));
    assert_eq!(r.layered().dummy_count(), 2);
}

#[test]
fn dummies_disappear_when_the_endpoints_become_adjacent() {
    let mut r = layout_with(&["A", "B", "C", "D", "P"]);
    connect(&mut r, "ba", "B", "A");
    connect(&mut r, "cb", "C", "B");
    connect(&mut r, "dc", "D", "C");
    connect(&mut r, "dp", "D", "P");
    assert_eq!(r.layered().dummy_count(), 2);

    // P drops under C; D follows below P and its route through C becomes redundant.
    connect(&mut r, "pc", "P", "C");

    assert_eq!(layer_of(&r, "P"), Some(3));
    assert_eq!(layer_of(&r, "D"), Some(4));
    assert_eq!(path_kind(&r, "dc"), PathKind::Detached(DetachReason::Redundant));
    assert_eq!(path_kind(&r, "dp"), PathKind::Primary);
    let dp = r.path(&"dp".into()).unwrap();
    assert!(dp.dummies.is_empty());
    assert_eq!(dp.edges.len(), 1);
    assert_eq!(r.layered().dummy_count(), 0);
}

#[test]
fn redundant_path_is_detached_and_restored_when_the_alternative_goes_away() {
    let mut r = layout_with(&["A", "B", "C"]);
    connect(&mut r, "ba", "B", "A");
    connect(&mut r, "cb", "C", "B");
    let kind = connect(&mut r, "ca", "C", "A");
    assert_eq!(kind, PathKind::Detached(DetachReason::Redundant));
    assert!(r.path(&"ca".into()).unwrap().edges.is_empty());

    r.remove_path(&"cb".into()).unwrap();

    assert_eq!(path_kind(&r, "ca"), PathKind::Primary);
    assert_eq!(layer_of(&r, "C"), Some(1));
    assert_eq!(layer_names(&r, 1), vec!["B", "C"]);
}

#[test]
fn cycle_closing_path_is_detached() {
    let mut r = layout_with(&["A", "B"]);
    connect(&mut r, "ba", "B", "A");
    let kind = connect(&mut r, "ab", "A", "B");
    assert_eq!(kind, PathKind::Detached(DetachReason::Cycle));

    r.remove_path(&"ba".into()).unwrap();

    // B keeps its layer; A now hangs below it.
    assert_eq!(path_kind(&r, "ab"), PathKind::Primary);
    assert_eq!(layer_of(&r, "B"), Some(1));
    assert_eq!(layer_of(&r, "A"), Some(2));
}

#[test]
fn self_loop_is_detached() {
    let mut r = layout_with(&["A"]);
    let kind = connect(&mut r, "aa", "A", "A");
    assert_eq!(kind, PathKind::Detached(DetachReason::SelfLoop));
    assert_eq!(r.layered().graph().edge_count(), 0);
    assert_eq!(layer_of(&r, "A"), Some(0));
}

#[test]
fn removals_never_move_surviving_vertices() {
    let mut r = layout_with(&["A", "B", "C"]);
    connect(&mut r, "ba", "B", "A");
    connect(&mut r, "cb", "C", "B");

    r.remove_path(&"ba".into()).unwrap();
    assert_eq!(layer_of(&r, "B"), Some(1));
    assert_eq!(r.primary_parent_of(&"B".into()), None);

    let removed = r.remove_vertex(&"B".into()).unwrap();
    assert_eq!(removed, vec![ConnectorId::from("cb")]);
    assert_eq!(layer_of(&r, "C"), Some(2));
    assert!(r.layered().layer(1).is_empty());

    r.remove_vertex(&"C".into()).unwrap();
    assert_eq!(r.layered().layer_count(), 1);
}

#[test]
fn resize_keeps_the_structure() {
    let mut r = layout_with(&["A", "B"]);
    connect(&mut r, "ba", "B", "A");
    r.resize_vertex(&"A".into(), Size::new(300.0, 80.0)).unwrap();

    let a = r.vertex_key(&"A".into()).unwrap();
    assert_eq!(r.layered().size(a), Size::new(300.0, 80.0));
    assert_eq!(layer_of(&r, "B"), Some(1));
}

#[test]
fn contract_violations_are_reported() {
    let mut r = layout_with(&["A", "B"]);
    connect(&mut r, "ba", "B", "A");

    assert!(matches!(
        r.add_vertex("A".into(), "A".into(), Size::ZERO, 0),
        Err(Error::DuplicateVertex { .. })
    ));
    assert!(matches!(
        r.add_path("ba".into(), &"B".into(), &"A".into()),
        Err(Error::DuplicatePath { .. })
    ));
    assert!(matches!(
        r.add_path("zx".into(), &"Z".into(), &"A".into()),
        Err(Error::UnknownVertex { .. })
    ));
    assert!(matches!(
        r.remove_path(&"nope".into()),
        Err(Error::UnknownPath { .. })
    ));
    assert!(matches!(
        r.remove_vertex(&"Z".into()),
        Err(Error::UnknownVertex { .. })
    ));
}
