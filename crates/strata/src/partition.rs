//! Splits a diagram into nested layout groups, one per container plus the root.

use crate::diagram::Diagram;
use crate::model::{ConnectorId, NodeId};
use rustc_hash::FxHashMap;

/// Nodes directly owned by one container (or the root) and the connectors between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutGroup {
    /// `None` for the root group.
    pub container: Option<NodeId>,
    pub depth: usize,
    pub nodes: Vec<NodeId>,
    pub connectors: Vec<ConnectorId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Bottom-up: a container's group precedes the group that holds the container.
    pub groups: Vec<LayoutGroup>,
    /// Connectors whose laid-out endpoints live in different groups.
    pub cross_group: Vec<ConnectorId>,
    /// Connectors with at least one deferred endpoint.
    pub pending: Vec<ConnectorId>,
    /// Nodes that are not measured yet, or sit inside a container that is not laid out.
    pub deferred: Vec<NodeId>,
}

impl Partition {
    pub fn group(&self, container: Option<&NodeId>) -> Option<&LayoutGroup> {
        self.groups
            .iter()
            .find(|g| g.container.as_ref() == container)
    }

    pub fn is_laid_out(&self, node: &NodeId) -> bool {
        !self.deferred.contains(node)
    }
}

pub fn partition(diagram: &Diagram) -> Partition {
    let mut laid_out: FxHashMap<&NodeId, bool> = FxHashMap::default();
    // Containers are registered before their children, so one pass in registration order sees
    // every container's verdict first.
    for node in diagram.nodes() {
        let container_ok = node
            .container
            .as_ref()
            .is_none_or(|c| laid_out.get(c).copied().unwrap_or(false));
        laid_out.insert(&node.id, container_ok && node.size.is_some());
    }
    let is_laid_out = |id: &NodeId| laid_out.get(id).copied().unwrap_or(false);

    let mut out = Partition::default();
    let mut groups: Vec<LayoutGroup> = vec![LayoutGroup {
        container: None,
        depth: 0,
        nodes: Vec::new(),
        connectors: Vec::new(),
    }];
    let mut group_index: FxHashMap<Option<&NodeId>, usize> = FxHashMap::default();
    group_index.insert(None, 0);

    for node in diagram.nodes() {
        if !is_laid_out(&node.id) {
            out.deferred.push(node.id.clone());
            continue;
        }
        let key = node.container.as_ref();
        let index = *group_index.entry(key).or_insert_with(|| {
            groups.push(LayoutGroup {
                container: key.cloned(),
                depth: key.map_or(0, |c| diagram.depth(c) + 1),
                nodes: Vec::new(),
                connectors: Vec::new(),
            });
            groups.len() - 1
        });
        groups[index].nodes.push(node.id.clone());
    }

    for connector in diagram.connectors() {
        if !is_laid_out(&connector.source) || !is_laid_out(&connector.target) {
            out.pending.push(connector.id.clone());
            continue;
        }
        let container_of = |id: &NodeId| diagram.node(id).and_then(|n| n.container.as_ref());
        let (sc, tc) = (container_of(&connector.source), container_of(&connector.target));
        if sc != tc {
            out.cross_group.push(connector.id.clone());
            continue;
        }
        if let Some(&index) = group_index.get(&sc) {
            groups[index].connectors.push(connector.id.clone());
        }
    }

    // Stable: groups of equal depth keep registration order.
    groups.sort_by(|a, b| b.depth.cmp(&a.depth));
    out.groups = groups;
    out
}
