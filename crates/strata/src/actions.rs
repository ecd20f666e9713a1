//! Layout actions and the differ that derives them from consecutive passes.

use crate::model::{ConnectorId, NodeId, Point};
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};

type IndexMap<K, V> = indexmap::IndexMap<K, V, FxBuildHasher>;

/// A geometry change for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum LayoutAction {
    /// `from` is `None` when the node had no position before.
    MoveNode {
        node: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<Point>,
        to: Point,
    },
    RerouteConnector {
        connector: ConnectorId,
        route: Vec<Point>,
    },
}

/// The external shape an action applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    Node(NodeId),
    Connector(ConnectorId),
}

impl LayoutAction {
    pub fn shape(&self) -> Shape {
        match self {
            LayoutAction::MoveNode { node, .. } => Shape::Node(node.clone()),
            LayoutAction::RerouteConnector { connector, .. } => Shape::Connector(connector.clone()),
        }
    }
}

/// Actions of one batch, at most one per shape.
#[derive(Debug, Clone, Default)]
pub struct ActionBatch {
    actions: IndexMap<Shape, LayoutAction>,
}

impl ActionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `action`, replacing an earlier action for the same shape. The replacement moves to
    /// the end of the batch.
    pub fn push(&mut self, action: LayoutAction) {
        let shape = action.shape();
        self.actions.shift_remove(&shape);
        self.actions.insert(shape, action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayoutAction> + '_ {
        self.actions.values()
    }

    pub fn into_vec(self) -> Vec<LayoutAction> {
        self.actions.into_values().collect()
    }
}

impl Extend<LayoutAction> for ActionBatch {
    fn extend<T: IntoIterator<Item = LayoutAction>>(&mut self, iter: T) {
        for action in iter {
            self.push(action);
        }
    }
}

/// Absolute geometry of one pass, in diagram registration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutGeometry {
    pub centers: IndexMap<NodeId, Point>,
    pub routes: IndexMap<ConnectorId, Vec<Point>>,
}

/// Remembers the last committed geometry and reports what changed.
#[derive(Debug, Clone, Default)]
pub struct LayoutDiffer {
    previous: LayoutGeometry,
}

impl LayoutDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn center(&self, node: &NodeId) -> Option<Point> {
        self.previous.centers.get(node).copied()
    }

    pub fn route(&self, connector: &ConnectorId) -> Option<&[Point]> {
        self.previous.routes.get(connector).map(Vec::as_slice)
    }

    pub fn geometry(&self) -> &LayoutGeometry {
        &self.previous
    }

    /// Diffs `next` against the previous geometry and makes it the new baseline. Shapes missing
    /// from `next` are forgotten without an action.
    pub fn diff(&mut self, next: LayoutGeometry) -> Vec<LayoutAction> {
        let mut batch = ActionBatch::new();
        for (node, &to) in &next.centers {
            let from = self.center(node);
            if from != Some(to) {
                batch.push(LayoutAction::MoveNode {
                    node: node.clone(),
                    from,
                    to,
                });
            }
        }
        for (connector, route) in &next.routes {
            if self.previous.routes.get(connector) != Some(route) {
                batch.push(LayoutAction::RerouteConnector {
                    connector: connector.clone(),
                    route: route.clone(),
                });
            }
        }
        self.previous = next;
        batch.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_keeps_last_action_per_shape() {
        let mut batch = ActionBatch::new();
        batch.push(LayoutAction::MoveNode {
            node: "a".into(),
            from: None,
            to: Point::new(1.0, 1.0),
        });
        batch.push(LayoutAction::RerouteConnector {
            connector: "e".into(),
            route: vec![],
        });
        batch.push(LayoutAction::MoveNode {
            node: "a".into(),
            from: Some(Point::new(1.0, 1.0)),
            to: Point::new(2.0, 2.0),
        });

        let actions = batch.into_vec();
        assert_eq!(actions.len(), 2);
        assert_eq!(
            actions[1],
            LayoutAction::MoveNode {
                node: "a".into(),
                from: Some(Point::new(1.0, 1.0)),
                to: Point::new(2.0, 2.0),
            }
        );
    }
}
