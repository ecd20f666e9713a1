//! The external diagram as the engine sees it: a registry of nodes and connectors driven by
//! [`DiagramEvent`]s.

use crate::error::{Error, Result};
use crate::model::{ConnectorId, NodeId, Size};
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};

type IndexMap<K, V> = indexmap::IndexMap<K, V, FxBuildHasher>;

/// A change notification from the diagram owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum DiagramEvent {
    /// `size` is `None` until the node has been measured; such nodes are deferred.
    NodeAdded {
        node: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<Size>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        container: Option<NodeId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<i32>,
    },
    NodeRemoved {
        node: NodeId,
    },
    NodeResized {
        node: NodeId,
        size: Size,
    },
    ConnectorAdded {
        connector: ConnectorId,
        source: NodeId,
        target: NodeId,
    },
    ConnectorRemoved {
        connector: ConnectorId,
    },
    DiagramCleared,
}

impl DiagramEvent {
    /// A measured top-level node named after its id.
    pub fn node(node: impl Into<NodeId>, width: f64, height: f64) -> Self {
        DiagramEvent::NodeAdded {
            node: node.into(),
            name: None,
            size: Some(Size::new(width, height)),
            container: None,
            priority: None,
        }
    }

    pub fn connector(
        connector: impl Into<ConnectorId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        DiagramEvent::ConnectorAdded {
            connector: connector.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagramNode {
    pub id: NodeId,
    pub name: String,
    pub size: Option<Size>,
    pub container: Option<NodeId>,
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagramConnector {
    pub id: ConnectorId,
    pub source: NodeId,
    pub target: NodeId,
}

#[derive(Debug, Clone, Default)]
pub struct Diagram {
    nodes: IndexMap<NodeId, DiagramNode>,
    connectors: IndexMap<ConnectorId, DiagramConnector>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &NodeId) -> Option<&DiagramNode> {
        self.nodes.get(id)
    }

    pub fn connector(&self, id: &ConnectorId) -> Option<&DiagramConnector> {
        self.connectors.get(id)
    }

    /// Nodes in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = &DiagramNode> + '_ {
        self.nodes.values()
    }

    /// Connectors in registration order.
    pub fn connectors(&self) -> impl Iterator<Item = &DiagramConnector> + '_ {
        self.connectors.values()
    }

    /// Nodes directly owned by `container` (`None` for the root).
    pub fn children<'a>(
        &'a self,
        container: Option<&'a NodeId>,
    ) -> impl Iterator<Item = &'a DiagramNode> + 'a {
        self.nodes
            .values()
            .filter(move |n| n.container.as_ref() == container)
    }

    /// Number of containers above `id`.
    pub fn depth(&self, id: &NodeId) -> usize {
        let mut depth = 0;
        let mut cur = self.nodes.get(id).and_then(|n| n.container.as_ref());
        while let Some(c) = cur {
            depth += 1;
            cur = self.nodes.get(c).and_then(|n| n.container.as_ref());
        }
        depth
    }

    pub fn apply(&mut self, event: &DiagramEvent) -> Result<()> {
        match event {
            DiagramEvent::NodeAdded {
                node,
                name,
                size,
                container,
                priority,
            } => self.add_node(DiagramNode {
                id: node.clone(),
                name: name.clone().unwrap_or_else(|| node.to_string()),
                size: *size,
                container: container.clone(),
                priority: priority.unwrap_or(0),
            }),
            DiagramEvent::NodeRemoved { node } => self.remove_node(node).map(|_| ()),
            DiagramEvent::NodeResized { node, size } => self.resize_node(node, *size),
            DiagramEvent::ConnectorAdded {
                connector,
                source,
                target,
            } => self.add_connector(DiagramConnector {
                id: connector.clone(),
                source: source.clone(),
                target: target.clone(),
            }),
            DiagramEvent::ConnectorRemoved { connector } => self.remove_connector(connector),
            DiagramEvent::DiagramCleared => {
                self.clear();
                Ok(())
            }
        }
    }

    pub fn add_node(&mut self, node: DiagramNode) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(Error::DuplicateNode { node: node.id });
        }
        if let Some(container) = &node.container {
            if !self.nodes.contains_key(container) {
                return Err(Error::UnknownContainer {
                    node: node.id,
                    container: container.clone(),
                });
            }
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Removes a node together with every node it contains (recursively) and every connector
    /// touching one of them. Returns the removed node ids, outermost first.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<Vec<NodeId>> {
        if !self.nodes.contains_key(id) {
            return Err(Error::UnknownNode { node: id.clone() });
        }
        let mut removed = vec![id.clone()];
        let mut i = 0;
        while i < removed.len() {
            let parent = removed[i].clone();
            removed.extend(
                self.nodes
                    .values()
                    .filter(|n| n.container.as_ref() == Some(&parent))
                    .map(|n| n.id.clone()),
            );
            i += 1;
        }

        self.connectors
            .retain(|_, c| !removed.contains(&c.source) && !removed.contains(&c.target));
        for node in &removed {
            self.nodes.shift_remove(node);
        }
        Ok(removed)
    }

    pub fn resize_node(&mut self, id: &NodeId, size: Size) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| Error::UnknownNode { node: id.clone() })?;
        node.size = Some(size);
        Ok(())
    }

    pub fn add_connector(&mut self, connector: DiagramConnector) -> Result<()> {
        if self.connectors.contains_key(&connector.id) {
            return Err(Error::DuplicateConnector {
                connector: connector.id,
            });
        }
        for end in [&connector.source, &connector.target] {
            if !self.nodes.contains_key(end) {
                return Err(Error::UnknownNode { node: end.clone() });
            }
        }
        self.connectors.insert(connector.id.clone(), connector);
        Ok(())
    }

    pub fn remove_connector(&mut self, id: &ConnectorId) -> Result<()> {
        self.connectors
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::UnknownConnector {
                connector: id.clone(),
            })
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connectors.clear();
    }
}
