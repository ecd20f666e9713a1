use crate::model::{ConnectorId, NodeId};
use std::fmt;

/// Identity of a layered vertex in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VertexRef {
    Node(NodeId),
    /// The `index`-th dummy (counted from the source side) of a connector's path.
    Dummy {
        connector: ConnectorId,
        index: usize,
    },
}

impl fmt::Display for VertexRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VertexRef::Node(node) => write!(f, "node `{node}`"),
            VertexRef::Dummy { connector, index } => {
                write!(f, "dummy #{index} of connector `{connector}`")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("node `{node}` already exists")]
    DuplicateNode { node: NodeId },

    #[error("unknown node `{node}`")]
    UnknownNode { node: NodeId },

    #[error("node `{node}` names unknown container `{container}`")]
    UnknownContainer { node: NodeId, container: NodeId },

    #[error("connector `{connector}` already exists")]
    DuplicateConnector { connector: ConnectorId },

    #[error("unknown connector `{connector}`")]
    UnknownConnector { connector: ConnectorId },

    #[error("layout vertex for node `{node}` already exists")]
    DuplicateVertex { node: NodeId },

    #[error("no layout vertex for node `{node}`")]
    UnknownVertex { node: NodeId },

    #[error("layout path for connector `{connector}` already exists")]
    DuplicatePath { connector: ConnectorId },

    #[error("no layout path for connector `{connector}`")]
    UnknownPath { connector: ConnectorId },

    #[error("path of connector `{connector}` does not run downwards (source layer {source_layer}, target layer {target_layer})")]
    InvertedPath {
        connector: ConnectorId,
        source_layer: usize,
        target_layer: usize,
    },

    #[error("{vertex} is not centered over its primary children (x = {actual}, expected {expected})")]
    ParentNotCentered {
        vertex: VertexRef,
        actual: f64,
        expected: f64,
    },

    #[error("{left} and {right} overlap in layer {layer}")]
    Overlap {
        layer: usize,
        left: VertexRef,
        right: VertexRef,
    },

    #[error("{stage} did not settle within {budget} steps")]
    PropagationBudgetExceeded { stage: &'static str, budget: usize },

    #[error("layout service is closed")]
    ServiceClosed,

    #[error("failed to start layout service: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
