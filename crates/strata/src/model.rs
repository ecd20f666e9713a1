//! Layout vertex/edge model and geometry primitives.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Reverse;
use std::fmt;

pub use strata_graphlib::{EdgeIx as LayeredEdgeKey, NodeIx as VertexKey};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identity of an external diagram node.
    NodeId
);
string_id!(
    /// Identity of an external diagram connector.
    ConnectorId
);

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub fn centered(center: Point, size: Size) -> Self {
        Self {
            min_x: center.x - size.width / 2.0,
            min_y: center.y - size.height / 2.0,
            max_x: center.x + size.width / 2.0,
            max_y: center.y + size.height / 2.0,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn union(self, other: Rect) -> Rect {
        Rect {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// A vertex backed by an external diagram node.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginalVertex {
    pub node: NodeId,
    pub name: String,
    pub size: Size,
    pub priority: i32,
}

impl OriginalVertex {
    /// Sibling ordering: ascending name, then higher priority first, then node id.
    pub fn order_key(&self) -> OrderKey<'_> {
        OrderKey {
            name: &self.name,
            priority: Reverse(self.priority),
            node: self.node.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OrderKey<'a> {
    name: &'a str,
    priority: Reverse<i32>,
    node: &'a str,
}

/// A zero-size routing waypoint owned by exactly one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyVertex {
    pub path: ConnectorId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutVertex {
    Original(OriginalVertex),
    Dummy(DummyVertex),
}

impl LayoutVertex {
    pub fn size(&self) -> Size {
        match self {
            LayoutVertex::Original(v) => v.size,
            LayoutVertex::Dummy(_) => Size::ZERO,
        }
    }

    pub fn is_dummy(&self) -> bool {
        matches!(self, LayoutVertex::Dummy(_))
    }

    pub fn as_original(&self) -> Option<&OriginalVertex> {
        match self {
            LayoutVertex::Original(v) => Some(v),
            LayoutVertex::Dummy(_) => None,
        }
    }

    pub fn as_dummy(&self) -> Option<&DummyVertex> {
        match self {
            LayoutVertex::Original(_) => None,
            LayoutVertex::Dummy(d) => Some(d),
        }
    }
}

/// One rank-adjacent segment of a [`LayoutPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayeredEdge {
    pub path: ConnectorId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetachReason {
    SelfLoop,
    Redundant,
    Cycle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// The source hangs under the target: the centering rule applies along this path.
    Primary,
    Secondary,
    /// Not part of the layered structure; routed as a straight segment.
    Detached(DetachReason),
}

impl PathKind {
    pub fn is_structural(self) -> bool {
        !matches!(self, PathKind::Detached(_))
    }
}

/// Chain of layered edges from `source` up to `target` through zero or more dummies.
///
/// `dummies` and `edges` are ordered from the source side: `edges[0]` leaves `source`,
/// `edges[i + 1]` leaves `dummies[i]`. Detached paths own no dummies and no edges.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPath {
    pub connector: ConnectorId,
    pub source: VertexKey,
    pub target: VertexKey,
    pub kind: PathKind,
    pub dummies: Vec<VertexKey>,
    pub edges: Vec<LayeredEdgeKey>,
}

impl LayoutPath {
    pub fn is_structural(&self) -> bool {
        self.kind.is_structural()
    }

    pub fn is_primary(&self) -> bool {
        self.kind == PathKind::Primary
    }

    /// The chain vertex directly above `v` (`v` being the source or one of the dummies).
    pub fn above(&self, v: VertexKey) -> Option<VertexKey> {
        if v == self.source {
            return Some(self.dummies.first().copied().unwrap_or(self.target));
        }
        let i = self.dummies.iter().position(|d| *d == v)?;
        Some(self.dummies.get(i + 1).copied().unwrap_or(self.target))
    }
}
