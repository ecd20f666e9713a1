#![forbid(unsafe_code)]

//! Incremental hierarchical layout for live diagrams.
//!
//! Diagram changes arrive as [`DiagramEvent`]s. Per layout group the [`RelativeLayout`] keeps a
//! layered graph up to date incrementally; every pass then recomputes absolute coordinates from
//! scratch ([`position::compute`]) and the [`LayoutDiffer`] turns them into the minimal set of
//! [`LayoutAction`]s for the renderer. [`LayoutEngine`] runs that pipeline atomically per batch,
//! and [`LayoutService`] drives an engine from a debounced background queue.

pub use strata_graphlib as graphlib;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod actions;
pub mod config;
pub mod diagram;
pub mod engine;
pub mod error;
pub mod layered;
pub mod model;
pub mod partition;
pub mod position;
pub mod relative;
pub mod service;

pub use actions::{ActionBatch, LayoutAction, LayoutDiffer, LayoutGeometry, Shape};
pub use config::{LayoutConfig, ServiceConfig};
pub use diagram::{Diagram, DiagramConnector, DiagramEvent, DiagramNode};
pub use engine::LayoutEngine;
pub use error::{Error, Result, VertexRef};
pub use layered::LayeredGraph;
pub use model::{
    ConnectorId, DetachReason, LayoutPath, LayoutVertex, NodeId, PathKind, Point, Rect, Size,
    VertexKey,
};
pub use partition::{LayoutGroup, Partition, partition};
pub use position::AbsoluteLayout;
pub use relative::RelativeLayout;
pub use service::{LayoutBatch, LayoutHandle, LayoutService};
