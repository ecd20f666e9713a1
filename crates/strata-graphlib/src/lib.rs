#![forbid(unsafe_code)]

//! Graph container APIs used by `strata`.
//!
//! Nodes and edges live in an arena and are addressed by opaque [`NodeIx`] / [`EdgeIx`] handles.
//! A handle stays valid until its entry is removed and is never handed out again by the same
//! graph, so callers can key their own maps by it across mutations.

mod graph;

pub use graph::alg;
pub use graph::{EdgeIx, Graph, NodeIx};
