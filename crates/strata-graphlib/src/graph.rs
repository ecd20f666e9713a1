//! The arena-backed directed graph container.
//!
//! This module contains the core `Graph` container plus a small set of helper algorithms
//! re-exported as `strata_graphlib::alg`.

use std::fmt;

pub mod alg;
mod entries;

use entries::{EdgeEntry, NodeEntry};

/// Handle of a node slot. Never reused after the node is removed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIx(u32);

/// Handle of an edge slot. Never reused after the edge is removed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIx(u32);

impl NodeIx {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeIx {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeIx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Debug for EdgeIx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

fn slot_handle(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("graph arena exceeded {} slots", u32::MAX))
}

#[derive(Debug, Clone)]
pub struct Graph<N, E> {
    nodes: Vec<Option<NodeEntry<N>>>,
    edges: Vec<Option<EdgeEntry<E>>>,
    node_count: usize,
    edge_count: usize,
}

impl<N, E> Default for Graph<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> Graph<N, E> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            node_count: 0,
            edge_count: 0,
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }

    pub fn add_node(&mut self, label: N) -> NodeIx {
        let ix = NodeIx(slot_handle(self.nodes.len()));
        self.nodes.push(Some(NodeEntry {
            label,
            out_edges: Vec::new(),
            in_edges: Vec::new(),
        }));
        self.node_count += 1;
        ix
    }

    pub fn contains_node(&self, v: NodeIx) -> bool {
        self.entry(v).is_some()
    }

    pub fn node(&self, v: NodeIx) -> Option<&N> {
        self.entry(v).map(|n| &n.label)
    }

    pub fn node_mut(&mut self, v: NodeIx) -> Option<&mut N> {
        self.nodes
            .get_mut(v.index())
            .and_then(|slot| slot.as_mut())
            .map(|n| &mut n.label)
    }

    /// Removes `v` together with every incident edge and returns its label.
    pub fn remove_node(&mut self, v: NodeIx) -> Option<N> {
        let entry = self.nodes.get_mut(v.index())?.take()?;
        self.node_count -= 1;
        for e in entry.out_edges.iter().chain(entry.in_edges.iter()) {
            let _ = self.remove_edge(*e);
        }
        Some(entry.label)
    }

    /// Iterates live node handles in insertion order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIx> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| NodeIx(i as u32))
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIx, &N)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|n| (NodeIx(i as u32), &n.label)))
    }

    /// Adds a directed edge `v -> w`. Returns `None` when either endpoint is missing.
    pub fn add_edge(&mut self, v: NodeIx, w: NodeIx, label: E) -> Option<EdgeIx> {
        if !self.contains_node(v) || !self.contains_node(w) {
            return None;
        }
        let ix = EdgeIx(slot_handle(self.edges.len()));
        self.edges.push(Some(EdgeEntry {
            source: v,
            target: w,
            label,
        }));
        self.edge_count += 1;
        if let Some(n) = self.entry_mut(v) {
            n.out_edges.push(ix);
        }
        if let Some(n) = self.entry_mut(w) {
            n.in_edges.push(ix);
        }
        Some(ix)
    }

    pub fn contains_edge(&self, e: EdgeIx) -> bool {
        self.edge_entry(e).is_some()
    }

    pub fn edge(&self, e: EdgeIx) -> Option<&E> {
        self.edge_entry(e).map(|entry| &entry.label)
    }

    pub fn edge_mut(&mut self, e: EdgeIx) -> Option<&mut E> {
        self.edges
            .get_mut(e.index())
            .and_then(|slot| slot.as_mut())
            .map(|entry| &mut entry.label)
    }

    pub fn endpoints(&self, e: EdgeIx) -> Option<(NodeIx, NodeIx)> {
        self.edge_entry(e).map(|entry| (entry.source, entry.target))
    }

    pub fn remove_edge(&mut self, e: EdgeIx) -> Option<E> {
        let entry = self.edges.get_mut(e.index())?.take()?;
        self.edge_count -= 1;
        if let Some(n) = self.entry_mut(entry.source) {
            n.out_edges.retain(|x| *x != e);
        }
        if let Some(n) = self.entry_mut(entry.target) {
            n.in_edges.retain(|x| *x != e);
        }
        Some(entry.label)
    }

    /// Iterates live edges in insertion order as `(handle, source, target, label)`.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeIx, NodeIx, NodeIx, &E)> + '_ {
        self.edges.iter().enumerate().filter_map(|(i, slot)| {
            slot.as_ref()
                .map(|e| (EdgeIx(i as u32), e.source, e.target, &e.label))
        })
    }

    pub fn out_edges(&self, v: NodeIx) -> &[EdgeIx] {
        self.entry(v).map(|n| n.out_edges.as_slice()).unwrap_or(&[])
    }

    pub fn in_edges(&self, v: NodeIx) -> &[EdgeIx] {
        self.entry(v).map(|n| n.in_edges.as_slice()).unwrap_or(&[])
    }

    pub fn successors(&self, v: NodeIx) -> impl Iterator<Item = NodeIx> + '_ {
        self.out_edges(v)
            .iter()
            .filter_map(|e| self.edge_entry(*e).map(|entry| entry.target))
    }

    pub fn predecessors(&self, v: NodeIx) -> impl Iterator<Item = NodeIx> + '_ {
        self.in_edges(v)
            .iter()
            .filter_map(|e| self.edge_entry(*e).map(|entry| entry.source))
    }

    /// First edge `v -> w` in insertion order, if any.
    pub fn find_edge(&self, v: NodeIx, w: NodeIx) -> Option<EdgeIx> {
        self.out_edges(v)
            .iter()
            .copied()
            .find(|e| self.edge_entry(*e).is_some_and(|entry| entry.target == w))
    }

    /// Drops every node and edge. Handles issued before the call are not reissued.
    pub fn clear(&mut self) {
        for slot in &mut self.nodes {
            *slot = None;
        }
        for slot in &mut self.edges {
            *slot = None;
        }
        self.node_count = 0;
        self.edge_count = 0;
    }

    fn entry(&self, v: NodeIx) -> Option<&NodeEntry<N>> {
        self.nodes.get(v.index()).and_then(|slot| slot.as_ref())
    }

    fn entry_mut(&mut self, v: NodeIx) -> Option<&mut NodeEntry<N>> {
        self.nodes.get_mut(v.index()).and_then(|slot| slot.as_mut())
    }

    fn edge_entry(&self, e: EdgeIx) -> Option<&EdgeEntry<E>> {
        self.edges.get(e.index()).and_then(|slot| slot.as_ref())
    }
}
