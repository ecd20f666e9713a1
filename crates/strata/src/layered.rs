//! The layered graph: vertices partitioned into ordered layers plus the proper primary-parent
//! relation the centering rule works on.

use crate::model::{LayeredEdge, LayeredEdgeKey, LayoutVertex, Size, VertexKey};
use rustc_hash::FxHashMap;
use strata_graphlib::Graph;

#[derive(Debug, Clone, Default)]
pub struct LayeredGraph {
    graph: Graph<LayoutVertex, LayeredEdge>,
    layers: Vec<Vec<VertexKey>>,
    layer_of: FxHashMap<VertexKey, usize>,
    primary_parent: FxHashMap<VertexKey, VertexKey>,
}

impl LayeredGraph {
    pub fn graph(&self) -> &Graph<LayoutVertex, LayeredEdge> {
        &self.graph
    }

    pub fn vertex(&self, v: VertexKey) -> Option<&LayoutVertex> {
        self.graph.node(v)
    }

    pub fn size(&self, v: VertexKey) -> Size {
        self.graph.node(v).map(LayoutVertex::size).unwrap_or(Size::ZERO)
    }

    pub fn layers(&self) -> &[Vec<VertexKey>] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> &[VertexKey] {
        self.layers.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer_of(&self, v: VertexKey) -> Option<usize> {
        self.layer_of.get(&v).copied()
    }

    /// Index of `v` inside its layer.
    pub fn position(&self, v: VertexKey) -> Option<usize> {
        let layer = self.layer_of(v)?;
        self.layers[layer].iter().position(|x| *x == v)
    }

    /// The proper primary parent: always a vertex of the layer directly above.
    pub fn primary_parent(&self, v: VertexKey) -> Option<VertexKey> {
        self.primary_parent.get(&v).copied()
    }

    /// Primary children of every parent, each list in layer order.
    pub fn primary_children_map(&self) -> FxHashMap<VertexKey, Vec<VertexKey>> {
        let mut out: FxHashMap<VertexKey, Vec<VertexKey>> = FxHashMap::default();
        for layer in &self.layers {
            for &v in layer {
                if let Some(p) = self.primary_parent(v) {
                    out.entry(p).or_default().push(v);
                }
            }
        }
        out
    }

    pub fn dummy_count(&self) -> usize {
        self.graph.nodes().filter(|(_, v)| v.is_dummy()).count()
    }

    pub(crate) fn vertex_mut(&mut self, v: VertexKey) -> Option<&mut LayoutVertex> {
        self.graph.node_mut(v)
    }

    pub(crate) fn add_vertex(&mut self, vertex: LayoutVertex) -> VertexKey {
        self.graph.add_node(vertex)
    }

    /// Removes `v` from its layer and from the graph. Vertices that hung under `v` lose their
    /// primary parent.
    pub(crate) fn remove_vertex(&mut self, v: VertexKey) -> Option<LayoutVertex> {
        self.unplace(v);
        self.primary_parent.remove(&v);
        self.primary_parent.retain(|_, p| *p != v);
        self.graph.remove_node(v)
    }

    pub(crate) fn add_edge(
        &mut self,
        v: VertexKey,
        w: VertexKey,
        edge: LayeredEdge,
    ) -> Option<LayeredEdgeKey> {
        self.graph.add_edge(v, w, edge)
    }

    pub(crate) fn remove_edge(&mut self, e: LayeredEdgeKey) {
        let _ = self.graph.remove_edge(e);
    }

    pub(crate) fn place(&mut self, v: VertexKey, layer: usize, index: usize) {
        if self.layers.len() <= layer {
            self.layers.resize_with(layer + 1, Vec::new);
        }
        let row = &mut self.layers[layer];
        row.insert(index.min(row.len()), v);
        self.layer_of.insert(v, layer);
    }

    /// Takes `v` out of its layer and returns its previous `(layer, index)`.
    pub(crate) fn unplace(&mut self, v: VertexKey) -> Option<(usize, usize)> {
        let layer = self.layer_of.remove(&v)?;
        let row = &mut self.layers[layer];
        let index = row.iter().position(|x| *x == v)?;
        row.remove(index);
        Some((layer, index))
    }

    pub(crate) fn set_primary_parent(&mut self, child: VertexKey, parent: VertexKey) {
        self.primary_parent.insert(child, parent);
    }

    pub(crate) fn clear_primary_parent(&mut self, child: VertexKey) {
        self.primary_parent.remove(&child);
    }

    pub(crate) fn trim_empty_tail(&mut self) {
        while self.layers.last().is_some_and(Vec::is_empty) {
            self.layers.pop();
        }
    }
}
