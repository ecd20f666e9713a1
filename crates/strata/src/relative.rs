//! Relative layout: incremental maintenance of the layered graph of one layout group.
//!
//! Every mutation keeps these properties:
//! - each structural path runs strictly downwards (source layer > target layer) and owns exactly
//!   one dummy per intermediate layer;
//! - a vertex has at most one primary path, and its proper primary parent is the chain vertex
//!   directly above it;
//! - surviving vertices are never moved by removals.

use crate::error::{Error, Result, VertexRef};
use crate::layered::LayeredGraph;
use crate::model::{
    ConnectorId, DetachReason, DummyVertex, LayeredEdge, LayoutPath, LayoutVertex, NodeId,
    OrderKey, OriginalVertex, PathKind, Size, VertexKey,
};
use rustc_hash::{FxBuildHasher, FxHashMap};
use std::collections::VecDeque;
use strata_graphlib::alg;
use tracing::trace;

type IndexMap<K, V> = indexmap::IndexMap<K, V, FxBuildHasher>;
type IndexSet<T> = indexmap::IndexSet<T, FxBuildHasher>;

#[derive(Debug, Clone, Default)]
pub struct RelativeLayout {
    layered: LayeredGraph,
    vertices: IndexMap<NodeId, VertexKey>,
    paths: IndexMap<ConnectorId, LayoutPath>,
    incident: FxHashMap<VertexKey, Vec<ConnectorId>>,
}

impl RelativeLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layered(&self) -> &LayeredGraph {
        &self.layered
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_key(&self, node: &NodeId) -> Option<VertexKey> {
        self.vertices.get(node).copied()
    }

    pub fn contains_vertex(&self, node: &NodeId) -> bool {
        self.vertices.contains_key(node)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, VertexKey)> + '_ {
        self.vertices.iter().map(|(n, v)| (n, *v))
    }

    pub fn original(&self, v: VertexKey) -> Option<&OriginalVertex> {
        self.layered.vertex(v).and_then(LayoutVertex::as_original)
    }

    pub fn contains_path(&self, connector: &ConnectorId) -> bool {
        self.paths.contains_key(connector)
    }

    pub fn path(&self, connector: &ConnectorId) -> Option<&LayoutPath> {
        self.paths.get(connector)
    }

    /// Paths in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &LayoutPath> + '_ {
        self.paths.values()
    }

    pub fn layer_of_node(&self, node: &NodeId) -> Option<usize> {
        self.layered.layer_of(self.vertex_key(node)?)
    }

    pub fn primary_parent_of(&self, node: &NodeId) -> Option<VertexKey> {
        self.layered.primary_parent(self.vertex_key(node)?)
    }

    /// Stable description of a vertex for diagnostics.
    pub fn describe(&self, v: VertexKey) -> Option<VertexRef> {
        match self.layered.vertex(v)? {
            LayoutVertex::Original(o) => Some(VertexRef::Node(o.node.clone())),
            LayoutVertex::Dummy(d) => {
                let path = self.paths.get(&d.path)?;
                let index = path.dummies.iter().position(|x| *x == v)?;
                Some(VertexRef::Dummy {
                    connector: d.path.clone(),
                    index,
                })
            }
        }
    }

    /// Adds an original vertex to the first layer, ordered by name.
    pub fn add_vertex(
        &mut self,
        node: NodeId,
        name: String,
        size: Size,
        priority: i32,
    ) -> Result<VertexKey> {
        if self.vertices.contains_key(&node) {
            return Err(Error::DuplicateVertex { node });
        }
        let v = self.layered.add_vertex(LayoutVertex::Original(OriginalVertex {
            node: node.clone(),
            name,
            size,
            priority,
        }));
        trace!(node = %node, "vertex added");
        self.vertices.insert(node, v);
        self.insert_into_layer(0, v, None, false);
        Ok(v)
    }

    pub fn resize_vertex(&mut self, node: &NodeId, size: Size) -> Result<()> {
        let v = self.key(node)?;
        if let Some(LayoutVertex::Original(o)) = self.layered.vertex_mut(v) {
            o.size = size;
        }
        Ok(())
    }

    /// Removes a vertex and all of its paths. Returns the removed connectors.
    pub fn remove_vertex(&mut self, node: &NodeId) -> Result<Vec<ConnectorId>> {
        let v = self.key(node)?;
        let removed = self.incident.remove(&v).unwrap_or_default();
        for connector in &removed {
            self.strip_chain(connector);
            if let Some(path) = self.paths.shift_remove(connector) {
                let other = if path.source == v {
                    path.target
                } else {
                    path.source
                };
                self.forget_incidence(other, connector);
            }
        }
        self.layered.remove_vertex(v);
        self.vertices.shift_remove(node);
        trace!(node = %node, paths = removed.len(), "vertex removed");

        self.repromote_detached()?;
        self.layered.trim_empty_tail();
        Ok(removed)
    }

    /// Adds a path and returns how it was classified.
    pub fn add_path(
        &mut self,
        connector: ConnectorId,
        source: &NodeId,
        target: &NodeId,
    ) -> Result<PathKind> {
        if self.paths.contains_key(&connector) {
            return Err(Error::DuplicatePath { connector });
        }
        let s = self.key(source)?;
        let t = self.key(target)?;
        let kind = self.classify(s, t);

        self.paths.insert(
            connector.clone(),
            LayoutPath {
                connector: connector.clone(),
                source: s,
                target: t,
                kind,
                dummies: Vec::new(),
                edges: Vec::new(),
            },
        );
        self.incident.entry(s).or_default().push(connector.clone());
        if s != t {
            self.incident.entry(t).or_default().push(connector.clone());
        }
        trace!(connector = %connector, ?kind, "path added");

        if kind.is_structural() {
            self.attach(&connector)?;
            self.demote_redundant(&connector)?;
        }
        Ok(kind)
    }

    /// Removes a path and the dummies that existed for it. The source keeps its layer.
    pub fn remove_path(&mut self, connector: &ConnectorId) -> Result<()> {
        if !self.paths.contains_key(connector) {
            return Err(Error::UnknownPath {
                connector: connector.clone(),
            });
        }
        self.strip_chain(connector);
        if let Some(path) = self.paths.shift_remove(connector) {
            self.forget_incidence(path.source, connector);
            self.forget_incidence(path.target, connector);
        }
        trace!(connector = %connector, "path removed");

        self.repromote_detached()?;
        self.layered.trim_empty_tail();
        Ok(())
    }

    fn key(&self, node: &NodeId) -> Result<VertexKey> {
        self.vertex_key(node).ok_or_else(|| Error::UnknownVertex { node: node.clone() })
    }

    fn forget_incidence(&mut self, v: VertexKey, connector: &ConnectorId) {
        if let Some(list) = self.incident.get_mut(&v) {
            list.retain(|c| c != connector);
        }
    }

    fn classify(&self, s: VertexKey, t: VertexKey) -> PathKind {
        if s == t {
            PathKind::Detached(DetachReason::SelfLoop)
        } else if self.structurally_reachable(t, s, None) {
            PathKind::Detached(DetachReason::Cycle)
        } else if self.structurally_reachable(s, t, None) {
            PathKind::Detached(DetachReason::Redundant)
        } else if self.primary_path_of(s).is_none() {
            PathKind::Primary
        } else {
            PathKind::Secondary
        }
    }

    fn structurally_reachable(
        &self,
        from: VertexKey,
        to: VertexKey,
        skip: Option<&ConnectorId>,
    ) -> bool {
        alg::reachable(self.layered.graph(), from, to, |_, e| {
            skip.is_none_or(|c| *c != e.path)
        })
    }

    fn primary_path_of(&self, v: VertexKey) -> Option<ConnectorId> {
        self.incident.get(&v)?.iter().find_map(|c| {
            let p = &self.paths[c];
            (p.source == v && p.is_primary()).then(|| c.clone())
        })
    }

    fn structural_paths(&self, v: VertexKey, outgoing: bool) -> Vec<ConnectorId> {
        let Some(list) = self.incident.get(&v) else {
            return Vec::new();
        };
        list.iter()
            .filter(|c| {
                let p = &self.paths[*c];
                p.is_structural() && if outgoing { p.source == v } else { p.target == v }
            })
            .cloned()
            .collect()
    }

    fn planned_layer(&self, v: VertexKey, planned: &IndexMap<VertexKey, usize>) -> usize {
        planned
            .get(&v)
            .copied()
            .or_else(|| self.layered.layer_of(v))
            .unwrap_or(0)
    }

    /// Lowest layer `v` may occupy: one below its deepest structural target.
    fn required_layer(&self, v: VertexKey, planned: &IndexMap<VertexKey, usize>) -> usize {
        self.structural_paths(v, true)
            .iter()
            .map(|c| self.planned_layer(self.paths[c].target, planned) + 1)
            .max()
            .unwrap_or(0)
    }

    /// Builds (or relocates for) a freshly structural path whose chain is still empty.
    fn attach(&mut self, connector: &ConnectorId) -> Result<()> {
        let path = &self.paths[connector];
        let (s, primary) = (path.source, path.is_primary());
        let current = self.layered.layer_of(s).unwrap_or(0);
        let required = self.required_layer(s, &IndexMap::default());

        if primary || required > current {
            let seed_layer = if primary { required } else { required.max(current) };
            let planned = self.plan_relocation(s, seed_layer)?;
            self.apply_relocation(planned)
        } else {
            self.build_chain(connector, current).map(|_| ())
        }
    }

    /// Computes the new layer of every vertex affected by moving `seed` to `seed_layer`.
    ///
    /// Primary children always follow their parent; secondary children only move down when they
    /// would otherwise not be below their target.
    fn plan_relocation(
        &self,
        seed: VertexKey,
        seed_layer: usize,
    ) -> Result<IndexMap<VertexKey, usize>> {
        let budget = 8 * (self.layered.graph().node_count() + 1) * (self.paths.len() + 1);
        let mut planned: IndexMap<VertexKey, usize> = IndexMap::default();
        let mut work: VecDeque<(VertexKey, usize)> = VecDeque::from([(seed, seed_layer)]);
        let mut steps = 0usize;

        while let Some((v, layer)) = work.pop_front() {
            steps += 1;
            if steps > budget {
                return Err(Error::PropagationBudgetExceeded {
                    stage: "layer assignment",
                    budget,
                });
            }
            if planned.get(&v) == Some(&layer) {
                continue;
            }
            planned.insert(v, layer);

            for connector in self.structural_paths(v, false) {
                let path = &self.paths[&connector];
                let child = path.source;
                let required = self.required_layer(child, &planned);
                if path.is_primary() {
                    work.push_back((child, required));
                } else if required > self.planned_layer(child, &planned) {
                    work.push_back((child, required));
                }
            }
        }
        Ok(planned)
    }

    fn apply_relocation(&mut self, planned: IndexMap<VertexKey, usize>) -> Result<()> {
        let mut chains: IndexSet<ConnectorId> = IndexSet::default();
        for v in planned.keys() {
            for c in self.structural_paths(*v, true) {
                chains.insert(c);
            }
            for c in self.structural_paths(*v, false) {
                chains.insert(c);
            }
        }
        for c in &chains {
            self.strip_chain(c);
        }

        let mut moves: Vec<(usize, usize, usize, VertexKey)> = planned
            .iter()
            .map(|(&v, &layer)| {
                let (old_layer, old_index) = self
                    .layered
                    .unplace(v)
                    .unwrap_or((usize::MAX, usize::MAX));
                (layer, old_layer, old_index, v)
            })
            .collect();
        moves.sort_unstable();
        trace!(vertices = moves.len(), chains = chains.len(), "relocating");

        for (layer, _, _, v) in moves {
            let upper = match self.primary_path_of(v) {
                Some(c) => Some(self.build_chain(&c, layer)?),
                None => None,
            };
            self.insert_into_layer(layer, v, upper, upper.is_some());
        }

        for c in &chains {
            let path = &self.paths[c];
            if path.edges.is_empty() {
                let Some(layer) = self.layered.layer_of(path.source) else {
                    continue;
                };
                self.build_chain(c, layer)?;
            }
        }
        self.layered.trim_empty_tail();
        Ok(())
    }

    /// Lays out the chain of a structural path whose source sits (or will sit) on
    /// `source_layer`. Returns the chain vertex directly above the source.
    fn build_chain(&mut self, connector: &ConnectorId, source_layer: usize) -> Result<VertexKey> {
        let path = &self.paths[connector];
        let (source, target, primary) = (path.source, path.target, path.is_primary());
        let target_layer = self.layered.layer_of(target).unwrap_or(0);
        if source_layer <= target_layer {
            return Err(Error::InvertedPath {
                connector: connector.clone(),
                source_layer,
                target_layer,
            });
        }

        let mut above = target;
        let mut top_down: Vec<VertexKey> = Vec::with_capacity(source_layer - target_layer - 1);
        for layer in target_layer + 1..source_layer {
            let d = self.layered.add_vertex(LayoutVertex::Dummy(DummyVertex {
                path: connector.clone(),
            }));
            self.insert_into_layer(layer, d, Some(above), primary);
            if primary {
                self.layered.set_primary_parent(d, above);
            }
            top_down.push(d);
            above = d;
        }
        if primary {
            self.layered.set_primary_parent(source, above);
        }

        let mut chain = Vec::with_capacity(top_down.len() + 2);
        chain.push(source);
        chain.extend(top_down.iter().rev().copied());
        chain.push(target);
        let mut edges = Vec::with_capacity(chain.len() - 1);
        for w in chain.windows(2) {
            let label = LayeredEdge {
                path: connector.clone(),
            };
            if let Some(e) = self.layered.add_edge(w[0], w[1], label) {
                edges.push(e);
            }
        }

        if let Some(path) = self.paths.get_mut(connector) {
            path.dummies = chain[1..chain.len() - 1].to_vec();
            path.edges = edges;
        }
        Ok(above)
    }

    fn strip_chain(&mut self, connector: &ConnectorId) {
        let Some(path) = self.paths.get_mut(connector) else {
            return;
        };
        let dummies = std::mem::take(&mut path.dummies);
        let edges = std::mem::take(&mut path.edges);
        let (source, primary) = (path.source, path.is_primary());
        for e in edges {
            self.layered.remove_edge(e);
        }
        for d in dummies {
            self.layered.remove_vertex(d);
        }
        if primary {
            self.layered.clear_primary_parent(source);
        }
    }

    /// Detaches structural paths that an alternate route now makes redundant.
    fn demote_redundant(&mut self, added: &ConnectorId) -> Result<()> {
        let candidates: Vec<ConnectorId> = self
            .paths
            .iter()
            .filter(|(c, p)| *c != added && p.is_structural())
            .map(|(c, _)| c.clone())
            .collect();
        for c in candidates {
            let path = &self.paths[&c];
            if !path.is_structural() {
                continue;
            }
            if self.structurally_reachable(path.source, path.target, Some(&c)) {
                self.detach(&c, DetachReason::Redundant)?;
            }
        }
        Ok(())
    }

    fn detach(&mut self, connector: &ConnectorId, reason: DetachReason) -> Result<()> {
        let path = &self.paths[connector];
        let (source, was_primary) = (path.source, path.is_primary());
        self.strip_chain(connector);
        if let Some(path) = self.paths.get_mut(connector) {
            path.kind = PathKind::Detached(reason);
        }
        trace!(connector = %connector, ?reason, "path detached");

        if was_primary {
            if let Some(next) = self.structural_paths(source, true).into_iter().next() {
                if let Some(path) = self.paths.get_mut(&next) {
                    path.kind = PathKind::Primary;
                }
                let required = self.required_layer(source, &IndexMap::default());
                let planned = self.plan_relocation(source, required)?;
                self.apply_relocation(planned)?;
            }
        }
        Ok(())
    }

    /// Turns detached paths back into structural ones once they are neither redundant nor
    /// cycle-closing.
    fn repromote_detached(&mut self) -> Result<()> {
        let detached: Vec<ConnectorId> = self
            .paths
            .iter()
            .filter(|(_, p)| {
                matches!(
                    p.kind,
                    PathKind::Detached(DetachReason::Redundant | DetachReason::Cycle)
                )
            })
            .map(|(c, _)| c.clone())
            .collect();

        for c in detached {
            let path = &self.paths[&c];
            let kind = self.classify(path.source, path.target);
            if let Some(path) = self.paths.get_mut(&c) {
                path.kind = kind;
            }
            if kind.is_structural() {
                trace!(connector = %c, ?kind, "path re-promoted");
                self.attach(&c)?;
                self.demote_redundant(&c)?;
            }
        }
        Ok(())
    }

    /// Ordering key of a vertex among siblings. Dummies sort by the source of their path.
    fn sort_key(&self, v: VertexKey) -> Option<OrderKey<'_>> {
        match self.layered.vertex(v)? {
            LayoutVertex::Original(o) => Some(o.order_key()),
            LayoutVertex::Dummy(d) => {
                let source = self.paths.get(&d.path)?.source;
                self.original(source).map(OriginalVertex::order_key)
            }
        }
    }

    /// The vertex a layer member hangs from: its proper primary parent, or for secondary dummies
    /// the chain vertex above. Orphans have none.
    fn anchor(&self, v: VertexKey) -> Option<VertexKey> {
        if let Some(p) = self.layered.primary_parent(v) {
            return Some(p);
        }
        let d = self.layered.vertex(v)?.as_dummy()?;
        self.paths.get(&d.path)?.above(v)
    }

    fn insert_into_layer(
        &mut self,
        layer: usize,
        v: VertexKey,
        upper: Option<VertexKey>,
        primary: bool,
    ) {
        let index = match upper {
            None if layer == 0 => self.sorted_position(self.layered.layer(0), v),
            None => self.layered.layer(layer).len(),
            Some(upper) => {
                let row = self.layered.layer(layer);
                let has_siblings = primary
                    && row
                        .iter()
                        .any(|x| self.layered.primary_parent(*x) == Some(upper));
                if has_siblings {
                    self.sibling_position(row, v, upper)
                } else {
                    self.anchored_position(layer, upper)
                }
            }
        };
        self.layered.place(v, layer, index);
    }

    fn sorted_position(&self, row: &[VertexKey], v: VertexKey) -> usize {
        let key = self.sort_key(v);
        row.iter()
            .position(|x| self.sort_key(*x) > key)
            .unwrap_or(row.len())
    }

    /// Insert among the existing primary children of `upper`, by name.
    fn sibling_position(&self, row: &[VertexKey], v: VertexKey, upper: VertexKey) -> usize {
        let key = self.sort_key(v);
        let mut last = None;
        for (i, x) in row.iter().enumerate() {
            if self.layered.primary_parent(*x) != Some(upper) {
                continue;
            }
            if self.sort_key(*x) > key {
                return i;
            }
            last = Some(i);
        }
        last.map_or(row.len(), |i| i + 1)
    }

    /// Insert after the last vertex whose anchor is not right of `upper`, so no two
    /// layer transitions cross.
    fn anchored_position(&self, layer: usize, upper: VertexKey) -> usize {
        let row = self.layered.layer(layer);
        if layer == 0 {
            return row.len();
        }
        let order_above: FxHashMap<VertexKey, usize> = self
            .layered
            .layer(layer - 1)
            .iter()
            .enumerate()
            .map(|(i, v)| (*v, i))
            .collect();
        let Some(&pivot) = order_above.get(&upper) else {
            return row.len();
        };

        let mut after = None;
        let mut before = None;
        for (i, x) in row.iter().enumerate() {
            let Some(order) = self.anchor(*x).and_then(|a| order_above.get(&a).copied()) else {
                continue;
            };
            if order <= pivot {
                after = Some(i);
            } else if before.is_none() {
                before = Some(i);
            }
        }
        after.map(|i| i + 1).or(before).unwrap_or(row.len())
    }
}
