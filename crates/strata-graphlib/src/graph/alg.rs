//! Traversal helpers over [`Graph`].

use super::{EdgeIx, Graph, NodeIx};
use rustc_hash::FxBuildHasher;
use std::collections::VecDeque;

type HashSet<T> = hashbrown::HashSet<T, FxBuildHasher>;

/// Returns whether `to` can be reached from `from` following out-edges accepted by `follow`.
///
/// `from == to` counts as reachable.
pub fn reachable<N, E, F>(g: &Graph<N, E>, from: NodeIx, to: NodeIx, mut follow: F) -> bool
where
    F: FnMut(EdgeIx, &E) -> bool,
{
    if !g.contains_node(from) || !g.contains_node(to) {
        return false;
    }
    if from == to {
        return true;
    }

    let mut seen: HashSet<NodeIx> = HashSet::default();
    let mut q: VecDeque<NodeIx> = VecDeque::new();
    seen.insert(from);
    q.push_back(from);
    while let Some(v) = q.pop_front() {
        for &e in g.out_edges(v) {
            let Some(label) = g.edge(e) else {
                continue;
            };
            if !follow(e, label) {
                continue;
            }
            let Some((_, w)) = g.endpoints(e) else {
                continue;
            };
            if w == to {
                return true;
            }
            if seen.insert(w) {
                q.push_back(w);
            }
        }
    }
    false
}
