//! Horizontal pass.
//!
//! Layers are placed bottom-up, each left to right. A vertex with primary children is centered
//! over them; a childless vertex packs against its left neighbor. Whenever something moves right
//! the consequences (overlapping right neighbors, parents no longer centered) are queued and
//! resolved one step at a time until nothing is left or the step budget runs out.

use super::EPSILON;
use crate::config::LayoutConfig;
use crate::error::{Error, Result};
use crate::layered::LayeredGraph;
use crate::model::VertexKey;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
enum Step {
    /// Push the right neighbor of this vertex (and its subtree) out of the way.
    ResolveRight(VertexKey),
    /// Move this vertex back over the middle of its primary children.
    Recenter(VertexKey),
}

/// Center of the combined extent of `kids`, if all of them are placed.
pub(crate) fn span_center(
    layered: &LayeredGraph,
    xs: &FxHashMap<VertexKey, f64>,
    kids: &[VertexKey],
) -> Option<f64> {
    let mut left = f64::INFINITY;
    let mut right = f64::NEG_INFINITY;
    for &c in kids {
        let x = *xs.get(&c)?;
        let hw = layered.size(c).width / 2.0;
        left = left.min(x - hw);
        right = right.max(x + hw);
    }
    (left <= right).then_some((left + right) / 2.0)
}

struct Placement<'a> {
    layered: &'a LayeredGraph,
    gap: f64,
    children: FxHashMap<VertexKey, Vec<VertexKey>>,
    xs: FxHashMap<VertexKey, f64>,
    work: VecDeque<Step>,
    steps: usize,
    budget: usize,
}

pub(crate) fn assign_x(
    layered: &LayeredGraph,
    config: &LayoutConfig,
) -> Result<FxHashMap<VertexKey, f64>> {
    let n = layered.graph().node_count();
    let mut p = Placement {
        layered,
        gap: config.horizontal_gap,
        children: layered.primary_children_map(),
        xs: FxHashMap::default(),
        work: VecDeque::new(),
        steps: 0,
        budget: 16 * (n + 1) * (n + 1),
    };

    for row in layered.layers().iter().rev() {
        for (i, &v) in row.iter().enumerate() {
            let hw = p.half_width(v);
            let min_center = match i {
                0 => config.min_x + hw,
                _ => p.right_edge(row[i - 1]) + p.gap + hw,
            };

            match p.desired(v) {
                Some(desired) if desired < min_center - EPSILON => {
                    p.xs.insert(v, desired);
                    p.shift_subtree(v, min_center - desired);
                }
                Some(desired) => {
                    p.xs.insert(v, desired);
                    p.close_gap(row, i);
                }
                None => {
                    p.xs.insert(v, min_center);
                }
            }
            p.drain()?;
        }
    }
    Ok(p.xs)
}

impl Placement<'_> {
    fn half_width(&self, v: VertexKey) -> f64 {
        self.layered.size(v).width / 2.0
    }

    fn x(&self, v: VertexKey) -> f64 {
        self.xs.get(&v).copied().unwrap_or(0.0)
    }

    fn right_edge(&self, v: VertexKey) -> f64 {
        self.x(v) + self.half_width(v)
    }

    fn left_edge(&self, v: VertexKey) -> f64 {
        self.x(v) - self.half_width(v)
    }

    fn has_children(&self, v: VertexKey) -> bool {
        self.children.get(&v).is_some_and(|c| !c.is_empty())
    }

    fn desired(&self, v: VertexKey) -> Option<f64> {
        let kids = self.children.get(&v)?;
        span_center(self.layered, &self.xs, kids)
    }

    /// Shifts the contiguous run of childless vertices directly left of `row[i]` right so that
    /// the run ends exactly one gap before `row[i]`.
    fn close_gap(&mut self, row: &[VertexKey], i: usize) {
        if i == 0 {
            return;
        }
        let target_edge = self.left_edge(row[i]) - self.gap;
        let dx = target_edge - self.right_edge(row[i - 1]);
        if dx <= EPSILON {
            return;
        }
        let mut j = i;
        while j > 0 && !self.has_children(row[j - 1]) {
            j -= 1;
        }
        for &u in &row[j..i] {
            if let Some(x) = self.xs.get_mut(&u) {
                *x += dx;
            }
        }
    }

    /// Moves `root` and its whole primary subtree right by `dx`.
    fn shift_subtree(&mut self, root: VertexKey, dx: f64) {
        let mut stack = vec![root];
        while let Some(u) = stack.pop() {
            let Some(x) = self.xs.get_mut(&u) else {
                continue;
            };
            *x += dx;
            self.work.push_back(Step::ResolveRight(u));
            if let Some(kids) = self.children.get(&u) {
                stack.extend(kids.iter().copied());
            }
        }
        if let Some(parent) = self.layered.primary_parent(root) {
            self.work.push_back(Step::Recenter(parent));
        }
    }

    fn drain(&mut self) -> Result<()> {
        while let Some(step) = self.work.pop_front() {
            self.steps += 1;
            if self.steps > self.budget {
                return Err(Error::PropagationBudgetExceeded {
                    stage: "horizontal placement",
                    budget: self.budget,
                });
            }
            match step {
                Step::ResolveRight(v) => self.resolve_right(v),
                Step::Recenter(v) => self.recenter(v),
            }
        }
        Ok(())
    }

    fn resolve_right(&mut self, v: VertexKey) {
        let (Some(layer), Some(i)) = (self.layered.layer_of(v), self.layered.position(v)) else {
            return;
        };
        let Some(&r) = self.layered.layer(layer).get(i + 1) else {
            return;
        };
        if !self.xs.contains_key(&r) {
            return;
        }
        let overlap = self.right_edge(v) + self.gap - self.left_edge(r);
        if overlap > EPSILON {
            self.shift_subtree(r, overlap);
        }
    }

    fn recenter(&mut self, v: VertexKey) {
        if !self.xs.contains_key(&v) {
            return;
        }
        let Some(desired) = self.desired(v) else {
            return;
        };
        let x = self.x(v);
        if desired > x + EPSILON {
            self.xs.insert(v, desired);
            self.work.push_back(Step::ResolveRight(v));
            if let Some(parent) = self.layered.primary_parent(v) {
                self.work.push_back(Step::Recenter(parent));
            }
        } else if desired < x - EPSILON {
            // Never move left: push the children under the parent instead.
            let kids = self.children.get(&v).cloned().unwrap_or_default();
            for c in kids {
                self.shift_subtree(c, x - desired);
            }
        }
    }
}
