//! Absolute positioning.
//!
//! A pure function of a [`RelativeLayout`]: layers become y coordinates (empty layers are skipped),
//! layer order becomes x coordinates under the centering and spacing rules, and every path gets a
//! polyline route. The result is checked before it is returned; a violated postcondition is
//! reported, never patched up.

use crate::config::LayoutConfig;
use crate::error::{Error, Result, VertexRef};
use crate::model::{ConnectorId, NodeId, Point, Rect, VertexKey};
use crate::relative::RelativeLayout;
use rustc_hash::{FxBuildHasher, FxHashMap};

pub mod horizontal;
pub mod route;

type IndexMap<K, V> = indexmap::IndexMap<K, V, FxBuildHasher>;

/// Tolerance of the centering and spacing checks.
pub const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbsoluteLayout {
    pub centers: FxHashMap<VertexKey, Point>,
    pub routes: IndexMap<ConnectorId, Vec<Point>>,
    /// Bounding box of every vertex, `None` for an empty layout.
    pub bounds: Option<Rect>,
}

impl AbsoluteLayout {
    pub fn center(&self, v: VertexKey) -> Option<Point> {
        self.centers.get(&v).copied()
    }

    pub fn route(&self, connector: &ConnectorId) -> Option<&[Point]> {
        self.routes.get(connector).map(Vec::as_slice)
    }
}

pub fn compute(relative: &RelativeLayout, config: &LayoutConfig) -> Result<AbsoluteLayout> {
    let layered = relative.layered();
    let ys = assign_y(relative, config);
    let xs = horizontal::assign_x(layered, config)?;

    check_centering(relative, &xs)?;
    check_spacing(relative, &xs, config)?;

    let mut centers: FxHashMap<VertexKey, Point> = FxHashMap::default();
    let mut bounds: Option<Rect> = None;
    for row in layered.layers() {
        for &v in row {
            let (Some(&x), Some(&y)) = (xs.get(&v), ys.get(&v)) else {
                continue;
            };
            let center = Point::new(x, y);
            let rect = Rect::centered(center, layered.size(v));
            bounds = Some(bounds.map_or(rect, |b| b.union(rect)));
            centers.insert(v, center);
        }
    }

    let routes = route::route_paths(relative, &centers, config);
    Ok(AbsoluteLayout {
        centers,
        routes,
        bounds,
    })
}

/// Vertical pass: `y = bottom + vertical_gap + tallest / 2` per non-empty layer.
fn assign_y(relative: &RelativeLayout, config: &LayoutConfig) -> FxHashMap<VertexKey, f64> {
    let layered = relative.layered();
    let mut out: FxHashMap<VertexKey, f64> = FxHashMap::default();
    let mut bottom = config.min_y;
    for row in layered.layers() {
        if row.is_empty() {
            continue;
        }
        let tallest = row
            .iter()
            .map(|v| layered.size(*v).height)
            .fold(0.0_f64, f64::max);
        let y = bottom + config.vertical_gap + tallest / 2.0;
        for &v in row {
            out.insert(v, y);
        }
        bottom = y + tallest / 2.0;
    }
    out
}

pub(crate) fn vertex_ref(relative: &RelativeLayout, v: VertexKey) -> VertexRef {
    relative
        .describe(v)
        .unwrap_or_else(|| VertexRef::Node(NodeId::new(format!("{v:?}"))))
}

fn check_centering(relative: &RelativeLayout, xs: &FxHashMap<VertexKey, f64>) -> Result<()> {
    let layered = relative.layered();
    let children = layered.primary_children_map();
    for row in layered.layers() {
        for &v in row {
            let Some(kids) = children.get(&v) else {
                continue;
            };
            let Some(expected) = horizontal::span_center(layered, xs, kids) else {
                continue;
            };
            let actual = xs.get(&v).copied().unwrap_or(f64::NAN);
            if actual.is_nan() || (actual - expected).abs() > EPSILON {
                return Err(Error::ParentNotCentered {
                    vertex: vertex_ref(relative, v),
                    actual,
                    expected,
                });
            }
        }
    }
    Ok(())
}

fn check_spacing(
    relative: &RelativeLayout,
    xs: &FxHashMap<VertexKey, f64>,
    config: &LayoutConfig,
) -> Result<()> {
    let layered = relative.layered();
    for (layer, row) in layered.layers().iter().enumerate() {
        for pair in row.windows(2) {
            let (l, r) = (pair[0], pair[1]);
            let (Some(&lx), Some(&rx)) = (xs.get(&l), xs.get(&r)) else {
                continue;
            };
            let right_edge = lx + layered.size(l).width / 2.0;
            let left_edge = rx - layered.size(r).width / 2.0;
            if right_edge + config.horizontal_gap > left_edge + EPSILON {
                return Err(Error::Overlap {
                    layer,
                    left: vertex_ref(relative, l),
                    right: vertex_ref(relative, r),
                });
            }
        }
    }
    Ok(())
}
