//! Connector routes.

use crate::config::LayoutConfig;
use crate::model::{ConnectorId, DetachReason, PathKind, Point, Size, VertexKey};
use crate::relative::RelativeLayout;
use rustc_hash::{FxBuildHasher, FxHashMap};

type IndexMap<K, V> = indexmap::IndexMap<K, V, FxBuildHasher>;

/// Projects `center` onto the boundary of the `size` box around it, in the direction of
/// `toward`. A point at the center (or a zero-size box) projects onto the center itself.
pub fn project_to_boundary(center: Point, size: Size, toward: Point) -> Point {
    let dx = toward.x - center.x;
    let dy = toward.y - center.y;
    if dx == 0.0 && dy == 0.0 {
        return center;
    }
    let hw = size.width / 2.0;
    let hh = size.height / 2.0;
    let tx = if dx == 0.0 { f64::INFINITY } else { hw / dx.abs() };
    let ty = if dy == 0.0 { f64::INFINITY } else { hh / dy.abs() };
    let t = tx.min(ty);
    center.offset(dx * t, dy * t)
}

/// Straight segment between the boundaries of two boxes.
pub fn straight_route(from: Point, from_size: Size, to: Point, to_size: Size) -> Vec<Point> {
    vec![
        project_to_boundary(from, from_size, to),
        project_to_boundary(to, to_size, from),
    ]
}

/// Small loop hanging off the right side of a box.
pub fn self_loop_route(center: Point, size: Size, config: &LayoutConfig) -> Vec<Point> {
    let x0 = center.x + size.width / 2.0;
    let x1 = x0 + config.horizontal_gap / 2.0;
    let dy = size.height / 4.0;
    vec![
        Point::new(x0, center.y - dy),
        Point::new(x1, center.y - dy),
        Point::new(x1, center.y + dy),
        Point::new(x0, center.y + dy),
    ]
}

pub(crate) fn route_paths(
    relative: &RelativeLayout,
    centers: &FxHashMap<VertexKey, Point>,
    config: &LayoutConfig,
) -> IndexMap<ConnectorId, Vec<Point>> {
    let layered = relative.layered();
    let mut out: IndexMap<ConnectorId, Vec<Point>> = IndexMap::default();

    for path in relative.paths() {
        let (Some(&from), Some(&to)) = (centers.get(&path.source), centers.get(&path.target))
        else {
            continue;
        };
        let from_size = layered.size(path.source);
        let to_size = layered.size(path.target);

        let route = match path.kind {
            PathKind::Detached(DetachReason::SelfLoop) => self_loop_route(from, from_size, config),
            PathKind::Detached(_) => straight_route(from, from_size, to, to_size),
            PathKind::Primary | PathKind::Secondary => {
                let mut points: Vec<Point> = Vec::with_capacity(path.dummies.len() + 2);
                points.push(from);
                points.extend(path.dummies.iter().filter_map(|d| centers.get(d).copied()));
                points.push(to);
                let n = points.len();
                points[0] = project_to_boundary(from, from_size, points[1]);
                points[n - 1] = project_to_boundary(to, to_size, points[n - 2]);
                points
            }
        };
        out.insert(path.connector.clone(), route);
    }
    out
}
