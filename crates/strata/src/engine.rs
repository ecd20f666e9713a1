//! The layout engine: one atomic relative → absolute → diff pass per batch of events.

use crate::actions::{LayoutAction, LayoutDiffer, LayoutGeometry};
use crate::config::LayoutConfig;
use crate::diagram::{Diagram, DiagramEvent};
use crate::error::Result;
use crate::model::{ConnectorId, NodeId, Point, Size};
use crate::partition::{Partition, partition};
use crate::position::{self, AbsoluteLayout, route};
use crate::relative::RelativeLayout;
use rustc_hash::FxHashMap;
use tracing::{debug, debug_span, trace};

#[derive(Debug, Clone, Default)]
struct EngineState {
    diagram: Diagram,
    groups: FxHashMap<Option<NodeId>, RelativeLayout>,
    differ: LayoutDiffer,
}

#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
    state: EngineState,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            state: EngineState::default(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn diagram(&self) -> &Diagram {
        &self.state.diagram
    }

    /// Relative layout of one group (`None` for the root).
    pub fn group(&self, container: Option<&NodeId>) -> Option<&RelativeLayout> {
        self.state.groups.get(&container.cloned())
    }

    pub fn center(&self, node: &NodeId) -> Option<Point> {
        self.state.differ.center(node)
    }

    pub fn route(&self, connector: &ConnectorId) -> Option<&[Point]> {
        self.state.differ.route(connector)
    }

    pub fn geometry(&self) -> &LayoutGeometry {
        self.state.differ.geometry()
    }

    /// Applies `events` and runs one pass. On error the engine keeps its previous state.
    pub fn process(&mut self, events: &[DiagramEvent]) -> Result<Vec<LayoutAction>> {
        let span = debug_span!("layout_pass", events = events.len());
        let _enter = span.enter();

        let mut next = self.state.clone();
        for event in events {
            trace!(?event, "applying event");
            next.apply(event)?;
        }
        let partition = partition(&next.diagram);
        next.reconcile(&partition)?;
        let geometry = next.layout(&partition, &self.config)?;
        let actions = next.differ.diff(geometry);

        debug!(
            groups = partition.groups.len(),
            deferred = partition.deferred.len(),
            actions = actions.len(),
            "layout pass committed"
        );
        self.state = next;
        Ok(actions)
    }
}

impl EngineState {
    fn apply(&mut self, event: &DiagramEvent) -> Result<()> {
        if matches!(event, DiagramEvent::DiagramCleared) {
            *self = EngineState::default();
            return Ok(());
        }
        self.diagram.apply(event)
    }

    /// Brings every group's relative layout in line with the partition: stale paths and vertices
    /// go first, then missing vertices and paths are added in registration order.
    fn reconcile(&mut self, partition: &Partition) -> Result<()> {
        self.groups.retain(|container, _| {
            partition.group(container.as_ref()).is_some()
        });

        for group in &partition.groups {
            let relative = self.groups.entry(group.container.clone()).or_default();

            let stale_paths: Vec<ConnectorId> = relative
                .paths()
                .map(|p| p.connector.clone())
                .filter(|c| !group.connectors.contains(c))
                .collect();
            for connector in &stale_paths {
                relative.remove_path(connector)?;
            }
            let stale_nodes: Vec<NodeId> = relative
                .nodes()
                .map(|(n, _)| n.clone())
                .filter(|n| !group.nodes.contains(n))
                .collect();
            for node in &stale_nodes {
                relative.remove_vertex(node)?;
            }

            for node in &group.nodes {
                if relative.contains_vertex(node) {
                    continue;
                }
                let Some(n) = self.diagram.node(node) else {
                    continue;
                };
                relative.add_vertex(
                    node.clone(),
                    n.name.clone(),
                    n.size.unwrap_or(Size::ZERO),
                    n.priority,
                )?;
            }
            for connector in &group.connectors {
                if relative.contains_path(connector) {
                    continue;
                }
                let Some(c) = self.diagram.connector(connector) else {
                    continue;
                };
                let kind = relative.add_path(connector.clone(), &c.source, &c.target)?;
                trace!(connector = %connector, ?kind, "path classified");
            }
        }
        Ok(())
    }

    /// Positions every group bottom-up, then composes absolute coordinates top-down.
    fn layout(&mut self, partition: &Partition, config: &LayoutConfig) -> Result<LayoutGeometry> {
        let padding = config.group_padding;
        let mut areas: FxHashMap<NodeId, Size> = FxHashMap::default();
        let mut sizes: FxHashMap<NodeId, Size> = FxHashMap::default();
        let mut passes: FxHashMap<Option<NodeId>, AbsoluteLayout> = FxHashMap::default();

        for group in &partition.groups {
            let Some(relative) = self.groups.get_mut(&group.container) else {
                continue;
            };
            for node in &group.nodes {
                let own = self
                    .diagram
                    .node(node)
                    .and_then(|n| n.size)
                    .unwrap_or(Size::ZERO);
                let effective = match areas.get(node) {
                    Some(area) => Size::new(own.width.max(area.width), own.height + area.height),
                    None => own,
                };
                relative.resize_vertex(node, effective)?;
                sizes.insert(node.clone(), effective);
            }

            let pass = position::compute(relative, config)?;
            if let (Some(container), Some(bounds)) = (&group.container, pass.bounds) {
                areas.insert(
                    container.clone(),
                    Size::new(
                        bounds.width() + 2.0 * padding,
                        bounds.height() + 2.0 * padding,
                    ),
                );
            }
            passes.insert(group.container.clone(), pass);
        }

        let mut centers: FxHashMap<NodeId, Point> = FxHashMap::default();
        let mut routes: FxHashMap<ConnectorId, Vec<Point>> = FxHashMap::default();

        for group in partition.groups.iter().rev() {
            let (Some(relative), Some(pass)) = (
                self.groups.get(&group.container),
                passes.get(&group.container),
            ) else {
                continue;
            };

            let (dx, dy) = match &group.container {
                None => (0.0, 0.0),
                Some(container) => {
                    let (Some(c), Some(bounds)) = (centers.get(container), pass.bounds) else {
                        continue;
                    };
                    let own = self
                        .diagram
                        .node(container)
                        .and_then(|n| n.size)
                        .unwrap_or(Size::ZERO);
                    let effective = sizes.get(container).copied().unwrap_or(own);
                    let area = areas.get(container).copied().unwrap_or(Size::ZERO);
                    let area_left = c.x - effective.width / 2.0 + (effective.width - area.width) / 2.0;
                    let area_top = c.y - effective.height / 2.0 + own.height;
                    (
                        area_left + padding - bounds.min_x,
                        area_top + padding - bounds.min_y,
                    )
                }
            };
            for node in &group.nodes {
                let Some(center) = relative.vertex_key(node).and_then(|v| pass.center(v)) else {
                    continue;
                };
                centers.insert(node.clone(), center.offset(dx, dy));
            }
            for connector in &group.connectors {
                if let Some(points) = pass.route(connector) {
                    let shifted = points.iter().map(|p| p.offset(dx, dy)).collect();
                    routes.insert(connector.clone(), shifted);
                }
            }
        }

        for connector in &partition.cross_group {
            let Some(c) = self.diagram.connector(connector) else {
                continue;
            };
            let (Some(&from), Some(&to)) = (centers.get(&c.source), centers.get(&c.target)) else {
                continue;
            };
            let size_of = |n: &NodeId| sizes.get(n).copied().unwrap_or(Size::ZERO);
            routes.insert(
                connector.clone(),
                route::straight_route(from, size_of(&c.source), to, size_of(&c.target)),
            );
        }

        let mut geometry = LayoutGeometry::default();
        for node in self.diagram.nodes() {
            if let Some(center) = centers.remove(&node.id) {
                geometry.centers.insert(node.id.clone(), center);
            }
        }
        for connector in self.diagram.connectors() {
            if let Some(route) = routes.remove(&connector.id) {
                geometry.routes.insert(connector.id.clone(), route);
            }
        }
        Ok(geometry)
    }
}
