//! Hit testing: canvas-local point → node or port lookup.
//!
//! Later nodes paint over earlier ones, so lookups walk node indices in
//! reverse. Input ports sit evenly spaced on a node's left edge and output
//! ports on its right edge.

use crate::graph::WireGraph;
use crate::model::{PortDirection, PortRef};
use kurbo::Point;
use petgraph::stable_graph::NodeIndex;

/// Find the topmost component whose box contains `point`.
/// Returns `None` for blank canvas. Drag previews are never hit.
pub fn hit_test(graph: &WireGraph, point: Point) -> Option<NodeIndex> {
    topmost_first(graph).into_iter().find(|&idx| {
        graph.component_at(idx).is_some() && graph.bounds(idx).is_some_and(|b| b.contains(point))
    })
}

/// Canvas-local anchor of a port.
pub fn port_anchor(
    graph: &WireGraph,
    idx: NodeIndex,
    direction: PortDirection,
    index: u32,
) -> Option<Point> {
    let component = graph.component_at(idx)?;
    let count = component.port_count(direction);
    if index >= count {
        return None;
    }
    let b = graph.bounds(idx)?;
    let y = b.y0 + b.height() * (f64::from(index) + 0.5) / f64::from(count);
    let x = match direction {
        PortDirection::In => b.x0,
        PortDirection::Out => b.x1,
    };
    Some(Point::new(x, y))
}

/// Find the topmost port within `radius` of `point`.
pub fn hit_test_port(graph: &WireGraph, point: Point, radius: f64) -> Option<(NodeIndex, PortRef)> {
    for idx in topmost_first(graph) {
        let Some(component) = graph.component_at(idx) else {
            continue;
        };
        for direction in [PortDirection::Out, PortDirection::In] {
            for i in 0..component.port_count(direction) {
                if let Some(anchor) = port_anchor(graph, idx, direction, i)
                    && anchor.distance(point) <= radius
                {
                    return Some((
                        idx,
                        PortRef {
                            direction,
                            name: component.port_name(i, direction),
                        },
                    ));
                }
            }
        }
    }
    None
}

fn topmost_first(graph: &WireGraph) -> Vec<NodeIndex> {
    let mut indices: Vec<NodeIndex> = graph.graph.node_indices().collect();
    indices.sort_by(|a, b| b.cmp(a));
    indices
}
