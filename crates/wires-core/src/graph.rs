//! The wiring graph: component nodes and wire edges.
//!
//! Nodes are `GraphNode`s (a component or the drag preview) placed at a
//! canvas-local position; every node shares the same size. Edges go from an
//! emitter's output port to a receiver's input port and carry the resolved
//! `Wire` once committed. The graph should stay acyclic, but that is an
//! advisory invariant checked with [`WireGraph::has_cycle`]; transient
//! cycles are tolerated mid-edit.

use crate::error::WiresError;
use crate::id::Pid;
use crate::model::*;
use kurbo::{Point, Rect, Size, Vec2};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};

/// Default on-canvas size of a component node.
pub const DEFAULT_NODE_SIZE: Size = Size::new(80.0, 80.0);

/// A node on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub kind: NodeKind,
    /// Canvas-local top-left corner.
    pub position: Point,
}

impl GraphNode {
    pub fn component(&self) -> Option<&WireComponent> {
        self.kind.as_component()
    }

    pub fn pid(&self) -> Option<Pid> {
        self.component().map(|c| c.pid)
    }

    pub fn is_preview(&self) -> bool {
        matches!(self.kind, NodeKind::TransientPreview)
    }
}

/// An edge between two ports.
#[derive(Debug, Clone, PartialEq)]
pub struct WireEdge {
    pub emitter_port: String,
    pub receiver_port: String,
    /// The semantic wire, attached once the edge has been committed.
    pub wire: Option<Wire>,
}

/// What a component removal took with it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedComponent {
    pub component: WireComponent,
    /// Wires of the edges that were cascaded away, in edge order.
    pub wires: Vec<Wire>,
}

/// The component/wire graph.
#[derive(Debug, Clone)]
pub struct WireGraph {
    /// The underlying directed graph.
    pub graph: StableDiGraph<GraphNode, WireEdge>,

    /// Index from Pid → NodeIndex for fast lookup.
    pid_index: HashMap<Pid, NodeIndex>,

    /// Shared bounding-box size of every node.
    node_size: Size,
}

impl Default for WireGraph {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_SIZE)
    }
}

impl WireGraph {
    #[must_use]
    pub fn new(node_size: Size) -> Self {
        Self {
            graph: StableDiGraph::new(),
            pid_index: HashMap::new(),
            node_size,
        }
    }

    pub fn node_size(&self) -> Size {
        self.node_size
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Insert a component at `position`. Pids must be unique.
    pub fn add_component(
        &mut self,
        component: WireComponent,
        position: Point,
    ) -> Result<NodeIndex, WiresError> {
        let pid = component.pid;
        if self.pid_index.contains_key(&pid) {
            return Err(WiresError::DuplicatePid(pid));
        }
        let idx = self.graph.add_node(GraphNode {
            kind: NodeKind::Component(component),
            position,
        });
        self.pid_index.insert(pid, idx);
        Ok(idx)
    }

    /// Insert a drag preview placeholder.
    pub fn add_preview(&mut self, position: Point) -> NodeIndex {
        self.graph.add_node(GraphNode {
            kind: NodeKind::TransientPreview,
            position,
        })
    }

    /// Remove a preview node. Component nodes are left alone.
    pub fn remove_preview(&mut self, idx: NodeIndex) -> bool {
        if self.graph.node_weight(idx).is_some_and(GraphNode::is_preview) {
            self.graph.remove_node(idx);
            true
        } else {
            false
        }
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&GraphNode> {
        self.graph.node_weight(idx)
    }

    pub fn index_of(&self, pid: Pid) -> Option<NodeIndex> {
        self.pid_index.get(&pid).copied()
    }

    pub fn component(&self, pid: Pid) -> Option<&WireComponent> {
        self.index_of(pid)
            .and_then(|idx| self.graph.node_weight(idx))
            .and_then(GraphNode::component)
    }

    pub fn component_mut(&mut self, pid: Pid) -> Option<&mut WireComponent> {
        let idx = self.index_of(pid)?;
        self.graph
            .node_weight_mut(idx)
            .and_then(|n| n.kind.as_component_mut())
    }

    /// Update the display-only validity flag of a component.
    pub fn set_valid(&mut self, pid: Pid, valid: bool) -> Result<(), WiresError> {
        self.component_mut(pid)
            .ok_or(WiresError::UnknownComponent(pid))?
            .set_valid(valid);
        Ok(())
    }

    pub fn component_at(&self, idx: NodeIndex) -> Option<&WireComponent> {
        self.graph.node_weight(idx).and_then(GraphNode::component)
    }

    pub fn position(&self, idx: NodeIndex) -> Option<Point> {
        self.graph.node_weight(idx).map(|n| n.position)
    }

    /// Move a node. Returns `true` if the position actually changed.
    pub fn set_position(&mut self, idx: NodeIndex, position: Point) -> bool {
        match self.graph.node_weight_mut(idx) {
            Some(node) if node.position != position => {
                node.position = position;
                true
            }
            _ => false,
        }
    }

    pub fn translate(&mut self, idx: NodeIndex, delta: Vec2) -> bool {
        match self.position(idx) {
            Some(p) => self.set_position(idx, p + delta),
            None => false,
        }
    }

    /// Canvas-local bounding box of a node.
    pub fn bounds(&self, idx: NodeIndex) -> Option<Rect> {
        self.position(idx)
            .map(|p| Rect::from_origin_size(p, self.node_size))
    }

    /// Components whose bounding box overlaps `idx`'s (touching edges don't
    /// count). Drag previews are ignored.
    pub fn overlapping(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let Some(target) = self.bounds(idx) else {
            return Vec::new();
        };
        self.graph
            .node_indices()
            .filter(|&other| other != idx && self.component_at(other).is_some())
            .filter(|&other| self.bounds(other).is_some_and(|b| rects_overlap(target, b)))
            .collect()
    }

    /// Shift `idx` right by `offset` until it overlaps nothing.
    /// Returns `true` if the node had to move.
    ///
    /// Each step moves strictly right and the node count is finite, so the
    /// loop ends once the node clears the rightmost overlapping neighbour.
    pub fn move_to_free_spot(&mut self, idx: NodeIndex, offset: f64) -> bool {
        if offset <= 0.0 {
            log::warn!("free-spot offset must be positive, got {offset}");
            return false;
        }
        let mut moved = false;
        while !self.overlapping(idx).is_empty() {
            self.translate(idx, Vec2::new(offset, 0.0));
            moved = true;
        }
        moved
    }

    /// Copy each node's position into its component's rendering properties.
    pub fn refresh_rendering_positions(&mut self) {
        for node in self.graph.node_weights_mut() {
            let position = node.position;
            if let NodeKind::Component(c) = &mut node.kind {
                c.rendering_properties.position = Some(position.into());
            }
        }
    }

    /// Refresh a single node's rendering position.
    pub fn refresh_rendering_position(&mut self, idx: NodeIndex) {
        if let Some(node) = self.graph.node_weight_mut(idx) {
            let position = node.position;
            if let NodeKind::Component(c) = &mut node.kind {
                c.rendering_properties.position = Some(position.into());
            }
        }
    }

    /// Remove a component and every edge touching it.
    pub fn remove_component(&mut self, pid: Pid) -> Option<RemovedComponent> {
        let idx = self.index_of(pid)?;
        self.remove_component_at(idx)
    }

    pub fn remove_component_at(&mut self, idx: NodeIndex) -> Option<RemovedComponent> {
        self.component_at(idx)?;
        let mut incident: Vec<EdgeIndex> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .chain(self.graph.edges_directed(idx, Direction::Outgoing))
            .map(|e| e.id())
            .collect();
        incident.sort();
        incident.dedup();

        let wires = incident
            .into_iter()
            .filter_map(|e| self.graph.remove_edge(e))
            .filter_map(|edge| edge.wire)
            .collect();

        let node = self.graph.remove_node(idx)?;
        let NodeKind::Component(component) = node.kind else {
            return None;
        };
        self.pid_index.remove(&component.pid);
        Some(RemovedComponent { component, wires })
    }

    /// Drop every node and edge.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.pid_index.clear();
    }

    // ─── Edges ───────────────────────────────────────────────────────────

    /// Add an edge between two ports, without a resolved wire.
    pub fn connect(
        &mut self,
        emitter: NodeIndex,
        emitter_port: &str,
        receiver: NodeIndex,
        receiver_port: &str,
    ) -> Option<EdgeIndex> {
        if self.component_at(emitter).is_none() || self.component_at(receiver).is_none() {
            return None;
        }
        Some(self.graph.add_edge(
            emitter,
            receiver,
            WireEdge {
                emitter_port: emitter_port.to_string(),
                receiver_port: receiver_port.to_string(),
                wire: None,
            },
        ))
    }

    /// Insert a console-supplied wire. Returns `None` if either endpoint is
    /// not on the canvas.
    pub fn add_wire(&mut self, wire: Wire) -> Option<EdgeIndex> {
        let emitter = self.index_of(wire.emitter_pid)?;
        let receiver = self.index_of(wire.receiver_pid)?;
        let emitter_port = self
            .component_at(emitter)?
            .port_name(wire.emitter_port, PortDirection::Out);
        let receiver_port = self
            .component_at(receiver)?
            .port_name(wire.receiver_port, PortDirection::In);
        let edge = self.connect(emitter, &emitter_port, receiver, &receiver_port)?;
        self.graph[edge].wire = Some(wire);
        Some(edge)
    }

    /// Build the semantic wire for an edge from its endpoint components.
    pub fn resolve_wire(&self, edge: EdgeIndex) -> Option<Wire> {
        let (emitter, receiver) = self.graph.edge_endpoints(edge)?;
        let data = self.graph.edge_weight(edge)?;
        let emitter = self.component_at(emitter)?;
        let receiver = self.component_at(receiver)?;
        let emitter_port = emitter
            .port_index(&data.emitter_port, PortDirection::Out)
            .ok()?;
        let receiver_port = receiver
            .port_index(&data.receiver_port, PortDirection::In)
            .ok()?;
        Some(Wire::new(emitter.pid, emitter_port, receiver.pid, receiver_port))
    }

    pub fn edge(&self, edge: EdgeIndex) -> Option<&WireEdge> {
        self.graph.edge_weight(edge)
    }

    pub fn edge_mut(&mut self, edge: EdgeIndex) -> Option<&mut WireEdge> {
        self.graph.edge_weight_mut(edge)
    }

    pub fn edge_endpoints(&self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(edge)
    }

    /// Find the edge carrying `wire`.
    pub fn find_wire(&self, wire: &Wire) -> Option<EdgeIndex> {
        self.graph
            .edge_indices()
            .find(|&e| self.graph[e].wire.as_ref() == Some(wire))
    }

    pub fn remove_edge(&mut self, edge: EdgeIndex) -> Option<WireEdge> {
        self.graph.remove_edge(edge)
    }

    /// Point an edge at a different receiver port. Edges can't be re-pointed
    /// in place, so the edge is recreated; the returned index replaces `edge`.
    pub fn retarget(
        &mut self,
        edge: EdgeIndex,
        receiver: NodeIndex,
        receiver_port: &str,
    ) -> Option<EdgeIndex> {
        self.component_at(receiver)?;
        let (emitter, _) = self.graph.edge_endpoints(edge)?;
        let mut data = self.graph.remove_edge(edge)?;
        data.receiver_port = receiver_port.to_string();
        Some(self.graph.add_edge(emitter, receiver, data))
    }

    /// The edge ending at the given input port, if any.
    pub fn incoming_to_port(&self, receiver: NodeIndex, port: &str) -> Option<EdgeIndex> {
        self.graph
            .edges_directed(receiver, Direction::Incoming)
            .find(|e| e.weight().receiver_port == port)
            .map(|e| e.id())
    }

    /// Edges leaving the given output port (all outputs when `port` is `None`).
    pub fn outgoing_from(&self, emitter: NodeIndex, port: Option<&str>) -> Vec<EdgeIndex> {
        let mut edges: Vec<EdgeIndex> = self
            .graph
            .edges_directed(emitter, Direction::Outgoing)
            .filter(|e| port.is_none_or(|p| e.weight().emitter_port == p))
            .map(|e| e.id())
            .collect();
        edges.sort();
        edges
    }

    // ─── Enumeration ─────────────────────────────────────────────────────

    /// Components in node order.
    pub fn components(&self) -> impl Iterator<Item = &WireComponent> {
        let mut indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        indices.sort();
        indices
            .into_iter()
            .filter_map(move |idx| self.component_at(idx))
    }

    /// Committed wires in edge order.
    pub fn wires(&self) -> impl Iterator<Item = &Wire> {
        let mut indices: Vec<EdgeIndex> = self.graph.edge_indices().collect();
        indices.sort();
        indices
            .into_iter()
            .filter_map(move |e| self.graph[e].wire.as_ref())
    }

    pub fn component_count(&self) -> usize {
        self.pid_index.len()
    }

    pub fn wire_count(&self) -> usize {
        self.wires().count()
    }

    pub fn snapshot(&mut self) -> GraphSnapshot {
        self.refresh_rendering_positions();
        GraphSnapshot {
            components: self.components().cloned().collect(),
            wires: self.wires().copied().collect(),
        }
    }

    /// Union of all component bounding boxes, or `None` for an empty canvas.
    pub fn content_bounds(&self) -> Option<Rect> {
        self.graph
            .node_indices()
            .filter(|&idx| self.component_at(idx).is_some())
            .filter_map(|idx| self.bounds(idx))
            .reduce(|acc, b| acc.union(b))
    }

    // ─── Cycle detection ─────────────────────────────────────────────────

    /// Nodes with no incoming edge.
    pub fn roots(&self) -> Vec<NodeIndex> {
        let mut roots: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect();
        roots.sort();
        roots
    }

    /// Depth-first walk from `start` following outbound edges. Returns `true`
    /// if the walk reaches a node already on the current path, with
    /// `blocked` treated as being on the path from the outset.
    ///
    /// With `blocked = [source]` this answers "would an edge source → start
    /// close a cycle".
    pub fn has_cycles_from(&self, start: NodeIndex, blocked: &[NodeIndex]) -> bool {
        self.walk_for_cycle(start, blocked, &mut HashSet::new())
    }

    /// Whether the graph contains any directed cycle.
    ///
    /// Walks from every root first, then from every node the root walks
    /// never reached, so a cycle with no entry root is still found.
    pub fn has_cycle(&self) -> bool {
        let mut finished = HashSet::new();
        let mut starts = self.roots();
        let mut rest: Vec<NodeIndex> = self.graph.node_indices().collect();
        rest.sort();
        starts.extend(rest);

        for start in starts {
            if finished.contains(&start) {
                continue;
            }
            if self.walk_for_cycle(start, &[], &mut finished) {
                return true;
            }
        }
        false
    }

    /// Iterative DFS with an explicit stack and a per-path node set.
    ///
    /// `finished` holds nodes whose whole reachable set was explored without
    /// touching the path; they are skipped, which keeps the walk O(V+E)
    /// without changing the answer. Only reuse `finished` across calls that
    /// share the same `blocked` set.
    fn walk_for_cycle(
        &self,
        start: NodeIndex,
        blocked: &[NodeIndex],
        finished: &mut HashSet<NodeIndex>,
    ) -> bool {
        struct Frame {
            node: NodeIndex,
            pending: Vec<NodeIndex>,
        }

        let mut on_path: HashSet<NodeIndex> = blocked.iter().copied().collect();
        if !on_path.insert(start) {
            return true;
        }
        let mut stack = vec![Frame {
            node: start,
            pending: self.successors(start),
        }];

        while let Some(frame) = stack.last_mut() {
            let node = frame.node;
            match frame.pending.pop() {
                Some(next) => {
                    if on_path.contains(&next) {
                        log::trace!("cycle closes at {next:?} (from {node:?})");
                        return true;
                    }
                    if finished.contains(&next) {
                        continue;
                    }
                    on_path.insert(next);
                    let pending = self.successors(next);
                    stack.push(Frame {
                        node: next,
                        pending,
                    });
                }
                None => {
                    on_path.remove(&node);
                    finished.insert(node);
                    stack.pop();
                }
            }
        }
        false
    }

    fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect()
    }
}

/// AABB overlap test; rectangles that only share an edge don't overlap.
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && a.x1 > b.x0 && a.y0 < b.y1 && a.y1 > b.y0
}
