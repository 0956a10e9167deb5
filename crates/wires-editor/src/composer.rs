//! The Wires Composer: owns the graph and turns input and console calls
//! into graph edits plus [`ComposerEvent`] notifications.
//!
//! Pointer handlers take client coordinates. A press on an output port
//! starts drawing a wire; a press on a connected input port picks up that
//! wire's end; a press on a component starts moving it; a press on blank
//! canvas starts panning. Releasing on a component (except at the end of a
//! wire or pan gesture) selects it.

use crate::blink::{BlinkEffect, PushChannel};
use crate::config::ComposerConfig;
use crate::drag::DragHandler;
use crate::events::{ComposerEvent, DropTicket, Listener};
use crate::input::InputEvent;
use crate::registry::ExtensionRegistry;
use crate::scroll::Scroller;
use wires_core::hit::{hit_test, hit_test_port};
use wires_core::viewport::snap_to_grid;
use wires_core::*;

/// Which component, if any, is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Idle,
    ComponentSelected(Pid),
}

/// Pointer gesture in progress.
#[derive(Debug, Clone, PartialEq, Default)]
enum Gesture {
    #[default]
    None,
    Pan,
    Move {
        node: NodeIndex,
        /// Pointer offset from the node origin, in local units.
        grab: Vec2,
    },
    Connect {
        source: NodeIndex,
        source_port: PortRef,
        pointer: Point,
    },
    Retarget {
        edge: EdgeIndex,
        pointer: Point,
    },
}

pub struct WiresComposer {
    graph: WireGraph,
    config: ComposerConfig,
    viewport: Viewport,
    transform: ViewTransform,
    animator: TransformAnimator,
    selection: Selection,
    gesture: Gesture,
    scroller: Scroller,
    drag: DragHandler,
    blink: BlinkEffect,
    registry: ExtensionRegistry,
    listener: Option<Box<dyn Listener>>,
}

impl std::fmt::Debug for WiresComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WiresComposer")
            .field("components", &self.graph.component_count())
            .field("wires", &self.graph.wire_count())
            .field("transform", &self.transform)
            .field("selection", &self.selection)
            .field("gesture", &self.gesture)
            .finish_non_exhaustive()
    }
}

impl WiresComposer {
    pub fn new(config: ComposerConfig, viewport: Viewport, registry: ExtensionRegistry) -> Self {
        let blink = BlinkEffect::new(config.blink_grace_ms, config.pulse_duration_ms);
        Self {
            graph: WireGraph::new(config.component_size.into()),
            config,
            viewport,
            transform: ViewTransform::IDENTITY,
            animator: TransformAnimator::new(),
            selection: Selection::Idle,
            gesture: Gesture::None,
            scroller: Scroller::new(),
            drag: DragHandler::new(),
            blink,
            registry,
            listener: None,
        }
    }

    /// Default configuration with the process-wide registry.
    pub fn with_viewport(viewport: Viewport) -> Self {
        Self::new(ComposerConfig::default(), viewport, ExtensionRegistry::shared())
    }

    pub fn set_listener(&mut self, listener: impl Listener + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    fn emit(&mut self, event: ComposerEvent) {
        log::trace!("notify {}", event.kind());
        if let Some(listener) = self.listener.as_mut() {
            listener.dispatch(event);
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn graph(&self) -> &WireGraph {
        &self.graph
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_running()
    }

    pub fn is_blinking_enabled(&self) -> bool {
        self.blink.is_blinking_enabled()
    }

    pub fn pulsing_edges(&self) -> Vec<EdgeIndex> {
        self.blink.pulsing_edges()
    }

    pub fn preview(&self) -> Option<NodeIndex> {
        self.drag.preview()
    }

    /// Endpoints (local coordinates) of the wire being drawn or re-targeted.
    pub fn pending_connection(&self) -> Option<(Point, Point)> {
        match &self.gesture {
            Gesture::Connect {
                source,
                source_port,
                pointer,
            } => {
                let component = self.graph.component_at(*source)?;
                let index = component.port_index(&source_port.name, PortDirection::Out).ok()?;
                let from = hit::port_anchor(&self.graph, *source, PortDirection::Out, index)?;
                Some((from, *pointer))
            }
            Gesture::Retarget { edge, pointer } => {
                let (source, _) = self.graph.edge_endpoints(*edge)?;
                let port = &self.graph.edge(*edge)?.emitter_port;
                let index = self
                    .graph
                    .component_at(source)?
                    .port_index(port, PortDirection::Out)
                    .ok()?;
                let from = hit::port_anchor(&self.graph, source, PortDirection::Out, index)?;
                Some((from, *pointer))
            }
            _ => None,
        }
    }

    // ─── Console-side edits ──────────────────────────────────────────────

    /// Place a component on the canvas.
    ///
    /// Without a stored position it goes to the grid-snapped viewport
    /// centre. If it lands on another node it is pushed right until it is
    /// clear, and the view re-centres on it. Raises one `ComponentCreated`.
    pub fn add_wire_component(&mut self, component: WireComponent) -> Option<NodeIndex> {
        let position = component.position().map(Point::from).unwrap_or_else(|| {
            self.transform
                .new_component_coords(self.viewport, self.config.grid_size)
        });
        let idx = match self.graph.add_component(component, position) {
            Ok(idx) => idx,
            Err(e) => {
                log::warn!("{e}");
                return None;
            }
        };
        let moved = self
            .graph
            .move_to_free_spot(idx, self.config.free_spot_offset);
        self.graph.refresh_rendering_position(idx);
        if moved {
            self.center_on_component(idx);
        }
        if let Some(c) = self.graph.component_at(idx).cloned() {
            self.emit(ComposerEvent::ComponentCreated(c));
        }
        Some(idx)
    }

    /// Insert a wire supplied by the console. Unknown endpoints are ignored.
    /// No notification either way.
    pub fn add_wire(&mut self, wire: Wire) -> bool {
        match self.graph.add_wire(wire) {
            Some(_) => true,
            None => {
                log::debug!("ignoring wire with unknown endpoint: {wire:?}");
                false
            }
        }
    }

    /// Remove a component and everything wired to it.
    pub fn delete_wire_component(&mut self, pid: Pid) -> bool {
        let Some(idx) = self.graph.index_of(pid) else {
            log::debug!("delete of unknown component {pid}");
            return false;
        };
        self.remove_component_node(idx)
    }

    fn remove_component_node(&mut self, idx: NodeIndex) -> bool {
        let Some(removed) = self.graph.remove_component_at(idx) else {
            return false;
        };
        self.blink.retain_existing(&self.graph);
        self.abandon_stale_gesture();

        for wire in removed.wires {
            self.emit(ComposerEvent::WireDeleted(wire));
        }
        if self.selection == Selection::ComponentSelected(removed.component.pid) {
            self.selection = Selection::Idle;
            self.emit(ComposerEvent::ComponentDeselected(removed.component.clone()));
        }
        self.emit(ComposerEvent::ComponentDeleted(removed.component));
        true
    }

    pub fn delete_wire(&mut self, wire: &Wire) -> bool {
        let Some(edge) = self.graph.find_wire(wire) else {
            return false;
        };
        self.graph.remove_edge(edge);
        self.blink.forget_edge(edge);
        self.abandon_stale_gesture();
        self.emit(ComposerEvent::WireDeleted(*wire));
        true
    }

    /// Drop everything without per-item notifications.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.selection = Selection::Idle;
        self.gesture = Gesture::None;
        // The release that would have ended the pan never reaches us now.
        if self.scroller.end() {
            self.blink.enable_blinking();
        }
        self.drag.reset();
        self.blink.clear_pulses();
    }

    pub fn set_valid(&mut self, pid: Pid, valid: bool) -> bool {
        match self.graph.set_valid(pid, valid) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("{e}");
                false
            }
        }
    }

    pub fn get_wire_component(&self, pid: Pid) -> Option<&WireComponent> {
        self.graph.component(pid)
    }

    /// Instantiate a component from a registered factory (e.g. the
    /// attachment of a drop).
    pub fn instantiate(&self, factory_pid: &str, pid: Pid) -> Option<WireComponent> {
        self.registry
            .factory(factory_pid)
            .map(|f| f.instantiate(pid))
    }

    // ─── Enumeration ─────────────────────────────────────────────────────

    pub fn check_for_cycle_existence(&self) -> bool {
        self.graph.has_cycle()
    }

    /// Visit every component with its rendering position refreshed.
    pub fn for_each_wire_component(&mut self, mut f: impl FnMut(&WireComponent)) {
        self.graph.refresh_rendering_positions();
        for c in self.graph.components() {
            f(c);
        }
    }

    pub fn for_each_wire(&mut self, mut f: impl FnMut(&Wire)) {
        self.graph.refresh_rendering_positions();
        for w in self.graph.wires() {
            f(w);
        }
    }

    pub fn snapshot(&mut self) -> GraphSnapshot {
        self.graph.snapshot()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn get_selected_wire_component(&self) -> Option<&WireComponent> {
        match self.selection {
            Selection::ComponentSelected(pid) => self.graph.component(pid),
            Selection::Idle => None,
        }
    }

    pub fn select_wire_component(&mut self, pid: Pid) -> bool {
        let Some(component) = self.graph.component(pid).cloned() else {
            return false;
        };
        if self.selection == Selection::ComponentSelected(pid) {
            return true;
        }
        self.deselect_wire_component();
        self.selection = Selection::ComponentSelected(pid);
        self.emit(ComposerEvent::ComponentSelected(component));
        true
    }

    pub fn deselect_wire_component(&mut self) {
        let Selection::ComponentSelected(pid) = std::mem::take(&mut self.selection) else {
            return;
        };
        if let Some(component) = self.graph.component(pid).cloned() {
            self.emit(ComposerEvent::ComponentDeselected(component));
        }
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = Viewport::new(width, height);
    }

    pub fn zoom_in(&mut self) -> bool {
        self.zoom(self.config.zoom_in_factor)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.zoom(self.config.zoom_out_factor)
    }

    fn zoom(&mut self, factor: f64) -> bool {
        let target = self.transform.scaled_about_center(factor, self.viewport);
        self.animate_to(target, self.config.zoom_duration_ms)
    }

    /// Fit all components in view. No-op on an empty canvas.
    pub fn fit_content(&mut self, animated: bool) -> bool {
        let Some(bounds) = self.graph.content_bounds() else {
            return false;
        };
        let Some(target) = ViewTransform::fit_content(bounds, self.viewport) else {
            return false;
        };
        if animated {
            self.animate_to(target, self.config.fit_duration_ms)
        } else {
            self.set_transform(target);
            true
        }
    }

    fn center_on_component(&mut self, idx: NodeIndex) {
        let Some(bounds) = self.graph.bounds(idx) else {
            return;
        };
        let scale = self.transform.scale.max(1.0);
        let target = ViewTransform::centered_on(bounds.center(), scale, self.viewport);
        self.animate_to(target, self.config.center_duration_ms);
    }

    /// Apply a transform immediately, cancelling any running transition.
    pub fn set_transform(&mut self, transform: ViewTransform) {
        if self.animator.cancel() {
            self.blink.enable_blinking();
        }
        self.transform = transform;
    }

    /// Start an animated transition. Dropped if one is already running.
    pub fn animate_to(&mut self, target: ViewTransform, duration_ms: f64) -> bool {
        if !self.animator.request(self.transform, target, duration_ms) {
            return false;
        }
        self.blink.disable_blinking();
        true
    }

    /// Per-frame callback.
    pub fn tick(&mut self, now_ms: f64) {
        if let Some(frame) = self.animator.tick(now_ms) {
            self.transform = frame.transform;
            if frame.finished {
                self.blink.enable_blinking();
            }
        }
        self.blink.tick(now_ms, &self.graph);
    }

    // ─── Live activity ───────────────────────────────────────────────────

    pub fn set_push_channel(&mut self, channel: Box<dyn PushChannel>) {
        self.blink.set_channel(channel);
    }

    pub fn enable_live_activity(&mut self, session: &str) -> bool {
        self.blink.enable_live_activity(session)
    }

    pub fn disable_live_activity(&mut self) {
        self.blink.disable_live_activity();
    }

    pub fn is_live(&self) -> bool {
        self.blink.is_live()
    }

    // ─── Drag and drop ───────────────────────────────────────────────────

    fn snapped_local(&self, client: Point) -> Point {
        snap_to_grid(self.transform.client_to_local(client), self.config.grid_size)
    }

    pub fn drag_over(&mut self, client: Point) -> bool {
        let position = self.snapped_local(client);
        self.drag.move_preview(&mut self.graph, position)
    }

    pub fn drag_leave(&mut self) -> bool {
        self.drag.cancel_preview(&mut self.graph)
    }

    pub fn drop_at(&mut self, client: Point, attachment: Option<&str>) -> Option<DropTicket> {
        let position = self.snapped_local(client);
        let event = self.drag.drop_at(&mut self.graph, attachment, position)?;
        let ticket = event.ticket();
        self.emit(ComposerEvent::Drop(event));
        Some(ticket)
    }

    /// Resolve a drop with the console's component, placed at the drop
    /// position.
    pub fn complete_drop(&mut self, ticket: DropTicket, mut component: WireComponent) -> Option<NodeIndex> {
        let Some(pending) = self.drag.take_pending(ticket) else {
            log::debug!("ignoring completion of unknown drop {ticket:?}");
            return None;
        };
        component.rendering_properties.position = Some(pending.position.into());
        self.add_wire_component(component)
    }

    pub fn cancel_drop(&mut self, ticket: DropTicket) -> bool {
        let cancelled = self.drag.take_pending(ticket).is_some();
        if !cancelled {
            log::debug!("ignoring cancel of unknown drop {ticket:?}");
        }
        cancelled
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    /// Route a normalized input event.
    pub fn handle(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerDown { x, y } => self.pointer_down(Point::new(*x, *y)),
            InputEvent::PointerMove { x, y } => self.pointer_move(Point::new(*x, *y)),
            InputEvent::PointerUp { x, y } => self.pointer_up(Point::new(*x, *y)),
            InputEvent::DragOver { x, y } => {
                self.drag_over(Point::new(*x, *y));
            }
            InputEvent::DragLeave => {
                self.drag_leave();
            }
            InputEvent::Drop { x, y, attachment } => {
                self.drop_at(Point::new(*x, *y), attachment.as_deref());
            }
        }
    }

    pub fn pointer_down(&mut self, client: Point) {
        let local = self.transform.client_to_local(client);

        if let Some((node, port)) = hit_test_port(&self.graph, local, self.config.port_radius) {
            match port.direction {
                PortDirection::Out => {
                    log::trace!("start wire from {node:?}:{}", port.name);
                    self.gesture = Gesture::Connect {
                        source: node,
                        source_port: port,
                        pointer: local,
                    };
                    return;
                }
                PortDirection::In => {
                    if let Some(edge) = self.graph.incoming_to_port(node, &port.name) {
                        log::trace!("pick up wire {edge:?}");
                        self.gesture = Gesture::Retarget {
                            edge,
                            pointer: local,
                        };
                        return;
                    }
                }
            }
        }

        if let Some(node) = hit_test(&self.graph, local) {
            let origin = self.graph.position(node).unwrap_or(local);
            self.gesture = Gesture::Move {
                node,
                grab: local - origin,
            };
            return;
        }

        self.blink.disable_blinking();
        self.scroller.begin();
        self.gesture = Gesture::Pan;
        self.deselect_wire_component();
    }

    pub fn pointer_move(&mut self, client: Point) {
        let local = self.transform.client_to_local(client);
        if let Gesture::Connect { pointer, .. } | Gesture::Retarget { pointer, .. } =
            &mut self.gesture
        {
            *pointer = local;
            return;
        }
        match self.gesture {
            Gesture::Pan => {
                if let Some(delta) = self.scroller.on_move(client) {
                    // Blinking stays off until the pan ends.
                    self.animator.cancel();
                    self.transform = self.transform.translated(delta);
                }
            }
            Gesture::Move { node, grab } => {
                let target = snap_to_grid(local - grab, self.config.grid_size);
                if self.graph.set_position(node, target) {
                    self.graph.refresh_rendering_position(node);
                    if let Some(c) = self.graph.component_at(node).cloned() {
                        self.emit(ComposerEvent::ComponentChanged(c));
                    }
                }
            }
            _ => {}
        }
    }

    pub fn pointer_up(&mut self, client: Point) {
        let local = self.transform.client_to_local(client);
        match std::mem::take(&mut self.gesture) {
            Gesture::None => {}
            Gesture::Pan => {
                self.scroller.end();
                self.blink.enable_blinking();
            }
            Gesture::Move { node, .. } => {
                if let Some(pid) = self.graph.component_at(node).map(|c| c.pid) {
                    self.select_wire_component(pid);
                }
            }
            Gesture::Connect {
                source,
                source_port,
                ..
            } => self.finish_connection(source, &source_port, local),
            Gesture::Retarget { edge, .. } => self.finish_retarget(edge, local),
        }
    }

    fn finish_connection(&mut self, source: NodeIndex, source_port: &PortRef, local: Point) {
        let target = hit_test_port(&self.graph, local, self.config.port_radius);
        let target_ref = target.as_ref().map(|(n, p)| (*n, p));
        if !self.validate_connection(source, source_port, target_ref, None) {
            log::debug!("connection from {source:?}:{} rejected", source_port.name);
            return;
        }
        let Some((target, target_port)) = target else {
            return;
        };
        if let Some(edge) = self
            .graph
            .connect(source, &source_port.name, target, &target_port.name)
        {
            self.commit_edge(edge);
        }
    }

    fn finish_retarget(&mut self, edge: EdgeIndex, local: Point) {
        let Some((source, current)) = self.graph.edge_endpoints(edge) else {
            return;
        };
        let Some(data) = self.graph.edge(edge) else {
            return;
        };
        let source_port = PortRef {
            direction: PortDirection::Out,
            name: data.emitter_port.clone(),
        };
        let current_port = data.receiver_port.clone();

        let target = hit_test_port(&self.graph, local, self.config.port_radius);
        if let Some((node, port)) = &target
            && *node == current
            && port.direction == PortDirection::In
            && port.name == current_port
        {
            return;
        }
        let target_ref = target.as_ref().map(|(n, p)| (*n, p));
        if !self.validate_connection(source, &source_port, target_ref, Some(edge)) {
            log::debug!("re-target of {edge:?} rejected; keeping previous end");
            return;
        }
        let Some((node, port)) = target else {
            return;
        };
        self.blink.forget_edge(edge);
        if let Some(new_edge) = self.graph.retarget(edge, node, &port.name) {
            self.commit_edge(new_edge);
        }
    }

    /// Whether a wire from `source_port` on `source` may end at `target`.
    ///
    /// `moving` is the edge being re-targeted, which does not count against
    /// the single-incoming rule.
    pub fn validate_connection(
        &self,
        source: NodeIndex,
        source_port: &PortRef,
        target: Option<(NodeIndex, &PortRef)>,
        moving: Option<EdgeIndex>,
    ) -> bool {
        if source_port.direction == PortDirection::In {
            return false;
        }
        let Some((target, target_port)) = target else {
            return false;
        };
        if source == target {
            return false;
        }
        if target_port.direction != PortDirection::In {
            return false;
        }
        if let Some(existing) = self.graph.incoming_to_port(target, &target_port.name)
            && Some(existing) != moving
        {
            return false;
        }
        !self.graph.has_cycles_from(target, &[source])
    }

    /// Attach the resolved wire to an edge and announce it.
    fn commit_edge(&mut self, edge: EdgeIndex) {
        let Some(wire) = self.graph.resolve_wire(edge) else {
            log::warn!("could not resolve wire for edge {edge:?}");
            return;
        };
        let Some(data) = self.graph.edge_mut(edge) else {
            return;
        };
        let existed = data.wire.replace(wire).is_some();
        if existed {
            self.emit(ComposerEvent::WireChanged(wire));
        } else {
            self.emit(ComposerEvent::WireCreated(wire));
        }
    }

    fn abandon_stale_gesture(&mut self) {
        let stale = match &self.gesture {
            Gesture::Move { node, .. } => self.graph.node(*node).is_none(),
            Gesture::Connect { source, .. } => self.graph.node(*source).is_none(),
            Gesture::Retarget { edge, .. } => self.graph.edge(*edge).is_none(),
            Gesture::None | Gesture::Pan => false,
        };
        if stale {
            self.gesture = Gesture::None;
        }
    }
}
