//! Live activity overlay.
//!
//! The gateway pushes one short message every time a component emits data:
//! either the bare component id or `"<componentId> <portName>"`. Each
//! message pulses the wires leaving that component (or that port) for a
//! short while. Pulses are suppressed while the user pans or the view is
//! animating, and resume after a grace period.

use std::collections::HashMap;
use wires_core::parse::parse_push_message;
use wires_core::{EdgeIndex, Pid, WireGraph, WiresError};

/// Server push stream keyed by a session id.
pub trait PushChannel {
    /// Open the stream. Implementations that cannot run in the current
    /// environment return [`WiresError::ChannelUnavailable`].
    fn open(&mut self, session: &str) -> Result<(), WiresError>;

    /// Close the stream and send a best-effort logout.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Drain messages received since the last poll.
    fn poll(&mut self) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Grace {
    started_at: Option<f64>,
}

pub struct BlinkEffect {
    channel: Option<Box<dyn PushChannel>>,
    blinking: bool,
    grace: Option<Grace>,
    grace_ms: f64,
    pulse_duration_ms: f64,
    /// Edge → expiry timestamp.
    pulses: HashMap<EdgeIndex, f64>,
}

impl std::fmt::Debug for BlinkEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlinkEffect")
            .field("live", &self.is_live())
            .field("blinking", &self.blinking)
            .field("grace", &self.grace)
            .field("pulses", &self.pulses.len())
            .finish()
    }
}

impl BlinkEffect {
    pub fn new(grace_ms: f64, pulse_duration_ms: f64) -> Self {
        Self {
            channel: None,
            blinking: true,
            grace: None,
            grace_ms,
            pulse_duration_ms,
            pulses: HashMap::new(),
        }
    }

    /// Install the push transport, closing any previous one.
    pub fn set_channel(&mut self, channel: Box<dyn PushChannel>) {
        if let Some(mut old) = self.channel.replace(channel)
            && old.is_open()
        {
            old.close();
        }
    }

    // ─── Channel lifecycle ───────────────────────────────────────────────

    /// Open the push stream for `session`. Re-enabling an open stream is a
    /// no-op. Returns whether the stream is open afterwards.
    pub fn enable_live_activity(&mut self, session: &str) -> bool {
        let Some(channel) = self.channel.as_mut() else {
            log::info!("no push channel available; live activity disabled");
            return false;
        };
        if channel.is_open() {
            return true;
        }
        match channel.open(session) {
            Ok(()) => {
                log::info!("live activity enabled");
                true
            }
            Err(e) => {
                log::info!("live activity unavailable: {e}");
                false
            }
        }
    }

    pub fn disable_live_activity(&mut self) {
        if let Some(channel) = self.channel.as_mut()
            && channel.is_open()
        {
            channel.close();
            log::info!("live activity disabled");
        }
        self.pulses.clear();
    }

    pub fn is_live(&self) -> bool {
        self.channel.as_ref().is_some_and(|c| c.is_open())
    }

    // ─── Suppression ─────────────────────────────────────────────────────

    /// Stop pulsing immediately and cancel any pending re-enable.
    pub fn disable_blinking(&mut self) {
        self.blinking = false;
        self.grace = None;
        self.pulses.clear();
    }

    /// Resume pulsing once the grace period has elapsed. The period starts
    /// at the next tick.
    pub fn enable_blinking(&mut self) {
        if self.blinking || self.grace.is_some() {
            return;
        }
        self.grace = Some(Grace { started_at: None });
    }

    pub fn is_blinking_enabled(&self) -> bool {
        self.blinking
    }

    // ─── Pulses ──────────────────────────────────────────────────────────

    /// Advance timers, expire pulses, and drain the push stream.
    pub fn tick(&mut self, now_ms: f64, graph: &WireGraph) {
        if let Some(grace) = self.grace.as_mut() {
            let start = *grace.started_at.get_or_insert(now_ms);
            if now_ms - start >= self.grace_ms {
                self.grace = None;
                self.blinking = true;
                log::trace!("blinking resumed");
            }
        }

        self.pulses.retain(|_, expires| *expires > now_ms);

        let messages = match self.channel.as_mut() {
            Some(channel) if channel.is_open() => channel.poll(),
            _ => return,
        };
        for message in messages {
            self.on_message(&message, now_ms, graph);
        }
    }

    fn on_message(&mut self, message: &str, now_ms: f64, graph: &WireGraph) {
        if !self.blinking {
            log::trace!("blinking suppressed; dropping {message:?}");
            return;
        }
        let parsed = match parse_push_message(message) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::debug!("{e}");
                return;
            }
        };
        let Some(pid) = Pid::lookup(parsed.component) else {
            return;
        };
        let Some(emitter) = graph.index_of(pid) else {
            return;
        };
        let expires = now_ms + self.pulse_duration_ms;
        for edge in graph.outgoing_from(emitter, parsed.port) {
            self.pulses.insert(edge, expires);
        }
    }

    pub fn is_pulsing(&self, edge: EdgeIndex) -> bool {
        self.pulses.contains_key(&edge)
    }

    /// Currently pulsing edges, in index order.
    pub fn pulsing_edges(&self) -> Vec<EdgeIndex> {
        let mut edges: Vec<EdgeIndex> = self.pulses.keys().copied().collect();
        edges.sort();
        edges
    }

    pub fn forget_edge(&mut self, edge: EdgeIndex) {
        self.pulses.remove(&edge);
    }

    /// Drop pulses on edges that no longer exist.
    pub fn retain_existing(&mut self, graph: &WireGraph) {
        self.pulses.retain(|edge, _| graph.edge(*edge).is_some());
    }

    pub fn clear_pulses(&mut self) {
        self.pulses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wires_core::{Point, Wire, WireComponent};

    #[derive(Default)]
    struct Shared {
        open: bool,
        opened: u32,
        closed: u32,
        inbox: Vec<String>,
    }

    struct FakeChannel(Rc<RefCell<Shared>>);

    impl PushChannel for FakeChannel {
        fn open(&mut self, _session: &str) -> Result<(), WiresError> {
            let mut s = self.0.borrow_mut();
            s.open = true;
            s.opened += 1;
            Ok(())
        }
        fn close(&mut self) {
            let mut s = self.0.borrow_mut();
            s.open = false;
            s.closed += 1;
        }
        fn is_open(&self) -> bool {
            self.0.borrow().open
        }
        fn poll(&mut self) -> Vec<String> {
            std::mem::take(&mut self.0.borrow_mut().inbox)
        }
    }

    fn graph() -> (WireGraph, EdgeIndex, EdgeIndex) {
        let mut g = WireGraph::default();
        let mut src = WireComponent::new(Pid::intern("bl_src"), 0, 2);
        src.rendering_properties.output_port_names =
            Some(smallvec::smallvec!["then".to_string(), "else".to_string()]);
        g.add_component(src, Point::ZERO).unwrap();
        g.add_component(WireComponent::new(Pid::intern("bl_dst"), 2, 0), Point::ZERO)
            .unwrap();
        let e0 = g
            .add_wire(Wire::new(Pid::intern("bl_src"), 0, Pid::intern("bl_dst"), 0))
            .unwrap();
        let e1 = g
            .add_wire(Wire::new(Pid::intern("bl_src"), 1, Pid::intern("bl_dst"), 1))
            .unwrap();
        (g, e0, e1)
    }

    fn effect() -> (BlinkEffect, Rc<RefCell<Shared>>) {
        let shared = Rc::new(RefCell::new(Shared::default()));
        let mut fx = BlinkEffect::new(1000.0, 400.0);
        fx.set_channel(Box::new(FakeChannel(shared.clone())));
        (fx, shared)
    }

    #[test]
    fn enable_opens_exactly_once() {
        let (mut fx, shared) = effect();
        assert!(fx.enable_live_activity("s1"));
        assert!(fx.enable_live_activity("s1"));
        assert_eq!(shared.borrow().opened, 1);
        fx.disable_live_activity();
        assert_eq!(shared.borrow().closed, 1);
        assert!(!fx.is_live());
    }

    #[test]
    fn no_channel_is_a_noop() {
        let mut fx = BlinkEffect::new(1000.0, 400.0);
        assert!(!fx.enable_live_activity("s1"));
        let (g, _, _) = graph();
        fx.tick(0.0, &g);
        assert!(fx.pulsing_edges().is_empty());
    }

    #[test]
    fn legacy_message_pulses_all_outputs_then_expires() {
        let (g, e0, e1) = graph();
        let (mut fx, shared) = effect();
        fx.enable_live_activity("s1");
        shared.borrow_mut().inbox.push("bl_src".into());
        fx.tick(100.0, &g);
        assert_eq!(fx.pulsing_edges(), vec![e0, e1]);
        fx.tick(499.0, &g);
        assert!(fx.is_pulsing(e0));
        fx.tick(500.0, &g);
        assert!(fx.pulsing_edges().is_empty());
    }

    #[test]
    fn extended_message_pulses_one_port() {
        let (g, _, e1) = graph();
        let (mut fx, shared) = effect();
        fx.enable_live_activity("s1");
        shared.borrow_mut().inbox.push("bl_src else".into());
        shared.borrow_mut().inbox.push("bl_src too many parts".into());
        shared.borrow_mut().inbox.push("bl_unknown".into());
        fx.tick(0.0, &g);
        assert_eq!(fx.pulsing_edges(), vec![e1]);
    }

    #[test]
    fn suppressed_messages_are_dropped_until_grace_elapses() {
        let (g, e0, _) = graph();
        let (mut fx, shared) = effect();
        fx.enable_live_activity("s1");

        fx.disable_blinking();
        fx.enable_blinking();
        shared.borrow_mut().inbox.push("bl_src then".into());
        fx.tick(2000.0, &g);
        assert!(fx.pulsing_edges().is_empty());

        fx.tick(2999.0, &g);
        assert!(!fx.is_blinking_enabled());
        fx.tick(3000.0, &g);
        assert!(fx.is_blinking_enabled());

        shared.borrow_mut().inbox.push("bl_src then".into());
        fx.tick(3001.0, &g);
        assert_eq!(fx.pulsing_edges(), vec![e0]);
    }
}
