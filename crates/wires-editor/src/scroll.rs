//! Canvas panning.
//!
//! Tracks a pointer drag that started on blank canvas. The first move only
//! records where the pointer is; every later move yields the delta since
//! the previous one.

use wires_core::{Point, Vec2};

#[derive(Debug, Clone, Default)]
pub struct Scroller {
    active: bool,
    last: Option<Point>,
}

impl Scroller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) {
        log::trace!("pan begin");
        self.active = true;
        self.last = None;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Feed a pointer position; returns the client-space delta to apply.
    pub fn on_move(&mut self, client: Point) -> Option<Vec2> {
        if !self.active {
            return None;
        }
        let delta = self.last.map(|last| client - last);
        self.last = Some(client);
        delta.filter(|d| *d != Vec2::ZERO)
    }

    /// End the gesture. Returns `true` if one was running.
    pub fn end(&mut self) -> bool {
        let was_active = self.active;
        if was_active {
            log::trace!("pan end");
        }
        self.active = false;
        self.last = None;
        was_active
    }
}
