//! Notifications raised to the console.
//!
//! Every structural edit becomes one `ComposerEvent`, delivered synchronously
//! through a single [`Listener::dispatch`] in the order the edits happen.

use wires_core::{Point, Wire, WireComponent};

/// Handle for a drop waiting on the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DropTicket(pub u64);

/// A drop of an external payload onto the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct DropEvent {
    attachment: String,
    ticket: DropTicket,
    position: Point,
}

impl DropEvent {
    pub(crate) fn new(attachment: String, ticket: DropTicket, position: Point) -> Self {
        Self {
            attachment,
            ticket,
            position,
        }
    }

    /// The dropped payload, typically a factory pid.
    pub fn attachment(&self) -> &str {
        &self.attachment
    }

    /// Pass to `complete_drop` / `cancel_drop`.
    pub fn ticket(&self) -> DropTicket {
        self.ticket
    }

    /// Grid-snapped canvas-local drop position.
    pub fn position(&self) -> Point {
        self.position
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComposerEvent {
    ComponentCreated(WireComponent),
    ComponentChanged(WireComponent),
    ComponentDeleted(WireComponent),
    ComponentSelected(WireComponent),
    ComponentDeselected(WireComponent),
    WireCreated(Wire),
    WireChanged(Wire),
    WireDeleted(Wire),
    Drop(DropEvent),
}

impl ComposerEvent {
    /// Stable camelCase name, used at the JS boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ComponentCreated(_) => "componentCreated",
            Self::ComponentChanged(_) => "componentChanged",
            Self::ComponentDeleted(_) => "componentDeleted",
            Self::ComponentSelected(_) => "componentSelected",
            Self::ComponentDeselected(_) => "componentDeselected",
            Self::WireCreated(_) => "wireCreated",
            Self::WireChanged(_) => "wireChanged",
            Self::WireDeleted(_) => "wireDeleted",
            Self::Drop(_) => "drop",
        }
    }

    pub fn component(&self) -> Option<&WireComponent> {
        match self {
            Self::ComponentCreated(c)
            | Self::ComponentChanged(c)
            | Self::ComponentDeleted(c)
            | Self::ComponentSelected(c)
            | Self::ComponentDeselected(c) => Some(c),
            _ => None,
        }
    }

    pub fn wire(&self) -> Option<&Wire> {
        match self {
            Self::WireCreated(w) | Self::WireChanged(w) | Self::WireDeleted(w) => Some(w),
            _ => None,
        }
    }
}

/// Receiver of composer notifications.
pub trait Listener {
    fn dispatch(&mut self, event: ComposerEvent);
}

impl<F: FnMut(ComposerEvent)> Listener for F {
    fn dispatch(&mut self, event: ComposerEvent) {
        self(event)
    }
}
