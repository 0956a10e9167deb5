//! External drag-and-drop onto the canvas.
//!
//! While a palette entry is dragged over the canvas a transient preview
//! node follows the (grid-snapped) pointer. Dropping discards the preview
//! and opens a ticket; the console resolves it later with the real
//! component or cancels it.

use crate::events::{DropEvent, DropTicket};
use std::collections::HashMap;
use wires_core::{NodeIndex, Point, WireGraph};

/// A drop awaiting the console.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDrop {
    pub attachment: String,
    pub position: Point,
}

#[derive(Debug, Default)]
pub struct DragHandler {
    preview: Option<NodeIndex>,
    pending: HashMap<DropTicket, PendingDrop>,
    next_ticket: u64,
}

impl DragHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preview(&self) -> Option<NodeIndex> {
        self.preview
    }

    /// Create the preview or move it to `position`. Returns `true` if the
    /// graph changed.
    pub fn move_preview(&mut self, graph: &mut WireGraph, position: Point) -> bool {
        match self.preview {
            Some(idx) if graph.node(idx).is_some() => graph.set_position(idx, position),
            _ => {
                self.preview = Some(graph.add_preview(position));
                true
            }
        }
    }

    /// Drag left the canvas: drop the preview, nothing else.
    pub fn cancel_preview(&mut self, graph: &mut WireGraph) -> bool {
        self.preview
            .take()
            .is_some_and(|idx| graph.remove_preview(idx))
    }

    /// Finish the gesture at `position`. A missing or blank attachment
    /// yields no event.
    pub fn drop_at(
        &mut self,
        graph: &mut WireGraph,
        attachment: Option<&str>,
        position: Point,
    ) -> Option<DropEvent> {
        self.cancel_preview(graph);

        let Some(attachment) = attachment.map(str::trim).filter(|a| !a.is_empty()) else {
            log::warn!("drop without a usable attachment ignored");
            return None;
        };

        let ticket = DropTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending.insert(
            ticket,
            PendingDrop {
                attachment: attachment.to_string(),
                position,
            },
        );
        log::debug!("drop {ticket:?} of {attachment:?} at {position:?}");
        Some(DropEvent::new(attachment.to_string(), ticket, position))
    }

    /// Resolve a ticket. `None` for unknown or already-resolved tickets.
    pub fn take_pending(&mut self, ticket: DropTicket) -> Option<PendingDrop> {
        self.pending.remove(&ticket)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Forget the preview and every open ticket. The graph is cleared by
    /// the caller.
    pub fn reset(&mut self) {
        self.preview = None;
        self.pending.clear();
    }
}
