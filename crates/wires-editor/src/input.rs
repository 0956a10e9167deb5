//! Input abstraction layer.
//!
//! Pointer and native drag-and-drop events, normalized into one enum and
//! expressed in client coordinates (pixels relative to the canvas element).

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed.
    PointerDown { x: f64, y: f64 },

    /// Pointer moved (with or without a button held).
    PointerMove { x: f64, y: f64 },

    /// Pointer released.
    PointerUp { x: f64, y: f64 },

    /// External drag hovering over the canvas.
    DragOver { x: f64, y: f64 },

    /// External drag left the canvas or was aborted.
    DragLeave,

    /// External drag dropped. `attachment` is whatever payload could be
    /// extracted from the drag data.
    Drop {
        x: f64,
        y: f64,
        attachment: Option<String>,
    },
}

impl InputEvent {
    pub fn from_pointer_down(x: f64, y: f64) -> Self {
        Self::PointerDown { x, y }
    }

    pub fn from_pointer_move(x: f64, y: f64) -> Self {
        Self::PointerMove { x, y }
    }

    pub fn from_pointer_up(x: f64, y: f64) -> Self {
        Self::PointerUp { x, y }
    }
}
