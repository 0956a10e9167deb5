//! Frame-driven transform transitions.
//!
//! The host calls [`TransformAnimator::tick`] once per frame with a
//! monotonic timestamp. The first tick after a request marks its start.
//! Only one transition runs at a time: requests made while one is running
//! are dropped.

use crate::viewport::ViewTransform;

/// One step of a running transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionFrame {
    /// Transform to apply this frame.
    pub transform: ViewTransform,
    /// `true` on the frame that reaches the target.
    pub finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Transition {
    from: ViewTransform,
    to: ViewTransform,
    duration_ms: f64,
    started_at: Option<f64>,
}

/// Drives at most one linear transform transition.
#[derive(Debug, Clone, Default)]
pub struct TransformAnimator {
    active: Option<Transition>,
}

impl TransformAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Target of the running transition, if any.
    pub fn target(&self) -> Option<ViewTransform> {
        self.active.map(|t| t.to)
    }

    /// Start a transition from `from` to `to`. Returns `false` (and changes
    /// nothing) when another transition is still running.
    pub fn request(&mut self, from: ViewTransform, to: ViewTransform, duration_ms: f64) -> bool {
        if self.active.is_some() {
            log::debug!("transition already running; dropping request to {to:?}");
            return false;
        }
        log::trace!("transition {from:?} -> {to:?} over {duration_ms}ms");
        self.active = Some(Transition {
            from,
            to,
            duration_ms: duration_ms.max(0.0),
            started_at: None,
        });
        true
    }

    /// Abandon the running transition where it stands.
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }

    /// Advance to `now_ms`. Returns `None` when idle.
    pub fn tick(&mut self, now_ms: f64) -> Option<TransitionFrame> {
        let transition = self.active.as_mut()?;
        let start = *transition.started_at.get_or_insert(now_ms);
        let elapsed = now_ms - start;

        let progress = if transition.duration_ms <= 0.0 {
            1.0
        } else {
            (elapsed / transition.duration_ms).clamp(0.0, 1.0)
        };

        let finished = progress >= 1.0;
        let transform = if finished {
            transition.to
        } else {
            transition.from.lerp(&transition.to, progress)
        };
        if finished {
            self.active = None;
        }
        Some(TransitionFrame {
            transform,
            finished,
        })
    }
}
