//! Viewport transform: pan + uniform zoom between client and canvas space.
//!
//! Client coordinates are pixels relative to the canvas element; local
//! coordinates are the canvas-space positions stored on nodes.
//! `client = local * scale + translation`.

use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Visible canvas size in client pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Translation plus uniform scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub tx: f64,
    pub ty: f64,
    pub scale: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        tx: 0.0,
        ty: 0.0,
        scale: 1.0,
    };

    pub const fn new(tx: f64, ty: f64, scale: f64) -> Self {
        Self { tx, ty, scale }
    }

    pub fn translation(&self) -> Vec2 {
        Vec2::new(self.tx, self.ty)
    }

    /// Local → client.
    pub fn affine(&self) -> Affine {
        Affine::translate(self.translation()) * Affine::scale(self.scale)
    }

    pub fn client_to_local(&self, client: Point) -> Point {
        Point::new(
            (client.x - self.tx) / self.scale,
            (client.y - self.ty) / self.scale,
        )
    }

    pub fn local_to_client(&self, local: Point) -> Point {
        self.affine() * local
    }

    /// Shift by a client-space delta.
    #[must_use]
    pub fn translated(&self, delta: Vec2) -> Self {
        Self::new(self.tx + delta.x, self.ty + delta.y, self.scale)
    }

    /// Multiply the scale by `factor`, keeping the viewport centre fixed.
    #[must_use]
    pub fn scaled_about_center(&self, factor: f64, viewport: Viewport) -> Self {
        let center = viewport.center();
        let anchor = self.client_to_local(center);
        Self::centered_on(anchor, self.scale * factor, viewport)
    }

    /// Transform that shows `local` at the viewport centre with `scale`.
    pub fn centered_on(local: Point, scale: f64, viewport: Viewport) -> Self {
        let center = viewport.center();
        Self::new(center.x - local.x * scale, center.y - local.y * scale, scale)
    }

    /// Transform that centres `content` and fits it in the viewport, never
    /// zooming past 1.0. `None` for degenerate content or viewport.
    pub fn fit_content(content: Rect, viewport: Viewport) -> Option<Self> {
        if content.width() <= 0.0
            || content.height() <= 0.0
            || viewport.width <= 0.0
            || viewport.height <= 0.0
        {
            return None;
        }
        let scale = (viewport.width / content.width())
            .min(viewport.height / content.height())
            .min(1.0);
        Some(Self::centered_on(content.center(), scale, viewport))
    }

    /// Linear interpolation; `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn lerp(&self, to: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self::new(
            self.tx + (to.tx - self.tx) * t,
            self.ty + (to.ty - self.ty) * t,
            self.scale + (to.scale - self.scale) * t,
        )
    }

    /// Where a component without a stored position goes: the viewport centre
    /// in local coordinates, snapped to the grid.
    pub fn new_component_coords(&self, viewport: Viewport, grid: f64) -> Point {
        snap_to_grid(self.client_to_local(viewport.center()), grid)
    }
}

/// Floor a local point onto the grid. A non-positive grid disables snapping.
pub fn snap_to_grid(p: Point, grid: f64) -> Point {
    if grid <= 0.0 {
        return p;
    }
    Point::new((p.x / grid).floor() * grid, (p.y / grid).floor() * grid)
}
