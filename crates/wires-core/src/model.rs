//! Data model for the wiring graph.
//!
//! A `WireComponent` is one configured processing stage; a `Wire` connects
//! an output port of one component to an input port of another. Both are
//! value objects owned by the console; the graph only holds copies.
//! Field names follow the console's camelCase JSON.

use crate::error::WiresError;
use crate::id::Pid;
use crate::parse::parse_canonical_port_name;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ─── Ports ───────────────────────────────────────────────────────────────

/// Which side of a component a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    In,
    Out,
}

impl PortDirection {
    /// Prefix of canonical port names in this direction.
    pub const fn as_str(self) -> &'static str {
        match self {
            PortDirection::In => "in",
            PortDirection::Out => "out",
        }
    }
}

/// A named port on some node, as reported by hit testing ("magnet").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRef {
    pub direction: PortDirection,
    pub name: String,
}

// ─── Rendering properties ────────────────────────────────────────────────

/// Canvas-local position of a component's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<kurbo::Point> for Position {
    fn from(p: kurbo::Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<Position> for kurbo::Point {
    fn from(p: Position) -> Self {
        kurbo::Point::new(p.x, p.y)
    }
}

/// Port names are short lists; most components have one or two ports.
pub type PortNames = SmallVec<[String; 4]>;

/// Display hints the console persists alongside a component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderingProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_port_names: Option<PortNames>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_port_names: Option<PortNames>,
}

impl RenderingProperties {
    fn port_names(&self, direction: PortDirection) -> Option<&PortNames> {
        match direction {
            PortDirection::In => self.input_port_names.as_ref(),
            PortDirection::Out => self.output_port_names.as_ref(),
        }
    }
}

// ─── Components ──────────────────────────────────────────────────────────

/// One node of the wiring graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireComponent {
    pub pid: Pid,
    /// Factory the component was instantiated from, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_pid: Option<String>,
    #[serde(default)]
    pub input_port_count: u32,
    #[serde(default)]
    pub output_port_count: u32,
    #[serde(default)]
    pub rendering_properties: RenderingProperties,
    /// Display-only validity flag ("configuration is invalid").
    #[serde(default = "default_valid")]
    pub valid: bool,
}

fn default_valid() -> bool {
    true
}

impl WireComponent {
    pub fn new(pid: Pid, input_port_count: u32, output_port_count: u32) -> Self {
        Self {
            pid,
            factory_pid: None,
            input_port_count,
            output_port_count,
            rendering_properties: RenderingProperties::default(),
            valid: true,
        }
    }

    /// Builder-style helper to pin the component at a position.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.rendering_properties.position = Some(Position::new(x, y));
        self
    }

    pub fn position(&self) -> Option<Position> {
        self.rendering_properties.position
    }

    pub fn port_count(&self, direction: PortDirection) -> u32 {
        match direction {
            PortDirection::In => self.input_port_count,
            PortDirection::Out => self.output_port_count,
        }
    }

    /// Name of the port at `index`. Explicit names win; otherwise the
    /// canonical `"in"+index` / `"out"+index` form is used.
    pub fn port_name(&self, index: u32, direction: PortDirection) -> String {
        self.rendering_properties
            .port_names(direction)
            .and_then(|names| names.get(index as usize))
            .filter(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("{}{index}", direction.as_str()))
    }

    /// Index of the port called `name`: explicit names are searched first,
    /// then the canonical form is parsed.
    pub fn port_index(&self, name: &str, direction: PortDirection) -> Result<u32, WiresError> {
        if let Some(names) = self.rendering_properties.port_names(direction)
            && let Some(pos) = names.iter().position(|n| n == name)
        {
            return Ok(pos as u32);
        }
        parse_canonical_port_name(name, direction)
    }

    /// All port names in the given direction, in index order.
    pub fn port_names(&self, direction: PortDirection) -> Vec<String> {
        (0..self.port_count(direction))
            .map(|i| self.port_name(i, direction))
            .collect()
    }

    pub fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

// ─── Wires ───────────────────────────────────────────────────────────────

/// A directed, port-addressed connection between two components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wire {
    pub emitter_pid: Pid,
    pub emitter_port: u32,
    pub receiver_pid: Pid,
    pub receiver_port: u32,
}

impl Wire {
    pub fn new(emitter_pid: Pid, emitter_port: u32, receiver_pid: Pid, receiver_port: u32) -> Self {
        Self {
            emitter_pid,
            emitter_port,
            receiver_pid,
            receiver_port,
        }
    }
}

// ─── Graph nodes ─────────────────────────────────────────────────────────

/// The node kinds that can live on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A real component, mirrored from the console.
    Component(WireComponent),
    /// Placeholder following the pointer during an external drag gesture.
    TransientPreview,
}

impl NodeKind {
    pub fn as_component(&self) -> Option<&WireComponent> {
        match self {
            NodeKind::Component(c) => Some(c),
            NodeKind::TransientPreview => None,
        }
    }

    pub fn as_component_mut(&mut self) -> Option<&mut WireComponent> {
        match self {
            NodeKind::Component(c) => Some(c),
            NodeKind::TransientPreview => None,
        }
    }
}

// ─── Snapshot ────────────────────────────────────────────────────────────

/// Everything the console needs to persist the current graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub components: Vec<WireComponent>,
    pub wires: Vec<Wire>,
}
