pub mod animation;
pub mod error;
pub mod graph;
pub mod hit;
pub mod id;
pub mod model;
pub mod parse;
pub mod viewport;

pub use animation::{TransformAnimator, TransitionFrame};
pub use error::WiresError;
pub use graph::{GraphNode, RemovedComponent, WireEdge, WireGraph};
pub use id::Pid;
pub use model::*;
pub use viewport::{ViewTransform, Viewport};

// Re-export petgraph/kurbo types so downstream crates don't need a direct dependency
pub use kurbo::{Point, Rect, Size, Vec2};
pub use petgraph::stable_graph::{EdgeIndex, NodeIndex};
