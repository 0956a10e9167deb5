pub mod blink;
pub mod composer;
pub mod config;
pub mod drag;
pub mod events;
pub mod input;
pub mod registry;
pub mod scroll;

pub use blink::{BlinkEffect, PushChannel};
pub use composer::{Selection, WiresComposer};
pub use config::ComposerConfig;
pub use events::{ComposerEvent, DropEvent, DropTicket, Listener};
pub use input::InputEvent;
pub use registry::{ComponentFactory, Extension, ExtensionRegistry};
