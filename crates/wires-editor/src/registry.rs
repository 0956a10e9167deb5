//! Extension registry: component factories contributed by console plugins.
//!
//! One process-wide instance is available through
//! [`ExtensionRegistry::shared`]; anything else can build its own and hand
//! clones around. Clones share the same table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock, RwLock};
use wires_core::{Pid, PortNames, WireComponent};

static SHARED: OnceLock<ExtensionRegistry> = OnceLock::new();

/// Template for components of one factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentFactory {
    pub factory_pid: String,
    #[serde(default)]
    pub input_port_count: u32,
    #[serde(default)]
    pub output_port_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_port_names: Option<PortNames>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_port_names: Option<PortNames>,
}

impl ComponentFactory {
    pub fn new(factory_pid: impl Into<String>, input_port_count: u32, output_port_count: u32) -> Self {
        Self {
            factory_pid: factory_pid.into(),
            input_port_count,
            output_port_count,
            input_port_names: None,
            output_port_names: None,
        }
    }

    /// Build a fresh, unplaced component with this factory's port schema.
    pub fn instantiate(&self, pid: Pid) -> WireComponent {
        let mut component = WireComponent::new(pid, self.input_port_count, self.output_port_count);
        component.factory_pid = Some(self.factory_pid.clone());
        component.rendering_properties.input_port_names = self.input_port_names.clone();
        component.rendering_properties.output_port_names = self.output_port_names.clone();
        component
    }
}

/// A named bundle of factories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    pub name: String,
    pub factories: Vec<ComponentFactory>,
}

#[derive(Debug, Clone, Default)]
pub struct ExtensionRegistry {
    extensions: Arc<RwLock<BTreeMap<String, Extension>>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, created on first use.
    pub fn shared() -> ExtensionRegistry {
        SHARED.get_or_init(ExtensionRegistry::new).clone()
    }

    /// Add or replace an extension. Returns the one it replaced.
    pub fn register(&self, extension: Extension) -> Option<Extension> {
        log::debug!(
            "registering extension {:?} ({} factories)",
            extension.name,
            extension.factories.len()
        );
        match self.extensions.write() {
            Ok(mut w) => w.insert(extension.name.clone(), extension),
            Err(_) => {
                log::warn!("extension registry lock poisoned");
                None
            }
        }
    }

    pub fn unregister(&self, name: &str) -> Option<Extension> {
        self.extensions.write().ok()?.remove(name)
    }

    pub fn extension_names(&self) -> Vec<String> {
        self.extensions
            .read()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Look up a factory across all extensions.
    pub fn factory(&self, factory_pid: &str) -> Option<ComponentFactory> {
        let r = self.extensions.read().ok()?;
        r.values()
            .flat_map(|ext| ext.factories.iter())
            .find(|f| f.factory_pid == factory_pid)
            .cloned()
    }

    pub fn factories(&self) -> Vec<ComponentFactory> {
        self.extensions
            .read()
            .map(|r| {
                r.values()
                    .flat_map(|ext| ext.factories.iter().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}
