//! WASM bridge for the Wires Composer: exposes the graph-editing engine to
//! the browser administration console.
//!
//! Components and wires cross the boundary as JSON strings. Notifications
//! reach JS through one listener function called as
//! `listener(kind, payloadJson)`.

mod event_source;

pub use event_source::{EventSourceChannel, session_url};

use serde_json::json;
use wasm_bindgen::prelude::*;
use wires_core::{PortDirection, Pid, Point, Viewport, Wire, WireComponent};
use wires_editor::{
    ComposerConfig, ComposerEvent, DropTicket, Extension, ExtensionRegistry, InputEvent,
    WiresComposer,
};

/// The JS-facing composer handle.
#[wasm_bindgen]
pub struct WiresCanvas {
    composer: WiresComposer,
}

#[wasm_bindgen]
impl WiresCanvas {
    /// Create a composer for a canvas of the given client size.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        init_logging();
        Self {
            composer: WiresComposer::with_viewport(Viewport::new(width, height)),
        }
    }

    /// Create a composer with a JSON configuration (see `ComposerConfig`).
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(width: f64, height: f64, config_json: &str) -> Result<WiresCanvas, JsError> {
        init_logging();
        let config = ComposerConfig::from_json(config_json)?;
        Ok(Self {
            composer: WiresComposer::new(
                config,
                Viewport::new(width, height),
                ExtensionRegistry::shared(),
            ),
        })
    }

    /// Install the notification callback `(kind, payloadJson) => void`.
    #[wasm_bindgen(js_name = setListener)]
    pub fn set_listener(&mut self, callback: js_sys::Function) {
        self.composer.set_listener(move |event: ComposerEvent| {
            let kind = JsValue::from_str(event.kind());
            let payload = JsValue::from_str(&event_payload(&event));
            if let Err(e) = callback.call2(&JsValue::NULL, &kind, &payload) {
                log::warn!("listener threw: {e:?}");
            }
        });
    }

    // ─── Console edits ───────────────────────────────────────────────────

    #[wasm_bindgen(js_name = addWireComponent)]
    pub fn add_wire_component(&mut self, component_json: &str) -> bool {
        match serde_json::from_str::<WireComponent>(component_json) {
            Ok(component) => self.composer.add_wire_component(component).is_some(),
            Err(e) => {
                log::warn!("bad component JSON: {e}");
                false
            }
        }
    }

    #[wasm_bindgen(js_name = addWire)]
    pub fn add_wire(&mut self, wire_json: &str) -> bool {
        parse_wire(wire_json).is_some_and(|w| self.composer.add_wire(w))
    }

    #[wasm_bindgen(js_name = deleteWireComponent)]
    pub fn delete_wire_component(&mut self, pid: &str) -> bool {
        // A pid that was never interned cannot be on the canvas.
        Pid::lookup(pid).is_some_and(|pid| self.composer.delete_wire_component(pid))
    }

    #[wasm_bindgen(js_name = deleteWire)]
    pub fn delete_wire(&mut self, wire_json: &str) -> bool {
        parse_wire(wire_json).is_some_and(|w| self.composer.delete_wire(&w))
    }

    pub fn clear(&mut self) {
        self.composer.clear();
    }

    #[wasm_bindgen(js_name = setValid)]
    pub fn set_valid(&mut self, pid: &str, valid: bool) -> bool {
        Pid::lookup(pid).is_some_and(|pid| self.composer.set_valid(pid, valid))
    }

    /// Register a console extension (`{ name, factories: [...] }`).
    #[wasm_bindgen(js_name = registerExtension)]
    pub fn register_extension(&mut self, extension_json: &str) -> Result<(), JsError> {
        let extension: Extension = serde_json::from_str(extension_json)?;
        self.composer.registry().register(extension);
        Ok(())
    }

    #[wasm_bindgen(js_name = unregisterExtension)]
    pub fn unregister_extension(&mut self, name: &str) -> bool {
        self.composer.registry().unregister(name).is_some()
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    #[wasm_bindgen(js_name = checkForCycleExistence)]
    pub fn check_for_cycle_existence(&self) -> bool {
        self.composer.check_for_cycle_existence()
    }

    /// All components as a JSON array, positions refreshed.
    #[wasm_bindgen(js_name = getWireComponents)]
    pub fn wire_components(&mut self) -> String {
        let mut out = Vec::new();
        self.composer.for_each_wire_component(|c| out.push(c.clone()));
        to_json(&out)
    }

    #[wasm_bindgen(js_name = getWires)]
    pub fn wires(&mut self) -> String {
        let mut out = Vec::new();
        self.composer.for_each_wire(|w| out.push(*w));
        to_json(&out)
    }

    pub fn snapshot(&mut self) -> String {
        to_json(&self.composer.snapshot())
    }

    #[wasm_bindgen(js_name = getSelectedWireComponent)]
    pub fn selected_wire_component(&self) -> Option<String> {
        self.composer.get_selected_wire_component().map(to_json)
    }

    #[wasm_bindgen(js_name = deselectWireComponent)]
    pub fn deselect_wire_component(&mut self) {
        self.composer.deselect_wire_component();
    }

    /// Current view transform as `{ tx, ty, scale }`.
    #[wasm_bindgen(js_name = getTransform)]
    pub fn transform(&self) -> String {
        to_json(&self.composer.transform())
    }

    /// Render state for the host: node boxes, wire endpoints, pulses and the
    /// wire being drawn, all in canvas-local coordinates.
    #[wasm_bindgen(js_name = getSceneJson)]
    pub fn scene_json(&self) -> String {
        scene_json(&self.composer)
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    pub fn resize(&mut self, width: f64, height: f64) {
        self.composer.resize(width, height);
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) -> bool {
        self.composer.zoom_in()
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) -> bool {
        self.composer.zoom_out()
    }

    #[wasm_bindgen(js_name = fitContent)]
    pub fn fit_content(&mut self, animated: bool) -> bool {
        self.composer.fit_content(animated)
    }

    /// Per-frame callback; pass the `requestAnimationFrame` timestamp.
    pub fn tick(&mut self, now_ms: f64) {
        self.composer.tick(now_ms);
    }

    // ─── Pointer and drag input ──────────────────────────────────────────

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.composer.handle(&InputEvent::from_pointer_down(x, y));
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.composer.handle(&InputEvent::from_pointer_move(x, y));
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, x: f64, y: f64) {
        self.composer.handle(&InputEvent::from_pointer_up(x, y));
    }

    #[wasm_bindgen(js_name = dragOver)]
    pub fn drag_over(&mut self, x: f64, y: f64) {
        self.composer.handle(&InputEvent::DragOver { x, y });
    }

    #[wasm_bindgen(js_name = dragLeave)]
    pub fn drag_leave(&mut self) {
        self.composer.handle(&InputEvent::DragLeave);
    }

    /// Returns the drop ticket, or `undefined` if the payload was unusable.
    #[wasm_bindgen(js_name = drop)]
    pub fn drop_at(&mut self, x: f64, y: f64, attachment: Option<String>) -> Option<f64> {
        self.composer
            .drop_at(Point::new(x, y), attachment.as_deref())
            .map(|t| t.0 as f64)
    }

    #[wasm_bindgen(js_name = completeDrop)]
    pub fn complete_drop(&mut self, ticket: f64, component_json: &str) -> bool {
        let component = match serde_json::from_str::<WireComponent>(component_json) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("bad component JSON for drop: {e}");
                return false;
            }
        };
        self.composer
            .complete_drop(DropTicket(ticket as u64), component)
            .is_some()
    }

    #[wasm_bindgen(js_name = cancelDrop)]
    pub fn cancel_drop(&mut self, ticket: f64) -> bool {
        self.composer.cancel_drop(DropTicket(ticket as u64))
    }

    // ─── Live activity ───────────────────────────────────────────────────

    /// Open the push stream at `streamUrl?session=<id>`. On disable, a
    /// best-effort GET to `logoutUrl?session=<id>` is sent.
    #[wasm_bindgen(js_name = enableLiveActivity)]
    pub fn enable_live_activity(
        &mut self,
        stream_url: &str,
        logout_url: Option<String>,
        session: &str,
    ) -> bool {
        if !self.composer.is_live() {
            self.composer
                .set_push_channel(Box::new(EventSourceChannel::new(stream_url, logout_url)));
        }
        self.composer.enable_live_activity(session)
    }

    #[wasm_bindgen(js_name = disableLiveActivity)]
    pub fn disable_live_activity(&mut self) {
        self.composer.disable_live_activity();
    }
}

// ─── JSON helpers ────────────────────────────────────────────────────────

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::warn!("serialization failed: {e}");
        "null".to_string()
    })
}

fn parse_wire(json: &str) -> Option<Wire> {
    serde_json::from_str(json)
        .map_err(|e| log::warn!("bad wire JSON: {e}"))
        .ok()
}

/// JSON payload handed to the JS listener alongside the event kind.
fn event_payload(event: &ComposerEvent) -> String {
    match event {
        ComposerEvent::ComponentCreated(c)
        | ComposerEvent::ComponentChanged(c)
        | ComposerEvent::ComponentDeleted(c)
        | ComposerEvent::ComponentSelected(c)
        | ComposerEvent::ComponentDeselected(c) => to_json(c),
        ComposerEvent::WireCreated(w) | ComposerEvent::WireChanged(w) | ComposerEvent::WireDeleted(w) => {
            to_json(w)
        }
        ComposerEvent::Drop(d) => json!({
            "attachment": d.attachment(),
            "ticket": d.ticket().0,
            "x": d.position().x,
            "y": d.position().y,
        })
        .to_string(),
    }
}

fn scene_json(composer: &WiresComposer) -> String {
    let graph = composer.graph();
    let pulsing = composer.pulsing_edges();

    let nodes: Vec<_> = graph
        .graph
        .node_indices()
        .filter_map(|idx| {
            let node = graph.node(idx)?;
            let b = graph.bounds(idx)?;
            Some(match node.component() {
                Some(c) => json!({
                    "pid": c.pid,
                    "x": b.x0, "y": b.y0, "width": b.width(), "height": b.height(),
                    "inputs": c.port_names(PortDirection::In),
                    "outputs": c.port_names(PortDirection::Out),
                    "valid": c.valid,
                }),
                None => json!({
                    "preview": true,
                    "x": b.x0, "y": b.y0, "width": b.width(), "height": b.height(),
                }),
            })
        })
        .collect();

    let wires: Vec<_> = graph
        .graph
        .edge_indices()
        .filter_map(|e| {
            let (from, to) = graph.edge_endpoints(e)?;
            let data = graph.edge(e)?;
            Some(json!({
                "from": graph.component_at(from)?.pid,
                "fromPort": data.emitter_port,
                "to": graph.component_at(to)?.pid,
                "toPort": data.receiver_port,
                "pulsing": pulsing.contains(&e),
            }))
        })
        .collect();

    let pending = composer
        .pending_connection()
        .map(|(a, b)| json!({ "x0": a.x, "y0": a.y, "x1": b.x, "y1": b.y }));

    json!({
        "transform": composer.transform(),
        "nodes": nodes,
        "wires": wires,
        "pendingConnection": pending,
    })
    .to_string()
}

/// Route panics and `log` output to the browser console, once.
fn init_logging() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            console_error_panic_hook::set_once();
            if console_log::init_with_level(log::Level::Info).is_err() {
                web_sys::console::warn_1(&"logger already installed".into());
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn composer() -> WiresComposer {
        let mut c = WiresComposer::new(
            ComposerConfig::default(),
            Viewport::new(800.0, 600.0),
            ExtensionRegistry::new(),
        );
        c.add_wire_component(WireComponent::new(Pid::intern("w_a"), 0, 1).at(0.0, 0.0));
        c.add_wire_component(WireComponent::new(Pid::intern("w_b"), 1, 0).at(200.0, 0.0));
        c.add_wire(Wire::new(Pid::intern("w_a"), 0, Pid::intern("w_b"), 0));
        c
    }

    #[test]
    fn component_payload_is_console_json() {
        let event = ComposerEvent::ComponentCreated(WireComponent::new(Pid::intern("w_p"), 1, 2));
        let v: Value = serde_json::from_str(&event_payload(&event)).unwrap();
        assert_eq!(v["pid"], "w_p");
        assert_eq!(v["outputPortCount"], 2);
    }

    #[test]
    fn wire_json_parses() {
        let w = parse_wire(
            r#"{"emitterPid":"w_a","emitterPort":0,"receiverPid":"w_b","receiverPort":0}"#,
        )
        .unwrap();
        assert_eq!(w, Wire::new(Pid::intern("w_a"), 0, Pid::intern("w_b"), 0));
        assert!(parse_wire("{}").is_none());
    }

    #[test]
    fn scene_lists_nodes_and_wires() {
        let c = composer();
        let v: Value = serde_json::from_str(&scene_json(&c)).unwrap();
        assert_eq!(v["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(v["wires"][0]["from"], "w_a");
        assert_eq!(v["wires"][0]["toPort"], "in0");
        assert_eq!(v["wires"][0]["pulsing"], false);
        assert!(v["pendingConnection"].is_null());
        assert_eq!(v["transform"]["scale"], 1.0);
    }

    #[test]
    fn pointer_input_selects_and_pans() {
        let mut canvas = WiresCanvas::new(800.0, 600.0);
        assert!(canvas.add_wire_component(
            r#"{"pid":"w_click","inputPortCount":1,"outputPortCount":1,"renderingProperties":{"position":{"x":0.0,"y":0.0}}}"#
        ));
        canvas.pointer_down(20.0, 20.0);
        canvas.pointer_up(20.0, 20.0);
        let selected: Value =
            serde_json::from_str(&canvas.selected_wire_component().unwrap()).unwrap();
        assert_eq!(selected["pid"], "w_click");

        canvas.pointer_down(600.0, 500.0);
        canvas.pointer_move(600.0, 500.0);
        canvas.pointer_move(630.0, 510.0);
        canvas.pointer_up(630.0, 510.0);
        assert!(canvas.selected_wire_component().is_none());
        let t: Value = serde_json::from_str(&canvas.transform()).unwrap();
        assert_eq!(t["tx"], 30.0);
        assert_eq!(t["ty"], 10.0);
    }
}
