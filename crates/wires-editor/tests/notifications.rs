//! Integration tests: console-facing notifications (wires-editor).
//!
//! Drives the composer through its public API and pointer handlers and
//! checks the exact notification stream the console would see.

use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use wires_core::*;
use wires_editor::*;

const VIEWPORT: Viewport = Viewport {
    width: 800.0,
    height: 600.0,
};

type Log = Rc<RefCell<Vec<ComposerEvent>>>;

fn make_composer() -> (WiresComposer, Log) {
    let mut composer = WiresComposer::new(ComposerConfig::default(), VIEWPORT, ExtensionRegistry::new());
    let log: Log = Rc::default();
    let sink = log.clone();
    composer.set_listener(move |e: ComposerEvent| sink.borrow_mut().push(e));
    (composer, log)
}

fn kinds(log: &Log) -> Vec<&'static str> {
    log.borrow().iter().map(ComposerEvent::kind).collect()
}

fn pid(s: &str) -> Pid {
    Pid::intern(s)
}

/// a(0,0) out0 → b(200,0) in0/out0; c(0,200) out0; d(200,200) in0.
fn make_wired() -> (WiresComposer, Log) {
    let (mut composer, log) = make_composer();
    composer.add_wire_component(WireComponent::new(pid("n_a"), 0, 1).at(0.0, 0.0));
    composer.add_wire_component(WireComponent::new(pid("n_b"), 1, 1).at(200.0, 0.0));
    composer.add_wire_component(WireComponent::new(pid("n_c"), 0, 1).at(0.0, 200.0));
    composer.add_wire_component(WireComponent::new(pid("n_d"), 1, 0).at(200.0, 200.0));
    assert!(composer.add_wire(Wire::new(pid("n_a"), 0, pid("n_b"), 0)));
    log.borrow_mut().clear();
    (composer, log)
}

fn drag(composer: &mut WiresComposer, from: (f64, f64), to: (f64, f64)) {
    composer.pointer_down(Point::new(from.0, from.1));
    composer.pointer_move(Point::new((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0));
    composer.pointer_move(Point::new(to.0, to.1));
    composer.pointer_up(Point::new(to.0, to.1));
}

// ─── Component lifecycle ────────────────────────────────────────────────

#[test]
fn add_raises_exactly_one_created() {
    let (mut composer, log) = make_composer();
    composer.add_wire_component(WireComponent::new(pid("n_one"), 1, 1).at(40.0, 60.0));
    assert_eq!(kinds(&log), vec!["componentCreated"]);
    let created = log.borrow()[0].component().cloned().unwrap();
    assert_eq!(created.position(), Some(Position::new(40.0, 60.0)));
}

#[test]
fn unplaced_component_lands_on_snapped_center() {
    let (mut composer, log) = make_composer();
    composer.set_transform(ViewTransform::new(5.0, 5.0, 1.0));
    composer.add_wire_component(WireComponent::new(pid("n_center"), 0, 0));
    let created = log.borrow()[0].component().cloned().unwrap();
    assert_eq!(created.position(), Some(Position::new(380.0, 280.0)));
}

#[test]
fn overlapping_insertion_moves_right_and_recenters() {
    let (mut composer, log) = make_composer();
    composer.add_wire_component(WireComponent::new(pid("n_first"), 0, 0).at(0.0, 0.0));
    assert!(!composer.is_animating());
    composer.add_wire_component(WireComponent::new(pid("n_second"), 0, 0).at(0.0, 0.0));

    assert_eq!(kinds(&log), vec!["componentCreated", "componentCreated"]);
    let placed = log.borrow()[1].component().cloned().unwrap();
    assert_eq!(placed.position(), Some(Position::new(100.0, 0.0)));

    assert!(composer.is_animating());
    composer.tick(0.0);
    composer.tick(500.0);
    assert!(!composer.is_animating());
    assert_eq!(composer.transform(), ViewTransform::new(260.0, 260.0, 1.0));
}

#[test]
fn duplicate_pid_is_ignored() {
    let (mut composer, log) = make_composer();
    composer.add_wire_component(WireComponent::new(pid("n_dup"), 0, 0).at(0.0, 0.0));
    assert!(
        composer
            .add_wire_component(WireComponent::new(pid("n_dup"), 0, 0).at(300.0, 0.0))
            .is_none()
    );
    assert_eq!(kinds(&log), vec!["componentCreated"]);
    assert_eq!(composer.graph().component_count(), 1);
}

#[test]
fn deletion_cascades_wires_first() {
    let (mut composer, log) = make_composer();
    composer.add_wire_component(WireComponent::new(pid("n_hub"), 2, 2).at(200.0, 0.0));
    for (i, name) in ["n_in0", "n_in1"].iter().enumerate() {
        composer.add_wire_component(WireComponent::new(pid(name), 0, 1).at(0.0, 200.0 * i as f64));
        composer.add_wire(Wire::new(pid(name), 0, pid("n_hub"), i as u32));
    }
    composer.add_wire_component(WireComponent::new(pid("n_out"), 1, 0).at(400.0, 0.0));
    composer.add_wire(Wire::new(pid("n_hub"), 1, pid("n_out"), 0));
    assert_eq!(composer.graph().wire_count(), 3);
    log.borrow_mut().clear();

    assert!(composer.delete_wire_component(pid("n_hub")));
    assert_eq!(
        kinds(&log),
        vec!["wireDeleted", "wireDeleted", "wireDeleted", "componentDeleted"]
    );
    assert_eq!(composer.graph().wire_count(), 0);
    assert_eq!(composer.graph().component_count(), 3);
    assert!(!composer.delete_wire_component(pid("n_hub")));
}

#[test]
fn clear_is_silent() {
    let (mut composer, log) = make_wired();
    composer.clear();
    assert!(kinds(&log).is_empty());
    assert_eq!(composer.graph().component_count(), 0);
    assert_eq!(composer.graph().wire_count(), 0);
}

#[test]
fn for_each_refreshes_positions() {
    let (mut composer, _log) = make_wired();
    let mut seen = Vec::new();
    composer.for_each_wire_component(|c| seen.push((c.pid, c.position())));
    assert_eq!(seen[1], (pid("n_b"), Some(Position::new(200.0, 0.0))));
    let mut wires = Vec::new();
    composer.for_each_wire(|w| wires.push(*w));
    assert_eq!(wires, vec![Wire::new(pid("n_a"), 0, pid("n_b"), 0)]);
    assert_eq!(composer.snapshot().components.len(), 4);
}

// ─── Console wires ──────────────────────────────────────────────────────

#[test]
fn stale_wire_changes_nothing() {
    let (mut composer, log) = make_wired();
    let before = (composer.graph().component_count(), composer.graph().graph.edge_count());
    assert!(!composer.add_wire(Wire::new(pid("n_missing"), 0, pid("n_b"), 0)));
    let after = (composer.graph().component_count(), composer.graph().graph.edge_count());
    assert_eq!(before, after);
    assert!(kinds(&log).is_empty());
}

#[test]
fn console_wire_is_silent_and_delete_wire_is_not() {
    let (mut composer, log) = make_wired();
    let wire = Wire::new(pid("n_c"), 0, pid("n_d"), 0);
    assert!(composer.add_wire(wire));
    assert!(kinds(&log).is_empty());

    assert!(composer.delete_wire(&wire));
    assert_eq!(kinds(&log), vec!["wireDeleted"]);
    assert!(!composer.delete_wire(&wire));
}

#[test]
fn console_may_introduce_cycle_which_check_reports() {
    let (mut composer, _log) = make_wired();
    assert!(!composer.check_for_cycle_existence());
    composer.add_wire_component(WireComponent::new(pid("n_loop"), 1, 1).at(400.0, 0.0));
    composer.add_wire(Wire::new(pid("n_b"), 0, pid("n_loop"), 0));
    composer.add_wire(Wire::new(pid("n_loop"), 0, pid("n_b"), 0));
    assert!(composer.check_for_cycle_existence());
}

// ─── Interactive wiring ─────────────────────────────────────────────────

#[test]
fn drawing_a_wire_raises_created() {
    let (mut composer, log) = make_wired();
    // c.out0 (80,240) → d.in0 (200,240)
    drag(&mut composer, (80.0, 240.0), (201.0, 241.0));
    assert_eq!(kinds(&log), vec!["wireCreated"]);
    assert_eq!(
        log.borrow()[0].wire().copied(),
        Some(Wire::new(pid("n_c"), 0, pid("n_d"), 0))
    );
    assert_eq!(composer.graph().wire_count(), 2);
}

#[test]
fn wire_that_would_close_a_cycle_is_rejected() {
    let (mut composer, log) = make_composer();
    for (i, name) in ["n_x", "n_y", "n_z"].iter().enumerate() {
        composer.add_wire_component(WireComponent::new(pid(name), 1, 1).at(200.0 * i as f64, 0.0));
    }
    composer.add_wire(Wire::new(pid("n_x"), 0, pid("n_y"), 0));
    composer.add_wire(Wire::new(pid("n_y"), 0, pid("n_z"), 0));
    log.borrow_mut().clear();

    let x = composer.graph().index_of(pid("n_x")).unwrap();
    let z = composer.graph().index_of(pid("n_z")).unwrap();
    let out0 = PortRef {
        direction: PortDirection::Out,
        name: "out0".into(),
    };
    let in0 = PortRef {
        direction: PortDirection::In,
        name: "in0".into(),
    };
    assert!(!composer.validate_connection(z, &out0, Some((x, &in0)), None));

    // z.out0 (480,40) → x.in0 (0,40)
    drag(&mut composer, (480.0, 40.0), (0.0, 40.0));
    assert!(kinds(&log).is_empty());
    assert_eq!(composer.graph().graph.edge_count(), 2);
    assert!(!composer.check_for_cycle_existence());
}

#[test]
fn validator_rules() {
    let (composer, _log) = make_wired();
    let g = composer.graph();
    let a = g.index_of(pid("n_a")).unwrap();
    let b = g.index_of(pid("n_b")).unwrap();
    let d = g.index_of(pid("n_d")).unwrap();
    let out0 = PortRef {
        direction: PortDirection::Out,
        name: "out0".into(),
    };
    let in0 = PortRef {
        direction: PortDirection::In,
        name: "in0".into(),
    };

    // source is an input port
    assert!(!composer.validate_connection(b, &in0, Some((d, &in0)), None));
    // self loop
    assert!(!composer.validate_connection(b, &out0, Some((b, &in0)), None));
    // no target / target is an output
    assert!(!composer.validate_connection(b, &out0, None, None));
    assert!(!composer.validate_connection(a, &out0, Some((b, &out0)), None));
    // b.in0 already has a → b
    assert!(!composer.validate_connection(a, &out0, Some((b, &in0)), None));
    let existing = g.incoming_to_port(b, "in0");
    assert!(composer.validate_connection(a, &out0, Some((b, &in0)), existing));
    // fine
    assert!(composer.validate_connection(b, &out0, Some((d, &in0)), None));
}

#[test]
fn dropping_a_wire_on_blank_canvas_creates_nothing() {
    let (mut composer, log) = make_wired();
    drag(&mut composer, (80.0, 240.0), (600.0, 500.0));
    assert!(kinds(&log).is_empty());
    assert_eq!(composer.graph().wire_count(), 1);
}

#[test]
fn retargeting_raises_changed() {
    let (mut composer, log) = make_wired();
    // pick up a → b at b.in0 (200,40), drop on d.in0 (200,240)
    drag(&mut composer, (200.0, 40.0), (200.0, 240.0));
    assert_eq!(kinds(&log), vec!["wireChanged"]);
    assert_eq!(
        log.borrow()[0].wire().copied(),
        Some(Wire::new(pid("n_a"), 0, pid("n_d"), 0))
    );
    let wires: Vec<Wire> = composer.graph().wires().copied().collect();
    assert_eq!(wires, vec![Wire::new(pid("n_a"), 0, pid("n_d"), 0)]);
}

#[test]
fn retarget_released_off_target_reverts() {
    let (mut composer, log) = make_wired();
    drag(&mut composer, (200.0, 40.0), (600.0, 500.0));
    drag(&mut composer, (200.0, 40.0), (201.0, 40.0));
    assert!(kinds(&log).is_empty());
    let wires: Vec<Wire> = composer.graph().wires().copied().collect();
    assert_eq!(wires, vec![Wire::new(pid("n_a"), 0, pid("n_b"), 0)]);
}

// ─── Moving ─────────────────────────────────────────────────────────────

#[test]
fn moving_reports_each_grid_step_once_then_selects() {
    let (mut composer, log) = make_wired();
    composer.pointer_down(Point::new(20.0, 20.0));
    composer.pointer_move(Point::new(65.0, 20.0));
    composer.pointer_move(Point::new(70.0, 25.0));
    composer.pointer_up(Point::new(70.0, 25.0));

    assert_eq!(kinds(&log), vec!["componentChanged", "componentSelected"]);
    let moved = log.borrow()[0].component().cloned().unwrap();
    assert_eq!(moved.position(), Some(Position::new(40.0, 0.0)));
}

// ─── Listener and validity ──────────────────────────────────────────────

#[test]
fn cleared_listener_hears_nothing() {
    let (mut composer, log) = make_wired();
    composer.clear_listener();
    composer.add_wire_component(WireComponent::new(pid("n_quiet"), 1, 1).at(400.0, 400.0));
    composer.delete_wire_component(pid("n_a"));
    assert!(log.borrow().is_empty());
    assert_eq!(composer.graph().component_count(), 4);
}

#[test]
fn validity_flag_is_silent_and_needs_a_known_pid() {
    let (mut composer, log) = make_wired();
    assert!(composer.set_valid(pid("n_b"), false));
    assert!(!composer.get_wire_component(pid("n_b")).unwrap().is_valid());
    assert!(!composer.set_valid(pid("n_never_added"), false));
    assert!(log.borrow().is_empty());
}
