//! Integration tests: cycle detection over console-built graphs (wires-core).
//!
//! Graphs are built the way the console rebuilds them after a reload: all
//! components first, then wires by pid.

use wires_core::*;

fn build(edges: &[(&str, &str)]) -> WireGraph {
    let mut g = WireGraph::default();
    for (a, b) in edges {
        for name in [a, b] {
            let pid = Pid::intern(name);
            if g.index_of(pid).is_none() {
                g.add_component(WireComponent::new(pid, 4, 4), Point::ZERO)
                    .unwrap();
            }
        }
    }
    // Each wire takes a fresh receiver port so fan-in stays legal.
    let mut next_in: std::collections::HashMap<&str, u32> = Default::default();
    for (a, b) in edges {
        let port = next_in.entry(*b).or_default();
        g.add_wire(Wire::new(Pid::intern(a), 0, Pid::intern(b), *port))
            .unwrap();
        *port += 1;
    }
    g
}

// ─── Whole-graph check ──────────────────────────────────────────────────

#[test]
fn chain_is_acyclic() {
    let g = build(&[("cd_a", "cd_b"), ("cd_b", "cd_c"), ("cd_c", "cd_d")]);
    assert!(!g.has_cycle());
}

#[test]
fn back_edge_closes_cycle() {
    let g = build(&[("cd_e", "cd_f"), ("cd_f", "cd_g"), ("cd_g", "cd_e")]);
    assert!(g.has_cycle());
}

#[test]
fn rootless_cycle_beside_acyclic_part() {
    // cd_h → cd_i is a clean root; cd_j ⇄ cd_k has no entry root at all.
    let g = build(&[("cd_h", "cd_i"), ("cd_j", "cd_k"), ("cd_k", "cd_j")]);
    assert_eq!(g.roots().len(), 1);
    assert!(g.has_cycle());
}

#[test]
fn cycle_reachable_from_root_only_through_side_branch() {
    let g = build(&[
        ("cd_r", "cd_s"),
        ("cd_r", "cd_t"),
        ("cd_t", "cd_u"),
        ("cd_u", "cd_t"),
    ]);
    assert!(g.has_cycle());
}

#[test]
fn wide_fan_out_is_acyclic() {
    let names: Vec<String> = (0..50).map(|i| format!("cd_fan{i}")).collect();
    let edges: Vec<(&str, &str)> = names
        .windows(2)
        .map(|w| (w[0].as_str(), w[1].as_str()))
        .chain(names.iter().skip(2).map(|n| ("cd_fan0", n.as_str())))
        .collect();
    let g = build(&edges);
    assert!(!g.has_cycle());
}

// ─── Candidate-edge check ───────────────────────────────────────────────

#[test]
fn candidate_edge_rejected_when_target_reaches_source() {
    let g = build(&[("cd_p", "cd_q"), ("cd_q", "cd_x")]);
    let p = g.index_of(Pid::intern("cd_p")).unwrap();
    let x = g.index_of(Pid::intern("cd_x")).unwrap();
    // x → p would close p → q → x → p
    assert!(g.has_cycles_from(p, &[x]));
    // p → x is only a shortcut
    assert!(!g.has_cycles_from(x, &[p]));
}

#[test]
fn self_target_counts_as_cycle() {
    let g = build(&[("cd_self", "cd_other")]);
    let n = g.index_of(Pid::intern("cd_self")).unwrap();
    assert!(g.has_cycles_from(n, &[n]));
}
