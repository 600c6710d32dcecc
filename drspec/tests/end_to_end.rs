//! End-to-end scenario tests exercising `Engine` the way a CLI or agent
//! integration would: through its public, envelope-wrapped operations only.

use std::path::Path;

use drspec::Engine;
use drspec_core::types::{AgentTag, ArtifactStatus, QueueReason, QueueStatus};

fn write_file(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn new_scan_new_function_queues_with_priority_and_pops_to_processing() {
    let engine = Engine::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.py", "def f(x):\n    return x+1\n");

    let report = engine.scan_directory(dir.path(), false, &[]).data.unwrap();
    assert_eq!(report.functions_scanned, 1);
    assert_eq!(report.queued.len(), 1);
    let function_id = &report.queued[0];

    let artifact = engine.repository().get_artifact(function_id).unwrap().unwrap();
    assert_eq!(artifact.status, ArtifactStatus::Pending);

    let entry = engine.repository().queue_get(function_id).unwrap().unwrap();
    assert_eq!(entry.priority, 100);
    assert_eq!(entry.reason, QueueReason::New);
    assert_eq!(entry.attempts, 0);
    assert_eq!(entry.status, QueueStatus::Pending);

    let popped = engine.repository().queue_pop().unwrap().unwrap();
    assert_eq!(popped.function_id, *function_id);
    assert_eq!(popped.attempts, 1);
    assert_eq!(popped.status, QueueStatus::Processing);
}

#[test]
fn whitespace_only_reformat_does_not_requeue() {
    let engine = Engine::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.py", "def f(x):\n    return x+1\n");

    let first = engine.scan_directory(dir.path(), false, &[]).data.unwrap();
    assert_eq!(first.queued.len(), 1);
    let function_id = first.queued[0].clone();
    let before = engine.repository().get_artifact(&function_id).unwrap().unwrap();

    // Reindented and padded with a blank line, but token-for-token identical.
    write_file(dir.path(), "a.py", "def f(x):\n\n        return x+1   \n");
    let second = engine.scan_directory(dir.path(), false, &[]).data.unwrap();
    assert!(second.queued.is_empty());

    let after = engine.repository().get_artifact(&function_id).unwrap().unwrap();
    assert_eq!(after.code_hash, before.code_hash);
    assert_eq!(after.status, before.status);
}

#[test]
fn semantic_edit_on_verified_function_goes_stale_and_requeues() {
    let engine = Engine::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.py", "def f(x):\n    return x+1\n");

    let first = engine.scan_directory(dir.path(), false, &[]).data.unwrap();
    let function_id = first.queued[0].clone();

    let contract = r#"{
        "function_signature": "def f(x):",
        "intent_summary": "Adds one to the input.",
        "invariants": [
            {"name": "increments", "logic": "f(x) == x + 1", "criticality": "HIGH", "on_fail": "error"}
        ]
    }"#;
    let saved = engine.save_contract(&function_id, contract, 90.0, None, None);
    assert!(saved.success, "{:?}", saved.error);
    let verified = engine.repository().get_artifact(&function_id).unwrap().unwrap();
    assert_eq!(verified.status, ArtifactStatus::Verified);
    let h1 = verified.code_hash.clone();

    write_file(dir.path(), "a.py", "def f(x):\n    return x-1\n");
    let second = engine.scan_directory(dir.path(), false, &[]).data.unwrap();
    assert_eq!(second.queued, vec![function_id.clone()]);

    let stale = engine.repository().get_artifact(&function_id).unwrap().unwrap();
    assert_eq!(stale.status, ArtifactStatus::Stale);
    assert_ne!(stale.code_hash, h1);

    let entry = engine.repository().queue_get(&function_id).unwrap().unwrap();
    assert_eq!(entry.reason, QueueReason::HashMismatch);
}

#[test]
fn contract_save_preserves_trace_and_closes_queue_entry() {
    let engine = Engine::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.py", "def f(x):\n    return x+1\n");

    let first = engine.scan_directory(dir.path(), false, &[]).data.unwrap();
    let function_id = first.queued[0].clone();

    engine.repository().queue_pop().unwrap();
    engine
        .repository()
        .add_reasoning_trace(&function_id, AgentTag::Proposer, r#"{"step":1}"#)
        .unwrap();

    let contract = r#"{
        "function_signature": "def f(x):",
        "intent_summary": "Adds one to the input.",
        "invariants": [
            {"name": "increments", "logic": "f(x) == x + 1", "criticality": "HIGH", "on_fail": "error"}
        ]
    }"#;
    let saved = engine.save_contract(&function_id, contract, 85.0, None, None);
    assert!(saved.success, "{:?}", saved.error);
    let data = saved.data.unwrap();
    assert_eq!(data.adjusted_confidence, 85.0);

    let view = engine.get_contract(&function_id).data.unwrap().unwrap();
    assert_eq!(view.confidence_display, 85.0);

    let artifact = engine.repository().get_artifact(&function_id).unwrap().unwrap();
    assert_eq!(artifact.status, ArtifactStatus::Verified);

    let entry = engine.repository().queue_get(&function_id).unwrap().unwrap();
    assert_eq!(entry.status, QueueStatus::Completed);

    let traces = engine.repository().reasoning_traces_for(&function_id).unwrap();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].payload, r#"{"step":1}"#);
}

#[test]
fn dependency_graph_with_cycle_reports_all_edges_flagged() {
    let engine = Engine::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "cyc.py",
        "def a():\n    pass\n\n\ndef b():\n    pass\n\n\ndef c():\n    pass\n",
    );
    let scan = engine.scan_directory(dir.path(), false, &[]).data.unwrap();
    assert_eq!(scan.functions_scanned, 3);

    let repo = engine.repository();
    repo.add_dependency("cyc.py::a", "cyc.py::b").unwrap();
    repo.add_dependency("cyc.py::b", "cyc.py::c").unwrap();
    repo.add_dependency("cyc.py::c", "cyc.py::a").unwrap();

    let response = engine.dependency_graph(
        "cyc.py::a",
        3,
        drspec_analysis::graph::Direction::Callees,
    );
    assert!(response.success);
    let graph = response.data.unwrap();
    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.edges.len(), 3);
    assert!(graph.has_cycles);
    assert!(graph.edges.iter().any(|e| e.is_cycle));
}

#[test]
fn bug_fix_mining_classifies_commit_and_suggests_invariant() {
    let engine = Engine::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "x.py", "def f(x):\n    return x.value\n");
    let scan = engine.scan_directory(dir.path(), false, &[]).data.unwrap();
    let function_id = scan.queued[0].clone();

    let post_image = "def f(x):\n    if x is None:\n        return None\n    return x.value\n";
    let diff_text =
        "--- a/x.py\n+++ b/x.py\n@@ -1,2 +1,4 @@\n def f(x):\n+    if x is None:\n+        return None\n     return x.value\n";

    let report = engine.mine_diff(
        "deadbeef",
        "Fix #42: guard null input",
        diff_text,
        |path| if path.ends_with("x.py") { Some(post_image.to_string()) } else { None },
    );
    assert!(report.success, "{:?}", report.error);
    let data = report.data.unwrap();
    assert!(data.bug_fix_score >= 0.6, "score was {}", data.bug_fix_score);
    assert_eq!(data.patterns_found, 1);
    assert!(data.suggestion_count >= 1);
    assert_eq!(data.events_recorded, 1);

    let rollup = engine.repository().learning_rollup_for(&function_id).unwrap();
    assert_eq!(rollup.patterns_seen, 1);
    assert!(rollup.invariants_added >= 1);
}
