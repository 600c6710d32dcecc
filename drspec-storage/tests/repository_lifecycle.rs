//! Exercises the repository's cross-entity lifecycle directly — artifact
//! upsert, queueing, and contract upsert — without going through the
//! `drspec` facade.

use drspec_core::types::{ArtifactStatus, Language, QueueReason, QueueStatus};
use drspec_storage::{NewArtifact, Repository, SubmittedContract};

fn seed(repo: &Repository, function_id: &str, body: &str) {
    let new = NewArtifact {
        function_id,
        file_path: "a.py",
        short_name: "f",
        qualified_name: "f",
        signature: "def f(x):",
        body,
        code_hash: &format!("hash-of-{body}"),
        language: Language::Python,
        start_line: 1,
        end_line: 2,
        parent: None,
    };
    assert!(repo.upsert_artifact(&new).unwrap());
}

#[test]
fn a_second_upsert_with_an_unchanged_hash_does_not_flag_a_change() {
    let repo = Repository::open_in_memory().unwrap();
    seed(&repo, "a.py::f", "return x + 1");

    let same = NewArtifact {
        function_id: "a.py::f",
        file_path: "a.py",
        short_name: "f",
        qualified_name: "f",
        signature: "def f(x):",
        body: "return x + 1",
        code_hash: "hash-of-return x + 1",
        language: Language::Python,
        start_line: 1,
        end_line: 2,
        parent: None,
    };
    let changed = repo.upsert_artifact(&same).unwrap();
    assert!(!changed);

    let artifact = repo.get_artifact("a.py::f").unwrap().unwrap();
    assert_eq!(artifact.status, ArtifactStatus::Pending);
}

#[test]
fn queue_push_pop_complete_moves_through_every_status() {
    let repo = Repository::open_in_memory().unwrap();
    seed(&repo, "a.py::f", "return x + 1");

    repo.queue_push("a.py::f", 100, QueueReason::New).unwrap();
    let entry = repo.queue_get("a.py::f").unwrap().unwrap();
    assert_eq!(entry.status, QueueStatus::Pending);
    assert_eq!(entry.attempts, 0);

    let popped = repo.queue_pop().unwrap().unwrap();
    assert_eq!(popped.function_id, "a.py::f");
    assert_eq!(popped.status, QueueStatus::Processing);
    assert_eq!(popped.attempts, 1);

    repo.queue_complete("a.py::f", true, None).unwrap();
    let entry = repo.queue_get("a.py::f").unwrap().unwrap();
    assert_eq!(entry.status, QueueStatus::Completed);
}

#[test]
fn a_re_push_while_pending_updates_priority_but_keeps_attempts() {
    let repo = Repository::open_in_memory().unwrap();
    seed(&repo, "a.py::f", "return x + 1");

    repo.queue_push("a.py::f", 100, QueueReason::New).unwrap();
    repo.queue_pop().unwrap();
    repo.queue_retry("a.py::f", QueueReason::ManualRetry).unwrap();
    let retried = repo.queue_get("a.py::f").unwrap().unwrap();
    assert_eq!(retried.status, QueueStatus::Pending);
    assert_eq!(retried.attempts, 1);

    repo.queue_push("a.py::f", 50, QueueReason::HashMismatch).unwrap();
    let entry = repo.queue_get("a.py::f").unwrap().unwrap();
    assert_eq!(entry.priority, 50);
    assert_eq!(entry.reason, QueueReason::HashMismatch);
    assert_eq!(entry.status, QueueStatus::Pending);
    assert_eq!(entry.attempts, 1, "pushing onto an existing row must not reset attempts");
}

#[test]
fn contract_upsert_marks_the_artifact_verified_and_closes_the_queue_entry() {
    let repo = Repository::open_in_memory().unwrap();
    seed(&repo, "a.py::f", "return x + 1");
    repo.queue_push("a.py::f", 100, QueueReason::New).unwrap();
    repo.queue_pop().unwrap();

    let submitted = SubmittedContract {
        function_id: "a.py::f",
        document_json: r#"{"function_signature":"def f(x):","intent_summary":"Adds one.","invariants":[]}"#,
        confidence_0_100: 92.0,
        verification_script: None,
        reasoning_trace: None,
    };
    repo.upsert_contract(&submitted).unwrap();

    let artifact = repo.get_artifact("a.py::f").unwrap().unwrap();
    assert_eq!(artifact.status, ArtifactStatus::Verified);

    let contract = repo.get_contract("a.py::f").unwrap().unwrap();
    assert_eq!(contract.confidence, 0.92, "confidence is persisted on the [0,1] stored scale");

    let entry = repo.queue_get("a.py::f").unwrap().unwrap();
    assert_eq!(entry.status, QueueStatus::Completed);
    assert_eq!(entry.reason, QueueReason::New, "original queue reason must survive the rewrite");
}

#[test]
fn suggest_artifacts_surfaces_a_substring_match_on_the_short_name() {
    let repo = Repository::open_in_memory().unwrap();
    seed(&repo, "a.py::process_payment", "return True");

    let suggestions = repo.suggest_artifacts("process_pay").unwrap();
    assert!(suggestions.iter().any(|s| s == "a.py::process_payment"));
}
