//! Integration-level check of the public verification API, independent of
//! the unit tests embedded in `src/runner.rs`.

use std::process::Command;
use std::time::Duration;

use drspec_core::errors::VerifyError;
use drspec_verify::{run_verification, VerificationRequest};

fn python_available() -> bool {
    let interpreter = std::env::var("DRSPEC_PYTHON").unwrap_or_else(|_| "python3".to_string());
    Command::new(interpreter).arg("--version").output().is_ok()
}

#[test]
fn verify_pass_and_fail_round_trip_through_the_public_api() {
    if !python_available() {
        return;
    }

    let passing = "def verify(input, output):\n    return output == input['x'] + 1, '1 invariant(s) passed'\n";
    let req = VerificationRequest::new(passing, serde_json::json!({"x": 4}), serde_json::json!(5));
    let outcome = run_verification(&req).unwrap();
    assert!(outcome.passed);
    assert_eq!(outcome.invariants_checked, 1);
    assert_eq!(outcome.invariants_passed, 1);

    let failing = "def verify(input, output):\n    return output == input['x'] + 1, 'off by one'\n";
    let req = VerificationRequest::new(failing, serde_json::json!({"x": 4}), serde_json::json!(99));
    let outcome = run_verification(&req).unwrap();
    assert!(!outcome.passed);
}

#[test]
fn a_hanging_script_is_killed_at_the_timeout_boundary() {
    if !python_available() {
        return;
    }

    let script = "import time\n\n\ndef verify(input, output):\n    time.sleep(10)\n    return True, 'ok'\n";
    let req = VerificationRequest::new(script, serde_json::json!({}), serde_json::json!({}))
        .with_timeout(Duration::from_millis(150));
    let err = run_verification(&req).unwrap_err();
    assert!(matches!(err, VerifyError::Timeout(_)));
}
