//! Verification Runner (C10, §4.10): isolated subprocess execution of a
//! contract-derived check script against a recorded input/output pair.

use std::io::Write as _;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use drspec_core::errors::VerifyError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use wait_timeout::ChildExt;

/// Default wall-clock budget for a single verification run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// What the user-supplied script is checked against.
pub struct VerificationRequest<'a> {
    /// Source of a Python `verify(input, output) -> (bool, str)` function.
    pub script: &'a str,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
    pub timeout: Duration,
}

impl<'a> VerificationRequest<'a> {
    pub fn new(script: &'a str, input: serde_json::Value, output: serde_json::Value) -> Self {
        Self {
            script,
            input,
            output,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub passed: bool,
    pub message: String,
    pub invariants_checked: u32,
    pub invariants_passed: u32,
    pub execution_time: Duration,
}

#[derive(Debug, Deserialize)]
struct ScriptOutput {
    #[serde(default)]
    passed: bool,
    #[serde(default = "default_message")]
    message: String,
    #[serde(default)]
    invariants_checked: u32,
    #[serde(default)]
    invariants_passed: u32,
}

fn default_message() -> String {
    String::new()
}

/// Runs `request.script` in an isolated, minimized-environment subprocess
/// and parses its verdict. The temp file holding the script is removed on
/// every exit path, including early returns on timeout or parse failure.
pub fn run_verification(request: &VerificationRequest<'_>) -> Result<VerificationOutcome, VerifyError> {
    let start = Instant::now();

    let mut script_file = tempfile::Builder::new()
        .prefix("drspec-verify-")
        .suffix(".py")
        .tempfile()
        .map_err(|e| VerifyError::Io(e.to_string()))?;
    script_file
        .write_all(wrap_script(request.script).as_bytes())
        .map_err(|e| VerifyError::Io(e.to_string()))?;
    script_file.flush().map_err(|e| VerifyError::Io(e.to_string()))?;

    let stdin_payload = serde_json::json!({
        "input": request.input,
        "output": request.output,
    })
    .to_string();

    let mut child = Command::new(python_interpreter())
        .arg(script_file.path())
        .env_clear()
        .envs(minimized_env())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| VerifyError::Io(e.to_string()))?;

    {
        let stdin = child.stdin.as_mut().ok_or_else(|| {
            VerifyError::Io("failed to open subprocess stdin".to_string())
        })?;
        stdin
            .write_all(stdin_payload.as_bytes())
            .map_err(|e| VerifyError::Io(e.to_string()))?;
    }
    // Drop stdin so the child sees EOF and doesn't block reading the payload.
    drop(child.stdin.take());

    let status = match child
        .wait_timeout(request.timeout)
        .map_err(|e| VerifyError::Io(e.to_string()))?
    {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(VerifyError::Timeout(request.timeout));
        }
    };

    let output = child
        .wait_with_output()
        .map_err(|e| VerifyError::Io(e.to_string()))?;

    if !status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(VerifyError::ExecutionError { stderr });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: ScriptOutput = serde_json::from_str(stdout.trim())
        .map_err(|e| VerifyError::ParseError(e.to_string()))?;

    Ok(VerificationOutcome {
        passed: parsed.passed,
        message: parsed.message,
        invariants_checked: parsed.invariants_checked,
        invariants_passed: parsed.invariants_passed,
        execution_time: start.elapsed(),
    })
}

/// Embeds the user's `verify(input, output)` function in a wrapper that
/// reads `{input, output}` from stdin and prints the result shape §4.10
/// expects. `invariants_checked`/`invariants_passed` are recovered from a
/// `"N invariant(s) passed"` style message when the script doesn't report
/// them directly.
fn wrap_script(body: &str) -> String {
    format!(
        r#"{body}

import json
import re
import sys


def _main():
    try:
        payload = json.loads(sys.stdin.read())
        passed, message = verify(payload["input"], payload["output"])
        invariants_checked = 0
        invariants_passed = 0
        match = re.search(r"(\d+)\s+invariant", message)
        if match:
            invariants_checked = int(match.group(1))
            invariants_passed = invariants_checked if passed else 0
        elif not passed:
            invariants_checked = 1
        result = {{
            "passed": bool(passed),
            "message": str(message),
            "invariants_checked": invariants_checked,
            "invariants_passed": invariants_passed,
        }}
    except Exception as exc:
        result = {{
            "passed": False,
            "message": f"verification error: {{exc}}",
            "invariants_checked": 0,
            "invariants_passed": 0,
        }}
    print(json.dumps(result))


if __name__ == "__main__":
    _main()
"#
    )
}

fn python_interpreter() -> String {
    std::env::var("DRSPEC_PYTHON").unwrap_or_else(|_| "python3".to_string())
}

/// Only `PATH`, and `PYTHONPATH`/`VIRTUAL_ENV` when the host process has
/// them, plus flags suppressing bytecode caching (§4.10).
fn minimized_env() -> Vec<(String, String)> {
    let mut env = vec![
        (
            "PATH".to_string(),
            std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".to_string()),
        ),
        ("PYTHONDONTWRITEBYTECODE".to_string(), "1".to_string()),
        ("PYTHONUNBUFFERED".to_string(), "1".to_string()),
    ];
    if let Ok(path) = std::env::var("PYTHONPATH") {
        env.push(("PYTHONPATH".to_string(), path));
    }
    if let Ok(venv) = std::env::var("VIRTUAL_ENV") {
        env.push(("VIRTUAL_ENV".to_string(), venv));
    }
    env
}

/// Counts the `N invariant(s)` mentions in a free-form message; exposed so
/// callers constructing their own scripts can sanity-check the heuristic
/// the wrapper applies.
pub fn extract_invariant_count(message: &str) -> Option<u32> {
    let re = Regex::new(r"(\d+)\s+invariant").ok()?;
    re.captures(message)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSING_SCRIPT: &str = "def verify(input, output):\n    return True, 'All 2 invariant(s) passed'\n";
    const FAILING_SCRIPT: &str = "def verify(input, output):\n    return False, 'invariant violated: result must be positive'\n";
    const RAISING_SCRIPT: &str = "def verify(input, output):\n    raise ValueError('boom')\n";

    fn python_available() -> bool {
        Command::new(python_interpreter())
            .arg("--version")
            .output()
            .is_ok()
    }

    #[test]
    fn passing_script_reports_invariant_counts() {
        if !python_available() {
            return;
        }
        let req = VerificationRequest::new(
            PASSING_SCRIPT,
            serde_json::json!({"x": 1}),
            serde_json::json!(2),
        );
        let outcome = run_verification(&req).unwrap();
        assert!(outcome.passed);
        assert_eq!(outcome.invariants_checked, 2);
        assert_eq!(outcome.invariants_passed, 2);
    }

    #[test]
    fn failing_script_reports_not_passed() {
        if !python_available() {
            return;
        }
        let req = VerificationRequest::new(
            FAILING_SCRIPT,
            serde_json::json!({"x": -1}),
            serde_json::json!(-1),
        );
        let outcome = run_verification(&req).unwrap();
        assert!(!outcome.passed);
    }

    #[test]
    fn timeout_fires_for_sleeping_script() {
        if !python_available() {
            return;
        }
        let script = "import time\n\n\ndef verify(input, output):\n    time.sleep(5)\n    return True, 'ok'\n";
        let req = VerificationRequest::new(script, serde_json::json!({}), serde_json::json!({}))
            .with_timeout(Duration::from_millis(100));
        let err = run_verification(&req).unwrap_err();
        assert!(matches!(err, VerifyError::Timeout(_)));
    }

    #[test]
    fn raising_script_still_yields_parseable_failure() {
        if !python_available() {
            return;
        }
        let req = VerificationRequest::new(RAISING_SCRIPT, serde_json::json!({}), serde_json::json!({}));
        let outcome = run_verification(&req).unwrap();
        assert!(!outcome.passed);
        assert!(outcome.message.contains("boom"));
    }

    #[test]
    fn extract_invariant_count_parses_standard_message() {
        assert_eq!(extract_invariant_count("All 3 invariant(s) passed"), Some(3));
        assert_eq!(extract_invariant_count("no mentions here"), None);
    }
}
