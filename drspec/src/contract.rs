//! Contract document schema and validation (§6).
//!
//! The store holds the contract as opaque JSON text; this module is the
//! boundary where it is decoded and validated before ever reaching the
//! repository, and where a validated document is re-encoded for storage.

use drspec_core::errors::ContractError;
use drspec_core::types::{Criticality, OnFail};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why a submitted contract document failed validation — distinguishable
/// per §7 ("reject missing required fields, wrong enum values, and
/// too-short strings with a distinguishable error kind").
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` must be at least {min} characters, got {actual}")]
    TooShort {
        field: &'static str,
        min: usize,
        actual: usize,
    },
    #[error("contract must have at least one invariant")]
    NoInvariants,
    #[error("invariants[{index}].{field}: {reason}")]
    InvalidInvariant {
        index: usize,
        field: &'static str,
        reason: String,
    },
    #[error("io_examples[{index}].{field}: {reason}")]
    InvalidIoExample {
        index: usize,
        field: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invariant {
    pub name: String,
    pub logic: String,
    pub criticality: Criticality,
    pub on_fail: OnFail,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IoExample {
    pub input: Value,
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractDocument {
    pub function_signature: String,
    pub intent_summary: String,
    pub invariants: Vec<Invariant>,
    #[serde(default)]
    pub io_examples: Vec<IoExample>,
}

/// Structurally permissive mirror of [`ContractDocument`] — every field is
/// optional so a missing or mistyped field is diagnosed by hand rather than
/// surfacing as an opaque `serde_json` type error.
#[derive(Debug, Deserialize)]
struct RawInvariant {
    name: Option<String>,
    logic: Option<String>,
    criticality: Option<String>,
    on_fail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawIoExample {
    input: Option<Value>,
    output: Option<Value>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawContract {
    function_signature: Option<String>,
    intent_summary: Option<String>,
    invariants: Option<Vec<RawInvariant>>,
    #[serde(default)]
    io_examples: Option<Vec<RawIoExample>>,
}

impl ContractDocument {
    /// Parse then validate raw JSON text. JSON that doesn't even deserialize
    /// as an object comes back as [`ContractError::InvalidJson`]; everything
    /// else is [`ContractError::InvalidSchema`].
    pub fn parse_and_validate(json: &str) -> Result<Self, ContractError> {
        let raw: RawContract =
            serde_json::from_str(json).map_err(|e| ContractError::InvalidJson(e.to_string()))?;
        Self::from_raw(raw).map_err(|e| ContractError::InvalidSchema(e.to_string()))
    }

    fn from_raw(raw: RawContract) -> Result<Self, ContractValidationError> {
        let function_signature = non_empty(raw.function_signature, "function_signature")?;

        let intent_summary = raw
            .intent_summary
            .ok_or(ContractValidationError::MissingField("intent_summary"))?;
        let trimmed = intent_summary.trim();
        if trimmed.len() < 10 {
            return Err(ContractValidationError::TooShort {
                field: "intent_summary",
                min: 10,
                actual: trimmed.len(),
            });
        }

        let raw_invariants = raw
            .invariants
            .ok_or(ContractValidationError::MissingField("invariants"))?;
        if raw_invariants.is_empty() {
            return Err(ContractValidationError::NoInvariants);
        }
        let invariants = raw_invariants
            .into_iter()
            .enumerate()
            .map(|(index, inv)| validate_invariant(index, inv))
            .collect::<Result<Vec<_>, _>>()?;

        let io_examples = raw
            .io_examples
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, ex)| validate_io_example(index, ex))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            function_signature,
            intent_summary: trimmed.to_string(),
            invariants,
            io_examples,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn non_empty(field: Option<String>, name: &'static str) -> Result<String, ContractValidationError> {
    let value = field.ok_or(ContractValidationError::MissingField(name))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ContractValidationError::TooShort {
            field: name,
            min: 1,
            actual: 0,
        });
    }
    Ok(value)
}

fn validate_invariant(index: usize, raw: RawInvariant) -> Result<Invariant, ContractValidationError> {
    let name = raw
        .name
        .ok_or(ContractValidationError::InvalidInvariant {
            index,
            field: "name",
            reason: "missing field".to_string(),
        })?;
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ContractValidationError::InvalidInvariant {
            index,
            field: "name",
            reason: "must not be empty".to_string(),
        });
    }

    let logic = raw
        .logic
        .ok_or(ContractValidationError::InvalidInvariant {
            index,
            field: "logic",
            reason: "missing field".to_string(),
        })?;
    let trimmed_logic = logic.trim();
    if trimmed_logic.len() < 5 {
        return Err(ContractValidationError::InvalidInvariant {
            index,
            field: "logic",
            reason: format!("must be at least 5 characters, got {}", trimmed_logic.len()),
        });
    }

    let criticality_raw = raw
        .criticality
        .ok_or(ContractValidationError::InvalidInvariant {
            index,
            field: "criticality",
            reason: "missing field".to_string(),
        })?;
    let criticality = Criticality::parse(&criticality_raw).ok_or_else(|| {
        ContractValidationError::InvalidInvariant {
            index,
            field: "criticality",
            reason: format!("unrecognized value {criticality_raw:?}, expected HIGH/MEDIUM/LOW"),
        }
    })?;

    let on_fail_raw = raw
        .on_fail
        .ok_or(ContractValidationError::InvalidInvariant {
            index,
            field: "on_fail",
            reason: "missing field".to_string(),
        })?;
    let on_fail = OnFail::parse(&on_fail_raw).ok_or_else(|| ContractValidationError::InvalidInvariant {
        index,
        field: "on_fail",
        reason: format!("unrecognized value {on_fail_raw:?}, expected error/warn"),
    })?;

    Ok(Invariant {
        name,
        logic: trimmed_logic.to_string(),
        criticality,
        on_fail,
    })
}

fn validate_io_example(index: usize, raw: RawIoExample) -> Result<IoExample, ContractValidationError> {
    let input = raw.input.ok_or(ContractValidationError::InvalidIoExample {
        index,
        field: "input",
        reason: "missing field".to_string(),
    })?;
    if !input.is_object() {
        return Err(ContractValidationError::InvalidIoExample {
            index,
            field: "input",
            reason: "must be a JSON object".to_string(),
        });
    }
    let output = raw.output.ok_or(ContractValidationError::InvalidIoExample {
        index,
        field: "output",
        reason: "missing field".to_string(),
    })?;
    Ok(IoExample {
        input,
        output,
        description: raw.description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_json() -> &'static str {
        r#"{
            "function_signature": "def add(a, b):",
            "intent_summary": "Adds two numbers and returns the sum.",
            "invariants": [
                {"name": "sum_is_commutative", "logic": "add(a, b) == add(b, a)", "criticality": "MEDIUM", "on_fail": "warn"}
            ],
            "io_examples": [
                {"input": {"a": 1, "b": 2}, "output": 3}
            ]
        }"#
    }

    #[test]
    fn accepts_well_formed_contract() {
        let doc = ContractDocument::parse_and_validate(valid_json()).unwrap();
        assert_eq!(doc.invariants.len(), 1);
        assert_eq!(doc.invariants[0].criticality, Criticality::Medium);
        assert_eq!(doc.io_examples.len(), 1);
    }

    #[test]
    fn rejects_missing_intent_summary() {
        let json = r#"{"function_signature": "f()", "invariants": [{"name":"n","logic":"abcde","criticality":"LOW","on_fail":"warn"}]}"#;
        let err = ContractDocument::parse_and_validate(json).unwrap_err();
        assert!(matches!(err, ContractError::InvalidSchema(_)));
    }

    #[test]
    fn rejects_too_short_intent_summary() {
        let json = r#"{"function_signature": "f()", "intent_summary": "short", "invariants": [{"name":"n","logic":"abcde","criticality":"LOW","on_fail":"warn"}]}"#;
        let err = ContractDocument::parse_and_validate(json).unwrap_err();
        match err {
            ContractError::InvalidSchema(msg) => assert!(msg.contains("intent_summary")),
            other => panic!("expected InvalidSchema, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_invariants() {
        let json = r#"{"function_signature": "f()", "intent_summary": "Does something useful.", "invariants": []}"#;
        let err = ContractDocument::parse_and_validate(json).unwrap_err();
        match err {
            ContractError::InvalidSchema(msg) => assert!(msg.contains("at least one invariant")),
            other => panic!("expected InvalidSchema, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_criticality_value() {
        let json = r#"{"function_signature": "f()", "intent_summary": "Does something useful.",
            "invariants": [{"name":"n","logic":"abcde","criticality":"EXTREME","on_fail":"warn"}]}"#;
        let err = ContractDocument::parse_and_validate(json).unwrap_err();
        match err {
            ContractError::InvalidSchema(msg) => assert!(msg.contains("criticality")),
            other => panic!("expected InvalidSchema, got {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_json() {
        let err = ContractDocument::parse_and_validate("{not json").unwrap_err();
        assert!(matches!(err, ContractError::InvalidJson(_)));
    }

    #[test]
    fn round_trips_through_json() {
        let doc = ContractDocument::parse_and_validate(valid_json()).unwrap();
        let text = doc.to_json().unwrap();
        let reparsed = ContractDocument::parse_and_validate(&text).unwrap();
        assert_eq!(doc, reparsed);
    }
}
