use serde::{Deserialize, Serialize};
use std::fmt;

/// The stable identifier of an extracted function: `<relative_file_path>::<qualified_name>`.
///
/// Only the *first* `::` is the split point — `qualified_name` itself may
/// contain `::` for C++ namespace/class joins (§3, §6 "function-id grammar").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionId(String);

/// Why a `FunctionId` failed to parse (§6 grammar: non-empty path segment,
/// the literal `::`, non-empty name segment).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FunctionIdError {
    #[error("function id has no '::' separator: {0:?}")]
    MissingSeparator(String),
    #[error("function id has an empty path segment: {0:?}")]
    EmptyPath(String),
    #[error("function id has an empty name segment: {0:?}")]
    EmptyName(String),
}

impl FunctionId {
    /// Build and validate a `FunctionId` from `path::qualified_name`.
    pub fn parse(raw: impl Into<String>) -> Result<Self, FunctionIdError> {
        let raw = raw.into();
        let idx = raw
            .find("::")
            .ok_or_else(|| FunctionIdError::MissingSeparator(raw.clone()))?;
        let (path, rest) = raw.split_at(idx);
        let name = &rest[2..];
        if path.is_empty() {
            return Err(FunctionIdError::EmptyPath(raw));
        }
        if name.is_empty() {
            return Err(FunctionIdError::EmptyName(raw));
        }
        Ok(Self(raw))
    }

    /// Build a `FunctionId` from already-validated parts without re-checking
    /// the grammar (used by parsers, which construct the path and qualified
    /// name independently and know both are non-empty).
    pub fn from_parts(path: &str, qualified_name: &str) -> Self {
        Self(format!("{path}::{qualified_name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `<relative_file_path>` segment, up to the first `::`.
    pub fn path(&self) -> &str {
        let idx = self.0.find("::").expect("FunctionId invariant");
        &self.0[..idx]
    }

    /// The `<qualified_name>` segment, after the first `::`.
    pub fn qualified_name(&self) -> &str {
        let idx = self.0.find("::").expect("FunctionId invariant");
        &self.0[idx + 2..]
    }

    /// The short name: the last dot- or `::`-joined component of the
    /// qualified name.
    pub fn short_name(&self) -> &str {
        let q = self.qualified_name();
        let dot = q.rfind('.').map(|i| i + 1);
        let colon = q.rfind("::").map(|i| i + 2);
        match (dot, colon) {
            (Some(d), Some(c)) => &q[d.max(c)..],
            (Some(d), None) => &q[d..],
            (None, Some(c)) => &q[c..],
            (None, None) => q,
        }
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FunctionId {
    type Error = FunctionIdError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl AsRef<str> for FunctionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
