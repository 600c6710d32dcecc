//! Shared enums and identifiers used across the drspec workspace.

mod function_id;
mod language;

pub use function_id::FunctionId;
pub use language::Language;

use serde::{Deserialize, Serialize};

/// Lifecycle position of an [`Artifact`](crate::types) row.
///
/// `Artifact` itself lives in `drspec-storage::models` (it owns the
/// columns); the status enum lives here so analysis code that never
/// touches the store can still reason about transitions (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactStatus {
    Pending,
    Verified,
    NeedsReview,
    Stale,
    Broken,
    /// Not a stored status — returned by the graph when the root id has
    /// no matching artifact (§4.7).
    Unknown,
}

impl ArtifactStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Verified => "VERIFIED",
            Self::NeedsReview => "NEEDS_REVIEW",
            Self::Stale => "STALE",
            Self::Broken => "BROKEN",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "PENDING" => Self::Pending,
            "VERIFIED" => Self::Verified,
            "NEEDS_REVIEW" => Self::NeedsReview,
            "STALE" => Self::Stale,
            "BROKEN" => Self::Broken,
            "UNKNOWN" => Self::Unknown,
            _ => return None,
        })
    }
}

/// Lifecycle position of a [`QueueEntry`](crate::types) row (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl QueueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "PENDING" => Self::Pending,
            "PROCESSING" => Self::Processing,
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            _ => return None,
        })
    }
}

/// Why a [`QueueEntry`](crate::types) exists (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueReason {
    New,
    HashMismatch,
    DependencyChanged,
    ManualRetry,
}

impl QueueReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::HashMismatch => "HASH_MISMATCH",
            Self::DependencyChanged => "DEPENDENCY_CHANGED",
            Self::ManualRetry => "MANUAL_RETRY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "NEW" => Self::New,
            "HASH_MISMATCH" => Self::HashMismatch,
            "DEPENDENCY_CHANGED" => Self::DependencyChanged,
            "MANUAL_RETRY" => Self::ManualRetry,
            _ => return None,
        })
    }
}

/// Agent tag on a `ReasoningTrace` row (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentTag {
    Proposer,
    Critic,
    Judge,
    VisionAnalyst,
    Librarian,
    Debugger,
}

impl AgentTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proposer => "proposer",
            Self::Critic => "critic",
            Self::Judge => "judge",
            Self::VisionAnalyst => "vision_analyst",
            Self::Librarian => "librarian",
            Self::Debugger => "debugger",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "proposer" => Self::Proposer,
            "critic" => Self::Critic,
            "judge" => Self::Judge,
            "vision_analyst" => Self::VisionAnalyst,
            "librarian" => Self::Librarian,
            "debugger" => Self::Debugger,
            _ => return None,
        })
    }
}

/// `VisionFinding.type` (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FindingKind {
    Outlier,
    Discontinuity,
    Boundary,
    Correlation,
    MissingPattern,
}

impl FindingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outlier => "outlier",
            Self::Discontinuity => "discontinuity",
            Self::Boundary => "boundary",
            Self::Correlation => "correlation",
            Self::MissingPattern => "missing_pattern",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "outlier" => Self::Outlier,
            "discontinuity" => Self::Discontinuity,
            "boundary" => Self::Boundary,
            "correlation" => Self::Correlation,
            "missing_pattern" => Self::MissingPattern,
            _ => return None,
        })
    }
}

/// `VisionFinding.significance` (§3, §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Significance {
    High,
    Medium,
    Low,
}

impl Significance {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "HIGH" => Self::High,
            "MEDIUM" => Self::Medium,
            "LOW" => Self::Low,
            _ => return None,
        })
    }

    /// Confidence-display penalty for one `NEW` finding of this significance (§4.9).
    pub fn penalty(self) -> f64 {
        match self {
            Self::High => 15.0,
            Self::Medium => 7.0,
            Self::Low => 3.0,
        }
    }
}

/// `VisionFinding.status` (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FindingStatus {
    New,
    Addressed,
    Ignored,
}

impl FindingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Addressed => "ADDRESSED",
            Self::Ignored => "IGNORED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "NEW" => Self::New,
            "ADDRESSED" => Self::Addressed,
            "IGNORED" => Self::Ignored,
            _ => return None,
        })
    }
}

/// Contract invariant criticality (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Criticality {
    High,
    Medium,
    Low,
}

impl Criticality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "HIGH" => Self::High,
            "MEDIUM" => Self::Medium,
            "LOW" => Self::Low,
            _ => return None,
        })
    }
}

/// Contract invariant on-fail policy (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnFail {
    Error,
    Warn,
}

impl OnFail {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "error" => Self::Error,
            "warn" => Self::Warn,
            _ => return None,
        })
    }
}

/// Display-scale confidence bucket (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    High,
    Good,
    Moderate,
    Low,
}

impl ConfidenceLevel {
    /// Classify a display-scale (`[0,100]`) confidence value.
    pub fn from_display(value: f64) -> Self {
        if value >= 90.0 {
            Self::High
        } else if value >= 70.0 {
            Self::Good
        } else if value >= 50.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}
