//! Shapes produced by unified-diff parsing and pattern mining (§4.11).

use drspec_core::types::{Criticality, OnFail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Added,
    Removed,
}

#[derive(Debug, Clone)]
pub struct DiffLine {
    pub kind: LineKind,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct Hunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    pub fn added_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|l| l.kind == LineKind::Added)
            .map(|l| l.content.as_str())
    }

    pub fn removed_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|l| l.kind == LineKind::Removed)
            .map(|l| l.content.as_str())
    }

    /// True when the only difference between added and removed lines is
    /// whitespace (§4.11 — such hunks are skipped during categorization).
    pub fn is_whitespace_only(&self) -> bool {
        let strip = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
        let added: Vec<String> = self.added_lines().map(strip).collect();
        let removed: Vec<String> = self.removed_lines().map(strip).collect();
        !added.is_empty() && added == removed
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileDiff {
    pub old_path: Option<String>,
    pub new_path: Option<String>,
    pub is_new_file: bool,
    pub is_deleted_file: bool,
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// The path this diff should be treated as touching: the new path for
    /// additions/modifications, the old path for deletions.
    pub fn effective_path(&self) -> Option<&str> {
        self.new_path.as_deref().or(self.old_path.as_deref())
    }
}

#[derive(Debug, Clone, Default)]
pub struct UnifiedDiff {
    pub files: Vec<FileDiff>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternCategory {
    NullCheck,
    BoundsCheck,
    TypeCheck,
    EmptyCheck,
    DuplicateCheck,
    RangeCheck,
    FormatCheck,
    ExceptionHandling,
    OffByOne,
    Initialization,
    ResourceManagement,
    Concurrency,
    Unknown,
}

impl PatternCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NullCheck => "null_check",
            Self::BoundsCheck => "bounds_check",
            Self::TypeCheck => "type_check",
            Self::EmptyCheck => "empty_check",
            Self::DuplicateCheck => "duplicate_check",
            Self::RangeCheck => "range_check",
            Self::FormatCheck => "format_check",
            Self::ExceptionHandling => "exception_handling",
            Self::OffByOne => "off_by_one",
            Self::Initialization => "initialization",
            Self::ResourceManagement => "resource_management",
            Self::Concurrency => "concurrency",
            Self::Unknown => "unknown",
        }
    }

    /// Criticality assigned to suggestions derived from this category
    /// (§4.11 strengthening).
    pub fn criticality(self) -> Criticality {
        match self {
            Self::NullCheck
            | Self::BoundsCheck
            | Self::ExceptionHandling
            | Self::OffByOne
            | Self::ResourceManagement
            | Self::Concurrency => Criticality::High,
            Self::TypeCheck | Self::EmptyCheck | Self::DuplicateCheck | Self::RangeCheck | Self::Initialization => {
                Criticality::Medium
            }
            Self::FormatCheck | Self::Unknown => Criticality::Low,
        }
    }

    pub fn on_fail(self) -> OnFail {
        if self.criticality() == Criticality::High {
            OnFail::Error
        } else {
            OnFail::Warn
        }
    }
}

#[derive(Debug, Clone)]
pub struct MinedPattern {
    pub file: String,
    pub category: PatternCategory,
    pub confidence: f64,
    pub new_start: usize,
    pub new_count: usize,
    pub affected_functions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SuggestedInvariant {
    pub name: String,
    pub logic_hint: String,
    pub category: PatternCategory,
    pub criticality: Criticality,
    pub on_fail: OnFail,
}

#[derive(Debug, Clone, Default)]
pub struct MiningOutcome {
    pub patterns: Vec<MinedPattern>,
    pub bug_fix_score: Option<f64>,
}
