//! Shapes produced by the directory walk and the top-level scan (§4.3).

use std::path::PathBuf;

use drspec_core::types::FunctionId;
use drspec_core::Language;

use crate::hints::Hint;
use crate::parsers::ParseIssue;

#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub language: Language,
    pub is_header: bool,
}

/// One function extracted during a scan, with its stable identifier and
/// content hash already computed.
#[derive(Debug, Clone)]
pub struct ScannedFunction {
    pub function_id: FunctionId,
    pub name: String,
    pub qualified_name: String,
    pub signature: String,
    pub body: String,
    pub start_line: usize,
    pub end_line: usize,
    pub parent: Option<String>,
    pub tags: Vec<String>,
    pub is_method: bool,
    pub is_async: bool,
    pub code_hash: String,
    pub language: Language,
    pub hints: Vec<Hint>,
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub functions: Vec<ScannedFunction>,
    /// Per-file parse issues, keyed by the path relative to the scan root.
    pub file_errors: Vec<(String, Vec<ParseIssue>)>,
}
