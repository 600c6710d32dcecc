//! Row structs for every entity in §3. These are plain data — the
//! repository modules own all SQL and status-transition logic.

use drspec_core::types::{
    AgentTag, ArtifactStatus, FindingKind, FindingStatus, Language, QueueReason, QueueStatus,
    Significance,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactRow {
    pub function_id: String,
    pub file_path: String,
    pub short_name: String,
    pub qualified_name: String,
    pub signature: String,
    pub body: String,
    pub code_hash: String,
    pub language: Language,
    pub start_line: i64,
    pub end_line: i64,
    pub parent: Option<String>,
    pub status: ArtifactStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractRow {
    pub function_id: String,
    pub document: String,
    pub confidence: f64,
    pub verification_script: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntryRow {
    pub function_id: String,
    pub priority: i64,
    pub status: QueueStatus,
    pub reason: QueueReason,
    pub attempts: i64,
    pub max_attempts: i64,
    pub error_message: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DependencyRow {
    pub id: i64,
    pub caller_id: String,
    pub callee_id: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningTraceRow {
    pub id: i64,
    pub function_id: String,
    pub agent_tag: AgentTag,
    pub payload: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisionFindingRow {
    pub id: i64,
    pub function_id: String,
    pub finding_type: FindingKind,
    pub significance: Significance,
    pub description: String,
    pub location: Option<String>,
    pub suggested_invariant: Option<String>,
    pub status: FindingStatus,
    pub resolution_note: Option<String>,
    pub plot_path: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LearningEventRow {
    pub id: i64,
    pub commit_id: String,
    pub commit_message: String,
    pub function_id: String,
    pub pattern_category: String,
    pub pattern_description: String,
    pub contract_modified: bool,
    pub confidence_boost: f64,
    pub invariants_added: i64,
    pub invariants_validated: i64,
    pub created_at: i64,
}
