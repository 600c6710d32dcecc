//! # drspec
//!
//! Facade crate: wires the Artifact/Contract Repository (`drspec-storage`),
//! the analysis toolbox (`drspec-analysis`), and the Verification Runner
//! (`drspec-verify`) behind one [`Engine`], the way the teacher's
//! `ContextEngine` wires tokenization and ordering behind a single entry
//! point for external collaborators (CLI, editor integrations, agents).
//!
//! Every public operation returns a [`drspec_core::envelope::DrspecResponse`]
//! so a caller never has to distinguish "not found" from "malformed input"
//! from "internal error" by parsing a string (§6).

pub mod contract;

use std::path::Path;
use std::time::Duration;

use drspec_analysis::confidence;
use drspec_analysis::diff::{self, MiningOutcome};
use drspec_analysis::graph::{self, Direction, DependencyGraph, GraphStats};
use drspec_analysis::parsers::ParserManager;
use drspec_analysis::scanner::Scanner;
use drspec_core::config::DrspecConfig;
use drspec_core::envelope::DrspecResponse;
use drspec_core::errors::{MiningError, StorageError, VerifyError};
use drspec_core::types::{AgentTag, FunctionId, QueueReason};
use drspec_storage::{NewArtifact, NewLearningEvent, Repository, SubmittedContract};
use drspec_verify::{VerificationOutcome, VerificationRequest};
use serde::Serialize;

pub use contract::{ContractDocument, ContractValidationError};

/// Ties storage, analysis, and verification together behind one handle.
/// Owns the repository's single connection; every method takes `&self`
/// since `Repository` already serializes writers internally.
pub struct Engine {
    repo: Repository,
    parsers: ParserManager,
    config: DrspecConfig,
}

impl Engine {
    /// Opens (or creates) the database at `path`, loading `_drspec/config.toml`
    /// from `path`'s parent directory if present (§2.1 ambient config).
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let config_path = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("_drspec")
            .join("config.toml");
        let config = DrspecConfig::load_from_file(&config_path).unwrap_or_default();
        Self::open_with_config(path, config)
    }

    pub fn open_with_config(path: &Path, config: DrspecConfig) -> Result<Self, StorageError> {
        let repo = Repository::open(path)?;
        seed_confidence_threshold(&repo, &config)?;
        Ok(Self {
            repo,
            parsers: ParserManager::new(),
            config,
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            repo: Repository::open_in_memory()?,
            parsers: ParserManager::new(),
            config: DrspecConfig::default(),
        })
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn config(&self) -> &DrspecConfig {
        &self.config
    }

    /// §4.3 scan: walks `root`, upserts every discovered function, and
    /// queues the ones that are new or whose body changed. Returns the
    /// function ids that were queued, so a caller can report "what's new"
    /// without re-deriving it from the scan outcome.
    pub fn scan_directory(
        &self,
        root: &Path,
        recursive: bool,
        extra_ignore: &[String],
    ) -> DrspecResponse<ScanReport> {
        let merged_ignore: Vec<String> = extra_ignore
            .iter()
            .cloned()
            .chain(self.config.extra_ignore.iter().cloned())
            .collect();

        let scanner = Scanner::new();
        let outcome = match scanner.scan(root, recursive, &merged_ignore) {
            Ok(o) => o,
            Err(e) => return DrspecResponse::err(e),
        };

        let default_priority = self.config.effective_default_priority();
        let mut queued = Vec::new();
        for function in &outcome.functions {
            let new = NewArtifact {
                function_id: function.function_id.as_str(),
                file_path: function.function_id.path(),
                short_name: &function.name,
                qualified_name: &function.qualified_name,
                signature: &function.signature,
                body: &function.body,
                code_hash: &function.code_hash,
                language: function.language,
                start_line: function.start_line as i64,
                end_line: function.end_line as i64,
                parent: function.parent.as_deref(),
            };
            match self.repo.upsert_artifact(&new) {
                Ok(true) => {
                    let reason = if self.repo.get_contract(function.function_id.as_str()).ok().flatten().is_some() {
                        QueueReason::HashMismatch
                    } else {
                        QueueReason::New
                    };
                    if let Err(e) = self.repo.queue_push(function.function_id.as_str(), default_priority, reason) {
                        return DrspecResponse::err(e);
                    }
                    queued.push(function.function_id.as_str().to_string());
                }
                Ok(false) => {}
                Err(e) => return DrspecResponse::err(e),
            }
        }

        let file_errors = outcome
            .file_errors
            .iter()
            .map(|(path, issues)| (path.clone(), issues.len()))
            .collect();

        DrspecResponse::ok(ScanReport {
            functions_scanned: outcome.functions.len(),
            queued,
            file_errors,
        })
    }

    /// §6 contract save: validates the document, applies the vision-finding
    /// confidence adjustment (§4.9), and performs the upsert dance (§4.6).
    pub fn save_contract(
        &self,
        function_id: &str,
        document_json: &str,
        submitted_confidence_0_100: f64,
        verification_script: Option<&str>,
        author: Option<AgentTag>,
    ) -> DrspecResponse<ContractSaveReport> {
        let document = match ContractDocument::parse_and_validate(document_json) {
            Ok(d) => d,
            Err(e) => return DrspecResponse::err(e),
        };

        let new_findings = match self.repo.new_finding_significances(function_id) {
            Ok(f) => f,
            Err(e) => return respond_storage_error(&self.repo, e),
        };
        let adjusted = confidence::adjust_for_findings(submitted_confidence_0_100, &new_findings);

        let reasoning_trace = author.map(|tag| (tag, "{}"));
        let canonical_json = match document.to_json() {
            Ok(j) => j,
            Err(e) => {
                return DrspecResponse::err_with_details(
                    ContractValidationErrorWrapper(e.to_string()),
                    serde_json::Value::Null,
                )
            }
        };

        let submitted = SubmittedContract {
            function_id,
            document_json: &canonical_json,
            confidence_0_100: adjusted,
            verification_script,
            reasoning_trace,
        };

        match self.repo.upsert_contract(&submitted) {
            Ok(()) => DrspecResponse::ok(ContractSaveReport {
                function_id: function_id.to_string(),
                submitted_confidence: submitted_confidence_0_100,
                adjusted_confidence: adjusted,
                findings_applied: new_findings.len(),
            }),
            Err(e) => respond_storage_error(&self.repo, e),
        }
    }

    pub fn get_contract(&self, function_id: &str) -> DrspecResponse<Option<ContractView>> {
        match self.repo.get_contract(function_id) {
            Ok(Some(row)) => DrspecResponse::ok(Some(ContractView {
                function_id: row.function_id,
                document: row.document,
                confidence_display: confidence::normalize_display(row.confidence),
                verification_script: row.verification_script,
            })),
            Ok(None) => DrspecResponse::ok(None),
            Err(e) => respond_storage_error(&self.repo, e),
        }
    }

    /// §4.10 verification: runs a contract's cached script against a
    /// submitted input/output pair.
    pub fn verify_contract(
        &self,
        function_id: &str,
        input: serde_json::Value,
        output: serde_json::Value,
    ) -> DrspecResponse<VerificationOutcome> {
        let contract = match self.repo.get_contract(function_id) {
            Ok(Some(c)) => c,
            Ok(None) => return DrspecResponse::err(StorageError::ContractNotFound(function_id.to_string())),
            Err(e) => return respond_storage_error(&self.repo, e),
        };
        let Some(script) = contract.verification_script.as_deref() else {
            return DrspecResponse::err(VerifyError::ExecutionError {
                stderr: "contract has no verification script".to_string(),
            });
        };

        let request = VerificationRequest::new(script, input, output)
            .with_timeout(Duration::from_millis(self.config.effective_verification_timeout_ms()));
        match drspec_verify::run_verification(&request) {
            Ok(outcome) => DrspecResponse::ok(outcome),
            Err(e) => DrspecResponse::err(e),
        }
    }

    pub fn queue_push(&self, function_id: &str, priority: i64, reason: QueueReason) -> DrspecResponse<()> {
        match self.repo.queue_push(function_id, priority, reason) {
            Ok(()) => DrspecResponse::ok(()),
            Err(e) => respond_storage_error(&self.repo, e),
        }
    }

    pub fn queue_pop(&self) -> DrspecResponse<Option<drspec_storage::models::QueueEntryRow>> {
        match self.repo.queue_pop() {
            Ok(entry) => DrspecResponse::ok(entry),
            Err(e) => respond_storage_error(&self.repo, e),
        }
    }

    /// §4.7 dependency graph query from `root`, BFS out to `depth` hops.
    pub fn dependency_graph(
        &self,
        root: &str,
        depth: usize,
        direction: Direction,
    ) -> DrspecResponse<DependencyGraph> {
        let root_id = match FunctionId::parse(root) {
            Ok(id) => id,
            Err(e) => return DrspecResponse::err(StorageError::InvalidFunctionId(e)),
        };
        DrspecResponse::ok(graph::get_graph(&self.repo, &root_id, depth, direction))
    }

    /// §4.7 whole-project graph statistics.
    pub fn dependency_stats(&self) -> DrspecResponse<GraphStats> {
        let deps = match self.repo.all_dependencies() {
            Ok(d) => d,
            Err(e) => return respond_storage_error(&self.repo, e),
        };
        let ids = match self.repo.list_artifact_ids() {
            Ok(ids) => ids,
            Err(e) => return respond_storage_error(&self.repo, e),
        };

        let edges: Vec<(FunctionId, FunctionId)> = deps
            .into_iter()
            .filter_map(|d| Some((FunctionId::parse(d.caller_id).ok()?, FunctionId::parse(d.callee_id).ok()?)))
            .collect();

        let mut with_contract = std::collections::HashSet::new();
        for id in &ids {
            if self.repo.get_contract(id).ok().flatten().is_some() {
                if let Ok(fid) = FunctionId::parse(id.clone()) {
                    with_contract.insert(fid);
                }
            }
        }

        DrspecResponse::ok(graph::compute_stats(&edges, &with_contract, ids.len()))
    }

    /// §4.11 mine a unified diff for candidate invariant patterns, record
    /// one learning event per pattern, and return the strengthening
    /// suggestions for each affected function's existing contract.
    pub fn mine_diff(
        &self,
        commit_id: &str,
        commit_message: &str,
        diff_text: &str,
        post_image_sources: impl Fn(&str) -> Option<String>,
    ) -> DrspecResponse<MiningReport> {
        let outcome: MiningOutcome = match diff::mine_diff_text(diff_text, &self.parsers, post_image_sources) {
            Ok(o) => o,
            Err(e) => return respond_mining_error(e),
        };
        let bug_fix_score = diff::bug_fix_score(commit_message);

        let mut events_recorded = 0usize;
        let mut suggestions_by_function: Vec<(String, Vec<drspec_analysis::diff::SuggestedInvariant>)> = Vec::new();

        for pattern in &outcome.patterns {
            for qualified_name in &pattern.affected_functions {
                let function_id = FunctionId::from_parts(&pattern.file, qualified_name);
                let function_id = function_id.as_str();

                let existing_texts: Vec<String> = match self.repo.get_contract(function_id) {
                    Ok(Some(row)) => ContractDocument::parse_and_validate(&row.document)
                        .map(|doc| doc.invariants.into_iter().map(|i| i.logic).collect())
                        .unwrap_or_default(),
                    _ => Vec::new(),
                };

                let (boost, suggestions) = diff::strengthen(std::slice::from_ref(pattern), &existing_texts);

                let event = NewLearningEvent {
                    commit_id,
                    commit_message,
                    function_id,
                    pattern_category: pattern.category.as_str(),
                    pattern_description: &format!("{:?} pattern in {}", pattern.category, pattern.file),
                    contract_modified: false,
                    confidence_boost: boost,
                    invariants_added: suggestions.len() as i64,
                    invariants_validated: 0,
                };
                if let Err(e) = self.repo.add_learning_event(&event) {
                    return respond_storage_error(&self.repo, e);
                }
                events_recorded += 1;

                if !suggestions.is_empty() {
                    suggestions_by_function.push((function_id.to_string(), suggestions));
                }
            }
        }

        DrspecResponse::ok(MiningReport {
            patterns_found: outcome.patterns.len(),
            bug_fix_score,
            events_recorded,
            suggestion_count: suggestions_by_function.iter().map(|(_, s)| s.len()).sum(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub functions_scanned: usize,
    pub queued: Vec<String>,
    /// Relative path -> number of parse issues collected for that file.
    pub file_errors: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractSaveReport {
    pub function_id: String,
    pub submitted_confidence: f64,
    pub adjusted_confidence: f64,
    pub findings_applied: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractView {
    pub function_id: String,
    pub document: String,
    pub confidence_display: f64,
    pub verification_script: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MiningReport {
    pub patterns_found: usize,
    pub bug_fix_score: f64,
    pub events_recorded: usize,
    pub suggestion_count: usize,
}

/// Wraps a `to_json` failure (never expected in practice, since the
/// document was just built from validated fields) as a displayable,
/// error-coded value so it can still flow through the envelope.
#[derive(Debug)]
struct ContractValidationErrorWrapper(String);

impl std::fmt::Display for ContractValidationErrorWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to re-encode contract document: {}", self.0)
    }
}

impl drspec_core::errors::DrspecErrorCode for ContractValidationErrorWrapper {
    fn error_code(&self) -> &'static str {
        drspec_core::errors::error_code::INTERNAL_ERROR
    }
}

/// §7 absence-error shape: attaches fuzzy `suggest_artifacts` matches to a
/// `FunctionNotFound`/`ContractNotFound` error's `details` so a caller can
/// surface "did you mean" without a second round trip.
fn respond_storage_error<T>(repo: &Repository, error: StorageError) -> DrspecResponse<T> {
    let missing_query = match &error {
        StorageError::FunctionNotFound(id) | StorageError::ContractNotFound(id) => Some(id.clone()),
        _ => None,
    };
    match missing_query {
        Some(query) => {
            let suggestions = repo.suggest_artifacts(&query).unwrap_or_default();
            DrspecResponse::err_with_details(error, serde_json::json!({ "suggestions": suggestions }))
        }
        None => DrspecResponse::err(error),
    }
}

fn respond_mining_error<T>(error: MiningError) -> DrspecResponse<T> {
    DrspecResponse::err(error)
}

/// Seeds the persisted `Config` row (§3) from the file-based config the
/// first time a database is opened with one, without overwriting a
/// threshold an operator already retuned at runtime via `config_set`.
fn seed_confidence_threshold(repo: &Repository, config: &DrspecConfig) -> Result<(), StorageError> {
    if config.confidence_threshold.is_none() {
        return Ok(());
    }
    if repo.config_get("confidence_threshold")?.is_some() {
        return Ok(());
    }
    repo.config_set("confidence_threshold", &config.effective_confidence_threshold().to_string())
}
