//! Orchestrates diff parsing, pattern categorization, and the optional
//! git2-backed commit walk (§4.11).

use std::path::Path;

use drspec_core::errors::MiningError;
use drspec_core::Language;

use super::parser::parse_unified_diff;
use super::patterns::{bug_fix_score, categorize_hunk, suggestion_templates};
use super::types::{MinedPattern, MiningOutcome, SuggestedInvariant, UnifiedDiff};
use crate::parsers::ParserManager;

/// Mines structured patterns from already-parsed diff text. When
/// `post_image_sources` supplies a file's full post-image content, hunks
/// touching that file are additionally matched against the functions whose
/// line range intersects the hunk (§4.11 "modified functions").
pub fn mine(
    diff: &UnifiedDiff,
    parser_manager: &ParserManager,
    post_image_sources: impl Fn(&str) -> Option<String>,
) -> MiningOutcome {
    let mut patterns = Vec::new();

    for file in &diff.files {
        let Some(path) = file.effective_path() else {
            continue;
        };

        let functions = post_image_sources(path).and_then(|source| {
            let ext = Path::new(path).extension()?.to_str()?;
            let lang = Language::from_extension(ext)?;
            let result = parser_manager.parse_with_language(&source, Path::new(path), lang);
            Some(result.functions)
        });

        for hunk in &file.hunks {
            let Some((category, confidence)) = categorize_hunk(hunk) else {
                continue;
            };

            let affected_functions = functions
                .as_ref()
                .map(|fns| {
                    let hunk_end = hunk.new_start + hunk.new_count;
                    fns.iter()
                        .filter(|f| f.start_line <= hunk_end && f.end_line >= hunk.new_start)
                        .map(|f| f.qualified_name.clone())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();

            patterns.push(MinedPattern {
                file: path.to_string(),
                category,
                confidence,
                new_start: hunk.new_start,
                new_count: hunk.new_count,
                affected_functions,
            });
        }
    }

    MiningOutcome {
        patterns,
        bug_fix_score: None,
    }
}

pub fn mine_diff_text(
    diff_text: &str,
    parser_manager: &ParserManager,
    post_image_sources: impl Fn(&str) -> Option<String>,
) -> Result<MiningOutcome, MiningError> {
    let diff = parse_unified_diff(diff_text)?;
    Ok(mine(&diff, parser_manager, post_image_sources))
}

/// Strengthening (§4.11 step a+b): matches pattern categories against an
/// existing contract's invariant texts, and proposes new invariants from
/// per-category templates, dropping any whose name duplicates an existing
/// invariant.
pub fn strengthen(
    patterns: &[MinedPattern],
    existing_invariant_texts: &[String],
) -> (f64, Vec<SuggestedInvariant>) {
    let existing_lower: Vec<String> = existing_invariant_texts.iter().map(|s| s.to_lowercase()).collect();

    let mut confidence_boost = 0.0_f64;
    let mut suggestions = Vec::new();
    let mut seen_names = std::collections::HashSet::new();
    for text in &existing_lower {
        seen_names.insert(text.clone());
    }

    for pattern in patterns {
        let keyword = pattern.category.as_str().replace('_', " ");
        let matched_existing = existing_lower.iter().any(|text| text.contains(&keyword));
        if matched_existing {
            confidence_boost = (confidence_boost + 0.05).min(0.25);
        }

        for (name, logic_hint) in suggestion_templates(pattern.category).into_iter().take(2) {
            let lower_name = name.to_lowercase();
            if seen_names.contains(&lower_name) {
                continue;
            }
            seen_names.insert(lower_name);
            suggestions.push(SuggestedInvariant {
                name: name.to_string(),
                logic_hint: logic_hint.to_string(),
                category: pattern.category,
                criticality: pattern.category.criticality(),
                on_fail: pattern.category.on_fail(),
            });
        }
    }

    (confidence_boost, suggestions)
}

#[derive(Debug, Clone)]
pub struct CommitSummary {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub timestamp: i64,
    pub insertions: usize,
    pub deletions: usize,
}

/// Optional `git2`-backed convenience over raw diff-text mining: walks a
/// single commit's tree-to-tree diff and classifies the commit message.
/// The spec only requires diff-text input (`mine`/`mine_diff_text` above);
/// this exists so a caller holding a repo path doesn't have to shell out to
/// `git diff` first.
pub struct GitMiner;

impl GitMiner {
    /// Returns the commit's unified diff against its first parent (or the
    /// empty tree for a root commit), plus its message-based bug-fix score.
    pub fn analyze_commit(
        repo_path: &Path,
        commit_ish: &str,
    ) -> Result<(UnifiedDiff, CommitSummary), MiningError> {
        let repo = git2::Repository::open(repo_path).map_err(|e| MiningError::Git(e.to_string()))?;
        let object = repo
            .revparse_single(commit_ish)
            .map_err(|e| MiningError::Git(e.to_string()))?;
        let commit = object.peel_to_commit().map_err(|e| MiningError::Git(e.to_string()))?;

        let tree = commit.tree().map_err(|e| MiningError::Git(e.to_string()))?;
        let parent_tree = commit.parent(0).ok().and_then(|p| p.tree().ok());

        let mut diff_opts = git2::DiffOptions::new();
        diff_opts.context_lines(3);
        let diff = repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut diff_opts))
            .map_err(|e| MiningError::Git(e.to_string()))?;

        let mut buf = Vec::new();
        diff.print(git2::DiffFormat::Patch, |_delta, _hunk, line| {
            if !matches!(line.origin(), '+' | '-' | ' ') {
                buf.extend_from_slice(line.content());
            } else {
                buf.push(line.origin() as u8);
                buf.extend_from_slice(line.content());
            }
            true
        })
        .map_err(|e| MiningError::Git(e.to_string()))?;
        let diff_text = String::from_utf8_lossy(&buf).to_string();

        let stats = diff.stats().map_err(|e| MiningError::Git(e.to_string()))?;

        let message = commit.message().unwrap_or("").to_string();
        let summary = CommitSummary {
            sha: commit.id().to_string(),
            message,
            author: commit.author().name().unwrap_or("unknown").to_string(),
            timestamp: commit.time().seconds(),
            insertions: stats.insertions(),
            deletions: stats.deletions(),
        };

        let parsed_diff = parse_unified_diff(&diff_text)?;
        Ok((parsed_diff, summary))
    }
}

/// Exposed for callers who already have a commit message and just want the
/// classification (e.g. after `GitMiner::analyze_commit`).
pub fn classify_commit_message(message: &str) -> f64 {
    bug_fix_score(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::parser::parse_unified_diff;

    #[test]
    fn mine_matches_hunk_to_overlapping_function() {
        let diff_text = "diff --git a/mod.py b/mod.py\n--- a/mod.py\n+++ b/mod.py\n@@ -1,2 +1,3 @@\n def f(x):\n-    return x\n+    if x is None:\n+        return None\n+    return x\n";
        let diff = parse_unified_diff(diff_text).unwrap();
        let manager = ParserManager::new();
        let source = "def f(x):\n    if x is None:\n        return None\n    return x\n".to_string();
        let outcome = mine(&diff, &manager, |path| {
            if path == "mod.py" {
                Some(source.clone())
            } else {
                None
            }
        });
        assert_eq!(outcome.patterns.len(), 1);
        assert!(outcome.patterns[0]
            .affected_functions
            .contains(&"f".to_string()));
    }

    #[test]
    fn strengthen_drops_duplicate_suggestion_names() {
        let patterns = vec![MinedPattern {
            file: "mod.py".to_string(),
            category: super::super::types::PatternCategory::NullCheck,
            confidence: 0.5,
            new_start: 1,
            new_count: 3,
            affected_functions: vec!["f".to_string()],
        }];
        let existing = vec!["input is not null".to_string()];
        let (_boost, suggestions) = strengthen(&patterns, &existing);
        assert!(!suggestions.iter().any(|s| s.name == "input is not null"));
    }

    #[test]
    fn strengthen_boost_is_capped() {
        let mut patterns = Vec::new();
        for _ in 0..10 {
            patterns.push(MinedPattern {
                file: "mod.py".to_string(),
                category: super::super::types::PatternCategory::NullCheck,
                confidence: 0.5,
                new_start: 1,
                new_count: 3,
                affected_functions: vec![],
            });
        }
        let existing = vec!["argument must not be null".to_string()];
        let (boost, _) = strengthen(&patterns, &existing);
        assert!(boost <= 0.25);
    }
}
