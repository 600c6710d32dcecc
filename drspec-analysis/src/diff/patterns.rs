//! Per-category regex scoring and bug-fix message classification (§4.11).

use regex::Regex;
use std::sync::OnceLock;

use super::types::{Hunk, PatternCategory};

struct CategoryRules {
    category: PatternCategory,
    patterns: Vec<Regex>,
}

fn category_rules() -> &'static Vec<CategoryRules> {
    static RULES: OnceLock<Vec<CategoryRules>> = OnceLock::new();
    RULES.get_or_init(|| {
        let build = |category: PatternCategory, exprs: &[&str]| CategoryRules {
            category,
            patterns: exprs
                .iter()
                .map(|e| Regex::new(e).expect("static pattern regex"))
                .collect(),
        };
        vec![
            build(
                PatternCategory::NullCheck,
                &[
                    r"(?i)\bis_none\b",
                    r"(?i)\bis_some\b",
                    r"(?i)==\s*null\b",
                    r"(?i)!=\s*null\b",
                    r"(?i)\bis\s+None\b",
                    r"(?i)\bis\s+not\s+None\b",
                    r"(?i)\bNullPointerException\b",
                    r"(?i)\bnullptr\b",
                ],
            ),
            build(
                PatternCategory::BoundsCheck,
                &[
                    r"(?i)\bindex\s*(<|>=|<=|>)\s*\w*\.?len\(\)",
                    r"(?i)\bout[_ ]?of[_ ]?bounds\b",
                    r"(?i)\.size\(\)\s*(<|>)",
                    r"(?i)\blen\(\w+\)\s*(<|>)",
                ],
            ),
            build(
                PatternCategory::TypeCheck,
                &[
                    r"(?i)\bisinstance\(",
                    r"(?i)\btypeof\b",
                    r"(?i)\binstanceof\b",
                    r"(?i)\bstatic_cast<",
                    r"(?i)\bdynamic_cast<",
                ],
            ),
            build(
                PatternCategory::EmptyCheck,
                &[
                    r"(?i)\.is_empty\(\)",
                    r"(?i)\blen\(\w+\)\s*==\s*0\b",
                    r"(?i)\.length\s*===?\s*0\b",
                    r"(?i)\bnot\s+\w+\s*:\s*$",
                ],
            ),
            build(
                PatternCategory::DuplicateCheck,
                &[
                    r"(?i)\bduplicate\b",
                    r"(?i)\balready\s+exists\b",
                    r"(?i)\bseen\.(contains|insert)\b",
                    r"(?i)\.contains_key\(",
                ],
            ),
            build(
                PatternCategory::RangeCheck,
                &[
                    r"(?i)\bmin\(.+,.+\)",
                    r"(?i)\bmax\(.+,.+\)",
                    r"(?i)\bclamp\(",
                    r"(?i)\brange\(",
                ],
            ),
            build(
                PatternCategory::FormatCheck,
                &[
                    r"(?i)\bregex\b",
                    r"(?i)\bmatch\(.*pattern",
                    r"(?i)\bvalidate_format\b",
                    r"(?i)\.test\(",
                ],
            ),
            build(
                PatternCategory::ExceptionHandling,
                &[
                    r"(?i)\btry\s*\{",
                    r"(?i)\bcatch\s*\(",
                    r"(?i)\bexcept\b",
                    r"(?i)\braise\b",
                    r"(?i)\bthrow\b",
                    r"(?i)\.unwrap_or",
                    r"(?i)\bResult<",
                ],
            ),
            build(
                PatternCategory::OffByOne,
                &[
                    r"\+\s*1\b",
                    r"-\s*1\b",
                    r"(?i)\boff[- _]by[- _]one\b",
                    r"<=\s*\w*\.?len\(\)",
                ],
            ),
            build(
                PatternCategory::Initialization,
                &[
                    r"(?i)\binit\w*\(",
                    r"(?i)=\s*(None|null|nullptr|0|\[\]|\{\})\s*;?\s*$",
                    r"(?i)\bDefault::default\(\)",
                ],
            ),
            build(
                PatternCategory::ResourceManagement,
                &[
                    r"(?i)\bclose\(\)",
                    r"(?i)\bdrop\(",
                    r"(?i)\bfree\(",
                    r"(?i)\bwith\s+open\(",
                    r"(?i)\bfinally\b",
                    r"(?i)\bDrop\b",
                ],
            ),
            build(
                PatternCategory::Concurrency,
                &[
                    r"(?i)\bmutex\b",
                    r"(?i)\block\(\)",
                    r"(?i)\bAtomic\w*\b",
                    r"(?i)\basync\b",
                    r"(?i)\bawait\b",
                    r"(?i)\bRwLock\b",
                ],
            ),
        ]
    })
}

/// Scores a hunk against every category and returns the winning one with a
/// non-zero score, plus `min(1.0, best_score / 3.0)` confidence (§4.11).
/// Returns `None` when no category scores above zero or the hunk is
/// whitespace-only.
pub fn categorize_hunk(hunk: &Hunk) -> Option<(PatternCategory, f64)> {
    if hunk.is_whitespace_only() {
        return None;
    }

    let added: Vec<&str> = hunk.added_lines().collect();
    let removed: Vec<&str> = hunk.removed_lines().collect();

    let mut best: Option<(PatternCategory, f64)> = None;
    for rule in category_rules() {
        let mut score = 0.0;
        for pattern in &rule.patterns {
            let added_hits = added.iter().filter(|l| pattern.is_match(l)).count();
            let removed_hits = removed.iter().filter(|l| pattern.is_match(l)).count();
            score += added_hits as f64;
            if added_hits > 0 && removed_hits == 0 {
                score += 0.5;
            }
        }
        if score > 0.0 {
            let better = best.as_ref().map(|(_, s)| score > *s).unwrap_or(true);
            if better {
                best = Some((rule.category, score));
            }
        }
    }

    best.map(|(category, score)| (category, (score / 3.0).min(1.0)))
}

const BUG_FIX_KEYWORDS: &[&str] = &[
    "fix", "fixed", "fixes", "fixing", "bug", "bugfix", "hotfix", "patch", "patched", "repair",
    "repaired", "resolve", "resolved", "resolves", "issue", "closes", "closed", "error", "crash",
    "failure", "broken", "broke",
];

fn issue_reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(#\d+|GH-\d+|\b[A-Z]{2,}-\d+\b)").expect("static issue-reference regex")
    })
}

/// Heuristic bug-fix score for a commit message (§4.11). A message is
/// classified as a bug fix when the score is at least 0.3.
pub fn bug_fix_score(message: &str) -> f64 {
    let lower = message.to_lowercase();

    let keyword_count = BUG_FIX_KEYWORDS
        .iter()
        .filter(|kw| {
            let pattern = format!(r"\b{}\b", regex::escape(kw));
            Regex::new(&pattern).map(|re| re.is_match(&lower)).unwrap_or(false)
        })
        .count();
    let mut score = (0.2 * keyword_count as f64).min(0.5);

    if issue_reference_regex().is_match(message) {
        score += 0.3;
    }
    if lower.trim_start().starts_with("fix") {
        score += 0.2;
    }
    if lower.contains("bug") || lower.contains("error") {
        score += 0.15;
    }

    score.clamp(0.0, 1.0)
}

/// Up to two suggested invariant templates per category (§4.11
/// strengthening, step b).
pub fn suggestion_templates(category: PatternCategory) -> Vec<(&'static str, &'static str)> {
    match category {
        PatternCategory::NullCheck => vec![
            ("input is not null", "the argument must not be null/None before use"),
            ("result is not null on success", "a successful return must not yield null/None"),
        ],
        PatternCategory::BoundsCheck => vec![
            ("index stays within bounds", "any index used to access a collection must be < its length"),
            ("no negative index", "indices must be non-negative before use"),
        ],
        PatternCategory::TypeCheck => vec![
            ("argument has the expected type", "the value must match the expected runtime type before use"),
        ],
        PatternCategory::EmptyCheck => vec![
            ("collection is non-empty before use", "the collection must have at least one element"),
        ],
        PatternCategory::DuplicateCheck => vec![
            ("no duplicate entries", "the key must not already exist before insertion"),
        ],
        PatternCategory::RangeCheck => vec![
            ("value stays within its valid range", "the value must be clamped to its documented min/max"),
        ],
        PatternCategory::FormatCheck => vec![
            ("value matches the expected format", "the input must match the documented format before use"),
        ],
        PatternCategory::ExceptionHandling => vec![
            ("errors are caught and handled", "the call must not propagate an unhandled exception"),
            ("failure path returns a typed error", "on failure, the function returns a typed error rather than panicking"),
        ],
        PatternCategory::OffByOne => vec![
            ("loop bound is exact", "the loop must not read or write one past the intended range"),
        ],
        PatternCategory::Initialization => vec![
            ("state is initialized before use", "the field/variable must be assigned before it is read"),
        ],
        PatternCategory::ResourceManagement => vec![
            ("resource is released on every path", "the acquired resource must be closed/freed on every exit path, including errors"),
        ],
        PatternCategory::Concurrency => vec![
            ("shared state is guarded", "access to the shared value must hold the appropriate lock"),
        ],
        PatternCategory::Unknown => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::types::{DiffLine, LineKind};

    fn hunk_from(added: &[&str], removed: &[&str]) -> Hunk {
        let mut lines = Vec::new();
        for l in removed {
            lines.push(DiffLine {
                kind: LineKind::Removed,
                content: l.to_string(),
            });
        }
        for l in added {
            lines.push(DiffLine {
                kind: LineKind::Added,
                content: l.to_string(),
            });
        }
        Hunk {
            old_start: 1,
            old_count: removed.len(),
            new_start: 1,
            new_count: added.len(),
            lines,
        }
    }

    #[test]
    fn null_check_category_wins() {
        let hunk = hunk_from(&["if x.is_none() { return None; }"], &["return x;"]);
        let (category, confidence) = categorize_hunk(&hunk).unwrap();
        assert_eq!(category, PatternCategory::NullCheck);
        assert!(confidence > 0.0);
    }

    #[test]
    fn whitespace_only_hunk_is_skipped() {
        let hunk = hunk_from(&["  return x;"], &["return x;"]);
        assert!(categorize_hunk(&hunk).is_none());
    }

    #[test]
    fn bug_fix_score_crosses_threshold_with_keyword_and_issue_ref() {
        let score = bug_fix_score("fix: resolve crash on null input (#42)");
        assert!(score >= 0.3);
    }

    #[test]
    fn chore_message_scores_low() {
        let score = bug_fix_score("chore: update README");
        assert!(score < 0.3);
    }

    #[test]
    fn high_criticality_categories_use_error_on_fail() {
        assert_eq!(PatternCategory::NullCheck.on_fail(), drspec_core::types::OnFail::Error);
        assert_eq!(PatternCategory::FormatCheck.on_fail(), drspec_core::types::OnFail::Warn);
    }
}
