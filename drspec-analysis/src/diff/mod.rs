//! Diff & Pattern Miner (C11, §4.11).

pub mod miner;
pub mod parser;
pub mod patterns;
pub mod types;

pub use miner::{classify_commit_message, mine, mine_diff_text, strengthen, CommitSummary, GitMiner};
pub use parser::parse_unified_diff;
pub use patterns::bug_fix_score;
pub use types::{
    DiffLine, FileDiff, Hunk, LineKind, MinedPattern, MiningOutcome, PatternCategory,
    SuggestedInvariant, UnifiedDiff,
};
