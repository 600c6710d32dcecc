//! Tree-sitter based function extraction (C2, §4.2).

pub mod cache;
pub mod languages;
pub mod manager;
pub mod traits;
pub mod types;

pub use manager::ParserManager;
pub use traits::LanguageParser;
pub use types::{ParseIssue, ParseOutcome, ParseResult, ParsedFunction};
