use super::types::ParseOutcome;

/// Implemented once per supported language. `parse` must be read-only over
/// the tree-sitter tree and must not rely on any language-specific runtime
/// state (§9 design notes).
pub trait LanguageParser {
    fn parse(&self, source: &str) -> ParseOutcome;
}
