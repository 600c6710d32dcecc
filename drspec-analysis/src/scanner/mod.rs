//! Top-level Scanner: walks a directory, dispatches files to parsers, and
//! assembles `ScannedFunction` records (C3, §4.3).

pub mod types;
pub mod walker;

use std::fs;
use std::path::Path;

use drspec_core::errors::ScanError;
use drspec_core::types::FunctionId;

use crate::hasher::code_hash;
use crate::hints::extract_hints;
use crate::parsers::ParserManager;

pub use types::{DiscoveredFile, ScanOutcome, ScannedFunction};

pub struct Scanner {
    parsers: ParserManager,
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            parsers: ParserManager::new(),
        }
    }

    /// Scan `root`, dispatching every recognized file to its language parser.
    /// `recursive = false` restricts the walk to `root`'s immediate children.
    /// Per-file parse issues are collected, never abort the overall scan (§7).
    pub fn scan(
        &self,
        root: &Path,
        recursive: bool,
        extra_ignore: &[String],
    ) -> Result<ScanOutcome, ScanError> {
        let files = walker::walk_directory(root, recursive, extra_ignore)?;

        let mut functions = Vec::new();
        let mut file_errors = Vec::new();

        for file in &files {
            let source = match fs::read_to_string(&file.path) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(path = %file.path.display(), error = %e, "unreadable file, skipping");
                    continue;
                }
            };

            let result = self
                .parsers
                .parse_with_language(&source, &file.path, file.language);

            if !result.errors.is_empty() {
                file_errors.push((file.relative_path.clone(), result.errors));
            }

            for parsed in result.functions {
                let function_id =
                    FunctionId::from_parts(&file.relative_path, &parsed.qualified_name);
                let hash = code_hash(&parsed.body, file.language);
                let hints = extract_hints(&parsed.body, file.language, parsed.start_line);

                functions.push(ScannedFunction {
                    function_id,
                    name: parsed.name,
                    qualified_name: parsed.qualified_name,
                    signature: parsed.signature,
                    body: parsed.body,
                    start_line: parsed.start_line,
                    end_line: parsed.end_line,
                    parent: parsed.parent,
                    tags: parsed.tags,
                    is_method: parsed.is_method,
                    is_async: parsed.is_async,
                    code_hash: hash,
                    language: file.language,
                    hints,
                });
            }
        }

        Ok(ScanOutcome {
            functions,
            file_errors,
        })
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn scans_python_file_into_function_ids() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mod.py"), "def f(x):\n    return x + 1\n").unwrap();

        let scanner = Scanner::new();
        let outcome = scanner.scan(dir.path(), true, &[]).unwrap();

        assert_eq!(outcome.functions.len(), 1);
        assert_eq!(outcome.functions[0].function_id.as_str(), "mod.py::f");
    }

    #[test]
    fn collects_parse_errors_without_aborting() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.py"), "def f():\n    return 1\n").unwrap();
        fs::write(dir.path().join("bad.py"), "def f(:\n").unwrap();

        let scanner = Scanner::new();
        let outcome = scanner.scan(dir.path(), true, &[]).unwrap();

        assert!(outcome.functions.iter().any(|f| f.function_id.path() == "good.py"));
    }
}
