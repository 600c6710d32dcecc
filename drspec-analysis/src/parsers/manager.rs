//! ParserManager — routes files to the correct language parser and caches
//! results by content hash (§4.2).

use std::path::Path;

use drspec_core::Language;
use xxhash_rust::xxh3::xxh3_64;

use super::cache::ParseCache;
use super::languages::cpp::CppParser;
use super::languages::javascript::JavaScriptParser;
use super::languages::python::PythonParser;
use super::traits::LanguageParser;
use super::types::ParseResult;

pub struct ParserManager {
    cache: ParseCache,
    python: PythonParser,
    javascript: JavaScriptParser,
    cpp: CppParser,
}

impl ParserManager {
    pub fn new() -> Self {
        Self {
            cache: ParseCache::default(),
            python: PythonParser::new(),
            javascript: JavaScriptParser::new(),
            cpp: CppParser::new(),
        }
    }

    pub fn with_cache_capacity(capacity: u64) -> Self {
        Self {
            cache: ParseCache::new(capacity),
            ..Self::new()
        }
    }

    /// Detect language from a file extension (no leading dot).
    pub fn detect_language(&self, path: &Path) -> Option<Language> {
        Language::from_extension(path.extension().and_then(|e| e.to_str())?)
    }

    fn is_header(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Language::is_cpp_header)
            .unwrap_or(false)
    }

    /// Parse a file, using the cache if available. The language is detected
    /// from `path`'s extension.
    pub fn parse(&self, source: &str, path: &Path) -> Option<ParseResult> {
        let lang = self.detect_language(path)?;
        Some(self.parse_with_language(source, path, lang))
    }

    /// Parse a file with a known language (skips extension-based detection).
    pub fn parse_with_language(&self, source: &str, path: &Path, lang: Language) -> ParseResult {
        let is_header = Self::is_header(path);
        let content_hash = xxh3_64(source.as_bytes());

        if let Some(cached) = self.cache.get(content_hash, lang, is_header) {
            return cached;
        }

        let outcome = match lang {
            Language::Python => self.python.parse(source),
            Language::Javascript => self.javascript.parse(source),
            Language::Cpp => self.cpp.parse_as(source, is_header),
        };

        let result = ParseResult {
            language: lang,
            functions: outcome.functions,
            errors: outcome.errors,
        };

        self.cache.insert(content_hash, lang, is_header, result.clone());
        result
    }

    pub fn cache_entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn invalidate_cache(&self, source: &str, lang: Language, is_header: bool) {
        self.cache.invalidate(xxh3_64(source.as_bytes()), lang, is_header);
    }
}

impl Default for ParserManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn routes_by_extension() {
        let manager = ParserManager::new();
        let result = manager
            .parse("def f():\n    return 1\n", &PathBuf::from("mod.py"))
            .unwrap();
        assert_eq!(result.language, Language::Python);
        assert_eq!(result.functions[0].qualified_name, "f");
    }

    #[test]
    fn unknown_extension_returns_none() {
        let manager = ParserManager::new();
        assert!(manager.parse("whatever", &PathBuf::from("README.md")).is_none());
    }

    #[test]
    fn repeated_parse_hits_cache() {
        let manager = ParserManager::with_cache_capacity(16);
        let src = "def f():\n    return 1\n";
        let path = PathBuf::from("mod.py");
        manager.parse(src, &path);
        manager.parse(src, &path);
        assert_eq!(manager.cache_entry_count(), 1);
    }

    #[test]
    fn header_file_emits_declarations() {
        let manager = ParserManager::new();
        let result = manager
            .parse("int add(int a, int b);", &PathBuf::from("add.h"))
            .unwrap();
        assert!(result.functions[0].tags.contains(&"declaration".to_string()));
    }
}
