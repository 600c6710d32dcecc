//! Parse cache: Moka in-memory cache keyed by (content hash, language, is_header).
//! Same bytes reparsed under a different language or header-ness get separate
//! entries, since C/C++ header mode changes what the parser emits (§4.2).

use moka::sync::Cache;

use super::types::ParseResult;
use drspec_core::Language;

type CacheKey = (u64, Language, bool);

/// In-memory parse cache using Moka (TinyLFU admission).
pub struct ParseCache {
    inner: Cache<CacheKey, ParseResult>,
}

impl ParseCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::new(capacity),
        }
    }

    pub fn get(&self, content_hash: u64, lang: Language, is_header: bool) -> Option<ParseResult> {
        self.inner.get(&(content_hash, lang, is_header))
    }

    pub fn insert(&self, content_hash: u64, lang: Language, is_header: bool, result: ParseResult) {
        self.inner.insert((content_hash, lang, is_header), result);
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    pub fn invalidate(&self, content_hash: u64, lang: Language, is_header: bool) {
        self.inner.invalidate(&(content_hash, lang, is_header));
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        // Default: cache up to 10,000 parse results.
        Self::new(10_000)
    }
}
