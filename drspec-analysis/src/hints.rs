//! C4 — extracts `@invariant`/`@pre`/`@post`/`@requires` annotations from
//! comments inside a function body (§4.8).

use drspec_core::Language;
use std::collections::HashSet;

/// One extracted hint: the 1-indexed line in the *file* (offset by the
/// artifact's `start_line`), the tag kind (lowercased, without `@`), and
/// the trailing text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hint {
    pub line: usize,
    pub kind: String,
    pub text: String,
}

const TAGS: &[&str] = &["invariant", "pre", "post", "requires"];

/// Extract hints from `body`, whose first line is `start_line` in the
/// enclosing file.
pub fn extract_hints(body: &str, language: Language, start_line: usize) -> Vec<Hint> {
    let mut hints = Vec::new();
    let mut seen = HashSet::new();

    for region in comment_regions(body, language) {
        for (line_in_region, line_text) in region.text.lines().enumerate() {
            let file_line = start_line + region.start_line + line_in_region;
            for hint in find_tags_in_line(line_text) {
                let key = (file_line, hint.0.clone(), hint.1.clone());
                if seen.insert(key) {
                    hints.push(Hint {
                        line: file_line,
                        kind: hint.0,
                        text: hint.1,
                    });
                }
            }
        }
    }

    hints.sort_by_key(|h| h.line);
    hints
}

fn find_tags_in_line(line: &str) -> Vec<(String, String)> {
    let lower = line.to_ascii_lowercase();
    let mut out = Vec::new();
    for tag in TAGS {
        let needle = format!("@{tag}");
        let mut search_from = 0;
        while let Some(rel) = lower[search_from..].find(&needle) {
            let pos = search_from + rel;
            let after = pos + needle.len();
            let rest = line[after..].trim_start();
            let rest = rest.strip_prefix(':').unwrap_or(rest).trim();
            out.push((tag.to_string(), rest.to_string()));
            search_from = after;
        }
    }
    out
}

struct CommentRegion {
    /// Line offset (0-indexed) within `body` where this region starts.
    start_line: usize,
    text: String,
}

/// Finds comment regions appropriate to the language, reusing the same
/// scan styles as the hasher's comment stripper but collecting the
/// comment *text* instead of discarding it.
fn comment_regions(body: &str, language: Language) -> Vec<CommentRegion> {
    match language {
        Language::Python => python_comment_regions(body),
        Language::Javascript | Language::Cpp => c_style_comment_regions(body),
    }
}

fn line_of(body: &str, byte_offset: usize) -> usize {
    body[..byte_offset].matches('\n').count()
}

fn python_comment_regions(body: &str) -> Vec<CommentRegion> {
    let mut regions = Vec::new();
    let bytes = body.as_bytes();
    let mut i = 0;
    let mut in_string: Option<u8> = None;
    while i < bytes.len() {
        let c = bytes[i];
        if let Some(q) = in_string {
            if c == b'\\' {
                i += 2;
                continue;
            }
            if c == q {
                in_string = None;
            }
            i += 1;
            continue;
        }
        if c == b'#' {
            let start = i;
            let end = body[i..]
                .find('\n')
                .map(|r| i + r)
                .unwrap_or(body.len());
            regions.push(CommentRegion {
                start_line: line_of(body, start),
                text: body[start..end].to_string(),
            });
            i = end;
            continue;
        }
        if (c == b'"' || c == b'\'')
            && bytes.get(i + 1) == Some(&c)
            && bytes.get(i + 2) == Some(&c)
        {
            let q = c;
            let start = i;
            let mut j = i + 3;
            while j + 2 < bytes.len() {
                if bytes[j] == q && bytes[j + 1] == q && bytes[j + 2] == q {
                    j += 3;
                    break;
                }
                j += 1;
            }
            let end = j.min(body.len());
            regions.push(CommentRegion {
                start_line: line_of(body, start),
                text: body[start..end].to_string(),
            });
            i = end;
            continue;
        }
        if c == b'"' || c == b'\'' {
            in_string = Some(c);
        }
        i += 1;
    }
    regions
}

fn c_style_comment_regions(body: &str) -> Vec<CommentRegion> {
    let mut regions = Vec::new();
    let bytes = body.as_bytes();
    let mut i = 0;
    let mut in_string: Option<u8> = None;
    while i < bytes.len() {
        let c = bytes[i];
        if let Some(q) = in_string {
            if c == b'\\' {
                i += 2;
                continue;
            }
            if c == q {
                in_string = None;
            }
            i += 1;
            continue;
        }
        if c == b'/' && bytes.get(i + 1) == Some(&b'/') {
            let start = i;
            let end = body[i..].find('\n').map(|r| i + r).unwrap_or(body.len());
            regions.push(CommentRegion {
                start_line: line_of(body, start),
                text: body[start..end].to_string(),
            });
            i = end;
            continue;
        }
        if c == b'/' && bytes.get(i + 1) == Some(&b'*') {
            let start = i;
            let end = body[i..]
                .find("*/")
                .map(|r| i + r + 2)
                .unwrap_or(body.len());
            regions.push(CommentRegion {
                start_line: line_of(body, start),
                text: body[start..end].to_string(),
            });
            i = end;
            continue;
        }
        if c == b'"' || c == b'\'' || c == b'`' {
            in_string = Some(c);
        }
        i += 1;
    }
    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_python_docstring_hints() {
        let body = "def f(x):\n    \"\"\"\n    @invariant: x > 0\n    @pre x is not None\n    \"\"\"\n    return x\n";
        let hints = extract_hints(body, Language::Python, 10);
        assert_eq!(hints.len(), 2);
        assert_eq!(hints[0].kind, "invariant");
        assert_eq!(hints[0].text, "x > 0");
        assert_eq!(hints[1].kind, "pre");
        assert_eq!(hints[1].text, "x is not None");
    }

    #[test]
    fn dedupes_same_line_and_text() {
        let body = "// @invariant: x > 0\n// @invariant: x > 0\nint f() { return 1; }";
        let hints = extract_hints(body, Language::Cpp, 1);
        assert_eq!(hints.len(), 1);
    }

    #[test]
    fn case_insensitive_tag_match() {
        let body = "// @INVARIANT: ok\nint f() { return 1; }";
        let hints = extract_hints(body, Language::Cpp, 1);
        assert_eq!(hints[0].kind, "invariant");
        assert_eq!(hints[0].text, "ok");
    }

    #[test]
    fn sorted_by_line() {
        let body = "/* @post: b */\nint f() {\n  // @pre: a\n  return 1;\n}\n";
        let hints = extract_hints(body, Language::Cpp, 5);
        assert!(hints[0].line < hints[1].line);
    }
}
