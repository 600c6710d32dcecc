//! C1 — language-aware code normalization and SHA-256 fingerprinting (§4.1).

use drspec_core::Language;
use sha2::{Digest, Sha256};

/// `code_hash(body, language) = SHA-256(normalize(body, language))`,
/// rendered as lowercase 64-hex.
pub fn code_hash(body: &str, language: Language) -> String {
    let normalized = normalize(body, language);
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Strip comments (language-appropriate), then per line: trim, collapse
/// internal whitespace runs, drop blank lines, rejoin with `\n`.
fn normalize(body: &str, language: Language) -> String {
    let stripped = strip_comments(body, language);
    stripped
        .lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_whitespace(line: &str) -> String {
    let trimmed = line.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut in_space = false;
    for ch in trimmed.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Code,
    LineComment,
    BlockComment,
    /// Holds the quote character that opened the string/char literal.
    StringLit(char),
    /// Python triple-quoted string; holds the quote character (`"` or `'`).
    TripleString(char),
}

/// Strips comments while honoring string/char literal contents, per §4.1.
/// Languages outside `{python, javascript, cpp}` pass through unchanged —
/// all three supported languages are covered here, so this never no-ops
/// in practice, but the match stays exhaustive-by-language for clarity.
fn strip_comments(body: &str, language: Language) -> String {
    match language {
        Language::Python => strip_comments_python(body),
        Language::Javascript | Language::Cpp => strip_comments_c_style(body),
    }
}

fn strip_comments_python(body: &str) -> String {
    let chars: Vec<char> = body.chars().collect();
    let mut out = String::with_capacity(body.len());
    let mut mode = Mode::Code;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let next2 = chars.get(i + 2).copied();
        match mode {
            Mode::Code => {
                if c == '#' {
                    mode = Mode::LineComment;
                    i += 1;
                } else if (c == '"' || c == '\'') && next == Some(c) && next2 == Some(c) {
                    mode = Mode::TripleString(c);
                    i += 3;
                } else if c == '"' || c == '\'' {
                    out.push(c);
                    mode = Mode::StringLit(c);
                    i += 1;
                } else {
                    out.push(c);
                    i += 1;
                }
            }
            Mode::LineComment => {
                if c == '\n' {
                    out.push(c);
                    mode = Mode::Code;
                }
                i += 1;
            }
            Mode::TripleString(q) => {
                if c == q && next == Some(q) && next2 == Some(q) {
                    mode = Mode::Code;
                    i += 3;
                } else {
                    if c == '\n' {
                        out.push(c);
                    }
                    i += 1;
                }
            }
            Mode::StringLit(q) => {
                out.push(c);
                if c == '\\' {
                    if let Some(escaped) = next {
                        out.push(escaped);
                        i += 2;
                        continue;
                    }
                } else if c == q {
                    mode = Mode::Code;
                }
                i += 1;
            }
            Mode::BlockComment => unreachable!("python has no block comments"),
        }
    }
    out
}

fn strip_comments_c_style(body: &str) -> String {
    let chars: Vec<char> = body.chars().collect();
    let mut out = String::with_capacity(body.len());
    let mut mode = Mode::Code;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match mode {
            Mode::Code => {
                if c == '/' && next == Some('/') {
                    mode = Mode::LineComment;
                    i += 2;
                } else if c == '/' && next == Some('*') {
                    mode = Mode::BlockComment;
                    i += 2;
                } else if c == '"' || c == '\'' || c == '`' {
                    out.push(c);
                    mode = Mode::StringLit(c);
                    i += 1;
                } else {
                    out.push(c);
                    i += 1;
                }
            }
            Mode::LineComment => {
                if c == '\n' {
                    out.push(c);
                    mode = Mode::Code;
                }
                i += 1;
            }
            Mode::BlockComment => {
                if c == '*' && next == Some('/') {
                    mode = Mode::Code;
                    i += 2;
                } else {
                    if c == '\n' {
                        out.push(c);
                    }
                    i += 1;
                }
            }
            Mode::StringLit(q) => {
                out.push(c);
                if c == '\\' {
                    if let Some(escaped) = next {
                        out.push(escaped);
                        i += 2;
                        continue;
                    }
                } else if c == q {
                    mode = Mode::Code;
                }
                i += 1;
            }
            Mode::TripleString(_) => unreachable!("c-style has no triple-quoted strings"),
        }
    }
    out
}
