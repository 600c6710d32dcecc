//! Hand-rolled unified-diff parser (§4.11).
//!
//! Diff text handed to the miner isn't necessarily a git object — it can be
//! a raw patch from any source — so this parses the unified-diff grammar
//! directly rather than going through `git2`.

use drspec_core::errors::MiningError;

use super::types::{DiffLine, FileDiff, Hunk, LineKind, UnifiedDiff};

pub fn parse_unified_diff(text: &str) -> Result<UnifiedDiff, MiningError> {
    let mut files = Vec::new();
    let mut current: Option<FileDiff> = None;
    let mut current_hunk: Option<Hunk> = None;

    let flush_hunk = |file: &mut FileDiff, hunk: Option<Hunk>| {
        if let Some(h) = hunk {
            file.hunks.push(h);
        }
    };

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            if let Some(mut file) = current.take() {
                flush_hunk(&mut file, current_hunk.take());
                files.push(file);
            }
            let (old_guess, new_guess) = split_diff_git_header(rest);
            current = Some(FileDiff {
                old_path: old_guess,
                new_path: new_guess,
                ..Default::default()
            });
            continue;
        }

        if let Some(rest) = line.strip_prefix("--- ") {
            let file = current.get_or_insert_with(FileDiff::default);
            if rest.trim() == "/dev/null" {
                file.is_new_file = true;
                file.old_path = None;
            } else {
                file.old_path = Some(strip_ab_prefix(rest));
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("+++ ") {
            let file = current.get_or_insert_with(FileDiff::default);
            if rest.trim() == "/dev/null" {
                file.is_deleted_file = true;
                file.new_path = None;
            } else {
                file.new_path = Some(strip_ab_prefix(rest));
            }
            continue;
        }

        if line.starts_with("@@") {
            let file = current.get_or_insert_with(FileDiff::default);
            flush_hunk(file, current_hunk.take());
            current_hunk = Some(parse_hunk_header(line)?);
            continue;
        }

        if let Some(hunk) = current_hunk.as_mut() {
            if let Some(content) = line.strip_prefix('+') {
                hunk.lines.push(DiffLine {
                    kind: LineKind::Added,
                    content: content.to_string(),
                });
            } else if let Some(content) = line.strip_prefix('-') {
                hunk.lines.push(DiffLine {
                    kind: LineKind::Removed,
                    content: content.to_string(),
                });
            } else {
                let content = line.strip_prefix(' ').unwrap_or(line);
                hunk.lines.push(DiffLine {
                    kind: LineKind::Context,
                    content: content.to_string(),
                });
            }
        }
    }

    if let Some(mut file) = current.take() {
        flush_hunk(&mut file, current_hunk.take());
        files.push(file);
    }

    Ok(UnifiedDiff { files })
}

fn strip_ab_prefix(path: &str) -> String {
    let trimmed = path.trim();
    let tab_stripped = trimmed.split('\t').next().unwrap_or(trimmed);
    tab_stripped
        .strip_prefix("a/")
        .or_else(|| tab_stripped.strip_prefix("b/"))
        .unwrap_or(tab_stripped)
        .to_string()
}

fn split_diff_git_header(rest: &str) -> (Option<String>, Option<String>) {
    let mut parts = rest.split_whitespace();
    let a = parts.next().map(strip_ab_prefix);
    let b = parts.next().map(strip_ab_prefix);
    (a, b)
}

/// Parses `@@ -old_start[,old_count] +new_start[,new_count] @@ header`.
fn parse_hunk_header(line: &str) -> Result<Hunk, MiningError> {
    let body = line
        .trim_start_matches('@')
        .trim();
    let end = body
        .find("@@")
        .map(|i| i)
        .unwrap_or(body.len());
    let ranges = body[..end].trim();

    let mut iter = ranges.split_whitespace();
    let old_range = iter
        .next()
        .ok_or_else(|| MiningError::MalformedDiff(line.to_string()))?;
    let new_range = iter
        .next()
        .ok_or_else(|| MiningError::MalformedDiff(line.to_string()))?;

    let (old_start, old_count) = parse_range(old_range, '-', line)?;
    let (new_start, new_count) = parse_range(new_range, '+', line)?;

    Ok(Hunk {
        old_start,
        old_count,
        new_start,
        new_count,
        lines: Vec::new(),
    })
}

fn parse_range(token: &str, sigil: char, raw_line: &str) -> Result<(usize, usize), MiningError> {
    let token = token
        .strip_prefix(sigil)
        .ok_or_else(|| MiningError::MalformedDiff(raw_line.to_string()))?;
    let mut parts = token.splitn(2, ',');
    let start: usize = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| MiningError::MalformedDiff(raw_line.to_string()))?;
    let count: usize = match parts.next() {
        Some(c) => c
            .parse()
            .map_err(|_| MiningError::MalformedDiff(raw_line.to_string()))?,
        None => 1,
    };
    Ok((start, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "diff --git a/src/lib.rs b/src/lib.rs\n\
--- a/src/lib.rs\n\
+++ b/src/lib.rs\n\
@@ -10,3 +10,4 @@ fn compute() {\n\
     let x = 1;\n\
-    return x;\n\
+    if x.is_none() { return None; }\n\
+    return Some(x);\n";

    #[test]
    fn parses_file_paths() {
        let diff = parse_unified_diff(SAMPLE).unwrap();
        assert_eq!(diff.files.len(), 1);
        assert_eq!(diff.files[0].new_path.as_deref(), Some("src/lib.rs"));
    }

    #[test]
    fn parses_hunk_ranges_and_lines() {
        let diff = parse_unified_diff(SAMPLE).unwrap();
        let hunk = &diff.files[0].hunks[0];
        assert_eq!(hunk.old_start, 10);
        assert_eq!(hunk.new_start, 10);
        assert_eq!(hunk.new_count, 4);
        assert_eq!(hunk.added_lines().count(), 2);
        assert_eq!(hunk.removed_lines().count(), 1);
    }

    #[test]
    fn new_file_marker_is_recognized() {
        let text = "diff --git a/new.py b/new.py\n--- /dev/null\n+++ b/new.py\n@@ -0,0 +1,2 @@\n+def f():\n+    return 1\n";
        let diff = parse_unified_diff(text).unwrap();
        assert!(diff.files[0].is_new_file);
    }

    #[test]
    fn malformed_hunk_header_is_an_error() {
        let text = "diff --git a/x b/x\n--- a/x\n+++ b/x\n@@ garbage @@\n";
        assert!(parse_unified_diff(text).is_err());
    }
}
