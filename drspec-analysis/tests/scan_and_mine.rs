//! Exercises the scanner and the diff miner together against real files on
//! disk, the way `drspec`'s facade drives them but without going through it.

use std::fs;

use drspec_analysis::diff::mine_diff_text;
use drspec_analysis::parsers::ParserManager;
use drspec_analysis::scanner::Scanner;

#[test]
fn scan_extracts_functions_methods_and_nested_defs_with_stable_ids() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("shapes.py"),
        "class Box:\n    def area(self):\n        def helper():\n            return 1\n        return helper() * self.w * self.h\n\n\ndef top_level(x):\n    return x\n",
    )
    .unwrap();

    let scanner = Scanner::new();
    let outcome = scanner.scan(dir.path(), false, &[]).unwrap();
    assert!(outcome.file_errors.is_empty(), "{:?}", outcome.file_errors);

    let names: Vec<&str> = outcome
        .functions
        .iter()
        .map(|f| f.qualified_name.as_str())
        .collect();
    assert!(names.contains(&"Box.area"));
    assert!(names.contains(&"Box.area.helper"));
    assert!(names.contains(&"top_level"));

    let area = outcome
        .functions
        .iter()
        .find(|f| f.qualified_name == "Box.area")
        .unwrap();
    assert!(area.is_method);
    assert_eq!(area.function_id.as_str(), "shapes.py::Box.area");
}

#[test]
fn ignored_directories_are_skipped_during_a_recursive_walk() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("kept.py"), "def kept():\n    return 1\n").unwrap();
    fs::create_dir_all(dir.path().join("node_modules")).unwrap();
    fs::write(
        dir.path().join("node_modules").join("vendored.py"),
        "def vendored():\n    return 2\n",
    )
    .unwrap();

    let scanner = Scanner::new();
    let outcome = scanner.scan(dir.path(), true, &[]).unwrap();
    let names: Vec<&str> = outcome
        .functions
        .iter()
        .map(|f| f.qualified_name.as_str())
        .collect();
    assert!(names.contains(&"kept"));
    assert!(!names.contains(&"vendored"));
}

#[test]
fn a_scanned_functions_hash_matches_what_the_miner_sees_for_the_same_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("guard.py"),
        "def f(x):\n    return x.value\n",
    )
    .unwrap();

    let scanner = Scanner::new();
    let outcome = scanner.scan(dir.path(), false, &[]).unwrap();
    let scanned = outcome
        .functions
        .iter()
        .find(|f| f.qualified_name == "f")
        .unwrap();
    assert_eq!(scanned.function_id.as_str(), "guard.py::f");

    let diff_text = "--- a/guard.py\n+++ b/guard.py\n@@ -1,2 +1,4 @@\n def f(x):\n+    if x is None:\n+        return None\n     return x.value\n";
    let post_image =
        "def f(x):\n    if x is None:\n        return None\n    return x.value\n";

    let parsers = ParserManager::new();
    let outcome = mine_diff_text(diff_text, &parsers, |path| {
        if path.ends_with("guard.py") {
            Some(post_image.to_string())
        } else {
            None
        }
    })
    .unwrap();

    assert_eq!(outcome.patterns.len(), 1);
    let pattern = &outcome.patterns[0];
    assert_eq!(pattern.affected_functions, vec!["f".to_string()]);
    assert_eq!(pattern.file, "guard.py");
}
