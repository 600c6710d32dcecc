//! Python function extractor (§4.2).

use std::collections::HashMap;
use tree_sitter::Node;

use crate::parsers::traits::LanguageParser;
use crate::parsers::types::{ParseIssue, ParseOutcome, ParsedFunction};

pub struct PythonParser;

impl PythonParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
struct Scope {
    name: String,
    is_class: bool,
}

impl LanguageParser for PythonParser {
    fn parse(&self, source: &str) -> ParseOutcome {
        let mut parser = tree_sitter::Parser::new();
        if parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .is_err()
        {
            return ParseOutcome::default();
        }
        let Some(tree) = parser.parse(source, None) else {
            return ParseOutcome::default();
        };

        let bytes = source.as_bytes();
        let mut functions = Vec::new();
        let mut errors = Vec::new();
        collect_errors(&tree.root_node(), &mut errors);
        walk(&tree.root_node(), bytes, &[], &mut functions);

        ParseOutcome {
            functions: dedup_last_writer_wins(functions),
            errors,
        }
    }
}

fn collect_errors(node: &Node, out: &mut Vec<ParseIssue>) {
    if node.is_error() || node.is_missing() {
        let pos = node.start_position();
        out.push(ParseIssue {
            line: pos.row + 1,
            column: pos.column + 1,
            message: format!("unexpected {}", node.kind()),
        });
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_errors(&child, out);
    }
}

fn text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn qualified(scope: &[Scope], name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        let prefix: Vec<&str> = scope.iter().map(|s| s.name.as_str()).collect();
        format!("{}.{}", prefix.join("."), name)
    }
}

fn parent_of(scope: &[Scope]) -> Option<String> {
    if scope.is_empty() {
        None
    } else {
        Some(
            scope
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join("."),
        )
    }
}

fn walk(node: &Node, source: &[u8], scope: &[Scope], out: &mut Vec<ParsedFunction>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                extract_function(&child, source, scope, &[], out);
            }
            "class_definition" => {
                extract_class(&child, source, scope, out);
            }
            "decorated_definition" => {
                let tags = decorator_tags(&child, source);
                if let Some(inner) = child
                    .children(&mut child.walk())
                    .find(|c| c.kind() == "function_definition" || c.kind() == "class_definition")
                {
                    if inner.kind() == "function_definition" {
                        extract_function(&inner, source, scope, &tags, out);
                    } else {
                        extract_class(&inner, source, scope, out);
                    }
                }
            }
            _ => {
                // Keep descending so top-level control-flow blocks (e.g. `if
                // __name__ == "__main__":`) don't hide nested defs.
                walk(&child, source, scope, out);
            }
        }
    }
}

fn decorator_tags(decorated: &Node, source: &[u8]) -> Vec<String> {
    let mut tags = Vec::new();
    let mut cursor = decorated.walk();
    for child in decorated.children(&mut cursor) {
        if child.kind() == "decorator" {
            tags.push(text(child, source).trim_start_matches('@').trim().to_string());
        }
    }
    tags
}

fn extract_function(
    node: &Node,
    source: &[u8],
    scope: &[Scope],
    extra_tags: &[String],
    out: &mut Vec<ParsedFunction>,
) {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(n, source).to_string())
        .unwrap_or_default();
    if name.is_empty() {
        return;
    }

    let params = node
        .child_by_field_name("parameters")
        .map(|n| text(n, source).to_string())
        .unwrap_or_else(|| "()".to_string());
    let is_async = node
        .child(0)
        .map(|c| text(c, source) == "async")
        .unwrap_or(false);
    let signature = if is_async {
        format!("async def {name}{params}:")
    } else {
        format!("def {name}{params}:")
    };

    let start_line = node.start_position().row + 1;
    let end_line = node.end_position().row + 1;
    let is_method = scope.last().map(|s| s.is_class).unwrap_or(false);

    out.push(ParsedFunction {
        name: name.clone(),
        qualified_name: qualified(scope, &name),
        signature,
        body: text(*node, source).to_string(),
        start_line,
        end_line,
        parent: parent_of(scope),
        tags: extra_tags.to_vec(),
        is_method,
        is_async,
    });

    if let Some(body) = node.child_by_field_name("body") {
        let mut nested_scope = scope.to_vec();
        nested_scope.push(Scope {
            name,
            is_class: false,
        });
        walk(&body, source, &nested_scope, out);
    }
}

fn extract_class(node: &Node, source: &[u8], scope: &[Scope], out: &mut Vec<ParsedFunction>) {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(n, source).to_string())
        .unwrap_or_default();
    if name.is_empty() {
        return;
    }
    if let Some(body) = node.child_by_field_name("body") {
        let mut nested_scope = scope.to_vec();
        nested_scope.push(Scope {
            name,
            is_class: true,
        });
        walk(&body, source, &nested_scope, out);
    }
}

/// Last definition of a given qualified name wins, per §4.2.
fn dedup_last_writer_wins(functions: Vec<ParsedFunction>) -> Vec<ParsedFunction> {
    let mut order: Vec<String> = Vec::new();
    let mut map: HashMap<String, ParsedFunction> = HashMap::new();
    for f in functions {
        if !map.contains_key(&f.qualified_name) {
            order.push(f.qualified_name.clone());
        }
        map.insert(f.qualified_name.clone(), f);
    }
    order.into_iter().filter_map(|name| map.remove(&name)).collect()
}
