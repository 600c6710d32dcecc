//! JavaScript/TypeScript function extractor (§4.2).
//!
//! Shares one parser between `.js/.jsx/.mjs/.cjs` and `.ts/.tsx` — the
//! language-detect step in the scanner already folded both into a single
//! `Language::Javascript` tag (§4.3), so this always parses with the
//! TypeScript grammar, a strict superset for the constructs we extract.

use std::collections::HashMap;
use tree_sitter::Node;

use crate::parsers::traits::LanguageParser;
use crate::parsers::types::{ParseIssue, ParseOutcome, ParsedFunction};

pub struct JavaScriptParser;

impl JavaScriptParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JavaScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
struct Scope {
    name: String,
    is_class: bool,
}

impl LanguageParser for JavaScriptParser {
    fn parse(&self, source: &str) -> ParseOutcome {
        let mut parser = tree_sitter::Parser::new();
        if parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())
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
        walk(&tree.root_node(), bytes, &[], &[], &mut functions);

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
        Some(scope.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join("."))
    }
}

fn has_child_kind(node: &Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == kind)
}

fn leading_keyword(node: &Node, source: &[u8], keyword: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .take_while(|c| c.kind() != "identifier" && c.kind() != "property_identifier")
        .any(|c| text(c, source) == keyword)
}

fn walk(
    node: &Node,
    source: &[u8],
    scope: &[Scope],
    inherited_tags: &[String],
    out: &mut Vec<ParsedFunction>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "export_statement" => {
                let mut tags = inherited_tags.to_vec();
                tags.push("export".to_string());
                walk(&child, source, scope, &tags, out);
            }
            "function_declaration" | "generator_function_declaration" => {
                extract_named_function(&child, source, scope, inherited_tags, out);
            }
            "class_declaration" => {
                extract_class(&child, source, scope, out);
            }
            "lexical_declaration" | "variable_declaration" => {
                extract_from_declarators(&child, source, scope, inherited_tags, out);
            }
            _ => {
                walk(&child, source, scope, inherited_tags, out);
            }
        }
    }
}

fn extract_named_function(
    node: &Node,
    source: &[u8],
    scope: &[Scope],
    tags: &[String],
    out: &mut Vec<ParsedFunction>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = text(name_node, source).to_string();
    let is_async = leading_keyword(node, source, "async");
    let params = node
        .child_by_field_name("parameters")
        .map(|n| text(n, source).to_string())
        .unwrap_or_else(|| "()".to_string());
    let signature = format!(
        "{}function {name}{params}",
        if is_async { "async " } else { "" }
    );

    out.push(ParsedFunction {
        name: name.clone(),
        qualified_name: qualified(scope, &name),
        signature,
        body: text(*node, source).to_string(),
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
        parent: parent_of(scope),
        tags: tags.to_vec(),
        is_method: false,
        is_async,
    });

    if let Some(body) = node.child_by_field_name("body") {
        let mut nested = scope.to_vec();
        nested.push(Scope {
            name,
            is_class: false,
        });
        walk(&body, source, &nested, &[], out);
    }
}

fn extract_from_declarators(
    node: &Node,
    source: &[u8],
    scope: &[Scope],
    tags: &[String],
    out: &mut Vec<ParsedFunction>,
) {
    let mut cursor = node.walk();
    for declarator in node.children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name_node) = declarator.child_by_field_name("name") else {
            continue;
        };
        let Some(value) = declarator.child_by_field_name("value") else {
            continue;
        };
        if !matches!(value.kind(), "arrow_function" | "function" | "function_expression") {
            continue;
        }
        let name = text(name_node, source).to_string();
        let is_async = leading_keyword(&value, source, "async");
        let params = value
            .child_by_field_name("parameters")
            .map(|n| text(n, source).to_string())
            .unwrap_or_else(|| "()".to_string());
        let signature = format!(
            "const {name} = {}{params} =>",
            if is_async { "async " } else { "" }
        );

        out.push(ParsedFunction {
            name: name.clone(),
            qualified_name: qualified(scope, &name),
            signature,
            body: text(declarator, source).to_string(),
            start_line: declarator.start_position().row + 1,
            end_line: declarator.end_position().row + 1,
            parent: parent_of(scope),
            tags: tags.to_vec(),
            is_method: false,
            is_async,
        });

        if let Some(body) = value.child_by_field_name("body") {
            let mut nested = scope.to_vec();
            nested.push(Scope {
                name,
                is_class: false,
            });
            walk(&body, source, &nested, &[], out);
        }
    }
}

fn extract_class(node: &Node, source: &[u8], scope: &[Scope], out: &mut Vec<ParsedFunction>) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let class_name = text(name_node, source).to_string();
    let Some(body) = node.child_by_field_name("body") else {
        return;
    };

    let mut nested = scope.to_vec();
    nested.push(Scope {
        name: class_name,
        is_class: true,
    });

    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        match member.kind() {
            "method_definition" => {
                extract_method(&member, source, &nested, out);
            }
            "field_definition" | "public_field_definition" => {
                extract_class_field(&member, source, &nested, out);
            }
            _ => {}
        }
    }
}

fn extract_method(node: &Node, source: &[u8], scope: &[Scope], out: &mut Vec<ParsedFunction>) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let raw_name = text(name_node, source).to_string();
    let is_getter = leading_keyword(node, source, "get");
    let is_setter = leading_keyword(node, source, "set");
    let name = if is_getter {
        format!("get_{raw_name}")
    } else if is_setter {
        format!("set_{raw_name}")
    } else {
        raw_name
    };
    let is_async = leading_keyword(node, source, "async");
    let params = node
        .child_by_field_name("parameters")
        .map(|n| text(n, source).to_string())
        .unwrap_or_else(|| "()".to_string());
    let signature = format!(
        "{}{name}{params}",
        if is_async { "async " } else { "" }
    );

    out.push(ParsedFunction {
        name: name.clone(),
        qualified_name: qualified(scope, &name),
        signature,
        body: text(*node, source).to_string(),
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
        parent: parent_of(scope),
        tags: Vec::new(),
        is_method: true,
        is_async,
    });

    if let Some(body) = node.child_by_field_name("body") {
        let mut nested = scope.to_vec();
        nested.push(Scope {
            name,
            is_class: false,
        });
        walk(&body, source, &nested, &[], out);
    }
}

fn extract_class_field(node: &Node, source: &[u8], scope: &[Scope], out: &mut Vec<ParsedFunction>) {
    let Some(name_node) = node.child_by_field_name("property") else {
        return;
    };
    let Some(value) = node.child_by_field_name("value") else {
        return;
    };
    if !matches!(value.kind(), "arrow_function" | "function" | "function_expression") {
        return;
    }
    let name = text(name_node, source).to_string();
    let is_async = leading_keyword(&value, source, "async");
    let params = value
        .child_by_field_name("parameters")
        .map(|n| text(n, source).to_string())
        .unwrap_or_else(|| "()".to_string());
    let signature = format!(
        "{name} = {}{params} =>",
        if is_async { "async " } else { "" }
    );

    out.push(ParsedFunction {
        name: name.clone(),
        qualified_name: qualified(scope, &name),
        signature,
        body: text(*node, source).to_string(),
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
        parent: parent_of(scope),
        tags: Vec::new(),
        is_method: true,
        is_async,
    });
    let _ = has_child_kind; // retained for future static/generator tagging
}

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_function_declaration() {
        let outcome = JavaScriptParser::new().parse("function f(x) { return x + 1; }");
        assert_eq!(outcome.functions[0].qualified_name, "f");
    }

    #[test]
    fn extracts_arrow_function_bound_to_const() {
        let outcome = JavaScriptParser::new().parse("const f = (x) => x + 1;");
        assert_eq!(outcome.functions[0].qualified_name, "f");
        assert!(!outcome.functions[0].is_method);
    }

    #[test]
    fn export_adds_tag() {
        let outcome = JavaScriptParser::new().parse("export function f() { return 1; }");
        assert!(outcome.functions[0].tags.contains(&"export".to_string()));
    }

    #[test]
    fn class_method_qualified_name() {
        let src = "class Foo {\n  bar() {\n    return 1;\n  }\n}\n";
        let outcome = JavaScriptParser::new().parse(src);
        assert_eq!(outcome.functions[0].qualified_name, "Foo.bar");
        assert!(outcome.functions[0].is_method);
    }

    #[test]
    fn getter_and_setter_are_disambiguated() {
        let src = "class Foo {\n  get value() { return 1; }\n  set value(v) {}\n}\n";
        let outcome = JavaScriptParser::new().parse(src);
        let names: Vec<&str> = outcome.functions.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"get_value"));
        assert!(names.contains(&"set_value"));
    }

    #[test]
    fn async_arrow_sets_flag() {
        let outcome = JavaScriptParser::new().parse("const f = async (x) => x;");
        assert!(outcome.functions[0].is_async);
    }
}
