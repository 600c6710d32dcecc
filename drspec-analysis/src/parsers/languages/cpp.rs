//! C/C++ function extractor (§4.2).

use std::collections::HashMap;
use tree_sitter::Node;

use crate::parsers::traits::LanguageParser;
use crate::parsers::types::{ParseIssue, ParseOutcome, ParsedFunction};

pub struct CppParser {
    /// Header files additionally emit bodiless declarations (§4.2). The
    /// scanner tells the parser whether the current file is a header via
    /// `parse_header`; plain `parse` assumes a translation unit.
    header_mode: bool,
}

impl CppParser {
    pub fn new() -> Self {
        Self { header_mode: false }
    }

    pub fn parse_as(&self, source: &str, is_header: bool) -> ParseOutcome {
        let parser = Self {
            header_mode: is_header,
        };
        parser.parse(source)
    }
}

impl Default for CppParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for CppParser {
    fn parse(&self, source: &str) -> ParseOutcome {
        let mut ts_parser = tree_sitter::Parser::new();
        if ts_parser
            .set_language(&tree_sitter_cpp::LANGUAGE.into())
            .is_err()
        {
            return ParseOutcome::default();
        }
        let Some(tree) = ts_parser.parse(source, None) else {
            return ParseOutcome::default();
        };

        let bytes = source.as_bytes();
        let mut functions = Vec::new();
        let mut errors = Vec::new();
        collect_errors(&tree.root_node(), &mut errors);
        walk(&tree.root_node(), bytes, &[], false, self.header_mode, &mut functions);

        ParseOutcome {
            functions: dedup_definitions_over_declarations(functions),
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

fn qualified(scope: &[String], name: &str) -> String {
    if name.contains("::") {
        // Out-of-class / out-of-namespace definitions are already fully
        // qualified by the declarator itself.
        name.to_string()
    } else if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", scope.join("::"), name)
    }
}

/// Walks a translation unit, namespace body, or class/struct body.
/// `in_class` tracks whether `declaration` nodes without a body should be
/// treated as method declarations (vs. free prototypes, only emitted for
/// headers per §4.2).
fn walk(
    node: &Node,
    source: &[u8],
    scope: &[String],
    in_class: bool,
    header_mode: bool,
    out: &mut Vec<ParsedFunction>,
) {
    let mut access = "public".to_string();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                extract_function(&child, source, scope, in_class, &access, &[], out);
            }
            "template_declaration" => {
                if let Some(inner) = child.children(&mut child.walk()).find(|c| {
                    matches!(
                        c.kind(),
                        "function_definition" | "class_specifier" | "struct_specifier" | "declaration"
                    )
                }) {
                    match inner.kind() {
                        "function_definition" => extract_function(
                            &inner,
                            source,
                            scope,
                            in_class,
                            &access,
                            &["template".to_string()],
                            out,
                        ),
                        "declaration" => {
                            if header_mode {
                                extract_declaration(
                                    &inner,
                                    source,
                                    scope,
                                    in_class,
                                    &access,
                                    &["template".to_string()],
                                    out,
                                );
                            }
                        }
                        "class_specifier" | "struct_specifier" => {
                            extract_class(&inner, source, scope, header_mode, out)
                        }
                        _ => {}
                    }
                }
            }
            "namespace_definition" => {
                let ns_name = child
                    .child_by_field_name("name")
                    .map(|n| text(n, source).to_string());
                if let (Some(ns_name), Some(body)) =
                    (ns_name, child.child_by_field_name("body"))
                {
                    let mut nested = scope.to_vec();
                    nested.push(ns_name);
                    walk(&body, source, &nested, false, header_mode, out);
                }
            }
            "class_specifier" | "struct_specifier" => {
                extract_class(&child, source, scope, header_mode, out);
            }
            "declaration" => {
                if header_mode {
                    extract_declaration(&child, source, scope, in_class, &access, &[], out);
                }
            }
            "access_specifier" => {
                access = text(child, source).trim_end_matches(':').to_string();
            }
            "field_declaration" => {
                // In-class method declarations/definitions surface as
                // `field_declaration` wrapping a `function_declarator`.
                if let Some(declarator) = find_function_declarator(&child) {
                    if child.child_by_field_name("body").is_some() {
                        extract_function(&child, source, scope, true, &access, &[], out);
                    } else if header_mode || in_class {
                        emit_from_declarator(
                            &declarator,
                            &child,
                            source,
                            scope,
                            true,
                            &access,
                            &["declaration".to_string()],
                            out,
                        );
                    }
                }
            }
            _ => {
                walk(&child, source, scope, in_class, header_mode, out);
            }
        }
    }
}

fn extract_class(
    node: &Node,
    source: &[u8],
    scope: &[String],
    header_mode: bool,
    out: &mut Vec<ParsedFunction>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let class_name = text(name_node, source).to_string();
    let Some(body) = node.child_by_field_name("body") else {
        return;
    };
    let mut nested = scope.to_vec();
    nested.push(class_name);
    walk(&body, source, &nested, true, header_mode, out);
}

fn declarator_name(declarator: &Node, source: &[u8]) -> String {
    match declarator.kind() {
        "qualified_identifier" | "identifier" | "field_identifier" => {
            text(*declarator, source).to_string()
        }
        "destructor_name" => text(*declarator, source).to_string(),
        "operator_name" => text(*declarator, source).to_string(),
        "function_declarator" => declarator
            .child_by_field_name("declarator")
            .map(|d| declarator_name(&d, source))
            .unwrap_or_default(),
        _ => {
            if let Some(inner) = declarator.child_by_field_name("declarator") {
                declarator_name(&inner, source)
            } else {
                text(*declarator, source).to_string()
            }
        }
    }
}

fn find_function_declarator<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    let declarator = node.child_by_field_name("declarator")?;
    if declarator.kind() == "function_declarator" {
        Some(declarator)
    } else {
        find_function_declarator(&declarator)
    }
}

fn extract_function(
    node: &Node,
    source: &[u8],
    scope: &[String],
    is_method: bool,
    access: &str,
    extra_tags: &[String],
    out: &mut Vec<ParsedFunction>,
) {
    let Some(func_declarator) = find_function_declarator(node) else {
        return;
    };
    emit_from_declarator(
        &func_declarator,
        node,
        source,
        scope,
        is_method,
        access,
        extra_tags,
        out,
    );
}

fn emit_from_declarator(
    func_declarator: &Node,
    whole_node: &Node,
    source: &[u8],
    scope: &[String],
    is_method: bool,
    access: &str,
    extra_tags: &[String],
    out: &mut Vec<ParsedFunction>,
) {
    let Some(name_node) = func_declarator.child_by_field_name("declarator") else {
        return;
    };
    let raw_name = declarator_name(&name_node, source);
    if raw_name.is_empty() {
        return;
    }

    let params = func_declarator
        .child_by_field_name("parameters")
        .map(|n| text(n, source).to_string())
        .unwrap_or_else(|| "()".to_string());

    let whole_text = text(*whole_node, source);
    let signature = whole_text
        .find('{')
        .map(|idx| whole_text[..idx].trim().to_string())
        .unwrap_or_else(|| format!("{raw_name}{params}"));

    let mut tags: Vec<String> = extra_tags.to_vec();
    tags.push(access.to_string());

    out.push(ParsedFunction {
        name: raw_name.rsplit("::").next().unwrap_or(&raw_name).to_string(),
        qualified_name: qualified(scope, &raw_name),
        signature,
        body: whole_text.to_string(),
        start_line: whole_node.start_position().row + 1,
        end_line: whole_node.end_position().row + 1,
        parent: if scope.is_empty() {
            None
        } else {
            Some(scope.join("::"))
        },
        tags,
        is_method,
        is_async: false,
    });
}

fn extract_declaration(
    node: &Node,
    source: &[u8],
    scope: &[String],
    is_method: bool,
    access: &str,
    extra_tags: &[String],
    out: &mut Vec<ParsedFunction>,
) {
    if let Some(func_declarator) = find_function_declarator(node) {
        let mut tags = extra_tags.to_vec();
        tags.push("declaration".to_string());
        emit_from_declarator(&func_declarator, node, source, scope, is_method, access, &tags, out);
    }
}

/// When a declaration and a definition share a qualified name in one
/// translation unit, keep only the definition (§4.2). A definition is any
/// `ParsedFunction` whose `tags` do not include `"declaration"`.
fn dedup_definitions_over_declarations(functions: Vec<ParsedFunction>) -> Vec<ParsedFunction> {
    let mut best: HashMap<String, ParsedFunction> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for f in functions {
        let is_decl = f.tags.iter().any(|t| t == "declaration");
        match best.get(&f.qualified_name) {
            None => {
                order.push(f.qualified_name.clone());
                best.insert(f.qualified_name.clone(), f);
            }
            Some(existing) => {
                let existing_is_decl = existing.tags.iter().any(|t| t == "declaration");
                if existing_is_decl && !is_decl {
                    best.insert(f.qualified_name.clone(), f);
                }
                // else: keep whichever definition/declaration was already kept.
            }
        }
    }
    order.into_iter().filter_map(|name| best.remove(&name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_free_function() {
        let outcome = CppParser::new().parse("int add(int a, int b) { return a + b; }");
        assert_eq!(outcome.functions[0].qualified_name, "add");
    }

    #[test]
    fn namespace_qualified_name_uses_double_colon() {
        let src = "namespace ns {\n  int f() { return 1; }\n}\n";
        let outcome = CppParser::new().parse(src);
        assert_eq!(outcome.functions[0].qualified_name, "ns::f");
    }

    #[test]
    fn in_class_method() {
        let src = "class Foo {\n public:\n  int bar() { return 1; }\n};\n";
        let outcome = CppParser::new().parse(src);
        assert_eq!(outcome.functions[0].qualified_name, "Foo::bar");
        assert!(outcome.functions[0].is_method);
        assert!(outcome.functions[0].tags.contains(&"public".to_string()));
    }

    #[test]
    fn out_of_class_definition_fully_qualified() {
        let src = "int Foo::bar() { return 1; }";
        let outcome = CppParser::new().parse(src);
        assert_eq!(outcome.functions[0].qualified_name, "Foo::bar");
    }

    #[test]
    fn header_declaration_tagged() {
        let outcome = CppParser::new().parse_as("int add(int a, int b);", true);
        assert!(outcome.functions[0]
            .tags
            .contains(&"declaration".to_string()));
    }

    #[test]
    fn declaration_and_definition_dedupe_to_definition() {
        let src = "int add(int a, int b);\nint add(int a, int b) { return a + b; }\n";
        let outcome = CppParser::new().parse_as(src, true);
        let matches: Vec<_> = outcome
            .functions
            .iter()
            .filter(|f| f.qualified_name == "add")
            .collect();
        assert_eq!(matches.len(), 1);
        assert!(!matches[0].tags.contains(&"declaration".to_string()));
    }
}
