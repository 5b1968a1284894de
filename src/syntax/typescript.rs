//! Lowering of tree-sitter TypeScript/JavaScript trees into [`SyntaxNode`]s.
//!
//! The TypeScript, TSX and JavaScript grammars share node names for every
//! construct the extractor cares about, so one lowering serves all three.

use tree_sitter::{Language, Node};

use super::{FunctionNode, NodeKind, ObjectEntry, PropertyEntry, Span, SyntaxNode};

/// Grammar used to parse a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    TypeScript,
    Tsx,
    JavaScript,
}

impl SourceLanguage {
    /// Determine the grammar from a file extension (without dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" | "mts" | "cts" => Some(SourceLanguage::TypeScript),
            "tsx" => Some(SourceLanguage::Tsx),
            "js" | "jsx" | "mjs" | "cjs" => Some(SourceLanguage::JavaScript),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLanguage::TypeScript => "typescript",
            SourceLanguage::Tsx => "tsx",
            SourceLanguage::JavaScript => "javascript",
        }
    }

    pub fn grammar(&self) -> Language {
        match self {
            SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            SourceLanguage::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

/// Wrappers that do not change the value of the wrapped expression.
const TRANSPARENT_KINDS: &[&str] = &[
    "parenthesized_expression",
    "as_expression",
    "satisfies_expression",
    "non_null_expression",
];

const FUNCTION_KINDS: &[&str] = &[
    "function_expression",
    "function",
    "function_declaration",
    "generator_function",
    "generator_function_declaration",
];

/// Nesting depth past which subtrees are lowered to an empty
/// [`NodeKind::Other`]. Keeps lowering and the lowered tree's drop off the
/// call stack limit for generated or pathological sources.
pub const MAX_LOWERING_DEPTH: usize = 256;

/// Lower a tree-sitter node and its subtree.
pub fn lower(node: Node, source: &[u8]) -> SyntaxNode {
    lower_at(node, source, 0)
}

fn lower_at(node: Node, source: &[u8], depth: usize) -> SyntaxNode {
    let span = Span::from_node(node);
    if depth >= MAX_LOWERING_DEPTH {
        return SyntaxNode::new(NodeKind::Other(Vec::new()), span);
    }
    let next = depth + 1;

    if TRANSPARENT_KINDS.contains(&node.kind()) {
        if let Some(inner) = first_named(node) {
            return lower_at(inner, source, next);
        }
    }

    let kind = match node.kind() {
        "program" => NodeKind::Program(lower_children(node, source, next)),
        "lexical_declaration" | "variable_declaration" => {
            NodeKind::Declaration(lower_children(node, source, next))
        }
        "variable_declarator" => NodeKind::Binding {
            name: node
                .child_by_field_name("name")
                .filter(|n| n.kind() == "identifier")
                .map(|n| node_text(n, source)),
            value: node
                .child_by_field_name("value")
                .map(|v| Box::new(lower_at(v, source, next))),
        },
        "export_statement" => {
            let items = ["declaration", "value"]
                .iter()
                .filter_map(|field| node.child_by_field_name(field))
                .map(|n| lower_at(n, source, next))
                .collect();
            NodeKind::Export(items)
        }
        "expression_statement" => match first_named(node) {
            Some(inner) => NodeKind::ExpressionStatement(Box::new(lower_at(inner, source, next))),
            None => NodeKind::Other(Vec::new()),
        },
        "assignment_expression" => {
            match (
                node.child_by_field_name("left"),
                node.child_by_field_name("right"),
            ) {
                (Some(left), Some(right)) => NodeKind::Assignment {
                    target: Box::new(lower_at(left, source, next)),
                    value: Box::new(lower_at(right, source, next)),
                },
                _ => NodeKind::Other(lower_children(node, source, next)),
            }
        }
        "call_expression" => lower_call(node, source, next),
        "member_expression" => {
            match (
                node.child_by_field_name("object"),
                node.child_by_field_name("property"),
            ) {
                (Some(object), Some(property)) => NodeKind::PropertyAccess {
                    object: Box::new(lower_at(object, source, next)),
                    property: node_text(property, source),
                },
                _ => NodeKind::Other(lower_children(node, source, next)),
            }
        }
        "identifier" | "this" => NodeKind::Identifier(node_text(node, source)),
        "object" => NodeKind::ObjectLiteral(lower_object_entries(node, source, next)),
        "arrow_function" => lower_function(node, source, true, next),
        kind if FUNCTION_KINDS.contains(&kind) => lower_function(node, source, false, next),
        "statement_block" => NodeKind::Block(lower_children(node, source, next)),
        "try_statement" => NodeKind::Try(lower_children(node, source, next)),
        "throw_statement" => NodeKind::Throw(
            first_named(node).map(|arg| Box::new(lower_at(arg, source, next))),
        ),
        _ => NodeKind::Other(lower_children(node, source, next)),
    };

    SyntaxNode::new(kind, span)
}

fn lower_call(node: Node, source: &[u8], depth: usize) -> NodeKind {
    let Some(function) = node.child_by_field_name("function") else {
        return NodeKind::Other(lower_children(node, source, depth));
    };

    // Tagged templates carry a template_string instead of an argument list.
    let arguments = match node.child_by_field_name("arguments") {
        Some(args) if args.kind() == "arguments" => lower_children(args, source, depth),
        _ => Vec::new(),
    };

    NodeKind::Call {
        callee: Box::new(lower_at(function, source, depth)),
        arguments,
    }
}

fn lower_function(node: Node, source: &[u8], is_arrow: bool, depth: usize) -> NodeKind {
    let Some(body) = node.child_by_field_name("body") else {
        return NodeKind::Other(lower_children(node, source, depth));
    };

    NodeKind::Function(FunctionNode {
        name: node
            .child_by_field_name("name")
            .map(|n| node_text(n, source)),
        is_arrow,
        body: Box::new(lower_at(body, source, depth)),
    })
}

fn lower_object_entries(node: Node, source: &[u8], depth: usize) -> Vec<ObjectEntry> {
    let mut entries = Vec::new();

    for child in node.named_children(&mut node.walk()) {
        match child.kind() {
            "pair" => {
                let (Some(key), Some(value)) = (
                    child.child_by_field_name("key"),
                    child.child_by_field_name("value"),
                ) else {
                    continue;
                };
                entries.push(ObjectEntry::Property(PropertyEntry {
                    key: strip_quotes(&node_text(key, source)),
                    key_span: Span::from_node(key),
                    value: lower_at(value, source, depth),
                    shorthand: false,
                }));
            }
            "shorthand_property_identifier" => {
                let name = node_text(child, source);
                let span = Span::from_node(child);
                entries.push(ObjectEntry::Property(PropertyEntry {
                    key: name.clone(),
                    key_span: span,
                    value: SyntaxNode::new(NodeKind::Identifier(name), span),
                    shorthand: true,
                }));
            }
            "spread_element" => {
                if let Some(inner) = first_named(child) {
                    entries.push(ObjectEntry::Spread(lower_at(inner, source, depth)));
                }
            }
            "method_definition" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|n| strip_quotes(&node_text(n, source)))
                    .unwrap_or_default();
                entries.push(ObjectEntry::Method {
                    name,
                    span: Span::from_node(child),
                });
            }
            _ => {}
        }
    }

    entries
}

fn lower_children(node: Node, source: &[u8], depth: usize) -> Vec<SyntaxNode> {
    node.named_children(&mut node.walk())
        .filter(|child| child.kind() != "comment")
        .map(|child| lower_at(child, source, depth))
        .collect()
}

fn first_named(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");
    found
}

fn node_text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

/// Object keys may be written as string literals (`"user.get": ...`).
fn strip_quotes(key: &str) -> String {
    key.replace(['"', '\''], "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SourceFile;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(
            SourceLanguage::from_extension("ts"),
            Some(SourceLanguage::TypeScript)
        );
        assert_eq!(SourceLanguage::from_extension("tsx"), Some(SourceLanguage::Tsx));
        assert_eq!(
            SourceLanguage::from_extension("mjs"),
            Some(SourceLanguage::JavaScript)
        );
        assert_eq!(SourceLanguage::from_extension("go"), None);
    }

    #[test]
    fn test_lower_router_declaration() {
        let file = SourceFile::parse(
            "router.ts",
            "export const appRouter = router({\n  'user.get': publicProcedure.query(() => 1),\n  health,\n});\n",
        )
        .unwrap();

        let NodeKind::Program(statements) = &file.root.kind else {
            panic!("expected program");
        };
        let NodeKind::Export(items) = &statements[0].kind else {
            panic!("expected export, got {:?}", statements[0].kind);
        };
        let NodeKind::Declaration(bindings) = &items[0].kind else {
            panic!("expected declaration");
        };
        let NodeKind::Binding { name, value } = &bindings[0].kind else {
            panic!("expected binding");
        };
        assert_eq!(name.as_deref(), Some("appRouter"));

        let NodeKind::Call { callee, arguments } = &value.as_ref().unwrap().kind else {
            panic!("expected call");
        };
        assert_eq!(callee.as_identifier(), Some("router"));

        let entries = arguments[0].as_object_literal().unwrap();
        assert_eq!(entries.len(), 2);
        let ObjectEntry::Property(first) = &entries[0] else {
            panic!("expected property");
        };
        assert_eq!(first.key, "user.get");
        assert_eq!(first.key_span.start_line, 2);
        let ObjectEntry::Property(second) = &entries[1] else {
            panic!("expected shorthand");
        };
        assert!(second.shorthand);
        assert_eq!(second.value.as_identifier(), Some("health"));
    }

    #[test]
    fn test_transparent_wrappers_are_removed() {
        let file = SourceFile::parse(
            "router.ts",
            "const appRouter = (router({}) satisfies AnyRouter);",
        )
        .unwrap();
        let binding_value = file
            .root
            .descendants()
            .find_map(|n| match &n.kind {
                NodeKind::Binding { value, .. } => value.as_deref(),
                _ => None,
            })
            .unwrap();
        assert!(binding_value.is_call());
    }

    #[test]
    fn test_lower_function_bodies() {
        let file = SourceFile::parse(
            "handler.ts",
            "const h = async () => { try { await db.user.find(); } catch (e) { throw e; } };",
        )
        .unwrap();
        let func = file
            .root
            .descendants()
            .find_map(|n| n.as_function())
            .unwrap();
        assert!(func.is_arrow);
        assert!(func
            .body
            .descendants()
            .any(|n| matches!(n.kind, NodeKind::Try(_))));
        assert!(func
            .body
            .descendants()
            .any(|n| matches!(n.kind, NodeKind::Throw(Some(_)))));
    }

    #[test]
    fn test_deep_expression_is_cut_off() {
        let terms = vec!["\"a\""; 5000].join(" + ");
        let source = format!(
            "const banner = {};\nexport const appRouter = router({{ ping: publicProcedure.query(() => banner) }});\n",
            terms
        );
        let file = SourceFile::parse("deep.ts", &source).unwrap();

        let depth = max_depth(&file.root);
        assert!(depth <= MAX_LOWERING_DEPTH + 1, "depth {}", depth);
        assert!(file
            .root
            .descendants()
            .any(|n| n.as_identifier() == Some("publicProcedure")));
    }

    fn max_depth(root: &SyntaxNode) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(root, 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children().into_iter().map(|c| (c, depth + 1)));
        }
        deepest
    }
}
