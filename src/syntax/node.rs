//! Tagged syntax tree consumed by the extraction engine.
//!
//! Tree-sitter nodes are lowered into this closed set of variants once per
//! file. Everything downstream dispatches on [`NodeKind`] instead of probing
//! grammar-specific node names.

use std::fmt;

/// Source location span with byte offsets and line positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// End line (1-indexed).
    pub end_line: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: node.start_position().row + 1, // tree-sitter is 0-indexed
            end_line: node.end_position().row + 1,
        }
    }

    /// Inclusive number of lines covered by the span.
    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_line, self.end_line)
    }
}

/// A node of the lowered syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub span: Span,
    pub kind: NodeKind,
}

/// Kind tag plus kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Root of a file: its top-level statements.
    Program(Vec<SyntaxNode>),
    /// `const`/`let`/`var` declaration holding [`NodeKind::Binding`] children.
    Declaration(Vec<SyntaxNode>),
    /// One declarator. `name` is `None` for destructuring patterns.
    Binding {
        name: Option<String>,
        value: Option<Box<SyntaxNode>>,
    },
    /// `export ...` wrapper around a declaration or a default expression.
    Export(Vec<SyntaxNode>),
    ExpressionStatement(Box<SyntaxNode>),
    Assignment {
        target: Box<SyntaxNode>,
        value: Box<SyntaxNode>,
    },
    Call {
        callee: Box<SyntaxNode>,
        arguments: Vec<SyntaxNode>,
    },
    PropertyAccess {
        object: Box<SyntaxNode>,
        property: String,
    },
    Identifier(String),
    ObjectLiteral(Vec<ObjectEntry>),
    Function(FunctionNode),
    Block(Vec<SyntaxNode>),
    Try(Vec<SyntaxNode>),
    Throw(Option<Box<SyntaxNode>>),
    /// Any construct the engine has no special handling for.
    Other(Vec<SyntaxNode>),
}

/// Function-valued expression or declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    pub name: Option<String>,
    pub is_arrow: bool,
    /// Statement block, or the bare expression of a concise arrow body.
    pub body: Box<SyntaxNode>,
}

/// One member of an object literal.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectEntry {
    /// `key: value` or shorthand `key`.
    Property(PropertyEntry),
    /// `...expr`
    Spread(SyntaxNode),
    /// `name() { ... }`, getters and setters.
    Method { name: String, span: Span },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEntry {
    /// Key text with quotes removed.
    pub key: String,
    pub key_span: Span,
    /// For shorthand entries this is an identifier node named after the key.
    pub value: SyntaxNode,
    pub shorthand: bool,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { span, kind }
    }

    /// Identifier name, if this node is a bare identifier.
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionNode> {
        match &self.kind {
            NodeKind::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_object_literal(&self) -> Option<&[ObjectEntry]> {
        match &self.kind {
            NodeKind::ObjectLiteral(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, NodeKind::Call { .. })
    }

    /// Final name of a callee-like expression: `router` for both `router`
    /// and `t.router`.
    pub fn terminal_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier(name) => Some(name),
            NodeKind::PropertyAccess { property, .. } => Some(property),
            _ => None,
        }
    }

    /// Dotted path for identifier/property chains (`t.router`), `None` when
    /// the chain contains anything else.
    pub fn dotted_path(&self) -> Option<String> {
        match &self.kind {
            NodeKind::Identifier(name) => Some(name.clone()),
            NodeKind::PropertyAccess { object, property } => object
                .dotted_path()
                .map(|prefix| format!("{}.{}", prefix, property)),
            _ => None,
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&SyntaxNode> {
        match &self.kind {
            NodeKind::Program(items)
            | NodeKind::Declaration(items)
            | NodeKind::Export(items)
            | NodeKind::Block(items)
            | NodeKind::Try(items)
            | NodeKind::Other(items) => items.iter().collect(),
            NodeKind::Binding { value, .. } => value.iter().map(|v| v.as_ref()).collect(),
            NodeKind::ExpressionStatement(inner) => vec![inner.as_ref()],
            NodeKind::Assignment { target, value } => vec![target.as_ref(), value.as_ref()],
            NodeKind::Call { callee, arguments } => {
                let mut out = Vec::with_capacity(arguments.len() + 1);
                out.push(callee.as_ref());
                out.extend(arguments.iter());
                out
            }
            NodeKind::PropertyAccess { object, .. } => vec![object.as_ref()],
            NodeKind::Identifier(_) => Vec::new(),
            NodeKind::ObjectLiteral(entries) => entries
                .iter()
                .filter_map(|entry| match entry {
                    ObjectEntry::Property(prop) => Some(&prop.value),
                    ObjectEntry::Spread(expr) => Some(expr),
                    ObjectEntry::Method { .. } => None,
                })
                .collect(),
            NodeKind::Function(func) => vec![func.body.as_ref()],
            NodeKind::Throw(argument) => argument.iter().map(|a| a.as_ref()).collect(),
        }
    }

    /// Pre-order iterator over this node and all of its descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

/// Depth-first, pre-order traversal. Uses an explicit stack so deeply nested
/// resolver bodies cannot overflow the call stack.
pub struct Descendants<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let children = node.children();
        self.stack.extend(children.into_iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> SyntaxNode {
        SyntaxNode::new(NodeKind::Identifier(name.to_string()), Span::default())
    }

    #[test]
    fn test_span_line_count_is_inclusive() {
        let span = Span {
            start_byte: 0,
            end_byte: 10,
            start_line: 3,
            end_line: 7,
        };
        assert_eq!(span.line_count(), 5);
        assert_eq!(Span::default().line_count(), 1);
    }

    #[test]
    fn test_dotted_path() {
        let access = SyntaxNode::new(
            NodeKind::PropertyAccess {
                object: Box::new(ident("t")),
                property: "router".to_string(),
            },
            Span::default(),
        );
        assert_eq!(access.dotted_path().as_deref(), Some("t.router"));
        assert_eq!(access.terminal_name(), Some("router"));
    }

    #[test]
    fn test_descendants_preorder() {
        let call = SyntaxNode::new(
            NodeKind::Call {
                callee: Box::new(ident("f")),
                arguments: vec![ident("a"), ident("b")],
            },
            Span::default(),
        );
        let names: Vec<_> = call
            .descendants()
            .filter_map(|n| n.as_identifier())
            .collect();
        assert_eq!(names, vec!["f", "a", "b"]);
    }
}
