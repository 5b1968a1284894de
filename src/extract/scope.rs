//! Top-level bindings of a single file.
//!
//! Used for one-level resolution of identifiers that name a procedure or a
//! handler declared elsewhere in the same file.

use std::collections::HashMap;

use crate::syntax::{NodeKind, SourceFile, SyntaxNode};

#[derive(Debug, Default)]
pub struct FileScope<'a> {
    bindings: HashMap<&'a str, &'a SyntaxNode>,
}

impl<'a> FileScope<'a> {
    /// Index `const`/`let`/`var` initializers and function declarations,
    /// including exported ones. Later declarations shadow earlier ones.
    pub fn from_file(file: &'a SourceFile) -> Self {
        let mut scope = Self::default();
        for statement in file.statements() {
            scope.index(statement);
        }
        scope
    }

    fn index(&mut self, statement: &'a SyntaxNode) {
        match &statement.kind {
            NodeKind::Declaration(bindings) => {
                for binding in bindings {
                    if let NodeKind::Binding {
                        name: Some(name),
                        value: Some(value),
                    } = &binding.kind
                    {
                        self.bindings.insert(name.as_str(), value.as_ref());
                    }
                }
            }
            NodeKind::Export(items) => {
                for item in items {
                    self.index(item);
                }
            }
            NodeKind::Function(func) => {
                if let Some(name) = &func.name {
                    self.bindings.insert(name.as_str(), statement);
                }
            }
            _ => {}
        }
    }

    /// The initializer (or function declaration) bound to `name`.
    pub fn lookup(&self, name: &str) -> Option<&'a SyntaxNode> {
        self.bindings.get(name).copied()
    }

    /// Resolve an identifier node one level; other nodes resolve to themselves.
    pub fn resolve(&self, node: &'a SyntaxNode) -> &'a SyntaxNode {
        node.as_identifier()
            .and_then(|name| self.lookup(name))
            .unwrap_or(node)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexes_bindings_and_functions() {
        let file = SourceFile::parse(
            "scope.ts",
            r#"
const getUser = publicProcedure.query(() => null);
export const setUser = adminProcedure.mutation(async () => {});
export async function handler() { return 1; }
let { a, b } = pair;
"#,
        )
        .unwrap();

        let scope = FileScope::from_file(&file);
        assert_eq!(scope.len(), 3);
        assert!(scope.lookup("getUser").unwrap().is_call());
        assert!(scope.lookup("setUser").unwrap().is_call());
        assert!(scope.lookup("handler").unwrap().as_function().is_some());
        assert!(scope.lookup("a").is_none());
    }

    #[test]
    fn test_resolve_falls_back_to_node() {
        let file = SourceFile::parse("scope.ts", "const x = 1;\nfoo(x, y);").unwrap();
        let scope = FileScope::from_file(&file);
        let args: Vec<&SyntaxNode> = file
            .root
            .descendants()
            .filter(|n| n.as_identifier().is_some())
            .collect();
        // descendants: foo, x, y
        assert!(!std::ptr::eq(scope.resolve(args[1]), args[1]));
        assert!(std::ptr::eq(scope.resolve(args[2]), args[2]));
    }
}
