//! Procedure expression walker.
//!
//! Recovers the semantic shape of a builder chain such as
//! `protectedProcedure.input(schema).mutation(handler)` by descending from
//! the outermost call towards the chain's base identifier.

use crate::model::{Method, Visibility};
use crate::syntax::{FunctionNode, NodeKind, SyntaxNode};

use super::scope::FileScope;

/// Default bound on calls visited for one procedure expression.
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 64;

/// Shape of a recognized procedure. Only produced when a method was found.
#[derive(Debug, Clone, Copy)]
pub struct ProcedureShape<'a> {
    pub method: Method,
    pub has_input: bool,
    pub has_output: bool,
    pub visibility: Visibility,
    pub resolver: Option<&'a FunctionNode>,
}

#[derive(Default)]
struct WalkState<'a> {
    method: Option<Method>,
    has_input: bool,
    has_output: bool,
    visibility: Visibility,
    resolver: Option<&'a FunctionNode>,
    exceeded: bool,
}

impl<'a> WalkState<'a> {
    /// The first recognized tier sticks; unrecognized identifiers never
    /// change it.
    fn classify(&mut self, identifier: &str) {
        if self.visibility.is_known() {
            return;
        }
        if let Some(visibility) = Visibility::from_identifier(identifier) {
            self.visibility = visibility;
        }
    }
}

pub struct ProcedureWalker<'s, 'a> {
    scope: &'s FileScope<'a>,
    max_depth: usize,
}

impl<'s, 'a> ProcedureWalker<'s, 'a> {
    pub fn new(scope: &'s FileScope<'a>) -> Self {
        Self {
            scope,
            max_depth: DEFAULT_MAX_CHAIN_DEPTH,
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Walk a procedure construction expression.
    ///
    /// Returns `None` when no `query`/`mutation` call was found or when the
    /// chain is deeper than the configured bound.
    pub fn walk(&self, expression: &'a SyntaxNode) -> Option<ProcedureShape<'a>> {
        let mut state = WalkState::default();
        self.visit(expression, 0, &mut state);

        if state.exceeded {
            return None;
        }

        Some(ProcedureShape {
            method: state.method?,
            has_input: state.has_input,
            has_output: state.has_output,
            visibility: state.visibility,
            resolver: state.resolver,
        })
    }

    /// `depth` counts the calls entered so far; the chain's base identifier
    /// is not a call and never counts.
    fn visit(&self, target: &'a SyntaxNode, depth: usize, state: &mut WalkState<'a>) {
        let NodeKind::Call { callee, arguments } = &target.kind else {
            return;
        };

        if depth >= self.max_depth {
            state.exceeded = true;
            return;
        }

        match &callee.kind {
            NodeKind::PropertyAccess { object, property } => {
                match property.as_str() {
                    "input" => state.has_input = true,
                    "output" => state.has_output = true,
                    _ => {}
                }

                // Every query/mutation seen overwrites the previous one.
                if let Some(method) = Method::from_member(property) {
                    state.method = Some(method);
                    if let Some(handler) = arguments
                        .first()
                        .and_then(|arg| self.scope.resolve(arg).as_function())
                    {
                        state.resolver = Some(handler);
                    }
                }

                if let Some(base) = object.as_identifier() {
                    state.classify(base);
                }

                self.visit(object, depth + 1, state);
            }
            other => {
                if let NodeKind::Identifier(name) = other {
                    state.classify(name);
                }
                for child in target.children() {
                    self.visit(child, depth + 1, state);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SourceFile;

    /// Parse `const p = <expr>;` and walk the initializer.
    fn walk_expr(expr: &str) -> Option<(Method, bool, bool, Visibility, bool)> {
        walk_with_depth(expr, DEFAULT_MAX_CHAIN_DEPTH)
    }

    fn walk_with_depth(expr: &str, depth: usize) -> Option<(Method, bool, bool, Visibility, bool)> {
        let source = format!(
            "async function namedHandler() {{ return 1; }}\nconst p = {};\n",
            expr
        );
        let file = SourceFile::parse("proc.ts", source).unwrap();
        let scope = FileScope::from_file(&file);
        let value = scope.lookup("p").unwrap();
        ProcedureWalker::new(&scope)
            .max_depth(depth)
            .walk(value)
            .map(|s| {
                (
                    s.method,
                    s.has_input,
                    s.has_output,
                    s.visibility,
                    s.resolver.is_some(),
                )
            })
    }

    #[test]
    fn test_public_query() {
        let shape = walk_expr("publicProcedure.query(() => db.user.findMany())").unwrap();
        assert_eq!(shape, (Method::Query, false, false, Visibility::Public, true));
    }

    #[test]
    fn test_admin_mutation_with_input() {
        let shape =
            walk_expr("adminProcedure.input(z.object({ id: z.string() })).mutation(async ({ input }) => input)")
                .unwrap();
        assert_eq!(shape, (Method::Mutation, true, false, Visibility::Admin, true));
    }

    #[test]
    fn test_output_anywhere_in_chain() {
        let shape = walk_expr("protectedProcedure.output(schema).input(x).query(h)").unwrap();
        assert_eq!(shape.0, Method::Query);
        assert!(shape.1 && shape.2);
        assert_eq!(shape.3, Visibility::Protected);
        // `h` is not bound in the file.
        assert!(!shape.4);
    }

    #[test]
    fn test_unknown_visibility_by_default() {
        let shape = walk_expr("t.procedure.use(isAuthed).mutation(function save() {})").unwrap();
        assert_eq!(shape.3, Visibility::Unknown);
        assert!(shape.4);
    }

    #[test]
    fn test_not_a_procedure() {
        assert!(walk_expr("z.object({ id: z.string() })").is_none());
        assert!(walk_expr("someValue").is_none());
        assert!(walk_expr("publicProcedure.input(x)").is_none());
    }

    #[test]
    fn test_repeated_method_last_visited_wins() {
        // The walk starts at the outermost call, so the innermost
        // query/mutation is the last one applied.
        let shape = walk_expr("publicProcedure.query(a).mutation(b)").unwrap();
        assert_eq!(shape.0, Method::Query);
    }

    #[test]
    fn test_first_classified_visibility_wins() {
        let shape = walk_expr("wrap(adminProcedure.query(h), publicProcedure.query(h))").unwrap();
        assert_eq!(shape.3, Visibility::Admin);
    }

    #[test]
    fn test_identifier_handler_resolved_in_file() {
        let shape = walk_expr("publicProcedure.query(namedHandler)").unwrap();
        assert!(shape.4);
    }

    #[test]
    fn test_depth_bound_yields_no_method() {
        let expr = "publicProcedure.input(a).input(b).input(c).query(h)";
        assert!(walk_with_depth(expr, 2).is_none());
        assert!(walk_with_depth(expr, 8).is_some());
    }

    #[test]
    fn test_depth_bound_counts_calls_only() {
        // Four calls on top of the base identifier.
        let expr = "publicProcedure.input(a).input(b).input(c).query(h)";
        let shape = walk_with_depth(expr, 4).expect("four calls fit a bound of four");
        assert_eq!(shape.0, Method::Query);
        assert_eq!(shape.3, Visibility::Public);
        assert!(walk_with_depth(expr, 3).is_none());
    }
}
