//! Router parser: expands one router call site into procedures.

use crate::model::{ProcedureNode, RouterMetadata};
use crate::syntax::{ObjectEntry, PropertyEntry, SourceFile};
use crate::trace::Trace;

use super::detection::{RouterCallSite, RouterDetectionPolicy};
use super::procedure::ProcedureWalker;
use super::resolver::ResolverAnalyzer;
use super::scope::FileScope;

/// One router record and the procedures declared in its mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRouter {
    pub metadata: RouterMetadata,
    pub procedures: Vec<ProcedureNode>,
}

pub struct RouterParser<'p> {
    policy: &'p RouterDetectionPolicy,
    analyzer: &'p ResolverAnalyzer,
    max_chain_depth: usize,
    trace: &'p Trace,
}

impl<'p> RouterParser<'p> {
    pub fn new(
        policy: &'p RouterDetectionPolicy,
        analyzer: &'p ResolverAnalyzer,
        max_chain_depth: usize,
        trace: &'p Trace,
    ) -> Self {
        Self {
            policy,
            analyzer,
            max_chain_depth,
            trace,
        }
    }

    /// Parse a call site. `None` when its first argument is not an object
    /// literal.
    pub fn parse<'a>(
        &self,
        site: &RouterCallSite<'a>,
        file: &'a SourceFile,
        scope: &FileScope<'a>,
    ) -> Option<ParsedRouter> {
        let entries = site.routes()?.as_object_literal()?;
        let walker = ProcedureWalker::new(scope).max_depth(self.max_chain_depth);

        let mut metadata = RouterMetadata {
            name: site.name.clone(),
            file: file.path.clone(),
            start_line: site.call.span.start_line,
            line_count: site.call.span.line_count(),
            nested_routers: Vec::new(),
        };
        let mut procedures = Vec::new();

        for entry in entries {
            match entry {
                ObjectEntry::Property(property) => {
                    if self.is_composition(property, scope) {
                        self.trace.log(|| {
                            format!(
                                "{}: '{}' in '{}' references a router; skipping",
                                file.path, property.key, metadata.name
                            )
                        });
                        metadata.nested_routers.push(property.key.clone());
                        continue;
                    }

                    match self.parse_procedure(property, &walker, &metadata, file, scope) {
                        Some(node) => {
                            self.trace.log(|| {
                                format!(
                                    "{}:{} captured {} {} ({})",
                                    node.file,
                                    node.line,
                                    node.method,
                                    node.qualified_name(),
                                    node.visibility
                                )
                            });
                            procedures.push(node);
                        }
                        None => self.trace.log(|| {
                            format!(
                                "{}:{} '{}' in '{}' is not a procedure; skipping",
                                file.path, property.key_span.start_line, property.key, metadata.name
                            )
                        }),
                    }
                }
                ObjectEntry::Spread(expr) => {
                    let name = expr
                        .dotted_path()
                        .unwrap_or_else(|| file.text(expr.span).to_string());
                    self.trace.log(|| {
                        format!(
                            "{}: spread '{}' in '{}' treated as router composition",
                            file.path, name, metadata.name
                        )
                    });
                    metadata.nested_routers.push(name);
                }
                ObjectEntry::Method { name, span } => self.trace.log(|| {
                    format!(
                        "{}:{} method '{}' in '{}' is not a procedure; skipping",
                        file.path, span.start_line, name, metadata.name
                    )
                }),
            }
        }

        Some(ParsedRouter {
            metadata,
            procedures,
        })
    }

    /// The entry value, or what its identifier is bound to, refers to a router.
    fn is_composition(&self, property: &PropertyEntry, scope: &FileScope<'_>) -> bool {
        if self.policy.is_router_reference(&property.value) {
            return true;
        }
        let resolved = scope.resolve(&property.value);
        !std::ptr::eq(resolved, &property.value) && self.policy.is_router_reference(resolved)
    }

    fn parse_procedure<'a>(
        &self,
        property: &'a PropertyEntry,
        walker: &ProcedureWalker<'_, 'a>,
        router: &RouterMetadata,
        file: &'a SourceFile,
        scope: &FileScope<'a>,
    ) -> Option<ProcedureNode> {
        let expression = scope.resolve(&property.value);
        let shape = walker.walk(expression)?;
        let facts = self.analyzer.analyze(shape.resolver, file);

        Some(ProcedureNode {
            router: router.name.clone(),
            router_line: router.start_line,
            procedure: property.key.clone(),
            method: shape.method,
            has_input: shape.has_input,
            has_output: shape.has_output,
            file: file.path.clone(),
            line: property.key_span.start_line,
            visibility: shape.visibility,
            resolver_line_count: facts.line_count,
            uses_data_store: facts.uses_data_store,
            has_error_handling: facts.has_error_handling,
            has_side_effects: facts.has_side_effects,
        })
    }
}
