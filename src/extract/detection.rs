//! Router detection: which calls construct a router, and which mapping
//! entries merely reference one.

use std::collections::BTreeSet;

use regex::Regex;

use crate::error::AnalyzeError;
use crate::syntax::{NodeKind, SourceFile, SyntaxNode};
use crate::trace::Trace;

/// Default identifier convention: names ending in "router", any case.
pub const DEFAULT_ROUTER_IDENTIFIER_PATTERN: &str = "(?i)router$";

/// Matching policy for router construction sites.
///
/// Built once per run; immutable afterwards.
#[derive(Debug, Clone)]
pub struct RouterDetectionPolicy {
    factories: BTreeSet<String>,
    identifier_pattern: Regex,
}

impl RouterDetectionPolicy {
    /// Build a policy from factory names and an optional pattern override.
    ///
    /// The pattern may be plain regex source (`router$`) or a slash-delimited
    /// literal with flags (`/router$/i`).
    pub fn new<I, S>(factories: I, pattern_override: Option<&str>) -> Result<Self, AnalyzeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let factories = factories
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();

        let source = match pattern_override {
            Some(p) => normalize_pattern(p),
            None => DEFAULT_ROUTER_IDENTIFIER_PATTERN.to_string(),
        };
        let identifier_pattern = Regex::new(&source).map_err(|e| AnalyzeError::InvalidPattern {
            pattern: pattern_override.unwrap_or(DEFAULT_ROUTER_IDENTIFIER_PATTERN).to_string(),
            source: e,
        })?;

        Ok(Self {
            factories,
            identifier_pattern,
        })
    }

    pub fn factories(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(String::as_str)
    }

    /// Whether an identifier denotes a router by naming convention.
    pub fn matches_identifier(&self, name: &str) -> bool {
        self.identifier_pattern.is_match(name)
    }

    /// Whether a callee resolves to a configured factory, either by its full
    /// dotted path (`t.router`) or by its final member (`router`).
    pub fn is_factory(&self, callee: &SyntaxNode) -> bool {
        if self.factories.is_empty() {
            return false;
        }
        if let Some(path) = callee.dotted_path() {
            if self.factories.contains(&path) {
                return true;
            }
        }
        callee
            .terminal_name()
            .map_or(false, |name| self.factories.contains(name))
    }

    /// Whether a mapping value refers to another router rather than a
    /// procedure.
    pub fn is_router_reference(&self, value: &SyntaxNode) -> bool {
        match &value.kind {
            NodeKind::Identifier(name) => {
                self.matches_identifier(name) || self.factories.contains(name)
            }
            NodeKind::PropertyAccess { property, .. } => self.matches_identifier(property),
            NodeKind::Call { callee, .. } => {
                self.is_factory(callee)
                    || callee
                        .terminal_name()
                        .map_or(false, |name| self.matches_identifier(name))
            }
            _ => false,
        }
    }
}

/// Convert a `/source/flags` literal into inline-flag regex syntax.
///
/// Only JavaScript regex flags (`gimsuy`) make a literal; anything else after
/// the last slash, as in `/routers/index`, is plain regex source.
fn normalize_pattern(pattern: &str) -> String {
    let trimmed = pattern.trim();
    if let Some(rest) = trimmed.strip_prefix('/') {
        if let Some(end) = rest.rfind('/') {
            let (body, flags) = (&rest[..end], &rest[end + 1..]);
            if flags.chars().all(|c| "gimsuy".contains(c)) {
                let inline: String = flags.chars().filter(|c| "ims".contains(*c)).collect();
                return if inline.is_empty() {
                    body.to_string()
                } else {
                    format!("(?{}){}", inline, body)
                };
            }
        }
    }
    trimmed.to_string()
}

/// A router construction call and the name its result is bound to.
#[derive(Debug, Clone)]
pub struct RouterCallSite<'a> {
    pub call: &'a SyntaxNode,
    pub name: String,
}

impl<'a> RouterCallSite<'a> {
    /// The literal mapping passed as first argument.
    pub fn routes(&self) -> Option<&'a SyntaxNode> {
        match &self.call.kind {
            NodeKind::Call { arguments, .. } => arguments
                .first()
                .filter(|arg| arg.as_object_literal().is_some()),
            _ => None,
        }
    }
}

/// Scan a file's top-level statements for router construction calls, in
/// source order.
pub fn collect_router_call_sites<'a>(
    file: &'a SourceFile,
    policy: &RouterDetectionPolicy,
    trace: &Trace,
) -> Vec<RouterCallSite<'a>> {
    let mut sites = Vec::new();
    for statement in file.statements() {
        collect_from_statement(statement, policy, trace, &mut sites);
    }
    sites
}

fn collect_from_statement<'a>(
    statement: &'a SyntaxNode,
    policy: &RouterDetectionPolicy,
    trace: &Trace,
    sites: &mut Vec<RouterCallSite<'a>>,
) {
    match &statement.kind {
        NodeKind::Declaration(bindings) => {
            for binding in bindings {
                if let NodeKind::Binding {
                    name: Some(name),
                    value: Some(value),
                } = &binding.kind
                {
                    consider(value, Some(name.as_str()), policy, trace, sites);
                }
            }
        }
        NodeKind::Export(items) => {
            for item in items {
                match &item.kind {
                    NodeKind::Declaration(_) => collect_from_statement(item, policy, trace, sites),
                    _ => consider(item, Some("default"), policy, trace, sites),
                }
            }
        }
        NodeKind::ExpressionStatement(expr) => match &expr.kind {
            NodeKind::Assignment { target, value } => {
                consider(value, target.terminal_name(), policy, trace, sites)
            }
            _ => consider(expr, None, policy, trace, sites),
        },
        _ => {}
    }
}

fn consider<'a>(
    expr: &'a SyntaxNode,
    bound_name: Option<&str>,
    policy: &RouterDetectionPolicy,
    trace: &Trace,
    sites: &mut Vec<RouterCallSite<'a>>,
) {
    let NodeKind::Call { callee, arguments } = &expr.kind else {
        return;
    };

    let by_factory = policy.is_factory(callee);
    let by_name = bound_name.map_or(false, |name| policy.matches_identifier(name));
    if !by_factory && !by_name {
        return;
    }

    let name = bound_name
        .map(str::to_string)
        .or_else(|| callee.dotted_path())
        .unwrap_or_else(|| "anonymous".to_string());

    if !arguments
        .first()
        .map_or(false, |arg| arg.as_object_literal().is_some())
    {
        trace.log(|| {
            format!(
                "'{}' at line {} looks like a router but its first argument is not an object literal; skipping",
                name, expr.span.start_line
            )
        });
        return;
    }

    sites.push(RouterCallSite { call: expr, name });
}
