//! Rule evaluation over the extracted model.

use std::path::Path;

use crate::config::RuleConfig;
use crate::error::AnalyzeError;
use crate::model::{ProcedureNode, RouterMetadata};
use crate::syntax::{SourceFile, SyntaxProvider};

use super::procedure::default_procedure_rules;
use super::router::default_router_rules;
use super::types::{Finding, Severity};

/// Size limits consulted by the default rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub max_resolver_lines: usize,
    pub max_router_lines: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_resolver_lines: 60,
            max_router_lines: 400,
        }
    }
}

/// Read-only view of the run handed to every rule invocation.
pub struct AnalysisContext<'a> {
    pub root: &'a Path,
    pub provider: &'a dyn SyntaxProvider,
    pub routers: &'a [RouterMetadata],
    pub procedures: &'a [ProcedureNode],
    pub sources: &'a [SourceFile],
    pub thresholds: Thresholds,
}

impl<'a> AnalysisContext<'a> {
    /// Procedures declared by the given router.
    pub fn procedures_of<'r>(
        &'r self,
        router: &'r RouterMetadata,
    ) -> impl Iterator<Item = &'a ProcedureNode> + 'r {
        self.procedures.iter().filter(move |p| p.belongs_to(router))
    }
}

/// Identity and effective severity of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleInfo {
    pub id: String,
    pub severity: Severity,
    pub description: String,
}

impl RuleInfo {
    pub fn procedure_finding(&self, node: &ProcedureNode, message: impl Into<String>) -> Finding {
        Finding {
            severity: self.severity,
            message: message.into(),
            file: node.file.clone(),
            line: node.line,
            router: node.router.clone(),
            procedure: Some(node.procedure.clone()),
            rule: self.id.clone(),
        }
    }

    pub fn router_finding(&self, router: &RouterMetadata, message: impl Into<String>) -> Finding {
        Finding {
            severity: self.severity,
            message: message.into(),
            file: router.file.clone(),
            line: router.start_line,
            router: router.name.clone(),
            procedure: None,
            rule: self.id.clone(),
        }
    }
}

/// Something a rule can be evaluated against.
pub trait RuleSubject {
    /// Human-readable identity used in error messages.
    fn describe(&self) -> String;
}

impl RuleSubject for ProcedureNode {
    fn describe(&self) -> String {
        format!("procedure {} ({}:{})", self.qualified_name(), self.file, self.line)
    }
}

impl RuleSubject for RouterMetadata {
    fn describe(&self) -> String {
        format!("router {} ({}:{})", self.name, self.file, self.start_line)
    }
}

type RuleCheck<T> =
    Box<dyn Fn(&T, &AnalysisContext<'_>, &RuleInfo) -> anyhow::Result<Vec<Finding>> + Send + Sync>;

/// A described check over one subject type.
pub struct Rule<T> {
    info: RuleInfo,
    check: RuleCheck<T>,
}

impl<T> Rule<T> {
    pub fn new<F>(id: &str, severity: Severity, description: &str, check: F) -> Self
    where
        F: Fn(&T, &AnalysisContext<'_>, &RuleInfo) -> anyhow::Result<Vec<Finding>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            info: RuleInfo {
                id: id.to_string(),
                severity,
                description: description.to_string(),
            },
            check: Box::new(check),
        }
    }

    pub fn info(&self) -> &RuleInfo {
        &self.info
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.info.severity = severity;
        self
    }

    pub fn evaluate(&self, subject: &T, ctx: &AnalysisContext<'_>) -> anyhow::Result<Vec<Finding>> {
        (self.check)(subject, ctx, &self.info)
    }
}

impl<T> std::fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("info", &self.info).finish()
    }
}

/// Ordered procedure rules and router rules.
#[derive(Debug, Default)]
pub struct RuleSet {
    procedure_rules: Vec<Rule<ProcedureNode>>,
    router_rules: Vec<Rule<RouterMetadata>>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in rules, in their documented order.
    pub fn defaults() -> Self {
        Self {
            procedure_rules: default_procedure_rules(),
            router_rules: default_router_rules(),
        }
    }

    /// Built-in rules with disabled ids removed and severity overrides applied.
    pub fn configured(config: &RuleConfig) -> Result<Self, AnalyzeError> {
        let defaults = Self::defaults();
        let known: Vec<&str> = defaults.ids().collect();
        for id in config.disabled.iter().chain(config.severity.keys()) {
            if !known.contains(&id.as_str()) {
                return Err(AnalyzeError::Configuration(format!("unknown rule id {:?}", id)));
            }
        }

        let Self {
            procedure_rules,
            router_rules,
        } = defaults;
        Ok(Self {
            procedure_rules: apply_config(procedure_rules, config),
            router_rules: apply_config(router_rules, config),
        })
    }

    pub fn with_procedure_rule(mut self, rule: Rule<ProcedureNode>) -> Self {
        self.procedure_rules.push(rule);
        self
    }

    pub fn with_router_rule(mut self, rule: Rule<RouterMetadata>) -> Self {
        self.router_rules.push(rule);
        self
    }

    pub fn procedure_rules(&self) -> &[Rule<ProcedureNode>] {
        &self.procedure_rules
    }

    pub fn router_rules(&self) -> &[Rule<RouterMetadata>] {
        &self.router_rules
    }

    /// Ids of every rule, procedure rules first.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.procedure_rules
            .iter()
            .map(Rule::id)
            .chain(self.router_rules.iter().map(Rule::id))
    }

    pub fn len(&self) -> usize {
        self.procedure_rules.len() + self.router_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluate every procedure rule per procedure, then every router rule
    /// per router. The first failing rule aborts evaluation.
    pub fn apply(
        &self,
        procedures: &[ProcedureNode],
        routers: &[RouterMetadata],
        ctx: &AnalysisContext<'_>,
    ) -> Result<Vec<Finding>, AnalyzeError> {
        let mut findings = Vec::new();
        evaluate_all(&self.procedure_rules, procedures, ctx, &mut findings)?;
        evaluate_all(&self.router_rules, routers, ctx, &mut findings)?;
        Ok(findings)
    }
}

fn apply_config<T>(rules: Vec<Rule<T>>, config: &RuleConfig) -> Vec<Rule<T>> {
    rules
        .into_iter()
        .filter(|rule| !config.disabled.iter().any(|id| id == rule.id()))
        .map(|rule| match config.severity.get(rule.id()) {
            Some(severity) => rule.with_severity(*severity),
            None => rule,
        })
        .collect()
}

fn evaluate_all<T: RuleSubject>(
    rules: &[Rule<T>],
    subjects: &[T],
    ctx: &AnalysisContext<'_>,
    findings: &mut Vec<Finding>,
) -> Result<(), AnalyzeError> {
    for subject in subjects {
        for rule in rules {
            let produced = rule
                .evaluate(subject, ctx)
                .map_err(|e| AnalyzeError::RuleFailed {
                    rule: rule.id().to_string(),
                    subject: subject.describe(),
                    source: e.into(),
                })?;
            findings.extend(produced);
        }
    }
    Ok(())
}
