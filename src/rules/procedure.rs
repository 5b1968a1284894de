//! Built-in procedure rules.

use crate::model::{Method, ProcedureNode, Visibility};

use super::engine::Rule;
use super::types::Severity;

pub fn default_procedure_rules() -> Vec<Rule<ProcedureNode>> {
    vec![
        Rule::new(
            "mutation-missing-input",
            Severity::Warn,
            "Mutations should validate their input with .input(...)",
            |node: &ProcedureNode, _, info| {
                if node.method == Method::Mutation && !node.has_input {
                    return Ok(vec![info.procedure_finding(
                        node,
                        format!("mutation {} has no input validation", node.qualified_name()),
                    )]);
                }
                Ok(Vec::new())
            },
        ),
        Rule::new(
            "public-side-effect",
            Severity::Error,
            "Public procedures should not trigger side effects",
            |node: &ProcedureNode, _, info| {
                if node.visibility == Visibility::Public && node.has_side_effects {
                    return Ok(vec![info.procedure_finding(
                        node,
                        format!(
                            "public {} {} performs side effects without authentication",
                            node.method,
                            node.qualified_name()
                        ),
                    )]);
                }
                Ok(Vec::new())
            },
        ),
        Rule::new(
            "query-side-effect",
            Severity::Warn,
            "Queries should be free of side effects",
            |node: &ProcedureNode, _, info| {
                if node.method == Method::Query && node.has_side_effects {
                    return Ok(vec![info.procedure_finding(
                        node,
                        format!(
                            "query {} performs side effects; consider a mutation",
                            node.qualified_name()
                        ),
                    )]);
                }
                Ok(Vec::new())
            },
        ),
        Rule::new(
            "side-effect-without-error-handling",
            Severity::Warn,
            "Side-effecting resolvers should handle failures",
            |node: &ProcedureNode, _, info| {
                if node.has_side_effects && !node.has_error_handling {
                    return Ok(vec![info.procedure_finding(
                        node,
                        format!(
                            "{} performs side effects without error handling",
                            node.qualified_name()
                        ),
                    )]);
                }
                Ok(Vec::new())
            },
        ),
        Rule::new(
            "data-store-without-error-handling",
            Severity::Info,
            "Data-store access should surface typed errors",
            |node: &ProcedureNode, _, info| {
                if node.uses_data_store && !node.has_error_handling {
                    return Ok(vec![info.procedure_finding(
                        node,
                        format!(
                            "{} accesses the data store without error handling",
                            node.qualified_name()
                        ),
                    )]);
                }
                Ok(Vec::new())
            },
        ),
        Rule::new(
            "missing-output-validation",
            Severity::Info,
            "Queries should declare their output with .output(...)",
            |node: &ProcedureNode, _, info| {
                if node.method == Method::Query && !node.has_output {
                    return Ok(vec![info.procedure_finding(
                        node,
                        format!("query {} has no output validation", node.qualified_name()),
                    )]);
                }
                Ok(Vec::new())
            },
        ),
        Rule::new(
            "unknown-visibility",
            Severity::Info,
            "Procedures should be built from a recognized visibility tier",
            |node: &ProcedureNode, _, info| {
                if node.visibility == Visibility::Unknown {
                    return Ok(vec![info.procedure_finding(
                        node,
                        format!(
                            "could not determine the visibility of {}",
                            node.qualified_name()
                        ),
                    )]);
                }
                Ok(Vec::new())
            },
        ),
        Rule::new(
            "large-resolver",
            Severity::Warn,
            "Resolvers should stay small; move logic into services",
            |node: &ProcedureNode, ctx, info| {
                let max = ctx.thresholds.max_resolver_lines;
                if node.resolver_line_count > max {
                    return Ok(vec![info.procedure_finding(
                        node,
                        format!(
                            "resolver of {} spans {} lines (max {})",
                            node.qualified_name(),
                            node.resolver_line_count,
                            max
                        ),
                    )]);
                }
                Ok(Vec::new())
            },
        ),
    ]
}
