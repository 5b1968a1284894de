//! Built-in router rules.

use std::collections::BTreeSet;

use crate::model::{Method, RouterMetadata, Visibility};

use super::engine::Rule;
use super::types::Severity;

pub fn default_router_rules() -> Vec<Rule<RouterMetadata>> {
    vec![
        Rule::new(
            "large-router",
            Severity::Warn,
            "Routers should be split once they grow large",
            |router: &RouterMetadata, ctx, info| {
                let max = ctx.thresholds.max_router_lines;
                if router.line_count > max {
                    return Ok(vec![info.router_finding(
                        router,
                        format!(
                            "router {} spans {} lines (max {})",
                            router.name, router.line_count, max
                        ),
                    )]);
                }
                Ok(Vec::new())
            },
        ),
        Rule::new(
            "empty-router",
            Severity::Info,
            "Routers should declare at least one procedure or nested router",
            |router: &RouterMetadata, ctx, info| {
                if router.nested_routers.is_empty() && ctx.procedures_of(router).next().is_none() {
                    return Ok(vec![info.router_finding(
                        router,
                        format!("router {} declares no procedures", router.name),
                    )]);
                }
                Ok(Vec::new())
            },
        ),
        Rule::new(
            "duplicate-router-name",
            Severity::Info,
            "Router names should be unique across files",
            |router: &RouterMetadata, ctx, info| {
                if router.name == "default" {
                    return Ok(Vec::new());
                }
                let others: BTreeSet<&str> = ctx
                    .routers
                    .iter()
                    .filter(|r| r.name == router.name && r.file != router.file)
                    .map(|r| r.file.as_str())
                    .collect();
                if others.is_empty() {
                    return Ok(Vec::new());
                }
                Ok(vec![info.router_finding(
                    router,
                    format!(
                        "router name {} is also declared in {}",
                        router.name,
                        others.into_iter().collect::<Vec<_>>().join(", ")
                    ),
                )])
            },
        ),
        Rule::new(
            "mixed-mutation-visibility",
            Severity::Info,
            "Mutations of one router should share a visibility tier",
            |router: &RouterMetadata, ctx, info| {
                let tiers: BTreeSet<&str> = ctx
                    .procedures_of(router)
                    .filter(|p| p.method == Method::Mutation && p.visibility != Visibility::Unknown)
                    .map(|p| p.visibility.as_str())
                    .collect();
                if tiers.len() > 1 {
                    return Ok(vec![info.router_finding(
                        router,
                        format!(
                            "mutations of router {} mix visibility tiers: {}",
                            router.name,
                            tiers.into_iter().collect::<Vec<_>>().join(", ")
                        ),
                    )]);
                }
                Ok(Vec::new())
            },
        ),
    ]
}
