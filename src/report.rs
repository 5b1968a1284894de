//! Output formatting for routercheck results.
//!
//! Supports two output formats:
//! - Table: colored terminal output for human readability
//! - JSON: the serialized [`AnalysisResult`] for programmatic consumption

use colored::*;
use std::io::{self, Write};

use crate::analyzer::AnalysisResult;
use crate::export::ApiDefinition;
use crate::rules::{Finding, RuleInfo, RuleSet, Severity, Summary};

/// Output format of the `analyze` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Table,
    Json,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Format::Table),
            "json" => Ok(Format::Json),
            _ => Err(format!("invalid format {:?}, must be 'table' or 'json'", s)),
        }
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// Write the full result as pretty-printed JSON.
pub fn write_json<W: Write>(out: &mut W, result: &AnalysisResult) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, result)?;
    writeln!(out)?;
    Ok(())
}

/// Write exported API definitions as a JSON array.
pub fn write_api_json<W: Write>(
    out: &mut W,
    definitions: &[ApiDefinition],
) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, definitions)?;
    writeln!(out)?;
    Ok(())
}

// =============================================================================
// Table Format
// =============================================================================

/// Write findings as a table followed by the severity summary.
pub fn write_table<W: Write>(out: &mut W, result: &AnalysisResult) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "  {} v{}",
        "routercheck".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(
        out,
        "  {}{} router(s), {} procedure(s)",
        "Scanned: ".dimmed(),
        result.routers.len(),
        result.procedures.len()
    )?;
    writeln!(out)?;

    if !result.findings.is_empty() {
        write_findings(out, &result.findings)?;
        writeln!(out)?;
    }

    write_summary(out, &result.summary)?;
    writeln!(out)
}

fn write_findings<W: Write>(out: &mut W, findings: &[Finding]) -> io::Result<()> {
    writeln!(out, "  {} ({}):", "Findings".bold(), findings.len())?;
    writeln!(out)?;

    let location_width = findings
        .iter()
        .map(|f| location(f).len())
        .max()
        .unwrap_or(0);

    for f in findings {
        write!(out, "    {} ", severity_tag(f.severity))?;
        let padded = format!("{:<width$}", location(f), width = location_width);
        write!(out, "{}  ", padded.blue())?;
        write!(out, "{:<36}", subject(f))?;
        writeln!(out, "{}", f.rule.dimmed())?;
        writeln!(out, "            {}", f.message)?;
    }
    Ok(())
}

fn write_summary<W: Write>(out: &mut W, summary: &Summary) -> io::Result<()> {
    let total = summary.total();
    let status = if summary.has_errors() {
        "✗".red()
    } else {
        "✓".green()
    };
    writeln!(
        out,
        "  {} Finished analysis with {} finding(s)  {}  {}  {}",
        status,
        total,
        format!("{} error", summary.error).red(),
        format!("{} warn", summary.warn).yellow(),
        format!("{} info", summary.info).blue()
    )
}

fn severity_tag(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "ERROR".red(),
        Severity::Warn => "WARN ".yellow(),
        Severity::Info => "INFO ".blue(),
    }
}

fn location(f: &Finding) -> String {
    if f.line > 0 {
        format!("{}:{}", f.file, f.line)
    } else {
        f.file.clone()
    }
}

fn subject(f: &Finding) -> String {
    match &f.procedure {
        Some(procedure) => format!("{}.{}", f.router, procedure),
        None => f.router.clone(),
    }
}

/// Dry-run table of exported API definitions.
pub fn write_api_table<W: Write>(out: &mut W, definitions: &[ApiDefinition]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "  {} ({} procedure(s), dry run):",
        "API definitions".bold(),
        definitions.len()
    )?;
    writeln!(out)?;
    for def in definitions {
        writeln!(
            out,
            "    {:<5} {:<40} {:<10} {}",
            def.method,
            def.path,
            def.visibility.as_str(),
            format!("{}:{}", def.file, def.line).dimmed()
        )?;
    }
    writeln!(out)
}

/// List rules with their effective severity and description.
pub fn write_rules<W: Write>(out: &mut W, rules: &RuleSet) -> io::Result<()> {
    let procedure: Vec<&RuleInfo> = rules.procedure_rules().iter().map(|r| r.info()).collect();
    let router: Vec<&RuleInfo> = rules.router_rules().iter().map(|r| r.info()).collect();

    writeln!(out)?;
    for (title, infos) in [("Procedure rules", procedure), ("Router rules", router)] {
        writeln!(out, "  {} ({}):", title.bold(), infos.len())?;
        writeln!(out)?;
        for info in infos {
            let id = format!("{:<36}", info.id);
            writeln!(
                out,
                "    {} {}{}",
                severity_tag(info.severity),
                id.cyan(),
                info.description
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> AnalysisResult {
        let findings = vec![
            Finding {
                severity: Severity::Warn,
                message: "mutation appRouter.setUser has no input validation".to_string(),
                file: "src/app.ts".to_string(),
                line: 7,
                router: "appRouter".to_string(),
                procedure: Some("setUser".to_string()),
                rule: "mutation-missing-input".to_string(),
            },
            Finding {
                severity: Severity::Info,
                message: "router emptyRouter declares no procedures".to_string(),
                file: "src/empty.ts".to_string(),
                line: 1,
                router: "emptyRouter".to_string(),
                procedure: None,
                rule: "empty-router".to_string(),
            },
        ];
        AnalysisResult {
            summary: Summary::from_findings(&findings),
            findings,
            procedures: Vec::new(),
            routers: Vec::new(),
        }
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<Format>(), Ok(Format::Json));
        assert!("sarif".parse::<Format>().is_err());
    }

    #[test]
    fn test_table_lists_findings_and_summary() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        write_table(&mut out, &result()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("src/app.ts:7"));
        assert!(text.contains("appRouter.setUser"));
        assert!(text.contains("mutation-missing-input"));
        assert!(text.contains("Finished analysis with 2 finding(s)"));
    }

    #[test]
    fn test_rule_listing_shows_descriptions() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        write_rules(&mut out, &RuleSet::defaults()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Procedure rules (8):"));
        assert!(text.contains("Router rules (4):"));
        let line = text
            .lines()
            .find(|l| l.contains("mixed-mutation-visibility"))
            .expect("router rule should be listed");
        assert!(line.contains("INFO"));
        assert!(line.contains("Mutations of one router should share a visibility tier"));
    }
}
