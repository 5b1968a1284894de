//! Core types for rule findings.

use serde::{Deserialize, Serialize};

/// Severity levels for findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warn => write!(f, "warn"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// A single reported issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
    pub file: String,
    pub line: usize,
    pub router: String,
    /// Absent for router-level findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,
    pub rule: String,
}

/// Finding counts by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub info: usize,
    pub warn: usize,
    pub error: usize,
}

impl Summary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        findings.iter().fold(Self::default(), |mut summary, f| {
            match f.severity {
                Severity::Info => summary.info += 1,
                Severity::Warn => summary.warn += 1,
                Severity::Error => summary.error += 1,
            }
            summary
        })
    }

    pub fn total(&self) -> usize {
        self.info + self.warn + self.error
    }

    pub fn has_errors(&self) -> bool {
        self.error > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity) -> Finding {
        Finding {
            severity,
            message: String::new(),
            file: "a.ts".to_string(),
            line: 1,
            router: "appRouter".to_string(),
            procedure: None,
            rule: "test".to_string(),
        }
    }

    #[test]
    fn test_summary_tallies_every_finding() {
        let findings = vec![
            finding(Severity::Warn),
            finding(Severity::Error),
            finding(Severity::Warn),
            finding(Severity::Info),
        ];
        let summary = Summary::from_findings(&findings);
        assert_eq!(
            summary,
            Summary {
                info: 1,
                warn: 2,
                error: 1
            }
        );
        assert_eq!(summary.total(), findings.len());
        assert!(summary.has_errors());
        assert!(!Summary::from_findings(&[]).has_errors());
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("WARNING".parse::<Severity>(), Ok(Severity::Warn));
        assert_eq!("error".parse::<Severity>(), Ok(Severity::Error));
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_router_finding_omits_procedure() {
        let json = serde_json::to_value(finding(Severity::Info)).unwrap();
        assert!(json.get("procedure").is_none());
        assert_eq!(json["severity"], "info");
    }
}
