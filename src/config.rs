//! Configuration schema for routercheck.
//!
//! A `routercheck.yaml` file mirrors [`AnalyzerOptions`]; command-line flags
//! override whatever the file sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyzer::{AnalyzerOptions, Target};
use crate::export::ExportOptions;
use crate::extract::{
    MatchMode, ResolverAnalyzer, RouterDetectionPolicy, DEFAULT_DATA_STORE_IDENTIFIERS,
    DEFAULT_ERROR_TYPES, DEFAULT_MAX_CHAIN_DEPTH, DEFAULT_SIDE_EFFECT_PATTERNS,
};
use crate::rules::{RuleSet, Severity, Thresholds};

/// Configuration file names searched for in the analysis root.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["routercheck.yaml", ".routercheck.yaml"];

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub version: String,
    /// "trpc" (default) or "next-trpc"
    #[serde(default)]
    pub target: Option<String>,
    /// Glob patterns of files to scan, relative to the root
    #[serde(default)]
    pub include: Vec<String>,
    /// Callee names that always construct a router (e.g. "createTRPCRouter", "t.router")
    #[serde(default)]
    pub router_factories: Vec<String>,
    /// Regex for identifiers that denote a router by name (default: /router$/i)
    #[serde(default)]
    pub router_identifier_pattern: Option<String>,
    /// Maximum nested calls walked per procedure (default: 64)
    #[serde(default)]
    pub max_chain_depth: Option<usize>,
    #[serde(default)]
    pub heuristics: HeuristicsConfig,
    #[serde(default)]
    pub rules: RuleConfig,
    #[serde(default)]
    pub export: ExportOptions,
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Find a configuration file in `root`.
    pub fn discover(root: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
    }

    /// Build analyzer options rooted at `root` from this configuration.
    pub fn analyzer_options(&self, root: &Path) -> anyhow::Result<AnalyzerOptions> {
        let mut options = AnalyzerOptions::new(root);
        if let Some(target) = &self.target {
            options.target = target.parse::<Target>()?;
        }
        options.include = self.include.clone();
        options.router_factories = self.router_factories.clone();
        options.router_identifier_pattern = self.router_identifier_pattern.clone();
        options.max_chain_depth = self.max_chain_depth.unwrap_or(DEFAULT_MAX_CHAIN_DEPTH);
        options.heuristics = self.heuristics.clone();
        options.rules = self.rules.clone();
        Ok(options)
    }
}

/// Tunable pattern sets used by resolver analysis.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HeuristicsConfig {
    /// Identifiers whose property accesses count as data-store access (default: db, prisma)
    #[serde(default = "default_data_store_identifiers")]
    pub data_store_identifiers: Vec<String>,
    /// Error type names that mark explicit error handling (default: TRPCError)
    #[serde(default = "default_error_types")]
    pub error_types: Vec<String>,
    /// Regex patterns recognizing side-effecting calls
    #[serde(default = "default_side_effect_patterns")]
    pub side_effect_patterns: Vec<String>,
    /// "any" (default) or "all"
    #[serde(default)]
    pub side_effect_mode: MatchMode,
}

fn default_data_store_identifiers() -> Vec<String> {
    to_strings(DEFAULT_DATA_STORE_IDENTIFIERS)
}

fn default_error_types() -> Vec<String> {
    to_strings(DEFAULT_ERROR_TYPES)
}

fn default_side_effect_patterns() -> Vec<String> {
    to_strings(DEFAULT_SIDE_EFFECT_PATTERNS)
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            data_store_identifiers: default_data_store_identifiers(),
            error_types: default_error_types(),
            side_effect_patterns: default_side_effect_patterns(),
            side_effect_mode: MatchMode::Any,
        }
    }
}

/// Rule selection and thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleConfig {
    /// Rule ids to skip
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Severity overrides keyed by rule id
    #[serde(default)]
    pub severity: BTreeMap<String, Severity>,
    /// Resolver size limit for large-resolver (default: 60)
    #[serde(default = "default_max_resolver_lines")]
    pub max_resolver_lines: usize,
    /// Router size limit for large-router (default: 400)
    #[serde(default = "default_max_router_lines")]
    pub max_router_lines: usize,
}

fn default_max_resolver_lines() -> usize {
    Thresholds::default().max_resolver_lines
}

fn default_max_router_lines() -> usize {
    Thresholds::default().max_router_lines
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            disabled: Vec::new(),
            severity: BTreeMap::new(),
            max_resolver_lines: default_max_resolver_lines(),
            max_router_lines: default_max_router_lines(),
        }
    }
}

impl RuleConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            max_resolver_lines: self.max_resolver_lines,
            max_router_lines: self.max_router_lines,
        }
    }
}

/// Validate a configuration for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if let Some(target) = &config.target {
        target.parse::<Target>()?;
    }

    RouterDetectionPolicy::new(
        &config.router_factories,
        config.router_identifier_pattern.as_deref(),
    )?;

    if config.max_chain_depth == Some(0) {
        anyhow::bail!("max_chain_depth must be at least 1");
    }

    for pattern in &config.include {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid include pattern {:?}: {}", pattern, e))?;
    }

    ResolverAnalyzer::new(&config.heuristics)?;
    RuleSet::configured(&config.rules)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
version: "1"
target: next-trpc
include:
  - "src/server/**/*.ts"
router_factories: [createTRPCRouter]
router_identifier_pattern: "/router$/i"
heuristics:
  side_effect_patterns: ['\bfetch\(']
  side_effect_mode: all
rules:
  disabled: [unknown-visibility]
  severity:
    mutation-missing-input: error
  max_resolver_lines: 40
export:
  prefix: /api/trpc
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.include.len(), 1);
        assert_eq!(config.heuristics.side_effect_mode, MatchMode::All);
        // Unset heuristics keep their defaults.
        assert_eq!(config.heuristics.error_types, vec!["TRPCError"]);
        assert_eq!(config.rules.max_resolver_lines, 40);
        assert_eq!(config.rules.max_router_lines, 400);
        assert_eq!(
            config.rules.severity.get("mutation-missing-input"),
            Some(&Severity::Error)
        );
        assert_eq!(config.export.prefix.as_deref(), Some("/api/trpc"));
        validate(&config).unwrap();

        let options = config.analyzer_options(Path::new("/repo")).unwrap();
        assert_eq!(options.target, Target::NextTrpc);
        assert_eq!(options.router_factories, vec!["createTRPCRouter"]);
        assert_eq!(options.max_chain_depth, DEFAULT_MAX_CHAIN_DEPTH);
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config: Config = serde_yaml::from_str("version: \"1\"").unwrap();
        assert_eq!(config.heuristics.data_store_identifiers, vec!["db", "prisma"]);
        validate(&config).unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_target = Config {
            target: Some("express".to_string()),
            ..Config::default()
        };
        assert!(validate(&bad_target).is_err());

        let bad_pattern = Config {
            router_identifier_pattern: Some("(".to_string()),
            ..Config::default()
        };
        assert!(validate(&bad_pattern).is_err());

        let bad_rule: Config = serde_yaml::from_str("rules:\n  disabled: [nope]").unwrap();
        let err = validate(&bad_rule).unwrap_err();
        assert!(err.to_string().contains("nope"));

        let zero_depth = Config {
            max_chain_depth: Some(0),
            ..Config::default()
        };
        assert!(validate(&zero_depth).is_err());
    }

    #[test]
    fn test_discover() {
        let temp = TempDir::new().unwrap();
        assert!(Config::discover(temp.path()).is_none());
        std::fs::write(temp.path().join(".routercheck.yaml"), "version: \"1\"\n").unwrap();
        assert_eq!(
            Config::discover(temp.path()).unwrap(),
            temp.path().join(".routercheck.yaml")
        );
    }
}
