//! Analysis entry point: load sources, extract, evaluate rules.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{HeuristicsConfig, RuleConfig};
use crate::error::{AnalyzeError, Result};
use crate::extract::{
    Extraction, Extractor, ResolverAnalyzer, RouterDetectionPolicy, DEFAULT_MAX_CHAIN_DEPTH,
};
use crate::model::{ProcedureNode, RouterMetadata};
use crate::rules::{AnalysisContext, Finding, RuleSet, Summary};
use crate::syntax::{FsProvider, SourceFile, SyntaxProvider};
use crate::trace::Trace;

/// Files scanned when no include pattern is given.
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &[
    "src/**/*.{ts,tsx}",
    "server/**/*.{ts,tsx}",
    "app/**/*.{ts,tsx}",
    "pages/api/**/*.{ts,tsx}",
    "packages/*/src/**/*.{ts,tsx}",
];

/// Ecosystem being analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    #[default]
    Trpc,
    NextTrpc,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Trpc => "trpc",
            Target::NextTrpc => "next-trpc",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Target {
    type Err = AnalyzeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trpc" => Ok(Target::Trpc),
            "next-trpc" => Ok(Target::NextTrpc),
            _ => Err(AnalyzeError::UnsupportedTarget(s.to_string())),
        }
    }
}

/// Inputs of one analysis run.
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    pub root: PathBuf,
    pub target: Target,
    /// Include globs relative to `root`; empty means [`DEFAULT_INCLUDE_PATTERNS`].
    pub include: Vec<String>,
    pub router_factories: Vec<String>,
    pub router_identifier_pattern: Option<String>,
    pub max_chain_depth: usize,
    pub heuristics: HeuristicsConfig,
    pub rules: RuleConfig,
}

impl AnalyzerOptions {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            target: Target::default(),
            include: Vec::new(),
            router_factories: Vec::new(),
            router_identifier_pattern: None,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            heuristics: HeuristicsConfig::default(),
            rules: RuleConfig::default(),
        }
    }

    /// Effective include patterns.
    pub fn include_patterns(&self) -> Vec<String> {
        if self.include.is_empty() {
            DEFAULT_INCLUDE_PATTERNS.iter().map(|p| p.to_string()).collect()
        } else {
            self.include.clone()
        }
    }
}

/// Output of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub findings: Vec<Finding>,
    pub summary: Summary,
    pub procedures: Vec<ProcedureNode>,
    pub routers: Vec<RouterMetadata>,
}

impl AnalysisResult {
    pub fn has_errors(&self) -> bool {
        self.summary.has_errors()
    }
}

/// Runs the extraction pipeline and the rule engine.
pub struct Analyzer {
    options: AnalyzerOptions,
    provider: Box<dyn SyntaxProvider>,
    rules: Option<RuleSet>,
    trace: Trace,
}

impl Analyzer {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self {
            options,
            provider: Box::new(FsProvider::new()),
            rules: None,
            trace: Trace::disabled(),
        }
    }

    pub fn with_provider<P: SyntaxProvider + 'static>(mut self, provider: P) -> Self {
        self.provider = Box::new(provider);
        self
    }

    /// Replace the configured rule set.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.trace = trace;
        self
    }

    /// Load sources through the provider and analyse them.
    pub fn run(&self) -> Result<AnalysisResult> {
        let extractor = self.extractor()?;
        let configured;
        let rules = match &self.rules {
            Some(rules) => rules,
            None => {
                configured = RuleSet::configured(&self.options.rules)?;
                &configured
            }
        };

        let include = self.options.include_patterns();
        self.trace.log(|| {
            format!(
                "target {} under {} with include patterns: {}",
                self.options.target,
                self.options.root.display(),
                include.join(", ")
            )
        });

        let sources = self
            .provider
            .load(&self.options.root, &include)
            .map_err(|e| AnalyzeError::Provider {
                root: self.options.root.clone(),
                source: e.into(),
            })?;
        self.trace.log(|| format!("{} file(s) to scan", sources.len()));

        self.evaluate(&extractor, rules, &sources)
    }

    /// Analyse already-parsed sources. The provider is not consulted.
    pub fn analyze_sources(&self, sources: &[SourceFile]) -> Result<AnalysisResult> {
        let extractor = self.extractor()?;
        let configured;
        let rules = match &self.rules {
            Some(rules) => rules,
            None => {
                configured = RuleSet::configured(&self.options.rules)?;
                &configured
            }
        };
        self.evaluate(&extractor, rules, sources)
    }

    fn extractor(&self) -> Result<Extractor> {
        if self.options.max_chain_depth == 0 {
            return Err(AnalyzeError::Configuration(
                "max_chain_depth must be at least 1".to_string(),
            ));
        }
        let policy = RouterDetectionPolicy::new(
            &self.options.router_factories,
            self.options.router_identifier_pattern.as_deref(),
        )?;
        let analyzer = ResolverAnalyzer::new(&self.options.heuristics)?;

        Ok(Extractor::new(policy, analyzer)
            .max_chain_depth(self.options.max_chain_depth)
            .with_trace(self.trace.clone()))
    }

    fn evaluate(
        &self,
        extractor: &Extractor,
        rules: &RuleSet,
        sources: &[SourceFile],
    ) -> Result<AnalysisResult> {
        let Extraction {
            procedures,
            routers,
        } = extractor.extract_all(sources);

        let ctx = AnalysisContext {
            root: &self.options.root,
            provider: self.provider.as_ref(),
            routers: &routers,
            procedures: &procedures,
            sources,
            thresholds: self.options.rules.thresholds(),
        };
        let findings = rules.apply(&procedures, &routers, &ctx)?;
        let summary = Summary::from_findings(&findings);

        tracing::info!(
            files = sources.len(),
            routers = routers.len(),
            procedures = procedures.len(),
            findings = findings.len(),
            errors = summary.error,
            "analysis finished"
        );

        Ok(AnalysisResult {
            findings,
            summary,
            procedures,
            routers,
        })
    }
}
