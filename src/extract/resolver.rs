//! Resolver analysis: size and textual heuristics over a handler body.
//!
//! The heuristics are deliberately textual. Two runs over the same text with
//! the same pattern sets always agree; semantic accuracy is not a goal.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::HeuristicsConfig;
use crate::error::AnalyzeError;
use crate::syntax::{FunctionNode, NodeKind, SourceFile, SyntaxNode};

/// Identifiers whose property accesses count as data-store access.
pub const DEFAULT_DATA_STORE_IDENTIFIERS: &[&str] = &["db", "prisma"];

/// Error type names that mark explicit error handling.
pub const DEFAULT_ERROR_TYPES: &[&str] = &["TRPCError"];

/// Calls recognizable as network, filesystem, messaging or payment dispatch.
pub const DEFAULT_SIDE_EFFECT_PATTERNS: &[&str] = &[
    r"\bfetch\s*\(",
    r"\baxios\s*[.(]",
    r"\bfs\.(?:promises\.)?(?:write|append|unlink|rm|mkdir|rename|copy)\w*\s*\(",
    r"\b(?:sendEmail|sendMail|mailer\.send|resend\.emails\.send)\b",
    r"\b(?:publish|emit|enqueue|dispatch)\s*\(",
    r"\bstripe\.\w+\.(?:create|update|del|cancel)\b",
    r"\b(?:redis|queue)\.\w+\s*\(",
    r"(?i)webhook",
];

/// How the patterns of a [`PatternSet`] combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// At least one pattern matches.
    #[default]
    Any,
    /// Every pattern matches.
    All,
}

/// Ordered list of compiled patterns with a combinator.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Regex>,
    mode: MatchMode,
}

impl PatternSet {
    pub fn new<I, S>(patterns: I, mode: MatchMode) -> Result<Self, AnalyzeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|e| AnalyzeError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    source: e,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns, mode })
    }

    /// An empty set never matches, whatever the mode.
    pub fn is_match(&self, text: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        match self.mode {
            MatchMode::Any => self.patterns.iter().any(|p| p.is_match(text)),
            MatchMode::All => self.patterns.iter().all(|p| p.is_match(text)),
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Facts derived from one resolver. All zero/false without a resolver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverFacts {
    pub line_count: usize,
    pub uses_data_store: bool,
    pub has_error_handling: bool,
    pub has_side_effects: bool,
}

/// Compiled heuristics applied to every resolver body of a run.
#[derive(Debug, Clone)]
pub struct ResolverAnalyzer {
    data_store: Option<Regex>,
    error_types: Vec<String>,
    side_effects: PatternSet,
}

impl ResolverAnalyzer {
    pub fn new(config: &HeuristicsConfig) -> Result<Self, AnalyzeError> {
        let data_store = if config.data_store_identifiers.is_empty() {
            None
        } else {
            let alternation = config
                .data_store_identifiers
                .iter()
                .map(|id| regex::escape(id))
                .collect::<Vec<_>>()
                .join("|");
            let source = format!(r"\b(?:{})\.", alternation);
            Some(Regex::new(&source).map_err(|e| AnalyzeError::InvalidPattern {
                pattern: source.clone(),
                source: e,
            })?)
        };

        let error_types = config
            .error_types
            .iter()
            .filter(|t| !t.is_empty())
            .cloned()
            .collect();

        let side_effects =
            PatternSet::new(&config.side_effect_patterns, config.side_effect_mode)?;

        Ok(Self {
            data_store,
            error_types,
            side_effects,
        })
    }

    pub fn analyze(&self, resolver: Option<&FunctionNode>, file: &SourceFile) -> ResolverFacts {
        let Some(resolver) = resolver else {
            return ResolverFacts::default();
        };

        let body = resolver.body.as_ref();
        let text = file.text(body.span);

        ResolverFacts {
            line_count: body.span.line_count(),
            uses_data_store: self
                .data_store
                .as_ref()
                .map_or(false, |re| re.is_match(text)),
            has_error_handling: self.has_error_handling(text, body, file),
            has_side_effects: self.side_effects.is_match(text),
        }
    }

    fn mentions_error_type(&self, text: &str) -> bool {
        self.error_types.iter().any(|t| text.contains(t.as_str()))
    }

    fn has_error_handling(&self, text: &str, body: &SyntaxNode, file: &SourceFile) -> bool {
        if self.mentions_error_type(text) {
            return true;
        }
        body.descendants().any(|node| match &node.kind {
            NodeKind::Try(_) => true,
            NodeKind::Throw(Some(argument)) => self.mentions_error_type(file.text(argument.span)),
            _ => false,
        })
    }
}
