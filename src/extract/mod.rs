//! Router and procedure extraction.
//!
//! # Architecture
//!
//! ```text
//! SourceFile ──▶ collect_router_call_sites ──▶ RouterParser ──▶ ProcedureWalker
//!                                                   │                  │
//!                                                   ▼                  ▼
//!                                              Extraction ◀── ResolverAnalyzer
//! ```
//!
//! Files are processed one at a time. Each file yields its own
//! [`Extraction`], and the per-file values are folded, in file order, into the
//! run's result.

pub mod detection;
pub mod procedure;
pub mod resolver;
pub mod router;
pub mod scope;

use serde::{Deserialize, Serialize};

use crate::model::{ProcedureNode, RouterMetadata};
use crate::syntax::SourceFile;
use crate::trace::Trace;

pub use detection::{
    collect_router_call_sites, RouterCallSite, RouterDetectionPolicy,
    DEFAULT_ROUTER_IDENTIFIER_PATTERN,
};
pub use procedure::{ProcedureShape, ProcedureWalker, DEFAULT_MAX_CHAIN_DEPTH};
pub use resolver::{
    MatchMode, PatternSet, ResolverAnalyzer, ResolverFacts, DEFAULT_DATA_STORE_IDENTIFIERS,
    DEFAULT_ERROR_TYPES, DEFAULT_SIDE_EFFECT_PATTERNS,
};
pub use router::{ParsedRouter, RouterParser};
pub use scope::FileScope;

/// Procedures and routers accumulated over one or more files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub procedures: Vec<ProcedureNode>,
    pub routers: Vec<RouterMetadata>,
}

impl Extraction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append another extraction, preserving order.
    pub fn merge(&mut self, other: Extraction) {
        self.procedures.extend(other.procedures);
        self.routers.extend(other.routers);
    }

    pub fn add_router(&mut self, parsed: ParsedRouter) {
        self.routers.push(parsed.metadata);
        self.procedures.extend(parsed.procedures);
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty() && self.routers.is_empty()
    }
}

/// Runs extraction with one policy and one set of heuristics.
pub struct Extractor {
    policy: RouterDetectionPolicy,
    analyzer: ResolverAnalyzer,
    max_chain_depth: usize,
    trace: Trace,
}

impl Extractor {
    pub fn new(policy: RouterDetectionPolicy, analyzer: ResolverAnalyzer) -> Self {
        Self {
            policy,
            analyzer,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            trace: Trace::disabled(),
        }
    }

    pub fn max_chain_depth(mut self, depth: usize) -> Self {
        self.max_chain_depth = depth;
        self
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.trace = trace;
        self
    }

    /// Extract every router of a single file, in source order.
    pub fn extract_file(&self, file: &SourceFile) -> Extraction {
        self.trace.log(|| format!("scanning {}", file.path));

        let mut extraction = Extraction::new();
        let sites = collect_router_call_sites(file, &self.policy, &self.trace);
        if sites.is_empty() {
            self.trace.log(|| format!("no router found in {}", file.path));
            return extraction;
        }

        let scope = FileScope::from_file(file);
        let parser = RouterParser::new(
            &self.policy,
            &self.analyzer,
            self.max_chain_depth,
            &self.trace,
        );

        for site in &sites {
            if let Some(parsed) = parser.parse(site, file, &scope) {
                self.trace.log(|| {
                    format!(
                        "router '{}' at {}:{} with {} procedure(s)",
                        parsed.metadata.name,
                        parsed.metadata.file,
                        parsed.metadata.start_line,
                        parsed.procedures.len()
                    )
                });
                extraction.add_router(parsed);
            }
        }

        extraction
    }

    /// Fold per-file extractions in file order.
    pub fn extract_all(&self, files: &[SourceFile]) -> Extraction {
        files.iter().fold(Extraction::new(), |mut acc, file| {
            acc.merge(self.extract_file(file));
            acc
        })
    }
}
