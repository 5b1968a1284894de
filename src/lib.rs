//! Routercheck - static analysis for tRPC routers.
//!
//! Routercheck finds router construction calls in TypeScript and JavaScript
//! sources, recovers the shape of every procedure declared in them
//! (query or mutation, visibility tier, input/output validation, resolver
//! characteristics), and evaluates a rule set over the result.
//!
//! # Architecture
//!
//! The codebase uses tree-sitter for AST-based analysis:
//!
//! - `syntax`: tagged syntax tree, tree-sitter lowering, source providers
//! - `extract`: router detection, procedure walking, resolver heuristics
//! - `rules`: rule engine and the built-in procedure/router rules
//! - `analyzer`: the end-to-end pipeline
//! - `config`: YAML configuration schema
//! - `export`: API definition payloads
//! - `report`: output formatting (table, JSON)
//!
//! # Example
//!
//! ```no_run
//! use routercheck::{Analyzer, AnalyzerOptions};
//!
//! let mut options = AnalyzerOptions::new("./my-app");
//! options.router_factories = vec!["createTRPCRouter".to_string()];
//!
//! let result = Analyzer::new(options).run()?;
//! for finding in &result.findings {
//!     println!("{}:{} {}", finding.file, finding.line, finding.message);
//! }
//! # Ok::<(), routercheck::AnalyzeError>(())
//! ```

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod model;
pub mod report;
pub mod rules;
pub mod syntax;
pub mod trace;

pub use analyzer::{AnalysisResult, Analyzer, AnalyzerOptions, Target};
pub use config::Config;
pub use error::AnalyzeError;
pub use extract::{Extraction, Extractor, RouterDetectionPolicy};
pub use model::{Method, ProcedureNode, RouterMetadata, Visibility};
pub use rules::{AnalysisContext, Finding, Rule, RuleSet, Severity, Summary};
pub use syntax::{FsProvider, SourceFile, SyntaxProvider};
pub use trace::Trace;
