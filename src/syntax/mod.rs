//! Syntax layer: parsed sources and the tagged tree the extractor walks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ Include globs   │────▶│ FsProvider   │────▶│ SourceFile    │
//! └─────────────────┘     │ (tree-sitter)│     │ (SyntaxNode)  │
//!                         └──────────────┘     └───────────────┘
//! ```
//!
//! Any [`SyntaxProvider`] can stand in for the filesystem one; tests build
//! [`SourceFile`]s directly from strings.

mod node;
mod provider;
mod source;
mod typescript;

pub use node::{
    Descendants, FunctionNode, NodeKind, ObjectEntry, PropertyEntry, Span, SyntaxNode,
};
pub use provider::{FsProvider, SyntaxProvider};
pub use source::SourceFile;
pub use typescript::SourceLanguage;
