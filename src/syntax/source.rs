//! Parsed source files.

use std::path::Path;

use anyhow::Context;
use tree_sitter::Parser;

use super::typescript::{self, SourceLanguage};
use super::{Span, SyntaxNode};

/// A parsed source file together with its lowered syntax tree.
///
/// The source text is kept so heuristics can inspect the exact text covered
/// by a node span.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path relative to the analysis root, using `/` separators.
    pub path: String,
    pub language: SourceLanguage,
    pub source: String,
    pub root: SyntaxNode,
}

impl SourceFile {
    /// Parse source text. The grammar is picked from the path extension.
    pub fn parse(path: impl Into<String>, source: impl Into<String>) -> anyhow::Result<Self> {
        let path = path.into();
        let source = source.into();

        let ext = Path::new(&path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let language = SourceLanguage::from_extension(ext)
            .with_context(|| format!("unsupported source file {:?}", path))?;

        let mut parser = Parser::new();
        parser.set_language(&language.grammar())?;
        let tree = parser
            .parse(&source, None)
            .with_context(|| format!("tree-sitter failed to parse {:?}", path))?;

        let root = typescript::lower(tree.root_node(), source.as_bytes());

        Ok(Self {
            path,
            language,
            source,
            root,
        })
    }

    /// Get the source text covered by a span.
    pub fn text(&self, span: Span) -> &str {
        self.source.get(span.start_byte..span.end_byte).unwrap_or("")
    }

    /// Top-level statements of the file.
    pub fn statements(&self) -> &[SyntaxNode] {
        match &self.root.kind {
            super::NodeKind::Program(items) => items,
            _ => &[],
        }
    }
}
