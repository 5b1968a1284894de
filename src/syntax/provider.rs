//! Syntax tree providers.
//!
//! A provider turns a root directory plus include globs into parsed
//! [`SourceFile`]s. Loading is the only I/O step of a run and happens once,
//! before any extraction begins.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use walkdir::WalkDir;

use super::{SourceFile, SourceLanguage};

/// Directories that never contain first-party router code.
const SKIPPED_DIRS: &[&str] = &["node_modules", "dist", "build", "coverage"];

/// Supplies parsed source files for a root directory.
pub trait SyntaxProvider: Send + Sync {
    /// Load every file under `root` matching one of `include`.
    ///
    /// Implementations must return files in a deterministic order and only
    /// files located under `root`.
    fn load(&self, root: &Path, include: &[String]) -> anyhow::Result<Vec<SourceFile>>;
}

/// Provider that walks the filesystem and parses with tree-sitter.
#[derive(Debug, Clone)]
pub struct FsProvider {
    parallel: bool,
}

impl Default for FsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FsProvider {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Parse files on the rayon pool (default) or sequentially.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Collect the files matching the include globs, sorted by relative path.
    pub fn collect_files(
        &self,
        root: &Path,
        include: &[String],
    ) -> anyhow::Result<Vec<(String, PathBuf)>> {
        let matcher = build_globset(root, include)?;
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !name.starts_with('.') && !SKIPPED_DIRS.iter().any(|skip| name == *skip)
            })
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Ok(rel) = path.strip_prefix(root) else {
                continue;
            };
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if rel.ends_with(".d.ts") || !matcher.is_match(&rel) {
                continue;
            }
            let supported = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(SourceLanguage::from_extension)
                .is_some();
            if !supported {
                continue;
            }
            files.push((rel, path.to_path_buf()));
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        files.dedup_by(|a, b| a.0 == b.0);
        Ok(files)
    }
}

impl SyntaxProvider for FsProvider {
    fn load(&self, root: &Path, include: &[String]) -> anyhow::Result<Vec<SourceFile>> {
        let files = self.collect_files(root, include)?;

        let parse = |(rel, abs): &(String, PathBuf)| -> Option<SourceFile> {
            let result = std::fs::read_to_string(abs)
                .map_err(anyhow::Error::from)
                .and_then(|source| SourceFile::parse(rel.clone(), source));
            match result {
                Ok(file) => Some(file),
                Err(e) => {
                    // Log but don't fail - some files may not be parseable
                    tracing::warn!(file = %rel, error = %e, "skipping unreadable source file");
                    None
                }
            }
        };

        // Both branches preserve the sorted input order.
        let parsed: Vec<SourceFile> = if self.parallel {
            files.par_iter().filter_map(parse).collect()
        } else {
            files.iter().filter_map(parse).collect()
        };

        tracing::debug!(root = %root.display(), files = parsed.len(), "loaded source files");
        Ok(parsed)
    }
}

/// Compile include patterns. A pattern without glob metacharacters that names
/// a directory under `root` includes everything below it.
fn build_globset(root: &Path, include: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in include {
        let mut normalized = pattern.trim_start_matches("./").to_string();
        if !normalized.contains(['*', '?', '[', '{']) {
            let dir = normalized.trim_end_matches('/');
            if !dir.is_empty() && root.join(dir).is_dir() {
                normalized = format!("{}/**", dir);
            }
        }
        let glob = Glob::new(&normalized)
            .map_err(|e| anyhow::anyhow!("invalid include pattern {:?}: {}", pattern, e))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
