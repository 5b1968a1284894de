//! Structured model produced by extraction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Procedure method kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Query,
    Mutation,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Query => "query",
            Method::Mutation => "mutation",
        }
    }

    /// Recognize a builder member name (`query` / `mutation`).
    pub fn from_member(name: &str) -> Option<Self> {
        match name {
            "query" => Some(Method::Query),
            "mutation" => Some(Method::Mutation),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Access tier inferred from the procedure builder chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Protected,
    Admin,
    #[default]
    Unknown,
}

/// Builder identifiers that denote a visibility tier.
const VISIBILITY_IDENTIFIERS: &[(&str, Visibility)] = &[
    ("publicProcedure", Visibility::Public),
    ("privateProcedure", Visibility::Private),
    ("protectedProcedure", Visibility::Protected),
    ("adminProcedure", Visibility::Admin),
];

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Protected => "protected",
            Visibility::Admin => "admin",
            Visibility::Unknown => "unknown",
        }
    }

    /// Classify a builder identifier. Unrecognized identifiers yield `None`.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        VISIBILITY_IDENTIFIERS
            .iter()
            .find(|(name, _)| *name == identifier)
            .map(|(_, visibility)| *visibility)
    }

    pub fn is_known(&self) -> bool {
        *self != Visibility::Unknown
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One router construction call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterMetadata {
    pub name: String,
    /// Path relative to the analysis root.
    pub file: String,
    pub start_line: usize,
    /// Inclusive line span of the whole construction call.
    pub line_count: usize,
    /// Entries skipped because they reference another router.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested_routers: Vec<String>,
}

/// One recognized procedure entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureNode {
    pub router: String,
    /// Start line of the owning router call; tells apart same-named routers
    /// of one file.
    pub router_line: usize,
    pub procedure: String,
    pub method: Method,
    pub has_input: bool,
    pub has_output: bool,
    pub file: String,
    /// Line of the procedure name in the router mapping.
    pub line: usize,
    pub visibility: Visibility,
    pub resolver_line_count: usize,
    pub uses_data_store: bool,
    pub has_error_handling: bool,
    pub has_side_effects: bool,
}

impl ProcedureNode {
    /// `router.procedure` identifier.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.router, self.procedure)
    }

    /// Whether this procedure belongs to the given router record.
    pub fn belongs_to(&self, router: &RouterMetadata) -> bool {
        self.router == router.name
            && self.file == router.file
            && self.router_line == router.start_line
    }
}
