//! API definition payloads built from extracted procedures.
//!
//! These are the records a push/sync client sends to a remote API catalog.
//! Building them is pure; nothing here performs network I/O.

use serde::{Deserialize, Serialize};

use crate::model::{Method, ProcedureNode, Visibility};

/// Where exported paths are mounted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExportOptions {
    /// Path prefix of the tRPC handler (e.g. "/api/trpc")
    #[serde(default)]
    pub prefix: Option<String>,
    /// Base URL prepended to every path (e.g. "https://app.example.com")
    #[serde(default)]
    pub domain: Option<String>,
}

/// One exported procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDefinition {
    pub id: String,
    pub name: String,
    pub source_key: String,
    pub method: String,
    pub router: String,
    pub procedure: String,
    pub path: String,
    pub visibility: Visibility,
    pub file: String,
    pub line: usize,
    pub metadata: ApiMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMetadata {
    pub resolver_lines: usize,
    pub uses_db: bool,
    pub has_error_handling: bool,
    pub has_side_effects: bool,
}

/// HTTP verb tRPC uses for a procedure kind.
pub fn http_method(method: Method) -> &'static str {
    match method {
        Method::Query => "GET",
        Method::Mutation => "POST",
    }
}

/// Join domain, prefix and path with single slashes.
///
/// Trailing slashes of the domain, outer slashes of the prefix and leading
/// slashes of the path are dropped; an empty prefix is omitted.
pub fn build_full_path(path: &str, prefix: Option<&str>, domain: Option<&str>) -> String {
    let domain = domain.unwrap_or("").trim_end_matches('/');
    let prefix = prefix.unwrap_or("").trim_matches('/');
    let path = path.trim_start_matches('/');

    let mut segments = vec![domain];
    if !prefix.is_empty() {
        segments.push(prefix);
    }
    segments.push(path);
    segments.join("/")
}

pub fn to_api_definition(node: &ProcedureNode, options: &ExportOptions) -> ApiDefinition {
    let id = node.qualified_name();
    let path = build_full_path(&id, options.prefix.as_deref(), options.domain.as_deref());

    ApiDefinition {
        name: id.clone(),
        source_key: format!("trpc:{}", id),
        method: http_method(node.method).to_string(),
        router: node.router.clone(),
        procedure: node.procedure.clone(),
        path,
        visibility: node.visibility,
        file: node.file.clone(),
        line: node.line,
        metadata: ApiMetadata {
            resolver_lines: node.resolver_line_count,
            uses_db: node.uses_data_store,
            has_error_handling: node.has_error_handling,
            has_side_effects: node.has_side_effects,
        },
        id,
    }
}

pub fn to_api_definitions(
    procedures: &[ProcedureNode],
    options: &ExportOptions,
) -> Vec<ApiDefinition> {
    procedures
        .iter()
        .map(|node| to_api_definition(node, options))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_full_path() {
        assert_eq!(build_full_path("user.get", None, None), "/user.get");
        assert_eq!(
            build_full_path("/user.get", Some("/api/trpc/"), None),
            "/api/trpc/user.get"
        );
        assert_eq!(
            build_full_path("user.get", Some("//"), Some("https://app.test//")),
            "https://app.test/user.get"
        );
        assert_eq!(
            build_full_path("user.get", Some("api"), Some("https://app.test")),
            "https://app.test/api/user.get"
        );
    }

    #[test]
    fn test_api_definition_shape() {
        let node = ProcedureNode {
            router: "userRouter".to_string(),
            router_line: 10,
            procedure: "update".to_string(),
            method: Method::Mutation,
            has_input: true,
            has_output: false,
            file: "src/server/user.ts".to_string(),
            line: 12,
            visibility: Visibility::Protected,
            resolver_line_count: 8,
            uses_data_store: true,
            has_error_handling: false,
            has_side_effects: false,
        };
        let options = ExportOptions {
            prefix: Some("/api/trpc".to_string()),
            domain: None,
        };

        let def = to_api_definition(&node, &options);
        assert_eq!(def.id, "userRouter.update");
        assert_eq!(def.name, def.id);
        assert_eq!(def.source_key, "trpc:userRouter.update");
        assert_eq!(def.method, "POST");
        assert_eq!(def.path, "/api/trpc/userRouter.update");

        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["sourceKey"], "trpc:userRouter.update");
        assert_eq!(json["visibility"], "protected");
        assert_eq!(json["metadata"]["resolverLines"], 8);
        assert_eq!(json["metadata"]["usesDb"], true);
    }
}
