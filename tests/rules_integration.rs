//! Integration tests for the rule engine.
//!
//! These tests validate rule evaluation order, severity accounting and
//! failure propagation when run against the fixture app.

use std::path::PathBuf;

use routercheck::rules::{default_procedure_rules, default_router_rules};
use routercheck::{
    AnalysisResult, AnalyzeError, Analyzer, AnalyzerOptions, FsProvider, ProcedureNode, Rule,
    RouterMetadata, RuleSet, Severity,
};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn fixture_analyzer(options: AnalyzerOptions) -> Analyzer {
    Analyzer::new(options).with_provider(FsProvider::new().parallel(false))
}

fn fixture_options() -> AnalyzerOptions {
    AnalyzerOptions::new(testdata_path().join("trpc-app"))
}

fn run_fixture() -> AnalysisResult {
    fixture_analyzer(fixture_options())
        .run()
        .expect("analysis should succeed")
}

fn subject(router: &str, procedure: Option<&str>) -> String {
    match procedure {
        Some(p) => format!("{}.{}", router, p),
        None => router.to_string(),
    }
}

#[test]
fn test_default_rules_on_fixture() {
    let result = run_fixture();

    let findings: Vec<(String, &str)> = result
        .findings
        .iter()
        .map(|f| (subject(&f.router, f.procedure.as_deref()), f.rule.as_str()))
        .collect();

    let expected: Vec<(String, &str)> = vec![
        ("appRouter.health".into(), "missing-output-validation"),
        ("postRouter.list".into(), "data-store-without-error-handling"),
        ("postRouter.publish".into(), "public-side-effect"),
        ("postRouter.publish".into(), "side-effect-without-error-handling"),
        ("userRouter.getUser".into(), "data-store-without-error-handling"),
        ("userRouter.getUser".into(), "missing-output-validation"),
        ("userRouter.deleteUser".into(), "mutation-missing-input"),
        ("userRouter.deleteUser".into(), "side-effect-without-error-handling"),
        ("postRouter".into(), "mixed-mutation-visibility"),
        ("userRouter".into(), "mixed-mutation-visibility"),
    ];
    assert_eq!(findings, expected);
}

#[test]
fn test_summary_matches_findings() {
    let result = run_fixture();

    assert_eq!(result.summary.error, 1);
    assert_eq!(result.summary.warn, 3);
    assert_eq!(result.summary.info, 6);
    assert_eq!(result.summary.total(), result.findings.len());
    assert!(result.has_errors());

    for severity in [Severity::Info, Severity::Warn, Severity::Error] {
        let counted = result
            .findings
            .iter()
            .filter(|f| f.severity == severity)
            .count();
        let summarized = match severity {
            Severity::Info => result.summary.info,
            Severity::Warn => result.summary.warn,
            Severity::Error => result.summary.error,
        };
        assert_eq!(counted, summarized, "summary mismatch for {}", severity);
    }
}

#[test]
fn test_finding_locations_point_at_procedure_keys() {
    let result = run_fixture();

    let missing_input = result
        .findings
        .iter()
        .find(|f| f.rule == "mutation-missing-input")
        .expect("deleteUser has no input");
    assert_eq!(missing_input.file, "src/server/routers/user.ts");
    assert_eq!(missing_input.line, 23);
    assert_eq!(missing_input.severity, Severity::Warn);
}

#[test]
fn test_disabled_rules_and_severity_overrides() {
    let mut options = fixture_options();
    options.rules.disabled = vec![
        "missing-output-validation".to_string(),
        "mixed-mutation-visibility".to_string(),
    ];
    options
        .rules
        .severity
        .insert("public-side-effect".to_string(), Severity::Warn);

    let result = fixture_analyzer(options)
        .run()
        .expect("analysis should succeed");

    assert!(result
        .findings
        .iter()
        .all(|f| f.rule != "missing-output-validation" && f.rule != "mixed-mutation-visibility"));
    assert_eq!(result.summary.error, 0);
    assert!(!result.has_errors());
}

#[test]
fn test_unknown_rule_id_is_rejected() {
    let mut options = fixture_options();
    options.rules.disabled = vec!["no-such-rule".to_string()];

    let err = fixture_analyzer(options).run().unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("no-such-rule"));
}

#[test]
fn test_multi_finding_rule_keeps_findings_adjacent() {
    let per_procedure = Rule::new(
        "twice",
        Severity::Info,
        "emits two findings",
        |node: &ProcedureNode, _, info| {
            Ok(vec![
                info.procedure_finding(node, "first"),
                info.procedure_finding(node, "second"),
            ])
        },
    );
    let rules = RuleSet::empty().with_procedure_rule(per_procedure);

    let result = fixture_analyzer(fixture_options())
        .with_rules(rules)
        .run()
        .expect("analysis should succeed");

    assert_eq!(result.findings.len(), 2 * result.procedures.len());
    for (pair, node) in result.findings.chunks(2).zip(&result.procedures) {
        assert_eq!(pair[0].message, "first");
        assert_eq!(pair[1].message, "second");
        assert_eq!(pair[0].procedure.as_deref(), Some(node.procedure.as_str()));
        assert_eq!(pair[1].procedure.as_deref(), Some(node.procedure.as_str()));
    }
}

#[test]
fn test_failing_rule_aborts_run() {
    let failing = Rule::new(
        "explodes",
        Severity::Error,
        "always fails",
        |router: &RouterMetadata, _, _| anyhow::bail!("cannot inspect {}", router.name),
    );
    let rules = RuleSet::empty()
        .with_procedure_rule(default_procedure_rules().remove(0))
        .with_router_rule(failing);

    let err = fixture_analyzer(fixture_options())
        .with_rules(rules)
        .run()
        .unwrap_err();

    match err {
        AnalyzeError::RuleFailed { rule, subject, .. } => {
            assert_eq!(rule, "explodes");
            assert!(subject.contains("appRouter"), "first router fails first: {}", subject);
        }
        other => panic!("expected RuleFailed, got {:?}", other),
    }
}

#[test]
fn test_router_rules_only() {
    let mut rules = RuleSet::empty();
    for rule in default_router_rules() {
        rules = rules.with_router_rule(rule);
    }

    let result = fixture_analyzer(fixture_options())
        .with_rules(rules)
        .run()
        .expect("analysis should succeed");

    assert_eq!(result.findings.len(), 2);
    assert!(result.findings.iter().all(|f| f.procedure.is_none()));
}

#[test]
fn test_unbound_routers_in_one_file_keep_their_procedures() {
    let source = r#"
createTRPCRouter({
  open: publicProcedure.mutation(async () => {}),
});

createTRPCRouter({
  purge: adminProcedure.mutation(async () => {}),
});
"#;
    let file = routercheck::SourceFile::parse("src/anon.ts", source).expect("source should parse");
    let mut options = AnalyzerOptions::new(".");
    options.router_factories = vec!["createTRPCRouter".to_string()];

    let result = Analyzer::new(options)
        .analyze_sources(&[file])
        .expect("analysis should succeed");

    assert_eq!(result.routers.len(), 2);
    assert_eq!(result.routers[0].name, result.routers[1].name);
    assert_ne!(result.procedures[0].router_line, result.procedures[1].router_line);
    assert!(result
        .findings
        .iter()
        .all(|f| f.rule != "mixed-mutation-visibility" && f.rule != "empty-router"));
}
