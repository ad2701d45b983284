//! Integration tests for daprvis
//!
//! End-to-end tests through the registry: dispatch, configuration,
//! serialization and the documented workflow scenarios.
//!
mod common;
use common::*;
use daprvis::prelude::*;

#[cfg(test)]
mod registry_tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        let registry = ExtractorRegistry::new();
        assert_eq!(
            registry.supported_extensions(),
            vec!["cjs", "cs", "cts", "java", "js", "mjs", "mts", "py", "ts"]
        );
    }

    #[test]
    fn test_can_parse() {
        let registry = ExtractorRegistry::new();
        assert!(registry.can_parse("workflows/order.py"));
        assert!(registry.can_parse("C:\\src\\Order.CS"));
        assert!(registry.can_parse("order.workflow.ts"));
        assert!(!registry.can_parse("notes.txt"));
        assert!(!registry.can_parse("Makefile"));
        assert!(!registry.can_parse("trailing."));
    }

    #[test]
    fn test_select_by_language() {
        let registry = ExtractorRegistry::new();
        let languages: Vec<_> = ["a.py", "a.mts", "A.cs", "A.java"]
            .iter()
            .filter_map(|f| registry.select(f))
            .map(|e| e.language())
            .collect();
        assert_eq!(
            languages,
            vec![Language::Python, Language::TypeScript, Language::CSharp, Language::Java]
        );
    }

    #[test]
    fn test_builtin_extractor_accessors() {
        let extractor = GrammarExtractor::typescript()
            .with_config(ExtractorConfig::default().with_await_window(8));
        assert_eq!(extractor.config().await_window, 8);
        assert_eq!(extractor.grammar().language, Language::TypeScript);
        assert!(extractor.grammar().handles_extension("MJS"));
        assert!(!extractor.grammar().handles_extension("py"));
        assert!(extractor.can_handle("src/order.workflow.CTS"));
    }

    #[test]
    fn test_unsupported_file_names_extensions() {
        let err = ExtractorRegistry::new()
            .parse("print('hi')", "notes.txt", None)
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::UnsupportedFile {
                file: "notes.txt".to_string(),
                supported: ".cjs, .cs, .cts, .java, .js, .mjs, .mts, .py, .ts".to_string(),
            }
        );
        assert!(err.to_string().contains("Unsupported file type 'notes.txt'"));
    }

    #[test]
    fn test_list_workflows() {
        let registry = ExtractorRegistry::new();
        let names: Vec<_> = registry
            .list_workflows(&fixture(PYTHON_FIXTURE), PYTHON_FIXTURE)
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, vec!["order_processing_workflow", "shipping_workflow"]);

        let csharp = registry.list_workflows(&fixture(CSHARP_FIXTURE), CSHARP_FIXTURE);
        assert_eq!(csharp.len(), 1);
        assert_eq!(csharp[0].line, 16);

        assert!(registry.list_workflows("anything", "notes.txt").is_empty());
    }

    struct StubExtractor;

    impl WorkflowExtractor for StubExtractor {
        fn language(&self) -> Language {
            Language::Python
        }

        fn extensions(&self) -> &[&'static str] {
            &["py", "pyw"]
        }

        fn discover(&self, _source: &str, _file: &str) -> Vec<WorkflowSummary> {
            vec![WorkflowSummary {
                name: "stub".to_string(),
                line: 1,
            }]
        }

        fn extract(
            &self,
            source: &str,
            file: &str,
            target: Option<&str>,
        ) -> std::result::Result<WorkflowGraph, ParseError> {
            let mut graph = GrammarExtractor::python().extract(source, file, target)?;
            graph.name = "stub".to_string();
            Ok(graph)
        }
    }

    #[test]
    fn test_custom_extractor_takes_precedence() {
        let registry = ExtractorRegistry::builder()
            .with_extractor(Box::new(StubExtractor))
            .build();

        assert!(registry.can_parse("legacy.pyw"));
        assert_eq!(
            registry.supported_extensions(),
            vec!["cjs", "cs", "cts", "java", "js", "mjs", "mts", "py", "pyw", "ts"]
        );

        let graph = registry
            .parse(&fixture(PYTHON_FIXTURE), PYTHON_FIXTURE, None)
            .unwrap();
        assert_eq!(graph.name, "stub");
        assert_eq!(registry.list_workflows("", "a.py")[0].name, "stub");

        // Other languages still reach the built-ins.
        let graph = registry
            .parse(&fixture(JAVA_FIXTURE), JAVA_FIXTURE, None)
            .unwrap();
        assert_eq!(graph.name, "OrderFulfillmentWorkflow");
    }

    #[test]
    fn test_registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ExtractorRegistry>();

        let registry = ExtractorRegistry::new();
        let fixtures = [PYTHON_FIXTURE, TYPESCRIPT_FIXTURE, CSHARP_FIXTURE, JAVA_FIXTURE];
        let counts: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = fixtures
                .iter()
                .map(|name| {
                    let registry = &registry;
                    scope.spawn(move || {
                        registry
                            .parse(&fixture(name), name, None)
                            .unwrap()
                            .steps()
                            .count()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(counts, vec![20, 9, 9, 9]);
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    const PAIR: &str = r#"
@workflow
def pair(ctx, input):
    first = yield ctx.call_activity(step_a, input=input)
    second = yield ctx.call_activity(step_b, input=input)
    both = yield when_all([first, second])
"#;

    #[test]
    fn test_config_from_json() {
        let config = ExtractorConfig::from_json(r#"{"awaitWindow": 4, "fallbackInputName": "payload"}"#)
            .unwrap();
        assert_eq!(config.await_window, 4);
        assert_eq!(config.fallback_input_name, "payload");

        let partial = ExtractorConfig::from_json(r#"{"awaitWindow": 32}"#).unwrap();
        assert_eq!(partial.fallback_input_name, "input");
        assert_eq!(ExtractorConfig::from_json("{}").unwrap(), ExtractorConfig::default());
        assert!(ExtractorConfig::from_json(r#"{"awaitWindow": "wide"}"#).is_err());
    }

    #[test]
    fn test_awaited_calls_are_sequential_by_default() {
        let graph = parse_snippet(PAIR, "pair.py");
        assert!(edges_of_kind(&graph, EdgeKind::ParallelControl).is_empty());
        assert!(has_control_edge(&graph, "activity_1", "activity_2"));
        assert!(has_control_edge(&graph, "activity_2", "join_1"));
    }

    #[test]
    fn test_zero_await_window_turns_calls_into_tasks() {
        let registry = ExtractorRegistry::builder()
            .with_config(ExtractorConfig::default().with_await_window(0))
            .build();
        let graph = registry.parse(PAIR, "pair.py", None).unwrap();
        assert_well_formed(&graph);

        assert_eq!(edges_of_kind(&graph, EdgeKind::ParallelControl).len(), 4);
        assert!(has_control_edge(&graph, "start", "activity_1"));
        assert!(has_control_edge(&graph, "start", "activity_2"));
        assert!(has_control_edge(&graph, "activity_1", "join_1"));
        assert!(has_control_edge(&graph, "activity_2", "join_1"));
    }

    #[test]
    fn test_fallback_input_name() {
        let source = "public class Ping implements Workflow {\n  public WorkflowStub create() {\n    return ctx -> {\n      ctx.callActivity(PingActivity.class.getName(), payload.id).await();\n    };\n  }\n}\n";
        let registry = ExtractorRegistry::builder()
            .with_config(ExtractorConfig::default().with_fallback_input_name("payload"))
            .build();
        let graph = registry.parse(source, "Ping.java", None).unwrap();

        assert_eq!(graph.metadata.input_parameter, "payload");
        let ping = step(&graph, "PingActivity");
        assert_eq!(ping.data_sources, vec![DataSource::workflow_input("payload.id")]);
    }
}

#[cfg(test)]
mod graph_tests {
    use super::*;

    #[test]
    fn test_file_without_steps() {
        let graph = parse_snippet("print('hello')\n", "scripts/cleanup.py");
        assert_eq!(graph.name, "cleanup");
        assert!(!graph.has_steps());
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert!(has_control_edge(&graph, "start", "end"));
    }

    #[test]
    fn test_empty_file() {
        let graph = parse_snippet("", "Empty.cs");
        assert_eq!(graph.name, "Empty");
        assert_eq!(graph.language, Language::CSharp);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.control_edges().count(), 1);
        assert_eq!(graph.metadata.input_parameter, "input");
    }

    #[test]
    fn test_parsing_is_idempotent() {
        for name in [PYTHON_FIXTURE, TYPESCRIPT_FIXTURE, CSHARP_FIXTURE, JAVA_FIXTURE] {
            let first = parse_fixture(name, None);
            let second = parse_fixture(name, None);
            assert_eq!(first, second, "{} parsed differently twice", name);
        }
    }

    #[test]
    fn test_control_edges_respect_endpoints() {
        for name in [PYTHON_FIXTURE, TYPESCRIPT_FIXTURE, CSHARP_FIXTURE, JAVA_FIXTURE] {
            let graph = parse_fixture(name, None);
            assert_well_formed(&graph);
            for edge in graph.control_edges() {
                assert_ne!(edge.target, "start", "{}: {:?}", name, edge);
                assert_ne!(edge.source, "end", "{}: {:?}", name, edge);
            }
        }
    }

    #[test]
    fn test_json_shape() {
        let graph = parse_fixture(TYPESCRIPT_FIXTURE, None);
        let json = graph.to_json().unwrap();

        assert!(json.contains(r#""language":"typescript""#));
        assert!(json.contains(r#""kind":"parallel-join""#));
        assert!(json.contains(r#""kind":"sub-workflow-invocation""#));
        assert!(json.contains(r#""kind":"parallel-control""#));
        assert!(json.contains(r#""kind":"data-from-step-output""#));
        assert!(json.contains(r#""sourceLine":16"#));
        assert!(json.contains(r#""dataSources""#));
        assert!(json.contains(r#""producerId":"child_workflow_1""#));
        assert!(json.contains(r#""targetField":"tracking""#));
        assert!(json.contains(r#""inputParameter":"order""#));
        assert!(!json.contains("source_line"));

        let back: WorkflowGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, graph);
    }

    #[test]
    fn test_heuristic_flag_serialization() {
        let graph = parse_snippet(
            "@workflow\ndef wf(ctx, input):\n    yield ctx.call_activity(ship, input=customer.id)\n",
            "wf.py",
        );
        let ship = step(&graph, "ship");
        assert!(ship.data_sources[0].heuristic);
        assert!(graph.to_json().unwrap().contains(r#""heuristic":true"#));

        let plain = parse_snippet(
            "@workflow\ndef wf(ctx, input):\n    yield ctx.call_activity(ship, input=input.id)\n",
            "wf.py",
        );
        assert!(!plain.to_json().unwrap().contains("heuristic"));
    }
}

#[cfg(test)]
mod scenario_tests {
    use super::*;

    #[test]
    fn test_sequential_chain() {
        let source = r#"
@workflow
def chain(ctx, input):
    r1 = yield ctx.call_activity(step_a)
    yield ctx.call_activity(step_b, input=r1)
"#;
        let graph = parse_snippet(source, "chain.py");
        assert_well_formed(&graph);

        assert_eq!(graph.steps().count(), 2);
        assert!(has_control_edge(&graph, "activity_1", "activity_2"));
        let data = edges_of_kind(&graph, EdgeKind::DataFromStepOutput);
        assert_eq!(data.len(), 1);
        assert_eq!((data[0].source.as_str(), data[0].target.as_str()), ("activity_1", "activity_2"));
        assert_eq!(data[0].data_path.as_deref(), Some("r1"));

        assert!(step(&graph, "step_a").data_sources.is_empty());
    }

    #[test]
    fn test_conditional_high_value_branch() {
        let source = r#"
@workflow
def approval(ctx, input):
    if input.payment["amount"] > 1000:
        approved = yield ctx.wait_for_external_event("manager_approval")
    yield ctx.call_activity(ship, input=input)
"#;
        let graph = parse_snippet(source, "approval.py");

        let decision = graph.node("decision_1").unwrap();
        assert_eq!(decision.kind, StepKind::Decision);
        let inputs: Vec<_> = decision
            .data_sources
            .iter()
            .filter(|s| s.kind == SourceKind::WorkflowInput)
            .collect();
        assert_eq!(inputs.len(), 1);
        assert!(has_control_edge(&graph, "decision_1", "event_1"));
    }

    #[test]
    fn test_keyed_literal_input() {
        let source = r#"
@workflow
def notify(ctx, customer):
    yield ctx.call_activity(send_email, input={
        "to": customer.email,
        "subject": "Order confirmed"
    })
"#;
        let graph = parse_snippet(source, "notify.py");
        let email = step(&graph, "send_email");

        assert_eq!(
            email.data_sources,
            vec![
                DataSource::workflow_input("customer.email").with_target_field("to"),
                DataSource::literal("\"Order confirmed\"").with_target_field("subject"),
            ]
        );
        let to_edges = edges_of_kind(&graph, EdgeKind::DataFromWorkflowInput);
        assert_eq!(to_edges.len(), 1);
        assert_eq!(to_edges[0].target, email.id);
    }

    #[test]
    fn test_fan_out_after_unrelated_step() {
        let source = r#"
@workflow
def fan(ctx, input):
    yield ctx.call_activity(prepare, input=input)
    a = ctx.call_activity(left, input=input)
    b = ctx.call_activity(right, input=input)
    yield when_all([a, b])
"#;
        let graph = parse_snippet(source, "fan.py");
        assert_well_formed(&graph);

        let fan_out: Vec<_> = graph
            .control_edges()
            .filter(|e| e.source == "activity_1")
            .map(|e| e.target.as_str())
            .collect();
        assert_eq!(fan_out, vec!["activity_2", "activity_3"]);

        let fan_in: Vec<_> = graph
            .control_edges()
            .filter(|e| e.target == "join_1")
            .map(|e| e.source.as_str())
            .collect();
        assert_eq!(fan_in, vec!["activity_2", "activity_3"]);
        assert!(!has_control_edge(&graph, "activity_1", "join_1"));
    }
}
