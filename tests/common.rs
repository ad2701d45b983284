//! Common test utilities for loading fixtures and inspecting graphs.
use daprvis::prelude::*;
use std::path::PathBuf;

pub const PYTHON_FIXTURE: &str = "order_processing.py";
pub const TYPESCRIPT_FIXTURE: &str = "order_workflow.ts";
pub const CSHARP_FIXTURE: &str = "OrderProcessingWorkflow.cs";
pub const JAVA_FIXTURE: &str = "OrderFulfillmentWorkflow.java";

/// Reads a file from `tests/fixtures`.
#[allow(dead_code)]
pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

/// Parses a fixture through the default registry.
#[allow(dead_code)]
pub fn parse_fixture(name: &str, target: Option<&str>) -> WorkflowGraph {
    let source = fixture(name);
    ExtractorRegistry::new()
        .parse(&source, name, target)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", name, e))
}

/// Parses an inline snippet; `file` only selects the language.
#[allow(dead_code)]
pub fn parse_snippet(source: &str, file: &str) -> WorkflowGraph {
    ExtractorRegistry::new()
        .parse(source, file, None)
        .unwrap_or_else(|e| panic!("Failed to parse snippet: {}", e))
}

/// The only step called `name`.
#[allow(dead_code)]
pub fn step<'g>(graph: &'g WorkflowGraph, name: &str) -> &'g StepNode {
    let matches: Vec<_> = graph.steps().filter(|n| n.name == name).collect();
    assert_eq!(matches.len(), 1, "expected exactly one step named '{}'", name);
    matches[0]
}

/// Steps in graph order as `(kind, name)` pairs.
#[allow(dead_code)]
pub fn outline(graph: &WorkflowGraph) -> Vec<(StepKind, String)> {
    graph.steps().map(|n| (n.kind, n.name.clone())).collect()
}

/// Whether a control edge (sequential or parallel) links `source` to `target`.
#[allow(dead_code)]
pub fn has_control_edge(graph: &WorkflowGraph, source: &str, target: &str) -> bool {
    graph
        .control_edges()
        .any(|e| e.source == source && e.target == target)
}

#[allow(dead_code)]
pub fn edges_of_kind(graph: &WorkflowGraph, kind: EdgeKind) -> Vec<&Edge> {
    graph.edges.iter().filter(|e| e.kind == kind).collect()
}

/// Structural invariants every graph must satisfy.
#[allow(dead_code)]
pub fn assert_well_formed(graph: &WorkflowGraph) {
    assert_eq!(graph.nodes.first().map(|n| n.id.as_str()), Some("start"));
    assert_eq!(graph.nodes.last().map(|n| n.id.as_str()), Some("end"));
    for edge in &graph.edges {
        assert!(graph.node(&edge.source).is_some(), "dangling source in {:?}", edge);
        assert!(graph.node(&edge.target).is_some(), "dangling target in {:?}", edge);
    }
    let mut ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), graph.nodes.len(), "node ids must be unique");
    for node in graph.steps() {
        for source in &node.data_sources {
            if source.kind == SourceKind::StepOutput {
                let producer = source.producer_id.as_deref().expect("step output without producer");
                assert!(graph.node(producer).is_some(), "unknown producer {}", producer);
            }
        }
    }
}
