use super::{Edge, StepKind, StepNode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Host languages with a workflow grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    TypeScript,
    CSharp,
    Java,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::CSharp => "csharp",
            Language::Java => "java",
        };
        write!(f, "{}", tag)
    }
}

/// Workflow-level facts gathered alongside the steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    /// Name the workflow body uses for its input.
    pub input_parameter: String,
    #[serde(default)]
    pub input_fields: Vec<String>,
    #[serde(default)]
    pub output_fields: Vec<String>,
    /// The last return expression of the workflow body, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_expression: Option<String>,
}

/// The complete result of one parse call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowGraph {
    pub name: String,
    pub language: Language,
    pub file: String,
    /// Always starts with the synthetic start node and ends with the end node.
    pub nodes: Vec<StepNode>,
    pub edges: Vec<Edge>,
    pub metadata: WorkflowMetadata,
}

impl WorkflowGraph {
    pub fn node(&self, id: &str) -> Option<&StepNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Recognized steps, without the synthetic start and end nodes.
    pub fn steps(&self) -> impl Iterator<Item = &StepNode> {
        self.nodes.iter().filter(|n| !n.is_synthetic())
    }

    pub fn steps_of_kind(&self, kind: StepKind) -> impl Iterator<Item = &StepNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    /// `false` when nothing but start and end was recognized, which usually
    /// means the file lacks the expected workflow idioms.
    pub fn has_steps(&self) -> bool {
        self.steps().next().is_some()
    }

    pub fn control_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| e.kind.is_control())
    }

    pub fn data_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| e.kind.is_data())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
