use serde::{Deserialize, Serialize};

/// Edge categories. Data edges never take part in control-flow layering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    Control,
    ParallelControl,
    DataFromWorkflowInput,
    DataFromStepOutput,
    DataFromEvent,
}

impl EdgeKind {
    pub fn is_control(&self) -> bool {
        matches!(self, EdgeKind::Control | EdgeKind::ParallelControl)
    }

    pub fn is_data(&self) -> bool {
        !self.is_control()
    }
}

/// A directed connection between two step nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_path: Option<String>,
}
