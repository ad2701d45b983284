use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a piece of data consumed by a step originates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    WorkflowInput,
    StepOutput,
    EventData,
    Literal,
}

/// Provenance of one piece of data consumed by a step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub kind: SourceKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_field: Option<String>,
    /// Set when the workflow-input kind was guessed from a bare identifier
    /// that matched neither the input parameter nor a known producer.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub heuristic: bool,
}

impl DataSource {
    pub fn workflow_input(path: impl Into<String>) -> Self {
        Self::plain(SourceKind::WorkflowInput, path)
    }

    pub fn step_output(path: impl Into<String>, producer_id: impl Into<String>) -> Self {
        Self {
            producer_id: Some(producer_id.into()),
            ..Self::plain(SourceKind::StepOutput, path)
        }
    }

    pub fn event_data(event_name: impl Into<String>) -> Self {
        Self::plain(SourceKind::EventData, event_name)
    }

    pub fn literal(path: impl Into<String>) -> Self {
        Self::plain(SourceKind::Literal, path)
    }

    pub(crate) fn guessed_input(path: impl Into<String>) -> Self {
        Self {
            heuristic: true,
            ..Self::plain(SourceKind::WorkflowInput, path)
        }
    }

    pub fn with_target_field(mut self, field: impl Into<String>) -> Self {
        self.target_field = Some(field.into());
        self
    }

    fn plain(kind: SourceKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            producer_id: None,
            target_field: None,
            heuristic: false,
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(field) = &self.target_field {
            write!(f, "{} <- ", field)?;
        }
        match self.kind {
            SourceKind::WorkflowInput => write!(f, "input:{}", self.path),
            SourceKind::StepOutput => match &self.producer_id {
                Some(producer) => write!(f, "{}:{}", producer, self.path),
                None => write!(f, "output:{}", self.path),
            },
            SourceKind::EventData => write!(f, "event:{}", self.path),
            SourceKind::Literal => write!(f, "{}", self.path),
        }
    }
}
