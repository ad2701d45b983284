use super::DataSource;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const START_NODE_ID: &str = "start";
pub const END_NODE_ID: &str = "end";

/// The kind of workflow operation a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    Start,
    End,
    Invocation,
    SubWorkflowInvocation,
    Timer,
    ExternalEvent,
    Decision,
    ParallelJoin,
}

impl StepKind {
    /// Prefix used when minting node ids for this kind.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            StepKind::Start => START_NODE_ID,
            StepKind::End => END_NODE_ID,
            StepKind::Invocation => "activity",
            StepKind::SubWorkflowInvocation => "child_workflow",
            StepKind::Timer => "timer",
            StepKind::ExternalEvent => "event",
            StepKind::Decision => "decision",
            StepKind::ParallelJoin => "join",
        }
    }

    /// Whether an unawaited assignment of this kind can become a parallel task.
    pub fn is_schedulable(&self) -> bool {
        matches!(
            self,
            StepKind::Invocation
                | StepKind::SubWorkflowInvocation
                | StepKind::Timer
                | StepKind::ExternalEvent
        )
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StepKind::Start => "start",
            StepKind::End => "end",
            StepKind::Invocation => "invocation",
            StepKind::SubWorkflowInvocation => "sub-workflow-invocation",
            StepKind::Timer => "timer",
            StepKind::ExternalEvent => "external-event",
            StepKind::Decision => "decision",
            StepKind::ParallelJoin => "parallel-join",
        };
        f.pad(label)
    }
}

/// One recognized workflow operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepNode {
    pub id: String,
    pub kind: StepKind,
    pub name: String,
    /// 1-based line in the original, unscoped file.
    pub source_line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_variable: Option<String>,
    #[serde(default)]
    pub data_sources: Vec<DataSource>,
}

impl StepNode {
    pub fn new(id: impl Into<String>, kind: StepKind, name: impl Into<String>, line: usize) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            source_line: line,
            input_expression: None,
            output_variable: None,
            data_sources: Vec::new(),
        }
    }

    pub(crate) fn start() -> Self {
        Self::new(START_NODE_ID, StepKind::Start, "Start", 0)
    }

    pub(crate) fn end(last_line: usize) -> Self {
        Self::new(END_NODE_ID, StepKind::End, "End", last_line)
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self.kind, StepKind::Start | StepKind::End)
    }
}
