use super::{DataSource, END_NODE_ID, Edge, EdgeKind, START_NODE_ID, SourceKind, StepKind, StepNode};
use crate::error::GraphError;
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;

/// Fan-out/fan-in bookkeeping collected during one extraction pass.
#[derive(Debug, Clone, Default)]
pub struct ParallelGroups {
    tasks: AHashMap<String, Vec<String>>,
    task_nodes: AHashSet<String>,
    joins: AHashMap<String, String>,
}

impl ParallelGroups {
    /// Remembers a step whose result was bound without being awaited. A task
    /// collection variable accumulates every step appended to it.
    pub fn register_task(&mut self, variable: &str, node_id: &str) {
        let nodes = self.tasks.entry(variable.to_string()).or_default();
        if !nodes.iter().any(|n| n == node_id) {
            nodes.push(node_id.to_string());
        }
        self.task_nodes.insert(node_id.to_string());
    }

    pub fn task_nodes(&self, variable: &str) -> &[String] {
        self.tasks.get(variable).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_task(&self, node_id: &str) -> bool {
        self.task_nodes.contains(node_id)
    }

    /// Maps a task node onto the join that waits for it. The first join wins.
    pub fn assign(&mut self, task_node_id: &str, join_id: &str) {
        self.joins
            .entry(task_node_id.to_string())
            .or_insert_with(|| join_id.to_string());
    }

    pub fn join_of(&self, node_id: &str) -> Option<&str> {
        self.joins.get(node_id).map(String::as_str)
    }
}

/// Turns the recognized steps of one workflow into the final node and edge lists.
pub struct GraphAssembler<'a> {
    steps: Vec<StepNode>,
    groups: &'a ParallelGroups,
    first_line: usize,
    last_line: Option<usize>,
    edges: Vec<Edge>,
    control_count: usize,
    data_count: usize,
}

impl<'a> GraphAssembler<'a> {
    pub fn new(steps: Vec<StepNode>, groups: &'a ParallelGroups) -> Self {
        Self {
            steps,
            groups,
            first_line: 1,
            last_line: None,
            edges: Vec::new(),
            control_count: 0,
            data_count: 0,
        }
    }

    /// Line numbers given to the synthetic start and end nodes.
    pub fn with_lines(mut self, first_line: usize, last_line: usize) -> Self {
        self.first_line = first_line;
        self.last_line = Some(last_line);
        self
    }

    pub fn assemble(mut self) -> Result<(Vec<StepNode>, Vec<Edge>), GraphError> {
        // Stable: steps sharing a line keep their discovery order.
        let sorted: Vec<StepNode> = std::mem::take(&mut self.steps)
            .into_iter()
            .sorted_by_key(|n| n.source_line)
            .collect();

        let mut seen = AHashSet::new();
        for node in &sorted {
            if node.is_synthetic() || !seen.insert(node.id.as_str()) {
                return Err(GraphError::DuplicateNode {
                    node_id: node.id.clone(),
                });
            }
        }

        self.link_control_flow(&sorted);
        self.link_data_flow(&sorted);

        let last_line = self
            .last_line
            .or_else(|| sorted.last().map(|n| n.source_line))
            .unwrap_or(self.first_line);
        let mut start = StepNode::start();
        start.source_line = self.first_line;

        let mut nodes = Vec::with_capacity(sorted.len() + 2);
        nodes.push(start);
        nodes.extend(sorted);
        nodes.push(StepNode::end(last_line));

        self.validate(&nodes)?;
        Ok((nodes, self.edges))
    }

    /// Walks the sorted steps with a cursor on the last sequential node.
    fn link_control_flow(&mut self, sorted: &[StepNode]) {
        let groups = self.groups;
        let mut cursor = START_NODE_ID.to_string();
        let mut processed_joins: AHashSet<&str> = AHashSet::new();

        for node in sorted {
            if let Some(join_id) = groups.join_of(&node.id) {
                if !processed_joins.insert(join_id) {
                    continue;
                }
                let members: Vec<&StepNode> = sorted
                    .iter()
                    .filter(|n| groups.join_of(&n.id) == Some(join_id))
                    .collect();
                for member in &members {
                    self.control(&cursor, &member.id, EdgeKind::ParallelControl);
                }
                for member in &members {
                    self.control(&member.id, join_id, EdgeKind::ParallelControl);
                }
                cursor = join_id.to_string();
            } else if node.kind == StepKind::ParallelJoin
                && processed_joins.contains(node.id.as_str())
            {
                cursor = node.id.clone();
            } else {
                // Orphaned tasks and joins without a group land here too.
                self.control(&cursor, &node.id, EdgeKind::Control);
                cursor = node.id.clone();
            }
        }

        self.control(&cursor, END_NODE_ID, EdgeKind::Control);
    }

    fn link_data_flow(&mut self, sorted: &[StepNode]) {
        for node in sorted {
            for source in &node.data_sources {
                match source.kind {
                    SourceKind::WorkflowInput => {
                        self.data(START_NODE_ID, &node.id, EdgeKind::DataFromWorkflowInput, source)
                    }
                    SourceKind::StepOutput => {
                        if let Some(producer) = &source.producer_id {
                            self.data(producer, &node.id, EdgeKind::DataFromStepOutput, source);
                        }
                    }
                    SourceKind::EventData => {
                        self.data(&node.id, &node.id, EdgeKind::DataFromEvent, source)
                    }
                    SourceKind::Literal => {}
                }
            }
        }
    }

    fn control(&mut self, source: &str, target: &str, kind: EdgeKind) {
        self.control_count += 1;
        self.edges.push(Edge {
            id: format!("edge_{}", self.control_count),
            source: source.to_string(),
            target: target.to_string(),
            kind,
            label: None,
            data_path: None,
        });
    }

    fn data(&mut self, source: &str, target: &str, kind: EdgeKind, data: &DataSource) {
        self.data_count += 1;
        self.edges.push(Edge {
            id: format!("data_{}", self.data_count),
            source: source.to_string(),
            target: target.to_string(),
            kind,
            label: Some(data.target_field.clone().unwrap_or_else(|| data.path.clone())),
            data_path: Some(data.path.clone()),
        });
    }

    fn validate(&self, nodes: &[StepNode]) -> Result<(), GraphError> {
        let ids: AHashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !ids.contains(endpoint.as_str()) {
                    return Err(GraphError::DanglingEdge {
                        edge_id: edge.id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
