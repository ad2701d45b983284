use crate::classifier::ProducerMap;
use crate::graph::{ParallelGroups, StepKind, StepNode};
use ahash::{AHashMap, AHashSet};

/// All mutable state of one extraction pass. Created fresh per `extract`
/// call and dropped at its end.
#[derive(Debug)]
pub(crate) struct ExtractionContext {
    pub input_name: String,
    /// Added to scope-local line numbers to get file line numbers.
    pub line_offset: usize,
    pub producers: ProducerMap,
    pub groups: ParallelGroups,
    pub nodes: Vec<StepNode>,
    seen_lines: AHashSet<usize>,
    counters: AHashMap<StepKind, usize>,
}

impl ExtractionContext {
    pub fn new(input_name: impl Into<String>, line_offset: usize) -> Self {
        Self {
            input_name: input_name.into(),
            line_offset,
            producers: ProducerMap::new(),
            groups: ParallelGroups::default(),
            nodes: Vec::new(),
            seen_lines: AHashSet::new(),
            counters: AHashMap::new(),
        }
    }

    pub fn file_line(&self, local_line: usize) -> usize {
        local_line + self.line_offset
    }

    pub fn line_taken(&self, line: usize) -> bool {
        self.seen_lines.contains(&line)
    }

    /// Mints `<prefix>_<n>` with a per-kind counter starting at 1.
    pub fn next_id(&mut self, kind: StepKind) -> String {
        let counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        format!("{}_{}", kind.id_prefix(), counter)
    }

    /// Records the node and claims its line so no other pattern emits there.
    pub fn emit(&mut self, node: StepNode) {
        tracing::trace!(
            id = %node.id,
            kind = %node.kind,
            line = node.source_line,
            "recognized workflow step"
        );
        self.seen_lines.insert(node.source_line);
        self.nodes.push(node);
    }

    /// Registers every bound name as produced by `node_id`.
    pub fn register_outputs(&mut self, names: &[String], node_id: &str) {
        for name in names {
            if !self.producers.register(name, node_id) {
                tracing::debug!(variable = %name, "variable already has a producer, keeping the first");
            }
        }
    }
}
