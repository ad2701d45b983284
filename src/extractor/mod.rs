//! Per-language workflow extraction.
//!
//! Every supported language goes through the same [`GrammarExtractor`]; only
//! the [`Grammar`] table differs.

mod context;
mod discovery;
mod metadata;
mod steps;

pub use discovery::{WorkflowSummary, file_stem};

use crate::config::ExtractorConfig;
use crate::error::{ExtractError, ParseError};
use crate::grammar::{self, Grammar};
use crate::graph::{GraphAssembler, Language, WorkflowGraph};
use crate::scanner::{line_at, mask_comments};
use context::ExtractionContext;
use metadata::MetadataReader;
use steps::StepRecognizer;

/// Defines the contract for turning the source of one language into a workflow graph.
pub trait WorkflowExtractor: Send + Sync {
    fn language(&self) -> Language;

    fn extensions(&self) -> &[&'static str];

    fn can_handle(&self, file: &str) -> bool {
        extension_of(file).is_some_and(|ext| {
            self.extensions()
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
    }

    /// Lists the workflow definitions in `source`, in file order.
    fn discover(&self, source: &str, file: &str) -> Vec<WorkflowSummary>;

    /// Builds the graph of `target`, or of the first workflow when `target`
    /// is `None` or names no workflow in the file.
    fn extract(
        &self,
        source: &str,
        file: &str,
        target: Option<&str>,
    ) -> Result<WorkflowGraph, ParseError>;
}

/// Extension of a file identifier, without the dot.
pub fn extension_of(file: &str) -> Option<&str> {
    let base = file.rsplit(['/', '\\']).next()?;
    match base.rfind('.') {
        Some(dot) if dot + 1 < base.len() => Some(&base[dot + 1..]),
        _ => None,
    }
}

/// The grammar-driven extractor used for every built-in language.
#[derive(Debug, Clone)]
pub struct GrammarExtractor {
    grammar: &'static Grammar,
    config: ExtractorConfig,
}

impl GrammarExtractor {
    pub fn new(grammar: &'static Grammar) -> Self {
        Self {
            grammar,
            config: ExtractorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExtractorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn python() -> Self {
        Self::new(&grammar::python::GRAMMAR)
    }

    pub fn typescript() -> Self {
        Self::new(&grammar::typescript::GRAMMAR)
    }

    pub fn csharp() -> Self {
        Self::new(&grammar::csharp::GRAMMAR)
    }

    pub fn java() -> Self {
        Self::new(&grammar::java::GRAMMAR)
    }

    pub fn grammar(&self) -> &'static Grammar {
        self.grammar
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    fn run(&self, source: &str, file: &str, target: Option<&str>) -> Result<WorkflowGraph, ExtractError> {
        let masked = mask_comments(source, self.grammar.comments);
        let scopes = discovery::discover(self.grammar, &masked);
        let scope = discovery::select(scopes, target, file, masked.len());
        if scope.start > scope.end || scope.end > masked.len() {
            return Err(ExtractError::InvalidScope {
                start: scope.start,
                end: scope.end,
                len: masked.len(),
            });
        }
        tracing::debug!(
            workflow = %scope.name,
            language = %self.grammar.language,
            start = scope.start,
            end = scope.end,
            "extracting workflow"
        );

        let metadata = MetadataReader::new(self.grammar, &self.config, source, &masked, &scope).read()?;

        let first_line = line_at(&masked, scope.start);
        let last_line = line_at(&masked, scope.end.saturating_sub(1).max(scope.start));
        let mut ctx = ExtractionContext::new(metadata.input_parameter.clone(), first_line - 1);
        StepRecognizer::new(self.grammar, &self.config, &masked[scope.start..scope.end]).run(&mut ctx);

        let (nodes, edges) = GraphAssembler::new(ctx.nodes, &ctx.groups)
            .with_lines(first_line, last_line)
            .assemble()?;

        Ok(WorkflowGraph {
            name: scope.name,
            language: self.grammar.language,
            file: file.to_string(),
            nodes,
            edges,
            metadata,
        })
    }
}

impl WorkflowExtractor for GrammarExtractor {
    fn language(&self) -> Language {
        self.grammar.language
    }

    fn extensions(&self) -> &[&'static str] {
        self.grammar.extensions
    }

    fn can_handle(&self, file: &str) -> bool {
        extension_of(file).is_some_and(|ext| self.grammar.handles_extension(ext))
    }

    fn discover(&self, source: &str, _file: &str) -> Vec<WorkflowSummary> {
        let masked = mask_comments(source, self.grammar.comments);
        let scopes = discovery::discover(self.grammar, &masked);
        discovery::summarize(&masked, &scopes)
    }

    fn extract(
        &self,
        source: &str,
        file: &str,
        target: Option<&str>,
    ) -> Result<WorkflowGraph, ParseError> {
        self.run(source, file, target)
            .map_err(|err| ParseError::extraction(file, err))
    }
}
