use crate::config::ExtractorConfig;
use crate::error::ParseError;
use crate::extractor::{GrammarExtractor, WorkflowExtractor, WorkflowSummary};
use crate::graph::WorkflowGraph;
use itertools::Itertools;

/// Dispatches source files to the extractor of their language.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn WorkflowExtractor>>,
}

pub struct ExtractorRegistryBuilder {
    config: ExtractorConfig,
    custom: Vec<Box<dyn WorkflowExtractor>>,
}

impl ExtractorRegistryBuilder {
    pub fn new() -> Self {
        Self {
            config: ExtractorConfig::default(),
            custom: Vec::new(),
        }
    }

    /// Configuration handed to the built-in extractors.
    pub fn with_config(mut self, config: ExtractorConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds an extractor that is consulted before the built-ins, so it can
    /// take over an extension they already claim.
    pub fn with_extractor(mut self, extractor: Box<dyn WorkflowExtractor>) -> Self {
        self.custom.push(extractor);
        self
    }

    pub fn build(self) -> ExtractorRegistry {
        let mut extractors = self.custom;
        for builtin in [
            GrammarExtractor::python(),
            GrammarExtractor::typescript(),
            GrammarExtractor::csharp(),
            GrammarExtractor::java(),
        ] {
            extractors.push(Box::new(builtin.with_config(self.config.clone())));
        }
        ExtractorRegistry { extractors }
    }
}

impl Default for ExtractorRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorRegistry {
    /// The four built-in languages with the default configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ExtractorRegistryBuilder {
        ExtractorRegistryBuilder::new()
    }

    pub fn select(&self, file: &str) -> Option<&dyn WorkflowExtractor> {
        self.extractors
            .iter()
            .find(|e| e.can_handle(file))
            .map(|e| &**e)
    }

    pub fn can_parse(&self, file: &str) -> bool {
        self.select(file).is_some()
    }

    /// Every claimed extension, lowercase, sorted and without duplicates.
    pub fn supported_extensions(&self) -> Vec<String> {
        self.extractors
            .iter()
            .flat_map(|e| e.extensions().iter())
            .map(|ext| ext.to_ascii_lowercase())
            .sorted()
            .dedup()
            .collect()
    }

    pub fn parse(
        &self,
        source: &str,
        file: &str,
        target: Option<&str>,
    ) -> Result<WorkflowGraph, ParseError> {
        let Some(extractor) = self.select(file) else {
            tracing::warn!(file, "no workflow extractor handles this file");
            return Err(ParseError::UnsupportedFile {
                file: file.to_string(),
                supported: self
                    .supported_extensions()
                    .iter()
                    .map(|ext| format!(".{}", ext))
                    .join(", "),
            });
        };

        let graph = extractor.extract(source, file, target)?;
        if !graph.has_steps() {
            tracing::warn!(
                file,
                workflow = %graph.name,
                language = %graph.language,
                "no workflow steps recognized"
            );
        }
        Ok(graph)
    }

    /// Workflow definitions of a file, empty for unsupported files.
    pub fn list_workflows(&self, source: &str, file: &str) -> Vec<WorkflowSummary> {
        self.select(file)
            .map(|e| e.discover(source, file))
            .unwrap_or_default()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
