//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the daprvis crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use daprvis::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let registry = ExtractorRegistry::builder()
//!     .with_config(ExtractorConfig::default().with_await_window(24))
//!     .build();
//!
//! let source = std::fs::read_to_string("path/to/OrderWorkflow.cs")?;
//! let graph = registry.parse(&source, "OrderWorkflow.cs", Some("OrderWorkflow"))?;
//! println!("{} steps", graph.steps().count());
//! # Ok(())
//! # }
//! ```

// Entry points
pub use crate::config::ExtractorConfig;
pub use crate::extractor::{GrammarExtractor, WorkflowExtractor, WorkflowSummary};
pub use crate::registry::ExtractorRegistry;

// Graph model
pub use crate::graph::{
    DataSource, Edge, EdgeKind, Language, SourceKind, StepKind, StepNode, WorkflowGraph,
    WorkflowMetadata,
};

// Error types
pub use crate::error::{ExtractError, ParseError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
