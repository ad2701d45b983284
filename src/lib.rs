//! # daprvis - Durable Workflow Structure Extraction
//!
//! **daprvis** turns the source of Dapr workflow programs into a directed graph of
//! their steps, ready to be handed to a renderer. It understands the workflow idioms
//! of four SDKs (Python, TypeScript/JavaScript, C# and Java) without parsing the host
//! language: a delimiter-aware scanner and a per-language [`grammar::Grammar`] table
//! are enough to recognize activity calls, child workflows, timers, external events,
//! conditional branches and fan-out/fan-in blocks.
//!
//! ## Core Workflow
//!
//! 1.  **Select**: The [`registry::ExtractorRegistry`] picks an extractor from the file extension.
//! 2.  **Scope**: The extractor finds the workflow definitions in the file and scopes the requested one.
//! 3.  **Recognize**: Steps are recognized in source order; every step input is classified as
//!     workflow input, a prior step's output, event data or a literal.
//! 4.  **Assemble**: The [`graph::GraphAssembler`] wires control edges (sequential and parallel)
//!     and data edges into a [`graph::WorkflowGraph`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use daprvis::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let source = std::fs::read_to_string("workflows/order_processing.py")?;
//!     let registry = ExtractorRegistry::new();
//!
//!     for workflow in registry.list_workflows(&source, "order_processing.py") {
//!         println!("found {} on line {}", workflow.name, workflow.line);
//!     }
//!
//!     let graph = registry.parse(&source, "order_processing.py", None)?;
//!     for step in graph.steps() {
//!         println!("{:>4}  {:<24} {}", step.source_line, step.kind, step.name);
//!     }
//!
//!     // The renderer consumes the camelCase JSON form.
//!     println!("{}", graph.to_json_pretty()?);
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod extractor;
pub mod grammar;
pub mod graph;
pub mod prelude;
pub mod registry;
pub mod scanner;
