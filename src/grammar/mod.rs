//! Surface syntax tables, one per supported host language.
//!
//! A [`Grammar`] only describes how workflow idioms are spelled. The single
//! generic extractor in [`crate::extractor`] does all of the scanning.

pub mod csharp;
pub mod java;
pub mod python;
pub mod typescript;

use crate::graph::{Language, StepKind};
use crate::scanner::{CommentSyntax, StatementEnd};
use regex::Regex;

/// How a language delimits the body of a conditional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    /// `if cond:` followed by a more deeply indented block.
    Indentation,
    /// `if (cond) { ... }` or `if (cond) statement;`.
    Braces,
}

/// Order of name and type in a parameter declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    /// `name: Type`
    NameFirst,
    /// `Type name`
    TypeFirst,
}

/// Where the workflow's natural-language description lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocStyle {
    /// A string literal opening the function body.
    Docstring,
    /// A `/** ... */` block right above the declaration.
    BlockComment,
    /// Consecutive line comments with the given prefix above the declaration.
    LineComment(&'static str),
}

/// A call primitive that produces one step.
#[derive(Debug)]
pub struct CallPattern {
    pub kind: StepKind,
    /// Must end on the opening parenthesis of the call.
    pub call: Regex,
}

/// Data-driven description of one language's workflow idioms.
#[derive(Debug)]
pub struct Grammar {
    pub language: Language,
    pub extensions: &'static [&'static str],
    pub comments: CommentSyntax,
    pub statement_end: StatementEnd,
    pub block_style: BlockStyle,
    pub param_style: ParamStyle,
    pub doc_style: DocStyle,

    /// Workflow declaration. Named groups: `name` or `alt_name`, and
    /// optionally `in_type` / `out_type`.
    pub workflow_decl: Regex,
    /// Declaration of a step implementation (an activity); closes the
    /// scope of the workflow before it.
    pub step_decl: Option<Regex>,
    /// Ends on the opening parenthesis of the workflow's parameter list.
    pub signature: Option<Regex>,
    /// Applied right after the parameter list; named group `type` holds the
    /// declared output type.
    pub return_annotation: Option<Regex>,
    /// Statement binding the workflow input inside the body. Named groups
    /// `name` and `type`.
    pub input_binding: Option<Regex>,

    pub calls: Vec<CallPattern>,
    /// Fan-in primitive ending on its opening parenthesis; named group `name`.
    pub join: Regex,
    /// Conditional keyword. For brace languages the match ends on `(`.
    pub decision: Regex,

    /// Applied to the statement text preceding a call. Named group `target`
    /// and optional group `collection` (task list literal).
    pub assignment: Regex,
    /// Keyword awaiting a call, searched in a short window before it.
    pub await_prefix: Option<Regex>,
    /// Applied to the text right after a call's closing parenthesis.
    pub await_suffix: Option<Regex>,
    /// Named-argument marker carrying a step's input.
    pub input_marker: Option<Regex>,
    /// Positional index of the input argument when no marker is present.
    pub input_position: usize,

    /// Return statement. When the match ends on `(` the returned value is the
    /// parenthesized argument (`ctx.complete(value)`).
    pub return_stmt: Regex,
    /// Record declaration template; `{name}` is replaced by the escaped type name.
    pub record_decl: &'static str,
    /// Member declaration inside a record body; named group `field`.
    pub record_field: Regex,
}

impl Grammar {
    pub fn handles_extension(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }

    /// `true` when `text` contains any recognized step primitive.
    pub fn mentions_step(&self, text: &str) -> bool {
        self.calls.iter().any(|c| c.call.is_match(text)) || self.join.is_match(text)
    }

    pub fn record_pattern(&self, type_name: &str) -> Result<Regex, regex::Error> {
        Regex::new(&self.record_decl.replace("{name}", &regex::escape(type_name)))
    }
}

/// Compiles a grammar pattern. Patterns are literals, so failure is a bug.
pub(crate) fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}
