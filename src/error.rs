use thiserror::Error;

/// Errors raised by the delimiter scanner when a bracketed construct is malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("Character '{found}' at offset {offset} does not open a bracketed construct")]
    NotAnOpener { found: char, offset: usize },

    #[error("Delimiter '{delimiter}' opened at offset {offset} is never closed")]
    Unclosed { delimiter: char, offset: usize },

    #[error("Offset {offset} is outside of the scanned text (length {len})")]
    OutOfRange { offset: usize, len: usize },
}

/// Errors that can occur while assembling nodes into a workflow graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Edge '{edge_id}' references node '{node_id}', which is not part of the graph")]
    DanglingEdge { edge_id: String, node_id: String },

    #[error("Step '{node_id}' appears more than once in the step list")]
    DuplicateNode { node_id: String },
}

/// Structural failures escaping a single extraction pass.
#[derive(Error, Debug, Clone)]
pub enum ExtractError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Scope {start}..{end} is not a valid range of a {len} byte source")]
    InvalidScope { start: usize, end: usize, len: usize },
}

/// The failure half of a parse outcome, surfaced to the host as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unsupported file type '{file}'. Supported extensions: {supported}")]
    UnsupportedFile { file: String, supported: String },

    #[error("Failed to parse workflow in '{file}': {message}")]
    ExtractionFailed { file: String, message: String },
}

impl ParseError {
    pub(crate) fn extraction(file: &str, err: ExtractError) -> Self {
        ParseError::ExtractionFailed {
            file: file.to_string(),
            message: err.to_string(),
        }
    }
}
