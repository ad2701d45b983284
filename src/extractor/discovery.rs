use crate::grammar::Grammar;
use crate::scanner::line_at;
use serde::{Deserialize, Serialize};

/// A workflow definition located in a file, offered to the host so the user
/// can pick which one to visualize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub name: String,
    /// 1-based line of the declaration.
    pub line: usize,
}

/// Byte range of one workflow definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorkflowScope {
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub input_type: Option<String>,
    pub output_type: Option<String>,
}

/// Finds every workflow declaration. A scope runs until the next workflow,
/// the first step declaration after it, or the end of the text.
pub(crate) fn discover(grammar: &Grammar, text: &str) -> Vec<WorkflowScope> {
    let decls: Vec<(usize, usize, WorkflowScope)> = grammar
        .workflow_decl
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.name("name").or_else(|| caps.name("alt_name"))?;
            let scope = WorkflowScope {
                name: name.as_str().to_string(),
                start: whole.start(),
                end: text.len(),
                input_type: caps.name("in_type").map(|m| m.as_str().trim().to_string()),
                output_type: caps.name("out_type").map(|m| m.as_str().trim().to_string()),
            };
            Some((whole.start(), whole.end(), scope))
        })
        .collect();

    let starts: Vec<usize> = decls.iter().map(|(start, _, _)| *start).collect();
    decls
        .into_iter()
        .enumerate()
        .map(|(i, (_, decl_end, mut scope))| {
            let next = starts.get(i + 1).copied().unwrap_or(text.len());
            let step = grammar
                .step_decl
                .as_ref()
                .and_then(|re| re.find_at(text, decl_end))
                .map(|m| m.start())
                .filter(|&at| at < next);
            scope.end = step.unwrap_or(next);
            scope
        })
        .collect()
}

pub(crate) fn summarize(text: &str, scopes: &[WorkflowScope]) -> Vec<WorkflowSummary> {
    scopes
        .iter()
        .map(|s| WorkflowSummary {
            name: s.name.clone(),
            line: line_at(text, s.start),
        })
        .collect()
}

/// Picks the requested workflow, else the first one, else the whole file
/// under a name derived from the file identifier.
pub(crate) fn select(
    mut scopes: Vec<WorkflowScope>,
    target: Option<&str>,
    file: &str,
    len: usize,
) -> WorkflowScope {
    if let Some(wanted) = target {
        if let Some(pos) = scopes.iter().position(|s| s.name == wanted) {
            return scopes.swap_remove(pos);
        }
        tracing::debug!(workflow = wanted, file, "requested workflow not found, using the first one");
    }
    if !scopes.is_empty() {
        return scopes.swap_remove(0);
    }
    tracing::debug!(file, "no workflow declaration found, scoping the whole file");
    WorkflowScope {
        name: file_stem(file),
        start: 0,
        end: len,
        input_type: None,
        output_type: None,
    }
}

/// `src/order_workflow.py` -> `order_workflow`.
pub fn file_stem(file: &str) -> String {
    let base = file.rsplit(['/', '\\']).next().unwrap_or(file);
    let stem = match base.rfind('.') {
        Some(dot) if dot > 0 => &base[..dot],
        _ => base,
    };
    if stem.is_empty() {
        "workflow".to_string()
    } else {
        stem.to_string()
    }
}
