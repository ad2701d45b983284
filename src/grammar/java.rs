use super::{BlockStyle, CallPattern, DocStyle, Grammar, ParamStyle, re};
use crate::graph::{Language, StepKind};
use crate::scanner::{CommentSyntax, StatementEnd};
use once_cell::sync::Lazy;

/// Classes implementing `Workflow`; the body is the `WorkflowStub` lambda and
/// every task is awaited with a trailing `.await()`.
pub static GRAMMAR: Lazy<Grammar> = Lazy::new(|| Grammar {
    language: Language::Java,
    extensions: &["java"],
    comments: CommentSyntax::C_LIKE,
    statement_end: StatementEnd::Semicolon,
    block_style: BlockStyle::Braces,
    param_style: ParamStyle::TypeFirst,
    doc_style: DocStyle::BlockComment,

    workflow_decl: re(
        r"(?m)^[ \t]*(?:(?:public|private|protected|static|final|abstract)[ \t]+)*class[ \t]+(?P<name>\w+)[^{]*?\bimplements\b[^{]*?\bWorkflow\b",
    ),
    step_decl: Some(re(
        r"(?m)^[ \t]*(?:(?:public|private|protected|static|final|abstract)[ \t]+)*class[ \t]+\w+[^{]*?\bimplements\b[^{]*?\bWorkflowActivity\b",
    )),
    signature: None,
    return_annotation: None,
    input_binding: Some(re(
        r"(?:[\w.]+(?:<[^=;]*>)?\s+)?(?P<name>[A-Za-z_]\w*)\s*=\s*\w+\.getInput\s*\(\s*(?P<type>[\w.]+)\.class",
    )),

    calls: vec![
        CallPattern {
            kind: StepKind::Invocation,
            call: re(r"\b\w+\.callActivity\s*\("),
        },
        CallPattern {
            kind: StepKind::SubWorkflowInvocation,
            call: re(r"\b\w+\.callChildWorkflow\s*\("),
        },
        CallPattern {
            kind: StepKind::Timer,
            call: re(r"\b\w+\.createTimer\s*\("),
        },
        CallPattern {
            kind: StepKind::ExternalEvent,
            call: re(r"\b\w+\.waitForExternalEvent\s*\("),
        },
    ],
    join: re(r"\b\w+\.(?P<name>allOf|anyOf)\s*\("),
    decision: re(r"\b(?:else\s+)?if\s*\("),

    assignment: re(
        r"^\s*(?:final\s+)?(?:[\w.]+(?:<[^=;]*>)?(?:\[\])?\s+)?(?P<target>[A-Za-z_]\w*)\s*=\s*$",
    ),
    await_prefix: None,
    await_suffix: Some(re(r"^\s*\.\s*await\s*\(")),
    input_marker: None,
    input_position: 1,

    return_stmt: re(r"\b\w+\.complete\s*\("),
    record_decl: r"\b(?:class|record)\s+{name}\b",
    record_field: re(
        r"^[ \t]*(?:(?:private|public|protected|final|transient)\s+)+[\w.]+(?:<[^>]*>)?(?:\[\])?\s+(?P<field>\w+)\s*(?:=|;)",
    ),
});
