use super::{BlockStyle, CallPattern, DocStyle, Grammar, ParamStyle, re};
use crate::graph::{Language, StepKind};
use crate::scanner::{CommentSyntax, StatementEnd};
use once_cell::sync::Lazy;

/// Classes deriving from `Workflow<TInput, TOutput>` with a `RunAsync` body.
pub static GRAMMAR: Lazy<Grammar> = Lazy::new(|| Grammar {
    language: Language::CSharp,
    extensions: &["cs"],
    comments: CommentSyntax::C_LIKE,
    statement_end: StatementEnd::Semicolon,
    block_style: BlockStyle::Braces,
    param_style: ParamStyle::TypeFirst,
    doc_style: DocStyle::LineComment("///"),

    workflow_decl: re(
        r"(?m)^[ \t]*(?:(?:public|internal|private|protected|sealed|partial|abstract|static)[ \t]+)*class[ \t]+(?P<name>\w+)\s*:\s*(?:[\w.]+\.)?Workflow\s*<\s*(?P<in_type>[\w.\[\]]+(?:<[^<>]*>)?\??)\s*,\s*(?P<out_type>[\w.\[\]]+(?:<[^<>]*>)?\??)\s*>",
    ),
    step_decl: Some(re(
        r"(?m)^[ \t]*(?:(?:public|internal|private|protected|sealed|partial|abstract|static)[ \t]+)*class[ \t]+\w+\s*:\s*(?:[\w.]+\.)?WorkflowActivity\s*<",
    )),
    signature: Some(re(r"\bRunAsync\s*\(")),
    return_annotation: None,
    input_binding: None,

    calls: vec![
        CallPattern {
            kind: StepKind::Invocation,
            call: re(r"\b\w+\.CallActivityAsync\s*(?:<[^()]*?>)?\s*\("),
        },
        CallPattern {
            kind: StepKind::SubWorkflowInvocation,
            call: re(r"\b\w+\.CallChildWorkflowAsync\s*(?:<[^()]*?>)?\s*\("),
        },
        CallPattern {
            kind: StepKind::Timer,
            call: re(r"\b\w+\.CreateTimer\s*\("),
        },
        CallPattern {
            kind: StepKind::ExternalEvent,
            call: re(r"\b\w+\.WaitForExternalEventAsync\s*(?:<[^()]*?>)?\s*\("),
        },
    ],
    join: re(r"\bTask\.(?P<name>WhenAll|WhenAny)\s*\("),
    decision: re(r"\b(?:else\s+)?if\s*\("),

    assignment: re(
        r"^\s*(?:(?:var|[\w.]+(?:<[^=;]*>)?(?:\[\])?\??)\s+)?(?P<target>[A-Za-z_]\w*)\s*=\s*(?:await\s+)?$",
    ),
    await_prefix: Some(re(r"\bawait\b")),
    await_suffix: None,
    input_marker: Some(re(r"(?:^|,)\s*input\s*:")),
    input_position: 1,

    return_stmt: re(r"\breturn\b"),
    record_decl: r"\b(?:class|record|struct)\s+(?:class\s+|struct\s+)?{name}\b",
    record_field: re(
        r"^[ \t]*public\s+(?:(?:required|virtual|override|readonly)\s+)*[\w.\[\]]+(?:<[^>]*>)?\??\s+(?P<field>\w+)\s*(?:\{|=|;)",
    ),
});
