use super::{BlockStyle, CallPattern, DocStyle, Grammar, ParamStyle, re};
use crate::graph::{Language, StepKind};
use crate::scanner::{CommentSyntax, StatementEnd};
use once_cell::sync::Lazy;

/// `@workflow`-decorated functions driving a `DaprWorkflowContext`.
pub static GRAMMAR: Lazy<Grammar> = Lazy::new(|| Grammar {
    language: Language::Python,
    extensions: &["py"],
    comments: CommentSyntax::HASH,
    statement_end: StatementEnd::Newline,
    block_style: BlockStyle::Indentation,
    param_style: ParamStyle::NameFirst,
    doc_style: DocStyle::Docstring,

    workflow_decl: re(
        r"(?m)^[ \t]*@(?:[\w.]+\.)?workflow\b(?:\([^)]*\))?[ \t]*\r?\n(?:[ \t]*@[^\n]*\n)*[ \t]*(?:async[ \t]+)?def[ \t]+(?P<name>\w+)",
    ),
    step_decl: Some(re(r"(?m)^[ \t]*@(?:[\w.]+\.)?activity\b")),
    signature: Some(re(r"\bdef[ \t]+\w+[ \t]*\(")),
    return_annotation: Some(re(r"^\s*->\s*(?P<type>[^:\n]+?)\s*:")),
    input_binding: None,

    calls: vec![
        CallPattern {
            kind: StepKind::Invocation,
            call: re(r"\b\w+\.call_activity\s*\("),
        },
        CallPattern {
            kind: StepKind::SubWorkflowInvocation,
            call: re(r"\b\w+\.call_child_workflow\s*\("),
        },
        CallPattern {
            kind: StepKind::Timer,
            call: re(r"\b\w+\.create_timer\s*\("),
        },
        CallPattern {
            kind: StepKind::ExternalEvent,
            call: re(r"\b\w+\.wait_for_external_event\s*\("),
        },
    ],
    join: re(r"\b(?:\w+\.)?(?P<name>when_all|when_any)\s*\("),
    decision: re(r"(?m)^[ \t]*(?:el)?if\b"),

    assignment: re(
        r"^\s*(?P<target>[A-Za-z_]\w*(?:\s*,\s*[A-Za-z_]\w*)*)\s*(?::\s*[^=\n]+)?=\s*(?:(?:await|yield)\s+)?(?P<collection>\[\s*)?$",
    ),
    await_prefix: Some(re(r"\b(?:await|yield)\b")),
    await_suffix: None,
    input_marker: Some(re(r"(?:^|,)\s*input\s*=")),
    input_position: 1,

    return_stmt: re(r"\breturn\b"),
    record_decl: r"(?m)^[ \t]*class[ \t]+{name}\b[^\n]*:",
    record_field: re(r"^[ \t]*(?P<field>[A-Za-z_]\w*)[ \t]*:"),
});
