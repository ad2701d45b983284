use super::{BlockStyle, CallPattern, DocStyle, Grammar, ParamStyle, re};
use crate::graph::{Language, StepKind};
use crate::scanner::{CommentSyntax, StatementEnd};
use once_cell::sync::Lazy;

/// Generator workflows (`async function*`) of the JavaScript SDK, in
/// TypeScript or plain JavaScript.
pub static GRAMMAR: Lazy<Grammar> = Lazy::new(|| Grammar {
    language: Language::TypeScript,
    extensions: &["ts", "mts", "cts", "js", "mjs", "cjs"],
    comments: CommentSyntax::C_LIKE,
    statement_end: StatementEnd::Semicolon,
    block_style: BlockStyle::Braces,
    param_style: ParamStyle::NameFirst,
    doc_style: DocStyle::BlockComment,

    workflow_decl: re(
        r"(?m)^[ \t]*(?:export[ \t]+)?(?:(?:const|let|var)[ \t]+(?P<name>[A-Za-z_$][\w$]*)[^=\n]*=[ \t]*(?:async[ \t]+)?function[ \t]*\*|(?:default[ \t]+)?(?:async[ \t]+)?function[ \t]*\*[ \t]*(?P<alt_name>[A-Za-z_$][\w$]*))",
    ),
    step_decl: Some(re(
        r"(?m)^[ \t]*(?:export[ \t]+)?(?:(?:const|let|var)[ \t]+[A-Za-z_$][\w$]*|(?:async[ \t]+)?function[ \t]+[A-Za-z_$][\w$]*)[^\n]*WorkflowActivityContext",
    )),
    signature: Some(re(r"function[ \t]*\*[ \t]*[\w$]*[ \t]*\(")),
    return_annotation: Some(re(r"^\s*:\s*(?P<type>[^{=\n]+?)\s*(?:\{|=>)")),
    input_binding: None,

    calls: vec![
        CallPattern {
            kind: StepKind::Invocation,
            call: re(r"\b[\w$]+\.callActivity\s*(?:<[^()]*>)?\s*\("),
        },
        CallPattern {
            kind: StepKind::SubWorkflowInvocation,
            call: re(r"\b[\w$]+\.(?:callChildWorkflow|callSubWorkflow)\s*(?:<[^()]*>)?\s*\("),
        },
        CallPattern {
            kind: StepKind::Timer,
            call: re(r"\b[\w$]+\.createTimer\s*\("),
        },
        CallPattern {
            kind: StepKind::ExternalEvent,
            call: re(r"\b[\w$]+\.waitForExternalEvent\s*(?:<[^()]*>)?\s*\("),
        },
    ],
    join: re(r"\b[\w$]+\.(?P<name>whenAll|whenAny)\s*\("),
    decision: re(r"\b(?:else\s+)?if\s*\("),

    assignment: re(
        r"^\s*(?:(?:const|let|var)\s+)?(?P<target>[A-Za-z_$][\w$]*|\[[^\]=]*\]|\{[^}=]*\})\s*(?::\s*[^=]+?)?\s*=\s*(?:(?:await|yield)\s*\*?\s*)?(?P<collection>\[\s*)?$",
    ),
    await_prefix: Some(re(r"\b(?:await|yield)\b")),
    await_suffix: None,
    input_marker: None,
    input_position: 1,

    return_stmt: re(r"\breturn\b"),
    record_decl: r"\b(?:interface|class|type)\s+{name}\b",
    record_field: re(
        r"^[ \t]*(?:(?:public|private|protected|readonly)[ \t]+)*(?P<field>[A-Za-z_$][\w$]*)\??[ \t]*:",
    ),
});
