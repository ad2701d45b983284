use super::discovery::WorkflowScope;
use crate::classifier::keyed_entries;
use crate::config::ExtractorConfig;
use crate::error::ExtractError;
use crate::grammar::{BlockStyle, DocStyle, Grammar, ParamStyle};
use crate::graph::WorkflowMetadata;
use crate::scanner::{
    find_matching_close, find_top_level, indentation, line_end, line_start, normalize_whitespace,
    split_top_level, statement_end,
};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

static XML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][^>]*>").unwrap());

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_$][\w$]*$").unwrap());

const PARAM_MODIFIERS: &[&str] = &["final", "this", "in", "ref", "out", "readonly", "params"];

#[derive(Debug, PartialEq, Eq)]
struct Param {
    name: String,
    ty: Option<String>,
}

/// Reads the workflow-level facts: types, input name, record fields, return
/// shape and description.
pub(crate) struct MetadataReader<'a> {
    grammar: &'a Grammar,
    config: &'a ExtractorConfig,
    raw: &'a str,
    masked: &'a str,
    scope: &'a WorkflowScope,
}

impl<'a> MetadataReader<'a> {
    pub fn new(
        grammar: &'a Grammar,
        config: &'a ExtractorConfig,
        raw: &'a str,
        masked: &'a str,
        scope: &'a WorkflowScope,
    ) -> Self {
        Self {
            grammar,
            config,
            raw,
            masked,
            scope,
        }
    }

    /// Fails only when the workflow's own parameter list never closes.
    pub fn read(&self) -> Result<WorkflowMetadata, ExtractError> {
        let scope = self.scope;
        let body = &self.masked[scope.start..scope.end];
        let mut meta = WorkflowMetadata::default();
        let mut input_name = None;
        let mut signature_end = None;

        if let Some(m) = self.grammar.signature.as_ref().and_then(|s| s.find(body)) {
            let open = scope.start + m.end() - 1;
            let close = find_matching_close(self.masked, open)?;
            let params = split_top_level(&self.masked[open + 1..close], b',');
            if let Some(param) = params
                .get(1)
                .and_then(|p| parse_param(p, self.grammar.param_style))
            {
                input_name = Some(param.name);
                meta.input_type = param.ty;
            }
            let tail = &self.masked[close + 1..scope.end];
            meta.output_type = self
                .grammar
                .return_annotation
                .as_ref()
                .and_then(|annotation| annotation.captures(tail))
                .and_then(|caps| caps.name("type").map(|t| t.as_str().trim().to_string()));
            signature_end = Some(close + 1);
        }

        if let Some(caps) = self
            .grammar
            .input_binding
            .as_ref()
            .and_then(|binding| binding.captures(body))
        {
            if let Some(name) = caps.name("name") {
                input_name = Some(name.as_str().to_string());
            }
            if let Some(ty) = caps.name("type") {
                meta.input_type = Some(ty.as_str().to_string());
            }
        }
        if scope.input_type.is_some() {
            meta.input_type = scope.input_type.clone();
        }
        if scope.output_type.is_some() {
            meta.output_type = scope.output_type.clone();
        }
        meta.input_parameter =
            input_name.unwrap_or_else(|| self.config.fallback_input_name.clone());

        if let Some(ty) = &meta.input_type {
            meta.input_fields = self.record_fields(ty);
        }

        let returns = self.return_expressions();
        meta.output_fields = returns
            .iter()
            .filter_map(|expr| keyed_entries(expr))
            .flatten()
            .map(|(key, _)| key)
            .unique()
            .collect();
        if meta.output_fields.is_empty() {
            if let Some(ty) = &meta.output_type {
                meta.output_fields = self.record_fields(ty);
            }
        }
        meta.return_expression = returns.last().map(|expr| expr.to_string());

        meta.description = match self.grammar.doc_style {
            DocStyle::Docstring => signature_end.and_then(|end| self.docstring(end)),
            DocStyle::BlockComment => block_comment_above(self.raw, scope.start),
            DocStyle::LineComment(prefix) => line_comments_above(self.raw, scope.start, prefix),
        };
        Ok(meta)
    }

    /// Every returned expression of the scope in source order. A return
    /// pattern ending on `(` returns its parenthesized argument.
    fn return_expressions(&self) -> Vec<&'a str> {
        let masked = self.masked;
        let scope = self.scope;
        self.grammar
            .return_stmt
            .find_iter(&masked[scope.start..scope.end])
            .filter_map(|m| {
                let at = scope.start + m.end();
                let expr = if m.as_str().ends_with('(') {
                    let close = find_matching_close(masked, at - 1).ok()?;
                    &masked[at..close]
                } else {
                    let end = statement_end(masked, at, self.grammar.statement_end).min(scope.end);
                    &masked[at..end]
                };
                let expr = expr.trim();
                (!expr.is_empty()).then_some(expr)
            })
            .collect()
    }

    /// Member names of the record, dataclass or interface called `type_name`,
    /// looked up anywhere in the file.
    fn record_fields(&self, type_name: &str) -> Vec<String> {
        let Some(base) = base_type(type_name) else {
            return Vec::new();
        };
        let pattern = match self.grammar.record_pattern(base) {
            Ok(pattern) => pattern,
            Err(err) => {
                tracing::debug!(type_name = base, error = %err, "cannot build record lookup");
                return Vec::new();
            }
        };
        let Some(decl) = pattern.find(self.masked) else {
            tracing::debug!(type_name = base, "record declaration not found in file");
            return Vec::new();
        };

        let fields = match self.grammar.block_style {
            BlockStyle::Indentation => self.indented_fields(decl.start(), decl.end()),
            BlockStyle::Braces => self.braced_fields(decl.end()),
        };
        fields.into_iter().unique().collect()
    }

    /// Fields of an indented class body; only lines at the body's first
    /// indentation level count, so method bodies are skipped.
    fn indented_fields(&self, decl_start: usize, header_end: usize) -> Vec<String> {
        let text = self.masked;
        let base = indentation(text, line_start(text, decl_start));
        let mut body_indent = None;
        let mut fields = Vec::new();
        let mut cursor = line_end(text, header_end);

        while cursor < text.len() {
            let start = cursor + 1;
            let stop = line_end(text, start);
            cursor = stop;
            let line = &text[start..stop];
            if line.trim().is_empty() {
                continue;
            }
            let indent = indentation(text, start);
            if indent <= base {
                break;
            }
            if *body_indent.get_or_insert(indent) != indent {
                continue;
            }
            if let Some(field) = self.field_of(line) {
                fields.push(field);
            }
        }
        fields
    }

    /// Fields of a braced body, or the components of a positional record.
    fn braced_fields(&self, from: usize) -> Vec<String> {
        let text = self.masked;
        let Some(at) = text[from..].find(['(', '{', ';']).map(|rel| from + rel) else {
            return Vec::new();
        };
        if text.as_bytes()[at] == b';' {
            return Vec::new();
        }
        let close = match find_matching_close(text, at) {
            Ok(close) => close,
            Err(err) => {
                tracing::debug!(error = %err, "record body never closes");
                return Vec::new();
            }
        };
        let inner = &text[at + 1..close];

        if text.as_bytes()[at] == b'(' {
            return split_top_level(inner, b',')
                .into_iter()
                .filter_map(|p| parse_param(p, self.grammar.param_style))
                .map(|p| p.name)
                .collect();
        }
        flatten_groups(inner)
            .lines()
            .filter_map(|line| self.field_of(line))
            .collect()
    }

    fn field_of(&self, line: &str) -> Option<String> {
        let caps = self.grammar.record_field.captures(line)?;
        caps.name("field").map(|m| m.as_str().to_string())
    }

    /// String literal opening the body after the signature's closing colon.
    fn docstring(&self, signature_end: usize) -> Option<String> {
        let colon = find_top_level(self.masked, signature_end, b':')?;
        let rest = self.raw[colon + 1..].trim_start();
        let rest = rest
            .strip_prefix(['r', 'R', 'u', 'U'])
            .filter(|r| r.starts_with(['"', '\'']))
            .unwrap_or(rest);
        for quote in ["\"\"\"", "'''", "\"", "'"] {
            if let Some(inner) = rest.strip_prefix(quote) {
                let end = inner.find(quote)?;
                return non_empty(normalize_whitespace(&inner[..end]));
            }
        }
        None
    }
}

fn parse_param(param: &str, style: ParamStyle) -> Option<Param> {
    let param = match find_top_level(param, 0, b'=') {
        Some(eq) => &param[..eq],
        None => param,
    }
    .trim();

    let (name, ty) = match style {
        ParamStyle::NameFirst => match find_top_level(param, 0, b':') {
            Some(colon) => (&param[..colon], Some(param[colon + 1..].trim().to_string())),
            None => (param, None),
        },
        ParamStyle::TypeFirst => {
            let tokens: Vec<&str> = param
                .split_whitespace()
                .filter(|t| !PARAM_MODIFIERS.contains(t) && !t.starts_with('@'))
                .collect();
            let (name, ty) = tokens.split_last()?;
            (*name, (!ty.is_empty()).then(|| ty.join(" ")))
        }
    };

    let name = name
        .trim()
        .trim_start_matches(['*', '.'])
        .trim_end_matches('?');
    IDENTIFIER.is_match(name).then(|| Param {
        name: name.to_string(),
        ty: ty.filter(|t| !t.is_empty()),
    })
}

/// `Optional<Order>` -> `Optional`, `models.Order` -> `Order`, `Order?` -> `Order`.
fn base_type(type_name: &str) -> Option<&str> {
    let head = type_name.split(['<', '[', '?', '|']).next()?.trim();
    let base = head.rsplit('.').next()?.trim();
    IDENTIFIER.is_match(base).then_some(base)
}

/// Keeps bracket pairs but drops their contents, so nested bodies such as
/// accessors and methods collapse onto their declaring line.
fn flatten_groups(body: &str) -> String {
    let mut flat = String::with_capacity(body.len());
    let mut i = 0;
    while let Some(open) = body[i..].find(['(', '{', '[']).map(|rel| i + rel) {
        flat.push_str(&body[i..=open]);
        match find_matching_close(body, open) {
            Ok(close) => {
                flat.push_str(&body[close..=close]);
                i = close + 1;
            }
            Err(_) => i = open + 1,
        }
    }
    flat.push_str(&body[i..]);
    flat
}

/// `/** ... */` directly above the declaration, skipping annotation lines.
fn block_comment_above(raw: &str, decl_start: usize) -> Option<String> {
    let mut lines: Vec<&str> = raw[..decl_start].lines().collect();
    while lines
        .last()
        .is_some_and(|l| l.trim().is_empty() || l.trim().starts_with('@'))
    {
        lines.pop();
    }
    if !lines.last()?.trim_end().ends_with("*/") {
        return None;
    }
    let first = lines.iter().rposition(|l| l.contains("/**"))?;
    let block = lines[first..].join("\n");
    let begin = block.find("/**")? + 3;
    let end = block.rfind("*/")?;
    if end < begin {
        return None;
    }

    let content = block[begin..end]
        .lines()
        .map(|l| l.trim().trim_start_matches('*').trim())
        .filter(|l| !l.starts_with('@'))
        .join(" ");
    non_empty(normalize_whitespace(&content))
}

/// Consecutive `prefix` comment lines above the declaration with markup tags
/// removed. Attribute lines between the comment and the declaration are skipped.
fn line_comments_above(raw: &str, decl_start: usize, prefix: &str) -> Option<String> {
    let mut collected = Vec::new();
    for line in raw[..decl_start].lines().rev() {
        let line = line.trim();
        if let Some(doc) = line.strip_prefix(prefix) {
            collected.push(doc);
        } else if collected.is_empty() && (line.is_empty() || line.starts_with('[')) {
            continue;
        } else {
            break;
        }
    }
    collected.reverse();
    let joined = collected.join(" ");
    let text = XML_TAG.replace_all(&joined, " ");
    non_empty(normalize_whitespace(&text))
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}
