use super::context::ExtractionContext;
use crate::classifier::{classify, condition_sources};
use crate::config::ExtractorConfig;
use crate::grammar::{BlockStyle, Grammar};
use crate::graph::{DataSource, StepKind, StepNode};
use crate::scanner::{
    StatementEnd, expression_after_marker, find_matching_close, find_top_level, indentation,
    line_at, line_end, line_start, normalize_whitespace, split_top_level, statement_end, unquote,
};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

static NAMED_ARG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*\s*[=:][^=:]").unwrap());

static IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_$][\w$]*").unwrap());

static NAMEOF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^nameof\s*\(\s*(?P<inner>[^()]*?)\s*\)$").unwrap());

static CLASS_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\.\s*class(?:\s*\.\s*get(?:Name|CanonicalName|SimpleName)\s*\(\s*\))?$").unwrap()
});

/// `tasks.append(` / `tasks.push(` / `tasks.Add(` right before a call.
static APPEND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<target>[A-Za-z_$][\w$]*)\s*\.\s*(?:append|push|add|Add)\s*\(\s*(?:await\s+)?$")
        .unwrap()
});

#[derive(Debug, Clone, Copy)]
enum Shape {
    Call(StepKind),
    Join,
    Decision,
}

#[derive(Debug)]
struct Candidate<'t> {
    at: usize,
    /// End of the recognizer match.
    end: usize,
    label: Option<&'t str>,
    shape: Shape,
}

/// Names bound by the statement around a call.
#[derive(Debug)]
struct Binding {
    names: Vec<String>,
    /// Bound into a task list rather than a plain variable.
    collection: bool,
}

/// Turns the masked text of one workflow scope into step nodes.
pub(crate) struct StepRecognizer<'a> {
    grammar: &'a Grammar,
    config: &'a ExtractorConfig,
    text: &'a str,
}

impl<'a> StepRecognizer<'a> {
    pub fn new(grammar: &'a Grammar, config: &'a ExtractorConfig, text: &'a str) -> Self {
        Self {
            grammar,
            config,
            text,
        }
    }

    /// Processes every candidate in source order so that a step only sees
    /// the producers written above it.
    pub fn run(&self, ctx: &mut ExtractionContext) {
        for candidate in self.candidates() {
            let line = ctx.file_line(line_at(self.text, candidate.at));
            if ctx.line_taken(line) {
                tracing::debug!(line, "line already holds a step, skipping construct");
                continue;
            }
            match candidate.shape {
                Shape::Call(kind) => self.call(kind, &candidate, line, ctx),
                Shape::Join => self.join(&candidate, line, ctx),
                Shape::Decision => self.decision(&candidate, line, ctx),
            }
        }
    }

    fn candidates(&self) -> Vec<Candidate<'a>> {
        let text = self.text;
        let grammar = self.grammar;

        let calls = grammar.calls.iter().flat_map(move |pattern| {
            pattern.call.find_iter(text).map(move |m| Candidate {
                at: m.start(),
                end: m.end(),
                label: None,
                shape: Shape::Call(pattern.kind),
            })
        });
        let joins = grammar.join.captures_iter(text).filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Candidate {
                at: whole.start(),
                end: whole.end(),
                label: caps.name("name").map(|m| m.as_str()),
                shape: Shape::Join,
            })
        });
        let decisions = grammar.decision.find_iter(text).map(|m| Candidate {
            at: m.start(),
            end: m.end(),
            label: None,
            shape: Shape::Decision,
        });

        calls
            .chain(joins)
            .chain(decisions)
            .sorted_by_key(|c| c.at)
            .collect()
    }

    fn call(&self, kind: StepKind, candidate: &Candidate<'a>, line: usize, ctx: &mut ExtractionContext) {
        let open = candidate.end - 1;
        let close = match find_matching_close(self.text, open) {
            Ok(close) => close,
            Err(err) => {
                tracing::debug!(line, error = %err, "skipping call with unbalanced arguments");
                return;
            }
        };
        let args = split_top_level(&self.text[open + 1..close], b',');
        let first = args.first().copied().unwrap_or_default();
        let name = match kind {
            StepKind::Timer => normalize_whitespace(first),
            _ => callee_name(first),
        };
        let name = if name.is_empty() { kind.to_string() } else { name };

        let mut node = StepNode::new(ctx.next_id(kind), kind, name, line);
        match kind {
            StepKind::ExternalEvent => {
                node.data_sources.push(DataSource::event_data(node.name.clone()));
            }
            StepKind::Timer => {}
            _ => {
                if let Some(input) = self.input_argument(&args) {
                    node.data_sources = classify(input, &ctx.input_name, &ctx.producers).into_sources();
                    node.input_expression = Some(input.to_string());
                }
            }
        }

        if let Some(binding) = self.binding(candidate.at) {
            let awaited = self.awaited(candidate.at, close);
            if binding.collection || (!awaited && kind.is_schedulable()) {
                for name in &binding.names {
                    ctx.groups.register_task(name, &node.id);
                }
            }
            node.output_variable = Some(binding.names.join(", "));
            ctx.register_outputs(&binding.names, &node.id);
        }
        ctx.emit(node);
    }

    fn join(&self, candidate: &Candidate<'a>, line: usize, ctx: &mut ExtractionContext) {
        let open = candidate.end - 1;
        let close = match find_matching_close(self.text, open) {
            Ok(close) => close,
            Err(err) => {
                tracing::debug!(line, error = %err, "skipping join with unbalanced arguments");
                return;
            }
        };
        let args = self.text[open + 1..close].trim();

        let mut node = StepNode::new(
            ctx.next_id(StepKind::ParallelJoin),
            StepKind::ParallelJoin,
            candidate.label.unwrap_or("join"),
            line,
        );
        if !args.is_empty() {
            node.input_expression = Some(normalize_whitespace(args));
        }

        let mut members = 0;
        for token in IDENT.find_iter(args) {
            let tasks = ctx.groups.task_nodes(token.as_str()).to_vec();
            for task in &tasks {
                ctx.groups.assign(task, &node.id);
            }
            members += tasks.len();
        }
        if members == 0 {
            tracing::debug!(line, "join waits on no known task");
        }

        if let Some(binding) = self.binding(candidate.at) {
            node.output_variable = Some(binding.names.join(", "));
            ctx.register_outputs(&binding.names, &node.id);
        }
        ctx.emit(node);
    }

    fn decision(&self, candidate: &Candidate<'a>, line: usize, ctx: &mut ExtractionContext) {
        let branch = match self.grammar.block_style {
            BlockStyle::Indentation => self.indented_branch(candidate.end),
            BlockStyle::Braces => self.braced_branch(candidate.end - 1),
        };
        let Some((condition, body)) = branch else {
            tracing::debug!(line, "skipping conditional with malformed condition or body");
            return;
        };
        if !self.grammar.mentions_step(body) {
            return;
        }

        let condition = condition.trim();
        let mut node = StepNode::new(
            ctx.next_id(StepKind::Decision),
            StepKind::Decision,
            normalize_whitespace(condition),
            line,
        );
        node.data_sources = condition_sources(condition, &ctx.input_name, &ctx.producers);
        node.input_expression = Some(condition.to_string());
        ctx.emit(node);
    }

    /// `if cond:` followed by an inline statement or a deeper indented block.
    fn indented_branch(&self, from: usize) -> Option<(&'a str, &'a str)> {
        let text = self.text;
        let colon = find_top_level(text, from, b':')?;
        let condition = &text[from..colon];
        let after = colon + 1;
        let eol = line_end(text, after);
        if !text[after..eol].trim().is_empty() {
            return Some((condition, &text[after..eol]));
        }

        let base = indentation(text, line_start(text, from));
        let mut end = eol;
        let mut cursor = eol;
        while cursor < text.len() {
            let start = cursor + 1;
            let stop = line_end(text, start);
            if !text[start..stop].trim().is_empty() {
                if indentation(text, start) <= base {
                    break;
                }
                end = stop;
            }
            cursor = stop;
        }
        Some((condition, &text[after..end]))
    }

    /// `if (cond) { ... }` or `if (cond) statement;`.
    fn braced_branch(&self, open: usize) -> Option<(&'a str, &'a str)> {
        let text = self.text;
        let close = find_matching_close(text, open).ok()?;
        let condition = &text[open + 1..close];
        let rest = &text[close + 1..];
        let body_start = close + 1 + (rest.len() - rest.trim_start().len());
        let body = if text[body_start..].starts_with('{') {
            let body_end = find_matching_close(text, body_start).ok()?;
            &text[body_start..=body_end]
        } else {
            &text[body_start..statement_end(text, body_start, StatementEnd::Semicolon)]
        };
        Some((condition, body))
    }

    /// Named input marker first, then the positional input argument.
    fn input_argument<'t>(&self, args: &[&'t str]) -> Option<&'t str> {
        if let Some(marker) = &self.grammar.input_marker {
            for arg in args {
                let Some(m) = marker.find(arg).filter(|m| m.start() == 0) else {
                    continue;
                };
                if arg[m.end()..].starts_with('=') {
                    continue;
                }
                match expression_after_marker(arg, m.end()) {
                    Ok(expr) => return Some(expr),
                    Err(err) => tracing::debug!(error = %err, "input marker without a value"),
                }
            }
        }
        args.get(self.grammar.input_position)
            .copied()
            .filter(|arg| !NAMED_ARG.is_match(arg) && !CLASS_LITERAL.is_match(arg))
    }

    /// Assignment or task-list append around the call starting at `at`.
    fn binding(&self, at: usize) -> Option<Binding> {
        let text = self.text;
        let line_lead = &text[line_start(text, at)..at];
        let mut leads = Vec::with_capacity(2);
        match self.grammar.statement_end {
            StatementEnd::Semicolon => {
                let statement = text[..at].rfind([';', '{', '}']).map_or(0, |p| p + 1);
                leads.push(&text[statement..at]);
            }
            // `n = 1; r = yield ctx.call_activity(...)`
            StatementEnd::Newline => {
                if let Some(semi) = last_top_level(line_lead, b';') {
                    leads.push(&line_lead[semi + 1..]);
                }
            }
        }
        leads.push(line_lead);

        let assigned = leads.into_iter().find_map(|lead| {
            let caps = self.grammar.assignment.captures(lead)?;
            let names = binding_names(caps.name("target")?.as_str());
            (!names.is_empty()).then(|| Binding {
                names,
                collection: caps.name("collection").is_some(),
            })
        });
        assigned.or_else(|| {
            let caps = APPEND.captures(line_lead)?;
            Some(Binding {
                names: vec![caps.name("target")?.as_str().to_string()],
                collection: true,
            })
        })
    }

    /// Awaited by a prefix keyword shortly before the call on its line, or by
    /// a suffix right after its closing parenthesis.
    fn awaited(&self, at: usize, close: usize) -> bool {
        let text = self.text;
        let prefixed = self.grammar.await_prefix.as_ref().is_some_and(|keyword| {
            let mut from = at
                .saturating_sub(self.config.await_window)
                .max(line_start(text, at));
            while !text.is_char_boundary(from) {
                from += 1;
            }
            keyword.is_match(&text[from..at])
        });
        let suffixed = self
            .grammar
            .await_suffix
            .as_ref()
            .is_some_and(|suffix| suffix.is_match(&text[close + 1..]));
        prefixed || suffixed
    }
}

fn last_top_level(text: &str, needle: u8) -> Option<usize> {
    let mut last = None;
    let mut from = 0;
    while let Some(at) = find_top_level(text, from, needle) {
        last = Some(at);
        from = at + 1;
    }
    last
}

/// Variable names bound by an assignment target: `x`, `a, b`, `[a, b]`,
/// `{ a, b: renamed }`.
fn binding_names(target: &str) -> Vec<String> {
    target
        .split(',')
        .filter_map(|part| {
            let part = part.trim_matches(|c: char| c.is_whitespace() || "[]{}()".contains(c));
            let part = part.split('=').next().unwrap_or(part);
            let name = part.rsplit(':').next().unwrap_or(part).trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// Display name of the step a call targets: `nameof(Foo)` -> `Foo`,
/// `Foo.class.getName()` -> `Foo`, `"foo"` -> `foo`.
fn callee_name(arg: &str) -> String {
    let arg = arg.trim();
    if let Some(inner) = NAMEOF.captures(arg).and_then(|c| c.name("inner")) {
        return last_segment(inner.as_str()).to_string();
    }
    if let Some(m) = CLASS_LITERAL.find(arg) {
        return last_segment(&arg[..m.start()]).to_string();
    }
    normalize_whitespace(unquote(arg))
}

fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path).trim()
}
