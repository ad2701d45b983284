//! Decides where the data handed to a workflow step comes from.

use crate::graph::DataSource;
use crate::scanner::{find_matching_close, split_top_level, unquote};
use ahash::{AHashMap, AHashSet};
use once_cell::sync::Lazy;
use regex::Regex;

/// Output variable name -> id of the step that produced it.
///
/// Entries are write-once: a later assignment to the same name does not
/// replace the first producer.
#[derive(Debug, Clone, Default)]
pub struct ProducerMap {
    producers: AHashMap<String, String>,
}

impl ProducerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the variable already had a producer.
    pub fn register(&mut self, variable: &str, node_id: &str) -> bool {
        if self.producers.contains_key(variable) {
            return false;
        }
        self.producers
            .insert(variable.to_string(), node_id.to_string());
        true
    }

    pub fn producer_of(&self, variable: &str) -> Option<&str> {
        self.producers.get(variable).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }
}

/// Result of classifying one input expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Single(DataSource),
    /// One source per entry of a keyed literal, tagged with its target field.
    Keyed(Vec<DataSource>),
}

impl Classification {
    pub fn into_sources(self) -> Vec<DataSource> {
        match self {
            Classification::Single(source) => vec![source],
            Classification::Keyed(sources) => sources,
        }
    }
}

static ROOT_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_$][\w$]*").unwrap());

static BARE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[A-Za-z_$][\w$]*(?:\??\.[A-Za-z_$][\w$]*|\[[^\[\]]*\])*$"#).unwrap()
});

/// String literals are matched first so identifiers inside them are skipped.
static CONDITION_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|(?P<path>[A-Za-z_$][\w$]*(?:\??\.[A-Za-z_$][\w$]*|\[[^\[\]]*\])*)"#,
    )
    .unwrap()
});

static KEYWORD_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][\w.]*\s*\(").unwrap());

static KEYWORD_ARG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*\s*=[^=]").unwrap());

static OBJECT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^new(?:\s+[\w.]+(?:<[^{}]*>)?)?\s*(?:\(\s*\))?\s*\{").unwrap());

const KEYWORD_LITERALS: &[&str] = &[
    "None", "True", "False", "null", "true", "false", "undefined", "NaN", "default",
];

const STRING_PREFIXES: &[&str] = &["f", "r", "b", "rb", "br", "fr", "rf", "$", "@", "$@", "@$"];

/// Classifies an input expression against the workflow input name and the
/// producers registered so far.
pub fn classify(expression: &str, input_name: &str, producers: &ProducerMap) -> Classification {
    let expr = expression.trim();
    match keyed_entries(expr) {
        Some(entries) => Classification::Keyed(
            entries
                .into_iter()
                .flat_map(|(key, value)| {
                    classify(&value, input_name, producers)
                        .into_sources()
                        .into_iter()
                        .map(move |source| source.with_target_field(key.clone()))
                })
                .collect(),
        ),
        None => Classification::Single(classify_single(expr, input_name, producers)),
    }
}

fn classify_single(expr: &str, input_name: &str, producers: &ProducerMap) -> DataSource {
    if refers_to(expr, input_name) {
        return DataSource::workflow_input(expr);
    }
    if let Some(root) = ROOT_IDENT.find(expr) {
        if let Some(producer) = producers.producer_of(root.as_str()) {
            return DataSource::step_output(expr, producer);
        }
    }
    if is_string_literal(expr) || KEYWORD_LITERALS.contains(&expr) {
        return DataSource::literal(expr);
    }
    if BARE_PATH.is_match(expr) {
        return DataSource::guessed_input(expr);
    }
    DataSource::literal(expr)
}

/// `true` for `name` itself and accesses rooted at it.
pub fn refers_to(expr: &str, name: &str) -> bool {
    match expr.strip_prefix(name) {
        Some(rest) => {
            rest.is_empty()
                || rest.starts_with('.')
                || rest.starts_with('[')
                || rest.starts_with("?.")
        }
        None => false,
    }
}

fn is_string_literal(expr: &str) -> bool {
    let body = STRING_PREFIXES
        .iter()
        .filter_map(|p| expr.strip_prefix(p))
        .find(|rest| rest.starts_with(['"', '\'']))
        .unwrap_or(expr);
    body.len() >= 2 && unquote(body).len() + 2 <= body.len()
}

/// Data sources referenced by a condition: every identifier path rooted at the
/// workflow input or at a known producer, first occurrence wins.
pub fn condition_sources(
    condition: &str,
    input_name: &str,
    producers: &ProducerMap,
) -> Vec<DataSource> {
    let mut seen = AHashSet::new();
    let mut sources = Vec::new();
    for caps in CONDITION_TOKEN.captures_iter(condition) {
        let Some(path) = caps.name("path").map(|m| m.as_str()) else {
            continue;
        };
        let source = if refers_to(path, input_name) {
            DataSource::workflow_input(path)
        } else {
            let root = ROOT_IDENT.find(path).map_or(path, |m| m.as_str());
            match producers.producer_of(root) {
                Some(producer) => DataSource::step_output(path, producer),
                None => continue,
            }
        };
        if seen.insert(path.to_string()) {
            sources.push(source);
        }
    }
    sources
}

/// Splits a keyed literal into `(key, value)` pairs.
///
/// Recognized shapes: `{ k: v, ... }`, `{"k": v}`, C# initializers
/// `new { K = v }` / `new T { K = v }`, and keyword-argument constructor
/// calls `T(k=v, ...)`. Returns `None` for anything else.
pub fn keyed_entries(expr: &str) -> Option<Vec<(String, String)>> {
    let expr = expr.trim();
    let body = if expr.starts_with('{') {
        braced_body(expr, 0)?
    } else if let Some(prefix) = OBJECT_PREFIX.find(expr) {
        braced_body(expr, prefix.end() - 1)?
    } else if let Some(call) = KEYWORD_CALL.find(expr) {
        let open = call.end() - 1;
        let close = find_matching_close(expr, open).ok()?;
        if close != expr.len() - 1 {
            return None;
        }
        let args = split_top_level(&expr[open + 1..close], b',');
        if args.is_empty() || !args.iter().all(|a| KEYWORD_ARG.is_match(a)) {
            return None;
        }
        return Some(args.into_iter().filter_map(split_entry).collect());
    } else {
        return None;
    };

    Some(
        split_top_level(body, b',')
            .into_iter()
            .filter_map(split_entry)
            .collect(),
    )
}

fn braced_body(expr: &str, open: usize) -> Option<&str> {
    let close = find_matching_close(expr, open).ok()?;
    (close == expr.len() - 1).then(|| &expr[open + 1..close])
}

fn split_entry(entry: &str) -> Option<(String, String)> {
    let entry = entry.trim();
    if let Some(spread) = entry.strip_prefix("...").or_else(|| entry.strip_prefix("**")) {
        let spread = spread.trim();
        return Some((spread.to_string(), spread.to_string()));
    }
    match entry_separator(entry) {
        Some(at) => {
            let key = unquote(entry[..at].trim()).trim();
            let value = entry[at + 1..].trim();
            if key.is_empty() || value.is_empty() {
                return None;
            }
            Some((key.to_string(), value.to_string()))
        }
        None => ROOT_IDENT
            .is_match(entry)
            .then(|| (entry.to_string(), entry.to_string())),
    }
}

/// Position of the first depth-0 `:` or lone `=` outside strings.
fn entry_separator(entry: &str) -> Option<usize> {
    let colon = crate::scanner::find_top_level(entry, 0, b':');
    let equals = lone_equals(entry);
    match (colon, equals) {
        (Some(c), Some(e)) => Some(c.min(e)),
        (c, e) => c.or(e),
    }
}

fn lone_equals(entry: &str) -> Option<usize> {
    let bytes = entry.as_bytes();
    let mut from = 0;
    while let Some(at) = crate::scanner::find_top_level(entry, from, b'=') {
        let prev = at.checked_sub(1).map(|p| bytes[p]);
        let next = bytes.get(at + 1).copied();
        let compound = matches!(prev, Some(b'=' | b'!' | b'<' | b'>'))
            || matches!(next, Some(b'=' | b'>'));
        if !compound {
            return Some(at);
        }
        from = at + 1;
    }
    None
}
