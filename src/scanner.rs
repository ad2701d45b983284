//! Delimiter-aware text scanning shared by every language grammar.
//!
//! All offsets are byte offsets. Every delimiter the scanner reacts to is
//! ASCII, so offsets it returns are always valid `str` slice boundaries.

use crate::error::ScanError;

/// How a language spells its comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentSyntax {
    pub line: &'static str,
    pub block: Option<(&'static str, &'static str)>,
}

impl CommentSyntax {
    pub const HASH: CommentSyntax = CommentSyntax {
        line: "#",
        block: None,
    };
    pub const C_LIKE: CommentSyntax = CommentSyntax {
        line: "//",
        block: Some(("/*", "*/")),
    };
}

/// What ends a statement when no bracket is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementEnd {
    Newline,
    Semicolon,
}

fn closer_for(open: u8) -> Option<u8> {
    match open {
        b'(' => Some(b')'),
        b'[' => Some(b']'),
        b'{' => Some(b'}'),
        _ => None,
    }
}

fn is_quote(b: u8) -> bool {
    matches!(b, b'"' | b'\'' | b'`')
}

/// Tracks whether a forward scan currently sits inside a string literal.
#[derive(Debug, Default)]
struct Quotes {
    open: Option<(u8, bool)>,
}

impl Quotes {
    /// Feeds the byte at `i`; returns how many bytes were consumed when the
    /// byte belonged to string handling, or `None` for ordinary code bytes.
    fn step(&mut self, bytes: &[u8], i: usize) -> Option<usize> {
        let b = bytes[i];
        match self.open {
            Some((quote, triple)) => {
                if b == b'\\' {
                    return Some(2.min(bytes.len() - i));
                }
                if b == quote {
                    if !triple {
                        self.open = None;
                        return Some(1);
                    }
                    if bytes[i..].starts_with(&[quote, quote, quote]) {
                        self.open = None;
                        return Some(3);
                    }
                }
                Some(1)
            }
            None if is_quote(b) => {
                if b != b'`' && bytes[i..].starts_with(&[b, b, b]) {
                    self.open = Some((b, true));
                    Some(3)
                } else {
                    self.open = Some((b, false));
                    Some(1)
                }
            }
            None => None,
        }
    }
}

/// Returns the index of the bracket closing the one at `open_index`.
///
/// Brackets inside string literals are never counted. Single-character
/// quotes and the triple-quote variants (`"""`, `'''`) are recognized.
pub fn find_matching_close(text: &str, open_index: usize) -> Result<usize, ScanError> {
    let bytes = text.as_bytes();
    let open = *bytes.get(open_index).ok_or(ScanError::OutOfRange {
        offset: open_index,
        len: bytes.len(),
    })?;
    if closer_for(open).is_none() {
        return Err(ScanError::NotAnOpener {
            found: text[open_index..].chars().next().unwrap_or(' '),
            offset: open_index,
        });
    }

    let mut depth = 0usize;
    let mut quotes = Quotes::default();
    let mut i = open_index;
    while i < bytes.len() {
        if let Some(consumed) = quotes.step(bytes, i) {
            i += consumed;
            continue;
        }
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
        i += 1;
    }

    Err(ScanError::Unclosed {
        delimiter: open as char,
        offset: open_index,
    })
}

/// First index at or after `from` holding `needle` at bracket depth 0 and
/// outside strings. Scanning stops at an unbalanced closer.
pub fn find_top_level(text: &str, from: usize, needle: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut quotes = Quotes::default();
    let mut i = from;
    while i < bytes.len() {
        if let Some(consumed) = quotes.step(bytes, i) {
            i += consumed;
            continue;
        }
        let b = bytes[i];
        if depth == 0 && b == needle {
            return Some(i);
        }
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Splits `text` on `separator` wherever it occurs at depth 0 outside strings.
/// Pieces are trimmed; empty pieces (trailing commas) are dropped.
pub fn split_top_level(text: &str, separator: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut quotes = Quotes::default();
    let mut piece_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(consumed) = quotes.step(bytes, i) {
            i += consumed;
            continue;
        }
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b if b == separator && depth == 0 => {
                pieces.push(&text[piece_start..i]);
                piece_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    pieces.push(&text[piece_start.min(text.len())..]);
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Reads the expression that follows a keyword marker such as `input=`.
///
/// A bracketed expression runs to its matching closer; anything else runs to
/// the next comma or closer at depth 0 of the enclosing call.
pub fn expression_after_marker(text: &str, marker_end: usize) -> Result<&str, ScanError> {
    let bytes = text.as_bytes();
    let start = (marker_end..bytes.len())
        .find(|&i| !bytes[i].is_ascii_whitespace())
        .ok_or(ScanError::OutOfRange {
            offset: marker_end,
            len: bytes.len(),
        })?;

    if closer_for(bytes[start]).is_some() {
        let close = find_matching_close(text, start)?;
        return Ok(&text[start..=close]);
    }

    let end = [b',', b')']
        .iter()
        .filter_map(|&stop| find_top_level(text, start, stop))
        .min()
        .unwrap_or_else(|| {
            // No delimiter ahead: the call closer itself ends the expression.
            let mut depth = 0usize;
            let mut quotes = Quotes::default();
            let mut i = start;
            while i < bytes.len() {
                if let Some(consumed) = quotes.step(bytes, i) {
                    i += consumed;
                    continue;
                }
                match bytes[i] {
                    b'(' | b'[' | b'{' => depth += 1,
                    b')' | b']' | b'}' if depth == 0 => return i,
                    b')' | b']' | b'}' => depth -= 1,
                    b'\n' | b';' if depth == 0 => return i,
                    _ => {}
                }
                i += 1;
            }
            bytes.len()
        });
    Ok(text[start..end].trim_end())
}

/// End offset (exclusive) of the statement starting at `from`.
///
/// With [`StatementEnd::Newline`] an open bracket carries the statement onto
/// following lines; with [`StatementEnd::Semicolon`] the first depth-0 `;`
/// ends it. Either way an unbalanced closer also ends the statement.
pub fn statement_end(text: &str, from: usize, terminator: StatementEnd) -> usize {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut quotes = Quotes::default();
    let mut i = from;
    while i < bytes.len() {
        if let Some(consumed) = quotes.step(bytes, i) {
            i += consumed;
            continue;
        }
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                if depth == 0 {
                    return i;
                }
                depth -= 1;
            }
            b'\n' if depth == 0 && terminator == StatementEnd::Newline => return i,
            b';' if depth == 0 => return i,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// Replaces comment text with spaces, keeping byte offsets and newlines intact
/// so that line numbers computed on the result match the original.
pub fn mask_comments(text: &str, syntax: CommentSyntax) -> String {
    let bytes = text.as_bytes();
    let mut masked = String::with_capacity(text.len());
    let mut quotes = Quotes::default();
    let mut i = 0;

    while i < bytes.len() {
        if quotes.open.is_some() || is_quote(bytes[i]) {
            let consumed = quotes.step(bytes, i).unwrap_or(1);
            let mut end = (i + consumed).min(bytes.len());
            while !text.is_char_boundary(end) {
                end += 1;
            }
            masked.push_str(&text[i..end]);
            i = end;
            continue;
        }

        let rest = &text[i..];
        let comment_end = if rest.starts_with(syntax.line) {
            Some(rest.find('\n').map_or(text.len(), |n| i + n))
        } else {
            syntax.block.and_then(|(open, close)| {
                rest.starts_with(open).then(|| {
                    rest[open.len()..]
                        .find(close)
                        .map_or(text.len(), |n| i + open.len() + n + close.len())
                })
            })
        };

        match comment_end {
            Some(end) => {
                for c in text[i..end].chars() {
                    if c == '\n' {
                        masked.push('\n');
                    } else {
                        masked.extend(std::iter::repeat_n(' ', c.len_utf8()));
                    }
                }
                i = end;
            }
            None => {
                let c = rest.chars().next().unwrap_or(' ');
                masked.push(c);
                i += c.len_utf8();
            }
        }
    }
    masked
}

/// 1-based line number of `offset`.
pub fn line_at(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

/// Offset of the first byte of the line containing `offset`.
pub fn line_start(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    text.as_bytes()[..end]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |p| p + 1)
}

/// Offset just past the line containing `offset` (the newline itself excluded).
pub fn line_end(text: &str, offset: usize) -> usize {
    let start = offset.min(text.len());
    text[start..].find('\n').map_or(text.len(), |n| start + n)
}

/// Leading whitespace width of the line starting at `start`.
pub fn indentation(text: &str, start: usize) -> usize {
    text.as_bytes()[start.min(text.len())..]
        .iter()
        .take_while(|&&b| b == b' ' || b == b'\t')
        .count()
}

/// Strips one layer of matching quotes, including triple quotes.
pub fn unquote(text: &str) -> &str {
    let t = text.trim();
    for q in ["\"\"\"", "'''", "\"", "'", "`"] {
        if t.len() >= 2 * q.len() && t.starts_with(q) && t.ends_with(q) {
            return &t[q.len()..t.len() - q.len()];
        }
    }
    t
}

/// Collapses runs of whitespace into single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
