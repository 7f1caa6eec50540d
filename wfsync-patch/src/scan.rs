//! Line-level classification of block-style YAML.
//!
//! The patcher never re-parses untouched text; it only needs to recognise
//! indentation, comments, sequence items and `key:` lines.

/// Number of leading spaces.
pub(crate) fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

pub(crate) fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

pub(crate) fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// Neither blank nor a comment-only line.
pub(crate) fn is_content(line: &str) -> bool {
    !is_blank(line) && !is_comment(line)
}

/// `body` is the line with indentation removed.
pub(crate) fn is_seq_item(body: &str) -> bool {
    body == "-" || body.starts_with("- ") || body.starts_with("-\t")
}

/// `---` document start (optionally followed by a comment) or a `%` directive.
pub(crate) fn is_prologue(line: &str) -> bool {
    let trimmed = line.trim_end();
    trimmed == "---" || trimmed.starts_with("--- #") || line.starts_with('%')
}

/// `...` document end marker.
pub(crate) fn is_document_end(line: &str) -> bool {
    line.trim_end() == "..."
}

/// A `key:` found at the start of a line body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyLine {
    /// Unquoted key text.
    pub key: String,
    /// Byte offset of the separating `:` within the body.
    pub colon: usize,
}

/// Recognise `key:`, `"key":` or `'key':` at the start of `body`.
///
/// Returns `None` for sequence items, comments, flow collections, complex
/// keys and anything that is not a mapping entry.
pub(crate) fn parse_key(body: &str) -> Option<KeyLine> {
    let first = body.chars().next()?;
    match first {
        '"' => {
            let (key, close) = scan_double_quoted(body)?;
            separator_after(body, close + 1).map(|colon| KeyLine { key, colon })
        }
        '\'' => {
            let (key, close) = scan_single_quoted(body)?;
            separator_after(body, close + 1).map(|colon| KeyLine { key, colon })
        }
        '-' if is_seq_item(body) => None,
        '?' | '#' | '[' | '{' | '&' | '*' | '!' | '|' | '>' | '%' | '@' | '`' => None,
        _ => {
            let bytes = body.as_bytes();
            for (i, &b) in bytes.iter().enumerate() {
                if b == b'#' && i > 0 && matches!(bytes[i - 1], b' ' | b'\t') {
                    return None;
                }
                if b == b':' && matches!(bytes.get(i + 1), None | Some(b' ') | Some(b'\t')) {
                    let key = body[..i].trim_end();
                    if key.is_empty() {
                        return None;
                    }
                    return Some(KeyLine {
                        key: key.to_owned(),
                        colon: i,
                    });
                }
            }
            None
        }
    }
}

/// Position of `:` after optional spaces starting at `from`, if it is a
/// mapping separator.
fn separator_after(body: &str, from: usize) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut i = from;
    while bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    if bytes.get(i) == Some(&b':') && matches!(bytes.get(i + 1), None | Some(b' ') | Some(b'\t')) {
        Some(i)
    } else {
        None
    }
}

/// Returns the unescaped content and the byte index of the closing quote.
fn scan_double_quoted(body: &str) -> Option<(String, usize)> {
    let mut out = String::new();
    let mut chars = body.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((out, i)),
            '\\' => {
                let (_, escaped) = chars.next()?;
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
            }
            other => out.push(other),
        }
    }
    None
}

fn scan_single_quoted(body: &str) -> Option<(String, usize)> {
    let mut out = String::new();
    let mut chars = body.char_indices().skip(1).peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
                out.push('\'');
                continue;
            }
            return Some((out, i));
        }
        out.push(c);
    }
    None
}

/// Split the text after a `key:` into value text and trailing comment.
///
/// The comment part keeps its leading whitespace so it can be re-appended
/// verbatim. Quote-aware: `#` inside quotes is not a comment.
pub(crate) fn split_comment(rest: &str) -> (&str, &str) {
    let bytes = rest.as_bytes();
    for (i, b) in unquoted(rest) {
        if b == b'#' && (i == 0 || matches!(bytes[i - 1], b' ' | b'\t')) {
            let value = rest[..i].trim_end();
            return (value, &rest[value.len()..]);
        }
    }
    (rest, "")
}

/// Net count of flow brackets opened by `text`, ignoring quoted scalars and
/// any trailing comment.
pub(crate) fn flow_depth(text: &str) -> isize {
    let (value, _) = split_comment(text);
    unquoted(value)
        .into_iter()
        .map(|(_, b)| match b {
            b'[' | b'{' => 1,
            b']' | b'}' => -1,
            _ => 0,
        })
        .sum()
}

/// `true` when `body` (a line without its indentation) opens a block scalar
/// with keep chomping (`|+`, `>+`); its trailing blank lines are content.
pub(crate) fn opens_kept_block_scalar(body: &str) -> bool {
    let mut body = body;
    while is_seq_item(body) {
        body = body[1..].trim_start();
    }
    let value = match parse_key(body) {
        Some(k) => &body[k.colon + 1..],
        None => body,
    };
    let header = split_comment(value).0.trim();
    header.starts_with(['|', '>']) && header.contains('+')
}

/// Byte positions of `text` outside quoted scalars.
///
/// A quote only opens a scalar where one can start: at the beginning of the
/// text or after a flow indicator, `:`, `-` or `?`. An apostrophe inside
/// plain text (`Don't`) is ordinary content.
fn unquoted(text: &str) -> Vec<(usize, u8)> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(b'"') if b == b'\\' => {
                i += 2;
                continue;
            }
            Some(b'\'') if b == b'\'' && bytes.get(i + 1) == Some(&b'\'') => {
                i += 2;
                continue;
            }
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if matches!(b, b'"' | b'\'') && opens_quote(&bytes[..i]) => quote = Some(b),
            None => out.push((i, b)),
        }
        i += 1;
    }
    out
}

fn opens_quote(before: &[u8]) -> bool {
    before
        .iter()
        .rev()
        .find(|b| !matches!(b, b' ' | b'\t'))
        .map_or(true, |b| matches!(b, b'[' | b'{' | b',' | b':' | b'-' | b'?'))
}
