//! Value inference and block-style emission for new or replaced nodes.

use serde_yaml::{Mapping, Value};

use wfsync_core::FormatOptions;

/// Marker for GitHub expression syntax; such values are written verbatim.
const EXPRESSION_MARKER: &str = "${{";

/// How an override value will be written.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NewValue {
    /// Written exactly as given, unquoted, on the key line.
    Verbatim(String),
    /// Written through the YAML emitter.
    Structured(Value),
}

impl NewValue {
    /// Apply the scalar-style inference rule to override text.
    ///
    /// Simple text stays a plain scalar. Empty text, quoted text and
    /// whitespace are parsed as YAML, falling back to a string. Expressions
    /// are never interpreted.
    pub(crate) fn infer(text: &str) -> Self {
        let single_line = !text.contains('\n') && !text.contains('\r');
        if text.starts_with(EXPRESSION_MARKER) && single_line {
            return NewValue::Verbatim(text.to_owned());
        }
        let plain_candidate = !text.is_empty()
            && !text.contains('"')
            && !text.contains('\'')
            && !text.trim().is_empty()
            && !text.starts_with(EXPRESSION_MARKER);
        if plain_candidate {
            let reading = if single_line {
                read_plain(text)
            } else {
                PlainReading::Unwritable
            };
            return match reading {
                PlainReading::Scalar => NewValue::Verbatim(text.to_owned()),
                PlainReading::Collection(value) => NewValue::Structured(value),
                PlainReading::Unwritable => NewValue::Structured(Value::String(text.to_owned())),
            };
        }
        match serde_yaml::from_str::<Value>(text) {
            Ok(value) => NewValue::Structured(value),
            Err(_) => NewValue::Structured(Value::String(text.to_owned())),
        }
    }
}

/// How unquoted override text reads back after `key: `.
enum PlainReading {
    /// Same string, number, boolean or null: written as is.
    Scalar,
    /// Flow collection (`[a, b]`, `{x: 1}`): re-emitted in block style.
    Collection(Value),
    /// Would lose characters, break the line or pick up a tag: quoted.
    Unwritable,
}

fn read_plain(text: &str) -> PlainReading {
    if text.contains(" #") || text.contains("\t#") {
        return PlainReading::Unwritable;
    }
    let probe = format!("k: {text}");
    let Ok(Value::Mapping(map)) = serde_yaml::from_str::<Value>(&probe) else {
        return PlainReading::Unwritable;
    };
    match map.get("k") {
        Some(Value::String(s)) if s == text => PlainReading::Scalar,
        Some(Value::Null) if matches!(text, "~" | "null" | "Null" | "NULL") => PlainReading::Scalar,
        Some(Value::Bool(_) | Value::Number(_)) => PlainReading::Scalar,
        Some(value @ (Value::Sequence(_) | Value::Mapping(_))) => {
            PlainReading::Collection(value.clone())
        }
        _ => PlainReading::Unwritable,
    }
}

fn pad(width: usize) -> String {
    " ".repeat(width)
}

/// Emitter for new content, shaped by the document's [`FormatOptions`].
pub(crate) struct Emitter<'a> {
    pub format: &'a FormatOptions,
}

impl Emitter<'_> {
    /// Lines for `key: value` at `indent`. `key` is written as given and
    /// `comment` (with its leading whitespace) is appended to a single-line
    /// scalar.
    pub(crate) fn entry(
        &self,
        indent: usize,
        key: &str,
        value: &NewValue,
        comment: &str,
    ) -> Result<Vec<String>, serde_yaml::Error> {
        let mut out = Vec::new();
        match value {
            NewValue::Verbatim(text) => out.push(format!("{}{key}: {text}{comment}", pad(indent))),
            NewValue::Structured(value) => {
                self.structured_entry(indent, key, value, &mut out)?;
                if out.len() == 1 && !comment.is_empty() && !is_block_scalar_header(&out[0]) {
                    out[0].push_str(comment);
                }
            }
        }
        Ok(out)
    }

    /// Lines for every pair of `map`, keys at `indent`.
    pub(crate) fn mapping(
        &self,
        indent: usize,
        map: &Mapping,
        out: &mut Vec<String>,
    ) -> Result<(), serde_yaml::Error> {
        for (key, value) in map {
            let key = inline_scalar(key)?;
            self.structured_entry(indent, &key, value, out)?;
        }
        Ok(())
    }

    fn structured_entry(
        &self,
        indent: usize,
        key: &str,
        value: &Value,
        out: &mut Vec<String>,
    ) -> Result<(), serde_yaml::Error> {
        match value {
            Value::Mapping(map) if !map.is_empty() => {
                out.push(format!("{}{key}:", pad(indent)));
                self.mapping(indent + self.format.mapping_indent, map, out)
            }
            Value::Sequence(seq) if !seq.is_empty() => {
                out.push(format!("{}{key}:", pad(indent)));
                self.sequence(indent, seq, out)
            }
            Value::Null => {
                out.push(format!("{}{key}:", pad(indent)));
                Ok(())
            }
            scalar => {
                let lines = scalar_lines(scalar)?;
                let mut lines = lines.into_iter();
                let head = lines.next().unwrap_or_default();
                out.push(format!("{}{key}: {head}", pad(indent)));
                out.extend(lines.map(|l| format!("{}{l}", pad(indent))));
                Ok(())
            }
        }
    }

    /// Items of `seq` under a parent key at `parent_indent`.
    fn sequence(
        &self,
        parent_indent: usize,
        seq: &[Value],
        out: &mut Vec<String>,
    ) -> Result<(), serde_yaml::Error> {
        let dash_col = parent_indent + self.format.sequence_dash_offset;
        let content_col = (parent_indent + self.format.sequence_indent).max(dash_col + 2);
        let marker = format!("{}-{}", pad(dash_col), pad(content_col - dash_col - 1));
        for item in seq {
            let mut lines = Vec::new();
            match item {
                Value::Mapping(map) if !map.is_empty() => self.mapping(content_col, map, &mut lines)?,
                Value::Sequence(inner) if !inner.is_empty() => {
                    let nested_parent = content_col - self.format.sequence_dash_offset.min(content_col);
                    self.sequence(nested_parent, inner, &mut lines)?;
                }
                Value::Null => {
                    out.push(format!("{}-", pad(dash_col)));
                    continue;
                }
                scalar => {
                    let mut scalar = scalar_lines(scalar)?.into_iter();
                    let head = scalar.next().unwrap_or_default();
                    lines.push(format!("{}{head}", pad(content_col)));
                    lines.extend(scalar.map(|l| format!("{}{l}", pad(content_col))));
                }
            }
            let mut lines = lines.into_iter();
            if let Some(first) = lines.next() {
                let body = first.get(content_col..).unwrap_or(first.trim_start());
                out.push(format!("{marker}{body}"));
            }
            out.extend(lines);
        }
        Ok(())
    }
}

fn is_block_scalar_header(line: &str) -> bool {
    let trimmed = line.trim_end();
    trimmed.ends_with('|')
        || trimmed.ends_with('>')
        || trimmed.ends_with("|-")
        || trimmed.ends_with(">-")
        || trimmed.ends_with("|+")
        || trimmed.ends_with(">+")
}

/// Scalar rendered by serde_yaml; multi-line strings come back as a block
/// scalar whose continuation lines are indented relative to column zero.
fn scalar_lines(value: &Value) -> Result<Vec<String>, serde_yaml::Error> {
    let rendered = serde_yaml::to_string(value)?;
    Ok(rendered
        .trim_end_matches('\n')
        .split('\n')
        .map(str::to_owned)
        .collect())
}

/// A scalar forced onto a single line (mapping keys).
fn inline_scalar(value: &Value) -> Result<String, serde_yaml::Error> {
    match value {
        Value::String(s) if s.contains('\n') => serde_yaml::to_string(&Value::String(s.replace('\n', " ")))
            .map(|r| r.trim_end().to_owned()),
        other => Ok(scalar_lines(other)?.join(" ")),
    }
}
