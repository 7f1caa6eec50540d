//! Formatting-preserving YAML document.
//!
//! A [`Document`] keeps the source lines verbatim. Setting a value at a
//! dotted path splices new lines in place of the addressed entry (or at the
//! end of the parent mapping when the key is missing); every other line is
//! left exactly as it was, comments and quoting included.
//!
//! Only block-style mappings are descended. An intermediate flow mapping
//! (`key: {}` or `key: {a: 1}`) or null value is first rewritten in block
//! style. Anchors, aliases and multi-document streams are not supported.

use serde_yaml::Value;

use wfsync_core::{FormatOptions, Override};

use crate::emit::{Emitter, NewValue};
use crate::error::PatchError;
use crate::scan::{
    flow_depth, indent_of, is_blank, is_comment, is_content, is_document_end, is_prologue,
    is_seq_item, opens_kept_block_scalar, parse_key, split_comment,
};

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// A YAML document that can be patched without disturbing untouched text.
#[derive(Debug, Clone)]
pub struct Document {
    lines: Vec<String>,
    ending: LineEnding,
    trailing_newline: bool,
    /// The source started with a byte order mark.
    bom: bool,
    format: FormatOptions,
}

/// Lines `start..end` forming the entries of one block mapping whose keys
/// sit at column `indent`.
#[derive(Debug, Clone, Copy)]
struct Region {
    start: usize,
    end: usize,
    indent: usize,
}

/// A `key:` line and the extent of its value.
#[derive(Debug, Clone, Copy)]
struct Entry {
    line: usize,
    indent: usize,
    /// Byte offset of the separating colon within the line.
    colon: usize,
    /// One past the last line owned by the value.
    end: usize,
}

enum Located {
    Existing(Entry),
    Missing { at: usize, indent: usize, depth: usize },
    ExpandEntry(Entry),
    ExpandRoot { first: usize, end: usize },
}

enum Root {
    Block(Region),
    Flow { first: usize, end: usize },
    Other,
}

impl Document {
    /// Parse `text`, rejecting empty, null, multi-document and invalid input.
    pub fn parse(text: &str, format: FormatOptions) -> Result<Self, PatchError> {
        let (bom, text) = match text.strip_prefix(BOM) {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        if text.trim().is_empty() {
            return Err(PatchError::Empty);
        }
        let value: Value = serde_yaml::from_str(text).map_err(PatchError::Parse)?;
        if value.is_null() {
            return Err(PatchError::Empty);
        }

        let ending = if text.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        };
        let trailing_newline = text.ends_with('\n');
        let body = text.strip_suffix('\n').unwrap_or(text);
        let lines = body
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_owned())
            .collect();

        Ok(Self {
            lines,
            ending,
            trailing_newline,
            bom,
            format,
        })
    }

    /// Formatting applied to nodes this document creates.
    pub fn format(&self) -> &FormatOptions {
        &self.format
    }

    /// Serialize back to text with the original line ending style and byte
    /// order mark.
    pub fn render(&self) -> String {
        let body = self.body();
        if self.bom {
            format!("{BOM}{body}")
        } else {
            body
        }
    }

    /// Semantic view of the current text.
    pub fn to_value(&self) -> Result<Value, PatchError> {
        serde_yaml::from_str(&self.body()).map_err(PatchError::Parse)
    }

    fn body(&self) -> String {
        let ending = self.ending.as_str();
        let mut out = self.lines.join(ending);
        if self.trailing_newline {
            out.push_str(ending);
        }
        out
    }

    /// Set the value at `ov.path()` using the scalar-style inference rule.
    ///
    /// On error the document is left unchanged.
    pub fn set(&mut self, ov: &Override) -> Result<(), PatchError> {
        let snapshot = self.lines.clone();
        let result = self.set_inner(ov);
        if let Err(err) = result {
            self.lines = snapshot;
            return Err(err);
        }
        if let Err(source) = serde_yaml::from_str::<Value>(&self.body()) {
            self.lines = snapshot;
            return Err(PatchError::Invalid {
                path: ov.path().to_owned(),
                source,
            });
        }
        Ok(())
    }

    fn set_inner(&mut self, ov: &Override) -> Result<(), PatchError> {
        let segments = ov.segments();
        let value = NewValue::infer(ov.value());
        let emit_err = |source| PatchError::Emit {
            path: ov.path().to_owned(),
            source,
        };

        // Each expansion turns one flow/null node into block style, so the
        // walk settles after at most one pass per segment.
        for _ in 0..=segments.len() {
            match self.locate(segments)? {
                Located::Existing(entry) => {
                    let new_lines = self.replacement(entry, &value).map_err(emit_err)?;
                    self.lines.splice(entry.line..entry.end, new_lines);
                    return Ok(());
                }
                Located::Missing { at, indent, depth } => {
                    let new_lines = self
                        .new_path(indent, &segments[depth..], &value)
                        .map_err(emit_err)?;
                    self.lines.splice(at..at, new_lines);
                    return Ok(());
                }
                Located::ExpandEntry(entry) => {
                    let path = ov.path().to_owned();
                    self.expand_entry(entry, &path)?;
                }
                Located::ExpandRoot { first, end } => self.expand_root(first, end, ov.path())?,
            }
        }
        Err(PatchError::NotAMapping {
            path: ov.path().to_owned(),
        })
    }

    // -----------------------------------------------------------------------
    // Walking
    // -----------------------------------------------------------------------

    fn locate(&self, segments: &[String]) -> Result<Located, PatchError> {
        let mut region = match self.root() {
            Root::Block(region) => region,
            Root::Flow { first, end } => return Ok(Located::ExpandRoot { first, end }),
            Root::Other => {
                return Err(PatchError::NotAMapping {
                    path: "(document root)".to_owned(),
                })
            }
        };

        for (depth, segment) in segments.iter().enumerate() {
            let Some(entry) = self.find_key(region, segment) else {
                return Ok(Located::Missing {
                    at: self.insertion_point(region),
                    indent: region.indent,
                    depth,
                });
            };
            if depth + 1 == segments.len() {
                return Ok(Located::Existing(entry));
            }

            let (value, _) = split_comment(self.rest(entry));
            let value = value.trim();
            let not_a_mapping = || PatchError::NotAMapping {
                path: segments[..=depth].join("."),
            };
            if value.starts_with('{') || matches!(value, "null" | "Null" | "NULL" | "~") {
                return Ok(Located::ExpandEntry(entry));
            }
            if !value.is_empty() {
                return Err(not_a_mapping());
            }

            let first_child = (entry.line + 1..entry.end).find(|&i| is_content(&self.lines[i]));
            region = match first_child {
                None => Region {
                    start: entry.end,
                    end: entry.end,
                    indent: entry.indent + self.format.mapping_indent,
                },
                Some(i) => {
                    let indent = indent_of(&self.lines[i]);
                    let body = &self.lines[i][indent..];
                    if is_seq_item(body) || parse_key(body).is_none() {
                        return Err(not_a_mapping());
                    }
                    Region {
                        start: i,
                        end: entry.end,
                        indent,
                    }
                }
            };
        }
        // `segments` is never empty, so the loop always returns.
        Err(PatchError::NotAMapping {
            path: segments.join("."),
        })
    }

    fn root(&self) -> Root {
        let end = self
            .lines
            .iter()
            .position(|l| is_document_end(l))
            .unwrap_or(self.lines.len());
        let start = self.lines[..end]
            .iter()
            .position(|l| !is_prologue(l) && !is_blank(l) && !is_comment(l))
            .unwrap_or(end);

        let Some(first) = (start..end).find(|&i| is_content(&self.lines[i])) else {
            return Root::Block(Region {
                start,
                end,
                indent: 0,
            });
        };
        let indent = indent_of(&self.lines[first]);
        let body = &self.lines[first][indent..];
        if body.starts_with('{') {
            return Root::Flow { first, end };
        }
        if is_seq_item(body) || parse_key(body).is_none() {
            return Root::Other;
        }
        Root::Block(Region {
            start: first,
            end,
            indent,
        })
    }

    /// Scans entry by entry, so lines inside a sibling's value are never
    /// taken for keys.
    fn find_key(&self, region: Region, key: &str) -> Option<Entry> {
        let mut i = region.start;
        while i < region.end {
            let line = &self.lines[i];
            if !is_content(line) || indent_of(line) != region.indent {
                i += 1;
                continue;
            }
            let body = &line[region.indent..];
            let Some(k) = parse_key(body).filter(|_| !is_seq_item(body)) else {
                i += 1;
                continue;
            };
            let colon = region.indent + k.colon;
            let end = self.entry_end(i, region.indent, colon, region.end);
            if k.key == key {
                return Some(Entry {
                    line: i,
                    indent: region.indent,
                    colon,
                    end,
                });
            }
            i = end;
        }
        None
    }

    /// One past the last line belonging to the value of the key at `line`.
    ///
    /// A flow collection opened after the colon owns every line up to its
    /// closing bracket, whatever the indentation. Otherwise deeper lines and
    /// same-column sequence items belong to the value. Trailing blank lines
    /// and comments at or left of the key's column are left to whatever
    /// follows.
    fn entry_end(&self, line: usize, indent: usize, colon: usize, limit: usize) -> usize {
        let (value, _) = split_comment(&self.lines[line][colon + 1..]);
        let value = value.trim_start();
        let mut open = if value.starts_with(['[', '{']) {
            flow_depth(value)
        } else {
            0
        };
        let mut end = line + 1;
        for i in line + 1..limit {
            let text = &self.lines[i];
            if open > 0 {
                open += flow_depth(text);
                end = i + 1;
                continue;
            }
            if is_blank(text) {
                continue;
            }
            let ind = indent_of(text);
            if is_comment(text) {
                if ind > indent {
                    end = i + 1;
                }
                continue;
            }
            if ind > indent || (ind == indent && is_seq_item(&text[ind..])) {
                end = i + 1;
                continue;
            }
            break;
        }
        end
    }

    /// New keys go after the last line owned by the region's entries, and
    /// after the trailing blank lines of a keep-chomped block scalar.
    fn insertion_point(&self, region: Region) -> usize {
        let Some(last) = (region.start..region.end).rev().find(|&i| {
            let line = &self.lines[i];
            is_content(line) || (is_comment(line) && indent_of(line) > region.indent)
        }) else {
            return region.start;
        };
        let mut at = last + 1;
        if self.in_kept_block_scalar(region.start, last) {
            while at < self.lines.len() && is_blank(&self.lines[at]) {
                at += 1;
            }
        }
        at
    }

    /// Whether line `last` is part of a `|+`/`>+` block scalar opened at or
    /// after `start`.
    fn in_kept_block_scalar(&self, start: usize, last: usize) -> bool {
        let mut open: Option<usize> = None;
        for line in &self.lines[start..=last] {
            if !is_content(line) {
                continue;
            }
            let ind = indent_of(line);
            if open.is_some_and(|col| ind <= col) {
                open = None;
            }
            if open.is_none() && opens_kept_block_scalar(&line[ind..]) {
                open = Some(ind);
            }
        }
        open.is_some()
    }

    fn rest(&self, entry: Entry) -> &str {
        &self.lines[entry.line][entry.colon + 1..]
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    fn emitter(&self) -> Emitter<'_> {
        Emitter {
            format: &self.format,
        }
    }

    /// Lines replacing `entry` with `key: value`, keeping the key's original
    /// spelling and, for single-line scalars, its trailing comment.
    fn replacement(&self, entry: Entry, value: &NewValue) -> Result<Vec<String>, serde_yaml::Error> {
        let line = &self.lines[entry.line];
        let key = &line[entry.indent..entry.colon];
        let (old_value, comment) = split_comment(&line[entry.colon + 1..]);
        let old_value = old_value.trim();
        let old_is_inline_scalar =
            entry.end == entry.line + 1 && !old_value.starts_with(['|', '>', '{', '[']);
        let comment = if old_is_inline_scalar { comment } else { "" };
        self.emitter().entry(entry.indent, key, value, comment)
    }

    /// `a:` / `  b:` / `    c: value` for the missing tail of a path.
    fn new_path(
        &self,
        indent: usize,
        segments: &[String],
        value: &NewValue,
    ) -> Result<Vec<String>, serde_yaml::Error> {
        let mut lines = Vec::with_capacity(segments.len());
        let mut indent = indent;
        let Some((last, parents)) = segments.split_last() else {
            return Ok(lines);
        };
        for segment in parents {
            lines.push(format!("{}{}:", " ".repeat(indent), key_text(segment)?));
            indent += self.format.mapping_indent;
        }
        lines.extend(self.emitter().entry(indent, &key_text(last)?, value, "")?);
        Ok(lines)
    }

    /// Rewrite `key: {…}` or `key: null` as a block mapping.
    fn expand_entry(&mut self, entry: Entry, path: &str) -> Result<(), PatchError> {
        let line = &self.lines[entry.line];
        let key = line[entry.indent..entry.colon].to_owned();
        let (value, comment) = split_comment(&line[entry.colon + 1..]);
        let comment = comment.to_owned();

        let mut text = value.trim().to_owned();
        for i in entry.line + 1..entry.end {
            text.push('\n');
            text.push_str(&self.lines[i]);
        }
        let parsed: Value = serde_yaml::from_str(&text).map_err(|source| PatchError::Invalid {
            path: path.to_owned(),
            source,
        })?;

        let mut new_lines = vec![format!("{}{key}:{comment}", " ".repeat(entry.indent))];
        match parsed {
            Value::Mapping(map) => self
                .emitter()
                .mapping(entry.indent + self.format.mapping_indent, &map, &mut new_lines)
                .map_err(|source| PatchError::Emit {
                    path: path.to_owned(),
                    source,
                })?,
            Value::Null => {}
            _ => {
                return Err(PatchError::NotAMapping {
                    path: path.to_owned(),
                })
            }
        }
        self.lines.splice(entry.line..entry.end, new_lines);
        Ok(())
    }

    /// Rewrite a flow-style root mapping (`{}` or `{a: 1}`) in block style.
    fn expand_root(&mut self, first: usize, end: usize, path: &str) -> Result<(), PatchError> {
        let last = (first..end)
            .rev()
            .find(|&i| is_content(&self.lines[i]))
            .unwrap_or(first);
        let mut text = String::new();
        let mut comments = Vec::new();
        for i in first..=last {
            let (value, comment) = split_comment(&self.lines[i]);
            text.push_str(value);
            text.push('\n');
            if !comment.trim().is_empty() {
                comments.push(comment.trim_start().to_owned());
            }
        }
        let map = match serde_yaml::from_str::<Value>(&text) {
            Ok(Value::Mapping(map)) => map,
            Ok(_) => {
                return Err(PatchError::NotAMapping {
                    path: path.to_owned(),
                })
            }
            Err(source) => {
                return Err(PatchError::Invalid {
                    path: path.to_owned(),
                    source,
                })
            }
        };
        let mut new_lines = comments;
        self.emitter()
            .mapping(0, &map, &mut new_lines)
            .map_err(|source| PatchError::Emit {
                path: path.to_owned(),
                source,
            })?;
        self.lines.splice(first..=last, new_lines);
        Ok(())
    }
}

/// A path segment as a mapping key; quoted only when plain would not parse
/// back to the same string.
fn key_text(segment: &str) -> Result<String, serde_yaml::Error> {
    let probe = format!("{segment}: x");
    let plain_ok = parse_key(segment).is_none()
        && matches!(
            serde_yaml::from_str::<Value>(&probe),
            Ok(Value::Mapping(ref m)) if m.contains_key(segment)
        );
    if plain_ok {
        return Ok(segment.to_owned());
    }
    Ok(serde_yaml::to_string(&Value::String(segment.to_owned()))?
        .trim_end()
        .to_owned())
}
