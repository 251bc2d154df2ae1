//! Text codec between `.inp` section blocks and [`Table`]s.
//!
//! [`parse_sections`] splits a file into `[SECTION]` blocks, then
//! [`decode_section`] and [`encode_section`] convert a single block using
//! the layout declared in the section catalog.

mod custom;
mod text;

use std::collections::HashMap;

use swmm_core::table::{Table, Value};
use swmm_core::{DiagnosticIssue, Feedback, Severity, SwmmResult};

use crate::sections::{Encoding, FieldType, Section, DESCRIPTION};

/// Minimum field width used when writing `.inp` text.
pub const MIN_FIELD_WIDTH: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    pub line_no: usize,
    pub text: String,
}

/// The lines of one `[NAME]` block. Repeated headers are merged.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionBlock {
    pub name: String,
    pub line_no: usize,
    pub lines: Vec<SourceLine>,
}

/// Splits `.inp` text into section blocks. Lines before the first header
/// and blank lines are discarded.
pub fn parse_sections(text: &str) -> Vec<SectionBlock> {
    let mut blocks: Vec<SectionBlock> = Vec::new();
    let mut current: Option<usize> = None;

    for (i, line) in text.trim_start_matches('\u{feff}').lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(name) = section_header(trimmed) {
            let existing = blocks.iter().position(|b| b.name.eq_ignore_ascii_case(name));
            current = Some(match existing {
                Some(idx) => idx,
                None => {
                    blocks.push(SectionBlock {
                        name: name.to_string(),
                        line_no: i + 1,
                        lines: Vec::new(),
                    });
                    blocks.len() - 1
                }
            });
            continue;
        }
        if let Some(idx) = current {
            blocks[idx].lines.push(SourceLine {
                line_no: i + 1,
                text: line.trim_end().to_string(),
            });
        }
    }
    blocks
}

fn section_header(line: &str) -> Option<&str> {
    let inner = line.strip_prefix('[')?;
    let end = inner.find(']')?;
    Some(inner[..end].trim())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    /// Byte offset of the token (including an opening quote) in its line.
    pub start: usize,
}

/// Whitespace tokenizer; double-quoted tokens keep their spaces and lose
/// the quotes.
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut text = String::new();
        if c == '"' {
            chars.next();
            for (_, ch) in chars.by_ref() {
                if ch == '"' {
                    break;
                }
                text.push(ch);
            }
        }
        while let Some(&(_, ch)) = chars.peek() {
            if ch.is_whitespace() {
                break;
            }
            if ch != '"' {
                text.push(ch);
            }
            chars.next();
        }
        tokens.push(Token { text, start });
    }
    tokens
}

/// Drops an unquoted `;` comment from the end of a data line.
pub fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => return &line[..i],
            _ => {}
        }
    }
    line
}

/// A data line with its tokens and the `;` description preceding it.
#[derive(Debug, Clone, PartialEq)]
pub struct DataLine {
    pub line_no: usize,
    pub raw: String,
    pub tokens: Vec<Token>,
    pub description: Option<String>,
}

impl DataLine {
    pub fn key(&self) -> &str {
        self.tokens.first().map(|t| t.text.as_str()).unwrap_or("")
    }

    pub fn token(&self, i: usize) -> Option<&str> {
        self.tokens.get(i).map(|t| t.text.as_str())
    }

    /// Raw text from token `i` to the end of the line.
    pub fn rest_from(&self, i: usize) -> Option<&str> {
        self.tokens.get(i).map(|t| self.raw[t.start..].trim())
    }
}

/// Converts block lines into data lines. Free-text sections keep every
/// line (single `;` comments included) verbatim.
pub fn data_lines(lines: &[SourceLine], free_text: bool) -> Vec<DataLine> {
    let mut out = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    for line in lines {
        let trimmed = line.text.trim();
        if trimmed.starts_with(";;") {
            continue;
        }
        if free_text {
            out.push(DataLine {
                line_no: line.line_no,
                raw: trimmed.to_string(),
                tokens: tokenize(trimmed),
                description: None,
            });
            continue;
        }
        if let Some(comment) = trimmed.strip_prefix(';') {
            let comment = comment.trim();
            if !comment.is_empty() {
                pending.push(comment.to_string());
            }
            continue;
        }
        let raw = strip_comment(trimmed).trim_end().to_string();
        if raw.is_empty() {
            continue;
        }
        let description = if pending.is_empty() {
            None
        } else {
            Some(pending.join("\n"))
        };
        pending.clear();
        out.push(DataLine {
            line_no: line.line_no,
            tokens: tokenize(&raw),
            raw,
            description,
        });
    }
    out
}

/// Decoding state shared by every layout: section name for messages and
/// the description side table.
pub(crate) struct DecodeCtx<'a> {
    pub section: &'a str,
    pub feedback: &'a mut dyn Feedback,
    descriptions: Vec<(String, String)>,
}

impl<'a> DecodeCtx<'a> {
    fn new(section: &'a str, feedback: &'a mut dyn Feedback) -> Self {
        Self {
            section,
            feedback,
            descriptions: Vec::new(),
        }
    }

    pub fn warn(&mut self, line_no: usize, msg: &str) {
        let text = format!("[{}] {}", self.section.to_uppercase(), msg);
        self.feedback
            .push_issue(DiagnosticIssue::new(Severity::Warning, "parse", text).with_line(line_no));
    }

    /// First description per key wins.
    pub fn describe(&mut self, key: &str, description: Option<&String>) {
        if let Some(desc) = description {
            if !self.descriptions.iter().any(|(k, _)| k == key) {
                self.descriptions.push((key.to_string(), desc.clone()));
            }
        }
    }

    /// Writes descriptions onto the first row carrying each key.
    fn attach_descriptions(&self, table: &mut Table) {
        if self.descriptions.is_empty() || !table.has_column(DESCRIPTION) {
            return;
        }
        let mut first_rows: HashMap<String, usize> = HashMap::new();
        for row in 0..table.len() {
            first_rows.entry(table.key(row)).or_insert(row);
        }
        for (key, desc) in &self.descriptions {
            if let Some(&row) = first_rows.get(key) {
                table.set(row, DESCRIPTION, desc.clone());
            }
        }
    }

    /// Converts one token according to its field type. Numbers that fail to
    /// parse are kept as text with a warning; integers fall back to
    /// truncating a float.
    pub fn value(&mut self, ty: FieldType, token: &str, field: &str, line_no: usize) -> Value {
        if token.is_empty() {
            return Value::Null;
        }
        match ty {
            FieldType::Text | FieldType::Rest => Value::text(token),
            FieldType::Real => match token.parse::<f64>() {
                Ok(v) => Value::Float(v),
                Err(_) => {
                    self.warn(
                        line_no,
                        &format!("expected a number for {}, found '{}'", field, token),
                    );
                    Value::text(token)
                }
            },
            FieldType::Int | FieldType::OptInt => match token.parse::<i64>() {
                Ok(v) => Value::Int(v),
                Err(_) => match token.parse::<f64>() {
                    Ok(v) => {
                        self.warn(
                            line_no,
                            &format!("converted {} to an integer for {}", token, field),
                        );
                        Value::Int(v.trunc() as i64)
                    }
                    Err(_) => {
                        self.warn(
                            line_no,
                            &format!("expected an integer for {}, found '{}'", field, token),
                        );
                        Value::text(token)
                    }
                },
            },
        }
    }
}

/// Decodes one section block. Returns the section table, followed by the
/// coordinate table for Transects.
pub fn decode_section(
    section: &Section,
    lines: &[SourceLine],
    feedback: &mut dyn Feedback,
) -> SwmmResult<Vec<Table>> {
    let data = data_lines(lines, section.is_free_text());
    let mut ctx = DecodeCtx::new(section.name, feedback);
    let mut tables = match section.encoding {
        Encoding::NoKeywords(fields) | Encoding::Geometry(fields) => {
            vec![text::decode_fields(section, fields, &data, &mut ctx)]
        }
        Encoding::Keywords(layout) => vec![text::decode_keywords(section, layout, &data, &mut ctx)],
        Encoding::Wide(layout) => vec![text::decode_wide(section, layout, &data, &mut ctx)],
        Encoding::Custom(kind) => custom::decode(section, kind, &data, &mut ctx)?,
    };
    if let Some(first) = tables.first_mut() {
        ctx.attach_descriptions(first);
    }
    Ok(tables)
}

/// Encodes a section table as `.inp` text (header, rule, rows). Transects
/// take their coordinates from `companion`. Empty tables encode to an
/// empty string.
pub fn encode_section(section: &Section, table: &Table, companion: Option<&Table>) -> String {
    if table.is_empty() {
        return String::new();
    }
    let mut sorted;
    let table = if section.no_sort {
        table
    } else {
        sorted = table.clone();
        sorted.sort_by_key();
        &sorted
    };

    let width = field_width(table);
    let mut out = format!("[{}]\n", section.header());
    match section.encoding {
        Encoding::NoKeywords(fields) | Encoding::Geometry(fields) => {
            text::encode_fields(section, fields, table, width, &mut out)
        }
        Encoding::Keywords(layout) => text::encode_keywords(layout, table, width, &mut out),
        Encoding::Wide(layout) => text::encode_wide(layout, table, width, &mut out),
        Encoding::Custom(kind) => custom::encode(kind, table, companion, width, &mut out),
    }
    out.push('\n');
    out
}

/// `max(20, longest key + 1)`
pub fn field_width(table: &Table) -> usize {
    let longest = (0..table.len())
        .map(|i| quoted(&table.key(i)).chars().count())
        .max()
        .unwrap_or(0);
    MIN_FIELD_WIDTH.max(longest + 1)
}

/// Quotes text containing whitespace.
pub fn quoted(text: &str) -> String {
    if text.chars().any(char::is_whitespace) && !text.starts_with('"') {
        format!("\"{}\"", text)
    } else {
        text.to_string()
    }
}

/// One output cell.
#[derive(Debug, Clone)]
pub(crate) struct Cell {
    text: String,
}

impl Cell {
    pub fn new(value: &Value, ty: FieldType) -> Self {
        let text = match (value, ty) {
            (Value::Text(s), FieldType::Rest) => s.trim().to_string(),
            (Value::Text(s), _) => quoted(s.trim()),
            (v, _) => v.to_text(),
        };
        Self { text }
    }

    pub fn text(s: &str) -> Self {
        Self { text: quoted(s) }
    }

    /// A cell written as-is even when blank.
    pub fn literal(s: &str) -> Self {
        Self {
            text: s.to_string(),
        }
    }

    fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

/// Pads every cell but the last to `width`. Trailing blanks are dropped;
/// interior blanks become `0`.
pub(crate) fn format_line(cells: &[Cell], width: usize) -> String {
    let last = match cells.iter().rposition(|c| !c.is_blank()) {
        Some(i) => i,
        None => return String::new(),
    };
    let mut line = String::new();
    for (i, cell) in cells[..=last].iter().enumerate() {
        let text = if cell.is_blank() {
            "0"
        } else {
            cell.text.as_str()
        };
        line.push_str(text);
        if i < last {
            let pad = width.saturating_sub(text.chars().count()).max(1);
            line.push_str(&" ".repeat(pad));
        }
    }
    line
}

/// Like [`format_line`] but blank interior cells stay blank.
pub(crate) fn format_loose(cells: &[Cell], width: usize) -> String {
    let last = match cells.iter().rposition(|c| !c.is_blank()) {
        Some(i) => i,
        None => return String::new(),
    };
    let mut line = String::new();
    for (i, cell) in cells[..=last].iter().enumerate() {
        line.push_str(&cell.text);
        if i < last {
            let pad = width.saturating_sub(cell.text.chars().count()).max(1);
            line.push_str(&" ".repeat(pad));
        }
    }
    line
}

/// `;;` column header followed by the dashed rule.
pub(crate) fn push_header(names: &[&str], width: usize, out: &mut String) {
    let mut header = String::from(";;");
    let mut rule = String::from(";;");
    for (i, name) in names.iter().enumerate() {
        let cell_width = if i == 0 { width - 2 } else { width };
        let last = i + 1 == names.len();
        if last {
            header.push_str(name);
            rule.push_str(&"-".repeat(name.len().max(cell_width.saturating_sub(1))));
        } else {
            header.push_str(&format!("{:<w$}", name, w = cell_width));
            rule.push_str(&"-".repeat(cell_width.saturating_sub(1)));
            rule.push(' ');
        }
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');
}

/// Writes the description comment lines of a row, if any.
pub(crate) fn push_description(table: &Table, row: usize, out: &mut String) {
    if let Value::Text(desc) = table.get(row, DESCRIPTION) {
        if desc.trim().is_empty() {
            return;
        }
        for line in desc.lines() {
            out.push(';');
            out.push_str(line);
            out.push('\n');
        }
    }
}
