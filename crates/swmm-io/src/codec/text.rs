//! Generic layouts: fixed fields, keyword variants and wide pivots.

use std::collections::HashMap;

use swmm_core::table::{Row, Table, Value};

use super::{format_line, push_description, push_header, Cell, DataLine, DecodeCtx};
use crate::sections::{Field, FieldType, KeywordLayout, Section, WideLayout};

/// Maps tokens onto `fields` in order; a `Rest` field takes the raw
/// remainder of the line. Returns the number of tokens consumed.
fn assign(
    table: &Table,
    values: &mut [Value],
    fields: &[Field],
    line: &DataLine,
    offset: usize,
    ctx: &mut DecodeCtx<'_>,
) -> usize {
    let mut consumed = 0;
    for (i, field) in fields.iter().enumerate() {
        let pos = offset + i;
        if pos >= line.tokens.len() {
            break;
        }
        let Some(col) = table.column_index(field.name) else {
            continue;
        };
        if field.ty == FieldType::Rest {
            let raw = line.rest_from(pos).unwrap_or("");
            values[col] = ctx.value(FieldType::Rest, raw, field.name, line.line_no);
            return line.tokens.len() - offset;
        }
        let token = line.tokens[pos].text.as_str();
        values[col] = ctx.value(field.ty, token, field.name, line.line_no);
        consumed = i + 1;
    }
    consumed
}

pub(super) fn decode_fields(
    section: &Section,
    fields: &[Field],
    data: &[DataLine],
    ctx: &mut DecodeCtx<'_>,
) -> Table {
    let mut table = section.empty_table();
    let free_text = section.is_free_text();
    for line in data {
        let mut values = vec![Value::Null; table.columns.len()];
        if free_text {
            values[0] = Value::text(line.raw.clone());
        } else {
            let used = assign(&table, &mut values, fields, line, 0, ctx);
            if used < line.tokens.len() {
                ctx.warn(
                    line.line_no,
                    &format!(
                        "ignored {} extra value(s) after {} fields",
                        line.tokens.len() - used,
                        fields.len()
                    ),
                );
            }
            ctx.describe(line.key(), line.description.as_ref());
        }
        table.push_row(Row::new(values));
    }
    table
}

pub(super) fn encode_fields(
    section: &Section,
    fields: &[Field],
    table: &Table,
    width: usize,
    out: &mut String,
) {
    if section.is_free_text() {
        for row in 0..table.len() {
            out.push_str(&table.get_text(row, fields[0].name));
            out.push('\n');
        }
        return;
    }
    let names: Vec<&str> = fields.iter().map(|f| f.name).collect();
    push_header(&names, width, out);
    for row in 0..table.len() {
        let cells: Vec<Cell> = fields
            .iter()
            .map(|f| Cell::new(table.get(row, f.name), f.ty))
            .collect();
        push_description(table, row, out);
        out.push_str(&format_line(&cells, width));
        out.push('\n');
    }
}

pub(super) fn decode_keywords(
    section: &Section,
    layout: &KeywordLayout,
    data: &[DataLine],
    ctx: &mut DecodeCtx<'_>,
) -> Table {
    let mut table = section.empty_table();
    let keyword_field = layout.keyword_field();
    for line in data {
        let mut values = vec![Value::Null; table.columns.len()];
        let keyword = line.token(layout.keyword_col).unwrap_or("");
        let used = match layout.row_fields(keyword) {
            Some(fields) => assign(&table, &mut values, &fields, line, 0, ctx),
            None => {
                let used = assign(&table, &mut values, layout.common_start, line, 0, ctx);
                if used < line.tokens.len() {
                    ctx.warn(
                        line.line_no,
                        &format!(
                            "unknown {} '{}', dropped {} value(s)",
                            keyword_field.name,
                            keyword,
                            line.tokens.len() - used
                        ),
                    );
                }
                line.tokens.len()
            }
        };
        if used < line.tokens.len() {
            ctx.warn(
                line.line_no,
                &format!("dropped {} value(s) not in the layout", line.tokens.len() - used),
            );
        }
        ctx.describe(line.key(), line.description.as_ref());
        table.push_row(Row::new(values));
    }
    table
}

pub(super) fn encode_keywords(layout: &KeywordLayout, table: &Table, width: usize, out: &mut String) {
    let keyword_name = layout.keyword_field().name;
    let mut headers: Vec<Vec<Field>> = Vec::new();
    let mut rows: Vec<Vec<Field>> = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let keyword = table.get_text(row, keyword_name);
        let fields = layout
            .row_fields(&keyword)
            .unwrap_or_else(|| layout.common_start.to_vec());
        if !headers.contains(&fields) {
            headers.push(fields.clone());
        }
        rows.push(fields);
    }
    headers.sort_by_key(|f| f.len());
    for (i, fields) in headers.iter().enumerate() {
        let names: Vec<&str> = fields.iter().map(|f| f.name).collect();
        let mut header = String::new();
        push_header(&names, width, &mut header);
        if i + 1 == headers.len() {
            out.push_str(&header);
        } else if let Some(first_line) = header.lines().next() {
            // the rule is written once, under the widest variant
            out.push_str(first_line);
            out.push('\n');
        }
    }
    for (row, fields) in rows.iter().enumerate() {
        let cells: Vec<Cell> = fields
            .iter()
            .map(|f| Cell::new(table.get(row, f.name), f.ty))
            .collect();
        push_description(table, row, out);
        out.push_str(&format_line(&cells, width));
        out.push('\n');
    }
}

pub(super) fn decode_wide(
    section: &Section,
    layout: &WideLayout,
    data: &[DataLine],
    ctx: &mut DecodeCtx<'_>,
) -> Table {
    let mut table = section.empty_table();
    let mut index: HashMap<String, usize> = HashMap::new();
    for line in data {
        let key = line.key().to_string();
        let row = *index.entry(key.clone()).or_insert_with(|| {
            let mut values = vec![Value::Null; table.columns.len()];
            values[0] = Value::text(key.clone());
            table.push_row(Row::new(values));
            table.len() - 1
        });
        ctx.describe(&key, line.description.as_ref());

        let Some(discriminator) = line.token(1) else {
            continue;
        };
        match layout.group(discriminator) {
            Some(group) => {
                for (i, field) in group.fields.iter().enumerate() {
                    let pos = 2 + i;
                    if pos >= line.tokens.len() {
                        break;
                    }
                    let column = group.column_name(field);
                    let raw = if field.ty == FieldType::Rest {
                        line.rest_from(pos).unwrap_or("").to_string()
                    } else {
                        line.tokens[pos].text.clone()
                    };
                    let value = ctx.value(field.ty, &raw, &column, line.line_no);
                    table.set(row, &column, value);
                    if field.ty == FieldType::Rest {
                        break;
                    }
                }
                let expected = 2 + group.fields.len();
                let rest_field = group.fields.iter().any(|f| f.ty == FieldType::Rest);
                if !rest_field && line.tokens.len() > expected {
                    ctx.warn(
                        line.line_no,
                        &format!(
                            "dropped {} value(s) after {} {}",
                            line.tokens.len() - expected,
                            key,
                            group.prefix
                        ),
                    );
                }
            }
            None => match layout.default {
                Some(default) => {
                    let value = ctx.value(default.ty, discriminator, default.name, line.line_no);
                    table.set(row, default.name, value);
                }
                None => ctx.warn(
                    line.line_no,
                    &format!("unknown layer '{}' for {}", discriminator, key),
                ),
            },
        }
    }
    table
}

pub(super) fn encode_wide(layout: &WideLayout, table: &Table, width: usize, out: &mut String) {
    let mut names = vec![layout.key.name, "Layer"];
    names.push("Parameters");
    push_header(&names, width, out);
    for row in 0..table.len() {
        let key = table.get(row, layout.key.name);
        let key_cell = Cell::new(key, layout.key.ty);
        push_description(table, row, out);
        if let Some(default) = layout.default {
            let value = table.get(row, default.name);
            if !value.is_blank() {
                let cells = vec![key_cell.clone(), Cell::new(value, default.ty)];
                out.push_str(&format_line(&cells, width));
                out.push('\n');
            }
        }
        for group in layout.groups {
            let values: Vec<&Value> = group
                .fields
                .iter()
                .map(|f| table.get(row, &group.column_name(f)))
                .collect();
            if values.iter().all(|v| v.is_blank()) {
                continue;
            }
            let mut cells = vec![key_cell.clone(), Cell::text(group.prefix)];
            cells.extend(
                group
                    .fields
                    .iter()
                    .zip(values)
                    .map(|(f, v)| Cell::new(v, f.ty)),
            );
            out.push_str(&format_line(&cells, width));
            out.push('\n');
        }
    }
}
