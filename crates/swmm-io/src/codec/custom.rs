//! Sections whose text layout cannot be expressed as a field list.

use std::collections::HashMap;

use swmm_core::table::{Row, Table, Value};
use swmm_core::SwmmResult;

use super::{format_line, format_loose, push_description, push_header, Cell, DataLine, DecodeCtx};
use crate::sections::{
    real, text, CustomSection, Field, FieldType, Section, PATTERN_FACTORS, TRANSECT_COORDS,
};

/// Station/elevation pairs per `GR` line.
const GR_PAIRS_PER_LINE: usize = 5;
/// Multipliers per Patterns line.
const PATTERN_FACTORS_PER_LINE: usize = 6;
/// Field width used inside the HEC-2 style transect block.
const TRANSECT_WIDTH: usize = 10;

const GRATE_PARAMS: &[Field] = &[
    real("Grate_Length"),
    real("Grate_Width"),
    text("Grate_Type"),
    real("Grate_Aopen"),
    real("Grate_vSplash"),
];
const CURB_PARAMS: &[Field] = &[real("Curb_Length"), real("Curb_Height"), text("Curb_Throat")];
const SLOTTED_PARAMS: &[Field] = &[real("Slotted_Length"), real("Slotted_Width")];
const CUSTOM_PARAMS: &[Field] = &[text("Custom_Curve")];

pub(super) fn decode(
    section: &Section,
    kind: CustomSection,
    data: &[DataLine],
    ctx: &mut DecodeCtx<'_>,
) -> SwmmResult<Vec<Table>> {
    let tables = match kind {
        CustomSection::Transects => {
            let (table, coords) = decode_transects(section, data, ctx);
            vec![table, coords]
        }
        CustomSection::Curves => vec![decode_curves(section, data, ctx)],
        CustomSection::Timeseries => vec![decode_timeseries(section, data, ctx)],
        CustomSection::Patterns => vec![decode_patterns(section, data, ctx)],
        CustomSection::Inlets => vec![decode_inlets(section, data, ctx)],
        CustomSection::Coverages | CustomSection::Loadings => {
            vec![decode_pairs(section, kind.fields(), data, ctx)]
        }
    };
    Ok(tables)
}

pub(super) fn encode(
    kind: CustomSection,
    table: &Table,
    companion: Option<&Table>,
    width: usize,
    out: &mut String,
) {
    match kind {
        CustomSection::Transects => encode_transects(table, companion, out),
        CustomSection::Curves => encode_curves(table, width, out),
        CustomSection::Timeseries => encode_timeseries(table, width, out),
        CustomSection::Patterns => encode_patterns(table, width, out),
        CustomSection::Inlets => encode_inlets(table, width, out),
        CustomSection::Coverages | CustomSection::Loadings => {
            encode_pairs(kind.fields(), table, width, out)
        }
    }
}

fn is_number(token: &str) -> bool {
    token.parse::<f64>().is_ok()
}

pub fn transect_coords_table() -> Table {
    Table::with_columns(
        TRANSECT_COORDS,
        CustomSection::coord_fields().iter().map(Field::column).collect(),
    )
}

// ---------------------------------------------------------------------------
// Transects (HEC-2 style NC / X1 / GR records)
// ---------------------------------------------------------------------------

fn decode_transects(
    section: &Section,
    data: &[DataLine],
    ctx: &mut DecodeCtx<'_>,
) -> (Table, Table) {
    let mut table = section.empty_table();
    let mut coords = transect_coords_table();
    let mut roughness = [Value::Null, Value::Null, Value::Null];
    let mut pending_description: Option<String> = None;
    let mut current: Option<String> = None;

    for line in data {
        match line.key().to_ascii_uppercase().as_str() {
            "NC" => {
                for (i, slot) in roughness.iter_mut().enumerate() {
                    let token = line.token(i + 1).unwrap_or("");
                    *slot = ctx.value(FieldType::Real, token, "NC", line.line_no);
                }
                if line.description.is_some() {
                    pending_description = line.description.clone();
                }
            }
            "X1" => {
                let name = line.token(1).unwrap_or("").to_string();
                let mut num = |i: usize, field: &str| {
                    ctx.value(FieldType::Real, line.token(i).unwrap_or(""), field, line.line_no)
                };
                let values = vec![
                    Value::text(name.clone()),
                    roughness[0].clone(),
                    roughness[1].clone(),
                    roughness[2].clone(),
                    num(3, "Xleft"),
                    num(4, "Xright"),
                    num(7, "Lfactor"),
                    num(8, "Wfactor"),
                    num(9, "Eoffset"),
                ];
                table.push_values(values);
                let description = line.description.clone().or(pending_description.take());
                ctx.describe(&name, description.as_ref());
                current = Some(name);
            }
            "GR" => {
                let Some(name) = current.clone() else {
                    ctx.warn(line.line_no, "GR record before any X1 record");
                    continue;
                };
                let values: Vec<&str> = line.tokens[1..].iter().map(|t| t.text.as_str()).collect();
                if values.len() % 2 != 0 {
                    ctx.warn(line.line_no, "GR record has an unpaired value");
                }
                for pair in values.chunks_exact(2) {
                    let elev = ctx.value(FieldType::Real, pair[0], "Elev", line.line_no);
                    let station = ctx.value(FieldType::Real, pair[1], "Station", line.line_no);
                    coords.push_values(vec![Value::text(name.clone()), elev, station]);
                }
            }
            other => ctx.warn(line.line_no, &format!("unknown transect record '{}'", other)),
        }
    }
    (table, coords)
}

fn encode_transects(table: &Table, coords: Option<&Table>, out: &mut String) {
    out.push_str(";;Transect Data in HEC-2 format\n;;\n");
    let mut by_name: HashMap<String, Vec<(Value, Value)>> = HashMap::new();
    if let Some(coords) = coords {
        for row in 0..coords.len() {
            by_name
                .entry(coords.key(row))
                .or_default()
                .push((coords.get(row, "Elev").clone(), coords.get(row, "Station").clone()));
        }
    }
    let w = TRANSECT_WIDTH;
    for row in 0..table.len() {
        let name = table.key(row);
        let points = by_name.get(&name).map(Vec::as_slice).unwrap_or(&[]);
        push_description(table, row, out);

        let mut nc = vec![Cell::literal("NC")];
        nc.extend(
            ["Nleft", "Nright", "Nchanl"]
                .iter()
                .map(|f| Cell::new(table.get(row, f), FieldType::Real)),
        );
        out.push_str(&format_line(&nc, w));
        out.push('\n');

        let mut x1 = vec![
            Cell::literal("X1"),
            Cell::text(&name),
            Cell::new(&Value::Int(points.len() as i64), FieldType::Int),
            Cell::new(table.get(row, "Xleft"), FieldType::Real),
            Cell::new(table.get(row, "Xright"), FieldType::Real),
            Cell::literal("0.0"),
            Cell::literal("0.0"),
        ];
        x1.extend(
            ["Lfactor", "Wfactor", "Eoffset"]
                .iter()
                .map(|f| Cell::new(table.get(row, f), FieldType::Real)),
        );
        out.push_str(&format_line(&x1, w));
        out.push('\n');

        for chunk in points.chunks(GR_PAIRS_PER_LINE) {
            let mut gr = vec![Cell::literal("GR")];
            for (elev, station) in chunk {
                gr.push(Cell::new(elev, FieldType::Real));
                gr.push(Cell::new(station, FieldType::Real));
            }
            out.push_str(&format_line(&gr, w));
            out.push('\n');
        }
    }
}

// ---------------------------------------------------------------------------
// Curves: the first row of each curve carries its type
// ---------------------------------------------------------------------------

fn decode_curves(section: &Section, data: &[DataLine], ctx: &mut DecodeCtx<'_>) -> Table {
    let mut table = section.empty_table();
    for line in data {
        let name = line.key().to_string();
        let (curve_type, start) = match line.token(1) {
            Some(t) if !is_number(t) => (Value::text(t), 2),
            _ => (Value::Null, 1),
        };
        let values: Vec<&str> = line.tokens[start.min(line.tokens.len())..]
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        if values.len() % 2 != 0 {
            ctx.warn(line.line_no, &format!("curve {} has an unpaired value", name));
        }
        for (i, pair) in values.chunks_exact(2).enumerate() {
            let x = ctx.value(FieldType::Real, pair[0], "X", line.line_no);
            let y = ctx.value(FieldType::Real, pair[1], "Y", line.line_no);
            let ty = if i == 0 { curve_type.clone() } else { Value::Null };
            table.push_values(vec![Value::text(name.clone()), ty, x, y]);
        }
        ctx.describe(&name, line.description.as_ref());
    }
    table
}

fn encode_curves(table: &Table, width: usize, out: &mut String) {
    push_header(&["Name", "Type", "X-Value", "Y-Value"], width, out);
    for row in 0..table.len() {
        let cells = vec![
            Cell::text(&table.key(row)),
            Cell::new(table.get(row, "Type"), FieldType::Text),
            Cell::new(table.get(row, "X"), FieldType::Real),
            Cell::new(table.get(row, "Y"), FieldType::Real),
        ];
        push_description(table, row, out);
        out.push_str(&format_loose(&cells, width));
        out.push('\n');
    }
}

// ---------------------------------------------------------------------------
// Timeseries: inline values or an external FILE
// ---------------------------------------------------------------------------

fn decode_timeseries(section: &Section, data: &[DataLine], ctx: &mut DecodeCtx<'_>) -> Table {
    let mut table = section.empty_table();
    for line in data {
        let name = line.key().to_string();
        ctx.describe(&name, line.description.as_ref());
        if line
            .token(1)
            .is_some_and(|t| t.eq_ignore_ascii_case("FILE"))
        {
            let file = line.rest_from(2).unwrap_or("");
            table.push_named(
                vec![("Name", Value::text(name)), ("File", Value::text(file))],
                None,
            );
            continue;
        }
        let mut i = 1;
        let mut date: Option<String> = None;
        while i < line.tokens.len() {
            let token = line.tokens[i].text.as_str();
            if token.contains('/') || (token.contains('-') && !is_number(token)) {
                date = Some(token.to_string());
                i += 1;
                continue;
            }
            let Some(value) = line.token(i + 1) else {
                ctx.warn(line.line_no, &format!("time {} has no value", token));
                break;
            };
            let value = ctx.value(FieldType::Real, value, "Value", line.line_no);
            table.push_named(
                vec![
                    ("Name", Value::text(name.clone())),
                    ("Date", date.take().map(Value::text).unwrap_or(Value::Null)),
                    ("Time", Value::text(token)),
                    ("Value", value),
                ],
                None,
            );
            i += 2;
        }
    }
    table
}

fn encode_timeseries(table: &Table, width: usize, out: &mut String) {
    push_header(&["Name", "Date", "Time", "Value"], width, out);
    for row in 0..table.len() {
        push_description(table, row, out);
        let name = Cell::text(&table.key(row));
        let file = table.get(row, "File");
        let line = if !file.is_blank() {
            format_loose(
                &[name, Cell::literal("FILE"), Cell::new(file, FieldType::Rest)],
                width,
            )
        } else {
            format_loose(
                &[
                    name,
                    Cell::new(table.get(row, "Date"), FieldType::Text),
                    Cell::new(table.get(row, "Time"), FieldType::Text),
                    Cell::new(table.get(row, "Value"), FieldType::Real),
                ],
                width,
            )
        };
        out.push_str(&line);
        out.push('\n');
    }
}

// ---------------------------------------------------------------------------
// Patterns: one row per pattern, factors wrapped six per line
// ---------------------------------------------------------------------------

fn decode_patterns(section: &Section, data: &[DataLine], ctx: &mut DecodeCtx<'_>) -> Table {
    let mut table = section.empty_table();
    let mut index: HashMap<String, (usize, usize)> = HashMap::new();
    for line in data {
        let name = line.key().to_string();
        ctx.describe(&name, line.description.as_ref());
        let (row, filled) = match index.get(&name) {
            Some(&entry) => entry,
            None => {
                let row = table.push_named(vec![("Name", Value::text(name.clone()))], None);
                (row, 0)
            }
        };
        let mut start = 1;
        if let Some(t) = line.token(1) {
            if !is_number(t) {
                table.set(row, "Type", Value::text(t));
                start = 2;
            }
        }
        let mut filled = filled;
        for token in line.tokens.iter().skip(start) {
            if filled >= PATTERN_FACTORS {
                ctx.warn(
                    line.line_no,
                    &format!("pattern {} has more than {} factors", name, PATTERN_FACTORS),
                );
                break;
            }
            filled += 1;
            let column = format!("Factor{}", filled);
            let value = ctx.value(FieldType::Real, &token.text, &column, line.line_no);
            table.set(row, &column, value);
        }
        index.insert(name, (row, filled));
    }
    table
}

fn encode_patterns(table: &Table, width: usize, out: &mut String) {
    push_header(&["Name", "Type", "Multipliers"], width, out);
    for row in 0..table.len() {
        push_description(table, row, out);
        let name = table.key(row);
        let factors: Vec<&Value> = (1..=PATTERN_FACTORS)
            .map(|i| table.get(row, &format!("Factor{}", i)))
            .filter(|v| !v.is_blank())
            .collect();
        let mut chunks = factors.chunks(PATTERN_FACTORS_PER_LINE);
        let mut first = vec![
            Cell::text(&name),
            Cell::new(table.get(row, "Type"), FieldType::Text),
        ];
        if let Some(chunk) = chunks.next() {
            first.extend(chunk.iter().map(|v| Cell::new(v, FieldType::Real)));
        }
        out.push_str(&format_loose(&first, width));
        out.push('\n');
        for chunk in chunks {
            let mut cells = vec![Cell::text(&name), Cell::literal("")];
            cells.extend(chunk.iter().map(|v| Cell::new(v, FieldType::Real)));
            out.push_str(&format_loose(&cells, width));
            out.push('\n');
        }
    }
}

// ---------------------------------------------------------------------------
// Inlets: one line per inlet component
// ---------------------------------------------------------------------------

fn inlet_params(kind: &str) -> Option<&'static [Field]> {
    match kind {
        "GRATE" | "DROP_GRATE" => Some(GRATE_PARAMS),
        "CURB" | "DROP_CURB" => Some(CURB_PARAMS),
        "SLOTTED" => Some(SLOTTED_PARAMS),
        "CUSTOM" => Some(CUSTOM_PARAMS),
        _ => None,
    }
}

fn decode_inlets(section: &Section, data: &[DataLine], ctx: &mut DecodeCtx<'_>) -> Table {
    let mut table = section.empty_table();
    let mut index: HashMap<String, usize> = HashMap::new();
    for line in data {
        let name = line.key().to_string();
        let kind = line.token(1).unwrap_or("").to_ascii_uppercase();
        let Some(params) = inlet_params(&kind) else {
            ctx.warn(line.line_no, &format!("unknown inlet type '{}' for {}", kind, name));
            continue;
        };
        ctx.describe(&name, line.description.as_ref());
        let row = match index.get(&name) {
            Some(&row) => {
                let existing = table.get_text(row, "Type");
                let combined = matches!(
                    (existing.as_str(), kind.as_str()),
                    ("GRATE", "CURB") | ("CURB", "GRATE")
                );
                if combined {
                    table.set(row, "Type", Value::text("COMBINATION"));
                } else {
                    ctx.warn(
                        line.line_no,
                        &format!("inlet {} redefined as {}", name, kind),
                    );
                }
                row
            }
            None => {
                let row = table.push_named(
                    vec![
                        ("Name", Value::text(name.clone())),
                        ("Type", Value::text(kind.clone())),
                    ],
                    None,
                );
                index.insert(name.clone(), row);
                row
            }
        };
        for (i, field) in params.iter().enumerate() {
            if let Some(token) = line.token(2 + i) {
                let value = ctx.value(field.ty, token, field.name, line.line_no);
                table.set(row, field.name, value);
            }
        }
    }
    table
}

fn encode_inlets(table: &Table, width: usize, out: &mut String) {
    push_header(&["Name", "Type", "Parameters"], width, out);
    for row in 0..table.len() {
        let name = table.key(row);
        let ty = table.get_text(row, "Type").to_ascii_uppercase();
        let grate = if ty == "DROP_GRATE" { "DROP_GRATE" } else { "GRATE" };
        let curb = if ty == "DROP_CURB" { "DROP_CURB" } else { "CURB" };
        push_description(table, row, out);
        for (keyword, params) in [
            (grate, GRATE_PARAMS),
            (curb, CURB_PARAMS),
            ("SLOTTED", SLOTTED_PARAMS),
            ("CUSTOM", CUSTOM_PARAMS),
        ] {
            if params.iter().all(|f| table.get(row, f.name).is_blank()) {
                continue;
            }
            let mut cells = vec![Cell::text(&name), Cell::literal(keyword)];
            cells.extend(params.iter().map(|f| Cell::new(table.get(row, f.name), f.ty)));
            out.push_str(&format_line(&cells, width));
            out.push('\n');
        }
    }
}

// ---------------------------------------------------------------------------
// Coverages / Loadings: name followed by (item, value) pairs
// ---------------------------------------------------------------------------

fn decode_pairs(
    section: &Section,
    fields: &[Field],
    data: &[DataLine],
    ctx: &mut DecodeCtx<'_>,
) -> Table {
    let mut table = section.empty_table();
    for line in data {
        let name = line.key().to_string();
        ctx.describe(&name, line.description.as_ref());
        let values: Vec<&str> = line.tokens[1..].iter().map(|t| t.text.as_str()).collect();
        if values.len() % 2 != 0 {
            ctx.warn(line.line_no, &format!("{} has an unpaired value", name));
        }
        for pair in values.chunks_exact(2) {
            let item = ctx.value(fields[1].ty, pair[0], fields[1].name, line.line_no);
            let amount = ctx.value(fields[2].ty, pair[1], fields[2].name, line.line_no);
            table.push_row(Row::new(vec![Value::text(name.clone()), item, amount]));
        }
    }
    table
}

fn encode_pairs(fields: &[Field], table: &Table, width: usize, out: &mut String) {
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
