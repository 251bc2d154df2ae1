//! Every catalog section, and every keyword variant and wide group within
//! it, is written to `.inp` text and decoded back cell for cell.

use swmm_core::table::{Table, Value};
use swmm_core::CapturingFeedback;
use swmm_io::codec::{decode_section, encode_section, parse_sections};
use swmm_io::sections::{
    all_sections, CustomSection, Encoding, Field, FieldType, KeywordLayout, Section,
    VariantFields, WideLayout, DEFAULT_KEYWORD, DESCRIPTION, PATTERN_FACTORS, TRANSECT_COORDS,
};

fn sample(field: &Field, row: usize, col: usize) -> Value {
    match field.ty {
        FieldType::Text => {
            Value::text(format!("{}_{}", field.name.replace([' ', '-', '/'], "_"), row + 1))
        }
        FieldType::Rest => Value::text(format!("{} rest of line {}", field.name, row + 1)),
        FieldType::Real => Value::Float(row as f64 * 100.0 + col as f64 + 0.25),
        FieldType::Int | FieldType::OptInt => Value::Int((row * 10 + col + 1) as i64),
    }
}

fn key(row: usize) -> Value {
    Value::text(format!("K{:02}", row + 1))
}

fn describe_first(section: &Section, table: &mut Table) {
    if !section.is_free_text() && !table.is_empty() {
        table.set(0, DESCRIPTION, format!("first {} record", section.name));
    }
}

fn fields_table(section: &Section, fields: &[Field]) -> Table {
    let mut table = section.empty_table();
    for row in 0..2 {
        let pairs = fields
            .iter()
            .enumerate()
            .map(|(col, f)| {
                let value = if col == 0 && f.ty == FieldType::Text && !section.is_free_text() {
                    key(row)
                } else {
                    sample(f, row, col)
                };
                (f.name, value)
            })
            .collect();
        table.push_named(pairs, None);
    }
    table
}

/// One row per variant. The `Default` variant is reached through a keyword
/// no other variant claims.
fn keywords_table(section: &Section, layout: &KeywordLayout) -> Table {
    let mut table = section.empty_table();
    for (row, variant) in layout.variants.iter().enumerate() {
        let keyword = if variant.keyword == DEFAULT_KEYWORD {
            "OTHER"
        } else {
            variant.keyword
        };
        let Some(fields) = layout.row_fields(keyword) else {
            panic!("{} has no fields for {}", section.name, keyword);
        };
        let filled = match variant.fields {
            VariantFields::Open => {
                assert!(layout.common_end.is_empty(), "{}", section.name);
                layout.common_start.len() + 2
            }
            VariantFields::None | VariantFields::Fixed(_) => fields.len(),
        };
        let mut pairs = Vec::new();
        for (col, field) in fields.iter().enumerate().take(filled) {
            let value = if col == layout.keyword_col {
                Value::text(keyword)
            } else if col == 0 {
                key(row)
            } else {
                sample(field, row, col)
            };
            pairs.push((field.name, value));
        }
        table.push_named(pairs, None);
    }
    table
}

/// Two objects, the first with every group and the default column filled,
/// the second with only the first group.
fn wide_table(section: &Section, layout: &WideLayout) -> Table {
    let mut table = section.empty_table();
    for row in 0..2 {
        let mut cells = vec![(layout.key.name.to_string(), key(row))];
        if let Some(default) = layout.default {
            cells.push((default.name.to_string(), Value::text("BC")));
        }
        let groups = if row == 0 { layout.groups } else { &layout.groups[..1] };
        for group in groups {
            for (col, field) in group.fields.iter().enumerate() {
                cells.push((group.column_name(field), sample(field, row, col)));
            }
        }
        let pairs = cells.iter().map(|(n, v)| (n.as_str(), v.clone())).collect();
        table.push_named(pairs, None);
    }
    table
}

fn named(table: &mut Table, pairs: &[(&str, Value)]) {
    table.push_named(pairs.to_vec(), None);
}

fn custom_tables(section: &Section, kind: CustomSection) -> (Table, Option<Table>) {
    let mut table = section.empty_table();
    let mut companion = None;
    match kind {
        CustomSection::Transects => {
            let mut coords = Table::with_columns(
                TRANSECT_COORDS,
                CustomSection::coord_fields().iter().map(Field::column).collect(),
            );
            for (row, (name, points)) in [("T1", 3), ("T2", 7)].into_iter().enumerate() {
                let mut pairs = vec![("Name", Value::text(name))];
                for (col, field) in kind.fields().iter().enumerate().skip(1) {
                    pairs.push((field.name, sample(field, row, col)));
                }
                named(&mut table, &pairs);
                for p in 0..points {
                    coords.push_values(vec![
                        Value::text(name),
                        Value::Float(10.0 - p as f64),
                        Value::Float(p as f64 * 2.5),
                    ]);
                }
            }
            companion = Some(coords);
        }
        CustomSection::Curves => {
            for (name, ty, x, y) in [
                ("C1", Some("STORAGE"), 0.0, 100.0),
                ("C1", None, 1.5, 250.0),
                ("C2", Some("PUMP1"), 0.0, 5.0),
            ] {
                named(
                    &mut table,
                    &[("Name", name.into()), ("Type", ty.into()), ("X", x.into()), ("Y", y.into())],
                );
            }
        }
        CustomSection::Timeseries => {
            for (date, time, value) in [(Some("01/01/2020"), "00:00", 0.5), (None, "01:00", 1.25)] {
                named(
                    &mut table,
                    &[
                        ("Name", "TS1".into()),
                        ("Date", date.into()),
                        ("Time", time.into()),
                        ("Value", value.into()),
                    ],
                );
            }
            named(&mut table, &[("Name", "TS2".into()), ("File", "rain.dat".into())]);
        }
        CustomSection::Patterns => {
            for (name, ty, count) in [
                ("P1", Some("HOURLY"), PATTERN_FACTORS),
                ("P2", Some("MONTHLY"), 12),
                ("P3", None, 4),
            ] {
                let factors: Vec<(String, Value)> = (1..=count)
                    .map(|i| (format!("Factor{}", i), Value::Float(i as f64 / 8.0)))
                    .collect();
                let mut pairs = vec![("Name", Value::text(name)), ("Type", Value::from(ty))];
                pairs.extend(factors.iter().map(|(n, v)| (n.as_str(), v.clone())));
                named(&mut table, &pairs);
            }
        }
        CustomSection::Inlets => {
            let grate: [(&str, Value); 5] = [
                ("Grate_Length", 2.0.into()),
                ("Grate_Width", 0.5.into()),
                ("Grate_Type", "P_BAR-50".into()),
                ("Grate_Aopen", 0.6.into()),
                ("Grate_vSplash", 1.5.into()),
            ];
            let curb: [(&str, Value); 3] = [
                ("Curb_Length", 1.2.into()),
                ("Curb_Height", 0.15.into()),
                ("Curb_Throat", "HORIZONTAL".into()),
            ];
            let slotted: [(&str, Value); 2] =
                [("Slotted_Length", 3.0.into()), ("Slotted_Width", 0.1.into())];
            let custom: [(&str, Value); 1] = [("Custom_Curve", "IC1".into())];
            let rows: [(&str, Vec<(&str, Value)>); 7] = [
                ("GRATE", grate.to_vec()),
                ("CURB", curb.to_vec()),
                ("SLOTTED", slotted.to_vec()),
                ("CUSTOM", custom.to_vec()),
                ("COMBINATION", [grate.to_vec(), curb.to_vec()].concat()),
                ("DROP_GRATE", grate.to_vec()),
                ("DROP_CURB", curb.to_vec()),
            ];
            for (row, (ty, params)) in rows.into_iter().enumerate() {
                let mut pairs = vec![("Name", key(row)), ("Type", Value::text(ty))];
                pairs.extend(params);
                named(&mut table, &pairs);
            }
        }
        CustomSection::Coverages | CustomSection::Loadings => {
            let fields = kind.fields();
            for (name, item, amount) in [("S1", "A", 40.0), ("S1", "B", 60.0), ("S2", "A", 100.0)] {
                named(
                    &mut table,
                    &[
                        (fields[0].name, name.into()),
                        (fields[1].name, item.into()),
                        (fields[2].name, amount.into()),
                    ],
                );
            }
        }
    }
    (table, companion)
}

fn build(section: &Section) -> (Table, Option<Table>) {
    let (mut table, companion) = match section.encoding {
        Encoding::NoKeywords(fields) | Encoding::Geometry(fields) => {
            (fields_table(section, fields), None)
        }
        Encoding::Keywords(layout) => (keywords_table(section, layout), None),
        Encoding::Wide(layout) => (wide_table(section, layout), None),
        Encoding::Custom(kind) => custom_tables(section, kind),
    };
    describe_first(section, &mut table);
    (table, companion)
}

fn assert_same_cells(context: &str, expected: &Table, actual: &Table) {
    assert_eq!(actual.column_names(), expected.column_names(), "{}", context);
    assert_eq!(actual.len(), expected.len(), "{} row count", context);
    for row in 0..expected.len() {
        for column in expected.column_names() {
            assert_eq!(
                actual.get(row, column),
                expected.get(row, column),
                "{} row {} column {}",
                context,
                row,
                column
            );
        }
    }
}

#[test]
fn every_section_round_trips_every_cell() {
    for section in all_sections() {
        let (table, companion) = build(section);
        assert!(!table.is_empty(), "{} built no rows", section.name);

        let text = encode_section(section, &table, companion.as_ref());
        let blocks = parse_sections(&text);
        assert_eq!(blocks.len(), 1, "{}:\n{}", section.name, text);
        assert!(blocks[0].name.eq_ignore_ascii_case(section.name));

        let mut fb = CapturingFeedback::new();
        let decoded = decode_section(section, &blocks[0].lines, &mut fb).unwrap();
        assert!(fb.diagnostics.is_empty(), "{}: {}\n{}", section.name, fb.diagnostics, text);

        let mut expected = table.clone();
        if !section.no_sort {
            expected.sort_by_key();
        }
        assert_same_cells(section.name, &expected, &decoded[0]);
        match companion {
            Some(coords) => {
                assert_eq!(decoded.len(), 2, "{}", section.name);
                assert_same_cells(TRANSECT_COORDS, &coords, &decoded[1]);
            }
            None => assert_eq!(decoded.len(), 1, "{}", section.name),
        }
    }
}

#[test]
fn keyword_rows_cover_every_variant() {
    let mut variants = 0;
    for section in all_sections() {
        if let Encoding::Keywords(layout) = section.encoding {
            let (table, _) = build(section);
            assert_eq!(table.len(), layout.variants.len(), "{}", section.name);
            variants += layout.variants.len();
        }
    }
    assert!(variants > 50, "only {} keyword variants", variants);
}

#[test]
fn interior_blanks_come_back_as_zero() {
    let section = all_sections().iter().find(|s| s.name == "Junctions").unwrap();
    let mut table = section.empty_table();
    table.push_named(
        vec![("Name", "J1".into()), ("Elev", 10.0.into()), ("Ysur", 1.5.into())],
        None,
    );

    let text = encode_section(section, &table, None);
    let blocks = parse_sections(&text);
    let mut fb = CapturingFeedback::new();
    let decoded = decode_section(section, &blocks[0].lines, &mut fb).unwrap().remove(0);
    assert_eq!(decoded.get(0, "Ymax"), &Value::Float(0.0));
    assert_eq!(decoded.get(0, "Y0"), &Value::Float(0.0));
    assert_eq!(decoded.get(0, "Ysur"), &Value::Float(1.5));
    assert_eq!(decoded.get(0, "Apond"), &Value::Null);
}
