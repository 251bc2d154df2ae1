//! Positional column schemas for ESTRY and XPSWMM GIS layers.
//!
//! Source layers are matched by column position, not by name: the first N
//! attribute columns are renamed to the schema's names and coerced to its
//! types. Extra trailing columns are kept as they are.

use swmm_core::table::{Table, Value};
use swmm_core::{SwmmError, SwmmResult};

use crate::sections::{int, real, text, Field, FieldType};

#[derive(Debug, Clone, Copy)]
pub struct PositionalSchema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

pub const NETWORK: PositionalSchema = PositionalSchema {
    name: "Network",
    fields: &[
        text("ID"),
        text("Type"),
        text("Ignore"),
        text("UCS"),
        real("Len_or_ANA"),
        real("n_nF_Cd"),
        real("US_Invert"),
        real("DS_Invert"),
        real("Form_Loss"),
        real("pBlockage"),
        text("Inlet_Type"),
        text("Conn_1D_2D"),
        real("Conn_No"),
        real("Width_or_Dia"),
        real("Height_or_WF"),
        int("Number_of"),
        real("HConF_or_WC"),
        real("WConF_or_WEx"),
        real("EntryC_or_WSa"),
        real("ExitC_or_WSb"),
    ],
};

pub const NODE: PositionalSchema = PositionalSchema {
    name: "Node",
    fields: &[
        text("ID"),
        text("Type"),
        text("Ignore"),
        real("Bed_Level"),
        real("ANA"),
        text("Conn_1D_2D"),
        real("Conn_Width"),
        real("R1"),
        real("R2"),
        real("R3"),
    ],
};

pub const CROSS_SECTION: PositionalSchema = PositionalSchema {
    name: "Cross-section",
    fields: &[text("Source"), text("Type")],
};

pub const BC: PositionalSchema = PositionalSchema {
    name: "BC",
    fields: &[text("Type"), text("Flags"), text("Name"), text("Descript")],
};

pub const BC_2D: PositionalSchema = PositionalSchema {
    name: "2D BC",
    fields: &[
        text("Type"),
        text("Flags"),
        text("Name"),
        real("f"),
        real("d"),
        real("td"),
        real("a"),
        real("b"),
    ],
};

pub const XP_NODE: PositionalSchema = PositionalSchema {
    name: "XP_Node",
    fields: &[
        text("Name"),
        real("X_Ground"),
        real("Invert"),
        real("Max_Depth"),
        text("Type"),
        text("Outfall_Type"),
        real("Outfall_Stage"),
        real("Ponded_Area"),
    ],
};

pub const XP_LINK: PositionalSchema = PositionalSchema {
    name: "XP_Link",
    fields: &[
        text("Name"),
        text("US_Node"),
        text("DS_Node"),
        text("Type"),
        real("Length"),
        real("Roughness"),
        real("US_Invert"),
        real("DS_Invert"),
        text("Shape"),
        real("Height"),
        real("Width"),
        int("Barrels"),
        real("Entry_Loss"),
        real("Exit_Loss"),
    ],
};

/// ESTRY's "not specified" marker for numeric attributes.
pub const SENTINEL: f64 = -99999.0;

impl PositionalSchema {
    /// Renames the leading columns of `layer` and coerces their values.
    /// Fails when the layer has fewer columns than the schema.
    pub fn apply(&self, layer: &Table) -> SwmmResult<Table> {
        if layer.columns.len() < self.fields.len() {
            return Err(SwmmError::LayerSchema {
                source_name: layer.name.clone(),
                schema: self.name.to_string(),
                expected: self.fields.len(),
                found: layer.columns.len(),
            });
        }
        let mut out = layer.clone();
        for (i, field) in self.fields.iter().enumerate() {
            out.columns[i] = field.column();
            for row in &mut out.rows {
                if let Some(v) = row.values.get_mut(i) {
                    *v = coerce(v, field.ty);
                }
            }
        }
        Ok(out)
    }
}

fn coerce(value: &Value, ty: FieldType) -> Value {
    if value.is_blank() {
        return Value::Null;
    }
    match ty {
        FieldType::Text | FieldType::Rest => Value::Text(value.to_text().trim().to_string()),
        FieldType::Real => value.as_f64().map(Value::Float).unwrap_or(Value::Null),
        FieldType::Int | FieldType::OptInt => value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))
            .map(Value::Int)
            .unwrap_or(Value::Null),
    }
}

/// Numeric attribute with the ESTRY sentinel mapped to `None`.
pub fn measured(table: &Table, row: usize, column: &str) -> Option<f64> {
    table
        .get_f64(row, column)
        .filter(|v| (*v - SENTINEL).abs() > 1e-6)
}

/// `Ignore` column truthiness.
pub fn is_ignored(table: &Table, row: usize) -> bool {
    let v = table.get(row, "Ignore");
    match v.as_f64() {
        Some(f) => f != 0.0,
        None => matches!(
            v.to_text().trim().to_ascii_uppercase().as_str(),
            "T" | "TRUE" | "Y" | "YES"
        ),
    }
}
