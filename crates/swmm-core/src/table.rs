//! Tables of typed records with an optional geometry column.
//!
//! A [`Table`] is the single intermediate representation shared by the
//! `.inp` codec, the reconciler and the layer stores. Columns are ordered,
//! cells are [`Value`]s, and each [`Row`] may carry one [`FeatureGeometry`].
//! The first column is always the record key.

use std::fmt;

use serde::Serialize;

use crate::geometry::{FeatureGeometry, GeometryKind};

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

static NULL: Value = Value::Null;

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Null or an empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Null => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Text rendering used by the `.inp` writer. Null renders empty.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    Text,
    Real,
    Integer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }

    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Real)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Integer)
    }
}

/// Coordinate reference system carried through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Crs {
    pub srs_id: i32,
    pub name: String,
    pub organization: String,
    pub organization_id: i32,
    pub definition: String,
}

impl Crs {
    /// An EPSG code with an undefined WKT definition.
    pub fn epsg(code: i32) -> Self {
        Self {
            srs_id: code,
            name: format!("EPSG:{}", code),
            organization: "EPSG".to_string(),
            organization_id: code,
            definition: "undefined".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub values: Vec<Value>,
    pub geometry: Option<FeatureGeometry>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            geometry: None,
        }
    }

    pub fn with_geometry(mut self, geometry: FeatureGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }
}

/// Ordered columns, rows and an optional geometry column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub geometry_kind: Option<GeometryKind>,
    pub crs: Option<Crs>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_columns(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            ..Self::default()
        }
    }

    pub fn with_geometry_kind(mut self, kind: GeometryKind) -> Self {
        self.geometry_kind = Some(kind);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Exact match first, then case-insensitive.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(name))
            })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Returns the index of `name`, appending a null-filled column if absent.
    pub fn add_column(&mut self, name: &str, kind: ColumnType) -> usize {
        if let Some(idx) = self.columns.iter().position(|c| c.name == name) {
            return idx;
        }
        self.columns.push(Column::new(name, kind));
        for row in &mut self.rows {
            row.values.push(Value::Null);
        }
        self.columns.len() - 1
    }

    /// Appends a row, padding or truncating to the column count.
    pub fn push_row(&mut self, mut row: Row) {
        row.values.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn push_values(&mut self, values: Vec<Value>) {
        self.push_row(Row::new(values));
    }

    /// Appends a row from `(column, value)` pairs, adding unknown columns
    /// with a type inferred from the value.
    pub fn push_named(
        &mut self,
        pairs: Vec<(&str, Value)>,
        geometry: Option<FeatureGeometry>,
    ) -> usize {
        let mut values = vec![Value::Null; self.columns.len()];
        for (name, value) in pairs {
            let idx = match self.column_index(name) {
                Some(idx) => idx,
                None => {
                    let kind = match value {
                        Value::Int(_) => ColumnType::Integer,
                        Value::Float(_) => ColumnType::Real,
                        _ => ColumnType::Text,
                    };
                    let idx = self.add_column(name, kind);
                    values.push(Value::Null);
                    idx
                }
            };
            values[idx] = value;
        }
        self.rows.push(Row { values, geometry });
        self.rows.len() - 1
    }

    pub fn get(&self, row: usize, column: &str) -> &Value {
        self.column_index(column)
            .and_then(|c| self.rows.get(row).and_then(|r| r.values.get(c)))
            .unwrap_or(&NULL)
    }

    pub fn get_f64(&self, row: usize, column: &str) -> Option<f64> {
        self.get(row, column).as_f64()
    }

    /// Cell text, empty for null.
    pub fn get_text(&self, row: usize, column: &str) -> String {
        self.get(row, column).to_text()
    }

    /// Sets a cell, creating a text column if needed.
    pub fn set(&mut self, row: usize, column: &str, value: impl Into<Value>) {
        let value = value.into();
        let idx = match self.column_index(column) {
            Some(idx) => idx,
            None => {
                let kind = match value {
                    Value::Int(_) => ColumnType::Integer,
                    Value::Float(_) => ColumnType::Real,
                    _ => ColumnType::Text,
                };
                self.add_column(column, kind)
            }
        };
        if let Some(r) = self.rows.get_mut(row) {
            r.values[idx] = value;
        }
    }

    /// Text of the first column.
    pub fn key(&self, row: usize) -> String {
        self.rows
            .get(row)
            .and_then(|r| r.values.first())
            .map(Value::to_text)
            .unwrap_or_default()
    }

    pub fn keys(&self) -> Vec<String> {
        (0..self.rows.len()).map(|i| self.key(i)).collect()
    }

    /// Index of the first row whose key equals `key`.
    pub fn find_row(&self, key: &str) -> Option<usize> {
        (0..self.rows.len()).find(|&i| self.key(i) == key)
    }

    pub fn drop_column(&mut self, name: &str) -> bool {
        match self.column_index(name) {
            Some(idx) => {
                self.columns.remove(idx);
                for row in &mut self.rows {
                    if idx < row.values.len() {
                        row.values.remove(idx);
                    }
                }
                true
            }
            None => false,
        }
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(idx) => {
                self.columns[idx].name = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Stable sort on the key column.
    pub fn sort_by_key(&mut self) {
        self.rows.sort_by(|a, b| {
            let ka = a.values.first().map(Value::to_text).unwrap_or_default();
            let kb = b.values.first().map(Value::to_text).unwrap_or_default();
            ka.cmp(&kb)
        });
    }

    /// Projection onto the named columns (missing ones are null-filled).
    pub fn select(&self, name: &str, columns: &[Column]) -> Table {
        let indices: Vec<Option<usize>> = columns
            .iter()
            .map(|c| self.column_index(&c.name))
            .collect();
        let mut out = Table::with_columns(name, columns.to_vec());
        out.crs = self.crs.clone();
        out.geometry_kind = self.geometry_kind;
        for row in &self.rows {
            let values = indices
                .iter()
                .map(|idx| {
                    idx.and_then(|i| row.values.get(i).cloned())
                        .unwrap_or(Value::Null)
                })
                .collect();
            out.rows.push(Row {
                values,
                geometry: row.geometry.clone(),
            });
        }
        out
    }

    /// Appends rows from `other`, matching columns by name.
    pub fn append(&mut self, other: &Table) {
        for col in &other.columns {
            self.add_column(&col.name, col.kind);
        }
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .filter_map(|c| self.column_index(&c.name))
            .collect();
        for row in &other.rows {
            let mut values = vec![Value::Null; self.columns.len()];
            for (src, dst) in mapping.iter().enumerate() {
                if let Some(v) = row.values.get(src) {
                    values[*dst] = v.clone();
                }
            }
            self.rows.push(Row {
                values,
                geometry: row.geometry.clone(),
            });
        }
        if self.geometry_kind.is_none() {
            self.geometry_kind = other.geometry_kind;
        }
        if self.crs.is_none() {
            self.crs = other.crs.clone();
        }
    }
}
