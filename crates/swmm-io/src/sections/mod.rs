//! SWMM section schema.
//!
//! Every `.inp` section is described once, as static data, by a [`Section`].
//! The same field lists drive decoding (text → [`Table`]) and encoding
//! (table → text), so the two directions cannot drift apart.
//!
//! Four layout families exist:
//!
//! - **NoKeywords**: a fixed, ordered field list
//! - **Keywords**: one discriminator column selects which fields follow
//! - **Wide**: several lines per object pivoted into one row of
//!   `<PREFIX>_<field>` columns
//! - **Geometry**: coordinate pseudo-sections (Coordinates, Vertices, ...)
//!
//! plus a closed set of [`CustomSection`]s with bespoke text layouts.

mod catalog;

use swmm_core::geometry::GeometryKind;
use swmm_core::table::{Column, ColumnType, Table};
use swmm_core::{SwmmError, SwmmResult};

pub use catalog::all_sections;

/// Side column holding `;` comments attached to a record.
pub const DESCRIPTION: &str = "Description";
/// Side column holding the `[TAGS]` entry of a record.
pub const TAG: &str = "Tag";
/// Companion table produced by the Transects decoder.
pub const TRANSECT_COORDS: &str = "Transects_coords";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    /// Text that absorbs the remainder of the line.
    Rest,
    Real,
    Int,
    /// Integer that may be left blank.
    OptInt,
}

impl FieldType {
    pub fn column_type(&self) -> ColumnType {
        match self {
            FieldType::Text | FieldType::Rest => ColumnType::Text,
            FieldType::Real => ColumnType::Real,
            FieldType::Int | FieldType::OptInt => ColumnType::Integer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
}

impl Field {
    pub fn column(&self) -> Column {
        Column::new(self.name, self.ty.column_type())
    }
}

pub const fn text(name: &'static str) -> Field {
    Field {
        name,
        ty: FieldType::Text,
    }
}

pub const fn rest(name: &'static str) -> Field {
    Field {
        name,
        ty: FieldType::Rest,
    }
}

pub const fn real(name: &'static str) -> Field {
    Field {
        name,
        ty: FieldType::Real,
    }
}

pub const fn int(name: &'static str) -> Field {
    Field {
        name,
        ty: FieldType::Int,
    }
}

pub const fn opt_int(name: &'static str) -> Field {
    Field {
        name,
        ty: FieldType::OptInt,
    }
}

/// Fields activated by one keyword value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantFields {
    None,
    Fixed(&'static [Field]),
    /// Any number of parameters up to the section's maximum arity.
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    pub keyword: &'static str,
    pub fields: VariantFields,
}

pub const DEFAULT_KEYWORD: &str = "Default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnLayout {
    /// Table columns are the union of every variant's named fields.
    Named,
    /// Table columns are `Param1..ParamN`.
    Positional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordLayout {
    pub common_start: &'static [Field],
    /// Index into `common_start` of the discriminator.
    pub keyword_col: usize,
    pub variants: &'static [Variant],
    pub common_end: &'static [Field],
    pub layout: ColumnLayout,
}

impl KeywordLayout {
    /// Case-insensitive lookup with fallback to the `Default` variant.
    pub fn variant(&self, keyword: &str) -> Option<&Variant> {
        self.variants
            .iter()
            .find(|v| v.keyword != DEFAULT_KEYWORD && v.keyword.eq_ignore_ascii_case(keyword))
            .or_else(|| self.variants.iter().find(|v| v.keyword == DEFAULT_KEYWORD))
    }

    /// Largest fixed arity across variants.
    pub const fn max_arity(&self) -> usize {
        let mut max = 0;
        let mut i = 0;
        while i < self.variants.len() {
            if let VariantFields::Fixed(f) = self.variants[i].fields {
                if f.len() > max {
                    max = f.len();
                }
            }
            i += 1;
        }
        max
    }

    pub fn keyword_field(&self) -> Field {
        self.common_start[self.keyword_col]
    }

    /// Fields a row with this keyword writes, in text order.
    pub fn row_fields(&self, keyword: &str) -> Option<Vec<Field>> {
        let variant = self.variant(keyword)?;
        let mut fields = self.common_start.to_vec();
        match (variant.fields, self.layout) {
            (VariantFields::None, _) => {}
            (VariantFields::Fixed(f), ColumnLayout::Named) => fields.extend_from_slice(f),
            (VariantFields::Fixed(f), ColumnLayout::Positional) => {
                fields.extend((0..f.len()).map(|i| text(param_name(i))))
            }
            (VariantFields::Open, _) => {
                fields.extend((0..self.max_arity()).map(|i| text(param_name(i))))
            }
        }
        fields.extend_from_slice(self.common_end);
        Some(fields)
    }

    fn variant_columns(&self) -> Vec<Column> {
        match self.layout {
            ColumnLayout::Named => {
                let mut cols: Vec<Column> = Vec::new();
                for v in self.variants {
                    if let VariantFields::Fixed(fields) = v.fields {
                        for f in fields {
                            if !cols.iter().any(|c| c.name == f.name) {
                                cols.push(f.column());
                            }
                        }
                    }
                }
                cols
            }
            ColumnLayout::Positional => (0..self.max_arity())
                .map(|i| Column::text(param_name(i)))
                .collect(),
        }
    }
}

const PARAM_NAMES: [&str; 16] = [
    "Param1", "Param2", "Param3", "Param4", "Param5", "Param6", "Param7", "Param8", "Param9",
    "Param10", "Param11", "Param12", "Param13", "Param14", "Param15", "Param16",
];

/// Positional column count available to a keyword layout. The catalog checks
/// its positional layouts against it at compile time.
pub const MAX_PARAMS: usize = PARAM_NAMES.len();

/// Positional parameters are stored as text so values survive unchanged.
fn param_name(i: usize) -> &'static str {
    PARAM_NAMES[i]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WideGroup {
    pub prefix: &'static str,
    pub fields: &'static [Field],
}

impl WideGroup {
    pub fn column_name(&self, field: &Field) -> String {
        format!("{}_{}", self.prefix, field.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WideLayout {
    pub key: Field,
    /// Column assigned when a line's discriminator matches no group.
    pub default: Option<Field>,
    pub groups: &'static [WideGroup],
}

impl WideLayout {
    pub fn group(&self, discriminator: &str) -> Option<&WideGroup> {
        self.groups
            .iter()
            .find(|g| g.prefix.eq_ignore_ascii_case(discriminator))
    }
}

/// Sections whose text layout has its own encoder/decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomSection {
    Transects,
    Curves,
    Timeseries,
    Patterns,
    Inlets,
    Coverages,
    Loadings,
}

const TRANSECT_FIELDS: &[Field] = &[
    text("Name"),
    real("Nleft"),
    real("Nright"),
    real("Nchanl"),
    real("Xleft"),
    real("Xright"),
    real("Lfactor"),
    real("Wfactor"),
    real("Eoffset"),
];
const TRANSECT_COORD_FIELDS: &[Field] = &[text("Name"), real("Elev"), real("Station")];
const CURVE_FIELDS: &[Field] = &[text("Name"), text("Type"), real("X"), real("Y")];
const TIMESERIES_FIELDS: &[Field] = &[
    text("Name"),
    text("Date"),
    text("Time"),
    real("Value"),
    rest("File"),
];
const INLET_FIELDS: &[Field] = &[
    text("Name"),
    text("Type"),
    real("Grate_Length"),
    real("Grate_Width"),
    text("Grate_Type"),
    real("Grate_Aopen"),
    real("Grate_vSplash"),
    real("Curb_Length"),
    real("Curb_Height"),
    text("Curb_Throat"),
    real("Slotted_Length"),
    real("Slotted_Width"),
    text("Custom_Curve"),
];
const COVERAGE_FIELDS: &[Field] = &[text("Subcatchment"), text("Land_Use"), real("Percent")];
const LOADING_FIELDS: &[Field] = &[text("Subcatchment"), text("Pollutant"), real("Buildup")];

/// Number of multiplier columns in a Patterns row.
pub const PATTERN_FACTORS: usize = 24;

impl CustomSection {
    pub fn fields(&self) -> &'static [Field] {
        match self {
            CustomSection::Transects => TRANSECT_FIELDS,
            CustomSection::Curves => CURVE_FIELDS,
            CustomSection::Timeseries => TIMESERIES_FIELDS,
            CustomSection::Patterns => &[],
            CustomSection::Inlets => INLET_FIELDS,
            CustomSection::Coverages => COVERAGE_FIELDS,
            CustomSection::Loadings => LOADING_FIELDS,
        }
    }

    pub fn coord_fields() -> &'static [Field] {
        TRANSECT_COORD_FIELDS
    }

    fn columns(&self) -> Vec<Column> {
        match self {
            CustomSection::Patterns => {
                let mut cols = vec![Column::text("Name"), Column::text("Type")];
                cols.extend((1..=PATTERN_FACTORS).map(|i| Column::real(format!("Factor{}", i))));
                cols
            }
            other => other.fields().iter().map(Field::column).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    NoKeywords(&'static [Field]),
    Keywords(&'static KeywordLayout),
    Wide(&'static WideLayout),
    Geometry(&'static [Field]),
    Custom(CustomSection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionType {
    NoKeywords,
    Keywords,
    Wide,
    Geometry,
}

/// Which geometry table a section is joined to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryAssoc {
    Nodes,
    Links,
    Subcatchments,
    Inlets,
    Misc,
}

impl GeometryAssoc {
    pub fn kind(&self) -> GeometryKind {
        match self {
            GeometryAssoc::Nodes | GeometryAssoc::Inlets | GeometryAssoc::Misc => {
                GeometryKind::Point
            }
            GeometryAssoc::Links => GeometryKind::LineString,
            GeometryAssoc::Subcatchments => GeometryKind::Polygon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub name: &'static str,
    pub prefix: &'static str,
    pub geometry: Option<GeometryAssoc>,
    pub encoding: Encoding,
    /// Rows keep insertion order on emission.
    pub no_sort: bool,
    /// Exists only as a GIS layer; never written to `.inp`.
    pub gis_only: bool,
    /// Folded into other layers; never written as its own GIS layer.
    pub folded: bool,
}

impl Section {
    pub fn section_type(&self) -> SectionType {
        match self.encoding {
            Encoding::NoKeywords(_) | Encoding::Custom(_) => SectionType::NoKeywords,
            Encoding::Keywords(_) => SectionType::Keywords,
            Encoding::Wide(_) => SectionType::Wide,
            Encoding::Geometry(_) => SectionType::Geometry,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.encoding, Encoding::Custom(_))
    }

    /// Title and Controls: every line is one row, comments included.
    pub fn is_free_text(&self) -> bool {
        matches!(self.encoding, Encoding::NoKeywords(f) if f.len() == 1 && f[0].ty == FieldType::Rest)
    }

    /// `[NAME]` header text.
    pub fn header(&self) -> String {
        self.name.to_uppercase()
    }

    /// `<Prefix>--<Name>`, or the bare name without a prefix.
    pub fn layer_name(&self) -> String {
        layer_name_for(self.prefix, self.name)
    }

    pub fn key_field(&self) -> Field {
        match self.encoding {
            Encoding::NoKeywords(f) | Encoding::Geometry(f) => f[0],
            Encoding::Keywords(k) => k.common_start[0],
            Encoding::Wide(w) => w.key,
            Encoding::Custom(CustomSection::Patterns) => text("Name"),
            Encoding::Custom(c) => c.fields()[0],
        }
    }

    /// Table columns in order, including the `Description` side column.
    pub fn columns(&self) -> Vec<Column> {
        let mut cols: Vec<Column> = match self.encoding {
            Encoding::NoKeywords(f) | Encoding::Geometry(f) => {
                f.iter().map(Field::column).collect()
            }
            Encoding::Keywords(k) => {
                let mut cols: Vec<Column> = k.common_start.iter().map(Field::column).collect();
                cols.extend(k.variant_columns());
                cols.extend(k.common_end.iter().map(Field::column));
                cols
            }
            Encoding::Wide(w) => {
                let mut cols = vec![w.key.column()];
                if let Some(d) = w.default {
                    cols.push(d.column());
                }
                for g in w.groups {
                    for f in g.fields {
                        cols.push(Column::new(g.column_name(f), f.ty.column_type()));
                    }
                }
                cols
            }
            Encoding::Custom(c) => c.columns(),
        };
        if !self.is_free_text() {
            cols.push(Column::text(DESCRIPTION));
        }
        cols
    }

    pub fn empty_table(&self) -> Table {
        let mut table = Table::with_columns(self.name, self.columns());
        table.geometry_kind = self.geometry.map(|g| g.kind());
        table
    }
}

pub fn layer_name_for(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}--{}", prefix, name)
    }
}

/// Case-insensitive lookup of a section by name.
pub fn find_section(name: &str) -> SwmmResult<&'static Section> {
    all_sections()
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| SwmmError::UnknownSection(name.to_string()))
}

/// Section whose GIS layer carries `layer_name`.
pub fn section_for_layer(layer_name: &str) -> Option<&'static Section> {
    all_sections()
        .iter()
        .find(|s| s.layer_name().eq_ignore_ascii_case(layer_name))
}

pub fn sections_with_geometry(assoc: GeometryAssoc) -> impl Iterator<Item = &'static Section> {
    all_sections()
        .iter()
        .filter(move |s| s.geometry == Some(assoc) && !s.folded)
}

/// Node sections in catalog order.
pub fn node_sections() -> Vec<&'static Section> {
    sections_with_geometry(GeometryAssoc::Nodes).collect()
}

/// Link sections in catalog order.
pub fn link_sections() -> Vec<&'static Section> {
    sections_with_geometry(GeometryAssoc::Links).collect()
}

/// Tag object type for a section, if its records can be tagged.
pub fn tag_object_type(section: &Section) -> Option<&'static str> {
    match (section.name, section.geometry) {
        ("Raingages", _) => Some("Gage"),
        ("Subcatchments", _) => Some("Subcatch"),
        (_, Some(GeometryAssoc::Nodes)) => Some("Node"),
        (_, Some(GeometryAssoc::Links)) if !section.folded => Some("Link"),
        _ => None,
    }
}
