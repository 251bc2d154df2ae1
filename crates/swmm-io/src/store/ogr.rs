use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{
    Feature, FieldValue, Layer, LayerAccess, LayerOptions, OGRFieldType, OGRwkbGeometryType,
    ToGdal,
};
use gdal::{Dataset, DatasetOptions, DriverManager, GdalOpenFlags};
use semver::Version;
use swmm_core::geometry::{FeatureGeometry, GeometryKind};
use swmm_core::table::{Column, ColumnType, Crs, Row, Table, Value};
use tracing::{debug, warn};

use super::LayerStore;

/// Attribute layer stamped into every GeoPackage this crate creates.
pub const VERSION_LAYER: &str = "TUFLOW_SWMM_VERSION";
pub const VERSION_COLUMN: &str = "version";

const FID_COLUMN: &str = "fid";
const UNDEFINED_SRS: i32 = -1;

/// OGR driver used to create a file, chosen by extension.
pub fn driver_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "shp" => "ESRI Shapefile",
        "geojson" | "json" => "GeoJSON",
        "tab" | "mif" => "MapInfo File",
        "sqlite" => "SQLite",
        _ => "GPKG",
    }
}

/// Any vector data source OGR can open: GeoPackage, Shapefile, MapInfo and
/// the rest of the GDAL vector drivers.
pub struct OgrStore {
    dataset: Dataset,
    path: PathBuf,
}

impl OgrStore {
    /// Creates a fresh data source, replacing any file at `path`. GeoPackages
    /// get the version layer.
    pub fn create(path: &Path) -> Result<Self> {
        if path.is_file() {
            fs::remove_file(path)
                .with_context(|| format!("removing existing file {}", path.display()))?;
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating directory {}", parent.display()))?;
            }
        }
        let driver_name = driver_for(path);
        let driver = DriverManager::get_driver_by_name(driver_name)
            .with_context(|| format!("loading OGR driver {}", driver_name))?;
        let dataset = driver
            .create_vector_only(path)
            .with_context(|| format!("creating {}", path.display()))?;
        let mut store = Self {
            dataset,
            path: path.to_path_buf(),
        };
        if driver_name == "GPKG" {
            store.write_version()?;
        }
        debug!(path = %path.display(), driver = driver_name, "created data source");
        Ok(store)
    }

    /// Opens an existing data source read-only.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, GdalOpenFlags::GDAL_OF_VECTOR)
    }

    pub fn open_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::open_with(
                path,
                GdalOpenFlags::GDAL_OF_VECTOR | GdalOpenFlags::GDAL_OF_UPDATE,
            )
        } else {
            Self::create(path)
        }
    }

    fn open_with(path: &Path, open_flags: GdalOpenFlags) -> Result<Self> {
        if !path.exists() {
            bail!("{} does not exist", path.display());
        }
        let options = DatasetOptions {
            open_flags,
            ..Default::default()
        };
        let dataset = Dataset::open_ex(path, options)
            .with_context(|| format!("{} is not a readable vector data source", path.display()))?;
        let store = Self {
            dataset,
            path: path.to_path_buf(),
        };
        store.check_version()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Version stamped in the version layer, if present and parseable.
    pub fn version(&self) -> Result<Option<Version>> {
        if !self.has_layer(VERSION_LAYER)? {
            return Ok(None);
        }
        let table = self.read_layer(VERSION_LAYER)?;
        Ok(Version::parse(table.get_text(0, VERSION_COLUMN).trim()).ok())
    }

    fn write_version(&mut self) -> Result<()> {
        let mut table = Table::with_columns(VERSION_LAYER, vec![Column::text(VERSION_COLUMN)]);
        table.push_values(vec![Value::text(env!("CARGO_PKG_VERSION"))]);
        self.write_layer(VERSION_LAYER, &table)
    }

    fn check_version(&self) -> Result<()> {
        let ours = Version::parse(env!("CARGO_PKG_VERSION"))?;
        if let Some(found) = self.version()? {
            if found > ours {
                warn!(
                    file = %self.path.display(),
                    %found,
                    %ours,
                    "data source was written by a newer converter"
                );
            }
        }
        Ok(())
    }

    /// Stored spelling of a layer name, matched case-insensitively.
    fn resolve(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .layer_names()?
            .into_iter()
            .find(|l| l.eq_ignore_ascii_case(name)))
    }
}

impl LayerStore for OgrStore {
    fn layer_names(&self) -> Result<Vec<String>> {
        Ok(self.dataset.layers().map(|l| l.name()).collect())
    }

    fn read_layer(&self, name: &str) -> Result<Table> {
        let actual = self
            .resolve(name)?
            .ok_or_else(|| anyhow!("layer {} not found in {}", name, self.path.display()))?;
        let mut layer = self
            .dataset
            .layer_by_name(&actual)
            .with_context(|| format!("opening layer {} in {}", actual, self.path.display()))?;

        let columns: Vec<Column> = layer
            .defn()
            .fields()
            .map(|f| Column::new(f.name(), column_type(f.field_type())))
            .collect();
        let declared_kind = layer
            .defn()
            .geom_fields()
            .next()
            .and_then(|g| GeometryKind::from_wkb_code(g.field_type()));
        let crs = layer.spatial_ref().map(|srs| crs_from_srs(&srs));

        let mut table = Table::with_columns(actual.clone(), columns);
        for feature in layer.features() {
            let geometry = match feature.geometry() {
                Some(g) => FeatureGeometry::from_geo(
                    g.to_geo()
                        .with_context(|| format!("decoding geometry in layer {}", actual))?,
                ),
                None => None,
            };
            let values = feature
                .fields()
                .zip(&table.columns)
                .map(|((_, value), col)| value_from_field(value, col.kind))
                .collect();
            table.rows.push(Row { values, geometry });
        }
        table.geometry_kind = declared_kind.or_else(|| {
            table
                .rows
                .iter()
                .find_map(|r| r.geometry.as_ref().map(FeatureGeometry::kind))
        });
        if table.geometry_kind.is_some() {
            table.crs = crs;
        }
        debug!(layer = %actual, rows = table.len(), "read layer");
        Ok(table)
    }

    fn write_layer(&mut self, name: &str, table: &Table) -> Result<()> {
        let srs = match (&table.crs, table.geometry_kind) {
            (Some(crs), Some(_)) => srs_from_crs(crs)?,
            _ => None,
        };
        let ty = table
            .geometry_kind
            .map_or(OGRwkbGeometryType::wkbNone, |k| k.wkb_code());

        let kept: Vec<usize> = table
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.name.eq_ignore_ascii_case(FID_COLUMN))
            .map(|(i, _)| i)
            .collect();
        let fields: Vec<(&str, OGRFieldType::Type)> = kept
            .iter()
            .map(|&i| (table.columns[i].name.as_str(), field_type(table.columns[i].kind)))
            .collect();

        let layer = self
            .dataset
            .create_layer(LayerOptions {
                name,
                srs: srs.as_ref(),
                ty,
                options: Some(&["OVERWRITE=YES"][..]),
            })
            .with_context(|| format!("creating layer {} in {}", name, self.path.display()))?;
        layer.create_defn_fields(&fields)?;
        write_features(&layer, table, &kept)
            .with_context(|| format!("writing layer {} to {}", name, self.path.display()))?;
        debug!(layer = name, rows = table.len(), "wrote layer");
        Ok(())
    }
}

fn write_features(layer: &Layer<'_>, table: &Table, kept: &[usize]) -> Result<()> {
    for row in &table.rows {
        let mut feature = Feature::new(layer.defn())?;
        if let Some(g) = &row.geometry {
            feature.set_geometry(g.to_geo().to_gdal()?)?;
        }
        for (field, &i) in kept.iter().enumerate() {
            match row.values.get(i) {
                Some(Value::Int(v)) => feature.set_field_integer64(field, *v)?,
                Some(Value::Float(v)) => feature.set_field_double(field, *v)?,
                Some(Value::Text(v)) => feature.set_field_string(field, v)?,
                Some(Value::Null) | None => {}
            }
        }
        feature.create(layer)?;
    }
    Ok(())
}

fn crs_from_srs(srs: &SpatialRef) -> Crs {
    let organization = srs.auth_name().unwrap_or_else(|| "NONE".to_string());
    let code = srs.auth_code().unwrap_or(UNDEFINED_SRS);
    Crs {
        srs_id: code,
        name: format!("{}:{}", organization, code),
        organization,
        organization_id: code,
        definition: srs.to_wkt().unwrap_or_else(|_| "undefined".to_string()),
    }
}

/// WKT when the definition carries one, otherwise the EPSG code.
fn srs_from_crs(crs: &Crs) -> Result<Option<SpatialRef>> {
    if !crs.definition.trim().is_empty() && crs.definition != "undefined" {
        return Ok(Some(SpatialRef::from_wkt(&crs.definition)?));
    }
    if crs.organization.eq_ignore_ascii_case("EPSG") && crs.organization_id > 0 {
        let srs = SpatialRef::from_epsg(crs.organization_id as u32)
            .with_context(|| format!("EPSG:{} is not a known CRS", crs.organization_id))?;
        return Ok(Some(srs));
    }
    Ok(None)
}

fn field_type(kind: ColumnType) -> OGRFieldType::Type {
    match kind {
        ColumnType::Text => OGRFieldType::OFTString,
        ColumnType::Real => OGRFieldType::OFTReal,
        ColumnType::Integer => OGRFieldType::OFTInteger64,
    }
}

fn column_type(ty: OGRFieldType::Type) -> ColumnType {
    match ty {
        OGRFieldType::OFTInteger | OGRFieldType::OFTInteger64 => ColumnType::Integer,
        OGRFieldType::OFTReal => ColumnType::Real,
        _ => ColumnType::Text,
    }
}

fn value_from_field(value: Option<FieldValue>, kind: ColumnType) -> Value {
    match value {
        None => Value::Null,
        Some(FieldValue::IntegerValue(i)) if kind == ColumnType::Real => Value::Float(i as f64),
        Some(FieldValue::Integer64Value(i)) if kind == ColumnType::Real => Value::Float(i as f64),
        Some(FieldValue::IntegerValue(i)) => Value::Int(i as i64),
        Some(FieldValue::Integer64Value(i)) => Value::Int(i),
        Some(FieldValue::RealValue(f)) => Value::Float(f),
        Some(FieldValue::StringValue(s)) => Value::Text(s),
        Some(other) => other.into_string().map_or(Value::Null, Value::Text),
    }
}
