//! Splits several versions of one model into shared and per-scenario parts.
//!
//! Records are grouped into entities by key (a curve or time series is one
//! entity spread over many rows). An entity that is identical in every
//! scenario goes to the common set; everything else goes to the scenarios
//! that contain it. A control-file snippet reads the common model and then
//! the scenario-specific one.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use swmm_core::table::{Column, Row, Table};
use swmm_core::Feedback;
use tracing::info;

use crate::messages::MESSAGES_LAYER;
use crate::reconcile::{layers_to_model, write_layers, GisToSwmmOptions};
use crate::store::{LayerStore, MemoryStore, OgrStore, VERSION_LAYER};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioOptions {
    /// File name prefix of every output.
    pub prefix: String,
    /// Also write an `.inp` file next to each GeoPackage.
    pub write_inp: bool,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self {
            prefix: "scenarios".to_string(),
            write_inp: true,
        }
    }
}

/// Files written for one output set.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutput {
    pub scenario: String,
    pub gpkg: PathBuf,
    pub inp: Option<PathBuf>,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub common: ScenarioOutput,
    pub scenarios: Vec<ScenarioOutput>,
    pub control_file: PathBuf,
    pub manifest: PathBuf,
}

/// Layers shared by all scenarios, and per scenario the layers that differ.
#[derive(Debug, Clone, Default)]
pub struct ScenarioSplit {
    pub common: Vec<Table>,
    pub scenarios: Vec<(String, Vec<Table>)>,
}

/// Splits per-scenario layer sets. Layers are matched by name and their
/// columns unioned before rows are compared.
pub fn split_scenarios(sets: &[(String, Vec<Table>)]) -> ScenarioSplit {
    let mut layer_names: Vec<String> = Vec::new();
    for (_, layers) in sets {
        for layer in layers {
            if !layer_names.iter().any(|n| n.eq_ignore_ascii_case(&layer.name)) {
                layer_names.push(layer.name.clone());
            }
        }
    }

    let mut split = ScenarioSplit {
        common: Vec::new(),
        scenarios: sets.iter().map(|(name, _)| (name.clone(), Vec::new())).collect(),
    };
    for layer_name in &layer_names {
        let found: Vec<Option<&Table>> = sets
            .iter()
            .map(|(_, layers)| layers.iter().find(|l| l.name.eq_ignore_ascii_case(layer_name)))
            .collect();
        let template = found.iter().flatten().next().copied();
        let Some(template) = template else {
            continue;
        };
        let columns = union_columns(found.iter().flatten().copied());
        let aligned: Vec<Option<Table>> = found
            .iter()
            .map(|t| t.map(|t| t.select(layer_name, &columns)))
            .collect();
        let grouped: Vec<Option<Entities>> = aligned
            .iter()
            .map(|t| t.as_ref().map(Entities::of))
            .collect();

        let mut common = empty_like(template, layer_name, &columns);
        let mut per_scenario: Vec<Table> = (0..sets.len())
            .map(|_| empty_like(template, layer_name, &columns))
            .collect();

        let mut keys: Vec<&str> = Vec::new();
        for entities in grouped.iter().flatten() {
            for key in &entities.order {
                if !keys.contains(&key.as_str()) {
                    keys.push(key);
                }
            }
        }
        for key in keys {
            let versions: Vec<Option<&Vec<Row>>> = grouped
                .iter()
                .map(|g| g.as_ref().and_then(|e| e.rows.get(key)))
                .collect();
            let shared = match versions.first() {
                Some(Some(first)) => versions.iter().all(|v| v.as_ref() == Some(first)),
                _ => false,
            };
            if shared {
                if let Some(Some(rows)) = versions.first() {
                    common.rows.extend(rows.iter().cloned());
                }
                continue;
            }
            for (i, version) in versions.iter().enumerate() {
                if let Some(rows) = version {
                    per_scenario[i].rows.extend(rows.iter().cloned());
                }
            }
        }

        if !common.is_empty() {
            split.common.push(common);
        }
        for (i, table) in per_scenario.into_iter().enumerate() {
            if !table.is_empty() {
                split.scenarios[i].1.push(table);
            }
        }
    }
    split
}

/// Rows grouped by key, keys in first-seen order.
struct Entities {
    order: Vec<String>,
    rows: HashMap<String, Vec<Row>>,
}

impl Entities {
    fn of(table: &Table) -> Self {
        let mut order = Vec::new();
        let mut rows: HashMap<String, Vec<Row>> = HashMap::new();
        for (i, row) in table.rows.iter().enumerate() {
            let key = table.key(i);
            if !rows.contains_key(&key) {
                order.push(key.clone());
            }
            rows.entry(key).or_default().push(row.clone());
        }
        Self { order, rows }
    }
}

fn union_columns<'a>(tables: impl Iterator<Item = &'a Table>) -> Vec<Column> {
    let mut columns: Vec<Column> = Vec::new();
    for table in tables {
        for col in &table.columns {
            if !columns.iter().any(|c| c.name.eq_ignore_ascii_case(&col.name)) {
                columns.push(col.clone());
            }
        }
    }
    columns
}

fn empty_like(template: &Table, name: &str, columns: &[Column]) -> Table {
    let mut table = Table::with_columns(name, columns.to_vec());
    table.geometry_kind = template.geometry_kind;
    table.crs = template.crs.clone();
    table
}

fn read_section_layers(path: &Path) -> Result<Vec<Table>> {
    let store = OgrStore::open(path)?;
    let mut layers = Vec::new();
    for name in store.layer_names()? {
        if name.eq_ignore_ascii_case(VERSION_LAYER) || name.eq_ignore_ascii_case(MESSAGES_LAYER) {
            continue;
        }
        layers.push(
            store
                .read_layer(&name)
                .with_context(|| format!("reading layer {} of {}", name, path.display()))?,
        );
    }
    Ok(layers)
}

/// Reads one GeoPackage per scenario and writes `<prefix>_Common` and
/// `<prefix>_<scenario>` outputs plus `<prefix>_control_lines.txt` into
/// `out_dir`.
pub fn extract_scenarios(
    scenarios: &[(String, PathBuf)],
    out_dir: &Path,
    options: &ScenarioOptions,
    feedback: &mut dyn Feedback,
) -> Result<ScenarioReport> {
    if scenarios.is_empty() {
        bail!("no scenarios were given");
    }
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating scenario output directory {}", out_dir.display()))?;

    let mut sets = Vec::with_capacity(scenarios.len());
    for (name, path) in scenarios {
        feedback.check_canceled()?;
        sets.push((name.clone(), read_section_layers(path)?));
    }
    let split = split_scenarios(&sets);

    let common_name = format!("{}_Common", options.prefix);
    let common = write_set(&common_name, "Common", &split.common, out_dir, options, feedback)?;

    let mut outputs = Vec::new();
    for (name, layers) in &split.scenarios {
        feedback.check_canceled()?;
        if layers.is_empty() {
            feedback.push_info(&format!("Scenario {} has no differences from the common model", name));
            continue;
        }
        let stem = format!("{}_{}", options.prefix, sanitize_name(name));
        outputs.push(write_set(&stem, name, layers, out_dir, options, feedback)?);
    }

    let control_file = out_dir.join(format!("{}_control_lines.txt", options.prefix));
    fs::write(&control_file, control_lines(&common, &outputs))
        .with_context(|| format!("writing {}", control_file.display()))?;
    info!(
        scenarios = outputs.len(),
        common_rows = common.rows,
        control = %control_file.display(),
        "extracted scenarios"
    );
    let report = ScenarioReport {
        common,
        scenarios: outputs,
        control_file,
        manifest: out_dir.join(format!("{}_manifest.json", options.prefix)),
    };
    write_manifest(&report.manifest, &report)?;
    Ok(report)
}

/// Lists every written file as JSON.
pub fn write_manifest(path: &Path, report: &ScenarioReport) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("creating scenario manifest '{}'", path.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("writing scenario manifest '{}'", path.display()))?;
    Ok(())
}

fn write_set(
    stem: &str,
    scenario: &str,
    layers: &[Table],
    out_dir: &Path,
    options: &ScenarioOptions,
    feedback: &mut dyn Feedback,
) -> Result<ScenarioOutput> {
    let gpkg = out_dir.join(format!("{}.gpkg", stem));
    let mut store = OgrStore::create(&gpkg)?;
    write_layers(&mut store, layers, feedback)?;

    let inp = if options.write_inp {
        // a partial model: references into the other part are expected
        let reconcile = GisToSwmmOptions {
            check_references: false,
            ..GisToSwmmOptions::default()
        };
        let memory = MemoryStore::with_layers(layers.iter().cloned());
        let model = layers_to_model(&memory, &reconcile, feedback)
            .with_context(|| format!("building {} model", scenario))?;
        let path = out_dir.join(format!("{}.inp", stem));
        model.write_inp(&path)?;
        Some(path)
    } else {
        None
    };
    Ok(ScenarioOutput {
        scenario: scenario.to_string(),
        gpkg,
        inp,
        rows: layers.iter().map(Table::len).sum(),
    })
}

/// `Read SWMM` directives: the common model, then one branch per scenario.
pub fn control_lines(common: &ScenarioOutput, scenarios: &[ScenarioOutput]) -> String {
    let file = |o: &ScenarioOutput| {
        let path = o.inp.as_ref().unwrap_or(&o.gpkg);
        path.file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let mut out = String::new();
    let _ = writeln!(out, "Read SWMM == {}", file(common));
    for (i, scenario) in scenarios.iter().enumerate() {
        let keyword = if i == 0 { "If" } else { "Else If" };
        let _ = writeln!(out, "{} Scenario == {}", keyword, scenario.scenario);
        let _ = writeln!(out, "    Read SWMM == {}", file(scenario));
    }
    if !scenarios.is_empty() {
        out.push_str("End If\n");
    }
    out
}

fn sanitize_name(value: &str) -> String {
    let filtered: String = value
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | ' ') { '_' } else { c })
        .collect();
    if filtered.is_empty() {
        "scenario".to_string()
    } else {
        filtered
    }
}
