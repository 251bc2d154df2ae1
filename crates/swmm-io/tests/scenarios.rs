use std::fs;
use std::path::{Path, PathBuf};

use swmm_core::CapturingFeedback;
use swmm_io::{
    extract_scenarios, swmm_to_gpkg, LayerStore, OgrStore, ScenarioOptions, SwmmModel,
    SwmmToGpkgOptions,
};
use tempfile::tempdir;

fn model(j2_elev: f64) -> String {
    format!(
        "[OPTIONS]\nFLOW_UNITS CMS\n\n\
         [JUNCTIONS]\nJ1 10 2\nJ2 {} 2\n\n\
         [CONDUITS]\nC1 J1 J2 50 0.013\n\n\
         [XSECTIONS]\nC1 CIRCULAR 0.6 0 0 0 1\n\n\
         [COORDINATES]\nJ1 0 0\nJ2 50 0\n",
        j2_elev
    )
}

fn scenario_gpkg(dir: &Path, name: &str, j2_elev: f64) -> PathBuf {
    let inp = dir.join(format!("{}.inp", name));
    let gpkg = dir.join(format!("{}.gpkg", name));
    fs::write(&inp, model(j2_elev)).unwrap();
    let options = SwmmToGpkgOptions {
        export_timeseries_csv: false,
        ..SwmmToGpkgOptions::default()
    };
    swmm_to_gpkg(&inp, &gpkg, &options, &mut CapturingFeedback::new()).unwrap();
    gpkg
}

#[test]
fn only_changed_rows_land_in_scenario_outputs() {
    let dir = tempdir().unwrap();
    let exg = scenario_gpkg(dir.path(), "exg", 9.0);
    let dev = scenario_gpkg(dir.path(), "dev", 8.5);
    let out_dir = dir.path().join("out");

    let options = ScenarioOptions {
        prefix: "flood".into(),
        ..ScenarioOptions::default()
    };
    let mut fb = CapturingFeedback::new();
    let report = extract_scenarios(
        &[("EXG".into(), exg), ("DEV".into(), dev)],
        &out_dir,
        &options,
        &mut fb,
    )
    .unwrap();
    assert_eq!(report.scenarios.len(), 2);

    let common = SwmmModel::read_inp(&out_dir.join("flood_Common.inp"), &mut fb).unwrap();
    assert_eq!(common.table("Junctions").unwrap().keys(), vec!["J1"]);
    assert_eq!(common.table("Conduits").unwrap().keys(), vec!["C1"]);

    let dev_store = OgrStore::open(&out_dir.join("flood_DEV.gpkg")).unwrap();
    let junctions = dev_store.read_layer("Nodes--Junctions").unwrap();
    assert_eq!(junctions.keys(), vec!["J2"]);
    assert_eq!(junctions.get_f64(0, "Elev"), Some(8.5));
    assert!(!dev_store.has_layer("Links--Conduits").unwrap());

    let manifest = fs::read_to_string(&report.manifest).unwrap();
    assert!(manifest.contains("flood_DEV.gpkg"));

    let control = fs::read_to_string(&report.control_file).unwrap();
    assert_eq!(
        control,
        "Read SWMM == flood_Common.inp\n\
         If Scenario == EXG\n    Read SWMM == flood_EXG.inp\n\
         Else If Scenario == DEV\n    Read SWMM == flood_DEV.inp\n\
         End If\n"
    );
}

#[test]
fn identical_scenarios_have_nothing_of_their_own() {
    let dir = tempdir().unwrap();
    let a = scenario_gpkg(dir.path(), "a", 9.0);
    let b = scenario_gpkg(dir.path(), "b", 9.0);
    let out_dir = dir.path().join("out");

    let mut fb = CapturingFeedback::new();
    let report = extract_scenarios(
        &[("A".into(), a), ("B".into(), b)],
        &out_dir,
        &ScenarioOptions::default(),
        &mut fb,
    )
    .unwrap();
    assert!(report.scenarios.is_empty());
    assert!(out_dir.join("scenarios_Common.gpkg").exists());
    let control = fs::read_to_string(&report.control_file).unwrap();
    assert_eq!(control, "Read SWMM == scenarios_Common.inp\n");
}
