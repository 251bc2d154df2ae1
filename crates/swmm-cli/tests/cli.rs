use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const MODEL: &str = "\
[OPTIONS]
FLOW_UNITS CMS

[JUNCTIONS]
J1 10 2
J2 9 2

[CONDUITS]
C1 J1 J2 50 0.013

[XSECTIONS]
C1 CIRCULAR 0.6 0 0 0 1

[COORDINATES]
J1 0 0
J2 50 0
";

fn swmm_gis() -> Command {
    Command::cargo_bin("swmm-gis").unwrap()
}

#[test]
fn sections_lists_layers() {
    swmm_gis()
        .arg("sections")
        .assert()
        .success()
        .stdout(predicate::str::contains("JUNCTIONS"))
        .stdout(predicate::str::contains("Nodes--Junctions"))
        .stdout(predicate::str::contains("GIS only"));
}

#[test]
fn inp_round_trips_through_a_geopackage() {
    let dir = tempdir().unwrap();
    let inp = dir.path().join("model.inp");
    let gpkg = dir.path().join("model.gpkg");
    let back = dir.path().join("back.inp");
    fs::write(&inp, MODEL).unwrap();

    swmm_gis()
        .args(["inp-to-gpkg", inp.to_str().unwrap(), gpkg.to_str().unwrap()])
        .args(["--crs", "28355"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));
    assert!(gpkg.exists());

    swmm_gis()
        .args(["gpkg-to-inp", gpkg.to_str().unwrap(), back.to_str().unwrap()])
        .assert()
        .success();
    let text = fs::read_to_string(&back).unwrap();
    assert!(text.contains("[CONDUITS]"));
    assert!(text.contains("[COORDINATES]"));
}

#[test]
fn failures_write_diagnostics() {
    let dir = tempdir().unwrap();
    let inp = dir.path().join("broken.inp");
    let gpkg = dir.path().join("broken.gpkg");
    let diagnostics = dir.path().join("diagnostics.json");
    fs::write(
        &inp,
        "[JUNCTIONS]\nJ1 1\n[CONDUITS]\nC1 J1 J9 10 0.01\n[COORDINATES]\nJ1 0 0\n",
    )
    .unwrap();

    swmm_gis()
        .args(["inp-to-gpkg", inp.to_str().unwrap(), gpkg.to_str().unwrap()])
        .assert()
        .success();
    swmm_gis()
        .args([
            "--diagnostics",
            diagnostics.to_str().unwrap(),
            "gpkg-to-inp",
            gpkg.to_str().unwrap(),
            dir.path().join("out.inp").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("topology error"));
    let json = fs::read_to_string(&diagnostics).unwrap();
    assert!(json.contains("J9"));

    let config = dir.path().join("lenient.toml");
    fs::write(&config, "[gpkg_to_inp]\ncheck_references = false\n").unwrap();
    swmm_gis()
        .args(["--config", config.to_str().unwrap(), "gpkg-to-inp"])
        .args([gpkg.to_str().unwrap(), dir.path().join("out.inp").to_str().unwrap()])
        .assert()
        .success();
}

#[test]
fn xs_curve_prints_normalised_rows() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("xs.csv");
    fs::write(&csv, "X,Z\n0,2\n1,1\n2,1\n3,2\n").unwrap();

    swmm_gis()
        .args(["xs-curve", csv.to_str().unwrap(), "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"maxval\": 2.0"));
}

#[test]
fn scenario_arguments_are_checked() {
    let dir = tempdir().unwrap();
    swmm_gis()
        .args(["scenarios", "--scenario", "dev.gpkg"])
        .args(["--out-dir", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NAME=file.gpkg"));
}
