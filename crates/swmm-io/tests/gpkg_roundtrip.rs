use std::fs;

use swmm_core::{CapturingFeedback, SwmmError};
use swmm_io::store::VERSION_LAYER;
use swmm_io::{
    gis_to_swmm, swmm_to_gpkg, GisToSwmmOptions, LayerStore, OgrStore, SwmmModel,
    SwmmToGpkgOptions,
};
use tempfile::tempdir;

const MODEL: &str = "\
[TITLE]
Round trip

[OPTIONS]
FLOW_UNITS CMS
FLOW_ROUTING DYNAMIC

[JUNCTIONS]
J1 10 2
J2 9 2

[OUTFALLS]
O1 8 FIXED 8.5

[CONDUITS]
C1 J1 J2 50 0.013
C2 J2 O1 50 0.013

[XSECTIONS]
C1 CIRCULAR 0.6 0 0 0 1
C2 RECT_CLOSED 0.9 1.2 0 0 1

[TIMESERIES]
TS1 0:00 0.0
TS1 1:00 2.5

[COORDINATES]
J1 0 0
J2 50 0
O1 100 0

[VERTICES]
C1 25 5
";

#[test]
fn inp_survives_a_geopackage_round_trip() {
    let dir = tempdir().unwrap();
    let inp = dir.path().join("model.inp");
    let gpkg = dir.path().join("model.gpkg");
    let back = dir.path().join("back.inp");
    fs::write(&inp, MODEL).unwrap();

    let mut fb = CapturingFeedback::new();
    let options = SwmmToGpkgOptions {
        crs: Some(28355),
        ..SwmmToGpkgOptions::default()
    };
    let original = swmm_to_gpkg(&inp, &gpkg, &options, &mut fb).unwrap();

    let store = OgrStore::open(&gpkg).unwrap();
    let names = store.layer_names().unwrap();
    assert!(names.iter().any(|n| n == VERSION_LAYER));
    assert!(names.iter().any(|n| n == "Nodes--Junctions"));
    assert!(names.iter().any(|n| n == "Links--Conduits"));
    let conduits = store.read_layer("Links--Conduits").unwrap();
    assert_eq!(conduits.get_text(1, "xsec_Shape"), "RECT_CLOSED");
    assert_eq!(conduits.crs.as_ref().map(|c| c.srs_id), Some(28355));
    assert!(dir.path().join("model_ts").join("TS1.csv").exists());

    gis_to_swmm(&gpkg, &back, &GisToSwmmOptions::default(), &mut fb).unwrap();
    let restored = SwmmModel::read_inp(&back, &mut fb).unwrap();

    for section in [
        "Junctions",
        "Outfalls",
        "Conduits",
        "XSections",
        "Timeseries",
        "Coordinates",
        "Vertices",
    ] {
        let a = original.table(section).unwrap();
        let b = restored.table(section).unwrap();
        assert_eq!(a.keys(), b.keys(), "{}", section);
        for row in 0..a.len() {
            for column in a.column_names() {
                assert_eq!(
                    b.get(row, column),
                    a.get(row, column),
                    "{} row {} column {}",
                    section,
                    row,
                    column
                );
            }
        }
    }
    let outfalls = restored.table("Outfalls").unwrap();
    assert_eq!(outfalls.get_text(0, "Type"), "FIXED");
    assert_eq!(outfalls.get_f64(0, "Stage"), Some(8.5));
    let xs = restored.table("XSections").unwrap();
    assert_eq!(xs.get_f64(1, "Geom2"), Some(1.2));
    let vertices = restored.table("Vertices").unwrap();
    assert_eq!(vertices.keys(), vec!["C1"]);
    assert_eq!(vertices.get_f64(0, "Y"), Some(5.0));
    assert!(fb.errors().is_empty());
}

#[test]
fn dangling_links_stop_the_conversion() {
    let dir = tempdir().unwrap();
    let inp = dir.path().join("broken.inp");
    let gpkg = dir.path().join("broken.gpkg");
    fs::write(
        &inp,
        "[JUNCTIONS]\nJ1 1\n[CONDUITS]\nC1 J1 J9 10 0.01\n[COORDINATES]\nJ1 0 0\n",
    )
    .unwrap();

    let mut fb = CapturingFeedback::new();
    swmm_to_gpkg(&inp, &gpkg, &SwmmToGpkgOptions::default(), &mut fb).unwrap();
    let err = gis_to_swmm(
        &gpkg,
        &dir.path().join("out.inp"),
        &GisToSwmmOptions::default(),
        &mut fb,
    )
    .unwrap_err();
    assert!(err.chain().any(|e| matches!(e.downcast_ref::<SwmmError>(), Some(SwmmError::Fatal(_)))));
    assert!(fb.mentions("J9"));

    let lenient = GisToSwmmOptions {
        check_references: false,
        ..GisToSwmmOptions::default()
    };
    let mut fb = CapturingFeedback::new();
    gis_to_swmm(&gpkg, &dir.path().join("out.inp"), &lenient, &mut fb).unwrap();
    assert!(!fb.warnings().is_empty());
}
