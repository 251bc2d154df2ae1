use std::fs;
use std::path::Path;

use swmm_core::geometry::{FeatureGeometry, GeometryKind};
use swmm_core::table::{Column, Table, Value};
use swmm_core::CapturingFeedback;
use swmm_io::estry::schema::NETWORK;
use swmm_io::{
    estry_to_swmm, EstryConvertOptions, EstryInputs, LayerStore, OgrStore, SwmmModel,
    MESSAGES_LAYER,
};
use tempfile::tempdir;

fn channel(t: &mut Table, id: &str, ty: &str, coords: Vec<(f64, f64)>, inverts: (f64, f64)) {
    t.push_named(
        vec![
            ("ID", Value::text(id)),
            ("Type", Value::text(ty)),
            ("n_nF_Cd", Value::Float(0.015)),
            ("US_Invert", Value::Float(inverts.0)),
            ("DS_Invert", Value::Float(inverts.1)),
            ("Width_or_Dia", Value::Float(0.45)),
            ("Number_of", Value::Int(1)),
        ],
        Some(FeatureGeometry::line(coords)),
    );
}

fn write_inputs(path: &Path) {
    let mut network = Table::with_columns(
        "1d_nwk_culverts_L",
        NETWORK.fields.iter().map(|f| f.column()).collect(),
    )
    .with_geometry_kind(GeometryKind::LineString);
    channel(&mut network, "P1", "C", vec![(0.0, 0.0), (10.0, 0.0)], (5.0, 4.8));
    channel(&mut network, "B1", "BB", vec![(10.0, 0.0), (20.0, 0.0)], (4.8, 4.6));

    let mut xs = Table::with_columns(
        "1d_xs_bridges_L",
        vec![Column::text("Source"), Column::text("Type")],
    )
    .with_geometry_kind(GeometryKind::LineString);
    xs.push_named(
        vec![
            ("Source", Value::text("bridge_xs.csv")),
            ("Type", Value::text("XZ")),
        ],
        Some(FeatureGeometry::line(vec![(15.0, -5.0), (15.0, 5.0)])),
    );

    let mut bc = Table::with_columns(
        "1d_bc_outlets_P",
        ["Type", "Flags", "Name", "Descript"]
            .iter()
            .map(|c| Column::text(*c))
            .collect(),
    )
    .with_geometry_kind(GeometryKind::Point);
    bc.push_named(
        vec![("Type", Value::text("HQ")), ("Name", Value::text("Outlet"))],
        Some(FeatureGeometry::point(20.0, 0.0)),
    );

    let mut store = OgrStore::create(path).unwrap();
    for layer in [&network, &xs, &bc] {
        store.write_layer(&layer.name, layer).unwrap();
    }
}

#[test]
fn culverts_and_bridges_become_a_swmm_model() {
    let dir = tempdir().unwrap();
    let inputs_gpkg = dir.path().join("estry.gpkg");
    write_inputs(&inputs_gpkg);
    fs::write(
        dir.path().join("bridge_xs.csv"),
        "X,Z\n0,2.0\n1,1.0\n2,1.0\n3,2.0\n",
    )
    .unwrap();

    let store = OgrStore::open(&inputs_gpkg).unwrap();
    let inputs = EstryInputs {
        network: vec![store.read_layer("1d_nwk_culverts_L").unwrap()],
        cross_sections: vec![store.read_layer("1d_xs_bridges_L").unwrap()],
        bc: vec![store.read_layer("1d_bc_outlets_P").unwrap()],
        xs_base_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };

    let out_gpkg = dir.path().join("swmm.gpkg");
    let out_inp = dir.path().join("swmm.inp");
    let mut fb = CapturingFeedback::new();
    estry_to_swmm(
        &inputs,
        &out_gpkg,
        Some(&out_inp),
        &EstryConvertOptions::default(),
        &mut fb,
    )
    .unwrap();

    let model = SwmmModel::read_inp(&out_inp, &mut fb).unwrap();
    let junctions = model.table("Junctions").unwrap();
    assert_eq!(junctions.keys(), vec!["P1.1", "P1.2"]);
    assert_eq!(junctions.get_f64(1, "Elev"), Some(4.8));

    let outfalls = model.table("Outfalls").unwrap();
    assert_eq!(outfalls.keys(), vec!["B1.2"]);
    assert_eq!(outfalls.get_text(0, "Type"), "FREE");

    let conduits = model.table("Conduits").unwrap();
    assert_eq!(conduits.keys(), vec!["B1", "P1"]);

    let xsections = model.table("XSections").unwrap();
    let bridge = xsections.find_row("B1").unwrap();
    assert_eq!(xsections.get_text(bridge, "Shape"), "CUSTOM");
    assert_eq!(xsections.get_f64(bridge, "Geom1"), Some(1.0));
    assert_eq!(xsections.get_text(bridge, "Curve"), "B1_shape");

    let curves = model.table("Curves").unwrap();
    assert_eq!(curves.key(0), "B1_shape");
    assert_eq!(curves.get_text(0, "Type"), "SHAPE");
    assert_eq!(curves.len(), 2);

    let out = OgrStore::open(&out_gpkg).unwrap();
    assert!(out.has_layer("Curves--Curves").unwrap());
    assert!(fb.errors().is_empty());
}

#[test]
fn missing_cross_section_file_skips_the_bridge() {
    let dir = tempdir().unwrap();
    let inputs_gpkg = dir.path().join("estry.gpkg");
    write_inputs(&inputs_gpkg);

    let store = OgrStore::open(&inputs_gpkg).unwrap();
    let inputs = EstryInputs {
        network: vec![store.read_layer("1d_nwk_culverts_L").unwrap()],
        cross_sections: vec![store.read_layer("1d_xs_bridges_L").unwrap()],
        xs_base_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let mut fb = CapturingFeedback::new();
    let model = estry_to_swmm(
        &inputs,
        &dir.path().join("swmm.gpkg"),
        None,
        &EstryConvertOptions::default(),
        &mut fb,
    )
    .unwrap();

    assert_eq!(model.table("Conduits").unwrap().keys(), vec!["P1"]);
    assert!(fb.mentions("Bridge B1"));
    let out = OgrStore::open(&dir.path().join("swmm.gpkg")).unwrap();
    assert!(out.has_layer(MESSAGES_LAYER).unwrap());
}
