use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use swmm_io::load_cross_section;
use tabwriter::TabWriter;

#[derive(Serialize)]
struct CurveJson<'a> {
    minval: f64,
    maxval: f64,
    rows: &'a [(f64, f64)],
}

pub fn handle(csv: &Path, kind: &str, json: bool) -> Result<()> {
    let curve = load_cross_section(csv, kind)?;
    if json {
        let out = CurveJson {
            minval: curve.minval,
            maxval: curve.maxval,
            rows: &curve.rows,
        };
        serde_json::to_writer_pretty(io::stdout(), &out)?;
        println!();
        return Ok(());
    }
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "minval\t{}", curve.minval)?;
    writeln!(writer, "maxval\t{}", curve.maxval)?;
    writeln!(writer, "H\tW")?;
    for (h, w) in &curve.rows {
        writeln!(writer, "{:.6}\t{:.6}", h, w)?;
    }
    writer.flush()?;
    Ok(())
}
