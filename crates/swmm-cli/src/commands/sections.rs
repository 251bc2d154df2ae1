use std::io::{self, Write};

use anyhow::Result;
use swmm_io::sections::all_sections;
use tabwriter::TabWriter;

pub fn handle() -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "SECTION\tLAYER\tGEOMETRY\tNOTES")?;
    for section in all_sections() {
        let geometry = section.geometry.map_or("-", |g| g.kind().gpkg_name());
        let layer = if section.folded {
            "-".to_string()
        } else {
            section.layer_name()
        };
        let notes = match (section.gis_only, section.folded) {
            (true, _) => "GIS only",
            (_, true) => "merged into other layers",
            _ => "",
        };
        writeln!(writer, "{}\t{}\t{}\t{}", section.header(), layer, geometry, notes)?;
    }
    writer.flush()?;
    Ok(())
}
