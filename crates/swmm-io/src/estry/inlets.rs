//! ESTRY pits to SWMM inlets and inlet usage.

use std::collections::HashSet;
use std::path::Path;

use swmm_core::geometry::FeatureGeometry;
use swmm_core::table::{Crs, Table, Value};
use swmm_core::{Feedback, SwmmResult};

use crate::messages::MessageLog;
use crate::sections::find_section;

/// Width of the 2D connection for a pit. Negative values are cell counts
/// and pass through; positive values are multiplied by the cell size.
pub fn connection_width(conn_no: f64, reference_cell_size: f64) -> f64 {
    if conn_no < 0.0 {
        conn_no
    } else {
        conn_no * reference_cell_size
    }
}

/// One pit read from an ESTRY network point layer.
#[derive(Debug, Clone)]
pub struct Pit {
    pub node: String,
    pub location: FeatureGeometry,
    pub pit_type: String,
    pub inlet_type: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub number: i64,
    pub conn_1d_2d: String,
    pub conn_no: Option<f64>,
    pub elevation: Option<f64>,
}

/// Accumulates the `Inlets` and `Inlet_Usage` tables.
#[derive(Debug)]
pub struct InletBuilder {
    inlets: Table,
    usage: Table,
    defined: HashSet<String>,
}

impl InletBuilder {
    pub fn new(crs: Option<Crs>) -> SwmmResult<Self> {
        let inlets = find_section("Inlets")?.empty_table();
        let mut usage = find_section("Inlet_Usage")?.empty_table();
        usage.crs = crs;
        Ok(Self {
            inlets,
            usage,
            defined: HashSet::new(),
        })
    }

    pub fn add_pit(
        &mut self,
        pit: &Pit,
        reference_cell_size: f64,
        log: &mut MessageLog,
        feedback: &mut dyn Feedback,
    ) {
        let inlet = match pit.pit_type.trim().to_ascii_uppercase().as_str() {
            "Q" => {
                let curve = file_stem(&pit.inlet_type);
                if self.define(&curve) {
                    self.inlets.push_named(
                        vec![
                            ("Name", Value::text(&curve)),
                            ("Type", Value::text("CUSTOM")),
                            ("Custom_Curve", Value::text(&curve)),
                        ],
                        None,
                    );
                    log.warn(
                        feedback,
                        &format!(
                            "Inlet {} uses a depth/discharge table; add curve {} to [CURVES]",
                            curve, curve
                        ),
                        Some(pit.location.clone()),
                    );
                }
                curve
            }
            "W" | "R" => {
                let length = pit.width.unwrap_or(0.0);
                let height = pit.height.unwrap_or(0.0);
                let name = format!("CURB_L{}_H{}", length, height);
                if self.define(&name) {
                    self.inlets.push_named(
                        vec![
                            ("Name", Value::text(&name)),
                            ("Type", Value::text("CURB")),
                            ("Curb_Length", Value::Float(length)),
                            ("Curb_Height", Value::Float(height)),
                            ("Curb_Throat", Value::text("HORIZONTAL")),
                        ],
                        None,
                    );
                }
                name
            }
            other => {
                let name = if pit.inlet_type.trim().is_empty() {
                    format!("Inlet_{}", pit.node)
                } else {
                    file_stem(&pit.inlet_type)
                };
                if self.define(&name) {
                    self.inlets.push_named(vec![("Name", Value::text(&name))], None);
                }
                log.warn(
                    feedback,
                    &format!(
                        "Pit {} has type '{}' with no SWMM inlet equivalent; \
                         inlet {} must be completed manually",
                        pit.node, other, name
                    ),
                    Some(pit.location.clone()),
                );
                name
            }
        };

        let conn_width = pit
            .conn_no
            .map(|c| Value::Float(connection_width(c, reference_cell_size)))
            .unwrap_or(Value::Null);
        self.usage.push_named(
            vec![
                ("Inlet", Value::text(inlet)),
                ("StreetXSEC", Value::Null),
                ("Elevation", pit.elevation.into()),
                ("Number", Value::Int(pit.number.max(1))),
                ("CloggedPct", Value::Float(0.0)),
                ("Qmax", Value::Float(0.0)),
                ("Conn1D_2D", Value::text(&pit.conn_1d_2d)),
                ("Conn_width", conn_width),
                ("Node", Value::text(&pit.node)),
            ],
            Some(pit.location.clone()),
        );
    }

    fn define(&mut self, name: &str) -> bool {
        self.defined.insert(name.to_string())
    }

    /// Drops the usage rows of `node`. Returns true when any were removed.
    pub fn remove_node(&mut self, node: &str) -> bool {
        let before = self.usage.len();
        let Some(col) = self.usage.column_index("Node") else {
            return false;
        };
        self.usage
            .rows
            .retain(|r| r.values.get(col).map(Value::to_text).as_deref() != Some(node));
        before != self.usage.len()
    }

    /// `(Inlets, Inlet_Usage)`.
    pub fn into_tables(self) -> (Table, Table) {
        (self.inlets, self.usage)
    }
}

/// File name without directory or extension, as used for curve names.
fn file_stem(value: &str) -> String {
    let trimmed = value.trim();
    Path::new(trimmed)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use swmm_core::CapturingFeedback;

    use super::*;

    fn pit(node: &str, pit_type: &str, inlet_type: &str) -> Pit {
        Pit {
            node: node.to_string(),
            location: FeatureGeometry::point(1.0, 2.0),
            pit_type: pit_type.to_string(),
            inlet_type: inlet_type.to_string(),
            width: Some(1.2),
            height: Some(0.15),
            number: 1,
            conn_1d_2d: "SX".to_string(),
            conn_no: Some(3.0),
            elevation: Some(10.0),
        }
    }

    #[test]
    fn connection_width_sign_convention() {
        assert_eq!(connection_width(-3.0, 5.0), -3.0);
        assert_eq!(connection_width(3.0, 5.0), 15.0);
        assert_eq!(connection_width(0.0, 5.0), 0.0);
    }

    #[test]
    fn curb_inlets_are_named_by_size_and_shared() {
        let mut fb = CapturingFeedback::new();
        let mut log = MessageLog::new(None);
        let mut b = InletBuilder::new(None).unwrap();
        b.add_pit(&pit("N1", "R", ""), 5.0, &mut log, &mut fb);
        b.add_pit(&pit("N2", "w", ""), 5.0, &mut log, &mut fb);
        let (inlets, usage) = b.into_tables();
        assert_eq!(inlets.len(), 1);
        assert_eq!(inlets.key(0), "CURB_L1.2_H0.15");
        assert_eq!(inlets.get_text(0, "Curb_Throat"), "HORIZONTAL");
        assert_eq!(usage.len(), 2);
        assert_eq!(usage.get_f64(1, "Conn_width"), Some(15.0));
        assert_eq!(usage.get_text(1, "Node"), "N2");
        assert!(usage.rows[0].geometry.is_some());
    }

    #[test]
    fn custom_and_placeholder_inlets_warn() {
        let mut fb = CapturingFeedback::new();
        let mut log = MessageLog::new(None);
        let mut b = InletBuilder::new(None).unwrap();
        b.add_pit(&pit("N1", "Q", "curves/pit_a.csv"), 5.0, &mut log, &mut fb);
        b.add_pit(&pit("N2", "C", ""), 5.0, &mut log, &mut fb);
        assert!(b.remove_node("N2"));
        let (inlets, usage) = b.into_tables();
        assert_eq!(inlets.get_text(0, "Custom_Curve"), "pit_a");
        assert_eq!(inlets.key(1), "Inlet_N2");
        assert_eq!(usage.len(), 1);
        assert!(fb.mentions("add curve pit_a"));
        assert!(fb.mentions("must be completed manually"));
        assert_eq!(log.len(), 2);
    }
}
