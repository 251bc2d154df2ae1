//! `Messages` layer: converter warnings that have a location.

use swmm_core::geometry::{FeatureGeometry, GeometryKind};
use swmm_core::table::{Column, Crs, Row, Table, Value};
use swmm_core::{Feedback, Severity};

pub const MESSAGES_LAYER: &str = "Messages";

#[derive(Debug, Clone)]
pub struct MessageLog {
    table: Table,
}

impl MessageLog {
    pub fn new(crs: Option<Crs>) -> Self {
        let mut table = Table::with_columns(
            MESSAGES_LAYER,
            vec![Column::text("Severity"), Column::text("Message")],
        )
        .with_geometry_kind(GeometryKind::Point);
        table.crs = crs;
        Self { table }
    }

    /// Forwards to `feedback` and records a located row.
    pub fn warn(
        &mut self,
        feedback: &mut dyn Feedback,
        message: &str,
        location: Option<FeatureGeometry>,
    ) {
        feedback.push_warning(message);
        self.push(Severity::Warning, message, location);
    }

    pub fn error(
        &mut self,
        feedback: &mut dyn Feedback,
        message: &str,
        location: Option<FeatureGeometry>,
    ) {
        feedback.push_error(message);
        self.push(Severity::Error, message, location);
    }

    pub fn push(&mut self, severity: Severity, message: &str, location: Option<FeatureGeometry>) {
        let point = location
            .and_then(|g| g.anchor())
            .map(|c| FeatureGeometry::point(c.x, c.y));
        self.table.push_row(Row {
            values: vec![Value::text(severity.as_str()), Value::text(message)],
            geometry: point,
        });
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use swmm_core::CapturingFeedback;

    use super::*;

    #[test]
    fn messages_are_located_at_the_anchor() {
        let mut fb = CapturingFeedback::new();
        let mut log = MessageLog::new(None);
        log.warn(
            &mut fb,
            "Channel P1 has an unknown type",
            Some(FeatureGeometry::line(vec![(2.0, 3.0), (4.0, 5.0)])),
        );
        log.error(&mut fb, "no location", None);

        assert_eq!(log.len(), 2);
        let t = log.table();
        assert_eq!(t.get_text(0, "Severity"), "warning");
        assert_eq!(t.rows[0].geometry, Some(FeatureGeometry::point(2.0, 3.0)));
        assert_eq!(t.rows[1].geometry, None);
        assert_eq!(fb.warnings().len(), 1);
        assert_eq!(fb.errors().len(), 1);
    }
}
