//! # swmm-core: data model for SWMM ⇄ GIS conversion
//!
//! Shared building blocks used by `swmm-io` and the `swmm-gis` binary:
//!
//! - [`Table`], [`Row`], [`Value`]: the tabular intermediate representation
//!   every section and GIS layer is converted through
//! - [`FeatureGeometry`]: typed point/line/polygon geometry (`geo` types)
//! - [`DrainageNetwork`]: a `petgraph` view of nodes and links used to
//!   validate names and references before an `.inp` is written
//! - [`Feedback`]: the injected message sink every conversion reports to
//! - [`SwmmError`]: typed failures

pub mod diagnostics;
pub mod error;
pub mod feedback;
pub mod geometry;
pub mod network;
pub mod table;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{SwmmError, SwmmResult};
pub use feedback::{CapturingFeedback, Feedback, LogFeedback};
pub use geometry::{FeatureGeometry, GeometryKind, SnapIndex};
pub use network::{DrainageNetwork, LinkEnd, TopologyIssue};
pub use table::{Column, ColumnType, Crs, Row, Table, Value};
