//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem)
//! but are themselves concrete structs, not traits.

mod org_chart;

pub use org_chart::{to_json, ChartStats, OrgChartService, ProcessOutput};
