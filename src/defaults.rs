//! Engine constants and graph configuration

use std::f64::consts::PI;

/// Exchange format version produced by export and accepted by ingestion.
pub const FORMAT_VERSION: &str = "0.3.0";

/// Canvas coordinate reported for a direction parallel to the rectilinear canvas.
pub const POINT_AT_INFINITY: f64 = (1u64 << 30) as f64;

/// Angular step used when sampling a curvilinear perspective line.
pub const LINE_STEP_ANGLE: f64 = 2.0 * PI / 100.0;

/// Upper bound on samples per curvilinear perspective line.
pub const LINE_MAX_STEPS: usize = 200;

/// Below this length a measure point difference falls back to forward.
pub const MEASURE_EPSILON: f64 = 0.000001;

/// Compute steps allowed in one cascade before it is reported as runaway.
pub const CASCADE_BUDGET: usize = 10_000;

/// Name of the synthetic root group.
pub const ROOT_NAME: &str = "root";

/// Tunable settings for a [`SceneGraph`](crate::SceneGraph).
#[derive(Debug, Clone, PartialEq)]
pub struct GraphConfig {
    /// Maximum compute steps per `update`, `compute` or ingestion cascade.
    pub cascade_budget: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            cascade_budget: CASCADE_BUDGET,
        }
    }
}

impl GraphConfig {
    pub fn with_cascade_budget(mut self, steps: usize) -> Self {
        self.cascade_budget = steps;
        self
    }
}
