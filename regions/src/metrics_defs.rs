//! Metrics definitions for region loading.

use shared::metrics_defs::{MetricDef, MetricType};

pub const CONTROL_PLANE_FETCH_DURATION: MetricDef = MetricDef {
    name: "regions.control_plane.fetch.duration",
    metric_type: MetricType::Histogram,
    description: "Time to fetch the region records from the control plane in seconds",
};

pub const CONTROL_PLANE_RETRIES: MetricDef = MetricDef {
    name: "regions.control_plane.retries",
    metric_type: MetricType::Counter,
    description: "Number of retried control plane requests",
};

pub const REGIONS_LOADED: MetricDef = MetricDef {
    name: "regions.loaded",
    metric_type: MetricType::Gauge,
    description: "Number of clusters in the loaded region directory",
};

pub const ALL_METRICS: &[MetricDef] = &[
    CONTROL_PLANE_FETCH_DURATION,
    CONTROL_PLANE_RETRIES,
    REGIONS_LOADED,
];
