use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "forward.request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with outcome.",
};

pub const REQUESTS: MetricDef = MetricDef {
    name: "forward.requests",
    metric_type: MetricType::Counter,
    description: "Number of forwarded requests. Tagged with outcome (cached, scanned, failed).",
};

pub const REQUESTS_INFLIGHT: MetricDef = MetricDef {
    name: "forward.requests.inflight",
    metric_type: MetricType::Gauge,
    description: "Number of requests currently being processed",
};

pub const ATTEMPTS: MetricDef = MetricDef {
    name: "forward.attempts",
    metric_type: MetricType::Counter,
    description: "Number of upstream attempts. Tagged with source (cache, scan) and result.",
};

pub const ROUTE_CACHE_HIT: MetricDef = MetricDef {
    name: "route_cache.hit",
    metric_type: MetricType::Counter,
    description: "Number of lookups that found a cached route",
};

pub const ROUTE_CACHE_MISS: MetricDef = MetricDef {
    name: "route_cache.miss",
    metric_type: MetricType::Counter,
    description: "Number of lookups without a cached route",
};

pub const ROUTE_CACHE_WRITE: MetricDef = MetricDef {
    name: "route_cache.write",
    metric_type: MetricType::Counter,
    description: "Number of route cache writes",
};

pub const ALARMS: MetricDef = MetricDef {
    name: "alarms",
    metric_type: MetricType::Counter,
    description: "Number of operator alarms. Tagged with result (sent, failed, disabled).",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUEST_DURATION,
    REQUESTS,
    REQUESTS_INFLIGHT,
    ATTEMPTS,
    ROUTE_CACHE_HIT,
    ROUTE_CACHE_MISS,
    ROUTE_CACHE_WRITE,
    ALARMS,
];
