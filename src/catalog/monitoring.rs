//! Operational series: per-service health samples, per-endpoint API metrics,
//! and the internal request log. All three are read-only.

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::store::record::round_percent;
use crate::store::{Collection, Record, SeedContext, SortDir, SortKey, Store};

const SERVICES: &[&str] = &["api-gateway", "auth", "billing", "search"];

const HOURS: i64 = 24;

string_enum!(HealthStatus {
    Healthy => "healthy",
    Degraded => "degraded",
    Down => "down",
});

impl HealthStatus {
    /// Classify a sample by its worst signal.
    pub fn classify(cpu_pct: f64, p95_latency_ms: u64) -> Self {
        if cpu_pct >= 95.0 || p95_latency_ms >= 1_500 {
            Self::Down
        } else if cpu_pct >= 80.0 || p95_latency_ms >= 600 {
            Self::Degraded
        } else {
            Self::Healthy
        }
    }
}

string_enum!(HttpMethod {
    Get => "GET",
    Post => "POST",
    Put => "PUT",
    Patch => "PATCH",
    Delete => "DELETE",
});

string_enum!(LogLevel {
    Info => "info",
    Warn => "warn",
    Error => "error",
});

impl LogLevel {
    pub fn for_status(status_code: u16) -> Self {
        match status_code {
            500.. => Self::Error,
            400..=499 => Self::Warn,
            _ => Self::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringMetric {
    pub id: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
    pub cpu_pct: f64,
    pub memory_pct: f64,
    pub p95_latency_ms: u64,
    pub status: HealthStatus,
}

impl Record for MonitoringMetric {
    const KEY: &'static str = "monitoring_metrics";
    const DEFAULT_SORT: (&'static str, SortDir) = ("timestamp", SortDir::Desc);

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Borrowed(self.service.as_str())]
    }

    fn status(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.timestamp)
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "service" => Some(SortKey::text(&self.service)),
            "timestamp" => Some(SortKey::Time(self.timestamp)),
            "cpu_pct" => Some(SortKey::Number(self.cpu_pct)),
            "memory_pct" => Some(SortKey::Number(self.memory_pct)),
            "p95_latency_ms" => Some(SortKey::Number(self.p95_latency_ms as f64)),
            "status" => Some(SortKey::text(self.status.as_str())),
            _ => None,
        }
    }

    fn seed(ctx: &mut SeedContext<'_>) -> Vec<Self> {
        let hour = ctx
            .now
            .duration_trunc(Duration::hours(1))
            .unwrap_or(ctx.now);
        let mut samples = Vec::with_capacity(SERVICES.len() * HOURS as usize);
        for service in SERVICES {
            for offset in 0..HOURS {
                // mostly quiet, with the occasional spike
                let (cpu, latency) = if ctx.chance(0.1) {
                    (ctx.float(75.0, 99.0), ctx.range(400, 2_000))
                } else {
                    (ctx.float(12.0, 70.0), ctx.range(40, 450))
                };
                let cpu_pct = round_percent(cpu);
                samples.push(MonitoringMetric {
                    id: ctx.id(),
                    service: service.to_string(),
                    timestamp: hour - Duration::hours(offset),
                    cpu_pct,
                    memory_pct: round_percent(ctx.float(30.0, 90.0)),
                    p95_latency_ms: latency,
                    status: HealthStatus::classify(cpu_pct, latency),
                });
            }
        }
        samples
    }
}

const ENDPOINTS: &[(HttpMethod, &str)] = &[
    (HttpMethod::Get, "/api/users"),
    (HttpMethod::Post, "/api/users"),
    (HttpMethod::Get, "/api/payments"),
    (HttpMethod::Post, "/api/payments/refund"),
    (HttpMethod::Get, "/api/analytics/daily"),
    (HttpMethod::Patch, "/api/subscriptions"),
    (HttpMethod::Delete, "/api/keys"),
    (HttpMethod::Put, "/api/settings"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalApiMetric {
    pub id: String,
    pub endpoint: String,
    pub method: HttpMethod,
    pub requests: u64,
    pub success_rate: f64,
    /// Always `100 - success_rate`.
    pub error_rate: f64,
    pub p95_latency_ms: u64,
    pub updated_at: DateTime<Utc>,
}

impl InternalApiMetric {
    pub fn new(
        id: String,
        method: HttpMethod,
        endpoint: &str,
        requests: u64,
        success_rate: f64,
        p95_latency_ms: u64,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let success_rate = round_percent(success_rate);
        Self {
            id,
            endpoint: endpoint.to_string(),
            method,
            requests,
            success_rate,
            error_rate: round_percent(100.0 - success_rate),
            p95_latency_ms,
            updated_at,
        }
    }
}

impl Record for InternalApiMetric {
    const KEY: &'static str = "internal_api_metrics";
    const DEFAULT_SORT: (&'static str, SortDir) = ("requests", SortDir::Desc);

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.endpoint.as_str()),
            Cow::Borrowed(self.method.as_str()),
        ]
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.updated_at)
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "endpoint" => Some(SortKey::text(&self.endpoint)),
            "method" => Some(SortKey::text(self.method.as_str())),
            "requests" => Some(SortKey::Number(self.requests as f64)),
            "success_rate" => Some(SortKey::Number(self.success_rate)),
            "error_rate" => Some(SortKey::Number(self.error_rate)),
            "p95_latency_ms" => Some(SortKey::Number(self.p95_latency_ms as f64)),
            "updated_at" => Some(SortKey::Time(self.updated_at)),
            _ => None,
        }
    }

    fn seed(ctx: &mut SeedContext<'_>) -> Vec<Self> {
        ENDPOINTS
            .iter()
            .map(|(method, endpoint)| {
                let id = ctx.id();
                let requests = ctx.range(500, 50_000);
                let success = ctx.float(92.0, 100.0);
                let latency = ctx.range(30, 900);
                let updated_at = ctx.minutes_ago(60);
                InternalApiMetric::new(id, *method, endpoint, requests, success, latency, updated_at)
            })
            .collect()
    }
}

const STATUS_CODES: &[u16] = &[200, 200, 200, 200, 201, 204, 301, 400, 401, 404, 429, 500, 503];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalApiLog {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub method: HttpMethod,
    pub endpoint: String,
    pub status_code: u16,
    pub latency_ms: u64,
    pub level: LogLevel,
}

impl Record for InternalApiLog {
    const KEY: &'static str = "internal_api_logs";
    const DEFAULT_SORT: (&'static str, SortDir) = ("timestamp", SortDir::Desc);

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.method.as_str()),
            Cow::Borrowed(self.endpoint.as_str()),
            Cow::Owned(self.status_code.to_string()),
        ]
    }

    fn status(&self) -> Option<&str> {
        Some(self.level.as_str())
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.timestamp)
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "timestamp" => Some(SortKey::Time(self.timestamp)),
            "method" => Some(SortKey::text(self.method.as_str())),
            "endpoint" => Some(SortKey::text(&self.endpoint)),
            "status_code" => Some(SortKey::Number(f64::from(self.status_code))),
            "latency_ms" => Some(SortKey::Number(self.latency_ms as f64)),
            "level" => Some(SortKey::text(self.level.as_str())),
            _ => None,
        }
    }

    fn seed(ctx: &mut SeedContext<'_>) -> Vec<Self> {
        (0..60)
            .map(|_| {
                let (method, endpoint) = ctx.pick(ENDPOINTS);
                let status_code = ctx.pick(STATUS_CODES);
                InternalApiLog {
                    id: ctx.id(),
                    timestamp: ctx.minutes_ago(HOURS * 60),
                    method,
                    endpoint: endpoint.to_string(),
                    status_code,
                    latency_ms: ctx.range(5, 1_200),
                    level: LogLevel::for_status(status_code),
                }
            })
            .collect()
    }
}

impl Store {
    pub fn monitoring_metrics(&self) -> Collection<MonitoringMetric> {
        self.collection()
    }

    pub fn internal_api_metrics(&self) -> Collection<InternalApiMetric> {
        self.collection()
    }

    pub fn internal_api_logs(&self) -> Collection<InternalApiLog> {
        self.collection()
    }
}
