//! Snapshot-wide summary figures shown above the service list

use crate::record::ServiceRecord;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Up,
    Degraded,
    Down,
    Attention,
}

impl ServiceStatus {
    /// Map a free-text status onto the four display states.
    pub fn normalize(status: &str) -> Self {
        let status = status.to_lowercase();
        if status.contains("degrad") {
            ServiceStatus::Degraded
        } else if status.contains("down") || status.contains("incident") {
            ServiceStatus::Down
        } else if status.contains("attention") || status.contains("maintenance") {
            ServiceStatus::Attention
        } else if status.contains("up") {
            ServiceStatus::Up
        } else {
            ServiceStatus::Attention
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceStatus::Up => write!(f, "up"),
            ServiceStatus::Degraded => write!(f, "degraded"),
            ServiceStatus::Down => write!(f, "down"),
            ServiceStatus::Attention => write!(f, "attention"),
        }
    }
}

impl From<Option<&str>> for ServiceStatus {
    fn from(status: Option<&str>) -> Self {
        ServiceStatus::normalize(status.unwrap_or("unknown"))
    }
}

pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Parse `"99.95%"` style uptime strings.
pub fn parse_percent(value: &str) -> Option<f64> {
    value
        .trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

pub fn format_ms(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "—".to_string();
    }
    if value < 1000.0 {
        return format!("{} ms", value.round());
    }
    format!("{:.2} s", value / 1000.0)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Insights {
    /// Mean of each service's monthly (or lifetime) uptime percentage
    pub average_availability: f64,
    /// Services whose normalized status is not `up`
    pub needs_attention: Vec<String>,
    pub coverage: usize,
    /// Median of the known response times, in milliseconds
    pub median_latency_ms: Option<f64>,
    pub headline: String,
}

impl Insights {
    pub fn from_records(records: &[ServiceRecord]) -> Self {
        let uptimes: Vec<f64> = records
            .iter()
            .map(|record| {
                record
                    .uptime_month
                    .as_deref()
                    .filter(|month| !month.trim().is_empty())
                    .or(record.uptime.as_deref())
                    .and_then(parse_percent)
                    .unwrap_or(0.0)
            })
            .collect();

        let needs_attention: Vec<String> = records
            .iter()
            .filter(|record| ServiceStatus::from(record.status.as_deref()) != ServiceStatus::Up)
            .map(|record| record.name.clone())
            .collect();

        let latencies: Vec<f64> = records
            .iter()
            .filter_map(|record| record.time)
            .filter(|ms| ms.is_finite() && *ms > 0.0)
            .collect();

        let headline = if needs_attention.is_empty() {
            "All systems operational".to_string()
        } else {
            format!("{} require attention", plural(needs_attention.len(), "service"))
        };

        Self {
            average_availability: average(&uptimes),
            needs_attention,
            coverage: records.len(),
            median_latency_ms: if latencies.is_empty() {
                None
            } else {
                Some(median(&latencies))
            },
            headline,
        }
    }

    pub fn latency_label(&self) -> String {
        self.median_latency_ms.map(format_ms).unwrap_or_else(|| "—".to_string())
    }

    pub fn attention_label(&self) -> String {
        if self.needs_attention.is_empty() {
            "All clear".to_string()
        } else {
            plural(self.needs_attention.len(), "surface")
        }
    }
}
