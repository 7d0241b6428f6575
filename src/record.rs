//! Service records as they appear in the status snapshot

use crate::errors::{GraphError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Date key format used by `dailyMinutesDown`
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub name: String,

    #[serde(default)]
    pub slug: Option<String>,

    /// Minutes of downtime keyed by UTC calendar date
    #[serde(default, deserialize_with = "deserialize_minutes")]
    pub daily_minutes_down: BTreeMap<String, f64>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub uptime: Option<String>,

    #[serde(default)]
    pub uptime_month: Option<String>,

    /// Mean response time in milliseconds
    #[serde(default, deserialize_with = "deserialize_optional_number")]
    pub time: Option<f64>,
}

impl ServiceRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_minutes_down(mut self, date: NaiveDate, minutes: f64) -> Self {
        self.daily_minutes_down
            .insert(date.format(DATE_KEY_FORMAT).to_string(), minutes);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Slug used for output naming: the explicit one, or one derived from the name.
    ///
    /// Derived slugs are sanitised; an explicit slug is used verbatim and
    /// rejected when it is not file-name safe.
    pub fn effective_slug(&self) -> Result<String> {
        let slug = match self.slug.as_deref() {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => derive_slug(&self.name),
        };

        if is_safe_slug(&slug) {
            Ok(slug)
        } else {
            Err(GraphError::InvalidSlug(slug))
        }
    }

    /// Recorded downtime for a day; absent days count as zero.
    pub fn minutes_down_on(&self, date: NaiveDate) -> f64 {
        let key = date.format(DATE_KEY_FORMAT).to_string();
        self.daily_minutes_down.get(&key).copied().unwrap_or(0.0)
    }
}

/// Lowercase the name, collapse each whitespace run into one hyphen and map
/// any other character that is not file-name safe to a hyphen.
pub fn derive_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
            continue;
        }

        in_whitespace = false;
        for lower in c.to_lowercase() {
            slug.push(match lower {
                'a'..='z' | '0'..='9' | '-' | '_' | '.' => lower,
                _ => '-',
            });
        }
    }

    slug
}

/// True when the value can be embedded in a file name and an SVG id as-is.
pub fn is_safe_slug(slug: &str) -> bool {
    if slug.is_empty() || slug == "." || slug == ".." {
        return false;
    }

    slug.chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-' | '_' | '.'))
}

/// Coerce a snapshot value into a number; anything non-numeric is treated as zero.
fn lenient_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    number.filter(|n| n.is_finite())
}

fn deserialize_minutes<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;

    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(day, value)| (day, lenient_number(&value).unwrap_or(0.0)))
        .collect())
}

fn deserialize_optional_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(lenient_number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slug_derived_from_name() {
        assert_eq!(derive_slug("Voice Services"), "voice-services");
        assert_eq!(derive_slug("Bitris  AI\tPlatform"), "bitris-ai-platform");
        assert_eq!(derive_slug(" Web "), "-web-");
    }

    #[test]
    fn test_explicit_slug_wins() {
        let record = ServiceRecord::new("Bitris Web Interface").with_slug("web");
        assert_eq!(record.effective_slug().unwrap(), "web");

        let record = ServiceRecord::new("Bitris Web Interface").with_slug("");
        assert_eq!(record.effective_slug().unwrap(), "bitris-web-interface");
    }

    #[test]
    fn test_derived_slug_maps_unsafe_chars() {
        assert_eq!(derive_slug("Bitris AI (Beta)"), "bitris-ai--beta-");
        assert_eq!(derive_slug("Voice & Data"), "voice---data");
        assert_eq!(derive_slug("Café Status"), "caf--status");
        assert_eq!(derive_slug("api/v2"), "api-v2");

        let slugs: Vec<String> = ["Bitris AI (Beta)", "Voice & Data", "Café Status"]
            .iter()
            .map(|name| ServiceRecord::new(*name).effective_slug().unwrap())
            .collect();
        assert!(slugs.iter().all(|slug| is_safe_slug(slug)));
        assert_ne!(slugs[0], slugs[1]);
        assert_ne!(slugs[1], slugs[2]);
        assert_ne!(slugs[0], slugs[2]);
    }

    #[test]
    fn test_unsafe_slugs_rejected() {
        assert!(ServiceRecord::new("x").with_slug("api/v2").effective_slug().is_err());
        assert!(ServiceRecord::new("").effective_slug().is_err());
        assert!(ServiceRecord::new("..").effective_slug().is_err());
        assert!(ServiceRecord::new("x").with_slug("..").effective_slug().is_err());
        assert!(ServiceRecord::new("x").with_slug("Voice").effective_slug().is_err());
        assert!(is_safe_slug("status.v2_beta-1"));
    }

    #[test]
    fn test_deserialize_snapshot_entry() {
        let record: ServiceRecord = serde_json::from_value(json!({
            "name": "Voice Services",
            "slug": "voice-services",
            "status": "up",
            "uptime": "99.98%",
            "uptimeMonth": "99.90%",
            "time": 412,
            "dailyMinutesDown": { "2026-10-16": 12, "2026-10-17": "720" }
        }))
        .unwrap();

        assert_eq!(record.slug.as_deref(), Some("voice-services"));
        assert_eq!(record.uptime_month.as_deref(), Some("99.90%"));
        assert_eq!(record.time, Some(412.0));

        let day = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(record.minutes_down_on(day), 720.0);
        assert_eq!(record.minutes_down_on(day.pred_opt().unwrap()), 12.0);
    }

    #[test]
    fn test_malformed_minutes_count_as_zero() {
        let record: ServiceRecord = serde_json::from_value(json!({
            "name": "API",
            "dailyMinutesDown": { "2026-10-15": null, "2026-10-16": "soon", "2026-10-17": true }
        }))
        .unwrap();

        for day in 15..=17 {
            let date = NaiveDate::from_ymd_opt(2026, 10, day).unwrap();
            assert_eq!(record.minutes_down_on(date), 0.0);
        }
    }

    #[test]
    fn test_missing_minutes_map_and_null_map() {
        let record: ServiceRecord = serde_json::from_value(json!({ "name": "API" })).unwrap();
        assert!(record.daily_minutes_down.is_empty());

        let record: ServiceRecord =
            serde_json::from_value(json!({ "name": "API", "dailyMinutesDown": null })).unwrap();
        assert!(record.daily_minutes_down.is_empty());
    }

    #[test]
    fn test_missing_name_is_an_error() {
        let result: std::result::Result<ServiceRecord, _> =
            serde_json::from_value(json!({ "slug": "api" }));
        assert!(result.is_err());
    }
}
