//! Batch driver: snapshot in, one graph per service out

use crate::chart::{artifact_file_name, render_chart};
use crate::config::Config;
use crate::errors::{GraphError, Result};
use crate::incidents::IncidentDigest;
use crate::insights::{Insights, ServiceStatus};
use crate::record::ServiceRecord;
use crate::series::{build_daily_series, mean_ratio, Clock};
use crate::store::{ArtifactStore, FsArtifactStore};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};

/// A chart rendered for one service, not yet stored
#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    pub name: String,
    pub slug: String,
    pub file_name: String,
    pub svg: String,
    pub mean_ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedGraph {
    pub slug: String,
    pub path: PathBuf,
    /// Mean uptime ratio across the lookback window
    pub mean_ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceFailure {
    /// Position of the entry in the snapshot
    pub index: usize,
    pub name: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generated: Vec<GeneratedGraph>,
    pub failures: Vec<ServiceFailure>,
    pub insights: Insights,
    /// Present when an incident export was configured and readable
    pub incidents: Option<IncidentDigest>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Split the raw snapshot into per-service entries; anything but an array is fatal.
pub fn parse_snapshot(raw: &str) -> Result<Vec<Value>> {
    let data: Value = serde_json::from_str(raw)?;
    match data {
        Value::Array(entries) => Ok(entries),
        other => Err(GraphError::MalformedSnapshot(format!(
            "summary must contain an array of service objects, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode one snapshot entry; a bad entry only fails that service.
pub fn decode_record(value: &Value) -> Result<ServiceRecord> {
    ServiceRecord::deserialize(value).map_err(|e| GraphError::InvalidRecord(e.to_string()))
}

/// Build the series for one service and render its chart under an already
/// resolved slug (see [`ServiceRecord::effective_slug`]).
pub fn render_record(
    record: &ServiceRecord,
    slug: &str,
    config: &Config,
    today: NaiveDate,
) -> Result<RenderedArtifact> {
    let series = build_daily_series(record, config.lookback_days, today);
    let svg = render_chart(&record.name, slug, &series)?;

    Ok(RenderedArtifact {
        name: record.name.clone(),
        slug: slug.to_string(),
        file_name: artifact_file_name(&config.graph_prefix, slug),
        mean_ratio: mean_ratio(&series),
        svg,
    })
}

/// Sequential batch over every service in a snapshot
pub struct GraphBatch<S: ArtifactStore> {
    config: Config,
    store: S,
}

impl GraphBatch<FsArtifactStore> {
    /// Batch writing into `config.output_dir`
    pub fn from_config(config: Config) -> Result<Self> {
        let store = FsArtifactStore::new(config.output_dir.clone());
        Self::new(config, store)
    }
}

impl<S: ArtifactStore> GraphBatch<S> {
    pub fn new(config: Config, store: S) -> Result<Self> {
        config.validate().map_err(GraphError::Config)?;
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the snapshot from `summary_path` and process it
    #[instrument(skip(self, clock), fields(summary = %self.config.summary_path.display()))]
    pub async fn run(&self, clock: &dyn Clock) -> Result<BatchReport> {
        let raw = tokio::fs::read_to_string(&self.config.summary_path).await?;
        let mut report = self.run_snapshot(&raw, clock).await?;
        report.incidents = self.load_incidents().await;
        Ok(report)
    }

    /// Summarise the configured issue export; an unreadable export only loses the digest.
    async fn load_incidents(&self) -> Option<IncidentDigest> {
        let path = self.config.incidents_path.as_ref()?;

        let digest = match tokio::fs::read_to_string(path).await {
            Ok(raw) => IncidentDigest::from_json(&raw),
            Err(e) => Err(GraphError::Io(e)),
        };

        match digest {
            Ok(digest) => {
                info!("Incident feed {}: {}", path.display(), digest.counts.label());
                Some(digest)
            }
            Err(e) => {
                warn!("Incident feed {} unavailable: {}", path.display(), e);
                None
            }
        }
    }

    /// Process an already loaded snapshot
    pub async fn run_snapshot(&self, raw: &str, clock: &dyn Clock) -> Result<BatchReport> {
        let entries = parse_snapshot(raw)?;
        let today = clock.today();

        info!(
            "Rendering {} services, {} day window ending {}",
            entries.len(),
            self.config.lookback_days,
            today
        );

        self.store.prepare().await?;

        let mut generated = Vec::new();
        let mut failures = Vec::new();
        let mut records = Vec::new();
        let mut seen_slugs = HashSet::new();

        for (index, entry) in entries.iter().enumerate() {
            match self
                .process_entry(entry, today, &mut seen_slugs, &mut records)
                .await
            {
                Ok(graph) => {
                    info!("Generated {}", graph.path.display());
                    generated.push(graph);
                }
                Err(e) => {
                    let name = entry
                        .get("name")
                        .and_then(Value::as_str)
                        .map(String::from);

                    if self.config.fail_fast {
                        error!("Service #{} failed, aborting batch: {}", index, e);
                        return Err(e);
                    }

                    if e.is_recoverable() {
                        warn!("Skipping service #{} ({:?}): {}", index, name, e);
                    } else {
                        error!("Service #{} ({:?}) failed: {}", index, name, e);
                    }

                    failures.push(ServiceFailure {
                        index,
                        name,
                        error: e.to_string(),
                    });
                }
            }
        }

        let insights = Insights::from_records(&records);
        info!(
            "Batch complete - {} generated, {} failed, {:.2}% average availability, {} ({}), median latency {}",
            generated.len(),
            failures.len(),
            insights.average_availability,
            insights.headline,
            insights.attention_label(),
            insights.latency_label()
        );

        Ok(BatchReport {
            generated,
            failures,
            insights,
            incidents: None,
        })
    }

    async fn process_entry(
        &self,
        entry: &Value,
        today: NaiveDate,
        seen_slugs: &mut HashSet<String>,
        records: &mut Vec<ServiceRecord>,
    ) -> Result<GeneratedGraph> {
        let record = decode_record(entry)?;
        records.push(record.clone());

        debug!(
            "Decoded {} (status {})",
            record.name,
            ServiceStatus::from(record.status.as_deref())
        );

        let slug = record.effective_slug()?;
        if !seen_slugs.insert(slug.clone()) {
            return Err(GraphError::DuplicateSlug(slug));
        }

        let artifact = render_record(&record, &slug, &self.config, today)?;
        debug!(
            "Rendered {} ({} bytes, mean ratio {:.4})",
            artifact.slug,
            artifact.svg.len(),
            artifact.mean_ratio
        );

        let path = self.store.write(&artifact.file_name, &artifact.svg).await?;

        Ok(GeneratedGraph {
            slug: artifact.slug,
            path,
            mean_ratio: artifact.mean_ratio,
        })
    }
}
