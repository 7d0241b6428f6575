//! Uptime Graph Generator Library
//!
//! This library turns a status snapshot of per-service daily downtime into
//! fixed-size SVG availability charts, one per service, and can summarise an
//! exported incident feed alongside them.

pub mod config;
pub mod record;
pub mod series;
pub mod chart;
pub mod insights;
pub mod incidents;
pub mod store;
pub mod driver;
pub mod errors;

pub use config::Config;
pub use record::ServiceRecord;
pub use series::{Clock, FixedClock, SeriesPoint, SystemClock, build_daily_series};
pub use chart::render_chart;
pub use insights::{Insights, ServiceStatus};
pub use incidents::{IncidentCounts, IncidentDigest, IncidentReport, Issue};
pub use store::{ArtifactStore, FsArtifactStore, MemoryArtifactStore};
pub use driver::{BatchReport, GraphBatch};
pub use errors::{GraphError, Result};
