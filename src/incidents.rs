//! Incident and maintenance feeds built from an exported issue list

use crate::errors::{GraphError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

pub const INCIDENT_LABELS: [&str; 2] = ["incident", "status"];
pub const MAINTENANCE_LABELS: [&str; 1] = ["maintenance"];

/// Per-label cap for the active and recent incident lists
pub const INCIDENT_FEED_LIMIT: usize = 8;
/// Per-label cap for the maintenance list
pub const MAINTENANCE_FEED_LIMIT: usize = 5;

const SUMMARY_FALLBACK: &str = "See GitHub for the full write-up.";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IssueLabel {
    pub name: String,
}

/// One issue as returned by the tracker's issue listing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub id: u64,
    pub title: String,

    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub html_url: Option<String>,

    /// `open` or `closed`
    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub labels: Vec<IssueLabel>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssueState {
    Open,
    Closed,
}

impl Issue {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            body: None,
            html_url: None,
            state: Some("open".to_string()),
            labels: Vec::new(),
            created_at: None,
            updated_at: None,
            closed_at: None,
        }
    }

    pub fn with_label(mut self, name: impl Into<String>) -> Self {
        self.labels.push(IssueLabel { name: name.into() });
        self
    }

    pub fn with_closed_at(mut self, at: DateTime<Utc>) -> Self {
        self.state = Some("closed".to_string());
        self.closed_at = Some(at);
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|label| label.name.eq_ignore_ascii_case(name))
    }

    /// Issues without a state are treated as open.
    pub fn state(&self) -> IssueState {
        match self.state.as_deref() {
            Some(state) if state.eq_ignore_ascii_case("closed") => IssueState::Closed,
            _ => IssueState::Open,
        }
    }
}

/// Milliseconds of the most relevant date: closed, else updated, else created; 0 when none.
pub fn issue_timestamp(issue: &Issue) -> i64 {
    issue
        .closed_at
        .or(issue.updated_at)
        .or(issue.created_at)
        .map(|at| at.timestamp_millis())
        .unwrap_or(0)
}

/// Keep the first occurrence of each issue id.
pub fn dedupe_issues<I>(issues: I) -> Vec<Issue>
where
    I: IntoIterator<Item = Issue>,
{
    let mut seen = HashSet::new();
    issues
        .into_iter()
        .filter(|issue| seen.insert(issue.id))
        .collect()
}

/// Concatenate per-label feeds, drop repeats and order newest first.
///
/// Issues with equal timestamps keep their feed order.
pub fn merge_feeds<I>(feeds: I) -> Vec<Issue>
where
    I: IntoIterator<Item = Vec<Issue>>,
{
    let mut merged = dedupe_issues(feeds.into_iter().flatten());
    merged.sort_by_key(|issue| std::cmp::Reverse(issue_timestamp(issue)));
    merged
}

/// Issues in `state` carrying any of `labels`, at most `per_label` taken per label.
pub fn issues_with_any_label(
    issues: &[Issue],
    labels: &[&str],
    state: IssueState,
    per_label: usize,
) -> Vec<Issue> {
    let feeds = labels.iter().map(|label| {
        issues
            .iter()
            .filter(|issue| issue.state() == state && issue.has_label(label))
            .take(per_label)
            .cloned()
            .collect::<Vec<_>>()
    });
    merge_feeds(feeds)
}

fn code_fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)```.*?```").expect("code fence pattern"))
}

fn html_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("html tag pattern"))
}

/// First readable line of an issue body with code blocks and markup removed.
pub fn parse_issue_summary(body: Option<&str>) -> String {
    let body = body.unwrap_or_default();
    let without_code = code_fence_pattern().replace_all(body, "");
    let without_tags = html_tag_pattern().replace_all(&without_code, "");
    let sanitized = without_tags.replace('\r', "");

    sanitized
        .trim()
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(String::from)
        .unwrap_or_else(|| SUMMARY_FALLBACK.to_string())
}

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct IncidentCounts {
    pub open: usize,
    pub maintenance: usize,
}

impl IncidentCounts {
    /// `"0 open"`, or the non-zero parts joined, e.g. `"2 incidents · 1 maintenance"`.
    pub fn label(&self) -> String {
        if self.open == 0 && self.maintenance == 0 {
            return "0 open".to_string();
        }

        let mut parts = Vec::new();
        if self.open > 0 {
            let suffix = if self.open == 1 { "" } else { "s" };
            parts.push(format!("{} incident{}", self.open, suffix));
        }
        if self.maintenance > 0 {
            parts.push(format!("{} maintenance", self.maintenance));
        }
        parts.join(" · ")
    }
}

/// Display-ready view of one issue
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct IncidentCard {
    pub id: u64,
    pub title: String,
    pub summary: String,
    /// `Resolved`, `Open` or `Scheduled`
    pub tag: &'static str,
    pub timestamp: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

impl IncidentCard {
    pub fn from_issue(issue: &Issue, is_past: bool) -> Self {
        let tag = if is_past {
            "Resolved"
        } else if issue.state() == IssueState::Open {
            "Open"
        } else {
            "Scheduled"
        };

        let timestamp = if is_past {
            issue.closed_at.or(issue.updated_at)
        } else {
            issue.created_at
        };

        Self {
            id: issue.id,
            title: issue.title.clone(),
            summary: parse_issue_summary(issue.body.as_deref()),
            tag,
            timestamp,
            url: issue.html_url.clone(),
        }
    }
}

/// Active incidents, maintenance windows and recent history from one issue export
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct IncidentDigest {
    pub counts: IncidentCounts,
    pub active: Vec<IncidentCard>,
    pub maintenance: Vec<IncidentCard>,
    pub recent: Vec<IncidentCard>,
}

impl IncidentDigest {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let active = issues_with_any_label(issues, &INCIDENT_LABELS, IssueState::Open, INCIDENT_FEED_LIMIT);
        let maintenance = issues_with_any_label(
            issues,
            &MAINTENANCE_LABELS,
            IssueState::Open,
            MAINTENANCE_FEED_LIMIT,
        );
        let recent = issues_with_any_label(issues, &INCIDENT_LABELS, IssueState::Closed, INCIDENT_FEED_LIMIT);

        Self {
            counts: IncidentCounts {
                open: active.len(),
                maintenance: maintenance.len(),
            },
            active: active.iter().map(|issue| IncidentCard::from_issue(issue, false)).collect(),
            maintenance: maintenance
                .iter()
                .map(|issue| IncidentCard::from_issue(issue, false))
                .collect(),
            recent: recent.iter().map(|issue| IncidentCard::from_issue(issue, true)).collect(),
        }
    }

    /// Parse an exported issue list (JSON array) and build the digest.
    pub fn from_json(raw: &str) -> Result<Self> {
        let issues: Vec<Issue> = serde_json::from_str(raw)?;
        Ok(Self::from_issues(&issues))
    }
}

/// A new incident as entered by a reporter
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IncidentReport {
    pub title: String,
    pub service: String,
    pub impact: String,
    pub body: String,
}

/// Issue payload ready to be filed with the tracker
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

impl IncidentReport {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("title", &self.title),
            ("service", &self.service),
            ("impact", &self.impact),
            ("body", &self.body),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(GraphError::InvalidIncident(format!("{} cannot be empty", field)));
            }
        }
        Ok(())
    }

    /// Markdown body with service, impact and details sections and a submission footer.
    pub fn issue_body(&self, submitted_at: DateTime<Utc>) -> String {
        format!(
            "### Service\n{}\n\n### Impact\n{}\n\n### Details\n{}\n\n---\nSubmitted via Bitris Status UI at {}",
            self.service,
            self.impact,
            self.body.trim(),
            submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }

    pub fn to_issue(&self, submitted_at: DateTime<Utc>) -> Result<NewIssue> {
        self.validate()?;
        Ok(NewIssue {
            title: self.title.trim().to_string(),
            body: self.issue_body(submitted_at),
            labels: vec![
                "incident".to_string(),
                self.service.clone(),
                self.impact.clone(),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let issues = vec![
            Issue::new(1, "first"),
            Issue::new(2, "other"),
            Issue::new(1, "repeat"),
        ];
        let deduped = dedupe_issues(issues);

        let titles: Vec<&str> = deduped.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "other"]);
    }

    #[test]
    fn test_issue_timestamp_precedence() {
        let issue = Issue::new(1, "x").with_created_at(at(1, 0));
        assert_eq!(issue_timestamp(&issue), at(1, 0).timestamp_millis());

        let issue = issue.with_updated_at(at(2, 0));
        assert_eq!(issue_timestamp(&issue), at(2, 0).timestamp_millis());

        let issue = issue.with_closed_at(at(3, 0));
        assert_eq!(issue_timestamp(&issue), at(3, 0).timestamp_millis());

        assert_eq!(issue_timestamp(&Issue::new(2, "undated")), 0);
    }

    #[test]
    fn test_merge_sorts_newest_first() {
        let incident = vec![
            Issue::new(1, "old").with_created_at(at(1, 0)),
            Issue::new(2, "new").with_created_at(at(5, 0)),
        ];
        let status = vec![
            Issue::new(2, "new again").with_created_at(at(5, 0)),
            Issue::new(3, "middle").with_updated_at(at(3, 0)),
            Issue::new(4, "undated"),
        ];

        let merged = merge_feeds(vec![incident, status]);
        let ids: Vec<u64> = merged.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 3, 1, 4]);
        assert_eq!(merged[0].title, "new");
    }

    #[test]
    fn test_summary_strips_code_and_markup() {
        let body = "```\nstack trace\n```\r\n\r\n<!-- template -->\n  <b>API</b> latency is elevated  \nmore";
        assert_eq!(parse_issue_summary(Some(body)), "API latency is elevated");

        assert_eq!(parse_issue_summary(None), "See GitHub for the full write-up.");
        assert_eq!(
            parse_issue_summary(Some("```only code```\n<br>")),
            "See GitHub for the full write-up."
        );
    }

    #[test]
    fn test_counts_label() {
        assert_eq!(IncidentCounts::default().label(), "0 open");
        assert_eq!(IncidentCounts { open: 1, maintenance: 0 }.label(), "1 incident");
        assert_eq!(IncidentCounts { open: 2, maintenance: 1 }.label(), "2 incidents · 1 maintenance");
        assert_eq!(IncidentCounts { open: 0, maintenance: 3 }.label(), "3 maintenance");
    }

    #[test]
    fn test_digest_groups_issues() {
        let issues = vec![
            Issue::new(1, "API down")
                .with_label("incident")
                .with_label("status")
                .with_body("<p>Gateway returns 502</p>")
                .with_created_at(at(10, 8)),
            Issue::new(2, "Voice degraded").with_label("status").with_created_at(at(12, 8)),
            Issue::new(3, "DB upgrade").with_label("maintenance").with_created_at(at(11, 8)),
            Issue::new(4, "Old outage")
                .with_label("incident")
                .with_created_at(at(1, 8))
                .with_closed_at(at(2, 8)),
            Issue::new(5, "Feature request").with_label("enhancement"),
        ];

        let digest = IncidentDigest::from_issues(&issues);

        assert_eq!(digest.counts, IncidentCounts { open: 2, maintenance: 1 });
        let active: Vec<u64> = digest.active.iter().map(|c| c.id).collect();
        assert_eq!(active, vec![2, 1]);
        assert_eq!(digest.active[0].tag, "Open");
        assert_eq!(digest.active[1].summary, "Gateway returns 502");
        assert_eq!(digest.maintenance[0].title, "DB upgrade");
        assert_eq!(digest.recent.len(), 1);
        assert_eq!(digest.recent[0].tag, "Resolved");
        assert_eq!(digest.recent[0].timestamp, Some(at(2, 8)));
    }

    #[test]
    fn test_feed_limit_applies_per_label() {
        let issues: Vec<Issue> = (0..12)
            .map(|i| Issue::new(i, format!("maint {}", i)).with_label("maintenance"))
            .collect();
        let digest = IncidentDigest::from_issues(&issues);
        assert_eq!(digest.counts.maintenance, MAINTENANCE_FEED_LIMIT);
    }

    #[test]
    fn test_digest_from_export() {
        let raw = json!([{
            "id": 77,
            "title": "Login failures",
            "body": "Users cannot sign in.\nInvestigating.",
            "html_url": "https://github.com/org/status/issues/12",
            "state": "open",
            "labels": [{ "name": "incident" }],
            "created_at": "2026-10-16T09:30:00Z",
            "updated_at": null,
            "closed_at": null
        }])
        .to_string();

        let digest = IncidentDigest::from_json(&raw).unwrap();
        assert_eq!(digest.counts.label(), "1 incident");
        assert_eq!(digest.active[0].summary, "Users cannot sign in.");
        assert_eq!(digest.active[0].url.as_deref(), Some("https://github.com/org/status/issues/12"));

        assert!(matches!(IncidentDigest::from_json("{}"), Err(GraphError::Json(_))));
    }

    #[test]
    fn test_issue_body_layout() {
        let report = IncidentReport {
            title: "Voice outage".to_string(),
            service: "Voice Services".to_string(),
            impact: "major".to_string(),
            body: "Calls drop after 30 seconds.".to_string(),
        };
        let submitted = Utc.with_ymd_and_hms(2026, 10, 17, 14, 5, 9).unwrap();

        assert_eq!(
            report.issue_body(submitted),
            "### Service\nVoice Services\n\n### Impact\nmajor\n\n### Details\nCalls drop after 30 seconds.\n\n---\nSubmitted via Bitris Status UI at 2026-10-17T14:05:09.000Z"
        );

        let issue = report.to_issue(submitted).unwrap();
        assert_eq!(issue.labels, vec!["incident", "Voice Services", "major"]);
        assert_eq!(issue.title, "Voice outage");
    }

    #[test]
    fn test_incomplete_report_rejected() {
        let report = IncidentReport {
            title: "  ".to_string(),
            service: "API".to_string(),
            impact: "minor".to_string(),
            body: "x".to_string(),
        };
        assert!(matches!(
            report.to_issue(Utc::now()),
            Err(GraphError::InvalidIncident(_))
        ));
    }
}
