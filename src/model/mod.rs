//! # Record Model
//!
//! The input representation for the export engine: conversation records,
//! diagnostic test panels, and the page geometry they are laid out on.
//!
//! Records arrive already validated by the caller. The model is lenient
//! where the exports are lenient (a missing sender prints as "Unknown") and
//! strict where layout needs certainty (every record must carry a
//! parseable timestamp).

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// PDF points per millimetre. Layout works in millimetres; the PDF writer
/// converts at serialisation time.
pub const PT_PER_MM: f64 = 72.0 / 25.4;
/// Millimetres per PDF point, used to convert font metrics.
pub const MM_PER_PT: f64 = 25.4 / 72.0;

/// Standard page sizes in millimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A5,
    Letter,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in millimetres, portrait.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::A5 => (148.0, 210.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Edge values (top, right, bottom, left) used for margins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Configuration for a page: size and margins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    /// Page size. Defaults to A4.
    #[serde(default)]
    pub size: PageSize,

    /// Page margins in millimetres. The bottom margin is the band the
    /// footer pass writes into; content never enters it.
    #[serde(default = "default_margin")]
    pub margin: Edges,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margin: default_margin(),
        }
    }
}

fn default_margin() -> Edges {
    Edges::symmetric(20.0, 20.0)
}

/// One message in a care conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,

    /// When the message was sent (wall-clock time as recorded).
    #[serde(rename = "date", with = "timestamp")]
    pub timestamp: NaiveDateTime,

    #[serde(default)]
    pub sender: Option<String>,

    /// Free-text role. Known values are "Member" and "Staff".
    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub topic: Option<String>,

    #[serde(default)]
    pub decision: Option<String>,

    /// Reasoning behind `decision`.
    #[serde(default)]
    pub reason: Option<String>,

    /// Identifiers of related records. Never dereferenced during layout.
    #[serde(default)]
    pub linked_to: Vec<String>,

    /// Period bucket ("month") the record belongs to.
    #[serde(default)]
    pub month: u32,
}

impl ConversationRecord {
    /// Sender name, or "Unknown" when missing or blank.
    pub fn sender_label(&self) -> &str {
        non_blank(&self.sender).unwrap_or("Unknown")
    }

    /// Role, or "User" when missing or blank.
    pub fn role_label(&self) -> &str {
        non_blank(&self.role).unwrap_or("User")
    }

    pub fn topic(&self) -> Option<&str> {
        non_blank(&self.topic)
    }

    pub fn decision(&self) -> Option<&str> {
        non_blank(&self.decision)
    }

    pub fn reason(&self) -> Option<&str> {
        non_blank(&self.reason)
    }

    /// Calendar day used for grouping.
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// A diagnostic test panel: metrics plus the clinician's reading of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPanel {
    pub id: String,
    pub test_type: String,
    pub category: String,

    #[serde(with = "timestamp")]
    pub date: NaiveDateTime,

    /// Metrics in the order they were recorded.
    #[serde(with = "ordered_metrics")]
    pub results: Vec<NamedMetric>,

    #[serde(default)]
    pub interpretation: String,

    #[serde(default)]
    pub physician_notes: Option<String>,

    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl TestPanel {
    pub fn physician_notes(&self) -> Option<&str> {
        non_blank(&self.physician_notes)
    }
}

/// A metric together with its display name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMetric {
    pub name: String,
    pub metric: Metric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub value: String,
    pub status: MetricStatus,
    #[serde(default)]
    pub trend: String,
}

/// Assessment attached to a metric.
///
/// Parsing is total: labels outside the known set are kept verbatim as
/// `Unrecognized` instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MetricStatus {
    Optimal,
    Improved,
    Monitor,
    Unrecognized(String),
}

impl MetricStatus {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "optimal" => Self::Optimal,
            "improved" => Self::Improved,
            "monitor" => Self::Monitor,
            _ => Self::Unrecognized(label.to_string()),
        }
    }

    /// The label as written in the source data.
    pub fn label(&self) -> &str {
        match self {
            Self::Optimal => "optimal",
            Self::Improved => "improved",
            Self::Monitor => "monitor",
            Self::Unrecognized(label) => label,
        }
    }

    /// Label with its first letter upper-cased, as printed in tables.
    pub fn display_label(&self) -> String {
        let label = self.label();
        let mut chars = label.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl From<String> for MetricStatus {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<MetricStatus> for String {
    fn from(status: MetricStatus) -> Self {
        status.label().to_string()
    }
}

/// Who the document is about and when it was generated.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportMeta {
    /// Patient name. Printed in the title block and used in the file name.
    pub subject: String,
    /// Responsible physician, printed under the panel report title.
    pub physician: Option<String>,
    pub generated_at: NaiveDateTime,
}

impl ReportMeta {
    pub fn new(subject: impl Into<String>, generated_at: NaiveDateTime) -> Self {
        Self {
            subject: subject.into(),
            physician: None,
            generated_at,
        }
    }

    pub fn with_physician(mut self, physician: impl Into<String>) -> Self {
        self.physician = Some(physician.into());
        self
    }
}

/// Parse a record timestamp.
///
/// Accepts RFC 3339 (the offset is dropped and the wall-clock value kept),
/// naive `YYYY-MM-DDTHH:MM[:SS[.f]]` with `T` or a space, and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("unparseable timestamp {:?}", raw)))
    }
}

/// (De)serialise `name -> Metric` objects without losing key order.
mod ordered_metrics {
    use super::{Metric, NamedMetric};
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(metrics: &[NamedMetric], s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(metrics.len()))?;
        for m in metrics {
            map.serialize_entry(&m.name, &m.metric)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<NamedMetric>, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = Vec<NamedMetric>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping metric names to metrics")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut out = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, metric)) = access.next_entry::<String, Metric>()? {
                    out.push(NamedMetric { name, metric });
                }
                Ok(out)
            }
        }

        d.deserialize_map(OrderedVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_portrait_millimetres() {
        assert_eq!(PageSize::A4.dimensions(), (210.0, 297.0));
    }

    #[test]
    fn timestamps_in_common_shapes_parse() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2025-01-15T09:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-15T09:30:00+05:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-15T09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-15 09:30"), Some(expected));
        assert_eq!(
            parse_timestamp("2025-01-15"),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("last tuesday"), None);
    }

    #[test]
    fn missing_sender_and_role_use_defaults() {
        let json = r#"{ "id": "m1", "date": "2025-01-15T09:30:00", "message": "hi", "sender": "" }"#;
        let record: ConversationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.sender_label(), "Unknown");
        assert_eq!(record.role_label(), "User");
        assert!(record.topic().is_none());
        assert!(record.linked_to.is_empty());
    }

    #[test]
    fn unparseable_timestamp_is_rejected() {
        let json = r#"{ "id": "m1", "date": "soon", "message": "hi" }"#;
        let err = serde_json::from_str::<ConversationRecord>(json).unwrap_err();
        assert!(err.to_string().contains("unparseable timestamp"));
    }

    #[test]
    fn panel_metrics_keep_input_order() {
        let json = r#"{
            "id": "lipid", "testType": "Lipid Panel", "category": "Cardiovascular",
            "date": "2023-08-01",
            "results": {
                "LDL": { "value": "105 mg/dL", "status": "improved", "trend": "down 27" },
                "HDL": { "value": "50 mg/dL", "status": "optimal", "trend": "up 11" },
                "Apo B": { "value": "90 mg/dL", "status": "borderline", "trend": "" }
            },
            "interpretation": "Better.",
            "recommendations": ["Keep going"]
        }"#;
        let panel: TestPanel = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = panel.results.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["LDL", "HDL", "Apo B"]);
        assert_eq!(panel.results[1].metric.status, MetricStatus::Optimal);
        assert_eq!(
            panel.results[2].metric.status,
            MetricStatus::Unrecognized("borderline".to_string())
        );
        assert!(panel.physician_notes().is_none());
    }

    #[test]
    fn status_display_label_is_capitalised() {
        assert_eq!(MetricStatus::from_label("IMPROVED").display_label(), "Improved");
        assert_eq!(MetricStatus::from_label("borderline").display_label(), "Borderline");
        assert_eq!(MetricStatus::from_label("").display_label(), "");
    }
}
