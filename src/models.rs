//! Data models.

use chrono::DateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use serde_helpers::*;

/// Maximum number of events kept per invocation.
pub const MAX_EVENTS: usize = 10;

/// Stored event time for records whose upstream value could not be
/// converted to a timestamp.
pub const UNKNOWN_EVENT_TIME: &str = "unknown";

/// One normalized seismic event, as persisted and reported.
///
/// Serialized attribute names keep the upstream schema (`objectid`,
/// `fechaevento`, ...) so stored items and response bodies match what
/// the reporting service publishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeismicEvent {
    /// Locally assigned unique identifier (UUID v4), the storage key.
    pub id: String,
    /// Upstream record identifier, kept for cross-reference. May be empty.
    #[serde(rename = "objectid")]
    pub source_id: String,
    /// Event time as `YYYY-MM-DD HH:MM:SS` in UTC, or [`UNKNOWN_EVENT_TIME`].
    #[serde(rename = "fechaevento")]
    pub event_time: String,
    /// Local wall-clock time as reported upstream. May be empty.
    #[serde(rename = "hora")]
    pub time_of_day: String,
    #[serde(rename = "magnitud")]
    pub magnitude: Decimal,
    #[serde(rename = "lat")]
    pub latitude: Decimal,
    #[serde(rename = "lon")]
    pub longitude: Decimal,
    #[serde(rename = "profundidad_km")]
    pub depth_km: Decimal,
    /// Free-text location reference, e.g. "15 km al SO de Lima".
    #[serde(rename = "referencia")]
    pub reference_location: String,
    /// Administrative region name.
    #[serde(rename = "departamento")]
    pub department: String,
}

impl SeismicEvent {
    /// Build a normalized event from upstream attributes with a fresh id.
    ///
    /// An event time that was present but not convertible stores
    /// [`UNKNOWN_EVENT_TIME`]. Records with no event time at all are subject
    /// to the missing-time policy and are filtered before this point.
    pub fn from_attributes(attrs: EventAttributes) -> Self {
        SeismicEvent {
            id: Uuid::new_v4().to_string(),
            source_id: attrs.source_id.unwrap_or_default(),
            event_time: attrs
                .event_time
                .format_utc()
                .unwrap_or_else(|| UNKNOWN_EVENT_TIME.to_string()),
            time_of_day: attrs.time_of_day.unwrap_or_default(),
            magnitude: attrs.magnitude,
            latitude: attrs.latitude,
            longitude: attrs.longitude,
            depth_km: attrs.depth_km,
            reference_location: attrs.reference_location.unwrap_or_default(),
            department: attrs.department.unwrap_or_default(),
        }
    }
}

/// Upstream event time in epoch milliseconds, before conversion.
///
/// `Missing` covers absent, `null` and zero values; `Invalid` covers values
/// of any other shape, which keep the record but store the sentinel time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawEpoch {
    #[default]
    Missing,
    Invalid,
    Millis(i64),
}

impl RawEpoch {
    pub fn is_missing(&self) -> bool {
        matches!(self, RawEpoch::Missing)
    }

    /// Convert to the storage representation, `YYYY-MM-DD HH:MM:SS` in UTC.
    ///
    /// `None` when no timestamp can be produced, including epoch values
    /// outside the representable range.
    pub fn format_utc(&self) -> Option<String> {
        match self {
            RawEpoch::Millis(millis) => DateTime::from_timestamp_millis(*millis)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            _ => None,
        }
    }

    /// Parse from raw cell text: empty or zero is missing, any other integer
    /// is taken as epoch milliseconds, anything else is invalid.
    pub(crate) fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return RawEpoch::Missing;
        }
        match trimmed.parse::<i64>() {
            Ok(0) => RawEpoch::Missing,
            Ok(millis) => RawEpoch::Millis(millis),
            Err(_) => RawEpoch::Invalid,
        }
    }
}

/// Raw attribute mapping of one upstream feature.
///
/// Every field tolerates absent, `null` and mistyped values: numbers fall
/// back to zero, strings to empty. Deserialization itself never fails.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EventAttributes {
    #[serde(rename = "objectid", default, deserialize_with = "deserialize_id")]
    pub source_id: Option<String>,
    #[serde(
        rename = "fechaevento",
        default,
        deserialize_with = "deserialize_epoch_millis"
    )]
    pub event_time: RawEpoch,
    #[serde(rename = "hora", default, deserialize_with = "deserialize_text")]
    pub time_of_day: Option<String>,
    #[serde(
        rename = "magnitud",
        default,
        deserialize_with = "deserialize_lenient_decimal"
    )]
    pub magnitude: Decimal,
    #[serde(
        rename = "lat",
        default,
        deserialize_with = "deserialize_lenient_decimal"
    )]
    pub latitude: Decimal,
    #[serde(
        rename = "lon",
        default,
        deserialize_with = "deserialize_lenient_decimal"
    )]
    pub longitude: Decimal,
    #[serde(
        rename = "prof",
        default,
        deserialize_with = "deserialize_lenient_decimal"
    )]
    pub depth_km: Decimal,
    #[serde(rename = "ref", default, deserialize_with = "deserialize_text")]
    pub reference_location: Option<String>,
    #[serde(rename = "departamento", default, deserialize_with = "deserialize_text")]
    pub department: Option<String>,
}

impl EventAttributes {
    /// Build attributes from one page-table row, matching cells to fields
    /// by header name. Headers are expected lowercased and trimmed; unknown
    /// headers are ignored, absent ones leave the field default.
    pub fn from_cells(headers: &[String], cells: &[String]) -> Self {
        let mut attrs = EventAttributes::default();
        for (header, cell) in headers.iter().zip(cells) {
            match header.as_str() {
                "objectid" => attrs.source_id = non_empty(cell),
                "fechaevento" => attrs.event_time = RawEpoch::from_text(cell),
                "hora" => attrs.time_of_day = non_empty(cell),
                "magnitud" => attrs.magnitude = parse_decimal_text(cell),
                "lat" => attrs.latitude = parse_decimal_text(cell),
                "lon" => attrs.longitude = parse_decimal_text(cell),
                "prof" => attrs.depth_km = parse_decimal_text(cell),
                "ref" => attrs.reference_location = non_empty(cell),
                "departamento" => attrs.department = non_empty(cell),
                _ => {}
            }
        }
        attrs
    }
}

/// One feature wrapper from the structured query, `{"attributes": {...}}`.
///
/// Anything other than a JSON object under `attributes` resolves to `None`
/// and is handled by the missing-time policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Feature {
    #[serde(default, deserialize_with = "deserialize_attributes")]
    pub attributes: Option<EventAttributes>,
}

/// Top-level structured query response, `{"features": [...]}`.
///
/// A body without a `features` list fails deserialization and is reported
/// as a malformed upstream body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryResponse {
    pub features: Vec<Feature>,
}

/// Tabular content extracted from the HTML page variant.
///
/// Headers are lowercased and trimmed; rows keep raw cell text. Rows with
/// fewer cells than headers are dropped by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parsed upstream response, one variant per configured source.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamPayload {
    Query(QueryResponse),
    Page(PageTable),
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_decimal_text(text: &str) -> Decimal {
    text.trim().parse().unwrap_or(Decimal::ZERO)
}

/// Custom deserializers
mod serde_helpers {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{non_empty, parse_decimal_text, EventAttributes, RawEpoch};

    pub fn deserialize_epoch_millis<'de, D>(deserializer: D) -> Result<RawEpoch, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Null => RawEpoch::Missing,
            Value::Number(n) => match n.as_i64() {
                Some(0) => RawEpoch::Missing,
                Some(millis) => RawEpoch::Millis(millis),
                None => match n.as_f64() {
                    Some(f) if f == 0.0 => RawEpoch::Missing,
                    Some(f) => RawEpoch::Millis(f as i64),
                    None => RawEpoch::Invalid,
                },
            },
            _ => RawEpoch::Invalid,
        })
    }

    pub fn deserialize_lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => parse_decimal_text(&n.to_string()),
            Value::String(s) => parse_decimal_text(&s),
            _ => Decimal::ZERO,
        })
    }

    pub fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => non_empty(&s),
            _ => None,
        })
    }

    pub fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => non_empty(&s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn deserialize_attributes<'de, D>(
        deserializer: D,
    ) -> Result<Option<EventAttributes>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Object(_) => Ok(serde_json::from_value(value).ok()),
            _ => Ok(None),
        }
    }
}
