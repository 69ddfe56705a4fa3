//! Decoding of schemaless store records into [`Alert`]s.
//!
//! The document store hands back loosely typed maps. Every path that feeds
//! the alert list (one-time fetch and change-feed deliveries) goes through
//! [`decode_alerts`], so `scheduledDate` normalization and ordering are
//! identical regardless of where a snapshot came from.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{Alert, AlertId, AlertPriority, AlertType, UserId};

pub const FIELD_TYPE: &str = "type";
pub const FIELD_PRIORITY: &str = "priority";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_SCHEDULED_DATE: &str = "scheduledDate";
pub const FIELD_COMPLETED: &str = "completed";
pub const FIELD_ASSIGNED_TO: &str = "assignedTo";
pub const FIELD_RELATED_RECORD: &str = "relatedRecordId";
pub const FIELD_RELATED_PATIENT: &str = "relatedPatientId";

const NAIVE_DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// A record as held by the document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("record {id} has no scheduledDate")]
    MissingScheduledDate { id: String },
    #[error("record {id} has an unreadable scheduledDate: {value}")]
    InvalidScheduledDate { id: String, value: String },
}

/// Wire encodings accepted for `scheduledDate`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScheduledTime {
    /// Store-native timestamp object
    Native {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(default, alias = "_nanoseconds")]
        nanoseconds: u32,
    },
    /// ISO-8601 text
    Text(String),
    /// Milliseconds since the Unix epoch
    EpochMillis(f64),
}

impl ScheduledTime {
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }

    /// Normalize to UTC; `None` when the value does not name a real instant
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Native {
                seconds,
                nanoseconds,
            } => DateTime::from_timestamp(*seconds, *nanoseconds),
            Self::Text(text) => parse_iso8601(text),
            Self::EpochMillis(millis) => {
                if !millis.is_finite() {
                    return None;
                }
                #[allow(clippy::cast_possible_truncation)]
                let millis = millis.trunc() as i64;
                DateTime::from_timestamp_millis(millis)
            }
        }
    }
}

fn parse_iso8601(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// Normalize a raw `scheduledDate` value of any supported encoding
pub fn normalize_scheduled_date(value: &Value) -> Option<DateTime<Utc>> {
    ScheduledTime::from_value(value)?.to_utc()
}

/// Decode a single record
pub fn decode_alert(document: &Document) -> Result<Alert, DecodeError> {
    let raw_date = document
        .get(FIELD_SCHEDULED_DATE)
        .filter(|value| !value.is_null())
        .ok_or_else(|| DecodeError::MissingScheduledDate {
            id: document.id.clone(),
        })?;
    let scheduled_date =
        normalize_scheduled_date(raw_date).ok_or_else(|| DecodeError::InvalidScheduledDate {
            id: document.id.clone(),
            value: raw_date.to_string(),
        })?;

    let alert_type = document
        .get(FIELD_TYPE)
        .and_then(|value| AlertType::deserialize(value).ok())
        .unwrap_or_default();
    let priority = document
        .get(FIELD_PRIORITY)
        .and_then(|value| AlertPriority::deserialize(value).ok())
        .unwrap_or_default();

    let assigned_to = document
        .get(FIELD_ASSIGNED_TO)
        .and_then(Value::as_array)
        .map(|users| {
            users
                .iter()
                .filter_map(Value::as_str)
                .map(UserId::from)
                .collect::<BTreeSet<_>>()
        })
        .unwrap_or_default();

    Ok(Alert {
        id: AlertId::new(document.id.clone()),
        alert_type,
        priority,
        title: text_field(document, FIELD_TITLE).unwrap_or_default(),
        description: text_field(document, FIELD_DESCRIPTION).unwrap_or_default(),
        scheduled_date,
        completed: document
            .get(FIELD_COMPLETED)
            .and_then(Value::as_bool)
            .unwrap_or(false),
        assigned_to,
        related_record_id: text_field(document, FIELD_RELATED_RECORD)
            .filter(|id| !id.trim().is_empty()),
        related_patient_id: text_field(document, FIELD_RELATED_PATIENT)
            .filter(|id| !id.trim().is_empty()),
    })
}

fn text_field(document: &Document, field: &str) -> Option<String> {
    document
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Decode a snapshot's records into the ordered alert list.
///
/// Records that cannot be decoded are skipped with a warning.
pub fn decode_alerts(documents: &[Document]) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = documents
        .iter()
        .filter_map(|document| match decode_alert(document) {
            Ok(alert) => Some(alert),
            Err(error) => {
                tracing::warn!(alert_id = %document.id, "Skipping undecodable alert: {error}");
                None
            }
        })
        .collect();
    sort_alerts(&mut alerts);
    alerts
}

/// Order ascending by scheduled date, ties broken by id
pub fn sort_alerts(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| {
        a.scheduled_date
            .cmp(&b.scheduled_date)
            .then_with(|| a.id.cmp(&b.id))
    });
}
