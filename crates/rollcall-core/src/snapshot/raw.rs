//! Loosely typed roster rows as the loader exports them.
//!
//! The roster editors store whatever was typed into a cell, so ids show up
//! as numbers or strings, scores may be blank or text, and dates come in a
//! few layouts. These rows are converted into typed records here and the
//! problems are recorded as data-quality notes instead of failing the pass.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

use super::Snapshot;
use crate::error::{DataIssue, Diagnostics, ScoreField};
use crate::models::{AttendanceLink, Event, EventId, Member, MemberId, Role};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMember {
    #[serde(alias = "user_no", deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub birth_year: Option<Value>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, alias = "point")]
    pub base_point: Option<Value>,
    #[serde(default, alias = "created_at")]
    pub registered_at: Option<String>,
    #[serde(default)]
    pub last_attended: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvent {
    #[serde(alias = "event_id", deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub host: Option<String>,
    #[serde(default)]
    pub score: Option<Value>,
    #[serde(default, alias = "album_url")]
    pub media_link: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAttendance {
    #[serde(deserialize_with = "de_id")]
    pub event_id: String,
    #[serde(alias = "user_no", deserialize_with = "de_id")]
    pub member_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSnapshot {
    #[serde(default)]
    pub members: Vec<RawMember>,
    #[serde(default)]
    pub events: Vec<RawEvent>,
    #[serde(default, alias = "attendees")]
    pub attendance: Vec<RawAttendance>,
}

impl RawSnapshot {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Convert every row into a typed record and build the snapshot.
    ///
    /// Notes about a repeated id are kept only for its first row; the later
    /// rows are dropped as duplicates when the snapshot is built.
    pub fn into_snapshot(self) -> Snapshot {
        let mut diagnostics = Diagnostics::new();

        let mut seen_members = HashSet::new();
        let mut members = Vec::with_capacity(self.members.len());
        for row in self.members {
            let mut notes = Vec::new();
            let member = row.into_member(&mut notes);
            if seen_members.insert(member.id.clone()) {
                notes.into_iter().for_each(|note| diagnostics.record(note));
            }
            members.push(member);
        }

        let mut seen_events = HashSet::new();
        let mut events = Vec::with_capacity(self.events.len());
        for row in self.events {
            let mut notes = Vec::new();
            let event = row.into_event(&mut notes);
            if seen_events.insert(event.id.clone()) {
                notes.into_iter().for_each(|note| diagnostics.record(note));
            }
            events.push(event);
        }
        let attendance = self
            .attendance
            .into_iter()
            .map(|row| AttendanceLink::new(row.event_id, row.member_id))
            .collect();

        Snapshot::build(members, events, attendance, diagnostics)
    }
}

impl RawMember {
    fn into_member(self, notes: &mut Vec<DataIssue>) -> Member {
        let id = MemberId::new(self.id);

        let name = match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => id.to_string(),
        };

        let role = match self.role.as_deref().map(str::trim) {
            None | Some("") => Role::Member,
            Some(value) => Role::parse(value).unwrap_or_else(|| {
                notes.push(DataIssue::UnknownRole {
                    member_id: id.clone(),
                    value: value.to_string(),
                });
                Role::Member
            }),
        };

        let base_point = parse_points(self.base_point.as_ref()).unwrap_or_else(|value| {
            notes.push(DataIssue::InvalidScore {
                field: ScoreField::BasePoint(id.clone()),
                value,
            });
            0
        });

        let registered_at = match self.registered_at.as_deref() {
            Some(value) if !value.trim().is_empty() => {
                let parsed = parse_timestamp(value);
                if parsed.is_none() {
                    notes.push(DataIssue::InvalidRegistration {
                        member_id: id.clone(),
                        value: Some(value.to_string()),
                    });
                }
                parsed
            }
            _ => {
                notes.push(DataIssue::InvalidRegistration {
                    member_id: id.clone(),
                    value: None,
                });
                None
            }
        };

        let last_attended = match self.last_attended.as_deref() {
            Some(value) if !value.trim().is_empty() => {
                let parsed = parse_date(value);
                if parsed.is_none() {
                    notes.push(DataIssue::InvalidLastAttended {
                        member_id: id.clone(),
                        value: value.to_string(),
                    });
                }
                parsed
            }
            _ => None,
        };

        Member {
            birth_year: self.birth_year.as_ref().and_then(parse_year),
            area: self.area.filter(|a| !a.trim().is_empty()),
            role,
            base_point,
            registered_at,
            last_attended,
            name,
            id,
        }
    }
}

impl RawEvent {
    fn into_event(self, notes: &mut Vec<DataIssue>) -> Event {
        let id = EventId::new(self.id);

        let date = self.date.as_deref().and_then(parse_date);
        if date.is_none() {
            notes.push(DataIssue::InvalidDate {
                event_id: id.clone(),
                value: self.date.clone(),
            });
        }

        let score = parse_points(self.score.as_ref()).unwrap_or_else(|value| {
            notes.push(DataIssue::InvalidScore {
                field: ScoreField::EventScore(id.clone()),
                value,
            });
            0
        });

        Event {
            date,
            title: self.title.map(|t| t.trim().to_string()).unwrap_or_default(),
            host: self.host.map(MemberId::new),
            score,
            media_link: self.media_link.filter(|link| !link.trim().is_empty()),
            id,
        }
    }
}

/// Read a score cell. `Err` carries the offending value for the note;
/// `Err(None)` means the cell was empty.
fn parse_points(value: Option<&Value>) -> Result<i64, Option<String>> {
    match value {
        None | Some(Value::Null) => Err(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(integral))
            .ok_or_else(|| Some(n.to_string())),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(None);
            }
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(integral))
                .ok_or_else(|| Some(s.clone()))
        }
        Some(other) => Err(Some(other.to_string())),
    }
}

/// Whole-number floats only; spreadsheets like to export 10 as 10.0
fn integral(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

fn parse_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accepts "2024-05-04", an RFC 3339 timestamp, or "2024-05-04 09:00:00".
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(value).map(|ts| ts.date()))
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn id_from_value<E: de::Error>(value: Value) -> Result<String, E> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(E::custom(format!("expected string or number id, got {}", other))),
    }
}

fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    id_from_value(Value::deserialize(deserializer)?)
}

/// Optional id; blank strings and nulls become `None`
fn de_opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => {
            let id = id_from_value::<D::Error>(value)?;
            Ok(Some(id).filter(|id| !id.trim().is_empty()))
        }
    }
}
