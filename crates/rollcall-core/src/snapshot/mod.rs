//! Immutable roster snapshot for one reporting pass.
//!
//! A `Snapshot` is the boundary between the loader and the engine. Building
//! one enforces the roster invariants:
//!
//! - member and event ids are unique (first row wins)
//! - attendance is a set and every link points at a known event and member
//! - event hosts reference known members
//! - `Member::last_attended` equals the latest dated event attended
//!
//! Anything repaired along the way is recorded in `Diagnostics`. A snapshot
//! is never mutated afterwards, so it can be cloned or shared behind an
//! `Arc` across concurrent passes.

pub mod raw;

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{DataIssue, Diagnostics, MissingSide};
use crate::models::{AttendanceLink, Event, EventId, Member, MemberId};

pub use raw::{RawAttendance, RawEvent, RawMember, RawSnapshot};

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    members: Vec<Member>,
    events: Vec<Event>,
    attendance: Vec<AttendanceLink>,
    member_index: HashMap<MemberId, usize>,
    event_index: HashMap<EventId, usize>,
    /// Event indexes per member, in declared link order
    attended: HashMap<MemberId, Vec<usize>>,
    /// Attendee ids per event, in declared link order
    attendees: HashMap<EventId, Vec<MemberId>>,
    diagnostics: Diagnostics,
}

impl Snapshot {
    pub fn new(members: Vec<Member>, events: Vec<Event>, attendance: Vec<AttendanceLink>) -> Self {
        Self::build(members, events, attendance, Diagnostics::new())
    }

    /// Build a snapshot, adding to notes already collected upstream.
    pub(crate) fn build(
        members: Vec<Member>,
        events: Vec<Event>,
        attendance: Vec<AttendanceLink>,
        mut diagnostics: Diagnostics,
    ) -> Self {
        let mut kept_members = Vec::with_capacity(members.len());
        let mut member_index = HashMap::with_capacity(members.len());
        for member in members {
            if member_index.contains_key(&member.id) {
                diagnostics.record(DataIssue::DuplicateMember {
                    member_id: member.id.clone(),
                });
                continue;
            }
            member_index.insert(member.id.clone(), kept_members.len());
            kept_members.push(member);
        }

        let mut kept_events = Vec::with_capacity(events.len());
        let mut event_index = HashMap::with_capacity(events.len());
        for mut event in events {
            if event_index.contains_key(&event.id) {
                diagnostics.record(DataIssue::DuplicateEvent {
                    event_id: event.id.clone(),
                });
                continue;
            }
            if event.date.is_none() && !diagnostics.has_invalid_date(&event.id) {
                diagnostics.record(DataIssue::InvalidDate {
                    event_id: event.id.clone(),
                    value: None,
                });
            }
            if let Some(host) = event.host.take() {
                if member_index.contains_key(&host) {
                    event.host = Some(host);
                } else {
                    diagnostics.record(DataIssue::UnknownHost {
                        event_id: event.id.clone(),
                        host,
                    });
                }
            }
            event_index.insert(event.id.clone(), kept_events.len());
            kept_events.push(event);
        }

        let mut kept_links = Vec::with_capacity(attendance.len());
        let mut seen = HashSet::with_capacity(attendance.len());
        let mut attended: HashMap<MemberId, Vec<usize>> = HashMap::new();
        let mut attendees: HashMap<EventId, Vec<MemberId>> = HashMap::new();
        for link in attendance {
            let event_idx = event_index.get(&link.event_id).copied();
            let has_member = member_index.contains_key(&link.member_id);
            let missing = match (event_idx, has_member) {
                (Some(_), true) => None,
                (None, true) => Some(MissingSide::Event),
                (Some(_), false) => Some(MissingSide::Member),
                (None, false) => Some(MissingSide::Both),
            };
            if let Some(missing) = missing {
                diagnostics.record(DataIssue::MissingReference {
                    event_id: link.event_id,
                    member_id: link.member_id,
                    missing,
                });
                continue;
            }
            if !seen.insert(link.clone()) {
                diagnostics.record(DataIssue::DuplicateAttendance {
                    event_id: link.event_id,
                    member_id: link.member_id,
                });
                continue;
            }
            if let Some(idx) = event_idx {
                attended.entry(link.member_id.clone()).or_default().push(idx);
            }
            attendees
                .entry(link.event_id.clone())
                .or_default()
                .push(link.member_id.clone());
            kept_links.push(link);
        }

        for member in &mut kept_members {
            let derived = attended
                .get(&member.id)
                .into_iter()
                .flatten()
                .filter_map(|&idx| kept_events[idx].date)
                .max();
            if let Some(supplied) = member.last_attended {
                if Some(supplied) != derived {
                    diagnostics.record(DataIssue::StaleLastAttended {
                        member_id: member.id.clone(),
                        supplied,
                        derived,
                    });
                }
            }
            member.last_attended = derived;
        }

        debug!(
            members = kept_members.len(),
            events = kept_events.len(),
            links = kept_links.len(),
            issues = diagnostics.len(),
            "Snapshot built"
        );

        Self {
            members: kept_members,
            events: kept_events,
            attendance: kept_links,
            member_index,
            event_index,
            attended,
            attendees,
            diagnostics,
        }
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn attendance(&self) -> &[AttendanceLink] {
        &self.attendance
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.member_index.get(id).map(|&idx| &self.members[idx])
    }

    pub fn event(&self, id: &EventId) -> Option<&Event> {
        self.event_index.get(id).map(|&idx| &self.events[idx])
    }

    /// Events a member attended, in declared link order
    pub fn events_attended_by<'a>(&'a self, id: &MemberId) -> impl Iterator<Item = &'a Event> + 'a {
        self.attended
            .get(id)
            .map(|indexes| indexes.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&idx| &self.events[idx])
    }

    /// Attendee ids of an event, in declared link order
    pub fn attendees_of(&self, id: &EventId) -> &[MemberId] {
        self.attendees.get(id).map(|ids| ids.as_slice()).unwrap_or_default()
    }

    /// Date of the earliest dated event a member attended
    pub fn first_attendance(&self, id: &MemberId) -> Option<NaiveDate> {
        self.events_attended_by(id).filter_map(|event| event.date).min()
    }
}
