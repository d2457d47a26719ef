use serde::{Deserialize, Serialize};

use super::{EventId, MemberId};

/// One checked-off attendance. A snapshot keeps these as a set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttendanceLink {
    pub event_id: EventId,
    pub member_id: MemberId,
}

impl AttendanceLink {
    pub fn new(event_id: impl Into<EventId>, member_id: impl Into<MemberId>) -> Self {
        Self {
            event_id: event_id.into(),
            member_id: member_id.into(),
        }
    }
}
