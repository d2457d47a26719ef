use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{EventId, MemberId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    /// `None` when the loader could not parse the date. Such events still
    /// count toward cumulative scores but never toward a reporting period.
    pub date: Option<NaiveDate>,
    pub title: String,
    pub host: Option<MemberId>,
    /// Points awarded to every attendee.
    pub score: i64,
    pub media_link: Option<String>,
}

impl Event {
    pub fn new(
        id: impl Into<EventId>,
        date: Option<NaiveDate>,
        title: impl Into<String>,
        score: i64,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            title: title.into(),
            host: None,
            score,
            media_link: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<MemberId>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_media_link(mut self, link: impl Into<String>) -> Self {
        self.media_link = Some(link.into());
        self
    }

    /// Media link, skipping blank values left behind by row editors
    pub fn media_link(&self) -> Option<&str> {
        self.media_link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
    }

    pub fn is_hosted_by(&self, member: &MemberId) -> bool {
        self.host.as_ref() == Some(member)
    }

    /// "2024-05-04", or "TBD" when the date is unknown
    pub fn formatted_date(&self) -> String {
        match self.date {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => "TBD".to_string(),
        }
    }
}
