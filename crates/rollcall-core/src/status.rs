//! Engagement status classification.
//!
//! Every member gets exactly one status, decided by the first rule that
//! matches:
//!
//! 1. `Excluded`: the member left the club (role `exmember`)
//! 2. `DormantNew`: registered within `new_member_days` and has not attended
//!    anything since registering
//! 3. `DormantLongterm`: last attended more than `dormant_days` ago, or never
//!    attended and registered more than `dormant_days` ago
//! 4. `Active`: everyone else
//!
//! Classification is a pure function of the member, its attendance and the
//! evaluation time.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::{Event, Member};
use crate::policy::PolicyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "kebab-case")]
pub enum MemberStatus {
    Excluded,
    DormantNew,
    DormantLongterm,
    Active,
}

impl MemberStatus {
    /// Stable machine key, e.g. "dormant-new"
    pub fn key(&self) -> &'static str {
        match self {
            MemberStatus::Excluded => "excluded",
            MemberStatus::DormantNew => "dormant-new",
            MemberStatus::DormantLongterm => "dormant-longterm",
            MemberStatus::Active => "active",
        }
    }

    /// Label shown on the scoreboard
    pub fn label(&self) -> &'static str {
        match self {
            MemberStatus::Excluded => "exmember",
            MemberStatus::DormantNew => "🌱🚨 New, not yet attended",
            MemberStatus::DormantLongterm => "😴🚨 Long-term absence",
            MemberStatus::Active => "✅ Active",
        }
    }

    /// Warning marker for the dormant variants
    pub fn warning_marker(&self) -> Option<&'static str> {
        match self {
            MemberStatus::DormantNew => Some("🌱🚨"),
            MemberStatus::DormantLongterm => Some("😴🚨"),
            MemberStatus::Excluded | MemberStatus::Active => None,
        }
    }

    pub fn is_dormant(&self) -> bool {
        self.warning_marker().is_some()
    }
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Whole calendar days from `from` to `to`
fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Whether any attendance counts as "since registration". Attendance at an
/// undated event always counts.
pub fn attended_since<'a>(events: impl IntoIterator<Item = &'a Event>, since: NaiveDate) -> bool {
    events
        .into_iter()
        .any(|event| event.date.map_or(true, |date| date >= since))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusClassifier {
    new_member_days: i64,
    dormant_days: i64,
}

impl StatusClassifier {
    pub fn new(new_member_days: i64, dormant_days: i64) -> Self {
        Self {
            new_member_days,
            dormant_days,
        }
    }

    pub fn from_policy(policy: &PolicyConfig) -> Self {
        Self::new(policy.new_member_days, policy.dormant_days)
    }

    /// Classify a member given the events it attended.
    pub fn classify<'a>(
        &self,
        member: &Member,
        attended: impl IntoIterator<Item = &'a Event>,
        now: NaiveDateTime,
    ) -> MemberStatus {
        if member.is_excluded() {
            return MemberStatus::Excluded;
        }

        let today = now.date();
        let registered = member.registered_at.map(|at| at.date());

        if let Some(registered) = registered {
            let newcomer = days_between(registered, today) <= self.new_member_days;
            if newcomer && !attended_since(attended, registered) {
                return MemberStatus::DormantNew;
            }
        }

        let dormant = match member.last_attended {
            Some(last) => days_between(last, today) > self.dormant_days,
            // No registration date: nothing says the member is recent
            None => registered.map_or(true, |r| days_between(r, today) > self.dormant_days),
        };

        if dormant {
            MemberStatus::DormantLongterm
        } else {
            MemberStatus::Active
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Duration;

    const NO_EVENTS: [&Event; 0] = [];

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 30)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn days_ago(days: i64) -> NaiveDateTime {
        now() - Duration::days(days)
    }

    fn classifier() -> StatusClassifier {
        StatusClassifier::new(60, 90)
    }

    fn attended_event(days: i64) -> Event {
        Event::new("e", Some(days_ago(days).date()), "Hike", 10)
    }

    fn member_attended(registered_days_ago: i64, last_days_ago: Option<i64>) -> Member {
        let mut member = Member::new("1", "Kim").registered(days_ago(registered_days_ago));
        member.last_attended = last_days_ago.map(|d| days_ago(d).date());
        member
    }

    // -------------------------------------------------------------------------
    // Precedence
    // -------------------------------------------------------------------------

    #[test]
    fn test_exmember_is_excluded_first() {
        let member = member_attended(5, None).with_role(Role::ExMember);
        assert_eq!(classifier().classify(&member, NO_EVENTS, now()), MemberStatus::Excluded);
    }

    #[test]
    fn test_newcomer_without_attendance_is_dormant_new() {
        let member = member_attended(5, None);
        assert_eq!(classifier().classify(&member, NO_EVENTS, now()), MemberStatus::DormantNew);
    }

    #[test]
    fn test_newcomer_with_attendance_is_active() {
        let event = attended_event(2);
        let member = member_attended(5, Some(2));
        assert_eq!(classifier().classify(&member, [&event], now()), MemberStatus::Active);
    }

    #[test]
    fn test_attendance_before_registration_does_not_count() {
        // Rejoined member: the old attendance predates the new registration
        let event = attended_event(300);
        let member = member_attended(10, Some(300));
        assert_eq!(classifier().classify(&member, [&event], now()), MemberStatus::DormantNew);
    }

    #[test]
    fn test_undated_attendance_counts_as_attended() {
        let event = Event::new("e", None, "Hike", 10);
        let member = member_attended(10, None);
        // Not new-dormant; not long-term either since registration is recent
        assert_eq!(classifier().classify(&member, [&event], now()), MemberStatus::Active);
    }

    // -------------------------------------------------------------------------
    // Boundaries
    // -------------------------------------------------------------------------

    #[test]
    fn test_new_member_window_is_inclusive() {
        assert_eq!(classifier().classify(&member_attended(60, None), NO_EVENTS, now()), MemberStatus::DormantNew);
        assert_eq!(classifier().classify(&member_attended(61, None), NO_EVENTS, now()), MemberStatus::Active);
    }

    #[test]
    fn test_dormant_window_is_exclusive() {
        let event = attended_event(90);
        let member = member_attended(400, Some(90));
        assert_eq!(classifier().classify(&member, [&event], now()), MemberStatus::Active);

        let event = attended_event(91);
        let member = member_attended(400, Some(91));
        assert_eq!(classifier().classify(&member, [&event], now()), MemberStatus::DormantLongterm);
    }

    #[test]
    fn test_never_attended_long_ago_registration_is_dormant() {
        assert_eq!(classifier().classify(&member_attended(91, None), NO_EVENTS, now()), MemberStatus::DormantLongterm);
        assert_eq!(classifier().classify(&member_attended(90, None), NO_EVENTS, now()), MemberStatus::Active);
    }

    #[test]
    fn test_unknown_registration() {
        let member = Member::new("1", "Kim");
        assert_eq!(classifier().classify(&member, NO_EVENTS, now()), MemberStatus::DormantLongterm);

        let event = attended_event(3);
        let mut member = Member::new("1", "Kim");
        member.last_attended = event.date;
        assert_eq!(classifier().classify(&member, [&event], now()), MemberStatus::Active);
    }

    #[test]
    fn test_classification_is_total_and_pure() {
        let roles = [Role::Member, Role::Staff, Role::Admin, Role::ExMember];
        for role in roles {
            for registered in [0, 30, 60, 61, 90, 91, 365] {
                for last in [None, Some(0), Some(45), Some(90), Some(91), Some(500)] {
                    let member = member_attended(registered, last).with_role(role);
                    let events: Vec<Event> = last.into_iter().map(attended_event).collect();
                    let first = classifier().classify(&member, &events, now());
                    let second = classifier().classify(&member, &events, now());
                    assert_eq!(first, second);
                    assert_eq!(first == MemberStatus::Excluded, role == Role::ExMember);
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Labels
    // -------------------------------------------------------------------------

    #[test]
    fn test_warning_markers_distinct() {
        assert_eq!(MemberStatus::Active.warning_marker(), None);
        assert_ne!(
            MemberStatus::DormantNew.warning_marker(),
            MemberStatus::DormantLongterm.warning_marker()
        );
        assert!(MemberStatus::DormantNew.is_dormant());
        assert!(!MemberStatus::Excluded.is_dormant());
        assert!(MemberStatus::DormantLongterm.label().contains("😴🚨"));
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&MemberStatus::DormantLongterm).unwrap();
        assert_eq!(json, "\"dormant-longterm\"");
        assert_eq!(MemberStatus::DormantNew.key(), "dormant-new");
    }
}
