//! Monthly highlights for the dashboard: the "hall of fame" rankings,
//! first-time attendees, event trends, cohort figures and a few roster-wide
//! numbers.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::{MemberId, MemberSummary};
use crate::period::ReportingPeriod;
use crate::snapshot::Snapshot;
use crate::utils::cmp_ignore_case;

/// Entries shown per ranking
const RANKING_SIZE: usize = 3;

/// Months in the short event trend, the evaluation month included
const TREND_MONTHS: u32 = 5;

/// Months behind the yearly event figures
const YEAR_MONTHS: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterOverview {
    /// Members still on the roster
    pub member_count: usize,
    /// Sum of every current score
    pub total_activity_score: i64,
    /// Members who attended within the dormancy window
    pub recently_active: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub month: ReportingPeriod,
    pub events: usize,
}

/// Event counts up to the evaluation date. Events dated later are not
/// counted yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventTrend {
    /// Last five months, oldest first, months without events included
    pub recent: Vec<MonthlyCount>,
    /// Mean over the last twelve months that had at least one event
    pub yearly_average: f64,
    /// Busiest month of the last twelve; the later month wins a tie
    pub peak: Option<MonthlyCount>,
    /// Quietest month of the last twelve that had events; the earlier month
    /// wins a tie
    pub low: Option<MonthlyCount>,
    pub current_month: usize,
}

/// Members and points per birth-year cohort
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CohortStat {
    pub birth_year: Option<i32>,
    pub members: usize,
    /// Sum of the cohort's current scores
    pub total_score: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Highlights {
    /// Most events hosted in the period
    pub top_hosts: Vec<RankedEntry>,
    /// Highest period scores
    pub top_attendees: Vec<RankedEntry>,
    /// Event titles by attendee count
    pub popular_events: Vec<RankedEntry>,
    pub overview: RosterOverview,
    pub event_trend: EventTrend,
    /// Known cohorts oldest first, unknown birth year last
    pub cohorts: Vec<CohortStat>,
}

/// A member whose first-ever attendance falls in the period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirstAttendance {
    pub member_id: MemberId,
    pub name: String,
    pub date: NaiveDate,
}

/// First-time attendees in member id order. Ex-members are skipped.
pub fn first_attendances(snapshot: &Snapshot, period: ReportingPeriod) -> Vec<FirstAttendance> {
    let mut firsts: Vec<FirstAttendance> = snapshot
        .members()
        .iter()
        .filter(|member| !member.is_excluded())
        .filter_map(|member| {
            let date = snapshot.first_attendance(&member.id)?;
            period.contains(date).then(|| FirstAttendance {
                member_id: member.id.clone(),
                name: member.name.clone(),
                date,
            })
        })
        .collect();
    firsts.sort_by(|a, b| a.member_id.cmp(&b.member_id));
    firsts
}

/// Sort by value (desc) then name, keep the top entries
fn top_entries(mut entries: Vec<(RankedEntry, Option<MemberId>)>) -> Vec<RankedEntry> {
    entries.sort_by(|(a, a_id), (b, b_id)| {
        b.value
            .cmp(&a.value)
            .then_with(|| cmp_ignore_case(&a.name, &b.name))
            .then_with(|| a_id.cmp(b_id))
    });
    entries
        .into_iter()
        .take(RANKING_SIZE)
        .map(|(entry, _)| entry)
        .collect()
}

pub fn event_trend(snapshot: &Snapshot, today: NaiveDate) -> EventTrend {
    let this_month = ReportingPeriod::containing(today);
    let window_start = this_month.months_before(YEAR_MONTHS - 1).first_day();

    let mut per_month: BTreeMap<ReportingPeriod, usize> = BTreeMap::new();
    for date in snapshot.events().iter().filter_map(|event| event.date) {
        if date >= window_start && date <= today {
            *per_month.entry(ReportingPeriod::containing(date)).or_default() += 1;
        }
    }

    let recent = (0..TREND_MONTHS)
        .rev()
        .map(|back| {
            let month = this_month.months_before(back);
            MonthlyCount {
                month,
                events: per_month.get(&month).copied().unwrap_or(0),
            }
        })
        .collect();

    let months: Vec<MonthlyCount> = per_month
        .iter()
        .map(|(&month, &events)| MonthlyCount { month, events })
        .collect();
    let by_count = |a: &MonthlyCount, b: &MonthlyCount| {
        a.events.cmp(&b.events).then_with(|| a.month.cmp(&b.month))
    };
    let total: usize = months.iter().map(|m| m.events).sum();

    EventTrend {
        recent,
        yearly_average: if months.is_empty() {
            0.0
        } else {
            total as f64 / months.len() as f64
        },
        peak: months.iter().copied().max_by(by_count),
        low: months.iter().copied().min_by(by_count),
        current_month: per_month.get(&this_month).copied().unwrap_or(0),
    }
}

pub fn cohorts(snapshot: &Snapshot, summaries: &[MemberSummary]) -> Vec<CohortStat> {
    // Keyed so that unknown birth years sort last
    let mut by_year: BTreeMap<(bool, Option<i32>), CohortStat> = BTreeMap::new();
    for summary in summaries {
        let Some(member) = snapshot.member(&summary.member_id).filter(|m| !m.is_excluded()) else {
            continue;
        };
        let stat = by_year
            .entry((member.birth_year.is_none(), member.birth_year))
            .or_insert(CohortStat {
                birth_year: member.birth_year,
                members: 0,
                total_score: 0,
            });
        stat.members += 1;
        stat.total_score = stat.total_score.saturating_add(summary.current_score);
    }
    by_year.into_values().collect()
}

pub fn compute(
    snapshot: &Snapshot,
    period: ReportingPeriod,
    summaries: &[MemberSummary],
    now: NaiveDateTime,
    dormant_days: i64,
) -> Highlights {
    let events_in_period: Vec<_> = snapshot
        .events()
        .iter()
        .filter(|event| period.contains_opt(event.date))
        .collect();

    let mut hosted: HashMap<&MemberId, i64> = HashMap::new();
    for event in &events_in_period {
        if let Some(host) = &event.host {
            *hosted.entry(host).or_default() += 1;
        }
    }
    let top_hosts = top_entries(
        hosted
            .into_iter()
            .filter_map(|(id, count)| {
                let member = snapshot.member(id).filter(|m| !m.is_excluded())?;
                Some((
                    RankedEntry {
                        name: member.name.clone(),
                        value: count,
                    },
                    Some(member.id.clone()),
                ))
            })
            .collect(),
    );

    let top_attendees = top_entries(
        summaries
            .iter()
            .filter(|summary| {
                snapshot
                    .events_attended_by(&summary.member_id)
                    .any(|event| period.contains_opt(event.date))
            })
            .map(|summary| {
                (
                    RankedEntry {
                        name: summary.name.clone(),
                        value: summary.period_score,
                    },
                    Some(summary.member_id.clone()),
                )
            })
            .collect(),
    );

    let mut by_title: HashMap<&str, i64> = HashMap::new();
    for event in &events_in_period {
        let count = snapshot
            .attendees_of(&event.id)
            .iter()
            .filter(|id| snapshot.member(id).is_some_and(|m| !m.is_excluded()))
            .count() as i64;
        *by_title.entry(event.title.as_str()).or_default() += count;
    }
    let popular_events = top_entries(
        by_title
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(title, count)| {
                (
                    RankedEntry {
                        name: title.to_string(),
                        value: count,
                    },
                    None,
                )
            })
            .collect(),
    );

    let today = now.date();
    let recently_active = summaries
        .iter()
        .filter_map(|summary| snapshot.member(&summary.member_id))
        .filter(|member| {
            member
                .last_attended
                .is_some_and(|last| (today - last).num_days() <= dormant_days)
        })
        .count();

    Highlights {
        top_hosts,
        top_attendees,
        popular_events,
        overview: RosterOverview {
            member_count: summaries.len(),
            total_activity_score: summaries
                .iter()
                .map(|s| s.current_score)
                .fold(0, i64::saturating_add),
            recently_active,
        },
        event_trend: event_trend(snapshot, today),
        cohorts: cohorts(snapshot, summaries),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceLink, Event, Member, Role};
    use crate::status::MemberStatus;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn may() -> ReportingPeriod {
        ReportingPeriod::new(2024, 5).unwrap()
    }

    fn summary(id: &str, name: &str, current: i64, period: i64) -> MemberSummary {
        MemberSummary {
            member_id: MemberId::from(id),
            name: name.to_string(),
            current_score: current,
            period_score: period,
            status: MemberStatus::Active,
        }
    }

    fn snapshot() -> Snapshot {
        let members = vec![
            Member::new("1", "Kim").with_birth_year(1990),
            Member::new("2", "Lee").with_birth_year(1988),
            Member::new("3", "Park"),
            Member::new("4", "Choi").with_birth_year(1988).with_role(Role::ExMember),
        ];
        let events = vec![
            Event::new("a", date(2024, 4, 27), "Ridge", 10).with_host("1"),
            Event::new("b", date(2024, 5, 4), "Ridge", 10).with_host("2"),
            Event::new("c", date(2024, 5, 11), "Lake", 5).with_host("2"),
            Event::new("d", date(2024, 5, 25), "Ridge", 10).with_host("4"),
        ];
        let links = vec![
            AttendanceLink::new("a", "1"),
            AttendanceLink::new("b", "1"),
            AttendanceLink::new("b", "2"),
            AttendanceLink::new("c", "2"),
            AttendanceLink::new("c", "3"),
            AttendanceLink::new("d", "4"),
        ];
        Snapshot::new(members, events, links)
    }

    fn summaries() -> Vec<MemberSummary> {
        vec![
            summary("1", "Kim", 20, 10),
            summary("2", "Lee", 15, 15),
            summary("3", "Park", 5, 5),
        ]
    }

    #[test]
    fn test_first_attendances() {
        let firsts = first_attendances(&snapshot(), may());
        let names: Vec<&str> = firsts.iter().map(|f| f.name.as_str()).collect();
        // Kim first came in April; Choi is an ex-member
        assert_eq!(names, vec!["Lee", "Park"]);
        assert_eq!(firsts[0].date, date(2024, 5, 4).unwrap());
    }

    #[test]
    fn test_rankings() {
        let now = date(2024, 5, 31).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let highlights = compute(&snapshot(), may(), &summaries(), now, 90);

        assert_eq!(
            highlights.top_hosts,
            vec![RankedEntry { name: "Lee".to_string(), value: 2 }]
        );
        assert_eq!(
            highlights.top_attendees,
            vec![
                RankedEntry { name: "Lee".to_string(), value: 15 },
                RankedEntry { name: "Kim".to_string(), value: 10 },
                RankedEntry { name: "Park".to_string(), value: 5 },
            ]
        );
        // Choi's attendance at the second Ridge outing is not counted
        assert_eq!(
            highlights.popular_events,
            vec![
                RankedEntry { name: "Lake".to_string(), value: 2 },
                RankedEntry { name: "Ridge".to_string(), value: 2 },
            ]
        );
    }

    #[test]
    fn test_popular_events_skip_exmembers() {
        let members = vec![
            Member::new("1", "Kim"),
            Member::new("2", "Gone").with_role(Role::ExMember),
        ];
        let events = vec![Event::new("a", date(2024, 5, 4), "Ridge", 10)];
        let links = vec![AttendanceLink::new("a", "1"), AttendanceLink::new("a", "2")];
        let snapshot = Snapshot::new(members, events, links);
        let now = date(2024, 5, 31).unwrap().and_hms_opt(9, 0, 0).unwrap();

        let highlights = compute(&snapshot, may(), &[summary("1", "Kim", 10, 10)], now, 90);
        assert_eq!(
            highlights.popular_events,
            vec![RankedEntry { name: "Ridge".to_string(), value: 1 }]
        );
        assert_eq!(crate::report::event_blocks(&snapshot, may())[0].attendees.len(), 1);
    }

    // -------------------------------------------------------------------------
    // Event trend
    // -------------------------------------------------------------------------

    fn month(y: i32, m: u32, events: usize) -> MonthlyCount {
        MonthlyCount {
            month: ReportingPeriod::new(y, m).unwrap(),
            events,
        }
    }

    #[test]
    fn test_event_trend() {
        let trend = event_trend(&snapshot(), date(2024, 5, 31).unwrap());

        assert_eq!(
            trend.recent,
            vec![
                month(2024, 1, 0),
                month(2024, 2, 0),
                month(2024, 3, 0),
                month(2024, 4, 1),
                month(2024, 5, 3),
            ]
        );
        assert_eq!(trend.yearly_average, 2.0);
        assert_eq!(trend.peak, Some(month(2024, 5, 3)));
        assert_eq!(trend.low, Some(month(2024, 4, 1)));
        assert_eq!(trend.current_month, 3);
    }

    #[test]
    fn test_event_trend_ignores_future_and_old_events() {
        let events = vec![
            Event::new("old", date(2023, 5, 20), "Too old", 1),
            Event::new("a", date(2023, 6, 3), "June", 1),
            Event::new("b", date(2024, 4, 6), "April", 1),
            Event::new("c", date(2024, 5, 4), "May", 1),
            Event::new("later", date(2024, 5, 25), "Not yet", 1),
            Event::new("undated", None, "Undated", 1),
        ];
        let snapshot = Snapshot::new(vec![], events, vec![]);
        let trend = event_trend(&snapshot, date(2024, 5, 20).unwrap());

        assert_eq!(trend.current_month, 1);
        assert_eq!(trend.yearly_average, 1.0);
        // Three months tie at one event
        assert_eq!(trend.peak, Some(month(2024, 5, 1)));
        assert_eq!(trend.low, Some(month(2023, 6, 1)));
    }

    #[test]
    fn test_event_trend_without_events() {
        let trend = event_trend(&Snapshot::default(), date(2024, 5, 20).unwrap());
        assert_eq!(trend.recent.len(), 5);
        assert!(trend.recent.iter().all(|m| m.events == 0));
        assert_eq!(trend.yearly_average, 0.0);
        assert_eq!(trend.peak, None);
        assert_eq!(trend.low, None);
    }

    // -------------------------------------------------------------------------
    // Cohorts
    // -------------------------------------------------------------------------

    #[test]
    fn test_cohorts() {
        let stats = cohorts(&snapshot(), &summaries());
        assert_eq!(
            stats,
            vec![
                CohortStat { birth_year: Some(1988), members: 1, total_score: 15 },
                CohortStat { birth_year: Some(1990), members: 1, total_score: 20 },
                CohortStat { birth_year: None, members: 1, total_score: 5 },
            ]
        );
    }

    #[test]
    fn test_overview() {
        let now = date(2024, 6, 30).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let highlights = compute(&snapshot(), may(), &summaries(), now, 90);

        assert_eq!(highlights.overview.member_count, 3);
        assert_eq!(highlights.overview.total_activity_score, 40);
        // Kim last attended May 4, Lee and Park May 11
        assert_eq!(highlights.overview.recently_active, 3);

        let later = date(2024, 8, 20).unwrap().and_hms_opt(9, 0, 0).unwrap();
        // May 11 is 101 days before Aug 20; May 4 is 108
        assert_eq!(compute(&snapshot(), may(), &summaries(), later, 90).overview.recently_active, 0);
    }

    #[test]
    fn test_overview_total_saturates() {
        let huge = i64::MAX / 2 + 1;
        let members = vec![
            Member::new("1", "Kim").with_base_point(huge),
            Member::new("2", "Lee").with_base_point(huge),
        ];
        let snapshot = Snapshot::new(members, vec![], vec![]);
        let now = date(2024, 5, 31).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let summaries = vec![summary("1", "Kim", huge, 0), summary("2", "Lee", huge, 0)];

        let highlights = compute(&snapshot, may(), &summaries, now, 90);
        assert_eq!(highlights.overview.total_activity_score, i64::MAX);
        assert_eq!(highlights.cohorts[0].total_score, i64::MAX);
    }

    #[test]
    fn test_empty_period() {
        let now = date(2024, 5, 31).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let january = ReportingPeriod::new(2023, 1).unwrap();
        let highlights = compute(&snapshot(), january, &[], now, 90);
        assert!(highlights.top_hosts.is_empty());
        assert!(highlights.top_attendees.is_empty());
        assert!(highlights.popular_events.is_empty());
        assert_eq!(highlights.overview, RosterOverview::default());
    }
}
