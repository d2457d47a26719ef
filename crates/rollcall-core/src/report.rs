//! Monthly activity report.
//!
//! The report is markdown-flavoured plain text meant to be pasted into the
//! club's group channel, so its layout is a compatibility contract: hard line
//! breaks are two trailing spaces, the scoreboard is a pipe table, and the
//! sections always appear in the same order:
//!
//! 1. optional club-rules preamble
//! 2. header naming the period
//! 3. one block per (date, title) event group
//! 4. awards
//! 5. first-time attendees
//! 6. attendance warnings
//! 7. scoreboard
//!
//! Nothing here computes scores or statuses; the composer only lays out what
//! the earlier stages produced. Identical inputs give byte-identical text.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::highlights::FirstAttendance;
use crate::milestone::Award;
use crate::models::{Member, MemberId, MemberSummary};
use crate::period::ReportingPeriod;
use crate::policy::PolicyConfig;
use crate::snapshot::Snapshot;
use crate::status::MemberStatus;
use crate::utils::{escape_table_cell, format_points, join_or, single_line, strip_bold};

/// Markdown hard line break
const HARD_BREAK: &str = "  \n";

const RULE: &str = "────────────────";

const HOST_MARKER: &str = "👑";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attendee {
    pub member_id: MemberId,
    pub name: String,
    pub is_host: bool,
}

impl Attendee {
    fn display(&self) -> String {
        if self.is_host {
            format!("{} {}", HOST_MARKER, self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Events of one day sharing a title, merged for the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventBlock {
    pub date: NaiveDate,
    pub title: String,
    pub attendees: Vec<Attendee>,
    pub media_link: Option<String>,
}

struct Group<'a> {
    date: NaiveDate,
    title: &'a str,
    members: Vec<&'a Member>,
    seen: HashSet<&'a MemberId>,
    hosts: HashSet<&'a MemberId>,
    media_link: Option<&'a str>,
}

/// Group the period's events by (date, title), date ascending then declared
/// order. Attendees are listed in roster order; ex-members are left out.
pub fn event_blocks(snapshot: &Snapshot, period: ReportingPeriod) -> Vec<EventBlock> {
    let mut dated: Vec<_> = snapshot
        .events()
        .iter()
        .filter_map(|event| {
            event
                .date
                .filter(|date| period.contains(*date))
                .map(|date| (date, event))
        })
        .collect();
    // Stable: same-day events keep their declared order
    dated.sort_by_key(|(date, _)| *date);

    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<(NaiveDate, &str), usize> = HashMap::new();
    for (date, event) in dated {
        let idx = *index.entry((date, event.title.as_str())).or_insert_with(|| {
            groups.push(Group {
                date,
                title: &event.title,
                members: Vec::new(),
                seen: HashSet::new(),
                hosts: HashSet::new(),
                media_link: None,
            });
            groups.len() - 1
        });
        let group = &mut groups[idx];

        if let Some(host) = &event.host {
            group.hosts.insert(host);
        }
        if group.media_link.is_none() {
            group.media_link = event.media_link();
        }
        for id in snapshot.attendees_of(&event.id) {
            let Some(member) = snapshot.member(id) else {
                continue;
            };
            if !member.is_excluded() && group.seen.insert(&member.id) {
                group.members.push(member);
            }
        }
    }

    groups
        .into_iter()
        .map(|mut group| {
            group.members.sort_by(|a, b| a.cmp_roster(b));
            EventBlock {
                date: group.date,
                title: group.title.to_string(),
                attendees: group
                    .members
                    .iter()
                    .map(|member| Attendee {
                        member_id: member.id.clone(),
                        name: member.name.clone(),
                        is_host: group.hosts.contains(&member.id),
                    })
                    .collect(),
                media_link: group.media_link.map(str::to_string),
            }
        })
        .collect()
}

/// Everything the composer lays out
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub period: ReportingPeriod,
    pub policy: &'a PolicyConfig,
    pub blocks: &'a [EventBlock],
    pub summaries: &'a [MemberSummary],
    pub awards: &'a [Award],
    pub first_attendances: &'a [FirstAttendance],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Report {
    text: String,
}

impl Report {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Plain-text copy without bold markers, for channels that do not
    /// render markdown
    pub fn channel_copy(&self) -> String {
        strip_bold(&self.text)
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

struct Writer {
    out: String,
}

impl Writer {
    /// Names and titles come from roster cells and may hold line breaks
    fn line(&mut self, text: impl AsRef<str>) {
        self.out.push_str(&single_line(text.as_ref()));
        self.out.push_str(HARD_BREAK);
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }
}

pub fn compose(ctx: &ReportContext<'_>) -> Report {
    let mut w = Writer { out: String::new() };

    if let Some(url) = ctx.policy.rules_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        w.line("🔗 **Club rules**");
        w.line(url);
        w.blank();
    }

    w.line(format!("⛰️ **{} activity report**", ctx.period));
    w.line(RULE);
    w.blank();

    write_events(&mut w, ctx.blocks);
    write_awards(&mut w, ctx.awards);
    write_first_attendances(&mut w, ctx.first_attendances);

    let mut summaries: Vec<&MemberSummary> = ctx
        .summaries
        .iter()
        .filter(|summary| summary.status != MemberStatus::Excluded)
        .collect();
    summaries.sort_by(|a, b| a.member_id.cmp(&b.member_id));

    write_warnings(&mut w, &summaries);
    write_scoreboard(&mut w, &summaries);

    w.blank();
    w.line(RULE);
    w.out.push_str(&single_line(&ctx.policy.sign_off));

    Report { text: w.out }
}

fn write_events(w: &mut Writer, blocks: &[EventBlock]) {
    w.line("📅 **[Events this month]**");
    if blocks.is_empty() {
        w.line("No activity this period");
        w.blank();
        return;
    }
    for block in blocks {
        let names: Vec<String> = block.attendees.iter().map(Attendee::display).collect();
        w.line(format!("📍 {} | {}", block.date.format("%Y-%m-%d"), block.title));
        w.line(format!("└ Attendees ({}): {}", block.attendees.len(), join_or(&names, "none")));
        if let Some(link) = &block.media_link {
            w.line(format!("└ 📸 Album: {}", link));
        }
        w.blank();
    }
}

fn write_awards(w: &mut Writer, awards: &[Award]) {
    w.line("🏆 **[Awards this month]**");
    let mut awards: Vec<&Award> = awards.iter().collect();
    awards.sort_by(|a, b| a.member_id.cmp(&b.member_id));
    if awards.is_empty() {
        w.line("No awards this period");
    }
    for award in awards {
        w.line(format!(
            "✨ {} ({}) — {}",
            award.name,
            format_points(award.current_score),
            award.label
        ));
    }
    w.blank();
}

fn write_first_attendances(w: &mut Writer, firsts: &[FirstAttendance]) {
    w.line("🎉 **[Welcome, first-timers]**");
    if firsts.is_empty() {
        w.line("None");
    }
    for first in firsts {
        w.line(format!(
            "🎊 {} (first attendance: {})",
            first.name,
            first.date.format("%Y-%m-%d")
        ));
    }
    w.blank();
}

fn write_warnings(w: &mut Writer, summaries: &[&MemberSummary]) {
    let names_with = |status: MemberStatus| -> Vec<String> {
        summaries
            .iter()
            .filter(|summary| summary.status == status)
            .map(|summary| summary.name.clone())
            .collect()
    };

    w.line("🚨 **[Attendance warnings]**");
    w.line("😴 **Long-term absence**:");
    w.line(join_or(&names_with(MemberStatus::DormantLongterm), "None"));
    w.line("🌱 **New, not yet attended**:");
    w.line(join_or(&names_with(MemberStatus::DormantNew), "None"));
    w.blank();
}

fn write_scoreboard(w: &mut Writer, summaries: &[&MemberSummary]) {
    w.line("🔢 **[Scoreboard]**");
    w.line("| Member | This month | Total | Status |");
    w.line("| :--- | ---: | ---: | :---: |");
    for summary in summaries {
        w.line(format!(
            "| {} | {} | {} | {} |",
            escape_table_cell(&summary.name),
            format_points(summary.period_score),
            format_points(summary.current_score),
            summary.status.label()
        ));
    }
}
