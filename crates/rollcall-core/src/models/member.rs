use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::MemberId;
use crate::utils::{cmp_ignore_case, format_cohort};

/// Club role of a member. Ex-members stay on the roster but are left out of
/// every score, status list and report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Staff,
    Admin,
    #[serde(rename = "exmember", alias = "ex-member", alias = "ex_member")]
    ExMember,
}

impl Role {
    /// Parse a role name as stored on the roster, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" => Some(Role::Member),
            "staff" => Some(Role::Staff),
            "admin" => Some(Role::Admin),
            "exmember" | "ex-member" | "ex_member" => Some(Role::ExMember),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Member => write!(f, "member"),
            Role::Staff => write!(f, "staff"),
            Role::Admin => write!(f, "admin"),
            Role::ExMember => write!(f, "exmember"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    /// Birth-year cohort, e.g. 1988.
    pub birth_year: Option<i32>,
    pub area: Option<String>,
    pub role: Role,
    /// Editable baseline added on top of event scores.
    pub base_point: i64,
    pub registered_at: Option<NaiveDateTime>,
    /// Date of the latest attended event. Recomputed when a snapshot is built.
    pub last_attended: Option<NaiveDate>,
}

impl Member {
    pub fn new(id: impl Into<MemberId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            birth_year: None,
            area: None,
            role: Role::Member,
            base_point: 0,
            registered_at: None,
            last_attended: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_base_point(mut self, base_point: i64) -> Self {
        self.base_point = base_point;
        self
    }

    pub fn with_birth_year(mut self, birth_year: i32) -> Self {
        self.birth_year = Some(birth_year);
        self
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    pub fn registered(mut self, at: NaiveDateTime) -> Self {
        self.registered_at = Some(at);
        self
    }

    pub fn is_excluded(&self) -> bool {
        self.role == Role::ExMember
    }

    /// Check-off label: "88/Name/Area"
    pub fn roster_label(&self) -> String {
        let area = self.area.as_deref().filter(|a| !a.trim().is_empty()).unwrap_or("-");
        format!("{}/{}/{}", format_cohort(self.birth_year), self.name, area)
    }

    /// Roster order: birth-year cohort (unknown last), then name, then id.
    pub fn cmp_roster(&self, other: &Self) -> Ordering {
        let cohort = match (self.birth_year, other.birth_year) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        cohort
            .then_with(|| cmp_ignore_case(&self.name, &other.name))
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("member"), Some(Role::Member));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse(" staff "), Some(Role::Staff));
        assert_eq!(Role::parse("exmember"), Some(Role::ExMember));
        assert_eq!(Role::parse("ex-member"), Some(Role::ExMember));
        assert_eq!(Role::parse("guest"), None);
    }

    #[test]
    fn test_role_serde_uses_roster_names() {
        assert_eq!(serde_json::to_string(&Role::ExMember).unwrap(), "\"exmember\"");
        let role: Role = serde_json::from_str("\"ex-member\"").unwrap();
        assert_eq!(role, Role::ExMember);
    }

    #[test]
    fn test_roster_label() {
        let member = Member::new("1", "Kim").with_birth_year(1988).with_area("Seoul");
        assert_eq!(member.roster_label(), "88/Kim/Seoul");

        let unknown = Member::new("2", "Lee");
        assert_eq!(unknown.roster_label(), "??/Lee/-");
    }

    #[test]
    fn test_cmp_roster_puts_unknown_cohort_last() {
        let older = Member::new("3", "Park").with_birth_year(1985);
        let younger = Member::new("1", "Ahn").with_birth_year(1990);
        let unknown = Member::new("2", "Cho");

        let mut members = vec![&unknown, &younger, &older];
        members.sort_by(|a, b| a.cmp_roster(b));
        let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Park", "Ahn", "Cho"]);
    }
}
