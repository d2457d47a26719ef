use std::cmp::Ordering;

/// Compare two strings ignoring case, falling back to a byte comparison so
/// the order stays total
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Two-digit cohort for roster labels: 1988 -> "88", unknown -> "??"
pub fn format_cohort(birth_year: Option<i32>) -> String {
    match birth_year {
        Some(year) if year >= 0 => format!("{:02}", year % 100),
        _ => "??".to_string(),
    }
}

/// Format a score for the report: "15 pts"
pub fn format_points(points: i64) -> String {
    format!("{} pts", points)
}

/// Join names with ", ", or return `empty` when there are none
pub fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

/// Collapse line breaks into spaces so a value stays on one line
pub fn single_line(value: &str) -> String {
    value.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// Make a value safe for a pipe-delimited table cell
pub fn escape_table_cell(value: &str) -> String {
    single_line(value).replace('|', "\\|")
}

/// Remove markdown bold markers for plain-text channels
pub fn strip_bold(text: &str) -> String {
    text.replace("**", "")
}
