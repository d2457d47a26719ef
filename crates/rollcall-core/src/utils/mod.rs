//! Utility functions for string formatting and manipulation.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{cmp_ignore_case, escape_table_cell, format_cohort, format_points, join_or, single_line, strip_bold};
