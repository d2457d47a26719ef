//! Typed roster records.
//!
//! This module contains the data structures a reporting pass works on:
//!
//! - `Member`, `Role`: roster entries and their club role
//! - `Event`: dated outings with a score value and optional host
//! - `AttendanceLink`: who attended which event
//! - `MemberSummary`: per-member result of a pass, rebuilt every time
//! - `MemberId`, `EventId`: identifiers with a stable, numeric-aware order

pub mod attendance;
pub mod event;
pub mod id;
pub mod member;
pub mod summary;

pub use attendance::AttendanceLink;
pub use event::Event;
pub use id::{EventId, MemberId};
pub use member::{Member, Role};
pub use summary::MemberSummary;
