//! Data models for studio bookings.
//!
//! - `EventRecord`, `EventDate`: one booking as the spreadsheet reports it
//! - `BookedRow`: the four columns rendered for an active booking
//! - `ScheduleRow`: one formatted row of the full schedule sheet

pub mod event;
pub mod schedule;

pub use event::{active_snapshot, booked_rows, BookedEventsResponse, BookedRow, EventDate, EventRecord};
pub use schedule::{schedule_rows, ScheduleResponse, ScheduleRow};
