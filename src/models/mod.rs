//! Scheduling domain models.
//!
//! Core data types for the thermoforming shop: cells and tables, jobs with
//! their operator overlays, the shop calendar, derived scheduling fields,
//! and panels (the realised production slots).
//!
//! # Domain Mapping
//!
//! | model | shop floor |
//! |-------|------------|
//! | `CellColor` / `TableId` | one of six cells, one of twelve tables |
//! | `Job` | a work order from the daily production load |
//! | `Derived` | scheduling quantity, build load/date, priority, class |
//! | `Panel` / `PrepPanel` | a timed slot on a table |
//! | `ShopCalendar` | business days and holidays |

mod calendar;
mod cell;
mod derived;
mod job;
mod panel;

pub use calendar::ShopCalendar;
pub use cell::{weekday_cell_order, CellColor, TableId};
pub use derived::{
    derive_all, derive_job, mold_depth_for, priority_for, Derived, JobUnit, MoldDepth, SchedClass,
    PRIORITY_EXPEDITE, PRIORITY_FUTURE, PRIORITY_PAST_DUE, PRIORITY_TODAY,
};
pub use job::{Job, MoldType, Pattern};
pub use panel::{
    CellSchedule, Panel, PrepPanel, SlotStatus, TableSchedule, TaskSpan, Unscheduled,
    UnscheduledReason,
};
