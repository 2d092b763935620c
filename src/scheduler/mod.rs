//! Cell simulation and schedule evaluation.
//!
//! `cell` holds the time-accurate two-table/one-operator simulator; `kpi`
//! summarises simulated candidates and applies the comparison rule that
//! picks the recommended schedule.

mod cell;
mod kpi;

pub use cell::{simulate_cell, JobRun};
pub use kpi::{
    best_index, best_per_method, evaluate, recommend, ClassPanels, PriorityMetrics,
    ScheduleStatus, VariantEvaluation,
};
