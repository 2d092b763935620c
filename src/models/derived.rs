//! Derived job fields.
//!
//! Computed once per run from the raw job record and the cycle-time
//! constants: scheduling quantity, build load, build date, priority,
//! fixture id, mold depth, and scheduling class. The computation is pure
//! and idempotent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::ShopConstants;
use crate::error::ScheduleError;
use crate::models::Job;

/// Priority 0: build date already passed, or due today with expedite.
pub const PRIORITY_PAST_DUE: u8 = 0;
/// Priority 1: build date is the schedule date.
pub const PRIORITY_TODAY: u8 = 1;
/// Priority 2: future build date with expedite set.
pub const PRIORITY_EXPEDITE: u8 = 2;
/// Priority 3: future build date.
pub const PRIORITY_FUTURE: u8 = 3;

/// Mold depth requirement, derived from wire diameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoldDepth {
    /// Wire diameter ≥ 8.
    Deep,
    /// Everything lighter.
    Std,
}

/// Scheduling class letter summarising cycle difficulty.
///
/// Drives the table-pairing rules: two C jobs must not run opposite each
/// other in one cell, nor two jobs from {D, E}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SchedClass {
    A,
    B,
    C,
    D,
    E,
}

impl SchedClass {
    /// Every class, A through E.
    pub const ALL: [SchedClass; 5] = [
        SchedClass::A,
        SchedClass::B,
        SchedClass::C,
        SchedClass::D,
        SchedClass::E,
    ];

    /// Whether the class belongs to the restricted {D, E} group.
    pub fn is_restricted(self) -> bool {
        matches!(self, SchedClass::D | SchedClass::E)
    }
}

impl std::fmt::Display for SchedClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            SchedClass::A => "A",
            SchedClass::B => "B",
            SchedClass::C => "C",
            SchedClass::D => "D",
            SchedClass::E => "E",
        };
        f.write_str(letter)
    }
}

/// Fields derived from a job and the constants, fixed for the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Derived {
    /// Panels to schedule: remaining quantity when on a table, else the
    /// full production quantity.
    pub sched_qty: u32,
    /// Estimated shifts to complete, rounded to two decimals.
    pub build_load: f64,
    /// Latest start date that still meets the ship date.
    pub build_date: NaiveDate,
    /// 0 (most urgent) through 3.
    pub priority: u8,
    /// Fixture id, when the job needs one.
    pub fixture_id: Option<String>,
    /// Deep or standard molds.
    pub mold_depth: MoldDepth,
    /// Scheduling class from the cycle-time row.
    pub sched_class: SchedClass,
    /// Pull-ahead days from the cycle-time row.
    pub pull_ahead: f64,
    /// Scheduling constant used in the build-load formula.
    pub sched_constant: u32,
}

impl Derived {
    /// Whether the job is already past its build date.
    pub fn is_past_due(&self) -> bool {
        self.priority == PRIORITY_PAST_DUE
    }

    /// Whether the job must be built today or earlier.
    pub fn is_due_today(&self) -> bool {
        self.priority <= PRIORITY_TODAY
    }

    /// Human-readable priority label.
    pub fn priority_label(&self) -> &'static str {
        match self.priority {
            PRIORITY_PAST_DUE => "Past Due",
            PRIORITY_TODAY => "Due Today",
            PRIORITY_EXPEDITE => "Expedite",
            _ => "Future",
        }
    }
}

/// A job paired with its derived fields.
///
/// The driver and simulator index into a flat slice of these; all
/// cross-references are by index, never by pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobUnit {
    pub job: Job,
    pub derived: Derived,
}

/// Computes the derived fields for one job.
///
/// Fails with [`ScheduleError::ConstantsLookupMiss`] when no cycle-time
/// row covers the job's wire diameter / equivalent pair.
pub fn derive_job(
    job: &Job,
    constants: &ShopConstants,
    today: NaiveDate,
) -> Result<Derived, ScheduleError> {
    let timing = constants.timing_for(job.wire_diameter, job.equivalent)?;

    let sched_qty = match (job.on_table_today, job.quantity_remaining) {
        (Some(_), Some(remaining)) => remaining,
        _ => job.prod_qty,
    };

    let build_load = (sched_qty as f64 * job.equivalent) / timing.sched_constant as f64;
    let lead_days = (build_load + timing.pull_ahead).ceil() as i64;
    let build_date = constants
        .calendar
        .subtract_business_days(job.req_by, lead_days);

    Ok(Derived {
        sched_qty,
        build_load: (build_load * 100.0).round() / 100.0,
        build_date,
        priority: priority_for(build_date, today, job.expedite),
        fixture_id: job.fixture_id(),
        mold_depth: mold_depth_for(job.wire_diameter),
        sched_class: timing.sched_class,
        pull_ahead: timing.pull_ahead,
        sched_constant: timing.sched_constant,
    })
}

/// Computes derived fields for every job, in input order.
pub fn derive_all(
    jobs: &[Job],
    constants: &ShopConstants,
    today: NaiveDate,
) -> Result<Vec<JobUnit>, ScheduleError> {
    jobs.iter()
        .map(|job| {
            Ok(JobUnit {
                job: job.clone(),
                derived: derive_job(job, constants, today)?,
            })
        })
        .collect()
}

/// Priority from build date vs the schedule date and the expedite flag.
pub fn priority_for(build_date: NaiveDate, today: NaiveDate, expedite: bool) -> u8 {
    if build_date < today {
        PRIORITY_PAST_DUE
    } else if build_date == today {
        if expedite {
            PRIORITY_PAST_DUE
        } else {
            PRIORITY_TODAY
        }
    } else if expedite {
        PRIORITY_EXPEDITE
    } else {
        PRIORITY_FUTURE
    }
}

/// Mold depth from wire diameter: deep at 8 and above.
pub fn mold_depth_for(wire_diameter: f64) -> MoldDepth {
    if wire_diameter >= 8.0 {
        MoldDepth::Deep
    } else {
        MoldDepth::Std
    }
}
