//! Method/variant search over job-to-cell allocations.
//!
//! Four selection methods, each runnable under up to three table-selection
//! variants, produce candidate allocations; every candidate is handed to
//! the single-cell simulator for a time-accurate schedule. Cells are
//! visited in a per-weekday rotation with ORANGE always last.
//!
//! # Methods
//!
//! 1. **Priority First** — strict priority bands; class pairing advisory.
//! 2. **Minimum Forced Idle** — pairing prohibitions hard; placements
//!    preserve the most remaining table capacity.
//! 3. **Maximum Output** — dedicates one or two cells to class A when the
//!    class-A surplus warrants it; avoids B-B; clusters class E.
//! 4. **Most Restricted Mix** — drains D/E first, pairing each opposite C
//!    (falling back to B, then A).
//!
//! # Variants
//!
//! *Job-first* picks the next job then the best table; *table-first*
//! walks tables in weekday order and picks each one's best job;
//! *fixture-first* groups jobs by fixture id to harvest zero-setup runs.

mod methods;
mod state;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::ShopConstants;
use crate::error::{ScheduleError, ScheduleWarning};
use crate::models::{CellColor, CellSchedule, JobUnit, TableId, Unscheduled};
use crate::resources::MoldBorrow;
use crate::validation::RunInputs;

pub(crate) use state::{fixture_key, PlanState, TablePrefs};

/// The four job-selection methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Method {
    PriorityFirst,
    MinimumForcedIdle,
    MaximumOutput,
    MostRestrictedMix,
}

impl Method {
    pub const ALL: [Method; 4] = [
        Method::PriorityFirst,
        Method::MinimumForcedIdle,
        Method::MaximumOutput,
        Method::MostRestrictedMix,
    ];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Method::PriorityFirst => "Priority First",
            Method::MinimumForcedIdle => "Minimum Forced Idle",
            Method::MaximumOutput => "Maximum Output",
            Method::MostRestrictedMix => "Most Restricted Mix",
        }
    }
}

/// The three table-selection variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Variant {
    JobFirst,
    TableFirst,
    FixtureFirst,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::JobFirst, Variant::TableFirst, Variant::FixtureFirst];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Variant::JobFirst => "Job First",
            Variant::TableFirst => "Table First",
            Variant::FixtureFirst => "Fixture First",
        }
    }
}

/// Which variants the search explores. Defaults to all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSet {
    pub job_first: bool,
    pub table_first: bool,
    pub fixture_first: bool,
}

impl Default for VariantSet {
    fn default() -> Self {
        Self::all()
    }
}

impl VariantSet {
    /// All three variants.
    pub fn all() -> Self {
        Self {
            job_first: true,
            table_first: true,
            fixture_first: true,
        }
    }

    /// Exactly the given variants.
    pub fn only(variants: &[Variant]) -> Self {
        Self {
            job_first: variants.contains(&Variant::JobFirst),
            table_first: variants.contains(&Variant::TableFirst),
            fixture_first: variants.contains(&Variant::FixtureFirst),
        }
    }

    /// Enabled variants in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Variant> {
        let set = *self;
        Variant::ALL.into_iter().filter(move |v| match v {
            Variant::JobFirst => set.job_first,
            Variant::TableFirst => set.table_first,
            Variant::FixtureFirst => set.fixture_first,
        })
    }
}

/// A job's rough placement on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedJob {
    /// Index into the run's job slice.
    pub job_index: usize,
    pub cell: CellColor,
    /// 0 or 1.
    pub table_num: usize,
    pub panels: u32,
    /// Pinned by an on-table-today overlay.
    pub on_table: bool,
}

impl PlacedJob {
    /// The placement's table id.
    pub fn table(&self) -> TableId {
        TableId::new(self.cell, self.table_num as u8 + 1)
    }
}

/// One method/variant candidate schedule after simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSchedule {
    pub method: Method,
    pub variant: Variant,
    pub schedule_date: NaiveDate,
    pub shift_minutes: i64,
    /// Simulated timelines for every active cell.
    pub cells: BTreeMap<CellColor, CellSchedule>,
    /// Rough placements in per-table execution order.
    pub assignments: Vec<PlacedJob>,
    /// Unplaced work, driver- and simulator-level combined.
    pub unscheduled: Vec<Unscheduled>,
    /// Mold substitutions performed for this candidate.
    pub borrows: Vec<MoldBorrow>,
    pub warnings: Vec<ScheduleWarning>,
}

impl VariantSchedule {
    /// Total final-plan panels across all cells.
    pub fn total_panels(&self) -> usize {
        self.cells.values().map(|c| c.total_panels()).sum()
    }

    /// Total forced idle minutes, operator plus tables.
    pub fn total_forced_idle(&self) -> i64 {
        self.cells
            .values()
            .map(|c| c.forced_operator_idle + c.forced_table_idle())
            .sum()
    }
}

/// Runs one method/variant combination over the job list.
pub fn run_variant(
    method: Method,
    variant: Variant,
    jobs: &[JobUnit],
    constants: &ShopConstants,
    inputs: &RunInputs,
) -> Result<VariantSchedule, ScheduleError> {
    let mut state = PlanState::new(jobs, constants, inputs);
    state.place_rehomes();
    match method {
        Method::PriorityFirst => methods::priority_first(&mut state, variant),
        Method::MinimumForcedIdle => methods::minimum_forced_idle(&mut state, variant),
        Method::MaximumOutput => methods::maximum_output(&mut state, variant),
        Method::MostRestrictedMix => methods::most_restricted_mix(&mut state, variant),
    }
    methods::record_residual_reasons(&mut state);
    state.finish(method, variant)
}
