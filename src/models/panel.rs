//! Panels: realised production slots on a table.
//!
//! A panel becomes real when the simulator commits a job to a slot. It
//! carries absolute minute timings for the five-task pipeline
//! setup → layout → pour → cure → unload, anchored to the shift start.
//! A prep panel carries only setup and layout; it is the end-of-day
//! hand-off to tomorrow's shift.

use serde::{Deserialize, Serialize};

use super::{CellColor, TableId};

/// A half-open minute interval `[start, end)` within the shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpan {
    pub start: i64,
    pub end: i64,
}

impl TaskSpan {
    /// Creates a span.
    pub fn new(start: i64, end: i64) -> Self {
        debug_assert!(end >= start);
        Self { start, end }
    }

    /// A zero-duration span at `at` (used for skipped setup/layout).
    pub fn zero_at(at: i64) -> Self {
        Self { start: at, end: at }
    }

    /// Span length in minutes.
    #[inline]
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }
}

/// Status of a table slot.
///
/// Statuses evolve monotonically `Unassigned → RoughPlan → FinalPlan`;
/// a rough-plan slot reverts to unassigned when its layout cannot complete
/// within the shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotStatus {
    Unassigned,
    RoughPlan,
    FinalPlan,
}

/// A committed (final-plan) panel with absolute task timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub table: TableId,
    /// Job this panel belongs to.
    pub job_id: String,
    /// Ordinal of this panel within the job's run on this table (0-based).
    pub ordinal: u32,
    pub setup: TaskSpan,
    pub layout: TaskSpan,
    pub pour: TaskSpan,
    pub cure: TaskSpan,
    pub unload: TaskSpan,
}

impl Panel {
    /// When work on the panel begins.
    pub fn start(&self) -> i64 {
        self.setup.start
    }

    /// When the panel leaves the table.
    pub fn end(&self) -> i64 {
        self.unload.end
    }

    /// Operator-bearing minutes (everything but cure).
    pub fn operator_minutes(&self) -> i64 {
        self.setup.duration() + self.layout.duration() + self.pour.duration()
            + self.unload.duration()
    }

    /// The five tasks in pipeline order, for invariant checks and reports.
    pub fn tasks_in_order(&self) -> [(&'static str, TaskSpan); 5] {
        [
            ("SETUP", self.setup),
            ("LAYOUT", self.layout),
            ("POUR", self.pour),
            ("CURE", self.cure),
            ("UNLOAD", self.unload),
        ]
    }
}

/// An end-of-day prep panel: setup and layout done, pour deferred to
/// tomorrow. Becomes that table's on-table-today job in the next run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepPanel {
    pub table: TableId,
    pub job_id: String,
    pub setup: TaskSpan,
    pub layout: TaskSpan,
}

impl PrepPanel {
    /// Operator minutes consumed by the prep.
    pub fn operator_minutes(&self) -> i64 {
        self.setup.duration() + self.layout.duration()
    }
}

/// Why a job (or part of one) could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnscheduledReason {
    /// Fixture concurrency limit reached.
    NoFixture,
    /// Mold reservation failed even after substitution.
    NoMold,
    /// No table capacity left within the shift.
    NoCapacity,
    /// The class pairing rules left no admissible table.
    ClassPairingBlocked,
}

/// An unplaced remainder of a job, with the blocking reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unscheduled {
    pub job_id: String,
    /// Panels left unplaced.
    pub panels: u32,
    pub reason: UnscheduledReason,
}

/// One table's share of a cell schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchedule {
    pub table: TableId,
    pub panels: Vec<Panel>,
    pub prep: Option<PrepPanel>,
    /// Minutes the table sat finished-curing while the operator was busy.
    pub forced_idle: i64,
}

impl TableSchedule {
    pub fn new(table: TableId) -> Self {
        Self {
            table,
            panels: Vec::new(),
            prep: None,
            forced_idle: 0,
        }
    }

    /// Number of final-plan panels.
    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }
}

/// Timed output of the single-cell simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSchedule {
    pub cell: CellColor,
    pub shift_minutes: i64,
    /// Table 1 and table 2.
    pub tables: [TableSchedule; 2],
    /// Minutes the operator waited on cures with nothing else to do.
    pub forced_operator_idle: i64,
    /// Total operator-bearing minutes, prep panels included.
    pub operator_minutes: i64,
    /// Panels that could not be placed within the shift.
    pub unscheduled: Vec<Unscheduled>,
}

impl CellSchedule {
    /// Total final-plan panels across both tables.
    pub fn total_panels(&self) -> usize {
        self.tables.iter().map(|t| t.panel_count()).sum()
    }

    /// Combined forced table idle across both tables.
    pub fn forced_table_idle(&self) -> i64 {
        self.tables.iter().map(|t| t.forced_idle).sum()
    }

    /// All panels in table order.
    pub fn all_panels(&self) -> impl Iterator<Item = &Panel> {
        self.tables.iter().flat_map(|t| t.panels.iter())
    }
}
