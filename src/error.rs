//! Error and warning types for the scheduling engine.
//!
//! Errors fall into the categories the engine surfaces to callers:
//! validation failures (bad input fields), configuration failures (missing
//! constants rows), infeasibility, resource exhaustion, and invariant
//! violations. Resource contention during a run is *not* an error; the
//! driver recovers from it locally and reports it per job.

use thiserror::Error;

use crate::models::SchedClass;

/// Engine-level failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// A job field failed validation. Reported with its source row.
    #[error("invalid {field} in row {row}: {reason}")]
    InvalidInputField {
        /// 1-based row of the offending record.
        row: usize,
        /// Field name as it appears in the job list.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// No cycle-time row exists for a wire-diameter / equivalent pair.
    #[error("no cycle-time row for wire diameter {wire_diameter} / equivalent {equivalent}")]
    ConstantsLookupMiss {
        wire_diameter: f64,
        equivalent: f64,
    },

    /// Constants data is structurally broken (missing mold, bad compliance row).
    #[error("configuration error in {source_name}: {issue}")]
    Configuration { source_name: String, issue: String },

    /// No method/variant produced any placement at all.
    #[error("no feasible schedule: {0}")]
    NoFeasibleSchedule(String),

    /// A required mold or fixture is unavailable in any quantity that
    /// would let the run proceed.
    #[error("resource exhausted: need {required} {resource}, {available} available")]
    ResourceExhausted {
        resource: String,
        required: u32,
        available: u32,
    },

    /// An on-table-today job sits on an inactive cell and no active cell
    /// can host its scheduling class.
    #[error("job {job_id} on {table} is on an inactive cell with no re-home target for class {class:?}")]
    InfeasibleOnTableToday {
        job_id: String,
        table: String,
        class: SchedClass,
    },

    /// A simulator invariant was broken. Always a bug, never downgraded.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

/// A non-fatal issue surfaced alongside the schedule.
///
/// Warnings never block a run. Typical sources: an on-table-today job on
/// the orange cell without orange eligibility, re-homing from an inactive
/// cell, or a pre-reservation that overdrew a resource pool.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScheduleWarning {
    /// Job the warning concerns, if any.
    pub job_id: Option<String>,
    /// Field or subsystem that raised it.
    pub context: String,
    /// Human-readable description.
    pub message: String,
}

impl ScheduleWarning {
    /// Creates a warning tied to a job.
    pub fn for_job(
        job_id: impl Into<String>,
        context: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            job_id: Some(job_id.into()),
            context: context.into(),
            message: message.into(),
        }
    }

    /// Creates a run-level warning.
    pub fn for_run(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            job_id: None,
            context: context.into(),
            message: message.into(),
        }
    }
}
