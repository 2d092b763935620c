//! Input integrity checks, run before any scheduling.
//!
//! Detects bad field shapes, out-of-range values, inconsistent operator
//! overlays (duplicate table assignments, remaining quantity without a
//! table), missing cycle-time rows, and invalid run inputs. Errors block
//! the run and carry row + field; warnings are surfaced alongside the
//! schedule.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{Shift, ShopConstants};
use crate::driver::VariantSet;
use crate::error::{ScheduleError, ScheduleWarning};
use crate::models::{mold_depth_for, CellColor, Job, MoldDepth, MoldType, TableId};
use crate::resources::mold_requirement;

/// Operator-supplied run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInputs {
    /// Date being scheduled; must be a business day.
    pub schedule_date: NaiveDate,
    /// Cells that are staffed today.
    pub active_cells: BTreeSet<CellColor>,
    pub shift: Shift,
    /// Whether the ORANGE cell may be scheduled at all.
    pub orange_enabled: bool,
    /// Summer mode: cure durations scale by the configured multiplier.
    pub summer: bool,
    /// ORANGE mold exclusions; specialty molds default to excluded.
    pub orange_allow_3inurethane: bool,
    pub orange_allow_double2cc: bool,
    pub orange_allow_deep_double2cc: bool,
    /// Which table-selection variants the search explores.
    pub variants: VariantSet,
}

impl RunInputs {
    /// Creates inputs for a date with no active cells and a standard shift.
    pub fn new(schedule_date: NaiveDate) -> Self {
        Self {
            schedule_date,
            active_cells: BTreeSet::new(),
            shift: Shift::Standard,
            orange_enabled: false,
            summer: false,
            orange_allow_3inurethane: false,
            orange_allow_double2cc: false,
            orange_allow_deep_double2cc: false,
            variants: VariantSet::all(),
        }
    }

    /// Activates a cell.
    pub fn with_cell(mut self, cell: CellColor) -> Self {
        self.active_cells.insert(cell);
        self
    }

    /// Activates several cells.
    pub fn with_cells(mut self, cells: impl IntoIterator<Item = CellColor>) -> Self {
        self.active_cells.extend(cells);
        self
    }

    /// Sets the shift.
    pub fn with_shift(mut self, shift: Shift) -> Self {
        self.shift = shift;
        self
    }

    /// Sets summer mode.
    pub fn with_summer(mut self, summer: bool) -> Self {
        self.summer = summer;
        self
    }

    /// Enables the ORANGE cell (also activates it).
    pub fn with_orange_enabled(mut self) -> Self {
        self.orange_enabled = true;
        self.active_cells.insert(CellColor::Orange);
        self
    }

    /// Restricts the variant search.
    pub fn with_variants(mut self, variants: VariantSet) -> Self {
        self.variants = variants;
        self
    }

    /// Whether a cell is active.
    pub fn is_active(&self, cell: CellColor) -> bool {
        self.active_cells.contains(&cell)
    }

    /// Whether a job of this depth/mold type may run on ORANGE.
    pub fn allows_on_orange(&self, depth: MoldDepth, mold_type: MoldType) -> bool {
        match (depth, mold_type) {
            (_, MoldType::Standard) => true,
            (MoldDepth::Deep, _) => self.orange_allow_deep_double2cc,
            (MoldDepth::Std, MoldType::ThreeInUrethane) => self.orange_allow_3inurethane,
            (MoldDepth::Std, MoldType::Double2cc) => self.orange_allow_double2cc,
        }
    }
}

/// Collected outcome of validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ScheduleError>,
    pub warnings: Vec<ScheduleWarning>,
}

impl ValidationReport {
    /// Whether scheduling may proceed.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn field_error(&mut self, row: usize, field: &str, reason: impl Into<String>) {
        self.errors.push(ScheduleError::InvalidInputField {
            row,
            field: field.to_string(),
            reason: reason.into(),
        });
    }
}

/// Validates the job list and run inputs against the constants.
pub fn validate_run(
    jobs: &[Job],
    constants: &ShopConstants,
    inputs: &RunInputs,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !constants.calendar.is_business_day(inputs.schedule_date) {
        report.errors.push(ScheduleError::InvalidInputField {
            row: 0,
            field: "schedule_date".into(),
            reason: format!("{} is not a business day", inputs.schedule_date),
        });
    }
    if inputs.active_cells.is_empty() {
        report.errors.push(ScheduleError::InvalidInputField {
            row: 0,
            field: "active_cells".into(),
            reason: "at least one cell must be active".into(),
        });
    }
    if inputs.orange_enabled && !inputs.is_active(CellColor::Orange) {
        report.warnings.push(ScheduleWarning::for_run(
            "orange_enabled",
            "ORANGE is enabled but not active; orange-only jobs will not be scheduled",
        ));
    }

    let mut tables_in_use: BTreeMap<TableId, String> = BTreeMap::new();

    for job in jobs {
        validate_job_fields(job, &mut report);
        validate_mold_type(job, &mut report);
        validate_mold_feasibility(job, constants, &mut report);

        if constants
            .timing_for(job.wire_diameter, job.equivalent)
            .is_err()
        {
            report.field_error(
                job.row,
                "WIRE_DIAMETER/EQUIVALENT",
                format!(
                    "no cycle-time row for {}/{}",
                    job.wire_diameter, job.equivalent
                ),
            );
        }

        if let Some(table) = job.on_table_today {
            validate_on_table(job, table, inputs, &mut tables_in_use, &mut report);
        } else if job.quantity_remaining.is_some() {
            report.field_error(
                job.row,
                "JOB_QUANTITY_REMAINING",
                "set without ON_TABLE_TODAY",
            );
        }
    }

    report
}

fn validate_job_fields(job: &Job, report: &mut ValidationReport) {
    if !job_id_well_formed(&job.id) {
        report.field_error(job.row, "JOB", "job id must look like NNNNNN-NN-N");
    }
    if job.prod_qty == 0 {
        report.field_error(job.row, "PROD_QTY", "must be a positive integer");
    }
    if job.molds == 0 {
        report.field_error(job.row, "MOLDS", "must be a positive integer");
    }
    if job.equivalent <= 0.0 {
        report.field_error(job.row, "EQUIVALENT", "must be positive");
    }
    if job.opening_size <= 0.0 {
        report.field_error(job.row, "OPENING_SIZE", "must be positive");
    }
    if job.wire_diameter <= 0.0 {
        report.field_error(job.row, "WIRE_DIAMETER", "must be positive");
    }
}

fn validate_mold_type(job: &Job, report: &mut ValidationReport) {
    // The STD DOUBLE2CC decomposition draws N−2 color molds plus the
    // specialty singleton, so at least two molds are needed.
    if mold_depth_for(job.wire_diameter) == MoldDepth::Std
        && job.mold_type == MoldType::Double2cc
        && job.molds < 2
    {
        report.field_error(job.row, "MOLDS", "DOUBLE2CC jobs need at least 2 molds");
    }
}

/// A single job whose deep or specialty mold need exceeds the entire pool
/// can never run, regardless of scheduling choices.
fn validate_mold_feasibility(job: &Job, constants: &ShopConstants, report: &mut ValidationReport) {
    let depth = mold_depth_for(job.wire_diameter);
    // The primary pool of a STD job depends on the target cell; only the
    // cell-independent pools are checked here.
    let requirement = mold_requirement(depth, job.mold_type, CellColor::Red, job.molds);
    let mut shortfalls = Vec::new();
    if depth == MoldDepth::Deep {
        shortfalls.push((requirement.primary_pool.clone(), requirement.primary_count));
    }
    if let Some((pool, count)) = &requirement.specialty {
        shortfalls.push((pool.clone(), *count));
    }
    for (pool, needed) in shortfalls {
        let capacity = constants.molds.get(&pool).map(|m| m.quantity).unwrap_or(0);
        if needed > capacity {
            report.errors.push(ScheduleError::ResourceExhausted {
                resource: pool,
                required: needed,
                available: capacity,
            });
        }
    }
}

fn validate_on_table(
    job: &Job,
    table: TableId,
    inputs: &RunInputs,
    tables_in_use: &mut BTreeMap<TableId, String>,
    report: &mut ValidationReport,
) {
    match job.quantity_remaining {
        None => {
            report.field_error(
                job.row,
                "JOB_QUANTITY_REMAINING",
                "required when ON_TABLE_TODAY is set",
            );
        }
        Some(remaining) => {
            if remaining == 0 || remaining > job.prod_qty {
                report.field_error(
                    job.row,
                    "JOB_QUANTITY_REMAINING",
                    format!("must be between 1 and PROD_QTY ({})", job.prod_qty),
                );
            }
        }
    }

    if let Some(previous) = tables_in_use.insert(table, job.id.clone()) {
        report.field_error(
            job.row,
            "ON_TABLE_TODAY",
            format!("table {table} is already occupied by job {previous}"),
        );
    }

    if table.cell == CellColor::Orange && !job.orange_eligible {
        // Accepted: the operator has physically committed the job.
        report.warnings.push(ScheduleWarning::for_job(
            &job.id,
            "ON_TABLE_TODAY",
            format!("job is on {table} but not orange-eligible"),
        ));
    }

    if !inputs.is_active(table.cell) {
        report.warnings.push(ScheduleWarning::for_job(
            &job.id,
            "ON_TABLE_TODAY",
            format!("cell {} is inactive; job will be re-homed", table.cell),
        ));
    }
}

/// `NNNNNN-NN-N`: six digits, one or two digits, one digit.
fn job_id_well_formed(id: &str) -> bool {
    let mut parts = id.split('-');
    let (Some(a), Some(b), Some(c), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(a) && a.len() == 6 && digits(b) && b.len() <= 2 && digits(c) && c.len() == 1
}
