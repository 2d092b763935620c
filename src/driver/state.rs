//! Planning state shared by the scheduling methods.
//!
//! Holds the rough per-table plan being built: availability cursors, the
//! class occupying each table (for pairing rules), the resource pool, and
//! the remaining panel counts per job. Methods pick jobs and tables
//! through [`PlanState::find_table`] / [`PlanState::place`], then
//! [`PlanState::finish`] hands each table's placements, in search order,
//! to the time-accurate simulation.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use tracing::{debug, warn};

use crate::constants::ShopConstants;
use crate::error::{ScheduleError, ScheduleWarning};
use crate::models::{
    weekday_cell_order, CellColor, JobUnit, SchedClass, TableId, Unscheduled, UnscheduledReason,
};
use crate::resources::{Receipt, ResourcePool};
use crate::scheduler::{simulate_cell, JobRun};
use crate::validation::RunInputs;

use super::{Method, PlacedJob, Variant, VariantSchedule};

/// Minutes of context-switch slack charged per extra rough-plan panel.
const TRANSITION_OVERHEAD: i64 = 5;

/// Summer-adjusted cycle figures for one job, precomputed per run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CycleTimes {
    setup: i64,
    /// Layout + pour: the operator block after setup.
    layout_pour: i64,
    cure: i64,
    unload: i64,
}

impl CycleTimes {
    /// Effective minutes for one panel: during cure the operator can work
    /// the other table, so the cycle is bounded by the slower of operator
    /// work and cure.
    fn effective_first(&self, needs_setup: bool) -> i64 {
        let op = if needs_setup { self.setup } else { 0 } + self.layout_pour;
        op.max(self.cure) + self.unload
    }

    fn effective_subsequent(&self) -> i64 {
        self.layout_pour.max(self.cure) + self.unload
    }
}

/// Rough state of one table during method search.
#[derive(Debug)]
pub(crate) struct TableSlot {
    pub table: TableId,
    /// Minutes into the shift when the next setup could start.
    pub when_available: i64,
    /// Scheduling class of the most recent job, for pairing rules.
    pub current_class: Option<SchedClass>,
    /// Fixture key of the most recent job, for setup skipping.
    pub last_key: Option<String>,
    /// Resource receipt of the current job.
    pub receipt: Option<Receipt>,
}

impl TableSlot {
    fn new(table: TableId) -> Self {
        Self {
            table,
            when_available: 0,
            current_class: None,
            last_key: None,
            receipt: None,
        }
    }
}

/// One cell's pair of table slots.
#[derive(Debug)]
pub(crate) struct CellSlot {
    pub tables: [TableSlot; 2],
}

impl CellSlot {
    /// Whether placing `class` on table `t` violates the pairing
    /// prohibitions: C opposite C, or {D, E} opposite {D, E}.
    pub fn pairing_conflict(&self, class: SchedClass, t: usize) -> bool {
        match self.tables[1 - t].current_class {
            None => false,
            Some(opposite) => {
                (class == SchedClass::C && opposite == SchedClass::C)
                    || (class.is_restricted() && opposite.is_restricted())
            }
        }
    }
}

/// A table choice produced by [`PlanState::find_table`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub cell: CellColor,
    pub table_num: usize,
    pub panels: u32,
    pub rough: i64,
}

/// Knobs for table selection, combined per method and variant.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TablePrefs<'a> {
    /// Pairing prohibitions are hard (skip) rather than scored.
    pub hard_pairing: bool,
    /// Classes preferred on the opposite table, with a fallback set.
    pub prefer_opposite: Option<&'a [SchedClass]>,
    pub fallback_opposite: Option<&'a [SchedClass]>,
    /// Penalise B opposite B.
    pub avoid_bb: bool,
    /// Reward a table whose last fixture matches.
    pub prefer_fixture: Option<&'a str>,
    /// Only these cells are admissible.
    pub restrict_cells: Option<&'a BTreeSet<CellColor>>,
    /// These cells are off limits.
    pub exclude_cells: Option<&'a BTreeSet<CellColor>>,
    /// Consider exactly one table (table-first variants).
    pub restrict_table: Option<(CellColor, usize)>,
    /// Reward one specific table (class-E clustering).
    pub prefer_table: Option<(CellColor, usize)>,
    /// Score by capacity left after placement instead of before.
    pub preserve_capacity: bool,
    /// Allow partial placements when the full job does not fit.
    pub allow_split: bool,
}

/// Mutable search state for one method/variant run.
pub(crate) struct PlanState<'a> {
    pub jobs: &'a [JobUnit],
    pub constants: &'a ShopConstants,
    pub inputs: &'a RunInputs,
    pub shift: i64,
    pub cells: BTreeMap<CellColor, CellSlot>,
    pub pool: ResourcePool,
    /// Active cells in today's weekday order.
    pub order: Vec<CellColor>,
    pub placed: Vec<PlacedJob>,
    /// Panels still to place, per job index.
    pub remaining: Vec<u32>,
    pub warnings: Vec<ScheduleWarning>,
    cycles: Vec<Option<CycleTimes>>,
    unscheduled_reasons: BTreeMap<usize, UnscheduledReason>,
    rehome: Vec<usize>,
}

impl<'a> PlanState<'a> {
    pub(crate) fn new(
        jobs: &'a [JobUnit],
        constants: &'a ShopConstants,
        inputs: &'a RunInputs,
    ) -> Self {
        let shift = constants.shift_minutes(inputs.shift);
        let order: Vec<CellColor> = weekday_cell_order(inputs.schedule_date.weekday())
            .into_iter()
            .filter(|c| inputs.is_active(*c))
            .collect();

        let mut cells = BTreeMap::new();
        for color in CellColor::ALL {
            cells.insert(
                color,
                CellSlot {
                    tables: [
                        TableSlot::new(TableId::new(color, 1)),
                        TableSlot::new(TableId::new(color, 2)),
                    ],
                },
            );
        }

        let cycles = jobs
            .iter()
            .map(|unit| {
                constants
                    .timing_for(unit.job.wire_diameter, unit.job.equivalent)
                    .ok()
                    .map(|timing| CycleTimes {
                        setup: timing.setup,
                        layout_pour: timing.layout + timing.pour_minutes(unit.job.molds),
                        cure: timing.cure_minutes(inputs.summer, constants.summer_cure_multiplier),
                        unload: timing.unload,
                    })
            })
            .collect();

        let mut state = Self {
            jobs,
            constants,
            inputs,
            shift,
            cells,
            pool: ResourcePool::new(constants, inputs.active_cells.clone()),
            order,
            placed: Vec::new(),
            remaining: jobs.iter().map(|u| u.derived.sched_qty).collect(),
            warnings: Vec::new(),
            cycles,
            unscheduled_reasons: BTreeMap::new(),
            rehome: Vec::new(),
        };
        state.seed_on_table_jobs();
        state
    }

    /// Pre-reserves resources for on-table-today jobs and pins them to
    /// their tables; jobs on inactive cells go to the re-home set.
    fn seed_on_table_jobs(&mut self) {
        for (index, unit) in self.jobs.iter().enumerate() {
            let Some(table) = unit.job.on_table_today else {
                continue;
            };
            if !self.inputs.is_active(table.cell) {
                self.rehome.push(index);
                continue;
            }
            let fixture = unit
                .derived
                .fixture_id
                .as_deref()
                .map(|f| (f, unit.job.pattern));
            let (receipt, notes) = self.pool.pre_reserve(
                table,
                &unit.job.id,
                fixture,
                unit.derived.mold_depth,
                unit.job.mold_type,
                unit.job.molds,
            );
            for note in notes {
                self.warnings
                    .push(ScheduleWarning::for_job(&unit.job.id, "pre-reservation", note));
            }
            let panels = unit.derived.sched_qty;
            let rough = self.rough_time(index, panels, false);
            let t = (table.num - 1) as usize;
            if let Some(cell) = self.cells.get_mut(&table.cell) {
                let slot = &mut cell.tables[t];
                slot.when_available += rough;
                slot.current_class = Some(unit.derived.sched_class);
                slot.last_key = Some(fixture_key(unit));
                slot.receipt = Some(receipt);
            }
            self.placed.push(PlacedJob {
                job_index: index,
                cell: table.cell,
                table_num: t,
                panels,
                on_table: true,
            });
            self.remaining[index] = 0;
        }
    }

    /// Places re-homed jobs ahead of the method's own ordering.
    pub(crate) fn place_rehomes(&mut self) {
        for index in self.rehome.clone() {
            let prefs = TablePrefs {
                hard_pairing: true,
                allow_split: true,
                ..TablePrefs::default()
            };
            let need = self.remaining[index];
            match self.find_table(index, need, &prefs) {
                Ok(candidate) => {
                    self.place(index, &candidate);
                }
                Err(reason) => {
                    let unit = &self.jobs[index];
                    warn!(job = %unit.job.id, ?reason, "re-home placement failed");
                    self.note_unscheduled(index, reason);
                    self.warnings.push(ScheduleWarning::for_job(
                        &unit.job.id,
                        "re-home",
                        "no active table could host the displaced job",
                    ));
                }
            }
        }
    }

    pub(crate) fn unit(&self, index: usize) -> &JobUnit {
        &self.jobs[index]
    }

    /// Job indices with panels left to place.
    pub(crate) fn pending(&self) -> Vec<usize> {
        (0..self.jobs.len())
            .filter(|&i| self.remaining[i] > 0)
            .collect()
    }

    pub(crate) fn note_unscheduled(&mut self, index: usize, reason: UnscheduledReason) {
        self.unscheduled_reasons.entry(index).or_insert(reason);
    }

    /// Rough single-table minutes for `panels` panels of a job.
    pub(crate) fn rough_time(&self, index: usize, panels: u32, needs_setup: bool) -> i64 {
        let Some(cycle) = self.cycles[index] else {
            return i64::MAX / 4;
        };
        match panels {
            0 => 0,
            n => {
                cycle.effective_first(needs_setup)
                    + (n as i64 - 1) * (cycle.effective_subsequent() + TRANSITION_OVERHEAD)
            }
        }
    }

    /// How many panels of a job fit in `available` minutes on one table.
    pub(crate) fn max_panels_fit(&self, index: usize, available: i64, needs_setup: bool) -> u32 {
        let Some(cycle) = self.cycles[index] else {
            return 0;
        };
        let first = cycle.effective_first(needs_setup);
        if first > available {
            return 0;
        }
        let per = cycle.effective_subsequent() + TRANSITION_OVERHEAD;
        (1 + (available - first) / per) as u32
    }

    /// Active cells that can host a job: mold-depth compliance plus the
    /// ORANGE eligibility and mold-type gates.
    pub(crate) fn compliant_cells(&self, index: usize) -> BTreeSet<CellColor> {
        let unit = &self.jobs[index];
        self.inputs
            .active_cells
            .iter()
            .copied()
            .filter(|&cell| {
                if cell == CellColor::Orange {
                    if !self.inputs.orange_enabled || !unit.job.orange_eligible {
                        return false;
                    }
                    if !self
                        .inputs
                        .allows_on_orange(unit.derived.mold_depth, unit.job.mold_type)
                    {
                        return false;
                    }
                }
                self.constants.is_cell_compliant(cell, unit.derived.mold_depth)
            })
            .collect()
    }

    /// Finds the best table for a job under the given preferences.
    ///
    /// Tables are visited in weekday cell order; ties keep the earlier
    /// table, so the rotation breaks ties deterministically. On failure
    /// the dominant blocking reason is returned.
    pub(crate) fn find_table(
        &self,
        index: usize,
        panels_needed: u32,
        prefs: &TablePrefs,
    ) -> Result<Candidate, UnscheduledReason> {
        let unit = &self.jobs[index];
        let class = unit.derived.sched_class;
        let key = fixture_key(unit);
        let compliant = self.compliant_cells(index);
        let fixture = unit
            .derived
            .fixture_id
            .as_deref()
            .map(|f| (f, unit.job.pattern));

        let mut best: Option<(i64, Candidate)> = None;
        let mut pairing_blocked = false;
        let mut resource_reason = None;

        for &color in &self.order {
            if !compliant.contains(&color) {
                continue;
            }
            if prefs.restrict_cells.is_some_and(|s| !s.contains(&color)) {
                continue;
            }
            if prefs.exclude_cells.is_some_and(|s| s.contains(&color)) {
                continue;
            }
            if prefs
                .restrict_table
                .is_some_and(|(c, _)| c != color)
            {
                continue;
            }
            let cell = &self.cells[&color];
            for t in 0..2 {
                if prefs.restrict_table.is_some_and(|(_, tt)| tt != t) {
                    continue;
                }
                let slot = &cell.tables[t];
                let available = self.shift - slot.when_available;
                if available < self.constants.pour_cutoff_minutes {
                    continue;
                }
                let needs_setup = slot.last_key.as_deref() != Some(key.as_str());

                let (panels, rough) = if prefs.allow_split {
                    let max = self.max_panels_fit(index, available, needs_setup);
                    if max == 0 {
                        continue;
                    }
                    let p = max.min(panels_needed);
                    (p, self.rough_time(index, p, needs_setup))
                } else {
                    let rough = self.rough_time(index, panels_needed, needs_setup);
                    if rough > available {
                        continue;
                    }
                    (panels_needed, rough)
                };

                let conflict = cell.pairing_conflict(class, t);
                if conflict && prefs.hard_pairing {
                    pairing_blocked = true;
                    continue;
                }

                if let Err(failure) = self.pool.can_reserve(
                    slot.table,
                    &unit.job.id,
                    fixture,
                    unit.derived.mold_depth,
                    unit.job.mold_type,
                    unit.job.molds,
                    slot.receipt,
                ) {
                    resource_reason = Some(failure.reason());
                    continue;
                }

                let opposite = cell.tables[1 - t].current_class;
                let mut score = 0i64;
                if !conflict {
                    score += 1000;
                }
                if let Some(prefer) = prefs.prefer_opposite {
                    match opposite {
                        Some(c) if prefer.contains(&c) => score += 1000,
                        Some(c)
                            if prefs.fallback_opposite.is_some_and(|f| f.contains(&c)) =>
                        {
                            score += 500
                        }
                        None => score += 250,
                        _ => {}
                    }
                }
                if prefs.avoid_bb
                    && !(class == SchedClass::B && opposite == Some(SchedClass::B))
                {
                    score += 200;
                }
                if let Some(prefer_fixture) = prefs.prefer_fixture {
                    score += match slot.last_key.as_deref() {
                        Some(k) if k == prefer_fixture => 1000,
                        None => 500,
                        _ => 100,
                    };
                }
                if prefs.prefer_table == Some((color, t)) {
                    score += 500;
                }
                score += panels as i64 * 10;
                score += if prefs.preserve_capacity {
                    available - rough
                } else {
                    available
                };

                if best.as_ref().map_or(true, |(b, _)| score > *b) {
                    best = Some((
                        score,
                        Candidate {
                            cell: color,
                            table_num: t,
                            panels,
                            rough,
                        },
                    ));
                }
            }
        }

        match best {
            Some((_, candidate)) => Ok(candidate),
            None if pairing_blocked => Err(UnscheduledReason::ClassPairingBlocked),
            None => Err(resource_reason.unwrap_or(UnscheduledReason::NoCapacity)),
        }
    }

    /// Commits a candidate: reserves resources (replacing the table's
    /// previous receipt) and updates the rough plan. Returns the panels
    /// actually placed (zero when the reservation failed after all).
    pub(crate) fn place(&mut self, index: usize, candidate: &Candidate) -> u32 {
        let unit = &self.jobs[index];
        let job_id = unit.job.id.clone();
        let key = fixture_key(unit);
        let class = unit.derived.sched_class;
        let fixture_id = unit.derived.fixture_id.clone();
        let fixture = fixture_id.as_deref().map(|f| (f, unit.job.pattern));
        let depth = unit.derived.mold_depth;
        let mold_type = unit.job.mold_type;
        let molds = unit.job.molds;

        let Some(cell) = self.cells.get_mut(&candidate.cell) else {
            return 0;
        };
        let slot = &mut cell.tables[candidate.table_num];
        let replacing = slot.receipt.take();
        match self.pool.try_reserve(
            slot.table,
            &job_id,
            fixture,
            depth,
            mold_type,
            molds,
            replacing,
        ) {
            Ok(receipt) => {
                slot.receipt = Some(receipt);
                slot.when_available += candidate.rough;
                slot.current_class = Some(class);
                slot.last_key = Some(key);
                self.placed.push(PlacedJob {
                    job_index: index,
                    cell: candidate.cell,
                    table_num: candidate.table_num,
                    panels: candidate.panels,
                    on_table: false,
                });
                self.remaining[index] -= candidate.panels;
                candidate.panels
            }
            Err(failure) => {
                slot.receipt = replacing;
                self.note_unscheduled(index, failure.reason());
                0
            }
        }
    }

    /// Total rough remaining capacity of a cell, both tables.
    pub(crate) fn cell_remaining(&self, color: CellColor) -> i64 {
        let cell = &self.cells[&color];
        cell.tables
            .iter()
            .map(|t| self.shift - t.when_available)
            .sum()
    }

    /// Simulates every active cell over the rough plan and assembles the
    /// variant schedule.
    ///
    /// Placements keep the tables the method chose: the pairing,
    /// fixture-adjacency, and capacity decisions were already made per
    /// table during the search, so each table's queue is exactly its
    /// placements in search order. Consecutive placements of one job on
    /// the same table merge into a single run.
    pub(crate) fn finish(
        mut self,
        method: Method,
        variant: Variant,
    ) -> Result<VariantSchedule, ScheduleError> {
        debug!(?method, ?variant, placed = self.placed.len(), "simulating variant");
        let mut cells_out = BTreeMap::new();
        let mut assignments = Vec::new();
        let mut unscheduled: Vec<Unscheduled> = Vec::new();

        for color in CellColor::ALL {
            if !self.inputs.is_active(color) {
                continue;
            }

            let mut queues: [Vec<JobRun>; 2] = [Vec::new(), Vec::new()];
            for p in &self.placed {
                if p.cell != color {
                    continue;
                }
                let queue = &mut queues[p.table_num];
                match queue.last_mut() {
                    Some(last) if last.job_index == p.job_index && last.on_table == p.on_table => {
                        last.panels += p.panels;
                    }
                    _ => queue.push(JobRun {
                        job_index: p.job_index,
                        panels: p.panels,
                        on_table: p.on_table,
                    }),
                }
            }

            for (t, queue) in queues.iter().enumerate() {
                for run in queue {
                    assignments.push(PlacedJob {
                        job_index: run.job_index,
                        cell: color,
                        table_num: t,
                        panels: run.panels,
                        on_table: run.on_table,
                    });
                }
            }

            let schedule = simulate_cell(
                color,
                self.shift,
                self.inputs.summer,
                &queues[0],
                &queues[1],
                self.jobs,
                self.constants,
            )?;

            for entry in &schedule.unscheduled {
                let partial_on_table = self.jobs.iter().any(|u| {
                    u.job.id == entry.job_id && u.job.on_table_today.is_some()
                });
                if partial_on_table {
                    self.warnings.push(ScheduleWarning::for_job(
                        &entry.job_id,
                        "JOB_QUANTITY_REMAINING",
                        "remaining quantity exceeds one shift; accepted with partial completion",
                    ));
                }
            }
            unscheduled.extend(schedule.unscheduled.iter().cloned());
            cells_out.insert(color, schedule);
        }

        for (index, &left) in self.remaining.iter().enumerate() {
            if left > 0 {
                let reason = self
                    .unscheduled_reasons
                    .get(&index)
                    .copied()
                    .unwrap_or(UnscheduledReason::NoCapacity);
                unscheduled.push(Unscheduled {
                    job_id: self.jobs[index].job.id.clone(),
                    panels: left,
                    reason,
                });
            }
        }

        Ok(VariantSchedule {
            method,
            variant,
            schedule_date: self.inputs.schedule_date,
            shift_minutes: self.shift,
            cells: cells_out,
            assignments,
            unscheduled,
            borrows: self.pool.borrow_log().to_vec(),
            warnings: self.warnings,
        })
    }
}

/// Setup-skip key: the fixture id, or a job-scoped key for fixtureless
/// jobs so consecutive panels of one job still skip setup.
pub(crate) fn fixture_key(unit: &JobUnit) -> String {
    unit.derived
        .fixture_id
        .clone()
        .unwrap_or_else(|| format!("JOB:{}", unit.job.id))
}
