//! Schedule evaluation and method comparison.
//!
//! Summarises each simulated candidate (panels by class, per-priority
//! coverage, idle minutes, operator utilization) and selects the
//! recommended schedule.
//!
//! # Selection rule
//!
//! Per method, the variant with the fewest missed dates among priorities
//! 1–3 (eligible jobs left partly or wholly unplaced) wins; ties break on
//! total scheduled panels, descending. The same rule picks the overall
//! recommendation among the per-method winners. Every summary is always
//! returned.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::driver::{Method, VariantSchedule};
use crate::models::{CellColor, JobUnit, SchedClass};

/// Coverage counters for one priority level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityMetrics {
    /// Jobs with at least one scheduled panel.
    pub scheduled: u32,
    /// Jobs left entirely unplaced.
    pub not_scheduled: u32,
    /// Final-plan panels produced.
    pub panels: u32,
}

/// Final-plan panels by scheduling class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassPanels {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
    pub e: u32,
}

impl ClassPanels {
    pub fn total(&self) -> u32 {
        self.a + self.b + self.c + self.d + self.e
    }

    fn add(&mut self, class: SchedClass, panels: u32) {
        match class {
            SchedClass::A => self.a += panels,
            SchedClass::B => self.b += panels,
            SchedClass::C => self.c += panels,
            SchedClass::D => self.d += panels,
            SchedClass::E => self.e += panels,
        }
    }
}

/// Overall feasibility classification of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleStatus {
    /// Every requested panel was scheduled.
    Optimal,
    /// Some panels scheduled, some not.
    Partial,
    /// Nothing could be scheduled.
    Infeasible,
}

/// Summary of one method/variant candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantEvaluation {
    pub method: Method,
    pub variant: crate::driver::Variant,
    pub status: ScheduleStatus,
    /// Indexed by priority 0–3.
    pub priority: [PriorityMetrics; 4],
    pub class_panels: ClassPanels,
    pub cell_panels: BTreeMap<CellColor, u32>,
    pub forced_table_idle: i64,
    pub forced_operator_idle: i64,
    /// Operator working minutes over shift minutes across active cells.
    pub utilization_pct: f64,
    pub total_panels: u32,
    pub jobs_scheduled: u32,
    pub jobs_unscheduled: u32,
    /// Priority 1–3 jobs with panels left unplaced; the selection metric.
    pub missed_dates: u32,
}

/// Evaluates a simulated candidate against the job list.
pub fn evaluate(schedule: &VariantSchedule, jobs: &[JobUnit]) -> VariantEvaluation {
    let mut panels_by_job: BTreeMap<&str, u32> = BTreeMap::new();
    for cell in schedule.cells.values() {
        for panel in cell.all_panels() {
            *panels_by_job.entry(panel.job_id.as_str()).or_insert(0) += 1;
        }
    }
    let mut unplaced_by_job: BTreeMap<&str, u32> = BTreeMap::new();
    for entry in &schedule.unscheduled {
        *unplaced_by_job.entry(entry.job_id.as_str()).or_insert(0) += entry.panels;
    }

    let mut priority = [PriorityMetrics::default(); 4];
    let mut class_panels = ClassPanels::default();
    let mut jobs_scheduled = 0;
    let mut jobs_unscheduled = 0;
    let mut missed_dates = 0;

    for unit in jobs {
        let placed = panels_by_job.get(unit.job.id.as_str()).copied().unwrap_or(0);
        let unplaced = unplaced_by_job
            .get(unit.job.id.as_str())
            .copied()
            .unwrap_or(0);
        let slot = &mut priority[unit.derived.priority as usize];
        if placed > 0 {
            slot.scheduled += 1;
            slot.panels += placed;
            jobs_scheduled += 1;
            class_panels.add(unit.derived.sched_class, placed);
        } else {
            slot.not_scheduled += 1;
            jobs_unscheduled += 1;
        }
        if (1..=3).contains(&unit.derived.priority) && unplaced > 0 {
            missed_dates += 1;
        }
    }

    let mut cell_panels = BTreeMap::new();
    let mut forced_table_idle = 0;
    let mut forced_operator_idle = 0;
    let mut operator_minutes = 0;
    for (color, cell) in &schedule.cells {
        cell_panels.insert(*color, cell.total_panels() as u32);
        forced_table_idle += cell.forced_table_idle();
        forced_operator_idle += cell.forced_operator_idle;
        operator_minutes += cell.operator_minutes;
    }

    let staffed_minutes = schedule.shift_minutes * schedule.cells.len() as i64;
    let utilization_pct = if staffed_minutes > 0 {
        operator_minutes as f64 / staffed_minutes as f64 * 100.0
    } else {
        0.0
    };

    let total_panels = class_panels.total();
    let status = if total_panels == 0 && !jobs.is_empty() {
        ScheduleStatus::Infeasible
    } else if schedule.unscheduled.is_empty() {
        ScheduleStatus::Optimal
    } else {
        ScheduleStatus::Partial
    };

    VariantEvaluation {
        method: schedule.method,
        variant: schedule.variant,
        status,
        priority,
        class_panels,
        cell_panels,
        forced_table_idle,
        forced_operator_idle,
        utilization_pct,
        total_panels,
        jobs_scheduled,
        jobs_unscheduled,
        missed_dates,
    }
}

/// Index of the best evaluation: fewest missed dates, ties by panels
/// descending, remaining ties keep the earlier candidate.
pub fn best_index(evaluations: &[VariantEvaluation]) -> Option<usize> {
    best_among(evaluations, 0..evaluations.len())
}

/// Best candidate per method, by the same rule.
pub fn best_per_method(evaluations: &[VariantEvaluation]) -> BTreeMap<Method, usize> {
    let mut best = BTreeMap::new();
    for method in Method::ALL {
        let indices: Vec<usize> = (0..evaluations.len())
            .filter(|&i| evaluations[i].method == method)
            .collect();
        if let Some(winner) = best_among(evaluations, indices) {
            best.insert(method, winner);
        }
    }
    best
}

/// Overall recommendation: the same rule applied across the per-method
/// winners.
pub fn recommend(evaluations: &[VariantEvaluation]) -> Option<usize> {
    let winners: Vec<usize> = best_per_method(evaluations).into_values().collect();
    best_among(evaluations, winners)
}

fn best_among(
    evaluations: &[VariantEvaluation],
    indices: impl IntoIterator<Item = usize>,
) -> Option<usize> {
    indices.into_iter().reduce(|best, candidate| {
        let b = &evaluations[best];
        let c = &evaluations[candidate];
        if (c.missed_dates, std::cmp::Reverse(c.total_panels))
            < (b.missed_dates, std::cmp::Reverse(b.total_panels))
        {
            candidate
        } else {
            best
        }
    })
}
