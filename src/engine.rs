//! Engine entry point: validate → derive → search → compare.
//!
//! Consumes the validated job list, the shop constants, and the operator
//! run inputs; runs every enabled method/variant combination against its
//! own resource-pool snapshot; and returns all summaries plus the
//! recommendation. The engine is deterministic: identical inputs yield
//! identical output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::ShopConstants;
use crate::driver::{run_variant, Method, VariantSchedule};
use crate::error::{ScheduleError, ScheduleWarning};
use crate::models::{derive_all, CellColor, Job, JobUnit};
use crate::scheduler::{best_per_method, evaluate, recommend, ScheduleStatus, VariantEvaluation};
use crate::validation::{validate_run, RunInputs};

/// One simulated candidate with its summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodOutcome {
    pub schedule: VariantSchedule,
    pub evaluation: VariantEvaluation,
}

/// Output of a full engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRun {
    /// Every method/variant candidate, in method-major order.
    pub outcomes: Vec<MethodOutcome>,
    /// Winning outcome index per method.
    pub best_per_method: BTreeMap<Method, usize>,
    /// Index of the recommended outcome.
    pub recommended: Option<usize>,
    /// Validation warnings plus the recommended candidate's warnings.
    pub warnings: Vec<ScheduleWarning>,
}

impl EngineRun {
    /// The recommended candidate, when one exists.
    pub fn recommended_outcome(&self) -> Option<&MethodOutcome> {
        self.recommended.map(|i| &self.outcomes[i])
    }
}

/// Produces the day's schedule candidates and recommendation.
pub fn run_schedule(
    jobs: &[Job],
    constants: &ShopConstants,
    inputs: &RunInputs,
) -> Result<EngineRun, ScheduleError> {
    let report = validate_run(jobs, constants, inputs);
    let mut warnings = report.warnings;
    if let Some(error) = report.errors.into_iter().next() {
        return Err(error);
    }

    let units = derive_all(jobs, constants, inputs.schedule_date)?;

    // An on-table job on an inactive cell must have somewhere to go.
    for unit in &units {
        if let Some(table) = unit.job.on_table_today {
            if !inputs.is_active(table.cell) && !rehome_target_exists(unit, constants, inputs) {
                return Err(ScheduleError::InfeasibleOnTableToday {
                    job_id: unit.job.id.clone(),
                    table: table.to_string(),
                    class: unit.derived.sched_class,
                });
            }
        }
    }

    let mut outcomes = Vec::new();
    for method in Method::ALL {
        for variant in inputs.variants.iter() {
            debug!(method = method.name(), variant = variant.name(), "running candidate");
            let schedule = run_variant(method, variant, &units, constants, inputs)?;
            let evaluation = evaluate(&schedule, &units);
            outcomes.push(MethodOutcome {
                schedule,
                evaluation,
            });
        }
    }
    if outcomes.is_empty() {
        return Err(ScheduleError::NoFeasibleSchedule(
            "no variants enabled".into(),
        ));
    }
    if !units.is_empty()
        && outcomes
            .iter()
            .all(|o| o.evaluation.status == ScheduleStatus::Infeasible)
    {
        return Err(ScheduleError::NoFeasibleSchedule(
            "no method/variant scheduled any panel".into(),
        ));
    }

    let evaluations: Vec<VariantEvaluation> =
        outcomes.iter().map(|o| o.evaluation.clone()).collect();
    let best = best_per_method(&evaluations);
    let recommended = recommend(&evaluations);
    if let Some(index) = recommended {
        warnings.extend(outcomes[index].schedule.warnings.iter().cloned());
    }

    Ok(EngineRun {
        outcomes,
        best_per_method: best,
        recommended,
        warnings,
    })
}

/// Whether any active cell can host a displaced on-table job.
fn rehome_target_exists(unit: &JobUnit, constants: &ShopConstants, inputs: &RunInputs) -> bool {
    inputs.active_cells.iter().any(|&cell| {
        if cell == CellColor::Orange
            && (!inputs.orange_enabled
                || !unit.job.orange_eligible
                || !inputs.allows_on_orange(unit.derived.mold_depth, unit.job.mold_type))
        {
            return false;
        }
        constants.is_cell_compliant(cell, unit.derived.mold_depth)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        EquivalentTier, MoldInfo, ShopConstants, TaskTiming, WireBand, COMMON_MOLD,
        DEEP_DOUBLE2CC_MOLD, DEEP_MOLD, DOUBLE2CC_MOLD, THREE_IN_URETHANE_MOLD,
    };
    use crate::driver::Variant;
    use crate::models::{MoldDepth, MoldType, Pattern, SchedClass, TableId, UnscheduledReason};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Wednesday: the weekday rotation serves RED first.
    fn wednesday() -> NaiveDate {
        d(2025, 6, 18)
    }

    fn shop_constants() -> ShopConstants {
        let row = |band, tier, setup, layout, pour, cure, unload, konst, class, pull| TaskTiming {
            band,
            tier,
            setup,
            layout,
            pour_per_mold: pour,
            cure_base: cure,
            unload,
            sched_constant: konst,
            sched_class: class,
            pull_ahead: pull,
        };
        use EquivalentTier::*;
        use WireBand::*;

        let mut constants = ShopConstants::new()
            .with_timing(row(Fine, E100, 10, 25, 2.0, 18, 5, 8, SchedClass::A, 0.5))
            .with_timing(row(Medium, E100, 10, 25, 2.0, 18, 5, 8, SchedClass::B, 0.5))
            .with_timing(row(Medium, E200Plus, 15, 35, 3.0, 30, 8, 4, SchedClass::E, 1.5))
            .with_timing(row(Heavy, E100, 12, 30, 2.5, 40, 6, 6, SchedClass::C, 1.0))
            .with_mold(MoldInfo::new(COMMON_MOLD, MoldDepth::Std, 4).compliant_with_all())
            .with_mold(MoldInfo::new(DEEP_MOLD, MoldDepth::Deep, 8).compliant_with_all())
            .with_mold(MoldInfo::new(DOUBLE2CC_MOLD, MoldDepth::Std, 1).compliant_with_all())
            .with_mold(
                MoldInfo::new(THREE_IN_URETHANE_MOLD, MoldDepth::Std, 1).compliant_with_all(),
            )
            .with_mold(
                MoldInfo::new(DEEP_DOUBLE2CC_MOLD, MoldDepth::Deep, 1).compliant_with_all(),
            );
        for color in CellColor::ALL {
            constants = constants
                .with_mold(MoldInfo::new(color.mold_name(), MoldDepth::Std, 12).compliant_with([color]));
        }
        constants
    }

    fn all_but_orange(date: NaiveDate) -> RunInputs {
        RunInputs::new(date).with_cells([
            CellColor::Red,
            CellColor::Blue,
            CellColor::Green,
            CellColor::Black,
            CellColor::Purple,
        ])
    }

    fn make_job(id: &str, qty: u32, molds: u32) -> Job {
        Job::new(
            id,
            d(2025, 7, 11),
            Pattern::D,
            0.25,
            6.0,
            molds,
            MoldType::Standard,
            qty,
            1.0,
        )
    }

    #[test]
    fn test_scenario_single_job_single_cell() {
        let constants = shop_constants();
        let inputs = all_but_orange(wednesday());
        let jobs = vec![make_job("100001-01-1", 2, 3)];

        let run = run_schedule(&jobs, &constants, &inputs).unwrap();
        let outcome = run.recommended_outcome().expect("recommendation");

        // RED is first in Wednesday's rotation: both panels land on RED_1.
        let red = &outcome.schedule.cells[&CellColor::Red];
        assert_eq!(red.tables[0].panel_count(), 2);
        assert_eq!(red.tables[1].panel_count(), 0);
        assert_eq!(outcome.evaluation.total_panels, 2);
        // Nothing on the other table: the operator waits out both cures.
        assert_eq!(red.forced_operator_idle, 36);
        assert!(red.tables[0].panels.iter().all(|p| p.end() <= 440));
    }

    #[test]
    fn test_scenario_fixture_concurrency() {
        let constants = shop_constants();
        let inputs = RunInputs::new(wednesday()).with_cells([
            CellColor::Red,
            CellColor::Blue,
            CellColor::Green,
        ]);
        // Five jobs sharing fixture V-0.25-2 (pattern V capacity 2); the
        // first is past due, the rest are future work.
        let mut jobs = Vec::new();
        for (i, req_by) in [
            wednesday(),
            d(2025, 7, 11),
            d(2025, 7, 11),
            d(2025, 7, 11),
            d(2025, 7, 11),
        ]
        .into_iter()
        .enumerate()
        {
            jobs.push(Job::new(
                format!("10000{}-01-1", i + 1),
                req_by,
                Pattern::V,
                0.25,
                2.0,
                1,
                MoldType::Standard,
                1,
                1.0,
            ));
        }

        let run = run_schedule(&jobs, &constants, &inputs).unwrap();
        let outcome = run.recommended_outcome().expect("recommendation");

        // The past-due job is never displaced by priority-3 competition.
        assert!(outcome
            .schedule
            .cells
            .values()
            .flat_map(|c| c.all_panels())
            .any(|p| p.job_id == "100001-01-1"));

        // At any instant at most two tables hold the fixture: collect the
        // per-table hold windows (first setup to last unload per job run).
        let mut holds: Vec<(i64, i64)> = Vec::new();
        for cell in outcome.schedule.cells.values() {
            for table in &cell.tables {
                let mut by_job: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
                for p in &table.panels {
                    let entry = by_job.entry(p.job_id.as_str()).or_insert((p.start(), p.end()));
                    entry.0 = entry.0.min(p.start());
                    entry.1 = entry.1.max(p.end());
                }
                holds.extend(by_job.into_values());
            }
        }
        for minute in 0..440 {
            let concurrent = holds
                .iter()
                .filter(|(start, end)| *start <= minute && minute < *end)
                .count();
            assert!(concurrent <= 2, "minute {minute}: {concurrent} holders");
        }
    }

    #[test]
    fn test_scenario_mold_exhaustion_with_substitution() {
        let constants = shop_constants();
        let inputs = all_but_orange(wednesday());
        // 14 molds: the RED pool (12) plus two common molds. 20 molds fit
        // nowhere (12 + 4 common = 16 at best).
        let jobs = vec![make_job("100001-01-1", 1, 14), make_job("100002-01-1", 1, 20)];

        let run = run_schedule(&jobs, &constants, &inputs).unwrap();
        let outcome = run.recommended_outcome().expect("recommendation");

        // Common molds supplemented the first job.
        assert!(outcome.schedule.borrows.iter().any(|b| b.pool == COMMON_MOLD));
        // With every cell active there is no inactive-cell borrowing.
        assert!(outcome
            .schedule
            .borrows
            .iter()
            .all(|b| b.pool == COMMON_MOLD));
        // The oversized job reports a mold failure.
        assert!(outcome
            .schedule
            .unscheduled
            .iter()
            .any(|u| u.job_id == "100002-01-1" && u.reason == UnscheduledReason::NoMold));
    }

    #[test]
    fn test_scenario_on_table_continuation() {
        let constants = shop_constants();
        let inputs = all_but_orange(wednesday());
        let jobs =
            vec![make_job("100001-01-1", 8, 3).with_on_table(TableId::new(CellColor::Red, 1), 3)];

        let run = run_schedule(&jobs, &constants, &inputs).unwrap();
        let outcome = run.recommended_outcome().expect("recommendation");
        let red = &outcome.schedule.cells[&CellColor::Red];

        // The pre-loaded table opens with its pour; only the remaining
        // quantity is scheduled.
        let first = &red.tables[0].panels[0];
        assert_eq!(first.setup.duration(), 0);
        assert_eq!(first.layout.duration(), 0);
        assert_eq!(first.pour.start, 0);
        let total: usize = red.total_panels();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_all_twelve_combinations_reported() {
        let constants = shop_constants();
        let inputs = all_but_orange(wednesday());
        let jobs = vec![make_job("100001-01-1", 2, 3)];

        let run = run_schedule(&jobs, &constants, &inputs).unwrap();
        assert_eq!(run.outcomes.len(), 12);
        assert_eq!(run.best_per_method.len(), 4);
        assert!(run.recommended.is_some());
    }

    #[test]
    fn test_variant_selection_flag() {
        let constants = shop_constants();
        let inputs = all_but_orange(wednesday()).with_variants(crate::driver::VariantSet::only(
            &[Variant::JobFirst],
        ));
        let jobs = vec![make_job("100001-01-1", 2, 3)];

        let run = run_schedule(&jobs, &constants, &inputs).unwrap();
        assert_eq!(run.outcomes.len(), 4);
    }

    #[test]
    fn test_determinism_across_runs() {
        let constants = shop_constants();
        let inputs = all_but_orange(wednesday());
        let jobs = vec![
            make_job("100001-01-1", 4, 3),
            make_job("100002-01-1", 3, 2),
            make_job("100003-01-1", 5, 4),
        ];

        let first = run_schedule(&jobs, &constants, &inputs).unwrap();
        let second = run_schedule(&jobs, &constants, &inputs).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_validation_failure_is_fail_fast() {
        let constants = shop_constants();
        let inputs = all_but_orange(wednesday());
        let mut job = make_job("100001-01-1", 2, 3);
        job.prod_qty = 0;

        let err = run_schedule(&[job], &constants, &inputs).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidInputField { .. }));
    }

    #[test]
    fn test_infeasible_on_table_today() {
        // A deep-mold job stranded on an inactive cell, with a deep pool
        // that only the inactive cell may use.
        let mut constants = shop_constants();
        constants = constants.with_mold(
            MoldInfo::new(DEEP_MOLD, MoldDepth::Deep, 8).compliant_with([CellColor::Blue]),
        );
        let inputs = RunInputs::new(wednesday()).with_cell(CellColor::Red);
        let mut job = make_job("100001-01-1", 4, 3);
        job.wire_diameter = 9.0;
        let job = job.with_on_table(TableId::new(CellColor::Blue, 1), 4);

        let err = run_schedule(&[job], &constants, &inputs).unwrap_err();
        assert!(matches!(err, ScheduleError::InfeasibleOnTableToday { .. }));
    }

    #[test]
    fn test_rehome_lands_on_active_cell() {
        let constants = shop_constants();
        let inputs = RunInputs::new(wednesday()).with_cell(CellColor::Red);
        let job = make_job("100001-01-1", 4, 3).with_on_table(TableId::new(CellColor::Blue, 1), 4);

        let run = run_schedule(&[job], &constants, &inputs).unwrap();
        let outcome = run.recommended_outcome().expect("recommendation");
        assert!(outcome.schedule.cells[&CellColor::Red].total_panels() > 0);
        assert!(run
            .warnings
            .iter()
            .any(|w| w.message.contains("re-home") || w.context == "re-home"));
    }

    #[test]
    fn test_empty_variant_set_rejected() {
        let constants = shop_constants();
        let inputs =
            all_but_orange(wednesday()).with_variants(crate::driver::VariantSet::only(&[]));
        let err = run_schedule(&[make_job("100001-01-1", 2, 3)], &constants, &inputs).unwrap_err();
        assert!(matches!(err, ScheduleError::NoFeasibleSchedule(_)));
    }
}
