//! The four job-selection methods.
//!
//! Each method orders the pending jobs by its own criteria and drives
//! placement through the shared [`PlanState`] search. Critical rules are
//! enforced as hard filters, general rules as ordering, preferences as
//! scoring.

use std::collections::BTreeSet;
use std::cmp::Ordering;

use crate::models::{CellColor, SchedClass, PRIORITY_TODAY};

use super::{fixture_key, PlanState, TablePrefs, Variant};

const CLASS_C: &[SchedClass] = &[SchedClass::C];
const CLASS_B: &[SchedClass] = &[SchedClass::B];
const CLASS_CB: &[SchedClass] = &[SchedClass::C, SchedClass::B];
const RESTRICTED: &[SchedClass] = &[SchedClass::D, SchedClass::E];

// ======================== Method 1: Priority First ========================

/// Strict priority bands: every priority-0 job is attempted before any
/// priority-1 job, and so on. Class pairing stays advisory (scored).
pub(crate) fn priority_first(state: &mut PlanState, variant: Variant) {
    match variant {
        Variant::JobFirst => {
            for priority in 0..=3 {
                let mut band: Vec<usize> = state
                    .pending()
                    .into_iter()
                    .filter(|&i| state.unit(i).derived.priority == priority)
                    .collect();
                band.sort_by(|&a, &b| by_build_date(state, a, b));
                for index in band {
                    place_splitting(state, index, &TablePrefs {
                        allow_split: true,
                        ..TablePrefs::default()
                    });
                }
            }
        }
        Variant::TableFirst => {
            table_first_pass(state, false, |state, _table| {
                let mut order = state.pending();
                order.sort_by(|&a, &b| by_priority_then_build_date(state, a, b));
                order
            });
        }
        Variant::FixtureFirst => {
            let pending = state.pending();
            let mut groups = fixture_groups(state, &pending);
            groups.sort_by(|a, b| {
                group_urgency(state, &a.1)
                    .cmp(&group_urgency(state, &b.1))
                    .then_with(|| group_earliest_req_by(state, &a.1).cmp(&group_earliest_req_by(state, &b.1)))
                    .then_with(|| group_panels(state, &b.1).cmp(&group_panels(state, &a.1)))
            });
            for (key, mut members) in groups {
                members.sort_by(|&a, &b| {
                    let ua = state.unit(a);
                    let ub = state.unit(b);
                    ua.derived
                        .priority
                        .cmp(&ub.derived.priority)
                        .then(ua.job.req_by.cmp(&ub.job.req_by))
                });
                for index in members {
                    place_splitting(state, index, &TablePrefs {
                        allow_split: true,
                        prefer_fixture: Some(&key),
                        ..TablePrefs::default()
                    });
                }
            }
        }
    }
}

// ===================== Method 2: Minimum Forced Idle ======================

/// The pairing prohibitions become hard. Priorities 0 and 1 go first;
/// the rest by heaviest build load. Placement preserves the most
/// remaining table capacity, falling back to splitting when no table
/// fits a job whole.
pub(crate) fn minimum_forced_idle(state: &mut PlanState, variant: Variant) {
    match variant {
        Variant::JobFirst => {
            let pending = state.pending();
            let mut urgent: Vec<usize> = pending
                .iter()
                .copied()
                .filter(|&i| state.unit(i).derived.priority <= PRIORITY_TODAY)
                .collect();
            urgent.sort_by(|&a, &b| by_priority_then_build_date(state, a, b));
            let mut rest: Vec<usize> = pending
                .into_iter()
                .filter(|&i| state.unit(i).derived.priority > PRIORITY_TODAY)
                .collect();
            rest.sort_by(|&a, &b| {
                state
                    .unit(b)
                    .derived
                    .build_load
                    .total_cmp(&state.unit(a).derived.build_load)
            });

            for index in urgent.into_iter().chain(rest) {
                let whole = TablePrefs {
                    hard_pairing: true,
                    preserve_capacity: true,
                    ..TablePrefs::default()
                };
                match state.find_table(index, state.remaining[index], &whole) {
                    Ok(candidate) => {
                        state.place(index, &candidate);
                    }
                    Err(_) => {
                        // No whole fit anywhere: take what capacity is left.
                        place_splitting(state, index, &TablePrefs {
                            hard_pairing: true,
                            preserve_capacity: true,
                            allow_split: true,
                            ..TablePrefs::default()
                        });
                    }
                }
            }
        }
        Variant::TableFirst => {
            loop {
                let mut progressed = false;
                for (color, t) in tables_by_availability(state) {
                    let mut order = state.pending();
                    order.sort_by(|&a, &b| by_priority_then_build_date(state, a, b));
                    for index in order {
                        let prefs = TablePrefs {
                            hard_pairing: true,
                            preserve_capacity: true,
                            restrict_table: Some((color, t)),
                            ..TablePrefs::default()
                        };
                        if let Ok(candidate) =
                            state.find_table(index, state.remaining[index], &prefs)
                        {
                            if state.place(index, &candidate) > 0 {
                                progressed = true;
                                break;
                            }
                        }
                    }
                    if progressed {
                        break; // re-rank tables by availability
                    }
                }
                if !progressed {
                    break;
                }
            }
        }
        Variant::FixtureFirst => {
            let pending = state.pending();
            let mut groups = fixture_groups(state, &pending);
            groups.sort_by(|a, b| {
                group_urgency(state, &a.1)
                    .cmp(&group_urgency(state, &b.1))
                    .then_with(|| group_panels(state, &b.1).cmp(&group_panels(state, &a.1)))
            });
            for (key, mut members) in groups {
                members.sort_by(|&a, &b| by_priority_then_build_date(state, a, b));
                for index in members {
                    place_splitting(state, index, &TablePrefs {
                        hard_pairing: true,
                        allow_split: true,
                        prefer_fixture: Some(&key),
                        ..TablePrefs::default()
                    });
                }
            }
        }
    }
}

// ======================= Method 3: Maximum Output =========================

/// Dedicates cells to class A when A panels outnumber the rest (one cell
/// below a surplus of 16, two at or above), avoids B opposite B, and
/// clusters class E on one table.
pub(crate) fn maximum_output(state: &mut PlanState, variant: Variant) {
    let pending = state.pending();
    let a_jobs: Vec<usize> = pending
        .iter()
        .copied()
        .filter(|&i| state.unit(i).derived.sched_class == SchedClass::A)
        .collect();
    let non_a: Vec<usize> = pending
        .into_iter()
        .filter(|&i| state.unit(i).derived.sched_class != SchedClass::A)
        .collect();

    let a_qty: i64 = a_jobs.iter().map(|&i| state.remaining[i] as i64).sum();
    let non_a_qty: i64 = non_a.iter().map(|&i| state.remaining[i] as i64).sum();
    let surplus = a_qty - non_a_qty;

    // Dedicated cells are those with the most combined remaining capacity.
    let dedicated: BTreeSet<CellColor> = if a_jobs.is_empty() {
        BTreeSet::new()
    } else {
        let count = if surplus >= 16 { 2 } else { 1 };
        let mut by_capacity: Vec<CellColor> = state.order.clone();
        by_capacity.sort_by_key(|&c| -state.cell_remaining(c));
        by_capacity.into_iter().take(count).collect()
    };
    let restrict_a = (!dedicated.is_empty()).then_some(&dedicated);
    let exclude_non_a = (!dedicated.is_empty()).then_some(&dedicated);

    match variant {
        Variant::JobFirst => {
            let mut a_sorted = a_jobs;
            a_sorted.sort_by(|&a, &b| by_priority_then_build_date(state, a, b));
            for index in a_sorted {
                place_splitting(state, index, &TablePrefs {
                    allow_split: true,
                    avoid_bb: true,
                    restrict_cells: restrict_a,
                    ..TablePrefs::default()
                });
            }

            // Cluster class E on one table.
            let mut e_jobs: Vec<usize> = non_a
                .iter()
                .copied()
                .filter(|&i| state.unit(i).derived.sched_class == SchedClass::E)
                .collect();
            e_jobs.sort_by(|&a, &b| by_priority_then_build_date(state, a, b));
            let mut e_table: Option<(CellColor, usize)> = None;
            for index in e_jobs {
                while state.remaining[index] > 0 {
                    let prefs = TablePrefs {
                        allow_split: true,
                        avoid_bb: true,
                        exclude_cells: exclude_non_a,
                        prefer_table: e_table,
                        ..TablePrefs::default()
                    };
                    match state.find_table(index, state.remaining[index], &prefs) {
                        Ok(candidate) => {
                            if state.place(index, &candidate) == 0 {
                                break;
                            }
                            e_table.get_or_insert((candidate.cell, candidate.table_num));
                        }
                        Err(reason) => {
                            state.note_unscheduled(index, reason);
                            break;
                        }
                    }
                }
            }

            let mut others: Vec<usize> = non_a
                .into_iter()
                .filter(|&i| state.unit(i).derived.sched_class != SchedClass::E)
                .collect();
            others.sort_by(|&a, &b| by_priority_then_build_date(state, a, b));
            for index in others {
                place_splitting(state, index, &TablePrefs {
                    allow_split: true,
                    avoid_bb: true,
                    exclude_cells: exclude_non_a,
                    ..TablePrefs::default()
                });
            }
        }
        Variant::TableFirst => {
            table_first_pass(state, true, |state, (color, _t)| {
                let only_a = dedicated.contains(&color);
                let mut order: Vec<usize> = state
                    .pending()
                    .into_iter()
                    .filter(|&i| {
                        !only_a || state.unit(i).derived.sched_class == SchedClass::A
                    })
                    .collect();
                order.sort_by(|&a, &b| by_priority_then_build_date(state, a, b));
                order
            });
        }
        Variant::FixtureFirst => {
            let pending = state.pending();
            let mut groups = fixture_groups(state, &pending);
            groups.sort_by(|a, b| {
                group_urgency(state, &a.1)
                    .cmp(&group_urgency(state, &b.1))
                    .then_with(|| group_panels(state, &b.1).cmp(&group_panels(state, &a.1)))
            });
            for (key, mut members) in groups {
                members.sort_by(|&a, &b| {
                    state.remaining[b]
                        .cmp(&state.remaining[a])
                        .then(state.unit(a).derived.priority.cmp(&state.unit(b).derived.priority))
                });
                for index in members {
                    let is_a = state.unit(index).derived.sched_class == SchedClass::A;
                    place_splitting(state, index, &TablePrefs {
                        allow_split: true,
                        avoid_bb: true,
                        prefer_fixture: Some(&key),
                        restrict_cells: if is_a { restrict_a } else { None },
                        exclude_cells: if is_a { None } else { exclude_non_a },
                        ..TablePrefs::default()
                    });
                }
            }
        }
    }
}

// ===================== Method 4: Most Restricted Mix ======================

/// Drains the restricted classes first: every D/E placement wants class C
/// opposite, falling back to B, then anything. C jobs then pair opposite
/// the restricted tables. Ties break on priority, then heavier build load.
pub(crate) fn most_restricted_mix(state: &mut PlanState, variant: Variant) {
    match variant {
        Variant::JobFirst => {
            schedule_class_bucket(state, RESTRICTED, Some(CLASS_C), Some(CLASS_B));
            schedule_class_bucket(state, CLASS_C, Some(RESTRICTED), Some(CLASS_B));
            schedule_class_bucket(state, CLASS_B, None, None);
            schedule_class_bucket(state, &[SchedClass::A], None, None);
        }
        Variant::TableFirst => {
            table_first_pass(state, false, |state, (color, t)| {
                let opposite = state.cells[&color].tables[1 - t].current_class;
                let preferred: Option<&[SchedClass]> = match opposite {
                    Some(SchedClass::C) => Some(RESTRICTED),
                    Some(c) if c.is_restricted() => Some(CLASS_CB),
                    _ => None,
                };
                let mut order = state.pending();
                order.sort_by(|&a, &b| {
                    let rank = |i: usize| {
                        let class = state.unit(i).derived.sched_class;
                        u8::from(!preferred.is_some_and(|p| p.contains(&class)))
                    };
                    rank(a)
                        .cmp(&rank(b))
                        .then(by_priority_then_build_load(state, a, b))
                });
                order
            });
        }
        Variant::FixtureFirst => {
            schedule_class_bucket_grouped(state, RESTRICTED, Some(CLASS_C));
            schedule_class_bucket_grouped(state, CLASS_C, Some(RESTRICTED));
            schedule_class_bucket_grouped(state, CLASS_B, None);
            schedule_class_bucket_grouped(state, &[SchedClass::A], None);
        }
    }
}

/// Places all pending jobs of the given classes, ordered by priority then
/// heaviest build load, splitting across tables as needed.
fn schedule_class_bucket(
    state: &mut PlanState,
    classes: &[SchedClass],
    prefer_opposite: Option<&[SchedClass]>,
    fallback_opposite: Option<&[SchedClass]>,
) {
    let mut bucket: Vec<usize> = state
        .pending()
        .into_iter()
        .filter(|&i| classes.contains(&state.unit(i).derived.sched_class))
        .collect();
    bucket.sort_by(|&a, &b| by_priority_then_build_load(state, a, b));
    for index in bucket {
        place_splitting(state, index, &TablePrefs {
            allow_split: true,
            prefer_opposite,
            fallback_opposite,
            ..TablePrefs::default()
        });
    }
}

/// Fixture-grouped flavour of [`schedule_class_bucket`].
fn schedule_class_bucket_grouped(
    state: &mut PlanState,
    classes: &[SchedClass],
    prefer_opposite: Option<&[SchedClass]>,
) {
    let bucket: Vec<usize> = state
        .pending()
        .into_iter()
        .filter(|&i| classes.contains(&state.unit(i).derived.sched_class))
        .collect();
    let mut groups = fixture_groups(state, &bucket);
    groups.sort_by(|a, b| group_panels(state, &b.1).cmp(&group_panels(state, &a.1)));
    for (key, mut members) in groups {
        members.sort_by(|&a, &b| by_priority_then_build_load(state, a, b));
        for index in members {
            place_splitting(state, index, &TablePrefs {
                allow_split: true,
                prefer_opposite,
                fallback_opposite: Some(CLASS_B),
                prefer_fixture: Some(&key),
                ..TablePrefs::default()
            });
        }
    }
}

// ============================ Shared helpers ==============================

/// Repeatedly places a job until it is exhausted or nothing admits it,
/// recording the blocking reason on failure.
fn place_splitting(state: &mut PlanState, index: usize, prefs: &TablePrefs) {
    while state.remaining[index] > 0 {
        match state.find_table(index, state.remaining[index], prefs) {
            Ok(candidate) => {
                if state.place(index, &candidate) == 0 {
                    break;
                }
            }
            Err(reason) => {
                state.note_unscheduled(index, reason);
                break;
            }
        }
    }
}

/// Walks tables in weekday order, placing each one's best job per pass
/// until a full pass makes no progress. `job_order` yields the candidate
/// jobs for a table, best first.
fn table_first_pass<'a, F>(state: &mut PlanState<'a>, avoid_bb: bool, job_order: F)
where
    F: Fn(&PlanState<'a>, (CellColor, usize)) -> Vec<usize>,
{
    loop {
        let mut progressed = false;
        for (color, t) in tables_in_weekday_order(state) {
            let order = job_order(state, (color, t));
            for index in order {
                let prefs = TablePrefs {
                    restrict_table: Some((color, t)),
                    avoid_bb,
                    ..TablePrefs::default()
                };
                if let Ok(candidate) = state.find_table(index, state.remaining[index], &prefs) {
                    if state.place(index, &candidate) > 0 {
                        progressed = true;
                        break;
                    }
                }
            }
        }
        if !progressed {
            break;
        }
    }
}

/// Records why still-pending jobs cannot be placed anywhere.
pub(crate) fn record_residual_reasons(state: &mut PlanState) {
    for index in state.pending() {
        let prefs = TablePrefs {
            allow_split: true,
            ..TablePrefs::default()
        };
        if let Err(reason) = state.find_table(index, state.remaining[index], &prefs) {
            state.note_unscheduled(index, reason);
        }
    }
}

fn tables_in_weekday_order(state: &PlanState) -> Vec<(CellColor, usize)> {
    state
        .order
        .iter()
        .flat_map(|&c| [(c, 0), (c, 1)])
        .collect()
}

fn tables_by_availability(state: &PlanState) -> Vec<(CellColor, usize)> {
    let mut tables = tables_in_weekday_order(state);
    tables.sort_by_key(|&(c, t)| state.cells[&c].tables[t].when_available);
    tables
}

fn by_priority_then_build_date(state: &PlanState, a: usize, b: usize) -> Ordering {
    let ua = state.unit(a);
    let ub = state.unit(b);
    ua.derived
        .priority
        .cmp(&ub.derived.priority)
        .then(ua.derived.build_date.cmp(&ub.derived.build_date))
        .then(a.cmp(&b))
}

fn by_build_date(state: &PlanState, a: usize, b: usize) -> Ordering {
    state
        .unit(a)
        .derived
        .build_date
        .cmp(&state.unit(b).derived.build_date)
        .then(a.cmp(&b))
}

fn by_priority_then_build_load(state: &PlanState, a: usize, b: usize) -> Ordering {
    let ua = state.unit(a);
    let ub = state.unit(b);
    ua.derived
        .priority
        .cmp(&ub.derived.priority)
        .then(ub.derived.build_load.total_cmp(&ua.derived.build_load))
        .then(a.cmp(&b))
}

/// Groups job indices by fixture key, preserving encounter order.
fn fixture_groups(state: &PlanState, indices: &[usize]) -> Vec<(String, Vec<usize>)> {
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    for &index in indices {
        let key = fixture_key(state.unit(index));
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(index),
            None => groups.push((key, vec![index])),
        }
    }
    groups
}

/// 0 when the group holds a past-due job, 1 otherwise.
fn group_urgency(state: &PlanState, members: &[usize]) -> u8 {
    u8::from(!members.iter().any(|&i| state.unit(i).derived.priority == 0))
}

fn group_earliest_req_by(state: &PlanState, members: &[usize]) -> chrono::NaiveDate {
    members
        .iter()
        .map(|&i| state.unit(i).job.req_by)
        .min()
        .unwrap_or(chrono::NaiveDate::MAX)
}

fn group_panels(state: &PlanState, members: &[usize]) -> u32 {
    members.iter().map(|&i| state.remaining[i]).sum()
}
