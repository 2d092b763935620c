//! Global mold and fixture accounting for one scheduling run.
//!
//! The pool is a self-contained snapshot built from the constants: each
//! method/variant clones its own copy, so variant exploration never shares
//! mutable state. Reservations are transactional per placement (fixture
//! first, then each mold line item, with full unwind on any failure) and
//! are released by receipt when the driver replaces a table's job or rolls
//! a placement back.
//!
//! # Mold decomposition
//!
//! | depth | type | requirement |
//! |-------|------|-------------|
//! | DEEP | STANDARD | N × deep |
//! | DEEP | DOUBLE2CC / 3INURETHANE | (N−1) × deep + 1 × deep-double2cc |
//! | STD | STANDARD | N × color |
//! | STD | 3INURETHANE | (N−1) × color + 1 × 3inurethane |
//! | STD | DOUBLE2CC | (N−2) × color + 1 × double2cc |
//!
//! When the target cell's color pool is short, common molds substitute
//! first, then color molds of inactive compliant cells. On-table-today
//! pre-reservations may overdraw; the surplus is carried as a deficit that
//! blocks further reservations on that resource until a release restores
//! headroom.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{
    ShopConstants, COMMON_MOLD, DEEP_DOUBLE2CC_MOLD, DEEP_MOLD, DOUBLE2CC_MOLD,
    THREE_IN_URETHANE_MOLD,
};
use crate::models::{CellColor, MoldDepth, MoldType, Pattern, TableId, UnscheduledReason};

/// Mold line items a job needs on a given cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoldRequirement {
    /// Pool the bulk of the molds come from (color pool or deep pool).
    pub primary_pool: String,
    pub primary_count: u32,
    /// Specialty singleton, when the mold type demands one.
    pub specialty: Option<(String, u32)>,
}

/// Computes the mold decomposition for (depth, type, cell, count).
pub fn mold_requirement(
    depth: MoldDepth,
    mold_type: MoldType,
    cell: CellColor,
    molds: u32,
) -> MoldRequirement {
    match depth {
        MoldDepth::Deep => match mold_type {
            MoldType::Standard => MoldRequirement {
                primary_pool: DEEP_MOLD.into(),
                primary_count: molds,
                specialty: None,
            },
            MoldType::Double2cc | MoldType::ThreeInUrethane => MoldRequirement {
                primary_pool: DEEP_MOLD.into(),
                primary_count: molds.saturating_sub(1),
                specialty: Some((DEEP_DOUBLE2CC_MOLD.into(), 1)),
            },
        },
        MoldDepth::Std => {
            let color_pool = cell.mold_name();
            match mold_type {
                MoldType::Standard => MoldRequirement {
                    primary_pool: color_pool,
                    primary_count: molds,
                    specialty: None,
                },
                MoldType::ThreeInUrethane => MoldRequirement {
                    primary_pool: color_pool,
                    primary_count: molds.saturating_sub(1),
                    specialty: Some((THREE_IN_URETHANE_MOLD.into(), 1)),
                },
                MoldType::Double2cc => MoldRequirement {
                    primary_pool: color_pool,
                    primary_count: molds.saturating_sub(2),
                    specialty: Some((DOUBLE2CC_MOLD.into(), 1)),
                },
            }
        }
    }
}

/// One draw against a mold pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoldDraw {
    pub pool: String,
    pub count: u32,
    /// Whether the draw substituted for the cell's own pool.
    pub borrowed: bool,
}

/// A substitution recorded for the run's borrowing log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoldBorrow {
    pub cell: CellColor,
    pub job_id: String,
    pub pool: String,
    pub count: u32,
}

/// A table currently holding a fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureHolder {
    pub table: TableId,
    pub job_id: String,
}

/// Why a reservation attempt failed.
#[derive(Debug, Clone, PartialEq)]
pub enum ReserveFailure {
    /// The fixture id is at its pattern's concurrent capacity.
    Fixture { fixture_id: String, capacity: u32 },
    /// A mold pool (after substitution) cannot cover the need.
    Mold {
        pool: String,
        needed: u32,
        available: i64,
    },
}

impl ReserveFailure {
    /// Reason code surfaced for unscheduled jobs.
    pub fn reason(&self) -> UnscheduledReason {
        match self {
            ReserveFailure::Fixture { .. } => UnscheduledReason::NoFixture,
            ReserveFailure::Mold { .. } => UnscheduledReason::NoMold,
        }
    }
}

/// Handle to an active reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt(usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Reservation {
    table: TableId,
    job_id: String,
    fixture: Option<String>,
    draws: Vec<MoldDraw>,
}

/// Mutable resource state for one variant run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePool {
    /// Current availability per pool; negative means a carried deficit.
    available: BTreeMap<String, i64>,
    /// Compliance rows per pool.
    compliance: BTreeMap<String, BTreeSet<CellColor>>,
    /// Concurrent holders per fixture id.
    fixture_holders: BTreeMap<String, Vec<FixtureHolder>>,
    /// Resolved per-pattern fixture capacities.
    fixture_caps: BTreeMap<Pattern, u32>,
    active_cells: BTreeSet<CellColor>,
    reservations: Vec<Option<Reservation>>,
    borrow_log: Vec<MoldBorrow>,
}

impl ResourcePool {
    /// Builds the pool from the constants and the set of active cells.
    pub fn new(constants: &ShopConstants, active_cells: BTreeSet<CellColor>) -> Self {
        let mut available = BTreeMap::new();
        let mut compliance = BTreeMap::new();
        for (name, info) in &constants.molds {
            available.insert(name.clone(), info.quantity as i64);
            compliance.insert(name.clone(), info.compliant.clone());
        }
        let mut fixture_caps = BTreeMap::new();
        for pattern in [Pattern::D, Pattern::V, Pattern::S] {
            fixture_caps.insert(pattern, constants.fixture_capacity(pattern));
        }
        Self {
            available,
            compliance,
            fixture_holders: BTreeMap::new(),
            fixture_caps,
            active_cells,
            reservations: Vec::new(),
            borrow_log: Vec::new(),
        }
    }

    /// Current availability of a pool (negative under deficit).
    pub fn available(&self, pool: &str) -> i64 {
        self.available.get(pool).copied().unwrap_or(0)
    }

    /// Concurrent holders of a fixture id.
    pub fn fixture_in_use(&self, fixture_id: &str) -> u32 {
        self.fixture_holders
            .get(fixture_id)
            .map(|h| h.len() as u32)
            .unwrap_or(0)
    }

    /// Substitutions recorded so far.
    pub fn borrow_log(&self) -> &[MoldBorrow] {
        &self.borrow_log
    }

    /// Checks whether a reservation would succeed, without committing.
    ///
    /// `crediting` virtually releases an existing receipt first, for
    /// scoring a table whose current job would be replaced by this one.
    pub fn can_reserve(
        &self,
        table: TableId,
        job_id: &str,
        fixture: Option<(&str, Pattern)>,
        depth: MoldDepth,
        mold_type: MoldType,
        molds: u32,
        crediting: Option<Receipt>,
    ) -> Result<(), ReserveFailure> {
        let credit = crediting.and_then(|r| self.reservations[r.0].as_ref());
        self.plan(table, job_id, fixture, depth, mold_type, molds, credit)
            .map(|_| ())
    }

    /// Reserves fixture and molds for a job on a table, all-or-nothing.
    ///
    /// `replacing` releases a previous receipt first (the prior job on the
    /// table); it is restored untouched if this reservation fails.
    #[allow(clippy::too_many_arguments)]
    pub fn try_reserve(
        &mut self,
        table: TableId,
        job_id: &str,
        fixture: Option<(&str, Pattern)>,
        depth: MoldDepth,
        mold_type: MoldType,
        molds: u32,
        replacing: Option<Receipt>,
    ) -> Result<Receipt, ReserveFailure> {
        let prev_slot = replacing.map(|r| r.0);
        let prev = prev_slot.and_then(|slot| self.reservations[slot].take());
        if let Some(p) = &prev {
            self.apply_release(p);
        }

        match self.plan(table, job_id, fixture, depth, mold_type, molds, None) {
            Ok(reservation) => {
                self.apply_reserve(&reservation);
                self.log_borrows(&reservation, table.cell);
                self.reservations.push(Some(reservation));
                Ok(Receipt(self.reservations.len() - 1))
            }
            Err(failure) => {
                if let (Some(slot), Some(p)) = (prev_slot, prev) {
                    self.apply_reserve(&p);
                    self.reservations[slot] = Some(p);
                }
                Err(failure)
            }
        }
    }

    /// Pre-reserves resources for an on-table-today job.
    ///
    /// The operator has already committed physically, so the reservation
    /// always succeeds; any shortfall is carried as a deficit and returned
    /// as notes for the run's warning list.
    pub fn pre_reserve(
        &mut self,
        table: TableId,
        job_id: &str,
        fixture: Option<(&str, Pattern)>,
        depth: MoldDepth,
        mold_type: MoldType,
        molds: u32,
    ) -> (Receipt, Vec<String>) {
        let mut notes = Vec::new();
        let requirement = mold_requirement(depth, mold_type, table.cell, molds);
        let mut draws = Vec::new();

        let mut remaining = requirement.primary_count;
        if remaining > 0 {
            let drawn = self.draw_with_substitution(&requirement.primary_pool, table.cell, remaining, &mut draws);
            remaining -= drawn;
        }
        if remaining > 0 {
            // Overdraw the primary pool; availability goes negative.
            draws.push(MoldDraw {
                pool: requirement.primary_pool.clone(),
                count: remaining,
                borrowed: false,
            });
            notes.push(format!(
                "mold pool {} overdrawn by {remaining} for on-table job {job_id}",
                requirement.primary_pool
            ));
            warn!(pool = %requirement.primary_pool, job = %job_id, deficit = remaining,
                "on-table pre-reservation overdrew mold pool");
        }
        if let Some((pool, count)) = &requirement.specialty {
            if self.headroom(pool) < *count as i64 {
                notes.push(format!(
                    "mold pool {pool} overdrawn by on-table job {job_id}"
                ));
                warn!(pool = %pool, job = %job_id, "on-table pre-reservation overdrew specialty mold");
            }
            draws.push(MoldDraw {
                pool: pool.clone(),
                count: *count,
                borrowed: false,
            });
        }

        let fixture_name = fixture.map(|(id, pattern)| {
            let cap = self.fixture_caps[&pattern];
            if self.fixture_in_use(id) >= cap {
                notes.push(format!(
                    "fixture {id} over its concurrent capacity of {cap} (on-table job {job_id})"
                ));
                warn!(fixture = %id, capacity = cap, job = %job_id,
                    "on-table pre-reservation exceeded fixture capacity");
            }
            id.to_string()
        });

        let reservation = Reservation {
            table,
            job_id: job_id.to_string(),
            fixture: fixture_name,
            draws,
        };
        self.apply_reserve(&reservation);
        self.log_borrows(&reservation, table.cell);
        self.reservations.push(Some(reservation));
        (Receipt(self.reservations.len() - 1), notes)
    }

    /// Releases a reservation. Releasing twice is a no-op.
    pub fn release(&mut self, receipt: Receipt) {
        if let Some(reservation) = self.reservations[receipt.0].take() {
            self.apply_release(&reservation);
        }
    }

    /// Availability with deficits clamped out.
    fn headroom(&self, pool: &str) -> i64 {
        self.available(pool).max(0)
    }

    /// Draws up to `needed` molds for `cell`, substituting per policy.
    /// Returns how many were covered; draw records are appended.
    fn draw_with_substitution(
        &self,
        primary_pool: &str,
        cell: CellColor,
        needed: u32,
        draws: &mut Vec<MoldDraw>,
    ) -> u32 {
        let mut remaining = needed as i64;

        // The cell's own pool (or the shared deep pool) first.
        let own = self.headroom(primary_pool).min(remaining);
        if own > 0 {
            draws.push(MoldDraw {
                pool: primary_pool.to_string(),
                count: own as u32,
                borrowed: false,
            });
            remaining -= own;
        }

        // The deep pool has no substitutes.
        if primary_pool == DEEP_MOLD {
            return (needed as i64 - remaining) as u32;
        }

        // Common molds next.
        if remaining > 0 {
            let common = self.headroom(COMMON_MOLD).min(remaining);
            if common > 0 {
                draws.push(MoldDraw {
                    pool: COMMON_MOLD.to_string(),
                    count: common as u32,
                    borrowed: true,
                });
                remaining -= common;
            }
        }

        // Color molds of inactive cells whose compliance row allows us.
        if remaining > 0 {
            for other in CellColor::ALL {
                if remaining == 0 {
                    break;
                }
                if other == cell || other == CellColor::Orange || self.active_cells.contains(&other)
                {
                    continue;
                }
                let pool = other.mold_name();
                let allowed = self
                    .compliance
                    .get(&pool)
                    .is_some_and(|cells| cells.contains(&cell));
                if !allowed {
                    continue;
                }
                let take = self.headroom(&pool).min(remaining);
                if take > 0 {
                    draws.push(MoldDraw {
                        pool,
                        count: take as u32,
                        borrowed: true,
                    });
                    remaining -= take;
                }
            }
        }

        (needed as i64 - remaining) as u32
    }

    #[allow(clippy::too_many_arguments)]
    fn plan(
        &self,
        table: TableId,
        job_id: &str,
        fixture: Option<(&str, Pattern)>,
        depth: MoldDepth,
        mold_type: MoldType,
        molds: u32,
        credit: Option<&Reservation>,
    ) -> Result<Reservation, ReserveFailure> {
        // Apply the credit on a scratch copy of the counters.
        let mut scratch;
        let pool: &Self = if let Some(c) = credit {
            scratch = self.clone();
            scratch.apply_release(c);
            &scratch
        } else {
            self
        };

        let fixture_name = match fixture {
            Some((id, pattern)) => {
                let cap = pool.fixture_caps[&pattern];
                if pool.fixture_in_use(id) >= cap {
                    return Err(ReserveFailure::Fixture {
                        fixture_id: id.to_string(),
                        capacity: cap,
                    });
                }
                Some(id.to_string())
            }
            None => None,
        };

        let requirement = mold_requirement(depth, mold_type, table.cell, molds);
        let mut draws = Vec::new();
        let covered =
            pool.draw_with_substitution(&requirement.primary_pool, table.cell, requirement.primary_count, &mut draws);
        if covered < requirement.primary_count {
            return Err(ReserveFailure::Mold {
                pool: requirement.primary_pool.clone(),
                needed: requirement.primary_count,
                available: pool.headroom(&requirement.primary_pool),
            });
        }
        if let Some((special, count)) = &requirement.specialty {
            if pool.headroom(special) < *count as i64 {
                return Err(ReserveFailure::Mold {
                    pool: special.clone(),
                    needed: *count,
                    available: pool.headroom(special),
                });
            }
            draws.push(MoldDraw {
                pool: special.clone(),
                count: *count,
                borrowed: false,
            });
        }

        Ok(Reservation {
            table,
            job_id: job_id.to_string(),
            fixture: fixture_name,
            draws,
        })
    }

    fn apply_reserve(&mut self, reservation: &Reservation) {
        for draw in &reservation.draws {
            *self.available.entry(draw.pool.clone()).or_insert(0) -= draw.count as i64;
        }
        if let Some(fixture) = &reservation.fixture {
            self.fixture_holders
                .entry(fixture.clone())
                .or_default()
                .push(FixtureHolder {
                    table: reservation.table,
                    job_id: reservation.job_id.clone(),
                });
        }
    }

    fn apply_release(&mut self, reservation: &Reservation) {
        for draw in &reservation.draws {
            *self.available.entry(draw.pool.clone()).or_insert(0) += draw.count as i64;
        }
        if let Some(fixture) = &reservation.fixture {
            if let Some(holders) = self.fixture_holders.get_mut(fixture) {
                if let Some(pos) = holders.iter().position(|h| {
                    h.table == reservation.table && h.job_id == reservation.job_id
                }) {
                    holders.remove(pos);
                }
            }
        }
    }

    fn log_borrows(&mut self, reservation: &Reservation, cell: CellColor) {
        for draw in &reservation.draws {
            if draw.borrowed {
                self.borrow_log.push(MoldBorrow {
                    cell,
                    job_id: reservation.job_id.clone(),
                    pool: draw.pool.clone(),
                    count: draw.count,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::tests::small_constants;

    fn active(cells: &[CellColor]) -> BTreeSet<CellColor> {
        cells.iter().copied().collect()
    }

    fn red_1() -> TableId {
        TableId::new(CellColor::Red, 1)
    }

    #[test]
    fn test_mold_requirement_rows() {
        let r = mold_requirement(MoldDepth::Deep, MoldType::Standard, CellColor::Red, 4);
        assert_eq!(r.primary_pool, DEEP_MOLD);
        assert_eq!(r.primary_count, 4);
        assert!(r.specialty.is_none());

        let r = mold_requirement(MoldDepth::Deep, MoldType::Double2cc, CellColor::Red, 4);
        assert_eq!(r.primary_count, 3);
        assert_eq!(r.specialty, Some((DEEP_DOUBLE2CC_MOLD.into(), 1)));

        let r = mold_requirement(MoldDepth::Std, MoldType::Standard, CellColor::Blue, 3);
        assert_eq!(r.primary_pool, "BLUE_MOLD");
        assert_eq!(r.primary_count, 3);

        let r = mold_requirement(MoldDepth::Std, MoldType::ThreeInUrethane, CellColor::Red, 3);
        assert_eq!(r.primary_count, 2);
        assert_eq!(r.specialty, Some((THREE_IN_URETHANE_MOLD.into(), 1)));

        let r = mold_requirement(MoldDepth::Std, MoldType::Double2cc, CellColor::Red, 4);
        assert_eq!(r.primary_count, 2);
        assert_eq!(r.specialty, Some((DOUBLE2CC_MOLD.into(), 1)));
    }

    #[test]
    fn test_reserve_and_release() {
        let constants = small_constants();
        let mut pool = ResourcePool::new(&constants, active(&[CellColor::Red]));

        let receipt = pool
            .try_reserve(
                red_1(),
                "J1",
                Some(("D-0.25-2", Pattern::D)),
                MoldDepth::Std,
                MoldType::Standard,
                4,
                None,
            )
            .unwrap();
        assert_eq!(pool.available("RED_MOLD"), 2);
        assert_eq!(pool.fixture_in_use("D-0.25-2"), 1);

        pool.release(receipt);
        assert_eq!(pool.available("RED_MOLD"), 6);
        assert_eq!(pool.fixture_in_use("D-0.25-2"), 0);
        // Double release is harmless.
        pool.release(receipt);
        assert_eq!(pool.available("RED_MOLD"), 6);
    }

    #[test]
    fn test_common_molds_substitute_before_failing() {
        let constants = small_constants();
        let mut pool = ResourcePool::new(&constants, active(&[CellColor::Red]));

        // RED pool holds 6; ask for 8 → 6 red + 2 common.
        pool.try_reserve(red_1(), "J1", None, MoldDepth::Std, MoldType::Standard, 8, None)
            .unwrap();
        assert_eq!(pool.available("RED_MOLD"), 0);
        assert_eq!(pool.available(COMMON_MOLD), 2);
        assert_eq!(pool.borrow_log().len(), 1);
        assert_eq!(pool.borrow_log()[0].pool, COMMON_MOLD);
    }

    #[test]
    fn test_inactive_cell_borrowing_requires_compliance() {
        let constants = small_constants();
        // BLUE inactive; its pool is compliant with RED.
        let mut pool = ResourcePool::new(&constants, active(&[CellColor::Red]));

        // Need 12: 6 red + 4 common + 2 blue (borrowed from inactive BLUE).
        pool.try_reserve(red_1(), "J1", None, MoldDepth::Std, MoldType::Standard, 12, None)
            .unwrap();
        assert_eq!(pool.available("BLUE_MOLD"), 4);
        assert!(pool
            .borrow_log()
            .iter()
            .any(|b| b.pool == "BLUE_MOLD" && b.count == 2));
    }

    #[test]
    fn test_no_borrowing_from_active_cells() {
        let constants = small_constants();
        // BLUE active: its molds are its own.
        let mut pool =
            ResourcePool::new(&constants, active(&[CellColor::Red, CellColor::Blue]));

        let err = pool
            .try_reserve(red_1(), "J1", None, MoldDepth::Std, MoldType::Standard, 12, None)
            .unwrap_err();
        assert!(matches!(err, ReserveFailure::Mold { .. }));
        // All-or-nothing: nothing was taken.
        assert_eq!(pool.available("RED_MOLD"), 6);
        assert_eq!(pool.available(COMMON_MOLD), 4);
    }

    #[test]
    fn test_fixture_capacity_enforced_per_fixture_id() {
        let constants = small_constants();
        let mut pool = ResourcePool::new(&constants, active(&[CellColor::Red, CellColor::Blue]));

        let fixture = Some(("V-0.25-2", Pattern::V)); // capacity 2
        pool.try_reserve(red_1(), "J1", fixture, MoldDepth::Std, MoldType::Standard, 1, None)
            .unwrap();
        pool.try_reserve(
            TableId::new(CellColor::Blue, 1),
            "J2",
            fixture,
            MoldDepth::Std,
            MoldType::Standard,
            1,
            None,
        )
        .unwrap();
        let err = pool
            .try_reserve(
                TableId::new(CellColor::Blue, 2),
                "J3",
                fixture,
                MoldDepth::Std,
                MoldType::Standard,
                1,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, ReserveFailure::Fixture { capacity: 2, .. }));
    }

    #[test]
    fn test_replacing_receipt_frees_its_resources_first() {
        let constants = small_constants();
        let mut pool = ResourcePool::new(&constants, active(&[CellColor::Red]));

        let fixture = Some(("V-0.25-2", Pattern::V));
        let first = pool
            .try_reserve(red_1(), "J1", fixture, MoldDepth::Std, MoldType::Standard, 6, None)
            .unwrap();
        // Same table moves on to the next job using the same fixture and
        // the freed molds.
        pool.try_reserve(
            red_1(),
            "J2",
            fixture,
            MoldDepth::Std,
            MoldType::Standard,
            6,
            Some(first),
        )
        .unwrap();
        assert_eq!(pool.available("RED_MOLD"), 0);
        assert_eq!(pool.fixture_in_use("V-0.25-2"), 1);
    }

    #[test]
    fn test_failed_replace_restores_previous_reservation() {
        let constants = small_constants();
        let mut pool = ResourcePool::new(&constants, active(&[CellColor::Red, CellColor::Blue]));

        let first = pool
            .try_reserve(red_1(), "J1", None, MoldDepth::Std, MoldType::Standard, 6, None)
            .unwrap();
        // 20 cannot be covered even with the credit: failure must restore J1.
        let err = pool
            .try_reserve(red_1(), "J2", None, MoldDepth::Std, MoldType::Standard, 20, Some(first))
            .unwrap_err();
        assert!(matches!(err, ReserveFailure::Mold { .. }));
        assert_eq!(pool.available("RED_MOLD"), 0); // J1 still holds its 6
    }

    #[test]
    fn test_pre_reserve_carries_deficit_and_blocks_next_setup() {
        let constants = small_constants();
        let mut pool = ResourcePool::new(&constants, active(&[CellColor::Red]));

        // On-table job needs 18; 6 red + 4 common + 6 borrowed blue still
        // leave a deficit of 2 on the red pool.
        let (receipt, notes) =
            pool.pre_reserve(red_1(), "J0", None, MoldDepth::Std, MoldType::Standard, 18);
        assert!(!notes.is_empty());
        assert_eq!(pool.available("RED_MOLD"), -2);

        // The deficit blocks the next reservation on that pool.
        let err = pool
            .try_reserve(
                TableId::new(CellColor::Red, 2),
                "J1",
                None,
                MoldDepth::Std,
                MoldType::Standard,
                1,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, ReserveFailure::Mold { .. }));

        // A release restores headroom.
        pool.release(receipt);
        assert_eq!(pool.available("RED_MOLD"), 6);
    }

    #[test]
    fn test_can_reserve_is_pure() {
        let constants = small_constants();
        let pool = ResourcePool::new(&constants, active(&[CellColor::Red]));
        pool.can_reserve(red_1(), "J1", None, MoldDepth::Std, MoldType::Standard, 4, None)
            .unwrap();
        assert_eq!(pool.available("RED_MOLD"), 6);
    }
}
