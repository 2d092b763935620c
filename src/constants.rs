//! Cycle-time tables and shop configuration.
//!
//! Static lookup data for one scheduling run: per-task durations keyed by
//! wire-diameter band and equivalent tier, the mold inventory with its
//! cell-compliance matrix, fixture concurrency limits, the holiday
//! calendar, and shift lengths.
//!
//! # Lookup semantics
//!
//! Equivalent values between tabulated tiers round **up** to the next tier
//! (conservative); a value exactly on a tier boundary does not round. A
//! band/tier pair with no row falls back to the band's `≥ 2` row, and a
//! band with no rows at all is a lookup miss.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::models::{CellColor, MoldDepth, Pattern, SchedClass, ShopCalendar};

/// Shared mold-pool names.
pub const COMMON_MOLD: &str = "COMMON_MOLD";
pub const DEEP_MOLD: &str = "DEEP_MOLD";
pub const DOUBLE2CC_MOLD: &str = "DOUBLE2CC_MOLD";
pub const THREE_IN_URETHANE_MOLD: &str = "3INURETHANE_MOLD";
pub const DEEP_DOUBLE2CC_MOLD: &str = "DEEP_DOUBLE2CC_MOLD";

/// Shift length selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shift {
    /// 440 operator minutes.
    Standard,
    /// 500 operator minutes.
    Overtime,
}

/// Wire-diameter band used by the cycle-time table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireBand {
    /// Diameter ≤ 4. Jobs in this band require a fixture.
    Fine,
    /// 4 < diameter < 8.
    Medium,
    /// Diameter ≥ 8. Jobs in this band use deep molds.
    Heavy,
}

impl WireBand {
    /// Band for a wire diameter.
    pub fn from_diameter(wire_diameter: f64) -> Self {
        if wire_diameter <= 4.0 {
            WireBand::Fine
        } else if wire_diameter < 8.0 {
            WireBand::Medium
        } else {
            WireBand::Heavy
        }
    }
}

/// Tabulated equivalent tiers: 1.0, 1.25, 1.5, 1.75, ≥ 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EquivalentTier {
    E100,
    E125,
    E150,
    E175,
    E200Plus,
}

impl EquivalentTier {
    /// Rounds an equivalent value up to its tier. Exact boundary values
    /// stay on their own tier.
    pub fn from_equivalent(equivalent: f64) -> Self {
        if equivalent <= 1.0 {
            EquivalentTier::E100
        } else if equivalent <= 1.25 {
            EquivalentTier::E125
        } else if equivalent <= 1.5 {
            EquivalentTier::E150
        } else if equivalent <= 1.75 {
            EquivalentTier::E175
        } else {
            EquivalentTier::E200Plus
        }
    }
}

/// One row of the cycle-time table.
///
/// Durations are minutes. `pour_per_mold` is multiplied by the job's mold
/// count; `cure_base` is multiplied by the summer factor when summer mode
/// is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTiming {
    pub band: WireBand,
    pub tier: EquivalentTier,
    pub setup: i64,
    pub layout: i64,
    pub pour_per_mold: f64,
    pub cure_base: i64,
    pub unload: i64,
    /// Divisor in the build-load formula.
    pub sched_constant: u32,
    /// Scheduling class for pairing rules.
    pub sched_class: SchedClass,
    /// Days subtracted ahead of the build-load lead time.
    pub pull_ahead: f64,
}

impl TaskTiming {
    /// Pour duration for a job occupying `molds` molds.
    pub fn pour_minutes(&self, molds: u32) -> i64 {
        (self.pour_per_mold * molds as f64).round() as i64
    }

    /// Cure duration under the given summer setting.
    pub fn cure_minutes(&self, summer: bool, multiplier: f64) -> i64 {
        let factor = if summer { multiplier } else { 1.0 };
        (self.cure_base as f64 * factor).round() as i64
    }
}

/// One mold pool: capacity plus the cells allowed to draw from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoldInfo {
    pub name: String,
    pub depth: MoldDepth,
    pub quantity: u32,
    /// Cell colors whose tables may use this mold.
    pub compliant: BTreeSet<CellColor>,
}

impl MoldInfo {
    /// Creates a mold pool compliant with no cells.
    pub fn new(name: impl Into<String>, depth: MoldDepth, quantity: u32) -> Self {
        Self {
            name: name.into(),
            depth,
            quantity,
            compliant: BTreeSet::new(),
        }
    }

    /// Marks cells as compliant.
    pub fn compliant_with(mut self, cells: impl IntoIterator<Item = CellColor>) -> Self {
        self.compliant.extend(cells);
        self
    }

    /// Marks every cell as compliant.
    pub fn compliant_with_all(self) -> Self {
        self.compliant_with(CellColor::ALL)
    }
}

/// All static configuration for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopConstants {
    pub timings: Vec<TaskTiming>,
    /// Mold pools keyed by name.
    pub molds: BTreeMap<String, MoldInfo>,
    /// Per-pattern fixture capacity overrides.
    pub fixture_limits: BTreeMap<Pattern, u32>,
    pub calendar: ShopCalendar,
    pub standard_shift_minutes: i64,
    pub overtime_shift_minutes: i64,
    /// Cure multiplier applied in summer mode.
    pub summer_cure_multiplier: f64,
    /// Minimum operator minutes that must remain for a pour to begin.
    pub pour_cutoff_minutes: i64,
}

impl Default for ShopConstants {
    fn default() -> Self {
        Self {
            timings: Vec::new(),
            molds: BTreeMap::new(),
            fixture_limits: BTreeMap::new(),
            calendar: ShopCalendar::new(),
            standard_shift_minutes: 440,
            overtime_shift_minutes: 500,
            summer_cure_multiplier: 1.5,
            pour_cutoff_minutes: 40,
        }
    }
}

impl ShopConstants {
    /// Creates empty constants with the standard shift and cutoff values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cycle-time row.
    pub fn with_timing(mut self, timing: TaskTiming) -> Self {
        self.timings.push(timing);
        self
    }

    /// Adds a mold pool.
    pub fn with_mold(mut self, mold: MoldInfo) -> Self {
        self.molds.insert(mold.name.clone(), mold);
        self
    }

    /// Overrides a pattern's fixture capacity.
    pub fn with_fixture_limit(mut self, pattern: Pattern, max_concurrent: u32) -> Self {
        self.fixture_limits.insert(pattern, max_concurrent);
        self
    }

    /// Adds a holiday to the calendar.
    pub fn with_holiday(mut self, date: chrono::NaiveDate) -> Self {
        self.calendar.holidays.insert(date);
        self
    }

    /// Shift length in minutes.
    pub fn shift_minutes(&self, shift: Shift) -> i64 {
        match shift {
            Shift::Standard => self.standard_shift_minutes,
            Shift::Overtime => self.overtime_shift_minutes,
        }
    }

    /// Cycle-time row for a wire diameter / equivalent pair.
    ///
    /// The equivalent rounds up to the next tier; a missing tier falls
    /// back to the band's `≥ 2` row.
    pub fn timing_for(
        &self,
        wire_diameter: f64,
        equivalent: f64,
    ) -> Result<&TaskTiming, ScheduleError> {
        let band = WireBand::from_diameter(wire_diameter);
        let tier = EquivalentTier::from_equivalent(equivalent);

        self.timings
            .iter()
            .find(|t| t.band == band && t.tier == tier)
            .or_else(|| {
                self.timings
                    .iter()
                    .find(|t| t.band == band && t.tier == EquivalentTier::E200Plus)
            })
            .ok_or(ScheduleError::ConstantsLookupMiss {
                wire_diameter,
                equivalent,
            })
    }

    /// Mold pool by name.
    pub fn mold(&self, name: &str) -> Result<&MoldInfo, ScheduleError> {
        self.molds.get(name).ok_or_else(|| ScheduleError::Configuration {
            source_name: "molds".into(),
            issue: format!("mold not found: {name}"),
        })
    }

    /// Concurrent-table capacity for a fixture pattern.
    pub fn fixture_capacity(&self, pattern: Pattern) -> u32 {
        self.fixture_limits
            .get(&pattern)
            .copied()
            .unwrap_or_else(|| pattern.default_capacity())
    }

    /// Whether a cell may run jobs of the given mold depth.
    pub fn is_cell_compliant(&self, cell: CellColor, depth: MoldDepth) -> bool {
        let pool_name = match depth {
            MoldDepth::Deep => DEEP_MOLD.to_string(),
            MoldDepth::Std => cell.mold_name(),
        };
        self.molds
            .get(&pool_name)
            .is_some_and(|m| m.compliant.contains(&cell))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal constants shared by unit tests across the crate.
    pub(crate) fn small_constants() -> ShopConstants {
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

        ShopConstants::new()
            .with_timing(row(Fine, E100, 10, 25, 2.0, 18, 5, 8, SchedClass::A, 0.5))
            .with_timing(row(Medium, E100, 10, 25, 2.0, 18, 5, 8, SchedClass::B, 0.5))
            .with_timing(row(Medium, E125, 12, 30, 2.5, 24, 6, 6, SchedClass::C, 1.0))
            .with_timing(row(Medium, E200Plus, 15, 35, 3.0, 30, 8, 4, SchedClass::E, 1.5))
            .with_mold(
                MoldInfo::new("RED_MOLD", MoldDepth::Std, 6).compliant_with([CellColor::Red]),
            )
            .with_mold(
                MoldInfo::new("BLUE_MOLD", MoldDepth::Std, 6)
                    .compliant_with([CellColor::Blue, CellColor::Red]),
            )
            .with_mold(MoldInfo::new(COMMON_MOLD, MoldDepth::Std, 4).compliant_with_all())
            .with_mold(MoldInfo::new(DEEP_MOLD, MoldDepth::Deep, 6).compliant_with_all())
            .with_mold(MoldInfo::new(DOUBLE2CC_MOLD, MoldDepth::Std, 1).compliant_with_all())
            .with_mold(
                MoldInfo::new(THREE_IN_URETHANE_MOLD, MoldDepth::Std, 1).compliant_with_all(),
            )
            .with_mold(
                MoldInfo::new(DEEP_DOUBLE2CC_MOLD, MoldDepth::Deep, 1).compliant_with_all(),
            )
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(WireBand::from_diameter(4.0), WireBand::Fine);
        assert_eq!(WireBand::from_diameter(4.1), WireBand::Medium);
        assert_eq!(WireBand::from_diameter(7.9), WireBand::Medium);
        assert_eq!(WireBand::from_diameter(8.0), WireBand::Heavy);
    }

    #[test]
    fn test_equivalent_rounds_up_between_tiers() {
        assert_eq!(EquivalentTier::from_equivalent(1.1), EquivalentTier::E125);
        assert_eq!(EquivalentTier::from_equivalent(1.6), EquivalentTier::E175);
        assert_eq!(EquivalentTier::from_equivalent(2.4), EquivalentTier::E200Plus);
    }

    #[test]
    fn test_equivalent_exact_boundary_does_not_round() {
        assert_eq!(EquivalentTier::from_equivalent(1.0), EquivalentTier::E100);
        assert_eq!(EquivalentTier::from_equivalent(1.25), EquivalentTier::E125);
        assert_eq!(EquivalentTier::from_equivalent(1.75), EquivalentTier::E175);
    }

    #[test]
    fn test_timing_lookup_and_fallback() {
        let constants = small_constants();
        let exact = constants.timing_for(6.0, 1.2).unwrap();
        assert_eq!(exact.tier, EquivalentTier::E125);

        // No E150 row for Medium: falls back to the ≥2 row.
        let fallback = constants.timing_for(6.0, 1.4).unwrap();
        assert_eq!(fallback.tier, EquivalentTier::E200Plus);
    }

    #[test]
    fn test_timing_lookup_miss() {
        let constants = small_constants();
        let err = constants.timing_for(9.0, 1.0).unwrap_err();
        assert!(matches!(err, ScheduleError::ConstantsLookupMiss { .. }));
    }

    #[test]
    fn test_pour_scales_with_molds() {
        let constants = small_constants();
        let timing = constants.timing_for(6.0, 1.0).unwrap();
        assert_eq!(timing.pour_minutes(3), 6);
        assert_eq!(timing.pour_minutes(1), 2);
    }

    #[test]
    fn test_summer_cure_factor_is_exact() {
        let constants = small_constants();
        let timing = constants.timing_for(6.0, 1.0).unwrap();
        let normal = timing.cure_minutes(false, constants.summer_cure_multiplier);
        let summer = timing.cure_minutes(true, constants.summer_cure_multiplier);
        assert_eq!(normal, 18);
        assert_eq!(summer, 27);
        assert_eq!(summer as f64, normal as f64 * 1.5);
    }

    #[test]
    fn test_fixture_capacity_defaults_and_override() {
        let constants = small_constants();
        assert_eq!(constants.fixture_capacity(Pattern::V), 2);
        let constants = constants.with_fixture_limit(Pattern::V, 5);
        assert_eq!(constants.fixture_capacity(Pattern::V), 5);
    }

    #[test]
    fn test_cell_compliance() {
        let constants = small_constants();
        assert!(constants.is_cell_compliant(CellColor::Red, MoldDepth::Std));
        // GREEN has no color pool in the small table.
        assert!(!constants.is_cell_compliant(CellColor::Green, MoldDepth::Std));
        assert!(constants.is_cell_compliant(CellColor::Green, MoldDepth::Deep));
    }
}
