//! Job (work order) model.
//!
//! A job produces a fixed quantity of panels of uniform type. The base
//! record comes from the daily production load; the operator may overlay an
//! on-table-today assignment, a remaining quantity, and an expedite flag
//! before scheduling.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::TableId;

/// Fixture pattern letter. Determines the concurrent fixture capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pattern {
    D,
    V,
    S,
}

impl Pattern {
    /// Default concurrent-table capacity when the constants carry no override.
    pub fn default_capacity(self) -> u32 {
        match self {
            Pattern::D => 4,
            Pattern::V => 2,
            Pattern::S => 3,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Pattern::D => 'D',
            Pattern::V => 'V',
            Pattern::S => 'S',
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Mold type required by a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoldType {
    Standard,
    Double2cc,
    ThreeInUrethane,
}

impl MoldType {
    /// Upper-case name as used in the load data.
    pub fn name(self) -> &'static str {
        match self {
            MoldType::Standard => "STANDARD",
            MoldType::Double2cc => "DOUBLE2CC",
            MoldType::ThreeInUrethane => "3INURETHANE",
        }
    }
}

impl std::fmt::Display for MoldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A work order from the daily production load.
///
/// `id` is treated as an opaque string; its `NNNNNN-NN-N` shape is checked
/// during validation but never parsed for meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Required ship date.
    pub req_by: NaiveDate,
    /// Stable job identifier (e.g. `099457-01-1`).
    pub id: String,
    /// Free-text description for reports.
    pub description: String,
    /// Fixture pattern.
    pub pattern: Pattern,
    /// Fixture opening size.
    pub opening_size: f64,
    /// Wire diameter; drives cycle-time band, mold depth, and fixture need.
    pub wire_diameter: f64,
    /// Number of molds a panel of this job occupies.
    pub molds: u32,
    /// Mold type.
    pub mold_type: MoldType,
    /// Total production quantity (panels).
    pub prod_qty: u32,
    /// Difficulty factor for cycle-time and load calculations.
    pub equivalent: f64,
    /// Whether the job may run on the ORANGE cell.
    pub orange_eligible: bool,

    /// Operator overlay: table the job is already set up on.
    pub on_table_today: Option<TableId>,
    /// Operator overlay: panels remaining when on a table.
    pub quantity_remaining: Option<u32>,
    /// Operator overlay: expedite regardless of computed urgency.
    pub expedite: bool,

    /// Source row in the load, for error reporting.
    pub row: usize,
}

impl Job {
    /// Creates a job with the required load fields; overlays default empty.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        req_by: NaiveDate,
        pattern: Pattern,
        opening_size: f64,
        wire_diameter: f64,
        molds: u32,
        mold_type: MoldType,
        prod_qty: u32,
        equivalent: f64,
    ) -> Self {
        Self {
            req_by,
            id: id.into(),
            description: String::new(),
            pattern,
            opening_size,
            wire_diameter,
            molds,
            mold_type,
            prod_qty,
            equivalent,
            orange_eligible: false,
            on_table_today: None,
            quantity_remaining: None,
            expedite: false,
            row: 0,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Marks the job as eligible for the ORANGE cell.
    pub fn with_orange_eligible(mut self, eligible: bool) -> Self {
        self.orange_eligible = eligible;
        self
    }

    /// Records the operator's on-table-today assignment.
    pub fn with_on_table(mut self, table: TableId, remaining: u32) -> Self {
        self.on_table_today = Some(table);
        self.quantity_remaining = Some(remaining);
        self
    }

    /// Sets the expedite flag.
    pub fn with_expedite(mut self, expedite: bool) -> Self {
        self.expedite = expedite;
        self
    }

    /// Sets the source row.
    pub fn with_row(mut self, row: usize) -> Self {
        self.row = row;
        self
    }

    /// Fixture identifier, `PATTERN-OPENING-WIRE`.
    ///
    /// A fixture is only required for fine wire (diameter ≤ 4); heavier
    /// jobs run without one.
    pub fn fixture_id(&self) -> Option<String> {
        if self.wire_diameter <= 4.0 {
            Some(format!(
                "{}-{}-{}",
                self.pattern, self.opening_size, self.wire_diameter
            ))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellColor;

    fn make_job(wire: f64) -> Job {
        Job::new(
            "099457-01-1",
            NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(),
            Pattern::D,
            0.25,
            wire,
            3,
            MoldType::Standard,
            8,
            1.0,
        )
    }

    #[test]
    fn test_fixture_only_for_fine_wire() {
        assert_eq!(make_job(2.0).fixture_id().as_deref(), Some("D-0.25-2"));
        // Exactly 4 still needs the fixture; 5 does not.
        assert!(make_job(4.0).fixture_id().is_some());
        assert!(make_job(5.0).fixture_id().is_none());
    }

    #[test]
    fn test_on_table_overlay() {
        let t = TableId::new(CellColor::Red, 1);
        let job = make_job(2.0).with_on_table(t, 3).with_expedite(true);
        assert_eq!(job.on_table_today, Some(t));
        assert_eq!(job.quantity_remaining, Some(3));
        assert!(job.expedite);
    }

    #[test]
    fn test_pattern_capacities() {
        assert_eq!(Pattern::D.default_capacity(), 4);
        assert_eq!(Pattern::V.default_capacity(), 2);
        assert_eq!(Pattern::S.default_capacity(), 3);
    }

    #[test]
    fn test_mold_type_names() {
        assert_eq!(MoldType::ThreeInUrethane.name(), "3INURETHANE");
        assert_eq!(MoldType::Double2cc.to_string(), "DOUBLE2CC");
    }
}
