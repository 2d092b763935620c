//! Work cell and table identities.
//!
//! The shop runs six identical cells, each named by a color and holding two
//! production tables that share one operator. Tables are addressed as
//! `COLOR_1` / `COLOR_2`.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// The six cell colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CellColor {
    Red,
    Blue,
    Green,
    Black,
    Purple,
    Orange,
}

impl CellColor {
    /// Every cell color, in declaration order.
    pub const ALL: [CellColor; 6] = [
        CellColor::Red,
        CellColor::Blue,
        CellColor::Green,
        CellColor::Black,
        CellColor::Purple,
        CellColor::Orange,
    ];

    /// Upper-case name as used in identifiers (`RED`, `BLUE`, ...).
    pub fn name(self) -> &'static str {
        match self {
            CellColor::Red => "RED",
            CellColor::Blue => "BLUE",
            CellColor::Green => "GREEN",
            CellColor::Black => "BLACK",
            CellColor::Purple => "PURPLE",
            CellColor::Orange => "ORANGE",
        }
    }

    /// Name of this cell's color-specific mold pool (`RED_MOLD`, ...).
    pub fn mold_name(self) -> String {
        format!("{}_MOLD", self.name())
    }

    /// Parses an upper-case color name.
    pub fn parse(s: &str) -> Option<Self> {
        CellColor::ALL.into_iter().find(|c| c.name() == s)
    }
}

impl std::fmt::Display for CellColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the twelve tables (`RED_1` through `ORANGE_2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableId {
    /// Cell the table belongs to.
    pub cell: CellColor,
    /// Table number within the cell (1 or 2).
    pub num: u8,
}

impl TableId {
    /// Creates a table id. `num` must be 1 or 2.
    pub fn new(cell: CellColor, num: u8) -> Self {
        debug_assert!(num == 1 || num == 2);
        Self { cell, num }
    }

    /// The other table of the same cell.
    pub fn counterpart(self) -> Self {
        Self {
            cell: self.cell,
            num: 3 - self.num,
        }
    }

    /// Parses a `COLOR_N` table name.
    pub fn parse(s: &str) -> Option<Self> {
        let (color, num) = s.rsplit_once('_')?;
        let cell = CellColor::parse(color)?;
        match num {
            "1" => Some(Self::new(cell, 1)),
            "2" => Some(Self::new(cell, 2)),
            _ => None,
        }
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.cell, self.num)
    }
}

/// Cell visiting order for a weekday.
///
/// The rotation advances one position per weekday so no cell is always
/// served first; ORANGE is always last. Weekend dates fall back to the
/// Friday order.
pub fn weekday_cell_order(weekday: Weekday) -> [CellColor; 6] {
    use CellColor::*;
    match weekday {
        Weekday::Mon => [Blue, Green, Red, Black, Purple, Orange],
        Weekday::Tue => [Green, Red, Black, Purple, Blue, Orange],
        Weekday::Wed => [Red, Black, Purple, Blue, Green, Orange],
        Weekday::Thu => [Black, Purple, Blue, Green, Red, Orange],
        Weekday::Fri | Weekday::Sat | Weekday::Sun => [Purple, Blue, Green, Red, Black, Orange],
    }
}
