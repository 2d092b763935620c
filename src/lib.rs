//! Daily production scheduling for a thermoforming shop.
//!
//! Produces a single-day schedule for six two-table work cells, each with
//! one operator. The engine consumes a validated job list, the shop's
//! cycle-time constants, and the operator's run inputs; it returns the
//! schedule candidates of four selection methods under up to three
//! table-selection variants, plus a recommendation.
//!
//! # Modules
//!
//! - **`models`**: domain types — cells, tables, jobs, panels, derived
//!   scheduling fields, the shop calendar
//! - **`constants`**: cycle-time tables, mold inventory, fixture limits
//! - **`resources`**: global mold/fixture pool with borrowing rules
//! - **`validation`**: input integrity checks and operator run inputs
//! - **`scheduler`**: the two-table/one-operator cell simulator and the
//!   candidate evaluation/comparison
//! - **`driver`**: the method/variant search over job-to-cell allocations
//! - **`engine`**: the top-level run
//!
//! # Example
//!
//! ```no_run
//! use cell_schedule::models::{CellColor, Job};
//! use cell_schedule::constants::ShopConstants;
//! use cell_schedule::validation::RunInputs;
//! use cell_schedule::run_schedule;
//! use chrono::NaiveDate;
//!
//! let constants = ShopConstants::new(); // populated from configuration
//! let jobs: Vec<Job> = Vec::new();      // the daily production load
//! let inputs = RunInputs::new(NaiveDate::from_ymd_opt(2025, 6, 18).unwrap())
//!     .with_cell(CellColor::Red)
//!     .with_cell(CellColor::Blue);
//!
//! let run = run_schedule(&jobs, &constants, &inputs)?;
//! if let Some(outcome) = run.recommended_outcome() {
//!     println!("{} panels", outcome.evaluation.total_panels);
//! }
//! # Ok::<(), cell_schedule::ScheduleError>(())
//! ```

pub mod constants;
pub mod driver;
pub mod engine;
pub mod error;
pub mod models;
pub mod resources;
pub mod scheduler;
pub mod validation;

pub use engine::{run_schedule, EngineRun, MethodOutcome};
pub use error::{ScheduleError, ScheduleWarning};
