//! Build-time clock stamping for Sensor Watch firmware.
//!
//! The movement firmware boots with a hard-coded default clock. Before each
//! build the helper rewrites those defaults so a freshly flashed watch starts
//! at (roughly) the right time.
//!
//! The rewrite is plain text substitution: any line that contains a marker
//! token such as `date_time.unit.hour` is replaced by a canonical assignment
//! carrying the current value.
//!
//! ```text
//!         date_time.unit.year = 23;      →        date_time.unit.year = 4;
//!         date_time.unit.month = 1;      →        date_time.unit.month = 3;
//! // comment                             →  // comment
//! ```
//!
//! # Layers
//!
//! - [`Field`] / [`Timestamp`] - the five stamped units and their values
//! - [`rewrite_line`] / [`inject_str`] - pure, clock-free transforms
//! - [`inject_file`] - read-all, transform, write-all on a path

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::print_stdout)] // prefer tracing over println! in lib code
#![allow(clippy::module_name_repetitions)]
// ────────────────────────────────────────────────────────────────────────────

pub mod error;
pub mod field;
pub mod inject;
pub mod timestamp;

pub use error::StampError;
pub use field::Field;
pub use inject::{inject_file, inject_str, preview_file, rewrite_line, InjectReport, Rewrite};
pub use timestamp::Timestamp;
