//! Ingestion collaborators and console presentation for drug-intake-core.
//!
//! - [`sample`] generates seeded synthetic intake histories.
//! - [`logbook`] keeps a hand-entered CSV intake log and imports it into a tracker.
//! - [`console`] renders the core's structured results as plain text.

pub mod console;
pub mod logbook;
pub mod sample;

pub use logbook::{Dosage, DosageParseError, ImportSummary, LogEntry, Logbook, LogbookError};
pub use sample::{SampleConfig, SampleGenerator};
