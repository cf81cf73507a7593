//! Export of structured results for presentation collaborators.

mod csv;
mod snapshot;

pub use csv::*;
pub use snapshot::*;
