//! Domain models for the drug-intake system.

mod aggregate;
mod event;
mod reference;
mod report;
mod safety;

pub use aggregate::*;
pub use event::*;
pub use reference::*;
pub use report::*;
pub use safety::*;
