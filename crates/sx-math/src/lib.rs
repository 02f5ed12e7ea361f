//! sysexplain math utilities.

pub mod stats;
pub mod trend;

pub use stats::*;
pub use trend::*;
