//! Dashboard statistics over an in-memory case collection.

mod aggregator;
mod tally;

pub use aggregator::*;
pub use tally::*;
