//! Analysis modules.
//!
//! Pure computations over scraped profile data.

pub mod aggregator;

pub use aggregator::*;
