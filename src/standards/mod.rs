//! Qualification engine.
//!
//! Classifies each swim against the standards carried on its row, folds the
//! results into per-swimmer aggregates, pivots best times by event, and
//! orders everything for display.

pub mod classify;
pub mod pivot;
pub mod ranking;
pub mod roster;
pub mod summary;
pub mod types;
