//! Decision core of the watcher: injected clock, day-scoped availability
//! tracking, and the two scheduling disciplines.

pub mod clock;
pub mod schedule;
pub mod tracker;
