//! Background jobs.

pub mod compaction;

#[cfg(feature = "scheduler")]
pub mod scheduler;
