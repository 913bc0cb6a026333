//! Text formats the scheduling engine reads and writes.

pub mod recur;
