//! Durable asynchronous statistics queue.
//!
//! Request handling submits per-client statistic records through
//! [`ThreadedStatistics::process_statistics`] without ever blocking; a
//! background worker drains the bounded queue into the plugin's
//! [`StatisticsHandler`]. On shutdown the worker snapshots whatever is
//! still queued to disk, and a freshly started worker replays that
//! snapshot before processing live traffic, so records in flight across a
//! restart are not lost.

mod snapshot;
mod worker;

pub use snapshot::PendingRecord;
pub use worker::{StatisticRecord, StatisticsHandler, ThreadedStatistics};
