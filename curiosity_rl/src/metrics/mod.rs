//! Scalar time series emitted during training.
//!
//! Every series is keyed by name and tagged with an index (episode number
//! for per-episode series, iteration for per-update series).
//!
//! - [`LogSink`]: forwards to the `log` facade
//! - [`CsvSink`]: `name,index,value` rows in a file
//! - [`MemorySink`]: shared in-memory store, mainly for tests
//! - [`MultiSink`]: fan-out to several sinks

pub mod logger;

pub use logger::{CsvSink, LogSink, MemorySink, MetricRecord, MetricsSink, MultiSink};

/// Extrinsic return of the sample worker's finished episode.
pub const EPISODE_REWARD: &str = "data/reward";
/// Intrinsic return of the sample worker's finished episode.
pub const INTRINSIC_REWARD: &str = "data/i-reward";
/// Length of the sample worker's finished episode.
pub const EPISODE_STEP: &str = "data/step";
/// Mean of the last iterations' mean max action probability.
pub const MAX_PROB: &str = "data/max_prob";
pub const LEARNING_RATE: &str = "data/lr";
