/// River data service: fetches recent USGS gauge readings, normalizes them
/// and records per-site statistics with a short trend forecast.
///
/// Layout:
/// - `sites`: registry of gauges and parks
/// - `ingest`: uv service client and RDB parsing
/// - `normalize`: timezone resolution and typed readings
/// - `analysis`: statistics and trend prediction
/// - `pipeline`: per-site and whole-registry driver
/// - `storage`: snapshot persistence with tagged scalars
/// - `parks`: park view of a snapshot

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod parks;
pub mod pipeline;
pub mod sites;
pub mod storage;
