/// Data ingestion from the USGS NWIS uv service.
///
/// Submodules:
/// - `usgs`: request construction, the `SiteFetcher` seam and its HTTP client.
/// - `rdb`: comment stripping, header translation and row parsing for RDB text.

pub mod rdb;
pub mod usgs;

#[cfg(test)]
pub mod fixtures;
