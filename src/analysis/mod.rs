/// Data analysis for the river data service.
///
/// Submodules:
/// - `trend`: least-squares forecast and rising/flat/falling classification.
/// - `statistics`: recent/high/low extraction and per-site record assembly.

pub mod statistics;
pub mod trend;
