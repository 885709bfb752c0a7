/// Park projection of a site snapshot.
///
/// Each park points at one discharge site and one temperature site. The
/// projection keeps only the recent values a park page shows. A park whose
/// site is missing from the snapshot, or whose site lacks the quantity,
/// gets `None` for the affected fields instead of failing.

use std::path::Path;

use crate::model::{Park, ParkStatistics, Quantity, Snapshot};
use crate::storage::{self, StorageError};

/// Projects `snapshot` onto `parks`, in park order.
pub fn build_park_statistics(snapshot: &Snapshot, parks: &[Park]) -> Vec<ParkStatistics> {
    parks
        .iter()
        .map(|park| {
            let discharge = snapshot
                .get(&park.site_no_discharge)
                .and_then(|s| s.quantity(Quantity::Discharge));
            let temperature = snapshot
                .get(&park.site_no_temperature)
                .and_then(|s| s.quantity(Quantity::Temperature));

            ParkStatistics {
                park_name: park.name.clone(),
                park_region: park.region.clone(),
                park_timezone: park.timezone.clone(),
                discharge_recent_value: discharge.map(|q| q.recent_value),
                discharge_recent_datetime: discharge.map(|q| q.recent_datetime),
                discharge_prediction_value: discharge.map(|q| q.prediction_value),
                temp_recent_value: temperature.map(|q| q.recent_value),
            }
        })
        .collect()
}

/// Reads a stored snapshot and projects it onto `parks`.
pub fn read_park_statistics(
    path: impl AsRef<Path>,
    parks: &[Park],
) -> Result<Vec<ParkStatistics>, StorageError> {
    let snapshot = storage::read_snapshot(path)?;
    Ok(build_park_statistics(&snapshot, parks))
}
