/// Site pipeline driver.
///
/// For each registry site in order: one logical fetch of the uv document,
/// comment/header cleanup, row parsing, normalization and statistics. Sites
/// that fail at the site level are logged and left out of the snapshot;
/// a transport failure aborts the whole run.

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, SubsecRound, Utc};

use crate::analysis::statistics::{self, StatisticsOptions};
use crate::ingest::rdb;
use crate::ingest::usgs::SiteFetcher;
use crate::logging::{self, DataSource};
use crate::model::{NwisError, Site, SiteStatistics, Snapshot};
use crate::normalize;
use crate::sites::Registry;
use crate::storage::{self, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// The query window starts on the calendar date this many days before
    /// the run time.
    pub lookback_days: u32,
    pub statistics: StatisticsOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            lookback_days: 1,
            statistics: StatisticsOptions::default(),
        }
    }
}

/// Calendar date (UTC) the query window begins on.
pub fn begin_date_for(now: DateTime<Utc>, lookback_days: u32) -> NaiveDate {
    (now - Duration::days(i64::from(lookback_days))).date_naive()
}

/// Turns one fetched document into site statistics.
///
/// A document without data rows is `NoDataAvailable`.
pub fn build_for_site(
    site: &Site,
    raw_text: &str,
    data_url: &str,
    fetched_at: DateTime<Utc>,
    begin_date: NaiveDate,
    options: &StatisticsOptions,
) -> Result<SiteStatistics, NwisError> {
    let doc = rdb::cleanup(raw_text).ok_or_else(|| NwisError::NoDataAvailable(site.site_no.clone()))?;
    let raw_rows = rdb::parse_rows(&doc);
    let rows = normalize::normalize_rows(site, &raw_rows)?;
    statistics::build_site_statistics(site, data_url, &rows, fetched_at, begin_date, options)
        .ok_or_else(|| NwisError::NoDataAvailable(site.site_no.clone()))
}

/// Runs the pipeline for one site as of `now`.
///
/// Returns `Ok(None)` when the site is skipped: no data, a non-2xx status,
/// or a document that fails to parse. Only transport errors are returned.
/// Every failure is logged with its classification.
pub fn process_site_at(
    fetcher: &impl SiteFetcher,
    site: &Site,
    options: &PipelineOptions,
    now: DateTime<Utc>,
) -> Result<Option<SiteStatistics>, NwisError> {
    let fetched_at = now.trunc_subsecs(0);
    let begin_date = begin_date_for(fetched_at, options.lookback_days);

    let result = fetcher.fetch(site, begin_date).and_then(|fetched| {
        build_for_site(
            site,
            &fetched.text,
            &fetched.url,
            fetched_at,
            begin_date,
            &options.statistics,
        )
    });

    match result {
        Ok(stats) => {
            logging::debug(
                DataSource::Usgs,
                Some(&site.site_no),
                &format!("{} row(s) since {}", stats.rowcount, begin_date),
            );
            Ok(Some(stats))
        }
        Err(e) => {
            logging::log_usgs_failure(&site.site_no, "uv fetch", &e);
            if e.is_fatal() { Err(e) } else { Ok(None) }
        }
    }
}

/// Runs every registry site in order, reading `clock` once per site so each
/// record carries the time its own fetch started.
pub fn process_all_sites_with(
    fetcher: &impl SiteFetcher,
    registry: &Registry,
    options: &PipelineOptions,
    clock: impl Fn() -> DateTime<Utc>,
) -> Result<Snapshot, NwisError> {
    let mut snapshot = Snapshot::new();
    for site in registry.sites() {
        if let Some(stats) = process_site_at(fetcher, site, options, clock())? {
            snapshot.insert(site.site_no.clone(), stats);
        }
    }

    let total = registry.sites().len();
    logging::log_run_summary(total, snapshot.len(), total - snapshot.len());
    Ok(snapshot)
}

/// Runs every registry site in order with a fixed `now`.
pub fn process_all_sites_at(
    fetcher: &impl SiteFetcher,
    registry: &Registry,
    options: &PipelineOptions,
    now: DateTime<Utc>,
) -> Result<Snapshot, NwisError> {
    process_all_sites_with(fetcher, registry, options, || now)
}

pub fn process_all_sites(
    fetcher: &impl SiteFetcher,
    registry: &Registry,
    options: &PipelineOptions,
) -> Result<Snapshot, NwisError> {
    process_all_sites_with(fetcher, registry, options, Utc::now)
}

// ---------------------------------------------------------------------------
// Run to file
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Run aborted: {0}")]
    Fetch(#[from] NwisError),
    #[error("Snapshot not written: {0}")]
    Store(#[from] StorageError),
}

/// Runs the whole registry and writes the snapshot to `output`.
///
/// Nothing is written when the run aborts, so the previous snapshot stays.
pub fn fetch_and_store(
    fetcher: &impl SiteFetcher,
    registry: &Registry,
    options: &PipelineOptions,
    output: &Path,
) -> Result<Snapshot, RunError> {
    let snapshot = process_all_sites(fetcher, registry, options)?;
    storage::write_snapshot(output, &snapshot)?;
    Ok(snapshot)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
