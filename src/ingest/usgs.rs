/// USGS NWIS uv (instantaneous values) client, RDB format.
///
/// Requests one site at a time for a window starting at `begin_date` and
/// returns the raw document together with the exact URL fetched, which is
/// recorded in the site statistics.
///
///   https://waterdata.usgs.gov/nwis/uv?cb_00010=on&cb_00060=on&format=rdb&site_no=...

use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Url;

use crate::logging::{self, DataSource};
use crate::model::{NwisError, Quantity, Site};

pub const UV_BASE_URL: &str = "https://waterdata.usgs.gov/nwis/uv";

// ---------------------------------------------------------------------------
// Request construction
// ---------------------------------------------------------------------------

/// Query parameters for one site. Both discharge and temperature are
/// always requested; sites without a series simply omit the column.
pub fn build_request_params(site_no: &str, begin_date: NaiveDate) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = Quantity::ALL
        .iter()
        .map(|q| (format!("cb_{}", q.parameter_code()), "on".to_string()))
        .collect();
    params.extend([
        ("format".to_string(), "rdb".to_string()),
        ("site_no".to_string(), site_no.to_string()),
        ("period".to_string(), String::new()),
        ("begin_date".to_string(), begin_date.format("%Y-%m-%d").to_string()),
    ]);
    params
}

/// Builds the full request URL.
pub fn build_uv_url(base_url: &str, site_no: &str, begin_date: NaiveDate) -> Result<Url, NwisError> {
    Url::parse_with_params(base_url, build_request_params(site_no, begin_date))
        .map_err(|e| NwisError::ParseError(format!("invalid base URL '{}': {}", base_url, e)))
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Raw response body and the URL it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub text: String,
    pub url: String,
}

/// Source of raw RDB documents, one site at a time.
pub trait SiteFetcher {
    fn fetch(&self, site: &Site, begin_date: NaiveDate) -> Result<FetchResult, NwisError>;
}

/// Timeout and retry policy for the uv service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub base_url: String,
    pub timeout: Duration,
    /// Extra attempts after a transport failure. 0 means one request.
    pub max_retries: u32,
    /// Wait before retry `n` is `n * retry_backoff`.
    pub retry_backoff: Duration,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            base_url: UV_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 0,
            retry_backoff: Duration::from_millis(1000),
            user_agent: format!("riverdata_service/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Blocking HTTP implementation of `SiteFetcher`.
pub struct UsgsClient {
    client: reqwest::blocking::Client,
    options: FetchOptions,
}

impl UsgsClient {
    pub fn new(options: FetchOptions) -> Result<Self, NwisError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .build()?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    fn send_with_retry(
        &self,
        site_no: &str,
        url: &Url,
    ) -> Result<reqwest::blocking::Response, NwisError> {
        let mut attempt = 0;
        loop {
            match self.client.get(url.clone()).send() {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.options.max_retries => {
                    attempt += 1;
                    logging::warn(
                        DataSource::Usgs,
                        Some(site_no),
                        &format!(
                            "Request failed (attempt {}/{}): {}",
                            attempt,
                            self.options.max_retries + 1,
                            e
                        ),
                    );
                    thread::sleep(self.options.retry_backoff * attempt);
                }
                Err(e) => return Err(NwisError::Transport(e)),
            }
        }
    }
}

impl SiteFetcher for UsgsClient {
    fn fetch(&self, site: &Site, begin_date: NaiveDate) -> Result<FetchResult, NwisError> {
        let url = build_uv_url(&self.options.base_url, &site.site_no, begin_date)?;
        logging::debug(DataSource::Usgs, Some(&site.site_no), &format!("GET {}", url));

        let response = self.send_with_retry(&site.site_no, &url)?;
        let status = response.status();
        if !status.is_success() {
            return Err(NwisError::HttpError(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let text = response.text()?;
        Ok(FetchResult {
            text,
            url: final_url,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Integration Tests - live uv service
// ---------------------------------------------------------------------------
//
// Marked #[ignore] so normal builds do not depend on USGS availability.
//
//   cargo test -- --ignored live_uv
