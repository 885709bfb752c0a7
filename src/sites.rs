/// Site registry for the river data service.
///
/// Defines the list of USGS gauges the pipeline runs over, in order, plus
/// the park definitions that project the snapshot for display. The registry
/// is loaded once at startup, either from the `sites.toml` compiled into the
/// binary or from a file named in the configuration, and is passed to the
/// pipeline explicitly. Nothing else should hardcode site numbers.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::config::ConfigError;
use crate::model::{Park, Quantity, Site};

/// Registry shipped with the service.
pub const BUILTIN_REGISTRY: &str = include_str!("../sites.toml");

// ---------------------------------------------------------------------------
// TOML Configuration Structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    sites: Vec<Site>,
    #[serde(default)]
    parks: Vec<Park>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable, ordered set of configured sites and parks.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    sites: Vec<Site>,
    parks: Vec<Park>,
}

impl Registry {
    /// Builds a registry, rejecting malformed or duplicate site numbers.
    pub fn new(sites: Vec<Site>, parks: Vec<Park>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for site in &sites {
            if site.site_no.is_empty() || !site.site_no.chars().all(|c| c.is_ascii_digit()) {
                return Err(ConfigError::Invalid(format!(
                    "site number for '{}' must be numeric, got '{}'",
                    site.name_full, site.site_no
                )));
            }
            if !seen.insert(site.site_no.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate site number '{}' in registry",
                    site.site_no
                )));
            }
        }
        Ok(Self { sites, parks })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: RegistryFile = toml::from_str(text)?;
        Self::new(file.sites, file.parks)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&text)
    }

    /// The registry compiled into the binary.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_REGISTRY)
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn parks(&self) -> &[Park] {
        &self.parks
    }

    /// Site numbers in registry order.
    pub fn site_numbers(&self) -> Vec<&str> {
        self.sites.iter().map(|s| s.site_no.as_str()).collect()
    }

    /// Looks up a site by number. Returns `None` if not found.
    pub fn find_site(&self, site_no: &str) -> Option<&Site> {
        self.sites.iter().find(|s| s.site_no == site_no)
    }

    /// Sites configured to report `quantity`.
    pub fn sites_with_feature(&self, quantity: Quantity) -> Vec<&Site> {
        self.sites.iter().filter(|s| s.reports(quantity)).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
