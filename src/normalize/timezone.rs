//! Timezone resolution for gauge-local timestamps.
//!
//! The RDB `tz_cd` column carries abbreviations such as `MDT` or `CST`,
//! most of which are not IANA names. Resolution tries, in order: the row's
//! label, the site's configured IANA zone, an alias table for common US
//! abbreviations, and finally UTC. It never fails.

use chrono_tz::Tz;

/// US abbreviations the USGS service emits, mapped to a representative zone.
pub static TZ_ALIASES: &[(&str, &str)] = &[
    ("HDT", "Pacific/Honolulu"),
    ("AKDT", "America/Anchorage"),
    ("AKST", "America/Anchorage"),
    ("PST", "America/Los_Angeles"),
    ("PDT", "America/Los_Angeles"),
    ("MDT", "America/Denver"),
    ("CST", "America/Chicago"),
    ("CDT", "America/Chicago"),
    ("EDT", "America/New_York"),
];

/// Which step of the resolution chain produced the zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimezoneSource {
    Primary,
    Fallback,
    Alias,
    Utc,
}

fn lookup(name: &str) -> Option<Tz> {
    name.parse::<Tz>().ok()
}

fn alias_for(label: &str) -> Option<&'static str> {
    TZ_ALIASES
        .iter()
        .find(|(abbrev, _)| *abbrev == label)
        .map(|(_, zone)| *zone)
}

/// Resolves a zone and reports which step matched.
pub fn resolve_timezone_source(primary: &str, fallback: &str) -> (Tz, TimezoneSource) {
    if let Some(tz) = lookup(primary) {
        return (tz, TimezoneSource::Primary);
    }
    if let Some(tz) = lookup(fallback) {
        return (tz, TimezoneSource::Fallback);
    }
    if let Some(tz) = alias_for(primary).and_then(lookup) {
        return (tz, TimezoneSource::Alias);
    }
    (Tz::UTC, TimezoneSource::Utc)
}

/// Resolves `primary`, then `fallback`, then the alias of `primary`, else UTC.
pub fn resolve_timezone(primary: &str, fallback: &str) -> Tz {
    resolve_timezone_source(primary, fallback).0
}
