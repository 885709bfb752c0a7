/// USGS RDB (tab-delimited) document handling.
///
/// An RDB document from the uv service looks like:
///
/// ```text
/// # comment lines ...
/// agency_cd	site_no	datetime	tz_cd	145245_00060	145245_00060_cd
/// 5s	15s	20d	6s	14n	10s
/// USGS	09085100	2024-05-01 00:00	MDT	1490	P
/// ```
///
/// The first non-comment line holds column names, the second holds column
/// widths/types and is discarded, the rest are observations oldest-first.
/// Column names are translated through `HEADER_PATTERNS` so variable
/// columns like `145245_00060` become `discharge`.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::model::RawRow;

/// Marker that starts an RDB comment line.
pub const COMMENT_MARKER: char = '#';

/// Column-name pattern to canonical field name. First match wins.
pub static HEADER_PATTERNS: &[(&str, &str)] = &[
    (r"^agency_cd$", "agency"),
    (r"^site_no$", "site_no"),
    (r"^datetime$", "datetime"),
    (r"^tz_cd$", "timezone"),
    (r"^\d+_00060$", "discharge"),
    (r"^\d+_00060_cd$", "discharge_provisional"),
    (r"^\d+_00010$", "temperature"),
    (r"^\d+_00010_cd$", "temperature_provisional"),
];

fn compiled_patterns() -> &'static [(Regex, &'static str)] {
    static COMPILED: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        HEADER_PATTERNS
            .iter()
            .filter_map(|(pattern, name)| Regex::new(pattern).ok().map(|re| (re, *name)))
            .collect()
    })
}

/// Header line plus data lines of a cleaned document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdbDocument {
    pub headers: Vec<String>,
    pub data: Vec<String>,
}

// ---------------------------------------------------------------------------
// Header translation
// ---------------------------------------------------------------------------

/// Maps a raw column name to its canonical name; unknown names pass through.
pub fn translate_header(header: &str) -> String {
    compiled_patterns()
        .iter()
        .find(|(re, _)| re.is_match(header))
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| header.to_string())
}

pub fn translate_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    headers.into_iter().map(translate_header).collect()
}

// ---------------------------------------------------------------------------
// Cleanup and parsing
// ---------------------------------------------------------------------------

/// Strips comments and the header/units pair.
///
/// Returns `None` when no data lines remain; gauges that are offline or
/// between transmissions produce exactly that, and it is not an error.
pub fn cleanup(text: &str) -> Option<RdbDocument> {
    let mut lines = text
        .lines()
        .filter(|line| !line.starts_with(COMMENT_MARKER))
        .filter(|line| !line.trim().is_empty());

    let header_line = lines.next()?;
    let _units = lines.next();
    let data: Vec<String> = lines.map(String::from).collect();
    if data.is_empty() {
        return None;
    }

    Some(RdbDocument {
        headers: translate_headers(header_line.split('\t')),
        data,
    })
}

/// Parses the data lines into raw rows, newest first.
///
/// The service delivers ascending time; the order is reversed here so the
/// first row is the most recent reading. When several columns translate to
/// the same name (a site with two discharge series), the rightmost wins.
pub fn parse_rows(doc: &RdbDocument) -> Vec<RawRow> {
    let index: HashMap<&str, usize> = doc
        .headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    doc.data
        .iter()
        .rev()
        .map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            let field = |name: &str| -> Option<String> {
                index
                    .get(name)
                    .and_then(|&i| fields.get(i))
                    .map(|s| (*s).to_string())
            };
            RawRow {
                agency: field("agency").unwrap_or_default(),
                site_no: field("site_no").unwrap_or_default(),
                datetime: field("datetime").unwrap_or_default(),
                timezone: field("timezone").unwrap_or_default(),
                discharge: field("discharge"),
                discharge_provisional: field("discharge_provisional"),
                temperature: field("temperature"),
                temperature_provisional: field("temperature_provisional"),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
