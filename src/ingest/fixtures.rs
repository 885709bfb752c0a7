/// Hand-written RDB documents shaped like real uv service responses.
///
/// Comment blocks are trimmed versions of what the service sends; data
/// rows are oldest-first as delivered.

/// Colorado River below Glenwood Springs: discharge only, rising 5 cfs per
/// 15 minutes, 10 rows.
pub fn fixture_glenwood_discharge_rdb() -> &'static str {
    "# ---------------------------------- WARNING ----------------------------------------
# Some of the data that you have obtained from this U.S. Geological Survey database
# may not have received Director's approval. Any such data values are qualified
# as provisional and are subject to revision.
# -----------------------------------------------------------------------------------
#
# Data for the following 1 site(s) are contained in this file
#    USGS 09085100 COLORADO RIVER BELOW GLENWOOD SPRINGS, CO
#
# Data provided for site 09085100
#            TS   parameter     Description
#         145245       00060     Discharge, cubic feet per second
#
# Data-value qualification codes included in this output:
#     P  Provisional data subject to revision.
#
agency_cd\tsite_no\tdatetime\ttz_cd\t145245_00060\t145245_00060_cd
5s\t15s\t20d\t6s\t14n\t10s
USGS\t09085100\t2024-05-01 00:00\tMDT\t1490\tP
USGS\t09085100\t2024-05-01 00:15\tMDT\t1495\tP
USGS\t09085100\t2024-05-01 00:30\tMDT\t1500\tP
USGS\t09085100\t2024-05-01 00:45\tMDT\t1505\tP
USGS\t09085100\t2024-05-01 01:00\tMDT\t1510\tP
USGS\t09085100\t2024-05-01 01:15\tMDT\t1515\tP
USGS\t09085100\t2024-05-01 01:30\tMDT\t1520\tP
USGS\t09085100\t2024-05-01 01:45\tMDT\t1525\tP
USGS\t09085100\t2024-05-01 02:00\tMDT\t1530\tP
USGS\t09085100\t2024-05-01 02:15\tMDT\t1535\tP
"
}

/// Boise River at Glenwood Bridge: discharge and temperature, with gaps.
///
/// The newest row has no discharge, one row carries the `Ice` marker, and
/// temperature falls steadily.
pub fn fixture_boise_mixed_rdb() -> &'static str {
    "# Data for the following 1 site(s) are contained in this file
#    USGS 13206000 BOISE RIVER AT GLENWOOD BRIDGE NR BOISE ID
#
agency_cd\tsite_no\tdatetime\ttz_cd\t15987_00060\t15987_00060_cd\t15988_00010\t15988_00010_cd
5s\t15s\t20d\t6s\t14n\t10s\t14n\t10s
USGS\t13206000\t2024-05-01 00:00\tMDT\t612\tP\t14.9\tP
USGS\t13206000\t2024-05-01 00:15\tMDT\t640\tP\t14.1\tP
USGS\t13206000\t2024-05-01 00:30\tMDT\tIce\tP\t13.3\tP
USGS\t13206000\t2024-05-01 00:45\tMDT\t640\tP\t12.5\tP
USGS\t13206000\t2024-05-01 01:00\tMDT\t598\tP\t11.7\tP
USGS\t13206000\t2024-05-01 01:15\tMDT\t\t\t10.9\tP
"
}

/// Only the comment block; the site returned nothing for the window.
pub fn fixture_comments_only_rdb() -> &'static str {
    "# ---------------------------------- WARNING ----------------------------------------
# No sites found matching all criteria
# -----------------------------------------------------------------------------------
"
}

/// Header and units rows but no observations.
pub fn fixture_header_only_rdb() -> &'static str {
    "# Data provided for site 09095500
agency_cd\tsite_no\tdatetime\ttz_cd\t145300_00060\t145300_00060_cd
5s\t15s\t20d\t6s\t14n\t10s
"
}
