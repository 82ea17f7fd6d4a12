use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Compact stamp used inside generated question ids, e.g. `20250314_091502`.
pub fn id_stamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%d_%H%M%S").to_string()
}
