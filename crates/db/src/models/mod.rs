mod connection;
mod run;
mod task;

pub use connection::ConnectionRow;
pub use run::RunRow;
pub use task::TaskRow;

use chrono::{DateTime, TimeZone, Utc};

pub(crate) fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(ts, 0).single().unwrap_or(DateTime::UNIX_EPOCH)
}

pub(crate) fn datetime_to_timestamp(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}
