/// Game-side player identifier (platform account id, e.g. a Steam id).
pub type PlayerId = u64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Seconds since the Unix epoch, as stored in the usage ledger.
/// `0` means "never".
pub type UnixSeconds = i64;
