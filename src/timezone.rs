use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Today's date in `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// # Errors
///
/// Returns [Error::InvalidTimezoneError] if the timezone is not a canonical timezone name.
pub fn current_local_date(canonical_timezone: &str) -> Result<Date, Error> {
    let offset = get_local_offset(canonical_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", canonical_timezone);
        Error::InvalidTimezoneError(canonical_timezone.to_owned())
    })?;

    Ok(OffsetDateTime::now_utc().to_offset(offset).date())
}
