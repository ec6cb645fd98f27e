//! Week and month boundaries used for budget matching and grid ranges.

use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, macros::format_description};

use crate::Error;

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    /// Whether `date` falls within the range, inclusive of both ends.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The size of the date range shown by the grid and the summary page.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangePreset {
    #[default]
    Week,
    Month,
}

impl RangePreset {
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Week => "Week",
            Self::Month => "Month",
        }
    }
}

/// Get the Monday that starts the ISO week containing `date`.
pub fn week_of(date: Date) -> Date {
    let weekday_number = date.weekday().number_from_monday() as i64;

    date - Duration::days(weekday_number - 1)
}

/// Get the Monday to Sunday range containing `date`.
pub fn week_bounds(date: Date) -> DateRange {
    let start = week_of(date);
    let end = start + Duration::days(6);

    DateRange { start, end }
}

/// Get the first to last day of the month containing `date`.
pub fn month_bounds(date: Date) -> DateRange {
    let year = date.year();
    let month = date.month();
    // Day 1 and the last day of a month always exist, so these cannot fail.
    let start = date.replace_day(1).unwrap_or(date);
    let end = date
        .replace_day(last_day_of_month(year, month))
        .unwrap_or(date);

    DateRange { start, end }
}

pub fn compute_range(preset: RangePreset, anchor_date: Date) -> DateRange {
    match preset {
        RangePreset::Week => week_bounds(anchor_date),
        RangePreset::Month => month_bounds(anchor_date),
    }
}

/// The Monday of every week that overlaps `range`, in chronological order.
pub fn weeks_in(range: DateRange) -> Vec<Date> {
    let mut weeks = Vec::new();
    let mut week = week_of(range.start);

    while week <= range.end {
        weeks.push(week);
        week += Duration::weeks(1);
    }

    weeks
}

pub fn range_label(range: DateRange) -> String {
    let start = format_date_label(range.start);
    let end = format_date_label(range.end);

    format!("{start} - {end}")
}

/// Parse a date in the `YYYY-MM-DD` format used by HTML date inputs.
///
/// # Errors
///
/// Returns [Error::InvalidDate] if `text` is not a valid date.
pub fn parse_date(text: &str) -> Result<Date, Error> {
    Date::parse(text.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| Error::InvalidDate(text.to_owned()))
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

fn format_date_label(date: Date) -> String {
    format!(
        "{} {} {}",
        date.day(),
        month_abbrev(date.month()),
        date.year()
    )
}

pub fn month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::Error;

    use super::{
        DateRange, RangePreset, compute_range, month_bounds, parse_date, range_label, week_bounds,
        week_of, weeks_in,
    };

    #[test]
    fn week_starts_on_monday() {
        assert_eq!(week_of(date!(2024 - 06 - 03)), date!(2024 - 06 - 03));
        assert_eq!(week_of(date!(2024 - 06 - 05)), date!(2024 - 06 - 03));
        assert_eq!(week_of(date!(2024 - 06 - 09)), date!(2024 - 06 - 03));
        assert_eq!(week_of(date!(2024 - 06 - 10)), date!(2024 - 06 - 10));
    }

    #[test]
    fn week_crosses_year_boundary() {
        let range = week_bounds(date!(2025 - 01 - 01));

        assert_eq!(
            range,
            DateRange {
                start: date!(2024 - 12 - 30),
                end: date!(2025 - 01 - 05),
            }
        );
    }

    #[test]
    fn month_bounds_handle_leap_years() {
        assert_eq!(month_bounds(date!(2024 - 02 - 10)).end, date!(2024 - 02 - 29));
        assert_eq!(month_bounds(date!(2023 - 02 - 10)).end, date!(2023 - 02 - 28));
        assert_eq!(month_bounds(date!(1900 - 02 - 10)).end, date!(1900 - 02 - 28));
        assert_eq!(month_bounds(date!(2000 - 02 - 10)).end, date!(2000 - 02 - 29));
    }

    #[test]
    fn compute_range_uses_preset() {
        let anchor = date!(2024 - 06 - 12);

        assert_eq!(
            compute_range(RangePreset::Week, anchor),
            DateRange {
                start: date!(2024 - 06 - 10),
                end: date!(2024 - 06 - 16),
            }
        );
        assert_eq!(
            compute_range(RangePreset::Month, anchor),
            DateRange {
                start: date!(2024 - 06 - 01),
                end: date!(2024 - 06 - 30),
            }
        );
    }

    #[test]
    fn weeks_in_month_include_partial_weeks() {
        let weeks = weeks_in(month_bounds(date!(2024 - 06 - 15)));

        assert_eq!(
            weeks,
            vec![
                date!(2024 - 05 - 27),
                date!(2024 - 06 - 03),
                date!(2024 - 06 - 10),
                date!(2024 - 06 - 17),
                date!(2024 - 06 - 24),
            ]
        );
    }

    #[test]
    fn label_is_human_readable() {
        let label = range_label(week_bounds(date!(2024 - 06 - 03)));

        assert_eq!(label, "3 Jun 2024 - 9 Jun 2024");
    }

    #[test]
    fn parse_date_accepts_input_format() {
        assert_eq!(parse_date("2024-06-03"), Ok(date!(2024 - 06 - 03)));
        assert_eq!(
            parse_date("03/06/2024"),
            Err(Error::InvalidDate("03/06/2024".to_owned()))
        );
    }
}
