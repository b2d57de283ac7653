use chrono::{Datelike, NaiveDate};

/// Completed months between `birth` and `on`.
///
/// A month only counts once its day-of-month has been reached, so a baby
/// born on the 20th is still 0 months old on the 19th of the next month.
/// Dates before birth give 0.
pub fn age_in_months(birth: NaiveDate, on: NaiveDate) -> u32 {
    let mut months = i64::from(on.year() - birth.year()) * 12
        + i64::from(on.month()) - i64::from(birth.month());

    if on.day() < birth.day() {
        months -= 1;
    }

    u32::try_from(months.max(0)).unwrap_or(u32::MAX)
}
