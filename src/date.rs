use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

/// The C locale's `%c` (and `asctime`) layout.
const DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Parse a PDF date string, `D:YYYYMMDDHHmmSS` with an optional `D:` prefix.
///
/// The year is required. The remaining fields are read while two digits are
/// available; the first missing one and every one after it take their
/// defaults (January, the 1st, 00:00:00). Anything after the seconds, such
/// as a UTC offset, is ignored.
pub fn parse_pdf_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.strip_prefix("D:").unwrap_or(s);
    let bytes = s.as_bytes();

    let year = digits(bytes, 0, 4)?;
    let mut fields = [1, 1, 0, 0, 0];
    let mut pos = 4;
    for field in fields.iter_mut() {
        match digits(bytes, pos, 2) {
            Some(value) => *field = value,
            None => break,
        }
        pos += 2;
    }
    let [month, day, hour, minute, second] = fields;
    normalize(year, month, day, hour, minute, second)
}

/// Render a date the way the C library's `%c` does in the "C" locale,
/// e.g. `Sun Jan  1 00:00:00 2023`.
pub fn format_date(date: &NaiveDateTime) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn digits(bytes: &[u8], start: usize, len: usize) -> Option<i64> {
    let field = bytes.get(start..start + len)?;
    if !field.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(field).ok()?.parse().ok()
}

/// Build a calendar date, letting out-of-range fields carry over into the
/// next unit the way `mktime` does (month 13 is January of the next year).
fn normalize(
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: i64,
) -> Option<NaiveDateTime> {
    let months = year * 12 + (month - 1);
    let year = i32::try_from(months.div_euclid(12)).ok()?;
    let month = months.rem_euclid(12) as u32 + 1;
    let start = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;

    let offset = TimeDelta::try_days(day - 1)?
        .checked_add(&TimeDelta::try_hours(hour)?)?
        .checked_add(&TimeDelta::try_minutes(minute)?)?
        .checked_add(&TimeDelta::try_seconds(second)?)?;
    start.checked_add_signed(offset)
}
