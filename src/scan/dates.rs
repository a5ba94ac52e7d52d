//! Date parsing for message headers and free-text arrival dates.
//!
//! Everything here fails soft: callers get `None` and fall back to the
//! message timestamp.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// A year-less date landing further than this before the message rolls forward.
const YEAR_ROLLOVER_DAYS: i64 = 183;

/// Parse an RFC 2822 `Date` header, tolerating a trailing `(UTC)` comment.
pub fn parse_header_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let value = match value.find(" (") {
        Some(idx) => &value[..idx],
        None => value,
    };

    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an arrival date phrase relative to the message time.
///
/// Accepts `Friday, October 23`, `October 23, 2026`, `Oct 23rd`,
/// `Thu, 10/23/2026`, `10/23`, `2026-10-23`, `today` and `tomorrow`. The
/// result is midnight UTC of that day.
pub fn parse_arrival_date(text: &str, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let normalized = text
        .trim()
        .to_ascii_lowercase()
        .replace([',', '.'], " ");
    let mut tokens: Vec<&str> = normalized.split_whitespace().collect();

    // Drop a leading weekday or filler word ("Friday, Oct 23", "between Oct 22").
    if tokens.len() > 1
        && month_number(tokens[0]).is_none()
        && !tokens[0].starts_with(|c: char| c.is_ascii_digit())
    {
        tokens.remove(0);
    }

    let date = match tokens.as_slice() {
        [] => return None,
        ["today"] => reference.date_naive(),
        ["tomorrow"] => reference.date_naive() + Duration::days(1),
        [single] if single.contains('-') => NaiveDate::parse_from_str(single, "%Y-%m-%d").ok()?,
        [single] if single.contains('/') => parse_slash_date(single, reference)?,
        words => parse_word_date(words, reference)?,
    };

    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}

/// `10/23/2026`, `10/23/26` or `10/23`.
fn parse_slash_date(token: &str, reference: DateTime<Utc>) -> Option<NaiveDate> {
    let parts: Vec<&str> = token.split('/').collect();
    let month: u32 = parts.first()?.parse().ok()?;
    let day: u32 = parts.get(1)?.parse().ok()?;
    match parts.get(2) {
        Some(year) => {
            let year: i32 = year.parse().ok()?;
            let year = if year < 100 { 2000 + year } else { year };
            NaiveDate::from_ymd_opt(year, month, day)
        }
        None => infer_year(month, day, reference),
    }
}

/// `month day [year]`.
fn parse_word_date(words: &[&str], reference: DateTime<Utc>) -> Option<NaiveDate> {
    let month = month_number(words.first()?)?;
    let day: u32 = strip_ordinal(words.get(1)?).parse().ok()?;
    match words.get(2) {
        Some(year) => NaiveDate::from_ymd_opt(year.parse().ok()?, month, day),
        None => infer_year(month, day, reference),
    }
}

/// Use the message's year, rolling to the next one for dates that would
/// otherwise be months in the past (a December message promising "Jan 3").
fn infer_year(month: u32, day: u32, reference: DateTime<Utc>) -> Option<NaiveDate> {
    let anchor = reference.date_naive();
    let candidate = NaiveDate::from_ymd_opt(anchor.year(), month, day)?;
    if anchor.signed_duration_since(candidate).num_days() > YEAR_ROLLOVER_DAYS {
        NaiveDate::from_ymd_opt(anchor.year() + 1, month, day)
    } else {
        Some(candidate)
    }
}

fn month_number(word: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    if word.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| word.starts_with(m))
        .map(|idx| idx as u32 + 1)
}

fn strip_ordinal(word: &str) -> &str {
    word.trim_end_matches(|c: char| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 15, 30, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    // ── Header dates ────────────────────────────────────────────

    #[test]
    fn header_rfc2822() {
        assert_eq!(
            parse_header_date("Mon, 19 Oct 2026 10:15:00 -0400"),
            Some(Utc.with_ymd_and_hms(2026, 10, 19, 14, 15, 0).unwrap())
        );
    }

    #[test]
    fn header_with_trailing_comment() {
        assert_eq!(
            parse_header_date("Mon, 19 Oct 2026 10:15:00 +0000 (UTC)"),
            Some(Utc.with_ymd_and_hms(2026, 10, 19, 10, 15, 0).unwrap())
        );
    }

    #[test]
    fn header_garbage_is_none() {
        assert_eq!(parse_header_date("sometime last week"), None);
        assert_eq!(parse_header_date(""), None);
    }

    // ── Arrival dates ───────────────────────────────────────────

    #[test]
    fn weekday_month_day() {
        assert_eq!(
            parse_arrival_date("Friday, October 23", reference()),
            Some(day(2026, 10, 23))
        );
    }

    #[test]
    fn month_day_year() {
        assert_eq!(
            parse_arrival_date("October 23, 2026", reference()),
            Some(day(2026, 10, 23))
        );
    }

    #[test]
    fn abbreviated_month_with_ordinal() {
        assert_eq!(
            parse_arrival_date("Oct. 23rd", reference()),
            Some(day(2026, 10, 23))
        );
        assert_eq!(
            parse_arrival_date("Thu, Sept 3", reference()),
            Some(day(2026, 9, 3))
        );
    }

    #[test]
    fn leading_filler_word_is_ignored() {
        assert_eq!(
            parse_arrival_date("Thu, 10/22/2026", reference()),
            Some(day(2026, 10, 22))
        );
        assert_eq!(
            parse_arrival_date("between Oct 22", reference()),
            Some(day(2026, 10, 22))
        );
    }

    #[test]
    fn numeric_forms() {
        assert_eq!(
            parse_arrival_date("10/23/2026", reference()),
            Some(day(2026, 10, 23))
        );
        assert_eq!(
            parse_arrival_date("10/23/26", reference()),
            Some(day(2026, 10, 23))
        );
        assert_eq!(parse_arrival_date("10/23", reference()), Some(day(2026, 10, 23)));
        assert_eq!(
            parse_arrival_date("2026-10-23", reference()),
            Some(day(2026, 10, 23))
        );
    }

    #[test]
    fn relative_words() {
        assert_eq!(parse_arrival_date("today", reference()), Some(day(2026, 10, 19)));
        assert_eq!(
            parse_arrival_date("Tomorrow", reference()),
            Some(day(2026, 10, 20))
        );
    }

    #[test]
    fn year_rolls_over_at_new_year() {
        let december = Utc.with_ymd_and_hms(2026, 12, 28, 9, 0, 0).unwrap();
        assert_eq!(
            parse_arrival_date("January 3", december),
            Some(day(2027, 1, 3))
        );
    }

    #[test]
    fn recent_past_dates_keep_the_year() {
        assert_eq!(
            parse_arrival_date("October 12", reference()),
            Some(day(2026, 10, 12))
        );
    }

    #[test]
    fn malformed_dates_fail_soft() {
        assert_eq!(parse_arrival_date("February 30", reference()), None);
        assert_eq!(parse_arrival_date("13/45/2026", reference()), None);
        assert_eq!(parse_arrival_date("soon", reference()), None);
        assert_eq!(parse_arrival_date("", reference()), None);
        assert_eq!(parse_arrival_date("2026-99-99", reference()), None);
    }
}
