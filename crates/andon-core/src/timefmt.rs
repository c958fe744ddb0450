use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

/// Placeholder the ticket service stores before a field has ever been set.
pub const ZERO_TIMESTAMP: &str = "0000-00-00 00:00:00";

/// Wire format for every timestamp field exchanged with the service.
pub const WIRE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DISPLAY_FORMAT: &str = "%d %b %Y %H:%M";

/// Render a service timestamp for display. The zero placeholder (and an
/// empty field) become "-"; anything else that fails to parse is shown
/// verbatim rather than dropped.
pub fn format_timestamp(raw: &str) -> String {
    if raw.is_empty() || raw == ZERO_TIMESTAMP {
        return "-".to_string();
    }
    match NaiveDateTime::parse_from_str(raw, WIRE_FORMAT) {
        Ok(dt) => dt.format(DISPLAY_FORMAT).to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Current time in the service wire format, captured once at call time.
pub fn now_stamp(now: DateTime<Utc>) -> String {
    now.format(WIRE_FORMAT).to_string()
}

/// Default filter window: first day of the current month through the last
/// day of the following month.
pub fn default_date_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today.with_day(1).unwrap_or(today);
    let (year, month) = if today.month() >= 11 {
        (today.year() + 1, today.month() - 10)
    } else {
        (today.year(), today.month() + 2)
    };
    let end = NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(today);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_zero_timestamp_renders_dash() {
        assert_eq!(format_timestamp(ZERO_TIMESTAMP), "-");
        assert_eq!(format_timestamp(""), "-");
    }

    #[test]
    fn test_valid_timestamp_formats() {
        assert_eq!(format_timestamp("2026-08-02 07:15:00"), "02 Aug 2026 07:15");
    }

    #[test]
    fn test_unparseable_timestamp_passes_through() {
        assert_eq!(format_timestamp("not a date"), "not a date");
        assert_eq!(format_timestamp("2026-08-02"), "2026-08-02");
    }

    #[test]
    fn test_now_stamp_wire_shape() {
        let now = Utc.with_ymd_and_hms(2026, 8, 21, 9, 5, 3).unwrap();
        assert_eq!(now_stamp(now), "2026-08-21 09:05:03");
    }

    #[test]
    fn test_default_range_mid_year() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 21).unwrap();
        let (start, end) = default_date_range(today);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 9, 30).unwrap());
    }

    #[test]
    fn test_default_range_november_crosses_year() {
        let today = NaiveDate::from_ymd_opt(2026, 11, 5).unwrap();
        let (start, end) = default_date_range(today);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 11, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    }

    #[test]
    fn test_default_range_december_crosses_year() {
        let today = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        let (start, end) = default_date_range(today);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2027, 1, 31).unwrap());
    }

    #[test]
    fn test_default_range_ends_on_leap_day() {
        let today = NaiveDate::from_ymd_opt(2028, 1, 15).unwrap();
        let (start, end) = default_date_range(today);
        assert_eq!(start, NaiveDate::from_ymd_opt(2028, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2028, 2, 29).unwrap());
    }
}
