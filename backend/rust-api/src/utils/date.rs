//! Calendar-day boundaries. Events are filtered against local midnight, but
//! every instant handed to the rest of the crate is UTC.

use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeZone, Utc};

/// Wire format of the feed's `timings[gte]` filter.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// `[today, tomorrow)` for the calendar day containing some instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayWindow {
    pub today: DateTime<Utc>,
    pub tomorrow: DateTime<Utc>,
}

impl DayWindow {
    /// The day containing `now`, with midnight taken in `now`'s own time zone.
    pub fn containing<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let date = now.date_naive();
        let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
        Self {
            today: midnight(&tz, date),
            tomorrow: midnight(&tz, next),
        }
    }

    /// The current day in the server's local time zone.
    pub fn local_today() -> Self {
        Self::containing(&Local::now())
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.today && instant < self.tomorrow
    }
}

/// First instant of `date` in `tz`; on a DST gap, the earliest valid instant.
fn midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// Format a day as `YYYY-MM-DD`.
pub fn format_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    instant.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn paris() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    #[test]
    fn window_uses_local_midnight() {
        let now = paris().with_ymd_and_hms(2026, 6, 15, 1, 30, 0).unwrap();
        let window = DayWindow::containing(&now);
        assert_eq!(window.today, Utc.with_ymd_and_hms(2026, 6, 14, 22, 0, 0).unwrap());
        assert_eq!(window.tomorrow, window.today + Duration::days(1));
    }

    #[test]
    fn contains_is_half_open() {
        let now = Utc.with_ymd_and_hms(2026, 6, 15, 9, 0, 0).unwrap();
        let window = DayWindow::containing(&now);
        assert!(window.contains(window.today));
        assert!(!window.contains(window.tomorrow));
        assert!(!window.contains(window.today - Duration::seconds(1)));
    }

    #[test]
    fn format_day_is_iso_date() {
        let now = paris().with_ymd_and_hms(2026, 1, 5, 23, 59, 0).unwrap();
        assert_eq!(format_day(&now), "2026-01-05");
    }
}
