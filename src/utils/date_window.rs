use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// Business-day clock used for generated attendance.
///
/// A leave instant belongs to the calendar day it falls on after shifting by
/// `offset_minutes`; generated clock-in/out stamps sit at fixed UTC times on that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceClock {
    pub offset_minutes: i32,
    pub clock_in: NaiveTime,
    pub clock_out: NaiveTime,
}

impl AttendanceClock {
    /// `None` when shifting by the offset leaves chrono's date range.
    pub fn local_day(&self, instant: DateTime<Utc>) -> Option<NaiveDate> {
        instant
            .checked_add_signed(Duration::minutes(i64::from(self.offset_minutes)))
            .map(|local| local.date_naive())
    }

    /// Clock-in and clock-out instants for `day`.
    pub fn shift(&self, day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            day.and_time(self.clock_in).and_utc(),
            day.and_time(self.clock_out).and_utc(),
        )
    }

    /// Local days from `start` to `end`, both inclusive.
    pub fn window(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<DayWindow> {
        Some(DayWindow {
            first: self.local_day(start)?,
            last: self.local_day(end)?,
        })
    }
}

/// Inclusive range of local days. Empty when `last` is before `first`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DayWindow {
    /// Number of days, computed without walking the range.
    pub fn len(&self) -> usize {
        let span = self.last.signed_duration_since(self.first).num_days();
        usize::try_from(span + 1).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.first.iter_days().take_while(|day| *day <= self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn clock() -> AttendanceClock {
        AttendanceClock {
            offset_minutes: 7 * 60,
            clock_in: NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
            clock_out: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn days(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<NaiveDate> {
        clock().window(start, end).unwrap().days().collect()
    }

    #[test]
    fn three_day_window() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();

        let days = days(start, end);
        assert_eq!(days, vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]);

        let (clock_in, clock_out) = clock().shift(days[1]);
        assert_eq!(clock_in, Utc.with_ymd_and_hms(2024, 1, 2, 2, 0, 0).unwrap());
        assert_eq!(clock_out, Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap());
    }

    #[test]
    fn offset_moves_late_utc_instants_to_next_day() {
        // 17:00Z is midnight at +07:00
        let instant = Utc.with_ymd_and_hms(2024, 1, 31, 17, 0, 0).unwrap();
        assert_eq!(clock().local_day(instant), Some(date(2024, 2, 1)));

        let just_before = Utc.with_ymd_and_hms(2024, 1, 31, 16, 59, 59).unwrap();
        assert_eq!(clock().local_day(just_before), Some(date(2024, 1, 31)));
    }

    #[test]
    fn window_crosses_month_and_leap_day() {
        let start = Utc.with_ymd_and_hms(2024, 2, 28, 3, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 1, 3, 0, 0).unwrap();
        assert_eq!(
            days(start, end),
            vec![date(2024, 2, 28), date(2024, 2, 29), date(2024, 3, 1)]
        );
    }

    #[test]
    fn reversed_window_is_empty() {
        let start = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        assert!(days(start, end).is_empty());

        let window = clock().window(start, end).unwrap();
        assert_eq!(window.len(), 0);
        assert!(window.is_empty());
    }

    #[test]
    fn length_is_computed_without_iterating() {
        let start = Utc.with_ymd_and_hms(1000, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(3000, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(clock().window(start, end).unwrap().len(), 730_486);
    }

    #[test]
    fn instants_at_the_edge_of_the_calendar_have_no_local_day() {
        assert_eq!(clock().local_day(DateTime::<Utc>::MAX_UTC), None);
        assert!(clock().window(DateTime::<Utc>::MAX_UTC, DateTime::<Utc>::MAX_UTC).is_none());

        let west = AttendanceClock {
            offset_minutes: -60,
            ..clock()
        };
        assert_eq!(west.local_day(DateTime::<Utc>::MIN_UTC), None);
    }

    #[test]
    fn single_day_window() {
        let start = Utc.with_ymd_and_hms(2024, 6, 10, 1, 0, 0).unwrap();
        assert_eq!(days(start, start), vec![date(2024, 6, 10)]);
    }
}
