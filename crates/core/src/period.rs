//! Calendar months and the time windows derived from them.
//!
//! The ledger is always asked about one calendar month. A `Period` resolves
//! to real month bounds (month length and leap years included), and splits
//! the timeline into three non-overlapping windows: strictly before the
//! month, within it, and strictly after it.

use core::str::FromStr;

use chrono::NaiveDate;

use crate::error::DomainError;

/// One calendar month (year + month).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Construct a period, rejecting impossible months.
    pub fn new(year: i32, month: u32) -> Result<Self, DomainError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(DomainError::validation(format!(
                "no such calendar month: {year:04}-{month:02}"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First calendar day of the month.
    pub fn first_day(&self) -> NaiveDate {
        // Validated at construction.
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("period was validated at construction")
    }

    /// Last calendar day of the month.
    ///
    /// Derived as the day before the following month starts, so month
    /// lengths and leap years fall out of the calendar itself.
    pub fn last_day(&self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .expect("first day of a month has a predecessor")
    }

    /// The following calendar month.
    pub fn next(&self) -> Period {
        if self.month == 12 {
            Period {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Period {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Window covering everything strictly before this month.
    pub fn preceding_window(&self) -> TimeWindow {
        TimeWindow {
            from: None,
            until: Some(self.first_day()),
        }
    }

    /// Window covering exactly this month.
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            from: Some(self.first_day()),
            until: Some(self.next().first_day()),
        }
    }

    /// Window covering everything strictly after this month.
    pub fn following_window(&self) -> TimeWindow {
        TimeWindow {
            from: Some(self.next().first_day()),
            until: None,
        }
    }
}

impl FromStr for Period {
    type Err = DomainError;

    /// Parse the wire form `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DomainError::validation(format!("period must be YYYY-MM, got '{s}'"));

        let (year, month) = s.split_once('-').ok_or_else(malformed)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(malformed());
        }
        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;

        Period::new(year, month)
    }
}

impl core::fmt::Display for Period {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Half-open day range: `from` inclusive, `until` exclusive, either side
/// unbounded when `None`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

impl TimeWindow {
    /// The unbounded window (all of history).
    pub fn unbounded() -> Self {
        Self {
            from: None,
            until: None,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(from) = self.from {
            if date < from {
                return false;
            }
        }
        if let Some(until) = self.until {
            if date >= until {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_wire_form() {
        let p: Period = "2024-02".parse().unwrap();
        assert_eq!((p.year(), p.month()), (2024, 2));
        assert_eq!(p.to_string(), "2024-02");
    }

    #[test]
    fn rejects_malformed_periods() {
        for s in ["2024", "2024-", "24-02", "2024-2", "2024-13", "2024-00", "abcd-ef", ""] {
            assert!(s.parse::<Period>().is_err(), "accepted '{s}'");
        }
    }

    #[test]
    fn last_day_tracks_month_length() {
        assert_eq!("2024-01".parse::<Period>().unwrap().last_day(), date(2024, 1, 31));
        assert_eq!("2024-04".parse::<Period>().unwrap().last_day(), date(2024, 4, 30));
        assert_eq!("2024-12".parse::<Period>().unwrap().last_day(), date(2024, 12, 31));
    }

    #[test]
    fn february_respects_leap_years() {
        assert_eq!("2024-02".parse::<Period>().unwrap().last_day(), date(2024, 2, 29));
        assert_eq!("2023-02".parse::<Period>().unwrap().last_day(), date(2023, 2, 28));
        assert_eq!("2100-02".parse::<Period>().unwrap().last_day(), date(2100, 2, 28));
        assert_eq!("2000-02".parse::<Period>().unwrap().last_day(), date(2000, 2, 29));
    }

    #[test]
    fn next_rolls_over_year_boundary() {
        let dec: Period = "2023-12".parse().unwrap();
        assert_eq!(dec.next(), "2024-01".parse().unwrap());
    }

    #[test]
    fn windows_partition_the_timeline() {
        let p: Period = "2024-02".parse().unwrap();
        let before = p.preceding_window();
        let within = p.window();
        let after = p.following_window();

        // Every interesting boundary day lands in exactly one window.
        for d in [
            date(2024, 1, 31),
            date(2024, 2, 1),
            date(2024, 2, 29),
            date(2024, 3, 1),
        ] {
            let hits = [before, within, after]
                .iter()
                .filter(|w| w.contains(d))
                .count();
            assert_eq!(hits, 1, "{d} hit {hits} windows");
        }

        assert!(before.contains(date(2024, 1, 31)));
        assert!(within.contains(date(2024, 2, 1)));
        assert!(within.contains(date(2024, 2, 29)));
        assert!(after.contains(date(2024, 3, 1)));
    }

    #[test]
    fn unbounded_window_contains_everything() {
        let w = TimeWindow::unbounded();
        assert!(w.contains(date(1970, 1, 1)));
        assert!(w.contains(date(2999, 12, 31)));
    }
}
