use std::iter::successors;
use thiserror::Error;
use time::{
    format_description::FormatItem, macros::format_description, Date, Duration, PrimitiveDateTime,
    Weekday,
};

/// Number of weeks the navigation cursor cycles through before rolling over
/// into the next (or previous) year
pub(crate) const WEEKS_PER_YEAR: i32 = 52;

/// Number of days shown per week: Monday through Friday
pub(crate) const WORKDAYS: usize = 5;

static YMD_FMT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Returns the week number containing `now`, counted as the number of started
/// seven-day spans since midnight on January 1 of `now`'s year.
///
/// This is deliberately not ISO-8601 week numbering: week 1 is whatever part
/// of a week January 1 falls in, the very first instant of the year is week
/// 0, and late December can be week 53.  Stored status entries refer to weeks
/// by this numbering, so it must not change.
pub(crate) fn current_week_number(now: PrimitiveDateTime) -> i32 {
    let jan1 = Date::from_ordinal_date(now.year(), 1)
        .expect("January 1 should exist in every representable year")
        .midnight();
    let elapsed = now - jan1;
    let whole = elapsed.whole_weeks();
    let weeks = if elapsed > Duration::weeks(whole) {
        whole + 1
    } else {
        whole
    };
    i32::try_from(weeks).expect("number of weeks within a year should fit in an i32")
}

/// Returns the Monday through Friday of week `week` of `year`.
///
/// The week is located by stepping `week - 1` whole weeks from January 1 and
/// then moving to the Monday of that calendar week, where a Sunday belongs to
/// the week of the *preceding* Monday.  `week` is not range-checked; weeks
/// before 1 or past the end of the year land in the adjacent years.
pub(crate) fn week_dates(year: i32, week: i32) -> Result<[Date; WORKDAYS], OutOfTimeError> {
    let jan1 = Date::from_ordinal_date(year, 1).map_err(|_| OutOfTimeError)?;
    let start = jan1
        .checked_add(Duration::weeks(i64::from(week) - 1))
        .ok_or(OutOfTimeError)?;
    let monday_offset = match start.weekday() {
        Weekday::Sunday => -6,
        wd => 1 - i64::from(wd.number_days_from_sunday()),
    };
    let monday = start
        .checked_add(Duration::days(monday_offset))
        .ok_or(OutOfTimeError)?;
    let mut days = successors(Some(monday), |d| d.next_day());
    let mut dates = [monday; WORKDAYS];
    for slot in &mut dates {
        *slot = days.next().ok_or(OutOfTimeError)?;
    }
    Ok(dates)
}

/// The year & week currently selected for display
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct WeekCursor {
    year: i32,
    week: i32,
}

impl WeekCursor {
    pub(crate) fn new(year: i32, week: i32) -> WeekCursor {
        WeekCursor { year, week }
    }

    pub(crate) fn today(now: PrimitiveDateTime) -> WeekCursor {
        WeekCursor::new(now.year(), current_week_number(now))
    }

    pub(crate) fn year(&self) -> i32 {
        self.year
    }

    pub(crate) fn week(&self) -> i32 {
        self.week
    }

    // Rolls over at a fixed 52 weeks even though `current_week_number()` can
    // produce week 53.
    pub(crate) fn prev(&mut self) {
        self.week -= 1;
        if self.week < 1 {
            self.week = WEEKS_PER_YEAR;
            self.year = self.year.saturating_sub(1);
        }
    }

    pub(crate) fn next(&mut self) {
        self.week += 1;
        if self.week > WEEKS_PER_YEAR {
            self.week = 1;
            self.year = self.year.saturating_add(1);
        }
    }

    pub(crate) fn dates(&self) -> Result<[Date; WORKDAYS], OutOfTimeError> {
        week_dates(self.year, self.week)
    }

    /// Returns the header text for this week, e.g. `Week 10, 2024 (2024-03-04
    /// - 2024-03-08)`
    pub(crate) fn label(&self) -> String {
        match self.dates() {
            Ok([monday, .., friday]) => format!(
                "Week {}, {} ({} - {})",
                self.week,
                self.year,
                show_date(monday),
                show_date(friday)
            ),
            Err(_) => format!("Week {}, {}", self.week, self.year),
        }
    }
}

fn show_date(date: Date) -> String {
    date.format(&YMD_FMT).unwrap_or_else(|_| String::from("????-??-??"))
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("reached the end of time")]
pub(crate) struct OutOfTimeError;
