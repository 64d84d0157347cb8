use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Where a team member is working on a given day
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) enum Status {
    #[default]
    Office,
    WorkFromHome,
    Leave,
}

impl Status {
    /// The order in which a cell steps through statuses when activated
    #[cfg(test)]
    pub(crate) const CYCLE: [Status; 3] = [Status::Office, Status::WorkFromHome, Status::Leave];

    pub(crate) fn next(self) -> Status {
        match self {
            Status::Office => Status::WorkFromHome,
            Status::WorkFromHome => Status::Leave,
            Status::Leave => Status::Office,
        }
    }

    /// The value used for this status in persisted snapshots
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Status::Office => "office",
            Status::WorkFromHome => "wfh",
            Status::Leave => "leave",
        }
    }

    /// The text shown for this status in a grid cell
    pub(crate) fn label(self) -> &'static str {
        match self {
            Status::Office => "Office",
            Status::WorkFromHome => "WFH",
            Status::Leave => "Leave",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Status, UnknownStatus> {
        match s {
            "office" => Ok(Status::Office),
            "wfh" => Ok(Status::WorkFromHome),
            "leave" => Ok(Status::Leave),
            _ => Err(UnknownStatus(s.to_owned())),
        }
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("unknown status {0:?}; expected \"office\", \"wfh\", or \"leave\"")]
pub(crate) struct UnknownStatus(pub(crate) String);

/// One of the five days shown for each week
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) enum Workday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Workday {
    pub(crate) const ALL: [Workday; 5] = [
        Workday::Monday,
        Workday::Tuesday,
        Workday::Wednesday,
        Workday::Thursday,
        Workday::Friday,
    ];

    pub(crate) fn from_index(i: usize) -> Option<Workday> {
        Workday::ALL.get(i).copied()
    }

    /// Returns the day's position in the week, counting Monday as 0
    pub(crate) fn index(self) -> usize {
        match self {
            Workday::Monday => 0,
            Workday::Tuesday => 1,
            Workday::Wednesday => 2,
            Workday::Thursday => 3,
            Workday::Friday => 4,
        }
    }

    pub(crate) fn short_name(self) -> &'static str {
        match self {
            Workday::Monday => "Mon",
            Workday::Tuesday => "Tue",
            Workday::Wednesday => "Wed",
            Workday::Thursday => "Thu",
            Workday::Friday => "Fri",
        }
    }
}

/// Identifies a single cell of the board: one member on one day of one week
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct StatusKey {
    pub(crate) member: String,
    pub(crate) year: i32,
    pub(crate) week: i32,
    pub(crate) day: Workday,
}

impl StatusKey {
    pub(crate) fn new<S: Into<String>>(member: S, year: i32, week: i32, day: Workday) -> StatusKey {
        StatusKey {
            member: member.into(),
            year,
            week,
            day,
        }
    }

    /// Renders the key in the `{member}_{year}_{week}_{day}` form used by
    /// persisted snapshots
    pub(crate) fn to_wire(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.member,
            self.year,
            self.week,
            self.day.index()
        )
    }

    /// Parses a key in the `{member}_{year}_{week}_{day}` form.
    ///
    /// The three numeric fields are split off from the right, so member
    /// names containing underscores still decode to the key they were
    /// written from.
    pub(crate) fn from_wire(s: &str) -> Option<StatusKey> {
        let mut fields = s.rsplitn(4, '_');
        let day = parse_field::<usize>(fields.next()?)?;
        let week = parse_field::<i32>(fields.next()?)?;
        let year = parse_field::<i32>(fields.next()?)?;
        let member = fields.next().filter(|m| !m.is_empty())?;
        Some(StatusKey::new(member, year, week, Workday::from_index(day)?))
    }
}

// `parse()` accepts a leading `+`, which `to_wire()` never writes
fn parse_field<T: FromStr>(field: &str) -> Option<T> {
    if field.starts_with('+') {
        None
    } else {
        field.parse().ok()
    }
}
