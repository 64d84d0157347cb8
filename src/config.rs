use crate::week::{WeekCursor, WEEKS_PER_YEAR};
use lexopt::{Arg, Parser, ValueExt};
use std::ffi::OsString;
use std::path::PathBuf;

pub(crate) static USAGE: &str = "\
Usage: teamweek [options]

Terminal weekly status board: who is in the office, working from home, or on leave

Options:
  -d, --data FILE       Keep the board in FILE [env: TEAMWEEK_DATA]
                        [default: teamweek.json]
  -r, --remote URL      Share the board through the realtime database at URL
                        [env: TEAMWEEK_REMOTE_URL]
      --log-file FILE   Write logs to FILE [env: TEAMWEEK_LOG]
  -y, --year YEAR       Start out showing a week of YEAR
  -w, --week WEEK       Start out showing week number WEEK
  -h, --help            Display this help message and exit
  -V, --version         Show the program version and exit";

const DATA_ENV: &str = "TEAMWEEK_DATA";
const REMOTE_ENV: &str = "TEAMWEEK_REMOTE_URL";
const LOG_ENV: &str = "TEAMWEEK_LOG";
const DEFAULT_DATA_FILE: &str = "teamweek.json";

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Command {
    Run(Config),
    Help,
    Version,
}

impl Command {
    /// Parses the command line, falling back to the environment variables
    /// looked up with `env` for options not given as arguments
    pub(crate) fn from_parser<F>(mut parser: Parser, env: F) -> Result<Command, lexopt::Error>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let mut data_file = None;
        let mut remote_url = None;
        let mut log_file = None;
        let mut year = None;
        let mut week = None;
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('d') | Arg::Long("data") => {
                    data_file = Some(PathBuf::from(parser.value()?));
                }
                Arg::Short('r') | Arg::Long("remote") => {
                    remote_url = Some(parser.value()?.string()?);
                }
                Arg::Long("log-file") => log_file = Some(PathBuf::from(parser.value()?)),
                Arg::Short('y') | Arg::Long("year") => year = Some(parser.value()?.parse()?),
                Arg::Short('w') | Arg::Long("week") => {
                    let w = parser.value()?.parse::<i32>()?;
                    if !(1..=WEEKS_PER_YEAR + 1).contains(&w) {
                        return Err(format!(
                            "week must be between 1 and {}, got {w}",
                            WEEKS_PER_YEAR + 1
                        )
                        .into());
                    }
                    week = Some(w);
                }
                _ => return Err(arg.unexpected()),
            }
        }
        let lookup = |key: &str| env(key).filter(|v| !v.is_empty());
        let remote_url = match remote_url {
            Some(url) => Some(url),
            None => lookup(REMOTE_ENV).map(OsString::string).transpose()?,
        };
        Ok(Command::Run(Config {
            data_file: data_file
                .or_else(|| lookup(DATA_ENV).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE)),
            remote_url: remote_url.filter(|url| !url.is_empty()),
            log_file: log_file.or_else(|| lookup(LOG_ENV).map(PathBuf::from)),
            year,
            week,
        }))
    }
}

/// Settings for an interactive session
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Config {
    pub(crate) data_file: PathBuf,
    pub(crate) remote_url: Option<String>,
    pub(crate) log_file: Option<PathBuf>,
    pub(crate) year: Option<i32>,
    pub(crate) week: Option<i32>,
}

impl Config {
    /// Returns the week to start on if `--year` or `--week` was given,
    /// filling in the other from `this_week`
    pub(crate) fn start_week(&self, this_week: WeekCursor) -> Option<WeekCursor> {
        if self.year.is_none() && self.week.is_none() {
            return None;
        }
        Some(WeekCursor::new(
            self.year.unwrap_or(this_week.year()),
            self.week.unwrap_or(this_week.week()),
        ))
    }
}
