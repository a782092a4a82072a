use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
pub enum Status {
    Present,
    Absent,
    Leave,
    #[serde(rename = "Half-day")]
    #[strum(serialize = "Half-day")]
    HalfDay,
}

/// One employee's attendance for one office-day.
///
/// Field names follow the persisted document (`Employee_Name`, `Status`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "Employee_Name": "Ramesh Kumar",
    "Status": "Present",
    "In_Time": "09:15",
    "Remarks": ""
}))]
pub struct AttendanceRecord {
    #[serde(rename = "Employee_Name")]
    pub employee_name: String,
    #[serde(rename = "Status")]
    pub status: Status,
    /// "HH:MM" (24-hour), empty unless the employee is present
    #[serde(rename = "In_Time", default)]
    pub in_time: String,
    #[serde(rename = "Remarks", default)]
    pub remarks: String,
}

#[cfg(test)]
impl AttendanceRecord {
    pub fn new(employee_name: impl Into<String>, status: Status, in_time: impl Into<String>) -> Self {
        Self {
            employee_name: employee_name.into(),
            status,
            in_time: in_time.into(),
            remarks: String::new(),
        }
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }
}

/// A record tagged with the office and date it was stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceEntry {
    #[serde(rename = "Date")]
    #[schema(example = "2024-01-10")]
    pub date: String,
    #[serde(rename = "Office")]
    #[schema(example = "Hyderabad")]
    pub office: String,
    #[serde(flatten)]
    pub record: AttendanceRecord,
}

/// Per-status counts over a set of records.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AttendanceSummary {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub leave: usize,
    pub half_day: usize,
}

impl AttendanceSummary {
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a AttendanceRecord>) -> Self {
        records
            .into_iter()
            .fold(Self::default(), |mut summary, record| {
                summary.total += 1;
                match record.status {
                    Status::Present => summary.present += 1,
                    Status::Absent => summary.absent += 1,
                    Status::Leave => summary.leave += 1,
                    Status::HalfDay => summary.half_day += 1,
                }
                summary
            })
    }
}

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Matches a stored date key. Keys that are not valid dates never match.
    pub fn matches_key(&self, date_key: &str) -> bool {
        parse_date(date_key).is_ok_and(|date| self.contains(date))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid month '{s}'. Use YYYY-MM");
        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }
        if !bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let year = s[..4].parse().map_err(|_| invalid())?;
        let month = s[5..].parse().map_err(|_| invalid())?;
        Month::new(year, month).ok_or_else(invalid)
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| format!("Invalid date '{value}'. Use YYYY-MM-DD"))
}

pub fn parse_in_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|_| format!("Invalid time '{value}'. Use HH:MM (24-hour)"))
}
