use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowUnit {
    Hours,
    Weeks,
}

impl FromStr for WindowUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hours" | "hour" | "h" => Ok(WindowUnit::Hours),
            "weeks" | "week" | "w" => Ok(WindowUnit::Weeks),
            other => Err(Error::InvalidWindow(format!("unknown unit {other:?}"))),
        }
    }
}

/// How far back to look for published videos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyWindow {
    unit: WindowUnit,
    amount: u32,
}

impl RecencyWindow {
    pub fn new(unit: WindowUnit, amount: u32) -> Result<Self, Error> {
        if amount == 0 {
            return Err(Error::InvalidWindow("amount must be positive".into()));
        }
        Ok(RecencyWindow { unit, amount })
    }

    /// Parses user input such as (`"weeks"`, `"2"`).
    ///
    /// The amount must be a positive integer; there is no fallback window.
    pub fn parse(unit: &str, amount: &str) -> Result<Self, Error> {
        let unit = unit.parse::<WindowUnit>()?;
        let amount = amount
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::InvalidWindow(format!("amount {amount:?} is not an integer")))?;
        let amount = u32::try_from(amount)
            .ok()
            .filter(|a| *a > 0)
            .ok_or_else(|| Error::InvalidWindow(format!("amount {amount} must be positive")))?;
        Self::new(unit, amount)
    }

    pub fn duration(&self) -> Duration {
        let amount = i64::from(self.amount);
        match self.unit {
            WindowUnit::Hours => Duration::hours(amount),
            WindowUnit::Weeks => Duration::weeks(amount),
        }
    }

    /// Earliest publish time still inside the window
    pub fn cutoff_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.duration())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl fmt::Display for RecencyWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match (self.unit, self.amount) {
            (WindowUnit::Hours, 1) => "hour",
            (WindowUnit::Hours, _) => "hours",
            (WindowUnit::Weeks, 1) => "week",
            (WindowUnit::Weeks, _) => "weeks",
        };
        write!(f, "{} {unit}", self.amount)
    }
}
