//! Plan entity - 投放计划
//!
//! A dated campaign that plays groups inside daily time windows on a set of
//! cabinets. Windows never wrap past midnight.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entity::cabinet::CabinetSet;
use crate::error::DraftError;

/// Wall-clock time with minute resolution
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, DraftError> {
        if hour > 23 || minute > 59 {
            return Err(DraftError::InvalidClock { hour, minute });
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    /// Minutes since midnight
    pub fn total_minutes(self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hour, minute) = s
            .split_once(':')
            .ok_or_else(|| format!("expected HH:MM, got '{s}'"))?;
        let hour = hour
            .trim()
            .parse::<u8>()
            .map_err(|e| format!("invalid hour in '{s}': {e}"))?;
        let minute = minute
            .trim()
            .parse::<u8>()
            .map_err(|e| format!("invalid minute in '{s}': {e}"))?;
        TimeOfDay::new(hour, minute).map_err(|e| e.to_string())
    }
}

/// Daily window `[start, end)`, `start` strictly before `end`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    start: TimeOfDay,
    end: TimeOfDay,
}

impl TimeWindow {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self, DraftError> {
        if start.total_minutes() >= end.total_minutes() {
            return Err(DraftError::EndNotAfterStart);
        }
        Ok(Self { start, end })
    }

    pub fn start(self) -> TimeOfDay {
        self.start
    }

    pub fn end(self) -> TimeOfDay {
        self.end
    }

    pub fn minutes(self) -> u16 {
        self.end.total_minutes() - self.start.total_minutes()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// One group bound to one daily window
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanScheduleDetail {
    pub start_hour: u8,
    pub start_minute: u8,
    pub end_hour: u8,
    pub end_minute: u8,
    pub group_id: i64,

    /// Display-only, filled in by read endpoints
    #[serde(default, skip_serializing)]
    pub group_name: Option<String>,
}

impl PlanScheduleDetail {
    pub fn new(group_id: i64, window: TimeWindow) -> Self {
        Self {
            start_hour: window.start.hour,
            start_minute: window.start.minute,
            end_hour: window.end.hour,
            end_minute: window.end.minute,
            group_id,
            group_name: None,
        }
    }

    pub fn start_total(&self) -> u16 {
        u16::from(self.start_hour) * 60 + u16::from(self.start_minute)
    }

    pub fn end_total(&self) -> u16 {
        u16::from(self.end_hour) * 60 + u16::from(self.end_minute)
    }

    /// Typed window, checked; server data is not trusted blindly
    pub fn window(&self) -> Result<TimeWindow, DraftError> {
        TimeWindow::new(
            TimeOfDay::new(self.start_hour, self.start_minute)?,
            TimeOfDay::new(self.end_hour, self.end_minute)?,
        )
    }
}

/// Plan row as returned by the list endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub id: i64,
    pub plan_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub equipment_group: CabinetSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Plan loaded for editing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDetail {
    pub id: i64,
    pub plan_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub equipment_group: CabinetSet,
    #[serde(default)]
    pub details: Vec<PlanScheduleDetail>,
}

/// Body for both create and update
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPlanRequest {
    pub plan_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub equipment_group: CabinetSet,
    pub details: Vec<PlanScheduleDetail>,
}
