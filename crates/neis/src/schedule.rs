// ABOUTME: School-schedule rows and month-range helpers.
// ABOUTME: Maps SchoolSchedule rows (AA_YMD, EVENT_NM) to dated events.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::NeisError;

/// One academic-calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub date: NaiveDate,
    pub name: String,
}

impl ScheduleEvent {
    /// Maps one `SchoolSchedule` row.
    pub(crate) fn from_row(row: &serde_json::Value) -> Result<Self, NeisError> {
        let date_raw = row
            .get("AA_YMD")
            .and_then(|v| v.as_str())
            .ok_or_else(|| NeisError::envelope("row missing AA_YMD"))?;
        let date = NaiveDate::parse_from_str(date_raw, "%Y%m%d")
            .map_err(|e| NeisError::envelope(format!("bad AA_YMD {}: {}", date_raw, e)))?;

        let name = row
            .get("EVENT_NM")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(ScheduleEvent { date, name })
    }
}

/// First and last day of a calendar month.
pub fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next_month.pred_opt()?))
}
