use crate::activity::{Activity, ActivityTable};
use chrono::{NaiveDate, TimeDelta};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// An activity with its derived dates. `end_date` is exclusive: it is
/// `start_date + duration_days`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledActivity {
    pub activity: Activity,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ScheduledActivity {
    pub fn name(&self) -> &str {
        &self.activity.name
    }

    pub fn duration_days(&self) -> i64 {
        self.activity.duration_days
    }
}

/// Output row consumed by presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub name: String,
    pub duration: i64,
    pub predecessors: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GanttRow {
    pub task: String,
    pub start: String,
    pub end: String,
    pub duration: i64,
    pub predecessors: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_duration_days: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub activity_count: usize,
}

impl ScheduleSummary {
    pub fn to_cli_summary(&self) -> String {
        format!(
            "activities={}, start={}, finish={}, duration={}d",
            self.activity_count, self.start_date, self.end_date, self.total_duration_days
        )
    }
}

/// Dated schedule: a pure function of an activity table and a start date.
/// Never edited in place; re-derive it through the forward pass instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    project_start: NaiveDate,
    activities: Vec<ScheduledActivity>,
}

impl Schedule {
    pub(crate) fn from_parts(project_start: NaiveDate, activities: Vec<ScheduledActivity>) -> Self {
        Self {
            project_start,
            activities,
        }
    }

    pub fn project_start_date(&self) -> NaiveDate {
        self.project_start
    }

    pub fn activities(&self) -> &[ScheduledActivity] {
        &self.activities
    }

    pub fn find(&self, name: &str) -> Option<&ScheduledActivity> {
        self.activities.iter().find(|a| a.activity.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    /// Latest end date, or the project start for an empty schedule.
    pub fn project_end_date(&self) -> NaiveDate {
        self.activities
            .iter()
            .map(|a| a.end_date)
            .max()
            .unwrap_or(self.project_start)
    }

    pub fn total_duration_days(&self) -> i64 {
        (self.project_end_date() - self.project_start).num_days()
    }

    /// The undated table this schedule was derived from.
    pub fn activity_table(&self) -> ActivityTable {
        self.activities.iter().map(|a| a.activity.clone()).collect()
    }

    pub fn summary(&self) -> ScheduleSummary {
        ScheduleSummary {
            total_duration_days: self.total_duration_days(),
            start_date: self.project_start,
            end_date: self.project_end_date(),
            activity_count: self.activities.len(),
        }
    }

    pub fn records(&self) -> Vec<ActivityRecord> {
        self.activities
            .iter()
            .map(|a| ActivityRecord {
                name: a.activity.name.clone(),
                duration: a.activity.duration_days,
                predecessors: a.activity.predecessors_joined(),
                start_date: a.start_date,
                end_date: a.end_date,
            })
            .collect()
    }

    pub fn gantt_rows(&self) -> Vec<GanttRow> {
        self.activities
            .iter()
            .map(|a| GanttRow {
                task: a.activity.name.clone(),
                start: a.start_date.format("%Y-%m-%d").to_string(),
                end: a.end_date.format("%Y-%m-%d").to_string(),
                duration: a.activity.duration_days,
                predecessors: a.activity.predecessors_joined(),
            })
            .collect()
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let names: Vec<&str> = self.activities.iter().map(|a| a.name()).collect();
        let durations: Vec<i64> = self.activities.iter().map(|a| a.duration_days()).collect();
        let predecessors: Vec<String> = self
            .activities
            .iter()
            .map(|a| a.activity.predecessors_joined())
            .collect();
        let predecessors: Vec<&str> = predecessors.iter().map(String::as_str).collect();
        let starts = self
            .activities
            .iter()
            .map(|a| date_to_i32(a.start_date))
            .collect::<PolarsResult<Vec<i32>>>()?;
        let finishes = self
            .activities
            .iter()
            .map(|a| date_to_i32(a.end_date))
            .collect::<PolarsResult<Vec<i32>>>()?;

        let columns = vec![
            Series::new(PlSmallStr::from_static("name"), names).into_column(),
            Series::new(PlSmallStr::from_static("duration_days"), durations).into_column(),
            Series::new(PlSmallStr::from_static("predecessors"), predecessors).into_column(),
            Series::new(PlSmallStr::from_static("start_date"), starts)
                .cast(&DataType::Date)?
                .into_column(),
            Series::new(PlSmallStr::from_static("end_date"), finishes)
                .cast(&DataType::Date)?
                .into_column(),
        ];
        DataFrame::new(columns)
    }
}

/// `None` when the result falls outside the representable calendar.
pub(crate) fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    TimeDelta::try_days(days).and_then(|delta| date.checked_add_signed(delta))
}

/// Polars stores dates as days since the unix epoch.
fn date_to_i32(date: NaiveDate) -> PolarsResult<i32> {
    let days = (date - chrono::DateTime::UNIX_EPOCH.date_naive()).num_days();
    i32::try_from(days).map_err(|_| {
        PolarsError::ComputeError(format!("date {date} is outside the frame date range").into())
    })
}
