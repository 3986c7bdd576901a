use crate::activity::ActivityTable;
use crate::config::PassOrder;
use crate::error::{ScheduleError, ScheduleResult};
use crate::graph::ActivityDag;
use crate::schedule::{Schedule, ScheduledActivity, add_days};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;

pub struct ForwardPass<'a> {
    table: &'a ActivityTable,
    order: PassOrder,
}

impl<'a> ForwardPass<'a> {
    pub fn new(table: &'a ActivityTable, order: PassOrder) -> Self {
        Self { table, order }
    }

    pub fn execute(&self, project_start: NaiveDate) -> ScheduleResult<Schedule> {
        let rows: Vec<usize> = match self.order {
            PassOrder::TableOrder => (0..self.table.len()).collect(),
            PassOrder::Topological => {
                self.table.validate()?;
                ActivityDag::build(self.table).resolution_order(self.table)?
            }
        };

        let activities = self.table.activities();
        let mut finishes: HashMap<&str, NaiveDate> = HashMap::with_capacity(rows.len());
        let mut dates: Vec<Option<(NaiveDate, NaiveDate)>> = vec![None; activities.len()];

        for row in rows {
            let activity = &activities[row];
            // Start is the latest finish among predecessors resolved so far
            let early_start = activity
                .named_predecessors()
                .filter_map(|pred| finishes.get(pred).copied())
                .max()
                .unwrap_or(project_start);
            let early_finish = add_days(early_start, activity.duration_days).ok_or_else(|| {
                ScheduleError::InvalidDuration {
                    name: activity.name.clone(),
                    duration: activity.duration_days,
                }
            })?;

            finishes.insert(activity.name.trim(), early_finish);
            dates[row] = Some((early_start, early_finish));
        }

        let scheduled: Vec<ScheduledActivity> = activities
            .iter()
            .zip(dates)
            .map(|(activity, span)| {
                let (start_date, end_date) = span.unwrap_or((project_start, project_start));
                ScheduledActivity {
                    activity: activity.clone(),
                    start_date,
                    end_date,
                }
            })
            .collect();

        let schedule = Schedule::from_parts(project_start, scheduled);
        debug!(
            activities = schedule.len(),
            total_days = schedule.total_duration_days(),
            order = ?self.order,
            "forward pass complete"
        );
        Ok(schedule)
    }
}
