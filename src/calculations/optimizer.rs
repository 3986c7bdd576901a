use crate::activity::ActivityTable;
use crate::calculations::forward_pass::ForwardPass;
use crate::config::{OptimizerConfig, PassOrder};
use crate::error::ScheduleResult;
use crate::graph::ActivityDag;
use crate::schedule::Schedule;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub original_duration: i64,
    pub optimized_duration: i64,
    pub days_saved: i64,
    /// Zero when the original schedule had no duration.
    pub improvement_percentage: f64,
    pub reduced_activities: Vec<String>,
    pub applied_pairs: Vec<(String, String)>,
}

impl OptimizationReport {
    fn new(original_duration: i64, optimized_duration: i64) -> Self {
        let days_saved = original_duration - optimized_duration;
        let improvement_percentage = if original_duration > 0 {
            days_saved as f64 / original_duration as f64 * 100.0
        } else {
            0.0
        };
        Self {
            original_duration,
            optimized_duration,
            days_saved,
            improvement_percentage,
            reduced_activities: Vec::new(),
            applied_pairs: Vec::new(),
        }
    }

    pub fn to_cli_summary(&self) -> String {
        format!(
            "saved={}d ({:.1}%), duration {}d -> {}d",
            self.days_saved,
            self.improvement_percentage,
            self.original_duration,
            self.optimized_duration
        )
    }
}

#[derive(Debug, Clone)]
pub struct OptimizationOutcome {
    pub schedule: Schedule,
    pub report: OptimizationReport,
}

/// Deterministic schedule compression: shorten long activities, let
/// configured activity pairs share a predecessor, then re-run the forward pass.
pub struct Optimizer<'a> {
    config: &'a OptimizerConfig,
    order: PassOrder,
}

impl<'a> Optimizer<'a> {
    pub fn new(config: &'a OptimizerConfig, order: PassOrder) -> Self {
        Self { config, order }
    }

    pub fn optimize(&self, schedule: &Schedule) -> ScheduleResult<OptimizationOutcome> {
        let mut table = schedule.activity_table();

        let reduced_activities = self.shorten_long_activities(&mut table);
        if !reduced_activities.is_empty() {
            debug!(count = reduced_activities.len(), "shortened long activities");
        }

        let pairs = parallel_pairs(&table, self.config);
        let applied_pairs =
            self.apply_parallelization(&mut table, &pairs, schedule.project_start_date())?;
        if !applied_pairs.is_empty() {
            debug!(count = applied_pairs.len(), "rewired parallel activity pairs");
        }

        let optimized = ForwardPass::new(&table, self.order).execute(schedule.project_start_date())?;

        let mut report = OptimizationReport::new(
            schedule.total_duration_days(),
            optimized.total_duration_days(),
        );
        report.reduced_activities = reduced_activities;
        report.applied_pairs = applied_pairs;
        info!(
            saved_days = report.days_saved,
            improvement_pct = report.improvement_percentage,
            new_duration = report.optimized_duration,
            "optimization complete"
        );

        Ok(OptimizationOutcome {
            schedule: optimized,
            report,
        })
    }

    fn shorten_long_activities(&self, table: &mut ActivityTable) -> Vec<String> {
        let mut reduced = Vec::new();
        for activity in table.activities_mut() {
            if activity.duration_days > self.config.long_activity_threshold_days {
                let shortened =
                    (activity.duration_days as f64 * self.config.reduction_factor).round() as i64;
                activity.duration_days = shortened.max(1);
                reduced.push(activity.name.clone());
            }
        }
        reduced
    }

    /// Applies the pairs in order, so a later pair touching the same
    /// activity wins. A rewiring is kept only when the table still schedules
    /// and the project does not finish later.
    fn apply_parallelization(
        &self,
        table: &mut ActivityTable,
        pairs: &[(String, String)],
        project_start: NaiveDate,
    ) -> ScheduleResult<Vec<(String, String)>> {
        let mut applied = Vec::new();
        if pairs.is_empty() {
            return Ok(applied);
        }

        let mut finish = ForwardPass::new(table, self.order)
            .execute(project_start)?
            .project_end_date();
        for (first, second) in pairs {
            let Some(trial) = rewired(table, first, second) else {
                debug!(%first, %second, "pair skipped, no predecessors to share or a cycle would form");
                continue;
            };
            let outcome = ForwardPass::new(&trial, self.order).execute(project_start);
            match outcome {
                Ok(schedule) if schedule.project_end_date() <= finish => {
                    finish = schedule.project_end_date();
                    *table = trial;
                    applied.push((first.clone(), second.clone()));
                }
                Ok(_) => debug!(%first, %second, "pair skipped, it would delay the finish"),
                Err(err) => debug!(%first, %second, error = %err, "pair skipped"),
            }
        }
        Ok(applied)
    }
}

/// Configured pairs whose two members both exist in the table, in configuration order.
pub fn parallel_pairs(table: &ActivityTable, config: &OptimizerConfig) -> Vec<(String, String)> {
    config
        .parallel_pairs
        .iter()
        .filter(|(first, second)| table.contains(first) && table.contains(second))
        .cloned()
        .collect()
}

/// Copy of `table` where `second` takes over `first`'s predecessors, or
/// `None` when `first` has none or already waits on `second`, directly or
/// through other activities.
fn rewired(table: &ActivityTable, first: &str, second: &str) -> Option<ActivityTable> {
    let shared = table.find(first)?.predecessors.clone();
    if shared.is_empty() {
        return None;
    }
    let dag = ActivityDag::build(table);
    if shared
        .iter()
        .map(|p| p.trim())
        .any(|p| p == second || dag.depends_on(p, second))
    {
        return None;
    }

    let mut trial = table.clone();
    trial.find_mut(second)?.predecessors = shared;
    Some(trial)
}
