use crate::error::{ScheduleError, ScheduleResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named unit of work with a duration in days and the names it waits on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    pub duration_days: i64,
    #[serde(default)]
    pub predecessors: Vec<String>,
}

impl Activity {
    pub fn new(name: impl Into<String>, duration_days: i64) -> Self {
        Self {
            name: name.into(),
            duration_days,
            predecessors: Vec::new(),
        }
    }

    pub fn with_predecessors<I, S>(mut self, predecessors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.predecessors = predecessors.into_iter().map(Into::into).collect();
        self
    }

    /// Builds the predecessor list from a comma separated cell such as `"Excavation, Walls"`.
    pub fn with_predecessor_list(mut self, joined: &str) -> Self {
        self.predecessors = split_predecessors(joined);
        self
    }

    pub fn predecessors_joined(&self) -> String {
        self.predecessors.join(", ")
    }

    /// Predecessor names that actually carry a constraint (blank entries dropped).
    pub fn named_predecessors(&self) -> impl Iterator<Item = &str> {
        self.predecessors
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
    }
}

/// Splits a predecessor cell on commas. `nan` is what spreadsheet exports leave in empty cells.
pub fn split_predecessors(joined: &str) -> Vec<String> {
    let trimmed = joined.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Vec::new();
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Longest accepted activity: one hundred years of calendar days.
pub const MAX_DURATION_DAYS: i64 = 36_500;

/// Ordered activity list. Row order is kept but carries no dependency meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTable {
    activities: Vec<Activity>,
}

impl ActivityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_activities(activities: Vec<Activity>) -> Self {
        Self { activities }
    }

    pub fn push(&mut self, activity: Activity) {
        self.activities.push(activity);
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn activities_mut(&mut self) -> &mut [Activity] {
        &mut self.activities
    }

    pub fn into_activities(self) -> Vec<Activity> {
        self.activities
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Activity> {
        self.activities.iter()
    }

    pub fn find(&self, name: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Activity> {
        self.activities.iter_mut().find(|a| a.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.activities.iter().map(|a| a.name.as_str())
    }

    pub fn validate(&self) -> ScheduleResult<()> {
        validate_activity_collection(&self.activities)
    }
}

impl FromIterator<Activity> for ActivityTable {
    fn from_iter<T: IntoIterator<Item = Activity>>(iter: T) -> Self {
        Self {
            activities: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ActivityTable {
    type Item = &'a Activity;
    type IntoIter = std::slice::Iter<'a, Activity>;

    fn into_iter(self) -> Self::IntoIter {
        self.activities.iter()
    }
}

pub fn validate_activity(activity: &Activity) -> ScheduleResult<()> {
    if activity.name.trim().is_empty() {
        return Err(ScheduleError::format("activity with an empty name"));
    }

    if activity.duration_days <= 0 || activity.duration_days > MAX_DURATION_DAYS {
        return Err(ScheduleError::InvalidDuration {
            name: activity.name.clone(),
            duration: activity.duration_days,
        });
    }

    if activity
        .named_predecessors()
        .any(|pred| pred == activity.name.trim())
    {
        return Err(ScheduleError::SelfDependency(activity.name.clone()));
    }

    Ok(())
}

pub fn validate_activity_collection(activities: &[Activity]) -> ScheduleResult<()> {
    let mut seen_names = HashSet::with_capacity(activities.len());
    for activity in activities {
        if !seen_names.insert(activity.name.trim()) {
            return Err(ScheduleError::DuplicateActivity(activity.name.clone()));
        }
        validate_activity(activity)?;
    }
    Ok(())
}
