use crate::error::{ScheduleError, ScheduleResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// How the forward pass walks the activity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOrder {
    /// Resolve the dependency graph first; cycles are reported as errors.
    #[default]
    Topological,
    /// Single left-to-right pass over the table rows. A predecessor listed
    /// below its successor is not yet known and the successor anchors to the
    /// project start instead.
    TableOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub long_activity_threshold_days: i64,
    pub reduction_factor: f64,
    /// `(first, second)`: when both exist, `second` takes over `first`'s predecessors.
    pub parallel_pairs: Vec<(String, String)>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        let pairs = [
            ("Walls", "Utilities"),
            ("Roofing", "Finishing"),
            ("Utilities", "Finishing"),
            ("Muros", "Instalaciones"),
            ("Techos", "Acabados"),
            ("Instalaciones", "Acabados"),
        ];
        Self {
            long_activity_threshold_days: 10,
            reduction_factor: 0.8,
            parallel_pairs: pairs
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub pass_order: PassOrder,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    /// Anchor date; `None` means "today" when a session is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_start_date: Option<NaiveDate>,
}

impl SchedulerConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ScheduleResult<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    pub fn save_json_file<P: AsRef<Path>>(&self, path: P) -> ScheduleResult<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

/// Accepts `YYYY-MM-DD` or `DD/MM/YYYY`.
pub fn parse_project_date(input: &str) -> ScheduleResult<NaiveDate> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .map_err(|_| {
            ScheduleError::InvalidDate(format!(
                "'{trimmed}' (expected YYYY-MM-DD or DD/MM/YYYY)"
            ))
        })
}

pub const DEFAULT_AI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_AI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the optional remote assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl AiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_AI_API_URL.to_string(),
            model: DEFAULT_AI_MODEL.to_string(),
            timeout_secs: DEFAULT_AI_TIMEOUT_SECS,
        }
    }

    /// Reads the assistant settings from the environment.
    ///
    /// Key: `BUILDER_AI_API_KEY`, falling back to `GEMINI_API_KEY`.
    /// Optional: `BUILDER_AI_API_URL`, `BUILDER_AI_MODEL`, `BUILDER_AI_TIMEOUT_SECS`.
    /// Returns `None` when no key is set, which simply means "not configured".
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("BUILDER_AI_API_KEY")
            .or_else(|| lookup("GEMINI_API_KEY"))
            .filter(|key| !key.trim().is_empty())?;
        let mut config = Self::new(api_key);
        if let Some(url) = lookup("BUILDER_AI_API_URL") {
            config.api_url = url;
        }
        if let Some(model) = lookup("BUILDER_AI_MODEL") {
            config.model = model;
        }
        if let Some(secs) = lookup("BUILDER_AI_TIMEOUT_SECS").and_then(|s| s.trim().parse().ok()) {
            config.timeout_secs = secs;
        }
        Some(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parses_both_accepted_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(parse_project_date("2025-01-15").unwrap(), expected);
        assert_eq!(parse_project_date(" 15/01/2025 ").unwrap(), expected);
        assert!(matches!(
            parse_project_date("January 15"),
            Err(ScheduleError::InvalidDate(_))
        ));
    }

    #[test]
    fn ai_config_requires_a_key() {
        let empty: HashMap<&str, &str> = HashMap::new();
        assert!(AiConfig::from_lookup(|k| empty.get(k).map(|v| v.to_string())).is_none());

        let vars = HashMap::from([
            ("GEMINI_API_KEY", "secret"),
            ("BUILDER_AI_TIMEOUT_SECS", "5"),
        ]);
        let config = AiConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.model, DEFAULT_AI_MODEL);
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn scheduler_config_deserializes_with_defaults() {
        let config: SchedulerConfig =
            serde_json::from_str(r#"{"pass_order": "table_order"}"#).unwrap();
        assert_eq!(config.pass_order, PassOrder::TableOrder);
        assert_eq!(config.optimizer.long_activity_threshold_days, 10);
        assert!(config.project_start_date.is_none());
    }
}
