//! Optional text-understanding capability layered over the deterministic core.
//!
//! Every operation has a rule-based implementation; a remote model can be
//! plugged in front of it with [`FallbackAssistant`], which swallows remote
//! failures and answers from the rules instead.

pub mod remote;
pub mod rule_based;

pub use remote::{ApiFormat, RemoteAssistant};
pub use rule_based::RuleBasedAssistant;

use crate::activity::ActivityTable;
use crate::config::{AiConfig, SchedulerConfig};
use crate::error::ScheduleResult;
use crate::ingest::Extraction;
use crate::schedule::Schedule;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Answers shorter than this (after trimming) are treated as unusable.
const MIN_ANSWER_CHARS: usize = 10;

pub trait ScheduleAssistant: Send + Sync {
    fn name(&self) -> &str;

    /// Activities described by free text.
    fn extract(&self, text: &str) -> ScheduleResult<Extraction>;

    fn answer(&self, question: &str, schedule: &Schedule) -> ScheduleResult<String>;

    fn suggest_optimizations(&self, schedule: &Schedule) -> ScheduleResult<OptimizationAdvice>;

    fn assess_risks(&self, table: &ActivityTable) -> ScheduleResult<RiskAssessment>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// `parallelization`, `duration_reduction` or `reorganization`.
    #[serde(default, alias = "tipo")]
    pub kind: String,
    #[serde(default, alias = "descripcion", alias = "descripción")]
    pub description: String,
    #[serde(default, alias = "actividades_afectadas")]
    pub affected_activities: Vec<String>,
    #[serde(default, alias = "ahorro_estimado")]
    pub estimated_savings_days: Option<f64>,
    #[serde(default, alias = "riesgo")]
    pub risk_level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationAdvice {
    #[serde(default, alias = "recomendaciones")]
    pub recommendations: Vec<Recommendation>,
    #[serde(default, alias = "analisis_general", alias = "análisis_general")]
    pub overall_commentary: String,
    #[serde(default, alias = "duracion_optimizada", alias = "duración_optimizada")]
    pub optimized_duration: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    #[serde(default, alias = "tipo")]
    pub kind: String,
    #[serde(default, alias = "descripcion", alias = "descripción")]
    pub description: String,
    #[serde(default, alias = "probabilidad")]
    pub probability: String,
    #[serde(default, alias = "impacto")]
    pub impact: String,
    #[serde(default, alias = "mitigacion", alias = "mitigación")]
    pub mitigation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    #[serde(default, alias = "riesgos")]
    pub risks: Vec<Risk>,
    #[serde(default, alias = "resumen")]
    pub summary: String,
}

/// Remote assistant first when configured, rules otherwise or on failure.
pub struct FallbackAssistant {
    primary: Option<Box<dyn ScheduleAssistant>>,
    fallback: RuleBasedAssistant,
}

impl FallbackAssistant {
    pub fn new(primary: Option<Box<dyn ScheduleAssistant>>, fallback: RuleBasedAssistant) -> Self {
        Self { primary, fallback }
    }

    pub fn rule_based(config: &SchedulerConfig) -> Self {
        Self::new(None, RuleBasedAssistant::new(config))
    }

    /// Uses a remote assistant when [`AiConfig::from_env`] finds a key.
    pub fn from_env(config: &SchedulerConfig) -> Self {
        let primary = AiConfig::from_env().and_then(|ai| match RemoteAssistant::new(ai) {
            Ok(remote) => Some(Box::new(remote) as Box<dyn ScheduleAssistant>),
            Err(err) => {
                warn!(error = %err, "remote assistant unavailable, using rules only");
                None
            }
        });
        Self::new(primary, RuleBasedAssistant::new(config))
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    fn primary(&self) -> Option<&dyn ScheduleAssistant> {
        self.primary.as_deref()
    }
}

impl ScheduleAssistant for FallbackAssistant {
    fn name(&self) -> &str {
        match self.primary() {
            Some(primary) => primary.name(),
            None => self.fallback.name(),
        }
    }

    fn extract(&self, text: &str) -> ScheduleResult<Extraction> {
        if let Some(primary) = self.primary() {
            match primary.extract(text) {
                Ok(extraction) if !extraction.table.is_empty() => return Ok(extraction),
                Ok(_) => warn!(assistant = primary.name(), "assistant returned no activities"),
                Err(err) => warn!(assistant = primary.name(), error = %err, "extraction failed"),
            }
        }
        self.fallback.extract(text)
    }

    fn answer(&self, question: &str, schedule: &Schedule) -> ScheduleResult<String> {
        if let Some(primary) = self.primary() {
            if question.trim().chars().count() > MIN_ANSWER_CHARS {
                match primary.answer(question, schedule) {
                    Ok(answer) if answer.trim().chars().count() > MIN_ANSWER_CHARS => {
                        return Ok(answer.trim().to_string());
                    }
                    Ok(_) => warn!(assistant = primary.name(), "answer too short, using rules"),
                    Err(err) => warn!(assistant = primary.name(), error = %err, "answer failed"),
                }
            } else {
                debug!("question too short for the remote assistant");
            }
        }
        self.fallback.answer(question, schedule)
    }

    fn suggest_optimizations(&self, schedule: &Schedule) -> ScheduleResult<OptimizationAdvice> {
        if let Some(primary) = self.primary() {
            match primary.suggest_optimizations(schedule) {
                Ok(advice) => return Ok(advice),
                Err(err) => warn!(assistant = primary.name(), error = %err, "optimization advice failed"),
            }
        }
        self.fallback.suggest_optimizations(schedule)
    }

    fn assess_risks(&self, table: &ActivityTable) -> ScheduleResult<RiskAssessment> {
        if let Some(primary) = self.primary() {
            match primary.assess_risks(table) {
                Ok(assessment) => return Ok(assessment),
                Err(err) => warn!(assistant = primary.name(), error = %err, "risk assessment failed"),
            }
        }
        self.fallback.assess_risks(table)
    }
}
