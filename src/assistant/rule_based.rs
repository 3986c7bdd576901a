use crate::activity::ActivityTable;
use crate::assistant::{OptimizationAdvice, Recommendation, Risk, RiskAssessment, ScheduleAssistant};
use crate::calculations::Optimizer;
use crate::config::{OptimizerConfig, PassOrder, SchedulerConfig};
use crate::error::ScheduleResult;
use crate::ingest::defaults::category;
use crate::ingest::{Extraction, NaturalLanguageExtractor};
use crate::query::QueryResponder;
use crate::schedule::Schedule;

/// Phases whose work is exposed to the weather.
const WEATHER_EXPOSED: [&str; 3] = ["Excavation", "Structure", "Roofing"];

/// Deterministic assistant built from the extractor, the query responder
/// and the optimizer.
pub struct RuleBasedAssistant {
    extractor: NaturalLanguageExtractor,
    optimizer: OptimizerConfig,
    order: PassOrder,
}

impl RuleBasedAssistant {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            extractor: NaturalLanguageExtractor::new(),
            optimizer: config.optimizer.clone(),
            order: config.pass_order,
        }
    }
}

impl ScheduleAssistant for RuleBasedAssistant {
    fn name(&self) -> &str {
        "rules"
    }

    fn extract(&self, text: &str) -> ScheduleResult<Extraction> {
        Ok(self.extractor.extract(text))
    }

    fn answer(&self, question: &str, schedule: &Schedule) -> ScheduleResult<String> {
        Ok(QueryResponder::new(&self.optimizer).answer(question, schedule))
    }

    /// Describes what the deterministic optimizer would change.
    fn suggest_optimizations(&self, schedule: &Schedule) -> ScheduleResult<OptimizationAdvice> {
        let outcome = Optimizer::new(&self.optimizer, self.order).optimize(schedule)?;
        let report = &outcome.report;
        let mut recommendations = Vec::new();

        for name in &report.reduced_activities {
            let (Some(before), Some(after)) = (schedule.find(name), outcome.schedule.find(name))
            else {
                continue;
            };
            recommendations.push(Recommendation {
                kind: "duration_reduction".into(),
                description: format!(
                    "Shorten {name} from {} to {} days with additional crews or extended shifts",
                    before.duration_days(),
                    after.duration_days()
                ),
                affected_activities: vec![name.clone()],
                estimated_savings_days: Some(
                    (before.duration_days() - after.duration_days()) as f64,
                ),
                risk_level: "medium".into(),
            });
        }

        for (first, second) in &report.applied_pairs {
            recommendations.push(Recommendation {
                kind: "parallelization".into(),
                description: format!("Start {second} alongside {first} instead of after it"),
                affected_activities: vec![first.clone(), second.clone()],
                estimated_savings_days: None,
                risk_level: "low".into(),
            });
        }

        let overall_commentary = if report.days_saved > 0 {
            format!(
                "Applying these changes brings the project from {} to {} days ({:.1}% shorter).",
                report.original_duration, report.optimized_duration, report.improvement_percentage
            )
        } else {
            "No rule-based change shortens this schedule.".to_string()
        };

        Ok(OptimizationAdvice {
            recommendations,
            overall_commentary,
            optimized_duration: Some(report.optimized_duration as f64),
        })
    }

    fn assess_risks(&self, table: &ActivityTable) -> ScheduleResult<RiskAssessment> {
        let mut risks = Vec::new();

        for activity in table {
            let lowered = activity.name.to_lowercase();

            for pred in activity.named_predecessors() {
                if !table.contains(pred) {
                    risks.push(Risk {
                        kind: "technical".into(),
                        description: format!(
                            "{} waits on '{pred}', which is not in the project; the constraint is ignored",
                            activity.name
                        ),
                        probability: "high".into(),
                        impact: "medium".into(),
                        mitigation: format!("Correct the predecessor name of {}", activity.name),
                    });
                }
            }

            if activity.duration_days > self.optimizer.long_activity_threshold_days {
                risks.push(Risk {
                    kind: "time".into(),
                    description: format!(
                        "{} lasts {} days; any slip moves the finish date",
                        activity.name, activity.duration_days
                    ),
                    probability: "medium".into(),
                    impact: "high".into(),
                    mitigation: format!(
                        "Split {} into shorter work packages and track progress weekly",
                        activity.name
                    ),
                });
            }

            let exposed = WEATHER_EXPOSED
                .iter()
                .filter_map(|name| category(name))
                .any(|c| {
                    c.name.eq_ignore_ascii_case(&activity.name)
                        || c.triggers.iter().any(|t| lowered.contains(t))
                });
            if exposed {
                risks.push(Risk {
                    kind: "climate".into(),
                    description: format!("{} is exposed to rain and wind delays", activity.name),
                    probability: "medium".into(),
                    impact: "medium".into(),
                    mitigation: "Keep weather contingency days and protect exposed work".into(),
                });
            }

            if activity.named_predecessors().count() > 1 {
                risks.push(Risk {
                    kind: "logistics".into(),
                    description: format!(
                        "{} cannot start until several activities finish",
                        activity.name
                    ),
                    probability: "medium".into(),
                    impact: "medium".into(),
                    mitigation: "Coordinate the hand-over between the preceding crews".into(),
                });
            }
        }

        let summary = if risks.is_empty() {
            "No significant risks identified.".to_string()
        } else {
            format!("{} risks identified across {} activities.", risks.len(), table.len())
        };
        Ok(RiskAssessment { risks, summary })
    }
}
