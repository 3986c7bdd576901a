use crate::calculations::parallel_pairs;
use crate::config::OptimizerConfig;
use crate::schedule::Schedule;
use std::fmt::Write;

/// Question categories recognized by keyword, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    Duration,
    Parallelism,
    Optimization,
    CriticalPath,
    ActivityListing,
    Unrecognized,
}

const INTENT_KEYWORDS: [(QueryIntent, &[&str]); 5] = [
    (
        QueryIntent::Duration,
        &[
            "duración", "duracion", "tiempo", "cuánto", "cuanto", "días", "dias", "duration",
            "how long", "days",
        ],
    ),
    (
        QueryIntent::Parallelism,
        &[
            "paralelo", "simultáneo", "simultaneo", "mismo tiempo", "parallel", "simultaneous",
            "concurrent", "same time",
        ],
    ),
    (
        QueryIntent::Optimization,
        &[
            "optimizar", "mejorar", "reducir", "acelerar", "optimize", "optimise", "improve",
            "reduce", "speed up", "shorten",
        ],
    ),
    (
        QueryIntent::CriticalPath,
        &["crítica", "crítico", "critica", "critico", "ruta", "critical", "path"],
    ),
    (
        QueryIntent::ActivityListing,
        &["actividad", "tarea", "qué", "activit", "task", "what", "list"],
    ),
];

impl QueryIntent {
    pub fn classify(question: &str) -> Self {
        let lowered = question.to_lowercase();
        INTENT_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(intent, _)| *intent)
            .unwrap_or(QueryIntent::Unrecognized)
    }
}

pub const HELP_MESSAGE: &str = "I'm not sure how to answer that. I can help with:\n\
• Project duration\n\
• Activities that can run in parallel\n\
• Schedule optimization\n\
• The critical path\n\
• The list of activities\n\n\
Could you rephrase your question?";

const OPTIMIZATION_MESSAGE: &str = "To optimize the schedule I can:\n\
• Shorten long activities\n\
• Find activities that can run in parallel\n\
• Recompute the dates\n\n\
Ask me to optimize and I'll apply these changes.";

const CRITICAL_PATH_MESSAGE: &str = "The critical path is the chain of dependent activities \
that sets the minimum project duration. In this schedule every activity sits on it, because \
the activities depend on each other sequentially.";

const SEQUENTIAL_MESSAGE: &str = "In the current schedule every activity depends on the one \
before it. Some of them could be rearranged to run in parallel.";

/// Formats dates in answers as day/month/year.
pub fn display_date(date: chrono::NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Deterministic question answering over a computed schedule.
pub struct QueryResponder<'a> {
    optimizer: &'a OptimizerConfig,
}

impl<'a> QueryResponder<'a> {
    pub fn new(optimizer: &'a OptimizerConfig) -> Self {
        Self { optimizer }
    }

    pub fn answer(&self, question: &str, schedule: &Schedule) -> String {
        match QueryIntent::classify(question) {
            QueryIntent::Duration => duration_answer(schedule),
            QueryIntent::Parallelism => self.parallelism_answer(schedule),
            QueryIntent::Optimization => OPTIMIZATION_MESSAGE.to_string(),
            QueryIntent::CriticalPath => CRITICAL_PATH_MESSAGE.to_string(),
            QueryIntent::ActivityListing => listing_answer(schedule),
            QueryIntent::Unrecognized => HELP_MESSAGE.to_string(),
        }
    }

    fn parallelism_answer(&self, schedule: &Schedule) -> String {
        let pairs = parallel_pairs(&schedule.activity_table(), self.optimizer);
        if pairs.is_empty() {
            return SEQUENTIAL_MESSAGE.to_string();
        }
        let mut answer = String::from("These activities can run in parallel:\n");
        for (first, second) in pairs {
            let _ = writeln!(answer, "• {first} and {second}");
        }
        answer
    }
}

fn duration_answer(schedule: &Schedule) -> String {
    format!(
        "The project takes {} days in total, from {} to {}.",
        schedule.total_duration_days(),
        display_date(schedule.project_start_date()),
        display_date(schedule.project_end_date())
    )
}

fn listing_answer(schedule: &Schedule) -> String {
    let mut answer = String::from("The project activities are:\n");
    for scheduled in schedule.activities() {
        let _ = writeln!(
            answer,
            "• {}: {} days",
            scheduled.name(),
            scheduled.duration_days()
        );
    }
    answer
}
