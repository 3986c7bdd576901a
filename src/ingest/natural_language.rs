use crate::activity::{Activity, ActivityTable};
use crate::ingest::defaults::{CATEGORIES, chain_categories, default_project};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Which stage produced an activity table from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    Ai,
    LinePatterns,
    Keywords,
    DefaultProject,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub table: ActivityTable,
    pub source: ExtractionSource,
    /// Free-form analysis returned alongside an AI extraction.
    pub commentary: Option<String>,
}

impl Extraction {
    pub fn new(table: ActivityTable, source: ExtractionSource) -> Self {
        Self {
            table,
            source,
            commentary: None,
        }
    }
}

const NUMBERING: &str = r"(?:\d+\.\s*)?";
const NAME: &str = r"(?P<activity>[\p{L}\s]+?)";
const DASH: &str = r"\s*[-–—]\s*";
const COLON: &str = r"\s*:\s*";
const DAYS: &str = r"(?P<days>\d+)\s*(?:d[ií]as?|days?)";
const AFTER: &str = r"(?:despu[eé]s\s+de|after)";
const PREDECESSOR: &str = r"(?P<predecessor>[\p{L}\s]+)";

/// Line phrasings, most specific first. The first template that matches a
/// line decides it.
fn line_templates() -> Vec<String> {
    vec![
        // Excavation - 5 days (after Survey)
        format!(r"{NUMBERING}{NAME}{DASH}{DAYS}\s*\({AFTER}\s+{PREDECESSOR}\)"),
        // Excavation - 5 days after Survey
        format!(r"{NUMBERING}{NAME}{DASH}{DAYS}\s+{AFTER}\s+{PREDECESSOR}"),
        // Excavation: 5 days after Survey
        format!(r"{NUMBERING}{NAME}{COLON}{DAYS}\s+{AFTER}\s+{PREDECESSOR}"),
        // Excavation: 5 days (Survey)
        format!(r"{NUMBERING}{NAME}{COLON}{DAYS}\s*\({PREDECESSOR}\)"),
        // Excavation - 5 days (Survey)
        format!(r"{NUMBERING}{NAME}{DASH}{DAYS}\s*\({PREDECESSOR}\)"),
        // Excavation - 5 days: Survey
        format!(r"{NUMBERING}{NAME}{DASH}{DAYS}\s*:\s*{PREDECESSOR}"),
        // Excavation: 5 days Survey (first word only)
        format!(r"{NUMBERING}{NAME}{COLON}{DAYS}\s+(?P<predecessor>[\p{{L}}\s]+?)(?:\s|$)"),
        // Excavation - 5 days
        format!(r"{NUMBERING}{NAME}{DASH}{DAYS}"),
        // Excavation: 5 days
        format!(r"{NUMBERING}{NAME}{COLON}{DAYS}"),
    ]
}

/// Deterministic free-text extraction: line templates, then keyword
/// categories, then the default project. Never fails.
pub struct NaturalLanguageExtractor {
    templates: Vec<Regex>,
}

impl Default for NaturalLanguageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl NaturalLanguageExtractor {
    pub fn new() -> Self {
        let templates = line_templates()
            .iter()
            .map(|pattern| Regex::new(&format!("(?i){pattern}")).expect("line template compiles"))
            .collect();
        Self { templates }
    }

    pub fn extract(&self, text: &str) -> Extraction {
        let from_lines: ActivityTable = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| self.extract_line(line))
            .collect();
        if !from_lines.is_empty() {
            debug!(activities = from_lines.len(), "activities read from line patterns");
            return Extraction::new(from_lines, ExtractionSource::LinePatterns);
        }

        let from_keywords = match_keywords(text);
        if !from_keywords.is_empty() {
            debug!(activities = from_keywords.len(), "no line patterns, using keyword categories");
            return Extraction::new(from_keywords, ExtractionSource::Keywords);
        }

        warn!("no activities recognized in text, using default project");
        Extraction::new(default_project(), ExtractionSource::DefaultProject)
    }

    /// Applies the line templates in order. A zero-day duration is not an activity.
    pub fn extract_line(&self, line: &str) -> Option<Activity> {
        let caps = self.templates.iter().find_map(|re| re.captures(line))?;

        let name = caps.name("activity")?.as_str().trim();
        let days: i64 = caps.name("days")?.as_str().parse().ok()?;
        if name.is_empty() || days <= 0 {
            return None;
        }

        let mut activity = Activity::new(name, days);
        if let Some(pred) = caps.name("predecessor") {
            let pred = pred.as_str().trim();
            if !pred.is_empty() {
                activity.predecessors = vec![pred.to_string()];
            }
        }
        Some(activity)
    }
}

/// One activity per category whose trigger appears anywhere in the text,
/// chained in canonical order.
pub fn match_keywords(text: &str) -> ActivityTable {
    let lowered = text.to_lowercase();
    chain_categories(
        CATEGORIES
            .iter()
            .filter(|category| category.triggers.iter().any(|t| lowered.contains(t))),
    )
}
