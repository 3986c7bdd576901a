use crate::activity::ActivityTable;
use crate::assistant::{FallbackAssistant, OptimizationAdvice, RiskAssessment, ScheduleAssistant};
use crate::calculations::{ForwardPass, OptimizationReport, Optimizer};
use crate::config::{SchedulerConfig, parse_project_date};
use crate::error::{ScheduleError, ScheduleResult};
use crate::ingest::{
    ExtractionSource, Ingested, Input, NaturalLanguageExtractor, TabularImporter, TabularLayout,
};
use crate::query::QueryResponder;
use crate::schedule::{Schedule, ScheduleSummary};
use chrono::{Local, NaiveDate};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const NO_PROJECT_MESSAGE: &str =
    "There is no project loaded yet. Describe your project or give me a CSV or Excel file first.";

/// Where the current activity table came from.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOrigin {
    Text {
        source: ExtractionSource,
        commentary: Option<String>,
    },
    File(TabularLayout),
    /// The file was unusable and the example project was loaded instead.
    ExampleSubstitute { cause: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub origin: LoadOrigin,
    pub summary: ScheduleSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub has_schedule: bool,
    pub project_start_date: NaiveDate,
    pub current: Option<ScheduleSummary>,
}

/// One user's working state: the activity table, the anchor date and the
/// schedule derived from both. The schedule is always recomputed in full.
pub struct ScheduleSession {
    config: SchedulerConfig,
    assistant: Box<dyn ScheduleAssistant>,
    extractor: NaturalLanguageExtractor,
    importer: TabularImporter,
    project_start: NaiveDate,
    table: Option<ActivityTable>,
    schedule: Option<Schedule>,
}

impl ScheduleSession {
    pub fn new(config: SchedulerConfig, assistant: Box<dyn ScheduleAssistant>) -> Self {
        let project_start = config
            .project_start_date
            .unwrap_or_else(|| Local::now().date_naive());
        Self {
            config,
            assistant,
            extractor: NaturalLanguageExtractor::new(),
            importer: TabularImporter::new(),
            project_start,
            table: None,
            schedule: None,
        }
    }

    /// Deterministic session with no remote assistant.
    pub fn rule_based(config: SchedulerConfig) -> Self {
        let assistant = FallbackAssistant::rule_based(&config);
        Self::new(config, Box::new(assistant))
    }

    /// Uses a remote assistant when one is configured in the environment.
    pub fn from_env(config: SchedulerConfig) -> Self {
        let assistant = FallbackAssistant::from_env(&config);
        Self::new(config, Box::new(assistant))
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn project_start_date(&self) -> NaiveDate {
        self.project_start
    }

    pub fn table(&self) -> Option<&ActivityTable> {
        self.table.as_ref()
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    pub fn summary(&self) -> Option<ScheduleSummary> {
        self.schedule.as_ref().map(Schedule::summary)
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            has_schedule: self.schedule.is_some(),
            project_start_date: self.project_start,
            current: self.summary(),
        }
    }

    /// Classifies the entry as a file path or a description and loads it.
    pub fn load_input(&mut self, entry: &str) -> ScheduleResult<LoadOutcome> {
        match Input::detect(entry) {
            Input::TabularFile(path) => self.load_file(path),
            Input::Text(text) => self.load_text(&text),
        }
    }

    pub fn load_text(&mut self, text: &str) -> ScheduleResult<LoadOutcome> {
        let extraction = match self.assistant.extract(text) {
            Ok(extraction) if !extraction.table.is_empty() => extraction,
            Ok(_) => self.extractor.extract(text),
            Err(err) => {
                warn!(error = %err, "assistant extraction failed, using text patterns");
                self.extractor.extract(text)
            }
        };
        info!(
            source = ?extraction.source,
            activities = extraction.table.len(),
            "project description analysed"
        );

        let summary = self.load_table(extraction.table)?.summary();
        Ok(LoadOutcome {
            origin: LoadOrigin::Text {
                source: extraction.source,
                commentary: extraction.commentary,
            },
            summary,
        })
    }

    /// Reads a CSV or spreadsheet. An unusable file loads the example
    /// project; the outcome says so. A start date found in the file
    /// replaces the project start.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> ScheduleResult<LoadOutcome> {
        let origin = match self.importer.import_or_example(path) {
            Ingested::Parsed(import) => {
                let previous = self.project_start;
                if let Some(start) = import.discovered_start {
                    self.project_start = start.date();
                }
                if let Err(err) = self.load_table(import.table) {
                    self.project_start = previous;
                    return Err(err);
                }
                LoadOrigin::File(import.layout)
            }
            Ingested::Substituted { table, cause } => {
                self.load_table(table)?;
                LoadOrigin::ExampleSubstitute {
                    cause: cause.to_string(),
                }
            }
        };

        let summary = self
            .summary()
            .ok_or_else(|| ScheduleError::NoActivities("nothing was loaded".into()))?;
        Ok(LoadOutcome { origin, summary })
    }

    /// Schedules the table and makes it current. On error the previous
    /// state is left untouched.
    pub fn load_table(&mut self, table: ActivityTable) -> ScheduleResult<&Schedule> {
        let schedule =
            ForwardPass::new(&table, self.config.pass_order).execute(self.project_start)?;
        info!(summary = %schedule.summary().to_cli_summary(), "schedule generated");
        self.table = Some(table);
        Ok(self.schedule.insert(schedule))
    }

    /// Moves the anchor date and re-derives every date from the stored table.
    pub fn set_project_start_date(&mut self, date: NaiveDate) -> ScheduleResult<()> {
        let previous = self.project_start;
        self.project_start = date;
        if let Some(table) = self.table.clone() {
            if let Err(err) = self.load_table(table) {
                self.project_start = previous;
                return Err(err);
            }
        }
        debug!(%date, "project start date set");
        Ok(())
    }

    pub fn set_project_start_from_str(&mut self, input: &str) -> ScheduleResult<NaiveDate> {
        let date = parse_project_date(input)?;
        self.set_project_start_date(date)?;
        Ok(date)
    }

    /// Runs the deterministic optimizer and makes its result current.
    pub fn optimize(&mut self) -> ScheduleResult<OptimizationReport> {
        let schedule = self.require_schedule()?;
        let outcome =
            Optimizer::new(&self.config.optimizer, self.config.pass_order).optimize(schedule)?;
        self.table = Some(outcome.schedule.activity_table());
        self.schedule = Some(outcome.schedule);
        Ok(outcome.report)
    }

    /// Never fails: without a project it asks for one, and an assistant
    /// error falls back to the keyword responder.
    pub fn ask(&self, question: &str) -> String {
        let Some(schedule) = self.schedule.as_ref() else {
            return NO_PROJECT_MESSAGE.to_string();
        };
        match self.assistant.answer(question, schedule) {
            Ok(answer) => answer,
            Err(err) => {
                warn!(error = %err, "assistant answer failed, using keyword responder");
                QueryResponder::new(&self.config.optimizer).answer(question, schedule)
            }
        }
    }

    pub fn suggest_optimizations(&self) -> ScheduleResult<OptimizationAdvice> {
        self.assistant.suggest_optimizations(self.require_schedule()?)
    }

    pub fn assess_risks(&self) -> ScheduleResult<RiskAssessment> {
        let table = self
            .table
            .as_ref()
            .ok_or_else(|| ScheduleError::NoActivities("no project loaded".into()))?;
        self.assistant.assess_risks(table)
    }

    fn require_schedule(&self) -> ScheduleResult<&Schedule> {
        self.schedule
            .as_ref()
            .ok_or_else(|| ScheduleError::NoActivities("no project loaded".into()))
    }
}

type SessionFactory = dyn Fn() -> ScheduleSession + Send + Sync;

/// Independent sessions keyed by caller (user id, connection id, ...).
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<RwLock<ScheduleSession>>>>,
    factory: Box<SessionFactory>,
}

impl SessionStore {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> ScheduleSession + Send + Sync + 'static,
    {
        Self {
            sessions: RwLock::new(HashMap::new()),
            factory: Box::new(factory),
        }
    }

    pub fn rule_based(config: SchedulerConfig) -> Self {
        Self::new(move || ScheduleSession::rule_based(config.clone()))
    }

    /// The session for `key`, created on first use.
    pub fn session(&self, key: &str) -> Arc<RwLock<ScheduleSession>> {
        if let Some(existing) = self.sessions.read().get(key) {
            return existing.clone();
        }
        self.sessions
            .write()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(RwLock::new((self.factory)())))
            .clone()
    }

    pub fn with_session<R>(&self, key: &str, f: impl FnOnce(&mut ScheduleSession) -> R) -> R {
        let session = self.session(key);
        let mut guard = session.write();
        f(&mut guard)
    }

    pub fn remove(&self, key: &str) -> bool {
        self.sessions.write().remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
