pub mod activity;
pub mod assistant;
pub mod calculations;
pub mod config;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod query;
pub mod schedule;
pub mod session;

pub use activity::{Activity, ActivityTable, MAX_DURATION_DAYS};
pub use assistant::{FallbackAssistant, RemoteAssistant, RuleBasedAssistant, ScheduleAssistant};
pub use calculations::{ForwardPass, OptimizationReport, Optimizer};
pub use config::{AiConfig, OptimizerConfig, PassOrder, SchedulerConfig};
pub use error::{ScheduleError, ScheduleResult};
pub use ingest::{Extraction, ExtractionSource, Input, NaturalLanguageExtractor, TabularImporter};
pub use query::{QueryIntent, QueryResponder};
pub use schedule::{Schedule, ScheduleSummary, ScheduledActivity};
pub use session::{ScheduleSession, SessionStatus, SessionStore};
