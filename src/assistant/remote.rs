//! Blocking HTTP client for a hosted language model.
//!
//! Speaks the Gemini `generateContent` API, the Anthropic messages API and
//! OpenAI-compatible chat completions; the format is picked from the URL.
//! Replies are expected to carry one JSON object, possibly wrapped in prose.

use crate::activity::{Activity, ActivityTable, split_predecessors};
use crate::assistant::{OptimizationAdvice, RiskAssessment, ScheduleAssistant};
use crate::config::AiConfig;
use crate::error::{ScheduleError, ScheduleResult};
use crate::ingest::localized::LocalizedParser;
use crate::ingest::{Extraction, ExtractionSource};
use crate::query::display_date;
use crate::schedule::Schedule;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFormat {
    Gemini,
    Anthropic,
    OpenAi,
}

impl ApiFormat {
    pub fn detect(url: &str) -> Self {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else if url.contains("generativelanguage.googleapis.com") || url.contains(":generateContent")
        {
            ApiFormat::Gemini
        } else {
            ApiFormat::OpenAi
        }
    }
}

pub struct RemoteAssistant {
    client: Client,
    config: AiConfig,
    format: ApiFormat,
}

impl RemoteAssistant {
    pub fn new(config: AiConfig) -> ScheduleResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        let format = ApiFormat::detect(&config.api_url);
        Ok(Self {
            client,
            config,
            format,
        })
    }

    pub fn format(&self) -> ApiFormat {
        self.format
    }

    pub fn complete(&self, system: &str, user: &str) -> ScheduleResult<String> {
        debug!(format = ?self.format, model = %self.config.model, "calling remote assistant");
        match self.format {
            ApiFormat::Gemini => self.complete_gemini(system, user),
            ApiFormat::Anthropic => self.complete_anthropic(system, user),
            ApiFormat::OpenAi => self.complete_openai(system, user),
        }
    }

    fn complete_gemini(&self, system: &str, user: &str) -> ScheduleResult<String> {
        let request = GeminiRequest {
            system_instruction: GeminiContent::text(None, system),
            contents: vec![GeminiContent::text(Some("user"), user)],
        };
        let response = self
            .client
            .post(gemini_endpoint(&self.config.api_url, &self.config.model))
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()?;

        let completion: GeminiResponse = read_success(response)?;
        completion
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .ok_or_else(|| ScheduleError::external("empty response"))
    }

    fn complete_anthropic(&self, system: &str, user: &str) -> ScheduleResult<String> {
        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: MAX_TOKENS,
            system: system.into(),
            messages: vec![Message::user(user)],
        };
        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()?;

        let completion: AnthropicResponse = read_success(response)?;
        completion
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| ScheduleError::external("empty response"))
    }

    fn complete_openai(&self, system: &str, user: &str) -> ScheduleResult<String> {
        let request = OpenAiRequest {
            model: self.config.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: system.into(),
                },
                Message::user(user),
            ],
        };
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()?;

        let completion: OpenAiResponse = read_success(response)?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ScheduleError::external("empty response"))
    }
}

impl ScheduleAssistant for RemoteAssistant {
    fn name(&self) -> &str {
        &self.config.model
    }

    fn extract(&self, text: &str) -> ScheduleResult<Extraction> {
        let user = format!("Project description: \"{text}\"");
        parse_extraction(&self.complete(EXTRACT_PROMPT, &user)?)
    }

    fn answer(&self, question: &str, schedule: &Schedule) -> ScheduleResult<String> {
        let context = serde_json::to_string_pretty(&schedule_context(schedule))?;
        let user = format!("Question: \"{question}\"\n\nProject context:\n{context}");
        Ok(self.complete(ANSWER_PROMPT, &user)?.trim().to_string())
    }

    fn suggest_optimizations(&self, schedule: &Schedule) -> ScheduleResult<OptimizationAdvice> {
        let activities = serde_json::to_string_pretty(&schedule.activity_table())?;
        let current = serde_json::to_string_pretty(&schedule_context(schedule))?;
        let user = format!("Project activities:\n{activities}\n\nCurrent schedule:\n{current}");
        parse_reply(&self.complete(OPTIMIZE_PROMPT, &user)?)
    }

    fn assess_risks(&self, table: &ActivityTable) -> ScheduleResult<RiskAssessment> {
        let activities = serde_json::to_string_pretty(table)?;
        let user = format!("Project activities:\n{activities}");
        parse_reply(&self.complete(RISK_PROMPT, &user)?)
    }
}

fn gemini_endpoint(api_url: &str, model: &str) -> String {
    if api_url.contains(":generateContent") {
        api_url.to_string()
    } else {
        format!("{}/{model}:generateContent", api_url.trim_end_matches('/'))
    }
}

fn read_success<T: DeserializeOwned>(response: reqwest::blocking::Response) -> ScheduleResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(ScheduleError::external(format!("API error {status}: {body}")));
    }
    Ok(response.json()?)
}

fn schedule_context(schedule: &Schedule) -> Value {
    let activities: Vec<Value> = schedule
        .activities()
        .iter()
        .map(|a| {
            json!({
                "name": a.name(),
                "duration": a.duration_days(),
                "predecessors": a.activity.predecessors_joined(),
                "start_date": display_date(a.start_date),
                "end_date": display_date(a.end_date),
            })
        })
        .collect();
    json!({
        "activities": activities,
        "total_duration_days": schedule.total_duration_days(),
        "start_date": display_date(schedule.project_start_date()),
        "end_date": display_date(schedule.project_end_date()),
        "activity_count": schedule.len(),
    })
}

/// Outermost `{...}` of a reply that may carry surrounding text.
pub fn extract_json(reply: &str) -> ScheduleResult<&str> {
    let start = reply
        .find('{')
        .ok_or_else(|| ScheduleError::external("no JSON object in reply"))?;
    let end = reply
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| ScheduleError::external("no closing brace in reply"))?;
    Ok(&reply[start..=end])
}

pub fn parse_reply<T: DeserializeOwned>(reply: &str) -> ScheduleResult<T> {
    serde_json::from_str(extract_json(reply)?)
        .map_err(|e| ScheduleError::external(format!("malformed reply: {e}")))
}

/// Activities from an extraction reply. Records without a name or a
/// positive duration are dropped; an empty result is an error so the
/// caller falls back to the rules.
pub fn parse_extraction(reply: &str) -> ScheduleResult<Extraction> {
    let parsed: ActivitiesReply = parse_reply(reply)?;
    let parser = LocalizedParser::new();

    let mut table = ActivityTable::new();
    for item in parsed.activities {
        let name = item.name.trim();
        let days = match item.duration {
            NumberOrText::Number(n) if n.is_finite() => n.round_ties_even() as i64,
            NumberOrText::Number(_) => continue,
            NumberOrText::Text(text) => match parser.parse_duration(&text) {
                Some(days) => days,
                None => continue,
            },
        };
        if name.is_empty() || days <= 0 {
            continue;
        }
        let predecessors = match item.predecessors {
            Some(PredecessorsReply::Joined(joined)) => split_predecessors(&joined),
            Some(PredecessorsReply::List(list)) => list
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
            None => Vec::new(),
        };
        table.push(Activity::new(name, days).with_predecessors(predecessors));
    }

    if table.is_empty() {
        return Err(ScheduleError::external("reply contained no usable activities"));
    }
    Ok(Extraction {
        table,
        source: ExtractionSource::Ai,
        commentary: parsed.commentary.filter(|c| !c.trim().is_empty()),
    })
}

#[derive(Deserialize)]
struct ActivitiesReply {
    #[serde(default, alias = "actividades")]
    activities: Vec<ActivityReply>,
    #[serde(default, alias = "analisis", alias = "análisis", alias = "analysis")]
    commentary: Option<String>,
}

#[derive(Deserialize)]
struct ActivityReply {
    #[serde(alias = "Actividad", alias = "actividad", alias = "nombre", alias = "Name")]
    name: String,
    #[serde(alias = "Duración", alias = "duración", alias = "duracion", alias = "Duration")]
    duration: NumberOrText,
    #[serde(default, alias = "Predecesoras", alias = "predecesoras", alias = "Predecessors")]
    predecessors: Option<PredecessorsReply>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PredecessorsReply {
    Joined(String),
    List(Vec<String>),
}

// Gemini generateContent format
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(ToOwned::to_owned),
            parts: vec![GeminiPart { text: text.into() }],
        }
    }
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

// Anthropic messages format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible chat completions
#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

impl Message {
    fn user(content: &str) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

const EXTRACT_PROMPT: &str = r#"You are an expert in construction project management.
Read the project description and extract its activities, realistic durations in days and
the dependencies between them. Infer logical dependencies when none are given and use
clear activity names.

Reply with ONLY a JSON object of this shape:
{
  "activities": [
    {"name": "Excavation", "duration": 5, "predecessors": ""},
    {"name": "Foundation", "duration": 10, "predecessors": "Excavation"}
  ],
  "commentary": "Short analysis of the project and recommendations"
}"#;

const ANSWER_PROMPT: &str = "You are an assistant for construction project schedules. \
Answer the question about the schedule in the context. Give a direct answer, a technical \
explanation when needed, practical recommendations and any risk worth noting. Be concise. \
Dates are written as DD/MM/YYYY.";

const OPTIMIZE_PROMPT: &str = r#"You are an expert in construction schedule optimization.
Look for activities that can run in parallel, realistic duration reductions and better
sequencing, and rate the risk of each recommendation.

Reply with ONLY a JSON object of this shape:
{
  "recommendations": [
    {
      "kind": "parallelization|duration_reduction|reorganization",
      "description": "What to change",
      "affected_activities": ["activity1", "activity2"],
      "estimated_savings_days": 3,
      "risk_level": "low|medium|high"
    }
  ],
  "overall_commentary": "General analysis of the schedule",
  "optimized_duration": 45
}"#;

const RISK_PROMPT: &str = r#"You are an expert in construction project risk management.
Analyse the potential risks of these activities.

Reply with ONLY a JSON object of this shape:
{
  "risks": [
    {
      "kind": "technical|climate|logistics|resources|time",
      "description": "The risk",
      "probability": "low|medium|high",
      "impact": "low|medium|high",
      "mitigation": "Recommended mitigation"
    }
  ],
  "summary": "Overview of the main risks"
}"#;
