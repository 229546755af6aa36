//! Boundary to the generative assistant.
//!
//! The simulator only needs two operations, free-form chat and session analysis. Both
//! block, both may fail; callers run them off the UI thread (see [`crate::chat`]).

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::AssistantSettings;
use crate::error::{AppError, AppResult};
use crate::types::SimulationResult;

pub const CHAT_EMPTY_REPLY: &str = "Communication error with the lattice core.";
pub const ANALYSIS_EMPTY_REPLY: &str = "The analysis could not be generated.";

const SYSTEM_INSTRUCTION: &str = "You are an expert on the ABC theory of quantum gravity. \
Your knowledge rests on the premise that gravity is an emergent property of a relational \
network of a, b and c nodes. You are critical, scientific and focused on mathematical precision.";

pub trait Assistant: Send + Sync {
    fn chat(&self, message: &str) -> AppResult<String>;
    fn analyze(&self, session: &SimulationResult) -> AppResult<String>;
}

pub fn analysis_prompt(session: &SimulationResult) -> String {
    let params = &session.config.params;
    let m = &session.metrics;
    format!(
        "Analyse this ABC quantum-gravity lattice simulation.\n\
         Parameters: a={a}, b={b}, c={c}\n\
         Results:\n\
         - Predicted electron mass: {e} MeV (error: {e_err:.2}%)\n\
         - Predicted proton mass: {p} MeV (error: {p_err:.2}%)\n\
         - Predicted G: {g} (error: {g_err:.2}%)\n\
         - Global match: {matched:.2}%\n\
         Lattice: {nodes} nodes, {excited} excited.\n\n\
         Based on Cartan torsion and the relational network, how should a, b or c be adjusted \
         to make the electron mass prediction more accurate? Explain how the geometric \
         deformation seen in the excited nodes relates to Schwarzschild curvature.",
        a = params.a,
        b = params.b,
        c = params.c,
        e = m.electron_mass.predicted,
        e_err = m.electron_mass.error,
        p = m.proton_mass.predicted,
        p_err = m.proton_mass.error,
        g = m.gravity.predicted,
        g_err = m.gravity.error,
        matched = m.match_percentage,
        nodes = session.nodes.len(),
        excited = session.nodes.iter().filter(|n| n.excited).count(),
    )
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

impl GenerateContentResponse {
    /// Concatenated visible text of the first candidate, if any.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter(|part| !part.thought)
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Gemini `generateContent` over REST.
pub struct GeminiClient {
    agent: ureq::Agent,
    settings: AssistantSettings,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(settings: AssistantSettings, api_key: Option<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(settings.timeout_secs)))
            .build();
        Self {
            agent: config.into(),
            settings,
            api_key,
        }
    }

    /// Reads the key from the environment variable named in the settings.
    pub fn from_env(settings: AssistantSettings) -> Self {
        let api_key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            warn!(var = %settings.api_key_env, "assistant API key not set; requests will fail");
        }
        Self::new(settings, api_key)
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model
        )
    }

    fn chat_body(&self, message: &str) -> Value {
        let mut body = json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{ "role": "user", "parts": [{ "text": message }] }],
        });
        if self.settings.web_search {
            body["tools"] = json!([{ "google_search": {} }]);
        }
        body
    }

    fn analysis_body(&self, session: &SimulationResult) -> Value {
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": analysis_prompt(session) }] }],
            "generationConfig": {
                "thinkingConfig": { "thinkingBudget": self.settings.thinking_budget }
            },
        })
    }

    fn generate(&self, body: &Value) -> AppResult<GenerateContentResponse> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::MissingApiKey(self.settings.api_key_env.clone()))?;

        debug!(model = %self.settings.model, "sending generateContent");
        let mut response = self
            .agent
            .post(&self.url())
            .header("x-goog-api-key", key)
            .send_json(body)?;
        Ok(response.body_mut().read_json::<GenerateContentResponse>()?)
    }
}

impl Assistant for GeminiClient {
    fn chat(&self, message: &str) -> AppResult<String> {
        let reply = self.generate(&self.chat_body(message))?;
        Ok(reply.text().unwrap_or_else(|| CHAT_EMPTY_REPLY.to_owned()))
    }

    fn analyze(&self, session: &SimulationResult) -> AppResult<String> {
        let reply = self.generate(&self.analysis_body(session))?;
        Ok(reply.text().unwrap_or_else(|| ANALYSIS_EMPTY_REPLY.to_owned()))
    }
}
