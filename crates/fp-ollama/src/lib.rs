#![forbid(unsafe_code)]

//! Blocking HTTP client for a local Ollama instance.
//!
//! Two integrations: [`OllamaClient::classify`] asks the model to turn a
//! free-text instruction into a structured [`Command`], and
//! [`OllamaClient::generate_diagram`] asks it for a whole diagram in a
//! fenced mermaid block. Both carry explicit connect and request timeouts;
//! a connection-level failure surfaces as [`OllamaError::Unreachable`] so
//! callers can tell "Ollama is not running" apart from a bad reply.

use std::sync::LazyLock;
use std::time::Duration;

use fp_core::Command;
use regex::Regex;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OllamaError>;

#[derive(Debug, Error)]
pub enum OllamaError {
    #[error(
        "failed to connect to Ollama at {endpoint}; make sure Ollama is running (`ollama serve`)"
    )]
    Unreachable { endpoint: String },

    #[error("Ollama request failed: {0}")]
    Http(reqwest::Error),

    #[error("Ollama returned HTTP status {status}")]
    Status { status: u16 },

    #[error("Ollama reply was missing the '{0}' field")]
    MissingField(&'static str),

    #[error("invalid command format: {detail}")]
    InvalidCommand { detail: String },

    #[error("no fenced mermaid block found in the model response")]
    NoMermaidBlock,
}

impl OllamaError {
    /// True when the failure means the service itself could not be reached,
    /// as opposed to a reachable service replying badly.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OllamaConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "vivi:latest".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// A classified instruction plus the raw model text it was recovered from.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Classification {
    pub command: Command,
    pub raw_response: String,
}

#[derive(Debug)]
pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(OllamaError::Http)?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Sends one instruction to `/api/generate` and parses the model's text
    /// reply into a [`Command`].
    pub fn classify(&self, instruction: &str) -> Result<Classification> {
        let payload = json!({
            "model": self.config.model,
            "prompt": classification_prompt(instruction),
            "stream": false,
        });

        let reply = self.post_json("/api/generate", &payload)?;
        let raw = reply
            .get("response")
            .and_then(Value::as_str)
            .ok_or(OllamaError::MissingField("response"))?;

        Ok(Classification {
            command: extract_command(raw)?,
            raw_response: raw.to_string(),
        })
    }

    /// Asks `/api/chat` for a whole flowchart and returns the text inside
    /// the fenced mermaid block.
    pub fn generate_diagram(&self, description: &str) -> Result<String> {
        let payload = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": DIAGRAM_SYSTEM_PROMPT },
                { "role": "user", "content": description },
            ],
            "stream": false,
        });

        let reply = self.post_json("/api/chat", &payload)?;
        let content = reply
            .get("message")
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .ok_or(OllamaError::MissingField("message.content"))?;

        extract_mermaid_block(content).ok_or(OllamaError::NoMermaidBlock)
    }

    fn post_json(&self, path: &str, payload: &Value) -> Result<Value> {
        let url = format!("{}{path}", self.config.endpoint);
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .map_err(|error| self.map_transport_error(error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OllamaError::Status {
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .map_err(|error| self.map_transport_error(error))
    }

    fn map_transport_error(&self, error: reqwest::Error) -> OllamaError {
        if error.is_connect() || error.is_timeout() {
            OllamaError::Unreachable {
                endpoint: self.config.endpoint.clone(),
            }
        } else {
            OllamaError::Http(error)
        }
    }
}

const DIAGRAM_SYSTEM_PROMPT: &str = "You are an expert in Mermaid diagram syntax. \
Convert natural language descriptions into valid Mermaid flowchart definitions. \
The output MUST be ONLY the Mermaid code block, enclosed in triple backticks with \
the 'mermaid' language tag. Use square brackets [] for process steps and keep any \
text inside curly braces {} simple, avoiding parentheses, commas, or other \
punctuation that could confuse the parser.";

fn classification_prompt(instruction: &str) -> String {
    format!(
        "Convert this instruction into JSON only. Return a valid JSON object with one of \
these possible actions:\n\n\
For adding nodes: {{\"action\": \"addNode\", \"id\": \"unique_id\", \"text\": \"Node Label\", \
\"connectFrom\": \"source_node_id\", \"connectTo\": \"target_node_id\"}}\n\
For removing nodes: {{\"action\": \"removeNode\", \"id\": \"node_id\"}}\n\
For adding connections: {{\"action\": \"addConnection\", \"sourceId\": \"source_id\", \
\"targetId\": \"target_id\"}}\n\
For removing connections: {{\"action\": \"removeConnection\", \"sourceId\": \"source_id\", \
\"targetId\": \"target_id\"}}\n\n\
Instruction: {instruction}\n\n\
Return only valid JSON:"
    )
}

// First {...} span in the text; nested braces are not supported.
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{[^}]*\}").expect("json object pattern"));

static MERMAID_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```mermaid\n(.*?)\n```").expect("mermaid block pattern"));

/// Recovers a [`Command`] from raw model text: direct JSON parse first, then
/// a scan for the first `{...}` span. Anything without a recognizable
/// `action` is an invalid command.
pub fn extract_command(raw: &str) -> Result<Command> {
    if let Ok(command) = serde_json::from_str::<Command>(raw.trim()) {
        return Ok(command);
    }

    let Some(found) = JSON_OBJECT.find(raw) else {
        return Err(OllamaError::InvalidCommand {
            detail: "no JSON object found in response".to_string(),
        });
    };

    serde_json::from_str::<Command>(found.as_str()).map_err(|error| OllamaError::InvalidCommand {
        detail: error.to_string(),
    })
}

/// Pulls the payload out of a fenced ```mermaid block, if there is one.
#[must_use]
pub fn extract_mermaid_block(content: &str) -> Option<String> {
    MERMAID_BLOCK
        .captures(content)
        .map(|captures| captures[1].trim().to_string())
}
