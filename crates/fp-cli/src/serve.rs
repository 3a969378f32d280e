//! Local HTTP service.
//!
//! Routes:
//! - `GET  /` serves a small single-page playground.
//! - `POST /api/interpret` runs the local rule-based interpreter.
//! - `POST /api/command` proxies classification to a local Ollama model.

use std::io::Read;

use anyhow::Result;
use fp_core::GraphStore;
use fp_dialect::format;
use fp_intent::{ContentType, interpret};
use fp_ollama::{Classification, OllamaClient, OllamaConfig};
use serde::Deserialize;
use serde_json::{Value, json};
use tiny_http::{Header, Request, Response, Server};
use tracing::{info, warn};

use crate::session::apply_to_store;

type HttpResponse = Response<std::io::Cursor<Vec<u8>>>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InterpretRequest {
    command: Option<String>,
    content: Option<String>,
    #[serde(default)]
    content_type: ContentType,
}

#[derive(Debug, Deserialize)]
struct CommandRequest {
    command: Option<String>,
}

pub fn run(host: &str, port: u16, ollama: OllamaConfig) -> Result<()> {
    let addr = format!("{host}:{port}");
    let server = Server::http(&addr).map_err(|e| anyhow::anyhow!("Failed to start server: {e}"))?;

    println!("FlowPilot running at: http://{addr}");
    println!("Press Ctrl+C to stop");

    for mut request in server.incoming_requests() {
        let url_path = request.url().to_string();
        let method = request.method().as_str().to_string();

        let response = match (method.as_str(), url_path.as_str()) {
            ("GET", "/") => playground_html(),
            ("POST", "/api/interpret") => handle_interpret(&mut request),
            ("POST", "/api/command") => handle_command(&mut request, &ollama),
            _ => Response::from_string("Not Found").with_status_code(404),
        };

        info!("{method} {url_path}");
        let _ = request.respond(response);
    }

    Ok(())
}

fn handle_interpret(request: &mut Request) -> HttpResponse {
    let body = match read_body(request) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let payload: InterpretRequest = match serde_json::from_str(&body) {
        Ok(payload) => payload,
        Err(e) => return error_response(400, &format!("Invalid request body: {e}"), None),
    };

    let (status, value) = interpret_response(&payload);
    json_response(status, &value)
}

/// Interpretation endpoint body. The instruction text is the command when
/// one is present, else the pasted content; the rule table decides what to
/// do with it either way, so code and story content land in the
/// whole-diagram generation rule and everything else stays a command.
fn interpret_response(payload: &InterpretRequest) -> (u16, Value) {
    let command_text = payload
        .command
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty());
    let content_text = payload
        .content
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty());

    let Some(text) = command_text.or(content_text) else {
        return (400, json!({ "error": "Command or content is required" }));
    };

    let interpretation = interpret(text, payload.content_type);
    for field in &interpretation.fallbacks {
        warn!("No pattern matched for '{field}'; used fallback value");
    }

    let mut store = GraphStore::new();
    apply_to_store(&mut store, &interpretation.command);
    let diagram = if store.is_empty() {
        interpretation
            .command
            .mermaid_syntax()
            .unwrap_or_default()
            .to_string()
    } else {
        format(store.nodes(), store.edges())
    };

    (
        200,
        json!({
            "success": true,
            "command": interpretation.command,
            "mermaidDiagram": diagram,
        }),
    )
}

fn handle_command(request: &mut Request, ollama: &OllamaConfig) -> HttpResponse {
    let body = match read_body(request) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let payload: CommandRequest = match serde_json::from_str(&body) {
        Ok(payload) => payload,
        Err(e) => return error_response(400, &format!("Invalid request body: {e}"), None),
    };

    let (status, value) = command_response(&payload, ollama);
    json_response(status, &value)
}

fn command_response(payload: &CommandRequest, ollama: &OllamaConfig) -> (u16, Value) {
    let instruction = payload.command.as_deref().unwrap_or("").trim().to_string();
    if instruction.is_empty() {
        return (400, json!({ "error": "Command is required" }));
    }

    let client = match OllamaClient::new(ollama.clone()) {
        Ok(client) => client,
        Err(e) => {
            return (
                500,
                json!({ "error": "Failed to build Ollama client", "details": e.to_string() }),
            );
        }
    };

    classification_response(client.classify(&instruction))
}

/// Maps a classification result onto the wire: a service that could not be
/// reached is a 503 with guidance, a reachable service replying badly is a
/// generic 500.
fn classification_response(result: fp_ollama::Result<Classification>) -> (u16, Value) {
    match result {
        Ok(classification) => (
            200,
            json!({
                "success": true,
                "command": classification.command,
                "rawResponse": classification.raw_response,
            }),
        ),
        Err(e) if e.is_unreachable() => (
            503,
            json!({
                "error": "Failed to connect to Ollama. Make sure Ollama is running on localhost:11434",
                "details": e.to_string(),
            }),
        ),
        Err(e) => (
            500,
            json!({ "error": "Failed to process command", "details": e.to_string() }),
        ),
    }
}

fn read_body(request: &mut Request) -> Result<String, HttpResponse> {
    let mut body = String::new();
    match request.as_reader().read_to_string(&mut body) {
        Ok(_) => Ok(body),
        Err(e) => Err(error_response(400, &format!("Failed to read body: {e}"), None)),
    }
}

fn json_response(status: u16, value: &Value) -> HttpResponse {
    let header = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
    Response::from_data(value.to_string().into_bytes())
        .with_status_code(status)
        .with_header(header)
}

fn error_response(status: u16, message: &str, details: Option<&str>) -> HttpResponse {
    let value = match details {
        Some(details) => json!({ "error": message, "details": details }),
        None => json!({ "error": message }),
    };
    json_response(status, &value)
}

fn playground_html() -> HttpResponse {
    let html = r#"<!DOCTYPE html>
<html>
<head>
    <title>FlowPilot</title>
    <meta charset="UTF-8">
    <style>
        body { font-family: system-ui, sans-serif; margin: 2rem; max-width: 60rem; }
        textarea { width: 100%; height: 6rem; font-family: monospace; }
        pre { background: #f4f4f4; padding: 1rem; overflow-x: auto; }
        button { padding: 0.5rem 1.5rem; margin-top: 0.5rem; }
        .error { color: #b00020; }
    </style>
</head>
<body>
    <h1>FlowPilot</h1>
    <p>Describe a change ("add a node called Review") or paste content to diagram.</p>
    <textarea id="input" placeholder="add a node called 'Start'"></textarea><br>
    <label><input type="checkbox" id="asContent"> Treat as document content</label>
    <label>Content type:
        <select id="contentType">
            <option value="general">general</option>
            <option value="code">code</option>
            <option value="story">story</option>
        </select>
    </label><br>
    <button onclick="send()">Interpret</button>
    <p id="status"></p>
    <h2>Diagram</h2>
    <pre id="diagram"></pre>
    <h2>Command</h2>
    <pre id="command"></pre>
    <script>
        async function send() {
            const text = document.getElementById('input').value;
            const asContent = document.getElementById('asContent').checked;
            const contentType = document.getElementById('contentType').value;
            const body = asContent
                ? { content: text, contentType }
                : { command: text, contentType };
            const status = document.getElementById('status');
            status.textContent = '...';
            status.className = '';
            try {
                const res = await fetch('/api/interpret', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify(body),
                });
                const data = await res.json();
                if (!res.ok) {
                    status.textContent = data.error || 'Request failed';
                    status.className = 'error';
                    return;
                }
                status.textContent = 'ok';
                document.getElementById('diagram').textContent = data.mermaidDiagram || '';
                document.getElementById('command').textContent =
                    data.command ? JSON.stringify(data.command, null, 2) : '';
            } catch (e) {
                status.textContent = String(e);
                status.className = 'error';
            }
        }
    </script>
</body>
</html>"#;

    let header =
        Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..]).unwrap();
    Response::from_data(html.as_bytes().to_vec()).with_header(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fp_core::Command;
    use fp_ollama::OllamaError;

    fn payload(
        command: Option<&str>,
        content: Option<&str>,
        content_type: ContentType,
    ) -> InterpretRequest {
        InterpretRequest {
            command: command.map(str::to_string),
            content: content.map(str::to_string),
            content_type,
        }
    }

    #[test]
    fn missing_command_and_content_is_a_400() {
        let (status, value) = interpret_response(&payload(None, None, ContentType::General));
        assert_eq!(status, 400);
        assert_eq!(value["error"], "Command or content is required");

        let (status, _) = interpret_response(&payload(Some("   "), Some(""), ContentType::General));
        assert_eq!(status, 400);
    }

    #[test]
    fn interpret_body_always_carries_the_command() {
        let (status, value) = interpret_response(&payload(
            Some("add a node called 'Review'"),
            None,
            ContentType::General,
        ));
        assert_eq!(status, 200);
        assert_eq!(value["success"], true);
        assert_eq!(value["command"]["action"], "addNode");
        assert_eq!(value["command"]["text"], "Review");
        assert!(
            value["mermaidDiagram"]
                .as_str()
                .unwrap()
                .contains("[Review]")
        );
    }

    #[test]
    fn command_takes_priority_over_content() {
        let (status, value) = interpret_response(&payload(
            Some("add a node called 'Review'"),
            Some("The user signs up. The account is verified."),
            ContentType::General,
        ));
        assert_eq!(status, 200);
        assert_eq!(value["command"]["action"], "addNode");
        assert_eq!(value["command"]["text"], "Review");
        assert!(!value["mermaidDiagram"].as_str().unwrap().contains("signs up"));
    }

    #[test]
    fn story_content_routes_through_the_generation_rule() {
        let (status, value) = interpret_response(&payload(
            None,
            Some("The user signs up. The account is verified."),
            ContentType::Story,
        ));
        assert_eq!(status, 200);
        assert_eq!(value["command"]["action"], "generateDiagram");
        let diagram = value["mermaidDiagram"].as_str().unwrap();
        assert!(diagram.contains("node1"));
        assert!(diagram.contains("node1 --> node2"));
    }

    #[test]
    fn general_content_lands_in_the_default_rule() {
        let (status, value) = interpret_response(&payload(
            None,
            Some("The user signs up. The account is verified."),
            ContentType::General,
        ));
        assert_eq!(status, 200);
        assert_eq!(value["command"]["action"], "addNode");
    }

    #[test]
    fn missing_command_field_is_a_400() {
        let config = OllamaConfig::default();
        let (status, value) = command_response(&CommandRequest { command: None }, &config);
        assert_eq!(status, 400);
        assert_eq!(value["error"], "Command is required");
    }

    #[test]
    fn unreachable_classifier_maps_to_503_with_guidance() {
        let (status, value) = classification_response(Err(OllamaError::Unreachable {
            endpoint: "http://localhost:11434".to_string(),
        }));
        assert_eq!(status, 503);
        assert!(
            value["error"]
                .as_str()
                .unwrap()
                .contains("Make sure Ollama is running")
        );
    }

    #[test]
    fn bad_classifier_reply_maps_to_500() {
        let (status, value) = classification_response(Err(OllamaError::InvalidCommand {
            detail: "no JSON object found in response".to_string(),
        }));
        assert_eq!(status, 500);
        assert_eq!(value["error"], "Failed to process command");
    }

    #[test]
    fn classification_success_echoes_the_raw_response() {
        let raw = r#"{"action":"removeNode","id":"n1"}"#;
        let (status, value) = classification_response(Ok(Classification {
            command: Command::RemoveNode {
                id: "n1".to_string(),
            },
            raw_response: raw.to_string(),
        }));
        assert_eq!(status, 200);
        assert_eq!(value["success"], true);
        assert_eq!(value["command"]["action"], "removeNode");
        assert_eq!(value["rawResponse"], raw);
    }
}
