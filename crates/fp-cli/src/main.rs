#![forbid(unsafe_code)]

//! FlowPilot CLI - turn natural language and documents into flowcharts.
//!
//! # Commands
//!
//! - `interpret`: Classify an instruction locally and print the command JSON
//! - `generate`: Turn a document or source file into diagram text
//! - `parse`: Reverse-parse diagram text and report the recovered graph
//! - `fmt`: Re-emit diagram text in canonical form
//! - `classify`: Classify an instruction with a local Ollama model
//! - `session`: Interactive loop that applies instructions to a graph
//! - `serve`: Start the local HTTP service (requires `serve` feature)

mod session;

#[cfg(feature = "serve")]
mod serve;

use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fp_dialect::{format, parse};
use fp_intent::{ContentType, generate, interpret};
use fp_ollama::{OllamaClient, OllamaConfig};
use serde_json::json;
use tracing::{debug, info, warn};

/// FlowPilot CLI - turn natural language and documents into flowcharts.
#[derive(Debug, Parser)]
#[command(
    name = "fp-cli",
    version,
    about = "FlowPilot CLI - turn natural language and documents into flowcharts",
    long_about = "Describe a flowchart in plain language, or feed in a document or source\n\
        file, and get back a structured command and diagram text in the FlowPilot\n\
        flowchart dialect."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interpret an instruction locally and print the structured command.
    Interpret {
        /// Input file path, inline text, or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// How to treat the input when no command rule matches
        #[arg(short, long, value_enum, default_value = "general")]
        content_type: ContentTypeArg,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Generate diagram text from a document or source file.
    Generate {
        /// Input file path, inline text, or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// Content flavor: code scans definitions, story chains sentences
        #[arg(short, long, value_enum, default_value = "story")]
        content_type: ContentTypeArg,

        /// Output file path. If omitted, writes to stdout.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Reverse-parse diagram text and report the recovered graph as JSON.
    Parse {
        /// Input file path, inline text, or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// Output the full node/edge lists (default is a summary)
        #[arg(long)]
        full: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Parse diagram text and re-emit it in canonical form.
    Fmt {
        /// Input file path, inline text, or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// Output file path. If omitted, writes to stdout.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Classify an instruction with a local Ollama model.
    Classify {
        /// Input file path, inline text, or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// Ollama endpoint
        #[arg(long, default_value = "http://localhost:11434")]
        endpoint: String,

        /// Model name
        #[arg(long, default_value = "vivi:latest")]
        model: String,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Ask for a whole diagram instead of a single command
        #[arg(long)]
        diagram: bool,
    },

    /// Interactive session: read instructions from stdin, mutate the graph,
    /// print the diagram after each change.
    Session {
        /// How to treat multi-line pasted content
        #[arg(short, long, value_enum, default_value = "general")]
        content_type: ContentTypeArg,
    },

    /// Start the local HTTP service (requires `serve` feature).
    #[cfg(feature = "serve")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Ollama endpoint used by /api/command
        #[arg(long, default_value = "http://localhost:11434")]
        endpoint: String,

        /// Model name used by /api/command
        #[arg(long, default_value = "vivi:latest")]
        model: String,
    },
}

/// Content flavor accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum ContentTypeArg {
    General,
    Code,
    Story,
}

impl From<ContentTypeArg> for ContentType {
    fn from(arg: ContentTypeArg) -> Self {
        match arg {
            ContentTypeArg::General => Self::General,
            ContentTypeArg::Code => Self::Code,
            ContentTypeArg::Story => Self::Story,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Interpret {
            input,
            content_type,
            pretty,
        } => cmd_interpret(&input, content_type.into(), pretty),

        Command::Generate {
            input,
            content_type,
            output,
        } => cmd_generate(&input, content_type.into(), output.as_deref()),

        Command::Parse {
            input,
            full,
            pretty,
        } => cmd_parse(&input, full, pretty),

        Command::Fmt { input, output } => cmd_fmt(&input, output.as_deref()),

        Command::Classify {
            input,
            endpoint,
            model,
            timeout,
            diagram,
        } => cmd_classify(&input, endpoint, model, timeout, diagram),

        Command::Session { content_type } => session::run(content_type.into()),

        #[cfg(feature = "serve")]
        Command::Serve {
            port,
            host,
            endpoint,
            model,
        } => serve::run(
            &host,
            port,
            OllamaConfig {
                endpoint,
                model,
                ..OllamaConfig::default()
            },
        ),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .try_init();
}

fn load_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else if Path::new(input).exists() {
        std::fs::read_to_string(input).context(format!("Failed to read file: {input}"))
    } else {
        // Treat as inline text
        Ok(input.to_string())
    }
}

fn write_output(output: Option<&str>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).context(format!("Failed to write to: {path}"))?;
            info!("Wrote output to: {path}");
        }
        None => {
            io::stdout()
                .write_all(content.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}

// =============================================================================
// Command: interpret
// =============================================================================

fn cmd_interpret(input: &str, content_type: ContentType, pretty: bool) -> Result<()> {
    let source = load_input(input)?;
    if source.trim().is_empty() {
        anyhow::bail!("Command or content is required");
    }

    let interpretation = interpret(source.trim(), content_type);

    debug!(
        "Matched rule '{}' with {} fallback(s)",
        interpretation.rule,
        interpretation.fallbacks.len()
    );
    for field in &interpretation.fallbacks {
        warn!("No pattern matched for '{field}'; used fallback value");
    }

    let response = json!({
        "success": true,
        "command": interpretation.command,
        "mermaidDiagram": interpretation.command.mermaid_syntax(),
    });
    print_json(&response, pretty)
}

// =============================================================================
// Command: generate
// =============================================================================

fn cmd_generate(input: &str, content_type: ContentType, output: Option<&str>) -> Result<()> {
    let source = load_input(input)?;
    if source.trim().is_empty() {
        anyhow::bail!("Content is required");
    }

    let diagram = generate(&source, content_type);
    info!(
        "Generated {} statement(s) from {} input",
        diagram.lines().count().saturating_sub(1),
        content_type.as_str()
    );
    write_output(output, &diagram)
}

// =============================================================================
// Command: parse
// =============================================================================

fn cmd_parse(input: &str, full: bool, pretty: bool) -> Result<()> {
    let source = load_input(input)?;
    let outcome = parse(&source);

    for warning in &outcome.warnings {
        warn!("Parse warning: {warning}");
    }

    let value = if full {
        serde_json::to_value(&outcome)?
    } else {
        json!({
            "node_count": outcome.nodes.len(),
            "edge_count": outcome.edges.len(),
            "warning_count": outcome.warnings.len(),
            "warnings": outcome.warnings,
        })
    };
    print_json(&value, pretty)
}

// =============================================================================
// Command: fmt
// =============================================================================

fn cmd_fmt(input: &str, output: Option<&str>) -> Result<()> {
    let source = load_input(input)?;
    let outcome = parse(&source);

    for warning in &outcome.warnings {
        warn!("Parse warning: {warning}");
    }

    if outcome.nodes.is_empty() {
        anyhow::bail!("No parseable nodes were found; refusing to emit an empty diagram");
    }

    write_output(output, &format(&outcome.nodes, &outcome.edges))
}

// =============================================================================
// Command: classify
// =============================================================================

fn cmd_classify(
    input: &str,
    endpoint: String,
    model: String,
    timeout: u64,
    diagram: bool,
) -> Result<()> {
    let source = load_input(input)?;
    if source.trim().is_empty() {
        anyhow::bail!("Command is required");
    }

    let client = OllamaClient::new(OllamaConfig {
        endpoint,
        model,
        timeout_seconds: timeout,
    })?;

    if diagram {
        let diagram_text = client
            .generate_diagram(source.trim())
            .context("Failed to generate a diagram with Ollama")?;
        println!("{diagram_text}");
        return Ok(());
    }

    let classification = client.classify(source.trim())?;
    info!("Classified instruction via {}", client.config().endpoint);

    let response = json!({
        "success": true,
        "command": classification.command,
        "rawResponse": classification.raw_response,
    });
    print_json(&response, false)
}
