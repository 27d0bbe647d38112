//! CLI binary for assembling a document via stdin.
//!
//! Usage:
//!   echo '{"document": {...}, "context": {...}}' | cargo run --bin assemble
//!
//! Input (JSON on stdin):
//!   - document: Object: the template document tree
//!   - context: Object: placeholder values (strings, numbers, booleans, lists)
//!   - conditions: Optional<Object>: conditional placeholders by name
//!
//! Output (JSON on stdout):
//!   - document: Object: the assembled document tree
//!   - text: String: plain-text rendering with numbering labels
//!   - report: Object: what each stage did, including warnings
//!   - error: Optional<String>: error message if assembly failed
//!
//! Configuration is read from `AKTE_*` environment variables; log output
//! goes to stderr and honors `RUST_LOG`.

use akte_engine::{
    AssemblyConfig, AssemblyReport, ConditionalPlaceholders, Document, DocumentAssembler,
    PlaceholderContext,
};
use std::io::Read;
use tracing_subscriber::EnvFilter;

#[derive(serde::Deserialize)]
struct AssembleRequest {
    document: Document,
    #[serde(default)]
    context: serde_json::Value,
    #[serde(default)]
    conditions: Option<ConditionalPlaceholders>,
}

#[derive(serde::Serialize)]
struct AssembleResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<AssemblyReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn error_response(msg: String) -> AssembleResponse {
    AssembleResponse {
        document: None,
        text: None,
        report: None,
        error: Some(msg),
    }
}

fn fail(msg: String) -> ! {
    let resp = error_response(msg);
    println!("{}", serde_json::to_string(&resp).unwrap_or_default());
    std::process::exit(1);
}

fn read_request(mut reader: impl Read) -> akte_engine::Result<AssembleRequest> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    Ok(serde_json::from_str(&input)?)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let request = match read_request(std::io::stdin()) {
        Ok(r) => r,
        Err(e) => fail(format!("Failed to read request: {e}")),
    };

    let context = if request.context.is_null() {
        PlaceholderContext::new()
    } else {
        match PlaceholderContext::from_json(&request.context) {
            Ok(ctx) => ctx,
            Err(e) => fail(format!("Invalid context: {e}")),
        }
    };

    let mut assembler = DocumentAssembler::new(AssemblyConfig::from_env());
    if let Some(conditions) = request.conditions {
        assembler = assembler.with_conditions(conditions);
    }

    match assembler.assemble(&request.document, &context) {
        Ok(outcome) => {
            let resp = AssembleResponse {
                text: Some(outcome.document.to_plain_text()),
                document: Some(outcome.document),
                report: Some(outcome.report),
                error: None,
            };
            match serde_json::to_string(&resp) {
                Ok(json) => println!("{json}"),
                Err(e) => fail(format!("Failed to serialize response: {e}")),
            }
        }
        Err(e) => fail(format!("Assembly failed: {e}")),
    }
}
