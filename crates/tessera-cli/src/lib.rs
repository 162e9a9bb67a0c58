//! # tessera-cli — Command-Line Front End
//!
//! Provides the `tessera` binary, a thin driver over the two boundary calls
//! of a compiled [`Catalog`]: load a raw document through a named type, and
//! render a document through a media type view.
//!
//! ## Subcommands
//!
//! - `tessera check` — Compile a descriptor and list what it declares.
//! - `tessera load` — Coerce and validate a document against a named type.
//! - `tessera render` — Project a document through a media type view.
//!
//! ```bash
//! tessera check --descriptor schema.yaml
//! tessera load --descriptor schema.yaml --type Account --input account.json
//! cat account.json | tessera render --descriptor schema.yaml \
//!     --media application/vnd.example.account+json --view link
//! ```
//!
//! ## Exit Codes
//!
//! `0` on success, `1` on a definition or I/O failure, `2` when the input
//! document is rejected (a client-side error).
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers in each module.
//! - Handlers write to a caller-supplied writer so they can be tested
//!   without capturing stdout.
//! - No schema logic here: everything delegates to `tessera-schema`.

pub mod check;
pub mod load;
pub mod render;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tessera_core::{LoadError, Value};
use tessera_schema::{Catalog, Descriptor};

/// Exit code for a document rejected as client input.
pub const EXIT_REJECTED: u8 = 2;

/// Read and compile a descriptor file.
pub fn read_catalog(path: &Path) -> Result<Catalog> {
    let descriptor = Descriptor::from_path(path)
        .with_context(|| format!("failed to read descriptor {}", path.display()))?;
    let catalog = descriptor
        .compile()
        .with_context(|| format!("failed to compile descriptor {}", path.display()))?;
    tracing::debug!(path = %path.display(), "descriptor compiled");
    Ok(catalog)
}

/// Read an input document from `path`, or from stdin when `path` is
/// `None` or `-`.
///
/// Files ending in `.json` are parsed as JSON; everything else, including
/// stdin, is parsed as YAML (which accepts JSON documents too).
pub fn read_input(path: Option<&Path>) -> Result<Value> {
    match path {
        Some(path) if path != Path::new("-") => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read input {}", path.display()))?;
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            parse_document(&text, is_json)
                .with_context(|| format!("failed to parse input {}", path.display()))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read input from stdin")?;
            parse_document(&text, false).context("failed to parse input from stdin")
        }
    }
}

/// Parse a document as JSON or YAML.
pub fn parse_document(text: &str, json: bool) -> Result<Value> {
    if json {
        Ok(serde_json::from_str(text)?)
    } else {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Pretty JSON text for a value.
pub fn to_json(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize output")
}

/// Machine-readable report of a rejected document.
///
/// ```json
/// {"errors": [{"path": "id", "message": "id: below minimum ..."}]}
/// ```
pub fn rejection_report(error: &LoadError) -> serde_json::Value {
    let errors: Vec<serde_json::Value> = error
        .violations()
        .iter()
        .map(|v| {
            serde_json::json!({
                "path": v.path.to_string(),
                "message": v.to_string(),
            })
        })
        .collect();
    serde_json::json!({ "errors": errors })
}

/// Combine a handler's outcome with the final flush of its output. A
/// failed flush fails the command even when the handler succeeded.
pub fn finish(result: Result<u8>, flushed: std::io::Result<()>) -> Result<u8> {
    let code = result?;
    flushed.context("failed to flush output")?;
    Ok(code)
}
