//! # Load Subcommand
//!
//! Coerces and validates a raw document against a named type or media
//! type from a descriptor, printing the canonical value as JSON.
//!
//! A rejected document is not a command failure: the violations are
//! printed as a JSON report and the command exits with
//! [`EXIT_REJECTED`](crate::EXIT_REJECTED).

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tessera_core::Value;
use tessera_schema::{Catalog, CatalogError};

use crate::{read_catalog, read_input, rejection_report, to_json, EXIT_REJECTED};

/// Arguments for the load subcommand.
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Descriptor file (YAML, or JSON when the extension is `.json`).
    #[arg(long)]
    pub descriptor: PathBuf,

    /// Named type or media type identifier to load through.
    #[arg(long = "type", value_name = "NAME")]
    pub type_name: String,

    /// Input document. Reads stdin when omitted or `-`.
    #[arg(long)]
    pub input: Option<PathBuf>,
}

/// Execute the load subcommand.
pub fn run_load(args: &LoadArgs, out: &mut dyn Write) -> Result<u8> {
    let catalog = read_catalog(&args.descriptor)?;
    let raw = read_input(args.input.as_deref())?;
    load_document(&catalog, &args.type_name, &raw, out)
}

/// Load `raw` through `type_name` and write the result or the rejection
/// report to `out`.
pub fn load_document(
    catalog: &Catalog,
    type_name: &str,
    raw: &Value,
    out: &mut dyn Write,
) -> Result<u8> {
    match catalog.load(type_name, raw) {
        Ok(value) => {
            writeln!(out, "{}", to_json(&value)?)?;
            Ok(0)
        }
        Err(CatalogError::Load(error)) => {
            tracing::info!(type_name, violations = error.violations().len(), "document rejected");
            writeln!(out, "{}", serde_json::to_string_pretty(&rejection_report(&error))?)?;
            Ok(EXIT_REJECTED)
        }
        Err(other) => Err(other.into()),
    }
}
