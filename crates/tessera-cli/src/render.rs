//! # Render Subcommand
//!
//! Projects a document through a media type view and prints the result as
//! JSON. With `--load`, the document is first loaded through the media
//! type, so raw input (string-typed numbers, omitted defaults) is accepted.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tessera_core::Value;
use tessera_schema::{Catalog, CatalogError, DEFAULT_VIEW};

use crate::{read_catalog, read_input, rejection_report, to_json, EXIT_REJECTED};

/// Arguments for the render subcommand.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Descriptor file (YAML, or JSON when the extension is `.json`).
    #[arg(long)]
    pub descriptor: PathBuf,

    /// Media type identifier.
    #[arg(long)]
    pub media: String,

    /// View to render through.
    #[arg(long, default_value = DEFAULT_VIEW)]
    pub view: String,

    /// Load the document through the media type before rendering.
    #[arg(long)]
    pub load: bool,

    /// Input document. Reads stdin when omitted or `-`.
    #[arg(long)]
    pub input: Option<PathBuf>,
}

/// Execute the render subcommand.
pub fn run_render(args: &RenderArgs, out: &mut dyn Write) -> Result<u8> {
    let catalog = read_catalog(&args.descriptor)?;
    let raw = read_input(args.input.as_deref())?;
    render_document(&catalog, &args.media, &args.view, args.load, &raw, out)
}

/// Render `value` through `view` of `media`, optionally loading it first.
pub fn render_document(
    catalog: &Catalog,
    media: &str,
    view: &str,
    load: bool,
    value: &Value,
    out: &mut dyn Write,
) -> Result<u8> {
    let loaded;
    let value = if load {
        loaded = match catalog.load(media, value) {
            Ok(loaded) => loaded,
            Err(CatalogError::Load(error)) => {
                writeln!(out, "{}", serde_json::to_string_pretty(&rejection_report(&error))?)?;
                return Ok(EXIT_REJECTED);
            }
            Err(other) => return Err(other.into()),
        };
        &loaded
    } else {
        value
    };

    let rendered = catalog
        .render(media, value, view)
        .with_context(|| format!("failed to render {media} through view {view:?}"))?;
    writeln!(out, "{}", to_json(&rendered)?)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tessera_schema::Descriptor;

    const MEDIA: &str = "application/vnd.example.user+json";

    fn catalog() -> Catalog {
        Descriptor::from_yaml_str(
            r#"
media_types:
  - identifier: application/vnd.example.user+json
    attributes:
      id:    { type: integer, required: true }
      name:  { type: string }
      email: { type: string, format: email }
    collection: true
    views:
      default: { attributes: [id, name, email] }
      link:    { attributes: [id] }
"#,
        )
        .unwrap()
        .compile()
        .unwrap()
    }

    fn render(view: &str, load: bool, value: serde_json::Value) -> Result<(u8, String)> {
        let mut out = Vec::new();
        let code = render_document(&catalog(), MEDIA, view, load, &Value::from(value), &mut out)?;
        Ok((code, String::from_utf8(out).unwrap()))
    }

    #[test]
    fn renders_through_named_view() {
        let (code, text) = render("link", false, json!({"id": 3, "name": "Ada"})).unwrap();
        assert_eq!(code, 0);
        let out: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(out, json!({"id": 3}));
    }

    #[test]
    fn load_flag_coerces_first() {
        let (_, text) = render("default", false, json!({"id": "3"})).unwrap();
        let out: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(out, json!({"id": "3"}));

        let (code, text) = render("default", true, json!({"id": "3"})).unwrap();
        assert_eq!(code, 0);
        let out: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(out, json!({"id": 3}));
    }

    #[test]
    fn load_flag_reports_rejection() {
        let (code, text) = render("default", true, json!({"email": "nope"})).unwrap();
        assert_eq!(code, EXIT_REJECTED);
        assert!(text.contains("missing required: id"), "{text}");
    }

    #[test]
    fn unknown_view_fails() {
        let err = render("full", false, json!({"id": 1})).unwrap_err();
        assert!(format!("{err:#}").contains("full"));
    }
}
