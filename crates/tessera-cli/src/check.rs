//! # Check Subcommand
//!
//! Compiles a descriptor and lists the named types and media types it
//! declares, one per line. A descriptor that fails to compile is reported
//! with the path of the offending definition.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::read_catalog;

/// Arguments for the check subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Descriptor file (YAML, or JSON when the extension is `.json`).
    #[arg(long)]
    pub descriptor: PathBuf,

    /// Print only the summary line.
    #[arg(long)]
    pub quiet: bool,
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs, out: &mut dyn Write) -> Result<u8> {
    let catalog = read_catalog(&args.descriptor)?;

    if !args.quiet {
        for name in catalog.type_names() {
            writeln!(out, "type {name} ({})", describe(&catalog, name))?;
        }
        for identifier in catalog.media_type_identifiers() {
            let views = catalog
                .media_type(identifier.as_str())
                .map(|media| media.view_names().join(", "))
                .unwrap_or_default();
            writeln!(out, "media {identifier} [{views}]")?;
        }
    }

    writeln!(
        out,
        "OK: {} types, {} media types",
        catalog.type_names().count(),
        catalog.media_type_identifiers().count()
    )?;
    Ok(0)
}

fn describe(catalog: &tessera_schema::Catalog, name: &str) -> String {
    catalog
        .type_of(name)
        .map(|ty| match ty.object() {
            Some(object) => format!("object, {} attributes", object.len()),
            None => ty.name(),
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"
types:
  Count: { type: integer, minimum: 0 }
  Tag:
    type: object
    properties:
      label: { type: string, required: true }
media_types:
  - identifier: application/vnd.example.tag+json
    name: Tag
    collection: true
    views:
      default: { attributes: [label] }
"#;

    fn args(dir: &tempfile::TempDir, quiet: bool) -> CheckArgs {
        let descriptor = dir.path().join("schema.yaml");
        std::fs::write(&descriptor, DESCRIPTOR).unwrap();
        CheckArgs { descriptor, quiet }
    }

    #[test]
    fn lists_declarations() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        assert_eq!(run_check(&args(&dir, false), &mut out).unwrap(), 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("type Count (integer)"), "{text}");
        assert!(text.contains("type Tag (object, 1 attributes)"), "{text}");
        assert!(text.contains("media application/vnd.example.tag+json [default]"), "{text}");
        assert!(text.ends_with("OK: 2 types, 2 media types\n"), "{text}");
    }

    #[test]
    fn quiet_prints_summary_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        run_check(&args(&dir, true), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "OK: 2 types, 2 media types\n");
    }
}
