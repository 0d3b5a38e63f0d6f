use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::model::{CoordsMap, ReportEntry};

/// Render the coordinate map as a source-embeddable assignment:
/// `const coordsMap = { ... };` with 4-space indentation and keys in
/// insertion order. With `append_export`, an ES-module re-export of the
/// same binding follows for consumers that import the file.
pub fn coords_map_js(coords: &CoordsMap, append_export: bool) -> Result<String> {
    let json = pretty_json(coords).context("Failed to serialize coordinate map")?;

    let mut out = format!("const coordsMap = {json};\n");
    if append_export {
        out.push_str("\nexport default coordsMap;\n");
    }

    Ok(out)
}

/// Render the fallback report for `not_found.json`.
pub fn report_json(report: &[ReportEntry]) -> Result<String> {
    pretty_json(&report).context("Failed to serialize fallback report")
}

fn pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;

    Ok(String::from_utf8(buf)?)
}
