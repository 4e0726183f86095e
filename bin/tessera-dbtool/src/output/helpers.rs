//! Helper functions for consistent formatting across all commands.

use std::io::{self, Write};

use anyhow::Context;
use serde::Serialize;

use super::traits::Formattable;
use crate::cli::OutputFormat;

/// Renders `data` in the requested format to stdout.
pub(crate) fn output<T: Serialize + Formattable>(
    data: &T,
    format: OutputFormat,
) -> anyhow::Result<()> {
    output_to(data, format, &mut io::stdout())
}

/// Renders to a specific writer (useful for testing).
pub(crate) fn output_to<T: Serialize + Formattable, W: Write>(
    data: &T,
    format: OutputFormat,
    writer: &mut W,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Porcelain => {
            writeln!(writer, "{}", data.format_porcelain()).context("write porcelain output")?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).context("serialize to JSON")?;
            writeln!(writer, "{json}").context("write JSON output")?;
        }
    }
    Ok(())
}

/// Helper for a single `key: value` porcelain line.
pub(crate) fn porcelain_field<T: std::fmt::Display>(key: &str, value: T) -> String {
    format!("{key}: {value}")
}
