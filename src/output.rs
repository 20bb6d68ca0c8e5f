//! Output formatting utilities for the CLI.

use colored::Colorize;
use serde::Serialize;

/// Print a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print a key-value pair.
pub fn key_value(key: &str, value: &str) {
    println!("  {}: {}", key.bold(), value);
}

/// Print a section header.
pub fn section(title: &str) {
    println!("\n{}", title.bold().underline());
}

/// Print JSON output.
pub fn json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let output = serde_json::to_string_pretty(value)?;
    println!("{}", output);
    Ok(())
}

/// Print a table of data.
pub fn table<T: tabled::Tabled>(data: &[T]) {
    use tabled::{settings::Style, Table};

    if data.is_empty() {
        println!("  (no data)");
        return;
    }

    let table = Table::new(data).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Format milliseconds with two decimals.
pub fn format_ms(value: f64) -> String {
    format!("{value:.2}ms")
}

/// Format tokens per second with one decimal.
pub fn format_tps(value: f64) -> String {
    format!("{value:.1} tok/s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(123.456), "123.46ms");
        assert_eq!(format_ms(0.0), "0.00ms");
    }

    #[test]
    fn test_format_tps() {
        assert_eq!(format_tps(45.67), "45.7 tok/s");
    }
}
