//! Turning Octave's printed output into numbers.
//!
//! This is deliberately naive string slicing, not a grammar for Octave's
//! display format: it handles what `name`, `name(1,:)` and `name(:, k)`
//! print for real-valued data.

use crate::config::VectorParsing;
use crate::error::{OctaveError, Result};

/// Accept `,` as a decimal separator.
pub fn normalize_decimal(text: &str) -> String {
    text.replace(',', ".")
}

fn number(token: &str, expected: &'static str, whole: &str) -> Result<f64> {
    normalize_decimal(token.trim())
        .parse::<f64>()
        .map_err(|_| OctaveError::parse(expected, whole.trim()))
}

/// Value after the last `=` (`x = 3.5` -> 3.5). Text without `=` is parsed whole.
pub fn scalar(text: &str) -> Result<f64> {
    let value = text.rfind('=').map_or(text, |i| &text[i + 1..]);
    number(value, "scalar", text)
}

/// Numbers printed for a vector query, in order.
pub fn vector(text: &str, mode: VectorParsing) -> Result<Vec<f64>> {
    match mode {
        VectorParsing::CollectAll => collect_all(text),
        VectorParsing::LastTokenPerLine => last_token_per_line(text),
    }
}

fn is_header(line: &str) -> bool {
    line.contains('=') || line.starts_with("Column")
}

fn collect_all(text: &str) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() || is_header(line) {
            continue;
        }
        for token in line.split_whitespace() {
            values.push(number(token, "vector", text)?);
        }
    }
    Ok(values)
}

fn last_token_per_line(text: &str) -> Result<Vec<f64>> {
    text.split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_whitespace().last() {
            Some(token) => number(token, "vector", text),
            None => Ok(0.0),
        })
        .collect()
}

/// Text after `name =` on the first line that starts with `name`.
pub fn string_value(name: &str, text: &str) -> Result<String> {
    text.lines()
        .map(str::trim)
        .find_map(|line| {
            line.strip_prefix(name)?
                .trim_start()
                .strip_prefix('=')
                .map(|v| v.trim().to_string())
        })
        .ok_or_else(|| OctaveError::parse("string", text.trim()))
}
