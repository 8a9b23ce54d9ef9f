//! Octave literal syntax for host values.

use std::path::Path;

use crate::parse::normalize_decimal;

/// Separator between vector elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// `[1,2,3]`
    Row,
    /// `[1;2;3]`
    Column,
}

impl Orientation {
    fn separator(self) -> &'static str {
        match self {
            Orientation::Row => ",",
            Orientation::Column => ";",
        }
    }
}

/// Shortest representation that round-trips (`1.0`, `0.1`, `1e300`, `inf`, `NaN`).
pub fn scalar(value: f64) -> String {
    format!("{:?}", value)
}

pub fn scalar_text(text: &str) -> String {
    normalize_decimal(text.trim())
}

pub fn boolean(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

pub fn vector(values: &[f64], orientation: Orientation) -> String {
    let items: Vec<String> = values.iter().copied().map(scalar).collect();
    format!("[{}]", items.join(orientation.separator()))
}

/// Pre-formatted elements; blank entries are skipped.
pub fn vector_text<S: AsRef<str>>(values: &[S], orientation: Orientation) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|v| v.as_ref().trim())
        .filter(|v| !v.is_empty())
        .map(scalar_text)
        .collect();
    format!("[{}]", items.join(orientation.separator()))
}

/// Rows separated by `;`, elements by `,`.
pub fn matrix(rows: &[Vec<f64>]) -> String {
    let rows: Vec<String> = rows
        .iter()
        .map(|row| {
            row.iter()
                .copied()
                .map(scalar)
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect();
    format!("[{}]", rows.join(";"))
}

pub fn matrix_text<S: AsRef<str>>(rows: &[Vec<S>]) -> String {
    let rows: Vec<String> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| scalar_text(v.as_ref()))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect();
    format!("[{}]", rows.join(";"))
}

/// Double-quoted string literal with backslash escapes.
pub fn string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// `name = literal;` (the semicolon suppresses the echo).
pub fn assignment(name: &str, literal: &str) -> String {
    format!("{} = {};", name, literal)
}

/// `load("path"); command`
pub fn load_then(path: &Path, command: &str) -> String {
    format!("load({}); {}", string(&path.to_string_lossy()), command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalar() {
        assert_eq!(scalar(1.0), "1.0");
        assert_eq!(scalar(-0.25), "-0.25");
        assert_eq!(scalar(0.1), "0.1");
        assert_eq!(scalar(1e300), "1e300");
        assert_eq!(scalar(f64::INFINITY), "inf");
        assert_eq!(scalar(f64::NAN), "NaN");
    }

    #[test]
    fn test_scalar_text_normalizes_comma() {
        assert_eq!(scalar_text(" 3,14 "), "3.14");
    }

    #[test]
    fn test_vectors() {
        assert_eq!(vector(&[1.0, 2.0, 3.0], Orientation::Row), "[1.0,2.0,3.0]");
        assert_eq!(vector(&[1.5, -2.0], Orientation::Column), "[1.5;-2.0]");
        assert_eq!(vector(&[], Orientation::Row), "[]");
    }

    #[test]
    fn test_vector_text_skips_blanks() {
        assert_eq!(
            vector_text(&["1,5", "", "2", "  "], Orientation::Column),
            "[1.5;2]"
        );
    }

    #[test]
    fn test_matrices() {
        assert_eq!(
            matrix(&[vec![1.0, 2.0], vec![3.0, 4.0]]),
            "[1.0,2.0;3.0,4.0]"
        );
        assert_eq!(
            matrix_text(&[vec!["1", "2,5"], vec!["3", "4"]]),
            "[1,2.5;3,4]"
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(string("plain"), "\"plain\"");
        assert_eq!(string("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(string("C:\\data"), "\"C:\\\\data\"");
        assert_eq!(string("a\nb"), "\"a\\nb\"");
    }

    #[test]
    fn test_assignment_and_load() {
        assert_eq!(assignment("x", "5.0"), "x = 5.0;");
        assert_eq!(
            load_then(Path::new("C:\\data\\run.mat"), "disp(x)"),
            "load(\"C:\\\\data\\\\run.mat\"); disp(x)"
        );
    }
}
