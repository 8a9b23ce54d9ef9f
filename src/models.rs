//! Data types returned by sessions.
//!
//! These are plain serde types so front ends can hand them straight to JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OctaveError, Result};

/// Shape of a variable in the interpreter's workspace.
///
/// Derived on demand by probing the interpreter; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    /// Undefined, empty, or not numeric-shaped.
    None,
    Scalar,
    /// Exactly one column.
    Vector,
    /// More than one column.
    Matrix,
}

impl ResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::None => "None",
            ResultType::Scalar => "Scalar",
            ResultType::Vector => "Vector",
            ResultType::Matrix => "Matrix",
        }
    }
}

/// Dense matrix stored column by column, the order it is fetched in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Matrix {
    columns: Vec<Vec<f64>>,
}

impl Matrix {
    /// Build from columns of equal length.
    pub fn from_columns(columns: Vec<Vec<f64>>) -> Result<Self> {
        if let Some(first) = columns.first() {
            if let Some(bad) = columns.iter().find(|c| c.len() != first.len()) {
                return Err(OctaveError::parse(
                    "matrix",
                    format!(
                        "ragged columns: expected {} rows, found {}",
                        first.len(),
                        bad.len()
                    ),
                ));
            }
        }
        Ok(Self { columns })
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(OctaveError::parse(
                "matrix",
                format!("ragged rows: expected {} columns, found {}", width, bad.len()),
            ));
        }
        let columns = (0..width)
            .map(|c| rows.iter().map(|row| row[c]).collect())
            .collect();
        Ok(Self { columns })
    }

    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.columns.get(col)?.get(row).copied()
    }

    pub fn column(&self, col: usize) -> Option<&[f64]> {
        self.columns.get(col).map(Vec::as_slice)
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows())
            .map(|r| self.columns.iter().map(|col| col[r]).collect())
            .collect()
    }
}

/// Which result text stops a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStopRule {
    /// Stop at the first command whose output mentions `error`.
    #[default]
    OnErrorText,
    /// Stop at the first command whose output does NOT mention `error`.
    ///
    /// Reproduces the legacy wrapper's inverted check, which in practice
    /// stops after the first successful command.
    WithoutErrorText,
}

impl BatchStopRule {
    pub fn should_stop(self, output: &str) -> bool {
        let mentions_error = output.contains("error");
        match self {
            BatchStopRule::OnErrorText => mentions_error,
            BatchStopRule::WithoutErrorText => !mentions_error,
        }
    }
}

/// Result of running a list of commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// No commands were given.
    Empty,
    /// Every command ran and none tripped the stop rule.
    Completed,
    /// Command `index` tripped the stop rule; later commands were not sent.
    Stopped { index: usize, output: String },
}

impl BatchOutcome {
    pub fn stopped_at(&self) -> Option<usize> {
        match self {
            BatchOutcome::Stopped { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Notification sent to restart observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRestarted {
    /// Restarts so far in this session, starting at 1.
    pub restarts: u64,
    /// Exit code of the process that died, when it had one.
    pub exit_code: Option<i32>,
    pub pid: u32,
    pub restarted_at: DateTime<Utc>,
}
