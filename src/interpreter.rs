//! Typed access to an Octave workspace.
//!
//! `Interpreter` needs only a raw `execute`; every getter, setter and probe
//! is a provided method built on top of it. `Session` implements it against
//! a live process, and tests implement it with canned replies.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::config::VectorParsing;
use crate::encode::{self, Orientation};
use crate::error::{OctaveError, Result};
use crate::models::{BatchOutcome, BatchStopRule, Matrix, ResultType};
use crate::parse;

/// Reserved workspace variable used by [`Interpreter::result_type`].
pub const PROBE_VARIABLE: &str = "octave_bridge_probe_result";

pub trait Interpreter {
    /// Run `command` and return the text it printed.
    ///
    /// `timeout` of `None` waits indefinitely.
    fn execute(&mut self, command: &str, timeout: Option<Duration>) -> Result<String>;

    /// How vector output is parsed by the getters.
    fn vector_parsing(&self) -> VectorParsing {
        VectorParsing::default()
    }

    /// Load a data file into the workspace, then run `command`.
    fn execute_file(
        &mut self,
        command: &str,
        path: &Path,
        timeout: Option<Duration>,
    ) -> Result<String> {
        self.execute(&encode::load_then(path, command), timeout)
    }

    /// Run `commands` in order, stopping at the first one that trips `rule`.
    ///
    /// A `CommandError` counts as that command's output; every other error
    /// aborts the batch.
    fn execute_commands<S: AsRef<str>>(
        &mut self,
        commands: &[S],
        timeout: Option<Duration>,
        rule: BatchStopRule,
    ) -> Result<BatchOutcome>
    where
        Self: Sized,
    {
        if commands.is_empty() {
            return Ok(BatchOutcome::Empty);
        }

        for (index, command) in commands.iter().enumerate() {
            let output = match self.execute(command.as_ref(), timeout) {
                Ok(text) => text,
                Err(OctaveError::Command(text)) => text,
                Err(e) => return Err(e),
            };

            if rule.should_stop(&output) {
                debug!("Batch stopped at command {}", index);
                return Ok(BatchOutcome::Stopped { index, output });
            }
        }

        Ok(BatchOutcome::Completed)
    }

    fn get_scalar(&mut self, name: &str, timeout: Option<Duration>) -> Result<f64> {
        let text = self.execute(name, timeout)?;
        parse::scalar(&text)
    }

    /// True when the scalar value is strictly positive.
    fn get_boolean(&mut self, name: &str, timeout: Option<Duration>) -> Result<bool> {
        Ok(self.get_scalar(name, timeout)? > 0.0)
    }

    fn get_string(&mut self, name: &str, timeout: Option<Duration>) -> Result<String> {
        let text = self.execute(name, timeout)?;
        parse::string_value(name, &text)
    }

    fn get_column_vector(&mut self, name: &str, timeout: Option<Duration>) -> Result<Vec<f64>> {
        let text = self.execute(name, timeout)?;
        parse::vector(&text, self.vector_parsing())
    }

    fn get_row_vector(&mut self, name: &str, timeout: Option<Duration>) -> Result<Vec<f64>> {
        self.get_column_vector(name, timeout)
    }

    /// Fetch a matrix one column at a time: one query for the width, then
    /// one per column.
    fn get_matrix(&mut self, name: &str, timeout: Option<Duration>) -> Result<Matrix> {
        let first_row = self.execute(&format!("{}(1,:)", name), timeout)?;
        let width = parse::vector(&first_row, VectorParsing::CollectAll)?.len();

        let mut columns = Vec::with_capacity(width);
        for k in 1..=width {
            columns.push(self.get_column_vector(&format!("{}(:, {})", name, k), timeout)?);
        }
        Matrix::from_columns(columns)
    }

    /// Classify `name` with at most three probes.
    fn result_type(&mut self, name: &str, timeout: Option<Duration>) -> Result<ResultType> {
        let is_scalar = match probe(self, "isscalar", name, timeout) {
            Ok(value) => value,
            Err(OctaveError::Command(message)) => {
                debug!("{} is not defined: {}", name, message.trim());
                return Ok(ResultType::None);
            }
            Err(e) => return Err(e),
        };
        if is_scalar > 0.0 {
            return Ok(ResultType::Scalar);
        }

        if probe(self, "ismatrix", name, timeout)? > 0.0 {
            let columns = probe(self, "columns", name, timeout)? as i64;
            if columns == 1 {
                return Ok(ResultType::Vector);
            } else if columns > 1 {
                return Ok(ResultType::Matrix);
            }
        }

        Ok(ResultType::None)
    }

    fn set_boolean(&mut self, name: &str, value: bool, timeout: Option<Duration>) -> Result<()> {
        assign(self, name, encode::boolean(value), timeout)
    }

    fn set_scalar(&mut self, name: &str, value: f64, timeout: Option<Duration>) -> Result<()> {
        assign(self, name, &encode::scalar(value), timeout)
    }

    /// Scalar given as text; `,` decimal separators are accepted.
    fn set_scalar_text(&mut self, name: &str, value: &str, timeout: Option<Duration>) -> Result<()> {
        assign(self, name, &encode::scalar_text(value), timeout)
    }

    fn set_column_vector(
        &mut self,
        name: &str,
        values: &[f64],
        timeout: Option<Duration>,
    ) -> Result<()> {
        assign(self, name, &encode::vector(values, Orientation::Column), timeout)
    }

    fn set_column_vector_text(
        &mut self,
        name: &str,
        values: &[String],
        timeout: Option<Duration>,
    ) -> Result<()> {
        assign(self, name, &encode::vector_text(values, Orientation::Column), timeout)
    }

    fn set_row_vector(&mut self, name: &str, values: &[f64], timeout: Option<Duration>) -> Result<()> {
        assign(self, name, &encode::vector(values, Orientation::Row), timeout)
    }

    fn set_row_vector_text(
        &mut self,
        name: &str,
        values: &[String],
        timeout: Option<Duration>,
    ) -> Result<()> {
        assign(self, name, &encode::vector_text(values, Orientation::Row), timeout)
    }

    /// `rows[i]` is row `i` of the matrix.
    fn set_matrix(&mut self, name: &str, rows: &[Vec<f64>], timeout: Option<Duration>) -> Result<()> {
        assign(self, name, &encode::matrix(rows), timeout)
    }

    fn set_matrix_text(
        &mut self,
        name: &str,
        rows: &[Vec<String>],
        timeout: Option<Duration>,
    ) -> Result<()> {
        assign(self, name, &encode::matrix_text(rows), timeout)
    }

    fn set_string(&mut self, name: &str, value: &str, timeout: Option<Duration>) -> Result<()> {
        assign(self, name, &encode::string(value), timeout)
    }

    fn clear_all_variables(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.execute("clear", timeout).map(|_| ())
    }
}

fn assign<I: Interpreter + ?Sized>(
    interpreter: &mut I,
    name: &str,
    literal: &str,
    timeout: Option<Duration>,
) -> Result<()> {
    interpreter
        .execute(&encode::assignment(name, literal), timeout)
        .map(|_| ())
}

/// `probe = function(name)` echoes `probe = <value>`, parsed in place.
fn probe<I: Interpreter + ?Sized>(
    interpreter: &mut I,
    function: &str,
    name: &str,
    timeout: Option<Duration>,
) -> Result<f64> {
    let command = format!("{} = {}({})", PROBE_VARIABLE, function, name);
    let text = interpreter.execute(&command, timeout)?;
    parse::scalar(&text)
}
