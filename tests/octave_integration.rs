//! Integration tests against a real Octave install.
//!
//! Skipped when `octave-cli` is not on PATH or when
//! `OCTAVE_BRIDGE_SKIP_OCTAVE_TESTS` is set.

use std::process::{Command, Stdio};
use std::time::Duration;

use octave_bridge::{BatchOutcome, BatchStopRule, Interpreter, OctaveError, ResultType, Session, SessionConfig};
use pretty_assertions::assert_eq;

const TIMEOUT: Option<Duration> = Some(Duration::from_secs(20));
const TOLERANCE: f64 = 1e-9;

/// Check if Octave tests should be skipped (e.g., in CI without Octave).
fn should_skip_octave_tests() -> bool {
    std::env::var_os("OCTAVE_BRIDGE_SKIP_OCTAVE_TESTS").is_some()
}

fn octave() -> Option<Session> {
    if should_skip_octave_tests() {
        return None;
    }

    let mut config = SessionConfig::from_env();
    let available = Command::new(&config.binary)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    if !available {
        eprintln!("Skipping: {} not available", config.binary.display());
        return None;
    }

    if config.args.is_empty() {
        config.args = vec!["--quiet".into(), "--no-gui".into()];
    }
    config = config
        .with_startup_timeout(Some(Duration::from_secs(60)))
        .with_startup_commands(["format long"]);
    Some(Session::start(config).expect("Octave should start"))
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < TOLERANCE, "{:?} vs {:?}", actual, expected);
    }
}

#[test]
fn test_scalars_and_booleans() {
    let Some(mut octave) = octave() else { return };

    octave.set_scalar("x", 2.5, TIMEOUT).unwrap();
    assert_close(&[octave.get_scalar("x * 2", TIMEOUT).unwrap()], &[5.0]);

    octave.set_scalar("neg", -0.125, TIMEOUT).unwrap();
    assert_close(&[octave.get_scalar("neg", TIMEOUT).unwrap()], &[-0.125]);

    octave.set_boolean("flag", true, TIMEOUT).unwrap();
    assert!(octave.get_boolean("flag", TIMEOUT).unwrap());
    octave.set_boolean("flag", false, TIMEOUT).unwrap();
    assert!(!octave.get_boolean("flag", TIMEOUT).unwrap());
}

#[test]
fn test_vectors_and_matrices() {
    let Some(mut octave) = octave() else { return };

    octave.set_column_vector("c", &[1.0, 2.0, 3.0], TIMEOUT).unwrap();
    assert_close(&octave.get_column_vector("c", TIMEOUT).unwrap(), &[1.0, 2.0, 3.0]);

    octave.set_row_vector("r", &[4.0, 5.0, 6.0], TIMEOUT).unwrap();
    assert_close(&octave.get_row_vector("r", TIMEOUT).unwrap(), &[4.0, 5.0, 6.0]);

    octave
        .set_matrix("m", &[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]], TIMEOUT)
        .unwrap();
    let m = octave.get_matrix("m", TIMEOUT).unwrap();
    assert_eq!((m.rows(), m.cols()), (3, 2));
    assert_close(m.column(0).unwrap(), &[1.0, 3.0, 5.0]);
    assert_close(m.column(1).unwrap(), &[2.0, 4.0, 6.0]);
}

#[test]
fn test_result_types() {
    let Some(mut octave) = octave() else { return };

    octave.set_scalar("s", 1.0, TIMEOUT).unwrap();
    octave.set_column_vector("v", &[1.0, 2.0], TIMEOUT).unwrap();
    octave.set_matrix("m", &[vec![1.0, 2.0], vec![3.0, 4.0]], TIMEOUT).unwrap();

    assert_eq!(octave.result_type("s", TIMEOUT).unwrap(), ResultType::Scalar);
    assert_eq!(octave.result_type("v", TIMEOUT).unwrap(), ResultType::Vector);
    assert_eq!(octave.result_type("m", TIMEOUT).unwrap(), ResultType::Matrix);
    assert_eq!(
        octave.result_type("no_such_variable", TIMEOUT).unwrap(),
        ResultType::None
    );
}

#[test]
fn test_errors_and_timeouts() {
    let Some(mut octave) = octave() else { return };

    assert!(matches!(
        octave.execute("undefined_thing + 1", TIMEOUT),
        Err(OctaveError::Command(_))
    ));

    let err = octave
        .execute("pause(3)", Some(Duration::from_millis(300)))
        .unwrap_err();
    assert!(err.is_timeout());

    octave.set_scalar("after", 9.0, TIMEOUT).unwrap();
    assert_close(&[octave.get_scalar("after", TIMEOUT).unwrap()], &[9.0]);
}

#[test]
fn test_strings_and_batch() {
    let Some(mut octave) = octave() else { return };

    octave.set_string("s", "hello \"octave\"", TIMEOUT).unwrap();
    assert_eq!(octave.get_string("s", TIMEOUT).unwrap(), "hello \"octave\"");

    let outcome = octave
        .execute_commands(&["a = 1;", "b = a + 1;", "c = nope;", "d = 4;"], TIMEOUT, BatchStopRule::OnErrorText)
        .unwrap();
    assert_eq!(outcome.stopped_at(), Some(2));
    assert!(matches!(outcome, BatchOutcome::Stopped { .. }));
    assert!(matches!(
        octave.execute("d", TIMEOUT),
        Err(OctaveError::Command(_))
    ));
}
