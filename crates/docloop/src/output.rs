//! Everything the CLI prints.
//!
//! `--json` puts one envelope on stdout per command (stderr on failure).
//! Otherwise commands print progress lines through `note`, which `--quiet`
//! silences, and failures go to stderr with any hints for the user.

use libdocloop_core::DocloopError;
use serde::Serialize;

use crate::cli::Cli;

const ENVELOPE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Json,
    Text,
    Quiet,
}

impl Mode {
    fn of(cli: &Cli) -> Self {
        if cli.json {
            Mode::Json
        } else if cli.quiet {
            Mode::Quiet
        } else {
            Mode::Text
        }
    }
}

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    schema_version: u32,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Failure>,
}

/// A failed command as seen by scripts
#[derive(Serialize)]
struct Failure {
    code: &'static str,
    exit_code: i32,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hints: Vec<&'static str>,
}

impl From<&DocloopError> for Failure {
    fn from(err: &DocloopError) -> Self {
        Self {
            code: err.error_code(),
            exit_code: err.exit_code(),
            message: err.to_string(),
            hints: err.suggestions(),
        }
    }
}

/// Emit a command's result; only JSON mode prints it, text mode uses `note`
pub fn emit<T: Serialize>(cli: &Cli, data: T) -> Result<(), DocloopError> {
    if Mode::of(cli) == Mode::Json {
        let envelope = Envelope {
            schema_version: ENVELOPE_VERSION,
            ok: true,
            data: Some(data),
            error: None,
        };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

/// A progress or result line for people at a terminal
pub fn note(cli: &Cli, line: &str) {
    if Mode::of(cli) == Mode::Text {
        println!("{}", line);
    }
}

/// Report a failed command on stderr. Printed even with `--quiet`.
pub fn fail(cli: &Cli, err: &DocloopError) {
    let failure = Failure::from(err);
    if Mode::of(cli) == Mode::Json {
        let envelope: Envelope<()> = Envelope {
            schema_version: ENVELOPE_VERSION,
            ok: false,
            data: None,
            error: Some(failure),
        };
        match serde_json::to_string_pretty(&envelope) {
            Ok(json) => eprintln!("{}", json),
            Err(_) => eprintln!("docloop: {}", err),
        }
        return;
    }

    eprintln!("docloop: {}", failure.message);
    for hint in &failure.hints {
        eprintln!("  hint: {}", hint);
    }
}
