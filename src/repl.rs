//! The interactive query loop.
//!
//! ```text
//! AwaitingInput --"exit" / EOF--> Terminated
//! AwaitingInput --blank line----> AwaitingInput
//! AwaitingInput --other---------> Dispatching --> AwaitingInput
//! ```

use std::io::{BufRead, Write};

use crate::{
    backend::QueryEngine,
    error::{Error, Result},
};

pub const PROMPT: &str = "Enter your query (or type 'exit' to quit): ";

/// Input that ends the loop, compared after trimming and ignoring case.
pub const EXIT_SENTINEL: &str = "exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingInput,
    Dispatching,
    Terminated,
}

/// One line of user input, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    Exit,
    Blank,
    Query(&'a str),
}

impl<'a> Input<'a> {
    pub fn classify(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            Input::Blank
        } else if trimmed.eq_ignore_ascii_case(EXIT_SENTINEL) {
            Input::Exit
        } else {
            Input::Query(trimmed)
        }
    }

    /// State reached from `AwaitingInput` on this input.
    pub fn transition(self) -> LoopState {
        match self {
            Input::Exit => LoopState::Terminated,
            Input::Blank => LoopState::AwaitingInput,
            Input::Query(_) => LoopState::Dispatching,
        }
    }
}

/// Counters reported when the loop ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub queries: usize,
    pub failures: usize,
}

/// Prompt, read, dispatch and print until the sentinel or end of input.
///
/// A failing query is printed as `error: ...` and the loop continues. Input
/// that is not valid UTF-8 is decoded lossily. Only I/O errors on `input` or
/// `output` end the loop with an error.
pub fn run<E, R, W>(
    engine: &mut E,
    mut input: R,
    mut output: W,
) -> Result<LoopSummary>
where
    E: QueryEngine + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut summary = LoopSummary::default();
    let mut state = LoopState::AwaitingInput;
    let mut raw = Vec::new();
    let mut line = String::new();

    loop {
        match state {
            LoopState::AwaitingInput => {
                write!(output, "{PROMPT}")?;
                output.flush()?;

                raw.clear();
                if input.read_until(b'\n', &mut raw)? == 0 {
                    writeln!(output)?;
                    tracing::debug!("end of input");
                    state = LoopState::Terminated;
                } else {
                    // Invalid UTF-8 is replaced rather than ending the session.
                    line = String::from_utf8_lossy(&raw).into_owned();
                    state = Input::classify(&line).transition();
                }
            }
            LoopState::Dispatching => {
                let query = line.trim();
                summary.queries += 1;
                match engine.answer(query, &mut output) {
                    Ok(_) => writeln!(output, "\n")?,
                    Err(e) => {
                        summary.failures += 1;
                        let e = match e {
                            Error::QueryExecution(_) => e,
                            other => Error::QueryExecution(other.to_string()),
                        };
                        tracing::debug!(error = %e, query, "query failed");
                        writeln!(output, "error: {e}\n")?;
                    }
                }
                state = LoopState::AwaitingInput;
            }
            LoopState::Terminated => break,
        }
    }

    Ok(summary)
}
