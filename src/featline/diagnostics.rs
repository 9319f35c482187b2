//! Diagnostics for malformed input
//!
//! Syntax problems and value substitutions all go through [`Diagnostics::report`]. In
//! lenient mode the message is handed to a [`DiagnosticSink`] and parsing carries on with a
//! fallback value; in strict mode the same message comes back as a [`StrictParseError`]
//! and the caller is expected to return it immediately with `?`.

use std::fmt::Write as _;

/// Fatal condition raised in strict mode. The message is identical to the one a lenient
/// parse would have reported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StrictParseError {
    pub message: String,
}

/// Receiver for non-fatal warnings.
pub trait DiagnosticSink {
    fn report(&mut self, message: &str);
}

/// Forwards every warning to `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, message: &str) {
        tracing::warn!(target: "featline::parser", "{}", message);
    }
}

/// Keeps warnings in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub messages: Vec<String>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, message: &str) {
        (**self).report(message)
    }
}

/// The single path every parse warning travels through.
pub struct Diagnostics<'s> {
    strict: bool,
    example_number: u64,
    line: &'s [u8],
    sink: &'s mut dyn DiagnosticSink,
}

impl<'s> Diagnostics<'s> {
    /// `line` is the text quoted back in every message.
    pub fn new(
        strict: bool,
        example_number: u64,
        line: &'s [u8],
        sink: &'s mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            strict,
            example_number,
            line,
            sink,
        }
    }

    /// Format `<message><offending><message2>in Example #<n>: "<line>"` and dispatch it.
    pub fn report(
        &mut self,
        message: &str,
        offending: &[u8],
        message2: &str,
    ) -> Result<(), StrictParseError> {
        let mut text = String::with_capacity(message.len() + offending.len() + self.line.len() + 32);
        text.push_str(message);
        text.push_str(&String::from_utf8_lossy(offending));
        text.push_str(message2);
        let _ = write!(
            text,
            "in Example #{}: \"{}\"",
            self.example_number,
            String::from_utf8_lossy(self.line)
        );
        self.raise(text)
    }

    /// Dispatch an already formatted message.
    pub fn raise(&mut self, message: String) -> Result<(), StrictParseError> {
        if self.strict {
            Err(StrictParseError { message })
        } else {
            self.sink.report(&message);
            Ok(())
        }
    }
}
