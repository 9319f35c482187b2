//! Grammar parser for the namespace region of a text line
//!
//! Recursive descent over raw bytes. The only state is the scan position plus the
//! current namespace multiplier; everything else is pushed straight into the backend.
//!
//! ```text
//! ListNamespace := ( '|' Namespace )*              -- must end at EOL or '\r'
//! Namespace     := [NamespaceInfo] ListFeatures
//! NamespaceInfo := Token [':' Float]
//! ListFeatures  := ( ' ' MaybeFeature )*
//! MaybeFeature  := ε | Token [':' Float]
//! Token         := bytes other than ' ', '\t', '|', ':', '\r'
//! ```

use crate::featline::backend::ParserBackend;
use crate::featline::diagnostics::{Diagnostics, StrictParseError};
use crate::featline::float::parse_float;

const FLOAT_EXPECTED: &str = "malformed example! Float expected after : \"";

/// Parse `region` (which starts at the first `|`) into `backend`.
pub fn parse_namespaces<B: ParserBackend>(
    region: &[u8],
    backend: &mut B,
    diagnostics: &mut Diagnostics<'_>,
) -> Result<(), StrictParseError> {
    if region.is_empty() {
        return Ok(());
    }
    GrammarParser {
        line: region,
        pos: 0,
        cur_channel_v: 1.0,
        backend,
        diagnostics,
    }
    .list_namespace()
}

struct GrammarParser<'a, 'b, 'c, B> {
    line: &'a [u8],
    pos: usize,
    cur_channel_v: f32,
    backend: &'b mut B,
    diagnostics: &'b mut Diagnostics<'c>,
}

/// End of a token: whitespace, a delimiter, or end of line.
fn ends_token(c: Option<u8>) -> bool {
    matches!(c, None | Some(b' ' | b'\t' | b'|' | b'\r'))
}

impl<'a, 'b, 'c, B: ParserBackend> GrammarParser<'a, 'b, 'c, B> {
    fn peek(&self) -> Option<u8> {
        self.line.get(self.pos).copied()
    }

    fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some(b'\r'))
    }

    fn warn(&mut self, message: &str, offending: &[u8], message2: &str) -> Result<(), StrictParseError> {
        self.diagnostics.report(message, offending, message2)
    }

    /// Report with the text from the start of the region up to the scan position.
    fn warn_here(&mut self, message: &str) -> Result<(), StrictParseError> {
        let line = self.line;
        self.warn(message, &line[..self.pos], "\"")
    }

    fn read_name(&mut self) -> &'a [u8] {
        let line = self.line;
        let start = self.pos;
        while !ends_token(self.peek()) && self.peek() != Some(b':') {
            self.pos += 1;
        }
        &line[start..self.pos]
    }

    fn list_namespace(&mut self) -> Result<(), StrictParseError> {
        while self.peek() == Some(b'|') {
            self.pos += 1;
            self.namespace()?;
        }
        if !self.at_line_end() {
            self.warn_here("malformed example! '|' or EOL expected after : \"")?;
        }
        Ok(())
    }

    fn namespace(&mut self) -> Result<(), StrictParseError> {
        self.cur_channel_v = 1.0;
        match self.peek() {
            c if ends_token(c) => {
                self.backend.begin_default_namespace();
                self.list_features()?;
            }
            Some(b':') => {
                self.warn_here("malformed example! '|',String,space, or EOL expected after : \"")?;
            }
            _ => {
                self.namespace_info()?;
                self.list_features()?;
            }
        }
        self.backend.complete_namespace();
        Ok(())
    }

    fn namespace_info(&mut self) -> Result<(), StrictParseError> {
        if ends_token(self.peek()) || self.peek() == Some(b':') {
            return self.warn_here("malformed example! String expected after : \"");
        }
        let name = self.read_name();
        self.backend.begin_namespace(name);
        self.namespace_info_value()
    }

    fn namespace_info_value(&mut self) -> Result<(), StrictParseError> {
        match self.peek() {
            c if ends_token(c) => Ok(()),
            Some(b':') => {
                self.pos += 1;
                let line = self.line;
                let (mut value, consumed) = parse_float(&line[self.pos..]);
                if consumed == 0 {
                    self.warn_here(FLOAT_EXPECTED)?;
                    value = 1.0;
                }
                if value.is_nan() {
                    value = 1.0;
                    self.warn(
                        "warning: invalid namespace value:\"",
                        &line[self.pos..self.pos + consumed],
                        "\" read as NaN. Replacing with 1.",
                    )?;
                }
                self.cur_channel_v = value;
                self.pos += consumed;
                Ok(())
            }
            _ => self.warn_here("malformed example! '|',':', space, or EOL expected after : \""),
        }
    }

    fn list_features(&mut self) -> Result<(), StrictParseError> {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
            self.maybe_feature()?;
        }
        if !(self.at_line_end() || self.peek() == Some(b'|')) {
            self.warn_here("malformed example! '|',space, or EOL expected after : \"")?;
        }
        Ok(())
    }

    fn maybe_feature(&mut self) -> Result<(), StrictParseError> {
        if ends_token(self.peek()) {
            return Ok(());
        }
        let name = self.read_name();
        let value = self.cur_channel_v * self.feature_value()?;
        self.backend.emit_feature(name, value);
        Ok(())
    }

    fn feature_value(&mut self) -> Result<f32, StrictParseError> {
        match self.peek() {
            c if ends_token(c) => Ok(1.0),
            Some(b':') => {
                self.pos += 1;
                let line = self.line;
                let (mut value, consumed) = parse_float(&line[self.pos..]);
                if consumed == 0 {
                    self.warn_here(FLOAT_EXPECTED)?;
                    value = 0.0;
                }
                if value.is_nan() {
                    value = 0.0;
                    self.warn(
                        "warning: invalid feature value:\"",
                        &line[self.pos..self.pos + consumed],
                        "\" read as NaN. Replacing with 0.",
                    )?;
                }
                self.pos += consumed;
                Ok(value)
            }
            _ => {
                self.warn_here("malformed example! '|', ':', space, or EOL expected after : \"")?;
                Ok(0.0)
            }
        }
    }
}
