//! Line splitting and the text-format entry point
//!
//! A text line looks like `label words [tag]|ns features|ns features`. The splitter finds
//! the first `|`, pulls the label words (and the optional tag) out of everything before
//! it, and hands the rest to the grammar parser.

use crate::featline::backend::{ExampleBackend, ParserBackend};
use crate::featline::config::ParserConfig;
use crate::featline::diagnostics::{DiagnosticSink, Diagnostics, TracingSink};
use crate::featline::error::Error;
use crate::featline::example::Example;
use crate::featline::label::LabelParser;
use crate::featline::parser::parse_namespaces;
use crate::featline::pool::ExamplePool;
use std::ops::Range;
use std::sync::Arc;

/// Split `region` on `delim`, dropping empty pieces. Ranges are relative to `region`'s
/// start plus `offset`.
pub fn tokenize(delim: u8, region: &[u8], offset: usize, out: &mut Vec<Range<usize>>) {
    out.clear();
    let mut last = 0;
    for (i, &b) in region.iter().enumerate() {
        if b == delim {
            if i != last {
                out.push(offset + last..offset + i);
            }
            last = i + 1;
        }
    }
    if region.len() != last {
        out.push(offset + last..offset + region.len());
    }
}

/// Where the pieces of one line sit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineLayout {
    /// Offset of the first `|`, or the line length.
    pub bar: usize,
    /// The text the label words and tag are taken from.
    pub label_region: Range<usize>,
}

impl LineLayout {
    pub fn of(line: &[u8]) -> Self {
        let bar = line.iter().position(|&b| b == b'|').unwrap_or(line.len());
        let label_start = line[..bar]
            .iter()
            .rposition(|&b| b == b'\t')
            .map_or(0, |tab| tab + 1);
        Self {
            bar,
            label_region: label_start..bar,
        }
    }
}

/// Parses text-format lines into examples.
///
/// Holds the scratch word list, so each thread needs its own instance; the configuration
/// itself is shared.
pub struct TextParser<P: LabelParser> {
    config: Arc<ParserConfig>,
    label_parser: P,
    sink: Box<dyn DiagnosticSink + Send>,
    words: Vec<Range<usize>>,
    examples_parsed: u64,
}

impl<P: LabelParser> TextParser<P> {
    pub fn new(config: Arc<ParserConfig>, label_parser: P) -> Self {
        Self::with_sink(config, label_parser, Box::new(TracingSink))
    }

    pub fn with_sink(
        config: Arc<ParserConfig>,
        label_parser: P,
        sink: Box<dyn DiagnosticSink + Send>,
    ) -> Self {
        Self {
            config,
            label_parser,
            sink,
            words: Vec::new(),
            examples_parsed: 0,
        }
    }

    /// Number of parse calls made so far; also the number quoted in diagnostics.
    pub fn examples_parsed(&self) -> u64 {
        self.examples_parsed
    }

    /// Parse one line (already stripped of its line terminator) into `example`.
    ///
    /// On a strict-mode failure the example is left partially filled and must be
    /// discarded by the caller.
    pub fn parse_line(&mut self, line: &[u8], example: &mut Example<P::Label>) -> Result<(), Error> {
        let config = Arc::clone(&self.config);
        let mut backend = ExampleBackend::new(example, &config);
        self.parse_into(line, &mut backend)
    }

    /// Drive any backend with the contents of `line`.
    pub fn parse_into<B>(&mut self, line: &[u8], backend: &mut B) -> Result<(), Error>
    where
        B: ParserBackend<Label = P::Label>,
    {
        let example_number = self.examples_parsed;
        self.examples_parsed += 1;

        self.label_parser.default_label(backend.label());
        let layout = LineLayout::of(line);

        if line.first() == Some(&b'|') {
            self.words.clear();
        } else {
            let region = &line[layout.label_region.clone()];
            tokenize(b' ', region, layout.label_region.start, &mut self.words);
            let is_tag = self.words.last().is_some_and(|last| {
                last.end == layout.label_region.end || line[last.start] == b'\''
            });
            if is_tag {
                if let Some(mut tag) = self.words.pop() {
                    if line[tag.start] == b'\'' {
                        tag.start += 1;
                    }
                    backend.push_tag(&line[tag]);
                }
            }
        }

        let strict = self.config.strict;
        let region = &line[layout.bar..];
        if !self.words.is_empty() {
            let words: Vec<&[u8]> = self.words.iter().map(|r| &line[r.clone()]).collect();
            if let Err(err) = self.label_parser.parse_label(backend.label(), &words) {
                let mut diagnostics = Diagnostics::new(strict, example_number, line, &mut *self.sink);
                diagnostics.raise(format!("{} in Example #{}", err, example_number))?;
                self.label_parser.default_label(backend.label());
            }
        }

        let mut diagnostics = Diagnostics::new(strict, example_number, region, &mut *self.sink);
        parse_namespaces(region, backend, &mut diagnostics)?;
        backend.complete_example();
        Ok(())
    }

    /// Parse `\n`-separated lines into `examples`, one example per piece in input order,
    /// taking extra empty examples from `pool` as needed. A trailing `\n` yields a final
    /// empty example, which terminates a multi-line batch.
    pub fn parse_lines(
        &mut self,
        text: &[u8],
        pool: &mut ExamplePool<P::Label>,
        examples: &mut Vec<Example<P::Label>>,
    ) -> Result<(), Error> {
        for (i, line) in text.split(|&b| b == b'\n').enumerate() {
            if examples.len() < i + 1 {
                examples.push(pool.acquire_empty());
            }
            self.parse_line(line, &mut examples[i])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::featline::label::{NoLabel, SimpleLabelParser};

    fn words_of(line: &str) -> Vec<&str> {
        let layout = LineLayout::of(line.as_bytes());
        let mut out = Vec::new();
        tokenize(
            b' ',
            &line.as_bytes()[layout.label_region.clone()],
            layout.label_region.start,
            &mut out,
        );
        out.into_iter().map(|r| &line[r]).collect()
    }

    #[test]
    fn tokenize_skips_empty_pieces() {
        assert_eq!(words_of("  1  2 |a"), vec!["1", "2"]);
        assert!(words_of("|a").is_empty());
    }

    #[test]
    fn tab_bounds_label_region() {
        let layout = LineLayout::of(b"free text\t1 t|a");
        assert_eq!(layout.bar, 13);
        assert_eq!(layout.label_region, 10..13);
        assert_eq!(words_of("a\tb\t1 t|a"), vec!["1", "t"]);
    }

    #[test]
    fn line_without_bar_is_all_label() {
        let layout = LineLayout::of(b"1 2");
        assert_eq!(layout.bar, 3);
        assert_eq!(layout.label_region, 0..3);
    }

    #[test]
    fn label_errors_are_reported_in_lenient_mode() {
        let config = Arc::new(ParserConfig::default());
        let mut parser = TextParser::new(config, SimpleLabelParser);
        let mut example = Example::new();
        parser.parse_line(b"x 1 2 3 | a", &mut example).unwrap();
        assert!(!example.label.is_labeled());
        assert_eq!(example.num_features(), 1);
    }

    #[test]
    fn label_errors_are_fatal_in_strict_mode() {
        let config = Arc::new(ParserConfig::builder().strict(true).build());
        let mut parser = TextParser::new(config, SimpleLabelParser);
        let mut example = Example::new();
        let err = parser.parse_line(b"x | a", &mut example).unwrap_err();
        assert!(err.to_string().contains("is not a good float"));
    }

    #[test]
    fn parse_lines_fills_examples_in_order() {
        let config = Arc::new(ParserConfig::default());
        let mut parser = TextParser::new(config, SimpleLabelParser);
        let mut pool = ExamplePool::new();
        let mut examples = vec![pool.acquire_empty()];
        parser
            .parse_lines(b"1 | a\n2 | b c\n", &mut pool, &mut examples)
            .unwrap();
        assert_eq!(examples.len(), 3);
        assert_eq!(examples[0].label.label, 1.0);
        assert_eq!(examples[1].label.label, 2.0);
        assert_eq!(examples[1].num_features(), 2);
        assert!(examples[2].is_empty());
        assert!(!examples[2].label.is_labeled());
    }

    #[test]
    fn counter_advances_per_call() {
        let config = Arc::new(ParserConfig::default());
        let mut parser = TextParser::new(config, NoLabel);
        let mut example = Example::new();
        parser.parse_line(b"| a", &mut example).unwrap();
        parser.parse_line(b"", &mut example).unwrap();
        assert_eq!(parser.examples_parsed(), 2);
    }
}
