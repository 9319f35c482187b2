//! Label collaborator
//!
//! Label semantics belong to the learning task, so the splitter only hands the label words
//! to a [`LabelParser`]. [`SimpleLabelParser`] covers plain regression/classification lines
//! (`label [weight [initial]]`) and is what the command-line tool uses.

use crate::featline::float::parse_float;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LabelError {
    #[error("{0} is too many tokens for a simple label: \"{1}\"")]
    TooManyTokens(usize, String),
    #[error("\"{0}\" is not a good float")]
    NotAFloat(String),
}

/// Turns label words into a label value.
pub trait LabelParser {
    type Label: Default;

    /// Put `label` into its "no label given" state.
    fn default_label(&self, label: &mut Self::Label);

    /// Fill `label` from the words that precede the first namespace.
    fn parse_label(&self, label: &mut Self::Label, words: &[&[u8]]) -> Result<(), LabelError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimpleLabel {
    pub label: f32,
    pub weight: f32,
    pub initial: f32,
}

impl SimpleLabel {
    /// Whether a label value was given on the line.
    pub fn is_labeled(&self) -> bool {
        self.label != f32::MAX
    }
}

impl Default for SimpleLabel {
    fn default() -> Self {
        Self {
            label: f32::MAX,
            weight: 1.0,
            initial: 0.0,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleLabelParser;

fn word_to_float(word: &[u8]) -> Result<f32, LabelError> {
    let (value, consumed) = parse_float(word);
    if consumed == 0 || value.is_nan() {
        return Err(LabelError::NotAFloat(
            String::from_utf8_lossy(word).into_owned(),
        ));
    }
    Ok(value)
}

impl LabelParser for SimpleLabelParser {
    type Label = SimpleLabel;

    fn default_label(&self, label: &mut SimpleLabel) {
        *label = SimpleLabel::default();
    }

    fn parse_label(&self, label: &mut SimpleLabel, words: &[&[u8]]) -> Result<(), LabelError> {
        match words {
            [] => {}
            [value] => label.label = word_to_float(value)?,
            [value, weight] => {
                label.label = word_to_float(value)?;
                label.weight = word_to_float(weight)?;
            }
            [value, weight, initial] => {
                label.label = word_to_float(value)?;
                label.weight = word_to_float(weight)?;
                label.initial = word_to_float(initial)?;
            }
            _ => {
                let joined = words
                    .iter()
                    .map(|w| String::from_utf8_lossy(w).into_owned())
                    .collect::<Vec<_>>()
                    .join(" ");
                return Err(LabelError::TooManyTokens(words.len(), joined));
            }
        }
        Ok(())
    }
}

/// Keeps the label words as text, for tools that only pass labels through.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordsLabelParser;

impl LabelParser for WordsLabelParser {
    type Label = Vec<String>;

    fn default_label(&self, label: &mut Vec<String>) {
        label.clear();
    }

    fn parse_label(&self, label: &mut Vec<String>, words: &[&[u8]]) -> Result<(), LabelError> {
        label.extend(
            words
                .iter()
                .map(|w| String::from_utf8_lossy(w).into_owned()),
        );
        Ok(())
    }
}

/// Label parser for callers that do not need labels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLabel;

impl LabelParser for NoLabel {
    type Label = ();

    fn default_label(&self, _label: &mut ()) {}

    fn parse_label(&self, _label: &mut (), _words: &[&[u8]]) -> Result<(), LabelError> {
        Ok(())
    }
}
