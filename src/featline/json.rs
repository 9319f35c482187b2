//! JSON producers
//!
//! Both adapters decode a line with `serde_json` and then drive the same
//! [`ParserBackend`] calls the text grammar makes, so hashing, expansions and audit names
//! come out identical for equivalent input.
//!
//! Plain JSON:
//!
//! ```text
//! {"_label": 1, "_tag": "t", "a": 1.5, "ns": {"x": 2, "color": "red", "v": [1, 2]}}
//! ```
//!
//! Decision-service JSON wraps the same context object in `"c"` and adds the interaction
//! header (`EventId`, `a`, `p`, `pdrop`, `_skipLearn`) plus a contextual-bandit label.

use crate::featline::backend::{ExampleBackend, ParserBackend};
use crate::featline::config::ParserConfig;
use crate::featline::diagnostics::{DiagnosticSink, Diagnostics, TracingSink};
use crate::featline::error::Error;
use crate::featline::example::Example;
use crate::featline::label::LabelParser;
use crate::featline::pool::ExamplePool;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Header of a decision-service event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecisionServiceInteraction {
    pub event_id: String,
    pub actions: Vec<u32>,
    pub probabilities: Vec<f32>,
    pub probability_of_drop: f32,
    pub skip_learn: bool,
}

impl DecisionServiceInteraction {
    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            event_id: object
                .get("EventId")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            actions: object
                .get("a")
                .and_then(Value::as_array)
                .map(|a| a.iter().filter_map(Value::as_u64).map(|v| v as u32).collect())
                .unwrap_or_default(),
            probabilities: object
                .get("p")
                .and_then(Value::as_array)
                .map(|p| p.iter().filter_map(Value::as_f64).map(|v| v as f32).collect())
                .unwrap_or_default(),
            probability_of_drop: object.get("pdrop").and_then(Value::as_f64).unwrap_or(0.0) as f32,
            skip_learn: object
                .get("_skipLearn")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

/// What a decision-service line produced.
#[derive(Debug, Clone, PartialEq)]
pub enum DsJsonOutcome {
    /// Examples were appended for this interaction.
    Examples(DecisionServiceInteraction),
    /// The interaction asked not to be learned from; a single empty example was appended.
    Skipped(DecisionServiceInteraction),
    /// Nothing usable on this line, read the next one.
    Reread,
}

/// Feature groups found under a key, emitted after the scalars of their parent.
enum Group<'v> {
    Object(&'v str, &'v Map<String, Value>),
    Array(&'v str, &'v [Value]),
}

fn begin<B: ParserBackend>(backend: &mut B, name: &str) {
    if name.is_empty() {
        backend.begin_default_namespace();
    } else {
        backend.begin_namespace(name.as_bytes());
    }
}

fn emit_scalar<B: ParserBackend>(backend: &mut B, key: &str, value: &Value) {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_f64() {
                backend.emit_feature(key.as_bytes(), v as f32);
            }
        }
        Value::String(s) => {
            let mut name = String::with_capacity(key.len() + s.len());
            name.push_str(key);
            name.push_str(s);
            backend.emit_feature(name.as_bytes(), 1.0);
        }
        Value::Bool(true) => backend.emit_feature(key.as_bytes(), 1.0),
        _ => {}
    }
}

fn emit_group<B: ParserBackend>(backend: &mut B, group: Group<'_>) {
    match group {
        Group::Object(name, members) => {
            begin(backend, name);
            let mut nested = Vec::new();
            for (key, value) in members {
                match value {
                    Value::Object(inner) => nested.push(Group::Object(key.as_str(), inner)),
                    Value::Array(items) => nested.push(Group::Array(key.as_str(), items.as_slice())),
                    scalar => emit_scalar(backend, key, scalar),
                }
            }
            backend.complete_namespace();
            for group in nested {
                emit_group(backend, group);
            }
        }
        Group::Array(name, items) => {
            begin(backend, name);
            for item in items {
                if let Some(v) = item.as_f64() {
                    backend.emit_feature(b"", v as f32);
                }
            }
            backend.complete_namespace();
            for item in items {
                if let Value::Object(inner) = item {
                    emit_group(backend, Group::Object(name, inner));
                }
            }
        }
    }
}

fn label_words(value: &Value) -> Vec<String> {
    match value {
        Value::Number(n) => vec![n.to_string()],
        Value::String(s) => s.split(' ').filter(|w| !w.is_empty()).map(String::from).collect(),
        Value::Object(fields) => ["Label", "Weight"]
            .iter()
            .map_while(|key| fields.get(*key))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Contextual-bandit label words (`action:cost:probability`) of a decision-service event.
fn cb_label_words(object: &Map<String, Value>) -> Option<Vec<String>> {
    let action = object.get("_label_Action")?.as_u64()?;
    let cost = object.get("_label_cost")?.as_f64()?;
    let probability = object.get("_label_probability")?.as_f64()?;
    Some(vec![format!("{}:{}:{}", action, cost, probability)])
}

/// Turns JSON lines into examples.
pub struct JsonParser<P: LabelParser> {
    config: Arc<ParserConfig>,
    label_parser: P,
    sink: Box<dyn DiagnosticSink + Send>,
    examples_parsed: u64,
}

impl<P: LabelParser> JsonParser<P> {
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
            examples_parsed: 0,
        }
    }

    pub fn examples_parsed(&self) -> u64 {
        self.examples_parsed
    }

    fn next_number(&mut self) -> u64 {
        let number = self.examples_parsed;
        self.examples_parsed += 1;
        number
    }

    /// Parse one plain JSON line, appending the shared example, then one example per
    /// `_multi` entry, then (for multi-example lines) an empty terminator.
    pub fn parse_line(
        &mut self,
        line: &[u8],
        pool: &mut ExamplePool<P::Label>,
        examples: &mut Vec<Example<P::Label>>,
    ) -> Result<(), Error> {
        let value: Value = serde_json::from_slice(line)?;
        let number = self.next_number();
        let start = examples.len();
        match value.as_object() {
            Some(object) => self.parse_examples(object, number, line, pool, examples)?,
            None => {
                let mut diagnostics =
                    Diagnostics::new(self.config.strict, number, line, &mut *self.sink);
                diagnostics.raise(format!(
                    "malformed example! JSON object expected in Example #{}: \"{}\"",
                    number,
                    String::from_utf8_lossy(line)
                ))?;
                examples.push(self.empty_example(pool));
            }
        }
        self.terminate_batch(pool, examples, start);
        Ok(())
    }

    /// Parse one decision-service line.
    pub fn parse_decision_service_line(
        &mut self,
        line: &[u8],
        pool: &mut ExamplePool<P::Label>,
        examples: &mut Vec<Example<P::Label>>,
    ) -> Result<DsJsonOutcome, Error> {
        if line.first() != Some(&b'{') {
            return Ok(DsJsonOutcome::Reread);
        }
        let value: Value = serde_json::from_slice(line)?;
        let number = self.next_number();
        let Some(object) = value.as_object() else {
            return Ok(DsJsonOutcome::Reread);
        };
        let interaction = DecisionServiceInteraction::from_object(object);

        let start = examples.len();
        match object.get("c").and_then(Value::as_object) {
            Some(context) => self.parse_examples(context, number, line, pool, examples)?,
            None => examples.push(self.empty_example(pool)),
        }

        if let Some(words) = cb_label_words(object) {
            let produced = examples.len() - start;
            let target = if produced > 1 {
                let index = object
                    .get("_labelIndex")
                    .and_then(Value::as_u64)
                    .or_else(|| object.get("_label_Action")?.as_u64()?.checked_sub(1));
                index
                    .map(|i| i as usize + 1)
                    .filter(|&i| i < produced)
                    .unwrap_or(0)
            } else {
                0
            };
            let label = &mut examples[start + target].label;
            if let Err(err) = self.apply_label(label, &words, number, line) {
                pool.release(examples.drain(start..));
                return Err(err);
            }
        }

        if interaction.skip_learn {
            pool.release(examples.drain(start..));
            examples.push(self.empty_example(pool));
            return Ok(DsJsonOutcome::Skipped(interaction));
        }
        if interaction.actions.is_empty() {
            pool.release(examples.drain(start..));
            return Ok(DsJsonOutcome::Reread);
        }

        self.terminate_batch(pool, examples, start);
        Ok(DsJsonOutcome::Examples(interaction))
    }

    fn empty_example(&self, pool: &mut ExamplePool<P::Label>) -> Example<P::Label> {
        let mut example = pool.acquire_empty();
        self.label_parser.default_label(&mut example.label);
        example
    }

    /// Multi-example batches end with an explicit empty example.
    fn terminate_batch(
        &self,
        pool: &mut ExamplePool<P::Label>,
        examples: &mut Vec<Example<P::Label>>,
        start: usize,
    ) {
        if examples.len() - start > 1 {
            examples.push(self.empty_example(pool));
        }
    }

    fn parse_examples(
        &mut self,
        object: &Map<String, Value>,
        number: u64,
        line: &[u8],
        pool: &mut ExamplePool<P::Label>,
        examples: &mut Vec<Example<P::Label>>,
    ) -> Result<(), Error> {
        let start = examples.len();
        let mut shared = pool.acquire_empty();
        let multi = match self.fill_example(object, &mut shared, number, line) {
            Ok(multi) => multi,
            Err(err) => {
                pool.release([shared]);
                return Err(err);
            }
        };
        examples.push(shared);

        for item in multi {
            let mut action = pool.acquire_empty();
            let filled = self.fill_example(item, &mut action, number, line);
            examples.push(action);
            if let Err(err) = filled {
                pool.release(examples.drain(start..));
                return Err(err);
            }
        }
        Ok(())
    }

    /// Fill one example from an object; returns the `_multi` entries it carries.
    fn fill_example<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        example: &mut Example<P::Label>,
        number: u64,
        line: &[u8],
    ) -> Result<Vec<&'v Map<String, Value>>, Error> {
        let config = Arc::clone(&self.config);
        let mut backend = ExampleBackend::new(example, &config);
        self.label_parser.default_label(backend.label());

        let mut words = Vec::new();
        let mut multi = Vec::new();
        let mut scalars = Vec::new();
        let mut text = None;
        let mut groups = Vec::new();

        for (key, value) in object {
            match key.as_str() {
                "_label" => words = label_words(value),
                "_tag" => {
                    if let Some(tag) = value.as_str() {
                        backend.push_tag(tag.as_bytes());
                    }
                }
                "_text" => text = value.as_str(),
                "_multi" => {
                    if let Some(items) = value.as_array() {
                        multi.extend(items.iter().filter_map(Value::as_object));
                    }
                }
                k if k.starts_with('_') => {}
                _ => match value {
                    Value::Object(members) => groups.push(Group::Object(key.as_str(), members)),
                    Value::Array(items) => groups.push(Group::Array(key.as_str(), items.as_slice())),
                    scalar => scalars.push((key.as_str(), scalar)),
                },
            }
        }

        if !scalars.is_empty() || text.is_some() {
            backend.begin_default_namespace();
            for (key, value) in scalars {
                emit_scalar(&mut backend, key, value);
            }
            for token in text.unwrap_or_default().split(' ').filter(|t| !t.is_empty()) {
                backend.emit_feature(token.as_bytes(), 1.0);
            }
            backend.complete_namespace();
        }
        for group in groups {
            emit_group(&mut backend, group);
        }

        if !words.is_empty() {
            self.apply_label(backend.label(), &words, number, line)?;
        }
        backend.complete_example();
        Ok(multi)
    }

    fn apply_label(
        &mut self,
        label: &mut P::Label,
        words: &[String],
        number: u64,
        line: &[u8],
    ) -> Result<(), Error> {
        let words: Vec<&[u8]> = words.iter().map(|w| w.as_bytes()).collect();
        if let Err(err) = self.label_parser.parse_label(label, &words) {
            let mut diagnostics = Diagnostics::new(self.config.strict, number, line, &mut *self.sink);
            diagnostics.raise(format!("{} in Example #{}", err, number))?;
            self.label_parser.default_label(label);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn label_words_from_scalars_and_objects() {
        assert_eq!(label_words(&json!(1)), vec!["1"]);
        assert_eq!(label_words(&json!("1  0.5")), vec!["1", "0.5"]);
        assert_eq!(label_words(&json!({"Label": -1, "Weight": 2})), vec!["-1", "2"]);
        assert_eq!(label_words(&json!({"Weight": 2})), Vec::<String>::new());
        assert!(label_words(&json!(null)).is_empty());
    }

    #[test]
    fn cb_label_needs_all_three_fields() {
        let event = json!({"_label_Action": 2, "_label_cost": -1.0, "_label_probability": 0.25});
        assert_eq!(
            cb_label_words(event.as_object().unwrap()),
            Some(vec!["2:-1:0.25".to_string()])
        );
        let partial = json!({"_label_Action": 2, "_label_cost": 0.0});
        assert_eq!(cb_label_words(partial.as_object().unwrap()), None);
    }

    #[test]
    fn interaction_header_defaults() {
        let event = json!({"EventId": "e", "a": [3, 1], "p": [0.5, 0.5]});
        let interaction = DecisionServiceInteraction::from_object(event.as_object().unwrap());
        assert_eq!(interaction.event_id, "e");
        assert_eq!(interaction.actions, vec![3, 1]);
        assert_eq!(interaction.probabilities, vec![0.5, 0.5]);
        assert_eq!(interaction.probability_of_drop, 0.0);
        assert!(!interaction.skip_learn);
    }
}
