//! Feature-hashing backend
//!
//! The grammar parser and the JSON adapter only ever talk to a [`ParserBackend`]. The
//! [`ExampleBackend`] implementation turns those calls into hashed features on an
//! [`Example`]:
//!
//! - `begin_*namespace` resets the ambient namespace state (index, channel hash,
//!   anonymous counter, display name).
//! - `emit_feature` stores the primary feature and then any affix, spelling and dictionary
//!   features configured for the active namespace.
//! - `complete_namespace` lists the namespace index once it is known to be non-empty.

use crate::featline::config::{affix_items, ParserConfig};
use crate::featline::dictionary::dictionary_key;
use crate::featline::example::{
    AuditName, Example, AFFIX_NAMESPACE, DEFAULT_NAMESPACE, DICTIONARY_NAMESPACE,
    SPELLING_NAMESPACE,
};
use crate::featline::hashing::{uniform_hash, AFFIX_CONSTANT, QUADRATIC_CONSTANT};

/// Capability set the parsers drive, in this order per segment:
/// `begin_default_namespace`/`begin_namespace`, any number of `emit_feature`,
/// `complete_namespace`. `label`, `push_tag` and `complete_example` bracket the line.
pub trait ParserBackend {
    type Label;

    fn begin_default_namespace(&mut self);
    fn begin_namespace(&mut self, name: &[u8]);
    fn complete_namespace(&mut self);
    fn emit_feature(&mut self, name: &[u8], value: f32);
    fn push_tag(&mut self, tag: &[u8]);
    fn label(&mut self) -> &mut Self::Label;
    fn complete_example(&mut self);
}

/// Backend that fills an [`Example`].
pub struct ExampleBackend<'a, L> {
    example: &'a mut Example<L>,
    config: &'a ParserConfig,
    record_names: bool,

    index: u8,
    new_index: bool,
    channel_hash: u64,
    anon: u64,
    // display name of the active namespace, only kept when recording names
    base: String,
    spelling_slot: Vec<u8>,
}

impl<'a, L> ExampleBackend<'a, L> {
    pub fn new(example: &'a mut Example<L>, config: &'a ParserConfig) -> Self {
        let record_names = config.record_names();
        Self::with_record_names(example, config, record_names)
    }

    /// Override whether audit names are recorded.
    pub fn with_record_names(
        example: &'a mut Example<L>,
        config: &'a ParserConfig,
        record_names: bool,
    ) -> Self {
        Self {
            example,
            config,
            record_names,
            index: 0,
            new_index: false,
            channel_hash: 0,
            anon: 0,
            base: String::new(),
            spelling_slot: Vec::new(),
        }
    }

    pub fn example(&self) -> &Example<L> {
        self.example
    }

    fn reset_namespace(&mut self, index: u8) {
        self.index = index;
        self.anon = 0;
        self.new_index = self.example.features(index).is_empty();
    }

    fn emit_affixes(&mut self, name: &[u8], value: f32) {
        let packed = self.config.affix_features(self.index);
        if packed == 0 || name.is_empty() {
            return;
        }
        let hasher = self.config.hasher();
        if self.example.features(AFFIX_NAMESPACE).is_empty() {
            self.example.indices.push(AFFIX_NAMESPACE);
        }
        for item in affix_items(packed) {
            let affix = if name.len() > item.len() {
                if item.is_prefix() {
                    &name[..item.len()]
                } else {
                    &name[name.len() - item.len()..]
                }
            } else {
                name
            };
            let hash = hasher(affix, self.channel_hash)
                .wrapping_mul(AFFIX_CONSTANT.wrapping_add(item.code().wrapping_mul(QUADRATIC_CONSTANT)));
            let fs = self.example.features_mut(AFFIX_NAMESPACE);
            if self.record_names {
                let mut audit = String::new();
                if self.index != DEFAULT_NAMESPACE {
                    audit.push(self.index as char);
                }
                audit.push(if item.is_prefix() { '+' } else { '-' });
                audit.push((b'0' + item.len() as u8) as char);
                audit.push('=');
                audit.push_str(&String::from_utf8_lossy(affix));
                fs.push_named(value, hash, AuditName::new("affix", audit));
            } else {
                fs.push(value, hash);
            }
        }
    }

    fn emit_spelling(&mut self, name: &[u8], value: f32) {
        if !self.config.spelling_features(self.index) {
            return;
        }
        if self.example.features(SPELLING_NAMESPACE).is_empty() {
            self.example.indices.push(SPELLING_NAMESPACE);
        }
        self.spelling_slot.clear();
        self.spelling_slot.extend(name.iter().map(|&c| match c {
            b'0'..=b'9' => b'0',
            b'a'..=b'z' => b'a',
            b'A'..=b'Z' => b'A',
            b'.' => b'.',
            _ => b'#',
        }));
        let hash = (self.config.string_hasher())(&self.spelling_slot, self.channel_hash);
        let fs = self.example.features_mut(SPELLING_NAMESPACE);
        if self.record_names {
            let mut audit = String::new();
            if self.index != DEFAULT_NAMESPACE {
                audit.push(self.index as char);
                audit.push('_');
            }
            // the folded form is pure ASCII
            audit.extend(self.spelling_slot.iter().map(|&b| b as char));
            fs.push_named(value, hash, AuditName::new("spelling", audit));
        } else {
            fs.push(value, hash);
        }
    }

    fn emit_dictionaries(&mut self, name: &[u8]) {
        let config = self.config;
        let dictionaries = config.dictionaries(self.index);
        if dictionaries.is_empty() {
            return;
        }
        let key = dictionary_key(name);
        for dictionary in dictionaries {
            let found = match dictionary.lookup(name, key) {
                Some(found) if !found.is_empty() => found,
                _ => continue,
            };
            if self.example.features(DICTIONARY_NAMESPACE).is_empty() {
                self.example.indices.push(DICTIONARY_NAMESPACE);
            }
            let fs = self.example.features_mut(DICTIONARY_NAMESPACE);
            fs.values.extend_from_slice(&found.values);
            fs.indices.extend_from_slice(&found.indices);
            fs.sum_feat_sq += found.sum_feat_sq;
            if self.record_names {
                let prefix = format!("{}_{}=", self.index as char, String::from_utf8_lossy(name));
                fs.space_names.extend(
                    found
                        .indices
                        .iter()
                        .map(|id| AuditName::new("dictionary", format!("{}{}", prefix, id))),
                );
            }
        }
    }
}

impl<'a, L> ParserBackend for ExampleBackend<'a, L> {
    type Label = L;

    fn begin_default_namespace(&mut self) {
        self.reset_namespace(DEFAULT_NAMESPACE);
        if self.record_names {
            self.base.clear();
            self.base.push(' ');
        }
        let seed = self.config.hash_seed as u64;
        self.channel_hash = if seed == 0 { 0 } else { uniform_hash(b"", seed) };
    }

    fn begin_namespace(&mut self, name: &[u8]) {
        let first = name.first().copied().unwrap_or(DEFAULT_NAMESPACE);
        self.reset_namespace(self.config.redefine(first));
        if self.record_names {
            self.base.clear();
            self.base.push_str(&String::from_utf8_lossy(name));
        }
        self.channel_hash = (self.config.hasher())(name, self.config.hash_seed as u64);
    }

    fn complete_namespace(&mut self) {
        if self.new_index && !self.example.features(self.index).is_empty() {
            self.example.indices.push(self.index);
            self.new_index = false;
        }
    }

    fn emit_feature(&mut self, name: &[u8], value: f32) {
        let hash = if name.is_empty() {
            let hash = self.channel_hash.wrapping_add(self.anon);
            self.anon += 1;
            hash
        } else {
            (self.config.hasher())(name, self.channel_hash) & self.config.parse_mask
        };
        if value == 0.0 {
            return;
        }

        let fs = self.example.features_mut(self.index);
        if self.record_names {
            let audit = AuditName::new(self.base.clone(), String::from_utf8_lossy(name));
            fs.push_named(value, hash, audit);
        } else {
            fs.push(value, hash);
        }

        self.emit_affixes(name, value);
        self.emit_spelling(name, value);
        self.emit_dictionaries(name);
    }

    fn push_tag(&mut self, tag: &[u8]) {
        self.example.tag.extend_from_slice(tag);
    }

    fn label(&mut self) -> &mut L {
        &mut self.example.label
    }

    fn complete_example(&mut self) {}
}
