//! Dictionary lookup
//!
//! Dictionaries map a feature name to a precomputed feature vector. The parser only reads
//! them; building them (from files or otherwise) is left to the caller.

use crate::featline::example::Features;
use crate::featline::hashing::{uniform_hash, QUADRATIC_CONSTANT};
use std::collections::HashMap;
use std::fmt;

/// Key hash the parser passes to [`Dictionary::lookup`].
pub fn dictionary_key(name: &[u8]) -> u64 {
    uniform_hash(name, QUADRATIC_CONSTANT)
}

/// Read-only name to feature-vector map.
pub trait Dictionary: fmt::Debug + Send + Sync {
    /// `hash` is always `dictionary_key(name)`.
    fn lookup(&self, name: &[u8], hash: u64) -> Option<&Features>;
}

/// Hash-bucketed dictionary keyed by [`dictionary_key`].
#[derive(Debug, Default, Clone)]
pub struct FeatureDict {
    buckets: HashMap<u64, Vec<(Vec<u8>, Features)>>,
    len: usize,
}

impl FeatureDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the vector stored under `name`.
    pub fn insert(&mut self, name: impl AsRef<[u8]>, features: Features) {
        let name = name.as_ref();
        let bucket = self.buckets.entry(dictionary_key(name)).or_default();
        match bucket.iter_mut().find(|(key, _)| key.as_slice() == name) {
            Some((_, slot)) => *slot = features,
            None => {
                bucket.push((name.to_vec(), features));
                self.len += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Dictionary for FeatureDict {
    fn lookup(&self, name: &[u8], hash: u64) -> Option<&Features> {
        self.buckets
            .get(&hash)?
            .iter()
            .find(|(key, _)| key.as_slice() == name)
            .map(|(_, features)| features)
    }
}
