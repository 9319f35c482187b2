//! Example and feature space types
//!
//! An [`Example`] keeps one [`Features`] per possible namespace index (most of them empty)
//! plus the ordered list of indices that actually hold features.

/// Index of the namespace used when a segment has no name.
pub const DEFAULT_NAMESPACE: u8 = b' ';
/// Namespace receiving prefix/suffix features.
pub const AFFIX_NAMESPACE: u8 = 132;
/// Namespace receiving character-class spelling features.
pub const SPELLING_NAMESPACE: u8 = 133;
/// Namespace receiving features copied from dictionaries.
pub const DICTIONARY_NAMESPACE: u8 = 135;

/// Number of addressable namespace indices.
pub const NAMESPACE_COUNT: usize = 256;

/// Human-readable name attached to a stored feature in audit mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditName {
    pub namespace: String,
    pub feature: String,
}

impl AuditName {
    pub fn new(namespace: impl Into<String>, feature: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            feature: feature.into(),
        }
    }
}

/// The features of one namespace, stored as parallel columns.
///
/// `space_names` is either empty or exactly as long as `values`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
    pub values: Vec<f32>,
    pub indices: Vec<u64>,
    pub space_names: Vec<AuditName>,
    pub sum_feat_sq: f32,
}

impl Features {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: f32, index: u64) {
        self.values.push(value);
        self.indices.push(index);
        self.sum_feat_sq += value * value;
    }

    /// Push a feature together with its audit name.
    pub fn push_named(&mut self, value: f32, index: u64, name: AuditName) {
        self.push(value, index);
        self.space_names.push(name);
    }

    /// Iterate `(hash, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.indices.clear();
        self.space_names.clear();
        self.sum_feat_sq = 0.0;
    }
}

/// One parsed training event.
#[derive(Debug, Clone)]
pub struct Example<L> {
    pub tag: Vec<u8>,
    pub label: L,
    /// Populated namespace indices, in the order they were first completed.
    pub indices: Vec<u8>,
    feature_space: Vec<Features>,
}

impl<L: Default> Example<L> {
    pub fn new() -> Self {
        Self {
            tag: Vec::new(),
            label: L::default(),
            indices: Vec::new(),
            feature_space: vec![Features::new(); NAMESPACE_COUNT],
        }
    }

    /// Return the example to its freshly acquired state, keeping allocations.
    pub fn reset(&mut self) {
        self.tag.clear();
        self.label = L::default();
        self.indices.clear();
        // A strict failure can leave a space filled but unlisted.
        for features in self.feature_space.iter_mut().filter(|f| !f.is_empty()) {
            features.clear();
        }
    }
}

impl<L: Default> Default for Example<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> Example<L> {
    pub fn features(&self, index: u8) -> &Features {
        &self.feature_space[index as usize]
    }

    pub fn features_mut(&mut self, index: u8) -> &mut Features {
        &mut self.feature_space[index as usize]
    }

    /// Total number of stored features across the listed namespaces.
    pub fn num_features(&self) -> usize {
        self.indices
            .iter()
            .map(|&index| self.features(index).len())
            .sum()
    }

    /// The populated namespaces in list order.
    pub fn namespaces(&self) -> impl Iterator<Item = (u8, &Features)> + '_ {
        self.indices.iter().map(move |&index| (index, self.features(index)))
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_tracks_sum_of_squares() {
        let mut fs = Features::new();
        fs.push(2.0, 10);
        fs.push(-3.0, 11);
        assert_eq!(fs.len(), 2);
        assert_eq!(fs.sum_feat_sq, 13.0);
        assert_eq!(fs.iter().collect::<Vec<_>>(), vec![(10, 2.0), (11, -3.0)]);
    }

    #[test]
    fn reset_clears_everything() {
        let mut ex: Example<f32> = Example::new();
        ex.tag.extend_from_slice(b"t");
        ex.label = 4.0;
        ex.features_mut(b'a').push(1.0, 1);
        ex.indices.push(b'a');
        ex.features_mut(AFFIX_NAMESPACE).push(1.0, 2);

        ex.reset();

        assert!(ex.tag.is_empty());
        assert_eq!(ex.label, 0.0);
        assert!(ex.is_empty());
        assert!(ex.features(b'a').is_empty());
        assert!(ex.features(AFFIX_NAMESPACE).is_empty());
    }
}
