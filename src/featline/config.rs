//! Immutable parser configuration
//!
//! All the per-namespace tables the backend consults (affix specs, spelling flags,
//! dictionaries, namespace redefinitions) live in one [`ParserConfig`] value. It is built
//! once, then shared read-only by every parser instance, so it can sit behind an `Arc`
//! and be handed to as many threads as needed.

use crate::featline::dictionary::Dictionary;
use crate::featline::example::{DEFAULT_NAMESPACE, NAMESPACE_COUNT};
use crate::featline::hashing::{hash_string, HashFn, HashStrategy};
use featline_config::{HashKind, ParserSettings};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed affix argument (length must be 1..7): {0}")]
    AffixLength(String),
    #[error("malformed affix argument (invalid namespace): {0}")]
    AffixNamespace(String),
    #[error("malformed affix argument (too long): {0}")]
    AffixTooLong(String),
    #[error("argument of redefine is malformed. Valid format is N:=S, :=S or N:= ({0})")]
    Redefine(String),
    #[error("bit precision must be between 1 and 64, got {0}")]
    BitPrecision(u32),
}

/// One packed affix item: `len << 1 | is_prefix`, 4 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffixItem(u64);

impl AffixItem {
    pub fn new(is_prefix: bool, len: u8) -> Self {
        Self((((len & 0x7) as u64) << 1) | is_prefix as u64)
    }

    pub fn is_prefix(self) -> bool {
        self.0 & 0x1 == 1
    }

    pub fn len(self) -> usize {
        ((self.0 >> 1) & 0x7) as usize
    }

    /// The nibble mixed into the affix hash multiplier.
    pub fn code(self) -> u64 {
        self.0 & 0xF
    }
}

/// Iterate the items packed into one namespace's affix word, low nibble first.
pub fn affix_items(mut packed: u64) -> impl Iterator<Item = AffixItem> {
    std::iter::from_fn(move || {
        if packed == 0 {
            return None;
        }
        let item = AffixItem(packed & 0xF);
        packed >>= 4;
        Some(item)
    })
}

/// Read-only configuration consumed by the backend.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub hash_seed: u32,
    pub hash: HashStrategy,
    /// Applied to named feature hashes only.
    pub parse_mask: u64,
    pub strict: bool,
    pub audit: bool,
    affix_features: Box<[u64; NAMESPACE_COUNT]>,
    spelling_features: Box<[bool; NAMESPACE_COUNT]>,
    namespace_dictionaries: Vec<Vec<Arc<dyn Dictionary>>>,
    redefine: Box<[u8; NAMESPACE_COUNT]>,
    redefine_some: bool,
}

impl ParserConfig {
    pub fn builder() -> ParserConfigBuilder {
        ParserConfigBuilder::new()
    }

    /// Build the tables described by loaded settings.
    pub fn from_settings(settings: &ParserSettings) -> Result<Self, ConfigError> {
        let mut builder = Self::builder()
            .hash_seed(settings.hash_seed)
            .hash(match settings.hash {
                HashKind::Strings => HashStrategy::Strings,
                HashKind::All => HashStrategy::All,
            })
            .strict(settings.strict)
            .audit(settings.audit);
        if let Some(bits) = settings.bit_precision {
            builder = builder.bit_precision(bits)?;
        }
        for affix in &settings.affix {
            builder = builder.affix(affix)?;
        }
        for spelling in &settings.spelling {
            builder = builder.spelling(spelling);
        }
        for redefine in &settings.redefine {
            builder = builder.redefine(redefine)?;
        }
        Ok(builder.build())
    }

    pub fn hasher(&self) -> HashFn {
        self.hash.hasher()
    }

    /// Hash used for spelling features, independent of the configured hasher.
    pub fn string_hasher(&self) -> HashFn {
        hash_string
    }

    pub fn affix_features(&self, index: u8) -> u64 {
        self.affix_features[index as usize]
    }

    pub fn spelling_features(&self, index: u8) -> bool {
        self.spelling_features[index as usize]
    }

    pub fn dictionaries(&self, index: u8) -> &[Arc<dyn Dictionary>] {
        &self.namespace_dictionaries[index as usize]
    }

    /// Apply the redefinition table to a namespace's first byte.
    pub fn redefine(&self, index: u8) -> u8 {
        if self.redefine_some {
            self.redefine[index as usize]
        } else {
            index
        }
    }

    /// Whether names must be recorded next to features.
    pub fn record_names(&self) -> bool {
        self.audit
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfigBuilder::new().build()
    }
}

#[derive(Debug, Clone)]
pub struct ParserConfigBuilder {
    config: ParserConfig,
}

impl ParserConfigBuilder {
    pub fn new() -> Self {
        let mut redefine = Box::new([0u8; NAMESPACE_COUNT]);
        for (i, slot) in redefine.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Self {
            config: ParserConfig {
                hash_seed: 0,
                hash: HashStrategy::Strings,
                parse_mask: u64::MAX,
                strict: false,
                audit: false,
                affix_features: Box::new([0; NAMESPACE_COUNT]),
                spelling_features: Box::new([false; NAMESPACE_COUNT]),
                namespace_dictionaries: vec![Vec::new(); NAMESPACE_COUNT],
                redefine,
                redefine_some: false,
            },
        }
    }

    pub fn hash_seed(mut self, seed: u32) -> Self {
        self.config.hash_seed = seed;
        self
    }

    pub fn hash(mut self, hash: HashStrategy) -> Self {
        self.config.hash = hash;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    pub fn audit(mut self, audit: bool) -> Self {
        self.config.audit = audit;
        self
    }

    /// Keep only the low `bits` bits of named feature hashes.
    pub fn bit_precision(mut self, bits: u32) -> Result<Self, ConfigError> {
        self.config.parse_mask = match bits {
            1..=63 => (1u64 << bits) - 1,
            64 => u64::MAX,
            _ => return Err(ConfigError::BitPrecision(bits)),
        };
        Ok(self)
    }

    /// Add comma-separated affix items such as `+3a,-2`.
    pub fn affix(mut self, items: &str) -> Result<Self, ConfigError> {
        for item in items.split(',').filter(|item| !item.is_empty()) {
            let bytes = item.as_bytes();
            let (is_prefix, rest) = match bytes[0] {
                b'+' => (true, &bytes[1..]),
                b'-' => (false, &bytes[1..]),
                _ => (true, bytes),
            };
            let len = match rest.first() {
                Some(&d @ b'1'..=b'7') => d - b'0',
                _ => return Err(ConfigError::AffixLength(item.to_string())),
            };
            let namespace = match rest.get(1) {
                None => DEFAULT_NAMESPACE,
                Some(b'|') | Some(b':') => {
                    return Err(ConfigError::AffixNamespace(item.to_string()))
                }
                Some(&ns) => ns,
            };
            if rest.len() > 2 {
                return Err(ConfigError::AffixTooLong(item.to_string()));
            }
            let slot = &mut self.config.affix_features[namespace as usize];
            *slot = (*slot << 4) | AffixItem::new(is_prefix, len).0;
        }
        Ok(self)
    }

    /// Enable spelling features for the namespace named by the first character; `_` is the
    /// default namespace.
    pub fn spelling(mut self, namespace: &str) -> Self {
        let index = match namespace.as_bytes().first() {
            Some(b'_') => DEFAULT_NAMESPACE,
            Some(&b) => b,
            None => return self,
        };
        self.config.spelling_features[index as usize] = true;
        self
    }

    /// Remap namespaces with an `N:=S` rule.
    pub fn redefine(mut self, rule: &str) -> Result<Self, ConfigError> {
        let bytes = rule.as_bytes();
        let operator = bytes
            .windows(2)
            .position(|w| w == b":=")
            .ok_or_else(|| ConfigError::Redefine(rule.to_string()))?;
        if operator > 1 {
            tracing::warn!(
                "multiple namespaces are used in target part of redefine argument '{}'. Only first one ('{}') will be used as target namespace.",
                rule,
                bytes[0] as char
            );
        }
        let target = if operator == 0 {
            DEFAULT_NAMESPACE
        } else {
            bytes[0]
        };
        let sources = &bytes[operator + 2..];

        self.config.redefine_some = true;
        if sources.is_empty() {
            self.config.redefine[DEFAULT_NAMESPACE as usize] = target;
            return Ok(self);
        }
        for &source in sources {
            if source == b':' {
                // wildcard: everything, then stop reading S
                self.config.redefine.fill(target);
                break;
            }
            self.config.redefine[source as usize] = target;
        }
        Ok(self)
    }

    /// Attach a dictionary to a namespace index. Several dictionaries may share a namespace
    /// and one dictionary may serve several namespaces.
    pub fn dictionary(mut self, index: u8, dictionary: Arc<dyn Dictionary>) -> Self {
        self.config.namespace_dictionaries[index as usize].push(dictionary);
        self
    }

    pub fn build(self) -> ParserConfig {
        self.config
    }
}

impl Default for ParserConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affix_items_pack_last_first() {
        let config = ParserConfig::builder().affix("+3a,-2a").unwrap().build();
        let items: Vec<_> = affix_items(config.affix_features(b'a')).collect();
        assert_eq!(items.len(), 2);
        assert!(!items[0].is_prefix());
        assert_eq!(items[0].len(), 2);
        assert!(items[1].is_prefix());
        assert_eq!(items[1].len(), 3);
        assert_eq!(items[1].code(), 7);
    }

    #[test]
    fn affix_without_namespace_targets_default() {
        let config = ParserConfig::builder().affix("4").unwrap().build();
        assert_eq!(config.affix_features(DEFAULT_NAMESPACE), 0b1001);
    }

    #[test]
    fn affix_errors() {
        assert_eq!(
            ParserConfig::builder().affix("+8a").unwrap_err(),
            ConfigError::AffixLength("+8a".into())
        );
        assert_eq!(
            ParserConfig::builder().affix("+2|").unwrap_err(),
            ConfigError::AffixNamespace("+2|".into())
        );
        assert_eq!(
            ParserConfig::builder().affix("-2ab").unwrap_err(),
            ConfigError::AffixTooLong("-2ab".into())
        );
    }

    #[test]
    fn spelling_underscore_is_default_namespace() {
        let config = ParserConfig::builder().spelling("_").spelling("w").build();
        assert!(config.spelling_features(DEFAULT_NAMESPACE));
        assert!(config.spelling_features(b'w'));
        assert!(!config.spelling_features(b'_'));
    }

    #[test]
    fn redefine_rules() {
        let config = ParserConfig::builder().redefine("x:=abc").unwrap().build();
        assert_eq!(config.redefine(b'a'), b'x');
        assert_eq!(config.redefine(b'c'), b'x');
        assert_eq!(config.redefine(b'd'), b'd');

        let config = ParserConfig::builder().redefine(":=q").unwrap().build();
        assert_eq!(config.redefine(b'q'), DEFAULT_NAMESPACE);

        let config = ParserConfig::builder().redefine("z:=").unwrap().build();
        assert_eq!(config.redefine(DEFAULT_NAMESPACE), b'z');

        let config = ParserConfig::builder().redefine("w:=a:").unwrap().build();
        assert_eq!(config.redefine(b'm'), b'w');
        assert_eq!(config.redefine(DEFAULT_NAMESPACE), b'w');

        assert!(ParserConfig::builder().redefine("abc").is_err());
    }

    #[test]
    fn bit_precision_sets_mask() {
        let config = ParserConfig::builder().bit_precision(18).unwrap().build();
        assert_eq!(config.parse_mask, 0x3ffff);
        assert_eq!(ParserConfig::default().parse_mask, u64::MAX);
        assert!(ParserConfig::builder().bit_precision(0).is_err());
    }

    #[test]
    fn builds_from_loaded_settings() {
        let settings = featline_config::load_defaults().unwrap().parser;
        let config = ParserConfig::from_settings(&settings).unwrap();
        assert_eq!(config.hash, HashStrategy::Strings);
        assert!(!config.strict);
        assert_eq!(config.redefine(b'a'), b'a');
    }
}
