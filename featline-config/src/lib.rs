//! Shared configuration loader for featline.
//!
//! `defaults/featline.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`FeatlineConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

pub use config::ConfigError as SettingsError;

const DEFAULT_TOML: &str = include_str!("../defaults/featline.default.toml");

/// Top-level configuration consumed by featline applications.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatlineConfig {
    pub parser: ParserSettings,
    pub input: InputSettings,
}

/// Knobs that shape how a line becomes a hashed example.
#[derive(Debug, Clone, Deserialize)]
pub struct ParserSettings {
    pub hash_seed: u32,
    pub hash: HashKind,
    #[serde(default)]
    pub bit_precision: Option<u32>,
    pub strict: bool,
    pub audit: bool,
    pub affix: Vec<String>,
    pub spelling: Vec<String>,
    pub redefine: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashKind {
    Strings,
    All,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputSettings {
    pub format: InputFormat,
}

/// Which producer turns raw lines into examples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputFormat {
    Text,
    Json,
    Dsjson,
}

impl InputFormat {
    /// Name used in TOML files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            InputFormat::Text => "text",
            InputFormat::Json => "json",
            InputFormat::Dsjson => "dsjson",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [InputFormat::Text, InputFormat::Json, InputFormat::Dsjson]
            .into_iter()
            .find(|format| format.name() == name)
    }
}

/// Layers TOML files and command-line flags over the embedded defaults.
///
/// Later layers win: defaults, then files in the order they were added, then overrides.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            builder: Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml)),
        }
    }

    /// Layer a TOML file that must exist.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), true)
    }

    /// Layer a TOML file if it exists.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), false)
    }

    fn layer(mut self, path: &Path, required: bool) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path).format(FileFormat::Toml).required(required));
        self
    }

    /// Turn on `parser.strict` / `parser.audit`. A `false` flag leaves the layered value
    /// alone, so a config file can enable either one without the command line undoing it.
    pub fn with_parser_flags(self, strict: bool, audit: bool) -> Result<Self, ConfigError> {
        let mut loader = self;
        if strict {
            loader = loader.set_override("parser.strict", true)?;
        }
        if audit {
            loader = loader.set_override("parser.audit", true)?;
        }
        Ok(loader)
    }

    /// Force the input format regardless of what the files say.
    pub fn with_input_format(self, format: InputFormat) -> Result<Self, ConfigError> {
        self.set_override("input.format", format.name())
    }

    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<FeatlineConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The embedded defaults with nothing layered on top.
pub fn load_defaults() -> Result<FeatlineConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.parser.hash_seed, 0);
        assert_eq!(config.parser.hash, HashKind::Strings);
        assert_eq!(config.parser.bit_precision, None);
        assert!(!config.parser.strict);
        assert!(config.parser.affix.is_empty());
        assert_eq!(config.input.format, InputFormat::Text);
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("parser.strict", true)
            .expect("override to apply")
            .set_override("input.format", "dsjson")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert!(config.parser.strict);
        assert_eq!(config.input.format, InputFormat::Dsjson);
    }

    #[test]
    fn layers_user_file_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[parser]\nhash = \"all\"\nbit_precision = 18\naffix = [\"+3a\"]"
        )
        .unwrap();
        let config = Loader::new().with_file(file.path()).build().unwrap();
        assert_eq!(config.parser.hash, HashKind::All);
        assert_eq!(config.parser.bit_precision, Some(18));
        assert_eq!(config.parser.affix, vec!["+3a".to_string()]);
        assert!(!config.parser.audit);
    }

    #[test]
    fn parser_flags_only_switch_on() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[parser]\naudit = true").unwrap();
        let config = Loader::new()
            .with_file(file.path())
            .with_parser_flags(true, false)
            .unwrap()
            .build()
            .unwrap();
        assert!(config.parser.strict);
        assert!(config.parser.audit);
    }

    #[test]
    fn input_format_override_and_names() {
        let config = Loader::new()
            .with_input_format(InputFormat::Json)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.input.format, InputFormat::Json);
        assert_eq!(InputFormat::from_name("dsjson"), Some(InputFormat::Dsjson));
        assert_eq!(InputFormat::from_name("csv"), None);
    }

    #[test]
    fn optional_file_may_be_absent() {
        let config = Loader::new()
            .with_optional_file("/nonexistent/featline.toml")
            .build()
            .unwrap();
        assert_eq!(config.parser.hash_seed, 0);
    }
}
