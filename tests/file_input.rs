//! Reading files from disk with settings layered from TOML.

use featline::featline::config::{ConfigError, ParserConfig};
use featline::featline::example::{Example, AFFIX_NAMESPACE, DEFAULT_NAMESPACE};
use featline::featline::label::SimpleLabelParser;
use featline::featline::reader::LineReader;
use featline::featline::splitter::TextParser;
use featline_config::Loader;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn write_temp(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

#[test]
fn parses_a_file_with_bom_and_crlf() {
    let data = write_temp(b"\xef\xbb\xbf1 'first| a b\r\n-1 | c:2\r\n\n");
    let mut reader = LineReader::from_path(data.path()).unwrap();
    let mut parser = TextParser::new(Arc::new(ParserConfig::default()), SimpleLabelParser);

    let mut examples = Vec::new();
    while let Some(line) = reader.read_line().unwrap() {
        let mut example = Example::new();
        parser.parse_line(line, &mut example).unwrap();
        examples.push(example);
    }

    assert_eq!(reader.lines_read(), 3);
    assert_eq!(examples[0].tag, b"first");
    assert_eq!(examples[0].label.label, 1.0);
    assert_eq!(examples[0].features(DEFAULT_NAMESPACE).len(), 2);
    assert_eq!(examples[1].features(DEFAULT_NAMESPACE).values, vec![2.0]);
    assert!(examples[2].is_empty());
    assert!(!examples[2].label.is_labeled());
}

#[test]
fn settings_file_configures_the_parser() {
    let settings = write_temp(b"[parser]\nhash_seed = 3\naffix = [\"+2\"]\naudit = true\n");
    let loaded = Loader::new().with_file(settings.path()).build().unwrap();
    let config = ParserConfig::from_settings(&loaded.parser).unwrap();
    assert_eq!(config.hash_seed, 3);
    assert!(config.record_names());

    let mut parser = TextParser::new(Arc::new(config), SimpleLabelParser);
    let mut example = Example::new();
    parser.parse_line(b"| word", &mut example).unwrap();
    let affix = example.features(AFFIX_NAMESPACE);
    assert_eq!(affix.len(), 1);
    assert_eq!(affix.space_names[0].feature, "+2=wo");
}

#[test]
fn malformed_settings_are_rejected() {
    let settings = write_temp(b"[parser]\naffix = [\"+9\"]\n");
    let loaded = Loader::new().with_file(settings.path()).build().unwrap();
    assert_eq!(
        ParserConfig::from_settings(&loaded.parser).unwrap_err(),
        ConfigError::AffixLength("+9".to_string())
    );

    let settings = write_temp(b"[parser]\nhash = \"md5\"\n");
    assert!(Loader::new().with_file(settings.path()).build().is_err());
}
