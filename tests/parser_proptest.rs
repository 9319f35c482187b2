//! Property-based tests over generated text lines
//!
//! The generated lines mix well-formed and malformed segments; whatever the parser makes
//! of them, the stored examples must keep their structural guarantees.

use featline::featline::config::ParserConfig;
use featline::featline::example::Example;
use featline::featline::hashing::hash_string;
use featline::featline::label::NoLabel;
use featline::featline::splitter::TextParser;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn parse(config: &Arc<ParserConfig>, line: &str) -> Example<()> {
    let mut parser = TextParser::new(Arc::clone(config), NoLabel);
    let mut example = Example::new();
    parser.parse_line(line.as_bytes(), &mut example).unwrap();
    example
}

fn feature() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,6}",
        "[a-z]{1,4}:[0-9]{1,2}",
        "[a-z]{1,4}:0",
        ":[0-9]{1,2}",
        "[a-z]{0,3}:[a-z.]{0,2}",
    ]
}

fn segment() -> impl Strategy<Value = String> {
    (
        prop_oneof!["", "[a-e]", "[a-e]{1,3}:[0-2]", "[a-e]:x"],
        prop::collection::vec(feature(), 0..5),
    )
        .prop_map(|(name, features)| format!("{} {}", name, features.join(" ")))
}

fn line() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 0..5).prop_map(|segments| {
        segments
            .iter()
            .map(|s| format!("|{}", s))
            .collect::<String>()
    })
}

proptest! {
    #[test]
    fn stored_values_are_never_zero(line in line()) {
        let ex = parse(&Arc::new(ParserConfig::default()), &line);
        for (_, features) in ex.namespaces() {
            prop_assert!(!features.is_empty());
            prop_assert!(features.values.iter().all(|&v| v != 0.0));
        }
    }

    #[test]
    fn listed_indices_are_unique(line in line()) {
        let ex = parse(&Arc::new(ParserConfig::default()), &line);
        let unique: HashSet<u8> = ex.indices.iter().copied().collect();
        prop_assert_eq!(unique.len(), ex.indices.len());
    }

    #[test]
    fn anonymous_features_count_up(values in prop::collection::vec(1u8..100, 1..8)) {
        let body: Vec<String> = values.iter().map(|v| format!(":{}", v)).collect();
        let line = format!("|q {}", body.join(" "));
        let ex = parse(&Arc::new(ParserConfig::default()), &line);
        let channel = hash_string(b"q", 0);
        let expected: Vec<u64> = (0..values.len() as u64).map(|i| channel.wrapping_add(i)).collect();
        prop_assert_eq!(&ex.features(b'q').indices, &expected);
    }

    #[test]
    fn namespace_hashing_is_deterministic(
        name in "[a-z]{1,8}",
        seed in any::<u32>(),
        feature in "[a-z]{1,8}",
    ) {
        let config = Arc::new(ParserConfig::builder().hash_seed(seed).build());
        let first = parse(&config, &format!("|{} {}", name, feature));
        let second = parse(&config, &format!("1 'other|{} {} extra", name, feature));
        let index = name.as_bytes()[0];
        prop_assert_eq!(first.features(index).indices[0], second.features(index).indices[0]);
    }
}
