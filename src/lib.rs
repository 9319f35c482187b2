//! # featline
//!
//! Parser for the text training-line format:
//!
//! ```text
//! 1 0.5 'tag|user age:32 city=paris |item price:9.99
//! ```
//!
//! A line is split into label words, an optional tag and `|`-separated namespace
//! segments. Feature names are hashed under their namespace's hash, and configured
//! expansions (affixes, spelling shapes, dictionary lookups) add derived features.
//!
//! Start with [`featline::splitter::TextParser`] for text lines or
//! [`featline::json::JsonParser`] for JSON and decision-service lines. Both fill
//! [`featline::example::Example`] values configured by [`featline::config::ParserConfig`].

pub mod featline;

pub use featline::config::ParserConfig;
pub use featline::error::Error;
pub use featline::example::Example;
