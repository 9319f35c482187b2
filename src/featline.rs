//! Main module for featline library functionality

pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod dictionary;
pub mod error;
pub mod example;
pub mod float;
pub mod hashing;
pub mod json;
pub mod label;
pub mod parser;
pub mod pool;
pub mod reader;
pub mod splitter;
pub mod summary;
