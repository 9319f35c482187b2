//! Serializable view of a parsed example, used by the CLI and snapshot tests.

use crate::featline::example::{AuditName, Example, Features};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExampleSummary<'a, L> {
    pub tag: String,
    pub label: &'a L,
    pub namespaces: Vec<NamespaceSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespaceSummary {
    pub index: u8,
    /// The index as a character; reserved namespaces show as their number.
    pub name: String,
    pub sum_feat_sq: f32,
    pub features: Vec<FeatureSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSummary {
    pub hash: u64,
    pub value: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit: Option<String>,
}

impl<'a, L> ExampleSummary<'a, L> {
    pub fn of(example: &'a Example<L>) -> Self {
        Self {
            tag: String::from_utf8_lossy(&example.tag).into_owned(),
            label: &example.label,
            namespaces: example
                .namespaces()
                .map(|(index, features)| NamespaceSummary::of(index, features))
                .collect(),
        }
    }
}

impl NamespaceSummary {
    fn of(index: u8, features: &Features) -> Self {
        let name = if index.is_ascii_graphic() || index == b' ' {
            (index as char).to_string()
        } else {
            index.to_string()
        };
        let audit = |i: usize| {
            features
                .space_names
                .get(i)
                .map(|AuditName { namespace, feature }| format!("{}^{}", namespace, feature))
        };
        Self {
            index,
            name,
            sum_feat_sq: features.sum_feat_sq,
            features: features
                .iter()
                .enumerate()
                .map(|(i, (hash, value))| FeatureSummary {
                    hash,
                    value,
                    audit: audit(i),
                })
                .collect(),
        }
    }
}
