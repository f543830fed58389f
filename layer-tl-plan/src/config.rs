//! Plan configuration: extra capability tags.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::PlanError;

/// Capability tags attached to resolved types and declarations beyond their
/// schema's default supertype.
///
/// ```toml
/// [capabilities.exact]
/// "InputPeer" = ["Peer"]
///
/// [[capabilities.patterns]]
/// pattern = "^input"
/// tags = ["InputObject"]
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// Exact full name → tags.
    pub exact: BTreeMap<String, Vec<String>>,
    /// Regular expression over the full name → tags, in order.
    pub patterns: Vec<PatternRule>,
}

/// One regex-keyed entry of [`Capabilities`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    /// The regular expression.
    pub pattern: String,
    /// Tags for every name it matches.
    pub tags: Vec<String>,
}

/// Settings for [`crate::compile`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extra capability tags.
    pub capabilities: Capabilities,
}

/// [`Capabilities`] with every pattern compiled.
pub(crate) struct CapabilityTable<'a> {
    exact: &'a BTreeMap<String, Vec<String>>,
    patterns: Vec<(Regex, &'a [String])>,
}

impl<'a> CapabilityTable<'a> {
    pub(crate) fn compile(capabilities: &'a Capabilities) -> Result<Self, PlanError> {
        let patterns = capabilities
            .patterns
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|re| (re, rule.tags.as_slice()))
                    .map_err(|source| PlanError::InvalidCapabilityPattern {
                        pattern: rule.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { exact: &capabilities.exact, patterns })
    }

    /// Tags for `name`: exact entries first, then pattern matches, without repeats.
    pub(crate) fn tags_for(&self, name: &str) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        let exact = self.exact.get(name).map(Vec::as_slice).unwrap_or_default();
        let matched = self
            .patterns
            .iter()
            .filter(|(re, _)| re.is_match(name))
            .flat_map(|(_, tags)| tags.iter());
        for tag in exact.iter().chain(matched) {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_then_patterns_without_duplicates() {
        let caps = Capabilities {
            exact: BTreeMap::from([("InputPeer".to_owned(), vec!["Peer".to_owned()])]),
            patterns: vec![
                PatternRule { pattern: "^Input".into(), tags: vec!["Input".into(), "Peer".into()] },
                PatternRule { pattern: "Media$".into(), tags: vec!["Media".into()] },
            ],
        };
        let table = CapabilityTable::compile(&caps).unwrap();
        assert_eq!(table.tags_for("InputPeer"), ["Peer", "Input"]);
        assert_eq!(table.tags_for("MessageMedia"), ["Media"]);
        assert!(table.tags_for("User").is_empty());
    }

    #[test]
    fn bad_pattern_is_reported() {
        let caps = Capabilities {
            patterns: vec![PatternRule { pattern: "(".into(), tags: vec![] }],
            ..Capabilities::default()
        };
        assert!(matches!(
            CapabilityTable::compile(&caps),
            Err(PlanError::InvalidCapabilityPattern { .. })
        ));
    }
}
