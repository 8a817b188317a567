//! Extraction of tracker issue keys from free text.
use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use crate::{Result, config::IssueConfig};

/// A ticket identifier such as `DASH-123`, as matched in the source text.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IssueKey(String);

impl IssueKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IssueKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Compiles an issue key pattern. Matching is case-insensitive over ASCII
/// only, so no other script can fold into a key.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .unicode(false)
        .build()?;

    Ok(regex)
}

/// Finds issue keys in commit messages and pull request text after
/// rewriting legacy project prefixes to their canonical form.
#[derive(Debug, Clone)]
pub struct KeyExtractor {
    pattern: Regex,
    remap_pattern: Option<Regex>,
    remaps: BTreeMap<String, String>,
}

impl KeyExtractor {
    pub fn new(config: &IssueConfig) -> Result<Self> {
        let pattern = compile_pattern(&config.pattern)?;

        // longest prefix wins where several start at the same position
        let mut prefixes = config
            .prefix_remaps
            .keys()
            .filter(|p| !p.is_empty())
            .map(|p| regex::escape(p))
            .collect::<Vec<String>>();
        prefixes.sort_by_key(|p| std::cmp::Reverse(p.len()));

        let remap_pattern = if prefixes.is_empty() {
            None
        } else {
            Some(Regex::new(&prefixes.join("|"))?)
        };

        Ok(Self {
            pattern,
            remap_pattern,
            remaps: config.prefix_remaps.clone(),
        })
    }

    /// Rewrites every literal occurrence of a legacy prefix in a single
    /// pass. Replacements are never rewritten again.
    pub fn normalize(&self, text: &str) -> String {
        let Some(remap_pattern) = &self.remap_pattern else {
            return text.to_string();
        };

        remap_pattern
            .replace_all(text, |caps: &Captures| {
                let prefix = &caps[0];
                self.remaps
                    .get(prefix)
                    .cloned()
                    .unwrap_or_else(|| prefix.to_string())
            })
            .into_owned()
    }

    /// Returns the deduplicated set of keys found across all texts.
    pub fn extract<I, S>(&self, texts: I) -> BTreeSet<IssueKey>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys = BTreeSet::new();

        for text in texts {
            let normalized = self.normalize(text.as_ref());
            keys.extend(
                self.pattern
                    .find_iter(&normalized)
                    .map(|m| IssueKey::new(m.as_str())),
            );
        }

        keys
    }
}
