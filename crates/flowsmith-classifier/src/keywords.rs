//! The keyword table.
//!
//! Rules are listed in precedence order: when a description mentions
//! keywords of several categories, the rule that comes first wins.  Keywords
//! are matched as lower-case substrings, so `"data"` also fires on
//! `"database"`.
//!
//! Bump [`KEYWORD_TABLE_VERSION`] whenever a keyword or the rule order
//! changes; generated workflows can differ between versions.

use serde::{Deserialize, Serialize};

use flowsmith_schema::StepCategory;

use crate::error::{ClassifierError, Result};

/// Version of [`KeywordTable::builtin`].
pub const KEYWORD_TABLE_VERSION: u32 = 1;

/// One category and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub category: StepCategory,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new<I, S>(category: StepCategory, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            category,
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered, versioned list of keyword rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTable {
    pub version: u32,
    pub rules: Vec<KeywordRule>,
}

impl KeywordTable {
    /// The table shipped with this crate.
    pub fn builtin() -> Self {
        Self {
            version: KEYWORD_TABLE_VERSION,
            rules: vec![
                KeywordRule::new(
                    StepCategory::InferenceProcessing,
                    [
                        "ai", "generate", "analysis", "analyze", "process", "llm", "gpt", "claude",
                        "create", "write",
                    ],
                ),
                KeywordRule::new(
                    StepCategory::FormInput,
                    ["input", "upload", "file", "data", "schema"],
                ),
                KeywordRule::new(StepCategory::CodeExecution, ["execute", "run", "test", "code"]),
                KeywordRule::new(
                    StepCategory::ExternalRequest,
                    ["crawl", "fetch", "api", "request", "extract", "scrape"],
                ),
            ],
        }
    }

    /// Reject tables the matcher cannot interpret unambiguously.
    pub fn validate(&self) -> Result<()> {
        let mut seen = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            if seen.contains(&rule.category) {
                return Err(ClassifierError::DuplicateCategory {
                    category: rule.category,
                });
            }
            seen.push(rule.category);

            if rule.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(ClassifierError::EmptyKeyword {
                    category: rule.category,
                });
            }
        }
        Ok(())
    }

    /// Every keyword, lower-cased, paired with the rank of its rule.
    pub(crate) fn flatten(&self) -> Vec<(usize, String)> {
        self.rules
            .iter()
            .enumerate()
            .flat_map(|(rank, rule)| rule.keywords.iter().map(move |k| (rank, k.to_lowercase())))
            .collect()
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_is_valid() {
        let table = KeywordTable::builtin();
        table.validate().unwrap();
        assert_eq!(table.version, KEYWORD_TABLE_VERSION);
        assert_eq!(table.rules[0].category, StepCategory::InferenceProcessing);
        assert_eq!(table.rules[3].category, StepCategory::ExternalRequest);
    }

    #[test]
    fn empty_keyword_is_rejected() {
        let table = KeywordTable {
            version: 1,
            rules: vec![KeywordRule::new(StepCategory::FormInput, ["input", " "])],
        };
        assert!(matches!(
            table.validate(),
            Err(ClassifierError::EmptyKeyword { category: StepCategory::FormInput })
        ));
    }

    #[test]
    fn repeated_category_is_rejected() {
        let table = KeywordTable {
            version: 1,
            rules: vec![
                KeywordRule::new(StepCategory::FormInput, ["input"]),
                KeywordRule::new(StepCategory::FormInput, ["upload"]),
            ],
        };
        assert!(table.validate().is_err());
    }

    #[test]
    fn flatten_keeps_rule_rank() {
        let flat = KeywordTable::builtin().flatten();
        assert_eq!(flat[0], (0, "ai".to_string()));
        assert!(flat.contains(&(2, "test".to_string())));
    }
}
