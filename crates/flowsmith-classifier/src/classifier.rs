//! Keyword step classifier.
//!
//! A [`KeywordClassifier`] compiles every keyword of a [`KeywordTable`] into
//! one Aho-Corasick automaton.  Classifying a description scans it once with
//! overlapping matches and keeps the match whose rule ranks highest; the
//! winning category then decides which parameters, prompt configuration, and
//! handler reference the step receives.
//!
//! ```rust
//! # use flowsmith_classifier::KeywordClassifier;
//! # use flowsmith_schema::StepCategory;
//! let classifier = KeywordClassifier::with_default_table().unwrap();
//! let c = classifier.classify("AI analysis of sales").unwrap();
//! assert_eq!(c.category, StepCategory::InferenceProcessing);
//! ```

use aho_corasick::AhoCorasick;
use serde::Serialize;
use serde_json::json;

use flowsmith_schema::catalog::LLM_PROVIDERS;
use flowsmith_schema::{
    ParameterDefinition, ParameterKind, PromptConfig, StepCategory, StepConfig, StepDefinition,
};

use crate::error::{ClassifierError, Result};
use crate::keywords::KeywordTable;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Everything inferred from one task description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub category: StepCategory,
    pub parameters: Vec<ParameterDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<StepConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler_reference: Option<String>,
    /// The keyword that decided the category; `None` for the fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_keyword: Option<String>,
}

impl Classification {
    /// Turn the classification into a step with the given identity.
    pub fn into_step(
        self,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> StepDefinition {
        let mut step = StepDefinition::new(id, name, self.category)
            .with_description(description)
            .with_parameters(self.parameters);
        step.config = self.config;
        step.handler_reference = self.handler_reference;
        step
    }
}

// ---------------------------------------------------------------------------
// KeywordClassifier
// ---------------------------------------------------------------------------

/// Pure, table-driven classifier.  Cheap to clone.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    table: KeywordTable,
    /// Rule rank and keyword for each automaton pattern index.
    patterns: Vec<(usize, String)>,
    /// `None` when the table has no keywords at all.
    automaton: Option<AhoCorasick>,
}

impl KeywordClassifier {
    /// Compile a classifier for `table`.
    pub fn new(table: KeywordTable) -> Result<Self> {
        table.validate()?;

        let patterns = table.flatten();
        let automaton = if patterns.is_empty() {
            None
        } else {
            let ac = AhoCorasick::new(patterns.iter().map(|(_, k)| k.as_str())).map_err(|e| {
                ClassifierError::Build {
                    reason: e.to_string(),
                }
            })?;
            Some(ac)
        };

        tracing::debug!(
            version = table.version,
            rules = table.rules.len(),
            keywords = patterns.len(),
            "keyword classifier built"
        );

        Ok(Self {
            table,
            patterns,
            automaton,
        })
    }

    /// Compile a classifier for the built-in table.
    pub fn with_default_table() -> Result<Self> {
        Self::new(KeywordTable::builtin())
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }

    /// Version of the keyword table in use.
    pub fn version(&self) -> u32 {
        self.table.version
    }

    /// Classify a task description.
    ///
    /// Matching is case-insensitive.  When no keyword fires the step falls
    /// back to [`StepCategory::DataTransformation`].
    pub fn classify(&self, description: &str) -> Result<Classification> {
        let lowered = description.to_lowercase();

        let (category, matched_keyword) = match self.best_match(&lowered) {
            Some((rank, keyword)) => (self.table.rules[rank].category, Some(keyword.to_string())),
            None => (StepCategory::DataTransformation, None),
        };

        let mut classification = infer(category, description, &lowered)?;
        classification.matched_keyword = matched_keyword;

        tracing::debug!(
            description = %description,
            category = %classification.category,
            keyword = classification.matched_keyword.as_deref().unwrap_or("-"),
            "task classified"
        );

        Ok(classification)
    }

    // -- Private helpers ----------------------------------------------------

    /// Lowest rule rank among all keyword hits; earliest hit breaks ties.
    fn best_match(&self, lowered: &str) -> Option<(usize, &str)> {
        let ac = self.automaton.as_ref()?;

        let mut best: Option<usize> = None; // pattern index
        for mat in ac.find_overlapping_iter(lowered) {
            let idx = mat.pattern().as_usize();
            if best.is_none_or(|b| self.patterns[idx].0 < self.patterns[b].0) {
                best = Some(idx);
            }
        }

        best.map(|idx| {
            let (rank, keyword) = &self.patterns[idx];
            (*rank, keyword.as_str())
        })
    }
}

// ---------------------------------------------------------------------------
// Per-category inference
// ---------------------------------------------------------------------------

/// Build the parameters, configuration, and handler for `category`.
fn infer(category: StepCategory, description: &str, lowered: &str) -> Result<Classification> {
    let mentions = |words: &[&str]| words.iter().any(|w| lowered.contains(w));

    let mut parameters = Vec::new();
    let mut config = None;
    let mut handler_reference = None;

    match category {
        StepCategory::InferenceProcessing => {
            parameters.push(
                ParameterDefinition::builder("llm_provider", ParameterKind::SingleSelect)
                    .required(true)
                    .options(LLM_PROVIDERS)
                    .default_value(json!("openai"))
                    .label("LLM Provider")
                    .build()?,
            );
            // Braces in the task text are literal once the template is formatted.
            let task = description.replace('{', "{{").replace('}', "}}");
            config = Some(StepConfig::Prompt(
                PromptConfig::new(format!(
                    "Execute the following task: {task}\n\nInput data: {{input_data}}"
                ))
                .with_variables(["input_data"]),
            ));
        }
        StepCategory::FormInput => {
            if mentions(&["file", "upload"]) {
                parameters.push(
                    ParameterDefinition::builder("data_file", ParameterKind::File)
                        .required(true)
                        .label("Data File")
                        .description("Upload the data file to process")
                        .build()?,
                );
            }
            if mentions(&["schema"]) {
                parameters.push(
                    ParameterDefinition::builder("schema_info", ParameterKind::LongText)
                        .label("Schema Information")
                        .placeholder("Optional schema information")
                        .build()?,
                );
            }
        }
        StepCategory::CodeExecution => {
            handler_reference = Some(format!("execute_{}", normalize_handler(description)));
        }
        StepCategory::ExternalRequest => {
            if mentions(&["url", "page", "crawl"]) {
                parameters.push(
                    ParameterDefinition::builder("page_url", ParameterKind::Url)
                        .required(true)
                        .label("Page URL")
                        .description("URL of the page to process")
                        .build()?,
                );
            }
            handler_reference = Some(format!("handle_{}", normalize_handler(description)));
        }
        _ => {
            parameters.push(
                ParameterDefinition::builder("input_data", ParameterKind::LongText)
                    .label("Input Data")
                    .placeholder("Enter input data for this step")
                    .build()?,
            );
        }
    }

    Ok(Classification {
        category,
        parameters,
        config,
        handler_reference,
        matched_keyword: None,
    })
}

/// Lower-case `description` and replace every character that cannot appear
/// in an identifier with `_`.
pub fn normalize_handler(description: &str) -> String {
    description
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
