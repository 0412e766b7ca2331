//! Step definitions.
//!
//! A step is one named unit of work inside a workflow.  Its [`StepCategory`]
//! is a closed set; the only category that carries a configuration block is
//! inference processing, which needs a [`PromptConfig`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{IdentifierScope, Result, SchemaError};
use crate::parameter::ParameterDefinition;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// The execution semantics of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepCategory {
    /// Collects user input through a form.
    FormInput,
    /// Generative or analytical model call.
    InferenceProcessing,
    FileProcessing,
    /// Outbound request (HTTP call, crawl, scrape).
    ExternalRequest,
    /// Generic reshaping of upstream data.  The classifier's fallback.
    DataTransformation,
    /// Runs code through an external handler.
    CodeExecution,
    OutputGeneration,
}

impl StepCategory {
    /// Every category, in declaration order.
    pub const ALL: [StepCategory; 7] = [
        Self::FormInput,
        Self::InferenceProcessing,
        Self::FileProcessing,
        Self::ExternalRequest,
        Self::DataTransformation,
        Self::CodeExecution,
        Self::OutputGeneration,
    ];

    /// Stable machine-readable name, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FormInput => "form_input",
            Self::InferenceProcessing => "inference_processing",
            Self::FileProcessing => "file_processing",
            Self::ExternalRequest => "external_request",
            Self::DataTransformation => "data_transformation",
            Self::CodeExecution => "code_execution",
            Self::OutputGeneration => "output_generation",
        }
    }

    /// Whether a step of this category must carry a configuration block.
    pub fn requires_config(self) -> bool {
        matches!(self, Self::InferenceProcessing)
    }
}

impl std::fmt::Display for StepCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Category-specific configuration
// ---------------------------------------------------------------------------

/// Expected shape of a model response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
    Structured,
}

/// Prompt configuration for an inference-processing step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// User prompt with `{variable}` placeholders.
    pub user_prompt_template: String,
    /// Placeholder names the template expects from upstream steps.
    #[serde(default)]
    pub template_variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

impl PromptConfig {
    pub fn new(user_prompt_template: impl Into<String>) -> Self {
        Self {
            template_name: None,
            system_prompt: None,
            user_prompt_template: user_prompt_template.into(),
            template_variables: Vec::new(),
            max_tokens: None,
            temperature: None,
            response_format: ResponseFormat::Text,
        }
    }

    pub fn with_template_name(mut self, name: impl Into<String>) -> Self {
        self.template_name = Some(name.into());
        self
    }

    pub fn with_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.template_variables = variables.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }
}

/// Tagged configuration payload, keyed by the category that needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepConfig {
    Prompt(PromptConfig),
}

impl StepConfig {
    /// The category this payload belongs to.
    pub fn category(&self) -> StepCategory {
        match self {
            Self::Prompt(_) => StepCategory::InferenceProcessing,
        }
    }

    pub fn as_prompt(&self) -> Option<&PromptConfig> {
        match self {
            Self::Prompt(p) => Some(p),
        }
    }
}

// ---------------------------------------------------------------------------
// StepDefinition
// ---------------------------------------------------------------------------

/// One workflow step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Stable identifier, unique within the workflow.
    pub id: String,
    /// Display label.
    pub name: String,
    pub category: StepCategory,
    #[serde(default)]
    pub description: String,
    /// Ids of the steps that must finish first.
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<StepConfig>,
    /// Name of externally implemented logic the generated code calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl StepDefinition {
    /// Create a step with no dependencies, parameters, or configuration.
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: StepCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            description: String::new(),
            depends_on: Vec::new(),
            parameters: Vec::new(),
            config: None,
            handler_reference: None,
            timeout_secs: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parameter(mut self, param: ParameterDefinition) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_parameters(mut self, params: impl IntoIterator<Item = ParameterDefinition>) -> Self {
        self.parameters.extend(params);
        self
    }

    pub fn with_config(mut self, config: StepConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_prompt(self, prompt: PromptConfig) -> Self {
        self.with_config(StepConfig::Prompt(prompt))
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler_reference = Some(handler.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// The prompt block, if this is an inference step.
    pub fn prompt(&self) -> Option<&PromptConfig> {
        self.config.as_ref().and_then(StepConfig::as_prompt)
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Check the invariants local to this step.  Cross-step checks (unknown
    /// dependencies, cycles) belong to the graph.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(SchemaError::InvalidStep {
                step_id: self.id.clone(),
                reason: "id must not be empty".into(),
            });
        }

        match (&self.config, self.category.requires_config()) {
            (None, true) => {
                return Err(SchemaError::InvalidStep {
                    step_id: self.id.clone(),
                    reason: format!("category `{}` requires a configuration block", self.category),
                });
            }
            (Some(config), _) if config.category() != self.category => {
                return Err(SchemaError::InvalidStep {
                    step_id: self.id.clone(),
                    reason: format!(
                        "configuration for `{}` attached to a `{}` step",
                        config.category(),
                        self.category
                    ),
                });
            }
            _ => {}
        }

        if let Some(prompt) = self.prompt()
            && prompt.user_prompt_template.trim().is_empty()
        {
            return Err(SchemaError::InvalidStep {
                step_id: self.id.clone(),
                reason: "user prompt template must not be empty".into(),
            });
        }

        validate_parameter_list(&self.parameters, &self.id).map_err(|e| e.in_step(&self.id))?;

        let mut seen = HashSet::new();
        for dep in &self.depends_on {
            if !seen.insert(dep.as_str()) {
                return Err(SchemaError::DuplicateIdentifier {
                    scope: IdentifierScope::Dependency,
                    id: dep.clone(),
                    context: self.id.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Validate each parameter and check names are unique within `context`.
pub(crate) fn validate_parameter_list(params: &[ParameterDefinition], context: &str) -> Result<()> {
    let mut names = HashSet::new();
    for param in params {
        param.validate()?;
        if !names.insert(param.name.as_str()) {
            return Err(SchemaError::DuplicateIdentifier {
                scope: IdentifierScope::Parameter,
                id: param.name.clone(),
                context: context.to_string(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
