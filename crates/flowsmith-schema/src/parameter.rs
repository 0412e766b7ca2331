//! Typed input parameters.
//!
//! A [`ParameterDefinition`] describes one input field of a step: its value
//! kind, whether it is required, an optional default, the option list for
//! select-style kinds, and an ordered set of validation rules.
//!
//! Definitions are checked when they are built ([`ParameterBuilder::build`])
//! and again when a workflow graph is constructed, so a select parameter
//! without options can never reach an emitter.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SchemaError};

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// The value kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Single-line text.
    ShortText,
    /// Multi-line text.
    LongText,
    Number,
    Boolean,
    /// An uploaded file, referenced by name or handle.
    File,
    /// Exactly one value out of `options`.
    SingleSelect,
    /// Any subset of `options`.
    MultiSelect,
    Url,
    /// ISO-8601 date string.
    Date,
    /// Arbitrary structured JSON.
    StructuredJson,
}

impl ParameterKind {
    /// Whether this kind draws its values from an option list.
    pub fn is_select(self) -> bool {
        matches!(self, Self::SingleSelect | Self::MultiSelect)
    }

    /// Stable machine-readable name, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ShortText => "short_text",
            Self::LongText => "long_text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::File => "file",
            Self::SingleSelect => "single_select",
            Self::MultiSelect => "multi_select",
            Self::Url => "url",
            Self::Date => "date",
            Self::StructuredJson => "structured_json",
        }
    }

    /// Check that `value` is an acceptable default for this kind.
    fn accepts(self, value: &Value, options: &[String]) -> std::result::Result<(), String> {
        match self {
            Self::ShortText | Self::LongText | Self::File | Self::Url | Self::Date => {
                if value.is_string() {
                    Ok(())
                } else {
                    Err(format!("default must be a string for kind `{}`", self.as_str()))
                }
            }
            Self::Number => {
                if value.is_number() {
                    Ok(())
                } else {
                    Err("default must be a number".into())
                }
            }
            Self::Boolean => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err("default must be a boolean".into())
                }
            }
            Self::SingleSelect => match value.as_str() {
                Some(s) if options.iter().any(|o| o == s) => Ok(()),
                Some(s) => Err(format!("default `{s}` is not one of the options")),
                None => Err("default must be a string option".into()),
            },
            Self::MultiSelect => {
                let Some(items) = value.as_array() else {
                    return Err("default must be an array of options".into());
                };
                for item in items {
                    match item.as_str() {
                        Some(s) if options.iter().any(|o| o == s) => {}
                        Some(s) => return Err(format!("default `{s}` is not one of the options")),
                        None => return Err("default must contain only string options".into()),
                    }
                }
                Ok(())
            }
            // A null default would serialize away and reload as "no default".
            Self::StructuredJson if value.is_null() => {
                Err("default must not be null; omit it instead".into())
            }
            Self::StructuredJson => Ok(()),
        }
    }
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Validation rules
// ---------------------------------------------------------------------------

/// The kind of check a [`ValidationRule`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Required,
    /// Lower bound (numeric value or text length).
    Min,
    /// Upper bound (numeric value or text length).
    Max,
    /// Regular expression the value must match.
    Pattern,
    /// Opaque rule enforced by an external handler.
    Custom,
}

/// One validation rule attached to a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub kind: RuleKind,
    /// Rule argument; numeric for `min`/`max`, a regex for `pattern`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound: Option<Value>,
    /// Message shown to the user when the rule fails.
    pub message: String,
}

impl ValidationRule {
    pub fn new(kind: RuleKind, bound: Option<Value>, message: impl Into<String>) -> Self {
        Self {
            kind,
            bound,
            message: message.into(),
        }
    }

    pub fn required(message: impl Into<String>) -> Self {
        Self::new(RuleKind::Required, None, message)
    }

    fn check(&self) -> std::result::Result<(), String> {
        match self.kind {
            RuleKind::Min | RuleKind::Max => match &self.bound {
                Some(v) if v.is_number() => Ok(()),
                _ => Err(format!("{:?} rule needs a numeric bound", self.kind).to_lowercase()),
            },
            RuleKind::Pattern => {
                let Some(pattern) = self.bound.as_ref().and_then(Value::as_str) else {
                    return Err("pattern rule needs a string bound".into());
                };
                Regex::new(pattern)
                    .map(|_| ())
                    .map_err(|e| format!("pattern `{pattern}` does not compile: {e}"))
            }
            RuleKind::Required | RuleKind::Custom => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// ParameterDefinition
// ---------------------------------------------------------------------------

/// Typed description of one input field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    /// Field name, unique within the owning step.
    pub name: String,
    pub kind: ParameterKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Allowed values; non-empty iff `kind` is a select kind.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

impl ParameterDefinition {
    /// Start building a parameter of the given kind.
    pub fn builder(name: impl Into<String>, kind: ParameterKind) -> ParameterBuilder {
        ParameterBuilder {
            param: Self {
                name: name.into(),
                kind,
                required: false,
                default: None,
                options: Vec::new(),
                validation: Vec::new(),
                label: None,
                description: None,
                placeholder: None,
                help_text: None,
            },
        }
    }

    /// Check every invariant of this definition.
    ///
    /// Called by [`ParameterBuilder::build`] and by graph construction.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| SchemaError::InvalidParameter {
            owner: None,
            parameter: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(fail("name must not be empty".into()));
        }

        if self.kind.is_select() {
            if self.options.is_empty() {
                return Err(fail(format!("options required for `{}` parameter", self.kind)));
            }
        } else if !self.options.is_empty() {
            return Err(fail(format!("options are not allowed for `{}` parameter", self.kind)));
        }

        if let Some(default) = &self.default {
            self.kind.accepts(default, &self.options).map_err(fail)?;
        }

        for rule in &self.validation {
            rule.check().map_err(fail)?;
        }

        Ok(())
    }

    /// Display label, falling back to the field name.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// Fluent builder for [`ParameterDefinition`].
#[derive(Debug, Clone)]
pub struct ParameterBuilder {
    param: ParameterDefinition,
}

impl ParameterBuilder {
    pub fn required(mut self, required: bool) -> Self {
        self.param.required = required;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.param.default = Some(value.into());
        self
    }

    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.param.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn rule(mut self, rule: ValidationRule) -> Self {
        self.param.validation.push(rule);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.param.label = Some(label.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.param.description = Some(description.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.param.placeholder = Some(placeholder.into());
        self
    }

    pub fn help_text(mut self, help_text: impl Into<String>) -> Self {
        self.param.help_text = Some(help_text.into());
        self
    }

    /// Validate and return the finished definition.
    pub fn build(self) -> Result<ParameterDefinition> {
        self.param.validate()?;
        Ok(self.param)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
