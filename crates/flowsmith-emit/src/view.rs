//! The shared render view.
//!
//! [`GraphView`] is built once per emission from a validated graph and handed
//! to every emitter.  All derived identifiers, target-language literals, and
//! per-step wave indices are computed here so that emitters only format.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::Serialize;
use serde_json::Value;

use flowsmith_schema::{
    ParameterDefinition, ParameterKind, PromptConfig, StepCategory, StepDefinition,
    WorkflowGraph, WorkflowSettings,
};

use crate::error::{EmitError, Result};
use crate::naming;

/// Category used when the workflow metadata names none.
pub const DEFAULT_CATEGORY: &str = "general";

/// Author used when the workflow metadata names none.
pub const DEFAULT_AUTHOR: &str = "Auto-generated";

// ---------------------------------------------------------------------------
// View types
// ---------------------------------------------------------------------------

/// Render view of a whole workflow.
#[derive(Debug, Clone, Serialize)]
pub struct GraphView<'g> {
    #[serde(skip)]
    source: &'g WorkflowGraph,

    pub workflow_id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub category: String,
    pub tags: Vec<String>,

    /// Snake-case form of the workflow id.
    pub ident: String,
    /// PascalCase form of the workflow id.
    pub type_name: String,
    pub plugin_class: String,
    pub component_name: String,
    pub module_name: String,

    pub steps: Vec<StepView>,
    pub global_parameters: Vec<ParamView>,
    /// Distinct handler references, first appearance first.
    pub handlers: Vec<String>,
    pub waves: Vec<Vec<String>>,
    pub settings: WorkflowSettings,
}

/// Render view of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub id: String,
    /// Snake-case identifier used for method and variable names.
    pub ident: String,
    pub type_name: String,
    pub camel: String,
    pub name: String,
    pub description: String,
    pub category: StepCategory,
    /// 1-based position in declaration order.
    pub index: usize,
    pub wave: usize,
    pub depends_on: Vec<String>,
    pub parameters: Vec<ParamView>,
    pub handler: Option<String>,
    pub prompt: Option<PromptView>,
    pub timeout_secs: u64,
    pub is_first: bool,
    pub is_last: bool,
}

/// Render view of one parameter.
#[derive(Debug, Clone, Serialize)]
pub struct ParamView {
    pub name: String,
    pub ident: String,
    pub camel: String,
    pub kind: String,
    /// Form widget: text, textarea, number, checkbox, select, multiselect,
    /// file, url, date or json.
    pub widget: &'static str,
    pub required: bool,
    pub label: String,
    pub description: String,
    pub placeholder: String,
    pub help_text: Option<String>,
    pub options: Vec<String>,
    pub python_type: &'static str,
    /// Python expression for the pydantic field default.
    pub python_default: String,
    /// TypeScript expression for the initial form value.
    pub ts_default: String,
}

/// Render view of an inference prompt.
#[derive(Debug, Clone, Serialize)]
pub struct PromptView {
    pub template_name: Option<String>,
    pub system_prompt: Option<String>,
    pub user_prompt_template: String,
    /// The template as a quoted string literal, valid in Python and
    /// TypeScript alike.
    pub template_literal: String,
    pub variables: Vec<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub response_format: String,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl<'g> GraphView<'g> {
    /// Derive the view for `graph`.
    pub fn new(graph: &'g WorkflowGraph) -> Result<Self> {
        let meta = graph.metadata();
        let batch = graph.execution_order()?;
        let type_name = naming::type_name(&meta.id);
        let default_timeout = graph.settings().default_timeout_secs;
        let last = graph.len();

        let steps = graph
            .steps()
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let wave = batch.wave_of(&step.id).unwrap_or_default();
                step_view(step, i + 1, wave, last, default_timeout)
            })
            .collect::<Result<Vec<_>>>()?;

        let global_parameters = graph
            .global_parameters()
            .iter()
            .map(param_view)
            .collect::<Result<Vec<_>>>()?;

        let handler_refs = graph.handler_references();
        let handlers: Vec<String> = handler_refs.iter().copied().map(naming::ident).collect();

        check_derived_names(&steps, &global_parameters, &handler_refs, &handlers)?;

        Ok(Self {
            source: graph,
            workflow_id: meta.id.clone(),
            name: meta.name.clone(),
            description: meta.description.clone().unwrap_or_default(),
            version: meta.version.clone(),
            author: meta.author.clone().unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            category: meta
                .category
                .clone()
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            tags: meta.tags.clone(),
            ident: naming::ident(&meta.id),
            plugin_class: format!("{type_name}Plugin"),
            component_name: format!("{type_name}Workflow"),
            module_name: format!("{}_plugin", meta.id),
            type_name,
            steps,
            global_parameters,
            handlers,
            waves: batch.into_waves(),
            settings: graph.settings().clone(),
        })
    }

    /// The graph this view was derived from.
    pub fn source(&self) -> &'g WorkflowGraph {
        self.source
    }
}

/// Reject graphs whose distinct names collapse onto one generated name.
///
/// Step methods and handler stubs share the plugin class namespace, so they
/// are checked together.
fn check_derived_names(
    steps: &[StepView],
    globals: &[ParamView],
    handler_refs: &[&str],
    handlers: &[String],
) -> Result<()> {
    let methods = steps
        .iter()
        .map(|s| (s.id.as_str(), s.ident.as_str()))
        .chain(handler_refs.iter().copied().zip(handlers.iter().map(String::as_str)));
    ensure_unique("plugin method", methods)?;
    ensure_unique("step", steps.iter().map(|s| (s.id.as_str(), s.type_name.as_str())))?;
    ensure_unique("step", steps.iter().map(|s| (s.id.as_str(), s.camel.as_str())))?;

    for step in steps {
        let scope = format!("parameter of step `{}`", step.id);
        ensure_unique(&scope, step.parameters.iter().map(|p| (p.name.as_str(), p.ident.as_str())))?;
        ensure_unique(&scope, step.parameters.iter().map(|p| (p.name.as_str(), p.camel.as_str())))?;
    }
    ensure_unique("global parameter", globals.iter().map(|p| (p.name.as_str(), p.ident.as_str())))?;
    ensure_unique("global parameter", globals.iter().map(|p| (p.name.as_str(), p.camel.as_str())))
}

fn ensure_unique<'a>(scope: &str, pairs: impl Iterator<Item = (&'a str, &'a str)>) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for (source, derived) in pairs {
        match seen.entry(derived) {
            Entry::Occupied(first) => {
                return Err(EmitError::NameCollision {
                    scope: scope.to_string(),
                    first: (*first.get()).to_string(),
                    second: source.to_string(),
                    derived: derived.to_string(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(source);
            }
        }
    }
    Ok(())
}

fn step_view(
    step: &StepDefinition,
    index: usize,
    wave: usize,
    last: usize,
    default_timeout: u64,
) -> Result<StepView> {
    Ok(StepView {
        id: step.id.clone(),
        ident: naming::ident(&step.id),
        type_name: naming::type_name(&step.id),
        camel: naming::camel(&step.id),
        name: step.name.clone(),
        description: if step.description.is_empty() {
            format!("Execute {}", step.name)
        } else {
            step.description.clone()
        },
        category: step.category,
        index,
        wave,
        depends_on: step.depends_on.clone(),
        parameters: step.parameters.iter().map(param_view).collect::<Result<_>>()?,
        handler: step.handler_reference.as_deref().map(naming::ident),
        prompt: step.prompt().map(prompt_view).transpose()?,
        timeout_secs: step.timeout_secs.unwrap_or(default_timeout),
        is_first: index == 1,
        is_last: index == last,
    })
}

fn param_view(param: &ParameterDefinition) -> Result<ParamView> {
    let (widget, python_type) = match param.kind {
        ParameterKind::ShortText => ("text", "str"),
        ParameterKind::LongText => ("textarea", "str"),
        ParameterKind::Number => ("number", "float"),
        ParameterKind::Boolean => ("checkbox", "bool"),
        ParameterKind::File => ("file", "Optional[str]"),
        ParameterKind::SingleSelect => ("select", "str"),
        ParameterKind::MultiSelect => ("multiselect", "List[str]"),
        ParameterKind::Url => ("url", "str"),
        ParameterKind::Date => ("date", "str"),
        ParameterKind::StructuredJson => ("json", "Dict[str, Any]"),
    };

    let python_default = match (&param.default, param.required) {
        (_, true) => "...".to_string(),
        (Some(v), false) => python_literal(v)?,
        (None, false) => python_literal(&empty_value(param.kind))?,
    };
    let ts_default = serde_json::to_string(param.default.as_ref().unwrap_or(&empty_value(param.kind)))?;

    Ok(ParamView {
        name: param.name.clone(),
        ident: naming::ident(&param.name),
        camel: naming::camel(&param.name),
        kind: param.kind.as_str().to_string(),
        widget,
        required: param.required,
        label: param.display_label().to_string(),
        description: param.description.clone().unwrap_or_default(),
        placeholder: param.placeholder.clone().unwrap_or_default(),
        help_text: param.help_text.clone(),
        options: param.options.clone(),
        python_type,
        python_default,
        ts_default,
    })
}

fn prompt_view(prompt: &PromptConfig) -> Result<PromptView> {
    Ok(PromptView {
        template_name: prompt.template_name.clone(),
        system_prompt: prompt.system_prompt.clone(),
        user_prompt_template: prompt.user_prompt_template.clone(),
        template_literal: serde_json::to_string(&prompt.user_prompt_template)?,
        variables: prompt.template_variables.clone(),
        max_tokens: prompt.max_tokens,
        temperature: prompt.temperature,
        response_format: serde_json::to_value(prompt.response_format)?
            .as_str()
            .unwrap_or("text")
            .to_string(),
    })
}

/// Initial value for a parameter with no default.
fn empty_value(kind: ParameterKind) -> Value {
    match kind {
        ParameterKind::Number => Value::from(0),
        ParameterKind::Boolean => Value::Bool(false),
        ParameterKind::File => Value::Null,
        ParameterKind::MultiSelect => Value::Array(Vec::new()),
        ParameterKind::StructuredJson => Value::Object(Default::default()),
        _ => Value::String(String::new()),
    }
}

/// Render a JSON value as a Python literal.
fn python_literal(value: &Value) -> Result<String> {
    Ok(match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(_) => serde_json::to_string(value)?,
        Value::Array(items) => {
            let items = items.iter().map(python_literal).collect::<Result<Vec<_>>>()?;
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries = map
                .iter()
                .map(|(k, v)| -> Result<String> {
                    Ok(format!("{}: {}", serde_json::to_string(k)?, python_literal(v)?))
                })
                .collect::<Result<Vec<_>>>()?;
            format!("{{{}}}", entries.join(", "))
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
