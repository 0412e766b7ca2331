//! Handlebars-backed template emitter.
//!
//! Each step is rendered with the fragment registered for its category (or
//! the fallback), with `{ workflow, step }` as context.  The rendered step
//! blocks are then handed to the document template as `rendered_steps`.
//! HTML escaping is disabled; values that need quoting go through the
//! `json` helper instead.

use handlebars::Handlebars;
use serde_json::{Value, json};

use crate::artifact::ArtifactKind;
use crate::emitter::Emitter;
use crate::error::{EmitError, Result};
use crate::fragments::{DOCUMENT, FragmentSet};
use crate::view::GraphView;

/// Renders one artifact kind from a [`FragmentSet`].
pub struct TemplateEmitter {
    kind: ArtifactKind,
    fragments: FragmentSet,
    handlebars: Handlebars<'static>,
}

impl TemplateEmitter {
    /// Compile `fragments` for `kind`.
    pub fn new(kind: ArtifactKind, fragments: FragmentSet) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_helper("json", Box::new(json_helper));
        handlebars.register_helper("indent", Box::new(indent_helper));

        for (name, source) in fragments.templates() {
            handlebars
                .register_template_string(&name, source)
                .map_err(|e| EmitError::Template {
                    name: format!("{kind}/{name}"),
                    reason: e.to_string(),
                })?;
        }

        tracing::debug!(kind = %kind, fragments = fragments.steps.len(), "template emitter compiled");

        Ok(Self {
            kind,
            fragments,
            handlebars,
        })
    }

    /// The built-in Python plugin emitter.
    pub fn server_handler() -> Result<Self> {
        Self::new(ArtifactKind::ServerHandler, FragmentSet::server_handler())
    }

    /// The built-in React component emitter.
    pub fn client_view() -> Result<Self> {
        Self::new(ArtifactKind::ClientView, FragmentSet::client_view())
    }

    /// The built-in host registration emitter.
    pub fn host_integration() -> Result<Self> {
        Self::new(ArtifactKind::HostIntegration, FragmentSet::host_integration())
    }

    fn render(&self, template: &str, data: &Value) -> Result<String> {
        self.handlebars
            .render(template, data)
            .map_err(|e| EmitError::Render {
                template: format!("{}/{template}", self.kind),
                reason: e.to_string(),
            })
    }
}

impl Emitter for TemplateEmitter {
    fn kind(&self) -> ArtifactKind {
        self.kind
    }

    fn emit(&self, view: &GraphView<'_>) -> Result<String> {
        let mut workflow = serde_json::to_value(view)?;

        let steps = workflow["steps"].as_array().cloned().unwrap_or_default();

        let mut rendered = Vec::with_capacity(steps.len());
        for (step_view, step) in view.steps.iter().zip(&steps) {
            let template = self.fragments.template_for(step_view.category);
            tracing::trace!(step_id = %step_view.id, template = %template, "rendering step fragment");
            let context = json!({ "workflow": &workflow, "step": step });
            rendered.push(self.render(&template, &context)?);
        }

        workflow["rendered_steps"] = Value::from(rendered);
        self.render(DOCUMENT, &workflow)
    }
}

// ---------------------------------------------------------------------------
// Handlebars helpers
// ---------------------------------------------------------------------------

/// `{{json value}}`: the value as compact JSON (strings come out quoted).
fn json_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    if let Some(v) = h.param(0) {
        let text = serde_json::to_string(v.value())
            .map_err(|e| handlebars::RenderErrorReason::Other(e.to_string()))?;
        out.write(&text)?;
    }
    Ok(())
}

/// `{{indent text n}}`: prefix every non-empty line after the first with
/// `n` spaces.
fn indent_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let text = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    let width = h.param(1).and_then(|v| v.value().as_u64()).unwrap_or(0) as usize;
    let pad = " ".repeat(width);

    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.write("\n")?;
            if !line.is_empty() {
                out.write(&pad)?;
            }
        }
        out.write(line)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use flowsmith_schema::{StepCategory, StepDefinition, WorkflowGraph, WorkflowMetadata, catalog};

    fn render_with(fragments: FragmentSet, graph: &WorkflowGraph) -> Result<String> {
        let emitter = TemplateEmitter::new(ArtifactKind::ClientView, fragments)?;
        emitter.emit(&GraphView::new(graph)?)
    }

    #[test]
    fn fallback_renders_uncovered_categories() {
        let graph = WorkflowGraph::new(
            WorkflowMetadata::new("wf", "WF"),
            vec![
                StepDefinition::new("a", "A", StepCategory::OutputGeneration),
                StepDefinition::new("b", "B", StepCategory::CodeExecution).with_depends_on(["a"]),
            ],
        )
        .unwrap();
        let fragments = FragmentSet::new(
            "{{#each rendered_steps}}{{this}};{{/each}}",
            "generic:{{step.id}}",
        )
        .with_step(StepCategory::CodeExecution, "exec:{{step.id}}@{{step.wave}}");

        assert_eq!(render_with(fragments, &graph).unwrap(), "generic:a;exec:b@1;");
    }

    #[test]
    fn values_are_not_html_escaped() {
        let graph = WorkflowGraph::new(
            WorkflowMetadata::new("wf", "Q&A <Flow>"),
            vec![StepDefinition::new("a", "A", StepCategory::DataTransformation)],
        )
        .unwrap();
        let fragments = FragmentSet::new("{{name}} {{json name}}", "");
        assert_eq!(render_with(fragments, &graph).unwrap(), "Q&A <Flow> \"Q&A <Flow>\"");
    }

    #[test]
    fn broken_fragment_is_a_template_error() {
        let result = TemplateEmitter::new(
            ArtifactKind::ServerHandler,
            FragmentSet::new("{{#each steps}}", ""),
        );
        assert!(matches!(result, Err(EmitError::Template { .. })));
    }

    #[test]
    fn indent_helper_pads_following_lines() {
        let graph = WorkflowGraph::new(
            WorkflowMetadata::new("wf", "WF").with_description("a\nb\n\nc"),
            vec![],
        )
        .unwrap();
        let fragments = FragmentSet::new("{{indent description 2}}", "");
        assert_eq!(render_with(fragments, &graph).unwrap(), "a\n  b\n\n  c");
    }

    #[test]
    fn builtin_templates_render_the_catalog() {
        let server = TemplateEmitter::server_handler().unwrap();
        let client = TemplateEmitter::client_view().unwrap();
        for graph in catalog::builtin_workflows().unwrap() {
            let view = GraphView::new(&graph).unwrap();
            let py = server.emit(&view).unwrap();
            let tsx = client.emit(&view).unwrap();
            assert!(py.contains(&format!("class {}(BasePlugin):", view.plugin_class)));
            assert!(tsx.contains(&format!("export default {};", view.component_name)));
        }
    }

    #[test]
    fn server_handler_stubs_each_handler_once() {
        let graph = catalog::ai_web_testing().unwrap();
        let py = TemplateEmitter::server_handler()
            .unwrap()
            .emit(&GraphView::new(&graph).unwrap())
            .unwrap();
        assert_eq!(py.matches("async def crawl_website(self, request)").count(), 1);
        assert_eq!(py.matches("async def execute_test_code(self, request)").count(), 1);
        assert!(py.contains("result_data = await self.crawl_website(request)"));
        assert!(py.contains("plugin_instance = AiWebTestingPlugin()"));
    }

    #[test]
    fn host_integration_registers_plugin_and_routes() {
        let graph = catalog::dq_testing().unwrap();
        let py = TemplateEmitter::host_integration()
            .unwrap()
            .emit(&GraphView::new(&graph).unwrap())
            .unwrap();

        assert!(py.contains("from dq_testing_plugin import plugin_instance as dq_testing_plugin\n"));
        assert!(py.contains("APPS[\"dq_testing\"] = {\n    \"id\": \"dq_testing\",\n"));
        assert!(py.contains("    \"plugin\": dq_testing_plugin,\n"));
        assert!(py.contains("async def register_dq_testing_routes():"));
        assert!(py.contains("for route_config in dq_testing_plugin.get_api_routes():"));
        assert!(py.contains("path=f\"/api/apps{route_config['path']}\","));

        assert_eq!(py.matches("            \"id\": ").count(), graph.len());
        assert!(py.contains("            \"id\": \"schema_analysis\",\n"));
        assert!(py.contains("        },\n        {\n"));
        assert!(py.contains("        },\n    ],\n}"));
    }

    #[test]
    fn emission_is_deterministic() {
        let graph = catalog::dq_testing().unwrap();
        let emitter = TemplateEmitter::client_view().unwrap();
        let first = emitter.emit(&GraphView::new(&graph).unwrap()).unwrap();
        let second = emitter.emit(&GraphView::new(&graph).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
