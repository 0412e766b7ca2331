//! Integration tests for the flowsmith-schema crate.
//!
//! These tests exercise graph construction, execution ordering, and the
//! serialized form as one subsystem.

use std::collections::HashMap;

use flowsmith_schema::{
    ParameterDefinition, ParameterKind, PromptConfig, ResponseFormat, RuleKind, SchemaError,
    StepCategory, StepDefinition, ValidationRule, WorkflowGraph, WorkflowMetadata,
    WorkflowSettings, catalog,
};
use serde_json::json;

fn step(id: &str, deps: &[&str]) -> StepDefinition {
    StepDefinition::new(id, id.to_uppercase(), StepCategory::DataTransformation)
        .with_depends_on(deps.iter().copied())
}

/// Check that `waves` partitions every step and that each dependency sits
/// in a strictly earlier wave.
fn assert_valid_layering(graph: &WorkflowGraph) {
    let batch = graph.execution_order().unwrap();

    let mut wave_of: HashMap<&str, usize> = HashMap::new();
    for (n, wave) in batch.iter().enumerate() {
        for id in wave {
            assert!(wave_of.insert(id.as_str(), n).is_none(), "{id} placed twice");
        }
    }
    assert_eq!(wave_of.len(), graph.len());

    for s in graph.steps() {
        for dep in &s.depends_on {
            assert!(
                wave_of[dep.as_str()] < wave_of[s.id.as_str()],
                "{dep} must run before {}",
                s.id
            );
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Execution order
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn layering_respects_every_dependency() {
    let graph = WorkflowGraph::new(
        WorkflowMetadata::new("fanout", "Fan Out"),
        vec![
            step("ingest", &[]),
            step("clean", &["ingest"]),
            step("profile", &["ingest"]),
            step("lookup", &[]),
            step("join", &["clean", "lookup"]),
            step("report", &["join", "profile"]),
        ],
    )
    .unwrap();

    assert_valid_layering(&graph);
    let batch = graph.execution_order().unwrap();
    assert_eq!(batch.waves()[0], vec!["ingest", "lookup"]);
    assert_eq!(batch.wave_of("report"), Some(3));
}

#[test]
fn catalog_graphs_layer_cleanly() {
    for graph in catalog::builtin_workflows().unwrap() {
        assert_valid_layering(&graph);
    }
}

#[test]
fn three_node_cycle_names_all_members() {
    let result = WorkflowGraph::new(
        WorkflowMetadata::new("loop", "Loop"),
        vec![step("a", &["c"]), step("b", &["a"]), step("c", &["b"])],
    );
    match result {
        Err(SchemaError::CyclicDependency { remaining }) => {
            assert_eq!(remaining, vec!["a", "b", "c"]);
        }
        other => panic!("expected CyclicDependency, got {other:?}"),
    }
}

#[test]
fn linear_chain_yields_singleton_waves() {
    let graph = WorkflowGraph::new(
        WorkflowMetadata::new("chain", "Chain"),
        vec![
            step("step_1", &[]),
            step("step_2", &["step_1"]),
            step("step_3", &["step_2"]),
        ],
    )
    .unwrap();

    let batch = graph.execution_order().unwrap();
    assert_eq!(batch.into_waves(), vec![vec!["step_1"], vec!["step_2"], vec!["step_3"]]);
}

// ═══════════════════════════════════════════════════════════════════════
//  Construction errors
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn unknown_dependency_names_the_missing_id() {
    let err = WorkflowGraph::new(
        WorkflowMetadata::new("wf", "WF"),
        vec![step("a", &[]), step("b", &["a", "nowhere"])],
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "step `b` depends on unknown step `nowhere`");
}

#[test]
fn select_parameter_without_options_blocks_the_graph() {
    let mut provider = ParameterDefinition::builder("llm_provider", ParameterKind::SingleSelect)
        .options(["openai"])
        .build()
        .unwrap();
    provider.options.clear();

    let result = WorkflowGraph::new(
        WorkflowMetadata::new("wf", "WF"),
        vec![
            StepDefinition::new("gen", "Gen", StepCategory::InferenceProcessing)
                .with_prompt(PromptConfig::new("Go {input_data}"))
                .with_parameter(provider),
        ],
    );
    assert!(matches!(result, Err(SchemaError::InvalidParameter { .. })));
}

// ═══════════════════════════════════════════════════════════════════════
//  Serialized form
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn json_round_trip_preserves_the_graph() {
    for graph in catalog::builtin_workflows().unwrap() {
        let json = graph.to_json().unwrap();
        let back = WorkflowGraph::from_json(&json).unwrap();
        assert_eq!(back, graph);
        assert_eq!(back.execution_order().unwrap(), graph.execution_order().unwrap());
    }
}

/// A graph with every optional field set to a non-default value.
fn fully_populated_graph() -> WorkflowGraph {
    let metadata = WorkflowMetadata::new("full", "Fully Populated")
        .with_description("every optional field set")
        .with_version("2.3.1")
        .with_author("ops team")
        .with_category("internal")
        .with_tags(["alpha", "beta"]);

    let channels = ParameterDefinition::builder("channels", ParameterKind::MultiSelect)
        .required(true)
        .options(["email", "slack", "pager"])
        .default_value(json!(["email", "pager"]))
        .label("Channels")
        .description("where to notify")
        .placeholder("pick some")
        .help_text("at least one")
        .build()
        .unwrap();
    let threshold = ParameterDefinition::builder("threshold", ParameterKind::Number)
        .default_value(0.1 + 0.2)
        .rule(ValidationRule::new(RuleKind::Min, Some(json!(-1.5)), "too low"))
        .rule(ValidationRule::new(RuleKind::Max, Some(json!(1e300)), "too high"))
        .build()
        .unwrap();
    let code = ParameterDefinition::builder("code", ParameterKind::ShortText)
        .rule(ValidationRule::new(RuleKind::Pattern, Some(json!("^[A-Z]{3}$")), "three letters"))
        .rule(ValidationRule::new(RuleKind::Custom, None, "checked by handler"))
        .build()
        .unwrap();
    let payload = ParameterDefinition::builder("payload", ParameterKind::StructuredJson)
        .default_value(json!({"nested": [1, null, {"k": false}]}))
        .build()
        .unwrap();

    let mut prompt = PromptConfig::new("Rate {code} against {threshold}")
        .with_template_name("rating")
        .with_variables(["code", "threshold"])
        .with_response_format(ResponseFormat::Structured);
    prompt.system_prompt = Some("You are strict.".into());
    prompt.max_tokens = Some(2048);
    prompt.temperature = Some(0.479_607_564_269_825_87);

    let settings = WorkflowSettings {
        parallel_execution: true,
        max_parallel_steps: 7,
        default_timeout_secs: 45,
        auto_advance: false,
        save_intermediate_results: false,
    };

    WorkflowGraph::from_parts(
        metadata,
        vec![
            StepDefinition::new("collect", "Collect", StepCategory::FormInput)
                .with_description("gather inputs")
                .with_parameters([channels, threshold, code])
                .with_timeout_secs(12),
            StepDefinition::new("rate", "Rate", StepCategory::InferenceProcessing)
                .with_depends_on(["collect"])
                .with_prompt(prompt)
                .with_timeout_secs(600),
            StepDefinition::new("notify", "Notify", StepCategory::ExternalRequest)
                .with_depends_on(["collect", "rate"])
                .with_handler("send_notifications"),
        ],
        settings,
        vec![payload],
    )
    .unwrap()
}

#[test]
fn json_round_trip_preserves_every_optional_field() {
    let graph = fully_populated_graph();
    let json = graph.to_json().unwrap();
    let back = WorkflowGraph::from_json(&json).unwrap();

    assert_eq!(back, graph);
    assert_eq!(back.settings().max_parallel_steps, 7);
    assert!(!back.settings().auto_advance);
    assert_eq!(back.global_parameters()[0].default, Some(json!({"nested": [1, null, {"k": false}]})));

    let prompt = back.step_by_id("rate").unwrap().prompt().unwrap();
    assert_eq!(prompt.temperature, Some(0.479_607_564_269_825_87));
    assert_eq!(prompt.max_tokens, Some(2048));
    assert_eq!(prompt.response_format, ResponseFormat::Structured);

    let collect = back.step_by_id("collect").unwrap();
    assert_eq!(collect.parameters[0].default, Some(json!(["email", "pager"])));
    assert_eq!(collect.parameters[1].default, Some(json!(0.1 + 0.2)));
    assert_eq!(collect.parameters[1].validation.len(), 2);
    assert_eq!(collect.timeout_secs, Some(12));

    // Serializing the reloaded graph is byte-stable.
    assert_eq!(back.to_json().unwrap(), json);
}

#[test]
fn cyclic_document_is_rejected_on_load() {
    let json = r#"{
        "metadata": {"id": "wf", "name": "WF"},
        "steps": [
            {"id": "a", "name": "A", "category": "data_transformation", "depends_on": ["b"]},
            {"id": "b", "name": "B", "category": "data_transformation", "depends_on": ["a"]}
        ]
    }"#;
    let err = WorkflowGraph::from_json(json).unwrap_err();
    assert!(err.to_string().contains("cyclic dependency among steps: a, b"), "got: {err}");
}
