//! Integration tests for the registry: create, deploy to disk, reload.

use std::sync::Arc;

use flowsmith_registry::{FilesystemSink, WorkflowRegistry, WorkflowRequest};
use flowsmith_schema::StepCategory;

// ═══════════════════════════════════════════════════════════════════════════
// Deploy to the filesystem
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn comprehensive_example_deploys_five_files() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = WorkflowRegistry::new(Arc::new(FilesystemSink::new(tmp.path()))).unwrap();

    let id = registry
        .create(WorkflowRequest::comprehensive_example())
        .await
        .unwrap();
    assert_eq!(id, "comprehensive_ai_data_pipeline");

    let graph = registry.get(&id).unwrap();
    let categories: Vec<StepCategory> = graph.steps().iter().map(|s| s.category).collect();
    assert_eq!(
        categories,
        vec![
            StepCategory::FormInput,
            StepCategory::InferenceProcessing,
            StepCategory::DataTransformation,
            StepCategory::CodeExecution,
            StepCategory::DataTransformation,
        ]
    );
    assert_eq!(graph.steps()[1].name, "Ai-Powered Analysis");

    let report = registry.deploy(&id).await.unwrap();
    assert!(report.is_complete(), "{report:?}");

    let dir = tmp.path().join(&id);
    let mut files: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(
        files,
        vec![
            "comprehensive_ai_data_pipeline_integration.py",
            "comprehensive_ai_data_pipeline_plugin.py",
            "comprehensive_ai_data_pipeline_workflow.tsx",
            "config.json",
            "schema.json",
        ]
    );

    let config: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("config.json")).unwrap()).unwrap();
    assert_eq!(config["id"], "comprehensive_ai_data_pipeline");
    assert_eq!(config["category"], "example");
    assert_eq!(
        config["plugin_class"],
        "comprehensive_ai_data_pipeline_plugin.plugin_instance"
    );
    assert_eq!(config["steps"].as_array().unwrap().len(), 5);

    let python = std::fs::read_to_string(dir.join("comprehensive_ai_data_pipeline_plugin.py")).unwrap();
    assert!(python.contains("async def execute_code_execution_and_testing(self, request)"));

    let integration =
        std::fs::read_to_string(dir.join("comprehensive_ai_data_pipeline_integration.py")).unwrap();
    assert!(integration.contains(
        "from comprehensive_ai_data_pipeline_plugin import plugin_instance as comprehensive_ai_data_pipeline_plugin"
    ));
    assert_eq!(integration.matches("            \"id\": \"step_").count(), 5);
}

// ═══════════════════════════════════════════════════════════════════════════
// Reload schema dumps
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn schema_dumps_reload_into_a_fresh_registry() {
    let tmp = tempfile::tempdir().unwrap();
    let sink = Arc::new(FilesystemSink::new(tmp.path()));
    let first = WorkflowRegistry::new(sink.clone()).unwrap();

    let ids = [
        first
            .create(WorkflowRequest::new(["upload file", "ai summary"]).with_name("Doc Digest"))
            .await
            .unwrap(),
        first
            .create(WorkflowRequest::new(["fetch api data", "run checks"]).with_id("nightly"))
            .await
            .unwrap(),
    ];
    for id in &ids {
        first.deploy(id).await.unwrap();
    }

    let second = WorkflowRegistry::new(sink.clone()).unwrap();
    for graph in sink.load_schemas().await.unwrap() {
        second.insert(graph).await;
    }

    assert_eq!(second.len(), 2);
    for id in &ids {
        assert_eq!(first.get(id).unwrap(), second.get(id).unwrap());
    }
    let listed: Vec<String> = second.list().into_iter().map(|s| s.id).collect();
    assert_eq!(listed, vec!["doc_digest".to_string(), "nightly".to_string()]);
}

#[tokio::test]
async fn redeploy_overwrites_in_place() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = WorkflowRegistry::new(Arc::new(FilesystemSink::new(tmp.path()))).unwrap();

    let id = registry
        .create(WorkflowRequest::new(["ai draft"]).with_id("memo"))
        .await
        .unwrap();
    registry.deploy(&id).await.unwrap();

    registry
        .create(
            WorkflowRequest::new(["ai draft", "run lint"])
                .with_id("memo")
                .with_description("second pass"),
        )
        .await
        .unwrap();
    registry.deploy(&id).await.unwrap();

    let config = std::fs::read_to_string(tmp.path().join("memo").join("config.json")).unwrap();
    assert!(config.contains("second pass"));
    assert_eq!(registry.len(), 1);
}
