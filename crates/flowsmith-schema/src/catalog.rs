//! Built-in reference workflows.

use serde_json::json;

use crate::error::Result;
use crate::graph::{WorkflowGraph, WorkflowMetadata};
use crate::parameter::{ParameterDefinition, ParameterKind, ValidationRule};
use crate::step::{PromptConfig, ResponseFormat, StepCategory, StepDefinition};

/// Model providers offered by every inference step.
pub const LLM_PROVIDERS: [&str; 3] = ["openai", "anthropic", "google"];

/// The `llm_provider` select parameter shared by inference steps.
pub fn llm_provider_parameter() -> Result<ParameterDefinition> {
    ParameterDefinition::builder("llm_provider", ParameterKind::SingleSelect)
        .required(true)
        .options(LLM_PROVIDERS)
        .default_value(json!("openai"))
        .label("LLM Provider")
        .build()
}

/// Element extraction, scenario generation, code generation and test run for
/// a web page.
pub fn ai_web_testing() -> Result<WorkflowGraph> {
    let metadata = WorkflowMetadata::new("ai_web_testing", "AI Web UI Testing Framework")
        .with_description("AI-powered web UI testing with element extraction and test generation")
        .with_category("testing")
        .with_tags(["ai", "web", "testing", "automation"]);

    let page_url = ParameterDefinition::builder("page_url", ParameterKind::Url)
        .required(true)
        .label("Page URL")
        .description("URL of the web page to analyze")
        .rule(ValidationRule::required("Page URL is required"))
        .build()?;

    let steps = vec![
        StepDefinition::new("element_extraction", "Element Extraction", StepCategory::ExternalRequest)
            .with_description("Extract interactive elements from web pages")
            .with_parameter(page_url)
            .with_handler("crawl_website"),
        StepDefinition::new("test_generation", "Test Cases Generation", StepCategory::InferenceProcessing)
            .with_description("Generate AI-powered test scenarios")
            .with_depends_on(["element_extraction"])
            .with_prompt(
                PromptConfig::new(
                    "Generate comprehensive test scenarios for the following web elements:\n\
                     {elements_description}\nPage URL: {page_url}",
                )
                .with_template_name("gherkin_generation")
                .with_variables(["elements_description", "page_url"]),
            )
            .with_parameter(llm_provider_parameter()?),
        StepDefinition::new("code_generation", "Code Generation", StepCategory::InferenceProcessing)
            .with_description("Generate executable test code")
            .with_depends_on(["test_generation"])
            .with_prompt(
                PromptConfig::new("Generate Playwright test code for:\n{test_scenarios}")
                    .with_template_name("playwright_generation")
                    .with_variables(["test_scenarios"]),
            )
            .with_parameter(llm_provider_parameter()?),
        StepDefinition::new("code_execution", "Code Execution", StepCategory::CodeExecution)
            .with_description("Execute generated tests and view results")
            .with_depends_on(["code_generation"])
            .with_handler("execute_test_code"),
    ];

    WorkflowGraph::new(metadata, steps)
}

/// Schema analysis, profiling, rule generation and execution over an
/// uploaded data file.
pub fn dq_testing() -> Result<WorkflowGraph> {
    let metadata = WorkflowMetadata::new("dq_testing", "Data Quality Testing Framework")
        .with_description("Comprehensive data quality analysis and testing")
        .with_category("data_quality")
        .with_tags(["data", "quality", "testing", "analysis"]);

    let data_file = ParameterDefinition::builder("data_file", ParameterKind::File)
        .required(true)
        .label("Data File")
        .rule(ValidationRule::required("Data file is required"))
        .build()?;

    let steps = vec![
        StepDefinition::new("schema_analysis", "Schema Analysis", StepCategory::InferenceProcessing)
            .with_description("Analyze data schema and generate profiling suggestions")
            .with_parameters([data_file, llm_provider_parameter()?])
            .with_prompt(
                PromptConfig::new(
                    "Analyze the following data schema and provide comprehensive profiling suggestions:\n\
                     {schema_info}",
                )
                .with_template_name("schema_analysis")
                .with_variables(["schema_info"])
                .with_response_format(ResponseFormat::Structured),
            ),
        StepDefinition::new("profile_generation", "Profile Generation", StepCategory::InferenceProcessing)
            .with_description("Generate data quality profiles")
            .with_depends_on(["schema_analysis"])
            .with_prompt(
                PromptConfig::new("Generate data quality profiles based on analysis:\n{analysis_results}")
                    .with_template_name("profile_generation")
                    .with_variables(["analysis_results"])
                    .with_response_format(ResponseFormat::Json),
            ),
        StepDefinition::new("rule_generation", "Rule Generation", StepCategory::InferenceProcessing)
            .with_description("Generate data quality rules")
            .with_depends_on(["profile_generation"])
            .with_prompt(
                PromptConfig::new("Generate data quality rules from profiles:\n{profiles}")
                    .with_template_name("rule_generation")
                    .with_variables(["profiles"])
                    .with_response_format(ResponseFormat::Structured),
            ),
        StepDefinition::new("execution", "Execution", StepCategory::CodeExecution)
            .with_description("Execute data quality tests")
            .with_depends_on(["rule_generation"])
            .with_handler("execute_dq_tests"),
    ];

    WorkflowGraph::new(metadata, steps)
}

/// Every built-in workflow.
pub fn builtin_workflows() -> Result<Vec<WorkflowGraph>> {
    Ok(vec![ai_web_testing()?, dq_testing()?])
}
