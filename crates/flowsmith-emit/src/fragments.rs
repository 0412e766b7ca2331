//! Per-category template fragments.
//!
//! A [`FragmentSet`] holds one document template plus step fragments keyed
//! by [`StepCategory`].  A category without its own fragment renders through
//! the generic fallback, so no category can make emission fail.

use std::collections::BTreeMap;

use flowsmith_schema::StepCategory;

/// Template name of the document in a compiled fragment set.
pub(crate) const DOCUMENT: &str = "document";

/// Template name of the fallback fragment.
pub(crate) const FALLBACK: &str = "step.fallback";

/// Document template, category fragments, and fallback fragment for one
/// target syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSet {
    pub document: String,
    pub steps: BTreeMap<StepCategory, String>,
    pub fallback: String,
}

impl FragmentSet {
    /// A set with no category-specific fragments.
    pub fn new(document: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            steps: BTreeMap::new(),
            fallback: fallback.into(),
        }
    }

    /// Add or replace the fragment for `category`.
    pub fn with_step(mut self, category: StepCategory, fragment: impl Into<String>) -> Self {
        self.steps.insert(category, fragment.into());
        self
    }

    /// Template name to render a step of `category` with.
    pub fn template_for(&self, category: StepCategory) -> String {
        if self.steps.contains_key(&category) {
            step_template_name(category)
        } else {
            FALLBACK.to_string()
        }
    }

    /// Every `(template name, source)` pair, document first.
    pub(crate) fn templates(&self) -> impl Iterator<Item = (String, &str)> {
        [
            (DOCUMENT.to_string(), self.document.as_str()),
            (FALLBACK.to_string(), self.fallback.as_str()),
        ]
        .into_iter()
        .chain(
            self.steps
                .iter()
                .map(|(category, src)| (step_template_name(*category), src.as_str())),
        )
    }

    // -- Built-in sets --------------------------------------------------------

    /// Python plugin with one endpoint per step.
    pub fn server_handler() -> Self {
        Self::new(
            include_str!("../templates/server_handler/document.py.hbs"),
            include_str!("../templates/server_handler/fallback.py.hbs"),
        )
        .with_step(
            StepCategory::InferenceProcessing,
            include_str!("../templates/server_handler/inference.py.hbs"),
        )
        .with_step(
            StepCategory::FormInput,
            include_str!("../templates/server_handler/form_input.py.hbs"),
        )
        .with_step(
            StepCategory::FileProcessing,
            include_str!("../templates/server_handler/file_processing.py.hbs"),
        )
        .with_step(
            StepCategory::ExternalRequest,
            include_str!("../templates/server_handler/external_request.py.hbs"),
        )
        .with_step(
            StepCategory::CodeExecution,
            include_str!("../templates/server_handler/code_execution.py.hbs"),
        )
    }

    /// React component rendering one form per step.
    pub fn client_view() -> Self {
        Self::new(
            include_str!("../templates/client_view/document.tsx.hbs"),
            include_str!("../templates/client_view/fallback.tsx.hbs"),
        )
        .with_step(
            StepCategory::InferenceProcessing,
            include_str!("../templates/client_view/inference.tsx.hbs"),
        )
    }

    /// Host-server registration snippet.  Every category renders the same
    /// step entry.
    pub fn host_integration() -> Self {
        Self::new(
            include_str!("../templates/host_integration/document.py.hbs"),
            include_str!("../templates/host_integration/step.py.hbs"),
        )
    }
}

fn step_template_name(category: StepCategory) -> String {
    format!("step.{category}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_category_uses_fallback() {
        let set = FragmentSet::new("doc", "generic")
            .with_step(StepCategory::CodeExecution, "exec");
        assert_eq!(set.template_for(StepCategory::CodeExecution), "step.code_execution");
        assert_eq!(set.template_for(StepCategory::OutputGeneration), FALLBACK);
    }

    #[test]
    fn builtin_sets_cover_their_categories() {
        let server = FragmentSet::server_handler();
        assert_eq!(server.steps.len(), 5);
        assert_eq!(server.template_for(StepCategory::DataTransformation), FALLBACK);
        assert_eq!(server.templates().count(), 7);

        let client = FragmentSet::client_view();
        assert_eq!(client.template_for(StepCategory::FormInput), FALLBACK);

        let host = FragmentSet::host_integration();
        assert!(host.steps.is_empty());
        assert_eq!(host.templates().count(), 2);
    }
}
