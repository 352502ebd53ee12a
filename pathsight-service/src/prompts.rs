//! Prompt templates for the two LLM passes.
//!
//! Templates are keyed by `(model, prompt)` with a shared fallback set, so a
//! deployment can tune wording per model without touching the orchestration.
//! The chat system prompt is where the directive grammar is taught to the
//! LLM; the parser in `directive.rs` enforces the same grammar on the way
//! back.

use std::collections::HashMap;

use crate::tools::CapabilityName;

/// Prompt identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptName {
    /// First-pass system prompt: capabilities and the directive grammar.
    ChatSystem,
    /// Second-pass system prompt.
    InterpretSystem,
    /// Second-pass user prompt for classification and similarity results.
    InterpretFindings,
    /// Second-pass user prompt for segmentation runs.
    InterpretSegmentation,
}

/// Template store with per-model overrides over a shared default set.
pub struct PromptLibrary {
    overrides: HashMap<(String, PromptName), String>,
    defaults: HashMap<PromptName, &'static str>,
}

impl PromptLibrary {
    /// The built-in template set.
    pub fn builtin() -> Self {
        let defaults = HashMap::from([
            (
                PromptName::ChatSystem,
                include_str!("../prompts/chat_system.txt"),
            ),
            (
                PromptName::InterpretSystem,
                include_str!("../prompts/interpret_system.txt"),
            ),
            (
                PromptName::InterpretFindings,
                include_str!("../prompts/interpret_findings.txt"),
            ),
            (
                PromptName::InterpretSegmentation,
                include_str!("../prompts/interpret_segmentation.txt"),
            ),
        ]);

        Self {
            overrides: HashMap::new(),
            defaults,
        }
    }

    /// Register a model-specific template.
    pub fn set_override(
        &mut self,
        model: impl Into<String>,
        name: PromptName,
        template: impl Into<String>,
    ) {
        self.overrides.insert((model.into(), name), template.into());
    }

    /// Look up a template for a model, falling back to the shared set.
    pub fn get(&self, model: &str, name: PromptName) -> &str {
        self.overrides
            .get(&(model.to_string(), name))
            .map(String::as_str)
            .or_else(|| self.defaults.get(&name).copied())
            .unwrap_or_default()
    }

    /// First-pass system prompt for a model.
    pub fn chat_system(&self, model: &str) -> String {
        self.get(model, PromptName::ChatSystem).to_string()
    }

    /// Second-pass prompt pair for a capability, with the raw result embedded
    /// in the user prompt.
    pub fn interpretation(
        &self,
        model: &str,
        capability: CapabilityName,
        raw_result: &str,
    ) -> (String, String) {
        let system = self.get(model, PromptName::InterpretSystem).to_string();

        let user = match capability {
            CapabilityName::GetCancerSubtype | CapabilityName::GetBestImage => self
                .get(model, PromptName::InterpretFindings)
                .replace("{result}", raw_result),
            CapabilityName::GetSegmentationRun => self
                .get(model, PromptName::InterpretSegmentation)
                .to_string(),
        };

        (system, user)
    }
}
