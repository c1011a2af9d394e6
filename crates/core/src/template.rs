//! Prompt templates and rendered replies

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Conversation phase a template is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    Greeting,
    Followup,
    Objection,
    Confirmation,
    Escalation,
    Closing,
}

impl TemplateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateType::Greeting => "greeting",
            TemplateType::Followup => "followup",
            TemplateType::Objection => "objection",
            TemplateType::Confirmation => "confirmation",
            TemplateType::Escalation => "escalation",
            TemplateType::Closing => "closing",
        }
    }
}

impl std::fmt::Display for TemplateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    1
}

/// Catalogue entry. Placeholders use `{name}` syntax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub template_id: String,
    pub template_type: TemplateType,
    /// Agent id or one of an agent's topic tags
    pub topic: String,
    #[serde(default)]
    pub lead_source_tags: BTreeSet<String>,
    pub body: String,
    #[serde(default)]
    pub required_variables: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub success_rate: f32,
    #[serde(default = "default_version")]
    pub version: u32,
}

impl PromptTemplate {
    pub fn new(
        template_id: impl Into<String>,
        template_type: TemplateType,
        topic: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            template_id: template_id.into(),
            template_type,
            topic: topic.into(),
            lead_source_tags: BTreeSet::new(),
            body: body.into(),
            required_variables: Vec::new(),
            is_active: true,
            success_rate: 0.0,
            version: default_version(),
        }
    }

    pub fn with_lead_sources<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lead_source_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_required<I, S>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_variables = vars.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_success_rate(mut self, rate: f32) -> Self {
        self.success_rate = rate;
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Number of lead-source tags shared with a request
    pub fn lead_source_overlap(&self, tags: &BTreeSet<String>) -> usize {
        self.lead_source_tags.intersection(tags).count()
    }
}

/// Final reply text plus how it was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedTemplate {
    pub template_id: String,
    pub template_type: TemplateType,
    pub text: String,
    /// Binding error that forced the default template, if any
    pub fallback_reason: Option<String>,
}

impl RenderedTemplate {
    pub fn used_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_defaults() {
        let json = r#"{"template_id":"greet-web","template_type":"greeting","topic":"sales","body":"Hi {customer_name}!"}"#;
        let template: PromptTemplate = serde_json::from_str(json).unwrap();
        assert!(template.is_active);
        assert_eq!(template.version, 1);
        assert!(template.lead_source_tags.is_empty());
        assert!(template.required_variables.is_empty());
    }

    #[test]
    fn test_lead_source_overlap() {
        let template = PromptTemplate::new("t", TemplateType::Followup, "sales", "x")
            .with_lead_sources(["web", "facebook"]);
        let request: BTreeSet<String> = ["web", "email"].iter().map(|s| s.to_string()).collect();
        assert_eq!(template.lead_source_overlap(&request), 1);
    }
}
