//! Prompt template catalogue file

use dealer_agent_core::PromptTemplate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateCatalogConfig {
    #[serde(default)]
    pub version: String,

    /// Rendered whenever selection or binding fails
    pub default_template: PromptTemplate,

    #[serde(default)]
    pub templates: Vec<PromptTemplate>,
}

impl TemplateCatalogConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = crate::read_yaml(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_template.body.trim().is_empty() {
            return Err(ConfigError::invalid(
                "default_template.body",
                "Default template cannot be blank",
            ));
        }
        if !self.default_template.required_variables.is_empty() {
            return Err(ConfigError::invalid(
                "default_template.required_variables",
                "Default template cannot require variables",
            ));
        }

        let mut seen = HashSet::new();
        for template in &self.templates {
            let id = &template.template_id;
            if id.trim().is_empty() {
                return Err(ConfigError::MissingField("templates.template_id".to_string()));
            }
            if !seen.insert((id.as_str(), template.version)) {
                return Err(ConfigError::invalid(
                    format!("templates.{}", id),
                    format!("Duplicate version {}", template.version),
                ));
            }
            if template.body.trim().is_empty() {
                return Err(ConfigError::invalid(
                    format!("templates.{}.body", id),
                    "Body cannot be blank",
                ));
            }
            if !(0.0..=1.0).contains(&template.success_rate) {
                return Err(ConfigError::invalid(
                    format!("templates.{}.success_rate", id),
                    format!("Must be between 0.0 and 1.0, got {}", template.success_rate),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealer_agent_core::TemplateType;

    const SHIPPED: &str = include_str!("../../../config/templates.yaml");

    #[test]
    fn test_shipped_catalogue_is_valid() {
        let config = TemplateCatalogConfig::from_yaml(SHIPPED).unwrap();
        assert_eq!(config.default_template.template_id, "default-ack");
        assert!(config
            .templates
            .iter()
            .any(|t| t.template_type == TemplateType::Escalation));
        assert!(config.templates.iter().any(|t| !t.is_active));
    }

    #[test]
    fn test_duplicate_version_rejected() {
        let yaml = r#"
default_template:
  template_id: d
  template_type: followup
  topic: general
  body: "Thanks!"
templates:
  - template_id: a
    template_type: greeting
    topic: sales
    body: "Hi"
  - template_id: a
    template_type: greeting
    topic: sales
    body: "Hello"
"#;
        assert!(TemplateCatalogConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_default_template_cannot_require_variables() {
        let yaml = r#"
default_template:
  template_id: d
  template_type: followup
  topic: general
  body: "Thanks {customer_name}!"
  required_variables: [customer_name]
"#;
        let err = TemplateCatalogConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("default_template"));
    }
}
