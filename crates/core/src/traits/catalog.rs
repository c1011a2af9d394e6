use crate::template::{PromptTemplate, TemplateType};

/// Source of prompt templates
pub trait TemplateCatalog: Send + Sync {
    /// Active templates of a type, latest version of each template id only
    fn active_templates(&self, template_type: TemplateType) -> Vec<PromptTemplate>;

    /// Template used when selection or binding fails
    fn default_template(&self) -> &PromptTemplate;
}
