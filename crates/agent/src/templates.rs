//! Template catalogue and selection
//!
//! Selection narrows the catalogue to active templates of the requested type
//! whose topic belongs to the routed agent and whose lead sources fit the
//! request, then ranks by lead-source overlap, historical success rate and
//! template id. Binding fills `{name}` placeholders. Any selection or binding
//! failure renders the catalogue's default template instead, so a reply is
//! always produced.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use dealer_agent_config::TemplateCatalogConfig;
use dealer_agent_core::{
    AgentKind, PromptTemplate, RenderedTemplate, RoutingDecision, TemplateBindingError,
    TemplateCatalog, TemplateType,
};

use crate::registry::AgentRegistry;
use crate::{AgentError, Result};

/// Last-resort reply when even the default template renders blank
pub const BUILTIN_FALLBACK_TEXT: &str =
    "Thanks for your message. Someone from our team will be in touch shortly.";

/// Catalogue loaded once from configuration
pub struct StaticTemplateCatalog {
    /// Latest version of each template id
    templates: Vec<PromptTemplate>,
    default_template: PromptTemplate,
}

impl StaticTemplateCatalog {
    pub fn new(templates: Vec<PromptTemplate>, default_template: PromptTemplate) -> Self {
        let mut latest: BTreeMap<String, PromptTemplate> = BTreeMap::new();
        for template in templates {
            match latest.get(&template.template_id) {
                Some(existing) if existing.version >= template.version => {}
                _ => {
                    latest.insert(template.template_id.clone(), template);
                }
            }
        }

        Self {
            templates: latest.into_values().collect(),
            default_template,
        }
    }

    pub fn from_config(config: TemplateCatalogConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.templates, config.default_template))
    }

    /// Load the catalogue file. Any failure is an initialization error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = TemplateCatalogConfig::load(path).map_err(|e| {
            AgentError::Initialization(format!(
                "template catalogue {} failed to load: {}",
                path.display(),
                e
            ))
        })?;
        let version = config.version.clone();
        let catalog = Self::from_config(config)?;

        tracing::info!(
            path = %path.display(),
            templates = catalog.templates.len(),
            version = %version,
            "Loaded template catalogue"
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateCatalog for StaticTemplateCatalog {
    fn active_templates(&self, template_type: TemplateType) -> Vec<PromptTemplate> {
        self.templates
            .iter()
            .filter(|t| t.is_active && t.template_type == template_type)
            .cloned()
            .collect()
    }

    fn default_template(&self) -> &PromptTemplate {
        &self.default_template
    }
}

/// `{name}` occurrences in a body as (start, end, name), end exclusive
fn placeholders(body: &str) -> Vec<(usize, usize, &str)> {
    let mut found = Vec::new();
    let mut search_from = 0;
    while let Some(open) = body[search_from..].find('{').map(|i| i + search_from) {
        let Some(close) = body[open + 1..].find('}').map(|i| i + open + 1) else {
            break;
        };
        let name = &body[open + 1..close];
        if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            found.push((open, close + 1, name));
            search_from = close + 1;
        } else {
            search_from = open + 1;
        }
    }
    found
}

/// Substitute known placeholders; returns the text and any names left unbound
fn substitute(
    body: &str,
    variables: &HashMap<String, String>,
    drop_unbound: bool,
) -> (String, Vec<String>) {
    let mut out = String::with_capacity(body.len());
    let mut unbound = Vec::new();
    let mut cursor = 0;

    for (start, end, name) in placeholders(body) {
        out.push_str(&body[cursor..start]);
        match variables.get(name) {
            Some(value) => out.push_str(value),
            None => {
                if !drop_unbound {
                    out.push_str(&body[start..end]);
                }
                if !unbound.iter().any(|n| n == name) {
                    unbound.push(name.to_string());
                }
            }
        }
        cursor = end;
    }
    out.push_str(&body[cursor..]);
    (out, unbound)
}

/// Picks and binds a reply template for a routing decision
pub struct TemplateSelector {
    catalog: Arc<dyn TemplateCatalog>,
    registry: Arc<AgentRegistry>,
}

impl TemplateSelector {
    pub fn new(catalog: Arc<dyn TemplateCatalog>, registry: Arc<AgentRegistry>) -> Self {
        Self { catalog, registry }
    }

    /// Render a reply, falling back to the default template on any failure
    pub fn select(
        &self,
        decision: &RoutingDecision,
        lead_source_tags: &BTreeSet<String>,
        template_type: TemplateType,
        variables: &HashMap<String, String>,
    ) -> RenderedTemplate {
        match self.try_select(decision, lead_source_tags, template_type, variables) {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::warn!(
                    conversation_id = %decision.conversation_id,
                    agent = %decision.selected_agent_id,
                    template_type = %template_type,
                    error = %e,
                    "Template binding failed, using default template"
                );
                metrics::counter!("template_fallbacks_total").increment(1);
                self.render_default(variables, e.to_string())
            }
        }
    }

    /// Render the best matching template, surfacing binding failures
    pub fn try_select(
        &self,
        decision: &RoutingDecision,
        lead_source_tags: &BTreeSet<String>,
        template_type: TemplateType,
        variables: &HashMap<String, String>,
    ) -> std::result::Result<RenderedTemplate, TemplateBindingError> {
        let agent = decision.selected_agent_id;
        let template = self
            .rank(agent, lead_source_tags, template_type)
            .into_iter()
            .next()
            .ok_or_else(|| TemplateBindingError::NoMatchingTemplate {
                agent: agent.to_string(),
                template_type: template_type.to_string(),
            })?;

        let missing: Vec<String> = template
            .required_variables
            .iter()
            .filter(|name| {
                variables
                    .get(name.as_str())
                    .map(|v| v.trim().is_empty())
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(TemplateBindingError::MissingVariables {
                template_id: template.template_id,
                missing,
            });
        }

        let (text, unbound) = substitute(&template.body, variables, false);
        if !unbound.is_empty() {
            return Err(TemplateBindingError::UnresolvedPlaceholders {
                template_id: template.template_id,
                placeholders: unbound,
            });
        }

        tracing::debug!(
            conversation_id = %decision.conversation_id,
            template_id = %template.template_id,
            version = template.version,
            "Selected template"
        );

        Ok(RenderedTemplate {
            template_id: template.template_id,
            template_type: template.template_type,
            text,
            fallback_reason: None,
        })
    }

    /// Eligible templates, best first
    pub fn rank(
        &self,
        agent: AgentKind,
        lead_source_tags: &BTreeSet<String>,
        template_type: TemplateType,
    ) -> Vec<PromptTemplate> {
        let covers = |topic: &str| match self.registry.get(agent) {
            Some(registered) => registered.profile.covers_topic(topic),
            None => agent.as_str() == topic,
        };

        let mut eligible: Vec<(usize, PromptTemplate)> = self
            .catalog
            .active_templates(template_type)
            .into_iter()
            .filter(|t| t.is_active && t.template_type == template_type && covers(&t.topic))
            .filter_map(|t| {
                let overlap = t.lead_source_overlap(lead_source_tags);
                if t.lead_source_tags.is_empty() || overlap > 0 {
                    Some((overlap, t))
                } else {
                    None
                }
            })
            .collect();

        eligible.sort_by(|(overlap_a, a), (overlap_b, b)| {
            overlap_b
                .cmp(overlap_a)
                .then_with(|| {
                    b.success_rate
                        .partial_cmp(&a.success_rate)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.template_id.cmp(&b.template_id))
        });

        eligible.into_iter().map(|(_, t)| t).collect()
    }

    fn render_default(
        &self,
        variables: &HashMap<String, String>,
        reason: String,
    ) -> RenderedTemplate {
        let default = self.catalog.default_template();
        let (text, _) = substitute(&default.body, variables, true);
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let text = if text.is_empty() {
            BUILTIN_FALLBACK_TEXT.to_string()
        } else {
            text
        };

        RenderedTemplate {
            template_id: default.template_id.clone(),
            template_type: default.template_type,
            text,
            fallback_reason: Some(reason),
        }
    }
}
