//! Candidate agent identities and profiles

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Closed set of specialist agents
///
/// Variants are declared in lexicographic order of their ids, so the derived
/// `Ord` is the tie-break order used by routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Credit,
    Finance,
    /// Human-handoff agent, always present
    General,
    Inventory,
    Lease,
    Sales,
    Service,
    TradeIn,
}

impl AgentKind {
    pub const ALL: [AgentKind; 8] = [
        AgentKind::Credit,
        AgentKind::Finance,
        AgentKind::General,
        AgentKind::Inventory,
        AgentKind::Lease,
        AgentKind::Sales,
        AgentKind::Service,
        AgentKind::TradeIn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Credit => "credit",
            AgentKind::Finance => "finance",
            AgentKind::General => "general",
            AgentKind::Inventory => "inventory",
            AgentKind::Lease => "lease",
            AgentKind::Sales => "sales",
            AgentKind::Service => "service",
            AgentKind::TradeIn => "trade_in",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentKind::Credit => "Credit Specialist",
            AgentKind::Finance => "Finance Specialist",
            AgentKind::General => "General Assistant",
            AgentKind::Inventory => "Inventory Specialist",
            AgentKind::Lease => "Lease Specialist",
            AgentKind::Sales => "Sales Consultant",
            AgentKind::Service => "Service Advisor",
            AgentKind::TradeIn => "Trade-In Appraiser",
        }
    }

    pub fn is_handoff(&self) -> bool {
        matches!(self, AgentKind::General)
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown agent id: {}", s))
    }
}

fn default_priority_weight() -> f32 {
    1.0
}

/// Routing profile of a candidate agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub agent_id: AgentKind,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub topic_tags: BTreeSet<String>,
    #[serde(default)]
    pub training_utterances: Vec<String>,
    #[serde(default = "default_priority_weight")]
    pub priority_weight: f32,
}

impl AgentProfile {
    pub fn new(agent_id: AgentKind) -> Self {
        Self {
            agent_id,
            display_name: agent_id.display_name().to_string(),
            topic_tags: BTreeSet::new(),
            training_utterances: Vec::new(),
            priority_weight: default_priority_weight(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topic_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_utterances<I, S>(mut self, utterances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.training_utterances = utterances.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority_weight(mut self, weight: f32) -> Self {
        self.priority_weight = weight;
        self
    }

    /// Name shown to operators
    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            self.agent_id.display_name()
        } else {
            &self.display_name
        }
    }

    /// Whether a topic belongs to this agent (its own id counts as a topic)
    pub fn covers_topic(&self, topic: &str) -> bool {
        self.agent_id.as_str() == topic || self.topic_tags.contains(topic)
    }
}
