//! Chat session and message types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::knowledge::{knowledge_base, ResponseTemplate};
use crate::catalog::AgentKind;

/// Role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Agent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// User message accepted
    Sent,
    /// Agent response emitted
    Delivered,
    /// Agent response from the fallback path after a failed action
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub confidence: f64,
    pub category: String,
    pub actions: Vec<String>,
}

impl From<&ResponseTemplate> for MessageMetadata {
    fn from(template: &ResponseTemplate) -> Self {
        Self {
            confidence: template.confidence,
            category: template.category.to_string(),
            actions: template.actions.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub status: MessageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: ChatRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            status: MessageStatus::Sent,
            metadata: None,
        }
    }

    pub fn agent(
        content: impl Into<String>,
        status: MessageStatus,
        metadata: Option<MessageMetadata>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: ChatRole::Agent,
            content: content.into(),
            timestamp: Utc::now(),
            status,
            metadata,
        }
    }
}

/// Where the outstanding request is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RequestPhase {
    Idle,
    Classifying,
    Delaying { stage: usize, stages: usize },
    Responding,
}

impl RequestPhase {
    pub fn is_pending(&self) -> bool {
        !matches!(self, RequestPhase::Idle)
    }
}

/// One open conversation with an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub agent_name: String,
    pub agent_type: AgentKind,
    pub messages: Vec<ChatMessage>,
    pub phase: RequestPhase,
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    /// Open a session seeded with the agent's welcome message
    pub fn open(agent_type: AgentKind) -> Self {
        let welcome = ChatMessage::agent(
            knowledge_base(agent_type).welcome,
            MessageStatus::Delivered,
            None,
        );
        Self {
            id: Uuid::new_v4(),
            agent_name: agent_type.as_str().to_string(),
            agent_type,
            messages: vec![welcome],
            phase: RequestPhase::Idle,
            created_at: Utc::now(),
        }
    }

    /// Whether a response is in flight; the send affordance is disabled while true
    pub fn is_pending(&self) -> bool {
        self.phase.is_pending()
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_seeds_welcome() {
        let session = ChatSession::open(AgentKind::Inventory);
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, ChatRole::Agent);
        assert_eq!(session.agent_name, "InventoryAgent");
        assert!(!session.is_pending());
    }

    #[test]
    fn test_phase_pending() {
        assert!(!RequestPhase::Idle.is_pending());
        assert!(RequestPhase::Classifying.is_pending());
        assert!(RequestPhase::Delaying { stage: 1, stages: 2 }.is_pending());
        assert!(RequestPhase::Responding.is_pending());
    }

    #[test]
    fn test_metadata_from_template() {
        let template = super::super::knowledge::PRICING_APPLIED;
        let metadata = MessageMetadata::from(&template);
        assert_eq!(metadata.category, "pricing_optimization");
        assert!(metadata.actions.contains(&"price_updates".to_string()));
    }
}
