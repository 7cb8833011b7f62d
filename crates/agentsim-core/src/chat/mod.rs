//! Conversational agents: keyword knowledge bases, sessions and the
//! request protocol that drives them

pub mod knowledge;
pub mod protocol;
pub mod session;

pub use knowledge::{knowledge_base, Classification, KnowledgeBase, ResponsePlan, ResponseTemplate};
pub use protocol::{ChatManager, MAX_MESSAGE_LENGTH};
pub use session::{ChatMessage, ChatRole, ChatSession, MessageMetadata, MessageStatus, RequestPhase};
