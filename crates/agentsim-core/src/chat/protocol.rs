//! Conversational agent protocol
//!
//! Each request moves through `Idle -> Classifying -> Delaying -> Responding
//! -> Idle`. The staged delays run on a per-request task, so sessions never
//! block each other or the tick driver.
//!
//! The pricing optimization request is the only one with a real side effect.
//! The call is dispatched on its own task before the delay starts; closing
//! the session aborts the staged reply but never the dispatched call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::knowledge::{
    knowledge_base, Classification, ResponsePlan, PRICING_APPLIED, PRICING_DEGRADED,
};
use super::session::{ChatMessage, ChatSession, MessageMetadata, MessageStatus, RequestPhase};
use crate::catalog::AgentKind;
use crate::config::ChatConfig;
use crate::policy::{RandomPolicy, SeededPolicy};
use crate::pricing::{PricingOutcome, PricingService, ProductCatalogCache, PRICING_CACHE_KEYS};
use crate::{Error, Result};

/// Maximum accepted message length
pub const MAX_MESSAGE_LENGTH: usize = 4_000;

struct SessionEntry {
    session: ChatSession,
    policy: SeededPolicy,
    pending: Option<JoinHandle<()>>,
}

type SharedEntry = Arc<Mutex<SessionEntry>>;

/// Open chat sessions and the collaborators they call
pub struct ChatManager {
    sessions: RwLock<HashMap<Uuid, SharedEntry>>,
    config: ChatConfig,
    pricing: Arc<dyn PricingService>,
    cache: Arc<dyn ProductCatalogCache>,
    seed: Option<u64>,
    opened: AtomicU64,
}

impl ChatManager {
    pub fn new(
        config: ChatConfig,
        pricing: Arc<dyn PricingService>,
        cache: Arc<dyn ProductCatalogCache>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            pricing,
            cache,
            seed: None,
            opened: AtomicU64::new(0),
        }
    }

    /// Derive every session's delay policy from `seed`
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Open a session with the named agent
    pub async fn open(&self, agent_name: &str) -> Result<ChatSession> {
        let kind = AgentKind::from_name(agent_name)?;
        let session = ChatSession::open(kind);
        let n = self.opened.fetch_add(1, Ordering::Relaxed);
        let policy = SeededPolicy::from_optional_seed(self.seed.map(|s| s.wrapping_add(n)));

        let entry = SessionEntry {
            session: session.clone(),
            policy,
            pending: None,
        };
        self.sessions
            .write()
            .await
            .insert(session.id, Arc::new(Mutex::new(entry)));

        info!(session_id = %session.id, agent = %kind, "Chat session opened");
        Ok(session)
    }

    pub async fn session(&self, id: Uuid) -> Result<ChatSession> {
        let entry = self.entry(id).await?;
        let guard = entry.lock().await;
        Ok(guard.session.clone())
    }

    pub async fn list(&self) -> Vec<ChatSession> {
        let entries: Vec<SharedEntry> = self.sessions.read().await.values().cloned().collect();
        let mut sessions = Vec::with_capacity(entries.len());
        for entry in entries {
            sessions.push(entry.lock().await.session.clone());
        }
        sessions.sort_by_key(|s| s.created_at);
        sessions
    }

    pub async fn is_pending(&self, id: Uuid) -> Result<bool> {
        let entry = self.entry(id).await?;
        let pending = entry.lock().await.session.is_pending();
        Ok(pending)
    }

    /// Enqueue a message. Fails with `ResponsePending` while a reply is in flight.
    pub async fn send_message(&self, id: Uuid, text: &str) -> Result<()> {
        self.dispatch(id, text).await.map(|_| ())
    }

    /// Enqueue a message and wait for the agent's reply
    pub async fn send_and_wait(&self, id: Uuid, text: &str) -> Result<ChatMessage> {
        let rx = self.dispatch(id, text).await?;
        rx.await
            .map_err(|_| Error::SessionNotFound(format!("{} closed before responding", id)))
    }

    /// Close a session, discarding any pending reply
    pub async fn close(&self, id: Uuid) -> Result<()> {
        let entry = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;

        let mut guard = entry.lock().await;
        if let Some(handle) = guard.pending.take() {
            handle.abort();
            debug!(session_id = %id, "Cancelled pending response");
        }
        info!(session_id = %id, agent = %guard.session.agent_name, "Chat session closed");
        Ok(())
    }

    async fn entry(&self, id: Uuid) -> Result<SharedEntry> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    async fn dispatch(&self, id: Uuid, text: &str) -> Result<oneshot::Receiver<ChatMessage>> {
        let entry = self.entry(id).await?;

        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Validation("Message cannot be empty".into()));
        }
        if text.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(Error::Validation(format!(
                "Message exceeds maximum length of {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }

        let mut guard = entry.lock().await;
        if guard.session.is_pending() {
            return Err(Error::ResponsePending(id.to_string()));
        }

        guard.session.messages.push(ChatMessage::user(text));
        guard.session.phase = RequestPhase::Classifying;

        let classification = knowledge_base(guard.session.agent_type).classify(text);
        let stages = self.stage_delays(classification.plan, &mut guard.policy);
        debug!(
            session_id = %id,
            category = classification.response.category,
            matched = classification.matched,
            stages = stages.len(),
            "Classified chat message"
        );

        let (tx, rx) = oneshot::channel();
        let request = PendingRequest {
            entry: Arc::clone(&entry),
            classification,
            stages,
            pricing: Arc::clone(&self.pricing),
            cache: Arc::clone(&self.cache),
            pricing_timeout: self.config.pricing_timeout(),
        };
        guard.pending = Some(tokio::spawn(request.run(tx)));
        Ok(rx)
    }

    fn stage_delays(&self, plan: ResponsePlan, policy: &mut dyn RandomPolicy) -> Vec<Duration> {
        match plan {
            ResponsePlan::Standard => vec![policy.pick_delay(self.config.default_delay_ms)],
            ResponsePlan::PricingOptimization => {
                vec![policy.pick_delay(self.config.optimization_delay_ms)]
            }
            ResponsePlan::MarketResearch => vec![
                policy.pick_delay(self.config.research_delay_ms),
                policy.pick_delay(self.config.reasoning_delay_ms),
            ],
        }
    }
}

/// One in-flight request
struct PendingRequest {
    entry: SharedEntry,
    classification: Classification,
    stages: Vec<Duration>,
    pricing: Arc<dyn PricingService>,
    cache: Arc<dyn ProductCatalogCache>,
    pricing_timeout: Duration,
}

impl PendingRequest {
    async fn run(self, tx: oneshot::Sender<ChatMessage>) {
        let dispatched = (self.classification.plan == ResponsePlan::PricingOptimization).then(|| {
            tokio::spawn(apply_pricing(
                Arc::clone(&self.pricing),
                Arc::clone(&self.cache),
                self.pricing_timeout,
            ))
        });

        let total = self.stages.len();
        for (i, delay) in self.stages.iter().enumerate() {
            self.entry.lock().await.session.phase = RequestPhase::Delaying {
                stage: i + 1,
                stages: total,
            };
            tokio::time::sleep(*delay).await;
        }

        let message = match dispatched {
            Some(handle) => {
                let result = handle
                    .await
                    .unwrap_or_else(|e| Err(Error::Other(format!("pricing task failed: {}", e))));
                pricing_response(result)
            }
            None => {
                let template = &self.classification.response;
                ChatMessage::agent(
                    template.content,
                    MessageStatus::Delivered,
                    Some(MessageMetadata::from(template)),
                )
            }
        };

        {
            let mut guard = self.entry.lock().await;
            guard.session.phase = RequestPhase::Responding;
            guard.session.messages.push(message.clone());
            guard.session.phase = RequestPhase::Idle;
            guard.pending = None;
        }
        let _ = tx.send(message);
    }
}

/// Run the optimization under a timeout and refresh cached product views on success
async fn apply_pricing(
    pricing: Arc<dyn PricingService>,
    cache: Arc<dyn ProductCatalogCache>,
    timeout: Duration,
) -> Result<PricingOutcome> {
    let outcome = match tokio::time::timeout(timeout, pricing.optimize_pricing()).await {
        Ok(result) => result?,
        Err(_) => return Err(Error::Timeout(timeout.as_millis() as u64)),
    };
    cache.invalidate(&PRICING_CACHE_KEYS).await;
    Ok(outcome)
}

fn pricing_response(result: Result<PricingOutcome>) -> ChatMessage {
    match result {
        Ok(outcome) => {
            let content = PRICING_APPLIED
                .content
                .replace("{products}", &outcome.total_products_updated.to_string())
                .replace(
                    "{increase}",
                    &format!("{:.1}", outcome.average_increase_percent),
                );
            ChatMessage::agent(
                content,
                MessageStatus::Delivered,
                Some(MessageMetadata::from(&PRICING_APPLIED)),
            )
        }
        Err(e) => {
            warn!(error = %e, "Pricing optimization failed, responding with analysis only");
            ChatMessage::agent(
                PRICING_DEGRADED.content,
                MessageStatus::Degraded,
                Some(MessageMetadata::from(&PRICING_DEGRADED)),
            )
        }
    }
}
