//! End-to-end query orchestration.
//!
//! One request flows validate, admit, guard, retrieve, generate, post-guard,
//! then scrub (disclaimers always, ungrounded salary figures for
//! compensation queries). Every refusal path is a designed outcome, not an
//! error: rate limits, guard blocks and provider exhaustion all map to an
//! [`AbortReason`] the caller can render, and internal provider detail never
//! reaches the reply.

use std::sync::Arc;
use std::time::Duration;

use advisor_core::{AppConfig, AppResult};
use advisor_knowledge::{ChunkPolicy, KnowledgeStore, Retriever};
use advisor_llm::router::attribution;
use advisor_llm::{build_router, GenerationRequest, ProviderRouter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::guard::GuardEngine;
use crate::profile::profile_from_text;
use crate::prompt::build_query_prompt;
use crate::ratelimit::{Admission, RateLimiter, Resource};
use crate::salary::SalaryGuard;
use crate::scrub::strip_disclaimers;
use crate::session::SessionStore;

/// Attribution shown when the post-guard replaced the model output.
const GUARD_SOURCE: &str = "SafetyPolicy";

/// Caller-facing message when every backend failed.
const ALL_FAILED_MESSAGE: &str =
    "The advisor is temporarily unavailable. Please try again in a moment.";

/// One inbound query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question text
    pub text: String,

    /// Session whose profile should inform the answer, if any
    pub session_id: Option<String>,

    /// Stable caller identity for rate limiting
    pub client_key: String,
}

/// Why a request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbortReason {
    /// Too many requests in the current window; retry later
    RateLimitExceeded,
    /// The query tried to extract guarded content; carries the fixed refusal
    ExfiltrationAttempt { message: String },
    /// The request was malformed (empty text, blank identifiers)
    InvalidInput { message: String },
    /// Every configured backend failed; carries a generic caller message
    AllProvidersFailed { message: String },
}

/// Where an answer came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Backend that actually produced the answer
    pub provider_name: String,

    /// Model identity the backend reported
    pub model_name: String,

    /// Knowledge chunks that grounded the prompt
    pub chunk_ids: Vec<String>,
}

/// A completed answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// Scrubbed answer text
    pub answer_text: String,

    /// Attribution for the answer
    pub sources: Vec<SourceRef>,

    /// Unique id for correlating logs with replies
    pub request_id: String,
}

/// Terminal state of one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QueryReply {
    Completed(QueryOutcome),
    Aborted(AbortReason),
}

/// Acknowledgement of a stored profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub session_id: String,
    pub candidate_name: String,
    pub extracted_fields: Vec<String>,
}

/// Snapshot of engine state for health reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub documents: usize,
    pub chunks: usize,
    pub live_sessions: usize,
    pub providers: Vec<String>,
}

/// Composes retrieval, guards, limits, sessions and the provider router.
pub struct QueryOrchestrator {
    store: Arc<KnowledgeStore>,
    retriever: Retriever,
    guard: GuardEngine,
    salary: SalaryGuard,
    limiter: RateLimiter,
    sessions: SessionStore,
    router: ProviderRouter,
    top_k: usize,
    max_tokens: u32,
    temperature: f32,
    rate_window: Duration,
    query_limit: u32,
    upload_limit: u32,
}

impl QueryOrchestrator {
    /// Assemble an orchestrator from pre-built parts.
    pub fn new(
        store: Arc<KnowledgeStore>,
        router: ProviderRouter,
        config: &AppConfig,
    ) -> AppResult<Self> {
        let retriever = Retriever::new(Arc::clone(&store), config.min_score);
        let guard =
            GuardEngine::with_extras(&config.extra_guard_signatures, &config.extra_leak_markers);
        let sessions = SessionStore::new(
            Duration::from_secs(config.session_ttl_secs),
            config.max_sessions,
        );

        Ok(Self {
            store,
            retriever,
            guard,
            salary: SalaryGuard::new()?,
            limiter: RateLimiter::new(),
            sessions,
            router,
            top_k: config.top_k,
            max_tokens: config.llm_max_tokens,
            temperature: config.llm_temperature,
            rate_window: Duration::from_secs(config.rate_window_secs),
            query_limit: config.query_limit_per_window,
            upload_limit: config.upload_limit_per_window,
        })
    }

    /// Load the knowledge base and provider stack from configuration.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let policy = ChunkPolicy {
            max_chunk_len: config.max_chunk_len,
            min_chunk_len: config.min_chunk_len,
        };
        let store = Arc::new(KnowledgeStore::from_dir(&config.knowledge_dir, policy)?);
        let router = build_router(config)?;
        Self::new(store, router, config)
    }

    /// Answer one query end to end.
    ///
    /// Infallible by construction: every failure mode is a designed
    /// [`AbortReason`]. Guard blocks happen before any provider call, so a
    /// blocked query makes zero backend attempts.
    pub async fn answer(&self, request: QueryRequest) -> QueryReply {
        let request_id = Uuid::new_v4().to_string();
        let text = request.text.trim();

        if text.is_empty() {
            return QueryReply::Aborted(AbortReason::InvalidInput {
                message: "Query text must not be empty".to_string(),
            });
        }
        if request.client_key.trim().is_empty() {
            return QueryReply::Aborted(AbortReason::InvalidInput {
                message: "Client key must not be empty".to_string(),
            });
        }

        if self.limiter.admit(
            &request.client_key,
            Resource::Query,
            self.query_limit,
            self.rate_window,
        ) == Admission::Denied
        {
            tracing::info!(request_id = %request_id, "query rate limited");
            return QueryReply::Aborted(AbortReason::RateLimitExceeded);
        }

        let verdict = self.guard.pre_check(text);
        if !verdict.allowed {
            tracing::info!(request_id = %request_id, "query blocked by pre-guard");
            return QueryReply::Aborted(AbortReason::ExfiltrationAttempt {
                message: verdict
                    .safe_message
                    .unwrap_or_else(|| crate::guard::SAFE_REFUSAL.to_string()),
            });
        }

        let retrieved = self.retriever.search(text, self.top_k);
        tracing::debug!(
            request_id = %request_id,
            chunks = retrieved.len(),
            "retrieval done"
        );

        let profile = request
            .session_id
            .as_deref()
            .and_then(|id| self.sessions.get(id));

        let prompt = build_query_prompt(text, &retrieved, &self.store, profile.as_ref());
        let generation = GenerationRequest::new(prompt.system, prompt.user)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        let routed = match self.router.generate(&generation).await {
            Ok(routed) => routed,
            Err(err) => {
                tracing::error!(
                    request_id = %request_id,
                    attempts = err.attempts.len(),
                    "all providers failed"
                );
                return QueryReply::Aborted(AbortReason::AllProvidersFailed {
                    message: ALL_FAILED_MESSAGE.to_string(),
                });
            }
        };

        let post = self.guard.post_check(&routed.answer);
        if !post.allowed {
            tracing::warn!(request_id = %request_id, "answer replaced by post-guard");
            return QueryReply::Completed(QueryOutcome {
                answer_text: post
                    .safe_message
                    .unwrap_or_else(|| crate::guard::SAFE_REFUSAL.to_string()),
                sources: vec![SourceRef {
                    provider_name: GUARD_SOURCE.to_string(),
                    model_name: GUARD_SOURCE.to_string(),
                    chunk_ids: Vec::new(),
                }],
                request_id,
            });
        }

        let mut answer_text = strip_disclaimers(&routed.answer);
        if self.salary.is_salary_query(text) {
            let context: Vec<&str> = retrieved
                .iter()
                .filter_map(|s| self.store.get(&s.chunk_id))
                .map(|chunk| chunk.text.as_str())
                .collect();
            let facts = self.salary.extract_facts(context);
            answer_text = self.salary.scrub_answer(&answer_text, &facts);
        }

        let chunk_ids: Vec<String> = retrieved.iter().map(|s| s.chunk_id.clone()).collect();
        let sources = match attribution(&routed.attempts) {
            Some((provider, model)) => vec![SourceRef {
                provider_name: provider.to_string(),
                model_name: model.to_string(),
                chunk_ids,
            }],
            // Unreachable after a successful generate, but never attribute
            // an answer to a backend that did not produce it.
            None => Vec::new(),
        };

        tracing::info!(request_id = %request_id, "query completed");
        QueryReply::Completed(QueryOutcome {
            answer_text,
            sources,
            request_id,
        })
    }

    /// Store a resume profile for a session.
    pub fn upload_profile(
        &self,
        session_id: &str,
        resume_text: &str,
        filename_hint: Option<&str>,
        client_key: &str,
    ) -> Result<UploadReceipt, AbortReason> {
        if session_id.trim().is_empty() {
            return Err(AbortReason::InvalidInput {
                message: "Session id must not be empty".to_string(),
            });
        }

        if self.limiter.admit(
            client_key,
            Resource::Upload,
            self.upload_limit,
            self.rate_window,
        ) == Admission::Denied
        {
            return Err(AbortReason::RateLimitExceeded);
        }

        let profile = profile_from_text(session_id, resume_text, filename_hint).ok_or_else(
            || AbortReason::InvalidInput {
                message: "Resume text must not be empty".to_string(),
            },
        )?;

        let receipt = UploadReceipt {
            session_id: profile.session_id.clone(),
            candidate_name: profile.candidate_name.clone(),
            extracted_fields: profile.extracted_fields.clone(),
        };
        self.sessions.put(profile);
        tracing::info!(session = session_id, "profile stored");
        Ok(receipt)
    }

    /// Remove a session's profile; returns whether one existed.
    pub fn clear_profile(&self, session_id: &str) -> bool {
        self.sessions.clear(session_id)
    }

    /// Health snapshot.
    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            documents: self.store.doc_count(),
            chunks: self.store.len(),
            live_sessions: self.sessions.len(),
            providers: self
                .router
                .provider_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}
