//! Query processing and safety pipeline.
//!
//! Composes the knowledge retriever, guard engine, rate limiter, session
//! store and provider router into the end-to-end
//! `answer(query, session, client)` operation. The shared mutable pieces are
//! exactly the rate-limiter counters and the session entries; everything
//! else is read-only after construction.

pub mod guard;
pub mod orchestrator;
pub mod profile;
pub mod prompt;
pub mod ratelimit;
pub mod salary;
pub mod scrub;
pub mod session;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use guard::{GuardEngine, GuardReason, GuardVerdict};
pub use orchestrator::{
    AbortReason, EngineStatus, QueryOrchestrator, QueryOutcome, QueryReply, QueryRequest,
    SourceRef, UploadReceipt,
};
pub use ratelimit::{Admission, RateLimiter, Resource};
pub use salary::{SalaryFacts, SalaryGuard};
pub use session::{SessionProfile, SessionStore};
