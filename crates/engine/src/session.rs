//! TTL and capacity bounded session profiles.
//!
//! Each session holds at most one candidate profile. Entries expire after a
//! fixed idle TTL measured from the last read or write, and the store evicts
//! the least-recently-touched entry when a new session would exceed capacity.
//! Expiry is lazy: expired entries are dropped when touched or when a new
//! insert sweeps the map, so no background task is needed.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Candidate profile attached to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionProfile {
    /// Session this profile belongs to
    pub session_id: String,

    /// Raw resume text as uploaded
    pub resume_text: String,

    /// Best-effort candidate name extracted from the resume
    pub candidate_name: String,

    /// Skills found verbatim in the resume, sorted
    pub extracted_fields: Vec<String>,

    /// When the profile was first stored
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Entry {
    profile: SessionProfile,
    last_touched: Instant,
}

/// Session-keyed profile store with idle TTL and an LRU capacity bound.
pub struct SessionStore {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
    capacity: usize,
}

impl SessionStore {
    /// Create an empty store. A zero capacity stores nothing.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    /// Fetch the profile for a session, refreshing its idle clock.
    ///
    /// Returns `None` for unknown sessions and for entries whose TTL has
    /// elapsed; expired entries are removed on the way out.
    pub fn get(&self, session_id: &str) -> Option<SessionProfile> {
        self.get_at(session_id, Instant::now())
    }

    /// `get` against an explicit clock, used by tests to cross the TTL
    /// without sleeping.
    pub fn get_at(&self, session_id: &str, now: Instant) -> Option<SessionProfile> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        match entries.get_mut(session_id) {
            Some(entry) if now.duration_since(entry.last_touched) < self.ttl => {
                entry.last_touched = now;
                Some(entry.profile.clone())
            }
            Some(_) => {
                entries.remove(session_id);
                tracing::debug!(session = session_id, "session expired");
                None
            }
            None => None,
        }
    }

    /// Store or replace the profile for a session.
    ///
    /// Expired entries are swept first; if the store is still full, the
    /// least-recently-touched live entry is evicted to make room.
    pub fn put(&self, profile: SessionProfile) {
        self.put_at(profile, Instant::now());
    }

    /// `put` against an explicit clock.
    pub fn put_at(&self, profile: SessionProfile, now: Instant) {
        if self.capacity == 0 {
            return;
        }

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        entries.retain(|_, entry| now.duration_since(entry.last_touched) < self.ttl);

        if !entries.contains_key(&profile.session_id) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_touched)
                .map(|(id, _)| id.clone());
            if let Some(id) = oldest {
                tracing::debug!(session = %id, "evicting least recently used session");
                entries.remove(&id);
            }
        }

        entries.insert(
            profile.session_id.clone(),
            Entry {
                profile,
                last_touched: now,
            },
        );
    }

    /// Drop every expired entry now; returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// `sweep` against an explicit clock.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.last_touched) < self.ttl);
        before - entries.len()
    }

    /// Remove a session's profile. Idempotent; returns whether an entry was
    /// actually removed.
    pub fn clear(&self, session_id: &str) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(session_id).is_some()
    }

    /// Number of live (non-expired) sessions.
    pub fn len(&self) -> usize {
        self.len_at(Instant::now())
    }

    /// `len` against an explicit clock.
    pub fn len_at(&self, now: Instant) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .values()
            .filter(|entry| now.duration_since(entry.last_touched) < self.ttl)
            .count()
    }

    /// Whether no live sessions exist.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
