//! Meeting persistence.
//!
//! The handler talks to a [`MeetingStore`] trait rather than a concrete
//! backend, mirroring the provider seams: boxed futures keep the trait
//! object-safe, and tests swap in failing fakes. [`MemoryStore`] is the
//! only shipped backend.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use wheretomeet_core::{Meeting, MeetingStatus};
use wheretomeet_providers::BoxFuture;

/// Errors produced by a meeting store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No meeting with the given id exists.
    #[error("meeting not found: {id}")]
    NotFound { id: String },

    /// A meeting with the given id already exists.
    #[error("meeting already exists: {id}")]
    AlreadyExists { id: String },

    /// The backend failed.
    #[error("store backend error: {message}")]
    Backend { message: String },
}

impl StoreError {
    /// Creates a not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates an already exists error.
    pub fn already_exists(id: impl Into<String>) -> Self {
        Self::AlreadyExists { id: id.into() }
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Counts reported by [`MeetingStore::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    /// Total meeting records held.
    pub meeting_count: usize,
    /// Records that reached the scheduled state.
    pub scheduled_count: usize,
}

/// A backend holding meeting records.
pub trait MeetingStore: Send + Sync {
    /// Inserts a new meeting. Fails if the id is already taken.
    fn insert(&self, meeting: Meeting) -> BoxFuture<'_, StoreResult<()>>;

    /// Fetches a meeting by id.
    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Meeting>>;

    /// Replaces an existing meeting record. Fails if the id is unknown.
    fn update(&self, meeting: Meeting) -> BoxFuture<'_, StoreResult<()>>;

    /// Returns record counts for status reporting.
    fn stats(&self) -> BoxFuture<'_, StoreStats>;
}

/// In-memory meeting store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    meetings: RwLock<HashMap<String, Meeting>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store behind an `Arc`, ready to share.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl MeetingStore for MemoryStore {
    fn insert(&self, meeting: Meeting) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let mut meetings = self.meetings.write().await;
            if meetings.contains_key(&meeting.id) {
                return Err(StoreError::already_exists(&meeting.id));
            }
            meetings.insert(meeting.id.clone(), meeting);
            Ok(())
        })
    }

    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Meeting>> {
        Box::pin(async move {
            let meetings = self.meetings.read().await;
            meetings.get(id).cloned().ok_or_else(|| StoreError::not_found(id))
        })
    }

    fn update(&self, meeting: Meeting) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let mut meetings = self.meetings.write().await;
            if !meetings.contains_key(&meeting.id) {
                return Err(StoreError::not_found(&meeting.id));
            }
            meetings.insert(meeting.id.clone(), meeting);
            Ok(())
        })
    }

    fn stats(&self) -> BoxFuture<'_, StoreStats> {
        Box::pin(async move {
            let meetings = self.meetings.read().await;
            StoreStats {
                meeting_count: meetings.len(),
                scheduled_count: meetings
                    .values()
                    .filter(|m| m.status == MeetingStatus::Scheduled)
                    .count(),
            }
        })
    }
}
