//! Call record storage

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use peerlink_signaling::{CallId, CallRecord, UserHandle};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("call {0} not found")]
    NotFound(CallId),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence for call records.
///
/// Implementations must make `save_call` durable before returning; the
/// gateway pushes notifications only after it succeeds.
#[async_trait]
pub trait CallStore: Send + Sync {
    /// Create and persist a new pending call
    async fn create_call(&self, caller: UserHandle, receiver: UserHandle) -> StoreResult<CallRecord>;

    async fn load_call(&self, id: CallId) -> StoreResult<CallRecord>;

    /// Overwrite an existing record
    async fn save_call(&self, record: &CallRecord) -> StoreResult<()>;

    /// Every call where `handle` is caller or receiver, oldest first
    async fn calls_for(&self, handle: &UserHandle) -> StoreResult<Vec<CallRecord>>;
}

/// In-memory call store
#[derive(Debug)]
pub struct InMemoryCallStore {
    calls: DashMap<CallId, CallRecord>,
    next_id: AtomicU64,
}

impl InMemoryCallStore {
    pub fn new() -> Self {
        Self {
            calls: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryCallStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CallStore for InMemoryCallStore {
    async fn create_call(&self, caller: UserHandle, receiver: UserHandle) -> StoreResult<CallRecord> {
        let id = CallId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let record = CallRecord::new(id, caller, receiver);
        self.calls.insert(id, record.clone());
        Ok(record)
    }

    async fn load_call(&self, id: CallId) -> StoreResult<CallRecord> {
        self.calls
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn save_call(&self, record: &CallRecord) -> StoreResult<()> {
        match self.calls.get_mut(&record.id) {
            Some(mut entry) => {
                *entry = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(record.id)),
        }
    }

    async fn calls_for(&self, handle: &UserHandle) -> StoreResult<Vec<CallRecord>> {
        let mut calls: Vec<CallRecord> = self
            .calls
            .iter()
            .filter(|entry| entry.involves(handle))
            .map(|entry| entry.value().clone())
            .collect();
        calls.sort_by_key(|call| call.id);
        Ok(calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peerlink_signaling::CallStatus;

    fn handle(name: &str) -> UserHandle {
        UserHandle::parse(name).unwrap()
    }

    #[tokio::test]
    async fn ids_are_sequential_and_records_pending() {
        let store = InMemoryCallStore::new();
        let first = store.create_call(handle("a"), handle("b")).await.unwrap();
        let second = store.create_call(handle("b"), handle("c")).await.unwrap();

        assert_eq!(first.id, CallId(1));
        assert_eq!(second.id, CallId(2));
        assert_eq!(first.status, CallStatus::Pending);
    }

    #[tokio::test]
    async fn save_overwrites_and_load_returns_latest() {
        let store = InMemoryCallStore::new();
        let mut call = store.create_call(handle("a"), handle("b")).await.unwrap();
        call.status = CallStatus::Accepted;
        store.save_call(&call).await.unwrap();

        assert_eq!(store.load_call(call.id).await.unwrap().status, CallStatus::Accepted);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = InMemoryCallStore::new();
        assert!(matches!(store.load_call(CallId(9)).await, Err(StoreError::NotFound(CallId(9)))));

        let orphan = CallRecord::new(CallId(9), handle("a"), handle("b"));
        assert!(matches!(store.save_call(&orphan).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn calls_for_matches_either_side() {
        let store = InMemoryCallStore::new();
        store.create_call(handle("a"), handle("b")).await.unwrap();
        store.create_call(handle("c"), handle("a")).await.unwrap();
        store.create_call(handle("b"), handle("c")).await.unwrap();

        let ids: Vec<u64> = store
            .calls_for(&handle("a"))
            .await
            .unwrap()
            .iter()
            .map(|call| call.id.0)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
