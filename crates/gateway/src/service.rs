//! Call actions: load, transition, commit, notify
//!
//! Every HTTP call action runs through [`CallService`]. Actions on the same
//! call id are serialized with a per-call lock so two requests can never
//! transition one record concurrently, and notifications go out only
//! after the store has accepted the new record.

use std::sync::Arc;

use dashmap::DashMap;
use peerlink_signaling::{
    lifecycle, CallAction, CallId, CallLifecycle, CallRecord, ConnectionRegistry, LifecycleError,
    UserHandle,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::store::{CallStore, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

pub struct CallService {
    store: Arc<dyn CallStore>,
    lifecycle: CallLifecycle,
    locks: DashMap<CallId, Arc<Mutex<()>>>,
}

impl CallService {
    pub fn new(store: Arc<dyn CallStore>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            store,
            lifecycle: CallLifecycle::new(registry),
            locks: DashMap::new(),
        }
    }

    /// Create a pending call and ring the receiver
    pub async fn start_call(&self, caller: UserHandle, receiver: UserHandle) -> ServiceResult<CallRecord> {
        let created = self.store.create_call(caller, receiver).await?;
        let lock = self.lock_for(created.id);
        let result = {
            let _guard = lock.lock().await;
            self.commit(&created, CallAction::Start).await
        };
        if result.is_err() {
            self.release_lock(created.id, &lock);
        }
        let record = result?;
        info!(call_id = %record.id, caller = %record.caller, receiver = %record.receiver, "Call started");
        Ok(record)
    }

    /// Apply accept, reject or end to an existing call
    pub async fn apply(&self, id: CallId, action: CallAction) -> ServiceResult<CallRecord> {
        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.lock().await;
            match self.store.load_call(id).await {
                Ok(current) => self.commit(&current, action).await,
                Err(err) => Err(err.into()),
            }
        };

        // Nothing further can happen to a missing or finished call.
        let settled = match &result {
            Ok(record) => record.status.is_terminal(),
            Err(ServiceError::Store(StoreError::NotFound(_))) => true,
            Err(ServiceError::Lifecycle(LifecycleError::InvalidTransition { from, .. })) => {
                from.is_terminal()
            }
            Err(ServiceError::Store(_)) => false,
        };
        if settled {
            self.release_lock(id, &lock);
        }

        let record = result?;
        info!(call_id = %id, %action, status = %record.status, "Call updated");
        Ok(record)
    }

    pub async fn calls_for(&self, handle: &UserHandle) -> ServiceResult<Vec<CallRecord>> {
        Ok(self.store.calls_for(handle).await?)
    }

    async fn commit(&self, current: &CallRecord, action: CallAction) -> ServiceResult<CallRecord> {
        let transition = lifecycle::transition(current, action)?;
        self.store.save_call(&transition.record).await?;
        self.lifecycle.dispatch(&transition.notifications);
        Ok(transition.record)
    }

    fn lock_for(&self, id: CallId) -> Arc<Mutex<()>> {
        self.locks.entry(id).or_default().clone()
    }

    /// Drop the lock entry for `id` unless another request still holds it.
    ///
    /// `lock` is the caller's clone, so an idle entry has exactly two
    /// references: the map's and the caller's.
    fn release_lock(&self, id: CallId, lock: &Arc<Mutex<()>>) {
        self.locks
            .remove_if(&id, |_, current| Arc::ptr_eq(current, lock) && Arc::strong_count(current) == 2);
    }
}
