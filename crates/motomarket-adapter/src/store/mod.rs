/*
[INPUT]:  Shared client, auth session and user actions
[OUTPUT]: Observable client-side state per marketplace area
[POS]:    State layer - stores mirroring server data for the front end
[UPDATE]: When adding stores or changing the operation lifecycle
*/

pub mod listings;
pub mod messages;
pub mod payments;
pub mod subscriptions;

pub use listings::{ListingState, ListingStore};
pub use messages::{MessageState, MessageStore};
pub use payments::{PaymentState, PaymentStore};
pub use subscriptions::{
    ListingLimit, PLANS, Plan, PlanFeature, SubscriptionState, SubscriptionStore,
};

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::auth::{AuthSession, TokenStorage};
use crate::http::{MarketClient, Result};
use crate::types::User;

/// Session plus every store, sharing one client and one token
#[derive(Debug, Clone)]
pub struct Marketplace {
    pub session: AuthSession,
    pub listings: ListingStore,
    pub messages: MessageStore,
    pub payments: PaymentStore,
    pub subscriptions: SubscriptionStore,
}

impl Marketplace {
    pub fn new(client: MarketClient, storage: Arc<dyn TokenStorage>) -> Self {
        let session = AuthSession::new(client, storage);
        Self {
            listings: ListingStore::new(session.clone()),
            messages: MessageStore::new(session.clone()),
            payments: PaymentStore::new(session.clone()),
            subscriptions: SubscriptionStore::new(session.clone()),
            session,
        }
    }

    /// Restore the persisted session and, when signed in, load subscriptions
    pub async fn start(&self) -> Option<User> {
        let user = self.session.restore().await?;
        if let Err(err) = self.subscriptions.get_subscriptions().await {
            warn!(error = %err, "could not load subscriptions at startup");
        }
        Some(user)
    }
}

/// Loading/error pair every store exposes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpStatus {
    pub loading: bool,
    pub error: Option<String>,
}

impl OpStatus {
    pub(crate) fn start(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub(crate) fn finish(&mut self, error: Option<String>) {
        self.loading = false;
        self.error = error;
    }
}

pub(crate) trait HasStatus {
    fn status_mut(&mut self) -> &mut OpStatus;
}

/// Run one store operation: mark loading, await it, record the failure
/// message (server text or `fallback`), clear loading.
pub(crate) async fn track<S, T, F>(state: &RwLock<S>, fallback: &str, fut: F) -> Result<T>
where
    S: HasStatus,
    F: Future<Output = Result<T>>,
{
    write_lock(state).status_mut().start();
    let result = fut.await;
    let error = match &result {
        Ok(_) => None,
        Err(err) => {
            debug!(error = %err, "store operation failed");
            Some(err.user_message(fallback))
        }
    };
    write_lock(state).status_mut().finish(error);
    result
}

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Replace the element with the same id, leaving the rest untouched
pub(crate) fn replace_by_id<T, F>(items: &mut [T], id: &str, replacement: T, id_of: F)
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    for item in items.iter_mut() {
        if id_of(item) == id {
            *item = replacement.clone();
        }
    }
}
