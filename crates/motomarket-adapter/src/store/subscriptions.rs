/*
[INPUT]:  Plan choice, payment method and the seller's active listing count
[OUTPUT]: Subscriptions, the active one, quotas and the plan catalog
[POS]:    State layer - subscription store and static plan catalog
[UPDATE]: When plans, prices or quota rules change
*/

use std::fmt;
use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;
use tracing::info;

use crate::auth::AuthSession;
use crate::http::Result;
use crate::store::{HasStatus, OpStatus, read_lock, replace_by_id, track, write_lock};
use crate::types::{
    CardDetails, CreateSubscriptionRequest, PaymentMethod, PlanId, Subscription,
    SubscriptionStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanFeature {
    pub text: &'static str,
    pub included: bool,
}

/// A subscription plan as offered to sellers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub id: PlanId,
    pub name: &'static str,
    /// Monthly price in cents (BRL)
    pub price_cents: i64,
    pub description: &'static str,
    pub limit: ListingLimit,
    pub listing_days: u32,
    pub features: &'static [PlanFeature],
}

impl Plan {
    pub fn price(&self) -> Decimal {
        Decimal::new(self.price_cents, 2)
    }

    /// Catalog entry for a plan id; retired or unknown plans have none
    pub fn find(id: PlanId) -> Option<&'static Plan> {
        match id {
            PlanId::Basic => Some(&PLANS[0]),
            PlanId::Standard => Some(&PLANS[1]),
            PlanId::Premium => Some(&PLANS[2]),
            PlanId::Unlimited => Some(&PLANS[3]),
            PlanId::Unknown => None,
        }
    }
}

const fn feature(text: &'static str, included: bool) -> PlanFeature {
    PlanFeature { text, included }
}

pub static PLANS: [Plan; 4] = [
    Plan {
        id: PlanId::Basic,
        name: "Basic",
        price_cents: 4990,
        description: "For occasional sellers",
        limit: ListingLimit::Limited(5),
        listing_days: 30,
        features: &[
            feature("Up to 5 simultaneous listings", true),
            feature("30 days per listing", true),
            feature("High resolution photos", true),
            feature("Basic statistics", true),
            feature("Highlighted in search", false),
            feature("Automatic listing renewal", false),
        ],
    },
    Plan {
        id: PlanId::Standard,
        name: "Standard",
        price_cents: 8990,
        description: "For regular sellers",
        limit: ListingLimit::Limited(15),
        listing_days: 45,
        features: &[
            feature("Up to 15 simultaneous listings", true),
            feature("45 days per listing", true),
            feature("High resolution photos", true),
            feature("Detailed statistics", true),
            feature("Highlighted in search", true),
            feature("Automatic listing renewal", false),
        ],
    },
    Plan {
        id: PlanId::Premium,
        name: "Premium",
        price_cents: 14990,
        description: "For frequent sellers",
        limit: ListingLimit::Limited(30),
        listing_days: 60,
        features: &[
            feature("Up to 30 simultaneous listings", true),
            feature("60 days per listing", true),
            feature("High resolution photos", true),
            feature("Advanced statistics", true),
            feature("Highlighted in search", true),
            feature("Automatic listing renewal", true),
        ],
    },
    Plan {
        id: PlanId::Unlimited,
        name: "Unlimited",
        price_cents: 19990,
        description: "For dealers and professionals",
        limit: ListingLimit::Unlimited,
        listing_days: 90,
        features: &[
            feature("Unlimited listings", true),
            feature("90 days per listing", true),
            feature("High resolution photos", true),
            feature("Advanced statistics", true),
            feature("Top placement in search", true),
            feature("Automatic listing renewal", true),
        ],
    },
];

/// How many listings may be active at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingLimit {
    Limited(u32),
    Unlimited,
}

impl ListingLimit {
    pub fn allows(&self, active_count: u32) -> bool {
        match self {
            ListingLimit::Limited(max) => active_count < *max,
            ListingLimit::Unlimited => true,
        }
    }
}

impl fmt::Display for ListingLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingLimit::Limited(max) => write!(f, "{max}"),
            ListingLimit::Unlimited => f.write_str("unlimited"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionState {
    pub subscriptions: Vec<Subscription>,
    pub active_subscription: Option<Subscription>,
    pub status: OpStatus,
}

impl HasStatus for SubscriptionState {
    fn status_mut(&mut self) -> &mut OpStatus {
        &mut self.status
    }
}

#[derive(Debug, Clone)]
pub struct SubscriptionStore {
    session: AuthSession,
    state: Arc<RwLock<SubscriptionState>>,
}

impl SubscriptionStore {
    pub fn new(session: AuthSession) -> Self {
        Self {
            session,
            state: Arc::new(RwLock::new(SubscriptionState::default())),
        }
    }

    pub fn state(&self) -> SubscriptionState {
        read_lock(&self.state).clone()
    }

    pub fn plans(&self) -> &'static [Plan] {
        &PLANS
    }

    pub fn active_subscription(&self) -> Option<Subscription> {
        read_lock(&self.state).active_subscription.clone()
    }

    /// Reload the user's subscriptions and pick the first active one
    pub async fn get_subscriptions(&self) -> Result<Vec<Subscription>> {
        self.session.require_user_id()?;
        track(
            &self.state,
            "Could not load subscriptions. Please try again.",
            async {
                let subscriptions = self.session.client().list_subscriptions().await?;
                let mut guard = write_lock(&self.state);
                guard.active_subscription = subscriptions
                    .iter()
                    .find(|sub| sub.status == SubscriptionStatus::Active)
                    .cloned();
                guard.subscriptions = subscriptions.clone();
                Ok(subscriptions)
            },
        )
        .await
    }

    pub async fn get_subscription(&self, id: &str) -> Result<Subscription> {
        track(
            &self.state,
            "Could not load the subscription. Please try again.",
            self.session.client().get_subscription(id),
        )
        .await
    }

    pub async fn create_subscription(
        &self,
        plan: PlanId,
        payment_method: PaymentMethod,
        payment_details: Option<CardDetails>,
    ) -> Result<Subscription> {
        let req = CreateSubscriptionRequest {
            plan,
            payment_method,
            payment_details,
        };
        track(
            &self.state,
            "Could not create the subscription. Please try again.",
            async {
                let subscription = self.session.client().create_subscription(&req).await?;
                info!(subscription_id = %subscription.id, plan = plan.as_str(), "subscribed");
                let mut guard = write_lock(&self.state);
                guard.subscriptions.push(subscription.clone());
                guard.active_subscription = Some(subscription.clone());
                Ok(subscription)
            },
        )
        .await
    }

    pub async fn cancel_subscription(&self, id: &str) -> Result<serde_json::Value> {
        track(
            &self.state,
            "Could not cancel the subscription. Please try again.",
            async {
                let data = self.session.client().cancel_subscription(id).await?;
                let mut guard = write_lock(&self.state);
                for sub in guard.subscriptions.iter_mut().filter(|sub| sub.id == id) {
                    sub.status = SubscriptionStatus::Canceled;
                    sub.auto_renew = false;
                }
                guard.active_subscription = None;
                info!(subscription_id = %id, "subscription canceled");
                Ok(data)
            },
        )
        .await
    }

    pub async fn renew_subscription(&self, id: &str) -> Result<Subscription> {
        track(
            &self.state,
            "Could not renew the subscription. Please try again.",
            async {
                let renewed = self.session.client().renew_subscription(id).await?;
                let mut guard = write_lock(&self.state);
                replace_by_id(&mut guard.subscriptions, id, renewed.clone(), |s| s.id.as_str());
                guard.active_subscription = Some(renewed.clone());
                Ok(renewed)
            },
        )
        .await
    }

    /// Quota of the active plan; no subscription or an unknown plan means no quota
    pub fn listing_limit(&self) -> ListingLimit {
        read_lock(&self.state)
            .active_subscription
            .as_ref()
            .and_then(|sub| Plan::find(sub.plan))
            .map_or(ListingLimit::Limited(0), |plan| plan.limit)
    }

    /// Signed-out users cannot list. Without a subscription each listing is
    /// paid individually, so the quota only applies to subscribers.
    pub fn can_create_listing(&self, active_count: u32) -> bool {
        if self.session.current_user().is_none() {
            return false;
        }
        if read_lock(&self.state).active_subscription.is_none() {
            return true;
        }
        self.listing_limit().allows(active_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStorage;
    use crate::http::MarketClient;
    use rstest::rstest;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn signed_in_store(server: &MockServer, subscriptions: serde_json::Value) -> SubscriptionStore {
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {"_id": "u1", "name": "Ana", "email": "ana@example.com"},
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/subscriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": subscriptions,
            })))
            .mount(server)
            .await;

        let client = MarketClient::with_base_url(&server.uri()).unwrap();
        let session = AuthSession::new(client, Arc::new(MemoryTokenStorage::with_token("tok")));
        session.restore().await.expect("restored");
        SubscriptionStore::new(session)
    }

    #[rstest]
    #[case(PlanId::Basic, "49.90", ListingLimit::Limited(5))]
    #[case(PlanId::Standard, "89.90", ListingLimit::Limited(15))]
    #[case(PlanId::Premium, "149.90", ListingLimit::Limited(30))]
    #[case(PlanId::Unlimited, "199.90", ListingLimit::Unlimited)]
    fn test_plan_catalog(#[case] id: PlanId, #[case] price: &str, #[case] limit: ListingLimit) {
        let plan = Plan::find(id).unwrap();
        assert_eq!(plan.id, id);
        assert_eq!(plan.price().to_string(), price);
        assert_eq!(plan.limit, limit);
        assert_eq!(plan.features.len(), 6);
    }

    #[test]
    fn test_limit_allows() {
        assert!(ListingLimit::Limited(5).allows(4));
        assert!(!ListingLimit::Limited(5).allows(5));
        assert!(!ListingLimit::Limited(0).allows(0));
        assert!(ListingLimit::Unlimited.allows(u32::MAX));
        assert_eq!(ListingLimit::Unlimited.to_string(), "unlimited");
    }

    #[tokio::test]
    async fn test_signed_out_cannot_list() {
        let server = MockServer::start().await;
        let client = MarketClient::with_base_url(&server.uri()).unwrap();
        let store =
            SubscriptionStore::new(AuthSession::new(client, Arc::new(MemoryTokenStorage::new())));

        assert!(!store.can_create_listing(0));
        assert_eq!(store.listing_limit(), ListingLimit::Limited(0));
    }

    #[tokio::test]
    async fn test_active_subscription_drives_quota() {
        let server = MockServer::start().await;
        let store = signed_in_store(
            &server,
            serde_json::json!([
                {"_id": "s0", "plan": "premium", "status": "expired"},
                {"_id": "s1", "plan": "basic", "status": "active", "autoRenew": true},
            ]),
        )
        .await;

        // No subscription loaded yet: pay per listing
        assert!(store.can_create_listing(100));

        store.get_subscriptions().await.unwrap();
        assert_eq!(store.active_subscription().map(|s| s.id), Some("s1".to_string()));
        assert_eq!(store.listing_limit(), ListingLimit::Limited(5));
        assert!(store.can_create_listing(4));
        assert!(!store.can_create_listing(5));
    }

    #[tokio::test]
    async fn test_cancel_then_renew() {
        let server = MockServer::start().await;
        let store = signed_in_store(
            &server,
            serde_json::json!([{"_id": "s1", "plan": "standard", "status": "active", "autoRenew": true}]),
        )
        .await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/subscriptions/s1/cancel"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true, "data": {}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/subscriptions/s1/renew"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {"_id": "s1", "plan": "standard", "status": "active", "autoRenew": true},
            })))
            .mount(&server)
            .await;

        store.get_subscriptions().await.unwrap();
        store.cancel_subscription("s1").await.unwrap();

        let state = store.state();
        assert!(state.active_subscription.is_none());
        assert_eq!(state.subscriptions[0].status, SubscriptionStatus::Canceled);
        assert!(!state.subscriptions[0].auto_renew);

        store.renew_subscription("s1").await.unwrap();
        let state = store.state();
        assert_eq!(state.subscriptions[0].status, SubscriptionStatus::Active);
        assert_eq!(store.listing_limit(), ListingLimit::Limited(15));
    }

    #[tokio::test]
    async fn test_create_subscription_activates() {
        let server = MockServer::start().await;
        let store = signed_in_store(&server, serde_json::json!([])).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/subscriptions"))
            .and(body_json(serde_json::json!({"plan": "unlimited", "paymentMethod": "pix"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "success": true,
                "data": {"_id": "s9", "plan": "unlimited", "status": "active"},
            })))
            .mount(&server)
            .await;

        store
            .create_subscription(PlanId::Unlimited, PaymentMethod::Pix, None)
            .await
            .unwrap();
        assert_eq!(store.state().subscriptions.len(), 1);
        assert_eq!(store.listing_limit(), ListingLimit::Unlimited);
        assert!(store.can_create_listing(10_000));
    }

    #[tokio::test]
    async fn test_retired_plan_does_not_hide_active_subscription() {
        let server = MockServer::start().await;
        let store = signed_in_store(
            &server,
            serde_json::json!([
                {"_id": "s0", "plan": "enterprise", "status": "expired", "paymentMethod": "paypal"},
                {"_id": "s1", "plan": "basic", "status": "active", "paymentMethod": "debit_card"},
            ]),
        )
        .await;

        let subscriptions = store.get_subscriptions().await.unwrap();
        assert_eq!(subscriptions.len(), 2);
        assert_eq!(subscriptions[0].plan, PlanId::Unknown);
        assert_eq!(subscriptions[1].payment_method, Some(PaymentMethod::Unknown));
        assert_eq!(store.active_subscription().map(|s| s.id), Some("s1".to_string()));
        assert_eq!(store.listing_limit(), ListingLimit::Limited(5));
        assert!(!store.can_create_listing(5));
        assert!(store.state().status.error.is_none());
    }

    #[tokio::test]
    async fn test_active_unknown_plan_has_no_quota() {
        let server = MockServer::start().await;
        let store = signed_in_store(
            &server,
            serde_json::json!([{"_id": "s2", "plan": "legacy-gold", "status": "active"}]),
        )
        .await;

        store.get_subscriptions().await.unwrap();
        assert!(Plan::find(PlanId::Unknown).is_none());
        assert_eq!(store.listing_limit(), ListingLimit::Limited(0));
        assert!(!store.can_create_listing(0));
    }

    #[tokio::test]
    async fn test_get_subscription_failure_records_message() {
        let server = MockServer::start().await;
        let store = signed_in_store(&server, serde_json::json!([])).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/subscriptions/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "success": false,
                "error": "Subscription not found",
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/subscriptions/broken"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        assert!(store.get_subscription("missing").await.is_err());
        let state = store.state();
        assert_eq!(state.status.error.as_deref(), Some("Subscription not found"));
        assert!(!state.status.loading);

        assert!(store.get_subscription("broken").await.is_err());
        assert_eq!(
            store.state().status.error.as_deref(),
            Some("Could not load the subscription. Please try again.")
        );
    }
}
