/*
[INPUT]:  Search filters, drafts, images and favorite toggles
[OUTPUT]: Search results, the user's own listings and favorites
[POS]:    State layer - listing store
[UPDATE]: When listing flows or cached collections change
*/

use std::sync::{Arc, RwLock};

use futures_util::future::try_join_all;
use tracing::info;

use crate::auth::AuthSession;
use crate::http::Result;
use crate::store::{HasStatus, OpStatus, read_lock, replace_by_id, track, write_lock};
use crate::types::{
    ImageUpload, Listing, ListingDraft, ListingFilters, ListingPage, ListingStatus,
};

/// Page size asked for when walking every page of the user's listings
const COUNT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingState {
    /// Last search results
    pub listings: Vec<Listing>,
    /// Listings owned by the signed-in user
    pub user_listings: Vec<Listing>,
    pub favorite_ids: Vec<String>,
    pub favorite_listings: Vec<Listing>,
    pub status: OpStatus,
}

impl HasStatus for ListingState {
    fn status_mut(&mut self) -> &mut OpStatus {
        &mut self.status
    }
}

#[derive(Debug, Clone)]
pub struct ListingStore {
    session: AuthSession,
    state: Arc<RwLock<ListingState>>,
}

impl ListingStore {
    pub fn new(session: AuthSession) -> Self {
        Self {
            session,
            state: Arc::new(RwLock::new(ListingState::default())),
        }
    }

    pub fn state(&self) -> ListingState {
        read_lock(&self.state).clone()
    }

    pub async fn search_listings(&self, filters: &ListingFilters) -> Result<ListingPage> {
        track(&self.state, "Could not search listings. Please try again.", async {
            let page = self.session.client().search_listings(filters).await?;
            write_lock(&self.state).listings = page.data.clone();
            Ok(page)
        })
        .await
    }

    pub async fn get_listing(&self, id: &str) -> Result<Listing> {
        track(
            &self.state,
            "Could not load the listing. Please try again.",
            self.session.client().get_listing(id),
        )
        .await
    }

    pub async fn get_user_listings(&self) -> Result<ListingPage> {
        let seller_id = self.session.require_user_id()?;
        track(&self.state, "Could not load your listings. Please try again.", async {
            let filters = ListingFilters::by_seller(seller_id);
            let page = self.session.client().search_listings(&filters).await?;
            write_lock(&self.state).user_listings = page.data.clone();
            Ok(page)
        })
        .await
    }

    /// Active listings of the signed-in user across every result page
    pub async fn count_active_listings(&self) -> Result<u32> {
        let seller_id = self.session.require_user_id()?;
        track(&self.state, "Could not count your listings. Please try again.", async {
            let mut filters = ListingFilters {
                status: Some(ListingStatus::Active),
                page: Some(1),
                limit: Some(COUNT_PAGE_SIZE),
                ..ListingFilters::by_seller(seller_id)
            };
            let mut active: u32 = 0;
            loop {
                let page = self.session.client().search_listings(&filters).await?;
                let on_page = page
                    .data
                    .iter()
                    .filter(|listing| listing.status == ListingStatus::Active)
                    .count();
                active = active.saturating_add(u32::try_from(on_page).unwrap_or(u32::MAX));

                let current = filters.page.unwrap_or(1);
                match page.pagination.next {
                    Some(next) if next.page > current && !page.data.is_empty() => {
                        filters.page = Some(next.page);
                        filters.limit = Some(next.limit);
                    }
                    _ => break,
                }
            }
            Ok(active)
        })
        .await
    }

    pub async fn create_listing(
        &self,
        draft: &ListingDraft,
        images: &[ImageUpload],
    ) -> Result<Listing> {
        track(&self.state, "Could not create the listing. Please try again.", async {
            let listing = self.session.client().create_listing(draft, images).await?;
            info!(listing_id = %listing.id, images = images.len(), "listing created");
            write_lock(&self.state).user_listings.push(listing.clone());
            Ok(listing)
        })
        .await
    }

    pub async fn update_listing(
        &self,
        id: &str,
        draft: &ListingDraft,
        images: &[ImageUpload],
    ) -> Result<Listing> {
        track(&self.state, "Could not update the listing. Please try again.", async {
            let listing = self
                .session
                .client()
                .update_listing(id, draft, images)
                .await?;
            self.replace_user_listing(id, &listing);
            Ok(listing)
        })
        .await
    }

    pub async fn delete_listing(&self, id: &str) -> Result<()> {
        track(&self.state, "Could not delete the listing. Please try again.", async {
            self.session.client().delete_listing(id).await?;
            write_lock(&self.state)
                .user_listings
                .retain(|listing| listing.id != id);
            info!(listing_id = %id, "listing deleted");
            Ok(())
        })
        .await
    }

    pub async fn mark_as_sold(&self, id: &str) -> Result<Listing> {
        track(
            &self.state,
            "Could not mark the listing as sold. Please try again.",
            async {
                let listing = self.session.client().mark_listing_sold(id).await?;
                self.replace_user_listing(id, &listing);
                Ok(listing)
            },
        )
        .await
    }

    pub async fn add_to_favorites(&self, id: &str) -> Result<serde_json::Value> {
        track(&self.state, "Could not add to favorites. Please try again.", async {
            let data = self.session.client().favorite_listing(id).await?;
            let mut guard = write_lock(&self.state);
            if !guard.favorite_ids.iter().any(|fav| fav == id) {
                guard.favorite_ids.push(id.to_string());
            }
            Ok(data)
        })
        .await
    }

    pub async fn remove_from_favorites(&self, id: &str) -> Result<serde_json::Value> {
        track(
            &self.state,
            "Could not remove from favorites. Please try again.",
            async {
                let data = self.session.client().unfavorite_listing(id).await?;
                let mut guard = write_lock(&self.state);
                guard.favorite_ids.retain(|fav| fav != id);
                guard.favorite_listings.retain(|listing| listing.id != id);
                Ok(data)
            },
        )
        .await
    }

    /// Reload favorites: ids from the profile, then every listing concurrently
    pub async fn get_favorite_listings(&self) -> Result<Vec<Listing>> {
        self.session.require_user_id()?;
        track(&self.state, "Could not load favorites. Please try again.", async {
            let client = self.session.client();
            let favorite_ids = client.me().await?.favorites;

            let favorites = if favorite_ids.is_empty() {
                Vec::new()
            } else {
                try_join_all(favorite_ids.iter().map(|id| client.get_listing(id))).await?
            };

            let mut guard = write_lock(&self.state);
            guard.favorite_ids = favorite_ids;
            guard.favorite_listings = favorites.clone();
            Ok(favorites)
        })
        .await
    }

    fn replace_user_listing(&self, id: &str, listing: &Listing) {
        let mut guard = write_lock(&self.state);
        replace_by_id(&mut guard.user_listings, id, listing.clone(), |l| l.id.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStorage;
    use crate::http::{MarketClient, MarketError};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn listing_json(id: &str, status: &str) -> serde_json::Value {
        serde_json::json!({
            "_id": id,
            "title": format!("Moto {id}"),
            "price": 20000,
            "seller": "u1",
            "status": status,
        })
    }

    async fn signed_in_store(server: &MockServer, favorites: &[&str]) -> ListingStore {
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {
                    "_id": "u1",
                    "name": "Ana",
                    "email": "ana@example.com",
                    "favorites": favorites,
                },
            })))
            .mount(server)
            .await;

        let client = MarketClient::with_base_url(&server.uri()).unwrap();
        let session = AuthSession::new(client, Arc::new(MemoryTokenStorage::with_token("tok")));
        session.restore().await.expect("restored");
        ListingStore::new(session)
    }

    #[tokio::test]
    async fn test_user_listings_require_sign_in() {
        let server = MockServer::start().await;
        let client = MarketClient::with_base_url(&server.uri()).unwrap();
        let session = AuthSession::new(client, Arc::new(MemoryTokenStorage::new()));
        session.restore().await;
        let store = ListingStore::new(session);

        let err = store.get_user_listings().await.unwrap_err();
        assert!(matches!(err, MarketError::NotSignedIn));
        assert!(store.state().status.error.is_none());
    }

    #[tokio::test]
    async fn test_user_listings_then_mutations() {
        let server = MockServer::start().await;
        let store = signed_in_store(&server, &[]).await;

        Mock::given(method("GET"))
            .and(path("/api/v1/listings"))
            .and(query_param("seller", "u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "count": 2,
                "data": [listing_json("l1", "active"), listing_json("l2", "active")],
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/listings/l1/sold"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": listing_json("l1", "sold"),
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/listings/l2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": true, "data": {}})),
            )
            .mount(&server)
            .await;

        store.get_user_listings().await.unwrap();
        assert_eq!(store.state().user_listings.len(), 2);

        store.mark_as_sold("l1").await.unwrap();
        store.delete_listing("l2").await.unwrap();

        let state = store.state();
        assert_eq!(state.user_listings.len(), 1);
        assert_eq!(state.user_listings[0].status, ListingStatus::Sold);
        assert!(!state.status.loading);
    }

    #[tokio::test]
    async fn test_favorites_fetched_concurrently() {
        let server = MockServer::start().await;
        let store = signed_in_store(&server, &["l1", "l2"]).await;

        for id in ["l1", "l2"] {
            Mock::given(method("GET"))
                .and(path(format!("/api/v1/listings/{id}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "success": true,
                    "data": listing_json(id, "active"),
                })))
                .expect(1)
                .mount(&server)
                .await;
        }

        let favorites = store.get_favorite_listings().await.unwrap();
        assert_eq!(favorites.len(), 2);
        assert_eq!(favorites[0].id, "l1");
        assert_eq!(favorites[1].id, "l2");
        assert_eq!(store.state().favorite_ids, vec!["l1", "l2"]);
    }

    #[tokio::test]
    async fn test_empty_favorites_skip_listing_calls() {
        let server = MockServer::start().await;
        let store = signed_in_store(&server, &[]).await;

        let favorites = store.get_favorite_listings().await.unwrap();
        assert!(favorites.is_empty());
        assert!(store.state().favorite_listings.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_favorite() {
        let server = MockServer::start().await;
        let store = signed_in_store(&server, &[]).await;
        for action in ["favorite", "unfavorite"] {
            Mock::given(method("PUT"))
                .and(path(format!("/api/v1/listings/l7/{action}")))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})),
                )
                .mount(&server)
                .await;
        }

        store.add_to_favorites("l7").await.unwrap();
        store.add_to_favorites("l7").await.unwrap();
        assert_eq!(store.state().favorite_ids, vec!["l7"]);

        store.remove_from_favorites("l7").await.unwrap();
        assert!(store.state().favorite_ids.is_empty());
    }

    #[tokio::test]
    async fn test_search_failure_sets_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/listings"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "success": false,
                "error": "Invalid price range",
            })))
            .mount(&server)
            .await;

        let client = MarketClient::with_base_url(&server.uri()).unwrap();
        let session = AuthSession::new(client, Arc::new(MemoryTokenStorage::new()));
        let store = ListingStore::new(session);

        assert!(store.search_listings(&ListingFilters::default()).await.is_err());
        assert_eq!(
            store.state().status.error.as_deref(),
            Some("Invalid price range")
        );
    }

    #[tokio::test]
    async fn test_update_listing_replaces_owned_copy() {
        let server = MockServer::start().await;
        let store = signed_in_store(&server, &[]).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/listings"))
            .and(query_param("seller", "u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": [listing_json("l1", "active"), listing_json("l2", "active")],
            })))
            .mount(&server)
            .await;
        let mut updated = listing_json("l2", "active");
        updated["title"] = serde_json::json!("Yamaha MT-07 revised");
        updated["price"] = serde_json::json!(41500);
        Mock::given(method("PUT"))
            .and(path("/api/v1/listings/l2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": updated,
            })))
            .expect(1)
            .mount(&server)
            .await;

        store.get_user_listings().await.unwrap();
        let draft = ListingDraft {
            title: Some("Yamaha MT-07 revised".to_string()),
            ..ListingDraft::default()
        };
        store.update_listing("l2", &draft, &[]).await.unwrap();

        let state = store.state();
        assert_eq!(state.user_listings.len(), 2);
        assert_eq!(state.user_listings[0].title, "Moto l1");
        assert_eq!(state.user_listings[1].title, "Yamaha MT-07 revised");
        assert!(state.status.error.is_none());
    }

    #[tokio::test]
    async fn test_count_active_listings_walks_every_page() {
        let server = MockServer::start().await;
        let store = signed_in_store(&server, &[]).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/listings"))
            .and(query_param("seller", "u1"))
            .and(query_param("status", "active"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "count": 2,
                "pagination": {"next": {"page": 2, "limit": 2}},
                "data": [listing_json("l1", "active"), listing_json("l2", "active")],
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/listings"))
            .and(query_param("seller", "u1"))
            .and(query_param("status", "active"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "count": 2,
                "pagination": {"prev": {"page": 1, "limit": 2}},
                "data": [listing_json("l3", "active"), listing_json("l4", "sold")],
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(store.count_active_listings().await.unwrap(), 3);
        assert!(store.state().user_listings.is_empty());
    }

    #[tokio::test]
    async fn test_count_active_listings_requires_sign_in() {
        let server = MockServer::start().await;
        let client = MarketClient::with_base_url(&server.uri()).unwrap();
        let store =
            ListingStore::new(AuthSession::new(client, Arc::new(MemoryTokenStorage::new())));

        let err = store.count_active_listings().await.unwrap_err();
        assert!(matches!(err, MarketError::NotSignedIn));
    }
}
