/*
[INPUT]:  Search filters, listing drafts and image files
[OUTPUT]: Listings and paged search results
[POS]:    HTTP layer - listing endpoints under /api/v1/listings
[UPDATE]: When adding listing endpoints or changing form encoding
*/

use reqwest::Method;
use reqwest::multipart::{Form, Part};

use crate::http::{MarketClient, MarketError, Result};
use crate::types::{ImageUpload, Listing, ListingDraft, ListingFilters, ListingPage};

impl MarketClient {
    /// Search listings
    ///
    /// GET /api/v1/listings?{filters}
    pub async fn search_listings(&self, filters: &ListingFilters) -> Result<ListingPage> {
        let builder = self
            .request(Method::GET, "listings")?
            .query(&filters.to_query_pairs());
        let page: ListingPage = self.send_json(builder).await?;
        if !page.success {
            return Err(MarketError::Rejected {
                message: page
                    .error
                    .unwrap_or_else(|| "Request was not successful".to_string()),
            });
        }
        Ok(page)
    }

    /// Fetch one listing
    ///
    /// GET /api/v1/listings/{id}
    pub async fn get_listing(&self, id: &str) -> Result<Listing> {
        let endpoint = format!("listings/{id}");
        let builder = self.request(Method::GET, &endpoint)?;
        self.send_data(builder).await
    }

    /// Publish a listing with its photos
    ///
    /// POST /api/v1/listings (multipart/form-data)
    pub async fn create_listing(
        &self,
        draft: &ListingDraft,
        images: &[ImageUpload],
    ) -> Result<Listing> {
        let form = listing_form(draft, images)?;
        let builder = self.request(Method::POST, "listings")?.multipart(form);
        self.send_data(builder).await
    }

    /// Edit a listing, optionally adding photos
    ///
    /// PUT /api/v1/listings/{id} (multipart/form-data)
    pub async fn update_listing(
        &self,
        id: &str,
        draft: &ListingDraft,
        images: &[ImageUpload],
    ) -> Result<Listing> {
        let form = listing_form(draft, images)?;
        let endpoint = format!("listings/{id}");
        let builder = self.request(Method::PUT, &endpoint)?.multipart(form);
        self.send_data(builder).await
    }

    /// Remove a listing
    ///
    /// DELETE /api/v1/listings/{id}
    pub async fn delete_listing(&self, id: &str) -> Result<()> {
        let endpoint = format!("listings/{id}");
        let builder = self.request(Method::DELETE, &endpoint)?;
        self.send_envelope::<serde_json::Value>(builder).await?;
        Ok(())
    }

    /// PUT /api/v1/listings/{id}/sold
    pub async fn mark_listing_sold(&self, id: &str) -> Result<Listing> {
        let endpoint = format!("listings/{id}/sold");
        let builder = self.request(Method::PUT, &endpoint)?;
        self.send_data(builder).await
    }

    /// PUT /api/v1/listings/{id}/favorite
    pub async fn favorite_listing(&self, id: &str) -> Result<serde_json::Value> {
        let endpoint = format!("listings/{id}/favorite");
        let builder = self.request(Method::PUT, &endpoint)?;
        Ok(self.send_envelope(builder).await?.data.unwrap_or_default())
    }

    /// PUT /api/v1/listings/{id}/unfavorite
    pub async fn unfavorite_listing(&self, id: &str) -> Result<serde_json::Value> {
        let endpoint = format!("listings/{id}/unfavorite");
        let builder = self.request(Method::PUT, &endpoint)?;
        Ok(self.send_envelope(builder).await?.data.unwrap_or_default())
    }
}

fn listing_form(draft: &ListingDraft, images: &[ImageUpload]) -> Result<Form> {
    let mut form = Form::new();
    for (key, value) in draft.to_form_fields()? {
        form = form.text(key, value);
    }
    for image in images {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        form = form.part("images", part);
    }
    Ok(form)
}
