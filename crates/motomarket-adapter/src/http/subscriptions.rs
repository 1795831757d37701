/*
[INPUT]:  Plan choice and payment details
[OUTPUT]: Subscription records
[POS]:    HTTP layer - subscription endpoints under /api/v1/subscriptions
[UPDATE]: When adding subscription endpoints or plans
*/

use reqwest::Method;

use crate::http::{MarketClient, Result};
use crate::types::{CreateSubscriptionRequest, Subscription};

impl MarketClient {
    /// GET /api/v1/subscriptions
    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        let builder = self.request(Method::GET, "subscriptions")?;
        self.send_data(builder).await
    }

    /// GET /api/v1/subscriptions/{id}
    pub async fn get_subscription(&self, id: &str) -> Result<Subscription> {
        let endpoint = format!("subscriptions/{id}");
        let builder = self.request(Method::GET, &endpoint)?;
        self.send_data(builder).await
    }

    /// POST /api/v1/subscriptions
    pub async fn create_subscription(&self, req: &CreateSubscriptionRequest) -> Result<Subscription> {
        let builder = self.request(Method::POST, "subscriptions")?.json(req);
        self.send_data(builder).await
    }

    /// PUT /api/v1/subscriptions/{id}/cancel
    pub async fn cancel_subscription(&self, id: &str) -> Result<serde_json::Value> {
        let endpoint = format!("subscriptions/{id}/cancel");
        let builder = self.request(Method::PUT, &endpoint)?;
        Ok(self.send_envelope(builder).await?.data.unwrap_or_default())
    }

    /// PUT /api/v1/subscriptions/{id}/renew
    pub async fn renew_subscription(&self, id: &str) -> Result<Subscription> {
        let endpoint = format!("subscriptions/{id}/renew");
        let builder = self.request(Method::PUT, &endpoint)?;
        self.send_data(builder).await
    }
}
