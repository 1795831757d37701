/*
[INPUT]:  Payment requests (card, boleto, pix) and listing renewals
[OUTPUT]: Payment records
[POS]:    HTTP layer - payment endpoints under /api/v1/payments
[UPDATE]: When adding payment endpoints or methods
*/

use reqwest::Method;

use crate::http::{MarketClient, Result};
use crate::types::{
    Payment, PaymentMethod, PaymentRequest, RenewListingRequest, RenewListingResponse,
};

impl MarketClient {
    /// GET /api/v1/payments
    pub async fn list_payments(&self) -> Result<Vec<Payment>> {
        let builder = self.request(Method::GET, "payments")?;
        self.send_data(builder).await
    }

    /// GET /api/v1/payments/{id}
    pub async fn get_payment(&self, id: &str) -> Result<Payment> {
        let endpoint = format!("payments/{id}");
        let builder = self.request(Method::GET, &endpoint)?;
        self.send_data(builder).await
    }

    /// POST /api/v1/payments
    pub async fn create_payment(&self, req: &PaymentRequest) -> Result<Payment> {
        let builder = self.request(Method::POST, "payments")?.json(req);
        self.send_data(builder).await
    }

    /// Pay to extend a listing's publication period
    ///
    /// POST /api/v1/payments/renew/{listingId}
    pub async fn renew_listing(
        &self,
        listing_id: &str,
        payment_method: PaymentMethod,
    ) -> Result<RenewListingResponse> {
        let endpoint = format!("payments/renew/{listing_id}");
        let builder = self
            .request(Method::POST, &endpoint)?
            .json(&RenewListingRequest { payment_method });
        self.send_data(builder).await
    }
}

#[cfg(test)]
mod tests {
    use crate::http::MarketClient;
    use crate::types::{PaymentMethod, PaymentRequest, PaymentStatus};
    use rust_decimal::Decimal;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_pix_payment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/payments"))
            .and(body_json(serde_json::json!({
                "listingId": "l1",
                "planType": "featured",
                "paymentMethod": "pix",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "success": true,
                "data": {
                    "_id": "p1",
                    "listing": "l1",
                    "amount": 29,
                    "paymentMethod": "pix",
                    "status": "pending",
                    "pixCode": "00020126580014BR.GOV.BCB.PIX",
                },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MarketClient::with_base_url(&server.uri()).unwrap();
        let payment = client
            .create_payment(&PaymentRequest {
                listing_id: "l1".to_string(),
                plan_type: "featured".to_string(),
                payment_method: PaymentMethod::Pix,
                card: None,
            })
            .await
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.amount, Decimal::new(29, 0));
        assert!(payment.pix_code.is_some());
    }

    #[tokio::test]
    async fn test_renew_listing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/payments/renew/l1"))
            .and(body_json(serde_json::json!({"paymentMethod": "boleto"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {
                    "payment": {
                        "_id": "p2",
                        "amount": 19,
                        "paymentMethod": "boleto",
                        "status": "pending",
                        "boletoUrl": "https://pay.example/boleto/p2",
                    },
                },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MarketClient::with_base_url(&server.uri()).unwrap();
        let renewed = client
            .renew_listing("l1", PaymentMethod::Boleto)
            .await
            .unwrap();
        assert_eq!(renewed.payment.id, "p2");
        assert!(renewed.listing.is_none());
    }
}
