/*
[INPUT]:  Listing ids, plan types, payment methods and card details
[OUTPUT]: The user's payment history
[POS]:    State layer - payment store (card, boleto, pix, renewals)
[UPDATE]: When payment flows or methods change
*/

use std::sync::{Arc, RwLock};

use tracing::info;

use crate::auth::AuthSession;
use crate::http::Result;
use crate::store::{HasStatus, OpStatus, read_lock, track, write_lock};
use crate::types::{CardDetails, Payment, PaymentMethod, PaymentRequest, RenewListingResponse};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentState {
    pub payments: Vec<Payment>,
    pub status: OpStatus,
}

impl HasStatus for PaymentState {
    fn status_mut(&mut self) -> &mut OpStatus {
        &mut self.status
    }
}

#[derive(Debug, Clone)]
pub struct PaymentStore {
    session: AuthSession,
    state: Arc<RwLock<PaymentState>>,
}

impl PaymentStore {
    pub fn new(session: AuthSession) -> Self {
        Self {
            session,
            state: Arc::new(RwLock::new(PaymentState::default())),
        }
    }

    pub fn state(&self) -> PaymentState {
        read_lock(&self.state).clone()
    }

    pub async fn get_user_payments(&self) -> Result<Vec<Payment>> {
        self.session.require_user_id()?;
        track(&self.state, "Could not load payments. Please try again.", async {
            let payments = self.session.client().list_payments().await?;
            write_lock(&self.state).payments = payments.clone();
            Ok(payments)
        })
        .await
    }

    pub async fn get_payment(&self, id: &str) -> Result<Payment> {
        track(
            &self.state,
            "Could not load the payment. Please try again.",
            self.session.client().get_payment(id),
        )
        .await
    }

    pub async fn create_payment(&self, req: &PaymentRequest) -> Result<Payment> {
        self.submit(req, "Could not process the payment. Please try again.")
            .await
    }

    /// Pay to extend a listing; the new payment joins the history
    pub async fn renew_listing(
        &self,
        listing_id: &str,
        payment_method: PaymentMethod,
    ) -> Result<RenewListingResponse> {
        track(&self.state, "Could not renew the listing. Please try again.", async {
            let renewal = self
                .session
                .client()
                .renew_listing(listing_id, payment_method)
                .await?;
            write_lock(&self.state)
                .payments
                .push(renewal.payment.clone());
            Ok(renewal)
        })
        .await
    }

    pub async fn process_card_payment(
        &self,
        listing_id: &str,
        plan_type: &str,
        card: CardDetails,
    ) -> Result<Payment> {
        let req = PaymentRequest {
            listing_id: listing_id.to_string(),
            plan_type: plan_type.to_string(),
            payment_method: PaymentMethod::CreditCard,
            card: Some(card),
        };
        self.submit(&req, "Could not process the card payment. Please try again.")
            .await
    }

    pub async fn generate_boleto(&self, listing_id: &str, plan_type: &str) -> Result<Payment> {
        let req = offline_request(listing_id, plan_type, PaymentMethod::Boleto);
        self.submit(&req, "Could not generate the boleto. Please try again.")
            .await
    }

    pub async fn generate_pix(&self, listing_id: &str, plan_type: &str) -> Result<Payment> {
        let req = offline_request(listing_id, plan_type, PaymentMethod::Pix);
        self.submit(&req, "Could not generate the PIX code. Please try again.")
            .await
    }

    async fn submit(&self, req: &PaymentRequest, fallback: &str) -> Result<Payment> {
        track(&self.state, fallback, async {
            let payment = self.session.client().create_payment(req).await?;
            info!(
                payment_id = %payment.id,
                method = req.payment_method.as_str(),
                amount = %payment.amount,
                "payment created"
            );
            write_lock(&self.state).payments.push(payment.clone());
            Ok(payment)
        })
        .await
    }
}

fn offline_request(listing_id: &str, plan_type: &str, method: PaymentMethod) -> PaymentRequest {
    PaymentRequest {
        listing_id: listing_id.to_string(),
        plan_type: plan_type.to_string(),
        payment_method: method,
        card: None,
    }
}
