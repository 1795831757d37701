/*
[INPUT]:  Marketplace API schema and serde requirements
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Sold,
    Pending,
    Expired,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Seller,
    Admin,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    Boleto,
    Pix,
    #[serde(other)]
    Unknown,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::Boleto => "boleto",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "approved", alias = "completed", alias = "paid")]
    Approved,
    #[serde(rename = "failed", alias = "rejected")]
    Failed,
    #[serde(rename = "refunded")]
    Refunded,
    #[serde(rename = "canceled", alias = "cancelled")]
    Canceled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanId {
    Basic,
    Standard,
    Premium,
    Unlimited,
    #[serde(other)]
    Unknown,
}

impl PlanId {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanId::Basic => "basic",
            PlanId::Standard => "standard",
            PlanId::Premium => "premium",
            PlanId::Unlimited => "unlimited",
            PlanId::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "canceled", alias = "cancelled")]
    Canceled,
    #[serde(rename = "expired")]
    Expired,
    #[serde(rename = "pending")]
    Pending,
    #[serde(other)]
    Unknown,
}
