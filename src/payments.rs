//! Thin payment-gateway client. The gateway is an opaque collaborator: we
//! create a checkout preference and later poll the payment status; everything
//! else happens on the gateway's hosted pages.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Clone)]
pub struct PaymentClient {
    http: reqwest::Client,
    base_url: String,
    access_token: SecretString,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePreference {
    pub title: String,
    pub unit_price: f64,
    pub quantity: u32,
    pub payer_email: Option<String>,
}

/// What the frontend needs to hand the user over to the gateway.
#[derive(Debug, Serialize, Deserialize)]
pub struct Preference {
    pub id: String,
    pub init_point: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentStatus {
    pub id: u64,
    pub status: String,
}

impl PaymentClient {
    pub fn new(base_url: String, access_token: String) -> Self {
        PaymentClient {
            http: reqwest::Client::new(),
            base_url,
            access_token: access_token.into(),
        }
    }

    pub async fn create_preference(
        &self,
        request: &CreatePreference,
        back_url: &str,
    ) -> anyhow::Result<Preference> {
        let body = json!({
            "items": [{
                "title": request.title,
                "quantity": request.quantity,
                "unit_price": request.unit_price,
                "currency_id": "COP",
            }],
            "payer": { "email": request.payer_email },
            "back_urls": {
                "success": format!("{back_url}/payment-success"),
                "failure": format!("{back_url}/payment-failure"),
                "pending": format!("{back_url}/payment-failure"),
            },
            "auto_return": "approved",
        });

        let response = self
            .http
            .post(format!("{}/checkout/preferences", self.base_url))
            .bearer_auth(self.access_token.expose_secret())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    pub async fn payment_status(&self, payment_id: u64) -> anyhow::Result<PaymentStatus> {
        let response = self
            .http
            .get(format!("{}/v1/payments/{payment_id}", self.base_url))
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}
