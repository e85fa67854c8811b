//! # Payment Processor Client
//!
//! REST client for the payment processor: customer search and creation,
//! order creation and payment, product retrieval. Requests are
//! form-encoded with the secret key as basic-auth username, responses are
//! JSON.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use crate::config::PaymentSettings;
use crate::error::{RegistrationError, Result};
use crate::models::{Customer, Order, Product};

/// Operations the checkout workflow needs from the payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Look up a customer by email, limit 1. `None` when unknown.
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>>;

    /// Create a customer with the given display name and payment source.
    async fn create_customer(&self, email: &str, description: &str, source: &str)
        -> Result<Customer>;

    /// Create an order with one quantity-1 line item for `sku`.
    async fn create_order(&self, customer_id: &str, sku: &str, currency: &str) -> Result<Order>;

    /// Pay an existing order on behalf of the customer.
    async fn pay_order(&self, order_id: &str, customer_id: &str) -> Result<Order>;

    /// Fetch full product details by id.
    async fn retrieve_product(&self, sku: &str) -> Result<Product>;

    /// Fetch the single active product for a catalog grouping, if any.
    async fn first_active_product(&self, product_group: &str) -> Result<Option<Product>>;
}

/// List envelope wrapping the processor's collection responses.
#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// Error envelope the processor returns on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTPS implementation of [`PaymentGateway`] against the Stripe API.
pub struct StripeGateway {
    client: Client,
    settings: PaymentSettings,
}

impl StripeGateway {
    pub fn new(settings: PaymentSettings) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| RegistrationError::payment(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, settings })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(PaymentSettings::from_env()?)
    }

    pub fn settings(&self) -> &PaymentSettings {
        &self.settings
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.stripe_api_base, path)
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .basic_auth(&self.settings.stripe_secret_key, None::<&str>)
            .query(query)
            .send()
            .await
            .map_err(|e| RegistrationError::payment(e.to_string()))?;
        Self::decode(path, response).await
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .client
            .post(self.url(path))
            .basic_auth(&self.settings.stripe_secret_key, None::<&str>)
            .form(form)
            .send()
            .await
            .map_err(|e| RegistrationError::payment(e.to_string()))?;
        Self::decode(path, response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| RegistrationError::payment(format!("malformed response: {e}")))
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(path, status = %status, body = %body, "payment API call failed");
            Err(RegistrationError::payment(parse_api_error(status, &body)))
        }
    }
}

/// Pull the processor's own message out of an error body, falling back to
/// the HTTP status line for unparseable payloads.
fn parse_api_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => format!("payment API returned {status}"),
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        debug!(email, "listing customers by email");
        let envelope: ListEnvelope<Customer> = self
            .get("/customers", &[("email", email), ("limit", "1")])
            .await?;
        Ok(envelope.data.into_iter().next())
    }

    async fn create_customer(
        &self,
        email: &str,
        description: &str,
        source: &str,
    ) -> Result<Customer> {
        debug!(email, "creating customer");
        self.post(
            "/customers",
            &[
                ("email", email),
                ("description", description),
                ("source", source),
            ],
        )
        .await
    }

    async fn create_order(&self, customer_id: &str, sku: &str, currency: &str) -> Result<Order> {
        debug!(customer = customer_id, sku, "creating order");
        self.post(
            "/orders",
            &[
                ("currency", currency),
                ("customer", customer_id),
                ("items[0][type]", "sku"),
                ("items[0][parent]", sku),
                ("items[0][quantity]", "1"),
            ],
        )
        .await
    }

    async fn pay_order(&self, order_id: &str, customer_id: &str) -> Result<Order> {
        debug!(order = order_id, "paying order");
        self.post(
            &format!("/orders/{order_id}/pay"),
            &[("customer", customer_id)],
        )
        .await
    }

    async fn retrieve_product(&self, sku: &str) -> Result<Product> {
        debug!(sku, "retrieving product");
        self.get(&format!("/skus/{sku}"), &[]).await
    }

    async fn first_active_product(&self, product_group: &str) -> Result<Option<Product>> {
        debug!(product = product_group, "listing active products");
        let envelope: ListEnvelope<Product> = self
            .get(
                "/skus",
                &[
                    ("product", product_group),
                    ("active", "true"),
                    ("limit", "1"),
                ],
            )
            .await?;
        Ok(envelope.data.into_iter().next())
    }
}
