//! Shared test support: in-process fakes for the three collaborator
//! seams, plus helpers for driving the router.
#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use futures::FutureExt;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use dinner_registration::bootstrap::{MailConnection, SpreadsheetConnection};
use dinner_registration::clients::{
    Mailer, OutgoingEmail, PaymentGateway, SpreadsheetService, Worksheet,
};
use dinner_registration::error::{RegistrationError, Result};
use dinner_registration::models::{Customer, Inventory, Order, Product, ProductAttributes};
use dinner_registration::notifier::ConfirmationNotifier;
use dinner_registration::recorder::RegistrationRecorder;
use dinner_registration::web::{self, AppState, PaymentState};

pub const TEST_SKU: &str = "sku_ABC123";
pub const ORDER_CREATED: i64 = 1_545_352_400;

pub fn test_product() -> Product {
    Product {
        id: TEST_SKU.to_string(),
        attributes: ProductAttributes {
            datetime: "2019-02-14T18:30:00Z".into(),
            theme: "Winter Truffles".into(),
            venue: "The Loft".into(),
            chef: "A. Cook".into(),
            menu: "Five courses".into(),
        },
        price: 4250,
        inventory: Inventory { quantity: 10 },
    }
}

/// Scriptable in-process payment gateway. Records every call it sees.
#[derive(Default)]
pub struct MockGateway {
    pub existing_customer: Mutex<Option<Customer>>,
    pub fail_create_order: bool,
    pub fail_pay_order: bool,
    pub calls: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn with_existing_customer(customer: Customer) -> Self {
        let gateway = Self::default();
        *gateway.existing_customer.lock().unwrap() = Some(customer);
        gateway
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        self.record(format!("find_customer {email}"));
        Ok(self.existing_customer.lock().unwrap().clone())
    }

    async fn create_customer(
        &self,
        email: &str,
        description: &str,
        source: &str,
    ) -> Result<Customer> {
        self.record(format!("create_customer {email} {source}"));
        Ok(Customer {
            id: "cus_new".into(),
            email: email.into(),
            description: Some(description.into()),
        })
    }

    async fn create_order(&self, customer_id: &str, sku: &str, currency: &str) -> Result<Order> {
        self.record(format!("create_order {customer_id} {sku} qty=1 {currency}"));
        if self.fail_create_order {
            return Err(RegistrationError::payment("order creation failed"));
        }
        Ok(Order {
            id: "or_cart".into(),
            amount: 4250,
            currency: currency.into(),
            created: ORDER_CREATED,
        })
    }

    async fn pay_order(&self, order_id: &str, customer_id: &str) -> Result<Order> {
        self.record(format!("pay_order {order_id} {customer_id}"));
        if self.fail_pay_order {
            return Err(RegistrationError::payment("Your card was declined"));
        }
        Ok(Order {
            id: order_id.into(),
            amount: 4250,
            currency: "usd".into(),
            created: ORDER_CREATED,
        })
    }

    async fn retrieve_product(&self, sku: &str) -> Result<Product> {
        self.record(format!("retrieve_product {sku}"));
        Ok(Product {
            id: sku.into(),
            ..test_product()
        })
    }

    async fn first_active_product(&self, product_group: &str) -> Result<Option<Product>> {
        self.record(format!("first_active_product {product_group}"));
        Ok(Some(test_product()))
    }
}

/// In-memory spreadsheet with scriptable failures and an optional listing
/// delay to widen race windows in concurrency tests.
#[derive(Default)]
pub struct MockSpreadsheet {
    pub fail_add_worksheet: bool,
    pub fail_append: bool,
    pub list_delay: Option<Duration>,
    pub next_id: AtomicI64,
    pub state: Mutex<SheetState>,
}

#[derive(Default)]
pub struct SheetState {
    pub worksheets: Vec<Worksheet>,
    pub headers: Vec<(String, Vec<String>)>,
    pub rows: Vec<(String, Vec<String>)>,
    pub worksheets_created: usize,
}

#[async_trait]
impl SpreadsheetService for MockSpreadsheet {
    async fn list_worksheets(&self) -> Result<Vec<Worksheet>> {
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.state.lock().unwrap().worksheets.clone())
    }

    async fn add_worksheet(&self, title: &str) -> Result<Worksheet> {
        if self.fail_add_worksheet {
            return Err(RegistrationError::spreadsheet("worksheet creation failed"));
        }
        let worksheet = Worksheet {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            title: title.into(),
        };
        let mut state = self.state.lock().unwrap();
        state.worksheets.push(worksheet.clone());
        state.worksheets_created += 1;
        Ok(worksheet)
    }

    async fn set_header_row(&self, worksheet: &Worksheet, fields: &[&str]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.headers.push((
            worksheet.title.clone(),
            fields.iter().map(|f| f.to_string()).collect(),
        ));
        Ok(())
    }

    async fn append_row(&self, worksheet: &Worksheet, values: &[String]) -> Result<String> {
        if self.fail_append {
            return Err(RegistrationError::spreadsheet("row append failed"));
        }
        let mut state = self.state.lock().unwrap();
        state.rows.push((worksheet.title.clone(), values.to_vec()));
        Ok(format!("'{}'!A{}:H{}", worksheet.title, state.rows.len() + 1, state.rows.len() + 1))
    }
}

/// Recording mailer.
#[derive(Default)]
pub struct MockMailer {
    pub fail_send: bool,
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

impl MockMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    fn from_address(&self) -> &str {
        "dinners@example.com"
    }

    fn bcc_address(&self) -> &str {
        "host@example.com"
    }

    async fn send(&self, email: OutgoingEmail) -> Result<String> {
        if self.fail_send {
            return Err(RegistrationError::mail("relay rejected the message"));
        }
        self.sent.lock().unwrap().push(email);
        Ok("250".to_string())
    }
}

pub fn mail_connection(mailer: Arc<dyn Mailer>) -> MailConnection {
    async move { mailer }.boxed().shared()
}

pub fn spreadsheet_connection(service: Arc<dyn SpreadsheetService>) -> SpreadsheetConnection {
    async move { Ok(service) }.boxed().shared()
}

pub fn failed_spreadsheet_connection(message: &str) -> SpreadsheetConnection {
    let err = Arc::new(RegistrationError::spreadsheet(message.to_string()));
    async move { Err(err) }.boxed().shared()
}

/// Application state wired to the given fakes.
pub fn app_state(
    gateway: Arc<MockGateway>,
    spreadsheet: SpreadsheetConnection,
    mail: MailConnection,
) -> AppState {
    AppState {
        payment: Some(PaymentState {
            gateway,
            publishable_key: "pk_test_123".into(),
            default_product_id: "prod_dinners".into(),
            currency: "usd".into(),
        }),
        recorder: Arc::new(RegistrationRecorder::new(spreadsheet)),
        notifier: Arc::new(ConfirmationNotifier::new(mail)),
    }
}

pub fn app(state: AppState) -> Router {
    web::router(state)
}

pub async fn request(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("router never errors");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub async fn post_checkout(app: Router, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/api")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds");
    request(app, req).await
}

pub async fn get_catalog(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request builds");
    request(app, req).await
}

pub fn jane_doe() -> Value {
    json!({
        "name": "Jane Doe",
        "email": "jane@example.com",
        "token": "tok_test",
        "sku": TEST_SKU,
    })
}
