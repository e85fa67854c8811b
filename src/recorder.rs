//! # Registration Recorder
//!
//! Appends one row per registration to a per-event worksheet, creating
//! the worksheet (with its fixed header row) on first use. Recording is
//! fire-and-forget: every failure is logged and absorbed here, never
//! surfaced to the checkout path.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::bootstrap::SpreadsheetConnection;
use crate::clients::{SpreadsheetService, Worksheet};
use crate::error::Result;
use crate::models::RegistrationContext;

/// Header row of every registration worksheet. The order is the contract
/// for the persisted tabular schema; `serialize_registration` must match
/// it column for column.
pub const HEADER_FIELDS: [&str; 8] = [
    "created", "name", "email", "customer", "order", "amount", "currency", "sku",
];

pub struct RegistrationRecorder {
    spreadsheet: SpreadsheetConnection,
    /// Serializes check-then-create so concurrent registrations for the
    /// same event cannot create duplicate worksheets.
    ensure_lock: Mutex<()>,
}

impl RegistrationRecorder {
    pub fn new(spreadsheet: SpreadsheetConnection) -> Self {
        Self {
            spreadsheet,
            ensure_lock: Mutex::new(()),
        }
    }

    /// Record a registration. Returns the created row's identifier, or
    /// `None` after logging if any part of the pipeline failed.
    pub async fn track(&self, context: &RegistrationContext) -> Option<String> {
        info!(
            email = %context.customer.email,
            sku = %context.product.id,
            "tracking registration"
        );
        match self.record(context).await {
            Ok(row) => {
                info!(row = %row, "registration recorded");
                Some(row)
            }
            Err(err) => {
                warn!(error = %err, "failed to record registration");
                None
            }
        }
    }

    async fn record(&self, context: &RegistrationContext) -> Result<String> {
        let (document, worksheet) = self.ensure_worksheet(&context.product.id).await?;
        let row = serialize_registration(context);
        document.append_row(&worksheet, &row).await
    }

    /// Find the worksheet titled with the product id, creating it with
    /// the header row when absent. First title match wins.
    async fn ensure_worksheet(
        &self,
        product_id: &str,
    ) -> Result<(Arc<dyn SpreadsheetService>, Worksheet)> {
        let document = self
            .spreadsheet
            .clone()
            .await
            .map_err(|err| crate::error::RegistrationError::spreadsheet(err.to_string()))?;

        let _guard = self.ensure_lock.lock().await;
        let worksheets = document.list_worksheets().await?;
        if let Some(worksheet) = worksheets.into_iter().find(|w| w.title == product_id) {
            info!(worksheet = %worksheet.title, "found registration worksheet");
            return Ok((document, worksheet));
        }

        warn!(sku = %product_id, "no registration worksheet for event, creating one");
        let worksheet = document.add_worksheet(product_id).await?;
        document.set_header_row(&worksheet, &HEADER_FIELDS).await?;
        Ok((document, worksheet))
    }
}

/// Serialize a registration into the header-field order.
pub fn serialize_registration(context: &RegistrationContext) -> Vec<String> {
    vec![
        created_timestamp(context.order.created),
        context.customer.display_name().to_string(),
        context.customer.email.clone(),
        context.customer.id.clone(),
        context.order.id.clone(),
        context.order.amount_decimal(),
        context.order.currency.clone(),
        context.product.id.clone(),
    ]
}

/// Unix seconds to an ISO-8601 UTC string. Timestamps outside chrono's
/// representable range fall back to the epoch.
fn created_timestamp(unix_seconds: i64) -> String {
    DateTime::from_timestamp(unix_seconds, 0)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, Inventory, Order, Product, ProductAttributes};

    fn context() -> RegistrationContext {
        RegistrationContext {
            customer: Customer {
                id: "cus_42".into(),
                email: "jane@example.com".into(),
                description: Some("Jane Doe".into()),
            },
            order: Order {
                id: "or_1GqM4eDp".into(),
                amount: 4250,
                currency: "usd".into(),
                created: 1_545_352_400,
            },
            product: Product {
                id: "sku_ABC123".into(),
                attributes: ProductAttributes::default(),
                price: 4250,
                inventory: Inventory { quantity: 10 },
            },
        }
    }

    #[test]
    fn test_serialization_matches_header_order() {
        let row = serialize_registration(&context());
        assert_eq!(row.len(), HEADER_FIELDS.len());
        assert_eq!(row[0], "2018-12-21T00:33:20.000Z");
        assert_eq!(row[1], "Jane Doe");
        assert_eq!(row[2], "jane@example.com");
        assert_eq!(row[3], "cus_42");
        assert_eq!(row[4], "or_1GqM4eDp");
        assert_eq!(row[5], "42.50");
        assert_eq!(row[6], "usd");
        assert_eq!(row[7], "sku_ABC123");
    }

    #[test]
    fn test_header_field_order_is_fixed() {
        assert_eq!(
            HEADER_FIELDS,
            ["created", "name", "email", "customer", "order", "amount", "currency", "sku"]
        );
    }

    #[test]
    fn test_created_timestamp_is_iso8601_utc() {
        assert_eq!(created_timestamp(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(created_timestamp(1_545_352_400), "2018-12-21T00:33:20.000Z");
    }
}
