//! Payment-processor customer record.

use serde::{Deserialize, Serialize};

/// A customer as the payment processor returns it. Looked up by email and
/// created if absent; this service never mutates an existing customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub email: String,
    /// Display name; set from the submission when this service creates
    /// the customer, but may be anything for pre-existing customers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Customer {
    /// Display name, empty when the processor has none on file.
    pub fn display_name(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    /// First whitespace-separated token of the display name, for
    /// greetings.
    pub fn first_name(&self) -> &str {
        self.display_name().split_whitespace().next().unwrap_or_default()
    }
}
