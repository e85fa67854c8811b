//! Inbound registration submission and its validation.

use serde::Deserialize;
use thiserror::Error;

/// Raw checkout request body. Absent fields deserialize to empty strings
/// so validation can report which one is missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Opaque payment-method reference minted by the payment form.
    #[serde(default)]
    pub token: String,
    /// Product id of the event being registered for.
    #[serde(default)]
    pub sku: String,
}

/// A validated submission. Every field is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub payment_token: String,
    pub product_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Missing or invalid name")]
    MissingName,
    #[error("Missing or invalid email")]
    MissingEmail,
    #[error("Missing or invalid stripe token")]
    MissingToken,
    #[error("Missing or invalid product sku")]
    MissingSku,
}

impl TryFrom<CheckoutRequest> for Submission {
    type Error = SubmissionError;

    fn try_from(request: CheckoutRequest) -> Result<Self, Self::Error> {
        if request.name.trim().is_empty() {
            return Err(SubmissionError::MissingName);
        }
        if request.email.trim().is_empty() {
            return Err(SubmissionError::MissingEmail);
        }
        if request.token.trim().is_empty() {
            return Err(SubmissionError::MissingToken);
        }
        if request.sku.trim().is_empty() {
            return Err(SubmissionError::MissingSku);
        }
        Ok(Self {
            name: request.name,
            email: request.email,
            payment_token: request.token,
            product_id: request.sku,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            token: "tok_test".into(),
            sku: "sku_ABC123".into(),
        }
    }

    #[test]
    fn test_valid_submission() {
        let submission = Submission::try_from(request()).expect("valid");
        assert_eq!(submission.name, "Jane Doe");
        assert_eq!(submission.payment_token, "tok_test");
        assert_eq!(submission.product_id, "sku_ABC123");
    }

    #[test]
    fn test_each_missing_field_is_reported() {
        let mut r = request();
        r.name = String::new();
        assert_eq!(Submission::try_from(r), Err(SubmissionError::MissingName));

        let mut r = request();
        r.email = "   ".into();
        assert_eq!(Submission::try_from(r), Err(SubmissionError::MissingEmail));

        let mut r = request();
        r.token = String::new();
        assert_eq!(Submission::try_from(r), Err(SubmissionError::MissingToken));

        let mut r = request();
        r.sku = String::new();
        assert_eq!(Submission::try_from(r), Err(SubmissionError::MissingSku));
    }

    #[test]
    fn test_absent_fields_deserialize_to_empty() {
        let request: CheckoutRequest = serde_json::from_str(r#"{"name":"Jane Doe"}"#).unwrap();
        assert!(request.email.is_empty());
        assert_eq!(
            Submission::try_from(request),
            Err(SubmissionError::MissingEmail)
        );
    }
}
