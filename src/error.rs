//! # Structured Error Handling
//!
//! One error enum spanning the external collaborators this service drives.
//! Side-effect components (recorder, notifier) absorb these at their own
//! boundary; the checkout path surfaces the message text to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    PaymentApi(String),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("mail relay error: {0}")]
    Mail(String),

    #[error("template error: {0}")]
    Template(String),
}

impl RegistrationError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn payment(message: impl Into<String>) -> Self {
        Self::PaymentApi(message.into())
    }

    pub fn spreadsheet(message: impl Into<String>) -> Self {
        Self::Spreadsheet(message.into())
    }

    pub fn mail(message: impl Into<String>) -> Self {
        Self::Mail(message.into())
    }

    pub fn template(message: impl Into<String>) -> Self {
        Self::Template(message.into())
    }
}

pub type Result<T> = std::result::Result<T, RegistrationError>;
